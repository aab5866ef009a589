use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use ethers_middleware::SignerMiddleware;
use ethers_providers::{Http, Provider};
use ethers_signers::{LocalWallet, Signer};
use trustvote_client::config::ClientConfig;
use trustvote_client::fetcher::Session;
use trustvote_evm_adapter::EvmTrustVote;
use trustvote_interface::{AccountAddress, Clock, SystemClock};
use trustvote_pinata_adapter::PinataService;

/// Contract access without a wallet.
pub type Reader = EvmTrustVote<Provider<Http>>;
/// Contract access signed by the configured wallet.
pub type Writer = EvmTrustVote<SignerMiddleware<Provider<Http>, LocalWallet>>;

/// Everything a command needs, built once from the configuration.
pub struct App {
    pub config: ClientConfig,
    pub clock: Arc<dyn Clock>,
    provider: Provider<Http>,
    wallet: Option<LocalWallet>,
}

impl App {
    pub fn new(config: ClientConfig, private_key: Option<&str>) -> anyhow::Result<Self> {
        let provider = Provider::<Http>::try_from(config.chain.rpc_url.as_str())
            .with_context(|| format!("Invalid rpc url {}", config.chain.rpc_url))?;
        let wallet = private_key
            .map(|key| {
                LocalWallet::from_str(key.trim())
                    .map(|wallet| wallet.with_chain_id(config.chain.chain_id))
                    .context("Invalid private key")
            })
            .transpose()?;
        if let Some(wallet) = &wallet {
            tracing::info!(account = %AccountAddress::new(wallet.address().0), "Using wallet");
        }
        Ok(Self {
            config,
            clock: Arc::new(SystemClock),
            provider,
            wallet,
        })
    }

    /// The wallet session the dashboards are rendered for.
    pub fn session(&self) -> Session {
        match &self.wallet {
            Some(wallet) => Session::Connected(AccountAddress::new(wallet.address().0)),
            None => Session::Disconnected,
        }
    }

    /// The connected account, if any.
    pub fn viewer(&self) -> Option<AccountAddress> {
        match self.session() {
            Session::Connected(viewer) => Some(viewer),
            Session::Disconnected => None,
        }
    }

    pub fn contract_address(&self) -> anyhow::Result<AccountAddress> {
        self.config
            .contract_address
            .context("`contract_address` is not set in the configuration")
    }

    pub fn reader(&self) -> anyhow::Result<Arc<Reader>> {
        let reader = EvmTrustVote::new(Arc::new(self.provider.clone()), self.contract_address()?)?;
        Ok(Arc::new(reader))
    }

    pub fn writer(&self) -> anyhow::Result<Arc<Writer>> {
        let wallet = self
            .wallet
            .clone()
            .context("This command signs a transaction; set TRUSTVOTE_PRIVATE_KEY")?;
        let client = SignerMiddleware::new(self.provider.clone(), wallet);
        let writer = EvmTrustVote::new(Arc::new(client), self.contract_address()?)?;
        Ok(Arc::new(writer))
    }

    pub fn storage(&self) -> anyhow::Result<Arc<PinataService>> {
        let storage = PinataService::new(self.config.storage.pinata.clone())
            .context("Failed to build the Pinata client")?;
        Ok(Arc::new(storage))
    }

    pub fn placeholder_url(&self) -> &str {
        &self.config.storage.placeholder_url
    }
}
