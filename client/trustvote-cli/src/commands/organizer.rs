use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use trustvote_client::config::from_toml_path;
use trustvote_client::creation::{CreationPhase, ElectionCreator, ValidationError};
use trustvote_client::fetcher::Role;
use trustvote_client::scope::ViewScope;

use super::election::{show_dashboard, PageArgs};
use crate::app::App;
use crate::election_file::ElectionFile;

#[derive(Subcommand)]
pub enum OrganizerCommands {
    /// List the elections you created.
    List(PageArgs),
    /// Create an election described by a TOML file.
    Create {
        /// Path to the election file. Photo paths are relative to it.
        file: PathBuf,
    },
}

impl OrganizerCommands {
    pub async fn run(&self, app: &App) -> anyhow::Result<()> {
        match self {
            OrganizerCommands::List(page) => show_dashboard(app, Role::Organizer, page).await,
            OrganizerCommands::Create { file } => create(app, file).await,
        }
    }
}

async fn create(app: &App, path: &Path) -> anyhow::Result<()> {
    let election: ElectionFile = from_toml_path(path)
        .with_context(|| format!("Failed to read election file {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut form = election.into_form(base_dir)?;

    if app.config.contract_address.is_none() {
        form.validate(None)?;
        anyhow::bail!(ValidationError::MissingContractAddress);
    }

    let scope = ViewScope::new();
    let creator = ElectionCreator::new(
        app.writer()?,
        app.storage()?,
        app.config.contract_address,
        scope.token(),
    );

    let progress = spawn_phase_logger(creator.subscribe());

    let submitted = tokio::select! {
        biased;
        _ = tokio::signal::ctrl_c() => {
            scope.cancel();
            anyhow::bail!("Interrupted; the transaction may still be included");
        }
        result = creator.submit(&mut form) => result,
    };
    drop(creator);
    join_phase_logger(progress).await;

    let tx_hash = submitted?;
    println!("Election created: {}", app.config.explorer_tx_url(&tx_hash));
    Ok(())
}

/// Logs every phase change until the creator goes away.
fn spawn_phase_logger(mut phases: watch::Receiver<CreationPhase>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while phases.changed().await.is_ok() {
            let phase = *phases.borrow_and_update();
            tracing::info!(?phase, "Creating election");
        }
    })
}

async fn join_phase_logger(logger: JoinHandle<()>) {
    if let Err(error) = logger.await {
        tracing::warn!(%error, "Creation progress logger failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn phase_logger_ends_with_the_creator() {
        let (phase, rx) = watch::channel(CreationPhase::Editing);
        let logger = spawn_phase_logger(rx);
        phase.send_replace(CreationPhase::Uploading);
        phase.send_replace(CreationPhase::Editing);
        drop(phase);
        join_phase_logger(logger).await;
    }

    #[tokio::test]
    async fn failed_phase_logger_is_not_fatal() {
        let (_phase, rx) = watch::channel(CreationPhase::Editing);
        let logger = spawn_phase_logger(rx);
        logger.abort();
        join_phase_logger(logger).await;
    }
}
