//! Election creation: the form, its whitelist dialog and submission.
//!
//! Submitting validates the form, uploads every candidate photo, sends one
//! `createElection` transaction and waits for it to be included. The form is
//! only reset once the transaction is confirmed; any failure leaves the input
//! as it was so the organizer can retry.
mod form;
mod whitelist;

use std::sync::Arc;

pub use form::*;
use futures::future::try_join_all;
use tokio::sync::watch;
use trustvote_interface::services::contract::{Confirmation, ContractWriter, TxHash};
use trustvote_interface::services::storage::{ContentStorage, PhotoFile};
use trustvote_interface::{AccountAddress, CandidateDraft, ContentId, ElectionDraft};
pub use whitelist::*;

use crate::scope::ScopeToken;
use crate::ClientError;

/// Where a creation submission is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationPhase {
    /// The organizer is filling in the form.
    Editing,
    /// Candidate photos are being uploaded.
    Uploading,
    /// The transaction is being signed and sent.
    Submitting,
    /// Waiting for the transaction to be included.
    Confirming,
}

/// Puts the phase back to `Editing` however the submission ends.
struct PhaseReset<'a>(&'a watch::Sender<CreationPhase>);

impl Drop for PhaseReset<'_> {
    fn drop(&mut self) {
        self.0.send_replace(CreationPhase::Editing);
    }
}

/// Submits creation forms.
#[derive(Debug)]
pub struct ElectionCreator<W, S> {
    writer: Arc<W>,
    storage: Arc<S>,
    contract_address: Option<AccountAddress>,
    phase: watch::Sender<CreationPhase>,
    scope: ScopeToken,
}

impl<W: ContractWriter, S: ContentStorage> ElectionCreator<W, S> {
    /// Creates a submitter for the contract at `contract_address`.
    pub fn new(
        writer: Arc<W>,
        storage: Arc<S>,
        contract_address: Option<AccountAddress>,
        scope: ScopeToken,
    ) -> Self {
        let (phase, _) = watch::channel(CreationPhase::Editing);
        Self {
            writer,
            storage,
            contract_address,
            phase,
            scope,
        }
    }

    /// The current phase.
    pub fn phase(&self) -> CreationPhase {
        *self.phase.borrow()
    }

    /// Notified on every phase change.
    pub fn subscribe(&self) -> watch::Receiver<CreationPhase> {
        self.phase.subscribe()
    }

    /// Validates and submits `form`, resetting it once the election is created.
    pub async fn submit(&self, form: &mut ElectionForm) -> Result<TxHash, ClientError> {
        let validated = form.validate(self.contract_address)?;

        let started = self.phase.send_if_modified(|phase| {
            if *phase != CreationPhase::Editing {
                return false;
            }
            *phase = CreationPhase::Uploading;
            true
        });
        if !started {
            return Err(ClientError::SubmissionInFlight);
        }
        let _reset = PhaseReset(&self.phase);

        let tx_hash = self.upload_and_submit(validated).await?;
        form.reset();
        Ok(tx_hash)
    }

    async fn upload_and_submit(&self, form: ValidatedForm) -> Result<TxHash, ClientError> {
        let photos: Vec<&PhotoFile> = form.candidates.iter().map(|(_, photo)| photo).collect();
        let cids = self.scope.run(self.upload_all(&photos)).await??;

        let draft = ElectionDraft {
            title: form.title,
            description: form.description,
            start: form.start,
            end: form.end,
            whitelist: form.whitelist,
            candidates: form
                .candidates
                .into_iter()
                .zip(cids)
                .map(|((name, _), photo)| CandidateDraft { name, photo })
                .collect(),
        };

        self.phase.send_replace(CreationPhase::Submitting);
        let tx_hash = self
            .writer
            .create_election(&draft)
            .await
            .map_err(ClientError::submission)?;
        tracing::info!(
            %tx_hash,
            contract = %form.contract_address,
            title = %draft.title,
            "Submitted election"
        );

        self.phase.send_replace(CreationPhase::Confirming);
        let confirmation = self
            .scope
            .run(self.writer.wait_for_confirmation(tx_hash))
            .await?
            .map_err(ClientError::confirmation)?;
        match confirmation {
            Confirmation::Succeeded => {
                tracing::info!(%tx_hash, "Election created");
                Ok(tx_hash)
            }
            Confirmation::Reverted => Err(ClientError::Reverted(tx_hash)),
        }
    }

    /// Uploads every photo concurrently. The first failure abandons the rest,
    /// and nothing uploaded so far is kept for a retry.
    async fn upload_all(&self, photos: &[&PhotoFile]) -> Result<Vec<ContentId>, ClientError> {
        let uploads = photos.iter().map(|photo| async move {
            self.storage
                .upload(photo)
                .await
                .map_err(|e| ClientError::Upload {
                    file: photo.file_name.clone(),
                    message: e.to_string(),
                })
        });
        let cids = try_join_all(uploads).await;
        if let Err(error) = &cids {
            tracing::warn!(%error, "Photo upload failed, election not submitted");
        }
        cids
    }
}
