use futures::future::join_all;
use trustvote_interface::services::storage::ContentStorage;
use trustvote_interface::Candidate;

/// A candidate with its photo resolved to a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateCard {
    /// The candidate as recorded by the contract.
    pub candidate: Candidate,
    /// Where the photo can be fetched, or the placeholder.
    pub photo_url: String,
}

/// Resolves every candidate's photo concurrently. Candidates whose photo cannot
/// be resolved get `placeholder_url`.
pub(crate) async fn resolve_photos<S: ContentStorage>(
    storage: &S,
    candidates: Vec<Candidate>,
    placeholder_url: &str,
) -> Vec<CandidateCard> {
    let urls = join_all(candidates.iter().map(|candidate| async move {
        if candidate.photo.is_empty() {
            return placeholder_url.to_string();
        }
        match storage.resolve_url(&candidate.photo).await {
            Ok(url) => url,
            Err(error) => {
                tracing::warn!(
                    candidate_id = %candidate.id,
                    cid = %candidate.photo,
                    %error,
                    "Failed to resolve candidate photo, using placeholder"
                );
                placeholder_url.to_string()
            }
        }
    }))
    .await;

    candidates
        .into_iter()
        .zip(urls)
        .map(|(candidate, photo_url)| CandidateCard {
            candidate,
            photo_url,
        })
        .collect()
}
