//! The TOML file `organizer create` reads an election from.
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use trustvote_client::creation::{ElectionForm, WhitelistDialog, MAX_CANDIDATES};
use trustvote_interface::services::storage::PhotoFile;

#[derive(Debug, Deserialize)]
pub struct ElectionFile {
    pub title: String,
    pub description: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub whitelist: Vec<String>,
    #[serde(default)]
    pub candidates: Vec<CandidateEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateEntry {
    pub name: String,
    /// Relative paths are resolved against the election file's directory.
    pub photo: Option<PathBuf>,
}

impl ElectionFile {
    /// Fills a creation form, reading the photos from disk.
    pub fn into_form(self, base_dir: &Path) -> anyhow::Result<ElectionForm> {
        anyhow::ensure!(
            self.candidates.len() <= MAX_CANDIDATES,
            "An election has at most {MAX_CANDIDATES} candidates, the file lists {}",
            self.candidates.len()
        );

        let mut form = ElectionForm::new();
        form.title = self.title;
        form.description = self.description;
        form.start = self.start;
        form.end = self.end;

        while form.candidates().len() < self.candidates.len() {
            form.add_candidate();
        }
        let rows: Vec<u32> = form.candidates().iter().map(|c| c.local_id).collect();
        for (local_id, entry) in rows.into_iter().zip(self.candidates) {
            let photo = entry
                .photo
                .map(|path| read_photo(&base_dir.join(path)))
                .transpose()?;
            if let Some(row) = form.candidate_mut(local_id) {
                row.name = entry.name;
                row.photo = photo;
            }
        }

        let mut dialog = WhitelistDialog::open(form.whitelist());
        for entry in &self.whitelist {
            dialog
                .add(entry)
                .with_context(|| format!("Cannot whitelist {entry:?}"))?;
        }
        // An empty list is left for `ElectionForm::validate` to report in order.
        let whitelist = if self.whitelist.is_empty() {
            dialog.entries().to_vec()
        } else {
            dialog.save()?
        };
        form.set_whitelist(whitelist);
        Ok(form)
    }
}

fn read_photo(path: &Path) -> anyhow::Result<PhotoFile> {
    let bytes = std::fs::read(path).with_context(|| format!("Cannot read photo {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string());
    let mut photo = PhotoFile::new(file_name, bytes);
    if let Some(content_type) = content_type(path) {
        photo = photo.with_content_type(content_type);
    }
    Ok(photo)
}

fn content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
