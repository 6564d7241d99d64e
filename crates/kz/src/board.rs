use crate::error::{CliError, Result};
use kz_core::types::{ClientReview, ReviewId};
use kz_core::{MemoryStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// On-disk list of review snapshots the CLI operates on.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BoardFile {
    #[serde(default)]
    pub reviews: Vec<ClientReview>,
}

/// Review versions as they were when the board was loaded.
pub type Baseline = BTreeMap<ReviewId, u64>;

fn read_reviews(path: &Path) -> Result<Vec<ClientReview>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(CliError::io(path, err)),
    };
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let board: BoardFile = serde_json::from_str(&content).map_err(|err| CliError::Board {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    Ok(board.reviews)
}

/// Loads the board into a fresh store; a missing or empty file is an empty
/// board.
pub fn load(path: &Path) -> Result<(MemoryStore, Baseline)> {
    let reviews = read_reviews(path)?;
    let baseline = reviews
        .iter()
        .map(|review| (review.id.clone(), review.version))
        .collect();
    Ok((MemoryStore::from_reviews(reviews)?, baseline))
}

/// Merges `reviews` into the board on disk. Reviews changed since `baseline`
/// must still be at their baseline version on disk, otherwise nothing is
/// written and the save fails with a version conflict. Reviews written by
/// other processes in the meantime are kept.
pub fn save(path: &Path, baseline: &Baseline, reviews: Vec<ClientReview>) -> Result<()> {
    let mut merged: BTreeMap<ReviewId, ClientReview> = read_reviews(path)?
        .into_iter()
        .map(|review| (review.id.clone(), review))
        .collect();

    for review in reviews {
        let loaded = baseline.get(&review.id).copied();
        if loaded == Some(review.version) {
            continue;
        }
        let on_disk = merged.get(&review.id).map(|stored| stored.version);
        match (loaded, on_disk) {
            (Some(expected), Some(found)) if expected != found => {
                return Err(StoreError::VersionConflict {
                    id: review.id,
                    expected,
                    found,
                }
                .into());
            }
            (Some(_), None) => return Err(StoreError::ReviewNotFound { id: review.id }.into()),
            (None, Some(_)) => return Err(StoreError::ReviewExists { id: review.id }.into()),
            _ => {}
        }
        merged.insert(review.id.clone(), review);
    }

    let reviews = MemoryStore::from_reviews(merged.into_values().collect())?.snapshot();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| CliError::io(parent, err))?;
    }
    let mut body = serde_json::to_string_pretty(&BoardFile { reviews })?;
    body.push('\n');

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    fs::write(&tmp, body).map_err(|err| CliError::io(&tmp, err))?;
    fs::rename(&tmp, path).map_err(|err| CliError::io(path, err))?;
    Ok(())
}
