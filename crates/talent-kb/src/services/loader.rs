//! Bulk loading of candidate profiles from JSON files

use std::path::Path;
use tracing::{info, instrument};

use crate::data::{CandidateProfile, CoreError};
use crate::services::repository::{BatchReport, CandidateRepository};

/// Reads a JSON array of candidate profiles.
pub async fn read_profiles(path: &Path) -> Result<Vec<CandidateProfile>, CoreError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let profiles: Vec<CandidateProfile> = serde_json::from_str(&raw)?;
    Ok(profiles)
}

/// Loads every profile in `path` into the repository.
///
/// With `wipe`, both stores are reset first so the file becomes the whole
/// data set. The file is parsed before anything is reset, so an unreadable
/// file leaves existing data in place.
#[instrument(skip(repository), fields(path = %path.display()))]
pub async fn load_profiles(
    repository: &CandidateRepository,
    path: &Path,
    wipe: bool,
) -> Result<BatchReport, CoreError> {
    let profiles = read_profiles(path).await?;
    info!(profiles = profiles.len(), "Read candidate profiles");

    if wipe {
        repository.reset().await?;
    }

    repository.ingest_many(profiles).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_read_profiles() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"full_name": "A", "willing_to_travel": true}}, {{"full_name": "B", "education": null}}]"#
        )
        .unwrap();

        let profiles = read_profiles(file.path()).await.unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].willing_to_travel, Some(true));
        assert!(profiles[1].education.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"full_name": "not an array"}}"#).unwrap();
        assert!(matches!(
            read_profiles(file.path()).await,
            Err(CoreError::SerializationError(_))
        ));

        let missing = Path::new("/definitely/not/here.json");
        assert!(matches!(read_profiles(missing).await, Err(CoreError::Io(_))));
    }
}
