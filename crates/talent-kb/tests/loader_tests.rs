//! Loading the bundled sample data set through the repository.

use pretty_assertions::assert_eq;
use std::path::PathBuf;
use tempfile::TempDir;

use talent_kb::{
    load_profiles, BrowseFilter, CandidateId, CandidateRepository, EmbeddingConfig, JobQuery,
    KbConfig, PageRequest,
};

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/sample_candidates.json")
}

async fn open(dir: &TempDir) -> CandidateRepository {
    let config = KbConfig {
        db_path: dir.path().join("candidates.db"),
        index_path: dir.path().join("candidates.index"),
        embedding: EmbeddingConfig::Hashing { dimensions: 384 },
        ..KbConfig::default()
    };
    CandidateRepository::open(&config).await.unwrap()
}

#[test_log::test(tokio::test)]
async fn test_load_with_wipe_replaces_the_data_set() {
    let dir = TempDir::new().unwrap();
    let repo = open(&dir).await;

    let report = load_profiles(&repo, &sample_path(), true).await.unwrap();
    assert_eq!(report.ingested.len(), 6);
    assert!(report.failures.is_empty());

    // Loading again with wipe starts over rather than duplicating.
    let report = load_profiles(&repo, &sample_path(), true).await.unwrap();
    assert_eq!(report.ingested.first(), Some(&CandidateId(1)));
    assert_eq!(repo.total_candidate_count().await.unwrap(), 6);
    assert!(repo.audit().await.unwrap().is_consistent());
}

#[test_log::test(tokio::test)]
async fn test_load_without_wipe_reports_duplicates() {
    let dir = TempDir::new().unwrap();
    let repo = open(&dir).await;

    load_profiles(&repo, &sample_path(), false).await.unwrap();
    let report = load_profiles(&repo, &sample_path(), false).await.unwrap();

    // Only the profile with a blank email can be stored twice.
    assert_eq!(report.ingested.len(), 1);
    assert_eq!(report.failures.len(), 5);
    assert!(report.failures.iter().all(|f| f.error.contains("Constraint violation")));
    assert_eq!(repo.total_candidate_count().await.unwrap(), 7);
    assert!(repo.audit().await.unwrap().is_consistent());
}

#[test_log::test(tokio::test)]
async fn test_sample_data_filters_and_search() {
    let dir = TempDir::new().unwrap();
    let repo = open(&dir).await;
    load_profiles(&repo, &sample_path(), true).await.unwrap();

    let boston_nurses = BrowseFilter::default().location("Boston").title("nurse").travel(true);
    let page = repo.browse(&boston_nurses, PageRequest::new(1, 10)).await.unwrap();
    let names: Vec<_> = page
        .candidates
        .iter()
        .map(|c| c.profile.full_name.as_str())
        .collect();
    assert_eq!(names, vec!["Maria Gonzalez"]);

    let accountants = BrowseFilter::default().title("accountant");
    let page = repo.browse(&accountants, PageRequest::new(1, 10)).await.unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.candidates[0].profile.full_name, "Luis Fernandez");

    let blank_email = repo.get(CandidateId(4)).await.unwrap().unwrap();
    assert_eq!(blank_email.profile.full_name, "Tom Becker");
    assert_eq!(blank_email.profile.email, None);

    let mut job = JobQuery::new(
        "Staff Accountant",
        "Staff accountant for payroll and month-end close",
    );
    job.location = Some("Denver".to_string());
    let result = repo.search_job(&job, 5).await.unwrap();
    assert_eq!(result.hits.len(), 5);
    assert_eq!(result.hits[0].candidate.profile.full_name, "Luis Fernandez");
    assert!(result
        .hits
        .windows(2)
        .all(|pair| pair[0].distance <= pair[1].distance));
}

#[test_log::test(tokio::test)]
async fn test_unreadable_file_leaves_data_in_place() {
    let dir = TempDir::new().unwrap();
    let repo = open(&dir).await;
    load_profiles(&repo, &sample_path(), true).await.unwrap();

    let missing = dir.path().join("missing.json");
    assert!(load_profiles(&repo, &missing, true).await.is_err());
    assert_eq!(repo.total_candidate_count().await.unwrap(), 6);
}
