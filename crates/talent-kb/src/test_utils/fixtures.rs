use crate::data::{CandidateProfile, EducationEntry, ExperienceEntry};

const SAMPLE_CANDIDATES: &str = include_str!("../../fixtures/sample_candidates.json");

/// The bundled sample data set (six profiles across Boston, Denver,
/// Cambridge and Seattle).
pub fn sample_profiles() -> Result<Vec<CandidateProfile>, serde_json::Error> {
    serde_json::from_str(SAMPLE_CANDIDATES)
}

/// Boston ICU nurse willing to travel.
pub fn nurse_profile(name: &str, email: &str) -> CandidateProfile {
    CandidateProfile {
        full_name: name.to_string(),
        location: Some("Boston, MA".to_string()),
        willing_to_travel: Some(true),
        phone: None,
        email: Some(email.to_string()),
        bio: Some("Critical care nurse".to_string()),
        languages_spoken: vec!["English".to_string()],
        education: vec![EducationEntry {
            institution_name: Some("Boston College".to_string()),
            degree: Some("BSN".to_string()),
            year: Some("2014".to_string()),
        }],
        experience: vec![ExperienceEntry {
            company_name: Some("Mass General".to_string()),
            title: Some("ICU Nurse".to_string()),
            start_date: Some("2016-03".to_string()),
            end_date: None,
        }],
    }
}

/// Minimal profile for filter tests.
pub fn profile_at(name: &str, location: &str, title: &str, willing_to_travel: bool) -> CandidateProfile {
    CandidateProfile {
        full_name: name.to_string(),
        location: Some(location.to_string()),
        willing_to_travel: Some(willing_to_travel),
        experience: vec![ExperienceEntry {
            title: Some(title.to_string()),
            ..Default::default()
        }],
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_profiles_parse() {
        let profiles = sample_profiles().unwrap();
        assert_eq!(profiles.len(), 6);
        assert_eq!(profiles[0].education[0].year.as_deref(), Some("2014"));
        assert!(profiles[5].education.is_empty());
        assert_eq!(profiles[3].willing_to_travel, None);
    }
}
