//! Candidate profile entities and their stored representation

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::data::errors::CoreError;
use crate::data::identifiers::CandidateId;

/// One entry of a candidate's education history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default)]
    pub institution_name: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    /// Graduation year. Accepted as a JSON string or number, held as text.
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: Option<String>,
}

/// One entry of a candidate's work history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// A candidate profile as submitted for ingestion, before an id exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub full_name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub willing_to_travel: Option<bool>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub languages_spoken: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub education: Vec<EducationEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub experience: Vec<ExperienceEntry>,
}

impl CandidateProfile {
    /// Creates a profile with only the required name set.
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            ..Default::default()
        }
    }

    /// Builds the single text document embedded for this profile.
    ///
    /// The format is fixed: search relevance depends entirely on it, so any
    /// change here invalidates every vector already in the index.
    pub fn embedding_document(&self) -> String {
        let titles: Vec<&str> = self
            .experience
            .iter()
            .map(|exp| exp.title.as_deref().unwrap_or(""))
            .collect();
        let degrees: Vec<&str> = self
            .education
            .iter()
            .map(|edu| edu.degree.as_deref().unwrap_or(""))
            .collect();

        format!(
            "Bio: {}. Experience titles: {}. Education: {}. Languages: {}",
            self.bio.as_deref().unwrap_or(""),
            titles.join(", "),
            degrees.join(", "),
            self.languages_spoken.join(", "),
        )
    }

    /// Checks the profile can be stored and normalises blank optional keys.
    ///
    /// A blank email becomes absent so that profiles without one never collide
    /// on the unique email constraint.
    pub fn into_validated(mut self) -> Result<Self, CoreError> {
        if self.full_name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "full_name must not be empty".to_string(),
            ));
        }

        if self.email.as_deref().map(str::trim).is_some_and(str::is_empty) {
            self.email = None;
        } else if let Some(email) = self.email.take() {
            self.email = Some(email.trim().to_string());
        }

        Ok(self)
    }
}

/// A stored candidate: the profile plus its store-assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    #[serde(flatten)]
    pub profile: CandidateProfile,
}

/// Structured job posting used to compose a free-text search query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobQuery {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub required_languages: Option<String>,
}

impl JobQuery {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Joins the posting into the query text handed to the embedder.
    /// Empty optional parts are left out.
    pub fn to_query_text(&self) -> String {
        let mut parts = vec![
            format!("Job Title: {}", self.title),
            format!("Job Description: {}", self.description),
        ];
        if let Some(location) = self.location.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("Location: {}", location));
        }
        if let Some(languages) = self.required_languages.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("Required Languages: {}", languages));
        }
        parts.join(". ")
    }
}

/// Encodes a composite field for its text column.
pub fn encode_list<T: Serialize>(items: &[T]) -> Result<String, serde_json::Error> {
    serde_json::to_string(items)
}

/// Decodes a composite field column. NULL, empty text and JSON `null` all
/// yield an empty list.
pub fn decode_list<T: DeserializeOwned>(raw: Option<&str>) -> Result<Vec<T>, serde_json::Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => Ok(serde_json::from_str::<Option<Vec<T>>>(text)?.unwrap_or_default()),
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Integer(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nurse_profile() -> CandidateProfile {
        CandidateProfile {
            full_name: "Ada Byron".to_string(),
            location: Some("Boston, MA".to_string()),
            willing_to_travel: Some(true),
            phone: None,
            email: Some("ada@example.com".to_string()),
            bio: Some("ICU nurse with ten years of critical care".to_string()),
            languages_spoken: vec!["English".to_string(), "Spanish".to_string()],
            education: vec![EducationEntry {
                institution_name: Some("Boston College".to_string()),
                degree: Some("BSN".to_string()),
                year: Some("2012".to_string()),
            }],
            experience: vec![
                ExperienceEntry {
                    company_name: Some("Mass General".to_string()),
                    title: Some("ICU Nurse".to_string()),
                    start_date: Some("2014-01".to_string()),
                    end_date: None,
                },
                ExperienceEntry {
                    company_name: Some("Tufts".to_string()),
                    title: Some("Charge Nurse".to_string()),
                    start_date: None,
                    end_date: None,
                },
            ],
        }
    }

    #[test]
    fn test_embedding_document_format() {
        let doc = nurse_profile().embedding_document();
        assert_eq!(
            doc,
            "Bio: ICU nurse with ten years of critical care. \
             Experience titles: ICU Nurse, Charge Nurse. \
             Education: BSN. Languages: English, Spanish"
        );
    }

    #[test]
    fn test_embedding_document_with_empty_profile() {
        let doc = CandidateProfile::new("Nobody").embedding_document();
        assert_eq!(doc, "Bio: . Experience titles: . Education: . Languages: ");
    }

    #[test]
    fn test_composite_fields_round_trip() {
        let profile = nurse_profile();

        let languages = encode_list(&profile.languages_spoken).unwrap();
        let education = encode_list(&profile.education).unwrap();
        let experience = encode_list(&profile.experience).unwrap();

        let languages_back: Vec<String> = decode_list(Some(&languages)).unwrap();
        let education_back: Vec<EducationEntry> = decode_list(Some(&education)).unwrap();
        let experience_back: Vec<ExperienceEntry> = decode_list(Some(&experience)).unwrap();

        assert_eq!(languages_back, profile.languages_spoken);
        assert_eq!(education_back, profile.education);
        assert_eq!(experience_back, profile.experience);
    }

    #[test]
    fn test_absent_composite_fields_decode_to_empty() {
        let from_null_column: Vec<String> = decode_list(None).unwrap();
        let from_empty_text: Vec<EducationEntry> = decode_list(Some("")).unwrap();
        let from_json_null: Vec<ExperienceEntry> = decode_list(Some("null")).unwrap();

        assert!(from_null_column.is_empty());
        assert!(from_empty_text.is_empty());
        assert!(from_json_null.is_empty());
    }

    #[test]
    fn test_profile_json_accepts_nulls_and_numeric_years() {
        let json = r#"{
            "full_name": "Grace Hopper",
            "languages_spoken": null,
            "education": [{"institution_name": "Yale", "degree": "PhD", "year": 1934}],
            "experience": null
        }"#;

        let profile: CandidateProfile = serde_json::from_str(json).unwrap();
        assert!(profile.languages_spoken.is_empty());
        assert!(profile.experience.is_empty());
        assert_eq!(profile.education[0].year.as_deref(), Some("1934"));
        assert_eq!(profile.willing_to_travel, None);
    }

    #[test]
    fn test_candidate_serializes_flat() {
        let candidate = Candidate {
            id: CandidateId(3),
            profile: CandidateProfile::new("Flat Person"),
        };
        let value = serde_json::to_value(&candidate).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["full_name"], "Flat Person");
        assert!(value["languages_spoken"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_validation_normalises_blank_email() {
        let mut profile = CandidateProfile::new("Blank Email");
        profile.email = Some("   ".to_string());
        let profile = profile.into_validated().unwrap();
        assert_eq!(profile.email, None);

        let mut profile = CandidateProfile::new("Padded Email");
        profile.email = Some(" pad@example.com ".to_string());
        let profile = profile.into_validated().unwrap();
        assert_eq!(profile.email.as_deref(), Some("pad@example.com"));
    }

    #[test]
    fn test_validation_rejects_empty_name() {
        let err = CandidateProfile::new("  ").into_validated().unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn test_job_query_text() {
        let mut job = JobQuery::new("Travel Nurse", "Short ICU contracts");
        assert_eq!(
            job.to_query_text(),
            "Job Title: Travel Nurse. Job Description: Short ICU contracts"
        );

        job.location = Some("Denver".to_string());
        job.required_languages = Some(String::new());
        assert_eq!(
            job.to_query_text(),
            "Job Title: Travel Nurse. Job Description: Short ICU contracts. Location: Denver"
        );

        job.required_languages = Some("Spanish".to_string());
        assert!(job.to_query_text().ends_with("Location: Denver. Required Languages: Spanish"));
    }
}
