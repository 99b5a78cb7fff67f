//! Browse predicates and pagination

use serde::{Deserialize, Serialize};

use crate::data::entities::Candidate;
use crate::data::errors::CoreError;

/// Structured predicates for browsing candidates. All supplied predicates
/// must hold (AND semantics); `None` or empty text means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseFilter {
    /// Substring of the candidate's location.
    #[serde(default)]
    pub location: Option<String>,
    /// Substring of any experience entry's title. Case folding covers ASCII
    /// letters only; other characters must match exactly.
    #[serde(default)]
    pub title: Option<String>,
    /// Exact match on willingness to travel.
    #[serde(default)]
    pub travel: Option<bool>,
}

impl BrowseFilter {
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn travel(mut self, travel: bool) -> Self {
        self.travel = Some(travel);
        self
    }

    /// Location predicate, if one is set and non-empty.
    pub fn location_pattern(&self) -> Option<&str> {
        self.location.as_deref().filter(|s| !s.is_empty())
    }

    /// Title predicate, if one is set and non-empty.
    pub fn title_pattern(&self) -> Option<&str> {
        self.title.as_deref().filter(|s| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.location_pattern().is_none() && self.title_pattern().is_none() && self.travel.is_none()
    }
}

/// 1-based page request. Page 0 is read as page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Rejects requests that cannot produce a page.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.page_size == 0 {
            return Err(CoreError::ValidationError("page_size must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub fn page_number(&self) -> u32 {
        self.page.max(1)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page_number() - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, page_size: 10 }
    }
}

/// One page of browse results together with the unpaginated total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowsePage {
    pub candidates: Vec<Candidate>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl BrowsePage {
    pub fn new(candidates: Vec<Candidate>, total_count: u64, request: PageRequest) -> Self {
        let page_size = u64::from(request.page_size.max(1));
        Self {
            candidates,
            total_count,
            page: request.page_number(),
            page_size: request.page_size,
            total_pages: total_count.div_ceil(page_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_are_one_based() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
        assert_eq!(PageRequest::new(0, 10).offset(), 0);
        assert_eq!(PageRequest::new(0, 10).page_number(), 1);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(PageRequest::new(1, 0).validate().is_err());
        assert!(PageRequest::new(1, 1).validate().is_ok());
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = BrowsePage::new(Vec::new(), 21, PageRequest::new(1, 10));
        assert_eq!(page.total_pages, 3);
        let page = BrowsePage::new(Vec::new(), 0, PageRequest::new(1, 10));
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_empty_text_predicates_are_ignored() {
        let filter = BrowseFilter::default().location("").title("");
        assert!(filter.is_empty());
        assert!(!BrowseFilter::default().travel(false).is_empty());
    }
}
