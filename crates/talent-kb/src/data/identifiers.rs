//! Identifier types shared by the attribute store and the vector index

use serde::{Deserialize, Serialize};
use std::fmt;

/// Candidate identifier, assigned by the attribute store on insert.
///
/// The same value keys the candidate's vector in the vector index, so it is
/// the join key between the two stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub i64);

impl CandidateId {
    /// Returns the raw integer value.
    pub fn get(self) -> i64 {
        self.0
    }

    /// Store-assigned ids start at 1. Anything lower is a "no match"
    /// marker from an index backend and never names a real candidate.
    pub fn is_assigned(self) -> bool {
        self.0 >= 1
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CandidateId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_ids_are_not_assigned() {
        assert!(CandidateId(1).is_assigned());
        assert!(CandidateId(42).is_assigned());
        assert!(!CandidateId(0).is_assigned());
        assert!(!CandidateId(-1).is_assigned());
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&CandidateId(7)).unwrap();
        assert_eq!(json, "7");
        let back: CandidateId = serde_json::from_str("7").unwrap();
        assert_eq!(back, CandidateId(7));
    }
}
