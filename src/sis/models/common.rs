use serde::{Deserialize, Serialize};

/// A code/description pair as returned by the SIS listing endpoints
/// (subjects, instructors, attributes, campuses, colleges).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pair {
    pub code: String,
    pub description: String,
}
