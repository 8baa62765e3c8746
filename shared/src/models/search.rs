//! Search request types

use serde::{Deserialize, Serialize};

/// How a lookup is executed against the item index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Binary search over the sort order, returning the contiguous run of
    /// records whose sort-key field equals the query
    ExactBinary,
    /// Linear scan retaining records that contain every whitespace-split
    /// keyword as a substring of the selected field
    SubstringMultiKeyword,
}

/// Field(s) the substring filter matches against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    #[default]
    Description,
    CodeOrDescription,
}

/// One user-initiated lookup
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub mode: SearchMode,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, mode: SearchMode) -> Self {
        Self {
            query: query.into(),
            mode,
        }
    }
}
