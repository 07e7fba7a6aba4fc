use serde::{Deserialize, Serialize};

/// An AI-produced reading suggestion. Ephemeral: lives only while the
/// requesting view is open, never persisted.
///
/// Field names follow the JSON shape the model is asked to produce, so a
/// structured response deserializes directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSuggestion {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub cover_url: Option<String>,
}

/// One hit from the online book search, also ephemeral. Feeds the add-book
/// flow; missing page counts and dates get defaults there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub pages: Option<i64>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}
