use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The structured outcome of one successful parse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParseOutput {
    pub status: String,
    pub markdown: Option<String>,
    pub elapsed_ms: u64,
    pub page_count: usize,
    pub backend: String,
    pub version: String,
    pub content_list: Option<Vec<Value>>,
}

impl ParseOutput {
    /// Distinct `page_idx` values seen in a content listing.
    pub fn count_pages(content_list: &[Value]) -> usize {
        let mut pages: Vec<u64> = content_list
            .iter()
            .filter_map(|item| item.get("page_idx").and_then(|v| v.as_u64()))
            .collect();
        pages.sort_unstable();
        pages.dedup();
        pages.len()
    }
}
