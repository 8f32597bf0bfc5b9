use serde::Deserialize;

#[derive(Clone, Debug)]
pub struct CLIConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub backend: String,
    pub lang: String,
    pub parse_method: String,
    pub max_pages: Option<u32>,
    pub table_enable: bool,
    pub formula_enable: bool,
}

impl CLIConfig {
    /// Form fields and JSON keys sent with every parse request.
    pub fn parse_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("backend", self.backend.clone()),
            ("lang", self.lang.clone()),
            ("parse_method", self.parse_method.clone()),
            ("table_enable", self.table_enable.to_string()),
            ("formula_enable", self.formula_enable.to_string()),
        ];
        if let Some(pages) = self.max_pages {
            fields.push(("max_pages", pages.to_string()));
        }
        fields
    }
}

#[derive(Debug, Deserialize)]
pub struct ParseResponse {
    pub status: String,
    pub markdown: Option<String>,
    pub elapsed_ms: u64,
    pub page_count: usize,
    pub backend: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskInfo {
    pub task_id: String,
    pub status: String,
    pub progress: f64,
    pub result: Option<ParseResponse>,
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskInfo {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "completed" | "failed")
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}
