use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_PAGES_LIMIT: u32 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    Pipeline,
    #[serde(alias = "vlm-auto-engine")]
    Vlm,
    #[serde(alias = "hybrid-auto-engine")]
    Hybrid,
    #[serde(alias = "vlm-http-client")]
    VlmRemote,
    #[serde(alias = "hybrid-http-client")]
    HybridRemote,
}

impl Backend {
    pub const ALL: [Backend; 5] = [
        Backend::Pipeline,
        Backend::Vlm,
        Backend::Hybrid,
        Backend::VlmRemote,
        Backend::HybridRemote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Pipeline => "pipeline",
            Backend::Vlm => "vlm",
            Backend::Hybrid => "hybrid",
            Backend::VlmRemote => "vlm-remote",
            Backend::HybridRemote => "hybrid-remote",
        }
    }

    /// Name understood by the parser engine itself.
    pub fn engine_name(&self) -> &'static str {
        match self {
            Backend::Pipeline => "pipeline",
            Backend::Vlm => "vlm-auto-engine",
            Backend::Hybrid => "hybrid-auto-engine",
            Backend::VlmRemote => "vlm-http-client",
            Backend::HybridRemote => "hybrid-http-client",
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Hybrid
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_lowercase();
        Backend::ALL
            .into_iter()
            .find(|backend| backend.as_str() == wanted || backend.engine_name() == wanted)
            .ok_or_else(|| format!("unknown backend: {}", raw))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParseMethod {
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "txt", alias = "text")]
    Text,
    #[serde(rename = "ocr")]
    Ocr,
}

impl ParseMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMethod::Auto => "auto",
            ParseMethod::Text => "txt",
            ParseMethod::Ocr => "ocr",
        }
    }
}

impl Default for ParseMethod {
    fn default() -> Self {
        ParseMethod::Auto
    }
}

impl fmt::Display for ParseMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParseMethod {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "auto" => Ok(ParseMethod::Auto),
            "txt" | "text" => Ok(ParseMethod::Text),
            "ocr" => Ok(ParseMethod::Ocr),
            other => Err(format!("unknown parse method: {}", other)),
        }
    }
}

/// Per-request parse configuration. Built once, validated before admission,
/// never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub backend: Backend,
    pub max_pages: Option<u32>,
    pub table_enable: bool,
    pub formula_enable: bool,
    pub lang: String,
    pub parse_method: ParseMethod,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            max_pages: None,
            table_enable: true,
            formula_enable: true,
            lang: "ch".to_string(),
            parse_method: ParseMethod::default(),
        }
    }
}

impl ParseOptions {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(pages) = self.max_pages {
            if pages < 1 || pages > MAX_PAGES_LIMIT {
                return Err(format!(
                    "max_pages must be between 1 and {}, got {}",
                    MAX_PAGES_LIMIT, pages
                ));
            }
        }
        if self.lang.is_empty() || self.lang.len() > 32 {
            return Err("lang must be 1 to 32 characters".to_string());
        }
        if !self
            .lang
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(format!("invalid lang: {}", self.lang));
        }
        Ok(())
    }

    /// Zero-based index of the last page to parse, if bounded.
    pub fn end_page(&self) -> Option<u32> {
        self.max_pages.map(|pages| pages - 1)
    }
}

/// Everything the external parser needs for one document.
#[derive(Clone, Debug)]
pub struct ParseJob {
    pub document: Vec<u8>,
    pub stem: String,
    pub output_root: PathBuf,
    pub options: ParseOptions,
    pub deadline: Duration,
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("failed to start parser: {0}")]
    Spawn(String),

    #[error("parser exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("parser timed out after {0:?}")]
    TimedOut(Duration),

    #[error("parser io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parser panicked: {0}")]
    Panicked(String),
}

/// The opaque document parser.
///
/// On success the parser must have written `<stem>.md` and
/// `<stem>_content_list.json` under `resolver::result_dir(..)` for the job's
/// output root. Nothing is streamed; callers observe only the final result.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, job: &ParseJob) -> Result<(), ParserError>;

    fn version(&self) -> String {
        "unknown".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("pipeline", Backend::Pipeline)]
    #[case::remote("vlm-remote", Backend::VlmRemote)]
    #[case::engine_alias("hybrid-auto-engine", Backend::Hybrid)]
    #[case::http_alias("hybrid-http-client", Backend::HybridRemote)]
    #[case::mixed_case(" VLM ", Backend::Vlm)]
    fn backend_parses_wire_and_engine_names(#[case] raw: &str, #[case] expected: Backend) {
        assert_eq!(raw.parse::<Backend>().unwrap(), expected);
    }

    #[test]
    fn backend_rejects_unknown_name() {
        assert!("gpu-magic".parse::<Backend>().is_err());
    }

    #[test]
    fn parse_method_accepts_text_alias() {
        assert_eq!("text".parse::<ParseMethod>().unwrap(), ParseMethod::Text);
        let parsed: ParseMethod = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(parsed.as_str(), "txt");
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: ParseOptions = serde_json::from_str(r#"{"backend": "pipeline"}"#).unwrap();
        assert_eq!(opts.backend, Backend::Pipeline);
        assert!(opts.table_enable);
        assert!(opts.formula_enable);
        assert_eq!(opts.lang, "ch");
        assert_eq!(opts.parse_method, ParseMethod::Auto);
    }

    #[rstest]
    #[case::zero(Some(0), false)]
    #[case::one(Some(1), true)]
    #[case::upper(Some(1000), true)]
    #[case::over(Some(1001), false)]
    #[case::unbounded(None, true)]
    fn max_pages_is_bounded(#[case] max_pages: Option<u32>, #[case] ok: bool) {
        let opts = ParseOptions {
            max_pages,
            ..ParseOptions::default()
        };
        assert_eq!(opts.validate().is_ok(), ok);
    }

    #[test]
    fn lang_must_be_a_plain_token() {
        let opts = ParseOptions {
            lang: "en; rm -rf".to_string(),
            ..ParseOptions::default()
        };
        assert!(opts.validate().is_err());

        let opts = ParseOptions {
            lang: String::new(),
            ..ParseOptions::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn end_page_is_zero_based() {
        let opts = ParseOptions {
            max_pages: Some(20),
            ..ParseOptions::default()
        };
        assert_eq!(opts.end_page(), Some(19));
        assert_eq!(ParseOptions::default().end_page(), None);
    }
}
