//! Where the parser leaves its output. Every caller goes through here.

use std::path::{Path, PathBuf};

use super::types::{Backend, ParseMethod};

pub fn result_dir(backend: Backend, method: ParseMethod, stem: &str, root: &Path) -> PathBuf {
    let leaf = match backend {
        Backend::Pipeline => method.as_str().to_string(),
        other if other.as_str().starts_with("vlm") => "vlm".to_string(),
        _ => format!("hybrid_{}", method.as_str()),
    };
    root.join(stem).join(leaf)
}

pub fn markdown_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{}.md", stem))
}

pub fn content_list_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{}_content_list.json", stem))
}
