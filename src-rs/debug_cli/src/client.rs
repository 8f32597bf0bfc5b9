use std::path::Path;
use std::time::Duration;

use reqwest::blocking::multipart::Form;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::models::{CLIConfig, ErrorBody, ParseResponse, TaskInfo};

// Synchronous parses can run for as long as the server's parse deadline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(1800);

pub struct HTTPClient {
    pub base_url: String,
    pub token: Option<String>,
    client: Client,
}

impl HTTPClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, String> {
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let resp = req.send().map_err(|err| err.to_string())?;
        if resp.status().is_success() {
            resp.json::<T>().map_err(|err| err.to_string())
        } else {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) => Err(format!("http {} {}: {}", status.as_u16(), err.error, err.detail)),
                Err(_) => Err(format!("http {}: {}", status.as_u16(), body)),
            }
        }
    }

    fn file_form(path: &Path, cfg: &CLIConfig) -> Result<Form, String> {
        let mut form = Form::new()
            .file("file", path)
            .map_err(|err| format!("{}: {}", path.display(), err))?;
        for (key, value) in cfg.parse_fields() {
            form = form.text(key, value);
        }
        Ok(form)
    }

    pub fn parse_file(&self, path: &Path, cfg: &CLIConfig) -> Result<ParseResponse, String> {
        let form = Self::file_form(path, cfg)?;
        self.send(self.client.post(self.url("/parse")).multipart(form))
    }

    pub fn parse_url(&self, url: &str, cfg: &CLIConfig) -> Result<ParseResponse, String> {
        let mut body = json!({
            "url": url,
            "backend": cfg.backend,
            "lang": cfg.lang,
            "parse_method": cfg.parse_method,
            "table_enable": cfg.table_enable,
            "formula_enable": cfg.formula_enable,
        });
        if let Some(pages) = cfg.max_pages {
            body["max_pages"] = json!(pages);
        }
        self.send(self.client.post(self.url("/parse_url")).json(&body))
    }

    pub fn submit(&self, path: &Path, cfg: &CLIConfig) -> Result<TaskInfo, String> {
        let form = Self::file_form(path, cfg)?;
        self.send(self.client.post(self.url("/parse_async")).multipart(form))
    }

    pub fn task(&self, task_id: &str) -> Result<TaskInfo, String> {
        self.send(self.client.get(self.url(&format!("/tasks/{}", task_id))))
    }

    pub fn list_tasks(&self, limit: usize) -> Result<Vec<TaskInfo>, String> {
        let value: Value = self.send(self.client.get(self.url(&format!("/tasks?limit={}", limit))))?;
        let tasks = value
            .get("tasks")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        let mut out = Vec::new();
        for item in tasks {
            if let Ok(task) = serde_json::from_value::<TaskInfo>(item) {
                out.push(task);
            }
        }
        Ok(out)
    }

    pub fn health(&self) -> Result<Value, String> {
        self.send(self.client.get(self.url("/health")))
    }

    pub fn version(&self) -> Result<Value, String> {
        self.send(self.client.get(self.url("/version")))
    }
}
