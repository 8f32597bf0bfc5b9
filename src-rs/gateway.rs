use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::config::{ConfigError, GatewayConfig};
use crate::error::ApiError;
use crate::gate::{AdmissionGate, AdmissionPermit};
use crate::ingest::PreparedDocument;
use crate::parser::resolver::{content_list_path, markdown_path, result_dir};
use crate::parser::{DocumentParser, ParseJob, ParseOptions, ParserExecutor};
use crate::result::ParseOutput;
use crate::task::TaskStore;

const MODELS_READY_MARKER: &str = ".models_ready";

/// Process-wide service state, built once at startup and shared by every
/// handler and background job.
pub struct Gateway {
    config: GatewayConfig,
    gate: AdmissionGate,
    tasks: Arc<TaskStore>,
    executor: ParserExecutor,
    http: reqwest::Client,
    started_at: Instant,
}

impl Gateway {
    pub fn new(config: GatewayConfig, parser: Arc<dyn DocumentParser>) -> Result<Self, ConfigError> {
        std::fs::create_dir_all(&config.output_dir).map_err(|source| ConfigError::OutputDir {
            path: config.output_dir.clone(),
            source,
        })?;
        let http = reqwest::Client::builder()
            .timeout(config.download_timeout)
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;

        Ok(Self {
            gate: AdmissionGate::new(config.max_concurrent_requests),
            tasks: Arc::new(TaskStore::new()),
            executor: ParserExecutor::new(parser, config.execution_mode),
            http,
            started_at: Instant::now(),
            config,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn tasks(&self) -> &Arc<TaskStore> {
        &self.tasks
    }

    pub fn executor(&self) -> &ParserExecutor {
        &self.executor
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn models_loaded(&self) -> bool {
        self.config.models_dir.join(MODELS_READY_MARKER).exists()
    }

    /// Synchronous entry: take a slot without waiting or fail with
    /// capacity-exceeded, then parse.
    pub async fn parse_now(
        &self,
        document: PreparedDocument,
        options: &ParseOptions,
    ) -> Result<ParseOutput, ApiError> {
        let permit = self.gate.try_acquire().map_err(|err| {
            tracing::warn!("rejecting {}: {}", document.stem, err);
            ApiError::from(err)
        })?;
        self.parse_admitted(permit, document, options).await
    }

    /// Runs the parser for an already admitted document and collects its
    /// output. The scratch directory is removed on every exit path.
    pub async fn parse_admitted(
        &self,
        permit: AdmissionPermit,
        document: PreparedDocument,
        options: &ParseOptions,
    ) -> Result<ParseOutput, ApiError> {
        let started = Instant::now();
        let scratch = tempfile::Builder::new()
            .prefix("job-")
            .tempdir_in(&self.config.output_dir)
            .map_err(|err| ApiError::Internal(format!("failed to create scratch dir: {}", err)))?;

        let stem = document.stem;
        let document_pages = document.page_count;
        tracing::info!(
            "parsing {} ({} bytes, backend={}, method={})",
            stem,
            document.pdf.len(),
            options.backend,
            options.parse_method
        );
        let job = ParseJob {
            document: document.pdf,
            stem: stem.clone(),
            output_root: scratch.path().to_path_buf(),
            options: options.clone(),
            deadline: self.config.parse_timeout,
        };
        if let Err(err) = self.executor.run(job, permit).await {
            tracing::error!("parser failed for {}: {}", stem, err);
            return Err(err.into());
        }

        let dir = result_dir(options.backend, options.parse_method, &stem, scratch.path());
        let markdown = read_if_present(&markdown_path(&dir, &stem)).await?;
        let content_list = match read_if_present(&content_list_path(&dir, &stem)).await? {
            Some(raw) => Some(serde_json::from_str::<Vec<Value>>(&raw).map_err(|err| {
                ApiError::ParseFailure(format!("malformed content list: {}", err))
            })?),
            None => None,
        };
        if markdown.is_none() && content_list.is_none() {
            return Err(ApiError::ParseFailure(format!(
                "parser produced no output under {}",
                dir.display()
            )));
        }

        // The input PDF is authoritative; the content list only covers pages
        // that produced blocks.
        let mut page_count = document_pages.unwrap_or_else(|| {
            content_list
                .as_deref()
                .map(ParseOutput::count_pages)
                .unwrap_or(0)
        });
        if let Some(max_pages) = options.max_pages {
            page_count = page_count.min(max_pages as usize);
        }
        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!("parsed {}: {} pages in {} ms", stem, page_count, elapsed_ms);

        Ok(ParseOutput {
            status: "success".to_string(),
            markdown,
            elapsed_ms,
            page_count,
            backend: options.backend.as_str().to_string(),
            version: self.executor.parser_version(),
            content_list,
        })
    }
}

async fn read_if_present(path: &Path) -> Result<Option<String>, ApiError> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(ApiError::Internal(format!(
            "failed to read {}: {}",
            path.display(),
            err
        ))),
    }
}
