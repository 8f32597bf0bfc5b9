use percent_encoding::percent_decode_str;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, Url};

use crate::error::ApiError;

const FALLBACK_FILENAME: &str = "document.pdf";

#[derive(Debug)]
pub struct Downloaded {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Fetches `url` into memory, refusing bodies over `limit` bytes. The
/// overall deadline comes from the client's timeout.
pub async fn download(
    client: &Client,
    url: &str,
    filename: Option<&str>,
    limit: usize,
) -> Result<Downloaded, ApiError> {
    let parsed = Url::parse(url.trim())
        .map_err(|err| ApiError::Validation(format!("invalid url {}: {}", url, err)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::Validation(format!(
            "unsupported url scheme: {}",
            parsed.scheme()
        )));
    }

    tracing::info!("downloading {}", parsed);
    let mut response = client
        .get(parsed.clone())
        .send()
        .await
        .map_err(transport_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::DownloadFailure(format!(
            "HTTP {} from {}",
            status.as_u16(),
            parsed
        )));
    }
    if let Some(length) = response.content_length() {
        if length > limit as u64 {
            return Err(ApiError::PayloadTooLarge { limit });
        }
    }

    let header_name = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(disposition_filename);

    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(transport_error)? {
        if bytes.len() + chunk.len() > limit {
            return Err(ApiError::PayloadTooLarge { limit });
        }
        bytes.extend_from_slice(&chunk);
    }
    tracing::debug!("downloaded {} bytes from {}", bytes.len(), parsed);

    let filename = filename
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or(header_name)
        .or_else(|| url_filename(&parsed))
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string());

    Ok(Downloaded { filename, bytes })
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::DownloadFailure("timed out".to_string())
    } else {
        ApiError::DownloadFailure(err.to_string())
    }
}

/// Filename from a Content-Disposition value. `filename*` wins over
/// `filename` when both are present.
pub fn disposition_filename(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                // charset'lang'percent-encoded
                let encoded = raw.trim().splitn(3, '\'').nth(2).unwrap_or(raw.trim());
                extended = Some(percent_decode(encoded));
            }
            "filename" => plain = Some(raw.trim().trim_matches('"').to_string()),
            _ => {}
        }
    }
    extended.or(plain).filter(|name| !name.trim().is_empty())
}

fn url_filename(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(percent_decode)
}

fn percent_decode(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}
