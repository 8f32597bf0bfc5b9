use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;

use crate::error::ApiError;
use crate::parser::{Backend, ParseMethod, ParseOptions};

const DEFAULT_FILENAME: &str = "document.pdf";

#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Reads a multipart parse request: one `file` part plus optional form
/// fields. The file is buffered chunk by chunk and rejected as soon as it
/// passes `limit` bytes.
pub async fn read_upload(
    mut multipart: Multipart,
    limit: usize,
) -> Result<(Upload, ParseOptions), ApiError> {
    let mut upload = None;
    let mut options = ParseOptions::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or(DEFAULT_FILENAME)
                    .to_string();
                let bytes = read_bounded(field, limit).await?;
                upload = Some(Upload { filename, bytes });
            }
            "backend" => {
                options.backend = text(field)
                    .await?
                    .parse::<Backend>()
                    .map_err(ApiError::Validation)?;
            }
            "parse_method" => {
                options.parse_method = text(field)
                    .await?
                    .parse::<ParseMethod>()
                    .map_err(ApiError::Validation)?;
            }
            "max_pages" => {
                let raw = text(field).await?;
                options.max_pages = if raw.is_empty() {
                    None
                } else {
                    Some(raw.parse::<u32>().map_err(|_| {
                        ApiError::Validation(format!("max_pages must be an integer, got {}", raw))
                    })?)
                };
            }
            "table_enable" => options.table_enable = flag("table_enable", &text(field).await?)?,
            "formula_enable" => {
                options.formula_enable = flag("formula_enable", &text(field).await?)?
            }
            "lang" => options.lang = text(field).await?,
            other => tracing::debug!("ignoring unknown form field {}", other),
        }
    }

    let upload = upload.ok_or_else(|| ApiError::Validation("missing file field".to_string()))?;
    options.validate().map_err(ApiError::Validation)?;
    Ok((upload, options))
}

async fn read_bounded(mut field: Field<'_>, limit: usize) -> Result<Vec<u8>, ApiError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(malformed)? {
        if buf.len() + chunk.len() > limit {
            return Err(ApiError::PayloadTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

async fn text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map(|value| value.trim().to_string())
        .map_err(malformed)
}

fn malformed(err: MultipartError) -> ApiError {
    ApiError::Validation(format!("invalid multipart body: {}", err))
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn flag(name: &str, value: &str) -> Result<bool, ApiError> {
    parse_flag(value)
        .ok_or_else(|| ApiError::Validation(format!("{} must be a boolean, got {}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::true_word("true", Some(true))]
    #[case::yes("YES", Some(true))]
    #[case::one("1", Some(true))]
    #[case::off("off", Some(false))]
    #[case::zero(" 0 ", Some(false))]
    #[case::junk("maybe", None)]
    fn flags_accept_common_spellings(#[case] raw: &str, #[case] expected: Option<bool>) {
        assert_eq!(parse_flag(raw), expected);
    }

    #[test]
    fn bad_flag_is_a_validation_error() {
        let err = flag("table_enable", "sometimes").unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg.contains("table_enable")));
    }
}
