use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

use crate::api::handlers::AppState;
use crate::error::ApiError;

/// Bearer check in front of the parse and task routes. With no token
/// configured every request passes (open mode).
pub async fn require_token<B>(
    State(state): State<AppState>,
    request: Request<B>,
    next: Next<B>,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.gateway.config().api_token.as_deref() {
        let header = request
            .headers()
            .get(AUTHORIZATION)
            .map(|value| value.to_str().unwrap_or_default());
        if let Err(err) = check_bearer(header, expected) {
            tracing::warn!("rejected {} {}: {}", request.method(), request.uri().path(), err);
            return Err(err);
        }
    }
    Ok(next.run(request).await)
}

pub fn check_bearer(header: Option<&str>, expected: &str) -> Result<(), ApiError> {
    let header = header.ok_or_else(|| ApiError::Auth("missing Authorization header".to_string()))?;
    let token = match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => return Err(ApiError::Auth("invalid Authorization format".to_string())),
    };
    if bool::from(token.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(ApiError::Auth("invalid token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::missing(None, Some("missing Authorization header"))]
    #[case::basic(Some("Basic c2VjcmV0"), Some("invalid Authorization format"))]
    #[case::no_scheme(Some("secret"), Some("invalid Authorization format"))]
    #[case::wrong(Some("Bearer nope"), Some("invalid token"))]
    #[case::prefix(Some("Bearer secre"), Some("invalid token"))]
    #[case::longer(Some("Bearer secrets"), Some("invalid token"))]
    #[case::empty_token(Some("Bearer "), Some("invalid token"))]
    #[case::ok(Some("Bearer secret"), None)]
    #[case::lowercase_scheme(Some("bearer secret"), None)]
    fn bearer_header_checks(#[case] header: Option<&str>, #[case] failure: Option<&str>) {
        let result = check_bearer(header, "secret");
        match failure {
            None => assert!(result.is_ok()),
            Some(detail) => {
                let err = result.unwrap_err();
                assert!(matches!(err, ApiError::Auth(_)));
                assert_eq!(err.to_string(), detail);
            }
        }
    }
}
