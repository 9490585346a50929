use crate::modules::models::response::ErrorResponse;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::Json;
use http::request::Parts;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Codeforces handles: 3-24 characters of letters, digits, underscore,
/// period and dash.
static HANDLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{3,24}$").unwrap());

fn validate_handle(value: &str) -> Result<(), ValidationError> {
    if HANDLE_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid handle"))
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct RefreshQueryParameters {
    #[validate(custom = "validate_handle")]
    pub handle: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct CountsQueryParameters {
    pub solved: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct HeatmapQueryParameters {
    #[validate(range(min = 2000, max = 2100))]
    pub year: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct UnsolvedQueryParameters {
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

pub struct ValidatedQueryParameters<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQueryParameters<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or_default();
        let value: T = serde_urlencoded::from_str(query).map_err(|rejection| {
            tracing::error!("Parsing error: {}", rejection);
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(format!(
                    "invalid format query string: [{}]",
                    rejection
                ))),
            )
        })?;

        value.validate().map_err(|rejection| {
            tracing::error!("Validation error: {}", rejection);
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    format!("Validation error: [{}]", rejection).replace('\n', ", "),
                )),
            )
        })?;

        Ok(ValidatedQueryParameters(value))
    }
}
