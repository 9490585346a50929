use crate::codeforces::model::{Contest, Submission, User};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use thiserror::Error;

type Result<T> = std::result::Result<T, CodeforcesError>;

#[derive(Debug, Error)]
pub enum CodeforcesError {
    #[error("failed to request to the Codeforces API")]
    RequestError(#[from] reqwest::Error),
    #[error("failed to deserialize JSON data")]
    DeserializeError(#[from] serde_json::Error),
    #[error("invalid Codeforces API url given")]
    InvalidUrlError(#[from] url::ParseError),
    #[error("user {0} not found")]
    UserNotFoundError(String),
    #[error("Codeforces API rejected the request: {0}")]
    ApiError(String),
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum ApiStatus {
    Ok,
    Failed,
}

/// Envelope every Codeforces API method responds with. `result` is present
/// iff `status` is OK; `comment` explains a FAILED status.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: ApiStatus,
    comment: Option<String>,
    result: Option<T>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T> {
        match (self.status, self.result) {
            (ApiStatus::Ok, Some(result)) => Ok(result),
            (ApiStatus::Ok, None) => Err(CodeforcesError::ApiError(String::from(
                "status is OK but result is missing",
            ))),
            (ApiStatus::Failed, _) => Err(CodeforcesError::ApiError(
                self.comment
                    .unwrap_or(String::from("no comment provided")),
            )),
        }
    }
}

#[async_trait]
pub trait CodeforcesApi {
    async fn user_info(&self, handle: &str) -> Result<User>;
    async fn user_status(&self, handle: &str) -> Result<Vec<Submission>>;
    async fn contest_list(&self) -> Result<Vec<Contest>>;
}

pub struct RestCodeforcesApi {
    base_url: Url,
    client: Client,
}

impl RestCodeforcesApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        // Url::join drops the last path segment unless the base ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(RestCodeforcesApi { base_url, client })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.base_url.join(method)?;
        let res = self.client.get(url).query(query).send().await?;

        // The API pairs FAILED statuses with HTTP 4xx, so the body has to be
        // parsed before the status code is inspected or the comment is lost.
        let body: ApiResponse<T> = res.json().await?;
        body.into_result()
    }
}

#[async_trait]
impl CodeforcesApi for RestCodeforcesApi {
    async fn user_info(&self, handle: &str) -> Result<User> {
        let users: Vec<User> = self.call("user.info", &[("handles", handle)]).await?;

        users
            .into_iter()
            .next()
            .ok_or(CodeforcesError::UserNotFoundError(String::from(handle)))
    }

    async fn user_status(&self, handle: &str) -> Result<Vec<Submission>> {
        self.call("user.status", &[("handle", handle)]).await
    }

    async fn contest_list(&self) -> Result<Vec<Contest>> {
        self.call("contest.list", &[]).await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_envelope_with_result() {
        let body = r#"{"status": "OK", "result": [1, 2, 3]}"#;
        let response: ApiResponse<Vec<i64>> = serde_json::from_str(body).unwrap();
        assert_eq!(response.into_result().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_envelope_with_failure_comment() {
        let body = r#"{"status": "FAILED", "comment": "handles: User with handle x not found"}"#;
        let response: ApiResponse<Vec<i64>> = serde_json::from_str(body).unwrap();
        match response.into_result() {
            Err(CodeforcesError::ApiError(comment)) => {
                assert_eq!(comment, "handles: User with handle x not found")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_base_url_keeps_trailing_path() {
        let api = RestCodeforcesApi::new("https://codeforces.com/api").unwrap();
        let url = api.base_url.join("user.status").unwrap();
        assert_eq!(url.as_str(), "https://codeforces.com/api/user.status");
    }
}
