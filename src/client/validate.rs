//! One-shot reachability check used when a base URL is saved.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;
use thiserror::Error;

use super::{MemoryServiceClient, format_endpoint};

const VALIDATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors surfaced to the host when a base URL fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialValidationError {
    /// The base URL was empty after trimming trailing slashes.
    #[error("base_url is required")]
    MissingBaseUrl,
    /// None of the health checks succeeded.
    #[error("Cannot reach mem-dm service with provided base_url")]
    Unreachable,
}

impl MemoryServiceClient {
    /// Check that `base_url` points at a live memory service.
    ///
    /// `GET /` and `GET /docs` count as healthy on 200 or 307. When both fail, a dummy
    /// `POST /search` answering 200, 400, or 422 still proves the service is there.
    pub async fn validate_credentials(
        &self,
        base_url: &str,
    ) -> Result<(), CredentialValidationError> {
        let base_url = base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(CredentialValidationError::MissingBaseUrl);
        }

        for path in ["/", "/docs"] {
            let url = format_endpoint(base_url, path);
            match self
                .http
                .get(&url)
                .timeout(VALIDATION_TIMEOUT)
                .send()
                .await
            {
                Ok(response)
                    if matches!(
                        response.status(),
                        StatusCode::OK | StatusCode::TEMPORARY_REDIRECT
                    ) =>
                {
                    tracing::debug!(url = %url, status = response.status().as_u16(), "Base URL validated");
                    return Ok(());
                }
                Ok(response) => {
                    tracing::debug!(url = %url, status = response.status().as_u16(), "Health check rejected");
                }
                Err(error) => {
                    tracing::debug!(url = %url, error = %error, "Health check failed");
                }
            }
        }

        let url = format_endpoint(base_url, "search");
        let ping = json!({ "query": "ping", "user_id": "dify_ping" });
        match self
            .http
            .post(&url)
            .timeout(VALIDATION_TIMEOUT)
            .json(&ping)
            .send()
            .await
        {
            Ok(response)
                if matches!(
                    response.status(),
                    StatusCode::OK | StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
                ) =>
            {
                tracing::debug!(url = %url, status = response.status().as_u16(), "Search ping validated base URL");
                Ok(())
            }
            Ok(response) => {
                tracing::warn!(url = %url, status = response.status().as_u16(), "Base URL validation failed");
                Err(CredentialValidationError::Unreachable)
            }
            Err(error) => {
                tracing::warn!(url = %url, error = %error, "Base URL validation failed");
                Err(CredentialValidationError::Unreachable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::build_http_client;
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };

    fn client() -> MemoryServiceClient {
        MemoryServiceClient::with_http(build_http_client("mem-dm-test").expect("client"))
    }

    #[tokio::test]
    async fn empty_base_url_is_rejected() {
        let error = client().validate_credentials("///").await.expect_err("empty");
        assert_eq!(error, CredentialValidationError::MissingBaseUrl);
        assert_eq!(error.to_string(), "base_url is required");
    }

    #[tokio::test]
    async fn root_redirect_counts_as_healthy() {
        let server = MockServer::start_async().await;
        let root = server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(307).header("location", "/docs");
            })
            .await;
        let docs = server
            .mock_async(|when, then| {
                when.method(GET).path("/docs");
                then.status(200);
            })
            .await;

        client()
            .validate_credentials(&format!("{}/", server.base_url()))
            .await
            .expect("valid");

        root.assert_hits_async(1).await;
        docs.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn docs_endpoint_is_tried_second() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(404);
            })
            .await;
        let docs = server
            .mock_async(|when, then| {
                when.method(GET).path("/docs");
                then.status(200);
            })
            .await;

        client()
            .validate_credentials(&server.base_url())
            .await
            .expect("valid");
        docs.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn search_ping_is_the_last_resort() {
        let server = MockServer::start_async().await;
        let ping = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/search")
                    .json_body(json!({ "query": "ping", "user_id": "dify_ping" }));
                then.status(422).json_body(json!({ "detail": "validation" }));
            })
            .await;

        client()
            .validate_credentials(&server.base_url())
            .await
            .expect("422 proves reachability");
        ping.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn failing_service_is_unreachable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/search");
                then.status(500);
            })
            .await;

        let error = client()
            .validate_credentials(&server.base_url())
            .await
            .expect_err("unreachable");
        assert_eq!(error, CredentialValidationError::Unreachable);
        assert_eq!(
            error.to_string(),
            "Cannot reach mem-dm service with provided base_url"
        );
    }
}
