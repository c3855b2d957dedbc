//! Bounded retry wrapper around outbound POST requests.

use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::time::sleep;
use tracing::instrument;

use super::MemoryServiceClient;
use super::types::{
    BODY_PREVIEW_CHARS, HttpSuccess, MemoryServiceError, RequestFailure, RetryPolicy,
    truncate_chars,
};

impl MemoryServiceClient {
    /// POST `body` to `url`, retrying 5xx and network failures within `policy`.
    ///
    /// Attempt `n` that fails with a retryable error sleeps `backoff_base * n` before the next
    /// attempt. A 4xx response, any other non-success status, or an unclassified transport error
    /// ends the loop immediately. A 5xx on the final attempt is returned as the terminal error.
    #[instrument(skip(self, body, policy), fields(max_retries = policy.max_retries))]
    pub async fn post_with_retry(
        &self,
        url: &str,
        body: &Value,
        policy: &RetryPolicy,
    ) -> Result<HttpSuccess, RequestFailure> {
        let mut last_error = None;
        let mut attempts = 0;
        let mut backoffs = 0;

        for attempt in 1..=policy.max_retries {
            attempts = attempt;
            match self.post_once(url, body, policy).await {
                Ok((status, body)) => {
                    if attempt > 1 {
                        tracing::info!(attempt, status = status.as_u16(), "Request succeeded after retry");
                    }
                    return Ok(HttpSuccess {
                        status,
                        body,
                        attempts,
                        backoffs,
                    });
                }
                Err(error) => {
                    let retry = error.is_retryable() && attempt < policy.max_retries;
                    if retry {
                        let delay = policy.backoff_for(attempt);
                        tracing::warn!(
                            attempt,
                            max_attempts = policy.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "Retrying memory service request"
                        );
                        last_error = Some(error);
                        backoffs += 1;
                        sleep(delay).await;
                        continue;
                    }
                    last_error = Some(error);
                    break;
                }
            }
        }

        let error = last_error.unwrap_or_else(|| {
            MemoryServiceError::Unexpected("no attempts were made (max_retries is 0)".into())
        });
        tracing::error!(attempts, error = %error, "Memory service request failed");
        Err(RequestFailure {
            url: url.to_string(),
            error,
            attempts,
            backoffs,
        })
    }

    async fn post_once(
        &self,
        url: &str,
        body: &Value,
        policy: &RetryPolicy,
    ) -> Result<(StatusCode, Value), MemoryServiceError> {
        let response = self
            .http
            .post(url)
            .timeout(policy.timeout)
            .json(body)
            .send()
            .await
            .map_err(|error| MemoryServiceError::from_transport(&error))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|error| MemoryServiceError::from_transport(&error))?;

        if !status.is_success() {
            return Err(MemoryServiceError::from_status(status, &text));
        }

        Ok((status, parse_body(&text)))
    }
}

/// Parse a response body as JSON; non-JSON bodies become `{ "raw": <preview> }`.
pub(crate) fn parse_body(text: &str) -> Value {
    serde_json::from_str(text)
        .unwrap_or_else(|_| json!({ "raw": truncate_chars(text, BODY_PREVIEW_CHARS) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::build_http_client;
    use crate::test_support::ScriptedServer;
    use httpmock::{Method::POST, MockServer};
    use std::time::Duration;

    fn client() -> MemoryServiceClient {
        MemoryServiceClient::with_http(build_http_client("mem-dm-test").expect("client"))
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            timeout: Duration::from_secs(2),
            backoff_base: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn server_error_then_success_backs_off_once() {
        let server = ScriptedServer::start(vec![
            (503, r#"{"detail":"warming up"}"#),
            (200, r#"{"results":[]}"#),
        ])
        .await;

        let success = client()
            .post_with_retry(&server.url("/search"), &json!({"query": "q"}), &fast_policy())
            .await
            .expect("second attempt succeeds");

        assert_eq!(success.status, StatusCode::OK);
        assert_eq!(success.body, json!({"results": []}));
        assert_eq!(success.attempts, 2);
        assert_eq!(success.backoffs, 1);
        assert_eq!(server.hits(), 2);
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/search");
                then.status(404).json_body(json!({"detail": "Not Found"}));
            })
            .await;

        let failure = client()
            .post_with_retry(
                &format!("{}/search", server.base_url()),
                &json!({}),
                &fast_policy(),
            )
            .await
            .expect_err("404 fails");

        mock.assert_hits_async(1).await;
        assert_eq!(failure.attempts, 1);
        assert_eq!(failure.backoffs, 0);
        assert!(matches!(
            failure.error,
            MemoryServiceError::ClientStatus { status: 404, ref detail } if detail == "Not Found"
        ));
    }

    #[tokio::test]
    async fn server_errors_exhaust_the_budget() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/memories/async");
                then.status(502).body("bad gateway");
            })
            .await;

        let url = format!("{}/memories/async", server.base_url());
        let failure = client()
            .post_with_retry(&url, &json!({}), &fast_policy())
            .await
            .expect_err("all attempts fail");

        mock.assert_hits_async(3).await;
        assert_eq!(failure.attempts, 3);
        assert_eq!(failure.backoffs, 2);
        assert_eq!(
            failure.error.to_string(),
            "HTTP 502 | detail=bad gateway"
        );
        assert_eq!(
            failure.to_string(),
            format!("url={url} | error=HTTP 502 | detail=bad gateway")
        );
    }

    #[tokio::test]
    async fn connection_failures_retry_then_give_up() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let failure = client()
            .post_with_retry(
                &format!("http://127.0.0.1:{port}/search"),
                &json!({}),
                &fast_policy(),
            )
            .await
            .expect_err("nothing listens");

        assert_eq!(failure.attempts, 3);
        assert_eq!(failure.backoffs, 2);
        assert!(matches!(failure.error, MemoryServiceError::Network(_)));
        assert!(
            failure
                .error
                .to_string()
                .starts_with("network timeout/connect error:")
        );
    }

    #[tokio::test]
    async fn read_timeouts_are_retried_as_network_errors() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/search");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!({"results": []}));
            })
            .await;

        let policy = RetryPolicy {
            timeout: Duration::from_millis(100),
            ..fast_policy()
        };
        let failure = client()
            .post_with_retry(&format!("{}/search", server.base_url()), &json!({}), &policy)
            .await
            .expect_err("every attempt times out");

        mock.assert_hits_async(3).await;
        assert_eq!(failure.attempts, 3);
        assert_eq!(failure.backoffs, 2);
        assert!(matches!(failure.error, MemoryServiceError::Network(_)));
    }

    #[tokio::test]
    async fn invalid_urls_fail_without_retry() {
        let failure = client()
            .post_with_retry("/search", &json!({}), &fast_policy())
            .await
            .expect_err("relative url");

        assert_eq!(failure.attempts, 1);
        assert!(matches!(failure.error, MemoryServiceError::Unexpected(_)));
    }

    #[tokio::test]
    async fn accepted_with_non_json_body_is_wrapped() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/memories/async");
                then.status(202).body("queued");
            })
            .await;

        let success = client()
            .post_with_retry(
                &format!("{}/memories/async", server.base_url()),
                &json!({}),
                &fast_policy(),
            )
            .await
            .expect("accepted");

        assert_eq!(success.status, StatusCode::ACCEPTED);
        assert_eq!(success.body, json!({"raw": "queued"}));
    }

    #[test]
    fn raw_wrapper_truncates_long_bodies() {
        let body = parse_body(&"<html>".repeat(100));
        assert_eq!(body["raw"].as_str().map(|raw| raw.chars().count()), Some(200));
    }
}
