//! Request execution and response classification.
//!
//! The executor is the one place where HTTP responses become [`Envelope`]s:
//!
//! | Response | Envelope |
//! |----------|----------|
//! | transport error | `Failure`, status 0 |
//! | non-2xx | `Failure`, message from the body |
//! | 207 | `{"value", "multi_status"}` classified by item outcomes |
//! | other 2xx | body decoded as `T`, an empty body read as `null` |
//!
//! A 2xx body that does not decode is an error, not an envelope.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use sensorlake_core::{ClientError, DecodeError, Envelope, MultiStatus, ResultCode, MULTI_STATUS};

use crate::config::ClientConfig;
use crate::http_client::{HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse};
use crate::retry::AttemptOutcome;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Deserialize)]
struct BatchBody<T> {
    value: Option<T>,
    #[serde(default)]
    multi_status: MultiStatus,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Sends requests through an [`HttpClient`] and classifies the outcome.
pub struct Executor {
    http: Arc<dyn HttpClient>,
    config: ClientConfig,
}

impl Executor {
    pub fn new(config: ClientConfig, http: Arc<dyn HttpClient>) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Builds `"{api_version}/{part}/.../"`, percent-encoding every part.
    pub fn path(&self, parts: &[&str]) -> String {
        let mut path = self.config.api_version.trim_matches('/').to_owned();
        for part in parts {
            path.push('/');
            path.push_str(&urlencoding::encode(part));
        }
        path.push('/');
        path
    }

    pub async fn execute<B, T>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<Envelope<T>, ClientError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = match self.send(method, path, body).await? {
            Ok(response) => response,
            Err(error) => return Ok(Envelope::failure(0, error.message(), None)),
        };

        if !response.is_success() {
            return Ok(Envelope::failure(response.status, failure_message(&response), None));
        }

        if response.status == MULTI_STATUS {
            let batch: BatchBody<T> = decode(&response.body)?;
            return finish_batch(response.status, batch.value, Some(batch.multi_status));
        }

        let value = decode(&response.body)?;
        Ok(Envelope::success(response.status, value))
    }

    /// Like [`Executor::execute`] for a batch of `submitted` items.
    ///
    /// The returned multi-status always accounts for every submitted item;
    /// items the service did not mention are recorded as successes.
    pub async fn execute_batch<B, T>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
        submitted: usize,
    ) -> Result<Envelope<T>, ClientError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = match self.send(method, path, Some(body)).await? {
            Ok(response) => response,
            Err(error) => return Ok(Envelope::failure(0, error.message(), None)),
        };

        if !response.is_success() {
            return Ok(Envelope::failure(response.status, failure_message(&response), None));
        }

        let (value, reported) = if response.status == MULTI_STATUS {
            let batch: BatchBody<T> = decode(&response.body)?;
            (batch.value, batch.multi_status)
        } else {
            (Some(decode(&response.body)?), MultiStatus::default())
        };

        let statuses = reported.reconcile(submitted)?;
        if statuses.failure_count() > 0 {
            warn!(
                path,
                failed = statuses.failure_count(),
                submitted,
                "batch items rejected"
            );
        }
        finish_batch(response.status, value, Some(statuses))
    }

    /// Serializes the body and dispatches with retries. The outer error is
    /// an encoding failure; the inner one is the final transport error.
    async fn send<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<Result<HttpResponse, HttpError>, ClientError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let request_id = Uuid::new_v4();
        let mut request = HttpRequest::new(method, self.config.url(path))
            .with_header(REQUEST_ID_HEADER, request_id.to_string())
            .with_auth(&self.config.auth())
            .with_timeout_ms(self.config.timeout_ms);
        if let Some(body) = body {
            request = request.with_json_body(serde_json::to_string(body)?);
        }

        debug!(%method, path, %request_id, "dispatching request");
        let result = self.dispatch(request).await;
        match &result {
            Ok(response) => debug!(%request_id, status = response.status, "response received"),
            Err(error) => warn!(%request_id, %error, "request failed"),
        }
        Ok(result)
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let retry = &self.config.retry;
        let mut attempt = 0_u32;

        loop {
            let result = self.http.execute(request.clone()).await;
            let again = match &result {
                Ok(response) if response.is_success() => false,
                Ok(response) => {
                    retry.should_retry(request.method, attempt, AttemptOutcome::Status(response.status))
                }
                Err(error) => retry.should_retry(request.method, attempt, AttemptOutcome::Transport(error)),
            };
            if !again {
                return result;
            }

            let delay = retry.delay_for_attempt(attempt);
            warn!(
                method = %request.method,
                attempt = attempt + 1,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "retrying request"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("base_url", &self.config.base_url)
            .field("api_version", &self.config.api_version)
            .finish_non_exhaustive()
    }
}

fn finish_batch<T: DeserializeOwned>(
    status: u16,
    value: Option<T>,
    statuses: Option<MultiStatus>,
) -> Result<Envelope<T>, ClientError> {
    let value = match value {
        Some(value) => value,
        None => match decode::<T>("null") {
            Ok(value) => value,
            Err(_) if ResultCode::classify(status, statuses.as_ref()) == ResultCode::Failure => {
                let total = statuses.as_ref().map(MultiStatus::len).unwrap_or(0);
                return Ok(Envelope::failure(
                    status,
                    format!("all {total} items failed"),
                    statuses,
                ));
            }
            Err(error) => return Err(error),
        },
    };
    Ok(Envelope::classified(status, value, statuses))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body)
        .map_err(|error| ClientError::Decode(DecodeError::json("response body", &error)))
}

fn failure_message(response: &HttpResponse) -> String {
    if let Ok(ErrorBody { message }) = serde_json::from_str(&response.body) {
        return message;
    }
    let body = response.body.trim();
    if body.is_empty() {
        format!("request failed with status {}", response.status)
    } else {
        body.to_owned()
    }
}
