//! HTTP transactions over the AT command set.
//!
//! A transaction is a fixed command sequence: echo off, SSL auth mode,
//! client creation (with retry), per-client configuration, then the request
//! itself. The client instance is deleted afterwards on every path, success
//! or failure, so instances are never leaked on the module side.

use crate::engine::ModemEngine;
use crate::ops::expect_ok;
use crate::traits::ModemTransport;
use bytes::Bytes;
use hydrolink_core::{Error, Outcome, Result};
use hydrolink_protocol::{Command, HttpMethod};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Retry schedule for client instance creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, first try included.
    pub attempts: u32,
    /// Base backoff; attempt `n` waits `base * (n + 1)`.
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_base: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base * (attempt + 1)
    }
}

/// Tunables for HTTP transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub retry: RetryPolicy,
    /// Pause between consecutive configuration commands; the module misses
    /// commands sent back-to-back.
    pub inter_command_delay: Duration,
    /// `interval` field of the fragment configuration, in milliseconds.
    pub fragment_interval_ms: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            inter_command_delay: Duration::from_millis(100),
            fragment_interval_ms: 100,
        }
    }
}

/// An HTTP request to run against the module.
#[derive(Debug, Clone)]
pub struct HttpRequest<'a> {
    pub url: &'a str,
    pub path: &'a str,
    pub method: HttpMethod,
    /// Extra header line, e.g. `Content-Type: application/json`.
    pub header: Option<&'a str>,
    pub body: Option<&'a str>,
}

impl<'a> HttpRequest<'a> {
    pub fn get(url: &'a str, path: &'a str) -> Self {
        Self {
            url,
            path,
            method: HttpMethod::Get,
            header: None,
            body: None,
        }
    }

    pub fn post(url: &'a str, path: &'a str, body: &'a str) -> Self {
        Self {
            url,
            path,
            method: HttpMethod::Post,
            header: Some("Content-Type: application/json"),
            body: Some(body),
        }
    }
}

impl<T: ModemTransport> ModemEngine<T> {
    /// Run a GET and return the reassembled response content.
    pub async fn http_get(&self, url: &str, path: &str) -> Result<Bytes> {
        self.http_transaction(&HttpRequest::get(url, path), &HttpConfig::default())
            .await
    }

    /// Run a JSON POST and return the reassembled response content.
    pub async fn http_post(&self, url: &str, path: &str, body: &str) -> Result<Bytes> {
        self.http_transaction(&HttpRequest::post(url, path, body), &HttpConfig::default())
            .await
    }

    /// Run a full HTTP transaction.
    ///
    /// Holds the transaction lock so concurrent callers queue up; each
    /// transaction is many dispatches and must not interleave with another.
    pub async fn http_transaction(&self, request: &HttpRequest<'_>, cfg: &HttpConfig) -> Result<Bytes> {
        let _http = self.http_lock.lock().await;
        info!(url = request.url, path = request.path, method = ?request.method, "HTTP transaction start");

        let cmd = Command::echo_off();
        expect_ok(self.execute(&cmd).await?, cmd.kind().label())?;
        sleep(cfg.inter_command_delay).await;

        let cmd = Command::ssl_auth_none();
        expect_ok(self.execute(&cmd).await?, cmd.kind().label())?;
        sleep(cfg.inter_command_delay).await;

        let client_id = self.create_client(request.url, cfg).await?;

        // From here on the instance exists on the module; delete it on every
        // exit path.
        let result = self.perform_request(client_id, request, cfg).await;
        if let Err(e) = self.delete_client(client_id).await {
            warn!(client_id, %e, "HTTP client deletion failed");
        }

        let outcome = result?;
        match outcome {
            Outcome::Ok => {
                let content = self.data().take_content();
                info!(len = content.len(), "HTTP transaction complete");
                Ok(content)
            }
            other => expect_ok(other, "MHTTPREQUEST").map(|_| Bytes::new()),
        }
    }

    /// Create a client instance, retrying on transient failures.
    ///
    /// When the module reports that no instance is idle, instance 0 is
    /// deleted before the next attempt; a crashed previous transaction is
    /// the usual cause of the leak.
    async fn create_client(&self, url: &str, cfg: &HttpConfig) -> Result<u8> {
        let cmd = Command::http_create(url)?;
        let mut last_err = Error::CommandFailed(cmd.kind().label().to_string());

        for attempt in 0..cfg.retry.attempts {
            if attempt > 0 {
                sleep(cfg.retry.delay_for(attempt - 1)).await;
            }
            match self.execute(&cmd).await {
                Ok(Outcome::Ok) => {
                    let id = self
                        .data()
                        .http_client_id()
                        .ok_or_else(|| Error::InvalidResponse("no client id stored".into()))?;
                    return Ok(id);
                }
                Ok(Outcome::NoClientIdle) => {
                    warn!(attempt, "no idle client instance, reclaiming instance 0");
                    if let Err(e) = self.delete_client(0).await {
                        warn!(%e, "reclaim of instance 0 failed");
                    }
                    last_err = Error::NoClientIdle;
                }
                Ok(other) => {
                    debug!(attempt, verdict = ?other, "client creation attempt failed");
                    last_err = Error::CommandFailed(cmd.kind().label().to_string());
                }
                Err(e) => {
                    debug!(attempt, %e, "client creation attempt errored");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    async fn perform_request(
        &self,
        client_id: u8,
        request: &HttpRequest<'_>,
        cfg: &HttpConfig,
    ) -> Result<Outcome> {
        let ssl = request.url.starts_with("https");
        let cmd = Command::http_ssl(client_id, ssl)?;
        expect_ok(self.execute(&cmd).await?, cmd.kind().label())?;
        sleep(cfg.inter_command_delay).await;

        let cmd = Command::http_encoding_raw(client_id)?;
        expect_ok(self.execute(&cmd).await?, cmd.kind().label())?;
        sleep(cfg.inter_command_delay).await;

        // frag_size 0: module picks; interval paces URC chunk trains.
        let cmd = Command::http_fragment(client_id, 0, cfg.fragment_interval_ms)?;
        expect_ok(self.execute(&cmd).await?, cmd.kind().label())?;
        sleep(cfg.inter_command_delay).await;

        if let Some(header) = request.header {
            let cmd = Command::http_header(client_id, header)?;
            expect_ok(self.execute(&cmd).await?, cmd.kind().label())?;
            sleep(cfg.inter_command_delay).await;
        }
        if let Some(body) = request.body {
            let cmd = Command::http_body(client_id, body)?;
            expect_ok(self.execute(&cmd).await?, cmd.kind().label())?;
            sleep(cfg.inter_command_delay).await;
        }

        let cmd = Command::http_request(client_id, request.method, request.path)?;
        self.execute(&cmd).await
    }

    async fn delete_client(&self, client_id: u8) -> Result<()> {
        let cmd = Command::http_delete(client_id)?;
        expect_ok(self.execute(&cmd).await?, cmd.kind().label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_backoff_grows_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(300));
    }

    #[test]
    fn request_constructors() {
        let get = HttpRequest::get("https://api.example.com", "/v1/status");
        assert_eq!(get.method, HttpMethod::Get);
        assert!(get.body.is_none());

        let post = HttpRequest::post("https://api.example.com", "/v1/report", "{}");
        assert_eq!(post.method, HttpMethod::Post);
        assert_eq!(post.header, Some("Content-Type: application/json"));
        assert_eq!(post.body, Some("{}"));
    }
}
