//! Asynchronous scheduling of units.

use std::{sync::Arc, time::Duration};

use log::{debug, warn};
use tokio::task::JoinHandle;

use crate::{
    behavior::Mode,
    config::AppConfig,
    error::FidiError,
    handler::{RequestHandler, Response},
};

/// Runs units on the blocking pool of the current Tokio runtime.
///
/// Parsing and execution do not block on I/O but may take a while on large
/// units, so they never run on the async workers. The unit's `predelay`
/// and `postdelay` settings are honored with [`tokio::time::sleep`] once its
/// trace is known; a configured timeout covers the unit and its delays.
#[derive(Debug, Clone)]
pub struct AppCaller {
    handler: Arc<RequestHandler>,
    timeout: Option<Duration>,
}

impl AppCaller {
    pub fn new(config: AppConfig) -> Self {
        let timeout = config.app().timeout_ms().map(Duration::from_millis);
        Self {
            handler: Arc::new(RequestHandler::new(config)),
            timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Schedule `source` for processing in `mode`.
    ///
    /// The returned handle resolves to the unit's [`Response`], or to
    /// [`FidiError::Timeout`] when the unit is discarded.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule(
        &self,
        source: impl Into<String>,
        mode: Mode,
    ) -> JoinHandle<Result<Response, FidiError>> {
        let handler = Arc::clone(&self.handler);
        let source = source.into();
        let timeout = self.timeout;

        tokio::spawn(async move {
            let unit = run(handler, source, mode);
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, unit).await {
                    Ok(result) => result,
                    Err(_) => {
                        let millis = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                        warn!(timeout_ms = millis; "Discarding unit after timeout");
                        Err(FidiError::Timeout(millis))
                    }
                },
                None => unit.await,
            }
        })
    }
}

async fn run(handler: Arc<RequestHandler>, source: String, mode: Mode) -> Result<Response, FidiError> {
    let response = tokio::task::spawn_blocking(move || handler.handle(&source, mode))
        .await
        .map_err(|err| FidiError::Task(err.to_string()))?;

    if let Some(trace) = response.trace() {
        let (predelay, postdelay) = (trace.predelay_ms(), trace.postdelay_ms());
        if predelay > 0 {
            debug!(predelay_ms = predelay; "Waiting before calls");
            tokio::time::sleep(Duration::from_millis(predelay)).await;
        }
        if postdelay > 0 {
            debug!(postdelay_ms = postdelay; "Waiting after calls");
            tokio::time::sleep(Duration::from_millis(postdelay)).await;
        }
    }
    Ok(response)
}
