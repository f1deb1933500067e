//! Request executor - renders, sends and cancels one request at a time
//!
//! Each send runs on its own Tokio task and reports exactly one
//! [`RequestOutcome`] through a oneshot channel. Cancelling while the call is
//! in flight drops the pending reqwest future, which closes the underlying
//! connection instead of waiting for the timeout.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::constants::DEFAULT_TIMEOUT_MS;
use crate::messages::RequestOutcome;
use crate::models::RequestSpec;
use crate::network::client::{execute_request, prepare_request};
use crate::settings::Settings;
use crate::template::render_request;

/// Cancellation flag shared between a caller and a running send.
///
/// Cloning yields another handle to the same flag. Once set it stays set.
#[derive(Clone, Debug)]
pub struct CancelToken {
    state: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        CancelToken {
            state: Arc::new(tx),
        }
    }

    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    pub fn is_canceled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called
    pub async fn canceled(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|canceled| *canceled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller's side of a spawned send
pub struct RequestHandle {
    cancel: CancelToken,
    outcome_rx: oneshot::Receiver<RequestOutcome>,
    task: JoinHandle<()>,
}

impl RequestHandle {
    /// Request cancellation; the outcome will be [`RequestOutcome::Canceled`]
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the single terminal outcome
    pub async fn outcome(self) -> RequestOutcome {
        match self.outcome_rx.await {
            Ok(outcome) => outcome,
            Err(_) => RequestOutcome::Failed("Request worker stopped unexpectedly".to_string()),
        }
    }
}

/// Sends rendered requests. One send at a time per executor is a caller-side
/// rule; the executor itself keeps no per-send state.
#[derive(Clone, Debug)]
pub struct RequestExecutor {
    default_timeout_ms: u64,
}

impl RequestExecutor {
    /// A `default_timeout_ms` of 0 is replaced by [`DEFAULT_TIMEOUT_MS`]
    pub fn new(default_timeout_ms: u64) -> Self {
        let default_timeout_ms = match default_timeout_ms {
            0 => DEFAULT_TIMEOUT_MS,
            ms => ms,
        };
        RequestExecutor { default_timeout_ms }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.default_timeout_ms)
    }

    /// Render `request` with `variables`, send it, and classify the result.
    ///
    /// A cancellation observed at any point wins over whatever the transport
    /// produced.
    pub async fn execute(
        &self,
        request: &RequestSpec,
        variables: &HashMap<String, String>,
        cancel: &CancelToken,
    ) -> RequestOutcome {
        if cancel.is_canceled() {
            tracing::info!(name = %request.name, "Request canceled before sending");
            return RequestOutcome::Canceled;
        }

        let rendered = render_request(request, variables);
        tracing::info!(
            name = %rendered.name,
            method = %rendered.method,
            url = %rendered.url,
            "Sending request"
        );
        let prepared = prepare_request(&rendered, self.default_timeout_ms);

        let result = tokio::select! {
            biased;

            _ = cancel.canceled() => None,
            result = execute_request(prepared) => Some(result),
        };

        if cancel.is_canceled() {
            tracing::info!(name = %rendered.name, "Request canceled");
            return RequestOutcome::Canceled;
        }

        match result {
            Some(Ok(response)) => {
                tracing::info!(
                    name = %rendered.name,
                    status = response.status_code,
                    time_ms = response.elapsed_ms,
                    "Response received"
                );
                RequestOutcome::Completed(response)
            }
            Some(Err(e)) => {
                tracing::error!(name = %rendered.name, error = %e, "Request failed");
                RequestOutcome::Failed(e.to_string())
            }
            None => RequestOutcome::Canceled,
        }
    }

    /// Run a send on a worker task with a fresh cancellation token
    pub fn spawn(&self, request: RequestSpec, variables: HashMap<String, String>) -> RequestHandle {
        self.spawn_with_token(request, variables, CancelToken::new())
    }

    /// Run a send on a worker task, observing an existing token
    pub fn spawn_with_token(
        &self,
        request: RequestSpec,
        variables: HashMap<String, String>,
        cancel: CancelToken,
    ) -> RequestHandle {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let executor = self.clone();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let outcome = executor.execute(&request, &variables, &token).await;
            let _ = outcome_tx.send(outcome);
        });

        RequestHandle {
            cancel,
            outcome_rx,
            task,
        }
    }
}

impl Default for RequestExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}
