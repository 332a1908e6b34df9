//! Submission lifecycle: one analysis request at a time, outcome surfaced as state.
//!
//! ```text
//! Idle ──submit──▶ InFlight ──reply──▶ Succeeded
//!   ▲                 │
//!   │                 └──error──▶ Failed
//!   └───────── (any terminal phase) ──submit──▶ InFlight
//! ```
//!
//! `submit` is synchronous: the phase is `InFlight` before it returns and the
//! exchange runs on a spawned task. The frame loop collects the outcome with
//! [`SubmissionController::poll_completion`]; headless callers await
//! [`SubmissionController::settle`].

use futures_util::future::{AbortHandle, Abortable};
use thiserror::Error;
use tokio::sync::oneshot;

use devlens_service::{AnalysisReply, ExchangeError, ServiceEndpoint, send_analysis};
use devlens_types::{AnalysisRequest, NonEmptyStaticStr, NonEmptyString, ValidationError};

const INTERRUPTED_ERROR: NonEmptyStaticStr =
    NonEmptyStaticStr::new("Request failed: interrupted before a reply arrived");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

/// Observable submission state.
///
/// A result and an error never coexist: each lives only in its own phase.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    InFlight,
    Succeeded {
        result: NonEmptyString,
        used_fallback: bool,
    },
    Failed {
        error: NonEmptyString,
    },
}

impl SubmissionState {
    #[must_use]
    pub fn phase(&self) -> SubmissionPhase {
        match self {
            Self::Idle => SubmissionPhase::Idle,
            Self::InFlight => SubmissionPhase::InFlight,
            Self::Succeeded { .. } => SubmissionPhase::Succeeded,
            Self::Failed { .. } => SubmissionPhase::Failed,
        }
    }

    #[must_use]
    pub fn result_text(&self) -> Option<&str> {
        match self {
            Self::Succeeded { result, .. } => Some(result.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn used_fallback(&self) -> bool {
        matches!(
            self,
            Self::Succeeded {
                used_fallback: true,
                ..
            }
        )
    }
}

/// Why `submit` started nothing. State is untouched in both cases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("a submission is already in flight")]
    InFlight,
}

struct Exchange {
    generation: u64,
    outcome: Result<AnalysisReply, ExchangeError>,
}

struct PendingExchange {
    generation: u64,
    rx: oneshot::Receiver<Exchange>,
    abort_handle: AbortHandle,
}

pub struct SubmissionController {
    client: reqwest::Client,
    endpoint: ServiceEndpoint,
    state: SubmissionState,
    /// Stamp of the most recent submission. Only its outcome may be applied.
    generation: u64,
    pending: Option<PendingExchange>,
}

impl SubmissionController {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: ServiceEndpoint) -> Self {
        Self {
            client,
            endpoint,
            state: SubmissionState::Idle,
            generation: 0,
            pending: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> SubmissionPhase {
        self.state.phase()
    }

    #[must_use]
    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, SubmissionState::InFlight)
    }

    /// Whether a submit affordance should be enabled for this primary text.
    #[must_use]
    pub fn can_submit(&self, primary_text: &str) -> bool {
        !self.is_in_flight() && !primary_text.trim().is_empty()
    }

    /// Start an exchange. Must be called inside a tokio runtime.
    ///
    /// Rejected without any state change while a request is outstanding or when
    /// the primary text is blank. On success the previous result or error is
    /// already gone when this returns.
    pub fn submit(
        &mut self,
        primary_text: &str,
        secondary_text: Option<&str>,
        instruction: Option<&str>,
    ) -> Result<(), SubmitRejected> {
        if self.is_in_flight() {
            tracing::debug!("Ignoring submit while a request is in flight");
            return Err(SubmitRejected::InFlight);
        }
        let request = AnalysisRequest::new(primary_text, secondary_text, instruction)?;

        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        self.state = SubmissionState::InFlight;

        let (tx, rx) = oneshot::channel();
        let (abort_handle, abort_registration) = AbortHandle::new_pair();
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();

        let task = async move {
            let outcome = send_analysis(&client, &endpoint, &request).await;
            // Receiver is gone only when the controller was dropped.
            let _ = tx.send(Exchange {
                generation,
                outcome,
            });
        };

        tokio::spawn(async move {
            let _ = Abortable::new(task, abort_registration).await;
        });

        self.pending = Some(PendingExchange {
            generation,
            rx,
            abort_handle,
        });
        tracing::info!(
            generation,
            variant = self.endpoint.variant().as_str(),
            "Submission started"
        );
        Ok(())
    }

    /// Apply a finished exchange if one is ready. Never blocks.
    ///
    /// Returns the new phase when a terminal state was entered.
    pub fn poll_completion(&mut self) -> Option<SubmissionPhase> {
        let pending = self.pending.as_mut()?;
        let received = match pending.rx.try_recv() {
            Ok(exchange) => Some(exchange),
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => None,
        };
        let generation = pending.generation;
        self.pending = None;

        match received {
            Some(exchange) => self.apply(exchange.generation, exchange.outcome),
            None => self.apply_interrupted(generation),
        }
    }

    /// Wait for the outstanding exchange, if any, and apply it.
    pub async fn settle(&mut self) -> Option<SubmissionPhase> {
        let pending = self.pending.take()?;
        let generation = pending.generation;
        match pending.rx.await {
            Ok(exchange) => self.apply(exchange.generation, exchange.outcome),
            Err(_) => self.apply_interrupted(generation),
        }
    }

    fn apply(
        &mut self,
        generation: u64,
        outcome: Result<AnalysisReply, ExchangeError>,
    ) -> Option<SubmissionPhase> {
        if generation != self.generation {
            tracing::debug!(
                generation,
                latest = self.generation,
                "Discarding stale submission outcome"
            );
            return None;
        }

        self.state = match outcome {
            Ok(reply) => {
                if reply.used_fallback {
                    tracing::warn!(generation, "Service reply had no analysis text");
                } else {
                    tracing::info!(generation, bytes = reply.text.as_str().len(), "Submission succeeded");
                }
                SubmissionState::Succeeded {
                    result: reply.text,
                    used_fallback: reply.used_fallback,
                }
            }
            Err(err) => {
                tracing::warn!(generation, error = %err, "Submission failed");
                SubmissionState::Failed {
                    error: err.user_message(),
                }
            }
        };
        Some(self.phase())
    }

    fn apply_interrupted(&mut self, generation: u64) -> Option<SubmissionPhase> {
        if generation != self.generation {
            return None;
        }
        tracing::warn!(generation, "Submission task ended without a reply");
        self.state = SubmissionState::Failed {
            error: INTERRUPTED_ERROR.into(),
        };
        Some(self.phase())
    }
}

impl Drop for SubmissionController {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort_handle.abort();
        }
    }
}

impl std::fmt::Debug for SubmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionController")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("pending", &self.pending.is_some())
            .finish_non_exhaustive()
    }
}
