//! Query dispatcher.
//!
//! Drives one question at a time through `Idle -> Busy -> Answered | Failed`.
//! The current state is published on a watch channel so a host can disable
//! its submit control while a question is in flight.

use crate::registry::active_subset;
use crate::service::AnsweringService;
use crate::types::{Answer, Source};
use std::sync::Arc;
use tokio::sync::watch;

/// State of the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Busy,
    Answered(Answer),
    Failed,
}

impl QueryState {
    pub fn is_busy(&self) -> bool {
        matches!(self, QueryState::Busy)
    }

    pub fn answer(&self) -> Option<&Answer> {
        match self {
            QueryState::Answered(answer) => Some(answer),
            _ => None,
        }
    }
}

/// What a call to [`QueryDispatcher::ask`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Empty question: nothing was sent
    Skipped,
    /// A question was already in flight: nothing was sent
    Rejected,
    Answered(Answer),
    Failed,
}

/// Puts the dispatcher back to `Idle` if it is still `Busy` when dropped,
/// which covers a caller dropping the `ask` future mid-flight.
struct BusyGuard<'a> {
    state: &'a watch::Sender<QueryState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|state| {
            if state.is_busy() {
                *state = QueryState::Idle;
                true
            } else {
                false
            }
        });
    }
}

/// Sends questions with their active sources to the answering service.
pub struct QueryDispatcher {
    service: Arc<dyn AnsweringService>,
    state: watch::Sender<QueryState>,
    link_fallback: String,
}

impl QueryDispatcher {
    pub fn new(service: Arc<dyn AnsweringService>, link_fallback: impl Into<String>) -> Self {
        let (state, _) = watch::channel(QueryState::Idle);
        Self {
            service,
            state,
            link_fallback: link_fallback.into(),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> QueryState {
        self.state.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().is_busy()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.state.subscribe()
    }

    /// Ask `question` grounded in the active subset of `sources`.
    ///
    /// Any previous answer is cleared before the call. Service errors are
    /// logged and reported as [`QueryOutcome::Failed`]; they are never retried.
    pub async fn ask(&self, question: &str, sources: &[Source]) -> QueryOutcome {
        if question.trim().is_empty() {
            return QueryOutcome::Skipped;
        }

        let entered = self.state.send_if_modified(|state| {
            if state.is_busy() {
                false
            } else {
                *state = QueryState::Busy;
                true
            }
        });
        if !entered {
            tracing::debug!("Question submitted while another is in flight");
            return QueryOutcome::Rejected;
        }
        let _guard = BusyGuard { state: &self.state };

        let active = active_subset(sources);
        tracing::info!(active_sources = active.len(), "Dispatching question");

        match self.service.answer(question, &active).await {
            Ok(reply) => {
                let answer = Answer::from_reply(reply, &self.link_fallback);
                tracing::info!(links = answer.links.len(), "Question answered");
                self.state.send_replace(QueryState::Answered(answer.clone()));
                QueryOutcome::Answered(answer)
            }
            Err(e) => {
                tracing::warn!("Answering service failed: {}", e);
                self.state.send_replace(QueryState::Failed);
                QueryOutcome::Failed
            }
        }
    }

    /// Return to `Idle` after the question text changed.
    pub fn input_changed(&self) {
        self.reset();
    }

    /// Dismiss the displayed answer or failure.
    pub fn dismiss(&self) {
        self.reset();
    }

    fn reset(&self) {
        self.state.send_if_modified(|state| match state {
            QueryState::Answered(_) | QueryState::Failed => {
                *state = QueryState::Idle;
                true
            }
            QueryState::Idle | QueryState::Busy => false,
        });
    }
}
