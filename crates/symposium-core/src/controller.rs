//! Orchestration of one user turn.
//!
//! `submit` appends the optimistic user/placeholder pair, arms the countdown
//! and dispatches exactly one backend request. The network reply and the
//! countdown race; both funnel into the same event channel and whichever
//! reaches `handle_event` first resolves the turn. The loser finds the turn
//! already terminal and becomes a no-op.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::client::{CompletionClient, CompletionError};
use crate::envelope::{self, GENERIC_FAILURE_MESSAGE};
use crate::store::{MessageStore, TurnOutcome};
use crate::timeout::TimeoutGuard;
use crate::turn::{FailureKind, Turn, TurnId};

/// Resumption sources for a pending turn.
#[derive(Debug)]
pub enum TurnEvent {
    Response {
        turn: TurnId,
        result: Result<String, CompletionError>,
    },
    TimedOut {
        turn: TurnId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted { user: TurnId, assistant: TurnId },
    /// Blank or whitespace-only input. Nothing was recorded.
    EmptyInput,
    /// A previous submission is still pending; only one turn may be in
    /// flight at a time.
    Busy,
}

pub struct ChatController {
    store: MessageStore,
    guard: TimeoutGuard,
    client: Arc<dyn CompletionClient>,
    events: UnboundedSender<TurnEvent>,
    in_flight: Option<TurnId>,
}

impl ChatController {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        timeout: Duration,
        events: UnboundedSender<TurnEvent>,
    ) -> Self {
        Self {
            store: MessageStore::new(),
            guard: TimeoutGuard::new(timeout, events.clone()),
            client,
            events,
            in_flight: None,
        }
    }

    /// Submit user text, or a suggested follow-up; both go through here so
    /// the single-flight and timeout rules apply uniformly.
    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::EmptyInput;
        }
        if self.in_flight.is_some() {
            return SubmitOutcome::Busy;
        }

        let Some(user) = self.store.append_user_turn(text) else {
            return SubmitOutcome::EmptyInput;
        };
        let assistant = self.store.append_pending_assistant_turn();
        self.guard.arm(assistant);

        // History includes the turn just added, not the placeholder.
        let history = self.store.history();
        let client = Arc::clone(&self.client);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = client.complete(history).await;
            let _ = events.send(TurnEvent::Response {
                turn: assistant,
                result,
            });
        });

        self.in_flight = Some(assistant);
        SubmitOutcome::Accepted { user, assistant }
    }

    /// Apply one resumption event. Safe to call with stale events: anything
    /// targeting an already-resolved turn is dropped.
    pub fn handle_event(&mut self, event: TurnEvent) {
        match event {
            TurnEvent::Response { turn, result } => self.on_response(turn, result),
            TurnEvent::TimedOut { turn } => self.on_timeout(turn),
        }
    }

    fn on_response(&mut self, turn: TurnId, result: Result<String, CompletionError>) {
        match result {
            Ok(body) => match envelope::parse(&body) {
                Ok(env) if env.is_final() => {
                    self.resolve(turn, TurnOutcome::Answered(env));
                }
                Ok(_) => {
                    // Decodable but still provisional. Not an error: leave
                    // the turn pending and let the countdown keep running.
                    debug!(%turn, "provisional envelope, waiting for countdown");
                }
                Err(err) => {
                    warn!(%turn, %err, raw = %body, "assistant reply did not decode");
                    self.resolve(
                        turn,
                        TurnOutcome::Failed {
                            kind: FailureKind::Parse,
                            message: GENERIC_FAILURE_MESSAGE.to_string(),
                        },
                    );
                }
            },
            Err(err) => {
                warn!(%turn, %err, "completion request failed");
                let message = apology_from(&err)
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
                self.resolve(
                    turn,
                    TurnOutcome::Failed {
                        kind: FailureKind::Network,
                        message,
                    },
                );
            }
        }
    }

    fn on_timeout(&mut self, turn: TurnId) {
        // A countdown that lost the race finds the turn resolved and the
        // store rejects the transition, so nothing is overwritten.
        self.resolve(
            turn,
            TurnOutcome::Failed {
                kind: FailureKind::Timeout,
                message: GENERIC_FAILURE_MESSAGE.to_string(),
            },
        );
    }

    fn resolve(&mut self, turn: TurnId, outcome: TurnOutcome) {
        match self.store.resolve_assistant_turn(turn, outcome) {
            Ok(()) => {
                self.guard.cancel(turn);
                if self.in_flight == Some(turn) {
                    self.in_flight = None;
                }
            }
            Err(err) => {
                debug!(%turn, %err, "dropping stale resolution");
            }
        }
    }

    pub fn turns(&self) -> &[Turn] {
        self.store.turns()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }
}

/// The backend answers its own failures with a decodable apology envelope;
/// when one is present in an error body, surface its text to the user.
fn apology_from(err: &CompletionError) -> Option<String> {
    match err {
        CompletionError::Status {
            body: Some(body), ..
        } => {
            let env = envelope::parse(body).ok()?;
            env.is_final().then(|| env.response)
        }
        _ => None,
    }
}
