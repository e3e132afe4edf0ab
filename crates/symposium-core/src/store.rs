//! Ordered conversation store.
//!
//! The store is the single owner of the turn sequence. Turns keep their
//! insertion order forever and are addressed by id, never by position, so
//! late events cannot land on the wrong turn. An assistant turn is mutated
//! exactly once, from pending to a terminal state; a second resolution
//! attempt is rejected rather than applied.

use serde::Serialize;
use thiserror::Error;

use crate::envelope::ResponseEnvelope;
use crate::turn::{AssistantState, FailureKind, Turn, TurnBody, TurnId};

/// One role/content pair as the completion backend expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

/// Terminal outcome applied to a pending assistant turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Answered(ResponseEnvelope),
    Failed { kind: FailureKind, message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{0} does not exist")]
    UnknownTurn(TurnId),
    #[error("{0} is not an assistant turn")]
    NotAssistant(TurnId),
    #[error("{0} already reached a terminal state")]
    AlreadyResolved(TurnId),
}

#[derive(Debug, Default)]
pub struct MessageStore {
    turns: Vec<Turn>,
    next_id: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> TurnId {
        let id = TurnId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a user turn. Blank input creates nothing.
    pub fn append_user_turn(&mut self, text: &str) -> Option<TurnId> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let id = self.allocate_id();
        self.turns.push(Turn {
            id,
            body: TurnBody::User {
                text: text.to_string(),
            },
        });
        Some(id)
    }

    /// Append an assistant turn holding the optimistic placeholder.
    pub fn append_pending_assistant_turn(&mut self) -> TurnId {
        let id = self.allocate_id();
        self.turns.push(Turn {
            id,
            body: TurnBody::Assistant(AssistantState::Pending {
                placeholder: ResponseEnvelope::pending(),
            }),
        });
        id
    }

    /// Replace a pending assistant turn's payload wholesale. This is the
    /// resolve-once gate: only a turn still in `Pending` can transition, so
    /// whichever of the network reply and the countdown arrives first wins
    /// and the straggler is rejected.
    pub fn resolve_assistant_turn(
        &mut self,
        id: TurnId,
        outcome: TurnOutcome,
    ) -> Result<(), ResolveError> {
        let turn = self
            .turns
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(ResolveError::UnknownTurn(id))?;

        match &turn.body {
            TurnBody::User { .. } => return Err(ResolveError::NotAssistant(id)),
            TurnBody::Assistant(AssistantState::Pending { .. }) => {}
            TurnBody::Assistant(_) => return Err(ResolveError::AlreadyResolved(id)),
        }

        turn.body = TurnBody::Assistant(match outcome {
            TurnOutcome::Answered(envelope) => AssistantState::Answered { envelope },
            TurnOutcome::Failed { kind, message } => AssistantState::Failed { kind, message },
        });
        Ok(())
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_pending(&self, id: TurnId) -> bool {
        self.turns
            .iter()
            .any(|t| t.id == id && t.is_pending())
    }

    /// Conversation history for an outbound completion request. Pending
    /// placeholders are omitted; answered turns are re-serialized to their
    /// wire payload and failed turns are represented by the same apology
    /// envelope the user saw.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.turns
            .iter()
            .filter_map(|turn| match &turn.body {
                TurnBody::User { text } => Some(HistoryEntry {
                    role: "user".to_string(),
                    content: text.clone(),
                }),
                TurnBody::Assistant(AssistantState::Pending { .. }) => None,
                TurnBody::Assistant(AssistantState::Answered { envelope }) => {
                    Some(HistoryEntry {
                        role: "assistant".to_string(),
                        content: envelope.to_raw_payload(),
                    })
                }
                TurnBody::Assistant(AssistantState::Failed { message, .. }) => {
                    Some(HistoryEntry {
                        role: "assistant".to_string(),
                        content: ResponseEnvelope::failure(message).to_raw_payload(),
                    })
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::GENERIC_FAILURE_MESSAGE;

    fn answered(text: &str) -> TurnOutcome {
        let mut envelope = ResponseEnvelope::pending();
        envelope.response = text.to_string();
        TurnOutcome::Answered(envelope)
    }

    #[test]
    fn turns_keep_insertion_order() {
        let mut store = MessageStore::new();
        let first = store.append_user_turn("What are the categories?").unwrap();
        let pending = store.append_pending_assistant_turn();
        let second = store.append_user_turn("And the schedule?").unwrap();

        let ids: Vec<TurnId> = store.turns().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first, pending, second]);
    }

    #[test]
    fn blank_user_turn_is_rejected() {
        let mut store = MessageStore::new();
        assert!(store.append_user_turn("").is_none());
        assert!(store.append_user_turn("   \t  ").is_none());
        assert!(store.turns().is_empty());
    }

    #[test]
    fn pending_turn_carries_placeholder() {
        let mut store = MessageStore::new();
        let id = store.append_pending_assistant_turn();
        assert!(store.is_pending(id));
        match &store.turns()[0].body {
            TurnBody::Assistant(AssistantState::Pending { placeholder }) => {
                assert!(!placeholder.is_final());
                assert_eq!(placeholder.thinking, "AI is processing...");
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn double_resolution_is_rejected() {
        let mut store = MessageStore::new();
        let id = store.append_pending_assistant_turn();

        store.resolve_assistant_turn(id, answered("done")).unwrap();
        let err = store
            .resolve_assistant_turn(
                id,
                TurnOutcome::Failed {
                    kind: FailureKind::Timeout,
                    message: GENERIC_FAILURE_MESSAGE.to_string(),
                },
            )
            .unwrap_err();
        assert_eq!(err, ResolveError::AlreadyResolved(id));

        // First resolution stands.
        match &store.turns()[0].body {
            TurnBody::Assistant(AssistantState::Answered { envelope }) => {
                assert_eq!(envelope.response, "done");
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn resolving_unknown_or_user_turn_fails() {
        let mut store = MessageStore::new();
        let user = store.append_user_turn("hello").unwrap();

        assert_eq!(
            store.resolve_assistant_turn(TurnId(99), answered("x")),
            Err(ResolveError::UnknownTurn(TurnId(99)))
        );
        assert_eq!(
            store.resolve_assistant_turn(user, answered("x")),
            Err(ResolveError::NotAssistant(user))
        );
    }

    #[test]
    fn history_excludes_pending_and_serializes_answers() {
        let mut store = MessageStore::new();
        store.append_user_turn("What are the categories?").unwrap();
        let first = store.append_pending_assistant_turn();
        store.resolve_assistant_turn(first, answered("A, B, C")).unwrap();
        store.append_user_turn("How do I submit?").unwrap();
        store.append_pending_assistant_turn();

        let history = store.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[0].content, "What are the categories?");
        assert_eq!(history[1].role, "assistant");
        let replayed = crate::envelope::parse(&history[1].content).unwrap();
        assert_eq!(replayed.response, "A, B, C");
        assert_eq!(history[2].content, "How do I submit?");
    }

    #[test]
    fn failed_turns_replay_as_apology_envelopes() {
        let mut store = MessageStore::new();
        store.append_user_turn("hello").unwrap();
        let id = store.append_pending_assistant_turn();
        store
            .resolve_assistant_turn(
                id,
                TurnOutcome::Failed {
                    kind: FailureKind::Network,
                    message: GENERIC_FAILURE_MESSAGE.to_string(),
                },
            )
            .unwrap();

        let history = store.history();
        let replayed = crate::envelope::parse(&history[1].content).unwrap();
        assert_eq!(replayed.response, GENERIC_FAILURE_MESSAGE);
        assert!(!replayed.debug.context_used);
    }
}
