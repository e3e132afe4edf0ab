//! Conversation turn types shared between the store, the controller, and
//! whatever front end renders them.

use std::fmt;

use crate::envelope::ResponseEnvelope;

/// Opaque identifier for one turn. Assigned by the store at creation and
/// stable for the turn's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnId(pub(crate) u64);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// Why an assistant turn ended without an answer. All three render the same
/// to the user; the distinction exists for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Parse,
    Timeout,
    Network,
}

/// Lifecycle of an assistant turn. Pending exactly once, then exactly one
/// transition to Answered or Failed.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantState {
    Pending { placeholder: ResponseEnvelope },
    Answered { envelope: ResponseEnvelope },
    Failed { kind: FailureKind, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnBody {
    User { text: String },
    Assistant(AssistantState),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub id: TurnId,
    pub body: TurnBody,
}

impl Turn {
    pub fn role(&self) -> Role {
        match self.body {
            TurnBody::User { .. } => Role::User,
            TurnBody::Assistant(_) => Role::Assistant,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self.body,
            TurnBody::Assistant(AssistantState::Pending { .. })
        )
    }
}
