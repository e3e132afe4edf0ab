pub mod client;
pub mod config;
pub mod controller;
pub mod envelope;
pub mod store;
pub mod timeout;
pub mod turn;

// Re-export main types for convenience
pub use client::{CompletionClient, CompletionError, HttpCompletionClient};
pub use config::Config;
pub use controller::{ChatController, SubmitOutcome, TurnEvent};
pub use envelope::{ResponseEnvelope, GENERIC_FAILURE_MESSAGE, PLACEHOLDER_SENTINEL};
pub use store::{HistoryEntry, MessageStore, ResolveError, TurnOutcome};
pub use timeout::{TimeoutGuard, DEFAULT_TURN_TIMEOUT};
pub use turn::{AssistantState, FailureKind, Role, Turn, TurnBody, TurnId};
