//! Conversational wizard collecting budget records step by step.

pub mod engine;
pub mod normalize;
pub mod record;
pub mod session;
pub mod transport;

pub use engine::WizardEngine;
pub use record::{Budget, BudgetType, Currency, MoneyFlowRecord, RecordError};
pub use session::{Draft, DraftPatch, SessionStore, Step};
pub use transport::{ChatTransport, TelegramTransport, TransportError};
