//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, error types, and the state
//! machine trait that form the vocabulary of the Vinecellar domain.

mod address;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use address::Address;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CaveId, MemberId, ShipmentId, SubscriptionId, WineId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
