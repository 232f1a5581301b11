//! State machine trait for lifecycle enums.
//!
//! Gives lifecycle phases (such as a connection handshake) one place to
//! declare their legal transitions and a checked `transition_to`.

use super::ValidationError;

/// Trait for phase enums that represent state machines.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for HandshakePhase {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!(
///             (self, target),
///             (Pending, Authenticated) | (Pending, Rejected) | (Authenticated, Closed)
///         )
///     }
///     // ...
/// }
///
/// let phase = HandshakePhase::Pending.transition_to(HandshakePhase::Authenticated)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
