//! Connection validation policies.
//!
//! The [`ConnectionManager`](crate::ConnectionManager) asks a
//! [`ConnectionValidator`] whether a moving connection may snap to a
//! candidate found by the proximity search. Policies are swapped at
//! construction time; [`DefaultConnectionValidator`] implements the standard
//! block-editor rules and [`CompositeValidator`] chains several policies.
//!
//! # Example
//!
//! ```ignore
//! struct NoLoops;
//!
//! impl ConnectionValidator for NoLoops {
//!     fn can_connect(&self, graph: ConnectionGraph<'_>, moving: ConnectionId, candidate: ConnectionId) -> bool {
//!         // Custom rule here
//!         true
//!     }
//! }
//!
//! let validator = CompositeValidator::new()
//!     .add(DefaultConnectionValidator)
//!     .add(NoLoops);
//! let manager = ConnectionManager::with_validator(validator);
//! ```

use crate::connection::{ConnectionId, ConnectionType};
use crate::graph::ConnectionGraph;

/// Policy answering "may `moving` be connected to `candidate`".
pub trait ConnectionValidator {
    fn can_connect(
        &self,
        graph: ConnectionGraph<'_>,
        moving: ConnectionId,
        candidate: ConnectionId,
    ) -> bool;
}

/// Standard rules for a dragged connection looking for a partner.
///
/// 1. The pair must be structurally compatible; an occupied candidate is
///    acceptable since the occupant can be spliced out.
/// 2. Type checks must intersect and a non-shadow block may not go below a
///    shadow block, even when the candidate is occupied.
/// 3. Plug sides (output, previous) are linked only once: an occupied plug
///    candidate, or an occupied moving connection, is refused.
/// 4. An occupied value input is refused when its occupant is neither movable
///    nor a shadow.
/// 5. A terminal block (no next connection) may not displace a non-shadow
///    statement that has a next connection of its own.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultConnectionValidator;

impl ConnectionValidator for DefaultConnectionValidator {
    fn can_connect(
        &self,
        graph: ConnectionGraph<'_>,
        moving_id: ConnectionId,
        candidate_id: ConnectionId,
    ) -> bool {
        let (Some(moving), Some(candidate)) =
            (graph.connection(moving_id), graph.connection(candidate_id))
        else {
            return false;
        };

        if !moving
            .can_connect_with_reason_to(Some(candidate))
            .can_connect_or_must_disconnect()
        {
            return false;
        }
        if !moving.type_checks_match(candidate) {
            return false;
        }
        let (superior, inferior) = if moving.connection_type().is_superior() {
            (moving, candidate)
        } else {
            (candidate, moving)
        };
        if superior.is_shadow_source() && !inferior.is_shadow_source() {
            return false;
        }

        match candidate.connection_type() {
            ConnectionType::OutputValue | ConnectionType::PreviousStatement => {
                if candidate.is_connected() || moving.is_connected() {
                    return false;
                }
            }
            ConnectionType::InputValue => {
                if let Some(occupant) = graph.target_block(candidate_id).and_then(|id| graph.block(id)) {
                    if !occupant.is_movable() && !occupant.is_shadow() {
                        return false;
                    }
                }
            }
            ConnectionType::NextStatement => {
                let terminal = graph
                    .block(moving.source_block())
                    .map_or(false, |block| block.next_connection().is_none());
                if terminal && moving.connection_type() == ConnectionType::PreviousStatement {
                    if let Some(occupant) = graph.target_block(candidate_id).and_then(|id| graph.block(id)) {
                        if !occupant.is_shadow() && occupant.next_connection().is_some() {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }
}

/// Validator that accepts everything the structural check accepts.
///
/// Useful for tests and for editors that do their own policy elsewhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct PermissiveValidator;

impl ConnectionValidator for PermissiveValidator {
    fn can_connect(
        &self,
        graph: ConnectionGraph<'_>,
        moving: ConnectionId,
        candidate: ConnectionId,
    ) -> bool {
        match (graph.connection(moving), graph.connection(candidate)) {
            (Some(moving), Some(candidate)) => moving.can_connect_to(candidate),
            _ => false,
        }
    }
}

/// Composite validator that combines multiple validators.
///
/// All validators must accept for the pair to be accepted (AND logic).
/// Checking stops at the first refusal.
pub struct CompositeValidator {
    validators: Vec<Box<dyn ConnectionValidator>>,
}

impl Default for CompositeValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeValidator {
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// Add a validator; validators run in the order they were added.
    pub fn add<V: ConnectionValidator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl ConnectionValidator for CompositeValidator {
    fn can_connect(
        &self,
        graph: ConnectionGraph<'_>,
        moving: ConnectionId,
        candidate: ConnectionId,
    ) -> bool {
        self.validators
            .iter()
            .all(|v| v.can_connect(graph, moving, candidate))
    }
}
