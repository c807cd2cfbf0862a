//! Connections: typed attachment points on blocks.
//!
//! A [`Connection`] lives in a [`ConnectionArena`] and refers to its partners
//! and its owning block through arena handles only. The link mutations
//! ([`connect`], [`connect_shadow`], [`disconnect`], [`disconnect_shadow`])
//! therefore operate on the arena so both sides are updated together.
//!
//! # Example
//!
//! ```
//! use block_snap::connection::{self, Connection, ConnectionArena, ConnectionType};
//! use block_snap::block::BlockId;
//! use slotmap::KeyData;
//!
//! let parent = BlockId::from(KeyData::from_ffi(1));
//! let child = BlockId::from(KeyData::from_ffi(2));
//!
//! let mut arena = ConnectionArena::with_key();
//! let next = arena.insert(Connection::new(ConnectionType::NextStatement, parent));
//! let previous = arena.insert(Connection::new(ConnectionType::PreviousStatement, child));
//!
//! connection::connect(&mut arena, next, previous).unwrap();
//! assert_eq!(arena[previous].target(), Some(next));
//! ```

use slotmap::{new_key_type, SlotMap};

use crate::block::BlockId;
use crate::error::ConnectionError;
use crate::units::WorkspacePoint;

new_key_type! {
    /// Handle of a connection inside a [`ConnectionArena`].
    pub struct ConnectionId;
}

/// Storage for every connection of a workspace.
pub type ConnectionArena = SlotMap<ConnectionId, Connection>;

/// The four kinds of connection points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionType {
    /// Top of a statement block; plugs into a `NextStatement`.
    PreviousStatement,
    /// Bottom of a statement block, or a statement input.
    NextStatement,
    /// A value input socket.
    InputValue,
    /// Left edge of a value block; plugs into an `InputValue`.
    OutputValue,
}

impl ConnectionType {
    pub const ALL: [ConnectionType; 4] = [
        ConnectionType::PreviousStatement,
        ConnectionType::NextStatement,
        ConnectionType::InputValue,
        ConnectionType::OutputValue,
    ];

    /// The only type this one may pair with.
    pub fn opposite(self) -> ConnectionType {
        match self {
            ConnectionType::PreviousStatement => ConnectionType::NextStatement,
            ConnectionType::NextStatement => ConnectionType::PreviousStatement,
            ConnectionType::InputValue => ConnectionType::OutputValue,
            ConnectionType::OutputValue => ConnectionType::InputValue,
        }
    }

    /// Socket side: the block owning a superior connection is the parent.
    pub fn is_superior(self) -> bool {
        matches!(self, ConnectionType::NextStatement | ConnectionType::InputValue)
    }

    /// Stable index in `0..4`, used to address per-type buckets.
    pub fn index(self) -> usize {
        match self {
            ConnectionType::PreviousStatement => 0,
            ConnectionType::NextStatement => 1,
            ConnectionType::InputValue => 2,
            ConnectionType::OutputValue => 3,
        }
    }
}

/// Outcome of a compatibility predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
    /// The two connections may be linked.
    CanConnect,
    /// The link is refused for the given reason.
    Rejected(ConnectionError),
}

impl CheckResult {
    pub fn can_connect(&self) -> bool {
        matches!(self, CheckResult::CanConnect)
    }

    /// Combine two results (AND logic): the first rejection wins.
    pub fn and(self, other: CheckResult) -> CheckResult {
        match self {
            CheckResult::CanConnect => other,
            rejected => rejected,
        }
    }

    /// True for `CanConnect` and for a rejection caused only by occupancy.
    ///
    /// Occupied connections can still be reached by splicing, so searches
    /// treat them as candidates.
    pub fn can_connect_or_must_disconnect(&self) -> bool {
        matches!(
            self,
            CheckResult::CanConnect | CheckResult::Rejected(ConnectionError::MustDisconnect)
        )
    }

    pub fn into_result(self) -> Result<(), ConnectionError> {
        match self {
            CheckResult::CanConnect => Ok(()),
            CheckResult::Rejected(reason) => Err(reason),
        }
    }
}

/// A single typed attachment point on a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    connection_type: ConnectionType,
    source_block: BlockId,
    /// Shadow flag of the owning block, recorded at creation.
    source_shadow: bool,
    position: WorkspacePoint,
    target: Option<ConnectionId>,
    shadow_target: Option<ConnectionId>,
    type_checks: Option<Vec<String>>,
    high_priority: bool,
}

impl Connection {
    /// Create an unlinked connection owned by `source_block`.
    ///
    /// Next and input connections are high priority by default: they are the
    /// sockets that push other blocks out of the way when bumping.
    pub fn new(connection_type: ConnectionType, source_block: BlockId) -> Self {
        Self {
            connection_type,
            source_block,
            source_shadow: false,
            position: WorkspacePoint::ZERO,
            target: None,
            shadow_target: None,
            type_checks: None,
            high_priority: connection_type.is_superior(),
        }
    }

    pub fn with_position(mut self, position: WorkspacePoint) -> Self {
        self.position = position;
        self
    }

    pub fn with_type_checks<I, S>(mut self, checks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_checks = Some(checks.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_high_priority(mut self, high_priority: bool) -> Self {
        self.high_priority = high_priority;
        self
    }

    /// Mark the connection as belonging to a shadow block.
    pub fn with_shadow_source(mut self, shadow: bool) -> Self {
        self.source_shadow = shadow;
        self
    }

    pub fn connection_type(&self) -> ConnectionType {
        self.connection_type
    }

    pub fn source_block(&self) -> BlockId {
        self.source_block
    }

    pub fn is_shadow_source(&self) -> bool {
        self.source_shadow
    }

    pub fn position(&self) -> WorkspacePoint {
        self.position
    }

    /// Update the position without notifying any group.
    ///
    /// Tracked connections must be moved through
    /// [`ConnectionManager::move_connection`](crate::ConnectionManager::move_connection)
    /// so their sorted index stays correct.
    pub(crate) fn set_position(&mut self, position: WorkspacePoint) {
        self.position = position;
    }

    pub fn target(&self) -> Option<ConnectionId> {
        self.target
    }

    pub fn shadow_target(&self) -> Option<ConnectionId> {
        self.shadow_target
    }

    pub fn is_connected(&self) -> bool {
        self.target.is_some()
    }

    pub fn is_shadow_connected(&self) -> bool {
        self.shadow_target.is_some()
    }

    pub fn type_checks(&self) -> Option<&[String]> {
        self.type_checks.as_deref()
    }

    pub fn set_type_checks(&mut self, checks: Option<Vec<String>>) {
        self.type_checks = checks;
    }

    pub fn is_high_priority(&self) -> bool {
        self.high_priority
    }

    pub fn set_high_priority(&mut self, high_priority: bool) {
        self.high_priority = high_priority;
    }

    /// Euclidean distance between the two connection points.
    pub fn distance_from(&self, other: &Connection) -> f64 {
        self.position.distance_to(other.position)
    }

    /// Whether the type-check tags of both connections are compatible.
    ///
    /// An unset list accepts anything. An empty list accepts nothing but an
    /// unset list. Otherwise the lists must share a tag (case-sensitive).
    pub fn type_checks_match(&self, other: &Connection) -> bool {
        match (&self.type_checks, &other.type_checks) {
            (None, _) | (_, None) => true,
            (Some(mine), Some(theirs)) => mine.iter().any(|check| theirs.contains(check)),
        }
    }

    /// Whether a non-shadow link to `other` would be accepted, and why not.
    pub fn can_connect_with_reason_to(&self, other: Option<&Connection>) -> CheckResult {
        let Some(other) = other else {
            return CheckResult::Rejected(ConnectionError::TargetNull);
        };
        if let Some(reason) = self.structural_mismatch(other) {
            return CheckResult::Rejected(reason);
        }
        if self.is_connected() || other.is_connected() {
            return CheckResult::Rejected(ConnectionError::MustDisconnect);
        }
        self.link_rules(other)
    }

    /// Like [`can_connect_with_reason_to`](Self::can_connect_with_reason_to),
    /// but as if this connection's current link were already cleared.
    ///
    /// `other` must still be free.
    pub fn can_splice_with_reason_to(&self, other: Option<&Connection>) -> CheckResult {
        let Some(other) = other else {
            return CheckResult::Rejected(ConnectionError::TargetNull);
        };
        if let Some(reason) = self.structural_mismatch(other) {
            return CheckResult::Rejected(reason);
        }
        if other.is_connected() {
            return CheckResult::Rejected(ConnectionError::MustDisconnect);
        }
        self.link_rules(other)
    }

    fn link_rules(&self, other: &Connection) -> CheckResult {
        if !self.type_checks_match(other) {
            return CheckResult::Rejected(ConnectionError::ChecksFailed);
        }
        let (superior, inferior) = self.ordered_with(other);
        if superior.source_shadow && !inferior.source_shadow {
            return CheckResult::Rejected(ConnectionError::InferiorBlockShadowMismatch);
        }
        CheckResult::CanConnect
    }

    /// Whether a shadow link to `other` would be accepted, and why not.
    pub fn can_connect_shadow_with_reason_to(&self, other: Option<&Connection>) -> CheckResult {
        let Some(other) = other else {
            return CheckResult::Rejected(ConnectionError::ShadowNull);
        };
        if let Some(reason) = self.structural_mismatch(other) {
            return CheckResult::Rejected(reason);
        }
        if self.is_shadow_connected() || other.is_shadow_connected() {
            return CheckResult::Rejected(ConnectionError::MustDisconnect);
        }
        if !self.type_checks_match(other) {
            return CheckResult::Rejected(ConnectionError::ChecksFailed);
        }
        let (_, inferior) = self.ordered_with(other);
        if !inferior.source_shadow {
            return CheckResult::Rejected(ConnectionError::CannotSetShadowForTarget);
        }
        CheckResult::CanConnect
    }

    pub fn can_connect_to(&self, other: &Connection) -> bool {
        self.can_connect_with_reason_to(Some(other)).can_connect()
    }

    fn structural_mismatch(&self, other: &Connection) -> Option<ConnectionError> {
        if self.source_block == other.source_block {
            Some(ConnectionError::SelfConnection)
        } else if self.connection_type.opposite() != other.connection_type {
            Some(ConnectionError::WrongType)
        } else {
            None
        }
    }

    /// Returns `(superior, inferior)`. Only meaningful for complementary types.
    fn ordered_with<'a>(&'a self, other: &'a Connection) -> (&'a Connection, &'a Connection) {
        if self.connection_type.is_superior() {
            (self, other)
        } else {
            (other, self)
        }
    }
}

/// Link `a` and `b` with a non-shadow link on both sides.
///
/// Nothing is mutated when the link is refused.
pub fn connect(
    arena: &mut ConnectionArena,
    a: ConnectionId,
    b: ConnectionId,
) -> Result<(), ConnectionError> {
    if a == b {
        return Err(ConnectionError::SelfConnection);
    }
    let check = match arena.get(a) {
        Some(conn) => conn.can_connect_with_reason_to(arena.get(b)),
        None => CheckResult::Rejected(ConnectionError::TargetNull),
    };
    check.into_result()?;
    arena[a].target = Some(b);
    arena[b].target = Some(a);
    Ok(())
}

/// Link `a` and `b` through their shadow slots.
pub fn connect_shadow(
    arena: &mut ConnectionArena,
    a: ConnectionId,
    b: ConnectionId,
) -> Result<(), ConnectionError> {
    if a == b {
        return Err(ConnectionError::SelfConnection);
    }
    let check = match arena.get(a) {
        Some(conn) => conn.can_connect_shadow_with_reason_to(arena.get(b)),
        None => CheckResult::Rejected(ConnectionError::ShadowNull),
    };
    check.into_result()?;
    arena[a].shadow_target = Some(b);
    arena[b].shadow_target = Some(a);
    Ok(())
}

/// Clear the non-shadow link of `id` on both sides.
///
/// Returns the former partner, or `None` when there was no link.
pub fn disconnect(arena: &mut ConnectionArena, id: ConnectionId) -> Option<ConnectionId> {
    let partner = arena.get_mut(id)?.target.take()?;
    if let Some(other) = arena.get_mut(partner) {
        other.target = None;
    }
    Some(partner)
}

/// Clear the shadow link of `id` on both sides.
pub fn disconnect_shadow(arena: &mut ConnectionArena, id: ConnectionId) -> Option<ConnectionId> {
    let partner = arena.get_mut(id)?.shadow_target.take()?;
    if let Some(other) = arena.get_mut(partner) {
        other.shadow_target = None;
    }
    Some(partner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use slotmap::SlotMap;

    fn blocks(n: usize) -> Vec<BlockId> {
        let mut blocks: SlotMap<BlockId, ()> = SlotMap::with_key();
        (0..n).map(|_| blocks.insert(())).collect()
    }

    fn with_checks(checks: Option<&[&str]>) -> Connection {
        let b = blocks(1)[0];
        let conn = Connection::new(ConnectionType::InputValue, b);
        match checks {
            Some(list) => conn.with_type_checks(list.iter().copied()),
            None => conn,
        }
    }

    // ========================================================================
    // ConnectionType
    // ========================================================================

    #[test]
    fn test_opposite_types_pair_up() {
        for ty in ConnectionType::ALL {
            assert_ne!(ty, ty.opposite());
            assert_eq!(ty.opposite().opposite(), ty);
            assert_ne!(ty.is_superior(), ty.opposite().is_superior());
        }
    }

    #[test]
    fn test_type_indices_are_distinct() {
        let mut seen = [false; 4];
        for ty in ConnectionType::ALL {
            assert!(!seen[ty.index()]);
            seen[ty.index()] = true;
        }
    }

    #[test]
    fn test_sockets_are_high_priority_by_default() {
        let b = blocks(1)[0];
        for ty in ConnectionType::ALL {
            let conn = Connection::new(ty, b);
            assert_eq!(conn.is_high_priority(), ty.is_superior(), "{ty:?}");
        }
        let plug = Connection::new(ConnectionType::OutputValue, b).with_high_priority(true);
        assert!(plug.is_high_priority());
    }

    // ========================================================================
    // type_checks_match()
    // ========================================================================

    #[rstest]
    #[case(None, None, true)]
    #[case(None, Some(&[] as &[&str]), true)]
    #[case(Some(&[] as &[&str]), None, true)]
    #[case(Some(&[] as &[&str]), Some(&[] as &[&str]), false)]
    #[case(Some(&[""][..]), Some(&[""][..]), true)]
    #[case(Some(&["int", "string"][..]), Some(&["string"][..]), true)]
    #[case(Some(&["int"][..]), Some(&["string"][..]), false)]
    #[case(Some(&["String"][..]), Some(&["string"][..]), false)]
    fn test_type_checks_match(
        #[case] a: Option<&[&str]>,
        #[case] b: Option<&[&str]>,
        #[case] expected: bool,
    ) {
        let a = with_checks(a);
        let b = with_checks(b);
        assert_eq!(a.type_checks_match(&b), expected);
        assert_eq!(b.type_checks_match(&a), expected);
    }

    // ========================================================================
    // distance_from()
    // ========================================================================

    #[rstest]
    #[case((0.0, 0.0), (3.0, 4.0), 5.0)]
    #[case((10.0, 10.0), (310.0, -390.0), 500.0)]
    #[case((5.0, 5.0), (5.0, 25.0), 20.0)]
    #[case((-2.0, 1.0), (-2.0, 1.0), 0.0)]
    fn test_distance_from(#[case] a: (f64, f64), #[case] b: (f64, f64), #[case] expected: f64) {
        let ids = blocks(2);
        let a = Connection::new(ConnectionType::InputValue, ids[0]).with_position(a.into());
        let b = Connection::new(ConnectionType::OutputValue, ids[1]).with_position(b.into());
        assert_eq!(a.distance_from(&b), expected);
        assert_eq!(b.distance_from(&a), expected);
    }

    // ========================================================================
    // can_connect_with_reason_to()
    // ========================================================================

    #[test]
    fn test_can_connect_reasons() {
        let ids = blocks(2);
        let input = Connection::new(ConnectionType::InputValue, ids[0]);
        let output = Connection::new(ConnectionType::OutputValue, ids[1]);
        let same_block_output = Connection::new(ConnectionType::OutputValue, ids[0]);
        let other_input = Connection::new(ConnectionType::InputValue, ids[1]);

        assert_eq!(input.can_connect_with_reason_to(Some(&output)), CheckResult::CanConnect);
        assert_eq!(
            input.can_connect_with_reason_to(None),
            CheckResult::Rejected(ConnectionError::TargetNull)
        );
        assert_eq!(
            input.can_connect_with_reason_to(Some(&same_block_output)),
            CheckResult::Rejected(ConnectionError::SelfConnection)
        );
        assert_eq!(
            input.can_connect_with_reason_to(Some(&other_input)),
            CheckResult::Rejected(ConnectionError::WrongType)
        );
    }

    #[test]
    fn test_splice_check_ignores_own_link_only() {
        let ids = blocks(3);
        let mut arena = ConnectionArena::with_key();
        let input = arena.insert(Connection::new(ConnectionType::InputValue, ids[0]).with_type_checks(["Number"]));
        let occupant = arena.insert(Connection::new(ConnectionType::OutputValue, ids[1]));
        let number = Connection::new(ConnectionType::OutputValue, ids[2]).with_type_checks(["Number"]);
        let text = Connection::new(ConnectionType::OutputValue, ids[2]).with_type_checks(["String"]);
        connect(&mut arena, input, occupant).unwrap();

        let socket = &arena[input];
        assert_eq!(
            socket.can_connect_with_reason_to(Some(&text)),
            CheckResult::Rejected(ConnectionError::MustDisconnect)
        );
        assert_eq!(socket.can_splice_with_reason_to(Some(&number)), CheckResult::CanConnect);
        assert_eq!(
            socket.can_splice_with_reason_to(Some(&text)),
            CheckResult::Rejected(ConnectionError::ChecksFailed)
        );
        assert_eq!(
            socket.can_splice_with_reason_to(Some(&arena[occupant])),
            CheckResult::Rejected(ConnectionError::MustDisconnect)
        );
    }

    #[test]
    fn test_checks_failed_is_reported() {
        let ids = blocks(2);
        let input = Connection::new(ConnectionType::InputValue, ids[0]).with_type_checks(["Number"]);
        let output = Connection::new(ConnectionType::OutputValue, ids[1]).with_type_checks(["String"]);
        assert_eq!(
            output.can_connect_with_reason_to(Some(&input)),
            CheckResult::Rejected(ConnectionError::ChecksFailed)
        );
    }

    #[test]
    fn test_non_shadow_below_shadow_is_rejected() {
        let ids = blocks(2);
        let shadow_input =
            Connection::new(ConnectionType::InputValue, ids[0]).with_shadow_source(true);
        let output = Connection::new(ConnectionType::OutputValue, ids[1]);
        assert_eq!(
            output.can_connect_with_reason_to(Some(&shadow_input)),
            CheckResult::Rejected(ConnectionError::InferiorBlockShadowMismatch)
        );

        // A shadow child under a regular parent is fine.
        let input = Connection::new(ConnectionType::InputValue, ids[0]);
        let shadow_output =
            Connection::new(ConnectionType::OutputValue, ids[1]).with_shadow_source(true);
        assert!(shadow_output.can_connect_to(&input));
    }

    #[test]
    fn test_shadow_link_requires_shadow_child() {
        let ids = blocks(2);
        let next = Connection::new(ConnectionType::NextStatement, ids[0]);
        let previous = Connection::new(ConnectionType::PreviousStatement, ids[1]);
        assert_eq!(
            next.can_connect_shadow_with_reason_to(Some(&previous)),
            CheckResult::Rejected(ConnectionError::CannotSetShadowForTarget)
        );
        assert_eq!(
            next.can_connect_shadow_with_reason_to(None),
            CheckResult::Rejected(ConnectionError::ShadowNull)
        );

        let shadow_previous = previous.with_shadow_source(true);
        assert_eq!(
            next.can_connect_shadow_with_reason_to(Some(&shadow_previous)),
            CheckResult::CanConnect
        );
    }

    #[test]
    fn test_check_result_combinators() {
        let ok = CheckResult::CanConnect;
        let busy = CheckResult::Rejected(ConnectionError::MustDisconnect);
        let wrong = CheckResult::Rejected(ConnectionError::WrongType);

        assert!(ok.and(ok).can_connect());
        assert_eq!(ok.and(busy), busy);
        assert_eq!(wrong.and(busy), wrong);
        assert!(busy.can_connect_or_must_disconnect());
        assert!(!wrong.can_connect_or_must_disconnect());
        assert_eq!(wrong.into_result(), Err(ConnectionError::WrongType));
    }

    // ========================================================================
    // connect() / disconnect()
    // ========================================================================

    #[test]
    fn test_connect_is_symmetric_and_disconnect_round_trips() {
        let ids = blocks(2);
        let mut arena = ConnectionArena::with_key();
        let next = arena.insert(Connection::new(ConnectionType::NextStatement, ids[0]));
        let previous = arena.insert(Connection::new(ConnectionType::PreviousStatement, ids[1]));

        assert_eq!(
            arena[next].can_connect_with_reason_to(Some(&arena[previous])),
            arena[previous].can_connect_with_reason_to(Some(&arena[next]))
        );

        connect(&mut arena, previous, next).unwrap();
        assert_eq!(arena[next].target(), Some(previous));
        assert_eq!(arena[previous].target(), Some(next));

        // Occupied on both sides now.
        assert_eq!(connect(&mut arena, next, previous), Err(ConnectionError::MustDisconnect));

        assert_eq!(disconnect(&mut arena, next), Some(previous));
        assert_eq!(arena[next].target(), None);
        assert_eq!(arena[previous].target(), None);
        assert_eq!(disconnect(&mut arena, next), None);
    }

    #[test]
    fn test_failed_connect_leaves_state_untouched() {
        let ids = blocks(2);
        let mut arena = ConnectionArena::with_key();
        let a = arena.insert(Connection::new(ConnectionType::InputValue, ids[0]));
        let b = arena.insert(Connection::new(ConnectionType::NextStatement, ids[1]));

        assert_eq!(connect(&mut arena, a, b), Err(ConnectionError::WrongType));
        assert!(!arena[a].is_connected());
        assert!(!arena[b].is_connected());
        assert_eq!(connect(&mut arena, a, a), Err(ConnectionError::SelfConnection));
    }

    #[test]
    fn test_shadow_link_is_independent_of_target() {
        let ids = blocks(3);
        let mut arena = ConnectionArena::with_key();
        let input = arena.insert(Connection::new(ConnectionType::InputValue, ids[0]));
        let shadow_output = arena.insert(
            Connection::new(ConnectionType::OutputValue, ids[1]).with_shadow_source(true),
        );
        let real_output = arena.insert(Connection::new(ConnectionType::OutputValue, ids[2]));

        connect_shadow(&mut arena, input, shadow_output).unwrap();
        connect(&mut arena, real_output, input).unwrap();

        assert_eq!(arena[input].shadow_target(), Some(shadow_output));
        assert_eq!(arena[input].target(), Some(real_output));
        assert_eq!(arena[shadow_output].shadow_target(), Some(input));

        assert_eq!(disconnect_shadow(&mut arena, shadow_output), Some(input));
        assert!(!arena[input].is_shadow_connected());
        assert_eq!(arena[input].target(), Some(real_output));
    }
}
