//! Block workspace: owns blocks, connections and the connection manager.
//!
//! Every position change goes through [`Workspace`] so the manager's sorted
//! indices stay consistent with connection positions. Connection positions
//! are absolute; a block and its connections always move together.
//!
//! # Example
//!
//! ```
//! use block_snap::{BlockBuilder, LayoutConfig, Workspace, WorkspacePoint};
//!
//! let mut ws = Workspace::new(LayoutConfig::default());
//! let stack = ws
//!     .add_block(BlockBuilder::new("set").previous((0.0, 0.0)).next((0.0, 30.0)))
//!     .unwrap();
//! let child = ws
//!     .add_block(
//!         BlockBuilder::new("print")
//!             .at(WorkspacePoint::new(200.0, 200.0))
//!             .previous((0.0, 0.0)),
//!     )
//!     .unwrap();
//!
//! let next = ws.block(stack).unwrap().next_connection().unwrap();
//! let previous = ws.block(child).unwrap().previous_connection().unwrap();
//! ws.connect(next, previous).unwrap();
//!
//! // The child was pulled under its parent.
//! assert_eq!(ws.block(child).unwrap().position(), WorkspacePoint::new(0.0, 30.0));
//! assert_eq!(ws.root_block(child), stack);
//! ```

use crate::block::{Block, BlockArena, BlockBuilder, BlockId, ConnectionSpec, InputKind};
use crate::bumper::BlockBumper;
use crate::config::LayoutConfig;
use crate::connection::{self, Connection, ConnectionArena, ConnectionId, ConnectionType};
use crate::error::{ConfigError, WorkspaceError};
use crate::graph::ConnectionGraph;
use crate::manager::{ConnectionManager, GroupId};
use crate::units::WorkspacePoint;
use crate::validator::ConnectionValidator;

/// Blocks, their connections and the proximity index over them.
#[derive(Debug)]
pub struct Workspace {
    connections: ConnectionArena,
    blocks: BlockArena,
    manager: ConnectionManager,
    config: LayoutConfig,
    /// Back to front.
    z_order: Vec<BlockId>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl Workspace {
    pub fn new(config: LayoutConfig) -> Self {
        Self::with_manager(config, ConnectionManager::new())
    }

    /// Like [`new`](Self::new), but rejects invalid distances.
    pub fn try_new(config: LayoutConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Create a workspace whose manager uses a custom validator.
    pub fn with_validator<V: ConnectionValidator + 'static>(config: LayoutConfig, validator: V) -> Self {
        Self::with_manager(config, ConnectionManager::with_validator(validator))
    }

    fn with_manager(config: LayoutConfig, manager: ConnectionManager) -> Self {
        Self {
            connections: ConnectionArena::with_key(),
            blocks: BlockArena::with_key(),
            manager,
            config,
            z_order: Vec::new(),
        }
    }

    pub fn graph(&self) -> ConnectionGraph<'_> {
        ConnectionGraph::new(&self.connections, &self.blocks)
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn connections(&self) -> &ConnectionArena {
        &self.connections
    }

    pub fn blocks(&self) -> &BlockArena {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Connection arena and manager borrowed together, for direct group
    /// bookkeeping that does not move anything.
    pub fn split_manager(&mut self) -> (&ConnectionArena, &mut ConnectionManager) {
        (&self.connections, &mut self.manager)
    }

    /// Block ids from back to front.
    pub fn z_order(&self) -> &[BlockId] {
        &self.z_order
    }

    // ========================================================================
    // Blocks
    // ========================================================================

    /// Create a block and track its connections in the main group.
    pub fn add_block(&mut self, builder: BlockBuilder) -> Result<BlockId, WorkspaceError> {
        if builder.previous.is_some() && builder.output.is_some() {
            return Err(WorkspaceError::PreviousAndOutput);
        }
        let BlockBuilder {
            name,
            shadow,
            movable,
            position,
            previous,
            output,
            next,
            inputs,
        } = builder;

        let id = self.blocks.insert(Block::new(name, shadow, movable, position));
        if let Some(spec) = previous {
            let conn = self.create_connection(id, ConnectionType::PreviousStatement, spec)?;
            self.blocks[id].set_previous(conn);
        }
        if let Some(spec) = output {
            let conn = self.create_connection(id, ConnectionType::OutputValue, spec)?;
            self.blocks[id].set_output(conn);
        }
        if let Some(spec) = next {
            let conn = self.create_connection(id, ConnectionType::NextStatement, spec)?;
            self.blocks[id].set_next(conn);
        }
        for input in inputs {
            let ty = match input.kind {
                InputKind::Value => ConnectionType::InputValue,
                InputKind::Statement => ConnectionType::NextStatement,
            };
            let conn = self.create_connection(id, ty, input.connection)?;
            self.blocks[id].push_input(input.name, input.kind, conn);
        }
        self.z_order.push(id);
        tracing::trace!(block = ?id, name = self.blocks[id].name(), "added block");
        Ok(id)
    }

    fn create_connection(
        &mut self,
        block: BlockId,
        connection_type: ConnectionType,
        spec: ConnectionSpec,
    ) -> Result<ConnectionId, WorkspaceError> {
        let owner = &self.blocks[block];
        let mut conn = Connection::new(connection_type, block)
            .with_position(owner.position() + spec.offset)
            .with_shadow_source(owner.is_shadow());
        conn.set_type_checks(spec.type_checks);
        if let Some(high_priority) = spec.high_priority {
            conn.set_high_priority(high_priority);
        }
        let id = self.connections.insert(conn);
        self.manager.track_connection(&self.connections, id, None)?;
        Ok(id)
    }

    /// Unlink and delete a block. Its children become top-level blocks.
    pub fn remove_block(&mut self, block: BlockId) -> Result<(), WorkspaceError> {
        let conns = self
            .block(block)
            .ok_or(WorkspaceError::UnknownBlock(block))?
            .direct_connections();
        for id in conns {
            connection::disconnect(&mut self.connections, id);
            connection::disconnect_shadow(&mut self.connections, id);
            self.manager.untrack_connection(&self.connections, id);
            self.connections.remove(id);
        }
        self.blocks.remove(block);
        self.z_order.retain(|id| *id != block);
        tracing::debug!(?block, "removed block");
        Ok(())
    }

    pub fn root_block(&self, block: BlockId) -> BlockId {
        self.graph().root_block(block)
    }

    // ========================================================================
    // Links
    // ========================================================================

    /// Link two connections and pull the inferior block's tree into place.
    pub fn connect(&mut self, a: ConnectionId, b: ConnectionId) -> Result<(), WorkspaceError> {
        let (superior, inferior) = self.ordered_pair(a, b)?;
        self.connections[superior]
            .can_connect_with_reason_to(self.connections.get(inferior))
            .into_result()?;
        self.check_cycle(superior, inferior)?;

        self.align(superior, inferior);
        connection::connect(&mut self.connections, superior, inferior)?;
        let parent = self.connections[superior].source_block();
        self.bring_to_front(parent);
        tracing::debug!(?superior, ?inferior, "connected");
        Ok(())
    }

    /// Attach a shadow block through the shadow slots of two connections.
    pub fn connect_shadow(&mut self, a: ConnectionId, b: ConnectionId) -> Result<(), WorkspaceError> {
        let (superior, inferior) = self.ordered_pair(a, b)?;
        self.connections[superior]
            .can_connect_shadow_with_reason_to(self.connections.get(inferior))
            .into_result()?;
        self.check_cycle(superior, inferior)?;

        self.align(superior, inferior);
        connection::connect_shadow(&mut self.connections, superior, inferior)?;
        tracing::debug!(?superior, ?inferior, "connected shadow");
        Ok(())
    }

    /// Clear the regular link of `id`. Returns the former partner.
    pub fn disconnect(&mut self, id: ConnectionId) -> Result<Option<ConnectionId>, WorkspaceError> {
        if !self.connections.contains_key(id) {
            return Err(WorkspaceError::UnknownConnection(id));
        }
        let partner = connection::disconnect(&mut self.connections, id);
        if partner.is_some() {
            tracing::debug!(connection = ?id, ?partner, "disconnected");
        }
        Ok(partner)
    }

    pub fn disconnect_shadow(&mut self, id: ConnectionId) -> Result<Option<ConnectionId>, WorkspaceError> {
        if !self.connections.contains_key(id) {
            return Err(WorkspaceError::UnknownConnection(id));
        }
        Ok(connection::disconnect_shadow(&mut self.connections, id))
    }

    /// Returns `(superior, inferior)`; mismatched types are reported by the
    /// connection checks themselves.
    fn ordered_pair(
        &self,
        a: ConnectionId,
        b: ConnectionId,
    ) -> Result<(ConnectionId, ConnectionId), WorkspaceError> {
        let conn_a = self
            .connection(a)
            .ok_or(WorkspaceError::UnknownConnection(a))?;
        if !self.connections.contains_key(b) {
            return Err(WorkspaceError::UnknownConnection(b));
        }
        if conn_a.connection_type().is_superior() {
            Ok((a, b))
        } else {
            Ok((b, a))
        }
    }

    fn check_cycle(&self, superior: ConnectionId, inferior: ConnectionId) -> Result<(), WorkspaceError> {
        let parent = self.connections[superior].source_block();
        let child = self.connections[inferior].source_block();
        if self.graph().is_ancestor_or_self(child, parent) {
            return Err(WorkspaceError::WouldCreateCycle(child));
        }
        Ok(())
    }

    fn align(&mut self, superior: ConnectionId, inferior: ConnectionId) {
        let delta = self.connections[superior].position() - self.connections[inferior].position();
        let child = self.connections[inferior].source_block();
        self.move_subtree(child, delta);
    }

    // ========================================================================
    // Movement
    // ========================================================================

    /// Move `block`, everything below it, and its connections by `delta`.
    pub fn move_block_tree(&mut self, block: BlockId, delta: WorkspacePoint) -> Result<(), WorkspaceError> {
        if !self.blocks.contains_key(block) {
            return Err(WorkspaceError::UnknownBlock(block));
        }
        self.move_subtree(block, delta);
        Ok(())
    }

    /// Move `block`'s tree so the block's top-left corner lands on `position`.
    pub fn move_block_to(&mut self, block: BlockId, position: WorkspacePoint) -> Result<(), WorkspaceError> {
        let current = self
            .block(block)
            .ok_or(WorkspaceError::UnknownBlock(block))?
            .position();
        self.move_subtree(block, position - current);
        Ok(())
    }

    fn move_subtree(&mut self, block: BlockId, delta: WorkspacePoint) {
        if delta == WorkspacePoint::ZERO {
            return;
        }
        let tree = self.graph().all_blocks_for_tree(block);
        for id in tree {
            let Some(b) = self.blocks.get_mut(id) else {
                continue;
            };
            b.set_position(b.position() + delta);
            for conn in b.direct_connections() {
                let Some(current) = self.connections.get(conn).map(Connection::position) else {
                    continue;
                };
                self.manager
                    .move_connection(&mut self.connections, conn, current + delta);
            }
        }
    }

    /// Raise `block`'s whole root tree to the front, keeping its internal order.
    pub fn bring_to_front(&mut self, block: BlockId) {
        let root = self.root_block(block);
        let tree = self.graph().all_blocks_for_tree(root);
        let (mut raised, mut rest): (Vec<BlockId>, Vec<BlockId>) = self
            .z_order
            .iter()
            .copied()
            .partition(|id| tree.contains(id));
        rest.append(&mut raised);
        self.z_order = rest;
    }

    /// Push blocks overlapping `block` apart.
    pub fn bump_neighbours(&mut self, block: BlockId) {
        BlockBumper::new(self.config.bump_distance).bump_neighbours(self, block);
    }

    // ========================================================================
    // Groups
    // ========================================================================

    /// Isolate `block`'s tree in a new group. See
    /// [`ConnectionManager::start_group_for_block`].
    pub fn start_group_for_block(&mut self, block: BlockId) -> GroupId {
        let graph = ConnectionGraph::new(&self.connections, &self.blocks);
        self.manager.start_group_for_block(graph, block)
    }

    pub fn set_drag_mode(&mut self, group: GroupId, dragging: bool) -> Result<(), WorkspaceError> {
        Ok(self.manager.set_drag_mode(&self.connections, group, dragging)?)
    }

    /// See [`ConnectionManager::merge_group`]; the source group is deleted.
    pub fn merge_group(&mut self, from: GroupId, into: Option<GroupId>) -> Result<(), WorkspaceError> {
        Ok(self.manager.merge_group(&self.connections, from, into)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectionError;

    fn statement(ws: &mut Workspace, name: &str, x: f64, y: f64) -> BlockId {
        ws.add_block(
            BlockBuilder::new(name)
                .at(WorkspacePoint::new(x, y))
                .previous((0.0, 0.0))
                .next((0.0, 30.0)),
        )
        .unwrap()
    }

    fn prev(ws: &Workspace, block: BlockId) -> ConnectionId {
        ws.block(block).unwrap().previous_connection().unwrap()
    }

    fn next(ws: &Workspace, block: BlockId) -> ConnectionId {
        ws.block(block).unwrap().next_connection().unwrap()
    }

    // ========================================================================
    // add / remove
    // ========================================================================

    #[test]
    fn test_add_block_places_and_tracks_connections() {
        let mut ws = Workspace::default();
        let block = ws
            .add_block(
                BlockBuilder::new("if")
                    .at(WorkspacePoint::new(10.0, 20.0))
                    .previous((0.0, 0.0))
                    .next((0.0, 50.0))
                    .value_input("IF", ConnectionSpec::at(60.0, 0.0).with_checks(["Boolean"]))
                    .statement_input("DO", (16.0, 24.0)),
            )
            .unwrap();

        let b = ws.block(block).unwrap();
        assert_eq!(b.direct_connections().len(), 4);
        let input = ws.connection(b.input("IF").unwrap().connection()).unwrap();
        assert_eq!(input.connection_type(), ConnectionType::InputValue);
        assert_eq!(input.position(), WorkspacePoint::new(70.0, 20.0));
        assert_eq!(input.type_checks(), Some(&["Boolean".to_string()][..]));
        let statement = ws.connection(b.input("DO").unwrap().connection()).unwrap();
        assert_eq!(statement.connection_type(), ConnectionType::NextStatement);
        assert_eq!(statement.position(), WorkspacePoint::new(26.0, 44.0));

        let main = ws.manager().main_group();
        assert_eq!(ws.manager().group(main).unwrap().len(), 4);
        assert_eq!(ws.z_order(), &[block]);
    }

    #[test]
    fn test_try_new_validates_config() {
        let bad = LayoutConfig::default().with_snap_distance(-1.0);
        assert!(matches!(
            Workspace::try_new(bad),
            Err(ConfigError::InvalidDistance { name: "snap_distance", .. })
        ));
        let ws = Workspace::try_new(LayoutConfig::default().with_bump_distance(10.0)).unwrap();
        assert_eq!(ws.config().bump_distance, 10.0);
    }

    #[test]
    fn test_previous_and_output_rejected() {
        let mut ws = Workspace::default();
        let result = ws.add_block(BlockBuilder::new("bad").previous((0.0, 0.0)).output((0.0, 0.0)));
        assert_eq!(result, Err(WorkspaceError::PreviousAndOutput));
        assert!(ws.blocks().is_empty());
    }

    #[test]
    fn test_shadow_flag_reaches_connections() {
        let mut ws = Workspace::default();
        let shadow = ws
            .add_block(BlockBuilder::new("math_number").shadow(true).output((0.0, 0.0)))
            .unwrap();
        let output = ws.block(shadow).unwrap().output_connection().unwrap();
        assert!(ws.connection(output).unwrap().is_shadow_source());
    }

    #[test]
    fn test_remove_block_unlinks_and_untracks() {
        let mut ws = Workspace::default();
        let parent = statement(&mut ws, "p", 0.0, 0.0);
        let child = statement(&mut ws, "c", 100.0, 100.0);
        ws.connect(next(&ws, parent), prev(&ws, child)).unwrap();

        let parent_next = next(&ws, parent);
        ws.remove_block(parent).unwrap();
        assert!(ws.block(parent).is_none());
        assert!(ws.connection(parent_next).is_none());
        assert!(!ws.manager().is_tracked(parent_next));
        assert!(!ws.connection(prev(&ws, child)).unwrap().is_connected());
        assert_eq!(ws.root_block(child), child);
        assert_eq!(ws.z_order(), &[child]);
        assert_eq!(ws.remove_block(parent), Err(WorkspaceError::UnknownBlock(parent)));
    }

    // ========================================================================
    // connect / disconnect
    // ========================================================================

    #[test]
    fn test_connect_aligns_child_tree() {
        let mut ws = Workspace::default();
        let a = statement(&mut ws, "a", 0.0, 0.0);
        let b = statement(&mut ws, "b", 200.0, 200.0);
        let c = statement(&mut ws, "c", 400.0, 400.0);
        ws.connect(next(&ws, b), prev(&ws, c)).unwrap();
        assert_eq!(ws.block(c).unwrap().position(), WorkspacePoint::new(200.0, 230.0));

        ws.connect(next(&ws, a), prev(&ws, b)).unwrap();
        assert_eq!(ws.block(b).unwrap().position(), WorkspacePoint::new(0.0, 30.0));
        assert_eq!(ws.block(c).unwrap().position(), WorkspacePoint::new(0.0, 60.0));
        assert_eq!(ws.connection(prev(&ws, c)).unwrap().position(), WorkspacePoint::new(0.0, 60.0));
        assert_eq!(ws.root_block(c), a);

        let main = ws.manager().main_group();
        for ty in ConnectionType::ALL {
            assert!(ws.manager().group(main).unwrap().list(ty).is_sorted(ws.connections()));
        }
    }

    #[test]
    fn test_connect_rejects_cycle() {
        let mut ws = Workspace::default();
        let a = statement(&mut ws, "a", 0.0, 0.0);
        let b = statement(&mut ws, "b", 0.0, 100.0);
        ws.connect(next(&ws, a), prev(&ws, b)).unwrap();

        // a's previous under its own child.
        assert_eq!(
            ws.connect(next(&ws, b), prev(&ws, a)),
            Err(WorkspaceError::WouldCreateCycle(a))
        );
        assert!(!ws.connection(prev(&ws, a)).unwrap().is_connected());
    }

    #[test]
    fn test_connect_reports_reason() {
        let mut ws = Workspace::default();
        let a = statement(&mut ws, "a", 0.0, 0.0);
        let b = statement(&mut ws, "b", 0.0, 100.0);
        let c = statement(&mut ws, "c", 0.0, 200.0);
        ws.connect(next(&ws, a), prev(&ws, b)).unwrap();

        assert_eq!(
            ws.connect(next(&ws, a), prev(&ws, c)),
            Err(WorkspaceError::Connection(ConnectionError::MustDisconnect))
        );
        assert_eq!(
            ws.connect(next(&ws, a), next(&ws, c)),
            Err(WorkspaceError::Connection(ConnectionError::WrongType))
        );
        assert_eq!(
            ws.connect(next(&ws, c), prev(&ws, c)),
            Err(WorkspaceError::Connection(ConnectionError::SelfConnection))
        );
        // Nothing moved on failure.
        assert_eq!(ws.block(c).unwrap().position(), WorkspacePoint::new(0.0, 200.0));
    }

    #[test]
    fn test_disconnect_returns_partner() {
        let mut ws = Workspace::default();
        let a = statement(&mut ws, "a", 0.0, 0.0);
        let b = statement(&mut ws, "b", 0.0, 100.0);
        ws.connect(next(&ws, a), prev(&ws, b)).unwrap();

        assert_eq!(ws.disconnect(prev(&ws, b)), Ok(Some(next(&ws, a))));
        assert_eq!(ws.disconnect(prev(&ws, b)), Ok(None));
        assert_eq!(ws.root_block(b), b);
    }

    #[test]
    fn test_shadow_link_keeps_parent() {
        let mut ws = Workspace::default();
        let parent = ws
            .add_block(BlockBuilder::new("p").value_input("A", (50.0, 0.0)))
            .unwrap();
        let shadow = ws
            .add_block(
                BlockBuilder::new("s")
                    .shadow(true)
                    .at(WorkspacePoint::new(300.0, 300.0))
                    .output((0.0, 0.0)),
            )
            .unwrap();
        let input = ws.block(parent).unwrap().input("A").unwrap().connection();
        let output = ws.block(shadow).unwrap().output_connection().unwrap();

        ws.connect_shadow(input, output).unwrap();
        assert_eq!(ws.block(shadow).unwrap().position(), WorkspacePoint::new(50.0, 0.0));
        assert_eq!(ws.root_block(shadow), parent);
        assert!(!ws.connection(input).unwrap().is_connected());

        assert_eq!(ws.disconnect_shadow(output), Ok(Some(input)));
        assert_eq!(ws.root_block(shadow), shadow);
    }

    #[test]
    fn test_connect_shadow_requires_shadow_child() {
        let mut ws = Workspace::default();
        let parent = ws
            .add_block(BlockBuilder::new("p").value_input("A", (50.0, 0.0)))
            .unwrap();
        let value = ws.add_block(BlockBuilder::new("v").output((0.0, 0.0))).unwrap();
        let input = ws.block(parent).unwrap().input("A").unwrap().connection();
        let output = ws.block(value).unwrap().output_connection().unwrap();
        assert_eq!(
            ws.connect_shadow(input, output),
            Err(WorkspaceError::Connection(ConnectionError::CannotSetShadowForTarget))
        );
    }

    // ========================================================================
    // movement / z-order
    // ========================================================================

    #[test]
    fn test_move_block_to_moves_connections() {
        let mut ws = Workspace::default();
        let a = statement(&mut ws, "a", 0.0, 0.0);
        ws.move_block_to(a, WorkspacePoint::new(5.0, 7.0)).unwrap();
        assert_eq!(ws.connection(next(&ws, a)).unwrap().position(), WorkspacePoint::new(5.0, 37.0));

        ws.move_block_tree(a, WorkspacePoint::new(-5.0, 0.0)).unwrap();
        assert_eq!(ws.block(a).unwrap().position(), WorkspacePoint::new(0.0, 7.0));
    }

    #[test]
    fn test_bring_to_front_raises_whole_tree() {
        let mut ws = Workspace::default();
        let a = statement(&mut ws, "a", 0.0, 0.0);
        let b = statement(&mut ws, "b", 0.0, 100.0);
        let c = statement(&mut ws, "c", 0.0, 200.0);
        ws.connect(next(&ws, a), prev(&ws, b)).unwrap();
        assert_eq!(ws.z_order(), &[c, a, b]);

        ws.bring_to_front(c);
        assert_eq!(ws.z_order(), &[a, b, c]);
        ws.bring_to_front(b);
        assert_eq!(ws.z_order(), &[c, a, b]);
    }
}
