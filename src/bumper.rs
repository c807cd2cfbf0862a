//! Pushes overlapping blocks apart after a connect or disconnect.
//!
//! Bumping runs in two passes for a block `X`:
//!
//! 1. If `X` has a previous or output connection, its single nearest
//!    stationary neighbour outside `X`'s own root tree pushes `X`'s root tree
//!    away.
//! 2. Every high priority connection of `X` (by default its next and input
//!    sockets) bumps the blocks plugged into it (recursively), then pushes
//!    away every stationary neighbour near it.
//!
//! A bump moves the impinging root tree so its connection sits exactly
//! `bump_distance` right of and below the stationary one, then raises that
//! tree to the front. Everything here is best effort: missing blocks or
//! connections and immovable roots are skipped.

use std::collections::HashSet;

use crate::block::BlockId;
use crate::connection::ConnectionId;
use crate::units::WorkspacePoint;
use crate::workspace::Workspace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockBumper {
    bump_distance: f64,
}

impl BlockBumper {
    pub fn new(bump_distance: f64) -> Self {
        Self { bump_distance }
    }

    pub fn bump_distance(&self) -> f64 {
        self.bump_distance
    }

    /// Push blocks near `block` out of the way, and `block` out of theirs.
    pub fn bump_neighbours(&self, ws: &mut Workspace, block: BlockId) {
        let mut visited = HashSet::new();
        self.bump_block(ws, block, &mut visited);
    }

    fn bump_block(&self, ws: &mut Workspace, block: BlockId, visited: &mut HashSet<BlockId>) {
        if !visited.insert(block) {
            return;
        }
        let Some(b) = ws.block(block) else {
            return;
        };
        let plug = b.inferior_connection();
        let direct = b.direct_connections();

        if let Some(plug) = plug {
            if let Some(neighbour) = self.nearest_foreign_neighbour(ws, plug) {
                self.bump_away(ws, plug, neighbour);
            }
        }

        for conn in direct {
            let Some(c) = ws.connection(conn) else {
                continue;
            };
            if !c.is_high_priority() {
                continue;
            }
            let graph = ws.graph();
            let linked: Vec<BlockId> = graph
                .target_block(conn)
                .into_iter()
                .chain(graph.shadow_block(conn))
                .collect();
            for other in linked {
                self.bump_block(ws, other, visited);
            }

            let own_root = ws.root_block(block);
            let neighbours = ws
                .manager()
                .stationary_neighbours_for(ws.connections(), conn, self.bump_distance);
            let mut bumped_roots = HashSet::new();
            for neighbour in neighbours {
                let Some(n) = ws.connection(neighbour) else {
                    continue;
                };
                let root = ws.root_block(n.source_block());
                if root == own_root || !bumped_roots.insert(root) {
                    continue;
                }
                self.bump_away(ws, neighbour, conn);
            }
        }
    }

    /// Closest stationary neighbour of `conn` that is not in its root tree.
    fn nearest_foreign_neighbour(&self, ws: &Workspace, conn: ConnectionId) -> Option<ConnectionId> {
        let c = ws.connection(conn)?;
        let own_root = ws.root_block(c.source_block());
        ws.manager()
            .stationary_neighbours_for(ws.connections(), conn, self.bump_distance)
            .into_iter()
            .filter_map(|id| {
                let other = ws.connection(id)?;
                if ws.root_block(other.source_block()) == own_root {
                    return None;
                }
                Some((id, c.distance_from(other)))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Move the root tree owning `impinging` away from `stationary`.
    fn bump_away(&self, ws: &mut Workspace, impinging: ConnectionId, stationary: ConnectionId) {
        let (Some(moving), Some(fixed)) = (ws.connection(impinging), ws.connection(stationary)) else {
            return;
        };
        let root = ws.root_block(moving.source_block());
        if !ws.block(root).map_or(false, |b| b.is_movable()) {
            return;
        }
        let target = fixed.position() + WorkspacePoint::new(self.bump_distance, self.bump_distance);
        let delta = target - moving.position();
        if ws.move_block_tree(root, delta).is_err() {
            return;
        }
        ws.bring_to_front(root);
        tracing::trace!(?root, dx = delta.x, dy = delta.y, "bumped block tree");
    }
}
