//! Read-only traversal helpers over blocks and their connections.

use std::collections::HashSet;

use crate::block::{Block, BlockArena, BlockId};
use crate::connection::{Connection, ConnectionArena, ConnectionId};

/// Borrowed view of a workspace's blocks and connections.
///
/// Validators and searches receive this view so they can look past a
/// connection to the blocks on either side of it.
#[derive(Clone, Copy)]
pub struct ConnectionGraph<'a> {
    connections: &'a ConnectionArena,
    blocks: &'a BlockArena,
}

impl<'a> ConnectionGraph<'a> {
    pub fn new(connections: &'a ConnectionArena, blocks: &'a BlockArena) -> Self {
        Self { connections, blocks }
    }

    pub fn connections(&self) -> &'a ConnectionArena {
        self.connections
    }

    pub fn blocks(&self) -> &'a BlockArena {
        self.blocks
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&'a Connection> {
        self.connections.get(id)
    }

    pub fn block(&self, id: BlockId) -> Option<&'a Block> {
        self.blocks.get(id)
    }

    /// Block on the other end of the non-shadow link of `id`.
    pub fn target_block(&self, id: ConnectionId) -> Option<BlockId> {
        let target = self.connection(id)?.target()?;
        Some(self.connection(target)?.source_block())
    }

    /// Block on the other end of the shadow link of `id`.
    pub fn shadow_block(&self, id: ConnectionId) -> Option<BlockId> {
        let target = self.connection(id)?.shadow_target()?;
        Some(self.connection(target)?.source_block())
    }

    /// Parent block, reached through the block's previous or output plug.
    ///
    /// A shadow-only link counts when no regular link exists.
    pub fn parent_block(&self, block: BlockId) -> Option<BlockId> {
        let plug = self.block(block)?.inferior_connection()?;
        self.target_block(plug).or_else(|| self.shadow_block(plug))
    }

    /// Top-most ancestor of `block`; the block itself when it has no parent.
    pub fn root_block(&self, block: BlockId) -> BlockId {
        let mut current = block;
        let mut seen = HashSet::new();
        while seen.insert(current) {
            match self.parent_block(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    /// Whether `ancestor` is `block` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: BlockId, block: BlockId) -> bool {
        let mut current = Some(block);
        let mut seen = HashSet::new();
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id) {
                return false;
            }
            current = self.parent_block(id);
        }
        false
    }

    pub fn direct_connections(&self, block: BlockId) -> Vec<ConnectionId> {
        self.block(block)
            .map(Block::direct_connections)
            .unwrap_or_default()
    }

    /// `block` and every block below it, following regular and shadow links
    /// of its superior connections. Depth-first, parents before children.
    pub fn all_blocks_for_tree(&self, block: BlockId) -> Vec<BlockId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![block];
        while let Some(id) = stack.pop() {
            let Some(current) = self.block(id) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            out.push(id);
            let mut children = Vec::new();
            for conn_id in current.direct_connections() {
                let Some(conn) = self.connection(conn_id) else {
                    continue;
                };
                if !conn.connection_type().is_superior() {
                    continue;
                }
                children.extend(self.target_block(conn_id));
                children.extend(self.shadow_block(conn_id));
            }
            // Reverse so the first declared child is visited first.
            stack.extend(children.into_iter().rev());
        }
        out
    }

    pub fn all_connections_for_tree(&self, block: BlockId) -> Vec<ConnectionId> {
        self.all_blocks_for_tree(block)
            .into_iter()
            .flat_map(|id| self.direct_connections(id))
            .collect()
    }

    /// Next connection of the last block in the statement stack under `block`.
    ///
    /// Returns `None` when that last block has no next connection.
    pub fn last_next_connection_in_stack(&self, block: BlockId) -> Option<ConnectionId> {
        let mut current = block;
        let mut seen = HashSet::new();
        loop {
            if !seen.insert(current) {
                return None;
            }
            let next = self.block(current)?.next_connection()?;
            match self.target_block(next) {
                Some(child) => current = child,
                None => return Some(next),
            }
        }
    }
}
