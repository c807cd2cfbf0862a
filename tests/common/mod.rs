//! Common test utilities for integration tests.

#![allow(dead_code)]

use block_snap::{BlockBuilder, BlockId, ConnectionId, ConnectionType, Workspace, WorkspacePoint};

/// Height of the statement blocks built by [`statement`].
pub const STATEMENT_HEIGHT: f64 = 30.0;

/// Statement block with a previous connection at its top-left corner and a
/// next connection [`STATEMENT_HEIGHT`] below it.
pub fn statement(ws: &mut Workspace, name: &str, x: f64, y: f64) -> BlockId {
    ws.add_block(
        BlockBuilder::new(name)
            .at(WorkspacePoint::new(x, y))
            .previous((0.0, 0.0))
            .next((0.0, STATEMENT_HEIGHT)),
    )
    .expect("statement block")
}

/// Value block with a single output at its top-left corner.
pub fn value(ws: &mut Workspace, name: &str, x: f64, y: f64) -> BlockId {
    ws.add_block(
        BlockBuilder::new(name)
            .at(WorkspacePoint::new(x, y))
            .output((0.0, 0.0)),
    )
    .expect("value block")
}

/// Block with a single value input named `IN` at its top-left corner.
pub fn socket(ws: &mut Workspace, name: &str, x: f64, y: f64) -> BlockId {
    ws.add_block(
        BlockBuilder::new(name)
            .at(WorkspacePoint::new(x, y))
            .value_input("IN", (0.0, 0.0)),
    )
    .expect("socket block")
}

pub fn prev(ws: &Workspace, block: BlockId) -> ConnectionId {
    ws.block(block)
        .and_then(|b| b.previous_connection())
        .expect("previous connection")
}

pub fn next(ws: &Workspace, block: BlockId) -> ConnectionId {
    ws.block(block)
        .and_then(|b| b.next_connection())
        .expect("next connection")
}

pub fn output(ws: &Workspace, block: BlockId) -> ConnectionId {
    ws.block(block)
        .and_then(|b| b.output_connection())
        .expect("output connection")
}

pub fn input(ws: &Workspace, block: BlockId, name: &str) -> ConnectionId {
    ws.block(block)
        .and_then(|b| b.input(name))
        .map(|i| i.connection())
        .expect("input connection")
}

pub fn position_of(ws: &Workspace, conn: ConnectionId) -> WorkspacePoint {
    ws.connection(conn).expect("connection").position()
}

/// Build a vertical stack of `len` statement blocks starting at `(x, y)`.
pub fn stack(ws: &mut Workspace, len: usize, x: f64, y: f64) -> Vec<BlockId> {
    let blocks: Vec<BlockId> = (0..len)
        .map(|i| statement(ws, &format!("s{i}"), x, y))
        .collect();
    for pair in blocks.windows(2) {
        let (upper, lower) = (next(ws, pair[0]), prev(ws, pair[1]));
        ws.connect(upper, lower).expect("stack link");
    }
    blocks
}

/// Assert every list of every group that is not dragging is sorted by y.
pub fn assert_groups_sorted(ws: &Workspace) {
    for (id, group) in ws.manager().groups() {
        if group.is_dragging() {
            continue;
        }
        for ty in ConnectionType::ALL {
            assert!(
                group.list(ty).is_sorted(ws.connections()),
                "group {id:?} list {ty:?} is not sorted"
            );
        }
    }
}

/// Assert every link in the workspace is symmetric.
pub fn assert_links_symmetric(ws: &Workspace) {
    for (id, conn) in ws.connections() {
        if let Some(target) = conn.target() {
            assert_eq!(ws.connection(target).and_then(|t| t.target()), Some(id));
        }
        if let Some(target) = conn.shadow_target() {
            assert_eq!(ws.connection(target).and_then(|t| t.shadow_target()), Some(id));
        }
    }
}
