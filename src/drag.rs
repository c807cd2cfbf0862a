//! Drag lifecycle driven by an external gesture controller.
//!
//! A [`DragSession`] isolates the dragged block's tree in its own connection
//! group so the tree never snaps to itself and is not treated as an obstacle
//! while it moves. Sorting inside that group is deferred until the drop.
//!
//! # Example
//!
//! ```ignore
//! // pointer down
//! let mut drag = DragSession::start(&mut ws, block)?;
//!
//! // pointer move
//! if let Some(candidate) = drag.drag_to(&mut ws, pointer_position)? {
//!     highlight(candidate.target);
//! }
//!
//! // pointer up
//! match drag.finish(&mut ws)? {
//!     DropOutcome::Connected { .. } => {}
//!     DropOutcome::Dropped => {}
//! }
//! ```

use crate::block::{BlockId, InputKind};
use crate::connection::{ConnectionId, ConnectionType};
use crate::error::WorkspaceError;
use crate::manager::{ConnectionMatch, GroupId};
use crate::units::WorkspacePoint;
use crate::workspace::Workspace;

/// What happened when a drag ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropOutcome {
    /// No candidate within the snap radius; the tree stays where it was left.
    Dropped,
    /// The dragged tree was connected.
    Connected {
        moving: ConnectionId,
        target: ConnectionId,
        /// Block that previously occupied the target, if any.
        displaced: Option<BlockId>,
        /// Whether the displaced block found a new slot on the dragged tree.
        reattached: bool,
    },
}

/// An in-progress drag of one block and everything below it.
///
/// End every session with [`finish`](Self::finish) or
/// [`cancel`](Self::cancel). Until then the dragged group stays in drag mode
/// and its connections are invisible to bumping.
#[derive(Debug)]
#[must_use = "a drag must end with `finish` or `cancel`"]
pub struct DragSession {
    block: BlockId,
    group: GroupId,
    start_position: WorkspacePoint,
    candidate: Option<ConnectionMatch>,
}

impl DragSession {
    /// Detach `block` from its parent and isolate its tree.
    ///
    /// A shadow link on the parent side is left in place. Shadow blocks and
    /// immovable blocks cannot be dragged.
    pub fn start(ws: &mut Workspace, block: BlockId) -> Result<Self, WorkspaceError> {
        let b = ws.block(block).ok_or(WorkspaceError::UnknownBlock(block))?;
        if !b.is_movable() || b.is_shadow() {
            return Err(WorkspaceError::NotMovable(block));
        }
        let start_position = b.position();
        if let Some(plug) = b.inferior_connection() {
            ws.disconnect(plug)?;
        }
        ws.bring_to_front(block);
        let group = ws.start_group_for_block(block);
        ws.set_drag_mode(group, true)?;
        tracing::debug!(?block, ?group, "drag started");
        Ok(Self {
            block,
            group,
            start_position,
            candidate: None,
        })
    }

    pub fn block(&self) -> BlockId {
        self.block
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Top-left corner of the block when the drag began.
    pub fn start_position(&self) -> WorkspacePoint {
        self.start_position
    }

    /// Best candidate found by the last [`drag_to`](Self::drag_to).
    pub fn candidate(&self) -> Option<ConnectionMatch> {
        self.candidate
    }

    /// Move the dragged block's top-left corner to `position` and return the
    /// best snap candidate there.
    pub fn drag_to(
        &mut self,
        ws: &mut Workspace,
        position: WorkspacePoint,
    ) -> Result<Option<ConnectionMatch>, WorkspaceError> {
        ws.move_block_to(self.block, position)?;
        self.candidate = ws.manager().find_best_connection_for_group(
            ws.graph(),
            self.group,
            ws.config().snap_distance,
        );
        Ok(self.candidate)
    }

    /// Drop the tree: connect to the best candidate, merge the group back and
    /// bump neighbours.
    pub fn finish(self, ws: &mut Workspace) -> Result<DropOutcome, WorkspaceError> {
        ws.set_drag_mode(self.group, false)?;
        let best = ws.manager().find_best_connection_for_group(
            ws.graph(),
            self.group,
            ws.config().snap_distance,
        );
        ws.merge_group(self.group, None)?;

        let outcome = match best {
            Some(found) => connect_splicing(ws, found.moving, found.target)?,
            None => DropOutcome::Dropped,
        };
        ws.bump_neighbours(self.block);
        tracing::debug!(block = ?self.block, ?outcome, "drag finished");
        Ok(outcome)
    }

    /// End the drag without connecting anything.
    pub fn cancel(self, ws: &mut Workspace) -> Result<(), WorkspaceError> {
        ws.set_drag_mode(self.group, false)?;
        ws.merge_group(self.group, None)?;
        tracing::debug!(block = ?self.block, "drag cancelled");
        Ok(())
    }
}

/// Snap `moving` onto `target`, displacing whatever occupies the socket.
fn connect_splicing(
    ws: &mut Workspace,
    moving: ConnectionId,
    target: ConnectionId,
) -> Result<DropOutcome, WorkspaceError> {
    let (moving_pos, target_pos, moving_block, moving_superior) = {
        let m = ws
            .connection(moving)
            .ok_or(WorkspaceError::UnknownConnection(moving))?;
        let t = ws
            .connection(target)
            .ok_or(WorkspaceError::UnknownConnection(target))?;
        (
            m.position(),
            t.position(),
            m.source_block(),
            m.connection_type().is_superior(),
        )
    };
    let (superior, inferior) = if moving_superior {
        (moving, target)
    } else {
        (target, moving)
    };
    check_splice(ws, superior, inferior)?;

    // The dragged tree moves onto the target, never the other way round.
    ws.move_block_tree(moving_block, target_pos - moving_pos)?;

    let displaced = match ws.disconnect(superior)? {
        Some(old) => ws.connection(old).map(|c| c.source_block()),
        None => None,
    };
    ws.connect(superior, inferior)?;

    let mut reattached = false;
    if let Some(orphan) = displaced {
        reattached = reattach(ws, orphan, moving_block)?;
        if !reattached {
            ws.bump_neighbours(orphan);
        }
    }
    Ok(DropOutcome::Connected {
        moving,
        target,
        displaced,
        reattached,
    })
}

/// Refuse a splice the structural rules reject before anything is moved or
/// disconnected.
fn check_splice(
    ws: &Workspace,
    superior: ConnectionId,
    inferior: ConnectionId,
) -> Result<(), WorkspaceError> {
    let (Some(s), Some(i)) = (ws.connection(superior), ws.connection(inferior)) else {
        return Err(WorkspaceError::UnknownConnection(superior));
    };
    s.can_splice_with_reason_to(Some(i)).into_result()?;
    let child = i.source_block();
    if ws.graph().is_ancestor_or_self(child, s.source_block()) {
        return Err(WorkspaceError::WouldCreateCycle(child));
    }
    Ok(())
}

/// Plug a displaced block back into the dragged tree: a statement below the
/// dragged stack, a value into the first free compatible input.
fn reattach(ws: &mut Workspace, orphan: BlockId, dragged: BlockId) -> Result<bool, WorkspaceError> {
    let Some(plug) = ws.block(orphan).and_then(|b| b.inferior_connection()) else {
        return Ok(false);
    };
    let Some(plug_type) = ws.connection(plug).map(|c| c.connection_type()) else {
        return Ok(false);
    };

    let socket = match plug_type {
        ConnectionType::PreviousStatement => ws.graph().last_next_connection_in_stack(dragged),
        ConnectionType::OutputValue => ws.block(dragged).and_then(|b| {
            b.inputs()
                .iter()
                .filter(|input| input.kind() == InputKind::Value)
                .map(|input| input.connection())
                .find(|id| fits(ws, *id, plug))
        }),
        _ => None,
    };
    match socket {
        Some(socket) if fits(ws, socket, plug) => {
            ws.connect(socket, plug)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn fits(ws: &Workspace, socket: ConnectionId, plug: ConnectionId) -> bool {
    ws.connection(socket)
        .map_or(false, |s| s.can_connect_with_reason_to(ws.connection(plug)).can_connect())
}
