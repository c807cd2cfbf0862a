//! Connection manager: owns every group and answers proximity queries.
//!
//! Every tracked connection belongs to exactly one [`ConnectionGroup`]. The
//! default group holds everything at rest; a drag gets its own group so the
//! dragged subtree is never matched against itself and is not treated as a
//! stationary obstacle while it moves.
//!
//! # Example
//!
//! ```ignore
//! let group = manager.start_group_for_block(graph, dragged_block);
//! manager.set_drag_mode(&connections, group, true)?;
//!
//! // ... move the dragged connections ...
//!
//! if let Some(found) = manager.find_best_connection_for_group(graph, group, 25.0) {
//!     // connect found.moving to found.target
//! }
//! manager.merge_group(&connections, group, None)?;
//! ```

use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};

use crate::block::BlockId;
use crate::connection::{ConnectionArena, ConnectionId};
use crate::error::ManagerError;
use crate::graph::ConnectionGraph;
use crate::group::{ConnectionGroup, SortState};
use crate::units::WorkspacePoint;
use crate::validator::{ConnectionValidator, DefaultConnectionValidator};

new_key_type! {
    /// Handle of a [`ConnectionGroup`] inside a [`ConnectionManager`].
    pub struct GroupId;
}

/// Best pairing found for a group by
/// [`ConnectionManager::find_best_connection_for_group`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionMatch {
    /// Connection on the group's owner block.
    pub moving: ConnectionId,
    /// Stationary connection it should snap to.
    pub target: ConnectionId,
    /// Group `target` was found in.
    pub target_group: GroupId,
    pub distance: f64,
}

/// Tracks connections in y-sorted groups and finds snap partners.
pub struct ConnectionManager {
    groups: SlotMap<GroupId, ConnectionGroup>,
    default_group: GroupId,
    connection_groups: HashMap<ConnectionId, GroupId>,
    validator: Box<dyn ConnectionValidator>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("groups", &self.groups.len())
            .field("tracked", &self.connection_groups.len())
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Create a manager using [`DefaultConnectionValidator`].
    pub fn new() -> Self {
        Self::with_validator(DefaultConnectionValidator)
    }

    pub fn with_validator<V: ConnectionValidator + 'static>(validator: V) -> Self {
        let mut groups = SlotMap::with_key();
        let default_group = groups.insert(ConnectionGroup::new(None));
        Self {
            groups,
            default_group,
            connection_groups: HashMap::new(),
            validator: Box::new(validator),
        }
    }

    pub fn validator(&self) -> &dyn ConnectionValidator {
        self.validator.as_ref()
    }

    /// The group that holds every connection not being dragged.
    pub fn main_group(&self) -> GroupId {
        self.default_group
    }

    pub fn group(&self, id: GroupId) -> Option<&ConnectionGroup> {
        self.groups.get(id)
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &ConnectionGroup)> {
        self.groups.iter()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn group_for_connection(&self, id: ConnectionId) -> Option<GroupId> {
        self.connection_groups.get(&id).copied()
    }

    pub fn is_tracked(&self, id: ConnectionId) -> bool {
        self.connection_groups.contains_key(&id)
    }

    /// Track `id` in `group` (the main group when `None`).
    ///
    /// A connection already tracked elsewhere is moved.
    pub fn track_connection(
        &mut self,
        arena: &ConnectionArena,
        id: ConnectionId,
        group: Option<GroupId>,
    ) -> Result<(), ManagerError> {
        let group = group.unwrap_or(self.default_group);
        if !self.groups.contains_key(group) {
            return Err(ManagerError::UnknownGroup(group));
        }
        self.untrack_connection(arena, id);
        self.groups[group].track_connection(arena, id);
        self.connection_groups.insert(id, group);
        Ok(())
    }

    /// Stop tracking `id`. Returns the group it was removed from.
    pub fn untrack_connection(&mut self, arena: &ConnectionArena, id: ConnectionId) -> Option<GroupId> {
        let group = self.connection_groups.remove(&id)?;
        if let Some(g) = self.groups.get_mut(group) {
            g.untrack_connection(arena, id);
        }
        Some(group)
    }

    /// Move a connection and keep its group's index in order.
    ///
    /// Untracked connections are simply moved.
    pub fn move_connection(&mut self, arena: &mut ConnectionArena, id: ConnectionId, position: WorkspacePoint) {
        let group = self
            .connection_groups
            .get(&id)
            .and_then(|gid| self.groups.get_mut(*gid));
        match group {
            Some(group) => {
                group.will_change_position(arena, id);
                if let Some(conn) = arena.get_mut(id) {
                    conn.set_position(position);
                }
                group.did_change_position(arena, id);
            }
            None => {
                if let Some(conn) = arena.get_mut(id) {
                    conn.set_position(position);
                }
            }
        }
    }

    /// Create a group owned by `block` and move the block's tree into it.
    pub fn start_group_for_block(&mut self, graph: ConnectionGraph<'_>, block: BlockId) -> GroupId {
        let arena = graph.connections();
        let new_group = self.groups.insert(ConnectionGroup::new(Some(block)));
        let mut moved = 0usize;
        for id in graph.all_connections_for_tree(block) {
            if self.untrack_connection(arena, id).is_some() {
                self.groups[new_group].track_connection(arena, id);
                self.connection_groups.insert(id, new_group);
                moved += 1;
            }
        }
        tracing::debug!(?block, ?new_group, moved, "started connection group");
        new_group
    }

    /// Toggle deferred sorting for `group`.
    pub fn set_drag_mode(
        &mut self,
        arena: &ConnectionArena,
        group: GroupId,
        dragging: bool,
    ) -> Result<(), ManagerError> {
        let g = self
            .groups
            .get_mut(group)
            .ok_or(ManagerError::UnknownGroup(group))?;
        let state = if dragging {
            SortState::Dragging
        } else {
            SortState::Sorted
        };
        g.set_sort_state(arena, state);
        Ok(())
    }

    /// Move every connection from `from` into `into` (the main group when
    /// `None`) and delete `from`.
    ///
    /// The emptied source group is removed here; callers never need a
    /// follow-up [`delete_group`](Self::delete_group), and `from` is no longer
    /// a valid handle afterwards. Merging a group into itself does nothing.
    pub fn merge_group(
        &mut self,
        arena: &ConnectionArena,
        from: GroupId,
        into: Option<GroupId>,
    ) -> Result<(), ManagerError> {
        let into = into.unwrap_or(self.default_group);
        if from == into {
            return Ok(());
        }
        if !self.groups.contains_key(into) {
            return Err(ManagerError::UnknownGroup(into));
        }
        if from == self.default_group {
            return Err(ManagerError::CannotDeleteDefaultGroup);
        }
        let mut source = self
            .groups
            .remove(from)
            .ok_or(ManagerError::UnknownGroup(from))?;
        let moved: Vec<ConnectionId> = source.connections().collect();
        source.transfer_connections_to(&mut self.groups[into], arena);
        for id in &moved {
            self.connection_groups.insert(*id, into);
        }
        tracing::debug!(?from, ?into, moved = moved.len(), "merged connection group");
        Ok(())
    }

    /// Delete an empty, non-default group.
    pub fn delete_group(&mut self, group: GroupId) -> Result<(), ManagerError> {
        if group == self.default_group {
            return Err(ManagerError::CannotDeleteDefaultGroup);
        }
        let g = self.groups.get(group).ok_or(ManagerError::UnknownGroup(group))?;
        if !g.is_empty() {
            return Err(ManagerError::GroupNotEmpty(group, g.len()));
        }
        self.groups.remove(group);
        tracing::debug!(?group, "deleted connection group");
        Ok(())
    }

    /// Closest valid partner for `id` across every group except `ignore_group`.
    pub fn closest_connection(
        &self,
        graph: ConnectionGraph<'_>,
        id: ConnectionId,
        max_radius: f64,
        ignore_group: Option<GroupId>,
    ) -> Option<(ConnectionId, GroupId)> {
        let conn = graph.connection(id)?;
        let mut best: Option<(ConnectionId, GroupId)> = None;
        let mut radius = max_radius;
        for (gid, group) in &self.groups {
            if Some(gid) == ignore_group {
                continue;
            }
            if let Some(found) = group.closest_connection(graph, id, radius, self.validator.as_ref()) {
                if let Some(target) = graph.connection(found) {
                    radius = conn.distance_from(target);
                    best = Some((found, gid));
                }
            }
        }
        best
    }

    /// Best snap for the owner block of `group` among all other groups.
    ///
    /// Only the owner block's direct connections are considered; the search
    /// radius shrinks as closer pairs are found.
    pub fn find_best_connection_for_group(
        &self,
        graph: ConnectionGraph<'_>,
        group: GroupId,
        max_radius: f64,
    ) -> Option<ConnectionMatch> {
        let owner = self.groups.get(group)?.owner_block()?;
        let mut best: Option<ConnectionMatch> = None;
        let mut radius = max_radius;
        for moving in graph.direct_connections(owner) {
            let Some((target, target_group)) =
                self.closest_connection(graph, moving, radius, Some(group))
            else {
                continue;
            };
            let (Some(a), Some(b)) = (graph.connection(moving), graph.connection(target)) else {
                continue;
            };
            radius = a.distance_from(b);
            best = Some(ConnectionMatch {
                moving,
                target,
                target_group,
                distance: radius,
            });
        }
        if let Some(found) = &best {
            tracing::trace!(?group, distance = found.distance, "best connection for group");
        }
        best
    }

    /// Neighbours of `id` in every group that is not being dragged.
    pub fn stationary_neighbours_for(
        &self,
        arena: &ConnectionArena,
        id: ConnectionId,
        max_radius: f64,
    ) -> Vec<ConnectionId> {
        self.groups
            .values()
            .filter(|group| !group.is_dragging())
            .flat_map(|group| group.neighbours_for(arena, id, max_radius))
            .collect()
    }
}
