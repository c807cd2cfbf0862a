//! A partition of tracked connections with one sorted list per type.

use crate::block::BlockId;
use crate::connection::{ConnectionArena, ConnectionId, ConnectionType};
use crate::graph::ConnectionGraph;
use crate::validator::ConnectionValidator;
use crate::y_sorted_list::YSortedList;

/// Whether a group keeps its lists sorted on every move.
///
/// While `Dragging`, position hooks are skipped and the lists may be out of
/// order. Leaving `Dragging` re-sorts every list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortState {
    #[default]
    Sorted,
    Dragging,
}

/// Connections that move together, indexed by type.
#[derive(Debug, Clone, Default)]
pub struct ConnectionGroup {
    owner_block: Option<BlockId>,
    lists: [YSortedList; 4],
    state: SortState,
}

impl ConnectionGroup {
    pub fn new(owner_block: Option<BlockId>) -> Self {
        Self {
            owner_block,
            ..Self::default()
        }
    }

    /// Block whose drag created this group; `None` for the default group.
    pub fn owner_block(&self) -> Option<BlockId> {
        self.owner_block
    }

    pub fn sort_state(&self) -> SortState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state == SortState::Dragging
    }

    /// Switch between eager and deferred sorting.
    pub fn set_sort_state(&mut self, arena: &ConnectionArena, state: SortState) {
        if self.state == SortState::Dragging && state == SortState::Sorted {
            for list in &mut self.lists {
                list.sort(arena);
            }
        }
        self.state = state;
    }

    pub fn list(&self, connection_type: ConnectionType) -> &YSortedList {
        &self.lists[connection_type.index()]
    }

    pub fn len(&self) -> usize {
        self.lists.iter().map(YSortedList::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(YSortedList::is_empty)
    }

    pub fn contains(&self, arena: &ConnectionArena, id: ConnectionId) -> bool {
        arena
            .get(id)
            .map_or(false, |conn| self.list(conn.connection_type()).contains(id))
    }

    /// All connections in this group, grouped by type.
    pub fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.lists.iter().flat_map(YSortedList::iter)
    }

    pub fn track_connection(&mut self, arena: &ConnectionArena, id: ConnectionId) {
        if let Some(conn) = arena.get(id) {
            self.lists[conn.connection_type().index()].add_connection(arena, id);
        }
    }

    pub fn untrack_connection(&mut self, arena: &ConnectionArena, id: ConnectionId) -> bool {
        match arena.get(id) {
            Some(conn) => self.lists[conn.connection_type().index()].remove_connection(arena, id),
            None => false,
        }
    }

    /// Closest valid partner for `id` in this group.
    ///
    /// Already connected connections never look for a new partner here.
    pub fn closest_connection(
        &self,
        graph: ConnectionGraph<'_>,
        id: ConnectionId,
        max_radius: f64,
        validator: &dyn ConnectionValidator,
    ) -> Option<ConnectionId> {
        let conn = graph.connection(id)?;
        if conn.is_connected() {
            return None;
        }
        self.list(conn.connection_type().opposite())
            .search_for_closest_valid_connection(graph, id, max_radius, validator)
    }

    pub fn neighbours_for(
        &self,
        arena: &ConnectionArena,
        id: ConnectionId,
        max_radius: f64,
    ) -> Vec<ConnectionId> {
        match arena.get(id) {
            Some(conn) => self
                .list(conn.connection_type().opposite())
                .neighbours_for(arena, id, max_radius),
            None => Vec::new(),
        }
    }

    /// Move every connection into `other`, leaving this group empty.
    pub fn transfer_connections_to(&mut self, other: &mut ConnectionGroup, arena: &ConnectionArena) {
        for (mine, theirs) in self.lists.iter_mut().zip(other.lists.iter_mut()) {
            // The merge needs both sides ordered.
            if self.state == SortState::Dragging {
                mine.sort(arena);
            }
            if other.state == SortState::Dragging {
                theirs.sort(arena);
            }
            mine.transfer_connections_to(theirs, arena);
        }
    }

    /// Hook run before `id` moves; pair with [`did_change_position`].
    ///
    /// [`did_change_position`]: Self::did_change_position
    pub fn will_change_position(&mut self, arena: &ConnectionArena, id: ConnectionId) {
        if self.state == SortState::Sorted {
            self.untrack_connection(arena, id);
        }
    }

    pub fn did_change_position(&mut self, arena: &ConnectionArena, id: ConnectionId) {
        if self.state == SortState::Sorted {
            self.track_connection(arena, id);
        }
    }
}
