//! Y-sorted index of connections of a single type.
//!
//! Connections are kept in ascending y order so proximity queries can binary
//! search to the query's row and then scan outwards only while candidates are
//! still vertically within the search radius. X is unordered, so every
//! candidate inside the band still gets a true distance check.

use crate::connection::{ConnectionArena, ConnectionId};
use crate::graph::ConnectionGraph;
use crate::validator::ConnectionValidator;

/// Ordered list of connection handles, sorted by the y coordinate of the
/// connections they refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YSortedList {
    entries: Vec<ConnectionId>,
}

fn y_of(arena: &ConnectionArena, id: ConnectionId) -> f64 {
    arena.get(id).map_or(f64::INFINITY, |conn| conn.position().y)
}

impl YSortedList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ConnectionId> {
        self.entries.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.entries.iter().copied()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.entries.contains(&id)
    }

    /// Whether the entries are in non-decreasing y order.
    pub fn is_sorted(&self, arena: &ConnectionArena) -> bool {
        self.entries
            .windows(2)
            .all(|pair| y_of(arena, pair[0]) <= y_of(arena, pair[1]))
    }

    /// Insert `id` at its sorted position.
    pub fn add_connection(&mut self, arena: &ConnectionArena, id: ConnectionId) {
        let Some(conn) = arena.get(id) else {
            return;
        };
        let index = self.find_position_for(arena, conn.position().y);
        self.entries.insert(index, id);
    }

    /// Remove `id`; returns `false` when it was not in the list.
    pub fn remove_connection(&mut self, arena: &ConnectionArena, id: ConnectionId) -> bool {
        match self.find_connection(arena, id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// First index whose connection has a y greater than or equal to `y`.
    pub fn find_position_for(&self, arena: &ConnectionArena, y: f64) -> usize {
        self.entries.partition_point(|&id| y_of(arena, id) < y)
    }

    /// Index of `id` in the list.
    ///
    /// Binary search lands on the first entry at the connection's y; entries
    /// sharing that y are then scanned for the exact handle. Falls back to a
    /// linear scan if the list is transiently unsorted.
    pub fn find_connection(&self, arena: &ConnectionArena, id: ConnectionId) -> Option<usize> {
        let y = arena.get(id)?.position().y;
        let start = self.find_position_for(arena, y);

        let mut index = start;
        while index < self.entries.len() && y_of(arena, self.entries[index]) == y {
            if self.entries[index] == id {
                return Some(index);
            }
            index += 1;
        }
        let mut index = start;
        while index > 0 && y_of(arena, self.entries[index - 1]) == y {
            index -= 1;
            if self.entries[index] == id {
                return Some(index);
            }
        }

        self.entries.iter().position(|&entry| entry == id)
    }

    fn is_in_y_range(&self, arena: &ConnectionArena, index: usize, base_y: f64, radius: f64) -> bool {
        (y_of(arena, self.entries[index]) - base_y).abs() <= radius
    }

    /// Closest connection to `query` within `max_radius` that `validator`
    /// accepts.
    ///
    /// The vertical band shrinks to the best distance found so far, so the
    /// outward scans stop as soon as no closer candidate is possible.
    pub fn search_for_closest_valid_connection(
        &self,
        graph: ConnectionGraph<'_>,
        query: ConnectionId,
        max_radius: f64,
        validator: &dyn ConnectionValidator,
    ) -> Option<ConnectionId> {
        if self.entries.is_empty() {
            return None;
        }
        let arena = graph.connections();
        let conn = arena.get(query)?;
        let base_y = conn.position().y;
        let closest_index = self.find_position_for(arena, base_y);

        let mut best = None;
        let mut best_radius = max_radius;

        let mut index = closest_index;
        while index > 0 && self.is_in_y_range(arena, index - 1, base_y, best_radius) {
            index -= 1;
            let candidate = self.entries[index];
            if let Some(distance) = self.accept(graph, query, candidate, best_radius, validator) {
                best = Some(candidate);
                best_radius = distance;
            }
        }

        let mut index = closest_index;
        while index < self.entries.len() && self.is_in_y_range(arena, index, base_y, best_radius) {
            let candidate = self.entries[index];
            if let Some(distance) = self.accept(graph, query, candidate, best_radius, validator) {
                best = Some(candidate);
                best_radius = distance;
            }
            index += 1;
        }

        best
    }

    fn accept(
        &self,
        graph: ConnectionGraph<'_>,
        query: ConnectionId,
        candidate: ConnectionId,
        radius: f64,
        validator: &dyn ConnectionValidator,
    ) -> Option<f64> {
        if candidate == query {
            return None;
        }
        let arena = graph.connections();
        let distance = arena.get(query)?.distance_from(arena.get(candidate)?);
        (distance <= radius && validator.can_connect(graph, query, candidate)).then_some(distance)
    }

    /// Every connection within `max_radius` of `query` that could conflict
    /// with it.
    ///
    /// A neighbour needs at least one side unconnected and a structural check
    /// that either passes or fails only on occupancy. This is looser than a
    /// validator so that bumping also clears blocks that merely sit on top of
    /// an occupied slot.
    pub fn neighbours_for(
        &self,
        arena: &ConnectionArena,
        query: ConnectionId,
        max_radius: f64,
    ) -> Vec<ConnectionId> {
        let mut neighbours = Vec::new();
        if self.entries.is_empty() {
            return neighbours;
        }
        let Some(conn) = arena.get(query) else {
            return neighbours;
        };
        let base_y = conn.position().y;
        let closest_index = self.find_position_for(arena, base_y);

        let is_neighbour = |candidate: ConnectionId| {
            if candidate == query {
                return false;
            }
            let Some(other) = arena.get(candidate) else {
                return false;
            };
            conn.distance_from(other) <= max_radius
                && (!conn.is_connected() || !other.is_connected())
                && conn
                    .can_connect_with_reason_to(Some(other))
                    .can_connect_or_must_disconnect()
        };

        let mut index = closest_index;
        while index > 0 && self.is_in_y_range(arena, index - 1, base_y, max_radius) {
            index -= 1;
            if is_neighbour(self.entries[index]) {
                neighbours.push(self.entries[index]);
            }
        }
        let mut index = closest_index;
        while index < self.entries.len() && self.is_in_y_range(arena, index, base_y, max_radius) {
            if is_neighbour(self.entries[index]) {
                neighbours.push(self.entries[index]);
            }
            index += 1;
        }
        neighbours
    }

    /// Move every entry into `other`, keeping `other` sorted, and empty self.
    ///
    /// Both lists must be sorted; the result is their merge.
    pub fn transfer_connections_to(&mut self, other: &mut YSortedList, arena: &ConnectionArena) {
        if self.entries.is_empty() {
            return;
        }
        let mine = std::mem::take(&mut self.entries);
        let theirs = std::mem::take(&mut other.entries);
        let mut merged = Vec::with_capacity(mine.len() + theirs.len());

        let (mut a, mut b) = (mine.into_iter().peekable(), theirs.into_iter().peekable());
        loop {
            let take_mine = match (a.peek(), b.peek()) {
                (Some(&x), Some(&y)) => y_of(arena, x) < y_of(arena, y),
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let next = if take_mine { a.next() } else { b.next() };
            merged.extend(next);
        }
        other.entries = merged;
    }

    /// Restore y order after positions changed without re-sorting.
    pub fn sort(&mut self, arena: &ConnectionArena) {
        self.entries
            .sort_by(|&a, &b| y_of(arena, a).total_cmp(&y_of(arena, b)));
    }
}
