//! The mutable building graph.
//!
//! Rooms live in an arena keyed by their stable id; edges refer to rooms by
//! id. Every corridor is stored as two directed [`Path`]s, and every mutation
//! keeps the adjacency lists, the per-floor index and the set of temporarily
//! blocked edges consistent with each other.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::NavError;
use crate::path::{EdgeKey, Path, TemporaryBlock};
use crate::room::{Room, RoomType};

#[derive(Debug, Clone)]
pub struct NavigationGraph {
    name: String,
    description: String,
    rooms: BTreeMap<String, Room>,
    adjacency: BTreeMap<String, Vec<Path>>,
    floors: BTreeMap<i32, BTreeSet<String>>,
    /// Both directed keys of every temporarily blocked corridor.
    temporarily_blocked: BTreeSet<EdgeKey>,
}

/// Aggregate counts over the graph. Corridor counts are per logical
/// corridor, not per directed edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingStats {
    pub total_rooms: usize,
    pub total_paths: usize,
    pub floors: usize,
    pub accessible_rooms: usize,
    pub blocked_rooms: usize,
    pub temporarily_blocked_paths: usize,
    pub permanently_blocked_paths: usize,
    pub rooms_by_type: BTreeMap<RoomType, usize>,
    pub rooms_by_floor: BTreeMap<i32, usize>,
}

impl Default for NavigationGraph {
    fn default() -> Self {
        Self::new("Default Building", "Indoor navigation graph")
    }
}

impl NavigationGraph {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            rooms: BTreeMap::new(),
            adjacency: BTreeMap::new(),
            floors: BTreeMap::new(),
            temporarily_blocked: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    // ========================================================================
    // Rooms
    // ========================================================================

    pub fn add_room(&mut self, room: Room) -> Result<(), NavError> {
        if self.rooms.contains_key(room.id()) {
            return Err(NavError::DuplicateRoom(room.id().to_string()));
        }
        let id = room.id().to_string();
        debug!(room = %id, floor = room.floor, "adding room");
        self.floors.entry(room.floor).or_default().insert(id.clone());
        self.adjacency.entry(id.clone()).or_default();
        self.rooms.insert(id, room);
        Ok(())
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub(crate) fn require_room(&self, id: &str) -> Result<&Room, NavError> {
        self.rooms.get(id).ok_or_else(|| NavError::RoomNotFound(id.to_string()))
    }

    pub fn contains_room(&self, id: &str) -> bool {
        self.rooms.contains_key(id)
    }

    /// All rooms, ordered by id.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Mutates a room in place. The floor index follows any floor change.
    pub fn update_room<F>(&mut self, id: &str, update: F) -> Result<(), NavError>
    where
        F: FnOnce(&mut Room),
    {
        let room = self
            .rooms
            .get_mut(id)
            .ok_or_else(|| NavError::RoomNotFound(id.to_string()))?;
        let old_floor = room.floor;
        update(room);
        let new_floor = room.floor;
        if old_floor != new_floor {
            self.unindex_floor(old_floor, id);
            self.floors.entry(new_floor).or_default().insert(id.to_string());
        }
        Ok(())
    }

    /// Removes a room and every edge touching it, in both directions.
    pub fn remove_room(&mut self, id: &str) -> Result<Room, NavError> {
        let room = self
            .rooms
            .remove(id)
            .ok_or_else(|| NavError::RoomNotFound(id.to_string()))?;
        self.unindex_floor(room.floor, id);
        self.adjacency.remove(id);
        for paths in self.adjacency.values_mut() {
            paths.retain(|p| p.to_id() != id);
        }
        self.temporarily_blocked.retain(|k| k.from != id && k.to != id);
        info!(room = %id, "removed room");
        Ok(room)
    }

    fn unindex_floor(&mut self, floor: i32, id: &str) {
        if let Some(ids) = self.floors.get_mut(&floor) {
            ids.remove(id);
            if ids.is_empty() {
                self.floors.remove(&floor);
            }
        }
    }

    pub fn block_room(&mut self, id: &str, blocked: bool) -> Result<(), NavError> {
        let room = self
            .rooms
            .get_mut(id)
            .ok_or_else(|| NavError::RoomNotFound(id.to_string()))?;
        room.blocked = blocked;
        info!(room = %id, blocked, "room block changed");
        Ok(())
    }

    // ========================================================================
    // Paths
    // ========================================================================

    /// Adds a corridor. The reverse edge is synthesized with mirrored
    /// instruction text. Re-adding an existing corridor replaces it.
    pub fn add_path(&mut self, path: Path) -> Result<(), NavError> {
        self.require_room(path.from_id())?;
        self.require_room(path.to_id())?;
        if path.from_id() == path.to_id() {
            return Err(NavError::InvalidPath(format!("self-loop on {}", path.from_id())));
        }
        if !path.distance.is_finite() || path.distance < 0.0 {
            return Err(NavError::InvalidPath(format!(
                "{}: distance must be finite and non-negative, got {}",
                path.key(),
                path.distance
            )));
        }

        let key = path.key();
        if self.path(&key.from, &key.to).is_some() {
            warn!(path = %key, "replacing existing corridor");
            self.detach(&key);
        }

        debug!(path = %key, distance = path.distance, kind = %path.path_type, "adding corridor");
        let mut reverse = path.mirrored();
        if path.temporary_block.is_some() {
            reverse.temporary_block = path.temporary_block.clone();
            self.temporarily_blocked.insert(key.clone());
            self.temporarily_blocked.insert(key.reversed());
        }
        self.adjacency.entry(key.from.clone()).or_default().push(path);
        self.adjacency.entry(key.to.clone()).or_default().push(reverse);
        Ok(())
    }

    /// Removes a corridor in both directions.
    pub fn remove_path(&mut self, from: &str, to: &str) -> Result<(), NavError> {
        let key = EdgeKey::new(from, to);
        if self.path(from, to).is_none() && self.path(to, from).is_none() {
            return Err(NavError::PathNotFound {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.detach(&key);
        info!(path = %key, "removed corridor");
        Ok(())
    }

    fn detach(&mut self, key: &EdgeKey) {
        if let Some(paths) = self.adjacency.get_mut(&key.from) {
            paths.retain(|p| p.to_id() != key.to);
        }
        if let Some(paths) = self.adjacency.get_mut(&key.to) {
            paths.retain(|p| p.to_id() != key.from);
        }
        self.temporarily_blocked.remove(key);
        self.temporarily_blocked.remove(&key.reversed());
    }

    pub fn path(&self, from: &str, to: &str) -> Option<&Path> {
        self.adjacency.get(from)?.iter().find(|p| p.to_id() == to)
    }

    fn path_mut(&mut self, key: &EdgeKey) -> Option<&mut Path> {
        self.adjacency.get_mut(&key.from)?.iter_mut().find(|p| p.to_id() == key.to)
    }

    /// Outgoing edges of a room, in insertion order. Unknown rooms have none.
    pub fn edges_from(&self, id: &str) -> &[Path] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All directed edges.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.adjacency.values().flatten()
    }

    /// Number of logical corridors.
    pub fn path_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum::<usize>() / 2
    }

    /// Applies `change` to both directions of a corridor.
    fn update_corridor<F>(
        &mut self,
        from: &str,
        to: &str,
        mut change: F,
    ) -> Result<EdgeKey, NavError>
    where
        F: FnMut(&mut Path),
    {
        let key = EdgeKey::new(from, to);
        let forward = self.path_mut(&key).ok_or_else(|| NavError::PathNotFound {
            from: from.to_string(),
            to: to.to_string(),
        })?;
        change(forward);
        if let Some(reverse) = self.path_mut(&key.reversed()) {
            change(reverse);
        }
        Ok(key)
    }

    /// Sets or clears the permanent block of a corridor, both directions.
    pub fn set_path_blocked(
        &mut self,
        from: &str,
        to: &str,
        blocked: bool,
    ) -> Result<(), NavError> {
        let key = self.update_corridor(from, to, |p| p.blocked = blocked)?;
        info!(path = %key, blocked, "permanent path block changed");
        Ok(())
    }

    // ========================================================================
    // Temporary Blocks
    // ========================================================================

    /// Temporarily blocks a corridor in both directions. With a duration, the
    /// block carries a deadline and is lifted by the next
    /// [`expire_temporary_blocks`](Self::expire_temporary_blocks) sweep past it.
    pub fn block_path_temporarily(
        &mut self,
        from: &str,
        to: &str,
        reason: impl Into<String>,
        duration: Option<Duration>,
    ) -> Result<(), NavError> {
        let block = TemporaryBlock::new(reason, duration);
        let reason = block.reason.clone();
        let key = self.update_corridor(from, to, |p| p.temporary_block = Some(block.clone()))?;
        self.temporarily_blocked.insert(key.reversed());
        self.temporarily_blocked.insert(key.clone());
        info!(path = %key, reason = %reason, ?duration, "path temporarily blocked");
        Ok(())
    }

    /// Blocks a corridor for `duration`, after which it clears on its own.
    pub fn simulate_obstacle(
        &mut self,
        from: &str,
        to: &str,
        reason: impl Into<String>,
        duration: Duration,
    ) -> Result<(), NavError> {
        self.block_path_temporarily(from, to, reason, Some(duration))
    }

    /// Lifts a temporary block, cancelling any pending expiry. Returns whether
    /// the corridor was blocked.
    pub fn unblock_path_temporarily(&mut self, from: &str, to: &str) -> Result<bool, NavError> {
        let mut was_blocked = false;
        let key = self.update_corridor(from, to, |p| {
            was_blocked |= p.temporary_block.take().is_some();
        })?;
        self.temporarily_blocked.remove(&key);
        self.temporarily_blocked.remove(&key.reversed());
        if was_blocked {
            info!(path = %key, "temporary block cleared");
        }
        Ok(was_blocked)
    }

    /// Clears every temporary block. Permanent blocks are untouched.
    /// Returns the number of corridors cleared.
    pub fn clear_all_temporary_blocks(&mut self) -> usize {
        let keys = std::mem::take(&mut self.temporarily_blocked);
        for key in &keys {
            if let Some(path) = self.path_mut(key) {
                path.temporary_block = None;
            }
        }
        let cleared = keys.len() / 2;
        if cleared > 0 {
            info!(cleared, "cleared all temporary blocks");
        }
        cleared
    }

    /// Lifts every temporary block whose deadline is at or before `now` and
    /// returns the cleared corridors, one key per corridor.
    pub fn expire_temporary_blocks(&mut self, now: SystemTime) -> Vec<EdgeKey> {
        let expired: Vec<EdgeKey> = self
            .temporarily_blocked
            .iter()
            .filter(|key| {
                self.path(&key.from, &key.to)
                    .and_then(|p| p.temporary_block.as_ref())
                    .is_some_and(|block| block.is_expired(now))
            })
            .cloned()
            .collect();

        let mut cleared: Vec<EdgeKey> = Vec::new();
        for key in expired {
            if cleared.iter().any(|k| *k == key.reversed()) {
                continue;
            }
            if let Some(path) = self.path_mut(&key) {
                if let Some(block) = path.temporary_block.take() {
                    info!(path = %key, reason = %block.reason, "obstacle cleared");
                }
            }
            if let Some(path) = self.path_mut(&key.reversed()) {
                path.temporary_block = None;
            }
            self.temporarily_blocked.remove(&key);
            self.temporarily_blocked.remove(&key.reversed());
            cleared.push(key);
        }
        cleared
    }

    /// Directed edges currently under a temporary block.
    pub fn temporarily_blocked_paths(&self) -> Vec<&Path> {
        self.temporarily_blocked
            .iter()
            .filter_map(|key| self.path(&key.from, &key.to))
            .collect()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn rooms_by_type(&self, room_type: RoomType) -> Vec<&Room> {
        self.rooms.values().filter(|r| r.room_type() == room_type).collect()
    }

    pub fn rooms_on_floor(&self, floor: i32) -> Vec<&Room> {
        self.floors
            .get(&floor)
            .map(|ids| ids.iter().filter_map(|id| self.rooms.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn floors(&self) -> Vec<i32> {
        self.floors.keys().copied().collect()
    }

    /// Accessible, unblocked rooms.
    pub fn accessible_rooms(&self) -> Vec<&Room> {
        self.rooms.values().filter(|r| r.accessible && !r.blocked).collect()
    }

    /// First room whose name contains `name`, ignoring case.
    pub fn find_room_by_name(&self, name: &str) -> Option<&Room> {
        let name = name.to_lowercase();
        self.rooms.values().find(|r| r.name.to_lowercase().contains(&name))
    }

    /// Free-text search across name, description, category and landmarks.
    pub fn search_rooms(&self, query: &str) -> Vec<&Room> {
        self.rooms.values().filter(|r| r.matches(query)).collect()
    }

    pub fn stats(&self) -> BuildingStats {
        let mut stats = BuildingStats {
            total_rooms: self.rooms.len(),
            total_paths: self.path_count(),
            floors: self.floors.len(),
            accessible_rooms: self.accessible_rooms().len(),
            blocked_rooms: self.rooms.values().filter(|r| r.blocked).count(),
            temporarily_blocked_paths: self.temporarily_blocked.len() / 2,
            permanently_blocked_paths: self.paths().filter(|p| p.blocked).count() / 2,
            ..BuildingStats::default()
        };
        for room in self.rooms.values() {
            *stats.rooms_by_type.entry(room.room_type()).or_default() += 1;
        }
        for (floor, ids) in &self.floors {
            stats.rooms_by_floor.insert(*floor, ids.len());
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::STAIRS;

    fn room(id: &str, floor: i32) -> Room {
        Room::new(id, format!("Room {id}"), "", RoomType::Office, floor)
    }

    fn abc() -> NavigationGraph {
        let mut graph = NavigationGraph::default();
        let (a, b, c) = (room("A", 1), room("B", 1), room("C", 2));
        let ab = Path::new(&a, &b, 5.0, "Turn left");
        let bc = Path::with_type(&b, &c, 3.0, "Climb up to floor 2", STAIRS);
        for r in [a, b, c] {
            graph.add_room(r).unwrap();
        }
        graph.add_path(ab).unwrap();
        graph.add_path(bc).unwrap();
        graph
    }

    #[test]
    fn test_duplicate_room_rejected() {
        let mut graph = abc();
        assert!(matches!(graph.add_room(room("A", 1)), Err(NavError::DuplicateRoom(_))));
    }

    #[test]
    fn test_add_path_synthesizes_reverse() {
        let graph = abc();
        let back = graph.path("B", "A").unwrap();
        assert_eq!(back.distance, 5.0);
        assert_eq!(back.instruction, "Turn right");
        let down = graph.path("C", "B").unwrap();
        assert_eq!(down.instruction, "Climb down to floor 2");
        assert_eq!(graph.path_count(), 2);
    }

    #[test]
    fn test_add_path_validation() {
        let mut graph = abc();
        let a = graph.room("A").unwrap().clone();
        let ghost = room("Z", 1);
        assert!(matches!(
            graph.add_path(Path::new(&a, &ghost, 1.0, "")),
            Err(NavError::RoomNotFound(_))
        ));
        assert!(matches!(
            graph.add_path(Path::new(&a, &a, 1.0, "")),
            Err(NavError::InvalidPath(_))
        ));
        let b = graph.room("B").unwrap().clone();
        assert!(matches!(
            graph.add_path(Path::new(&a, &b, -1.0, "")),
            Err(NavError::InvalidPath(_))
        ));
        assert!(matches!(
            graph.add_path(Path::new(&a, &b, f64::NAN, "")),
            Err(NavError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_readding_corridor_replaces_it() {
        let mut graph = abc();
        let a = graph.room("A").unwrap().clone();
        let b = graph.room("B").unwrap().clone();
        graph.add_path(Path::new(&b, &a, 9.0, "")).unwrap();
        assert_eq!(graph.edges_from("A").len(), 1);
        assert_eq!(graph.edges_from("B").len(), 2);
        assert_eq!(graph.path("A", "B").unwrap().distance, 9.0);
    }

    #[test]
    fn test_remove_room_purges_edges() {
        let mut graph = abc();
        graph.block_path_temporarily("B", "C", "wet floor", None).unwrap();
        graph.remove_room("C").unwrap();
        assert!(graph.path("B", "C").is_none());
        assert!(graph.edges_from("C").is_empty());
        assert_eq!(graph.floors(), vec![1]);
        assert!(graph.temporarily_blocked_paths().is_empty());
        assert!(matches!(graph.remove_room("C"), Err(NavError::RoomNotFound(_))));
    }

    #[test]
    fn test_remove_path_both_directions() {
        let mut graph = abc();
        graph.remove_path("B", "A").unwrap();
        assert!(graph.path("A", "B").is_none());
        assert!(graph.path("B", "A").is_none());
        assert!(matches!(graph.remove_path("A", "B"), Err(NavError::PathNotFound { .. })));
    }

    #[test]
    fn test_temporary_block_is_symmetric() {
        let mut graph = abc();
        graph.block_path_temporarily("A", "B", "Cleaning", None).unwrap();
        assert!(graph.path("A", "B").unwrap().is_temporarily_blocked());
        assert!(graph.path("B", "A").unwrap().is_temporarily_blocked());
        assert_eq!(graph.stats().temporarily_blocked_paths, 1);

        assert!(graph.unblock_path_temporarily("B", "A").unwrap());
        assert!(!graph.path("A", "B").unwrap().is_currently_blocked());
        assert!(!graph.unblock_path_temporarily("A", "B").unwrap());
    }

    #[test]
    fn test_clear_temporary_keeps_permanent() {
        let mut graph = abc();
        graph.set_path_blocked("A", "B", true).unwrap();
        graph.block_path_temporarily("A", "B", "Delivery", None).unwrap();
        graph.block_path_temporarily("B", "C", "Delivery", None).unwrap();
        assert_eq!(graph.clear_all_temporary_blocks(), 2);
        assert!(graph.temporarily_blocked_paths().is_empty());
        assert!(graph.path("B", "A").unwrap().blocked);
        assert!(graph.path("A", "B").unwrap().is_currently_blocked());
        assert!(!graph.path("B", "C").unwrap().is_currently_blocked());
    }

    #[test]
    fn test_expire_only_past_deadlines() {
        let mut graph = abc();
        graph.simulate_obstacle("A", "B", "Maintenance", Duration::from_secs(30)).unwrap();
        graph.block_path_temporarily("B", "C", "Closed", None).unwrap();

        assert!(graph.expire_temporary_blocks(SystemTime::now()).is_empty());
        let later = SystemTime::now() + Duration::from_secs(31);
        let cleared = graph.expire_temporary_blocks(later);
        assert_eq!(cleared.len(), 1);
        assert!(!graph.path("B", "A").unwrap().is_currently_blocked());
        assert!(graph.path("C", "B").unwrap().is_temporarily_blocked());
    }

    #[test]
    fn test_manual_unblock_cancels_expiry() {
        let mut graph = abc();
        graph.simulate_obstacle("A", "B", "Crowd", Duration::from_secs(5)).unwrap();
        graph.unblock_path_temporarily("A", "B").unwrap();
        graph.block_path_temporarily("A", "B", "Closed for good", None).unwrap();
        let later = SystemTime::now() + Duration::from_secs(60);
        assert!(graph.expire_temporary_blocks(later).is_empty());
        assert!(graph.path("A", "B").unwrap().is_temporarily_blocked());
    }

    #[test]
    fn test_update_room_reindexes_floor() {
        let mut graph = abc();
        graph.update_room("A", |r| r.floor = 4).unwrap();
        assert_eq!(graph.floors(), vec![1, 2, 4]);
        assert_eq!(graph.rooms_on_floor(4)[0].id(), "A");
        assert_eq!(graph.rooms_on_floor(1).len(), 1);
    }

    #[test]
    fn test_missing_targets_report_not_found() {
        let mut graph = abc();
        assert!(matches!(graph.block_room("Q", true), Err(NavError::RoomNotFound(_))));
        assert!(matches!(
            graph.block_path_temporarily("A", "C", "x", None),
            Err(NavError::PathNotFound { .. })
        ));
        assert!(matches!(
            graph.set_path_blocked("A", "Q", true),
            Err(NavError::PathNotFound { .. })
        ));
    }

    #[test]
    fn test_stats() {
        let mut graph = abc();
        graph.block_room("B", true).unwrap();
        graph.set_path_blocked("B", "C", true).unwrap();
        let stats = graph.stats();
        assert_eq!(stats.total_rooms, 3);
        assert_eq!(stats.total_paths, 2);
        assert_eq!(stats.floors, 2);
        assert_eq!(stats.blocked_rooms, 1);
        assert_eq!(stats.accessible_rooms, 2);
        assert_eq!(stats.permanently_blocked_paths, 1);
        assert_eq!(stats.rooms_by_type.get(&RoomType::Office), Some(&3));
        assert_eq!(stats.rooms_by_floor.get(&1), Some(&2));
    }

    #[test]
    fn test_search() {
        let graph = abc();
        assert_eq!(graph.search_rooms("room b").len(), 1);
        assert_eq!(graph.search_rooms("office").len(), 3);
        assert_eq!(graph.find_room_by_name("ROOM C").map(Room::id), Some("C"));
    }
}
