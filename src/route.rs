//! The immutable output of a search.

use serde::{Deserialize, Serialize};

use crate::path::{EdgeKey, Path};
use crate::policy::TraversalPolicy;
use crate::room::Room;

/// An annotated route. A result with no rooms means "no path found" and
/// carries an infinite cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    rooms: Vec<Room>,
    instructions: Vec<String>,
    landmark_instructions: Vec<String>,
    segments: Vec<Path>,
    total_cost: f64,
    accessible: bool,
    policy: TraversalPolicy,
}

impl RouteResult {
    pub(crate) fn new(
        rooms: Vec<Room>,
        instructions: Vec<String>,
        landmark_instructions: Vec<String>,
        segments: Vec<Path>,
        total_cost: f64,
        accessible: bool,
        policy: TraversalPolicy,
    ) -> Self {
        Self {
            rooms,
            instructions,
            landmark_instructions,
            segments,
            total_cost,
            accessible,
            policy,
        }
    }

    pub fn not_found(policy: TraversalPolicy) -> Self {
        Self {
            rooms: Vec::new(),
            instructions: Vec::new(),
            landmark_instructions: Vec::new(),
            segments: Vec::new(),
            total_cost: f64::INFINITY,
            accessible: false,
            policy,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room_ids(&self) -> Vec<&str> {
        self.rooms.iter().map(Room::id).collect()
    }

    /// One instruction per step, in the form the preferences asked for.
    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    pub fn landmark_instructions(&self) -> &[String] {
        &self.landmark_instructions
    }

    /// Edges actually traversed, as they were when the search read them.
    pub fn segments(&self) -> &[Path] {
        &self.segments
    }

    pub fn segment_keys(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.segments.iter().map(Path::key)
    }

    /// Policy-weighted cost, the quantity the search minimizes.
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Walking distance in meters: the sum of the traversed edges' raw
    /// distances. Infinite for an empty result.
    pub fn total_distance(&self) -> f64 {
        if self.is_empty() {
            return f64::INFINITY;
        }
        self.segments.iter().map(|p| p.distance).sum()
    }

    /// True only if every traversed edge is admissible under [`Self::policy`].
    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    pub fn policy(&self) -> TraversalPolicy {
        self.policy
    }

    pub fn start(&self) -> Option<&Room> {
        self.rooms.first()
    }

    pub fn destination(&self) -> Option<&Room> {
        self.rooms.last()
    }

    /// Distinct floors visited, in the order they are first reached.
    pub fn floors(&self) -> Vec<i32> {
        let mut floors = Vec::new();
        for room in &self.rooms {
            if !floors.contains(&room.floor) {
                floors.push(room.floor);
            }
        }
        floors
    }

    pub fn summary(&self) -> String {
        match (self.start(), self.destination()) {
            (Some(start), Some(end)) => format!(
                "Route: {} → {} ({:.1} meters, {} mode)",
                start.name,
                end.name,
                self.total_cost,
                self.policy.display_name()
            ),
            _ => "No path found".to_string(),
        }
    }

    /// Same room sequence as `other`.
    pub fn same_route(&self, other: &RouteResult) -> bool {
        self.rooms.len() == other.rooms.len()
            && self.rooms.iter().zip(&other.rooms).all(|(a, b)| a.id() == b.id())
    }
}
