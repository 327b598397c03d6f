//! Test fixtures for indoor-router.
//!
//! Provides:
//! - A builder for small hand-written buildings
//! - Proptest strategies for random buildings
//! - A brute-force reference search over simple paths
//! - Test logging, enabled with `RUST_LOG`

#![allow(dead_code)]

use std::collections::HashSet;

use indoor_router::path::{CORRIDOR, DEFAULT_PATH_WIDTH, ELEVATOR, RAMP, STAIRS};
use indoor_router::{NavigationGraph, Path, Room, RoomType, TraversalPolicy};
use proptest::prelude::*;

/// Routes crate logs to the test output. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Building Builder
// ============================================================================

/// Builder for test buildings with sensible defaults: rooms are offices on
/// floor 1, corridors are 2 m wide.
pub struct BuildingBuilder {
    graph: NavigationGraph,
}

impl BuildingBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            graph: NavigationGraph::new(name, "test building"),
        }
    }

    pub fn room(self, id: &str) -> Self {
        self.typed_room(id, RoomType::Office, 1)
    }

    pub fn typed_room(mut self, id: &str, room_type: RoomType, floor: i32) -> Self {
        let room = Room::new(id, format!("Room {id}"), "", room_type, floor);
        self.graph.add_room(room).expect("unique fixture room");
        self
    }

    pub fn exit(self, id: &str) -> Self {
        self.typed_room(id, RoomType::EmergencyExit, 1)
    }

    pub fn corridor(self, from: &str, to: &str, distance: f64) -> Self {
        self.path(from, to, distance, CORRIDOR)
    }

    pub fn stairs(self, from: &str, to: &str, distance: f64) -> Self {
        self.path(from, to, distance, STAIRS)
    }

    pub fn elevator(self, from: &str, to: &str, distance: f64) -> Self {
        self.path(from, to, distance, ELEVATOR)
    }

    pub fn ramp(self, from: &str, to: &str, distance: f64) -> Self {
        self.path(from, to, distance, RAMP)
    }

    pub fn path(self, from: &str, to: &str, distance: f64, path_type: &str) -> Self {
        self.sized_path(from, to, distance, path_type, DEFAULT_PATH_WIDTH)
    }

    pub fn wide_corridor(self, from: &str, to: &str, distance: f64, width: f64) -> Self {
        self.sized_path(from, to, distance, CORRIDOR, width)
    }

    fn sized_path(
        mut self,
        from: &str,
        to: &str,
        distance: f64,
        path_type: &str,
        width: f64,
    ) -> Self {
        let a = self.graph.room(from).expect("fixture room").clone();
        let b = self.graph.room(to).expect("fixture room").clone();
        let instruction = format!("Turn left towards {}", b.name);
        let path = Path::with_type(&a, &b, distance, instruction, path_type).with_width(width);
        self.graph.add_path(path).expect("valid fixture path");
        self
    }

    pub fn build(self) -> NavigationGraph {
        self.graph
    }
}

/// A 5 m corridor A-B followed by a 3 m staircase B-C.
pub fn stair_chain() -> NavigationGraph {
    BuildingBuilder::new("chain")
        .typed_room("A", RoomType::Corridor, 1)
        .typed_room("B", RoomType::Corridor, 1)
        .typed_room("C", RoomType::Corridor, 2)
        .corridor("A", "B", 5.0)
        .stairs("B", "C", 3.0)
        .build()
}

// ============================================================================
// Random Buildings
// ============================================================================

const RANDOM_TYPES: [RoomType; 6] = [
    RoomType::Office,
    RoomType::Lobby,
    RoomType::Cafeteria,
    RoomType::Corridor,
    RoomType::WaitingArea,
    RoomType::Stairs,
];

const RANDOM_PATH_TYPES: [&str; 4] = [CORRIDOR, STAIRS, ELEVATOR, RAMP];

/// One generated corridor between two room indices.
#[derive(Debug, Clone)]
pub struct CorridorPlan {
    pub a: usize,
    pub b: usize,
    pub distance: f64,
    pub path_type: &'static str,
    pub accessible: bool,
    pub blocked: bool,
}

fn arb_corridor(rooms: usize) -> impl Strategy<Value = CorridorPlan> {
    (
        0..rooms,
        0..rooms,
        0u32..40,
        prop::sample::select(RANDOM_PATH_TYPES.to_vec()),
        prop::bool::weighted(0.85),
        prop::bool::weighted(0.1),
    )
        .prop_map(|(a, b, half_meters, path_type, accessible, blocked)| CorridorPlan {
            a,
            b,
            distance: 1.0 + f64::from(half_meters) / 2.0,
            path_type,
            accessible: accessible && path_type != STAIRS,
            blocked,
        })
}

/// Random buildings with `rooms` rooms named R0..Rn and up to `corridors`
/// corridors. Some corridors are inaccessible or permanently blocked.
pub fn arb_building(rooms: usize, corridors: usize) -> impl Strategy<Value = NavigationGraph> {
    let room = (prop::sample::select(RANDOM_TYPES.to_vec()), 1..=3i32);
    (
        prop::collection::vec(room, rooms),
        prop::collection::vec(arb_corridor(rooms), 0..=corridors),
    )
        .prop_map(|(room_plans, corridor_plans)| build_random(&room_plans, &corridor_plans))
}

fn build_random(rooms: &[(RoomType, i32)], corridors: &[CorridorPlan]) -> NavigationGraph {
    let mut graph = NavigationGraph::new("random", "");
    for (i, &(room_type, floor)) in rooms.iter().enumerate() {
        let room = Room::new(format!("R{i}"), format!("Room {i}"), "", room_type, floor);
        graph.add_room(room).expect("unique random room");
    }

    // duplicate pairs would replace each other
    let mut seen = HashSet::new();
    for plan in corridors {
        let (a, b) = (plan.a, plan.b);
        if a == b || !seen.insert((a.min(b), a.max(b))) {
            continue;
        }
        let from = graph.room(&format!("R{a}")).expect("random room").clone();
        let to = graph.room(&format!("R{b}")).expect("random room").clone();
        let path = Path::with_type(&from, &to, plan.distance, "Go straight", plan.path_type)
            .with_accessible(plan.accessible)
            .with_blocked(plan.blocked);
        graph.add_path(path).expect("valid random path");
    }
    graph
}

// ============================================================================
// Reference Search
// ============================================================================

/// Minimum policy cost over every simple path from `start` to `end`, or
/// infinity when none is admissible.
pub fn brute_force_cost(
    graph: &NavigationGraph,
    start: &str,
    end: &str,
    policy: TraversalPolicy,
) -> f64 {
    if start == end {
        return 0.0;
    }
    let mut best = f64::INFINITY;
    let mut visited = HashSet::new();
    visited.insert(start.to_string());
    explore(graph, start, end, policy, 0.0, &mut visited, &mut best);
    best
}

fn explore(
    graph: &NavigationGraph,
    current: &str,
    end: &str,
    policy: TraversalPolicy,
    cost: f64,
    visited: &mut HashSet<String>,
    best: &mut f64,
) {
    let Some(here) = graph.room(current) else {
        return;
    };
    if here.blocked {
        return;
    }
    for edge in graph.edges_from(current) {
        let Some(next) = graph.room(edge.to_id()) else {
            continue;
        };
        if next.blocked || edge.is_currently_blocked() || !policy.is_admissible(edge) {
            continue;
        }
        let weight = policy.cost(edge, here, next);
        if !weight.is_finite() {
            continue;
        }
        let total = cost + weight;
        if next.id() == end {
            if total < *best {
                *best = total;
            }
            continue;
        }
        if visited.insert(next.id().to_string()) {
            explore(graph, next.id(), end, policy, total, visited, best);
            visited.remove(next.id());
        }
    }
}

/// Snapshot of every directed edge's block state, for before/after checks.
pub fn block_state(graph: &NavigationGraph) -> Vec<(String, String, bool, bool)> {
    let mut state: Vec<_> = graph
        .paths()
        .map(|p| {
            (
                p.from_id().to_string(),
                p.to_id().to_string(),
                p.blocked,
                p.is_temporarily_blocked(),
            )
        })
        .collect();
    state.sort();
    state
}
