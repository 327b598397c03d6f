//! Policy-aware shortest-path search.
//!
//! A Dijkstra variant over non-negative edge costs with lazy deletion: stale
//! heap entries are skipped when popped instead of being decreased in place.
//! Among entries of equal cost the one pushed first pops first, so results
//! are deterministic for a given graph and insertion order.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use rayon::prelude::*;
use tracing::debug;

use crate::error::NavError;
use crate::graph::NavigationGraph;
use crate::path::{EdgeKey, Path};
use crate::policy::TraversalPolicy;
use crate::preferences::UserPreferences;
use crate::room::{Room, RoomType};
use crate::route::RouteResult;

/// Entry in the open set (min-heap via reversed ordering).
struct OpenEntry<'g> {
    cost: f64,
    seq: u64,
    room: &'g str,
}

impl PartialEq for OpenEntry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry<'_> {}

impl PartialOrd for OpenEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Smallest cost is "greatest"; on ties, the earlier push wins.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Settled distances and predecessor edges of one search.
struct SearchTree<'g> {
    start: &'g str,
    dist: HashMap<&'g str, f64>,
    prev: HashMap<&'g str, &'g Path>,
}

impl<'g> SearchTree<'g> {
    fn cost_to(&self, room: &str) -> Option<f64> {
        self.dist.get(room).copied().filter(|d| d.is_finite())
    }

    /// Edges from the start to `end`, in walking order.
    fn edges_to(&self, end: &'g str) -> Option<Vec<&'g Path>> {
        if end == self.start {
            return Some(Vec::new());
        }
        let mut edges = Vec::new();
        let mut current = end;
        while current != self.start {
            let edge = *self.prev.get(current)?;
            edges.push(edge);
            current = edge.from_id();
        }
        edges.reverse();
        Some(edges)
    }
}

/// Finds the cheapest route from `start` to `end` under `policy`.
///
/// Unknown room ids are an error. An unreachable destination is not: it
/// yields [`RouteResult::not_found`].
pub fn find_shortest_path(
    graph: &NavigationGraph,
    start: &str,
    end: &str,
    policy: TraversalPolicy,
    preferences: Option<&UserPreferences>,
) -> Result<RouteResult, NavError> {
    route_between(graph, start, end, policy, preferences, &HashSet::new())
}

/// Returns the primary route followed by up to `max_count - 1` distinct
/// alternates.
///
/// Each round excludes one more edge of the primary route, in route order,
/// and searches again. Exclusions live in a search-local overlay, so the
/// graph's own block state is never touched.
pub fn find_alternative_routes(
    graph: &NavigationGraph,
    start: &str,
    end: &str,
    policy: TraversalPolicy,
    preferences: Option<&UserPreferences>,
    max_count: usize,
) -> Result<Vec<RouteResult>, NavError> {
    let primary = find_shortest_path(graph, start, end, policy, preferences)?;
    if max_count == 0 || primary.is_empty() {
        return Ok(Vec::new());
    }

    let primary_keys: Vec<EdgeKey> = primary.segment_keys().collect();
    let mut routes = vec![primary];
    let mut excluded: HashSet<EdgeKey> = HashSet::new();

    for key in primary_keys.into_iter().take(max_count - 1) {
        excluded.insert(key.reversed());
        excluded.insert(key);
        let candidate = route_between(graph, start, end, policy, preferences, &excluded)?;
        if !candidate.is_empty() && !routes.iter().any(|r| r.same_route(&candidate)) {
            routes.push(candidate);
        }
        if routes.len() >= max_count {
            break;
        }
    }

    debug!(%policy, start, end, found = routes.len(), "alternative routes");
    Ok(routes)
}

/// Cheapest evacuation route from `start` under the emergency policy.
///
/// Candidates are the emergency exits, or the entrances when the building
/// has no exits. Each candidate is searched independently.
pub fn find_emergency_exit(graph: &NavigationGraph, start: &str) -> Result<RouteResult, NavError> {
    graph.require_room(start)?;

    let mut exits: Vec<&Room> = graph.rooms().filter(|r| r.is_exit()).collect();
    if exits.is_empty() {
        exits = graph.rooms_by_type(RoomType::Entrance);
    }

    let best = exits
        .par_iter()
        .filter_map(|exit| {
            find_shortest_path(graph, start, exit.id(), TraversalPolicy::Emergency, None).ok()
        })
        .filter(|route| !route.is_empty())
        .min_by(|a, b| {
            a.total_cost()
                .total_cmp(&b.total_cost())
                .then_with(|| a.destination().map(Room::id).cmp(&b.destination().map(Room::id)))
        });

    match best {
        Some(route) => {
            debug!(
                start,
                exit = ?route.destination().map(Room::id),
                cost = route.total_cost(),
                "emergency exit found"
            );
            Ok(route)
        }
        None => {
            debug!(start, candidates = exits.len(), "no reachable emergency exit");
            Ok(RouteResult::not_found(TraversalPolicy::Emergency))
        }
    }
}

/// Nearest unblocked, accessible room of `room_type` by true route cost.
pub fn find_nearest_room_of_type<'g>(
    graph: &'g NavigationGraph,
    from: &str,
    room_type: RoomType,
    policy: TraversalPolicy,
) -> Result<Option<&'g Room>, NavError> {
    let tree = search(graph, from, None, policy, None, &HashSet::new())?;
    let nearest = graph
        .rooms_by_type(room_type)
        .into_iter()
        .filter(|room| !room.blocked && room.accessible)
        .filter_map(|room| tree.cost_to(room.id()).map(|cost| (cost, room)))
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, room)| room);
    Ok(nearest)
}

fn route_between(
    graph: &NavigationGraph,
    start: &str,
    end: &str,
    policy: TraversalPolicy,
    preferences: Option<&UserPreferences>,
    excluded: &HashSet<EdgeKey>,
) -> Result<RouteResult, NavError> {
    let end = graph.require_room(end)?.id();
    let tree = search(graph, start, Some(end), policy, preferences, excluded)?;

    let Some(edges) = tree.edges_to(end) else {
        debug!(%policy, start, end, "no route");
        return Ok(RouteResult::not_found(policy));
    };

    let use_landmarks = preferences.is_none_or(|p| p.use_landmark_instructions);
    let mut rooms = Vec::with_capacity(edges.len() + 1);
    rooms.push(graph.require_room(tree.start)?.clone());
    let mut instructions = Vec::with_capacity(edges.len());
    let mut landmark_instructions = Vec::with_capacity(edges.len());
    for edge in &edges {
        rooms.push(graph.require_room(edge.to_id())?.clone());
        let text = if use_landmarks {
            &edge.landmark_instruction
        } else {
            &edge.instruction
        };
        instructions.push(text.clone());
        landmark_instructions.push(edge.landmark_instruction.clone());
    }

    let accessible = edges.iter().all(|edge| policy.is_admissible(edge));
    let total_cost = tree.cost_to(end).unwrap_or(0.0);
    debug!(%policy, start, end, total_cost, steps = edges.len(), "route found");

    Ok(RouteResult::new(
        rooms,
        instructions,
        landmark_instructions,
        edges.into_iter().cloned().collect(),
        total_cost,
        accessible,
        policy,
    ))
}

/// Runs the search from `start`, stopping once `target` is settled. With no
/// target the whole reachable graph is settled.
fn search<'g>(
    graph: &'g NavigationGraph,
    start: &str,
    target: Option<&str>,
    policy: TraversalPolicy,
    preferences: Option<&UserPreferences>,
    excluded: &HashSet<EdgeKey>,
) -> Result<SearchTree<'g>, NavError> {
    let start = graph.require_room(start)?.id();
    let avoids_room =
        |room: &Room| preferences.is_some_and(|p| p.avoids_room_type(room.room_type()));
    let avoids_path =
        |edge: &Path| preferences.is_some_and(|p| p.avoids_path_type(&edge.path_type));
    let adjust = preferences.map(UserPreferences::weight_adjust).unwrap_or_default();

    let mut tree = SearchTree {
        start,
        dist: HashMap::from([(start, 0.0)]),
        prev: HashMap::new(),
    };
    let mut settled: HashSet<&'g str> = HashSet::new();
    let mut open = BinaryHeap::new();
    let mut seq = 0u64;
    open.push(OpenEntry {
        cost: 0.0,
        seq,
        room: start,
    });

    while let Some(OpenEntry { cost, room: room_id, .. }) = open.pop() {
        if !settled.insert(room_id) {
            continue;
        }
        if target == Some(room_id) {
            break;
        }

        let Some(current) = graph.room(room_id) else {
            continue;
        };
        if current.blocked || avoids_room(current) {
            continue;
        }

        for edge in graph.edges_from(room_id) {
            let Some(next) = graph.room(edge.to_id()) else {
                continue;
            };
            if edge.is_currently_blocked() || next.blocked {
                continue;
            }
            if !excluded.is_empty() && excluded.contains(&edge.key()) {
                continue;
            }
            if !policy.is_admissible(edge) || avoids_path(edge) || avoids_room(next) {
                continue;
            }

            let weight = adjust.apply(policy.cost(edge, current, next), edge.width);
            if !weight.is_finite() {
                continue;
            }

            let candidate = cost + weight;
            let known = tree.dist.get(next.id()).copied().unwrap_or(f64::INFINITY);
            if candidate < known {
                tree.dist.insert(next.id(), candidate);
                tree.prev.insert(next.id(), edge);
                seq += 1;
                open.push(OpenEntry {
                    cost: candidate,
                    seq,
                    room: next.id(),
                });
            }
        }
    }

    Ok(tree)
}
