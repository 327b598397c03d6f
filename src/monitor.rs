//! Watches a planned route for obstacles that appear after it was computed.
//!
//! A tick reads the block flags of every traversed corridor. When one is
//! blocked the monitor plans a fresh route from the same start to the same
//! destination; the route it was watching is left as it was.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::NavError;
use crate::path::EdgeKey;
use crate::preferences::UserPreferences;
use crate::route::RouteResult;
use crate::shared::SharedGraph;
use crate::worker::PeriodicWorker;

#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(10),
            interval: Duration::from_secs(15),
        }
    }
}

/// One obstructed corridor on the watched route.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockedSegment {
    pub key: EdgeKey,
    pub info: String,
}

#[derive(Debug, Clone)]
pub struct ObstacleReport {
    pub blocked: Vec<BlockedSegment>,
    /// The route that was being watched when the obstacle was found.
    pub previous: RouteResult,
    /// Fresh search under the same policy. Empty when no way around exists.
    pub replacement: RouteResult,
}

impl ObstacleReport {
    pub fn has_detour(&self) -> bool {
        !self.replacement.is_empty()
    }
}

pub struct RouteMonitor {
    graph: SharedGraph,
    route: RouteResult,
    preferences: Option<UserPreferences>,
}

impl RouteMonitor {
    pub fn new(
        graph: SharedGraph,
        route: RouteResult,
        preferences: Option<UserPreferences>,
    ) -> Self {
        Self {
            graph,
            route,
            preferences,
        }
    }

    pub fn route(&self) -> &RouteResult {
        &self.route
    }

    /// Corridors of the watched route that are blocked right now. A corridor
    /// that was removed, or leads into a blocked room, counts as blocked.
    pub fn blocked_segments(&self) -> Vec<BlockedSegment> {
        let graph = self.graph.read();
        self.route
            .segment_keys()
            .filter_map(|key| match graph.path(&key.from, &key.to) {
                None => Some(BlockedSegment {
                    info: "Path removed".to_string(),
                    key,
                }),
                Some(path) if path.is_currently_blocked() => Some(BlockedSegment {
                    info: path.blockage_info(),
                    key,
                }),
                Some(_) if graph.room(&key.to).is_none_or(|r| r.blocked) => Some(BlockedSegment {
                    info: format!("Room {} is blocked", key.to),
                    key,
                }),
                Some(_) => None,
            })
            .collect()
    }

    /// Plans the route again from its start to its destination.
    pub fn replan(&self) -> Result<RouteResult, NavError> {
        let (Some(start), Some(end)) = (self.route.start(), self.route.destination()) else {
            return Ok(RouteResult::not_found(self.route.policy()));
        };
        self.graph.find_shortest_path(
            start.id(),
            end.id(),
            self.route.policy(),
            self.preferences.as_ref(),
        )
    }

    /// One monitor tick. When the watched route is obstructed the report
    /// carries a replacement, which becomes the watched route if non-empty.
    pub fn poll(&mut self) -> Result<Option<ObstacleReport>, NavError> {
        if self.route.is_empty() {
            return Ok(None);
        }
        let blocked = self.blocked_segments();
        if blocked.is_empty() {
            debug!(route = %self.route.summary(), "route clear");
            return Ok(None);
        }

        for segment in &blocked {
            info!(path = %segment.key, info = %segment.info, "obstacle on route");
        }
        let replacement = self.replan()?;
        let previous = if replacement.is_empty() {
            warn!(route = %self.route.summary(), "no detour around obstacle");
            self.route.clone()
        } else {
            std::mem::replace(&mut self.route, replacement.clone())
        };
        Ok(Some(ObstacleReport {
            blocked,
            previous,
            replacement,
        }))
    }

    /// Polls on a background thread, handing each report to `on_report`.
    /// Monitoring ends once the route is empty or the worker is dropped.
    pub fn spawn<F>(mut self, options: MonitorOptions, mut on_report: F) -> PeriodicWorker
    where
        F: FnMut(ObstacleReport) + Send + 'static,
    {
        PeriodicWorker::spawn("route-monitor", options.initial_delay, options.interval, move || {
            match self.poll() {
                Ok(Some(report)) => on_report(report),
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, "route monitor stopped");
                    return false;
                }
            }
            !self.route.is_empty()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NavigationGraph;
    use crate::path::Path;
    use crate::policy::TraversalPolicy;
    use crate::room::{Room, RoomType};
    use std::sync::mpsc;

    /// A -1- B -1- D plus a longer A -2- C -2- D.
    fn loop_graph() -> SharedGraph {
        let mut graph = NavigationGraph::default();
        let rooms: Vec<Room> = ["A", "B", "C", "D"]
            .into_iter()
            .map(|id| Room::new(id, id, "", RoomType::Corridor, 1))
            .collect();
        for r in &rooms {
            graph.add_room(r.clone()).unwrap();
        }
        let (a, b, c, d) = (&rooms[0], &rooms[1], &rooms[2], &rooms[3]);
        graph.add_path(Path::new(a, b, 1.0, "")).unwrap();
        graph.add_path(Path::new(b, d, 1.0, "")).unwrap();
        graph.add_path(Path::new(a, c, 2.0, "")).unwrap();
        graph.add_path(Path::new(c, d, 2.0, "")).unwrap();
        SharedGraph::new(graph)
    }

    fn monitor(shared: &SharedGraph) -> RouteMonitor {
        let route = shared.find_shortest_path("A", "D", TraversalPolicy::Standard, None).unwrap();
        assert_eq!(route.room_ids(), vec!["A", "B", "D"]);
        RouteMonitor::new(shared.clone(), route, None)
    }

    #[test]
    fn test_clear_route_reports_nothing() {
        let shared = loop_graph();
        let mut monitor = monitor(&shared);
        assert!(monitor.poll().unwrap().is_none());
    }

    #[test]
    fn test_obstacle_triggers_replan() {
        let shared = loop_graph();
        let mut monitor = monitor(&shared);
        shared
            .write()
            .block_path_temporarily("D", "B", "Spill", None)
            .unwrap();

        let report = monitor.poll().unwrap().expect("obstacle should be reported");
        assert_eq!(report.blocked.len(), 1);
        assert_eq!(report.blocked[0].key, EdgeKey::new("B", "D"));
        assert!(report.blocked[0].info.contains("Spill"));
        assert_eq!(report.previous.room_ids(), vec!["A", "B", "D"]);
        assert_eq!(report.replacement.room_ids(), vec!["A", "C", "D"]);
        assert!(report.has_detour());

        // the detour is now watched and is clear
        assert!(monitor.poll().unwrap().is_none());
    }

    #[test]
    fn test_no_detour_keeps_route() {
        let shared = loop_graph();
        let mut monitor = monitor(&shared);
        shared.write().block_room("D", true).unwrap();
        let report = monitor.poll().unwrap().unwrap();
        assert!(!report.has_detour());
        assert_eq!(monitor.route().room_ids(), vec!["A", "B", "D"]);
    }

    #[test]
    fn test_spawned_monitor_delivers_report() {
        let shared = loop_graph();
        let monitor = monitor(&shared);
        shared.write().set_path_blocked("A", "B", true).unwrap();

        let (tx, rx) = mpsc::channel();
        let options = MonitorOptions {
            initial_delay: Duration::ZERO,
            interval: Duration::from_millis(5),
        };
        let worker = monitor.spawn(options, move |report| {
            let _ = tx.send(report.replacement.room_ids().join(","));
        });
        let detour = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        worker.stop();
        assert_eq!(detour, "A,C,D");
    }
}
