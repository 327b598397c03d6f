//! A graph shared between the routing caller and background pollers.
//!
//! Searches hold the read lock for their whole run, so they see one
//! consistent set of block flags. Mutations take the write lock. Temporary
//! obstacles carry their own deadline and are lifted by an expiry worker
//! rather than by a timer per obstacle.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

use crate::error::NavError;
use crate::graph::NavigationGraph;
use crate::pathfinder;
use crate::policy::TraversalPolicy;
use crate::preferences::UserPreferences;
use crate::route::RouteResult;
use crate::worker::PeriodicWorker;

#[derive(Debug, Clone)]
pub struct ExpiryOptions {
    /// How often deadlines are checked.
    pub interval: Duration,
}

impl Default for ExpiryOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<NavigationGraph>>,
}

impl From<NavigationGraph> for SharedGraph {
    fn from(graph: NavigationGraph) -> Self {
        Self::new(graph)
    }
}

impl SharedGraph {
    pub fn new(graph: NavigationGraph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, NavigationGraph> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, NavigationGraph> {
        self.inner.write()
    }

    pub fn find_shortest_path(
        &self,
        start: &str,
        end: &str,
        policy: TraversalPolicy,
        preferences: Option<&UserPreferences>,
    ) -> Result<RouteResult, NavError> {
        pathfinder::find_shortest_path(&self.read(), start, end, policy, preferences)
    }

    pub fn find_alternative_routes(
        &self,
        start: &str,
        end: &str,
        policy: TraversalPolicy,
        preferences: Option<&UserPreferences>,
        max_count: usize,
    ) -> Result<Vec<RouteResult>, NavError> {
        let graph = self.read();
        pathfinder::find_alternative_routes(&graph, start, end, policy, preferences, max_count)
    }

    pub fn find_emergency_exit(&self, start: &str) -> Result<RouteResult, NavError> {
        pathfinder::find_emergency_exit(&self.read(), start)
    }

    /// Blocks a corridor for `duration`. The block is lifted by the expiry
    /// worker once the deadline passes, unless it was cleared manually first.
    pub fn simulate_obstacle(
        &self,
        from: &str,
        to: &str,
        reason: impl Into<String>,
        duration: Duration,
    ) -> Result<(), NavError> {
        self.write().simulate_obstacle(from, to, reason, duration)
    }

    pub fn unblock_path_temporarily(&self, from: &str, to: &str) -> Result<bool, NavError> {
        self.write().unblock_path_temporarily(from, to)
    }

    pub fn clear_all_temporary_blocks(&self) -> usize {
        self.write().clear_all_temporary_blocks()
    }

    /// Lifts expired obstacles. Returns the number of corridors cleared.
    pub fn expire_obstacles(&self, now: SystemTime) -> usize {
        // Check under the read lock first so idle sweeps never block searches.
        let due = self
            .read()
            .temporarily_blocked_paths()
            .iter()
            .any(|p| p.temporary_block.as_ref().is_some_and(|b| b.is_expired(now)));
        if !due {
            return 0;
        }
        let cleared = self.write().expire_temporary_blocks(now);
        for key in &cleared {
            info!(path = %key, "obstacle expired");
        }
        cleared.len()
    }

    /// Starts the poller that lifts expired obstacles. It runs until the
    /// returned worker is dropped.
    pub fn spawn_expiry_worker(&self, options: ExpiryOptions) -> PeriodicWorker {
        let graph = self.clone();
        PeriodicWorker::spawn("obstacle-expiry", options.interval, options.interval, move || {
            graph.expire_obstacles(SystemTime::now());
            true
        })
    }
}
