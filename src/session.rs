//! A single user's navigation session.
//!
//! The session ties the routing core to its collaborators: it resolves the
//! user's location and destination, plans routes under the active policy,
//! keeps the last route with its alternates, and reports everything through
//! a [`SpeechSink`]. Graph locks are always released before anything is
//! spoken.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::NavError;
use crate::graph::NavigationGraph;
use crate::monitor::{ObstacleReport, RouteMonitor};
use crate::pathfinder;
use crate::policy::TraversalPolicy;
use crate::preferences::UserPreferences;
use crate::room::{Room, RoomType};
use crate::route::RouteResult;
use crate::shared::SharedGraph;
use crate::storage::FileStore;
use crate::traits::{Command, CommandSource, LocationResolver, SpeechSink};

/// How many same-category rooms to offer when a destination is blocked.
const BLOCKED_ALTERNATIVES: usize = 3;
/// How many rooms to suggest for an unknown destination.
const SUGGESTION_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Routes requested per navigation, the primary route included.
    pub max_alternatives: usize,
    /// Apply the user's avoidances and weight overrides to searches.
    pub use_preferences: bool,
    /// When the active policy finds nothing, try the other policies without
    /// preferences and offer the first route found.
    pub fallback_to_other_policies: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_alternatives: 3,
            use_preferences: true,
            fallback_to_other_policies: true,
        }
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone)]
pub enum NavigationOutcome {
    /// A route was planned and is now the session's active route.
    Route(RouteResult),
    NoLocation,
    UnknownDestination {
        query: String,
        suggestions: Vec<Room>,
    },
    AlreadyThere(Room),
    DestinationBlocked {
        room: Room,
        alternatives: Vec<Room>,
    },
    /// Nothing connects the location to the destination under the active
    /// policy. `fallback` is a route found under another policy, if any.
    Unreachable {
        destination: Room,
        fallback: Option<RouteResult>,
    },
    NoExitReachable,
}

impl NavigationOutcome {
    pub fn route(&self) -> Option<&RouteResult> {
        match self {
            NavigationOutcome::Route(route) => Some(route),
            _ => None,
        }
    }
}

pub struct NavigationSession {
    graph: SharedGraph,
    options: SessionOptions,
    preferences: UserPreferences,
    policy: TraversalPolicy,
    location: Option<Room>,
    /// Primary route first, then the alternates.
    routes: Vec<RouteResult>,
    speech: Box<dyn SpeechSink>,
    resolver: Box<dyn LocationResolver>,
    commands: Option<Box<dyn CommandSource>>,
}

impl NavigationSession {
    pub fn new(
        graph: SharedGraph,
        preferences: UserPreferences,
        speech: impl SpeechSink + 'static,
        resolver: impl LocationResolver + 'static,
    ) -> Self {
        Self {
            graph,
            options: SessionOptions::default(),
            policy: preferences.preferred_policy,
            preferences,
            location: None,
            routes: Vec::new(),
            speech: Box::new(speech),
            resolver: Box::new(resolver),
            commands: None,
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_commands(mut self, commands: impl CommandSource + 'static) -> Self {
        self.commands = Some(Box::new(commands));
        self
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub fn location(&self) -> Option<&Room> {
        self.location.as_ref()
    }

    pub fn policy(&self) -> TraversalPolicy {
        self.policy
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut UserPreferences {
        &mut self.preferences
    }

    /// The active route, if any.
    pub fn route(&self) -> Option<&RouteResult> {
        self.routes.first()
    }

    /// Alternates to the active route.
    pub fn alternatives(&self) -> &[RouteResult] {
        self.routes.get(1..).unwrap_or(&[])
    }

    /// Most recent destination first.
    pub fn history(&self) -> Vec<String> {
        self.preferences.history().map(str::to_string).collect()
    }

    pub fn next_command(&mut self) -> Option<Command> {
        self.commands.as_mut()?.next_command()
    }

    // ========================================================================
    // Location And Policy
    // ========================================================================

    pub fn set_location(&mut self, code: &str) -> Option<&Room> {
        let Some(room) = self.resolver.resolve(code) else {
            self.speech.speak_error(&format!("Unknown location: {code}"));
            return None;
        };
        info!(room = %room.id(), "location set");
        self.speech.speak(&format!(
            "Current location set to: {} on floor {} - {}",
            room.name, room.floor, room.description
        ));
        self.location = Some(room);
        self.location.as_ref()
    }

    pub fn set_policy(&mut self, policy: TraversalPolicy) {
        self.policy = policy;
        self.preferences.preferred_policy = policy;
        self.speech.speak(&format!(
            "Navigation mode set to {}. {}",
            policy.display_name(),
            policy.description()
        ));
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn navigate_to(&mut self, destination: &str) -> Result<NavigationOutcome, NavError> {
        let Some(location) = self.location.clone() else {
            self.speech
                .speak_error("Please set your current location before navigating.");
            return Ok(NavigationOutcome::NoLocation);
        };

        let resolved = {
            let graph = self.graph.read();
            resolve_destination(&graph, location.id(), destination, self.policy)?.cloned()
        };
        let Some(target) = resolved else {
            let suggestions = self.suggestions(destination);
            self.speech
                .speak_error(&format!("Destination not found: {destination}"));
            if !suggestions.is_empty() {
                self.speech.speak("Did you mean one of these locations?");
                for (i, room) in suggestions.iter().enumerate() {
                    self.speech
                        .speak(&format!("{}. {} - {}", i + 1, room.name, room.description));
                }
            }
            return Ok(NavigationOutcome::UnknownDestination {
                query: destination.to_string(),
                suggestions,
            });
        };

        if target.id() == location.id() {
            self.speech.speak("You are already at your destination.");
            return Ok(NavigationOutcome::AlreadyThere(target));
        }

        if target.blocked {
            let alternatives = self.same_category_alternatives(&target);
            self.speech.speak_warning(&format!(
                "{} is currently blocked. Finding alternative nearby locations.",
                target.name
            ));
            for (i, room) in alternatives.iter().enumerate() {
                self.speech
                    .speak(&format!("{}. {} - {}", i + 1, room.name, room.full_description()));
            }
            return Ok(NavigationOutcome::DestinationBlocked {
                room: target,
                alternatives,
            });
        }

        let preferences = self.options.use_preferences.then_some(&self.preferences);
        let routes = self.graph.find_alternative_routes(
            location.id(),
            target.id(),
            self.policy,
            preferences,
            self.options.max_alternatives.max(1),
        )?;

        if routes.is_empty() {
            self.speech.speak_error(&format!(
                "No path found to {} using {} mode",
                target.name,
                self.policy.display_name()
            ));
            let fallback = if self.options.fallback_to_other_policies {
                self.fallback_route(location.id(), target.id())?
            } else {
                None
            };
            return Ok(NavigationOutcome::Unreachable {
                destination: target,
                fallback,
            });
        }

        self.routes = routes;
        self.preferences.add_to_history(target.name.clone());
        let route = self.routes[0].clone();
        debug!(route = %route.summary(), alternates = self.routes.len() - 1, "navigation planned");
        self.announce(&route);
        if !self.alternatives().is_empty() {
            self.speech.speak("Alternative routes are available if needed");
        }
        Ok(NavigationOutcome::Route(route))
    }

    pub fn emergency_exit(&mut self) -> Result<NavigationOutcome, NavError> {
        let Some(location) = self.location.as_ref() else {
            self.speech
                .speak_error("Current location not set. Cannot find emergency exit.");
            return Ok(NavigationOutcome::NoLocation);
        };
        self.speech.speak_warning("Finding nearest emergency exit");

        let route = self.graph.find_emergency_exit(location.id())?;
        if route.is_empty() {
            self.speech
                .speak_error("No emergency exit found from current location");
            return Ok(NavigationOutcome::NoExitReachable);
        }
        self.routes = vec![route.clone()];
        self.announce(&route);
        Ok(NavigationOutcome::Route(route))
    }

    /// Checks the active route for new obstacles. On a hit the route is
    /// planned again from its start, and a detour becomes the active route.
    pub fn reroute_if_blocked(&mut self) -> Result<Option<ObstacleReport>, NavError> {
        let Some(route) = self.route().cloned() else {
            return Ok(None);
        };
        let preferences = self.options.use_preferences.then(|| self.preferences.clone());
        let mut monitor = RouteMonitor::new(self.graph.clone(), route, preferences);
        let Some(report) = monitor.poll()? else {
            return Ok(None);
        };

        if let Some(first) = report.blocked.first() {
            let name = |id: &str| {
                report
                    .previous
                    .rooms()
                    .iter()
                    .find(|r| r.id() == id)
                    .map_or_else(|| id.to_string(), |r| r.name.clone())
            };
            self.speech.speak_warning(&format!(
                "Path from {} to {} is now blocked: {}",
                name(&first.key.from),
                name(&first.key.to),
                first.info
            ));
        }

        if report.has_detour() {
            self.speech.speak("Recalculating route");
            self.routes = vec![report.replacement.clone()];
            self.announce(&report.replacement);
        } else {
            self.speech
                .speak_error("No way around the obstacle from the route's start");
        }
        Ok(Some(report))
    }

    /// Speaks the alternates to the active route.
    pub fn speak_alternatives(&self) {
        let alternatives = self.alternatives();
        if alternatives.is_empty() {
            self.speech.speak("No alternative routes available");
            return;
        }
        self.speech.speak("Available alternative routes:");
        for (i, route) in alternatives.iter().enumerate() {
            self.speech.speak(&format!(
                "Alternative {}: {:.1} meters via {} mode",
                i + 1,
                route.total_distance(),
                route.policy().display_name()
            ));
        }
    }

    // ========================================================================
    // Preferences
    // ========================================================================

    /// Replaces the session's preferences with the stored ones for
    /// `user_id` and adopts their preferred policy.
    pub fn load_preferences(&mut self, store: &FileStore, user_id: &str) {
        self.preferences = store.load_preferences(user_id);
        self.policy = self.preferences.preferred_policy;
        self.speech.speak(&format!(
            "Welcome back {user_id}. Navigation mode set to {}",
            self.policy.display_name()
        ));
    }

    pub fn save_preferences(&self, store: &FileStore) -> Result<PathBuf, NavError> {
        let path = store.save_preferences(&self.preferences)?;
        self.speech.speak("Preferences saved");
        Ok(path)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn announce(&self, route: &RouteResult) {
        self.speech.speak(&route.summary());
        let floors = route.floors();
        if floors.len() > 1 {
            let floors: Vec<String> = floors.iter().map(i32::to_string).collect();
            self.speech.speak(&format!(
                "This route spans {} floors: {}",
                floors.len(),
                floors.join(", ")
            ));
        }
        for (i, instruction) in route.instructions().iter().enumerate() {
            if !instruction.is_empty() {
                self.speech.speak(&format!("Step {}: {}", i + 1, instruction));
            }
        }
        if let Some(end) = route.destination() {
            self.speech
                .speak(&format!("Your destination is {}", end.name));
        }
    }

    fn suggestions(&self, query: &str) -> Vec<Room> {
        let graph = self.graph.read();
        let words: Vec<String> = query
            .split_whitespace()
            .filter(|w| w.len() > 2)
            .map(str::to_lowercase)
            .collect();
        graph
            .rooms()
            .filter(|room| words.iter().any(|w| room.matches(w)))
            .take(SUGGESTION_LIMIT)
            .cloned()
            .collect()
    }

    fn same_category_alternatives(&self, blocked: &Room) -> Vec<Room> {
        let graph = self.graph.read();
        graph
            .rooms_by_type(blocked.room_type())
            .into_iter()
            .filter(|room| !room.blocked && room.id() != blocked.id())
            .take(BLOCKED_ALTERNATIVES)
            .cloned()
            .collect()
    }

    fn fallback_route(&self, start: &str, end: &str) -> Result<Option<RouteResult>, NavError> {
        for policy in TraversalPolicy::ALL.into_iter().filter(|p| *p != self.policy) {
            let route = self.graph.find_shortest_path(start, end, policy, None)?;
            if !route.is_empty() {
                self.speech.speak(&format!(
                    "Alternative route found using {} mode",
                    policy.display_name()
                ));
                return Ok(Some(route));
            }
        }
        self.speech.speak(concat!(
            "No alternative routes found. Please check if the destination is accessible ",
            "or try a different location."
        ));
        Ok(None)
    }
}

/// Resolves a destination by room id, then exact name, then category
/// (nearest by route cost from `from`), then partial name, then free-text
/// search.
fn resolve_destination<'g>(
    graph: &'g NavigationGraph,
    from: &str,
    query: &str,
    policy: TraversalPolicy,
) -> Result<Option<&'g Room>, NavError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(None);
    }
    if let Some(room) = graph.room(query) {
        return Ok(Some(room));
    }
    if let Some(room) = graph.rooms().find(|r| r.name.eq_ignore_ascii_case(query)) {
        return Ok(Some(room));
    }
    // a category name resolves to the nearest room of that type
    if let Ok(room_type) = query.parse::<RoomType>() {
        if let Some(room) = pathfinder::find_nearest_room_of_type(graph, from, room_type, policy)? {
            return Ok(Some(room));
        }
    }
    if let Some(room) = graph.find_room_by_name(query) {
        return Ok(Some(room));
    }
    Ok(graph.search_rooms(query).into_iter().next())
}
