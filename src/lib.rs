//! indoor-router
//!
//! Mode-aware shortest-path routing over a mutable multi-floor building
//! graph: accessibility-constrained routes, alternates, emergency exits and
//! rerouting around obstacles that appear at runtime.

pub mod error;
pub mod room;
pub mod path;
pub mod policy;
pub mod preferences;
pub mod route;
pub mod graph;
pub mod pathfinder;
pub mod worker;
pub mod shared;
pub mod monitor;
pub mod storage;
pub mod sample;
pub mod traits;
pub mod session;

pub use error::NavError;
pub use graph::{BuildingStats, NavigationGraph};
pub use path::{EdgeKey, Path, TemporaryBlock};
pub use pathfinder::{
    find_alternative_routes, find_emergency_exit, find_nearest_room_of_type, find_shortest_path,
};
pub use policy::TraversalPolicy;
pub use preferences::UserPreferences;
pub use room::{Room, RoomType};
pub use route::RouteResult;
pub use shared::SharedGraph;
