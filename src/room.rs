//! Rooms and room categories.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default passage width for new rooms, in meters.
pub const DEFAULT_ROOM_WIDTH: f64 = 2.0;

/// Fixed set of room categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomType {
    Entrance,
    Lobby,
    Elevator,
    Stairs,
    Restroom,
    Cafeteria,
    Library,
    ConferenceRoom,
    Office,
    Corridor,
    EmergencyExit,
    Icu,
    WaitingArea,
    Reception,
    Parking,
}

impl RoomType {
    pub const ALL: [RoomType; 15] = [
        RoomType::Entrance,
        RoomType::Lobby,
        RoomType::Elevator,
        RoomType::Stairs,
        RoomType::Restroom,
        RoomType::Cafeteria,
        RoomType::Library,
        RoomType::ConferenceRoom,
        RoomType::Office,
        RoomType::Corridor,
        RoomType::EmergencyExit,
        RoomType::Icu,
        RoomType::WaitingArea,
        RoomType::Reception,
        RoomType::Parking,
    ];

    /// Name used in persisted maps and preference files.
    pub fn persisted_name(self) -> &'static str {
        match self {
            RoomType::Entrance => "ENTRANCE",
            RoomType::Lobby => "LOBBY",
            RoomType::Elevator => "ELEVATOR",
            RoomType::Stairs => "STAIRS",
            RoomType::Restroom => "RESTROOM",
            RoomType::Cafeteria => "CAFETERIA",
            RoomType::Library => "LIBRARY",
            RoomType::ConferenceRoom => "CONFERENCE_ROOM",
            RoomType::Office => "OFFICE",
            RoomType::Corridor => "CORRIDOR",
            RoomType::EmergencyExit => "EMERGENCY_EXIT",
            RoomType::Icu => "ICU",
            RoomType::WaitingArea => "WAITING_AREA",
            RoomType::Reception => "RECEPTION",
            RoomType::Parking => "PARKING",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            RoomType::Entrance => "Entrance",
            RoomType::Lobby => "Lobby",
            RoomType::Elevator => "Elevator",
            RoomType::Stairs => "Stairs",
            RoomType::Restroom => "Restroom",
            RoomType::Cafeteria => "Cafeteria",
            RoomType::Library => "Library",
            RoomType::ConferenceRoom => "Conference Room",
            RoomType::Office => "Office",
            RoomType::Corridor => "Corridor",
            RoomType::EmergencyExit => "Emergency Exit",
            RoomType::Icu => "ICU",
            RoomType::WaitingArea => "Waiting Area",
            RoomType::Reception => "Reception",
            RoomType::Parking => "Parking",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RoomType::Entrance => "Building entrance/exit",
            RoomType::Lobby => "Central gathering area",
            RoomType::Elevator => "Vertical transportation",
            RoomType::Stairs => "Stairway",
            RoomType::Restroom => "Bathroom facilities",
            RoomType::Cafeteria => "Dining area",
            RoomType::Library => "Reading/study area",
            RoomType::ConferenceRoom => "Meeting space",
            RoomType::Office => "Work space",
            RoomType::Corridor => "Connecting passage",
            RoomType::EmergencyExit => "Emergency exit point",
            RoomType::Icu => "Intensive Care Unit",
            RoomType::WaitingArea => "Waiting/seating area",
            RoomType::Reception => "Information desk",
            RoomType::Parking => "Vehicle parking area",
        }
    }

    /// Congestion multiplier applied to edge costs. Higher is slower.
    pub fn crowd_factor(self) -> f64 {
        match self {
            RoomType::Lobby => 1.2,
            RoomType::Stairs => 2.0,
            RoomType::Cafeteria => 1.3,
            RoomType::Library | RoomType::Reception => 1.1,
            RoomType::EmergencyExit => 0.8,
            RoomType::Icu => 1.5,
            RoomType::WaitingArea => 1.4,
            RoomType::Entrance
            | RoomType::Elevator
            | RoomType::Restroom
            | RoomType::ConferenceRoom
            | RoomType::Office
            | RoomType::Corridor
            | RoomType::Parking => 1.0,
        }
    }

    pub fn requires_special_access(self) -> bool {
        self == RoomType::Stairs
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown room type: {0}")]
pub struct UnknownRoomType(pub String);

impl FromStr for RoomType {
    type Err = UnknownRoomType;

    /// Accepts either the persisted name or the display name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        RoomType::ALL
            .into_iter()
            .find(|t| {
                t.persisted_name().eq_ignore_ascii_case(s)
                    || t.display_name().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| UnknownRoomType(s.to_string()))
    }
}

/// A node of the navigation graph.
///
/// The identifier is fixed at construction. Everything else may be
/// changed through [`NavigationGraph::update_room`](crate::graph::NavigationGraph::update_room).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    id: String,
    pub name: String,
    pub description: String,
    room_type: RoomType,
    pub floor: i32,
    pub accessible: bool,
    pub blocked: bool,
    pub width: f64,
    pub emergency_exit: bool,
    pub landmarks: Vec<String>,
    pub features: BTreeMap<String, String>,
}

impl Room {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        room_type: RoomType,
        floor: i32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            room_type,
            floor,
            accessible: room_type != RoomType::Stairs,
            blocked: false,
            width: DEFAULT_ROOM_WIDTH,
            emergency_exit: room_type == RoomType::EmergencyExit,
            landmarks: Vec::new(),
            features: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn room_type(&self) -> RoomType {
        self.room_type
    }

    /// Changes the category and re-applies the category defaults: stairs
    /// become non-accessible and the emergency-exit flag follows the
    /// emergency-exit category.
    pub fn set_room_type(&mut self, room_type: RoomType) {
        self.room_type = room_type;
        if room_type == RoomType::Stairs {
            self.accessible = false;
        }
        self.emergency_exit = room_type == RoomType::EmergencyExit;
    }

    pub fn with_landmark(mut self, landmark: impl Into<String>) -> Self {
        self.landmarks.push(landmark.into());
        self
    }

    pub fn with_feature(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.features.insert(key.into(), value.into());
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn with_accessible(mut self, accessible: bool) -> Self {
        self.accessible = accessible;
        self
    }

    pub fn with_emergency_exit(mut self, emergency_exit: bool) -> Self {
        self.emergency_exit = emergency_exit;
        self
    }

    pub fn is_exit(&self) -> bool {
        self.emergency_exit || self.room_type == RoomType::EmergencyExit
    }

    pub fn landmark_description(&self) -> String {
        if self.landmarks.is_empty() {
            return String::new();
        }
        format!("Near {}", self.landmarks.join(", "))
    }

    pub fn full_description(&self) -> String {
        let mut out = self.description.clone();
        if !self.landmarks.is_empty() {
            out.push_str(&format!(" ({})", self.landmark_description()));
        }
        if self.floor != 1 {
            out.push_str(&format!(" - Floor {}", self.floor));
        }
        out
    }

    /// Case-insensitive match against name, description, category and landmarks.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.room_type.display_name().to_lowercase().contains(&query)
            || self.landmarks.iter().any(|l| l.to_lowercase().contains(&query))
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Room{{id='{}', name='{}', type={}, floor={}, accessible={}, blocked={}}}",
            self.id, self.name, self.room_type, self.floor, self.accessible, self.blocked
        )
    }
}
