//! Directed edges ("paths") between rooms.
//!
//! Edges refer to rooms by id only. The graph stores every corridor as two
//! directed edges so each direction can carry its own instruction text; see
//! [`Path::mirrored`].

use std::fmt;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::room::{Room, RoomType};

pub const CORRIDOR: &str = "corridor";
pub const STAIRS: &str = "stairs";
pub const ELEVATOR: &str = "elevator";
pub const RAMP: &str = "ramp";

/// Default corridor width, in meters.
pub const DEFAULT_PATH_WIDTH: f64 = 2.0;

/// Ordered (from, to) room pair identifying one directed edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub from: String,
    pub to: String,
}

impl EdgeKey {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// A reason-carrying, time-stamped obstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporaryBlock {
    pub reason: String,
    pub blocked_at: SystemTime,
    /// When set, the block is cleared by the first expiry sweep at or after
    /// this instant.
    pub expires_at: Option<SystemTime>,
}

impl TemporaryBlock {
    pub fn new(reason: impl Into<String>, duration: Option<Duration>) -> Self {
        let blocked_at = SystemTime::now();
        Self {
            reason: reason.into(),
            blocked_at,
            expires_at: duration.map(|d| blocked_at + d),
        }
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    from: String,
    to: String,
    pub distance: f64,
    pub instruction: String,
    pub landmark_instruction: String,
    pub path_type: String,
    pub width: f64,
    pub accessible: bool,
    pub blocked: bool,
    pub temporary_block: Option<TemporaryBlock>,
}

impl Path {
    /// Builds a corridor edge between two rooms. The landmark instruction is
    /// derived from the destination room and the path type.
    pub fn new(from: &Room, to: &Room, distance: f64, instruction: impl Into<String>) -> Self {
        Self::with_type(from, to, distance, instruction, CORRIDOR)
    }

    pub fn with_type(
        from: &Room,
        to: &Room,
        distance: f64,
        instruction: impl Into<String>,
        path_type: impl Into<String>,
    ) -> Self {
        let path_type = path_type.into();
        Self {
            from: from.id().to_string(),
            to: to.id().to_string(),
            distance,
            instruction: instruction.into(),
            landmark_instruction: landmark_instruction(from, to, &path_type),
            accessible: path_type != STAIRS,
            path_type,
            width: DEFAULT_PATH_WIDTH,
            blocked: false,
            temporary_block: None,
        }
    }

    /// Builds an edge from raw ids, as read back from a stored map.
    pub fn from_parts(
        from: impl Into<String>,
        to: impl Into<String>,
        distance: f64,
        instruction: impl Into<String>,
        landmark_instruction: impl Into<String>,
        path_type: impl Into<String>,
    ) -> Self {
        let path_type = path_type.into();
        Self {
            from: from.into(),
            to: to.into(),
            distance,
            instruction: instruction.into(),
            landmark_instruction: landmark_instruction.into(),
            accessible: path_type != STAIRS,
            path_type,
            width: DEFAULT_PATH_WIDTH,
            blocked: false,
            temporary_block: None,
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn with_accessible(mut self, accessible: bool) -> Self {
        self.accessible = accessible;
        self
    }

    pub fn with_blocked(mut self, blocked: bool) -> Self {
        self.blocked = blocked;
        self
    }

    pub fn with_landmark_instruction(mut self, text: impl Into<String>) -> Self {
        self.landmark_instruction = text.into();
        self
    }

    pub fn from_id(&self) -> &str {
        &self.from
    }

    pub fn to_id(&self) -> &str {
        &self.to
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.from.clone(), self.to.clone())
    }

    pub fn is_type(&self, path_type: &str) -> bool {
        self.path_type == path_type
    }

    pub fn is_temporarily_blocked(&self) -> bool {
        self.temporary_block.is_some()
    }

    /// Permanently or temporarily blocked.
    pub fn is_currently_blocked(&self) -> bool {
        self.blocked || self.temporary_block.is_some()
    }

    pub fn blockage_info(&self) -> String {
        match (&self.temporary_block, self.blocked) {
            (Some(block), _) => format!("Temporarily blocked: {}", block.reason),
            (None, true) => "Permanently blocked".to_string(),
            (None, false) => "Not blocked".to_string(),
        }
    }

    /// The opposite direction of this corridor: same distance, type, width,
    /// accessibility and permanent block, with directional phrases swapped.
    /// Temporary blocks are not carried over.
    pub fn mirrored(&self) -> Path {
        Path {
            from: self.to.clone(),
            to: self.from.clone(),
            distance: self.distance,
            instruction: mirror_instruction(&self.instruction),
            landmark_instruction: mirror_instruction(&self.landmark_instruction),
            path_type: self.path_type.clone(),
            width: self.width,
            accessible: self.accessible,
            blocked: self.blocked,
            temporary_block: None,
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_currently_blocked() {
            " [BLOCKED]"
        } else if !self.accessible {
            " [NOT ACCESSIBLE]"
        } else {
            ""
        };
        write!(
            f,
            "Path{{{} -> {}: {:.1}m ({}){}}}",
            self.from, self.to, self.distance, self.path_type, status
        )
    }
}

// ============================================================================
// Instruction Text
// ============================================================================

/// Phrase swaps applied when mirroring. Longer phrases come first so that
/// "Go straight back" is not read as "Go straight".
const MIRROR_PAIRS: &[(&str, &str)] = &[
    ("Go straight back", "Go straight"),
    ("go straight back", "go straight"),
    ("Go straight", "Go straight back"),
    ("go straight", "go straight back"),
    ("Turn left", "Turn right"),
    ("Turn right", "Turn left"),
    ("turn left", "turn right"),
    ("turn right", "turn left"),
    ("on your left", "on your right"),
    ("on your right", "on your left"),
    ("up to", "down to"),
    ("down to", "up to"),
    ("away from", "towards"),
    ("towards", "away from"),
    ("behind you", "ahead"),
    ("ahead", "behind you"),
];

/// Swaps directional phrases in a single left-to-right pass, so a swapped
/// phrase is never swapped back.
pub fn mirror_instruction(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut rest = text;
    'scan: while !rest.is_empty() {
        for (from, to) in MIRROR_PAIRS {
            if let Some(tail) = rest.strip_prefix(from) {
                out.push_str(to);
                rest = tail;
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

fn landmark_instruction(from: &Room, to: &Room, path_type: &str) -> String {
    let mut text = match to.landmarks.first() {
        Some(landmark) => format!("Head towards {}", landmark),
        None => match to.room_type() {
            RoomType::Elevator => "Walk to the elevators".to_string(),
            RoomType::Restroom => "Go to the restrooms".to_string(),
            RoomType::Stairs => "Take the stairs".to_string(),
            RoomType::Cafeteria => "Head to the cafeteria area".to_string(),
            RoomType::Library => "Go to the library section".to_string(),
            RoomType::EmergencyExit => "Proceed to the emergency exit".to_string(),
            _ => format!("Go to {}", to.name),
        },
    };

    let direction = if to.floor > from.floor { "up" } else { "down" };
    match path_type {
        ELEVATOR => {
            text.push_str(" and take the elevator");
            if from.floor != to.floor {
                text.push_str(&format!(" {} to floor {}", direction, to.floor));
            }
        }
        STAIRS => {
            text.push_str(" via the staircase");
            if from.floor != to.floor {
                text.push_str(&format!(" going {} to floor {}", direction, to.floor));
            }
        }
        RAMP => text.push_str(" using the ramp"),
        _ => {}
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str, room_type: RoomType, floor: i32) -> Room {
        Room::new(id, id, "", room_type, floor)
    }

    #[test]
    fn test_mirror_swaps_left_and_right() {
        assert_eq!(mirror_instruction("Turn left at the desk"), "Turn right at the desk");
        assert_eq!(mirror_instruction("Turn right, then turn left"), "Turn left, then turn right");
    }

    #[test]
    fn test_mirror_other_phrases() {
        assert_eq!(
            mirror_instruction("Take the elevator up to floor 2"),
            "Take the elevator down to floor 2"
        );
        assert_eq!(mirror_instruction("Head towards the lobby"), "Head away from the lobby");
        assert_eq!(
            mirror_instruction("Go straight, exit is ahead"),
            "Go straight back, exit is behind you"
        );
        assert_eq!(mirror_instruction(""), "");
    }

    #[test]
    fn test_mirror_handles_non_ascii() {
        assert_eq!(mirror_instruction("Café → turn left"), "Café → turn right");
    }

    #[test]
    fn test_stairs_default_inaccessible() {
        let a = room("A", RoomType::Corridor, 1);
        let b = room("B", RoomType::Corridor, 2);
        let path = Path::with_type(&a, &b, 3.0, "Climb", STAIRS);
        assert!(!path.accessible);
        assert!(Path::new(&a, &b, 3.0, "Walk").accessible);
    }

    #[test]
    fn test_landmark_instruction_uses_first_landmark() {
        let a = room("A", RoomType::Lobby, 1);
        let b = room("B", RoomType::Office, 1).with_landmark("Fountain").with_landmark("Plant");
        let path = Path::new(&a, &b, 3.0, "Walk");
        assert_eq!(path.landmark_instruction, "Head towards Fountain");
    }

    #[test]
    fn test_landmark_instruction_floor_change() {
        let a = room("E1", RoomType::Elevator, 1);
        let b = room("E3", RoomType::Elevator, 3);
        let up = Path::with_type(&a, &b, 1.0, "Ride", ELEVATOR);
        assert_eq!(
            up.landmark_instruction,
            "Walk to the elevators and take the elevator up to floor 3"
        );
        let down = Path::with_type(&b, &a, 1.0, "Ride", STAIRS);
        assert_eq!(
            down.landmark_instruction,
            "Walk to the elevators via the staircase going down to floor 1"
        );
    }

    #[test]
    fn test_mirrored_keeps_structure() {
        let a = room("A", RoomType::Corridor, 1);
        let b = room("B", RoomType::Office, 1);
        let mut path = Path::with_type(&a, &b, 7.5, "Turn left", RAMP)
            .with_width(3.0)
            .with_blocked(true);
        path.temporary_block = Some(TemporaryBlock::new("cleaning", None));
        let back = path.mirrored();
        assert_eq!(back.key(), EdgeKey::new("B", "A"));
        assert_eq!(back.distance, 7.5);
        assert_eq!(back.width, 3.0);
        assert_eq!(back.path_type, RAMP);
        assert_eq!(back.instruction, "Turn right");
        assert!(back.blocked);
        assert!(back.temporary_block.is_none());
    }

    #[test]
    fn test_blockage_info() {
        let a = room("A", RoomType::Corridor, 1);
        let b = room("B", RoomType::Corridor, 1);
        let mut path = Path::new(&a, &b, 1.0, "");
        assert_eq!(path.blockage_info(), "Not blocked");
        path.blocked = true;
        assert_eq!(path.blockage_info(), "Permanently blocked");
        path.temporary_block = Some(TemporaryBlock::new("Maintenance", None));
        assert_eq!(path.blockage_info(), "Temporarily blocked: Maintenance");
    }

    #[test]
    fn test_temporary_block_expiry() {
        let block = TemporaryBlock::new("crowd", Some(Duration::from_secs(30)));
        assert!(!block.is_expired(block.blocked_at));
        assert!(block.is_expired(block.blocked_at + Duration::from_secs(30)));
        let later = SystemTime::now() + Duration::from_secs(3600);
        assert!(!TemporaryBlock::new("x", None).is_expired(later));
    }
}
