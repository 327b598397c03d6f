//! Built-in demonstration maps.
//!
//! The data here is fixed, so a construction failure is a bug in this file
//! and panics.

use crate::graph::NavigationGraph;
use crate::path::{CORRIDOR, ELEVATOR, Path, STAIRS};
use crate::room::{Room, RoomType};

struct RoomSpec {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    room_type: RoomType,
    floor: i32,
    /// Feature keys, each set to "yes".
    features: &'static [&'static str],
    landmarks: &'static [&'static str],
}

impl RoomSpec {
    fn build(&self) -> Room {
        let mut room = Room::new(self.id, self.name, self.description, self.room_type, self.floor);
        for feature in self.features {
            room.features.insert(feature.to_string(), "yes".to_string());
        }
        room.landmarks = self.landmarks.iter().map(|l| l.to_string()).collect();
        room
    }
}

/// (from, to, distance, instruction, path type, width)
type CorridorSpec = (&'static str, &'static str, f64, &'static str, &'static str, f64);

fn build(
    name: &str,
    description: &str,
    rooms: &[RoomSpec],
    corridors: &[CorridorSpec],
) -> NavigationGraph {
    let mut graph = NavigationGraph::new(name, description);
    for entry in rooms {
        graph
            .add_room(entry.build())
            .unwrap_or_else(|err| panic!("sample map {name}: {err}"));
    }
    for &(from, to, distance, instruction, path_type, width) in corridors {
        let (Some(a), Some(b)) = (graph.room(from), graph.room(to)) else {
            panic!("sample map {name}: corridor {from} -> {to} names an unknown room");
        };
        let path = Path::with_type(a, b, distance, instruction, path_type).with_width(width);
        graph
            .add_path(path)
            .unwrap_or_else(|err| panic!("sample map {name}: {err}"));
    }
    graph
}

// ============================================================================
// Medical Center
// ============================================================================

const MEDICAL_ROOMS: &[RoomSpec] = &[
    // Floor 1
    RoomSpec {
        id: "ENT",
        name: "Main Entrance",
        description: "Primary building entrance with automatic doors",
        room_type: RoomType::Entrance,
        floor: 1,
        features: &["wheelchair_access", "automatic_doors", "audio_announcement"],
        landmarks: &["Information Desk", "Security Station"],
    },
    RoomSpec {
        id: "LOB",
        name: "Main Lobby",
        description: "Central reception area with seating",
        room_type: RoomType::Lobby,
        floor: 1,
        features: &["wheelchair_access", "seating_available"],
        landmarks: &["Reception Desk", "Directory Board", "Waiting Area"],
    },
    RoomSpec {
        id: "REC",
        name: "Reception Desk",
        description: "Main information and registration point",
        room_type: RoomType::Reception,
        floor: 1,
        features: &["wheelchair_access", "hearing_loop"],
        landmarks: &["Information Counter"],
    },
    RoomSpec {
        id: "ELV1",
        name: "Main Elevator Bank",
        description: "Primary elevator access to all floors",
        room_type: RoomType::Elevator,
        floor: 1,
        features: &[
            "wheelchair_access",
            "braille_buttons",
            "audio_announcement",
            "emergency_phone",
        ],
        landmarks: &["Elevator Control Panel"],
    },
    RoomSpec {
        id: "REST1",
        name: "Ground Floor Restroom",
        description: "Accessible restroom facilities",
        room_type: RoomType::Restroom,
        floor: 1,
        features: &["wheelchair_access", "grab_bars", "baby_changing"],
        landmarks: &["Accessibility Sign"],
    },
    RoomSpec {
        id: "CAF",
        name: "Hospital Cafeteria",
        description: "Dining area with variety of food options",
        room_type: RoomType::Cafeteria,
        floor: 1,
        features: &["wheelchair_access", "varied_seating"],
        landmarks: &["Food Court", "Vending Machines"],
    },
    RoomSpec {
        id: "PHAR",
        name: "Hospital Pharmacy",
        description: "Prescription and medical supplies",
        room_type: RoomType::Office,
        floor: 1,
        features: &["wheelchair_access"],
        landmarks: &["Prescription Counter"],
    },
    RoomSpec {
        id: "EXIT1",
        name: "Emergency Exit A",
        description: "Primary emergency exit",
        room_type: RoomType::EmergencyExit,
        floor: 1,
        features: &["wheelchair_access", "emergency_lighting"],
        landmarks: &[],
    },
    // Floor 2
    RoomSpec {
        id: "ELV2",
        name: "Second Floor Elevator",
        description: "Elevator access on second floor",
        room_type: RoomType::Elevator,
        floor: 2,
        features: &["wheelchair_access", "braille_buttons", "audio_announcement"],
        landmarks: &[],
    },
    RoomSpec {
        id: "WAIT2",
        name: "Second Floor Waiting Area",
        description: "Patient waiting area with seating",
        room_type: RoomType::WaitingArea,
        floor: 2,
        features: &["wheelchair_access", "comfortable_seating"],
        landmarks: &["TV Screen", "Magazine Rack"],
    },
    RoomSpec {
        id: "CONS1",
        name: "Consultation Room 201",
        description: "Medical consultation room",
        room_type: RoomType::Office,
        floor: 2,
        features: &["wheelchair_access", "privacy_assured"],
        landmarks: &[],
    },
    RoomSpec {
        id: "CONS2",
        name: "Consultation Room 202",
        description: "Medical consultation room",
        room_type: RoomType::Office,
        floor: 2,
        features: &["wheelchair_access", "privacy_assured"],
        landmarks: &[],
    },
    RoomSpec {
        id: "LAB",
        name: "Medical Laboratory",
        description: "Blood tests and medical analysis",
        room_type: RoomType::Office,
        floor: 2,
        features: &["wheelchair_access"],
        landmarks: &["Sample Collection Window"],
    },
    RoomSpec {
        id: "REST2",
        name: "Second Floor Restroom",
        description: "Accessible restroom facilities",
        room_type: RoomType::Restroom,
        floor: 2,
        features: &["wheelchair_access", "grab_bars"],
        landmarks: &[],
    },
    RoomSpec {
        id: "STAIR2",
        name: "Stairwell B",
        description: "Emergency stairs to all floors",
        room_type: RoomType::Stairs,
        floor: 2,
        features: &["emergency_lighting", "handrails"],
        landmarks: &[],
    },
    // Floor 3
    RoomSpec {
        id: "ELV3",
        name: "Third Floor Elevator",
        description: "Elevator access on third floor",
        room_type: RoomType::Elevator,
        floor: 3,
        features: &["wheelchair_access", "braille_buttons", "audio_announcement"],
        landmarks: &[],
    },
    RoomSpec {
        id: "ICU",
        name: "Intensive Care Unit",
        description: "Critical care medical unit",
        room_type: RoomType::Icu,
        floor: 3,
        features: &["restricted_access", "quiet_zone"],
        landmarks: &["Nurses Station"],
    },
    RoomSpec {
        id: "CONF",
        name: "Medical Conference Room",
        description: "Large meeting room for medical staff",
        room_type: RoomType::ConferenceRoom,
        floor: 3,
        features: &["wheelchair_access", "av_equipment"],
        landmarks: &["Projection Screen"],
    },
    RoomSpec {
        id: "LIB",
        name: "Medical Library",
        description: "Medical reference and study area",
        room_type: RoomType::Library,
        floor: 3,
        features: &["wheelchair_access", "quiet_study"],
        landmarks: &["Reference Desk", "Computer Terminals"],
    },
    RoomSpec {
        id: "ADMIN",
        name: "Administration Office",
        description: "Hospital administration",
        room_type: RoomType::Office,
        floor: 3,
        features: &["wheelchair_access"],
        landmarks: &["Reception Window"],
    },
    RoomSpec {
        id: "EXIT3",
        name: "Emergency Exit C",
        description: "Third floor emergency exit",
        room_type: RoomType::EmergencyExit,
        floor: 3,
        features: &["wheelchair_access", "emergency_lighting"],
        landmarks: &[],
    },
];

const MEDICAL_CORRIDORS: &[CorridorSpec] = &[
    // Floor 1
    ("ENT", "LOB", 8.0, "Walk straight through the main doors into the lobby", CORRIDOR, 4.0),
    ("LOB", "REC", 5.0, "Head towards the reception desk on your left", CORRIDOR, 3.0),
    (
        "LOB",
        "ELV1",
        12.0,
        "Walk towards the elevator bank on the right side of the lobby",
        CORRIDOR,
        3.0,
    ),
    (
        "LOB",
        "REST1",
        15.0,
        "Follow the corridor to the left, restroom is on your right",
        CORRIDOR,
        2.5,
    ),
    (
        "LOB",
        "CAF",
        20.0,
        "Walk straight past the reception desk, cafeteria entrance is ahead",
        CORRIDOR,
        3.0,
    ),
    ("CAF", "PHAR", 8.0, "Exit cafeteria and turn left, pharmacy is next door", CORRIDOR, 2.0),
    (
        "REST1",
        "EXIT1",
        10.0,
        "Continue down the corridor, emergency exit is at the end",
        CORRIDOR,
        2.5,
    ),
    // Elevators
    ("ELV1", "ELV2", 0.5, "Take the elevator up to the second floor", ELEVATOR, 2.0),
    ("ELV2", "ELV3", 0.5, "Take the elevator up to the third floor", ELEVATOR, 2.0),
    ("ELV1", "ELV3", 1.0, "Take the elevator directly to the third floor", ELEVATOR, 2.0),
    // Floor 2
    ("ELV2", "WAIT2", 6.0, "Exit elevator and turn right, waiting area is ahead", CORRIDOR, 3.0),
    ("WAIT2", "CONS1", 8.0, "Walk down the corridor, room 201 is on your left", CORRIDOR, 2.5),
    ("CONS1", "CONS2", 4.0, "Continue down the corridor, room 202 is next door", CORRIDOR, 2.5),
    ("WAIT2", "LAB", 12.0, "Walk towards the lab, follow signs for blood work", CORRIDOR, 2.5),
    (
        "ELV2",
        "REST2",
        10.0,
        "Turn left from elevator, restroom is at the end of the hall",
        CORRIDOR,
        2.5,
    ),
    (
        "ELV2",
        "STAIR2",
        15.0,
        "Walk to the far end of the corridor, stairs are on the right",
        CORRIDOR,
        2.0,
    ),
    // Floor 3
    (
        "ELV3",
        "ICU",
        8.0,
        "Turn left from elevator, ICU entrance is through the double doors",
        CORRIDOR,
        3.0,
    ),
    (
        "ELV3",
        "CONF",
        10.0,
        "Walk straight from elevator, conference room is on your right",
        CORRIDOR,
        2.5,
    ),
    (
        "CONF",
        "LIB",
        12.0,
        "Continue down the corridor, library entrance is on your left",
        CORRIDOR,
        2.5,
    ),
    (
        "LIB",
        "ADMIN",
        6.0,
        "Walk towards the administration area, office is at the end",
        CORRIDOR,
        2.0,
    ),
    (
        "ELV3",
        "EXIT3",
        18.0,
        "Walk to the end of the corridor, emergency exit is on your right",
        CORRIDOR,
        2.5,
    ),
    // Stairs, not wheelchair accessible
    (
        "LOB",
        "STAIR2",
        25.0,
        "Take the stairs to the second floor (not wheelchair accessible)",
        STAIRS,
        1.5,
    ),
    (
        "STAIR2",
        "EXIT3",
        20.0,
        "Continue up the stairs to the third floor emergency exit",
        STAIRS,
        1.5,
    ),
    // Backup corridors
    (
        "CAF",
        "ELV1",
        18.0,
        "Walk back towards the lobby, elevators are on your right",
        CORRIDOR,
        3.0,
    ),
    (
        "CONS2",
        "REST2",
        15.0,
        "Walk towards the elevator area, restroom is on your left",
        CORRIDOR,
        2.5,
    ),
];

/// The three-floor medical center: 21 rooms, elevator banks on every floor,
/// a stairwell, and emergency exits on the first and third floors.
pub fn medical_center() -> NavigationGraph {
    let mut graph = build(
        "Medical Center Building",
        "Multi-floor medical facility with comprehensive navigation",
        MEDICAL_ROOMS,
        MEDICAL_CORRIDORS,
    );
    for (id, width) in [("ENT", 4.0), ("LOB", 6.0)] {
        graph
            .update_room(id, |room| room.width = width)
            .expect("sample room exists");
    }
    graph
}

// ============================================================================
// Simple Building
// ============================================================================

const SIMPLE_ROOMS: &[RoomSpec] = &[
    RoomSpec {
        id: "ENT",
        name: "Entrance",
        description: "Building entrance",
        room_type: RoomType::Entrance,
        floor: 1,
        features: &["wheelchair_access"],
        landmarks: &["Reception Desk"],
    },
    RoomSpec {
        id: "HALL",
        name: "Main Hallway",
        description: "Central corridor",
        room_type: RoomType::Corridor,
        floor: 1,
        features: &[],
        landmarks: &["Directory Board"],
    },
    RoomSpec {
        id: "OFF1",
        name: "Office A",
        description: "First office",
        room_type: RoomType::Office,
        floor: 1,
        features: &[],
        landmarks: &[],
    },
    RoomSpec {
        id: "OFF2",
        name: "Office B",
        description: "Second office",
        room_type: RoomType::Office,
        floor: 1,
        features: &[],
        landmarks: &[],
    },
    RoomSpec {
        id: "REST",
        name: "Restroom",
        description: "Bathroom facilities",
        room_type: RoomType::Restroom,
        floor: 1,
        features: &["wheelchair_access", "grab_bars"],
        landmarks: &[],
    },
    RoomSpec {
        id: "EXIT",
        name: "Emergency Exit",
        description: "Emergency exit",
        room_type: RoomType::EmergencyExit,
        floor: 1,
        features: &[],
        landmarks: &[],
    },
];

const SIMPLE_CORRIDORS: &[CorridorSpec] = &[
    ("ENT", "HALL", 5.0, "Go straight down the main hallway", CORRIDOR, 2.0),
    ("HALL", "OFF1", 8.0, "Turn left, office A is on your right", CORRIDOR, 2.0),
    ("HALL", "OFF2", 10.0, "Turn right, office B is on your left", CORRIDOR, 2.0),
    ("HALL", "REST", 6.0, "Walk straight, restroom is on your left", CORRIDOR, 2.0),
    ("REST", "EXIT", 4.0, "Continue to the end of the hall, exit is on your right", CORRIDOR, 2.0),
    ("OFF1", "OFF2", 12.0, "Walk across the hallway to office B", CORRIDOR, 2.0),
];

/// A single-floor, six-room building for tests and demos.
pub fn simple_building() -> NavigationGraph {
    build(
        "Simple Test Building",
        "Single floor building for testing",
        SIMPLE_ROOMS,
        SIMPLE_CORRIDORS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medical_center_shape() {
        let graph = medical_center();
        assert_eq!(graph.room_count(), 21);
        assert_eq!(graph.path_count(), MEDICAL_CORRIDORS.len());
        assert_eq!(graph.floors(), vec![1, 2, 3]);
        assert_eq!(graph.room("LOB").unwrap().width, 6.0);
        assert_eq!(graph.room("ENT").unwrap().width, 4.0);
        assert!(!graph.room("STAIR2").unwrap().accessible);
        assert!(graph.room("EXIT3").unwrap().is_exit());
        assert!(!graph.path("STAIR2", "LOB").unwrap().accessible);
    }

    #[test]
    fn test_simple_building_shape() {
        let graph = simple_building();
        assert_eq!(graph.room_count(), 6);
        assert_eq!(graph.path_count(), 6);
        assert_eq!(graph.room("ENT").unwrap().width, 2.0);
        assert_eq!(
            graph.path("OFF1", "HALL").unwrap().instruction,
            "Turn right, office A is on your left"
        );
    }
}
