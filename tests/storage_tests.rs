//! Storage integration tests: maps and preferences through the file store.

mod fixtures;

use std::time::Duration;

use fixtures::BuildingBuilder;
use indoor_router::sample;
use indoor_router::storage::{FileStore, StorageConfig};
use indoor_router::{TraversalPolicy, UserPreferences, find_emergency_exit, find_shortest_path};

fn temp_store() -> (tempfile::TempDir, FileStore) {
    fixtures::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(StorageConfig {
        data_dir: dir.path().to_path_buf(),
    });
    (dir, store)
}

// ============================================================================
// Maps
// ============================================================================

#[test]
fn test_medical_center_survives_save_and_load() {
    let (_dir, store) = temp_store();
    let original = sample::medical_center();
    let path = store.save_map(&original, "medical").unwrap();
    assert!(path.ends_with("medical_map.txt"));

    let loaded = store.read_map("medical").unwrap();
    assert_eq!(loaded.name(), original.name());
    assert_eq!(loaded.stats(), original.stats());

    for room in original.rooms() {
        assert_eq!(loaded.room(room.id()), Some(room), "room {}", room.id());
    }
}

#[test]
fn test_loaded_map_routes_identically() {
    let (_dir, store) = temp_store();
    let original = sample::medical_center();
    store.save_map(&original, "medical").unwrap();
    let loaded = store.read_map("medical").unwrap();

    let pairs = [("ENT", "LAB"), ("ICU", "PHAR"), ("CONS2", "EXIT1"), ("ADMIN", "REST1")];
    for policy in TraversalPolicy::ALL {
        for (start, end) in pairs {
            let before = find_shortest_path(&original, start, end, policy, None).unwrap();
            let after = find_shortest_path(&loaded, start, end, policy, None).unwrap();
            // equal-cost ties may break differently once adjacency is rebuilt
            let (a, b) = (before.total_cost(), after.total_cost());
            assert!(a == b || (a - b).abs() < 1e-9, "{policy} {start}->{end}: {a} vs {b}");
            assert_eq!(before.is_empty(), after.is_empty());
        }
    }
    let exit_before = find_emergency_exit(&original, "LIB").unwrap();
    let exit_after = find_emergency_exit(&loaded, "LIB").unwrap();
    assert_eq!(exit_before.destination(), exit_after.destination());
    assert!((exit_before.total_cost() - exit_after.total_cost()).abs() < 1e-9);
}

#[test]
fn test_permanent_blocks_persist_temporary_blocks_do_not() {
    let (_dir, store) = temp_store();
    let mut graph = sample::simple_building();
    graph.set_path_blocked("OFF1", "OFF2", true).unwrap();
    graph
        .simulate_obstacle("HALL", "REST", "Wet floor", Duration::from_secs(300))
        .unwrap();
    graph.block_room("OFF2", true).unwrap();
    store.save_map(&graph, "simple").unwrap();

    let loaded = store.read_map("simple").unwrap();
    assert!(loaded.path("OFF2", "OFF1").unwrap().blocked);
    assert!(loaded.room("OFF2").unwrap().blocked);
    assert!(loaded.temporarily_blocked_paths().is_empty());
    assert!(!loaded.path("HALL", "REST").unwrap().is_currently_blocked());
}

#[test]
fn test_awkward_text_round_trips() {
    let (_dir, store) = temp_store();
    let mut graph =
        BuildingBuilder::new("Wing | East").room("A").room("B").corridor("A", "B", 3.125).build();
    graph
        .update_room("A", |room| {
            room.name = "Back\\Office | 2".to_string();
            room.description = "line one\nline two".to_string();
            room.landmarks.push("Plant | big".to_string());
        })
        .unwrap();
    store.save_map(&graph, "east").unwrap();

    let loaded = store.read_map("east").unwrap();
    assert_eq!(loaded.name(), "Wing | East");
    assert_eq!(loaded.room("A"), graph.room("A"));
    assert_eq!(loaded.path("A", "B").unwrap().distance, 3.125);
}

#[test]
fn test_list_and_missing_maps() {
    let (_dir, store) = temp_store();
    store.save_map(&sample::simple_building(), "simple").unwrap();
    store.save_map(&sample::medical_center(), "medical").unwrap();
    assert_eq!(store.list_saved_maps(), vec!["medical".to_string(), "simple".to_string()]);

    let empty = store.load_map("atlantis");
    assert_eq!(empty.room_count(), 0);
    assert!(store.read_map("atlantis").is_err());
}

// ============================================================================
// Preferences
// ============================================================================

#[test]
fn test_preferences_survive_save_and_load() {
    let (_dir, store) = temp_store();
    let mut prefs = UserPreferences::new("dana");
    prefs.preferred_policy = TraversalPolicy::VisuallyImpaired;
    prefs.use_landmark_instructions = false;
    prefs.avoid_path_type("stairs");
    for destination in ["Lab", "Library", "Cafeteria"] {
        prefs.add_to_history(destination);
    }
    prefs.set_custom("prefer_wide_paths", true);

    store.save_preferences(&prefs).unwrap();
    let loaded = store.load_preferences("dana");
    assert_eq!(loaded, prefs);
    assert_eq!(loaded.history().next(), Some("Cafeteria"));
    assert!(loaded.prefers_wide_paths());
}

#[test]
fn test_history_keeps_ten_most_recent() {
    let (_dir, store) = temp_store();
    let mut prefs = UserPreferences::new("eli");
    for i in 0..15 {
        prefs.add_to_history(format!("Room {i}"));
    }
    store.save_preferences(&prefs).unwrap();

    let history: Vec<String> = store
        .load_preferences("eli")
        .history()
        .map(str::to_string)
        .collect();
    assert_eq!(history.len(), 10);
    assert_eq!(history.first().map(String::as_str), Some("Room 14"));
    assert_eq!(history.last().map(String::as_str), Some("Room 5"));
}
