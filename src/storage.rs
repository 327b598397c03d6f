//! Line-oriented text storage for maps and user preferences.
//!
//! Maps are pipe-delimited records, one per line:
//!
//! ```text
//! MAP|name|description
//! ROOM|id|name|description|category|floor|accessible|blocked|width|emergencyExit
//! FEATURE|roomId|key|value
//! LANDMARK|roomId|text
//! PATH|fromId|toId|distance|instruction|landmarkInstruction|pathType|accessible|blocked|width
//! ```
//!
//! Only one direction of each corridor is written; loading goes through
//! [`NavigationGraph::add_path`], which rebuilds the reverse edge. Temporary
//! blocks are runtime state and are not stored.
//!
//! Preferences are `KEY=value` lines. Lines starting with `#` are comments in
//! both formats.
//!
//! The `save_*` and `read_*` methods report failures. The `load_*` methods
//! log them and fall back to an empty graph or default preferences.

use std::fs;
use std::io;
use std::path::{Path as FsPath, PathBuf};

use tracing::{debug, info, warn};

use crate::error::NavError;
use crate::graph::NavigationGraph;
use crate::path::Path;
use crate::policy::TraversalPolicy;
use crate::preferences::UserPreferences;
use crate::room::{Room, RoomType};

const MAP_SUFFIX: &str = "_map.txt";
const PREFERENCES_SUFFIX: &str = "_preferences.txt";
const CUSTOM_PREFIX: &str = "CUSTOM_";

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileStore {
    config: StorageConfig,
}

impl FileStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn data_dir(&self) -> &FsPath {
        &self.config.data_dir
    }

    pub fn map_path(&self, map_name: &str) -> PathBuf {
        self.config.data_dir.join(format!("{map_name}{MAP_SUFFIX}"))
    }

    pub fn preferences_path(&self, user_id: &str) -> PathBuf {
        self.config.data_dir.join(format!("{user_id}{PREFERENCES_SUFFIX}"))
    }

    // ========================================================================
    // Maps
    // ========================================================================

    pub fn save_map(&self, graph: &NavigationGraph, map_name: &str) -> Result<PathBuf, NavError> {
        let path = self.map_path(map_name);
        check_file_stem(map_name, &path)?;
        self.write_file(&path, &write_map(graph))?;
        info!(map = map_name, path = %path.display(), "map saved");
        Ok(path)
    }

    pub fn read_map(&self, map_name: &str) -> Result<NavigationGraph, NavError> {
        let path = self.map_path(map_name);
        check_file_stem(map_name, &path)?;
        let text = fs::read_to_string(&path).map_err(|e| NavError::persistence(&path, e))?;
        let graph = parse_map(map_name, &text);
        info!(
            map = map_name,
            rooms = graph.room_count(),
            paths = graph.path_count(),
            "map loaded"
        );
        Ok(graph)
    }

    /// Reads a stored map, or returns an empty graph if it cannot be read.
    pub fn load_map(&self, map_name: &str) -> NavigationGraph {
        self.read_map(map_name).unwrap_or_else(|err| {
            warn!(map = map_name, error = %err, "could not load map, starting empty");
            let mut graph = NavigationGraph::default();
            graph.set_name(map_name);
            graph
        })
    }

    /// Names of the stored maps, sorted.
    pub fn list_saved_maps(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.config.data_dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = %self.config.data_dir.display(), error = %err, "no saved maps");
                return Vec::new();
            }
        };
        let mut maps: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                name.strip_suffix(MAP_SUFFIX).map(str::to_string)
            })
            .filter(|name| !name.is_empty())
            .collect();
        maps.sort();
        maps
    }

    // ========================================================================
    // Preferences
    // ========================================================================

    pub fn save_preferences(&self, preferences: &UserPreferences) -> Result<PathBuf, NavError> {
        let path = self.preferences_path(&preferences.user_id);
        check_file_stem(&preferences.user_id, &path)?;
        self.write_file(&path, &write_preferences(preferences))?;
        info!(user = %preferences.user_id, path = %path.display(), "preferences saved");
        Ok(path)
    }

    pub fn read_preferences(&self, user_id: &str) -> Result<UserPreferences, NavError> {
        let path = self.preferences_path(user_id);
        check_file_stem(user_id, &path)?;
        let text = fs::read_to_string(&path).map_err(|e| NavError::persistence(&path, e))?;
        Ok(parse_preferences(user_id, &text))
    }

    /// Reads stored preferences, or returns defaults for `user_id`.
    pub fn load_preferences(&self, user_id: &str) -> UserPreferences {
        match self.read_preferences(user_id) {
            Ok(preferences) => preferences,
            Err(NavError::Persistence { source, .. })
                if source.kind() == io::ErrorKind::NotFound =>
            {
                info!(user = user_id, "no stored preferences, using defaults");
                UserPreferences::new(user_id)
            }
            Err(err) => {
                warn!(user = user_id, error = %err, "could not load preferences, using defaults");
                UserPreferences::new(user_id)
            }
        }
    }

    fn write_file(&self, path: &FsPath, contents: &str) -> Result<(), NavError> {
        fs::create_dir_all(&self.config.data_dir)
            .map_err(|e| NavError::persistence(&self.config.data_dir, e))?;
        fs::write(path, contents).map_err(|e| NavError::persistence(path, e))
    }
}

/// Map names and user ids become file names; they may not escape the data
/// directory.
fn check_file_stem(stem: &str, path: &FsPath) -> Result<(), NavError> {
    if stem.is_empty() || stem.contains(['/', '\\']) || stem == "." || stem == ".." {
        return Err(NavError::persistence(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, format!("invalid name {stem:?}")),
        ));
    }
    Ok(())
}

// ============================================================================
// Map Format
// ============================================================================

pub fn write_map(graph: &NavigationGraph) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Navigation Map: {}\n\n", escape(graph.name())));
    out.push_str(&format!("MAP|{}|{}\n", escape(graph.name()), escape(graph.description())));

    out.push_str("\n# Rooms\n");
    for room in graph.rooms() {
        out.push_str(&format!(
            "ROOM|{}|{}|{}|{}|{}|{}|{}|{}|{}\n",
            escape(room.id()),
            escape(&room.name),
            escape(&room.description),
            room.room_type().persisted_name(),
            room.floor,
            room.accessible,
            room.blocked,
            room.width,
            room.emergency_exit
        ));
        for (key, value) in &room.features {
            out.push_str(&format!(
                "FEATURE|{}|{}|{}\n",
                escape(room.id()),
                escape(key),
                escape(value)
            ));
        }
        for landmark in &room.landmarks {
            out.push_str(&format!("LANDMARK|{}|{}\n", escape(room.id()), escape(landmark)));
        }
    }

    out.push_str("\n# Paths\n");
    for path in graph.paths().filter(|p| p.from_id() < p.to_id()) {
        out.push_str(&format!(
            "PATH|{}|{}|{}|{}|{}|{}|{}|{}|{}\n",
            escape(path.from_id()),
            escape(path.to_id()),
            path.distance,
            escape(&path.instruction),
            escape(&path.landmark_instruction),
            escape(&path.path_type),
            path.accessible,
            path.blocked,
            path.width
        ));
    }
    out
}

/// Parses a stored map. Malformed or unknown records are logged and skipped.
pub fn parse_map(map_name: &str, text: &str) -> NavigationGraph {
    let mut graph = NavigationGraph::default();
    graph.set_name(map_name);

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let fields = split_record(line);
        if let Err(err) = apply_record(&mut graph, &fields, line_no) {
            warn!(map = map_name, error = %err, "skipping map record");
        }
    }
    graph
}

fn apply_record(
    graph: &mut NavigationGraph,
    fields: &[String],
    line: usize,
) -> Result<(), NavError> {
    let parse_err = |reason: String| NavError::Parse { line, reason };
    let expect_fields = |n: usize| {
        if fields.len() < n {
            Err(parse_err(format!(
                "{} record needs {} fields, found {}",
                fields[0],
                n,
                fields.len()
            )))
        } else {
            Ok(())
        }
    };

    match fields[0].as_str() {
        "MAP" => {
            expect_fields(3)?;
            graph.set_name(fields[1].clone());
            graph.set_description(fields[2].clone());
        }
        "ROOM" => {
            expect_fields(10)?;
            let room_type: RoomType = fields[4].parse().map_err(|e| parse_err(format!("{e}")))?;
            let mut room = Room::new(
                fields[1].clone(),
                fields[2].clone(),
                fields[3].clone(),
                room_type,
                parse_field(&fields[5], "floor", line)?,
            );
            room.accessible = parse_field(&fields[6], "accessible", line)?;
            room.blocked = parse_field(&fields[7], "blocked", line)?;
            room.width = parse_field(&fields[8], "width", line)?;
            room.emergency_exit = parse_field(&fields[9], "emergency exit", line)?;
            graph.add_room(room).map_err(|e| parse_err(e.to_string()))?;
        }
        "FEATURE" => {
            expect_fields(4)?;
            let (key, value) = (fields[2].clone(), fields[3].clone());
            graph
                .update_room(&fields[1], |room| {
                    room.features.insert(key, value);
                })
                .map_err(|e| parse_err(e.to_string()))?;
        }
        "LANDMARK" => {
            expect_fields(3)?;
            let landmark = fields[2].clone();
            graph
                .update_room(&fields[1], |room| room.landmarks.push(landmark))
                .map_err(|e| parse_err(e.to_string()))?;
        }
        "PATH" => {
            expect_fields(10)?;
            let path = Path::from_parts(
                fields[1].clone(),
                fields[2].clone(),
                parse_field(&fields[3], "distance", line)?,
                fields[4].clone(),
                fields[5].clone(),
                fields[6].clone(),
            )
            .with_accessible(parse_field(&fields[7], "accessible", line)?)
            .with_blocked(parse_field(&fields[8], "blocked", line)?)
            .with_width(parse_field(&fields[9], "width", line)?);
            graph.add_path(path).map_err(|e| parse_err(e.to_string()))?;
        }
        other => return Err(parse_err(format!("unknown record type {other:?}"))),
    }
    Ok(())
}

fn parse_field<T: std::str::FromStr>(raw: &str, what: &str, line: usize) -> Result<T, NavError> {
    raw.trim().parse().map_err(|_| NavError::Parse {
        line,
        reason: format!("invalid {what}: {raw:?}"),
    })
}

// ============================================================================
// Preferences Format
// ============================================================================

pub fn write_preferences(preferences: &UserPreferences) -> String {
    let mut out = format!("# User Preferences: {}\n\n", escape(&preferences.user_id));
    let mut line = |key: &str, value: String| {
        out.push_str(key);
        out.push('=');
        out.push_str(&value);
        out.push('\n');
    };

    line("USER_ID", escape(&preferences.user_id));
    line("PREFERRED_MODE", preferences.preferred_policy.persisted_name().to_string());
    line("TTS_ENABLED", preferences.tts_enabled.to_string());
    line("VOICE_RECOGNITION_ENABLED", preferences.voice_recognition_enabled.to_string());
    line("SPEECH_RATE", preferences.speech_rate().to_string());
    line("USE_LANDMARK_INSTRUCTIONS", preferences.use_landmark_instructions.to_string());
    line("PREFERRED_VOICE", escape(&preferences.preferred_voice));
    line("INSTRUCTION_PAUSE_TIME", preferences.instruction_pause_secs().to_string());

    if !preferences.avoid_room_types.is_empty() {
        let types: Vec<&str> = preferences
            .avoid_room_types
            .iter()
            .map(|t| t.persisted_name())
            .collect();
        line("AVOID_ROOM_TYPES", types.join(","));
    }
    if !preferences.avoid_path_types.is_empty() {
        let types: Vec<String> =
            preferences.avoid_path_types.iter().map(|t| escape_item(t)).collect();
        line("AVOID_PATH_TYPES", types.join(","));
    }
    let history: Vec<String> = preferences.history().map(escape_item).collect();
    if !history.is_empty() {
        line("NAVIGATION_HISTORY", history.join(","));
    }
    for (key, value) in &preferences.custom_settings {
        line(&format!("{CUSTOM_PREFIX}{key}"), escape(value));
    }
    out
}

/// Parses stored preferences for `user_id`. Bad values are logged and the
/// default is kept.
pub fn parse_preferences(user_id: &str, text: &str) -> UserPreferences {
    let mut preferences = UserPreferences::new(user_id);

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            warn!(user = user_id, line = index + 1, "skipping preference line without '='");
            continue;
        };
        if let Err(reason) = apply_preference(&mut preferences, key.trim(), value.trim()) {
            warn!(user = user_id, line = index + 1, key, reason = %reason, "skipping preference");
        }
    }
    preferences
}

fn apply_preference(
    preferences: &mut UserPreferences,
    key: &str,
    value: &str,
) -> Result<(), String> {
    let parse_bool = |v: &str| v.parse::<bool>().map_err(|_| format!("invalid boolean {v:?}"));
    let parse_f64 = |v: &str| v.parse::<f64>().map_err(|_| format!("invalid number {v:?}"));

    match key {
        // the requested id wins over the stored one
        "USER_ID" => {}
        "PREFERRED_MODE" => {
            preferences.preferred_policy =
                value.parse::<TraversalPolicy>().map_err(|e| e.to_string())?
        }
        "TTS_ENABLED" => preferences.tts_enabled = parse_bool(value)?,
        "VOICE_RECOGNITION_ENABLED" => preferences.voice_recognition_enabled = parse_bool(value)?,
        "SPEECH_RATE" => preferences.set_speech_rate(parse_f64(value)?),
        "USE_LANDMARK_INSTRUCTIONS" => preferences.use_landmark_instructions = parse_bool(value)?,
        "PREFERRED_VOICE" => preferences.preferred_voice = unescape(value),
        "INSTRUCTION_PAUSE_TIME" => preferences.set_instruction_pause_secs(parse_f64(value)?),
        "AVOID_ROOM_TYPES" => {
            for item in list_items(value) {
                match item.parse::<RoomType>() {
                    Ok(room_type) => preferences.avoid_room_type(room_type),
                    Err(err) => warn!(
                        user = %preferences.user_id,
                        error = %err,
                        "skipping avoided room type"
                    ),
                }
            }
        }
        "AVOID_PATH_TYPES" => {
            for item in list_items(value) {
                preferences.avoid_path_type(item);
            }
        }
        "NAVIGATION_HISTORY" => {
            for item in list_items(value) {
                preferences.push_older_history(item);
            }
        }
        _ => match key.strip_prefix(CUSTOM_PREFIX) {
            Some(custom) if !custom.is_empty() => preferences.set_custom(custom, unescape(value)),
            _ => return Err("unknown key".to_string()),
        },
    }
    Ok(())
}

/// Splits a comma list on unescaped commas.
fn list_items(value: &str) -> impl Iterator<Item = String> {
    split_unescaped(value, ',')
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
}

// ============================================================================
// Escaping
// ============================================================================

/// Escapes a comma-list item: everything [`escape`] does, plus commas.
pub fn escape_item(text: &str) -> String {
    escape(text).replace(',', "\\,")
}

/// Escapes backslash, pipe, newline and carriage return.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '|' => out.push_str("\\|"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            push_escaped(&mut out, chars.next());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Splits a record on unescaped pipes, unescaping each field.
pub fn split_record(line: &str) -> Vec<String> {
    split_unescaped(line, '|')
}

fn split_unescaped(text: &str, separator: char) -> Vec<String> {
    let mut fields = vec![String::new()];
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == separator {
            fields.push(String::new());
            continue;
        }
        let Some(field) = fields.last_mut() else { break };
        if ch == '\\' {
            push_escaped(field, chars.next());
        } else {
            field.push(ch);
        }
    }
    fields
}

fn push_escaped(out: &mut String, next: Option<char>) {
    match next {
        Some('n') => out.push('\n'),
        Some('r') => out.push('\r'),
        Some(other) => out.push(other),
        None => out.push('\\'),
    }
}
