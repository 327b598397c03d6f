//! Collaborator interfaces for the navigation session.
//!
//! The session reports through a speech sink, reads commands from a command
//! source and asks a resolver where the user is. Concrete front ends (voice,
//! terminal, scanner) implement these; the routing core never depends on
//! their behavior.

use tracing::{error, info, warn};

use crate::room::Room;
use crate::shared::SharedGraph;

/// Fire-and-forget spoken output.
pub trait SpeechSink {
    fn speak(&self, text: &str);

    /// Priority announcement, e.g. an obstacle on the current route.
    fn speak_warning(&self, text: &str) {
        self.speak(text);
    }

    fn speak_error(&self, text: &str) {
        self.speak(text);
    }
}

/// A speech sink that writes to the log instead of a voice.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSpeech;

impl SpeechSink for LogSpeech {
    fn speak(&self, text: &str) {
        info!(target: "speech", "{text}");
    }

    fn speak_warning(&self, text: &str) {
        warn!(target: "speech", "{text}");
    }

    fn speak_error(&self, text: &str) {
        error!(target: "speech", "{text}");
    }
}

/// A classified user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Navigate(String),
    SwitchMode(String),
    Emergency,
    EmergencyExit,
    Help,
    Repeat,
    Alternatives,
    History,
    Location,
    Stop,
    Pause,
    Continue,
    Menu,
    Settings,
    TurnOn(String),
    TurnOff(String),
    Select(usize),
    Exit,
    Unknown(String),
}

impl Command {
    /// Parses the `KIND` or `KIND:argument` token form a command source
    /// emits, e.g. `NAVIGATE:restroom` or `SELECT:2`.
    pub fn from_token(token: &str) -> Command {
        let token = token.trim();
        let (kind, arg) = match token.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg.trim())),
            None => (token, None),
        };
        let with_arg = |make: fn(String) -> Command| match arg {
            Some(arg) if !arg.is_empty() => make(arg.to_string()),
            _ => Command::Unknown(token.to_string()),
        };
        match kind.to_ascii_uppercase().as_str() {
            "NAVIGATE" => with_arg(Command::Navigate),
            "SWITCH_MODE" => with_arg(Command::SwitchMode),
            "TURN_ON" => with_arg(Command::TurnOn),
            "TURN_OFF" => with_arg(Command::TurnOff),
            "SELECT" => match arg.and_then(|a| a.parse().ok()) {
                Some(n) => Command::Select(n),
                None => Command::Unknown(token.to_string()),
            },
            "EMERGENCY" => Command::Emergency,
            "EMERGENCY_EXIT" => Command::EmergencyExit,
            "HELP" => Command::Help,
            "REPEAT" => Command::Repeat,
            "ALTERNATIVES" => Command::Alternatives,
            "HISTORY" => Command::History,
            "LOCATION" => Command::Location,
            "STOP" => Command::Stop,
            "PAUSE" => Command::Pause,
            "CONTINUE" => Command::Continue,
            "MENU" => Command::Menu,
            "SETTINGS" => Command::Settings,
            "EXIT" => Command::Exit,
            _ => Command::Unknown(token.to_string()),
        }
    }
}

/// Source of user commands. `None` means the source is exhausted.
pub trait CommandSource {
    fn next_command(&mut self) -> Option<Command>;
}

impl<I> CommandSource for I
where
    I: Iterator<Item = Command>,
{
    fn next_command(&mut self) -> Option<Command> {
        self.next()
    }
}

/// Maps a scanned or typed location code to a room.
pub trait LocationResolver {
    fn resolve(&self, code: &str) -> Option<Room>;
}

/// Resolves codes against the graph: a room id, a `QR_<ID>` code, or a name
/// that matches exactly one room.
#[derive(Debug, Clone)]
pub struct GraphLocationResolver {
    graph: SharedGraph,
}

impl GraphLocationResolver {
    pub fn new(graph: SharedGraph) -> Self {
        Self { graph }
    }
}

impl LocationResolver for GraphLocationResolver {
    fn resolve(&self, code: &str) -> Option<Room> {
        let code = code.trim();
        let graph = self.graph.read();
        if let Some(room) = graph.room(code) {
            return Some(room.clone());
        }
        if let Some(id) = code.strip_prefix("QR_") {
            // QR codes may carry a trailing serial: QR_<ID>_<n>
            let id = id.rsplit_once('_').map_or(id, |(head, tail)| {
                if tail.chars().all(|c| c.is_ascii_digit()) { head } else { id }
            });
            if let Some(room) = graph.rooms().find(|r| r.id().eq_ignore_ascii_case(id)) {
                return Some(room.clone());
            }
        }
        match graph.search_rooms(code).as_slice() {
            [only] => Some((*only).clone()),
            _ => None,
        }
    }
}
