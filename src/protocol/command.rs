//! Command definitions
//!
//! A command is a (group, name) pair, e.g. `system/heart_beat`.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::HeosError;
use super::Attributes;

/// URI scheme prefixed to every outgoing command
pub const SCHEME: &str = "heos";

/// Command groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandGroup {
    System,
    Player,
    Group,
    Browse,
    Event,
}

impl CommandGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandGroup::System => "system",
            CommandGroup::Player => "player",
            CommandGroup::Group => "group",
            CommandGroup::Browse => "browse",
            CommandGroup::Event => "event",
        }
    }
}

impl FromStr for CommandGroup {
    type Err = HeosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(CommandGroup::System),
            "player" => Ok(CommandGroup::Player),
            "group" => Ok(CommandGroup::Group),
            "browse" => Ok(CommandGroup::Browse),
            "event" => Ok(CommandGroup::Event),
            other => Err(HeosError::validation(format!(
                "unknown command group: {other}"
            ))),
        }
    }
}

/// A command identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    group: CommandGroup,
    name: Cow<'static, str>,
}

impl Command {
    // -------------------------------------------------------------------------
    // system
    // -------------------------------------------------------------------------
    pub const SYSTEM_HEART_BEAT: Command = Command::new(CommandGroup::System, "heart_beat");
    pub const SYSTEM_CHECK_ACCOUNT: Command = Command::new(CommandGroup::System, "check_account");
    pub const SYSTEM_SIGN_IN: Command = Command::new(CommandGroup::System, "sign_in");
    pub const SYSTEM_SIGN_OUT: Command = Command::new(CommandGroup::System, "sign_out");
    pub const SYSTEM_REBOOT: Command = Command::new(CommandGroup::System, "reboot");
    pub const SYSTEM_PRETTIFY_JSON_RESPONSE: Command =
        Command::new(CommandGroup::System, "prettify_json_response");

    // -------------------------------------------------------------------------
    // player
    // -------------------------------------------------------------------------
    pub const PLAYER_GET_PLAYERS: Command = Command::new(CommandGroup::Player, "get_players");
    pub const PLAYER_GET_PLAYER_INFO: Command = Command::new(CommandGroup::Player, "get_player_info");
    pub const PLAYER_GET_PLAY_STATE: Command = Command::new(CommandGroup::Player, "get_play_state");
    pub const PLAYER_SET_PLAY_STATE: Command = Command::new(CommandGroup::Player, "set_play_state");
    pub const PLAYER_GET_NOW_PLAYING_MEDIA: Command =
        Command::new(CommandGroup::Player, "get_now_playing_media");
    pub const PLAYER_GET_VOLUME: Command = Command::new(CommandGroup::Player, "get_volume");
    pub const PLAYER_SET_VOLUME: Command = Command::new(CommandGroup::Player, "set_volume");
    pub const PLAYER_VOLUME_UP: Command = Command::new(CommandGroup::Player, "volume_up");
    pub const PLAYER_VOLUME_DOWN: Command = Command::new(CommandGroup::Player, "volume_down");
    pub const PLAYER_GET_MUTE: Command = Command::new(CommandGroup::Player, "get_mute");
    pub const PLAYER_SET_MUTE: Command = Command::new(CommandGroup::Player, "set_mute");
    pub const PLAYER_TOGGLE_MUTE: Command = Command::new(CommandGroup::Player, "toggle_mute");
    pub const PLAYER_PLAY_NEXT: Command = Command::new(CommandGroup::Player, "play_next");
    pub const PLAYER_PLAY_PREVIOUS: Command = Command::new(CommandGroup::Player, "play_previous");

    // -------------------------------------------------------------------------
    // group
    // -------------------------------------------------------------------------
    pub const GROUP_GET_GROUPS: Command = Command::new(CommandGroup::Group, "get_groups");
    pub const GROUP_GET_GROUP_INFO: Command = Command::new(CommandGroup::Group, "get_group_info");
    pub const GROUP_SET_GROUP: Command = Command::new(CommandGroup::Group, "set_group");
    pub const GROUP_GET_VOLUME: Command = Command::new(CommandGroup::Group, "get_volume");
    pub const GROUP_SET_VOLUME: Command = Command::new(CommandGroup::Group, "set_volume");

    // -------------------------------------------------------------------------
    // browse
    // -------------------------------------------------------------------------
    pub const BROWSE_GET_MUSIC_SOURCES: Command =
        Command::new(CommandGroup::Browse, "get_music_sources");
    pub const BROWSE_BROWSE: Command = Command::new(CommandGroup::Browse, "browse");

    pub const fn new(group: CommandGroup, name: &'static str) -> Self {
        Self {
            group,
            name: Cow::Borrowed(name),
        }
    }

    pub fn group(&self) -> CommandGroup {
        self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build the full wire line (without terminator)
    ///
    /// `heos://<group>/<command>[?<attributes>]`. Values are not escaped.
    pub fn to_wire(&self, attrs: &Attributes) -> String {
        if attrs.is_empty() {
            format!("{SCHEME}://{self}")
        } else {
            format!("{SCHEME}://{self}?{}", attrs.encode())
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group.as_str(), self.name)
    }
}

/// Parses a `group/name` echo. Unknown names within a known group are kept.
impl FromStr for Command {
    type Err = HeosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (group, name) = s
            .split_once('/')
            .ok_or_else(|| HeosError::validation(format!("malformed command: {s}")))?;
        if name.is_empty() {
            return Err(HeosError::validation(format!("malformed command: {s}")));
        }
        Ok(Self {
            group: group.parse()?,
            name: Cow::Owned(name.to_string()),
        })
    }
}
