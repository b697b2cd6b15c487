//! Domain types decoded from response messages and payloads

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::HeosError;

/// Player identifier as reported by the device
pub type PlayerId = i64;

/// Playback state of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Play,
    Pause,
    Stop,
}

impl PlayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayState::Play => "play",
            PlayState::Pause => "pause",
            PlayState::Stop => "stop",
        }
    }
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayState {
    type Err = HeosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok(PlayState::Play),
            "pause" => Ok(PlayState::Pause),
            "stop" => Ok(PlayState::Stop),
            other => Err(HeosError::validation(format!("unknown play state: {other}"))),
        }
    }
}

/// One entry of the `player/get_players` payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
    pub pid: PlayerId,
    #[serde(default)]
    pub gid: Option<i64>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub lineout: Option<i64>,
    #[serde(default)]
    pub serial: Option<String>,
}
