//! Client
//!
//! Ties the connection, heartbeat and dispatcher together. Every operation
//! runs on the dispatcher with reconnect as its recovery hook.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::config::Config;
use crate::dispatch::{Dispatcher, Pending};
use crate::error::{HeosError, Result};
use crate::network::{Connection, ConnectionState, Heartbeat};
use crate::protocol::{Attributes, Command, Response};
use crate::types::{PlayState, PlayerId, PlayerInfo};

/// Maximum value accepted by `set_volume`
pub const MAX_VOLUME: u8 = 100;

/// Largest step accepted by `volume_up` / `volume_down`
pub const MAX_VOLUME_STEP: u8 = 10;

/// Client for one HEOS device
pub struct HeosClient {
    connection: Arc<Connection>,
    heartbeat: Mutex<Heartbeat>,
    dispatcher: Arc<Dispatcher>,
}

impl HeosClient {
    /// Connect to the device and start the heartbeat if enabled
    pub fn connect(config: Config, dispatcher: Arc<Dispatcher>) -> Result<Self> {
        let connection = Arc::new(Connection::new(config.clone()));
        connection.connect()?;

        let mut heartbeat =
            Heartbeat::for_connection(Arc::clone(&connection), config.heartbeat_interval());
        if config.heartbeat_enabled {
            heartbeat.start()?;
        }

        tracing::info!("Connected to HEOS device at {}", config.address());

        Ok(Self {
            connection,
            heartbeat: Mutex::new(heartbeat),
            dispatcher,
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Completed heartbeat runs
    pub fn heartbeat_runs(&self) -> u64 {
        self.heartbeat.lock().runs()
    }

    /// Dispatch an arbitrary command
    pub fn execute(&self, command: Command, attrs: Attributes) -> Pending<Response> {
        self.submit(command, attrs, Ok)
    }

    /// Dispatch an arbitrary command and wait for the reply
    pub fn execute_blocking(&self, command: Command, attrs: Attributes) -> Result<Response> {
        self.execute(command, attrs).wait()
    }

    // =========================================================================
    // system
    // =========================================================================

    pub fn heart_beat(&self) -> Pending<()> {
        self.submit(Command::SYSTEM_HEART_BEAT, Attributes::new(), |_| Ok(()))
    }

    // =========================================================================
    // player
    // =========================================================================

    pub fn get_players(&self) -> Pending<Vec<PlayerInfo>> {
        self.submit(Command::PLAYER_GET_PLAYERS, Attributes::new(), |resp| {
            let payload = resp.payload.unwrap_or(Value::Array(Vec::new()));
            serde_json::from_value(payload)
                .map_err(|e| HeosError::Unexpected(format!("malformed player list: {e}")))
        })
    }

    pub fn get_volume(&self, pid: PlayerId) -> Pending<u8> {
        self.submit(Command::PLAYER_GET_VOLUME, pid_attrs(pid), |resp| {
            parse_level(&resp)
        })
    }

    pub fn set_volume(&self, pid: PlayerId, level: u8) -> Pending<()> {
        if level > MAX_VOLUME {
            return Pending::ready(Err(HeosError::validation(format!(
                "volume level {level} out of range 0..={MAX_VOLUME}"
            ))));
        }
        let attrs = Attributes::builder()
            .value("pid", pid)
            .value("level", level)
            .build();
        self.submit(Command::PLAYER_SET_VOLUME, attrs, |_| Ok(()))
    }

    pub fn volume_up(&self, pid: PlayerId, step: u8) -> Pending<()> {
        self.step_volume(Command::PLAYER_VOLUME_UP, pid, step)
    }

    pub fn volume_down(&self, pid: PlayerId, step: u8) -> Pending<()> {
        self.step_volume(Command::PLAYER_VOLUME_DOWN, pid, step)
    }

    pub fn get_mute(&self, pid: PlayerId) -> Pending<bool> {
        self.submit(Command::PLAYER_GET_MUTE, pid_attrs(pid), |resp| {
            match resp.require("state")? {
                "on" => Ok(true),
                "off" => Ok(false),
                other => Err(HeosError::Unexpected(format!("unknown mute state: {other}"))),
            }
        })
    }

    pub fn set_mute(&self, pid: PlayerId, mute: bool) -> Pending<()> {
        let attrs = Attributes::builder()
            .value("pid", pid)
            .value("state", if mute { "on" } else { "off" })
            .build();
        self.submit(Command::PLAYER_SET_MUTE, attrs, |_| Ok(()))
    }

    pub fn toggle_mute(&self, pid: PlayerId) -> Pending<()> {
        self.submit(Command::PLAYER_TOGGLE_MUTE, pid_attrs(pid), |_| Ok(()))
    }

    pub fn get_play_state(&self, pid: PlayerId) -> Pending<PlayState> {
        self.submit(Command::PLAYER_GET_PLAY_STATE, pid_attrs(pid), |resp| {
            resp.require("state")?
                .parse::<PlayState>()
                .map_err(|e| HeosError::Unexpected(e.to_string()))
        })
    }

    pub fn set_play_state(&self, pid: PlayerId, state: PlayState) -> Pending<()> {
        let attrs = Attributes::builder()
            .value("pid", pid)
            .value("state", state)
            .build();
        self.submit(Command::PLAYER_SET_PLAY_STATE, attrs, |_| Ok(()))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Replace the device connection with a fresh one
    pub fn reconnect(&self) -> Result<()> {
        self.connection.reconnect()
    }

    /// Stop the heartbeat and close the connection. Idempotent.
    pub fn close(&self) {
        self.heartbeat.lock().stop();
        self.connection.close();
    }

    fn step_volume(&self, command: Command, pid: PlayerId, step: u8) -> Pending<()> {
        if step == 0 || step > MAX_VOLUME_STEP {
            return Pending::ready(Err(HeosError::validation(format!(
                "volume step {step} out of range 1..={MAX_VOLUME_STEP}"
            ))));
        }
        let attrs = Attributes::builder()
            .value("pid", pid)
            .value("step", step)
            .build();
        self.submit(command, attrs, |_| Ok(()))
    }

    fn submit<T, F>(&self, command: Command, attrs: Attributes, extract: F) -> Pending<T>
    where
        T: Send + 'static,
        F: Fn(Response) -> Result<T> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        let recover_on = Arc::clone(&self.connection);

        self.dispatcher.submit(
            move || connection.execute(&command, &attrs).and_then(&extract),
            move || recover_on.reconnect(),
        )
    }
}

impl Drop for HeosClient {
    fn drop(&mut self) {
        self.close();
    }
}

fn pid_attrs(pid: PlayerId) -> Attributes {
    Attributes::builder().value("pid", pid).build()
}

fn parse_level(resp: &Response) -> Result<u8> {
    let level = resp.require("level")?;
    level
        .parse::<u8>()
        .map_err(|_| HeosError::Unexpected(format!("invalid volume level: {level}")))
}
