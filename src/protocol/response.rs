//! Response definitions
//!
//! Every reply is one JSON line:
//!
//! ```text
//! {"heos": {"command": "player/get_volume", "result": "success",
//!           "message": "pid=1&level=10"},
//!  "payload": ..., "options": ...}
//! ```
//!
//! The `message` string is itself attribute-encoded.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{HeosError, Result};
use super::{Attributes, Command};

/// Text used when a failed response carries no `text` attribute
pub const NO_ERROR_MESSAGE: &str = "no error message";

/// Result status of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Fail,
}

/// Device error identifiers (`eid`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorId {
    /// Missing or unparsable `eid`
    Unknown,
    NoError,
    UnrecognizedCommand,
    InvalidId,
    WrongNumberOfArguments,
    DataNotAvailable,
    ResourceNotAvailable,
    InvalidCredentials,
    CommandNotExecuted,
    UserNotLoggedIn,
    ParameterOutOfRange,
    UserNotFound,
    InternalError,
    SystemError,
    ProcessingPreviousCommand,
    MediaCantBePlayed,
    OptionNotSupported,
    Other(i32),
}

impl ErrorId {
    /// Code reported for [`ErrorId::Unknown`]
    pub const UNKNOWN_CODE: i32 = -1;

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ErrorId::NoError,
            1 => ErrorId::UnrecognizedCommand,
            2 => ErrorId::InvalidId,
            3 => ErrorId::WrongNumberOfArguments,
            4 => ErrorId::DataNotAvailable,
            5 => ErrorId::ResourceNotAvailable,
            6 => ErrorId::InvalidCredentials,
            7 => ErrorId::CommandNotExecuted,
            8 => ErrorId::UserNotLoggedIn,
            9 => ErrorId::ParameterOutOfRange,
            10 => ErrorId::UserNotFound,
            11 => ErrorId::InternalError,
            12 => ErrorId::SystemError,
            13 => ErrorId::ProcessingPreviousCommand,
            14 => ErrorId::MediaCantBePlayed,
            15 => ErrorId::OptionNotSupported,
            Self::UNKNOWN_CODE => ErrorId::Unknown,
            other => ErrorId::Other(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            ErrorId::Unknown => Self::UNKNOWN_CODE,
            ErrorId::NoError => 0,
            ErrorId::UnrecognizedCommand => 1,
            ErrorId::InvalidId => 2,
            ErrorId::WrongNumberOfArguments => 3,
            ErrorId::DataNotAvailable => 4,
            ErrorId::ResourceNotAvailable => 5,
            ErrorId::InvalidCredentials => 6,
            ErrorId::CommandNotExecuted => 7,
            ErrorId::UserNotLoggedIn => 8,
            ErrorId::ParameterOutOfRange => 9,
            ErrorId::UserNotFound => 10,
            ErrorId::InternalError => 11,
            ErrorId::SystemError => 12,
            ErrorId::ProcessingPreviousCommand => 13,
            ErrorId::MediaCantBePlayed => 14,
            ErrorId::OptionNotSupported => 15,
            ErrorId::Other(code) => *code,
        }
    }

    /// Read `eid` from a response message
    pub fn from_message(message: &Attributes) -> Self {
        message
            .first("eid")
            .and_then(|eid| eid.trim().parse::<i32>().ok())
            .map(Self::from_code)
            .unwrap_or(ErrorId::Unknown)
    }
}

impl fmt::Display for ErrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// =============================================================================
// Wire shape
// =============================================================================

#[derive(Deserialize)]
struct RawEnvelope {
    heos: RawHeader,
    #[serde(default)]
    payload: Option<Value>,
    #[serde(default)]
    options: Option<Value>,
}

#[derive(Deserialize)]
struct RawHeader {
    command: String,
    result: Status,
    #[serde(default)]
    message: String,
}

/// A decoded response envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Echo of the command this answers
    pub command: Command,

    pub status: Status,

    /// Decoded `message` attributes
    pub message: Attributes,

    /// Command-specific payload
    pub payload: Option<Value>,

    pub options: Option<Value>,
}

impl Response {
    /// Build a response from already-decoded parts
    pub fn new(command: Command, status: Status, message: Attributes) -> Self {
        Self {
            command,
            status,
            message,
            payload: None,
            options: None,
        }
    }

    /// Parse one response line
    pub fn parse(line: &str) -> Result<Self> {
        let raw: RawEnvelope = serde_json::from_str(line.trim_end())
            .map_err(|e| HeosError::Unexpected(format!("malformed response: {e}")))?;

        let command = raw
            .heos
            .command
            .parse::<Command>()
            .map_err(|e| HeosError::Unexpected(format!("malformed response: {e}")))?;

        Ok(Self {
            command,
            status: raw.heos.result,
            message: Attributes::decode(&raw.heos.message),
            payload: raw.payload,
            options: raw.options,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Turn a `fail` response into [`HeosError::CommandFailure`]
    pub fn into_result(self) -> Result<Self> {
        match self.status {
            Status::Success => Ok(self),
            Status::Fail => Err(HeosError::CommandFailure {
                eid: ErrorId::from_message(&self.message),
                text: self
                    .message
                    .first("text")
                    .unwrap_or(NO_ERROR_MESSAGE)
                    .to_string(),
            }),
        }
    }

    /// First value of a message attribute, or [`HeosError::Unexpected`]
    /// when the device left it out
    pub fn require(&self, key: &str) -> Result<&str> {
        self.message.first(key).ok_or_else(|| {
            HeosError::Unexpected(format!(
                "{} response missing '{key}' in message",
                self.command
            ))
        })
    }
}
