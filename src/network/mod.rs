//! Network Module
//!
//! The device connection and the keep-alive that shares it.
//!
//! ## Architecture
//! - One `Connection` per client, guarded by a single mutex
//! - Caller operations (via the dispatcher) and the heartbeat thread both
//!   go through `Connection::send_and_receive`

mod connection;
mod heartbeat;

pub use connection::{Connection, ConnectionState};
pub use heartbeat::Heartbeat;
