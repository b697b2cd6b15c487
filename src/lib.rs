//! # heoslink
//!
//! A client for the HEOS line-oriented remote-control protocol:
//! - One persistent TCP connection, strictly one request in flight
//! - Attribute codec for commands and response messages
//! - Background heartbeat sharing the connection with caller commands
//! - Dispatcher with bounded retry and reconnect on transport failures
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       HeosClient                             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Dispatcher                               │
//! │          (worker pool, retry + reconnect)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │          ┌─────────────┐
//!                       │          │  Heartbeat  │
//!                       │          │  (thread)   │
//!                       │          └──────┬──────┘
//!                       ▼                 ▼
//!              ┌─────────────────────────────────┐
//!              │          Connection             │
//!              │  (mutex held over write+read)   │
//!              └────────────────┬────────────────┘
//!                               │
//!                               ▼
//!                       ┌─────────────┐
//!                       │   Device    │
//!                       └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod dispatch;
pub mod types;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ErrorKind, HeosError, Result};
pub use config::Config;
pub use client::HeosClient;
pub use dispatch::{Dispatcher, Pending};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of heoslink
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
