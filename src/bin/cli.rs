//! heoslink CLI Client
//!
//! Command-line interface for controlling a HEOS device.

use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use heoslink::protocol::{Attributes, Command};
use heoslink::types::{PlayState, PlayerId};
use heoslink::{Config, Dispatcher, HeosClient};
use tracing_subscriber::{fmt, EnvFilter};

/// heoslink CLI
#[derive(Parser, Debug)]
#[command(name = "heos-cli")]
#[command(about = "CLI for HEOS networked audio devices")]
#[command(version)]
struct Args {
    /// Device host name or IP address
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Device port
    #[arg(short, long, default_value_t = heoslink::config::DEFAULT_PORT)]
    port: u16,

    /// Response read timeout in milliseconds
    #[arg(long, default_value = "5000")]
    read_timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a single heartbeat
    Heartbeat,

    /// List players
    Players,

    /// Get or set the volume of a player
    Volume {
        /// Player id
        #[arg(allow_hyphen_values = true)]
        pid: PlayerId,

        /// New level (0-100)
        #[arg(long)]
        set: Option<u8>,
    },

    /// Get or set the mute state of a player
    Mute {
        /// Player id
        #[arg(allow_hyphen_values = true)]
        pid: PlayerId,

        #[arg(long, value_enum)]
        set: Option<Switch>,
    },

    /// Get or set the play state of a player
    PlayState {
        /// Player id
        #[arg(allow_hyphen_values = true)]
        pid: PlayerId,

        /// play, pause or stop
        #[arg(long)]
        set: Option<PlayState>,
    },

    /// Send a raw command, e.g. `raw player/get_volume pid=1`
    Raw {
        /// Command as group/name
        command: String,

        /// Attributes in wire form (`a=1&b`)
        attrs: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Switch {
    On,
    Off,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,heoslink=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // A one-shot CLI has no use for a keep-alive
    let config = Config::builder()
        .host(&args.host)
        .port(args.port)
        .read_timeout_ms(args.read_timeout_ms)
        .heartbeat_enabled(false)
        .worker_threads(1)
        .build();

    let dispatcher = match Dispatcher::new(config.worker_threads) {
        Ok(d) => Arc::new(d),
        Err(e) => {
            tracing::error!("Failed to start dispatcher: {}", e);
            std::process::exit(1);
        }
    };

    let client = match HeosClient::connect(config, dispatcher) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to connect: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&client, args.command) {
        tracing::error!("{} ({:?})", e, e.kind());
        client.close();
        std::process::exit(if e.kind().is_client_fault() { 2 } else { 1 });
    }

    client.close();
}

fn run(client: &HeosClient, command: Commands) -> heoslink::Result<()> {
    match command {
        Commands::Heartbeat => {
            client.heart_beat().wait()?;
            println!("ok");
        }
        Commands::Players => {
            for player in client.get_players().wait()? {
                println!("{}\t{}\t{}", player.pid, player.name, player.model);
            }
        }
        Commands::Volume { pid, set: Some(level) } => client.set_volume(pid, level).wait()?,
        Commands::Volume { pid, set: None } => println!("{}", client.get_volume(pid).wait()?),
        Commands::Mute { pid, set: Some(switch) } => {
            client.set_mute(pid, matches!(switch, Switch::On)).wait()?
        }
        Commands::Mute { pid, set: None } => {
            let muted = client.get_mute(pid).wait()?;
            println!("{}", if muted { "on" } else { "off" });
        }
        Commands::PlayState { pid, set: Some(state) } => client.set_play_state(pid, state).wait()?,
        Commands::PlayState { pid, set: None } => {
            println!("{}", client.get_play_state(pid).wait()?)
        }
        Commands::Raw { command, attrs } => {
            let command: Command = command.parse()?;
            let attrs = Attributes::decode(attrs.as_deref().unwrap_or(""));
            let response = client.execute_blocking(command, attrs)?;
            println!("command: {}", response.command);
            println!("message: {}", response.message);
            if let Some(payload) = response.payload {
                println!("payload: {payload}");
            }
        }
    }
    Ok(())
}
