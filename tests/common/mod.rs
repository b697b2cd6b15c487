//! Shared test helpers
//!
//! `MockDevice` is an in-process stand-in for a HEOS device: it accepts TCP
//! connections on 127.0.0.1, records every command line it receives and
//! answers through a caller-supplied responder.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use heoslink::Config;

/// What the mock does with one received line
pub enum Reply {
    /// Write this line back
    Line(String),
    /// Write several lines back, e.g. a stray reply followed by the real one
    Lines(Vec<String>),
    /// Read the next command without answering
    Silent,
    /// Drop the connection
    Hangup,
}

type Responder = Arc<dyn Fn(&str) -> Reply + Send + Sync>;

pub struct MockDevice {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
}

impl MockDevice {
    pub fn start<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let responder: Responder = Arc::new(responder);

        let received_clone = Arc::clone(&received);
        let connections_clone = Arc::clone(&connections);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                connections_clone.fetch_add(1, Ordering::SeqCst);
                let received = Arc::clone(&received_clone);
                let responder = Arc::clone(&responder);
                thread::spawn(move || serve(stream, received, responder));
            }
        });

        Self {
            addr,
            received,
            connections,
        }
    }

    /// Device that answers every command with success, echoing its attributes
    pub fn echo() -> Self {
        Self::start(|line| Reply::Line(success_for(line)))
    }

    pub fn config(&self) -> Config {
        Config::builder()
            .host(self.addr.ip().to_string())
            .port(self.addr.port())
            .heartbeat_enabled(false)
            .read_timeout_ms(2000)
            .build()
    }

    /// Every line received so far, terminator stripped
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// Number of accepted connections
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

fn serve(stream: TcpStream, received: Arc<Mutex<Vec<String>>>, responder: Responder) {
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        assert!(line.ends_with("\r\n"), "command not CRLF-terminated: {line:?}");
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        received.lock().push(line.clone());

        match responder(&line) {
            Reply::Line(reply) => {
                if writer.write_all(format!("{reply}\r\n").as_bytes()).is_err() {
                    return;
                }
            }
            Reply::Lines(replies) => {
                let joined: String = replies.iter().map(|r| format!("{r}\r\n")).collect();
                if writer.write_all(joined.as_bytes()).is_err() {
                    return;
                }
            }
            Reply::Silent => {}
            Reply::Hangup => return,
        }
    }
}

/// Split `heos://group/name?attrs` into (`group/name`, `attrs`)
pub fn split_command(line: &str) -> (String, String) {
    let rest = line.strip_prefix("heos://").unwrap_or(line);
    match rest.split_once('?') {
        Some((command, attrs)) => (command.to_string(), attrs.to_string()),
        None => (rest.to_string(), String::new()),
    }
}

pub fn envelope(command: &str, result: &str, message: &str) -> String {
    serde_json::json!({
        "heos": {
            "command": command,
            "result": result,
            "message": message,
        }
    })
    .to_string()
}

pub fn success_for(line: &str) -> String {
    let (command, attrs) = split_command(line);
    envelope(&command, "success", &attrs)
}

pub fn fail_for(line: &str, message: &str) -> String {
    let (command, _) = split_command(line);
    envelope(&command, "fail", message)
}

/// Device answering `player/get_volume?pid=P` with `level=P*10`; its very
/// first reply is preceded by one stray `player/get_mute` line
pub fn stray_line_device() -> MockDevice {
    let stray_sent = Arc::new(AtomicUsize::new(0));
    MockDevice::start(move |line| {
        let (command, attrs) = split_command(line);
        let pid: i64 = heoslink::protocol::Attributes::decode(&attrs)
            .first("pid")
            .and_then(|p| p.parse().ok())
            .unwrap_or(0);
        let reply = envelope(&command, "success", &format!("pid={pid}&level={}", pid * 10));

        if stray_sent.fetch_add(1, Ordering::SeqCst) == 0 {
            Reply::Lines(vec![envelope("player/get_mute", "success", "pid=9&state=off"), reply])
        } else {
            Reply::Line(reply)
        }
    })
}
