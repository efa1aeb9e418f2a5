//! Shared helpers for integration tests.
//!
//! `FakeRedis` is a tiny RESP server on a local port that understands just
//! enough of Redis to rotate a password: `AUTH`, `CONFIG SET requirepass`
//! and the `NOAUTH` gate in front of everything else.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Default)]
struct ServerState {
    requirepass: String,
    commands: Vec<Vec<String>>,
}

pub struct FakeRedis {
    addr: SocketAddr,
    state: Arc<Mutex<ServerState>>,
    handle: JoinHandle<()>,
}

impl FakeRedis {
    /// Start a server whose current password is `requirepass` (empty for none)
    pub async fn start(requirepass: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(ServerState {
            requirepass: requirepass.to_string(),
            commands: Vec::new(),
        }));

        let shared = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(serve(socket, Arc::clone(&shared)));
            }
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// `host:port`
    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    /// Server line as it appears in a twemproxy pool file
    pub fn server_line(&self) -> String {
        format!("{}:1", self.addr)
    }

    pub fn requirepass(&self) -> String {
        self.state.lock().unwrap().requirepass.clone()
    }

    /// Names of the commands received, upper-cased, excluding `CLIENT` housekeeping
    pub fn command_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .commands
            .iter()
            .map(|args| args[0].to_ascii_uppercase())
            .filter(|name| name != "CLIENT")
            .collect()
    }
}

impl Drop for FakeRedis {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// An endpoint nothing listens on
pub async fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

async fn serve(socket: TcpStream, state: Arc<Mutex<ServerState>>) {
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let mut authed = false;

    while let Some(args) = read_command(&mut reader).await {
        let reply = {
            let mut state = state.lock().unwrap();
            state.commands.push(args.clone());
            respond(&mut state, &mut authed, &args)
        };
        if write_half.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
    }
}

async fn read_command<R>(reader: &mut BufReader<R>) -> Option<Vec<String>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await.ok()? == 0 {
        return None;
    }
    let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).await.ok()?;
        let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;
        let mut buf = vec![0u8; len + 2];
        reader.read_exact(&mut buf).await.ok()?;
        buf.truncate(len);
        args.push(String::from_utf8(buf).ok()?);
    }
    if args.is_empty() {
        return None;
    }
    Some(args)
}

fn respond(state: &mut ServerState, authed: &mut bool, args: &[String]) -> String {
    let name = args[0].to_ascii_uppercase();
    let locked = !state.requirepass.is_empty() && !*authed;

    match name.as_str() {
        "AUTH" => {
            let password = args.last().map(String::as_str).unwrap_or("");
            if state.requirepass.is_empty() {
                "-ERR AUTH <password> called without any password configured for the default user\r\n"
                    .to_string()
            } else if password == state.requirepass {
                *authed = true;
                "+OK\r\n".to_string()
            } else {
                "-WRONGPASS invalid username-password pair or user is disabled.\r\n".to_string()
            }
        }
        "CLIENT" => "+OK\r\n".to_string(),
        _ if locked => "-NOAUTH Authentication required.\r\n".to_string(),
        "CONFIG" => {
            let is_requirepass = args.len() == 4
                && args[1].eq_ignore_ascii_case("SET")
                && args[2].eq_ignore_ascii_case("requirepass");
            if is_requirepass {
                state.requirepass = args[3].clone();
                "+OK\r\n".to_string()
            } else {
                "-ERR unsupported CONFIG call\r\n".to_string()
            }
        }
        "PING" => "+PONG\r\n".to_string(),
        _ => "+OK\r\n".to_string(),
    }
}

/// twemproxy pool file with one group per `(name, servers)` pair
pub fn pool_yaml(groups: &[(&str, Vec<String>)]) -> String {
    let mut yaml = String::new();
    for (name, servers) in groups {
        yaml.push_str(&format!("{}:\n  listen: 127.0.0.1:0\n  redis: true\n  servers:\n", name));
        for server in servers {
            yaml.push_str(&format!("    - \"{}\"\n", server));
        }
    }
    yaml
}
