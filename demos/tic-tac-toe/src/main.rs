//! Tic-tac-toe over Gridsync: `serve` hosts matches, `play` joins one from
//! the terminal.

use std::collections::HashSet;
use std::time::Duration;

use clap::{Parser, Subcommand};
use gridsync::prelude::*;
use gridsync::{BOARD_SIZE, Board, Codec};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tic-tac-toe")]
#[command(about = "Two-player tic-tac-toe with an authoritative server")]
struct Args {
    /// Log filter, e.g. `info` or `gridsync_room=debug`. Falls back to
    /// `RUST_LOG`, then `info`.
    #[arg(long, env = "GRIDSYNC_LOG", global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Host matches.
    Serve {
        #[arg(long, env = "GRIDSYNC_BIND", default_value = "127.0.0.1:8080")]
        bind: String,

        /// Let extra joiners watch. `0` means no limit.
        #[arg(long, env = "GRIDSYNC_SPECTATORS")]
        spectators: Option<usize>,
    },
    /// Join a match from this terminal.
    Play {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: String,

        /// Numeric player token. Omit to get an anonymous identity.
        #[arg(long)]
        token: Option<String>,
    },
}

/// Numeric tokens name the player directly; an empty token gets a fresh ID
/// above the range people type by hand.
struct TokenAuth {
    anonymous: AnonymousAuthenticator,
}

impl Authenticator for TokenAuth {
    async fn authenticate(&self, token: &str) -> Result<PlayerId, AuthError> {
        if token.is_empty() {
            let PlayerId(n) = self.anonymous.authenticate(token).await?;
            return Ok(PlayerId(1_000_000 + n));
        }
        token
            .parse()
            .map(PlayerId)
            .map_err(|_| AuthError::Rejected("token must be a number".into()))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter = match &args.log {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match args.command {
        Command::Serve { bind, spectators } => serve(&bind, spectators).await?,
        Command::Play { addr, token } => play(&addr, token.as_deref()).await?,
    }
    Ok(())
}

async fn serve(bind: &str, spectators: Option<usize>) -> Result<(), GridsyncError> {
    let room_config = RoomConfig {
        allow_spectators: spectators.is_some(),
        max_spectators: spectators.unwrap_or(0),
        ..RoomConfig::default()
    };

    let server = GridsyncServerBuilder::new()
        .bind(bind)
        .room_config(room_config)
        .build(TokenAuth {
            anonymous: AnonymousAuthenticator::new(),
        })
        .await?;
    tracing::info!(addr = %server.local_addr()?, "tic-tac-toe server listening");

    tokio::spawn(watch_rooms(server.handle()));
    server.run().await
}

/// Attaches a logging listener to every room as it appears.
async fn watch_rooms<A: Authenticator, C: Codec>(handle: ServerHandle<A, C>) {
    let mut watched = HashSet::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(500));

    loop {
        ticker.tick().await;
        let rooms = handle.list_rooms().await;
        // Destroyed rooms never come back.
        watched.retain(|id| rooms.iter().any(|info| info.room_id == *id));

        for info in rooms {
            let room_id = info.room_id;
            if !watched.insert(room_id) {
                continue;
            }
            let Ok(mut rx) = handle.subscribe(room_id).await else {
                watched.remove(&room_id);
                continue;
            };
            tokio::spawn(async move {
                while let Some(outbound) = rx.recv().await {
                    match outbound {
                        RoomOutbound::Notification(n) => {
                            tracing::info!(%room_id, notification = ?n, "room event");
                        }
                        RoomOutbound::Abandoned { player_id } => {
                            tracing::info!(%room_id, %player_id, "room abandoned");
                        }
                        RoomOutbound::Snapshot(_) | RoomOutbound::Rejected(_) => {}
                    }
                }
                tracing::debug!(%room_id, "room closed");
            });
        }
    }
}

/// What a line typed at the prompt asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Move(usize, usize),
    Rematch,
    Rooms,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let mut words = line.split_whitespace();
    let first = words.next()?;
    match first {
        "r" | "rematch" => Some(Input::Rematch),
        "l" | "list" => Some(Input::Rooms),
        "q" | "quit" => Some(Input::Quit),
        _ => {
            let x = first.parse().ok()?;
            let y = words.next()?.parse().ok()?;
            Some(Input::Move(x, y))
        }
    }
}

fn render(board: &Board) -> String {
    let mut out = String::new();
    for y in 0..BOARD_SIZE {
        for x in 0..BOARD_SIZE {
            let symbol = match board.get(x, y).ok().and_then(|cell| cell.mark()) {
                Some(Mark::A) => 'X',
                Some(Mark::B) => 'O',
                None => '.',
            };
            out.push(symbol);
            if x + 1 < BOARD_SIZE {
                out.push(' ');
            }
        }
        out.push('\n');
    }
    out
}

async fn play(addr: &str, token: Option<&str>) -> Result<(), GridsyncError> {
    let mut client = GridsyncClient::connect(addr, token).await?;
    let (room_id, seat) = client.join_or_create().await?;
    println!("you are {} in {room_id} as {seat}", client.player_id());
    println!("moves: `x y` (0-2), `r` rematch, `l` list rooms, `q` quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut heartbeat = tokio::time::interval(Duration::from_secs(5));

    loop {
        tokio::select! {
            event = client.next_event() => {
                let Some(event) = event? else {
                    println!("server closed the connection");
                    return Ok(());
                };
                show_event(&client, event);
            }

            line = lines.next_line() => {
                let Ok(Some(line)) = line else {
                    break;
                };
                match parse_input(&line) {
                    Some(Input::Move(x, y)) => {
                        if let Err(e) = client.submit_move(x, y).await {
                            println!("{e}");
                        }
                    }
                    Some(Input::Rematch) => client.request_rematch().await?,
                    Some(Input::Rooms) => {
                        for room in client.list_rooms().await? {
                            println!(
                                "{}: {} players, {} watching, {}",
                                room.room_id, room.player_count, room.spectator_count, room.phase
                            );
                        }
                    }
                    Some(Input::Quit) => break,
                    None => println!("?"),
                }
            }

            _ = heartbeat.tick() => client.heartbeat().await?,
        }
    }

    client.disconnect("quit").await
}

fn show_event(client: &GridsyncClient, event: ClientEvent) {
    match event {
        ClientEvent::Snapshot | ClientEvent::Notification(_) => {
            let Some(view) = client.view() else {
                return;
            };
            print!("{}", render(view.board()));
            let (a, b) = view.scores();
            match view.phase() {
                Phase::InProgress if view.is_my_turn() => println!("your move (X {a} : O {b})"),
                Phase::InProgress => println!("waiting for opponent (X {a} : O {b})"),
                phase => println!("{phase} (X {a} : O {b})"),
            }
        }
        ClientEvent::Rejected(reason) => println!("refused: {reason}"),
        ClientEvent::Abandoned { player_id } => println!("{player_id} left, game over"),
        ClientEvent::Error { code, message } => println!("error {code}: {message}"),
        ClientEvent::Disconnected { reason } => println!("disconnected: {reason}"),
        ClientEvent::Joined { .. } | ClientEvent::HeartbeatAck { .. } | ClientEvent::RoomList(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move() {
        assert_eq!(parse_input("1 2"), Some(Input::Move(1, 2)));
        assert_eq!(parse_input("  0   0 "), Some(Input::Move(0, 0)));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_input("r"), Some(Input::Rematch));
        assert_eq!(parse_input("list"), Some(Input::Rooms));
        assert_eq!(parse_input("q"), Some(Input::Quit));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_input(""), None);
        assert_eq!(parse_input("1"), None);
        assert_eq!(parse_input("a b"), None);
    }

    #[test]
    fn test_render_empty_board() {
        assert_eq!(render(&Board::new()), ". . .\n. . .\n. . .\n");
    }

    #[tokio::test]
    async fn test_token_auth() {
        let auth = TokenAuth {
            anonymous: AnonymousAuthenticator::new(),
        };
        assert_eq!(auth.authenticate("12").await.unwrap(), PlayerId(12));
        assert_eq!(auth.authenticate("").await.unwrap(), PlayerId(1_000_001));
        assert!(auth.authenticate("abc").await.is_err());
    }
}
