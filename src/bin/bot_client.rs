#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
use blokus_client::{
    BlokusRules, BridgeMessage, ChannelTransport, ClientSettings, GameSession, PlayerType, Team,
    TransportCommand,
};
#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;
#[cfg(not(target_arch = "wasm32"))]
use futures::{SinkExt, StreamExt};
#[cfg(not(target_arch = "wasm32"))]
use std::sync::mpsc::Receiver;
#[cfg(not(target_arch = "wasm32"))]
use tokio::net::TcpListener;
#[cfg(not(target_arch = "wasm32"))]
use tokio_tungstenite::{accept_async, tungstenite::Message};
#[cfg(not(target_arch = "wasm32"))]
use tracing::{debug, info, warn};
#[cfg(not(target_arch = "wasm32"))]
use tracing_subscriber::EnvFilter;

/// Plays one team with the built-in bot for a browser client that relays
/// the game over a websocket.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser, Debug, Clone)]
struct Opts {
    /// Address to listen for websocket connections (browser connects here)
    #[arg(long, default_value = "127.0.0.1:9000")]
    listen: String,
    /// Team the bot plays: ONE or TWO
    #[arg(long, default_value = "TWO")]
    team: Team,
    /// Seed for reproducible games
    #[arg(long)]
    seed: Option<u64>,
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opts = Opts::parse();
    let listener = TcpListener::bind(&opts.listen).await?;
    info!(team = %opts.team, "bot client listening on ws://{}", opts.listen);

    // Sessions are single-threaded, so every connection lives on this set.
    let local = tokio::task::LocalSet::new();
    local.run_until(serve(listener, opts)).await
}

#[cfg(not(target_arch = "wasm32"))]
async fn serve(listener: TcpListener, opts: Opts) -> anyhow::Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        info!(%addr, "ws connected");
        let opts = opts.clone();
        tokio::task::spawn_local(async move {
            if let Err(e) = handle_conn(stream, opts).await {
                warn!(%addr, "connection error: {e:?}");
            }
        });
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn settings_for(opts: &Opts) -> ClientSettings {
    let mut settings = ClientSettings::default();
    for team in Team::ALL {
        let player = &mut settings.players[team.index()];
        if team == opts.team {
            player.name = "bot".into();
            player.player_type = PlayerType::Internal;
        } else {
            player.player_type = PlayerType::Manual;
        }
    }
    settings.bot_seed = opts.seed;
    settings
}

#[cfg(not(target_arch = "wasm32"))]
fn outgoing(commands: &Receiver<TransportCommand>) -> anyhow::Result<Vec<String>> {
    let mut frames = Vec::new();
    while let Ok(command) = commands.try_recv() {
        let message = match command {
            TransportCommand::Move { team, mv } => BridgeMessage::Move { team, mv },
            TransportCommand::Pause(paused) => BridgeMessage::Pause { paused },
        };
        frames.push(message.encode()?);
    }
    Ok(frames)
}

#[cfg(not(target_arch = "wasm32"))]
async fn handle_conn(stream: tokio::net::TcpStream, opts: Opts) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let (transport, commands) = ChannelTransport::new();
    let mut session = GameSession::new(settings_for(&opts), BlokusRules, transport);

    while let Some(msg) = ws_rx.next().await {
        let text = match msg? {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };
        match BridgeMessage::decode(&text) {
            Ok(BridgeMessage::State { state }) => {
                if session.turns().phase().get().is_ended() && state.turn == 0 {
                    session.new_game();
                }
                session.on_game_state_update(state);
            }
            Ok(BridgeMessage::RequestAction { team }) => session.on_action_requested(team),
            Ok(BridgeMessage::GameEnded { result, team, error }) => {
                info!(?result, "game ended");
                session.on_game_ended(result, team, error);
            }
            Ok(BridgeMessage::Pause { paused }) => session.on_paused(paused),
            Ok(other) => debug!(?other, "ignored"),
            Err(e) => warn!("bad message: {e}"),
        }
        for frame in outgoing(&commands)? {
            ws_tx.send(Message::Text(frame)).await?;
        }
    }
    Ok(())
}
