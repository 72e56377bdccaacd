//! Remote Explorer - command-line demo client
//!
//! Drives one or more agents on a remote explorer server.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, parse_move};
use remote_explorer::{
    AsyncMovementResult, ClientConfig, Color, MovementResult, RemoteGameSession,
    RemoteGameSessionFactory, SessionIdentifier, VisualSessionIdentifier,
};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

/// Interval between readiness polls of background moves.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::Play {
            label,
            color,
            moves,
            background,
        } => run_play(&config, &label, color, &moves, background),
        Command::Swarm {
            agents,
            moves,
            wait_secs,
        } => run_swarm(&config, agents, &moves, Duration::from_secs(wait_secs)),
    }
}

/// Resolves config: file, then environment, then command-line flags.
fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    }
    .with_env_overrides();

    if let Some(url) = &cli.server_url {
        config = config.with_server_url(url.clone());
    }
    if let Some(username) = &cli.username {
        config = config.with_username(username.clone());
    }
    Ok(config)
}

fn report(step: usize, result: &MovementResult, session: &RemoteGameSession) {
    println!(
        "move {}: alive={}, moved={}",
        step,
        result.is_agent_alive(),
        result.moved_successfully()
    );
    if let Some(tile) = result.discovered_tile() {
        println!("  discovered tile: {}", tile);
    }
    if let Some(message) = session.last_message() {
        println!("  message: {}", message);
    }
}

/// Create one agent and walk it through `moves`.
#[instrument(skip(config, moves))]
fn run_play(config: &ClientConfig, label: &str, color: Color, moves: &[String], background: bool) -> Result<()> {
    let factory = RemoteGameSessionFactory::new(config)?;
    let mut ident = SessionIdentifier::from_visual(label, color)?;
    let session = factory.create(&mut ident)?;
    info!(sid = ?ident.sid(), "Agent created");

    for (step, raw) in moves.iter().enumerate() {
        let vector = parse_move(raw)?;
        let result = if background {
            let handle = session.move_async(vector)?;
            while !handle.is_ready() {
                std::thread::sleep(POLL_INTERVAL);
            }
            if let Some(failure) = handle.transport_failure() {
                warn!(failure = %failure, "Move could not be completed");
            }
            handle.result().unwrap_or_else(MovementResult::failed)
        } else {
            session.move_agent(vector)?
        };
        report(step, &result, &session);

        if !session.is_agent_alive() {
            println!("Agent did not survive; stopping.");
            break;
        }
    }
    Ok(())
}

fn create_agent(factory: &RemoteGameSessionFactory, idx: usize) -> Result<RemoteGameSession> {
    let visual = VisualSessionIdentifier::new(format!("[{}", idx % 10), Color::Magenta)?;
    Ok(factory.create(visual)?)
}

/// An agent is replaced when its move has not resolved or did not leave it alive.
fn needs_respawn(handle: &AsyncMovementResult) -> bool {
    handle.result().is_none_or(|result| !result.is_agent_alive())
}

/// Move several agents concurrently, recreating any that die.
#[instrument(skip(config, moves))]
fn run_swarm(config: &ClientConfig, agents: usize, moves: &[String], wait: Duration) -> Result<()> {
    let vectors = moves
        .iter()
        .map(|raw| parse_move(raw))
        .collect::<Result<Vec<_>>>()?;
    let factory = RemoteGameSessionFactory::new(config)?;

    let mut sessions = (0..agents)
        .map(|idx| create_agent(&factory, idx))
        .collect::<Result<Vec<_>>>()?;

    for (round, vector) in vectors.iter().enumerate() {
        let handles = sessions
            .iter()
            .map(|session| session.move_async(*vector))
            .collect::<Result<Vec<AsyncMovementResult>, _>>()?;

        let deadline = Instant::now() + wait;
        for (idx, handle) in handles.iter().enumerate() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match handle.wait(Some(remaining)) {
                Some(result) => println!(
                    "round {} agent {}: alive={}, moved={}",
                    round,
                    idx,
                    result.is_agent_alive(),
                    result.moved_successfully()
                ),
                None => println!("round {} agent {}: still moving", round, idx),
            }
        }

        for (idx, (session, handle)) in sessions.iter_mut().zip(&handles).enumerate() {
            if needs_respawn(handle) {
                info!(agent = idx, "Agent died or did not answer; recreating");
                *session = create_agent(&factory, idx)?;
            }
        }
    }
    Ok(())
}
