//! Command-line interface for remote_explorer.

use clap::{Parser, Subcommand};
use remote_explorer::Color;

/// Remote Explorer - drive agents on a remote grid-world server
#[derive(Parser, Debug)]
#[command(name = "remote_explorer")]
#[command(about = "Client for the remote explorer grid game", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML client config
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Server URL (overrides config and environment)
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Username sent with the handshake (overrides config and environment)
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create one agent and send it a sequence of moves
    Play {
        /// Label rendered for the agent (at most 2 characters)
        #[arg(long, default_value = "[]")]
        label: String,

        /// Render color
        #[arg(long, default_value = "White")]
        color: Color,

        /// Moves as dx,dy pairs (e.g. 1,0 0,-1)
        #[arg(required = true, allow_hyphen_values = true)]
        moves: Vec<String>,

        /// Send each move in the background and poll for its result
        #[arg(long = "async")]
        background: bool,
    },

    /// Create several agents and move them concurrently
    Swarm {
        /// Number of agents
        #[arg(short, long, default_value = "3")]
        agents: usize,

        /// Moves every agent performs, as dx,dy pairs
        #[arg(required = true, allow_hyphen_values = true)]
        moves: Vec<String>,

        /// Seconds to wait for each round of moves
        #[arg(long, default_value = "10")]
        wait_secs: u64,
    },
}

/// Parses a `dx,dy` pair.
pub fn parse_move(raw: &str) -> anyhow::Result<(i64, i64)> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [dx, dy] => Ok((dx.parse()?, dy.parse()?)),
        _ => Err(anyhow::anyhow!("move must be dx,dy, got {:?}", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move() {
        assert_eq!(parse_move("1,0").unwrap(), (1, 0));
        assert_eq!(parse_move(" -2 , 3 ").unwrap(), (-2, 3));
        assert!(parse_move("1").is_err());
        assert!(parse_move("1,2,3").is_err());
        assert!(parse_move("a,b").is_err());
    }

    #[test]
    fn test_cli_parses_play() {
        let cli = Cli::try_parse_from(["remote_explorer", "play", "--color", "Magenta", "1,0", "0,-1"]).unwrap();
        match cli.command {
            Command::Play { color, moves, background, .. } => {
                assert_eq!(color, Color::Magenta);
                assert_eq!(moves, vec!["1,0", "0,-1"]);
                assert!(!background);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
