//! Headless Agricola match runner.
//!
//! Plays full games between external agents, writes a JSON-lines log of
//! every decision, and replays logs.
//!
//! # Usage
//!
//! ```bash
//! # One agent process per seat
//! cargo run -p agricola_headless -- run --players 4 --agents ./bot ./bot ./bot ./bot
//!
//! # Play seat decisions over this process's own stdin/stdout
//! cargo run -p agricola_headless -- run --stdio
//!
//! # Replay a log and compare the final state with the recorded one
//! cargo run -p agricola_headless -- replay --log logs/standard-2p_state.jsonl
//!
//! # Check that a seed plays out identically several times
//! cargo run -p agricola_headless -- verify --seed 7 --runs 5
//! ```
//!
//! # Streams
//!
//! Agent protocol (stdio mode): stdin/stdout, one JSON document per line
//! Match report: stdout (stderr in stdio mode)
//! Logs: stderr

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use agricola_headless::{
    agent::{Agent, ProcessAgent, StreamAgent},
    game_log::GameLog,
    runner::{replay, run_match, verify_determinism, Seats},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "agricola_headless")]
#[command(about = "Headless Agricola runner for agents, logs and replays")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one match
    Run {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "two_player")]
        scenario: String,

        /// Agent command per seat (one command drives every seat)
        #[arg(short, long, num_args = 1..)]
        agents: Vec<String>,

        /// Talk to a single agent over this process's stdin/stdout
        #[arg(long, conflicts_with = "agents")]
        stdio: bool,

        /// Override the number of players
        #[arg(short, long)]
        players: Option<usize>,

        /// Override the game seed
        #[arg(long)]
        seed: Option<u64>,

        /// Seed for the built-in random agents
        #[arg(long, default_value = "0")]
        agent_seed: u64,

        /// Override the game identifier
        #[arg(long)]
        game_id: Option<String>,

        /// Directory for game logs
        #[arg(short, long, default_value = "logs")]
        logdir: PathBuf,
    },

    /// Replay a game log
    Replay {
        /// State log to replay
        #[arg(short, long)]
        log: PathBuf,

        /// Scenario the game was played with (defaults to the recorded one)
        #[arg(short, long)]
        scenario: Option<String>,
    },

    /// Verify determinism with random agents
    Verify {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "two_player")]
        scenario: String,

        /// Game seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Number of runs
        #[arg(short, long, default_value = "3")]
        runs: usize,

        /// Seed for the random agents
        #[arg(long, default_value = "0")]
        agent_seed: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout may carry the agent protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            agents,
            stdio,
            players,
            seed,
            agent_seed,
            game_id,
            logdir,
        }) => {
            cmd_run(
                &scenario, agents, stdio, players, seed, agent_seed, game_id, logdir,
            );
        }
        Some(Commands::Replay { log, scenario }) => {
            cmd_replay(log, scenario.as_deref());
        }
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
            agent_seed,
        }) => {
            cmd_verify(&scenario, seed, runs, agent_seed);
        }
        None => {
            // Default: a random two-player match
            cmd_run(
                "two_player",
                Vec::new(),
                false,
                None,
                None,
                0,
                None,
                PathBuf::from("logs"),
            );
        }
    }
}

fn load_scenario(name: &str) -> Scenario {
    match Scenario::resolve(name) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Failed to load scenario: {}", e);
            std::process::exit(1);
        }
    }
}

/// Play one match
fn cmd_run(
    scenario: &str,
    agents: Vec<String>,
    stdio: bool,
    players: Option<usize>,
    seed: Option<u64>,
    agent_seed: u64,
    game_id: Option<String>,
    logdir: PathBuf,
) {
    let mut scenario = load_scenario(scenario);
    if let Some(players) = players {
        scenario = scenario.with_players(players);
    }
    if let Some(seed) = seed {
        scenario = scenario.with_seed(seed);
    }
    if let Some(game_id) = game_id {
        scenario.game.game_id = game_id;
    }
    let config = match scenario.config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid game setup: {}", e);
            std::process::exit(1);
        }
    };

    let commands = if agents.is_empty() {
        scenario.agents.clone()
    } else {
        agents
    };
    let seats = if stdio {
        Seats::new(vec![Box::new(StreamAgent::stdio()) as Box<dyn Agent>])
    } else if commands.is_empty() {
        tracing::info!(agent_seed, "using built-in random agents");
        Seats::random(config.players, agent_seed)
    } else {
        let spawned: Result<Vec<Box<dyn Agent>>, _> = commands
            .iter()
            .map(|command| {
                ProcessAgent::from_command_line(command).map(|agent| Box::new(agent) as Box<dyn Agent>)
            })
            .collect();
        match spawned {
            Ok(agents) => Seats::new(agents),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    };
    let seats = match seats {
        Ok(seats) => seats,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let log = match GameLog::create(&logdir, &config.game_id) {
        Ok(log) => log,
        Err(e) => {
            eprintln!("Failed to open game log: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(path = %log.path().display(), "logging decisions");
    let mut seats = seats.with_log(log);

    let report = match run_match(&config, &mut seats) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "match failed");
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    };
    // Shut agent processes down before printing.
    drop(seats);

    let json = match report.to_json() {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Failed to encode report: {}", e);
            std::process::exit(1);
        }
    };
    if stdio {
        eprintln!("{}", json);
    } else {
        println!("{}", json);
    }
}

/// Replay a recorded game
fn cmd_replay(log: PathBuf, scenario: Option<&str>) {
    let config = scenario.map(|name| {
        let scenario = load_scenario(name);
        match scenario.config() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Invalid game setup: {}", e);
                std::process::exit(1);
            }
        }
    });

    let report = match replay(&log, config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Replay failed: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("Replayed {}/{} decisions", report.replayed, report.records);
    eprintln!("Final hash: {}", report.state_hash);
    if let Some(reason) = &report.divergence {
        eprintln!("Diverged: {}", reason);
    }
    if let Some(expected) = report.expected_hash {
        eprintln!("Recorded hash: {}", expected);
    }
    if report.is_faithful() {
        eprintln!("PASS: replay matches the log");
    } else {
        eprintln!("FAIL: replay does not match the log");
        std::process::exit(1);
    }
}

/// Verify determinism
fn cmd_verify(scenario: &str, seed: u64, runs: usize, agent_seed: u64) {
    let config = match load_scenario(scenario).with_seed(seed).config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid game setup: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        config.game_id,
        seed,
        runs
    );

    let report = match verify_determinism(&config, runs, agent_seed) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Verification failed: {}", e);
            std::process::exit(1);
        }
    };

    if report.is_deterministic() {
        eprintln!(
            "PASS: All {} runs produced identical results ({} turns)",
            runs, report.turns
        );
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        eprintln!("Hashes: {:?}", report.hashes);
        std::process::exit(1);
    }
}
