//! Core War command-line front-end.
//!
//! Runs a single battle or a round-robin tournament between Redcode warriors.
//! Warriors are loaded from `.red` files; the built-in roster is used when no
//! files are given.

use clap::{Parser, Subcommand};
use corewar::battle::{BattleConfig, BattleManager, Outcome, Tournament};
use corewar::loader::load_warrior;
use corewar::mars::errors::MarsError;
use corewar::utils::log::{self, Level};
use corewar::warrior::{self, Warrior};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "corewar", about = "Core War: Redcode warriors battling in a shared core")]
struct Cli {
    /// Number of cells in the circular core.
    #[arg(long, default_value_t = 8000)]
    core_size: usize,

    /// Cycle ceiling before a battle is declared a draw.
    #[arg(long, default_value_t = 80_000)]
    max_cycles: usize,

    /// Show battle lifecycle logging.
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single battle and print the result.
    Battle {
        /// Warrior files (.red); the built-in Imp and Dwarf when omitted.
        files: Vec<PathBuf>,
    },
    /// Run a round-robin tournament and print the rankings.
    Tournament {
        /// Warrior files (.red); the full built-in roster when omitted.
        files: Vec<PathBuf>,

        /// Battles per pairing (load order alternates between rounds).
        #[arg(long, default_value_t = 10)]
        rounds: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    log::init(if cli.verbose { Level::Info } else { Level::Warn });

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), MarsError> {
    let config = BattleConfig {
        core_size: cli.core_size,
        max_cycles: cli.max_cycles,
        ..BattleConfig::default()
    };

    match cli.command {
        Command::Battle { files } => {
            let warriors = if files.is_empty() {
                vec![warrior::imp(), warrior::dwarf()]
            } else {
                load_all(&files)?
            };
            run_battle(config, warriors)
        }
        Command::Tournament { files, rounds } => {
            let warriors = if files.is_empty() {
                warrior::builtins()
            } else {
                load_all(&files)?
            };
            run_tournament(config, warriors, rounds)
        }
    }
}

fn load_all(files: &[PathBuf]) -> Result<Vec<Warrior>, MarsError> {
    files.iter().map(|path| load_warrior(path)).collect()
}

fn run_battle(config: BattleConfig, warriors: Vec<Warrior>) -> Result<(), MarsError> {
    let names: Vec<&str> = warriors.iter().map(|w| w.name.as_str()).collect();
    println!("battle: {}", names.join(" vs "));

    let mut battle = BattleManager::new(config, warriors)?;
    let outcome = battle.run_to_completion();
    let stats = battle.stats();

    match outcome {
        Outcome::Winner(i) => {
            let winner = &battle.warriors()[i];
            println!("winner: {} by {}", winner.name, winner.author);
        }
        Outcome::Draw => println!("result: draw"),
    }
    println!(
        "cycles: {} in {:.3?}",
        stats.total_cycles,
        stats.duration()
    );

    for (i, w) in battle.warriors().iter().enumerate() {
        println!(
            "{}: start={} instructions={} max_processes={}",
            w.name, w.start, stats.instructions_run[i], stats.max_processes[i]
        );
    }
    Ok(())
}

fn run_tournament(
    config: BattleConfig,
    warriors: Vec<Warrior>,
    rounds: usize,
) -> Result<(), MarsError> {
    println!(
        "tournament: {} warriors, {rounds} rounds per pairing",
        warriors.len()
    );

    let mut tournament = Tournament::new(warriors, rounds, config);
    tournament.run()?;

    println!(
        "battles: {} ({} draws)",
        tournament.total_battles(),
        tournament.draws()
    );
    for (rank, (index, wins)) in tournament.rankings().into_iter().enumerate() {
        println!(
            "{}. {}: {wins} wins",
            rank + 1,
            tournament.warriors()[index].name
        );
    }
    Ok(())
}
