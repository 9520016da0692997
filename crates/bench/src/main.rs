//! Batch runner for playout strategies.
//!
//! Runs many playouts in parallel against one shared statistics session,
//! or plays whole games with root-parallel search, over the built-in games.
//! Results are printed as JSON so runs can be compared by scripts.

use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use playout_core::{Context, Game, Status};
use playout_mcts::games::{Lights, Race, TicTacToe};
use playout_mcts::{root_parallel_search, PlayoutStrategy, SearchConfig, Session, Strategy};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// Playout strategy benchmark tool.
#[derive(Parser)]
#[command(name = "playout-bench")]
#[command(about = "Run playouts and searches with configurable playout strategies")]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run independent playouts from the initial position.
    Playouts {
        #[command(flatten)]
        game: GameArgs,

        /// Strategy name followed by `key=value` options.
        #[arg(short, long, num_args = 1.., default_value = "random")]
        strategy: Vec<String>,

        /// Number of playouts.
        #[arg(short, long, default_value = "1000")]
        count: u64,

        /// Random seed; playout `i` uses `seed + i`.
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Play one game where every player searches with the same strategy.
    Search {
        #[command(flatten)]
        game: GameArgs,

        /// Strategy name followed by `key=value` options.
        #[arg(short, long, num_args = 1.., default_value = "mast")]
        strategy: Vec<String>,

        /// Simulations per tree and move.
        #[arg(long, default_value = "500")]
        simulations: usize,

        /// Independent trees searched in parallel per move.
        #[arg(long, default_value = "4")]
        trees: usize,

        /// Longest n-gram tracked by the shared session.
        #[arg(long, default_value = "3")]
        max_ngram_length: usize,

        /// Wall-clock budget per tree and move, in milliseconds.
        #[arg(long)]
        time_limit_ms: Option<u64>,

        /// Temperature for move selection (0 = most visited move).
        #[arg(short, long, default_value = "0.0")]
        temperature: f64,

        /// Stop the game after this many moves.
        #[arg(long, default_value = "200")]
        max_moves: usize,

        /// Random seed for reproducibility.
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GameKind {
    TicTacToe,
    Race,
    Lights,
}

#[derive(clap::Args)]
struct GameArgs {
    /// Game to play.
    #[arg(short, long, value_enum, default_value = "tic-tac-toe")]
    game: GameKind,

    /// Number of race players.
    #[arg(long, default_value = "3")]
    players: usize,

    /// Race track length.
    #[arg(long, default_value = "20")]
    track: u8,

    /// Number of lights in the puzzle.
    #[arg(long, default_value = "8")]
    lights: u8,
}

impl GameArgs {
    /// Reject sizes the built-in games cannot be created with.
    fn validate(&self) -> Result<()> {
        match self.game {
            GameKind::TicTacToe => {}
            GameKind::Race => {
                anyhow::ensure!(self.players >= 2, "A race needs at least 2 players");
                anyhow::ensure!(self.track > 0, "The race track must not be empty");
            }
            GameKind::Lights => {
                anyhow::ensure!(
                    (1..=32).contains(&self.lights),
                    "The lights puzzle needs between 1 and 32 lights"
                );
            }
        }
        Ok(())
    }

    fn race(&self) -> Race {
        Race::new(self.players, self.track)
    }

    fn lights(&self) -> Lights {
        Lights::new(self.lights)
    }
}

/// Summary of a batch of playouts.
#[derive(Serialize, Debug)]
struct PlayoutReport {
    strategy: String,
    playouts: u64,
    mean_length: f64,
    mean_decisions: f64,
    wins: Vec<u64>,
    draws: u64,
    unfinished: u64,
    single_move_entries: usize,
    ngram_entries: usize,
    elapsed_ms: u128,
}

/// Record of one searched game.
#[derive(Serialize, Debug)]
struct GameReport {
    strategy: String,
    moves: Vec<String>,
    winner: Option<usize>,
    finished: bool,
    simulations: usize,
    elapsed_ms: u128,
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn build_strategy<G: Game>(tokens: &[String], game: &G) -> Result<Strategy<G>> {
    let mut strategy = Strategy::from_tokens(tokens)
        .with_context(|| format!("Invalid strategy: {}", tokens.join(" ")))?;
    strategy.init(game);
    if !strategy.supports_game(game) {
        anyhow::bail!(
            "Strategy '{}' does not support this game (puzzles need playoutturnlimit)",
            strategy.name()
        );
    }
    Ok(strategy)
}

fn run_playouts<G>(game: &G, tokens: &[String], count: u64, seed: u64) -> Result<PlayoutReport>
where
    G: Game,
    G::State: Sync,
{
    let strategy = build_strategy(tokens, game)?;
    let flags = strategy.backprop_flags();
    let session = Session::default();
    let context = Context::new(game);
    let start = Instant::now();

    let outcomes: Vec<(usize, usize, Option<Status>)> = (0..count)
        .into_par_iter()
        .map(|i| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i));
            let trial = strategy.run_playout(&session, game, &context, &mut rng);
            if !flags.is_empty() {
                let utilities = trial.utilities(game.num_players());
                session.backpropagate(&trial, 0, &utilities, flags);
            }
            (trial.num_moves(), trial.num_decisions(), trial.status())
        })
        .collect();

    let mut wins = vec![0; game.num_players()];
    let mut draws = 0;
    let mut unfinished = 0;
    for (_, _, status) in &outcomes {
        match status {
            Some(Status::Win(winner)) => wins[*winner] += 1,
            Some(Status::Draw) => draws += 1,
            None => unfinished += 1,
        }
    }
    let total_length: usize = outcomes.iter().map(|(length, _, _)| length).sum();
    let total_decisions: usize = outcomes.iter().map(|(_, decisions, _)| decisions).sum();

    Ok(PlayoutReport {
        strategy: strategy.name().to_string(),
        playouts: count,
        mean_length: total_length as f64 / count.max(1) as f64,
        mean_decisions: total_decisions as f64 / count.max(1) as f64,
        wins,
        draws,
        unfinished,
        single_move_entries: session.num_single_move_entries(),
        ngram_entries: session.num_ngram_entries(),
        elapsed_ms: start.elapsed().as_millis(),
    })
}

struct SearchArgs {
    config: SearchConfig,
    trees: usize,
    temperature: f64,
    max_moves: usize,
    seed: u64,
}

fn play_game<G>(game: &G, tokens: &[String], args: &SearchArgs) -> Result<GameReport>
where
    G: Game,
    G::State: Sync,
{
    let strategy = build_strategy(tokens, game)?;
    let mut context = Context::new(game);
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut moves = Vec::new();
    let mut simulations = 0;
    let start = Instant::now();

    while !context.is_over() && moves.len() < args.max_moves {
        let ply = context.trial().num_moves() as u64;
        let result = root_parallel_search(
            game,
            &context,
            &strategy,
            &args.config,
            args.trees,
            args.seed.wrapping_add(ply * args.trees as u64),
        )
        .with_context(|| format!("Search failed at move {}", moves.len() + 1))?;

        let mv = result.select_move(args.temperature, &mut rng);
        info!(
            ply,
            mover = context.mover(game),
            mv = ?mv,
            root_value = result.root_value,
            "move chosen"
        );
        simulations += result.simulations;
        moves.push(format!("{mv:?}"));
        context.apply(game, mv);
    }

    debug!(moves = moves.len(), status = ?context.status(), "game finished");
    Ok(GameReport {
        strategy: strategy.name().to_string(),
        moves,
        winner: context.status().and_then(Status::winner),
        finished: context.is_over(),
        simulations,
        elapsed_ms: start.elapsed().as_millis(),
    })
}

fn print_json<T: Serialize>(report: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    println!("{json}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Playouts {
            game,
            strategy,
            count,
            seed,
        } => {
            game.validate()?;
            info!(game = ?game.game, strategy = %strategy.join(" "), count, "running playouts");
            let report = match game.game {
                GameKind::TicTacToe => run_playouts(&TicTacToe, &strategy, count, seed)?,
                GameKind::Race => run_playouts(&game.race(), &strategy, count, seed)?,
                GameKind::Lights => run_playouts(&game.lights(), &strategy, count, seed)?,
            };
            print_json(&report)
        }

        Commands::Search {
            game,
            strategy,
            simulations,
            trees,
            max_ngram_length,
            time_limit_ms,
            temperature,
            max_moves,
            seed,
        } => {
            let config = SearchConfig {
                max_ngram_length,
                time_limit: time_limit_ms.map(Duration::from_millis),
                ..SearchConfig::with_simulations(simulations)
            };
            let args = SearchArgs {
                config,
                trees,
                temperature,
                max_moves,
                seed,
            };
            game.validate()?;
            info!(
                game = ?game.game,
                strategy = %strategy.join(" "),
                simulations,
                trees,
                "playing game"
            );
            let report = match game.game {
                GameKind::TicTacToe => play_game(&TicTacToe, &strategy, &args)?,
                GameKind::Race => play_game(&game.race(), &strategy, &args)?,
                GameKind::Lights => play_game(&game.lights(), &strategy, &args)?,
            };
            print_json(&report)
        }
    }
}
