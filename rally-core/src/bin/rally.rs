//! Rally CLI - record tennis matches point by point
//!
//! Usage:
//!     rally new --player-a Ana --player-b Bea --sets 3
//!     rally point <match-id> winner --winner a --shot forehand
//!     rally fault <match-id>
//!     rally undo <match-id>
//!     rally stats <match-id> --json
//!     rally simulate --seed 1 --count 100
//!
//! Matches live in the data directory (`.rally` by default, see
//! `RALLY_DATA_DIR` and `rally.json`).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rally_core::export::{export_matches, import_bundle, ExportBundle};
use rally_core::settings::FinalSetType;
use rally_core::stats::PlayerStats;
use rally_core::{
    CrossValidator, FileStore, MatchSession, MatchSettings, MatchStore, OutcomeKind, PersistStatus,
    Player, Players, PointInput, RallyConfig, RallyError, RecordOutcome, Result, ShotKind,
};

#[derive(Parser, Debug)]
#[command(name = "rally")]
#[command(about = "Record tennis matches point by point")]
#[command(version)]
struct Cli {
    /// Path to a JSON config file (default: ./rally.json if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a new match
    New {
        #[arg(long, default_value = "Player A")]
        player_a: String,
        #[arg(long, default_value = "Player B")]
        player_b: String,
        /// Best of 1, 3 or 5 sets
        #[arg(long)]
        sets: Option<u8>,
        /// Games needed to win a set
        #[arg(long)]
        games: Option<u8>,
        /// Sudden-death point at deuce
        #[arg(long)]
        no_ad: bool,
        /// Play a super tie-break instead of the deciding set
        #[arg(long)]
        super_tie_break: bool,
        /// Who serves first (a or b)
        #[arg(long)]
        first_server: Option<Player>,
    },
    /// Record a point
    Point {
        match_id: String,
        /// ace, winner, serve_fault, double_fault, return_error, unforced_error, forced_error
        outcome: OutcomeKind,
        /// Who won the point (a or b); derived for aces, faults and return errors
        #[arg(short, long)]
        winner: Option<Player>,
        #[arg(short, long)]
        shot: Option<ShotKind>,
    },
    /// Record a serve fault (a double fault on second serve)
    Fault { match_id: String },
    /// Remove the most recent point
    Undo { match_id: String },
    /// Show the scoreboard
    Show { match_id: String },
    /// Show match statistics
    Stats { match_id: String },
    /// Print the point log
    Log { match_id: String },
    /// List stored matches
    List,
    /// Export matches to a bundle file (all matches when no id is given)
    Export {
        #[arg(short, long)]
        out: PathBuf,
        match_ids: Vec<String>,
    },
    /// Import a bundle file
    Import { file: PathBuf },
    /// Cross-validate the engine on simulated matches
    Simulate {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 100)]
        count: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match RallyConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing (to stderr so it doesn't mix with command output)
    let filter = EnvFilter::try_from_env("RALLY_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let response = e.to_error_response();
                match serde_json::to_string_pretty(&response) {
                    Ok(json) => eprintln!("{}", json),
                    Err(_) => eprintln!("Error [{}]: {}", e.error_code(), e),
                }
            } else {
                eprintln!("Error [{}]: {}", e.error_code(), e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &RallyConfig) -> Result<()> {
    let store: Arc<dyn MatchStore> = Arc::new(FileStore::new(&config.data_dir)?);
    tracing::debug!(data_dir = %config.data_dir.display(), "Using file store");

    match &cli.command {
        Command::New {
            player_a,
            player_b,
            sets,
            games,
            no_ad,
            super_tie_break,
            first_server,
        } => {
            let mut settings: MatchSettings = config.default_settings.clone();
            if let Some(sets) = sets {
                settings.number_of_sets = *sets;
            }
            if let Some(games) = games {
                settings.games_per_set = *games;
            }
            if *no_ad {
                settings.ad_scoring = false;
            }
            if *super_tie_break {
                settings.final_set_type = FinalSetType::SuperTieBreak;
            }
            if let Some(server) = first_server {
                settings.first_server = *server;
            }

            let (session, persist) =
                MatchSession::start(settings, Players::new(player_a, player_b), store)?;
            report_persist(&persist);
            if cli.json {
                print_json(session.record())?;
            } else {
                println!("{}", session.id());
                println!("{}", session.scoreboard());
            }
        }
        Command::Point {
            match_id,
            outcome,
            winner,
            shot,
        } => {
            let input = PointInput {
                outcome: *outcome,
                winner: *winner,
                shot: *shot,
            };
            let mut session = open(&store, match_id)?;
            let outcome = session.record_point(&input)?;
            print_outcome(cli, &outcome)?;
        }
        Command::Fault { match_id } => {
            let mut session = open(&store, match_id)?;
            let outcome = session.record_point(&PointInput::serve_fault())?;
            print_outcome(cli, &outcome)?;
        }
        Command::Undo { match_id } => {
            let mut session = open(&store, match_id)?;
            let outcome = session.undo_last_point()?;
            print_outcome(cli, &outcome)?;
        }
        Command::Show { match_id } => {
            let session = open(&store, match_id)?;
            if cli.json {
                print_json(&session.scoreboard())?;
            } else {
                let players = &session.record().players;
                println!("{} vs {}", players.a, players.b);
                println!("{}", session.scoreboard());
            }
        }
        Command::Stats { match_id } => {
            let session = open(&store, match_id)?;
            let stats = session.stats();
            if cli.json {
                print_json(&stats)?;
            } else {
                let players = &session.record().players;
                print_player_stats(&players.a, &stats.a);
                print_player_stats(&players.b, &stats.b);
                println!("Total points: {}", stats.total_points);
            }
        }
        Command::Log { match_id } => {
            let session = open(&store, match_id)?;
            let log = &session.state().log;
            if cli.json {
                print_json(log)?;
            } else {
                for entry in log {
                    println!(
                        "#{:<4} set {} game {:<2} {} serve {:<3} {:<15} {:<9} {:<10} games {} sets {}{}",
                        entry.sequence(),
                        entry.set_number,
                        entry.game_number,
                        entry.server_at_time(),
                        entry.serve_attempt().number(),
                        entry.outcome(),
                        entry.winner().map(|w| w.to_string()).unwrap_or_else(|| "-".to_string()),
                        entry.game_score_after.to_string(),
                        entry.games_score_after,
                        entry.sets_score_after,
                        if entry.is_break_point { " BP" } else { "" },
                    );
                }
            }
        }
        Command::List => {
            let ids = store.list_ids()?;
            if cli.json {
                print_json(&ids)?;
            } else {
                for id in ids {
                    let record = store.load(&id)?;
                    println!(
                        "{}  {} vs {}  {}  updated {}",
                        record.id,
                        record.players.a,
                        record.players.b,
                        record.state.scoreboard(),
                        record.updated_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
        Command::Export { out, match_ids } => {
            let ids = if match_ids.is_empty() {
                store.list_ids()?
            } else {
                match_ids
                    .iter()
                    .map(|id| resolve_id(store.as_ref(), id))
                    .collect::<Result<Vec<_>>>()?
            };
            let bundle = export_matches(store.as_ref(), &ids)?;
            let file = std::fs::File::create(out).map_err(|e| RallyError::IoError {
                message: format!("Failed to create {}: {}", out.display(), e),
            })?;
            bundle.write_to(std::io::BufWriter::new(file))?;
            println!("Exported {} match(es) to {}", bundle.matches.len(), out.display());
        }
        Command::Import { file } => {
            let reader = std::fs::File::open(file).map_err(|e| RallyError::IoError {
                message: format!("Failed to open {}: {}", file.display(), e),
            })?;
            let bundle = ExportBundle::read_from(std::io::BufReader::new(reader))?;
            let report = import_bundle(store.as_ref(), &bundle)?;
            if cli.json {
                print_json(&report)?;
            } else {
                println!(
                    "Inserted {}, updated {}, skipped {}",
                    report.inserted, report.updated, report.skipped
                );
                for (id, index) in &report.rewritten {
                    println!("  {} replaced recorded points from #{}", id, index);
                }
            }
        }
        Command::Simulate { seed, count } => {
            let (summary, reports) = CrossValidator::new().run_batch(*seed, *count)?;
            if cli.json {
                print_json(&summary)?;
            } else {
                println!(
                    "{} matches, {} completed, {} points, {} inconsistent",
                    summary.matches,
                    summary.completed,
                    summary.total_points,
                    summary.inconsistent_seeds.len()
                );
                for report in reports.iter().filter(|r| !r.is_consistent()) {
                    println!("seed {}:", report.seed);
                    for d in &report.discrepancies {
                        println!(
                            "  [{}] {}: engine {} reference {}",
                            d.index.map(|i| i.to_string()).unwrap_or_else(|| "-".to_string()),
                            d.field,
                            d.engine,
                            d.reference
                        );
                    }
                }
            }
            if !summary.inconsistent_seeds.is_empty() {
                return Err(RallyError::InternalError {
                    reason: format!(
                        "cross-validation failed for seeds {:?}",
                        summary.inconsistent_seeds
                    ),
                });
            }
        }
    }

    Ok(())
}

/// Accept a full id or a unique prefix of one
fn resolve_id(store: &dyn MatchStore, given: &str) -> Result<String> {
    let ids = store.list_ids()?;
    if ids.iter().any(|id| id == given) {
        return Ok(given.to_string());
    }
    let mut matching = ids.into_iter().filter(|id| id.starts_with(given));
    match (matching.next(), matching.next()) {
        (Some(id), None) => Ok(id),
        _ => Err(RallyError::MatchNotFound {
            match_id: given.to_string(),
        }),
    }
}

fn open(store: &Arc<dyn MatchStore>, given: &str) -> Result<MatchSession> {
    let id = resolve_id(store.as_ref(), given)?;
    MatchSession::resume(Arc::clone(store), &id)
}

fn report_persist(persist: &PersistStatus) {
    if let PersistStatus::Failed { code, message } = persist {
        eprintln!("Warning: match not saved [{}]: {}", code, message);
    }
}

fn print_outcome(cli: &Cli, outcome: &RecordOutcome) -> Result<()> {
    report_persist(&outcome.persist);
    if cli.json {
        print_json(outcome)
    } else {
        println!("{}", outcome.scoreboard);
        Ok(())
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_player_stats(name: &str, stats: &PlayerStats) {
    let p = &stats.percentages;
    println!("{}", name);
    println!("  Points won           {:>4}  ({:.1}%)", stats.points_won, p.points_won);
    println!("  Aces / double faults {:>4} / {}", stats.aces, stats.double_faults);
    println!(
        "  Winners / UE / FE    {:>4} / {} / {}",
        stats.winners, stats.unforced_errors, stats.forced_errors
    );
    println!("  1st serve in         {:>5.1}%", p.first_serve_in);
    println!("  1st serve pts won    {:>5.1}%", p.first_serve_points_won);
    println!("  2nd serve pts won    {:>5.1}%", p.second_serve_points_won);
    println!("  Return pts won       {:>5.1}%", p.return_points_won);
    println!(
        "  Break points         {}/{} converted, {}/{} saved",
        stats.break_points_converted,
        stats.break_point_opportunities,
        stats.break_points_saved,
        stats.break_points_faced
    );
    println!("  Longest streak       {:>4}", stats.max_consecutive_points_won);
    if !stats.shots.is_empty() {
        let shots: Vec<String> = stats
            .shots
            .iter()
            .map(|(shot, n)| format!("{} {}", shot, n))
            .collect();
        println!("  Shots                {}", shots.join(", "));
    }
}
