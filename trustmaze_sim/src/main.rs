//! TrustMaze Simulator CLI
//!
//! Run a reliance study: one baseline condition plus one tooled condition per
//! noise level, reporting the Blind Reliance Index for each.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use trustmaze_core::{HistoryRetention, MazeDifficulty, NoiseType};
use trustmaze_sim::{ExperimentConfig, RelianceStudy, SimError, StrategyKind, StudyConfig, StudyExport, StudyReport};

/// TrustMaze tool-reliance study CLI
#[derive(Parser, Debug)]
#[command(name = "trustmaze-sim")]
#[command(about = "Measure how heuristic agents rely on a noisy maze planner", long_about = None)]
struct Args {
    /// Experiment seed (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Maze side length
    #[arg(long, default_value = "16")]
    size: usize,

    /// Maze difficulty (easy, medium, hard)
    #[arg(short, long, default_value = "medium")]
    difficulty: String,

    /// Episodes per condition
    #[arg(short, long, default_value = "10")]
    episodes: usize,

    /// Decision strategy (tool_trusting, tool_avoiding, adaptive)
    #[arg(short = 'S', long, default_value = "adaptive")]
    strategy: String,

    /// Noise model for tooled conditions (none, random, biased, delayed, combined)
    #[arg(short, long, default_value = "random")]
    noise_type: String,

    /// Comma-separated noise levels, one tooled condition each
    #[arg(long, value_delimiter = ',', default_value = "0.0,0.2,0.4,0.6")]
    noise_levels: Vec<f64>,

    /// Probability of querying the tool on a step
    #[arg(short, long, default_value = "0.5")]
    query_frequency: f64,

    /// Step budget per episode
    #[arg(short, long, default_value = "500")]
    max_steps: usize,

    /// Keep only this many planner calls per episode
    #[arg(long)]
    history_capacity: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for scripting
    #[arg(long)]
    json: bool,

    /// Export full study results to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn study_config(args: &Args, seed: u64) -> Result<StudyConfig, SimError> {
    let difficulty: MazeDifficulty = args.difficulty.parse()?;
    let strategy: StrategyKind = args.strategy.parse()?;
    let noise_type: NoiseType = args.noise_type.parse()?;

    Ok(StudyConfig {
        base: ExperimentConfig {
            maze_size: args.size,
            difficulty,
            num_episodes: args.episodes,
            strategy,
            noise_type,
            tool_query_frequency: args.query_frequency,
            seed,
            max_steps_per_episode: args.max_steps,
            history_retention: args
                .history_capacity
                .map_or(HistoryRetention::Unbounded, HistoryRetention::Bounded),
            ..Default::default()
        },
        noise_levels: args.noise_levels.clone(),
    })
}

fn print_summary(report: &StudyReport) {
    info!("");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for condition in &report.conditions {
        if let Some(m) = &condition.result.metrics {
            info!(
                "{:<24} success={:.2} steps={:>6.1} stepwise={:.3} follow={:.2}",
                condition.name, m.success_rate, m.avg_steps, m.avg_stepwise_accuracy, m.avg_tool_following_rate
            );
        }
    }
    info!("");
    info!("{:<24} {:>5} {:>5} {:>5} {:>6}  band", "condition", "TA", "CR", "TSA", "BRI");
    for row in &report.bri {
        info!(
            "{:<24} {:>5.2} {:>5.2} {:>5.3} {:>6.3}  {}",
            row.condition, row.tool_accuracy, row.call_rate, row.tool_stepwise_accuracy, row.bri, row.band
        );
    }
}

/// Seed 0 picks one from the clock: seconds mixed with the sub-second nanos.
fn resolve_seed(seed: u64) -> u64 {
    if seed != 0 {
        return seed;
    }
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()))
        .unwrap_or(42)
}

fn run(args: &Args) -> Result<(), SimError> {
    let seed = resolve_seed(args.seed);

    let study = RelianceStudy::new(study_config(args, seed)?)?;
    let report = study.run()?;

    if let Some(path) = &args.export {
        let export = StudyExport::from_report(&report);
        export.write_to_file(path)?;
        info!("Exported {} conditions to {}", export.conditions.len(), path);
    }

    if args.json {
        let summary = serde_json::json!({
            "seed": report.seed,
            "conditions": report.conditions.iter().map(|c| {
                serde_json::json!({
                    "name": c.name,
                    "experiment_id": c.result.experiment_id,
                    "noise_level": c.noise_level,
                    "metrics": c.result.metrics.as_ref().map(|m| m.to_map()),
                })
            }).collect::<Vec<_>>(),
            "bri": report.bri,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    if !args.json {
        info!("TrustMaze Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            if matches!(e, SimError::Config(_)) {
                eprintln!("Available difficulties: easy, medium, hard");
                eprintln!("Available strategies: tool_trusting, tool_avoiding, adaptive");
                eprintln!("Available noise types: none, random, biased, delayed, combined");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_map_onto_study_config() {
        let args = Args::parse_from([
            "trustmaze-sim",
            "--difficulty",
            "hard",
            "--strategy",
            "tool_trusting",
            "--noise-levels",
            "0.1,0.3",
            "--history-capacity",
            "8",
        ]);
        let config = study_config(&args, 7).unwrap();
        assert_eq!(config.base.difficulty, MazeDifficulty::Hard);
        assert_eq!(config.base.strategy, StrategyKind::ToolTrusting);
        assert_eq!(config.base.noise_type, NoiseType::Random);
        assert_eq!(config.base.seed, 7);
        assert_eq!(config.base.history_retention, HistoryRetention::Bounded(8));
        assert_eq!(config.noise_levels, vec![0.1, 0.3]);
    }

    #[test]
    fn test_resolve_seed() {
        assert_eq!(resolve_seed(7), 7);
        assert_ne!(resolve_seed(0), 0);
    }

    #[test]
    fn test_unknown_identifier_is_config_error() {
        let args = Args::parse_from(["trustmaze-sim", "--noise-type", "gaussian"]);
        assert!(matches!(study_config(&args, 1), Err(SimError::Config(_))));
    }
}
