use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shapewatch::analysis::{Analyzer, Selection};
use shapewatch::config::Config;
use shapewatch::data::load_series;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// CSV file with the series to analyze.
    #[arg(long)]
    input: PathBuf,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file to write the results to, stdout if absent.
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Detect upward spikes.
    Spikes {
        #[arg(long)]
        quantile: Option<f64>,
    },

    /// Detect trend turning points.
    Turns {
        #[arg(long)]
        w_pre: Option<usize>,
        #[arg(long)]
        w_post: Option<usize>,
        #[arg(long)]
        q_h: Option<f64>,
        #[arg(long)]
        q_flat: Option<f64>,
        #[arg(long)]
        q_trend: Option<f64>,
    },

    /// Detect both spikes and turning points.
    Analyze,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mut cfg = match &args.config {
        Some(file) => Config::from_file(file).context("failed to construct cfg")?,
        None => Config::default(),
    };

    let selection = match args.command {
        Command::Spikes { quantile } => {
            cfg.spike.quantile = quantile.unwrap_or(cfg.spike.quantile);
            Selection::Spikes
        }
        Command::Turns {
            w_pre,
            w_post,
            q_h,
            q_flat,
            q_trend,
        } => {
            let turn = &mut cfg.turn;
            turn.w_pre = w_pre.unwrap_or(turn.w_pre);
            turn.w_post = w_post.unwrap_or(turn.w_post);
            turn.q_h = q_h.unwrap_or(turn.q_h);
            turn.q_flat = q_flat.unwrap_or(turn.q_flat);
            turn.q_trend = q_trend.unwrap_or(turn.q_trend);
            Selection::Turns
        }
        Command::Analyze => Selection::Both,
    };
    cfg.validate().context("invalid command line parameters")?;
    log::info!("{cfg:#?}");

    let series = load_series(&args.input, &cfg.input).context("failed to load series")?;

    let analyzer = Analyzer::new(cfg);
    let report = analyzer
        .analyze(&series, selection)
        .context("failed to analyze series")?;
    analyzer
        .save_results(&report, args.output.as_ref())
        .context("failed to save results")?;

    Ok(())
}
