use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use typist::runner::{print_trace_line, run_realtime, sleep_interruptible};
use typist::scheduler::{ManualClock, SystemClock};
use typist::{sim, trace, SimulationConfig, TypingEngine, TypingStats};

/// One virtual day; a run that has not finished by then never will.
const DEFAULT_VIRTUAL_LIMIT_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Args)]
struct EngineArgs {
    /// Input text file, or '-' for stdin
    #[arg(long, value_name = "PATH")]
    input: PathBuf,

    /// JSON file with simulation settings; missing fields keep their defaults
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Optional RNG seed (for reproducible runs)
    #[arg(long)]
    seed: Option<u64>,

    /// Override the mean per-character delay in milliseconds
    #[arg(long)]
    speed: Option<f64>,

    /// Override the mistake probability per character (0.0-1.0).
    ///
    /// Set to 0 for straight-through typing.
    #[arg(long)]
    mistakes: Option<f64>,

    /// Allow corrections to backspace one character too far
    #[arg(long)]
    over_correct: bool,

    /// Log listener panics and engine internals
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Parser)]
#[command(name = "typist")]
#[command(about = "Simulates a human typing a piece of text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the simulation in virtual time and report what happened
    Simulate {
        #[command(flatten)]
        engine: EngineArgs,

        /// Write the event log (JSON) to this file, or '-' for stdout
        #[arg(long, value_name = "PATH")]
        events: Option<PathBuf>,

        /// Give up after this many virtual milliseconds
        #[arg(long, default_value_t = DEFAULT_VIRTUAL_LIMIT_MS)]
        limit_ms: u64,

        /// Disable console typing trace output
        #[arg(long)]
        no_trace: bool,
    },

    /// Type the text to stdout in real time
    Play {
        #[command(flatten)]
        engine: EngineArgs,

        /// Countdown seconds before typing starts
        #[arg(long, default_value_t = 0)]
        countdown: u64,

        /// Disable console typing trace output
        #[arg(long)]
        no_trace: bool,
    },
}

fn read_input(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == std::ffi::OsStr::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }

    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_output(path: &PathBuf, contents: &str) -> Result<()> {
    if path.as_os_str() == std::ffi::OsStr::new("-") {
        println!("{contents}");
        return Ok(());
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn build_config(args: &EngineArgs) -> Result<SimulationConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<SimulationConfig>(&json)
                .with_context(|| format!("failed to parse config JSON in {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };

    if let Some(speed) = args.speed {
        if !speed.is_finite() || speed < 0.0 {
            return Err(anyhow!("--speed must be a non-negative number of milliseconds"));
        }
        cfg.base_speed_ms = speed;
    }
    if let Some(mistakes) = args.mistakes {
        if !(0.0..=1.0).contains(&mistakes) {
            return Err(anyhow!("--mistakes must be between 0.0 and 1.0"));
        }
        cfg.mistake_frequency = mistakes;
    }
    cfg.over_correction |= args.over_correct;
    cfg.debug |= args.debug;

    Ok(cfg.sanitized())
}

fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn print_stats(stats: &TypingStats) {
    eprintln!(
        "Typed {} chars ({} committed), {} mistakes ({} corrected), {} backspaces",
        stats.total_chars,
        stats.chars_typed,
        stats.mistakes_made,
        stats.mistakes_corrected,
        stats.backspaces
    );
    eprintln!(
        "Took {:.1}s active ({:.1}s paused), {:.1} WPM",
        stats.total_duration_ms as f64 / 1000.0,
        stats.paused_ms as f64 / 1000.0,
        stats.wpm
    );
}

fn simulate(
    engine_args: &EngineArgs,
    events: Option<PathBuf>,
    limit_ms: u64,
    show_trace: bool,
) -> Result<()> {
    let text = read_input(&engine_args.input)?;
    let cfg = build_config(engine_args)?;
    let rng = rng_from_seed(engine_args.seed);

    let mut engine = TypingEngine::with_clock(text, cfg, ManualClock::new(), rng);
    engine.start();
    if !engine.run_until_complete(limit_ms) {
        return Err(anyhow!(
            "simulation did not finish within {limit_ms} virtual ms (state {:?})",
            engine.state()
        ));
    }

    if show_trace {
        for line in trace::console_trace(engine.events()) {
            print_trace_line(&line);
        }
    }

    let summary = sim::summarize(engine.events());
    log::debug!("event summary: {summary:?}");
    print_stats(&engine.stats());

    if let Some(out) = events {
        let json = serde_json::to_string_pretty(engine.events())
            .context("failed to serialize event log")?;
        write_output(&out, &json)?;
    }

    Ok(())
}

fn play(engine_args: &EngineArgs, countdown_secs: u64, show_trace: bool) -> Result<()> {
    let text = read_input(&engine_args.input)?;
    let cfg = build_config(engine_args)?;
    let rng = rng_from_seed(engine_args.seed);

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })
        .context("failed to install Ctrl+C handler")?;
    }

    if countdown_secs > 0 {
        eprintln!("Starting in {countdown_secs}s...");
        for remaining in (1..=countdown_secs).rev() {
            eprintln!("{remaining}...");
            if !sleep_interruptible(&stop, 1000) {
                return Err(anyhow!("aborted"));
            }
        }
    }

    let mut engine = TypingEngine::with_clock(text, cfg, SystemClock::new(), rng);
    engine.on_character(|c, _| {
        let mut out = io::stdout().lock();
        let _ = write!(out, "{c}");
        let _ = out.flush();
    });
    engine.on_backspace(|_| {
        let mut out = io::stdout().lock();
        let _ = write!(out, "\u{8} \u{8}");
        let _ = out.flush();
    });

    let result = run_realtime(&mut engine, &stop);
    println!();

    if show_trace {
        for line in trace::console_trace(engine.events()) {
            print_trace_line(&line);
        }
    }
    print_stats(&engine.stats());

    result
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Simulate {
            engine,
            events,
            limit_ms,
            no_trace,
        } => simulate(&engine, events, limit_ms, !no_trace)?,
        Command::Play {
            engine,
            countdown,
            no_trace,
        } => play(&engine, countdown, !no_trace)?,
    }

    Ok(())
}
