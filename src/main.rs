use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use ticktop::util::report;
use ticktop::{Config, Dashboard, DashboardSnapshot, Message};

#[derive(Parser, Debug)]
#[command(name = "ticktop", about = "Replay dashboard telemetry through smoothed Top-N rankings", version = "0.1")]
struct Cli {
    /// JSON-lines event file to replay ("-" or omitted = stdin)
    input: Option<PathBuf>,

    /// Print the final snapshot as JSON instead of a text report
    #[arg(long)]
    json: bool,

    /// With --json, print one compact snapshot per handled line
    #[arg(long)]
    every_tick: bool,

    /// Read on a background thread and print a snapshot every tick interval
    #[arg(short, long)]
    follow: bool,

    /// Override the number of entities ranked by every tracker
    #[arg(long)]
    top: Option<usize>,

    /// Print config file path and current values, then exit
    #[arg(long)]
    config: bool,

    /// Load configuration from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    config_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut cfg = match &cli.config_file {
        Some(path) => Config::load_from(path)?,
        None       => Config::load(),
    };
    if let Some(n) = cli.top {
        cfg = cfg.with_top_n(n);
    }

    if cli.config {
        return run_print_config(&cfg, cli.config_file.as_deref());
    }

    let dashboard = Dashboard::new(&cfg).context("invalid configuration")?;
    let input = open_input(cli.input.as_deref())?;

    if cli.follow {
        let interval = Duration::from_millis(cfg.general.tick_interval_ms.max(100));
        return run_follow(dashboard, input, interval, cli.json);
    }
    run_replay(dashboard, input, cli.json, cli.every_tick)
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead + Send>> {
    match path {
        None                            => Ok(Box::new(BufReader::new(io::stdin()))),
        Some(p) if p.as_os_str() == "-" => Ok(Box::new(BufReader::new(io::stdin()))),
        Some(p) => {
            let file = File::open(p).with_context(|| format!("opening {}", p.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

fn run_replay(
    mut dashboard: Dashboard,
    input: Box<dyn BufRead + Send>,
    json: bool,
    every_tick: bool,
) -> Result<()> {
    let mut skipped = 0usize;
    for (idx, line) in input.lines().enumerate() {
        let line = line.context("reading input")?;
        if line.trim().is_empty() {
            continue;
        }
        if let Err(e) = dashboard.handle_line(&line) {
            warn!("line {}: {}", idx + 1, e);
            skipped += 1;
            continue;
        }
        if json && every_tick {
            println!("{}", serde_json::to_string(&dashboard.snapshot())?);
        }
    }
    info!("replayed {} message(s), skipped {} line(s)", dashboard.handled(), skipped);

    if json && every_tick {
        return Ok(());
    }
    print_snapshot(&dashboard.snapshot(), json, true)
}

/// Reader thread decodes lines and sends messages; the main thread owns the
/// dashboard and prints owned snapshots between messages.
fn run_follow(
    mut dashboard: Dashboard,
    input: Box<dyn BufRead + Send>,
    interval: Duration,
    json: bool,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Message>();

    let reader = thread::spawn(move || {
        for (idx, line) in input.lines().enumerate() {
            let line = match line {
                Ok(l)  => l,
                Err(e) => { warn!("input closed: {}", e); break; }
            };
            if line.trim().is_empty() {
                continue;
            }
            match Message::parse_line(&line) {
                Ok(msg) => {
                    if tx.send(msg).is_err() {
                        break;
                    }
                }
                Err(e)  => warn!("line {}: {}", idx + 1, e),
            }
        }
    });

    let mut last_print = Instant::now();
    let mut dirty = false;
    loop {
        let wait = interval.saturating_sub(last_print.elapsed());
        match rx.recv_timeout(wait) {
            Ok(msg) => {
                dashboard.handle(msg);
                dirty = true;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
        if last_print.elapsed() >= interval {
            if dirty {
                print_snapshot(&dashboard.snapshot(), json, false)?;
                dirty = false;
            }
            last_print = Instant::now();
        }
    }

    if reader.join().is_err() {
        warn!("reader thread panicked");
    }
    print_snapshot(&dashboard.snapshot(), json, false)
}

fn print_snapshot(snap: &DashboardSnapshot, json: bool, pretty: bool) -> Result<()> {
    if !json {
        print!("{}", report::generate(snap));
        return Ok(());
    }
    if pretty {
        let doc = serde_json::json!({
            "ticktop_version": env!("CARGO_PKG_VERSION"),
            "timestamp":       chrono::Local::now().to_rfc3339(),
            "snapshot":        snap,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("{}", serde_json::to_string(snap)?);
    }
    Ok(())
}

fn run_print_config(cfg: &Config, explicit: Option<&Path>) -> Result<()> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(Config::config_path)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(unknown)".to_string());
    println!("Config: {}", path);
    println!();
    println!("[general]");
    println!("  tick_interval_ms     = {}", cfg.general.tick_interval_ms);
    println!();
    println!("[history]");
    println!("  throughput_capacity  = {}", cfg.history.throughput_capacity);
    println!("  rtt_capacity         = {}", cfg.history.rtt_capacity);
    println!("  rtt_buckets          = {}", cfg.history.rtt_buckets);
    println!("  adjustments_capacity = {}", cfg.history.adjustments_capacity);
    for (name, t) in [("top_circuits", &cfg.top_circuits), ("top_asns", &cfg.top_asns)] {
        println!();
        println!("[{}]", name);
        println!("  alpha_value          = {}", t.alpha_value);
        println!("  alpha_quality        = {}", t.alpha_quality);
        println!("  decay_factor         = {}", t.decay_factor);
        println!("  linger_ticks         = {}", t.linger_ticks);
        println!("  top_n                = {}", t.top_n);
        println!("  min_visible_value    = {}", t.min_visible_value);
        println!("  history_len          = {}", t.history_len);
    }
    Ok(())
}
