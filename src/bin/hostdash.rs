//! hostdash - Terminal dashboard for host telemetry.
//!
//! Usage:
//!   hostdash                 # refresh every second
//!   hostdash 5               # refresh every 5 seconds
//!   hostdash --once          # print the panels once and exit
//!   hostdash --once --json   # print one snapshot as JSON

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use hostdash::collector::utmp::DEFAULT_UTMP_PATH;
use hostdash::collector::{
    Collector, CollectorConfig, DEFAULT_TEMPERATURE_SENSOR, FileSystem, SessionPolicy,
    TelemetryProvider,
};
use hostdash::provider::RefreshScheduler;
use hostdash::tui::App;
use hostdash::view::DashboardView;

/// Terminal dashboard showing system info, logged-in users and network
/// interfaces.
#[derive(Parser)]
#[command(name = "hostdash", about = "Host telemetry dashboard", version)]
struct Args {
    /// Refresh interval in seconds.
    #[arg(value_name = "INTERVAL", default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Path to /proc filesystem.
    #[arg(long, default_value = "/proc")]
    proc_path: PathBuf,

    /// Path to /sys filesystem.
    #[arg(long, default_value = "/sys")]
    sys_path: PathBuf,

    /// Path to /etc (for os-release).
    #[arg(long, default_value = "/etc")]
    etc_path: PathBuf,

    /// Login database read when sessions come from disk.
    #[arg(long, default_value = DEFAULT_UTMP_PATH)]
    utmp_path: PathBuf,

    /// Session source: auto (login database on aarch64), native or utmp.
    #[arg(long, default_value = "auto")]
    sessions: SessionPolicy,

    /// CPU usage sampling window in milliseconds.
    #[arg(long, default_value = "3")]
    cpu_window_ms: u64,

    /// Temperature sensor shown next to the core count.
    #[arg(long, default_value = DEFAULT_TEMPERATURE_SENSOR)]
    temperature_sensor: String,

    /// Collect once, print the panels to stdout and exit.
    #[arg(long)]
    once: bool,

    /// With --once, print the snapshot as JSON.
    #[arg(long, requires = "once")]
    json: bool,

    /// Increase logging verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,

    /// Write logs to this file. The dashboard owns the terminal, so without
    /// it nothing is logged unless --once is given.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            proc_path: self.proc_path.clone(),
            sys_path: self.sys_path.clone(),
            etc_path: self.etc_path.clone(),
            utmp_path: self.utmp_path.clone(),
            session_policy: self.sessions,
            cpu_window: Duration::from_millis(self.cpu_window_ms),
            temperature_sensor: self.temperature_sensor.clone(),
        }
    }
}

fn main() {
    let args = Args::parse();

    if args.once || args.log_file.is_some() {
        if let Err(e) = init_logging(args.verbose, args.quiet, args.log_file.as_deref()) {
            eprintln!("Error opening log file: {}", e);
            std::process::exit(1);
        }
    }

    let mut collector = Collector::for_host(args.collector_config());

    if args.once {
        if let Err(e) = print_once(&mut collector, args.json) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let scheduler = RefreshScheduler::new(collector, Duration::from_secs(args.interval));
    let (initial, refresh) = match scheduler.start() {
        Ok(started) => started,
        Err(e) => {
            eprintln!("Error starting refresh loop: {}", e);
            std::process::exit(1);
        }
    };
    info!(interval = args.interval, "dashboard started");

    let cancel = refresh.cancel_sender();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = cancel.try_send(());
    }) {
        warn!(error = %e, "failed to install signal handler");
    }

    if let Err(e) = App::new(&initial).run(refresh) {
        eprintln!("Error running dashboard: {}", e);
        std::process::exit(1);
    }
}

fn print_once<P, F>(collector: &mut Collector<P, F>, json: bool) -> io::Result<()>
where
    P: TelemetryProvider,
    F: FileSystem + Clone,
{
    let snapshot = collector.collect();
    if json {
        let text = serde_json::to_string_pretty(&snapshot)?;
        println!("{}", text);
    } else {
        print!("{}", DashboardView::from_snapshot(&snapshot));
    }
    Ok(())
}

/// Initializes tracing. Logs go to `log_file` when given, stderr otherwise.
fn init_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> io::Result<()> {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("hostdash={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}
