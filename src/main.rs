use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use nso_gc_bridge_lib::config::profile::{auto_install_profile, export_profile};
use nso_gc_bridge_lib::core::gamepad::driver::VIGEM_DOWNLOAD_URL;
use nso_gc_bridge_lib::{
    BridgeConfig, ConnectionState, EngineContext, EngineExit, FatalKind, Severity, StatusEvent,
    StatusPoll, StatusReceiver, SystemCapabilities, Timings, logging, run_engine, status,
};

const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Parser)]
#[command(name = "nso-gc-bridge", version, about = "NSO GameCube controller to Xbox 360 gamepad bridge")]
struct Cli {
    /// Path to bridge_config.json
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "NSO_BRIDGE_LOG")]
    log_level: Option<String>,

    /// Print status events as JSON lines
    #[arg(long)]
    json: bool,

    /// Write the Dolphin controller profile to PATH and exit
    #[arg(long, value_name = "PATH")]
    export_profile: Option<PathBuf>,

    /// Skip installing the Dolphin profile on startup
    #[arg(long)]
    no_profile_install: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(EngineExit::Stopped) => ExitCode::SUCCESS,
        Ok(EngineExit::Fatal(_)) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<EngineExit> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => BridgeConfig::default_path()?,
    };
    let config = rt.block_on(BridgeConfig::load_config(&config_path))?;

    let level_name = cli.log_level.as_deref().unwrap_or(&config.log_level);
    if logging::init(logging::parse_level(level_name)).is_err() {
        eprintln!("Logger already initialized");
    }
    info!("Using config {:?}", config_path);

    if let Some(destination) = &cli.export_profile {
        let written = rt.block_on(export_profile(destination))?;
        println!("Dolphin profile written to {}", written.display());
        return Ok(EngineExit::Stopped);
    }

    if config.auto_install_profile && !cli.no_profile_install {
        match rt.block_on(auto_install_profile()) {
            Ok(Some(path)) => info!("Dolphin profile installed at {:?}", path),
            Ok(None) => {}
            Err(e) => warn!("Could not install Dolphin profile: {:#}", e),
        }
    }
    drop(rt);

    let (status_tx, status_rx) = status::channel();
    let cancel = CancellationToken::new();
    let ctx = EngineContext::new(cancel.clone(), status_tx);
    let vendor_prefix = config.vendor_prefix.clone();
    let timings = config.timings();

    let engine = thread::Builder::new()
        .name("bridge-engine".to_string())
        .spawn(move || run_engine_thread(vendor_prefix, ctx, timings))
        .context("Failed to spawn the engine thread")?;

    let exit = present_status(status_rx, cli.json);

    let result = match engine.join() {
        Ok(result) => result,
        Err(_) => anyhow::bail!("Engine thread panicked"),
    };
    cancel.cancel();

    match (result?, exit) {
        (EngineExit::Fatal(kind), _) | (_, Some(kind)) => Ok(EngineExit::Fatal(kind)),
        (EngineExit::Stopped, None) => Ok(EngineExit::Stopped),
    }
}

/// Owns the engine's runtime. Ctrl-C cancels the shared token.
fn run_engine_thread(vendor_prefix: String, ctx: EngineContext, timings: Timings) -> Result<EngineExit> {
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            ctx.status.emit(
                ConnectionState::FatalError(FatalKind::InitFailure),
                Severity::Fatal,
                format!("Failed to create engine runtime: {}", e),
            );
            return Ok(EngineExit::Fatal(FatalKind::InitFailure));
        }
    };

    rt.block_on(async move {
        let cancel = ctx.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => info!("Ctrl-C received, stopping"),
                        Err(e) => warn!("Could not listen for Ctrl-C: {}", e),
                    }
                    cancel.cancel();
                }
            }
        });

        let capabilities = SystemCapabilities::new(vendor_prefix);
        Ok(run_engine(&capabilities, ctx, timings).await)
    })
}

/// Prints events until the engine drops its sender. Returns the fatal kind, if one was seen.
fn present_status(mut rx: StatusReceiver, json: bool) -> Option<FatalKind> {
    let mut fatal = None;
    loop {
        match rx.poll() {
            StatusPoll::Event(event) => {
                print_event(&event, json);
                if let ConnectionState::FatalError(kind) = event.state {
                    fatal = Some(kind);
                }
            }
            StatusPoll::Empty => thread::sleep(STATUS_POLL_INTERVAL),
            StatusPoll::Closed => return fatal,
        }
    }
}

fn print_event(event: &StatusEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to serialize status event: {}", e),
        }
        return;
    }

    println!("[{}] {}", event.state, event.message);
    if event.state == ConnectionState::FatalError(FatalKind::MissingDriver) {
        println!("Install ViGEmBus from {} and restart the bridge.", VIGEM_DOWNLOAD_URL);
    }
}
