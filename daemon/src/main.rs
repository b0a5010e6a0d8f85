mod autostart;
mod config;
mod dedup;
mod fetcher;
mod monitor;
mod sink;
mod spooler;

use clap::Parser;
use config::Config;
use monitor::{CancelToken, Monitor};
use sink::{ScreenGrabber, Sink, XcapGrabber};
use spooler::PlatformSpooler;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (.yaml, .yml or .toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Printer to watch
    #[arg(short, long)]
    printer: Option<String>,
    /// Directory for the print log and screen captures
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Log jobs without capturing the screen
    #[arg(long)]
    no_capture: bool,
    /// Debug-level trace output
    #[arg(short, long)]
    verbose: bool,
    /// Register printwatch to start at login
    #[arg(long)]
    install_autostart: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(printer) = cli.printer {
        config.monitor.printer = printer;
    }
    if let Some(dir) = cli.output_dir {
        config.output.dir = Some(dir);
    }
    if cli.no_capture {
        config.output.capture = false;
    }
    if cli.install_autostart {
        config.autostart = true;
    }

    setup_logging(&config, cli.verbose)?;
    log::info!("Starting printwatch...");

    if config.autostart {
        autostart::install_best_effort();
    }

    let grabber: Option<Box<dyn ScreenGrabber>> = if config.output.capture {
        Some(Box::new(XcapGrabber))
    } else {
        None
    };
    let sink = Sink::new(config.output_dir()?, grabber);
    log::info!("Writing print log and captures to {}", sink.dir().display());

    let monitor = Monitor::new(PlatformSpooler, config.monitor_settings(), sink);
    let cancel = CancelToken::new();
    let monitor_cancel = cancel.clone();
    let mut task = tokio::task::spawn_blocking(move || monitor.run(&monitor_cancel));

    let outcome = tokio::select! {
        res = &mut task => res,
        _ = tokio::signal::ctrl_c() => {
            log::info!("Shutdown requested, waiting for monitor to stop");
            cancel.cancel();
            task.await
        }
    };

    match outcome? {
        Ok(report) => log::info!("Monitor report: {:?}", report),
        Err(e) => log::warn!("Printer monitor exited: {}", e),
    }
    Ok(())
}

fn setup_logging(config: &Config, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { log::LevelFilter::Debug } else { config.log_level() };

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d][%H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout());

    if let Some(path) = &config.logging.output {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}
