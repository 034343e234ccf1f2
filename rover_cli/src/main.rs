//! Binary entry point: logging setup, config loading, and command dispatch.

mod cli;
mod error_fmt;
mod run;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use eyre::WrapErr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = try_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
        }
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}

fn try_main(cli: Cli) -> eyre::Result<()> {
    color_eyre::install()?;

    let cfg = load_config(&cli.config)?;
    init_tracing(&cli, &cfg.logging);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::Relaxed);
        })
        .wrap_err("installing Ctrl-C handler")?;
    }

    match cli.cmd {
        Commands::Run {
            max_ticks,
            rate_hz,
            drive,
            press_after,
        } => run::run_rover(
            &cfg,
            &run::RunOpts {
                max_ticks,
                rate_hz,
                drive,
                press_after,
            },
            shutdown,
        ),
        Commands::SelfCheck => run::self_check(&cfg),
    }
}

fn load_config(path: &Path) -> eyre::Result<rover_config::Config> {
    let cfg = if path.exists() {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading config {}", path.display()))?;
        rover_config::load_toml(&text).wrap_err("invalid configuration")?
    } else {
        // No file: the built-in defaults reproduce the reference robot.
        rover_config::Config::default()
    };
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

/// Console logging goes to stderr so telemetry on stdout stays parseable.
/// An optional JSON-lines file sink comes from the [logging] config section.
fn init_tracing(cli: &Cli, logging: &rover_config::Logging) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer, fmt};

    let level = logging.level.as_deref().unwrap_or(&cli.log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console: Box<dyn Layer<_> + Send + Sync> = if cli.json {
        Box::new(fmt::layer().json().with_writer(std::io::stderr))
    } else {
        Box::new(fmt::layer().with_writer(std::io::stderr))
    };

    let file = logging.file.as_deref().map(|path| {
        let path = Path::new(path);
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let name = path
            .file_name()
            .map_or_else(|| "rover.log".into(), ToOwned::to_owned);
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer().json().with_writer(writer)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
}
