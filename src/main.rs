mod app;
mod cli;
mod output;

use std::env;
use std::io;
use std::process;

fn setup_logging() -> Result<(), fern::InitError> {
    let level_filter = match env::var("USETS_LOG") {
        Ok(level) => match level.to_lowercase().as_ref() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            _ => log::LevelFilter::Warn,
        },
        Err(_) => log::LevelFilter::Warn,
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level_filter)
        .chain(io::stderr())
        .apply()?;
    Ok(())
}

// Usage: usets [options] <expr>...   or   echo <expr> | usets [options]
fn main() {
    if let Err(e) = setup_logging() {
        eprintln!("usets: logging disabled: {e}");
    }

    let args: Vec<String> = env::args().collect();
    let code = match cli::parse_args(args).and_then(app::run) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("usets: {err:#}");
            2
        }
    };
    process::exit(code);
}
