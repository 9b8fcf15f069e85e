use std::path::{Path, PathBuf};

use quickreply::{
    config::{self, Config},
    persist::{self, Format},
    Trie,
};

/// Initialize logger. Info and above by default; `RUST_LOG` overrides.
pub fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .format(|buf, record| {
            use std::io::Write;
            let now = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f");
            writeln!(buf, "{} {}", now, log_line(record))
        })
        .init();
}

/// Everything after the timestamp: `module:line`, then the level for
/// anything but info, then the message.
fn log_line(record: &log::Record) -> String {
    let origin = record.module_path().unwrap_or("quickreply");
    let line = record.line().unwrap_or(0);

    match record.level() {
        log::Level::Info => format!("{}:{} {}", origin, line, record.args()),
        level => format!("{}:{} [{}] {}", origin, line, level, record.args()),
    }
}

/// Load and merge config files, exiting on error.
pub fn init_config(paths: &[PathBuf]) -> Config {
    match config::load_all(paths) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Resolve the model path (flag over config) and its encoding.
pub fn model_location(config: &Config, flag: Option<PathBuf>) -> (PathBuf, Format) {
    let path = flag.unwrap_or_else(|| config.model.path());
    let format = config.model.format(&path).unwrap_or_else(|e| {
        log::error!("{}", e);
        std::process::exit(1);
    });
    (path, format)
}

/// Load a saved model, exiting on error.
pub fn init_model(path: &Path, format: Format) -> Trie {
    if !path.exists() {
        log::error!(
            "model '{}' not found. Run `build` to create one.",
            path.display()
        );
        std::process::exit(1);
    }

    persist::load_file(path, format).unwrap_or_else(|e| {
        log::error!("error loading model {}: {}", path.display(), e);
        std::process::exit(1);
    })
}
