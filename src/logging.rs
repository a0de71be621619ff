use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use env_logger::{Builder, Env, Target};

/// Route `log` output to `path`; the terminal belongs to the UI.
/// `RUST_LOG` wins over `default_level`.
pub fn init_file_logger(path: &Path, default_level: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let result = Builder::from_env(Env::default().default_filter_or(default_level))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init();

    if let Err(e) = result {
        // already initialised, e.g. from a test harness
        eprintln!("logger not installed: {e}");
    }
    Ok(())
}
