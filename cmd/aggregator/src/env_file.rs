use std::io::BufRead;

use tracing::debug;

/// Loads `KEY=VALUE` lines from `path` into the process environment,
/// skipping comments and any key already set (explicit env wins over the
/// file).
pub fn load(path: &str) -> std::io::Result<()> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    let reader = std::io::BufReader::new(file);
    for line in reader.lines() {
        let line = line?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            if std::env::var(key).is_ok() {
                debug!(key, "env var already set, skipping value from env file");
                continue;
            }
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }
    Ok(())
}
