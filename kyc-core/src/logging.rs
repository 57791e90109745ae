use std::path::Path;

/// The wizard owns the terminal, so logs go to `log_file`. If the file cannot
/// be opened, fall back to stderr.
pub fn init(log_file: &Path) {
    use env_logger::Target;
    use std::fs;
    use std::io;

    let target = (|| -> io::Result<Target> {
        if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;
        Ok(Target::Pipe(Box::new(file)))
    })()
    .unwrap_or(Target::Stderr);

    // try_init: a second call (tests, re-entry) keeps the first logger.
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(target)
        .try_init();
}
