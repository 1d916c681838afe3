use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Copies every log line to stderr and, if it could be opened, the log file.
struct Tee {
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = &mut self.file {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = &mut self.file {
            file.flush()?;
        }
        Ok(())
    }
}

/// The log file used when none is given.
pub fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("typedump.log")
}

/// Initializes `env_logger` for typedump at info level, debug with `verbose`; `RUST_LOG`
/// overrides both.
///
/// Lines are formatted `[{timestamp}] [{LEVEL}] {message}`.
pub fn init(verbose: bool, log_file: &Path) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let (file, open_error) = match File::create(log_file) {
        Ok(file) => (Some(file), None),
        Err(error) => (None, Some(error)),
    };

    env_logger::Builder::new()
        .filter_module("typedump", level)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(Tee { file })))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                buf.timestamp(),
                record.level(),
                record.args()
            )
        })
        .init();

    match open_error {
        Some(error) => log::warn!(
            "Logging to stderr only, {} could not be opened: {}",
            log_file.display(),
            error
        ),
        None => log::debug!("Logging to {}", log_file.display()),
    }
}
