use slog::{o, Drain, Level, Logger};

/// `-v` repeated raises the level: none is Info, one is Debug, two or more
/// is Trace.
pub fn build_logger(verbosity: u8) -> Logger {
    let level = match verbosity {
        0 => Level::Info,
        1 => Level::Debug,
        _ => Level::Trace,
    };
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog::LevelFilter::new(drain, level).fuse();
    Logger::root(drain, o!())
}
