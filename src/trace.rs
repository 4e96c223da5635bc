use anyhow::Result;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// Wires up log output for the command-line tools. Verbosity raises
/// the level for `root` while dependencies stay quieter, and RUST_LOG
/// directives still apply on top.
pub fn setup(root: &str, level: u64) -> Result<()> {
    let (app, lib) = match level {
        0 => (LevelFilter::INFO,  LevelFilter::WARN),
        1 => (LevelFilter::DEBUG, LevelFilter::INFO),
        2 => (LevelFilter::TRACE, LevelFilter::INFO),
        3 => (LevelFilter::TRACE, LevelFilter::DEBUG),
        _ => (LevelFilter::TRACE, LevelFilter::TRACE),
    };

    let app = format!("{root}={app}");

    let mut filter = EnvFilter::from_default_env();
    filter = filter.add_directive(app.parse()?);
    filter = filter.add_directive(lib.into());

    let layer = fmt::layer().compact();

    registry().with(filter).with(layer).init();

    Ok(())
}
