use log::LevelFilter;

/// Initialize logging for the application.
/// Should be called once at the start of `main()`; later calls are ignored.
pub fn init_logging(level: LevelFilter) {
    let result = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}  {} {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply();

    if result.is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Log level helper to determine if debug logging is enabled
#[must_use]
pub fn is_debug_enabled() -> bool {
    log::log_enabled!(log::Level::Debug)
}
