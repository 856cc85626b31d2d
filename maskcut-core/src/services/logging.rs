//! Logging service

use crate::models::LogLevel;

/// Initialize logging with the specified level
pub fn init_logging(level: LogLevel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match level {
        LogLevel::Error => "maskcut=error",
        LogLevel::Warn => "maskcut=warn",
        LogLevel::Info => "maskcut=info",
        LogLevel::Debug => "maskcut=debug",
        LogLevel::Trace => "maskcut=trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();

    #[test]
    fn test_logging_initialization() {
        // Double initialization must not panic the process
        INIT.call_once(|| {
            let _ = init_logging(LogLevel::Info);
        });
        let _ = init_logging(LogLevel::Debug);
    }
}
