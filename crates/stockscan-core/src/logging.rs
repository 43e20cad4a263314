use log::{error, info, warn, LevelFilter};

// For file-based logging with rotation
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::error::{Error, StageError};

/// Environment variable that overrides the configured level
pub const LOG_ENV_VAR: &str = "STOCKSCAN_LOG";

/// Initialize the logger with timestamp, log level, and module path.
/// Logs are written to a rotating file in `log_dir`.
pub fn init_logger(log_dir: &str, level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let log_file_path = format!("{}/stockscan.log", log_dir);
    let archived_logs_pattern = format!("{}/stockscan.{{}}.log", log_dir);

    // Rotate at 10MB, keep 5 archives
    let file_trigger = SizeTrigger::new(10 * 1024 * 1024);
    let file_roller = FixedWindowRoller::builder()
        .build(&archived_logs_pattern, 5)
        .map_err(|e| format!("Failed to create log roller: {}", e))?;
    let compound_policy = CompoundPolicy::new(Box::new(file_trigger), Box::new(file_roller));

    let rolling_file = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] [{M}:{L}] - {m}{n}",
        )))
        .build(log_file_path.clone(), Box::new(compound_policy))
        .map_err(|e| format!("Failed to create log appender: {}", e))?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(rolling_file)))
        .build(Root::builder().appender("file").build(LevelFilter::Trace))
        .map_err(|e| format!("Failed to build log config: {}", e))?;

    log4rs::init_config(config).map_err(|e| format!("Failed to initialize log4rs: {}", e))?;

    let effective = std::env::var(LOG_ENV_VAR)
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(level);
    log::set_max_level(effective);

    info!("Logging to file: {}", log_file_path);
    Ok(())
}

/// Log a stage failure that the pipeline swallowed
pub fn log_stage_error(stage: &str, error: &StageError) {
    warn!("Stage failed - Stage: {}, Error: {}", stage, error);
}

/// Log a terminal pipeline failure with its underlying cause
pub fn log_decode_failure(source: Option<&str>, error: &Error) {
    let cause = match error {
        Error::Exhausted {
            last_error: Some(last),
            ..
        } => format!(", Last error: {}", last),
        _ => String::new(),
    };
    error!(
        "Decode failed - Source: {}, Error: {}{}",
        source.unwrap_or("<unnamed>"),
        error,
        cause
    );
}
