use flexi_logger::{opt_format, Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming};
use std::path::Path;

/// Starts the global logger.
///
/// `RUST_LOG` wins over `level`. With a `log_dir`, output goes to rotating
/// files there instead of stderr. Keep the returned handle alive for the
/// lifetime of the program.
pub fn setup_logging(level: &str, log_dir: Option<&Path>) -> Result<LoggerHandle, FlexiLoggerError> {
    let logger = Logger::try_with_env_or_str(level)?.format(opt_format);
    let logger = match log_dir {
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir).basename("thought_beam"))
            .rotate(
                Criterion::Size(10 * 1024 * 1024), // 10 MB per file
                Naming::Numbers,
                Cleanup::KeepLogFiles(3),
            ),
        None => logger.log_to_stderr(),
    };
    logger.start()
}
