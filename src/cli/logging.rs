use anyhow::Result;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

use super::command::{LogArgs, LogFormat};

/// Installs the global logger; returns the progress handle when `--progress` is set.
///
/// Records always go to stderr so stdout can carry the output stream.
pub fn init_logging(args: &LogArgs) -> Result<Option<MultiProgress>> {
    let mut env_builder = env_logger::Builder::from_default_env();
    env_builder
        .filter_level(args.loglevel.to_level_filter())
        .target(env_logger::Target::Stderr);

    match args.log_format {
        LogFormat::Plain => {
            env_builder.format_timestamp_secs();
        }
        LogFormat::Json => {
            env_builder.format(|buf, record| {
                use std::io::Write;
                writeln!(
                    buf,
                    "{{\"ts\":\"{}\",\"lvl\":\"{}\",\"msg\":{:?}}}",
                    buf.timestamp(),
                    record.level(),
                    record.args().to_string()
                )
            });
        }
    }

    if args.progress {
        let multi = MultiProgress::new();
        let logger = env_builder.build();
        LogWrapper::new(multi.clone(), logger).try_init()?;
        Ok(Some(multi))
    } else {
        env_builder.try_init()?;
        Ok(None)
    }
}
