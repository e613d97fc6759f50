use crate::config::Config;
use log::LevelFilter;
use simplelog::{self, ConfigBuilder};

/// Dependencies whose output is suppressed below `TRACE`.
const FILTERED_MODULES: &[&str] = &["sqlx", "sea_orm", "tower", "tracing", "hyper", "h2", "axum"];

pub struct Logger {}

impl Logger {
    /// Installs the global terminal logger at the configured level.
    ///
    /// At `TRACE` every module logs; at any other level the chatter from the
    /// HTTP and database dependencies is dropped so engine logs stay readable.
    pub fn init_logger(config: &Config) {
        let log_config = Self::build_log_config(Self::filtered_modules(config.log_level_filter));

        simplelog::TermLogger::init(
            Self::convert_level_filter(config.log_level_filter),
            log_config,
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )
        .expect("Failed to start simplelog");
    }

    fn convert_level_filter(level: LevelFilter) -> simplelog::LevelFilter {
        match level {
            LevelFilter::Off => simplelog::LevelFilter::Off,
            LevelFilter::Error => simplelog::LevelFilter::Error,
            LevelFilter::Warn => simplelog::LevelFilter::Warn,
            LevelFilter::Info => simplelog::LevelFilter::Info,
            LevelFilter::Debug => simplelog::LevelFilter::Debug,
            LevelFilter::Trace => simplelog::LevelFilter::Trace,
        }
    }

    fn filtered_modules(level: LevelFilter) -> &'static [&'static str] {
        if level == LevelFilter::Trace {
            &[]
        } else {
            FILTERED_MODULES
        }
    }

    fn build_log_config(ignored: &[&'static str]) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        for module in ignored {
            builder.add_filter_ignore_str(*module);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_level_keeps_dependency_logs() {
        assert!(Logger::filtered_modules(LevelFilter::Trace).is_empty());
    }

    #[test]
    fn other_levels_drop_dependency_logs() {
        for level in [
            LevelFilter::Off,
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
        ] {
            let filtered = Logger::filtered_modules(level);
            assert!(filtered.contains(&"sea_orm"), "{level} should filter sea_orm");
            assert!(filtered.contains(&"axum"), "{level} should filter axum");
        }
    }

    #[test]
    fn level_filters_convert_one_to_one() {
        assert_eq!(
            Logger::convert_level_filter(LevelFilter::Warn) as u8,
            simplelog::LevelFilter::Warn as u8
        );
        assert_eq!(
            Logger::convert_level_filter(LevelFilter::Debug) as u8,
            simplelog::LevelFilter::Debug as u8
        );
    }

    #[test]
    fn log_config_builds_with_and_without_filters() {
        let _filtered = Logger::build_log_config(FILTERED_MODULES);
        let _unfiltered = Logger::build_log_config(&[]);
    }
}
