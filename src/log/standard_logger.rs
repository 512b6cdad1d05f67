use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

use super::Logging;

// ISO 8601 timestamp, colored level, target
const LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%S)} {h({l:<5})} {t} - {m}{n}";

impl Logging {
    /// Builds a console logger from the current filters and installs it, or swaps it into the
    /// logger installed earlier.
    pub(super) fn apply(&mut self) {
        let console = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        let builder = self.module_filters.iter().fold(
            Config::builder().appender(Appender::builder().build("console", Box::new(console))),
            |builder, (module, level)| builder.logger(Logger::builder().build(module, *level)),
        );
        let config = builder
            .build(Root::builder().appender("console").build(self.level))
            .unwrap_or_else(|error| panic!("invalid logger configuration: {error}"));

        match &self.handle {
            Some(handle) => handle.set_config(config),
            None => match log4rs::init_config(config) {
                Ok(handle) => self.handle = Some(handle),
                // another logger owns the process, e.g. in a host application
                Err(error) => eprintln!("masim logging not installed: {error}"),
            },
        }
    }
}
