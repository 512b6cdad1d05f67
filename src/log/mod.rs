//! Console logging for simulation runs.
//!
//! This is diagnostic output about what the simulator is doing, not model output; model output
//! goes through [`crate::report`]. The five `log` macros are re-exported here, so model code can
//! write `masim::log::info!("...")` without depending on `log` itself.
//!
//! Logging is off until a level is set:
//!
//! ```rust
//! use masim::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! // lifecycle messages of the run
//! set_log_level(LevelFilter::Info);
//! // every scheduling decision, but only from the scheduler
//! set_module_filter("masim::scheduler", LevelFilter::Trace);
//! ```
//!
//! The scheduler logs each scheduled and executed event at `trace`, which is far too much for a
//! full run, so it is capped at `info` unless a filter for it is set explicitly.
mod standard_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};

use std::sync::{LazyLock, Mutex, MutexGuard};

use log4rs::Handle;
use rustc_hash::FxHashMap as HashMap;

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;
const DEFAULT_MODULE_FILTERS: [(&str, LevelFilter); 1] =
    [("masim::scheduler", LevelFilter::Info)];

static LOGGING: LazyLock<Mutex<Logging>> = LazyLock::new(Mutex::default);

/// The installed log4rs handle and the filters it was built from. There is one per process.
struct Logging {
    level: LevelFilter,
    module_filters: HashMap<String, LevelFilter>,
    handle: Option<Handle>,
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            level: DEFAULT_LOG_LEVEL,
            module_filters: DEFAULT_MODULE_FILTERS
                .iter()
                .map(|(module, level)| ((*module).to_string(), *level))
                .collect(),
            handle: None,
        }
    }
}

impl Logging {
    // Returns whether the filter changed.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        self.module_filters.insert(module.to_string(), level) != Some(level)
    }
}

fn logging() -> MutexGuard<'static, Logging> {
    LOGGING.lock().expect("Mutex poisoned")
}

/// Logs everything. Same as `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Same as `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the level for every module without a filter of its own.
pub fn set_log_level(level: LevelFilter) {
    let mut logging = logging();
    logging.level = level;
    logging.apply();
}

/// Sets the level for `module_path` and the modules below it.
pub fn set_module_filter(module_path: &str, level: LevelFilter) {
    let mut logging = logging();
    if logging.insert_module_filter(module_path, level) {
        logging.apply();
    }
}

/// Sets several module filters and rebuilds the logger once.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    let mut logging = logging();
    let mut changed = false;
    for (module_path, level) in module_filters {
        changed |= logging.insert_module_filter(module_path, *level);
    }
    if changed {
        logging.apply();
    }
}

/// Drops the filter of `module_path`, which then follows the global level.
pub fn remove_module_filter(module_path: &str) {
    let mut logging = logging();
    if logging.module_filters.remove(module_path).is_some() {
        logging.apply();
    }
}
