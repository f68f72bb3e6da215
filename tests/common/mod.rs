#![allow(dead_code)]

use log::{LevelFilter, Record, kv::Key};

/// Accessors for records emitted by the crate.
pub trait RecordExt {
    /// Returns a structured value attached to the record, rendered as JSON.
    fn kv_json(&self, key: &str) -> Option<serde_json::Value>;

    fn text(&self) -> String;
}

impl RecordExt for Record<'_> {
    fn kv_json(&self, key: &str) -> Option<serde_json::Value> {
        self.key_values()
            .get(Key::from_str(key))
            .and_then(|value| serde_json::to_value(value).ok())
    }

    fn text(&self) -> String {
        self.args().to_string()
    }
}

/// Installs a logger that hands every record to `check` instead of printing it.
pub fn check_logger_once<F>(check: F)
where
    F: Fn(&Record) -> std::io::Result<()> + Send + Sync + 'static,
{
    let level_filter = LevelFilter::Trace;
    let logger = env_logger::Builder::new()
        .filter_level(level_filter)
        .format(move |_fmt, record| check(record))
        .build();
    log::set_max_level(level_filter);
    log::set_boxed_logger(Box::new(logger)).expect("logger is installed once per test binary");
}
