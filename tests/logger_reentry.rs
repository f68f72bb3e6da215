use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc,
    },
    thread,
    time::Duration,
};

use log::{LevelFilter, Log, Metadata, Record};
use metlog_context::{get_context, has_context, with_context};

/// A logger enriching records from the current context.
struct ContextReadingLogger {
    lookups: AtomicUsize,
}

impl Log for ContextReadingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, _record: &Record) {
        let _ = has_context();
        self.lookups.fetch_add(1, Ordering::SeqCst);
    }

    fn flush(&self) {}
}

static LOGGER: ContextReadingLogger = ContextReadingLogger {
    lookups: AtomicUsize::new(0),
};

#[test]
fn test_logger_may_read_context_while_mappings_change() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        get_context().insert("foo", 42);
        with_context(|_| Ok(()), |mapping| mapping.insert("bar", 43)).unwrap();
        tx.send(has_context()).unwrap();
    });

    let has_mapping = rx
        .recv_timeout(Duration::from_secs(3))
        .expect("context access must not block on the registry");
    assert!(has_mapping);
    assert!(LOGGER.lookups.load(Ordering::SeqCst) > 0);
}
