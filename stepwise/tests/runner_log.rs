//! Checks the runner's progress lines through a capturing `log` backend.
//!
//! Kept in its own test binary: the global logger can only be installed once.

mod common;

use std::sync::{Mutex, OnceLock};

use common::Scratch;
use log::{LevelFilter, Log, Metadata, Record};
use stepwise::{Error, MigrationRegistry, MigrationRunner};

struct Capture {
    lines: Mutex<Vec<String>>,
}

impl Log for Capture {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("{}: {}", record.level(), record.args()));
    }

    fn flush(&self) {}
}

fn capture() -> &'static Capture {
    static CAPTURE: OnceLock<&'static Capture> = OnceLock::new();
    CAPTURE.get_or_init(|| {
        let capture: &'static Capture = Box::leak(Box::new(Capture {
            lines: Mutex::new(Vec::new()),
        }));
        log::set_logger(capture).unwrap();
        log::set_max_level(LevelFilter::Info);
        capture
    })
}

#[test]
fn test_every_entry_is_logged() {
    let capture = capture();
    let scratch = Scratch::new();
    let mut registry = MigrationRegistry::new();
    let base = registry.register("log_base", |_| Ok(false)).unwrap();
    registry.register("log_other", |_| Ok(true)).unwrap();
    registry
        .register_with_requires("log_dependent", [&base], |_| Ok(true))
        .unwrap();

    let err = MigrationRunner::new(&registry, &scratch.settings)
        .activate()
        .unwrap_err();
    assert!(matches!(err, Error::RequirementsNotMet { .. }));

    let lines = capture.lines.lock().unwrap();
    assert!(lines.iter().any(|l| l == "INFO: run: log_base"));
    assert!(lines.iter().any(|l| l == "WARN: ran: log_base and failed."));
    assert!(lines
        .iter()
        .any(|l| l.starts_with("ERROR: log_dependent: ") && l.contains("log_base")));
}
