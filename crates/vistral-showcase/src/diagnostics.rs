#![forbid(unsafe_code)]

//! Logging setup and JSONL diagnostics.
//!
//! The UI owns the terminal, so tracing output only goes to a file, and only
//! when one is configured. Independently, `VISTRAL_JSONL=1` makes the app
//! print one JSON object per notable event (screen switches, connector
//! redraws, key commits) to stderr for scripted inspection.
//!
//! Format: `{"seq":N,"event":"E",...fields}`. Sequence numbers are unique
//! and increasing within a process.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter directives, `RUST_LOG` syntax. Defaults to `info`.
pub const LOG_FILTER_ENV: &str = "VISTRAL_LOG";
pub const JSONL_ENV: &str = "VISTRAL_JSONL";

static JSONL_SEQ: AtomicU64 = AtomicU64::new(0);

/// Install the global subscriber writing to `log_file`.
///
/// Returns `Ok(false)` without touching anything when no file is given or a
/// subscriber is already installed.
pub fn init_tracing(log_file: Option<&Path>, json: bool) -> io::Result<bool> {
    let Some(path) = log_file else {
        return Ok(false);
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let writer = Mutex::new(file);
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(writer).with_ansi(false))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .try_init()
    };
    Ok(installed.is_ok())
}

fn flag_enabled(value: Option<String>) -> bool {
    value.is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

pub fn jsonl_enabled() -> bool {
    flag_enabled(std::env::var(JSONL_ENV).ok())
}

#[derive(Debug, Serialize)]
struct DiagnosticRecord<'a> {
    seq: u64,
    event: &'a str,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

/// Serialize one diagnostic line. Non-object `fields` are stored under `"value"`.
pub fn format_record(seq: u64, event: &str, fields: Value) -> Option<String> {
    let fields = match fields {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_owned(), other);
            map
        }
    };
    serde_json::to_string(&DiagnosticRecord { seq, event, fields }).ok()
}

/// Best-effort write of one JSONL line to stderr when enabled.
pub fn emit_jsonl(event: &str, fields: Value) {
    if !jsonl_enabled() {
        return;
    }
    let seq = JSONL_SEQ.fetch_add(1, Ordering::Relaxed);
    if let Some(line) = format_record(seq, event, fields) {
        let _ = writeln!(io::stderr(), "{line}");
    }
}
