//! Structured JSON-lines logging.
//!
//! Every record carries a run id, a monotonic sequence number, a level and a
//! domain, and is printed to stdout. When `LOG_DIR` is set the records are
//! also appended to `<LOG_DIR>/<RUN_ID>/events.jsonl` (info and above) and
//! `trace.jsonl` (trace/debug).
//!
//! `LOG_LEVEL` and `LOG_DOMAINS` are read once, on the first record.

use std::collections::HashSet;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

// =============================================================================
// Levels and domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|l| l.as_str().eq_ignore_ascii_case(raw))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Data,      // file loading, manifest
    Aggregate, // derived tables, page notices
    Eval,      // classifier metrics
    Render,    // pages, charts, html
    Nav,       // active page
    Server,    // requests
    System,    // startup
    Profile,   // timing
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Data => "data",
            Domain::Aggregate => "aggregate",
            Domain::Eval => "eval",
            Domain::Render => "render",
            Domain::Nav => "nav",
            Domain::Server => "server",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }
}

/// Minimum level and enabled domains. `None` domains means all of them.
#[derive(Debug)]
struct LogFilter {
    min_level: Level,
    domains: Option<HashSet<String>>,
}

impl LogFilter {
    fn from_env() -> Self {
        let min_level = std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|v| Level::parse(&v))
            .unwrap_or(Level::Info);
        let domains = std::env::var("LOG_DOMAINS")
            .ok()
            .filter(|v| v.trim() != "all")
            .map(|v| v.split(',').map(|d| d.trim().to_string()).collect());
        Self { min_level, domains }
    }

    fn allows(&self, level: Level, domain: Domain) -> bool {
        level >= self.min_level
            && self
                .domains
                .as_ref()
                .map_or(true, |set| set.contains(domain.as_str()))
    }
}

// =============================================================================
// Run context and sinks
// =============================================================================

type Sink = Mutex<BufWriter<File>>;

static SEQ: AtomicU64 = AtomicU64::new(0);
static FILTER: OnceLock<LogFilter> = OnceLock::new();
static RUN: OnceLock<RunContext> = OnceLock::new();

#[derive(Debug)]
struct RunContext {
    run_id: String,
    events: Option<Sink>,
    trace: Option<Sink>,
}

impl RunContext {
    fn init() -> Self {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("novamart-{}-{}", ts_epoch_ms(), process::id()));
        let log_dir = std::env::var("LOG_DIR").ok();
        let Some(dir) = log_dir.map(|base| PathBuf::from(base).join(&run_id)) else {
            return Self {
                run_id,
                events: None,
                trace: None,
            };
        };
        if let Err(err) = create_dir_all(&dir) {
            eprintln!("[log] cannot create {}: {}", dir.display(), err);
        }
        let header = json!({
            "run_id": run_id,
            "started": ts_now(),
            "pid": process::id(),
            "version": env!("CARGO_PKG_VERSION"),
        });
        if let Err(err) = std::fs::write(dir.join("run.json"), header.to_string()) {
            eprintln!("[log] cannot write run header: {}", err);
        }
        Self {
            events: open_sink(dir.join("events.jsonl")),
            trace: open_sink(dir.join("trace.jsonl")),
            run_id,
        }
    }

    fn sink(&self, level: Level) -> Option<&Sink> {
        match level {
            Level::Trace | Level::Debug => self.trace.as_ref(),
            _ => self.events.as_ref(),
        }
    }
}

fn open_sink(path: PathBuf) -> Option<Sink> {
    File::create(&path)
        .map(|f| Mutex::new(BufWriter::new(f)))
        .map_err(|err| eprintln!("[log] cannot create {}: {}", path.display(), err))
        .ok()
}

fn next_seq() -> u64 {
    SEQ.fetch_add(1, Ordering::Relaxed)
}

/// RFC3339 timestamp with milliseconds.
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

// =============================================================================
// Emit
// =============================================================================

/// Emit one structured record. `msg` and `page` are lifted out of `fields`
/// to the top level; everything else goes under `data`.
pub fn log(level: Level, domain: Domain, event: &str, mut fields: Map<String, Value>) {
    if !FILTER.get_or_init(LogFilter::from_env).allows(level, domain) {
        return;
    }
    let run = RUN.get_or_init(RunContext::init);

    let mut record = Map::new();
    record.insert("ts".into(), json!(ts_now()));
    record.insert("run_id".into(), json!(run.run_id));
    record.insert("seq".into(), json!(next_seq()));
    record.insert("lvl".into(), json!(level.as_str().to_uppercase()));
    record.insert("domain".into(), json!(domain.as_str()));
    record.insert("event".into(), json!(event));
    record.insert("msg".into(), fields.remove("msg").unwrap_or_else(|| json!("")));
    if let Some(page) = fields.remove("page") {
        record.insert("page".into(), page);
    }
    record.insert("data".into(), Value::Object(fields));

    let line = Value::Object(record).to_string();
    if let Some(sink) = run.sink(level) {
        if let Ok(mut w) = sink.lock() {
            let _ = writeln!(w, "{}", line).and_then(|_| w.flush());
        }
    }
    println!("{}", line);
}

// =============================================================================
// Dashboard events
// =============================================================================

pub fn log_startup(data_dir: &str, listen: &str) {
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("data_dir", v_str(data_dir)),
            ("listen", v_str(listen)),
            ("version", v_str(env!("CARGO_PKG_VERSION"))),
        ]),
    );
}

pub fn log_table_loaded(file: &str, rows: usize, skipped: usize) {
    let level = if skipped > 0 { Level::Warn } else { Level::Info };
    log(
        level,
        Domain::Data,
        "table_loaded",
        obj(&[
            ("file", v_str(file)),
            ("rows", json!(rows)),
            ("skipped_rows", json!(skipped)),
        ]),
    );
}

pub fn log_load_failed(kind: &str, detail: &str) {
    log(
        Level::Fatal,
        Domain::Data,
        "load_failed",
        obj(&[("kind", v_str(kind)), ("msg", v_str(detail))]),
    );
}

pub fn log_page_selected(from: &str, to: &str) {
    log(
        Level::Debug,
        Domain::Nav,
        "page_selected",
        obj(&[("from", v_str(from)), ("page", v_str(to))]),
    );
}

pub fn log_page_rendered(page: &str, charts: usize, notices: usize) {
    log(
        Level::Info,
        Domain::Render,
        "page_rendered",
        obj(&[
            ("page", v_str(page)),
            ("charts", json!(charts)),
            ("notices", json!(notices)),
        ]),
    );
}

pub fn log_notice(page: &str, table: &str, detail: &str) {
    log(
        Level::Warn,
        Domain::Aggregate,
        "notice",
        obj(&[
            ("page", v_str(page)),
            ("table", v_str(table)),
            ("msg", v_str(detail)),
        ]),
    );
}

pub fn log_request(method: &str, target: &str, status: u16, bytes: usize) {
    let level = if status >= 500 { Level::Warn } else { Level::Info };
    log(
        level,
        Domain::Server,
        "request",
        obj(&[
            ("method", v_str(method)),
            ("target", v_str(target)),
            ("status", json!(status)),
            ("bytes", json!(bytes)),
        ]),
    );
}

// =============================================================================
// Field helpers
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Timing
// =============================================================================

/// Logs the elapsed wall time of a scope at trace level when dropped.
pub struct ProfileScope {
    label: &'static str,
    context: Map<String, Value>,
    started: Instant,
}

impl ProfileScope {
    pub fn new(label: &'static str) -> Self {
        Self::with_context(label, &[])
    }

    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        Self {
            label,
            context: obj(fields),
            started: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let mut fields = std::mem::take(&mut self.context);
        fields.insert("label".into(), v_str(self.label));
        fields.insert(
            "elapsed_ms".into(),
            v_num(self.started.elapsed().as_secs_f64() * 1000.0),
        );
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(Level::parse("warn"), Some(Level::Warn));
        assert_eq!(Level::parse(" DEBUG "), Some(Level::Debug));
        assert_eq!(Level::parse("loud"), None);
    }

    #[test]
    fn test_filter_domains() {
        let filter = LogFilter {
            min_level: Level::Info,
            domains: Some(["data".to_string(), "server".to_string()].into_iter().collect()),
        };
        assert!(filter.allows(Level::Info, Domain::Data));
        assert!(!filter.allows(Level::Debug, Domain::Data));
        assert!(!filter.allows(Level::Fatal, Domain::Render));

        let all = LogFilter {
            min_level: Level::Trace,
            domains: None,
        };
        assert!(all.allows(Level::Trace, Domain::Profile));
    }

    #[test]
    fn test_obj_helper() {
        let m = obj(&[("key", v_str("value")), ("num", v_num(42.0))]);
        assert_eq!(m["key"], "value");
        assert_eq!(m["num"], 42.0);
    }

    #[test]
    fn test_seq_increments() {
        let s1 = next_seq();
        let s2 = next_seq();
        assert!(s2 > s1);
    }

    #[test]
    fn test_domain_serializes_as_its_name() {
        for d in [Domain::Data, Domain::Aggregate, Domain::Server, Domain::Profile] {
            assert_eq!(serde_json::to_value(d).unwrap(), d.as_str());
        }
    }
}
