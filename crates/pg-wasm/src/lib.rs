//! WebAssembly bindings for PhishGuard
//!
//! The extension's background script owns networking: it fetches the
//! dataset and hands the payload to `load_dataset`, or reports a failed
//! fetch through `report_load_failure`. Verdicts come back as plain objects
//! (or `null`) for the navigation interceptor to cache and act on.

use std::sync::OnceLock;

use wasm_bindgen::prelude::*;
use pg_core::{
    dataset::{DatasetLoadError, SnapshotOrigin},
    ClassificationEngine, RefreshOutcome, ThreatRecord,
};

static ENGINE: OnceLock<ClassificationEngine> = OnceLock::new();

fn engine() -> &'static ClassificationEngine {
    ENGINE.get_or_init(|| {
        init_logging();
        ClassificationEngine::new()
    })
}

// =============================================================================
// Logging
// =============================================================================

struct ConsoleLogger;

static CONSOLE_LOGGER: ConsoleLogger = ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[phishguard] {}", record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

fn init_logging() {
    if log::set_logger(&CONSOLE_LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

/// Enable debug output (rule hits, dropped records) in the console.
#[wasm_bindgen]
pub fn set_debug_logging(enabled: bool) {
    engine();
    log::set_max_level(if enabled { log::LevelFilter::Debug } else { log::LevelFilter::Info });
}

// =============================================================================
// Dataset
// =============================================================================

/// Has a dataset (loaded or seed) been published?
#[wasm_bindgen]
pub fn is_initialized() -> bool {
    ENGINE
        .get()
        .map(|engine| engine.snapshot().origin() != SnapshotOrigin::Empty)
        .unwrap_or(false)
}

/// Publish a fetched JSON payload.
#[wasm_bindgen]
pub fn load_dataset(json: &str) -> JsValue {
    outcome_to_js(&engine().refresh_from_bytes(json.as_bytes()))
}

/// Record that the host could not fetch the dataset.
#[wasm_bindgen]
pub fn report_load_failure(reason: &str, timed_out: bool) -> JsValue {
    let error = if timed_out {
        DatasetLoadError::Timeout(engine().loader().timeout())
    } else {
        DatasetLoadError::Transport(reason.to_string())
    };
    outcome_to_js(&engine().apply_load_result(Err(error)))
}

#[wasm_bindgen]
pub fn get_dataset_info() -> JsValue {
    let result = js_sys::Object::new();
    let snapshot = engine().snapshot();
    let _ = js_sys::Reflect::set(&result, &"entries".into(), &JsValue::from(snapshot.len() as u32));
    let _ = js_sys::Reflect::set(&result, &"origin".into(), &JsValue::from_str(snapshot.origin().as_str()));
    let _ = js_sys::Reflect::set(&result, &"generation".into(), &JsValue::from(engine().store().generation() as f64));
    result.into()
}

fn outcome_to_js(outcome: &RefreshOutcome) -> JsValue {
    let result = js_sys::Object::new();
    let status = match outcome {
        RefreshOutcome::Loaded(_) => "loaded",
        RefreshOutcome::SeedFallback(_) => "seed",
        RefreshOutcome::RetainedPrevious(_) => "retained",
    };
    let _ = js_sys::Reflect::set(&result, &"status".into(), &JsValue::from_str(status));

    if let RefreshOutcome::Loaded(stats) = outcome {
        let _ = js_sys::Reflect::set(&result, &"entries".into(), &JsValue::from(stats.entries() as u32));
        let _ = js_sys::Reflect::set(&result, &"dropped".into(), &JsValue::from(stats.dropped as u32));
        let _ = js_sys::Reflect::set(&result, &"overwritten".into(), &JsValue::from(stats.overwritten as u32));
    }
    if let Some(error) = outcome.error() {
        let _ = js_sys::Reflect::set(&result, &"error".into(), &JsValue::from_str(&error.to_string()));
    }
    result.into()
}

// =============================================================================
// Classification
// =============================================================================

/// Classify a navigation URL. Returns a verdict object or `null`.
#[wasm_bindgen]
pub fn check_url(url: &str) -> JsValue {
    match engine().check_url(url) {
        Some(record) => record_to_js(&record),
        None => JsValue::NULL,
    }
}

#[wasm_bindgen]
pub fn check_hostname(hostname: &str) -> JsValue {
    let hostname = hostname.trim().trim_end_matches('.').to_ascii_lowercase();
    match engine().check_hostname(&hostname) {
        Some(record) => record_to_js(&record),
        None => JsValue::NULL,
    }
}

/// Field names match the serde form of `ThreatRecord`.
fn record_to_js(record: &ThreatRecord) -> JsValue {
    let obj = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&obj, &"id".into(), &JsValue::from_str(&record.id));
    let _ = js_sys::Reflect::set(&obj, &"url".into(), &JsValue::from_str(&record.url));
    set_optional(&obj, "detailUrl", record.detail_url.as_deref());
    set_optional(&obj, "submissionTime", record.submission_time.as_deref());
    set_optional(&obj, "verificationTime", record.verification_time.as_deref());
    let _ = js_sys::Reflect::set(&obj, &"verified".into(), &JsValue::from_str(record.verified.as_str()));
    let _ = js_sys::Reflect::set(&obj, &"online".into(), &JsValue::from_str(record.online.as_str()));
    let _ = js_sys::Reflect::set(&obj, &"target".into(), &JsValue::from_str(&record.target));
    set_optional(&obj, "riskLevel", record.risk_level.as_ref().map(|r| r.as_str()));
    obj.into()
}

fn set_optional(obj: &js_sys::Object, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        let _ = js_sys::Reflect::set(obj, &key.into(), &JsValue::from_str(value));
    }
}
