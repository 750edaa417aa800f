#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use pvdash::models::RawRow;
use serde_json::{json, Value};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores variables on unwind and serializes access to process-global env
/// vars, since tests run in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Convert a JSON object literal into a raw upload row.
pub fn raw(value: Value) -> RawRow {
    value.as_object().cloned().expect("row literal must be a JSON object")
}

/// One raw row per PCE value, pixels numbered from 1.
pub fn pixel_rows(
    batch: &str,
    sheet: &str,
    device: &str,
    direction: &str,
    pces: &[f64],
) -> Vec<RawRow> {
    pces.iter()
        .enumerate()
        .map(|(i, pce)| {
            raw(json!({
                "Batch ID": batch,
                "Sheet ID": sheet,
                "Device ID": device,
                "Pixel ID": i + 1,
                "Scan Direction": direction,
                "PCE (%)": pce,
            }))
        })
        .collect()
}

/// A dated forward-scan row carrying PCE, FF and V_oc.
pub fn dated_row(batch: &str, date: &str, pce: f64, ff: f64, voc: f64) -> RawRow {
    raw(json!({
        "Batch ID": batch,
        "Sheet ID": "S1",
        "Device ID": "D1",
        "Pixel ID": "1",
        "Scan Direction": "Forward",
        "PCE (%)": pce,
        "FF (%)": ff,
        "V_oc (V)": voc,
        "Date": date,
    }))
}
