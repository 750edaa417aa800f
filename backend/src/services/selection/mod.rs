//! Device selection.
//!
//! For every (batch, sheet) the optimizer keeps an exact number of pixels per
//! device, keeps the set of devices whose pooled pixels best meet the chosen
//! objective, and ranks sheets by the same objective over that pooled sample.

pub mod basis;
pub mod options;
pub mod subset;

pub use basis::{pixel_samples, PixelSample};
pub use options::{Basis, Method, SelectionMode, SelectionOptions, ALLOWED_PIXELS_PER_DEVICE};
pub use subset::{best_device_subset, best_subset, binomial, SubsetChoice};

use indexmap::IndexMap;
use rayon::prelude::*;

use crate::api::SelectionResult;
use crate::models::RecordSet;
use crate::services::analysis_log::AnalysisLog;
use crate::services::statistics::{mean, population_std};

/// Pixels retained for one device.
#[derive(Debug, Clone)]
pub struct DeviceChoice<'a> {
    pub device_id: &'a str,
    /// Retained pixels in first-seen order
    pub pixels: Vec<PixelSample<'a>>,
    /// Objective value over the retained pixels
    pub score: f64,
    pub exhaustive: bool,
}

/// A retained (batch, sheet) with its devices.
#[derive(Debug, Clone)]
pub struct SheetSelection<'a> {
    /// 1-based, across all retained sheets
    pub rank: usize,
    pub batch_id: &'a str,
    pub sheet_id: &'a str,
    pub devices_mode: String,
    /// First-seen order, or pick order when the device set was grown greedily
    pub devices: Vec<DeviceChoice<'a>>,
    pub combined_mean: f64,
    pub combined_std: f64,
}

impl SheetSelection<'_> {
    pub fn total_pixels(&self) -> usize {
        self.devices.iter().map(|d| d.pixels.len()).sum()
    }

    fn score(&self, method: Method) -> f64 {
        match method {
            Method::MinimizeSd => self.combined_std,
            Method::MaximizeMeanPce => self.combined_mean,
        }
    }

    pub fn to_result(&self, options: &SelectionOptions) -> SelectionResult {
        SelectionResult {
            rank: self.rank,
            batch_id: self.batch_id.to_string(),
            sheet_id: self.sheet_id.to_string(),
            devices_mode: self.devices_mode.clone(),
            pixels_per_device: options.pixels_per_device,
            selected_devices: self.devices.iter().map(|d| d.device_id.to_string()).collect(),
            selected_pixels: self
                .devices
                .iter()
                .map(|d| {
                    (
                        d.device_id.to_string(),
                        d.pixels.iter().map(|p| p.pixel_id.to_string()).collect(),
                    )
                })
                .collect(),
            total_pixels_used: self.total_pixels(),
            combined_mean_pce: self.combined_mean,
            combined_std_pce: self.combined_std,
            method: options.method,
            basis: options.basis,
        }
    }
}

/// Ranked sheets of one selection run.
#[derive(Debug, Clone, Default)]
pub struct SelectionOutcome<'a> {
    pub sheets: Vec<SheetSelection<'a>>,
}

impl SelectionOutcome<'_> {
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn results(&self, options: &SelectionOptions) -> Vec<SelectionResult> {
        self.sheets.iter().map(|s| s.to_result(options)).collect()
    }

    /// Devices retained across all sheets.
    pub fn devices_selected(&self) -> usize {
        self.sheets.iter().map(|s| s.devices.len()).sum()
    }

    pub fn total_pixels(&self) -> usize {
        self.sheets.iter().map(SheetSelection::total_pixels).sum()
    }
}

struct DeviceCandidate<'a> {
    batch_id: &'a str,
    sheet_id: &'a str,
    device_id: &'a str,
    pixels: Vec<PixelSample<'a>>,
}

enum DeviceOutcome<'a> {
    Chosen {
        batch_id: &'a str,
        sheet_id: &'a str,
        choice: DeviceChoice<'a>,
    },
    TooFewPixels,
}

/// Keep the best `size` pixels of one device. Pure, so devices can be
/// evaluated in any order.
fn evaluate_device<'a>(
    candidate: DeviceCandidate<'a>,
    size: usize,
    method: Method,
    combination_limit: u64,
) -> DeviceOutcome<'a> {
    let values: Vec<f64> = candidate.pixels.iter().map(|p| p.pce).collect();
    let Some(subset) = best_subset(&values, size, method, combination_limit) else {
        return DeviceOutcome::TooFewPixels;
    };

    let pixels = candidate
        .pixels
        .into_iter()
        .enumerate()
        .filter(|(i, _)| subset.indices.binary_search(i).is_ok())
        .map(|(_, p)| p)
        .collect();

    DeviceOutcome::Chosen {
        batch_id: candidate.batch_id,
        sheet_id: candidate.sheet_id,
        choice: DeviceChoice {
            device_id: candidate.device_id,
            pixels,
            score: subset.score,
            exhaustive: subset.exhaustive,
        },
    }
}

fn devices_mode_label(mode: SelectionMode, available: usize) -> String {
    match mode {
        SelectionMode::TopK(k) if k > available => SelectionMode::SelectAll.label(),
        other => other.label(),
    }
}

/// Run the selection over every batch of `records`.
///
/// Sheets are ranked best first across the whole result set; equal
/// objective values keep batch-then-sheet first-seen order.
pub fn select<'a>(
    records: &'a RecordSet,
    options: &SelectionOptions,
    combination_limit: u64,
    log: &mut AnalysisLog,
) -> SelectionOutcome<'a> {
    let method = options.method;
    let size = options.pixels_per_device;

    log.info(format!("Preparing PCE using basis={}", options.basis));
    let mut samples = pixel_samples(records, options.basis, log);

    if let Some(allowed) = &options.sheet_allow_list {
        let before = samples.len();
        samples.retain(|s| allowed.iter().any(|id| id == s.sheet_id));
        log.info(format!(
            "Sheet filter applied: kept {} / {} pixel(s)",
            samples.len(),
            before
        ));
    }

    let mut devices: IndexMap<(&str, &str, &str), Vec<PixelSample<'a>>> = IndexMap::new();
    for sample in samples {
        devices
            .entry((sample.batch_id, sample.sheet_id, sample.device_id))
            .or_default()
            .push(sample);
    }

    log.info(format!(
        "Building device candidates (M={}, method={})",
        size, method
    ));
    let candidates: Vec<DeviceCandidate<'a>> = devices
        .into_iter()
        .map(|((batch_id, sheet_id, device_id), pixels)| DeviceCandidate {
            batch_id,
            sheet_id,
            device_id,
            pixels,
        })
        .collect();
    let candidate_count = candidates.len();

    let outcomes: Vec<DeviceOutcome<'a>> = candidates
        .into_par_iter()
        .map(|c| evaluate_device(c, size, method, combination_limit))
        .collect();

    let mut too_few = 0usize;
    let mut sheets: IndexMap<(&str, &str), Vec<DeviceChoice<'a>>> = IndexMap::new();
    for outcome in outcomes {
        match outcome {
            DeviceOutcome::Chosen {
                batch_id,
                sheet_id,
                choice,
            } => {
                if !choice.exhaustive {
                    log.warning(format!(
                        "Too many pixel combinations for device {} (sheet {}, batch {}); using sorted selection",
                        choice.device_id, sheet_id, batch_id
                    ));
                }
                sheets.entry((batch_id, sheet_id)).or_default().push(choice);
            }
            DeviceOutcome::TooFewPixels => too_few += 1,
        }
    }
    if too_few > 0 {
        log.info(format!(
            "{} of {} device(s) dropped with fewer than {} pixels",
            too_few, candidate_count, size
        ));
    }

    log.info("Selecting devices per (Batch, Sheet)");
    let mut per_batch: IndexMap<&str, Vec<SheetSelection<'a>>> = IndexMap::new();
    for ((batch_id, sheet_id), choices) in sheets {
        let available = choices.len();
        let pools: Vec<Vec<f64>> = choices
            .iter()
            .map(|d| d.pixels.iter().map(|p| p.pce).collect())
            .collect();
        let Some(kept) = best_device_subset(
            &pools,
            options.devices.limit(available),
            method,
            combination_limit,
        ) else {
            continue;
        };
        if !kept.exhaustive {
            log.warning(format!(
                "Too many device combinations for sheet {} (batch {}); using greedy selection",
                sheet_id, batch_id
            ));
        }
        let mut slots: Vec<Option<DeviceChoice<'a>>> = choices.into_iter().map(Some).collect();
        let choices: Vec<DeviceChoice<'a>> = kept
            .indices
            .iter()
            .filter_map(|&i| slots[i].take())
            .collect();

        let pooled: Vec<f64> = choices
            .iter()
            .flat_map(|d| d.pixels.iter().map(|p| p.pce))
            .collect();
        let (Some(combined_mean), Some(combined_std)) = (mean(&pooled), population_std(&pooled))
        else {
            continue;
        };

        per_batch.entry(batch_id).or_default().push(SheetSelection {
            rank: 0,
            batch_id,
            sheet_id,
            devices_mode: devices_mode_label(options.devices, available),
            devices: choices,
            combined_mean,
            combined_std,
        });
    }

    let mut retained: Vec<SheetSelection<'a>> = Vec::new();
    for (_, mut batch_sheets) in per_batch {
        batch_sheets.sort_by(|a, b| method.compare(a.score(method), b.score(method)));
        batch_sheets.truncate(options.sheets.limit(batch_sheets.len()));
        retained.extend(batch_sheets);
    }
    match options.sheets {
        SelectionMode::TopK(k) => log.info(format!("Keeping top {} sheet(s) per batch", k)),
        SelectionMode::SelectAll => log.info("Keeping all sheets (Select All)"),
    }

    // Stable, so equal scores stay in batch-then-sheet order
    retained.sort_by(|a, b| method.compare(a.score(method), b.score(method)));
    for (i, sheet) in retained.iter_mut().enumerate() {
        sheet.rank = i + 1;
    }

    SelectionOutcome { sheets: retained }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod selection_tests;
