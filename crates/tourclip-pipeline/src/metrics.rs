//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; the API server installs the
//! Prometheus recorder that exports them.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const STAGE_DURATION_SECONDS: &str = "tourclip_stage_duration_seconds";
    pub const FALLBACKS_TOTAL: &str = "tourclip_fallbacks_total";
    pub const SELECTION_RESOLUTIONS_TOTAL: &str = "tourclip_selection_resolutions_total";
    pub const CLIPS_TOTAL: &str = "tourclip_clips_total";
    pub const RUNS_COMPLETED_TOTAL: &str = "tourclip_runs_completed_total";
    pub const RUNS_FAILED_TOTAL: &str = "tourclip_runs_failed_total";
    pub const ASSEMBLY_FAILURES_TOTAL: &str = "tourclip_assembly_failures_total";
}

/// Record how long a stage took.
pub fn record_stage_duration(stage: &str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a fallback substitution.
pub fn record_fallback(component: &str) {
    let labels = [("component", component.to_string())];
    counter!(names::FALLBACKS_TOTAL, &labels).increment(1);
}

/// Record which tier resolved a selection token.
pub fn record_resolution(tier: &str) {
    let labels = [("tier", tier.to_string())];
    counter!(names::SELECTION_RESOLUTIONS_TOTAL, &labels).increment(1);
}

/// Record the outcome of one clip.
pub fn record_clip(success: bool) {
    let result = if success { "success" } else { "failure" };
    let labels = [("result", result.to_string())];
    counter!(names::CLIPS_TOTAL, &labels).increment(1);
}

pub fn record_run_completed() {
    counter!(names::RUNS_COMPLETED_TOTAL).increment(1);
}

pub fn record_run_failed(stage: &str) {
    let labels = [("stage", stage.to_string())];
    counter!(names::RUNS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_assembly_failure() {
    counter!(names::ASSEMBLY_FAILURES_TOTAL).increment(1);
}
