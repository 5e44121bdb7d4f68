//! Structured run logging.
//!
//! Every line carries the run ID and tour ID so a single run can be
//! followed through the logs.

use tracing::{error, info, warn, Span};
use tourclip_models::{RunId, TourId};

/// Logger bound to one pipeline run.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    tgid: String,
}

impl RunLogger {
    pub fn new(run_id: &RunId, tour_id: &TourId) -> Self {
        Self {
            run_id: run_id.to_string(),
            tgid: tour_id.to_string(),
        }
    }

    /// Log the start of a stage.
    pub fn log_start(&self, message: &str) {
        info!(run_id = %self.run_id, tgid = %self.tgid, "Run started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(run_id = %self.run_id, tgid = %self.tgid, "Run progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(run_id = %self.run_id, tgid = %self.tgid, "Run warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(run_id = %self.run_id, tgid = %self.tgid, "Run error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(run_id = %self.run_id, tgid = %self.tgid, "Run completed: {}", message);
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn tgid(&self) -> &str {
        &self.tgid
    }

    /// Span wrapping the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("run", run_id = %self.run_id, tgid = %self.tgid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_fields() {
        let run_id = RunId::from_string("run-1");
        let logger = RunLogger::new(&run_id, &TourId::parse("123").unwrap());
        assert_eq!(logger.run_id(), "run-1");
        assert_eq!(logger.tgid(), "123");
    }
}
