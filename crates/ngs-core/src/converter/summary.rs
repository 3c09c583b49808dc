use std::path::PathBuf;

use crate::error::ConvertError;

/// Outcome of a batch, one entry per unit
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub converted: Vec<PathBuf>,
    /// Units with no legacy definition, left untouched
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<ConvertError>,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_converted(&mut self, path: PathBuf) {
        self.converted.push(path);
    }

    pub fn record_skipped(&mut self, path: PathBuf) {
        self.skipped.push(path);
    }

    pub fn record_failure(&mut self, err: ConvertError) {
        self.failures.push(err);
    }

    pub fn converted_count(&self) -> usize {
        self.converted.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn errored_count(&self) -> usize {
        self.failures.len()
    }

    pub fn processed_count(&self) -> usize {
        self.converted_count() + self.skipped_count() + self.errored_count()
    }

    pub fn merge(&mut self, other: BatchSummary) {
        self.converted.extend(other.converted);
        self.skipped.extend(other.skipped);
        self.failures.extend(other.failures);
    }

    /// Share of processed units that were converted
    pub fn success_rate(&self) -> f64 {
        let processed = self.processed_count();
        if processed == 0 {
            0.0
        } else {
            self.converted_count() as f64 / processed as f64
        }
    }

    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::Path;

    use super::*;

    #[test]
    fn test_counts_and_merge() {
        let mut first = BatchSummary::new();
        first.record_converted("a.js".into());
        first.record_skipped("b.js".into());

        let mut second = BatchSummary::new();
        second.record_converted("c.js".into());
        second.record_failure(ConvertError::io(
            Path::new("d.js"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        ));

        first.merge(second);
        assert_eq!(first.converted_count(), 2);
        assert_eq!(first.skipped_count(), 1);
        assert_eq!(first.errored_count(), 1);
        assert_eq!(first.processed_count(), 4);
        assert!((first.success_rate() - 0.5).abs() < f64::EPSILON);
        assert!(!first.success());
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::new();
        assert_eq!(summary.success_rate(), 0.0);
        assert!(summary.success());
    }
}
