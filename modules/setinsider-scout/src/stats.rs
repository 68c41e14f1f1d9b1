use std::fmt;

use crate::pipeline::SyncOutcome;

/// Per-symbol tally, logged when the symbol's task finishes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeStats {
    pub records_seen: u32,
    pub written: u32,
    pub skipped_duplicate: u32,
    pub malformed: u32,
    pub persistence_failed: u32,
}

impl ScrapeStats {
    pub fn record_outcome(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Written => self.written += 1,
            SyncOutcome::SkippedDuplicate => self.skipped_duplicate += 1,
        }
    }

    /// A row that could not be turned into a record.
    pub fn record_malformed(&mut self) {
        self.malformed += 1;
    }

    /// A record whose existence check or write failed.
    pub fn record_persistence_failure(&mut self) {
        self.persistence_failed += 1;
    }
}

impl fmt::Display for ScrapeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seen={} written={} duplicates={} malformed={} failed={}",
            self.records_seen,
            self.written,
            self.skipped_duplicate,
            self.malformed,
            self.persistence_failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_land_in_their_own_counters() {
        let mut stats = ScrapeStats::default();
        stats.record_malformed();
        stats.record_persistence_failure();
        stats.record_persistence_failure();
        stats.record_outcome(SyncOutcome::Written);
        stats.record_outcome(SyncOutcome::SkippedDuplicate);

        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.persistence_failed, 2);
        assert_eq!(stats.written, 1);
        assert_eq!(stats.skipped_duplicate, 1);
    }

    #[test]
    fn display_names_every_counter() {
        let stats = ScrapeStats {
            records_seen: 5,
            written: 2,
            skipped_duplicate: 1,
            malformed: 1,
            persistence_failed: 1,
        };
        assert_eq!(
            stats.to_string(),
            "seen=5 written=2 duplicates=1 malformed=1 failed=1"
        );
    }
}
