use chrono::{DateTime, Utc};

use super::term::Term;

/// Materialized view over a form's term log, updated on every append.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormProjection {
    pub term_count: usize,
    pub event_count: usize,
    /// Sum of raw intensities.
    pub raw_total: f64,
    pub last_timestamp: Option<DateTime<Utc>>,
}

impl FormProjection {
    pub fn rebuild(terms: &[Term]) -> Self {
        let mut p = Self::default();
        for t in terms {
            p.apply(t);
        }
        p
    }

    pub fn apply(&mut self, term: &Term) {
        self.term_count += 1;
        if term.role.is_event() {
            self.event_count += 1;
        }
        self.raw_total += term.intensity;
        self.last_timestamp = Some(match self.last_timestamp {
            Some(ts) if ts > term.timestamp => ts,
            _ => term.timestamp,
        });
    }
}
