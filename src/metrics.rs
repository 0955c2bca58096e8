//! Per-stage timing metrics for parsing and validation

use std::time::Duration;

/// Elapsed time per pipeline stage.
///
/// Every timed entry point has a `_with_metrics` variant that returns this
/// record alongside the normal result, regardless of outcome. Parsing-only
/// operations leave the validation stages at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    /// Grammar parsing time
    pub parsing: Duration,
    /// Total mail-exchanger lookup time
    pub mx_lookup: Duration,
    /// DNS query time within the MX lookup
    pub dns_lookup: Duration,
    /// Exchanger connection time within the MX lookup
    pub mx_conn: Duration,
    /// Provider-specific local-part grammar time
    pub custom_grammar: Duration,
}

impl Metrics {
    /// Add every stage of `other` into this record.
    pub fn absorb(&mut self, other: &Self) {
        self.parsing += other.parsing;
        self.mx_lookup += other.mx_lookup;
        self.dns_lookup += other.dns_lookup;
        self.mx_conn += other.mx_conn;
        self.custom_grammar += other.custom_grammar;
    }
}
