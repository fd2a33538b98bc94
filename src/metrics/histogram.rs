use std::collections::HashMap;
use std::fmt;

use super::types::ResponseTimings;

const BAR_WIDTH: u64 = 20;

/// Counts of each status code seen in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusHistogram {
    counts: HashMap<u16, u64>,
    order: Vec<u16>,
    total: u64,
}

impl StatusHistogram {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn build(timings: &ResponseTimings) -> Self {
        let mut histogram = Self::new();
        for response in timings.responses() {
            histogram.add(response.status_code);
        }
        histogram
    }

    pub fn add(&mut self, code: u16) {
        let count = self.counts.entry(code).or_insert_with(|| {
            self.order.push(code);
            0
        });
        *count = count.saturating_add(1);
        self.total = self.total.saturating_add(1);
    }

    #[must_use]
    pub fn count(&self, code: u16) -> u64 {
        self.counts.get(&code).copied().unwrap_or(0)
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Codes in the order they were first seen.
    #[must_use]
    pub fn codes(&self) -> &[u16] {
        &self.order
    }

    /// Codes with counts, ascending by code.
    #[must_use]
    pub fn sorted(&self) -> Vec<(u16, u64)> {
        let mut rows: Vec<(u16, u64)> = self
            .counts
            .iter()
            .map(|(code, count)| (*code, *count))
            .collect();
        rows.sort_unstable_by_key(|(code, _)| *code);
        rows
    }

    fn bar(&self, count: u64) -> String {
        let len = count
            .saturating_mul(BAR_WIDTH)
            .checked_div(self.total)
            .unwrap_or(0);
        let mut bar = "=".repeat(usize::try_from(len).unwrap_or(0));
        bar.push('>');
        bar
    }
}

impl fmt::Display for StatusHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (code, count) in self.sorted() {
            writeln!(f, "{}: {:<21} {}x", code, self.bar(count), count)?;
        }
        Ok(())
    }
}
