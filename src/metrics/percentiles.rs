use std::collections::BTreeMap;
use std::fmt;

use super::types::ResponseTimings;

pub const REPORTED_PERCENTILES: [u8; 9] = [50, 66, 75, 80, 90, 95, 98, 99, 100];

/// Total latency at each reported percentile, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatencyPercentiles {
    values: BTreeMap<u8, u64>,
}

impl LatencyPercentiles {
    #[must_use]
    pub fn build(timings: &ResponseTimings) -> Self {
        let mut samples: Vec<u64> = timings
            .timings()
            .map(|timing| u64::try_from(timing.total().as_millis()).unwrap_or(u64::MAX))
            .collect();
        Self::from_samples(&mut samples)
    }

    pub fn from_samples(samples: &mut [u64]) -> Self {
        samples.sort_unstable();
        let values = REPORTED_PERCENTILES
            .iter()
            .filter_map(|percent| percentile(samples, *percent).map(|value| (*percent, value)))
            .collect();
        Self { values }
    }

    #[must_use]
    pub fn get(&self, percent: u8) -> Option<u64> {
        self.values.get(&percent).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Nearest-rank percentile that averages the two neighbouring samples when
/// the rank falls between them. `sorted` must be ascending.
fn percentile(sorted: &[u64], percent: u8) -> Option<u64> {
    let len = sorted.len();
    if len == 0 {
        return None;
    }
    if len == 1 {
        return sorted.first().copied();
    }
    let scaled = len.saturating_mul(usize::from(percent));
    let whole = scaled / 100;
    let has_fraction = scaled % 100 != 0;

    if !has_fraction {
        return sorted.get(whole.saturating_sub(1)).copied();
    }
    if whole == 0 {
        return sorted.first().copied();
    }
    let lower = sorted.get(whole.saturating_sub(1)).copied()?;
    let upper = sorted.get(whole).copied().unwrap_or(lower);
    Some(lower.saturating_add(upper) / 2)
}

impl fmt::Display for LatencyPercentiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (percent, millis) in &self.values {
            writeln!(f, "{}th: {}ms", percent, millis)?;
        }
        Ok(())
    }
}
