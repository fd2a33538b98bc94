use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phase durations are reported in whole milliseconds.
pub const TIMING_RESOLUTION: Duration = Duration::from_millis(1);

/// Lifecycle timestamps captured for one request. Unset events stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub dns_start: Option<DateTime<Utc>>,
    pub dns_done: Option<DateTime<Utc>>,
    pub connect_start: Option<DateTime<Utc>>,
    pub connect_done: Option<DateTime<Utc>>,
    pub tls_start: Option<DateTime<Utc>>,
    pub tls_done: Option<DateTime<Utc>>,
    pub got_connection: Option<DateTime<Utc>>,
    pub first_byte: Option<DateTime<Utc>>,
    pub done: Option<DateTime<Utc>>,
}

impl Timing {
    #[must_use]
    pub fn dns_lookup(&self) -> Duration {
        span(self.dns_start, self.dns_done)
    }

    /// Connect time starts at DNS completion when a lookup happened,
    /// otherwise at the connect event (dialing an IP directly).
    #[must_use]
    pub fn tcp_connect(&self) -> Duration {
        span(self.dns_done.or(self.connect_start), self.connect_done)
    }

    #[must_use]
    pub fn tls_handshake(&self) -> Duration {
        span(self.tls_start, self.tls_done)
    }

    #[must_use]
    pub fn server_wait(&self) -> Duration {
        span(self.got_connection, self.first_byte)
    }

    #[must_use]
    pub fn transfer(&self) -> Duration {
        span(self.first_byte, self.done)
    }

    /// Measured from the earliest recorded start event. A reused connection
    /// only reports `got_connection`, so server wait is included there.
    #[must_use]
    pub fn total(&self) -> Duration {
        let start = [
            self.dns_start,
            self.connect_start,
            self.tls_start,
            self.got_connection,
        ]
        .into_iter()
        .flatten()
        .min();
        span(start, self.done)
    }
}

fn span(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Duration {
    match (start, end) {
        (Some(start), Some(end)) => truncate(end.signed_duration_since(start).to_std().unwrap_or_default()),
        (None, _) | (_, None) => Duration::ZERO,
    }
}

fn truncate(duration: Duration) -> Duration {
    let millis = duration
        .as_millis()
        .checked_div(TIMING_RESOLUTION.as_millis())
        .unwrap_or(0);
    Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<=>             DNS Lookup:        {}", format_duration(self.dns_lookup()))?;
        writeln!(f, "   <=>          TCP Connection:    {}", format_duration(self.tcp_connect()))?;
        writeln!(f, "      <=>       TLS Handshake:     {}", format_duration(self.tls_handshake()))?;
        writeln!(f, "         <=>    Server:            {}", format_duration(self.server_wait()))?;
        writeln!(f, "            <=> Response Transfer: {}", format_duration(self.transfer()))?;
        write!(f, "<=============> Total:             {}", format_duration(self.total()))
    }
}

/// Lifecycle events a transport can report while a request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    DnsStart,
    DnsDone,
    ConnectStart,
    ConnectDone,
    TlsStart,
    TlsDone,
    GotConnection,
    FirstByte,
}

/// Collects events for one in-flight request. Once `finish` stamps `done`
/// the timing is frozen and later events are ignored.
#[derive(Debug, Default)]
pub struct PhaseTimer {
    timing: Mutex<Timing>,
}

impl PhaseTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: PhaseEvent) {
        self.record_at(event, Utc::now());
    }

    pub fn record_at(&self, event: PhaseEvent, at: DateTime<Utc>) {
        let mut timing = self.timing.lock().unwrap_or_else(PoisonError::into_inner);
        if timing.done.is_some() {
            return;
        }
        let slot = match event {
            PhaseEvent::DnsStart => &mut timing.dns_start,
            PhaseEvent::DnsDone => &mut timing.dns_done,
            PhaseEvent::ConnectStart => &mut timing.connect_start,
            PhaseEvent::ConnectDone => &mut timing.connect_done,
            PhaseEvent::TlsStart => &mut timing.tls_start,
            PhaseEvent::TlsDone => &mut timing.tls_done,
            PhaseEvent::GotConnection => &mut timing.got_connection,
            PhaseEvent::FirstByte => &mut timing.first_byte,
        };
        *slot = Some(at);
    }

    #[must_use]
    pub fn has_recorded(&self, event: PhaseEvent) -> bool {
        let timing = self.snapshot();
        let slot = match event {
            PhaseEvent::DnsStart => timing.dns_start,
            PhaseEvent::DnsDone => timing.dns_done,
            PhaseEvent::ConnectStart => timing.connect_start,
            PhaseEvent::ConnectDone => timing.connect_done,
            PhaseEvent::TlsStart => timing.tls_start,
            PhaseEvent::TlsDone => timing.tls_done,
            PhaseEvent::GotConnection => timing.got_connection,
            PhaseEvent::FirstByte => timing.first_byte,
        };
        slot.is_some()
    }

    #[must_use]
    pub fn finish(&self) -> Timing {
        self.finish_at(Utc::now())
    }

    #[must_use]
    pub fn finish_at(&self, at: DateTime<Utc>) -> Timing {
        let mut timing = self.timing.lock().unwrap_or_else(PoisonError::into_inner);
        if timing.done.is_none() {
            timing.done = Some(at);
        }
        *timing
    }

    #[must_use]
    pub fn snapshot(&self) -> Timing {
        *self.timing.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Formats a duration the way Go prints `time.Duration` (`0s`, `250ms`, `1m2.5s`).
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_owned();
    }
    if duration < Duration::from_micros(1) {
        return format!("{}ns", duration.as_nanos());
    }
    if duration < Duration::from_millis(1) {
        return format!("{}µs", trim_fraction(duration.as_nanos(), 1_000));
    }
    if duration < Duration::from_secs(1) {
        return format!("{}ms", trim_fraction(duration.as_nanos(), 1_000_000));
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs_nanos = u128::from(total_secs % 60)
        .saturating_mul(1_000_000_000)
        .saturating_add(u128::from(duration.subsec_nanos()));
    let seconds = trim_fraction(secs_nanos, 1_000_000_000);

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

fn trim_fraction(value: u128, unit: u128) -> String {
    let whole = value.checked_div(unit).unwrap_or(0);
    let fraction = value.checked_rem(unit).unwrap_or(0);
    if fraction == 0 {
        return whole.to_string();
    }
    let width = unit.to_string().len().saturating_sub(1);
    let digits = format!("{:0width$}", fraction, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
