// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Metric cadence, formatted on the wire as `%.0f` seconds (§4.E).

use std::time::Duration;

/// A metric collector's cadence. `Frequency::ONCE` (zero seconds) means
/// "run exactly once, then stop" (§4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency(Duration);

impl Frequency {
    pub const ONCE: Frequency = Frequency(Duration::ZERO);

    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn is_once(&self) -> bool {
        self.0.is_zero()
    }

    /// Render as the wire's `<freqSec>` field: seconds with `%.0f`
    /// formatting (i.e. an integer, rounded).
    pub fn as_wire_string(&self) -> String {
        format!("{:.0}", self.0.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn once_is_zero_duration() {
        assert!(Frequency::ONCE.is_once());
        assert_eq!(Frequency::ONCE.as_wire_string(), "0");
    }

    #[test]
    fn formats_as_rounded_integer_seconds() {
        assert_eq!(Frequency::from_secs(60).as_wire_string(), "60");
    }
}
