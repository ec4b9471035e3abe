// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use rand::Rng;
use std::fmt;
use std::time::Duration;

/// A delay that is either fixed or drawn uniformly from an inclusive window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    Fixed(Duration),
    Uniform { min: Duration, max: Duration },
}

impl Pacing {
    pub const NONE: Pacing = Pacing::Fixed(Duration::ZERO);

    pub fn secs(min: u64, max: u64) -> Self {
        Self::between(Duration::from_secs(min), Duration::from_secs(max))
    }

    pub fn between(min: Duration, max: Duration) -> Self {
        if min >= max {
            Pacing::Fixed(min)
        } else {
            Pacing::Uniform { min, max }
        }
    }

    pub fn sample(&self) -> Duration {
        match *self {
            Pacing::Fixed(d) => d,
            Pacing::Uniform { min, max } => {
                let lo = min.as_millis() as u64;
                let hi = max.as_millis() as u64;
                Duration::from_millis(rand::rng().random_range(lo..=hi))
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Pacing::Fixed(d) if d.is_zero())
    }
}

impl fmt::Display for Pacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pacing::Fixed(d) => write!(f, "{:.1}s", d.as_secs_f64()),
            Pacing::Uniform { min, max } => {
                write!(f, "{:.1}-{:.1}s", min.as_secs_f64(), max.as_secs_f64())
            }
        }
    }
}

/// Sleep for one sample of `pacing`, logging the wait and its reason.
pub async fn pause(pacing: &Pacing, reason: &str) -> Duration {
    let delay = pacing.sample();
    if !delay.is_zero() {
        tracing::info!(
            target: "pacing",
            reason,
            wait_secs = format!("{:.1}", delay.as_secs_f64()),
            "Waiting"
        );
        tokio::time::sleep(delay).await;
    }
    delay
}
