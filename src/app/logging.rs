// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const QUIET_MODULES: &str = "h2=info,hyper=info,hyper_util=info,reqwest=info,rustls=info,alloy_transport_http=info,alloy_rpc_client=info";

/// Bare levels ("debug") get the quiet-module defaults appended; full
/// directive strings are used as given.
pub fn filter_spec(log_level: &str) -> String {
    let normalized = log_level.trim();
    if normalized.is_empty() {
        format!("info,{QUIET_MODULES}")
    } else if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!("{normalized},{QUIET_MODULES}")
    }
}

/// `RUST_LOG` wins over the flag-derived level.
pub fn level_for(debug: bool) -> String {
    std::env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| if debug { "debug" } else { "info" }.to_string())
}

pub fn setup_logging(log_level: &str, json_format: bool) {
    let spec = filter_spec(log_level);
    let filter = EnvFilter::from_str(&spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        subscriber.with(json_layer).try_init()
    } else {
        let fmt_layer = fmt::layer().with_target(true).compact();
        subscriber.with(fmt_layer).try_init()
    };
    if installed.is_err() {
        return;
    }

    let base = spec.split(',').next().map(str::trim).unwrap_or("info");
    tracing::debug!(
        target: "config",
        base,
        format = if json_format { "json" } else { "compact" },
        "Logging initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_gets_quiet_defaults() {
        let spec = filter_spec("debug");
        assert!(spec.starts_with("debug,"));
        assert!(spec.contains("hyper=info"));
        assert_eq!(filter_spec("warn,oxidity_cycler=trace"), "warn,oxidity_cycler=trace");
        assert!(filter_spec("  ").starts_with("info,"));
    }
}
