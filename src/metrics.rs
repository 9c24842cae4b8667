//! Prometheus metrics collection for slircbot.
//!
//! - `slircbot_messages_dispatched_total{module}` - Messages evaluated per module
//! - `slircbot_rules_fired_total{module, command}` - Actions that ran to completion
//! - `slircbot_rule_faults_total{module, kind}` - Actions that errored or panicked
//! - `slircbot_module_restarts_total{module}` - Module workers restarted by the supervisor
//! - `slircbot_channel_crashes_total` - Channel actors that terminated abnormally
//! - `slircbot_active_channels` - Live channel actors
//!
//! Recording before [`init`] is a no-op, so unit tests never need a registry.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Inbound messages handed to each module worker.
pub static MESSAGES_DISPATCHED: OnceLock<IntCounterVec> = OnceLock::new();

/// Rule actions that completed successfully.
pub static RULES_FIRED: OnceLock<IntCounterVec> = OnceLock::new();

/// Rule actions that failed, by error kind.
pub static RULE_FAULTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Module worker restarts.
pub static MODULE_RESTARTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Channel actors that panicked.
pub static CHANNEL_CRASHES: OnceLock<IntCounter> = OnceLock::new();

/// Live channel actors.
pub static ACTIVE_CHANNELS: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Called once at startup. Calling it again is harmless.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(
                            error = %e,
                            concat!("Failed to register metric ", stringify!($metric))
                        );
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        concat!("Failed to create metric ", stringify!($metric))
                    );
                }
            }
        };
    }

    register!(
        MESSAGES_DISPATCHED,
        IntCounterVec::new(
            Opts::new("slircbot_messages_dispatched_total", "Messages evaluated per module"),
            &["module"]
        )
    );
    register!(
        RULES_FIRED,
        IntCounterVec::new(
            Opts::new("slircbot_rules_fired_total", "Rule actions completed"),
            &["module", "command"]
        )
    );
    register!(
        RULE_FAULTS,
        IntCounterVec::new(
            Opts::new("slircbot_rule_faults_total", "Rule actions that failed"),
            &["module", "kind"]
        )
    );
    register!(
        MODULE_RESTARTS,
        IntCounterVec::new(
            Opts::new("slircbot_module_restarts_total", "Module worker restarts"),
            &["module"]
        )
    );
    register!(
        CHANNEL_CRASHES,
        IntCounter::new(
            "slircbot_channel_crashes_total",
            "Channel actors that terminated abnormally"
        )
    );
    register!(
        ACTIVE_CHANNELS,
        IntGauge::new("slircbot_active_channels", "Live channel actors")
    );
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
        String::new()
    })
}

// ============================================================================
// Recording helpers
// ============================================================================

pub fn record_dispatch(module: &str) {
    if let Some(m) = MESSAGES_DISPATCHED.get() {
        m.with_label_values(&[module]).inc();
    }
}

pub fn record_rule_fired(module: &str, command: &str) {
    if let Some(m) = RULES_FIRED.get() {
        m.with_label_values(&[module, command]).inc();
    }
}

pub fn record_rule_fault(module: &str, kind: &str) {
    if let Some(m) = RULE_FAULTS.get() {
        m.with_label_values(&[module, kind]).inc();
    }
}

pub fn record_module_restart(module: &str) {
    if let Some(m) = MODULE_RESTARTS.get() {
        m.with_label_values(&[module]).inc();
    }
}

pub fn record_channel_crash() {
    if let Some(m) = CHANNEL_CRASHES.get() {
        m.inc();
    }
}

pub fn channel_opened() {
    if let Some(m) = ACTIVE_CHANNELS.get() {
        m.inc();
    }
}

pub fn channel_closed() {
    if let Some(m) = ACTIVE_CHANNELS.get() {
        m.dec();
    }
}
