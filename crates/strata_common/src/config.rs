use serde::{Deserialize, Serialize};

/// Top-level configuration, one section per subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrataConfig {
    #[serde(default)]
    pub tuning: TuningConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Index auto-tuning section in strata.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningConfig {
    /// Enable the background tuning daemon (default: true).
    pub enabled: bool,
    /// Total memory budget for secondary indexes in bytes.
    pub memory_budget_bytes: u64,
    /// Interval between tuning rounds in seconds (default: 60).
    #[serde(default = "default_evaluation_interval_secs")]
    pub evaluation_interval_secs: u64,
    /// Deadline for a single round in milliseconds (0 = no deadline).
    #[serde(default)]
    pub round_deadline_ms: u64,
    /// Assumed match fraction for LIKE predicates with a constant prefix.
    #[serde(default = "default_selectivity_like")]
    pub selectivity_like: f32,
    /// Assumed match fraction for IN list predicates.
    #[serde(default = "default_selectivity_in")]
    pub selectivity_in_default: f32,
    /// Benefit penalty per unit of missing confidence; 0 disables the
    /// penalty and choices are ranked by raw saved work.
    #[serde(default)]
    pub confidence_penalty_lambda: f32,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            memory_budget_bytes: 256 * 1024 * 1024,
            evaluation_interval_secs: default_evaluation_interval_secs(),
            round_deadline_ms: 0,
            selectivity_like: default_selectivity_like(),
            selectivity_in_default: default_selectivity_in(),
            confidence_penalty_lambda: 0.0,
        }
    }
}

fn default_evaluation_interval_secs() -> u64 {
    60
}

fn default_selectivity_like() -> f32 {
    0.2
}

fn default_selectivity_in() -> f32 {
    0.1
}

/// Observability section: metrics endpoint address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Prometheus exporter listen address (empty = disabled).
    #[serde(default)]
    pub metrics_listen_addr: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_listen_addr: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = TuningConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.evaluation_interval_secs, 60);
        assert!(cfg.selectivity_like > 0.0 && cfg.selectivity_like <= 1.0);
        assert_eq!(cfg.confidence_penalty_lambda, 0.0);
    }

    #[test]
    fn test_partial_section_deserializes_with_defaults() {
        let cfg: TuningConfig =
            serde_json::from_str(r#"{"enabled": false, "memory_budget_bytes": 1024}"#).unwrap();
        assert!(!cfg.enabled);
        assert_eq!(cfg.memory_budget_bytes, 1024);
        assert_eq!(cfg.evaluation_interval_secs, 60);
    }
}
