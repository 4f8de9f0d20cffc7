//! Configuration types for pedigree loading and layout.
//!
//! All types implement [`serde::Deserialize`] with per-field defaults, so a
//! configuration file only needs to name the values it overrides.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`SourceConfig`] - Where and how the record store is reached.
//! - [`ExpansionConfig`] - Bounds on relationship expansion.
//! - [`LayoutConfig`] - Spacing and iteration limits for the layout engine.
//!
//! # Example
//!
//! ```
//! # use pedigree::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.expansion().max_rounds(), 10);
//! assert!(config.layout().partner_spacing() > 0.0);
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::error::PedigreeError;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Record store section.
    #[serde(default)]
    source: SourceConfig,

    /// Expansion section.
    #[serde(default)]
    expansion: ExpansionConfig,

    /// Layout section.
    #[serde(default)]
    layout: LayoutConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(source: SourceConfig, expansion: ExpansionConfig, layout: LayoutConfig) -> Self {
        Self {
            source,
            expansion,
            layout,
        }
    }

    /// Returns the record store configuration.
    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    /// Returns the expansion configuration.
    pub fn expansion(&self) -> &ExpansionConfig {
        &self.expansion
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`PedigreeError::Config`] for a zero round cap or batch size,
    /// a zero timeout, or non-positive spacings.
    pub fn validate(&self) -> Result<(), PedigreeError> {
        if self.expansion.max_rounds == 0 {
            return Err(PedigreeError::Config(
                "expansion.max_rounds must be at least 1".to_string(),
            ));
        }
        if self.expansion.max_batch == 0 {
            return Err(PedigreeError::Config(
                "expansion.max_batch must be at least 1".to_string(),
            ));
        }
        if self.source.round_timeout_ms == 0 {
            return Err(PedigreeError::Config(
                "source.round_timeout_ms must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("layout.node_spacing", self.layout.node_spacing),
            ("layout.generation_spacing", self.layout.generation_spacing),
            ("layout.partner_spacing", self.layout.partner_spacing),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(PedigreeError::Config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Record store settings, injected into every collaborator call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    api_base: Option<String>,
    auth_token: Option<String>,
    round_timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            auth_token: None,
            round_timeout_ms: 10_000,
        }
    }
}

impl SourceConfig {
    pub fn new(api_base: Option<String>, auth_token: Option<String>, round_timeout: Duration) -> Self {
        Self {
            api_base,
            auth_token,
            round_timeout_ms: u64::try_from(round_timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn api_base(&self) -> Option<&str> {
        self.api_base.as_deref()
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Deadline for a single collaborator round trip.
    pub fn round_timeout(&self) -> Duration {
        Duration::from_millis(self.round_timeout_ms)
    }
}

/// Bounds on relationship expansion.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    max_rounds: usize,
    max_batch: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_rounds: 10,
            max_batch: 500,
        }
    }
}

impl ExpansionConfig {
    pub fn new(max_rounds: usize, max_batch: usize) -> Self {
        Self {
            max_rounds,
            max_batch,
        }
    }

    /// Safety cap on the number of expansion rounds.
    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Maximum number of ids sent in one round.
    pub fn max_batch(&self) -> usize {
        self.max_batch
    }
}

/// Spacing and iteration limits for the layout engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    node_spacing: f32,
    generation_spacing: f32,
    partner_spacing: f32,
    max_sweeps: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: 180.0,
            generation_spacing: 160.0,
            partner_spacing: 120.0,
            max_sweeps: 24,
        }
    }
}

impl LayoutConfig {
    pub fn new(node_spacing: f32, generation_spacing: f32, partner_spacing: f32, max_sweeps: usize) -> Self {
        Self {
            node_spacing,
            generation_spacing,
            partner_spacing,
            max_sweeps,
        }
    }

    /// Horizontal distance between neighbours within a generation.
    pub fn node_spacing(&self) -> f32 {
        self.node_spacing
    }

    /// Vertical distance between generations.
    pub fn generation_spacing(&self) -> f32 {
        self.generation_spacing
    }

    /// Minimum horizontal distance between the two partners of a union.
    pub fn partner_spacing(&self) -> f32 {
        self.partner_spacing
    }

    /// Cap on crossing-reduction sweeps.
    pub fn max_sweeps(&self) -> usize {
        self.max_sweeps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        AppConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"layout": {"partner_spacing": 90.0}}"#)
            .expect("valid config");

        assert_eq!(config.layout().partner_spacing(), 90.0);
        assert_eq!(config.layout().node_spacing(), 180.0);
        assert_eq!(config.expansion().max_rounds(), 10);
        assert_eq!(config.source().round_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_validate_rejects_zero_rounds() {
        let config = AppConfig::new(
            SourceConfig::default(),
            ExpansionConfig::new(0, 10),
            LayoutConfig::default(),
        );
        assert!(matches!(config.validate(), Err(PedigreeError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_negative_spacing() {
        let config = AppConfig::new(
            SourceConfig::default(),
            ExpansionConfig::default(),
            LayoutConfig::new(180.0, 160.0, -1.0, 24),
        );
        let err = config.validate().expect_err("negative spacing");
        assert!(err.to_string().contains("layout.partner_spacing"));
    }
}
