#![forbid(unsafe_code)]

//! Navigator tunables as data.
//!
//! Every number the navigator uses lives in [`NavigatorConfig`], which can be
//! loaded from TOML or JSON with the `nav-config` feature.
//!
//! ```toml
//! header_offset = 64
//! scroll_padding = 8
//! tie_break = "ratio_first"
//!
//! [observer]
//! root_margin_bottom = 0.5
//! ```
//!
//! # Defaults
//!
//! `NavigatorConfig::default()` reproduces a page with a 56 px sticky
//! header: activation line at 68 px, a 60% bottom root margin, scroll
//! settles within 150-700 ms, and an 8 px indicator inset.

#[cfg(feature = "nav-config")]
use std::path::Path;

#[cfg(feature = "nav-config")]
use serde::{Deserialize, Serialize};

use secnav_core::{ObserverOptions, TieBreak};
use web_time::Duration;

/// Observer root and reporting thresholds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "nav-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "nav-config", serde(default))]
pub struct ObserverConfig {
    /// Fraction of the viewport trimmed from the bottom of the root.
    pub root_margin_bottom: f64,
    /// Extra pixels trimmed above the header at the top of the root.
    pub root_margin_top_extra: f64,
    /// Crossing ratios reported by the environment.
    pub thresholds: Vec<f64>,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            root_margin_bottom: 0.6,
            root_margin_top_extra: -8.0,
            thresholds: vec![0.0, 0.1, 0.25, 0.5, 0.75, 1.0],
        }
    }
}

/// All navigator tunables.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "nav-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "nav-config", serde(default))]
pub struct NavigatorConfig {
    /// Height of the fixed header, supplied by the page.
    pub header_offset: f64,
    /// Gap left between the header and a section after `go_to`.
    pub scroll_padding: f64,
    /// Distance of the activation line below the header.
    pub activation_margin: f64,
    pub observer: ObserverConfig,
    /// Shortest settle estimate.
    pub settle_min_ms: u64,
    /// Longest settle estimate.
    pub settle_max_ms: u64,
    /// Settle estimate per pixel of scroll distance.
    pub settle_ms_per_px: f64,
    /// Horizontal inset of the indicator inside its tab.
    pub indicator_inset: f64,
    pub tie_break: TieBreak,
    /// Jump to the fragment's section on mount.
    pub scroll_on_deep_link: bool,
    /// Accept arrow/Home/End keys on the tab strip.
    pub keyboard_navigation: bool,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            header_offset: 56.0,
            scroll_padding: 12.0,
            activation_margin: 12.0,
            observer: ObserverConfig::default(),
            settle_min_ms: 150,
            settle_max_ms: 700,
            settle_ms_per_px: 0.35,
            indicator_inset: 8.0,
            tie_break: TieBreak::DistanceFirst,
            scroll_on_deep_link: true,
            keyboard_navigation: true,
        }
    }
}

impl NavigatorConfig {
    /// Load from a TOML string.
    #[cfg(feature = "nav-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "nav-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "nav-config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "nav-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate parameter ranges.
    ///
    /// Returns a list of problems. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, value) in [
            ("header_offset", self.header_offset),
            ("scroll_padding", self.scroll_padding),
            ("activation_margin", self.activation_margin),
            ("indicator_inset", self.indicator_inset),
            ("settle_ms_per_px", self.settle_ms_per_px),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{name} must be finite and >= 0, got {value}"));
            }
        }

        let bottom = self.observer.root_margin_bottom;
        if !(0.0..1.0).contains(&bottom) {
            errors.push(format!(
                "observer.root_margin_bottom must be in [0, 1), got {bottom}"
            ));
        }

        if !self.observer.root_margin_top_extra.is_finite() {
            errors.push("observer.root_margin_top_extra must be finite".into());
        }

        if self.observer.thresholds.is_empty() {
            errors.push("observer.thresholds must not be empty".into());
        }
        if self
            .observer
            .thresholds
            .iter()
            .any(|t| !(0.0..=1.0).contains(t))
        {
            errors.push("observer.thresholds must lie in [0, 1]".into());
        }
        if self.observer.thresholds.windows(2).any(|w| w[0] >= w[1]) {
            errors.push("observer.thresholds must be strictly increasing".into());
        }

        if self.settle_min_ms == 0 {
            errors.push("settle_min_ms must be > 0".into());
        }
        if self.settle_max_ms < self.settle_min_ms {
            errors.push(format!(
                "settle_max_ms ({}) must be >= settle_min_ms ({})",
                self.settle_max_ms, self.settle_min_ms
            ));
        }

        errors
    }

    /// `self` if it validates, otherwise every problem found.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Vertical offset of the activation line from the viewport top.
    #[must_use]
    pub fn activation_line(&self) -> f64 {
        self.header_offset + self.activation_margin
    }

    /// Options handed to the environment's visibility observer.
    #[must_use]
    pub fn observer_options(&self) -> ObserverOptions {
        ObserverOptions {
            root_margin_top: (self.header_offset + self.observer.root_margin_top_extra).max(0.0),
            root_margin_bottom_fraction: self.observer.root_margin_bottom,
            thresholds: self.observer.thresholds.clone(),
            activation_line: self.activation_line(),
        }
    }

    /// Scroll and settle parameters for the navigation controller.
    #[must_use]
    pub fn scroll_policy(&self) -> ScrollPolicy {
        ScrollPolicy {
            header_offset: self.header_offset,
            scroll_padding: self.scroll_padding,
            settle_min: Duration::from_millis(self.settle_min_ms),
            settle_max: Duration::from_millis(self.settle_max_ms.max(self.settle_min_ms)),
            settle_ms_per_px: self.settle_ms_per_px,
        }
    }
}

/// Where a jump lands and how long it is expected to take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPolicy {
    pub header_offset: f64,
    pub scroll_padding: f64,
    pub settle_min: Duration,
    pub settle_max: Duration,
    pub settle_ms_per_px: f64,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        NavigatorConfig::default().scroll_policy()
    }
}

/// Errors from loading a [`NavigatorConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "nav-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "nav-config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "nav-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "nav-config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "nav-config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "nav-config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
