//! Application configuration.
//!
//! Built once at startup from an optional JSON block embedded in the page
//! (`<script id="knn-config" type="application/json">`), with every field
//! defaulted, and handed down through context.

use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::components::knn_graph::layout::LayoutParams;
use crate::components::knn_graph::preview::PreviewConfig;
use crate::components::knn_graph::scene::FrameConfig;

/// Id of the `<script>` element holding the JSON configuration.
pub const CONFIG_ELEMENT_ID: &str = "knn-config";

/// Why an embedded configuration was rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Not valid JSON, or a field has the wrong type.
	#[error("invalid configuration JSON: {0}")]
	Json(#[from] serde_json::Error),

	/// Zoom that is zero, negative or not finite.
	#[error("default_zoom must be a positive number, got {0}")]
	InvalidZoom(f64),

	/// `default_k` of zero.
	#[error("default_k must be at least 1")]
	InvalidK,
}

/// Startup settings for the visualizer; every field is optional in JSON.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
	/// Initial neighbor count.
	pub default_k: usize,
	/// Initial zoom factor.
	pub default_zoom: f64,
	/// Force simulation constants.
	pub layout: LayoutParams,
	/// Hover preview lookup.
	pub preview: PreviewConfig,
	/// Canvas margins and height rules.
	pub frame: FrameConfig,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			default_k: 5,
			default_zoom: 1.0,
			layout: LayoutParams::default(),
			preview: PreviewConfig::default(),
			frame: FrameConfig::default(),
		}
	}
}

impl AppConfig {
	/// Parse and validate a JSON configuration.
	pub fn from_json(text: &str) -> Result<Self, ConfigError> {
		let config: AppConfig = serde_json::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if !(self.default_zoom.is_finite() && self.default_zoom > 0.0) {
			return Err(ConfigError::InvalidZoom(self.default_zoom));
		}
		if self.default_k == 0 {
			return Err(ConfigError::InvalidK);
		}
		Ok(())
	}

	/// Read the embedded config block, falling back to defaults.
	pub fn load() -> Self {
		let text = web_sys::window()
			.and_then(|w| w.document())
			.and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
			.and_then(|el| el.text_content());
		let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
			info!("No embedded configuration; using defaults");
			return Self::default();
		};
		match Self::from_json(&text) {
			Ok(config) => {
				info!("Loaded embedded configuration");
				config
			}
			Err(e) => {
				warn!("Ignoring embedded configuration: {}", e);
				Self::default()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_object_is_all_defaults() {
		assert_eq!(AppConfig::from_json("{}").unwrap(), AppConfig::default());
	}

	#[test]
	fn partial_overrides_keep_other_defaults() {
		let config = AppConfig::from_json(
			r#"{
				"default_k": 8,
				"layout": { "charge_strength": -500.0 },
				"preview": { "image_dir": "/thumbs" },
				"frame": { "margin": { "left": 10.0 } }
			}"#,
		)
		.unwrap();
		assert_eq!(config.default_k, 8);
		assert_eq!(config.layout.charge_strength, -500.0);
		assert_eq!(config.layout.iterations, 200);
		assert_eq!(config.preview.image_path(41), "/thumbs/image_0042.jpg");
		assert_eq!(config.frame.margin.left, 10.0);
		assert_eq!(config.frame.margin.top, 20.0);
	}

	#[test]
	fn rejects_bad_values() {
		assert!(matches!(
			AppConfig::from_json(r#"{"default_zoom": 0}"#),
			Err(ConfigError::InvalidZoom(_))
		));
		assert!(matches!(
			AppConfig::from_json(r#"{"default_k": 0}"#),
			Err(ConfigError::InvalidK)
		));
		assert!(matches!(AppConfig::from_json("{"), Err(ConfigError::Json(_))));
	}
}
