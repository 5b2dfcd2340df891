//! Hover preview image naming.

use serde::Deserialize;

use crate::dataset::ItemId;

/// Where hover previews are looked up.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
	/// Directory holding the preview images.
	pub image_dir: String,
	/// File extension, without the dot.
	pub extension: String,
	/// Image shown when a preview is missing.
	pub placeholder: String,
}

impl Default for PreviewConfig {
	fn default() -> Self {
		Self {
			image_dir: "/jpg".into(),
			extension: "jpg".into(),
			placeholder: "/placeholder.png".into(),
		}
	}
}

impl PreviewConfig {
	/// Asset files are numbered from 1, so identifier 41 maps to `image_0042`.
	pub fn image_path(&self, id: ItemId) -> String {
		format!(
			"{}/image_{:04}.{}",
			self.image_dir.trim_end_matches('/'),
			id.saturating_add(1),
			self.extension
		)
	}
}
