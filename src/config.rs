//! Session configuration.
//!
//! Hosts pass the configuration as JSON to `create_session`; every field is
//! optional and an empty object (or a null pointer) yields the defaults.
//!
//! ```rust
//! use comparison_core::config::SessionConfig;
//!
//! let config: SessionConfig = serde_json::from_str(r#"{"path": "catalog"}"#)?;
//! assert_eq!(config.path, "catalog");
//! assert!(config.seed_catalog);
//! # Ok::<(), serde_json::Error>(())
//! ```

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAP_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "https://picsum.photos/seed/imported-{seed}/400/300";

/// Keys of the three records in the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordKeys {
    pub specifications: String,
    pub products: String,
    pub preferences: String,
}

impl Default for RecordKeys {
    fn default() -> Self {
        Self {
            specifications: "comparison.specifications".to_string(),
            products: "comparison.products".to_string(),
            preferences: "comparison.preferences".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Store location; the LMDB environment lives in `<path>.lmdb`.
    pub path: String,
    pub map_size: usize,
    pub keys: RecordKeys,
    /// Image URL template for imported products without one. `{seed}` is
    /// replaced by the new product id.
    pub placeholder_image: String,
    /// Fall back to the built-in projector catalog when the store is empty.
    pub seed_catalog: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: "product_comparison".to_string(),
            map_size: DEFAULT_MAP_SIZE,
            keys: RecordKeys::default(),
            placeholder_image: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
            seed_catalog: true,
        }
    }
}

impl SessionConfig {
    pub fn placeholder_image_for(&self, seed: &str) -> String {
        self.placeholder_image.replace("{seed}", seed)
    }
}
