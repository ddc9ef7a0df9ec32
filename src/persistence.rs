//! Persistence adapter: loads and saves the three independent records.
//!
//! Loading never fails. A record that is absent, or whose bytes do not
//! parse, falls back to its compiled-in default and the fallback is logged
//! and reported in [`LoadedState::fallbacks`]. Preferences are repaired per
//! field, so one corrupt field does not reset the others.
//!
//! Products written by the first schema (`{id, name, imageUrl, specs}`) are
//! migrated in memory; the stored bytes stay untouched until the next save.

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::comparison_model::{Preferences, Product, ProductId, SpecValues, Specification};
use crate::config::RecordKeys;
use crate::durable_store::DurableStore;
use crate::error::Result;
use crate::seed::Catalog;

/// One record to write.
#[derive(Debug, Clone, Copy)]
pub enum Record<'a> {
    Specifications(&'a [Specification]),
    Products(&'a [Product]),
    Preferences(&'a Preferences),
}

/// Result of [`PersistenceAdapter::load`].
#[derive(Debug, Clone)]
pub struct LoadedState {
    pub specifications: Vec<Specification>,
    pub products: Vec<Product>,
    pub preferences: Preferences,
    /// Human readable notes about records that fell back to defaults.
    pub fallbacks: Vec<String>,
    /// Number of products converted from the legacy `name` shape.
    pub migrated_products: usize,
}

/// Product written before brand and model were split.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    #[serde(default)]
    pub specs: SpecValues,
}

/// A stored product in whichever schema it was written with.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredProduct {
    Current(Product),
    Legacy(LegacyProduct),
}

impl StoredProduct {
    pub fn is_legacy(&self) -> bool {
        matches!(self, StoredProduct::Legacy(_))
    }

    pub fn into_current(self) -> Product {
        match self {
            StoredProduct::Current(product) => product,
            StoredProduct::Legacy(legacy) => migrate_legacy_product(legacy),
        }
    }
}

/// Splits a legacy display name on its first space: the first token is the
/// brand and the remainder the model.
pub fn split_legacy_name(name: &str) -> (String, String) {
    match name.split_once(' ') {
        Some((brand, model)) => (brand.to_string(), model.to_string()),
        None => (name.to_string(), String::new()),
    }
}

pub fn migrate_legacy_product(legacy: LegacyProduct) -> Product {
    let (brand, model) = split_legacy_name(&legacy.name);
    Product {
        id: legacy.id,
        brand,
        model,
        image_url: legacy.image_url,
        specs: legacy.specs,
    }
}

pub struct PersistenceAdapter {
    store: Box<dyn DurableStore>,
    keys: RecordKeys,
}

impl PersistenceAdapter {
    pub fn new(store: Box<dyn DurableStore>, keys: RecordKeys) -> Self {
        Self { store, keys }
    }

    pub fn load(&self, defaults: Catalog) -> LoadedState {
        let mut fallbacks = Vec::new();

        let specifications = match self.read_record::<Vec<Specification>>(&self.keys.specifications) {
            Ok(Some(specs)) => specs,
            Ok(None) => defaults.specifications,
            Err(reason) => {
                fallbacks.push(self.fallback_note(&self.keys.specifications, &reason));
                defaults.specifications
            }
        };

        let mut migrated_products = 0;
        let products = match self.read_record::<Vec<StoredProduct>>(&self.keys.products) {
            Ok(Some(stored)) => stored
                .into_iter()
                .map(|product| {
                    if product.is_legacy() {
                        migrated_products += 1;
                    }
                    product.into_current()
                })
                .collect(),
            Ok(None) => defaults.products,
            Err(reason) => {
                fallbacks.push(self.fallback_note(&self.keys.products, &reason));
                defaults.products
            }
        };
        if migrated_products > 0 {
            info!("Migrated {migrated_products} products from the legacy name schema");
        }

        let preferences = match self.read_raw(&self.keys.preferences) {
            Ok(Some(raw)) => match parse_preferences(&raw) {
                Ok((preferences, corrupt)) => {
                    for field in corrupt {
                        let reason = format!("field '{field}' is invalid");
                        fallbacks.push(self.fallback_note(&self.keys.preferences, &reason));
                    }
                    preferences
                }
                Err(reason) => {
                    fallbacks.push(self.fallback_note(&self.keys.preferences, &reason));
                    Preferences::default()
                }
            },
            Ok(None) => Preferences::default(),
            Err(reason) => {
                fallbacks.push(self.fallback_note(&self.keys.preferences, &reason));
                Preferences::default()
            }
        };

        LoadedState {
            specifications,
            products,
            preferences,
            fallbacks,
            migrated_products,
        }
    }

    /// Writes all given records at one commit point.
    pub fn save(&self, records: &[Record<'_>]) -> Result<()> {
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let entry = match record {
                Record::Specifications(specs) => {
                    (self.keys.specifications.as_str(), serde_json::to_string(specs)?)
                }
                Record::Products(products) => {
                    (self.keys.products.as_str(), serde_json::to_string(products)?)
                }
                Record::Preferences(preferences) => {
                    (self.keys.preferences.as_str(), serde_json::to_string(preferences)?)
                }
            };
            entries.push(entry);
        }
        self.store.write_batch(&entries)
    }

    fn read_raw(&self, key: &str) -> std::result::Result<Option<String>, String> {
        self.store.read(key).map_err(|e| e.to_string())
    }

    fn read_record<T: DeserializeOwned>(&self, key: &str) -> std::result::Result<Option<T>, String> {
        match self.read_raw(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| format!("unreadable JSON: {e}")),
            None => Ok(None),
        }
    }

    fn fallback_note(&self, key: &str, reason: &str) -> String {
        let note = format!("Record '{key}' fell back to its default ({reason})");
        warn!("{note}");
        note
    }
}

/// Parses a preferences record field by field. Alongside the preferences it
/// returns the names of the fields that were present but invalid.
pub fn parse_preferences(
    raw: &str,
) -> std::result::Result<(Preferences, Vec<&'static str>), String> {
    let mut corrupt = Vec::new();
    let map = match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Object(map)) => map,
        Ok(_) => return Err("expected a JSON object".to_string()),
        Err(e) => return Err(format!("unreadable JSON: {e}")),
    };
    let defaults = Preferences::default();

    let preferences = Preferences {
        selected_brand: field(&map, "selectedBrand", defaults.selected_brand, &mut corrupt),
        model_query: field(&map, "modelQuery", defaults.model_query, &mut corrupt),
        selected_models: field(&map, "selectedModels", defaults.selected_models, &mut corrupt),
        selected_specification_ids: field(
            &map,
            "selectedSpecIds",
            defaults.selected_specification_ids,
            &mut corrupt,
        ),
        sort_criterion: field(&map, "sortConfig", defaults.sort_criterion, &mut corrupt),
        view_orientation: field(&map, "viewMode", defaults.view_orientation, &mut corrupt),
        spec_order: field(&map, "specOrder", defaults.spec_order, &mut corrupt),
    };
    Ok((preferences, corrupt))
}

fn field<T: DeserializeOwned>(
    map: &Map<String, JsonValue>,
    key: &'static str,
    default: T,
    corrupt: &mut Vec<&'static str>,
) -> T {
    match map.get(key) {
        None => default,
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(parsed) => parsed,
            Err(_) => {
                corrupt.push(key);
                default
            }
        },
    }
}
