//! Data model for the comparison table.
//!
//! This module defines the entities owned by the [`EntityStore`] and the
//! user preferences record persisted next to them. Everything here is plain
//! data with serde support; the JSON shapes match the durable store records:
//!
//! - specifications: `[{"id", "name"}]`
//! - products: `[{"id", "brand", "model", "imageUrl", "specs": {specId: value}}]`
//! - preferences: `{"selectedBrand", "modelQuery", "selectedSpecIds",
//!   "sortConfig": {"key", "direction"} | null, "viewMode", ...}`
//!
//! [`EntityStore`]: crate::entity_store::EntityStore

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::id_generator::new_id;

/// Brand filter value meaning "no brand filter".
pub const ALL_BRANDS: &str = "All Brands";

/// Synthetic sort key standing for `brand + " " + model`.
pub const NAME_SORT_KEY: &str = "name";

/// Glyph rendered for a missing or blank specification value.
pub const PLACEHOLDER: &str = "-";

/// Identifier of a [`Specification`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecId(String);

/// Identifier of a [`Product`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

macro_rules! identifier_impls {
    ($ty:ident) => {
        impl $ty {
            /// Generates a fresh identifier.
            pub fn generate() -> Self {
                Self(new_id())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $ty {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Display for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier_impls!(SpecId);
identifier_impls!(ProductId);

/// Sparse mapping from specification id to the recorded value.
///
/// A missing key means "never recorded"; a present empty string means
/// "known but blank". Both render as [`PLACEHOLDER`].
pub type SpecValues = BTreeMap<SpecId, String>;

/// A named attribute that products may carry a value for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub id: SpecId,
    pub name: String,
}

impl Specification {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SpecId::generate(),
            name: name.into(),
        }
    }
}

/// A catalog entry with identifying fields and sparse specification values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub brand: String,
    pub model: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    #[serde(default)]
    pub specs: SpecValues,
}

impl Product {
    /// Display name, also the value sorted on for the synthetic `name` key.
    ///
    /// This is `brand + " " + model`, except that an empty model yields the
    /// bare brand with no trailing space.
    pub fn display_name(&self) -> String {
        if self.model.is_empty() {
            self.brand.clone()
        } else {
            format!("{} {}", self.brand, self.model)
        }
    }

    /// The recorded value for `spec_id`, keeping absent and blank apart.
    pub fn cell(&self, spec_id: &SpecId) -> CellValue<'_> {
        match self.specs.get(spec_id) {
            None => CellValue::Absent,
            Some(value) if value.is_empty() => CellValue::Blank,
            Some(value) => CellValue::Text(value),
        }
    }
}

/// Editable fields of a product, used by create and update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductFields {
    pub brand: String,
    pub model: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    #[serde(default)]
    pub specs: SpecValues,
}

impl From<Product> for ProductFields {
    fn from(product: Product) -> Self {
        Self {
            brand: product.brand,
            model: product.model,
            image_url: product.image_url,
            specs: product.specs,
        }
    }
}

/// A product cell as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellValue<'a> {
    /// No value was ever recorded for this specification.
    Absent,
    /// The specification is known for this product but left empty.
    Blank,
    Text(&'a str),
}

impl<'a> CellValue<'a> {
    pub fn display(&self) -> &'a str {
        match self {
            CellValue::Absent | CellValue::Blank => PLACEHOLDER,
            CellValue::Text(value) => value,
        }
    }

    /// Value used by sorting; absent and blank are both empty.
    pub fn as_sort_value(&self) -> &'a str {
        match self {
            CellValue::Absent | CellValue::Blank => "",
            CellValue::Text(value) => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// What a product list is sorted by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortKey {
    /// `brand + " " + model`.
    Name,
    Specification(SpecId),
}

impl From<String> for SortKey {
    fn from(value: String) -> Self {
        if value == NAME_SORT_KEY {
            SortKey::Name
        } else {
            SortKey::Specification(SpecId::from(value))
        }
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Name => NAME_SORT_KEY.to_string(),
            SortKey::Specification(id) => id.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortCriterion {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortCriterion {
    pub fn ascending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    pub fn is_on_specification(&self, spec_id: &SpecId) -> bool {
        matches!(&self.key, SortKey::Specification(id) if id == spec_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewOrientation {
    #[default]
    #[serde(rename = "rows", alias = "productsAsRows")]
    ProductsAsRows,
    #[serde(rename = "columns", alias = "productsAsColumns")]
    ProductsAsColumns,
}

/// Display order of the specification list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpecOrder {
    #[default]
    Canonical,
    NameAscending,
    NameDescending,
}

impl SpecOrder {
    /// Canonical goes to ascending, then the two name orders alternate.
    pub fn toggled(self) -> Self {
        match self {
            SpecOrder::Canonical | SpecOrder::NameDescending => SpecOrder::NameAscending,
            SpecOrder::NameAscending => SpecOrder::NameDescending,
        }
    }
}

/// Filter, sort and layout choices, persisted separately from the entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub selected_brand: String,
    pub model_query: String,
    /// Exact-match model filter, only consulted when a brand is selected.
    #[serde(default)]
    pub selected_models: Vec<String>,
    #[serde(rename = "selectedSpecIds")]
    pub selected_specification_ids: Vec<SpecId>,
    #[serde(rename = "sortConfig")]
    pub sort_criterion: Option<SortCriterion>,
    #[serde(rename = "viewMode")]
    pub view_orientation: ViewOrientation,
    #[serde(default)]
    pub spec_order: SpecOrder,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            selected_brand: ALL_BRANDS.to_string(),
            model_query: String::new(),
            selected_models: Vec::new(),
            selected_specification_ids: Vec::new(),
            sort_criterion: Some(SortCriterion::ascending(SortKey::Name)),
            view_orientation: ViewOrientation::ProductsAsRows,
            spec_order: SpecOrder::Canonical,
        }
    }
}

impl Preferences {
    pub fn brand_filter(&self) -> Option<&str> {
        if self.selected_brand.is_empty() || self.selected_brand == ALL_BRANDS {
            None
        } else {
            Some(&self.selected_brand)
        }
    }

    /// Drops every filter and sort criterion that refers to `spec_id`.
    pub fn forget_specification(&mut self, spec_id: &SpecId) {
        self.selected_specification_ids.retain(|id| id != spec_id);
        if self
            .sort_criterion
            .as_ref()
            .is_some_and(|criterion| criterion.is_on_specification(spec_id))
        {
            self.sort_criterion = Some(SortCriterion::ascending(SortKey::Name));
        }
    }

    /// Resets the filters after a wholesale import. Sort and layout survive
    /// unless the sort key pointed at a specification that no longer exists.
    pub fn reset_filters(&mut self) {
        self.selected_brand = ALL_BRANDS.to_string();
        self.model_query.clear();
        self.selected_models.clear();
        self.selected_specification_ids.clear();
        if matches!(
            self.sort_criterion,
            Some(SortCriterion {
                key: SortKey::Specification(_),
                ..
            })
        ) {
            self.sort_criterion = Some(SortCriterion::ascending(SortKey::Name));
        }
    }
}

/// The two reorderable entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Specifications,
    Products,
}
