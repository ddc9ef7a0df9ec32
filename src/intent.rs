//! User intents dispatched by the presentation layer.
//!
//! The UI never mutates entities directly: it serializes an [`Intent`] and
//! hands it to [`ComparisonSession::apply`]. Transient gesture state (hovered
//! rows, the item being dragged, open dialogs) stays in the UI; only a
//! completed drop becomes a `dropSpecification`/`dropProduct` intent.
//!
//! ```rust
//! use comparison_core::intent::Intent;
//!
//! let intent: Intent = serde_json::from_str(r#"{"type": "createSpecification", "name": "Weight"}"#)?;
//! assert_eq!(intent, Intent::CreateSpecification { name: "Weight".to_string() });
//! # Ok::<(), serde_json::Error>(())
//! ```
//!
//! [`ComparisonSession::apply`]: crate::session::ComparisonSession::apply

use serde::{Deserialize, Serialize};

use crate::comparison_model::{EntityKind, Product, ProductId, SortKey, SpecId, SpecValues, ViewOrientation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Intent {
    CreateSpecification {
        name: String,
    },
    RenameSpecification {
        id: SpecId,
        name: String,
    },
    DeleteSpecification {
        id: SpecId,
    },
    CreateProduct {
        brand: String,
        #[serde(default)]
        model: String,
        #[serde(default)]
        image_url: String,
        #[serde(default)]
        specs: SpecValues,
    },
    /// Full replacement of an existing product record.
    UpdateProduct {
        product: Product,
    },
    DeleteProduct {
        id: ProductId,
    },
    ToggleSelected {
        id: ProductId,
    },
    ClearSelection,
    ToggleReorderMode {
        kind: EntityKind,
    },
    /// `id` was dropped onto `before`.
    DropSpecification {
        id: SpecId,
        before: SpecId,
    },
    DropProduct {
        id: ProductId,
        before: ProductId,
    },
    SelectBrand {
        brand: String,
    },
    SetModelQuery {
        query: String,
    },
    ToggleModel {
        model: String,
    },
    ToggleSpecificationFilter {
        id: SpecId,
    },
    ClearSpecificationFilter,
    RequestSort {
        key: SortKey,
    },
    ToggleSpecificationOrder,
    SetViewOrientation {
        orientation: ViewOrientation,
    },
    SaveSettings,
    Chart {
        spec_id: SpecId,
    },
    Compare,
    View,
}
