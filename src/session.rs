//! The comparison session: one open table and everything that drives it.
//!
//! A session owns the [`EntityStore`], the in-memory [`Preferences`], the
//! selection set and the reorder modes. Every entity mutation is followed by
//! a save of the affected record(s); preferences are saved only by
//! [`ComparisonSession::save_settings`].
//!
//! Persistence is best effort. A failed save never rolls back the in-memory
//! state: it is logged and queued as a notice for the user, retrievable with
//! [`ComparisonSession::drain_notices`].

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::comparison_model::{
    EntityKind, Preferences, Product, ProductFields, ProductId, SortCriterion, SortKey, SpecId,
    Specification, ViewOrientation, ALL_BRANDS,
};
use crate::config::SessionConfig;
use crate::durable_store::{DurableStore, LmdbStore};
use crate::entity_store::EntityStore;
use crate::error::Result;
use crate::intent::Intent;
use crate::persistence::{PersistenceAdapter, Record};
use crate::reconciler::{self, DataFormat};
use crate::seed::{seed_catalog, Catalog};
use crate::selection::{ReorderMode, ReorderModes, SelectionSet};
use crate::view_pipeline::{self, ChartPoint, ComparisonView, TableView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Specifications,
    Products,
    Preferences,
}

/// Counts reported after a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub specifications: usize,
    pub products: usize,
}

pub struct ComparisonSession {
    config: SessionConfig,
    store: EntityStore,
    preferences: Preferences,
    selection: SelectionSet,
    modes: ReorderModes,
    persistence: PersistenceAdapter,
    notices: Vec<String>,
}

impl ComparisonSession {
    /// Opens the LMDB store named by `config.path` and loads the session.
    pub fn open(config: SessionConfig) -> Result<Self> {
        let store = LmdbStore::open(&config.path, config.map_size)?;
        Ok(Self::with_store(Box::new(store), config))
    }

    /// Loads a session from any durable store.
    pub fn with_store(store: Box<dyn DurableStore>, config: SessionConfig) -> Self {
        let persistence = PersistenceAdapter::new(store, config.keys.clone());
        let defaults = if config.seed_catalog {
            seed_catalog()
        } else {
            Catalog::default()
        };
        let loaded = persistence.load(defaults);

        let mut session = Self {
            store: EntityStore::from_parts(loaded.specifications, loaded.products),
            preferences: loaded.preferences,
            selection: SelectionSet::new(),
            modes: ReorderModes::default(),
            persistence,
            notices: loaded.fallbacks,
            config,
        };
        session.forget_unknown_specifications();
        info!(
            "Comparison session loaded: {} specifications, {} products",
            session.store.specifications().len(),
            session.store.products().len()
        );
        session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn modes(&self) -> &ReorderModes {
        &self.modes
    }

    /// Takes the pending user-facing notices (persistence failures, records
    /// that fell back to defaults on load).
    pub fn drain_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    // Entity operations

    pub fn create_specification(&mut self, name: &str) -> Result<Specification> {
        let spec = self.store.create_specification(name)?;
        self.persist(&[RecordKind::Specifications, RecordKind::Products]);
        Ok(spec)
    }

    pub fn rename_specification(&mut self, id: &SpecId, new_name: &str) -> Result<bool> {
        let renamed = self.store.rename_specification(id, new_name)?;
        if renamed {
            self.persist(&[RecordKind::Specifications]);
        }
        Ok(renamed)
    }

    /// Cascades into every product and into the filter and sort preferences.
    pub fn delete_specification(&mut self, id: &SpecId) -> bool {
        if !self.store.delete_specification(id) {
            return false;
        }
        self.preferences.forget_specification(id);
        self.persist(&[RecordKind::Specifications, RecordKind::Products]);
        true
    }

    pub fn reorder_specifications(&mut self, id: &SpecId, target_id: &SpecId) -> bool {
        let moved = self.store.reorder_specifications(id, target_id);
        if moved {
            self.persist(&[RecordKind::Specifications]);
        }
        moved
    }

    pub fn create_product(&mut self, fields: ProductFields) -> Result<Product> {
        let product = self.store.create_product(fields)?;
        self.persist(&[RecordKind::Products]);
        Ok(product)
    }

    /// Fails with `NotFound` when `id` was deleted in the meantime.
    pub fn update_product(&mut self, id: &ProductId, fields: ProductFields) -> Result<Product> {
        let product = self.store.update_product(id, fields)?;
        self.persist(&[RecordKind::Products]);
        Ok(product)
    }

    pub fn delete_product(&mut self, id: &ProductId) -> bool {
        if !self.store.delete_product(id) {
            return false;
        }
        self.selection.remove(id);
        self.persist(&[RecordKind::Products]);
        true
    }

    pub fn reorder_products(&mut self, id: &ProductId, target_id: &ProductId) -> bool {
        let moved = self.store.reorder_products(id, target_id);
        if moved {
            self.persist(&[RecordKind::Products]);
        }
        moved
    }

    /// Swaps in new collections, clearing the selection and every filter.
    /// Both records are written in one batch.
    pub fn replace_all(&mut self, specifications: Vec<Specification>, products: Vec<Product>) {
        self.store.replace_all(specifications, products);
        self.selection.clear();
        self.preferences.reset_filters();
        self.persist(&[RecordKind::Specifications, RecordKind::Products]);
    }

    /// Parses, validates and reconciles `text`, then replaces the store.
    /// Any validation error leaves the session untouched.
    pub fn import(&mut self, format: DataFormat, text: &str) -> Result<ImportSummary> {
        let records = reconciler::parse_records(format, text)?;
        let config = &self.config;
        let catalog =
            reconciler::reconcile(records, |id| config.placeholder_image_for(id.as_str()));
        let summary = ImportSummary {
            specifications: catalog.specifications.len(),
            products: catalog.products.len(),
        };
        self.replace_all(catalog.specifications, catalog.products);
        info!(
            "Imported {} products with {} specifications",
            summary.products, summary.specifications
        );
        Ok(summary)
    }

    pub fn export(&self, format: DataFormat) -> Result<String> {
        match format {
            DataFormat::Json => reconciler::export_json(&self.store),
            DataFormat::Csv => Ok(reconciler::export_csv(&self.store)),
        }
    }

    // Selection and reordering

    /// Flips selection of an existing product; unknown ids are ignored.
    pub fn toggle_selected(&mut self, id: &ProductId) -> bool {
        if !self.store.contains_product(id) {
            debug!("Selection ignored, unknown product {id}");
            return false;
        }
        self.selection.toggle(id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn toggle_reorder_mode(&mut self, kind: EntityKind) -> ReorderMode {
        self.modes.toggle(kind)
    }

    /// Completed drag of a specification; ignored outside reorder mode.
    pub fn drop_specification(&mut self, id: &SpecId, before: &SpecId) -> bool {
        if !self.modes.is_reordering(EntityKind::Specifications) {
            debug!("Specification drop ignored outside reorder mode");
            return false;
        }
        self.reorder_specifications(id, before)
    }

    pub fn drop_product(&mut self, id: &ProductId, before: &ProductId) -> bool {
        if !self.modes.is_reordering(EntityKind::Products) {
            debug!("Product drop ignored outside reorder mode");
            return false;
        }
        self.reorder_products(id, before)
    }

    // Preferences (in memory until save_settings)

    pub fn select_brand(&mut self, brand: &str) {
        self.preferences.selected_brand = if brand.trim().is_empty() {
            ALL_BRANDS.to_string()
        } else {
            brand.to_string()
        };
        self.preferences.selected_models.clear();
    }

    pub fn set_model_query(&mut self, query: &str) {
        self.preferences.model_query = query.to_string();
    }

    /// Adds or removes a model from the multi-select of the selected brand.
    pub fn toggle_model(&mut self, model: &str) {
        let models = &mut self.preferences.selected_models;
        match models.iter().position(|m| m == model) {
            Some(index) => {
                models.remove(index);
            }
            None => models.push(model.to_string()),
        }
    }

    pub fn toggle_specification_filter(&mut self, id: &SpecId) -> bool {
        if self.store.specification(id).is_none() {
            debug!("Filter ignored, unknown specification {id}");
            return false;
        }
        let selected = &mut self.preferences.selected_specification_ids;
        match selected.iter().position(|s| s == id) {
            Some(index) => {
                selected.remove(index);
                false
            }
            None => {
                selected.push(id.clone());
                true
            }
        }
    }

    pub fn clear_specification_filter(&mut self) {
        self.preferences.selected_specification_ids.clear();
    }

    /// Header click on `key`. Returns `false` while reordering, when
    /// click-to-sort is suppressed, or when the key names no specification.
    pub fn request_sort(&mut self, key: SortKey) -> bool {
        if !self.modes.sorting_enabled() {
            debug!("Sort request ignored while reordering");
            return false;
        }
        if let SortKey::Specification(id) = &key {
            if self.store.specification(id).is_none() {
                debug!("Sort request ignored, unknown specification {id}");
                return false;
            }
        }
        self.preferences.sort_criterion = Some(view_pipeline::next_sort(
            self.preferences.sort_criterion.as_ref(),
            key,
        ));
        true
    }

    pub fn toggle_specification_order(&mut self) {
        self.preferences.spec_order = self.preferences.spec_order.toggled();
    }

    pub fn set_view_orientation(&mut self, orientation: ViewOrientation) {
        self.preferences.view_orientation = orientation;
    }

    pub fn save_settings(&mut self) {
        self.persist(&[RecordKind::Preferences]);
        info!("Settings saved");
    }

    // Derived views

    pub fn view(&self) -> TableView {
        view_pipeline::table_view(&self.store, &self.preferences, &self.selection, &self.modes)
    }

    pub fn comparison(&self) -> Option<ComparisonView> {
        view_pipeline::comparison_view(&self.store, &self.preferences, &self.selection)
    }

    /// Chart series for `spec_id` over the currently visible products.
    pub fn chart(&self, spec_id: &SpecId) -> Vec<ChartPoint> {
        let view = view_pipeline::derive_view(&self.store, &self.preferences, &self.modes);
        view_pipeline::chart_series(view.products, spec_id)
    }

    /// Applies one intent and returns its JSON result.
    pub fn apply(&mut self, intent: Intent) -> Result<JsonValue> {
        let result = match intent {
            Intent::CreateSpecification { name } => {
                serde_json::to_value(self.create_specification(&name)?)?
            }
            Intent::RenameSpecification { id, name } => {
                json!({ "renamed": self.rename_specification(&id, &name)? })
            }
            Intent::DeleteSpecification { id } => {
                json!({ "removed": self.delete_specification(&id) })
            }
            Intent::CreateProduct {
                brand,
                model,
                image_url,
                specs,
            } => serde_json::to_value(self.create_product(ProductFields {
                brand,
                model,
                image_url,
                specs,
            })?)?,
            Intent::UpdateProduct { product } => {
                let id = product.id.clone();
                serde_json::to_value(self.update_product(&id, product.into())?)?
            }
            Intent::DeleteProduct { id } => json!({ "removed": self.delete_product(&id) }),
            Intent::ToggleSelected { id } => json!({ "selected": self.toggle_selected(&id) }),
            Intent::ClearSelection => {
                self.clear_selection();
                JsonValue::Null
            }
            Intent::ToggleReorderMode { kind } => {
                serde_json::to_value(self.toggle_reorder_mode(kind))?
            }
            Intent::DropSpecification { id, before } => {
                json!({ "moved": self.drop_specification(&id, &before) })
            }
            Intent::DropProduct { id, before } => {
                json!({ "moved": self.drop_product(&id, &before) })
            }
            Intent::SelectBrand { brand } => {
                self.select_brand(&brand);
                JsonValue::Null
            }
            Intent::SetModelQuery { query } => {
                self.set_model_query(&query);
                JsonValue::Null
            }
            Intent::ToggleModel { model } => {
                self.toggle_model(&model);
                JsonValue::Null
            }
            Intent::ToggleSpecificationFilter { id } => {
                json!({ "selected": self.toggle_specification_filter(&id) })
            }
            Intent::ClearSpecificationFilter => {
                self.clear_specification_filter();
                JsonValue::Null
            }
            Intent::RequestSort { key } => json!({ "sorted": self.request_sort(key) }),
            Intent::ToggleSpecificationOrder => {
                self.toggle_specification_order();
                serde_json::to_value(self.preferences.spec_order)?
            }
            Intent::SetViewOrientation { orientation } => {
                self.set_view_orientation(orientation);
                JsonValue::Null
            }
            Intent::SaveSettings => {
                self.save_settings();
                JsonValue::Null
            }
            Intent::Chart { spec_id } => serde_json::to_value(self.chart(&spec_id))?,
            Intent::Compare => serde_json::to_value(self.comparison())?,
            Intent::View => serde_json::to_value(self.view())?,
        };
        Ok(result)
    }

    fn persist(&mut self, kinds: &[RecordKind]) {
        let records: Vec<Record<'_>> = kinds
            .iter()
            .map(|kind| match kind {
                RecordKind::Specifications => Record::Specifications(self.store.specifications()),
                RecordKind::Products => Record::Products(self.store.products()),
                RecordKind::Preferences => Record::Preferences(&self.preferences),
            })
            .collect();
        let result = self.persistence.save(&records);
        if let Err(e) = result {
            warn!("Failed to persist {kinds:?}: {e}");
            self.notices
                .push(format!("Changes could not be saved and will be lost on restart: {e}"));
        }
    }

    /// Drops filter and sort references to specifications that were not
    /// loaded (preferences and entities are stored independently).
    fn forget_unknown_specifications(&mut self) {
        let known: HashSet<&SpecId> = self.store.specifications().iter().map(|s| &s.id).collect();
        let mut unknown: Vec<SpecId> = self
            .preferences
            .selected_specification_ids
            .iter()
            .filter(|id| !known.contains(id))
            .cloned()
            .collect();
        if let Some(SortCriterion {
            key: SortKey::Specification(id),
            ..
        }) = &self.preferences.sort_criterion
        {
            if !known.contains(id) {
                unknown.push(id.clone());
            }
        }
        for id in &unknown {
            self.preferences.forget_specification(id);
        }
    }
}
