//! Product selection for focused comparison, and the reorder mode switches.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::comparison_model::{EntityKind, ProductId};

/// Fewest selected products for which the comparison view is available.
pub const MIN_COMPARISON_SIZE: usize = 2;

/// Product ids marked for side-by-side comparison. Independent of the
/// canonical product order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet {
    ids: BTreeSet<ProductId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership; returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, id: &ProductId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    pub fn remove(&mut self, id: &ProductId) -> bool {
        self.ids.remove(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn can_compare(&self) -> bool {
        self.ids.len() >= MIN_COMPARISON_SIZE
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductId> {
        self.ids.iter()
    }
}

/// Which gestures are live for one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReorderMode {
    /// Click-to-sort is active; drops are ignored.
    #[default]
    Browsing,
    /// Drag handles are shown; sorting requests are ignored.
    Reordering,
}

impl ReorderMode {
    pub fn toggled(self) -> Self {
        match self {
            ReorderMode::Browsing => ReorderMode::Reordering,
            ReorderMode::Reordering => ReorderMode::Browsing,
        }
    }
}

/// Reorder mode per entity kind. Transitions happen only on explicit toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderModes {
    pub specifications: ReorderMode,
    pub products: ReorderMode,
}

impl ReorderModes {
    pub fn get(&self, kind: EntityKind) -> ReorderMode {
        match kind {
            EntityKind::Specifications => self.specifications,
            EntityKind::Products => self.products,
        }
    }

    pub fn toggle(&mut self, kind: EntityKind) -> ReorderMode {
        let mode = match kind {
            EntityKind::Specifications => &mut self.specifications,
            EntityKind::Products => &mut self.products,
        };
        *mode = mode.toggled();
        *mode
    }

    pub fn is_reordering(&self, kind: EntityKind) -> bool {
        self.get(kind) == ReorderMode::Reordering
    }

    /// Header click-to-sort is suppressed while anything is being reordered.
    pub fn sorting_enabled(&self) -> bool {
        !self.is_reordering(EntityKind::Specifications) && !self.is_reordering(EntityKind::Products)
    }
}
