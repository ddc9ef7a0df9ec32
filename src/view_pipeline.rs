//! Read-only derivation of the visible table.
//!
//! Everything here is a pure function of the store, the preferences, the
//! selection and the reorder modes. Nothing is cached: callers recompute the
//! view whenever an input changes and may drop it at any time.
//!
//! Pipeline: specification visibility, then product filter, then product
//! sort. Neither step touches the canonical order held by the store.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::comparison_model::{
    EntityKind, Preferences, Product, ProductId, SortCriterion, SortDirection, SortKey, SpecId,
    SpecOrder, Specification, ViewOrientation, ALL_BRANDS,
};
use crate::entity_store::EntityStore;
use crate::selection::{ReorderModes, SelectionSet};

/// Borrowed result of the pipeline.
#[derive(Debug, Clone)]
pub struct DerivedView<'a> {
    pub specifications: Vec<&'a Specification>,
    pub products: Vec<&'a Product>,
}

/// Owned, serializable snapshot of everything the table renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub specifications: Vec<Specification>,
    pub products: Vec<Product>,
    pub selected: Vec<ProductId>,
    pub can_compare: bool,
    pub brands: Vec<String>,
    /// Models of the selected brand, empty when no brand is selected.
    pub models: Vec<String>,
    pub sort: Option<SortCriterion>,
    pub view_orientation: ViewOrientation,
    pub reorder_modes: ReorderModes,
}

/// The selected products next to the visible specifications.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonView {
    pub specifications: Vec<Specification>,
    pub products: Vec<Product>,
}

/// One bar of a chart: product label and parsed numeric value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

pub fn derive_view<'a>(
    store: &'a EntityStore,
    preferences: &Preferences,
    modes: &ReorderModes,
) -> DerivedView<'a> {
    let specifications = if modes.is_reordering(EntityKind::Specifications) {
        selected_specifications(store.specifications(), &preferences.selected_specification_ids)
    } else {
        visible_specifications(store.specifications(), preferences)
    };

    let mut products = filter_products(store.products(), preferences);
    // Dragging operates on the canonical order, so it is shown unsorted.
    if !modes.is_reordering(EntityKind::Products) {
        if let Some(criterion) = &preferences.sort_criterion {
            sort_products(&mut products, criterion);
        }
    }

    DerivedView {
        specifications,
        products,
    }
}

pub fn table_view(
    store: &EntityStore,
    preferences: &Preferences,
    selection: &SelectionSet,
    modes: &ReorderModes,
) -> TableView {
    let view = derive_view(store, preferences, modes);
    TableView {
        specifications: view.specifications.into_iter().cloned().collect(),
        products: view.products.into_iter().cloned().collect(),
        selected: selection.iter().cloned().collect(),
        can_compare: selection.can_compare(),
        brands: brands(store.products()),
        models: preferences
            .brand_filter()
            .map(|brand| models_for_brand(store.products(), brand))
            .unwrap_or_default(),
        sort: preferences.sort_criterion.clone(),
        view_orientation: preferences.view_orientation,
        reorder_modes: *modes,
    }
}

/// Selected products in canonical order; `None` below the comparison size.
pub fn comparison_view(
    store: &EntityStore,
    preferences: &Preferences,
    selection: &SelectionSet,
) -> Option<ComparisonView> {
    if !selection.can_compare() {
        return None;
    }
    Some(ComparisonView {
        specifications: visible_specifications(store.specifications(), preferences)
            .into_iter()
            .cloned()
            .collect(),
        products: store
            .products()
            .iter()
            .filter(|p| selection.contains(&p.id))
            .cloned()
            .collect(),
    })
}

/// Specifications restricted to the selected ids (canonical order), then
/// arranged by the preferred display order.
pub fn visible_specifications<'a>(
    specifications: &'a [Specification],
    preferences: &Preferences,
) -> Vec<&'a Specification> {
    let mut visible =
        selected_specifications(specifications, &preferences.selected_specification_ids);
    match preferences.spec_order {
        SpecOrder::Canonical => {}
        SpecOrder::NameAscending => sort_by_name(&mut visible, SortDirection::Ascending),
        SpecOrder::NameDescending => sort_by_name(&mut visible, SortDirection::Descending),
    }
    visible
}

fn selected_specifications<'a>(
    specifications: &'a [Specification],
    selected: &[SpecId],
) -> Vec<&'a Specification> {
    if selected.is_empty() {
        return specifications.iter().collect();
    }
    let selected: BTreeSet<&SpecId> = selected.iter().collect();
    specifications
        .iter()
        .filter(|spec| selected.contains(&spec.id))
        .collect()
}

/// Case-insensitive name order, derived on demand.
pub fn alphabetical_specifications(
    specifications: &[Specification],
    direction: SortDirection,
) -> Vec<&Specification> {
    let mut sorted: Vec<&Specification> = specifications.iter().collect();
    sort_by_name(&mut sorted, direction);
    sorted
}

fn sort_by_name(specifications: &mut [&Specification], direction: SortDirection) {
    specifications.sort_by(|a, b| {
        let ordering = a.name.to_lowercase().cmp(&b.name.to_lowercase());
        apply_direction(ordering, direction)
    });
}

/// Brand filter first; with a brand, the model multi-select narrows further
/// by exact match. Without a brand, the free-text query matches models
/// case-insensitively.
pub fn filter_products<'a>(products: &'a [Product], preferences: &Preferences) -> Vec<&'a Product> {
    match preferences.brand_filter() {
        Some(brand) => products
            .iter()
            .filter(|p| p.brand == brand)
            .filter(|p| {
                preferences.selected_models.is_empty()
                    || preferences.selected_models.iter().any(|m| *m == p.model)
            })
            .collect(),
        None => {
            let query = preferences.model_query.trim().to_lowercase();
            products
                .iter()
                .filter(|p| query.is_empty() || p.model.to_lowercase().contains(&query))
                .collect()
        }
    }
}

pub fn sort_products(products: &mut [&Product], criterion: &SortCriterion) {
    products.sort_by(|a, b| {
        compare_values(
            &sort_value(a, &criterion.key),
            &sort_value(b, &criterion.key),
            criterion.direction,
        )
    });
}

fn sort_value<'a>(product: &'a Product, key: &SortKey) -> Cow<'a, str> {
    match key {
        SortKey::Name => Cow::Owned(product.display_name()),
        SortKey::Specification(id) => Cow::Borrowed(product.cell(id).as_sort_value()),
    }
}

/// Orders two cell values.
///
/// Empty values go last whatever the direction. When both values parse as
/// numbers (after dropping `$` and `,`) they compare numerically; when
/// neither does, as lowercase strings. In a column mixing the two, numeric
/// values come before the others, which keeps the order total.
pub fn compare_values(a: &str, b: &str, direction: SortDirection) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    let ordering = match (parse_numeric(a), parse_numeric(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.to_lowercase().cmp(&b.to_lowercase()),
    };
    apply_direction(ordering, direction)
}

fn apply_direction(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

/// Leading number of `value` once `$` and `,` are removed, e.g.
/// `"3,200 ANSI Lumens"` is 3200 and `"May 2024"` is not a number.
pub fn parse_numeric(value: &str) -> Option<f64> {
    let cleaned: String = value.chars().filter(|c| *c != '$' && *c != ',').collect();
    leading_number(cleaned.trim_start())
}

fn leading_number(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 {
            digits += frac_end - end - 1;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Computes the next sort criterion after a header click on `key`.
pub fn next_sort(current: Option<&SortCriterion>, key: SortKey) -> SortCriterion {
    match current {
        Some(criterion) if criterion.key == key => SortCriterion {
            key,
            direction: criterion.direction.flipped(),
        },
        _ => SortCriterion::ascending(key),
    }
}

/// `"All Brands"` followed by the distinct brands in sorted order.
pub fn brands(products: &[Product]) -> Vec<String> {
    let distinct: BTreeSet<&str> = products.iter().map(|p| p.brand.as_str()).collect();
    std::iter::once(ALL_BRANDS.to_string())
        .chain(distinct.into_iter().map(str::to_string))
        .collect()
}

pub fn models_for_brand(products: &[Product], brand: &str) -> Vec<String> {
    let distinct: BTreeSet<&str> = products
        .iter()
        .filter(|p| p.brand == brand)
        .map(|p| p.model.as_str())
        .collect();
    distinct.into_iter().map(str::to_string).collect()
}

/// Numeric series for one specification, ascending by value. Products whose
/// value has no leading number are left out.
pub fn chart_series<'a>(
    products: impl IntoIterator<Item = &'a Product>,
    spec_id: &SpecId,
) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = products
        .into_iter()
        .filter_map(|product| {
            let value = product.specs.get(spec_id).and_then(|v| parse_numeric(v))?;
            Some(ChartPoint {
                label: product.display_name(),
                value,
            })
        })
        .collect();
    points.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));
    points
}
