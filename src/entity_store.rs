//! Canonical, order-significant collections of specifications and products.
//!
//! The store is the sole owner of the entities. Consumers get shared slices;
//! every mutation goes through one of the methods below, which keep the
//! referential invariants:
//!
//! - creating a specification backfills `""` for it into every product,
//! - deleting a specification removes its key from every product,
//! - product spec maps never reference an unknown specification,
//! - reorders only permute the existing entries.
//!
//! Unknown ids make destructive and reorder operations no-ops (they report
//! `false`); only [`EntityStore::update_product`] signals `NotFound`.

use std::collections::HashSet;

use log::debug;

use crate::comparison_model::{
    Product, ProductFields, ProductId, SpecId, SpecValues, Specification,
};
use crate::error::{ComparisonError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    specifications: Vec<Specification>,
    products: Vec<Product>,
}

impl EntityStore {
    /// Builds a store from loaded collections, pruning product values that
    /// reference no known specification.
    pub fn from_parts(specifications: Vec<Specification>, mut products: Vec<Product>) -> Self {
        let known: HashSet<&SpecId> = specifications.iter().map(|s| &s.id).collect();
        let mut pruned = 0usize;
        for product in &mut products {
            let before = product.specs.len();
            product.specs.retain(|id, _| known.contains(id));
            pruned += before - product.specs.len();
        }
        if pruned > 0 {
            debug!("Pruned {pruned} dangling specification values while building store");
        }
        Self {
            specifications,
            products,
        }
    }

    pub fn specifications(&self) -> &[Specification] {
        &self.specifications
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn specification(&self, id: &SpecId) -> Option<&Specification> {
        self.specifications.iter().find(|s| &s.id == id)
    }

    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    pub fn contains_product(&self, id: &ProductId) -> bool {
        self.product(id).is_some()
    }

    pub fn create_specification(&mut self, name: &str) -> Result<Specification> {
        let name = validate_name(name, "Specification name")?;
        let spec = Specification::new(name);
        for product in &mut self.products {
            product.specs.insert(spec.id.clone(), String::new());
        }
        self.specifications.push(spec.clone());
        Ok(spec)
    }

    pub fn rename_specification(&mut self, id: &SpecId, new_name: &str) -> Result<bool> {
        let new_name = validate_name(new_name, "Specification name")?;
        match self.specifications.iter_mut().find(|s| &s.id == id) {
            Some(spec) => {
                spec.name = new_name;
                Ok(true)
            }
            None => {
                debug!("Rename ignored, unknown specification {id}");
                Ok(false)
            }
        }
    }

    pub fn delete_specification(&mut self, id: &SpecId) -> bool {
        let before = self.specifications.len();
        self.specifications.retain(|s| &s.id != id);
        if self.specifications.len() == before {
            debug!("Delete ignored, unknown specification {id}");
            return false;
        }
        for product in &mut self.products {
            product.specs.remove(id);
        }
        true
    }

    /// Moves `id` immediately before `target_id` in canonical order.
    pub fn reorder_specifications(&mut self, id: &SpecId, target_id: &SpecId) -> bool {
        move_before(&mut self.specifications, |s| &s.id, id, target_id)
    }

    pub fn create_product(&mut self, fields: ProductFields) -> Result<Product> {
        let fields = self.checked_fields(fields)?;
        let product = Product {
            id: ProductId::generate(),
            brand: fields.brand,
            model: fields.model,
            image_url: fields.image_url,
            specs: fields.specs,
        };
        self.products.push(product.clone());
        Ok(product)
    }

    /// Replaces the full record at `id`, keeping its position.
    pub fn update_product(&mut self, id: &ProductId, fields: ProductFields) -> Result<Product> {
        let fields = self.checked_fields(fields)?;
        let product = self
            .products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| ComparisonError::NotFound(format!("No product found with id: {id}")))?;
        product.brand = fields.brand;
        product.model = fields.model;
        product.image_url = fields.image_url;
        product.specs = fields.specs;
        Ok(product.clone())
    }

    pub fn delete_product(&mut self, id: &ProductId) -> bool {
        let before = self.products.len();
        self.products.retain(|p| &p.id != id);
        let removed = self.products.len() != before;
        if !removed {
            debug!("Delete ignored, unknown product {id}");
        }
        removed
    }

    pub fn reorder_products(&mut self, id: &ProductId, target_id: &ProductId) -> bool {
        move_before(&mut self.products, |p| &p.id, id, target_id)
    }

    /// Installs new collections with a single assignment, so no reader can
    /// observe a mix of old and new entities.
    pub fn replace_all(&mut self, specifications: Vec<Specification>, products: Vec<Product>) {
        *self = EntityStore::from_parts(specifications, products);
    }

    fn checked_fields(&self, mut fields: ProductFields) -> Result<ProductFields> {
        fields.brand = validate_name(&fields.brand, "Product brand")?;
        fields.model = fields.model.trim().to_string();
        fields.specs = self.known_values(fields.specs);
        Ok(fields)
    }

    fn known_values(&self, values: SpecValues) -> SpecValues {
        values
            .into_iter()
            .filter(|(id, _)| {
                let known = self.specification(id).is_some();
                if !known {
                    debug!("Dropping value for unknown specification {id}");
                }
                known
            })
            .collect()
    }
}

fn validate_name(name: &str, what: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ComparisonError::Validation(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Generic "drop `id` before `target`" over any id-keyed sequence.
fn move_before<T, K: PartialEq + std::fmt::Display>(
    items: &mut Vec<T>,
    key: impl Fn(&T) -> &K,
    id: &K,
    target: &K,
) -> bool {
    if id == target {
        return false;
    }
    let Some(from) = items.iter().position(|item| key(item) == id) else {
        debug!("Reorder ignored, unknown id {id}");
        return false;
    };
    let Some(to) = items.iter().position(|item| key(item) == target) else {
        debug!("Reorder ignored, unknown target {target}");
        return false;
    };
    if from + 1 == to {
        return false;
    }
    let item = items.remove(from);
    let to = if from < to { to - 1 } else { to };
    items.insert(to, item);
    true
}
