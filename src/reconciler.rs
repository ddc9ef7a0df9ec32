//! Import/export between the id-keyed store and name-keyed interchange files.
//!
//! External records look like
//! `{"brand", "model", "imageUrl"?, "specs": {"<spec name>": "<value>"}}`;
//! the first schema's `{"name", "imageUrl"?, "specs"}` is accepted too and
//! its name is split like a legacy stored product. Specification ids never
//! leave the crate.
//!
//! Import validates every record before anything is built, so a bad record
//! rejects the whole file. A successful import yields a fresh [`Catalog`]
//! that replaces the store wholesale.
//!
//! The CSV dialect is deliberately minimal: one header line, one record per
//! line, fields split on every comma. Export wraps fields that contain a
//! comma in double quotes and import strips a surrounding pair of quotes, but
//! a quoted field that contains a comma is still split on it. CSV files with
//! such values do not round-trip; use JSON for those. CSV has no null either,
//! so an empty `imageUrl` cell counts as missing and gets a placeholder.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::comparison_model::{Product, ProductId, Specification};
use crate::entity_store::EntityStore;
use crate::error::{ComparisonError, Result};
use crate::persistence::split_legacy_name;
use crate::seed::Catalog;

/// A product as it appears in an interchange file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRecord {
    pub brand: String,
    pub model: String,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub specs: IndexMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Json,
    Csv,
}

impl DataFormat {
    /// `.csv` files are CSV; anything else is read as JSON.
    pub fn from_file_name(name: &str) -> Self {
        if name.to_lowercase().ends_with(".csv") {
            DataFormat::Csv
        } else {
            DataFormat::Json
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Ok(DataFormat::Json),
            "csv" => Ok(DataFormat::Csv),
            other => Err(ComparisonError::BadRequest(format!(
                "Unknown data format '{other}', expected 'json' or 'csv'"
            ))),
        }
    }
}

pub fn parse_records(format: DataFormat, text: &str) -> Result<Vec<ExternalRecord>> {
    let records = match format {
        DataFormat::Json => parse_json_records(text)?,
        DataFormat::Csv => parse_csv_records(text)?,
    };
    if records.is_empty() {
        return Err(ComparisonError::Validation(
            "The file contains no product records".to_string(),
        ));
    }
    Ok(records)
}

pub fn parse_json_records(text: &str) -> Result<Vec<ExternalRecord>> {
    let value: JsonValue = serde_json::from_str(text)
        .map_err(|e| ComparisonError::Validation(format!("Invalid JSON: {e}")))?;
    let JsonValue::Array(items) = value else {
        return Err(ComparisonError::Validation(
            "Invalid data structure: expected an array of products".to_string(),
        ));
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| json_record(index + 1, item))
        .collect()
}

fn json_record(position: usize, item: &JsonValue) -> Result<ExternalRecord> {
    let invalid = |reason: &str| ComparisonError::Validation(format!("Record {position}: {reason}"));
    let JsonValue::Object(fields) = item else {
        return Err(invalid("expected an object"));
    };

    let (brand, model) = match (fields.get("brand"), fields.get("model"), fields.get("name")) {
        (Some(JsonValue::String(brand)), Some(JsonValue::String(model)), _) => {
            (brand.trim().to_string(), model.trim().to_string())
        }
        (None, None, Some(JsonValue::String(name))) => split_legacy_name(name.trim()),
        (None, None, _) => return Err(invalid("missing 'brand' and 'model' (or legacy 'name')")),
        _ => return Err(invalid("'brand' and 'model' must both be present as strings")),
    };
    if brand.is_empty() {
        return Err(invalid("product brand must not be empty"));
    }

    let image_url = match fields.get("imageUrl") {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(url)) => Some(url.clone()),
        Some(_) => return Err(invalid("'imageUrl' must be a string")),
    };

    let Some(JsonValue::Object(raw_specs)) = fields.get("specs") else {
        return Err(invalid("missing 'specs' mapping"));
    };
    let mut specs = IndexMap::with_capacity(raw_specs.len());
    for (name, value) in raw_specs {
        let value = match value {
            JsonValue::String(text) => text.clone(),
            JsonValue::Number(number) => number.to_string(),
            JsonValue::Bool(flag) => flag.to_string(),
            JsonValue::Null => String::new(),
            _ => return Err(invalid(&format!("value of '{name}' must be a string"))),
        };
        specs.insert(name.clone(), value);
    }

    Ok(ExternalRecord {
        brand,
        model,
        image_url,
        specs,
    })
}

enum CsvSchema {
    BrandModel { brand: usize, model: usize },
    Name { name: usize },
}

pub fn parse_csv_records(text: &str) -> Result<Vec<ExternalRecord>> {
    let lines: Vec<&str> = text.trim().lines().collect();
    if lines.len() < 2 {
        return Err(ComparisonError::Validation(
            "CSV must have a header row and at least one data row.".to_string(),
        ));
    }

    let headers = split_csv_line(lines[0]);
    let column = |name: &str| headers.iter().position(|h| h == name);
    let schema = match (column("brand"), column("model"), column("name")) {
        (Some(brand), Some(model), _) => CsvSchema::BrandModel { brand, model },
        (_, _, Some(name)) => CsvSchema::Name { name },
        _ => {
            return Err(ComparisonError::Validation(
                "CSV must contain a 'name' column header or 'brand' and 'model' headers."
                    .to_string(),
            ))
        }
    };
    let image_column = column("imageUrl");
    let is_identifying = |index: usize| match schema {
        CsvSchema::BrandModel { brand, model } => index == brand || index == model,
        CsvSchema::Name { name } => index == name,
    };

    let mut records = Vec::new();
    for line in &lines[1..] {
        if line.trim().is_empty() {
            continue;
        }
        let values = split_csv_line(line);
        let value_at = |index: usize| values.get(index).cloned().unwrap_or_default();

        let (brand, model) = match schema {
            CsvSchema::BrandModel { brand, model } => (value_at(brand), value_at(model)),
            CsvSchema::Name { name } => split_legacy_name(&value_at(name)),
        };
        if brand.is_empty() {
            continue;
        }

        let specs = headers
            .iter()
            .enumerate()
            .filter(|(index, _)| !is_identifying(*index) && Some(*index) != image_column)
            .map(|(index, header)| (header.clone(), value_at(index)))
            .collect();

        records.push(ExternalRecord {
            brand,
            model,
            image_url: image_column.map(value_at).filter(|url| !url.is_empty()),
            specs,
        });
    }
    Ok(records)
}

fn split_csv_line(line: &str) -> Vec<String> {
    line.split(',')
        .map(|field| {
            let field = field.trim();
            field
                .strip_prefix('"')
                .and_then(|inner| inner.strip_suffix('"'))
                .unwrap_or(field)
                .to_string()
        })
        .collect()
}

/// Binds specification names to fresh ids and builds the replacement catalog.
///
/// One specification is created per distinct name, in order of first
/// appearance. `placeholder_image` supplies an image for records without an
/// `imageUrl`; an explicit empty one is kept.
pub fn reconcile(
    records: Vec<ExternalRecord>,
    placeholder_image: impl Fn(&ProductId) -> String,
) -> Catalog {
    let names: IndexSet<String> = records
        .iter()
        .flat_map(|record| record.specs.keys().cloned())
        .collect();
    let specifications: Vec<Specification> = names.into_iter().map(Specification::new).collect();
    let lookup: HashMap<&str, &Specification> =
        specifications.iter().map(|s| (s.name.as_str(), s)).collect();

    let products = records
        .into_iter()
        .map(|record| {
            let id = ProductId::generate();
            let image_url = record.image_url.unwrap_or_else(|| placeholder_image(&id));
            let specs = record
                .specs
                .into_iter()
                .filter_map(|(name, value)| {
                    lookup.get(name.as_str()).map(|spec| (spec.id.clone(), value))
                })
                .collect();
            Product {
                id,
                brand: record.brand,
                model: record.model,
                image_url,
                specs,
            }
        })
        .collect();

    Catalog {
        specifications,
        products,
    }
}

/// External records for the current products, keys in canonical
/// specification order. Absent values are exported as `""`.
pub fn export_records(store: &EntityStore) -> Vec<ExternalRecord> {
    store
        .products()
        .iter()
        .map(|product| ExternalRecord {
            brand: product.brand.clone(),
            model: product.model.clone(),
            image_url: Some(product.image_url.clone()),
            specs: store
                .specifications()
                .iter()
                .map(|spec| {
                    let value = product.specs.get(&spec.id).cloned().unwrap_or_default();
                    (spec.name.clone(), value)
                })
                .collect(),
        })
        .collect()
}

pub fn export_json(store: &EntityStore) -> Result<String> {
    Ok(serde_json::to_string_pretty(&export_records(store))?)
}

/// CSV template: `brand,model,imageUrl` then specification names in
/// alphabetical order, one row per product.
pub fn export_csv(store: &EntityStore) -> String {
    let mut specifications: Vec<&Specification> = store.specifications().iter().collect();
    specifications.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });

    let header = ["brand", "model", "imageUrl"]
        .into_iter()
        .chain(specifications.iter().map(|s| s.name.as_str()))
        .map(escape_csv_field)
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = vec![header];
    for product in store.products() {
        let row = [
            product.brand.as_str(),
            product.model.as_str(),
            product.image_url.as_str(),
        ]
        .into_iter()
        .chain(
            specifications
                .iter()
                .map(|spec| product.specs.get(&spec.id).map(String::as_str).unwrap_or("")),
        )
        .map(escape_csv_field)
        .collect::<Vec<_>>()
        .join(",");
        lines.push(row);
    }
    lines.join("\n")
}

fn escape_csv_field(value: &str) -> String {
    if value.contains(',') {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}
