//! Built-in catalog used when the store holds no entities yet.

use crate::comparison_model::{Product, ProductId, SpecValues, Specification};

/// Specifications and products that belong together.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub specifications: Vec<Specification>,
    pub products: Vec<Product>,
}

const SPECIFICATION_NAMES: [&str; 10] = [
    "Street Price (USD)",
    "MSRP (USD)",
    "Status",
    "Released",
    "Warranty",
    "Brightness",
    "Resolution",
    "Aspect Ratio",
    "Dynamic Contrast",
    "Display Type",
];

// (brand, model, image, values in SPECIFICATION_NAMES order)
const PRODUCTS: [(&str, &str, &str, [&str; 10]); 3] = [
    (
        "BenQ",
        "TK710",
        "https://picsum.photos/seed/proj1/400/300",
        [
            "$2,999",
            "$3,499",
            "Shipping",
            "May 2024",
            "3 Years",
            "3,200 ANSI Lumens",
            "3840x2160",
            "16:9 (4K UHD)",
            "600,000:1",
            "DLP",
        ],
    ),
    (
        "Epson",
        "Pro Cinema LS12000",
        "https://picsum.photos/seed/proj2/400/300",
        [
            "$4,999",
            "$4,999",
            "Shipping",
            "Dec 2021",
            "3 Years",
            "2,700 ANSI Lumens",
            "3840x2160",
            "16:9 (4K UHD)",
            "2,500,000:1",
            "3LCD",
        ],
    ),
    (
        "Sony",
        "VPL-XW5000ES",
        "https://picsum.photos/seed/proj3/400/300",
        [
            "$5,999",
            "$5,999",
            "Shipping",
            "May 2022",
            "3 Years",
            "2,000 ANSI Lumens",
            "3840x2160",
            "16:9 (4K UHD)",
            "Infinite",
            "SXRD",
        ],
    ),
];

/// The projector catalog with freshly generated ids.
pub fn seed_catalog() -> Catalog {
    let specifications: Vec<Specification> =
        SPECIFICATION_NAMES.iter().map(|name| Specification::new(*name)).collect();

    let products = PRODUCTS
        .iter()
        .map(|(brand, model, image_url, values)| Product {
            id: ProductId::generate(),
            brand: brand.to_string(),
            model: model.to_string(),
            image_url: image_url.to_string(),
            specs: specifications
                .iter()
                .zip(values.iter())
                .map(|(spec, value)| (spec.id.clone(), value.to_string()))
                .collect::<SpecValues>(),
        })
        .collect();

    Catalog {
        specifications,
        products,
    }
}
