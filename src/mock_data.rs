use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::db::{CatalogStore, NewBrand, NewCategory, NewProduct, ProductType, StoreResult};
use crate::slug::slugify;

fn brand(name: &str, url: &str) -> NewBrand {
    NewBrand {
        name: name.to_string(),
        slug: slugify(name),
        url: Some(url.to_string()),
        description: None,
        is_visible: true,
    }
}

fn category(name: &str) -> NewCategory {
    NewCategory {
        name: name.to_string(),
        slug: slugify(name),
        description: None,
        is_visible: true,
    }
}

#[allow(clippy::too_many_arguments)]
fn product(
    name: &str,
    sku: &str,
    brand_id: i32,
    price: Decimal,
    quantity: i64,
    product_type: ProductType,
    published_at: Option<NaiveDate>,
    is_featured: bool,
) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        slug: slugify(name),
        description: None,
        image: None,
        is_visible: true,
        is_featured,
        brand_id,
        sku: sku.to_string(),
        quantity,
        price,
        product_type,
        published_at: published_at.unwrap_or_default(),
    }
}

/// Demo catalog for running without a database.
pub fn seed(store: &dyn CatalogStore) -> StoreResult<()> {
    let acme = store.create_brand(brand("Acme", "https://acme.example"))?;
    let maison = store.create_brand(brand("Maison Café", "https://maison-cafe.example"))?;

    let shoes = store.create_category(category("Chaussures"))?;
    let ebooks = store.create_category(category("Livres numériques"))?;

    let date = NaiveDate::from_ymd_opt(2024, 1, 15);
    store.create_product(
        product("Red Shoes", "ACME-RS-01", acme.id, Decimal::new(4990, 2), 12, ProductType::Deliverable, date, true),
        Some(shoes.id),
    )?;
    store.create_product(
        product("Blue Sneakers", "ACME-BS-02", acme.id, Decimal::new(7500, 2), 5, ProductType::Deliverable, date, false),
        Some(shoes.id),
    )?;
    store.create_product(
        product("Guide du café", "MC-GC-01", maison.id, Decimal::new(1200, 2), 100, ProductType::Downloadable, date, false),
        Some(ebooks.id),
    )?;
    store.create_product(
        product("Moulin à café", "MC-MC-02", maison.id, Decimal::new(3999, 2), 0, ProductType::Deliverable, date, false),
        None,
    )?;
    Ok(())
}
