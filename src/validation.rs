//! Form validation for the admin resources.
//!
//! Every rule is checked and every failure collected, so a rejected form
//! comes back with all of its field messages at once. Uniqueness and
//! relationship rules consult the store; the rest are pure.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::{
    BrandChanges, CatalogStore, CategoryChanges, NewBrand, NewCategory, NewProduct, ProductChanges, ProductType,
    StoreError, UniqueColumn,
};
use crate::error::AppError;
use crate::models::{BrandForm, CategoryForm, NumericInput, ProductForm};
use crate::resources::{self, FormSchema};
use crate::slug::slugify;

const MAX_STRING: usize = 255;

#[allow(clippy::expect_used)]
static PRICE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(resources::products::PRICE_PATTERN).expect("price pattern compiles"));

/// Field name → messages, serialized as a JSON object.
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Whether a form creates a record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Edit(i32),
}

impl Operation {
    fn record(self) -> Option<i32> {
        match self {
            Operation::Create => None,
            Operation::Edit(id) => Some(id),
        }
    }
}

/// Collects messages for one form, phrased with that form's labels.
struct Validator<'a> {
    schema: &'a FormSchema,
    errors: ValidationErrors,
}

impl<'a> Validator<'a> {
    fn new(schema: &'a FormSchema) -> Self {
        Self {
            schema,
            errors: ValidationErrors::default(),
        }
    }

    fn fail(&mut self, field: &str, template: &str) {
        let message = template.replace(":attribute", &self.schema.attribute(field));
        self.errors.add(field, message);
    }

    fn required_string(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        match value {
            None => {
                self.fail(field, "The :attribute field is required.");
                None
            }
            Some(v) if v.chars().count() > MAX_STRING => {
                self.fail(field, "The :attribute field must not be greater than 255 characters.");
                None
            }
            Some(v) => Some(v.to_string()),
        }
    }

    fn unique(
        &mut self,
        store: &dyn CatalogStore,
        field: &str,
        column: UniqueColumn,
        value: Option<&str>,
        operation: Operation,
    ) -> Result<(), StoreError> {
        if let Some(value) = value {
            if store.is_taken(column, value, operation.record())? {
                self.fail(field, "The :attribute has already been taken.");
            }
        }
        Ok(())
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, AppError> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(AppError::Validation(self.errors)),
        }
    }
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn parse_price(v: &mut Validator<'_>, input: Option<&NumericInput>) -> Option<Decimal> {
    let Some(text) = input.map(NumericInput::as_text).filter(|t| !t.is_empty()) else {
        v.fail("price", "The :attribute field is required.");
        return None;
    };

    let Ok(price) = text.trim_end_matches('.').parse::<Decimal>() else {
        v.fail("price", "The :attribute field must be a number.");
        return None;
    };

    let mut valid = true;
    if !PRICE_REGEX.is_match(&text) {
        v.fail("price", "The :attribute field format is invalid.");
        valid = false;
    }
    if price < Decimal::from(resources::products::PRICE_MIN) {
        v.fail("price", "The :attribute field must be at least 1.");
        valid = false;
    }
    valid.then_some(price)
}

fn parse_quantity(v: &mut Validator<'_>, input: Option<&NumericInput>) -> Option<i64> {
    let Some(text) = input.map(NumericInput::as_text).filter(|t| !t.is_empty()) else {
        v.fail("quantity", "The :attribute field is required.");
        return None;
    };

    let quantity = match text.parse::<i64>() {
        Ok(quantity) => quantity,
        Err(_) => match text.parse::<Decimal>() {
            Ok(d) if d.fract().is_zero() => d.to_i64().unwrap_or(i64::MAX),
            Ok(_) => {
                v.fail("quantity", "The :attribute field must be an integer.");
                return None;
            }
            Err(_) => {
                v.fail("quantity", "The :attribute field must be a number.");
                return None;
            }
        },
    };

    if quantity < resources::products::QUANTITY_MIN {
        v.fail("quantity", "The :attribute field must be at least 0.");
        return None;
    }
    if quantity > resources::products::QUANTITY_MAX {
        v.fail("quantity", "The :attribute field must not be greater than 100.");
        return None;
    }
    Some(quantity)
}

fn parse_type(v: &mut Validator<'_>, input: Option<&str>) -> Option<ProductType> {
    match input.map(str::trim).filter(|t| !t.is_empty()) {
        None => Some(ProductType::default()),
        Some(text) => match text.parse() {
            Ok(kind) => Some(kind),
            Err(_) => {
                v.fail("type", "The selected :attribute is invalid.");
                None
            }
        },
    }
}

/// `YYYY-MM-DD`, or any RFC 3339 timestamp reduced to its date.
fn parse_date(v: &mut Validator<'_>, input: Option<&str>, today: NaiveDate) -> Option<NaiveDate> {
    let Some(text) = input.map(str::trim).filter(|t| !t.is_empty()) else {
        return Some(today);
    };
    let parsed = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()));
    if parsed.is_none() {
        v.fail("published_at", "The :attribute field must be a valid date.");
    }
    parsed
}

fn parse_brand(v: &mut Validator<'_>, store: &dyn CatalogStore, input: Option<&NumericInput>) -> Result<Option<i32>, StoreError> {
    let Some(text) = input.map(NumericInput::as_text).filter(|t| !t.is_empty()) else {
        v.fail("brand_id", "The :attribute field is required.");
        return Ok(None);
    };
    let Ok(brand_id) = text.parse::<i32>() else {
        v.fail("brand_id", "The selected :attribute is invalid.");
        return Ok(None);
    };
    match store.get_brand(brand_id) {
        Ok(_) => Ok(Some(brand_id)),
        Err(StoreError::NotFound) => {
            v.fail("brand_id", "The selected :attribute is invalid.");
            Ok(None)
        }
        Err(other) => Err(other),
    }
}

/// Stored upload paths are relative to the storage root.
fn parse_image(v: &mut Validator<'_>, input: Option<&str>) -> Option<Option<String>> {
    let Some(path) = optional_text(input) else {
        return Some(None);
    };
    if path.starts_with('/') || path.split('/').any(|segment| segment == "..") {
        v.fail("image", "The :attribute field must be a valid upload path.");
        return None;
    }
    Some(Some(path))
}

/// Fields shared by product creation and edits.
struct ProductFields {
    name: String,
    description: Option<String>,
    image: Option<String>,
    is_visible: bool,
    is_featured: bool,
    brand_id: i32,
    sku: String,
    quantity: i64,
    price: Decimal,
    product_type: ProductType,
    published_at: NaiveDate,
}

fn check_product(
    v: &mut Validator<'_>,
    store: &dyn CatalogStore,
    form: &ProductForm,
    operation: Operation,
    today: NaiveDate,
) -> Result<Option<ProductFields>, StoreError> {
    let name = v.required_string("name", form.name.as_deref());
    v.unique(store, "name", UniqueColumn::ProductName, name.as_deref(), operation)?;

    let sku = v.required_string("sku", form.sku.as_deref());
    v.unique(store, "sku", UniqueColumn::ProductSku, sku.as_deref(), operation)?;

    let price = parse_price(v, form.price.as_ref());
    let quantity = parse_quantity(v, form.quantity.as_ref());
    let product_type = parse_type(v, form.product_type.as_deref());
    let published_at = parse_date(v, form.published_at.as_deref(), today);
    let brand_id = parse_brand(v, store, form.brand_id.as_ref())?;
    let image = parse_image(v, form.image.as_deref());

    let fields = (|| {
        Some(ProductFields {
            name: name?,
            description: optional_text(form.description.as_deref()),
            image: image?,
            is_visible: form.is_visible.unwrap_or(false),
            is_featured: form.is_featured.unwrap_or(false),
            brand_id: brand_id?,
            sku: sku?,
            quantity: quantity?,
            price: price?,
            product_type: product_type?,
            published_at: published_at?,
        })
    })();
    Ok(fields)
}

/// Validates a create form and derives the slug from the name. Any slug
/// sent by the client is ignored.
pub fn validate_new_product(store: &dyn CatalogStore, form: &ProductForm, today: NaiveDate) -> Result<NewProduct, AppError> {
    let schema = resources::products::form();
    let mut v = Validator::new(&schema);

    let fields = check_product(&mut v, store, form, Operation::Create, today)?;

    let slug = form.name.as_deref().map(slugify).filter(|slug| !slug.is_empty());
    if slug.is_none() {
        v.fail("slug", "The :attribute field is required.");
    }
    v.unique(store, "slug", UniqueColumn::ProductSlug, slug.as_deref(), Operation::Create)?;

    let product = fields.zip(slug).map(|(f, slug)| NewProduct {
        name: f.name,
        slug,
        description: f.description,
        image: f.image,
        is_visible: f.is_visible,
        is_featured: f.is_featured,
        brand_id: f.brand_id,
        sku: f.sku,
        quantity: f.quantity,
        price: f.price,
        product_type: f.product_type,
        published_at: f.published_at,
    });
    v.finish(product)
}

/// Validates an edit form. The slug is fixed at creation and never part of
/// the resulting changeset.
pub fn validate_product_changes(
    store: &dyn CatalogStore,
    id: i32,
    form: &ProductForm,
    today: NaiveDate,
) -> Result<ProductChanges, AppError> {
    let schema = resources::products::form();
    let mut v = Validator::new(&schema);

    let fields = check_product(&mut v, store, form, Operation::Edit(id), today)?;

    let changes = fields.map(|f| ProductChanges {
        name: f.name,
        description: f.description,
        image: f.image,
        is_visible: f.is_visible,
        is_featured: f.is_featured,
        brand_id: f.brand_id,
        sku: f.sku,
        quantity: f.quantity,
        price: f.price,
        product_type: f.product_type,
        published_at: f.published_at,
    });
    v.finish(changes)
}

fn check_url(v: &mut Validator<'_>, input: Option<&str>) -> Option<Option<String>> {
    let Some(url) = optional_text(input) else {
        return Some(None);
    };
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        v.fail("url", "The :attribute field must be a valid URL.");
        return None;
    }
    Some(Some(url))
}

fn derived_slug(
    v: &mut Validator<'_>,
    store: &dyn CatalogStore,
    name: Option<&str>,
    column: UniqueColumn,
) -> Result<Option<String>, StoreError> {
    let slug = name.map(slugify).filter(|slug| !slug.is_empty());
    if slug.is_none() {
        v.fail("slug", "The :attribute field is required.");
    }
    v.unique(store, "slug", column, slug.as_deref(), Operation::Create)?;
    Ok(slug)
}

pub fn validate_new_brand(store: &dyn CatalogStore, form: &BrandForm) -> Result<NewBrand, AppError> {
    let schema = resources::brands::form();
    let mut v = Validator::new(&schema);

    let name = v.required_string("name", form.name.as_deref());
    v.unique(store, "name", UniqueColumn::BrandName, name.as_deref(), Operation::Create)?;
    let slug = derived_slug(&mut v, store, name.as_deref(), UniqueColumn::BrandSlug)?;
    let url = check_url(&mut v, form.url.as_deref());

    let brand = (|| {
        Some(NewBrand {
            name: name?,
            slug: slug?,
            url: url?,
            description: optional_text(form.description.as_deref()),
            is_visible: form.is_visible.unwrap_or(true),
        })
    })();
    v.finish(brand)
}

pub fn validate_brand_changes(store: &dyn CatalogStore, id: i32, form: &BrandForm) -> Result<BrandChanges, AppError> {
    let schema = resources::brands::form();
    let mut v = Validator::new(&schema);

    let name = v.required_string("name", form.name.as_deref());
    v.unique(store, "name", UniqueColumn::BrandName, name.as_deref(), Operation::Edit(id))?;
    let url = check_url(&mut v, form.url.as_deref());

    let changes = (|| {
        Some(BrandChanges {
            name: name?,
            url: url?,
            description: optional_text(form.description.as_deref()),
            is_visible: form.is_visible.unwrap_or(true),
        })
    })();
    v.finish(changes)
}

pub fn validate_new_category(store: &dyn CatalogStore, form: &CategoryForm) -> Result<NewCategory, AppError> {
    let schema = resources::categories::form();
    let mut v = Validator::new(&schema);

    let name = v.required_string("name", form.name.as_deref());
    v.unique(store, "name", UniqueColumn::CategoryName, name.as_deref(), Operation::Create)?;
    let slug = derived_slug(&mut v, store, name.as_deref(), UniqueColumn::CategorySlug)?;

    let category = name.zip(slug).map(|(name, slug)| NewCategory {
        name,
        slug,
        description: optional_text(form.description.as_deref()),
        is_visible: form.is_visible.unwrap_or(true),
    });
    v.finish(category)
}

pub fn validate_category_changes(store: &dyn CatalogStore, id: i32, form: &CategoryForm) -> Result<CategoryChanges, AppError> {
    let schema = resources::categories::form();
    let mut v = Validator::new(&schema);

    let name = v.required_string("name", form.name.as_deref());
    v.unique(store, "name", UniqueColumn::CategoryName, name.as_deref(), Operation::Edit(id))?;

    let changes = name.map(|name| CategoryChanges {
        name,
        description: optional_text(form.description.as_deref()),
        is_visible: form.is_visible.unwrap_or(true),
    });
    v.finish(changes)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::db::{MemoryStore, NewBrand};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn store_with_brand() -> (MemoryStore, i32) {
        let store = MemoryStore::new();
        let brand = store
            .create_brand(NewBrand {
                name: "Acme".to_string(),
                slug: "acme".to_string(),
                url: None,
                description: None,
                is_visible: true,
            })
            .unwrap();
        (store, brand.id)
    }

    fn form(value: serde_json::Value) -> ProductForm {
        serde_json::from_value(value).unwrap()
    }

    fn errors(result: Result<impl std::fmt::Debug, AppError>) -> ValidationErrors {
        match result {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn valid_form_derives_slug_and_defaults() {
        let (store, brand_id) = store_with_brand();
        let product = validate_new_product(
            &store,
            &form(json!({
                "name": "Red Shoes",
                "slug": "ignored",
                "sku": "RS-001",
                "price": "49.90",
                "quantity": 10,
                "brand_id": brand_id,
            })),
            today(),
        )
        .unwrap();

        assert_eq!(product.slug, "red-shoes");
        assert_eq!(product.product_type, ProductType::Deliverable);
        assert_eq!(product.published_at, today());
        assert_eq!(product.price, Decimal::new(4990, 2));
        assert!(!product.is_visible);
        assert!(!product.is_featured);
    }

    #[test]
    fn empty_form_reports_every_required_field() {
        let (store, _) = store_with_brand();
        let errors = errors(validate_new_product(&store, &ProductForm::default(), today()));
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["brand_id", "name", "price", "quantity", "sku", "slug"]);
        assert_eq!(errors.messages("price"), ["The Prix field is required."]);
        assert_eq!(errors.messages("brand_id"), ["The Marque field is required."]);
    }

    #[test]
    fn price_must_match_pattern_and_minimum() {
        let (store, brand_id) = store_with_brand();
        let cases = [
            ("1234567", vec!["The Prix field format is invalid."]),
            ("12.345", vec!["The Prix field format is invalid."]),
            ("0.50", vec!["The Prix field must be at least 1."]),
            ("-5", vec!["The Prix field format is invalid.", "The Prix field must be at least 1."]),
            ("abc", vec!["The Prix field must be a number."]),
        ];
        for (price, expected) in cases {
            let errors = errors(validate_new_product(
                &store,
                &form(json!({"name": "X", "sku": "X", "price": price, "quantity": 1, "brand_id": brand_id})),
                today(),
            ));
            assert_eq!(errors.messages("price"), expected.as_slice(), "price {price}");
        }
    }

    #[test]
    fn accepts_price_edge_values() {
        let (store, brand_id) = store_with_brand();
        for price in ["1", "999999.99", "12.", "100.5"] {
            let result = validate_new_product(
                &store,
                &form(json!({"name": "X", "sku": "X", "price": price, "quantity": 1, "brand_id": brand_id})),
                today(),
            );
            assert!(result.is_ok(), "price {price} should be accepted");
        }
    }

    #[test]
    fn quantity_is_bounded() {
        let (store, brand_id) = store_with_brand();
        for (quantity, message) in [
            (json!(101), "The Quantité field must not be greater than 100."),
            (json!(-1), "The Quantité field must be at least 0."),
            (json!("2.5"), "The Quantité field must be an integer."),
            (json!("many"), "The Quantité field must be a number."),
        ] {
            let errors = errors(validate_new_product(
                &store,
                &form(json!({"name": "X", "sku": "X", "price": 5, "quantity": quantity, "brand_id": brand_id})),
                today(),
            ));
            assert_eq!(errors.messages("quantity"), [message]);
        }

        for quantity in [0, 100] {
            let result = validate_new_product(
                &store,
                &form(json!({"name": "X", "sku": "X", "price": 5, "quantity": quantity, "brand_id": brand_id})),
                today(),
            );
            assert!(result.is_ok());
        }
    }

    #[test]
    fn rejects_unknown_type_brand_and_date() {
        let (store, _) = store_with_brand();
        let errors = errors(validate_new_product(
            &store,
            &form(json!({
                "name": "X", "sku": "X", "price": 5, "quantity": 1,
                "type": "physical", "brand_id": 404, "published_at": "yesterday",
            })),
            today(),
        ));
        assert_eq!(errors.messages("type"), ["The selected type is invalid."]);
        assert_eq!(errors.messages("brand_id"), ["The selected Marque is invalid."]);
        assert_eq!(errors.messages("published_at"), ["The Date de Publication field must be a valid date."]);
    }

    #[test]
    fn uniqueness_is_checked_against_other_records() {
        let (store, brand_id) = store_with_brand();
        let body = json!({"name": "Red Shoes", "sku": "RS-1", "price": 5, "quantity": 1, "brand_id": brand_id});
        let product = validate_new_product(&store, &form(body.clone()), today()).unwrap();
        let created = store.create_product(product, None).unwrap();

        let errors = errors(validate_new_product(&store, &form(body.clone()), today()));
        assert_eq!(errors.messages("name"), ["The name has already been taken."]);
        assert_eq!(errors.messages("slug"), ["The slug has already been taken."]);
        assert_eq!(errors.messages("sku"), ["The SKU (Unité de gestion des stocks) has already been taken."]);

        // Saving the record under its own name and SKU is fine.
        assert!(validate_product_changes(&store, created.id, &form(body), today()).is_ok());
    }

    #[test]
    fn name_without_slug_characters_fails_on_slug() {
        let (store, brand_id) = store_with_brand();
        let errors = errors(validate_new_product(
            &store,
            &form(json!({"name": "!!!", "sku": "X", "price": 5, "quantity": 1, "brand_id": brand_id})),
            today(),
        ));
        assert!(errors.has("slug"));
        assert!(!errors.has("name"));
    }

    #[test]
    fn image_paths_stay_inside_storage() {
        let (store, brand_id) = store_with_brand();
        let errors = errors(validate_new_product(
            &store,
            &form(json!({"name": "X", "sku": "X", "price": 5, "quantity": 1, "brand_id": brand_id, "image": "../etc/passwd"})),
            today(),
        ));
        assert!(errors.has("image"));
    }

    #[test]
    fn brand_and_category_forms() {
        let store = MemoryStore::new();
        let brand = validate_new_brand(&store, &BrandForm { name: Some("Maison Café".into()), ..Default::default() }).unwrap();
        assert_eq!(brand.slug, "maison-cafe");
        assert!(brand.is_visible);

        let bad_url = BrandForm {
            name: Some("Other".into()),
            url: Some("ftp://example.com".into()),
            ..Default::default()
        };
        assert!(errors(validate_new_brand(&store, &bad_url)).has("url"));

        let category = validate_new_category(&store, &CategoryForm { name: Some("Chaussures".into()), ..Default::default() }).unwrap();
        assert_eq!(category.slug, "chaussures");
        assert!(errors(validate_new_category(&store, &CategoryForm::default())).has("name"));
    }
}
