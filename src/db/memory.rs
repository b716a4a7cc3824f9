use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;

use crate::db::models::*;
use crate::db::store::{AccountStore, CatalogStore, StoreError, StoreResult, UniqueColumn};
use crate::models::{ProductFilter, ProductSearchColumn, ProductSortColumn, SortDirection};

#[derive(Default)]
struct Tables {
    brands: BTreeMap<i32, Brand>,
    categories: BTreeMap<i32, Category>,
    products: BTreeMap<i32, Product>,
    category_product: BTreeSet<(i32, i32)>,
    users: BTreeMap<i32, User>,
    sessions: HashMap<String, AdminSession>,
    last_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn brand_name(&self, brand_id: i32) -> String {
        self.brands
            .get(&brand_id)
            .map(|brand| brand.name.clone())
            .unwrap_or_default()
    }

    fn with_brand(&self, product: &Product) -> ProductWithBrand {
        ProductWithBrand {
            product: product.clone(),
            brand_name: self.brand_name(product.brand_id),
        }
    }

    fn remove_product(&mut self, id: i32) -> bool {
        self.category_product.retain(|&(_, product_id)| product_id != id);
        self.products.remove(&id).is_some()
    }

    fn check_product_constraints(&self, slug: Option<&str>, sku: &str, brand_id: i32, ignore: Option<i32>) -> StoreResult<()> {
        if !self.brands.contains_key(&brand_id) {
            return Err(StoreError::ForeignKeyViolation);
        }
        for product in self.products.values().filter(|p| Some(p.id) != ignore) {
            if slug == Some(product.slug.as_str()) {
                return Err(StoreError::UniqueViolation("products_slug_unique".to_string()));
            }
            if product.sku == sku {
                return Err(StoreError::UniqueViolation("products_sku_unique".to_string()));
            }
        }
        Ok(())
    }
}

/// A process-local store with the same observable behaviour as the
/// PostgreSQL schema: unique slugs and SKUs, brand cascade, pivot cleanup.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn matches_search(item: &ProductWithBrand, term: &str, columns: &[ProductSearchColumn]) -> bool {
    let needle = term.to_lowercase();
    columns.iter().any(|column| match column {
        ProductSearchColumn::Name => item.product.name.to_lowercase().contains(&needle),
        ProductSearchColumn::BrandName => item.brand_name.to_lowercase().contains(&needle),
        ProductSearchColumn::Price => term.parse::<Decimal>().is_ok_and(|price| item.product.price == price),
        ProductSearchColumn::Quantity => term.parse::<i64>().is_ok_and(|quantity| item.product.quantity == quantity),
    })
}

fn compare(a: &ProductWithBrand, b: &ProductWithBrand, column: ProductSortColumn) -> Ordering {
    match column {
        ProductSortColumn::Name => a.product.name.cmp(&b.product.name),
        ProductSortColumn::BrandName => a.brand_name.cmp(&b.brand_name),
        ProductSortColumn::Price => a.product.price.cmp(&b.product.price),
        ProductSortColumn::Quantity => a.product.quantity.cmp(&b.product.quantity),
        ProductSortColumn::PublishedAt => a.product.published_at.cmp(&b.product.published_at),
    }
}

impl CatalogStore for MemoryStore {
    fn list_brands(&self) -> StoreResult<Vec<Brand>> {
        let tables = self.lock()?;
        let mut brands: Vec<Brand> = tables.brands.values().cloned().collect();
        brands.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(brands)
    }

    fn get_brand(&self, id: i32) -> StoreResult<Brand> {
        self.lock()?.brands.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn create_brand(&self, brand: NewBrand) -> StoreResult<Brand> {
        let mut tables = self.lock()?;
        if tables.brands.values().any(|b| b.slug == brand.slug) {
            return Err(StoreError::UniqueViolation("brands_slug_unique".to_string()));
        }
        let id = tables.next_id();
        let created = Brand {
            id,
            name: brand.name,
            slug: brand.slug,
            url: brand.url,
            description: brand.description,
            is_visible: brand.is_visible,
            created_at: now(),
            updated_at: now(),
        };
        tables.brands.insert(id, created.clone());
        Ok(created)
    }

    fn update_brand(&self, id: i32, changes: BrandChanges) -> StoreResult<Brand> {
        let mut tables = self.lock()?;
        let brand = tables.brands.get_mut(&id).ok_or(StoreError::NotFound)?;
        brand.name = changes.name;
        brand.url = changes.url;
        brand.description = changes.description;
        brand.is_visible = changes.is_visible;
        brand.updated_at = now();
        Ok(brand.clone())
    }

    fn delete_brand(&self, id: i32) -> StoreResult<()> {
        let mut tables = self.lock()?;
        if tables.brands.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        let orphans: Vec<i32> = tables
            .products
            .values()
            .filter(|p| p.brand_id == id)
            .map(|p| p.id)
            .collect();
        for product_id in orphans {
            tables.remove_product(product_id);
        }
        Ok(())
    }

    fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let tables = self.lock()?;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    fn get_category(&self, id: i32) -> StoreResult<Category> {
        self.lock()?.categories.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn create_category(&self, category: NewCategory) -> StoreResult<Category> {
        let mut tables = self.lock()?;
        if tables.categories.values().any(|c| c.slug == category.slug) {
            return Err(StoreError::UniqueViolation("categories_slug_unique".to_string()));
        }
        let id = tables.next_id();
        let created = Category {
            id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            is_visible: category.is_visible,
            created_at: now(),
            updated_at: now(),
        };
        tables.categories.insert(id, created.clone());
        Ok(created)
    }

    fn update_category(&self, id: i32, changes: CategoryChanges) -> StoreResult<Category> {
        let mut tables = self.lock()?;
        let category = tables.categories.get_mut(&id).ok_or(StoreError::NotFound)?;
        category.name = changes.name;
        category.description = changes.description;
        category.is_visible = changes.is_visible;
        category.updated_at = now();
        Ok(category.clone())
    }

    fn delete_category(&self, id: i32) -> StoreResult<()> {
        let mut tables = self.lock()?;
        if tables.categories.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        tables.category_product.retain(|&(category_id, _)| category_id != id);
        Ok(())
    }

    fn list_products(&self, filter: &ProductFilter) -> StoreResult<(Vec<ProductWithBrand>, i64)> {
        let tables = self.lock()?;
        let mut rows: Vec<ProductWithBrand> = tables
            .products
            .values()
            .filter(|p| {
                filter
                    .category_id
                    .map_or(true, |category_id| tables.category_product.contains(&(category_id, p.id)))
            })
            .map(|p| tables.with_brand(p))
            .filter(|row| {
                filter
                    .search
                    .as_deref()
                    .map_or(true, |term| matches_search(row, term, &filter.search_columns))
            })
            .collect();

        if let Some((column, direction)) = filter.sort {
            rows.sort_by(|a, b| {
                let ordering = compare(a, b, column);
                let ordering = match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                ordering.then(a.product.id.cmp(&b.product.id))
            });
        }

        let total = rows.len() as i64;
        let items = rows
            .into_iter()
            .skip(filter.offset().max(0) as usize)
            .take(filter.per_page.max(0) as usize)
            .collect();
        Ok((items, total))
    }

    fn get_product(&self, id: i32) -> StoreResult<ProductWithBrand> {
        let tables = self.lock()?;
        let product = tables.products.get(&id).ok_or(StoreError::NotFound)?;
        Ok(tables.with_brand(product))
    }

    fn create_product(&self, product: NewProduct, category_id: Option<i32>) -> StoreResult<Product> {
        let mut tables = self.lock()?;
        tables.check_product_constraints(Some(&product.slug), &product.sku, product.brand_id, None)?;
        if let Some(category_id) = category_id {
            if !tables.categories.contains_key(&category_id) {
                return Err(StoreError::ForeignKeyViolation);
            }
        }

        let id = tables.next_id();
        let created = Product {
            id,
            name: product.name,
            slug: product.slug,
            description: product.description,
            image: product.image,
            is_visible: product.is_visible,
            is_featured: product.is_featured,
            brand_id: product.brand_id,
            sku: product.sku,
            quantity: product.quantity,
            price: product.price,
            product_type: product.product_type,
            published_at: product.published_at,
            created_at: now(),
            updated_at: now(),
        };
        tables.products.insert(id, created.clone());
        if let Some(category_id) = category_id {
            tables.category_product.insert((category_id, id));
        }
        Ok(created)
    }

    fn update_product(&self, id: i32, changes: ProductChanges) -> StoreResult<Product> {
        let mut tables = self.lock()?;
        if !tables.products.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        tables.check_product_constraints(None, &changes.sku, changes.brand_id, Some(id))?;

        let product = tables.products.get_mut(&id).ok_or(StoreError::NotFound)?;
        product.name = changes.name;
        product.description = changes.description;
        product.image = changes.image;
        product.is_visible = changes.is_visible;
        product.is_featured = changes.is_featured;
        product.brand_id = changes.brand_id;
        product.sku = changes.sku;
        product.quantity = changes.quantity;
        product.price = changes.price;
        product.product_type = changes.product_type;
        product.published_at = changes.published_at;
        product.updated_at = now();
        Ok(product.clone())
    }

    fn delete_product(&self, id: i32) -> StoreResult<()> {
        if self.lock()?.remove_product(id) {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn delete_products(&self, ids: &[i32]) -> StoreResult<usize> {
        let mut tables = self.lock()?;
        Ok(ids.iter().filter(|&&id| tables.remove_product(id)).count())
    }

    fn is_taken(&self, column: UniqueColumn, value: &str, ignore_id: Option<i32>) -> StoreResult<bool> {
        let tables = self.lock()?;
        let keep = |id: i32| Some(id) != ignore_id;
        let taken = match column {
            UniqueColumn::ProductName => tables.products.values().any(|p| keep(p.id) && p.name == value),
            UniqueColumn::ProductSlug => tables.products.values().any(|p| keep(p.id) && p.slug == value),
            UniqueColumn::ProductSku => tables.products.values().any(|p| keep(p.id) && p.sku == value),
            UniqueColumn::BrandName => tables.brands.values().any(|b| keep(b.id) && b.name == value),
            UniqueColumn::BrandSlug => tables.brands.values().any(|b| keep(b.id) && b.slug == value),
            UniqueColumn::CategoryName => tables.categories.values().any(|c| keep(c.id) && c.name == value),
            UniqueColumn::CategorySlug => tables.categories.values().any(|c| keep(c.id) && c.slug == value),
        };
        Ok(taken)
    }

    fn category_has_product(&self, category_id: i32, product_id: i32) -> StoreResult<bool> {
        Ok(self.lock()?.category_product.contains(&(category_id, product_id)))
    }

    fn attach_product(&self, category_id: i32, product_id: i32) -> StoreResult<()> {
        let mut tables = self.lock()?;
        if !tables.categories.contains_key(&category_id) || !tables.products.contains_key(&product_id) {
            return Err(StoreError::ForeignKeyViolation);
        }
        tables.category_product.insert((category_id, product_id));
        Ok(())
    }

    fn detach_product(&self, category_id: i32, product_id: i32) -> StoreResult<()> {
        if self.lock()?.category_product.remove(&(category_id, product_id)) {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }
}

impl AccountStore for MemoryStore {
    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.lock()?.users.values().find(|u| u.email == email).cloned())
    }

    fn get_user(&self, id: i32) -> StoreResult<User> {
        self.lock()?.users.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_unique".to_string()));
        }
        let id = tables.next_id();
        let created = User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now(),
            updated_at: now(),
        };
        tables.users.insert(id, created.clone());
        Ok(created)
    }

    fn create_session(&self, session: NewAdminSession) -> StoreResult<AdminSession> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&session.user_id) {
            return Err(StoreError::ForeignKeyViolation);
        }
        let created = AdminSession {
            token: session.token,
            user_id: session.user_id,
            csrf_token: session.csrf_token,
            expires_at: session.expires_at,
            created_at: now(),
        };
        tables.sessions.insert(created.token.clone(), created.clone());
        Ok(created)
    }

    fn find_session(&self, token: &str) -> StoreResult<Option<AdminSession>> {
        Ok(self.lock()?.sessions.get(token).cloned())
    }

    fn touch_session(&self, token: &str, expires_at: NaiveDateTime) -> StoreResult<()> {
        if let Some(session) = self.lock()?.sessions.get_mut(token) {
            session.expires_at = expires_at;
        }
        Ok(())
    }

    fn delete_session(&self, token: &str) -> StoreResult<()> {
        self.lock()?.sessions.remove(token);
        Ok(())
    }

    fn purge_expired_sessions(&self, now: NaiveDateTime) -> StoreResult<usize> {
        let mut tables = self.lock()?;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, session| session.expires_at > now);
        Ok(before - tables.sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn brand(store: &MemoryStore, name: &str) -> Brand {
        store
            .create_brand(NewBrand {
                name: name.to_string(),
                slug: crate::slug::slugify(name),
                url: None,
                description: None,
                is_visible: true,
            })
            .unwrap()
    }

    fn product(name: &str, sku: &str, brand_id: i32, price: i64, quantity: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            slug: crate::slug::slugify(name),
            description: None,
            image: None,
            is_visible: true,
            is_featured: false,
            brand_id,
            sku: sku.to_string(),
            quantity,
            price: Decimal::from(price),
            product_type: ProductType::Deliverable,
            published_at: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    #[test]
    fn rejects_duplicate_sku_and_unknown_brand() {
        let store = MemoryStore::new();
        let acme = brand(&store, "Acme");
        store.create_product(product("Anvil", "A-1", acme.id, 10, 1), None).unwrap();

        let clash = store.create_product(product("Other", "A-1", acme.id, 10, 1), None);
        assert!(matches!(clash, Err(StoreError::UniqueViolation(_))));

        let orphan = store.create_product(product("Orphan", "O-1", 999, 10, 1), None);
        assert!(matches!(orphan, Err(StoreError::ForeignKeyViolation)));
    }

    #[test]
    fn deleting_a_brand_cascades_to_products_and_pivot() {
        let store = MemoryStore::new();
        let acme = brand(&store, "Acme");
        let category = store
            .create_category(NewCategory {
                name: "Tools".to_string(),
                slug: "tools".to_string(),
                description: None,
                is_visible: true,
            })
            .unwrap();
        let anvil = store
            .create_product(product("Anvil", "A-1", acme.id, 10, 1), Some(category.id))
            .unwrap();
        assert!(store.category_has_product(category.id, anvil.id).unwrap());

        store.delete_brand(acme.id).unwrap();

        assert!(matches!(store.get_product(anvil.id), Err(StoreError::NotFound)));
        assert!(!store.category_has_product(category.id, anvil.id).unwrap());
    }

    #[test]
    fn lists_with_search_sort_and_pages() {
        let store = MemoryStore::new();
        let acme = brand(&store, "Acme");
        let zeta = brand(&store, "Zeta");
        store.create_product(product("Anvil", "A-1", acme.id, 30, 5), None).unwrap();
        store.create_product(product("Bucket", "B-1", zeta.id, 10, 7), None).unwrap();
        store.create_product(product("Crate", "C-1", acme.id, 20, 9), None).unwrap();

        let filter = ProductFilter {
            sort: Some((ProductSortColumn::Price, SortDirection::Desc)),
            per_page: 2,
            ..Default::default()
        };
        let (page, total) = store.list_products(&filter).unwrap();
        assert_eq!(total, 3);
        let names: Vec<&str> = page.iter().map(|row| row.product.name.as_str()).collect();
        assert_eq!(names, vec!["Anvil", "Crate"]);

        let filter = ProductFilter {
            search: Some("zeta".to_string()),
            ..Default::default()
        };
        let (page, total) = store.list_products(&filter).unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].product.name, "Bucket");
        assert_eq!(page[0].brand_name, "Zeta");

        let filter = ProductFilter {
            search: Some("9".to_string()),
            ..Default::default()
        };
        let (page, _) = store.list_products(&filter).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].product.name, "Crate");

        let filter = ProductFilter {
            search: Some("zeta".to_string()),
            search_columns: vec![ProductSearchColumn::Name],
            ..Default::default()
        };
        assert_eq!(store.list_products(&filter).unwrap().1, 0);
    }

    #[test]
    fn uniqueness_checks_ignore_the_edited_record() {
        let store = MemoryStore::new();
        let acme = brand(&store, "Acme");
        let anvil = store.create_product(product("Anvil", "A-1", acme.id, 30, 5), None).unwrap();

        assert!(store.is_taken(UniqueColumn::ProductName, "Anvil", None).unwrap());
        assert!(!store.is_taken(UniqueColumn::ProductName, "Anvil", Some(anvil.id)).unwrap());
        assert!(store.is_taken(UniqueColumn::ProductSlug, "anvil", None).unwrap());
    }

    #[test]
    fn purging_keeps_live_sessions() {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                name: "Admin".to_string(),
                email: "admin@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .unwrap();
        let now = Utc::now().naive_utc();
        let sessions = [
            ("old", now - chrono::Duration::minutes(1)),
            ("live", now + chrono::Duration::minutes(5)),
        ];
        for (token, expires_at) in sessions {
            store
                .create_session(NewAdminSession {
                    token: token.to_string(),
                    user_id: user.id,
                    csrf_token: "csrf".to_string(),
                    expires_at,
                })
                .unwrap();
        }

        assert_eq!(store.purge_expired_sessions(now).unwrap(), 1);
        assert!(store.find_session("old").unwrap().is_none());
        assert!(store.find_session("live").unwrap().is_some());
    }
}
