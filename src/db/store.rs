use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::db::models::*;
use crate::models::ProductFilter;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("unique constraint `{0}` violated")]
    UniqueViolation(String),

    #[error("referenced record does not exist")]
    ForeignKeyViolation,

    #[error("connection pool error")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("database error")]
    Query(#[source] DieselError),

    #[error("store lock poisoned")]
    Poisoned,
}

impl From<DieselError> for StoreError {
    fn from(error: DieselError) -> Self {
        match error {
            DieselError::NotFound => StoreError::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                StoreError::UniqueViolation(info.constraint_name().unwrap_or("unique").to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                StoreError::ForeignKeyViolation
            }
            other => StoreError::Query(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Columns whose values must be unique, checked before writes so that a
/// clash surfaces as a validation message rather than a constraint error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueColumn {
    ProductName,
    ProductSlug,
    ProductSku,
    BrandName,
    BrandSlug,
    CategoryName,
    CategorySlug,
}

pub trait CatalogStore: Send + Sync {
    fn list_brands(&self) -> StoreResult<Vec<Brand>>;
    fn get_brand(&self, id: i32) -> StoreResult<Brand>;
    fn create_brand(&self, brand: NewBrand) -> StoreResult<Brand>;
    fn update_brand(&self, id: i32, changes: BrandChanges) -> StoreResult<Brand>;
    /// Deletes the brand and, by cascade, its products.
    fn delete_brand(&self, id: i32) -> StoreResult<()>;

    fn list_categories(&self) -> StoreResult<Vec<Category>>;
    fn get_category(&self, id: i32) -> StoreResult<Category>;
    fn create_category(&self, category: NewCategory) -> StoreResult<Category>;
    fn update_category(&self, id: i32, changes: CategoryChanges) -> StoreResult<Category>;
    fn delete_category(&self, id: i32) -> StoreResult<()>;

    /// One page of products plus the total number of matching rows.
    fn list_products(&self, filter: &ProductFilter) -> StoreResult<(Vec<ProductWithBrand>, i64)>;
    fn get_product(&self, id: i32) -> StoreResult<ProductWithBrand>;
    /// Inserts the product and, when `category_id` is given, attaches it in
    /// the same transaction.
    fn create_product(&self, product: NewProduct, category_id: Option<i32>) -> StoreResult<Product>;
    fn update_product(&self, id: i32, changes: ProductChanges) -> StoreResult<Product>;
    fn delete_product(&self, id: i32) -> StoreResult<()>;
    fn delete_products(&self, ids: &[i32]) -> StoreResult<usize>;

    fn is_taken(&self, column: UniqueColumn, value: &str, ignore_id: Option<i32>) -> StoreResult<bool>;

    fn category_has_product(&self, category_id: i32, product_id: i32) -> StoreResult<bool>;
    fn attach_product(&self, category_id: i32, product_id: i32) -> StoreResult<()>;
    fn detach_product(&self, category_id: i32, product_id: i32) -> StoreResult<()>;
}

pub trait AccountStore: Send + Sync {
    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    fn get_user(&self, id: i32) -> StoreResult<User>;
    fn create_user(&self, user: NewUser) -> StoreResult<User>;

    fn create_session(&self, session: NewAdminSession) -> StoreResult<AdminSession>;
    fn find_session(&self, token: &str) -> StoreResult<Option<AdminSession>>;
    fn touch_session(&self, token: &str, expires_at: chrono::NaiveDateTime) -> StoreResult<()>;
    fn delete_session(&self, token: &str) -> StoreResult<()>;
    /// Drops every session that expired at or before `now`; returns how many.
    fn purge_expired_sessions(&self, now: chrono::NaiveDateTime) -> StoreResult<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        assert!(matches!(StoreError::from(DieselError::NotFound), StoreError::NotFound));
    }

    #[test]
    fn other_diesel_errors_are_wrapped() {
        let error = StoreError::from(DieselError::RollbackTransaction);
        assert!(matches!(error, StoreError::Query(_)));
    }
}
