use chrono::{NaiveDateTime, Utc};
use diesel::dsl::{sql, InnerJoin, InnerJoinQuerySource, IntoBoxed};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use rust_decimal::Decimal;

use crate::db::connection::{PgPool, PgPooledConnection};
use crate::db::models::*;
use crate::db::schema::*;
use crate::db::store::{AccountStore, CatalogStore, StoreError, StoreResult, UniqueColumn};
use crate::models::{ProductFilter, ProductSearchColumn, ProductSortColumn, SortDirection};

type ProductsWithBrands = InnerJoin<products::table, brands::table>;
type BoxedProductQuery = IntoBoxed<'static, ProductsWithBrands, Pg>;

type ProductPredicate = Box<dyn BoxableExpression<InnerJoinQuerySource<products::table, brands::table>, Pg, SqlType = Bool>>;

/// Condition for one searchable column, or `None` when the term cannot
/// match it (a word against a numeric column).
fn column_matches(column: ProductSearchColumn, term: &str) -> Option<ProductPredicate> {
    let pattern = format!("%{}%", term);
    match column {
        ProductSearchColumn::Name => Some(Box::new(products::name.ilike(pattern))),
        ProductSearchColumn::BrandName => Some(Box::new(brands::name.ilike(pattern))),
        ProductSearchColumn::Price => term
            .parse::<Decimal>()
            .ok()
            .map(|price| Box::new(products::price.eq(price)) as ProductPredicate),
        ProductSearchColumn::Quantity => term
            .parse::<i64>()
            .ok()
            .map(|quantity| Box::new(products::quantity.eq(quantity)) as ProductPredicate),
    }
}

/// Products joined with brands, narrowed by the search term and category
/// scope. Unordered so that it can also be counted.
fn filtered_products(filter: &ProductFilter) -> BoxedProductQuery {
    let mut query = products::table.inner_join(brands::table).into_boxed();

    if let Some(term) = &filter.search {
        let matched = filter
            .search_columns
            .iter()
            .filter_map(|column| column_matches(*column, term))
            .reduce(|any, next| Box::new(any.or(next)) as ProductPredicate);
        query = match matched {
            Some(predicate) => query.filter(predicate),
            None => query.filter(sql::<Bool>("FALSE")),
        };
    }

    if let Some(category_id) = filter.category_id {
        query = query.filter(
            products::id.eq_any(
                category_product::table
                    .filter(category_product::category_id.eq(category_id))
                    .select(category_product::product_id),
            ),
        );
    }

    query
}

fn sorted(query: BoxedProductQuery, sort: Option<(ProductSortColumn, SortDirection)>) -> BoxedProductQuery {
    let query = match sort {
        Some((ProductSortColumn::Name, SortDirection::Asc)) => query.order(products::name.asc()),
        Some((ProductSortColumn::Name, SortDirection::Desc)) => query.order(products::name.desc()),
        Some((ProductSortColumn::BrandName, SortDirection::Asc)) => query.order(brands::name.asc()),
        Some((ProductSortColumn::BrandName, SortDirection::Desc)) => query.order(brands::name.desc()),
        Some((ProductSortColumn::Price, SortDirection::Asc)) => query.order(products::price.asc()),
        Some((ProductSortColumn::Price, SortDirection::Desc)) => query.order(products::price.desc()),
        Some((ProductSortColumn::Quantity, SortDirection::Asc)) => query.order(products::quantity.asc()),
        Some((ProductSortColumn::Quantity, SortDirection::Desc)) => query.order(products::quantity.desc()),
        Some((ProductSortColumn::PublishedAt, SortDirection::Asc)) => query.order(products::published_at.asc()),
        Some((ProductSortColumn::PublishedAt, SortDirection::Desc)) => query.order(products::published_at.desc()),
        None => query,
    };
    query.then_order_by(products::id.asc())
}

pub fn list_products(conn: &mut PgConnection, filter: &ProductFilter) -> QueryResult<(Vec<ProductWithBrand>, i64)> {
    let total: i64 = filtered_products(filter).count().get_result(conn)?;

    let rows = sorted(filtered_products(filter), filter.sort)
        .select((Product::as_select(), brands::name))
        .limit(filter.per_page)
        .offset(filter.offset())
        .load::<(Product, String)>(conn)?;

    let items = rows
        .into_iter()
        .map(|(product, brand_name)| ProductWithBrand { product, brand_name })
        .collect();
    Ok((items, total))
}

pub fn get_product(conn: &mut PgConnection, id: i32) -> QueryResult<ProductWithBrand> {
    let (product, brand_name) = products::table
        .inner_join(brands::table)
        .filter(products::id.eq(id))
        .select((Product::as_select(), brands::name))
        .first::<(Product, String)>(conn)?;
    Ok(ProductWithBrand { product, brand_name })
}

pub fn create_product(conn: &mut PgConnection, new_product: NewProduct, category_id: Option<i32>) -> QueryResult<Product> {
    conn.transaction(|conn| {
        let product = diesel::insert_into(products::table)
            .values(&new_product)
            .returning(Product::as_returning())
            .get_result(conn)?;

        if let Some(category_id) = category_id {
            diesel::insert_into(category_product::table)
                .values(CategoryProduct { category_id, product_id: product.id })
                .execute(conn)?;
        }

        Ok(product)
    })
}

pub fn update_product(conn: &mut PgConnection, id: i32, changes: ProductChanges) -> QueryResult<Product> {
    diesel::update(products::table.find(id))
        .set((changes, products::updated_at.eq(now())))
        .returning(Product::as_returning())
        .get_result(conn)
}

pub fn delete_product(conn: &mut PgConnection, id: i32) -> QueryResult<usize> {
    diesel::delete(products::table.find(id)).execute(conn)
}

pub fn delete_products(conn: &mut PgConnection, ids: &[i32]) -> QueryResult<usize> {
    diesel::delete(products::table.filter(products::id.eq_any(ids))).execute(conn)
}

pub fn create_brand(conn: &mut PgConnection, new_brand: NewBrand) -> QueryResult<Brand> {
    diesel::insert_into(brands::table)
        .values(&new_brand)
        .returning(Brand::as_returning())
        .get_result(conn)
}

pub fn get_brand(conn: &mut PgConnection, id: i32) -> QueryResult<Brand> {
    brands::table.find(id).select(Brand::as_select()).first(conn)
}

pub fn update_brand(conn: &mut PgConnection, id: i32, changes: BrandChanges) -> QueryResult<Brand> {
    diesel::update(brands::table.find(id))
        .set((changes, brands::updated_at.eq(now())))
        .returning(Brand::as_returning())
        .get_result(conn)
}

pub fn delete_brand(conn: &mut PgConnection, id: i32) -> QueryResult<usize> {
    diesel::delete(brands::table.find(id)).execute(conn)
}

pub fn get_all_brands(conn: &mut PgConnection) -> QueryResult<Vec<Brand>> {
    brands::table.order(brands::name.asc()).select(Brand::as_select()).load(conn)
}

pub fn create_category(conn: &mut PgConnection, new_category: NewCategory) -> QueryResult<Category> {
    diesel::insert_into(categories::table)
        .values(&new_category)
        .returning(Category::as_returning())
        .get_result(conn)
}

pub fn get_category(conn: &mut PgConnection, id: i32) -> QueryResult<Category> {
    categories::table.find(id).select(Category::as_select()).first(conn)
}

pub fn update_category(conn: &mut PgConnection, id: i32, changes: CategoryChanges) -> QueryResult<Category> {
    diesel::update(categories::table.find(id))
        .set((changes, categories::updated_at.eq(now())))
        .returning(Category::as_returning())
        .get_result(conn)
}

pub fn delete_category(conn: &mut PgConnection, id: i32) -> QueryResult<usize> {
    diesel::delete(categories::table.find(id)).execute(conn)
}

pub fn get_all_categories(conn: &mut PgConnection) -> QueryResult<Vec<Category>> {
    categories::table.order(categories::name.asc()).select(Category::as_select()).load(conn)
}

pub fn category_has_product(conn: &mut PgConnection, category_id: i32, product_id: i32) -> QueryResult<bool> {
    category_product::table
        .find((category_id, product_id))
        .select(category_product::product_id)
        .first::<i32>(conn)
        .optional()
        .map(|found| found.is_some())
}

pub fn attach_product(conn: &mut PgConnection, category_id: i32, product_id: i32) -> QueryResult<usize> {
    diesel::insert_into(category_product::table)
        .values(CategoryProduct { category_id, product_id })
        .on_conflict_do_nothing()
        .execute(conn)
}

pub fn detach_product(conn: &mut PgConnection, category_id: i32, product_id: i32) -> QueryResult<usize> {
    diesel::delete(category_product::table.find((category_id, product_id))).execute(conn)
}

macro_rules! taken {
    ($conn:expr, $table:ident, $column:ident, $value:expr, $ignore:expr) => {{
        let mut query = $table::table
            .filter($table::$column.eq($value))
            .select($table::id)
            .into_boxed();
        if let Some(id) = $ignore {
            query = query.filter($table::id.ne(id));
        }
        query.first::<i32>($conn).optional().map(|found| found.is_some())
    }};
}

pub fn is_taken(conn: &mut PgConnection, column: UniqueColumn, value: &str, ignore_id: Option<i32>) -> QueryResult<bool> {
    match column {
        UniqueColumn::ProductName => taken!(conn, products, name, value, ignore_id),
        UniqueColumn::ProductSlug => taken!(conn, products, slug, value, ignore_id),
        UniqueColumn::ProductSku => taken!(conn, products, sku, value, ignore_id),
        UniqueColumn::BrandName => taken!(conn, brands, name, value, ignore_id),
        UniqueColumn::BrandSlug => taken!(conn, brands, slug, value, ignore_id),
        UniqueColumn::CategoryName => taken!(conn, categories, name, value, ignore_id),
        UniqueColumn::CategorySlug => taken!(conn, categories, slug, value, ignore_id),
    }
}

pub fn find_user_by_email(conn: &mut PgConnection, email: &str) -> QueryResult<Option<User>> {
    users::table
        .filter(users::email.eq(email))
        .select(User::as_select())
        .first(conn)
        .optional()
}

pub fn create_session(conn: &mut PgConnection, session: NewAdminSession) -> QueryResult<AdminSession> {
    diesel::insert_into(admin_sessions::table)
        .values(&session)
        .returning(AdminSession::as_returning())
        .get_result(conn)
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn expect_one(affected: usize) -> StoreResult<()> {
    if affected == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}

/// Diesel-backed store over a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> StoreResult<PgPooledConnection> {
        Ok(self.pool.get()?)
    }
}

impl CatalogStore for PgStore {
    fn list_brands(&self) -> StoreResult<Vec<Brand>> {
        Ok(get_all_brands(&mut *self.conn()?)?)
    }

    fn get_brand(&self, id: i32) -> StoreResult<Brand> {
        Ok(get_brand(&mut *self.conn()?, id)?)
    }

    fn create_brand(&self, brand: NewBrand) -> StoreResult<Brand> {
        Ok(create_brand(&mut *self.conn()?, brand)?)
    }

    fn update_brand(&self, id: i32, changes: BrandChanges) -> StoreResult<Brand> {
        Ok(update_brand(&mut *self.conn()?, id, changes)?)
    }

    fn delete_brand(&self, id: i32) -> StoreResult<()> {
        expect_one(delete_brand(&mut *self.conn()?, id)?)
    }

    fn list_categories(&self) -> StoreResult<Vec<Category>> {
        Ok(get_all_categories(&mut *self.conn()?)?)
    }

    fn get_category(&self, id: i32) -> StoreResult<Category> {
        Ok(get_category(&mut *self.conn()?, id)?)
    }

    fn create_category(&self, category: NewCategory) -> StoreResult<Category> {
        Ok(create_category(&mut *self.conn()?, category)?)
    }

    fn update_category(&self, id: i32, changes: CategoryChanges) -> StoreResult<Category> {
        Ok(update_category(&mut *self.conn()?, id, changes)?)
    }

    fn delete_category(&self, id: i32) -> StoreResult<()> {
        expect_one(delete_category(&mut *self.conn()?, id)?)
    }

    fn list_products(&self, filter: &ProductFilter) -> StoreResult<(Vec<ProductWithBrand>, i64)> {
        Ok(list_products(&mut *self.conn()?, filter)?)
    }

    fn get_product(&self, id: i32) -> StoreResult<ProductWithBrand> {
        Ok(get_product(&mut *self.conn()?, id)?)
    }

    fn create_product(&self, product: NewProduct, category_id: Option<i32>) -> StoreResult<Product> {
        Ok(create_product(&mut *self.conn()?, product, category_id)?)
    }

    fn update_product(&self, id: i32, changes: ProductChanges) -> StoreResult<Product> {
        Ok(update_product(&mut *self.conn()?, id, changes)?)
    }

    fn delete_product(&self, id: i32) -> StoreResult<()> {
        expect_one(delete_product(&mut *self.conn()?, id)?)
    }

    fn delete_products(&self, ids: &[i32]) -> StoreResult<usize> {
        Ok(delete_products(&mut *self.conn()?, ids)?)
    }

    fn is_taken(&self, column: UniqueColumn, value: &str, ignore_id: Option<i32>) -> StoreResult<bool> {
        Ok(is_taken(&mut *self.conn()?, column, value, ignore_id)?)
    }

    fn category_has_product(&self, category_id: i32, product_id: i32) -> StoreResult<bool> {
        Ok(category_has_product(&mut *self.conn()?, category_id, product_id)?)
    }

    fn attach_product(&self, category_id: i32, product_id: i32) -> StoreResult<()> {
        attach_product(&mut *self.conn()?, category_id, product_id)?;
        Ok(())
    }

    fn detach_product(&self, category_id: i32, product_id: i32) -> StoreResult<()> {
        expect_one(detach_product(&mut *self.conn()?, category_id, product_id)?)
    }
}

impl AccountStore for PgStore {
    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(find_user_by_email(&mut *self.conn()?, email)?)
    }

    fn get_user(&self, id: i32) -> StoreResult<User> {
        let conn = &mut *self.conn()?;
        Ok(users::table.find(id).select(User::as_select()).first(conn)?)
    }

    fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let conn = &mut *self.conn()?;
        Ok(diesel::insert_into(users::table)
            .values(&user)
            .returning(User::as_returning())
            .get_result(conn)?)
    }

    fn create_session(&self, session: NewAdminSession) -> StoreResult<AdminSession> {
        Ok(create_session(&mut *self.conn()?, session)?)
    }

    fn find_session(&self, token: &str) -> StoreResult<Option<AdminSession>> {
        let conn = &mut *self.conn()?;
        Ok(admin_sessions::table
            .find(token)
            .select(AdminSession::as_select())
            .first(conn)
            .optional()?)
    }

    fn touch_session(&self, token: &str, expires_at: NaiveDateTime) -> StoreResult<()> {
        let conn = &mut *self.conn()?;
        diesel::update(admin_sessions::table.find(token))
            .set(admin_sessions::expires_at.eq(expires_at))
            .execute(conn)?;
        Ok(())
    }

    fn delete_session(&self, token: &str) -> StoreResult<()> {
        let conn = &mut *self.conn()?;
        diesel::delete(admin_sessions::table.find(token)).execute(conn)?;
        Ok(())
    }

    fn purge_expired_sessions(&self, now: NaiveDateTime) -> StoreResult<usize> {
        let conn = &mut *self.conn()?;
        Ok(diesel::delete(admin_sessions::table.filter(admin_sessions::expires_at.le(now))).execute(conn)?)
    }
}
