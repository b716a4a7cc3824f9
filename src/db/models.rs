use std::fmt;
use std::io::Write;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::schema::{admin_sessions, brands, categories, category_product, products, users};

/// Fulfilment kind of a product, stored as `deliverable` / `downloadable`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    #[default]
    Deliverable,
    Downloadable,
}

impl ProductType {
    pub const ALL: [ProductType; 2] = [ProductType::Deliverable, ProductType::Downloadable];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Deliverable => "deliverable",
            ProductType::Downloadable => "downloadable",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown product type `{0}`")]
pub struct UnknownProductType(pub String);

impl FromStr for ProductType {
    type Err = UnknownProductType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "deliverable" => Ok(ProductType::Deliverable),
            "downloadable" => Ok(ProductType::Downloadable),
            other => Err(UnknownProductType(other.to_string())),
        }
    }
}

impl ToSql<Text, Pg> for ProductType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for ProductType {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let value = std::str::from_utf8(bytes.as_bytes())?;
        value.parse().map_err(Into::into)
    }
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = brands)]
#[diesel(check_for_backend(Pg))]
pub struct Brand {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub is_visible: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = brands)]
pub struct NewBrand {
    pub name: String,
    pub slug: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub is_visible: bool,
}

#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = brands)]
#[diesel(treat_none_as_null = true)]
pub struct BrandChanges {
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub is_visible: bool,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(Pg))]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_visible: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = categories)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_visible: bool,
}

#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = categories)]
#[diesel(treat_none_as_null = true)]
pub struct CategoryChanges {
    pub name: String,
    pub description: Option<String>,
    pub is_visible: bool,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(Pg))]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_visible: bool,
    pub is_featured: bool,
    pub brand_id: i32,
    pub sku: String,
    pub quantity: i64,
    pub price: Decimal,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub published_at: NaiveDate,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insert payload. `slug` is only ever written here.
#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_visible: bool,
    pub is_featured: bool,
    pub brand_id: i32,
    pub sku: String,
    pub quantity: i64,
    pub price: Decimal,
    pub product_type: ProductType,
    pub published_at: NaiveDate,
}

/// Edit payload. Carries every editable column and deliberately no slug.
#[derive(AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = products)]
#[diesel(treat_none_as_null = true)]
pub struct ProductChanges {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_visible: bool,
    pub is_featured: bool,
    pub brand_id: i32,
    pub sku: String,
    pub quantity: i64,
    pub price: Decimal,
    pub product_type: ProductType,
    pub published_at: NaiveDate,
}

/// A product row joined with its brand's name, as shown in list views.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProductWithBrand {
    #[serde(flatten)]
    pub product: Product,
    pub brand_name: String,
}

#[derive(Insertable, Queryable, Debug, Clone, Copy, PartialEq, Eq)]
#[diesel(table_name = category_product)]
pub struct CategoryProduct {
    pub category_id: i32,
    pub product_id: i32,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(Pg))]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = admin_sessions)]
#[diesel(check_for_backend(Pg))]
pub struct AdminSession {
    pub token: String,
    pub user_id: i32,
    pub csrf_token: String,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = admin_sessions)]
pub struct NewAdminSession {
    pub token: String,
    pub user_id: i32,
    pub csrf_token: String,
    pub expires_at: NaiveDateTime,
}
