use serde::{Deserialize, Serialize};

use crate::resources::{self, TableSchema};

pub const PER_PAGE_OPTIONS: [i64; 4] = [5, 10, 25, 50];
pub const DEFAULT_PER_PAGE: i64 = 10;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, page_size: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total + page_size - 1) / page_size
        } else {
            0
        };
        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }
}

/// Raw list-view query string: `?search=&sort=&direction=&page=&per_page=`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortColumn {
    Name,
    BrandName,
    Price,
    Quantity,
    PublishedAt,
}

impl ProductSortColumn {
    pub fn from_column(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "brand.name" => Some(Self::BrandName),
            "price" => Some(Self::Price),
            "quantity" => Some(Self::Quantity),
            "published_at" => Some(Self::PublishedAt),
            _ => None,
        }
    }
}

/// Product columns a search term can match. Text columns match by
/// case-insensitive substring, numeric ones by equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSearchColumn {
    Name,
    BrandName,
    Price,
    Quantity,
}

impl ProductSearchColumn {
    pub const ALL: [Self; 4] = [Self::Name, Self::BrandName, Self::Price, Self::Quantity];

    pub fn from_column(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "brand.name" => Some(Self::BrandName),
            "price" => Some(Self::Price),
            "quantity" => Some(Self::Quantity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// A validated list query, ready for a store.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub search_columns: Vec<ProductSearchColumn>,
    pub sort: Option<(ProductSortColumn, SortDirection)>,
    pub category_id: Option<i32>,
    pub page: i64,
    pub per_page: i64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            search: None,
            search_columns: ProductSearchColumn::ALL.to_vec(),
            sort: None,
            category_id: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ProductFilter {
    /// Rows to skip; saturates so that absurd page numbers yield an empty page.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).max(0).saturating_mul(self.per_page)
    }
}

impl ProductQuery {
    /// Unknown sort columns, directions and page sizes fall back to the
    /// list view defaults instead of failing the request.
    pub fn into_filter(self, category_id: Option<i32>) -> ProductFilter {
        self.into_filter_for(&resources::products::table(), category_id)
    }

    pub fn into_filter_for(self, table: &TableSchema, category_id: Option<i32>) -> ProductFilter {
        let direction = match self.direction.as_deref() {
            Some("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        let sort = self
            .sort
            .as_deref()
            .filter(|name| table.is_sortable(name))
            .and_then(ProductSortColumn::from_column)
            .map(|column| (column, direction));
        let search_columns: Vec<ProductSearchColumn> = table
            .searchable_columns()
            .into_iter()
            .filter_map(ProductSearchColumn::from_column)
            .collect();
        let search = self
            .search
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty() && !search_columns.is_empty());
        let per_page = self
            .per_page
            .filter(|n| PER_PAGE_OPTIONS.contains(n))
            .unwrap_or(DEFAULT_PER_PAGE);
        ProductFilter {
            search,
            search_columns,
            sort,
            category_id,
            page: self.page.unwrap_or(1).max(1),
            per_page,
        }
    }
}

/// Accepts either a JSON number or a numeric string, the way form inputs arrive.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum NumericInput {
    Number(serde_json::Number),
    Text(String),
}

impl NumericInput {
    pub fn as_text(&self) -> String {
        match self {
            NumericInput::Number(n) => n.to_string(),
            NumericInput::Text(s) => s.trim().to_string(),
        }
    }
}

/// Product create/edit form. Every field is optional here so that missing
/// input turns into a field-level validation message.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct ProductForm {
    // Informations
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    // Prix et inventaire
    pub sku: Option<String>,
    pub price: Option<NumericInput>,
    pub quantity: Option<NumericInput>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    // Autres infos
    pub is_visible: Option<bool>,
    pub is_featured: Option<bool>,
    pub published_at: Option<String>,
    pub brand_id: Option<NumericInput>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct BrandForm {
    pub name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub is_visible: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct CategoryForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_visible: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BulkDeleteResponse {
    pub deleted: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AttachProductRequest {
    pub product_id: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SelectOption {
    pub value: i32,
    pub label: String,
}
