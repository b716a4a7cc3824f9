use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::json;

use super::blocking;
use crate::auth::{AdminUser, UserSummary, LOGIN_PATH};
use crate::error::AppError;
use crate::models::{ProductFilter, ProductSearchColumn, ProductSortColumn, SearchQuery, SortDirection};
use crate::panel;
use crate::resources;
use crate::state::AppState;

/// Hits per resource in global search.
pub const SEARCH_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
struct SearchHit {
    id: i32,
    title: String,
    url: String,
}

#[derive(Debug, Serialize)]
struct SearchGroup {
    resource: &'static str,
    label: &'static str,
    hits: Vec<SearchHit>,
}

/// `GET /admin`: the panel for a signed-in admin, the login page otherwise.
pub async fn home(admin: Option<AdminUser>) -> HttpResponse {
    match admin {
        Some(admin) => HttpResponse::Ok().json(json!({
            "panel": panel::config(),
            "user": UserSummary::from(&admin.user),
            "csrf_token": admin.session.csrf_token,
        })),
        None => HttpResponse::Found().insert_header(("Location", LOGIN_PATH)).finish(),
    }
}

pub async fn show_panel(_admin: AdminUser) -> HttpResponse {
    HttpResponse::Ok().json(panel::config())
}

pub async fn dashboard(admin: AdminUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "widgets": [
            { "type": "account", "user": UserSummary::from(&admin.user) },
            {
                "type": "info",
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
        ]
    }))
}

pub async fn resource_schema(_admin: AdminUser, slug: web::Path<String>) -> Result<HttpResponse, AppError> {
    let resource = resources::find(&slug).ok_or(AppError::NotFound("resource"))?;
    Ok(HttpResponse::Ok().json(resource))
}

fn matches(title: &str, needle: &str) -> bool {
    title.to_lowercase().contains(needle)
}

fn record_url(resource: &str, id: i32) -> String {
    format!("/{}/{}/{}/edit", panel::PANEL_PATH, resource, id)
}

/// Global search by record title across every resource.
pub async fn search(
    state: web::Data<AppState>,
    _admin: AdminUser,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
    let term = query.into_inner().q.map(|q| q.trim().to_lowercase()).unwrap_or_default();
    if term.is_empty() {
        return Ok(HttpResponse::Ok().json(json!({ "results": [] })));
    }

    let catalog = state.catalog.clone();
    let groups = blocking(move || {
        let filter = ProductFilter {
            search: Some(term.clone()),
            search_columns: vec![ProductSearchColumn::Name],
            sort: Some((ProductSortColumn::Name, SortDirection::Asc)),
            per_page: SEARCH_LIMIT as i64,
            ..ProductFilter::default()
        };
        let (products, _) = catalog.list_products(&filter)?;
        let product_hits: Vec<SearchHit> = products
            .into_iter()
            .map(|item| SearchHit {
                id: item.product.id,
                url: record_url("products", item.product.id),
                title: item.product.name,
            })
            .collect();

        let category_hits: Vec<SearchHit> = catalog
            .list_categories()?
            .into_iter()
            .filter(|category| matches(&category.name, &term))
            .take(SEARCH_LIMIT)
            .map(|category| SearchHit {
                id: category.id,
                url: record_url("categories", category.id),
                title: category.name,
            })
            .collect();

        let brand_hits: Vec<SearchHit> = catalog
            .list_brands()?
            .into_iter()
            .filter(|brand| matches(&brand.name, &term))
            .take(SEARCH_LIMIT)
            .map(|brand| SearchHit {
                id: brand.id,
                url: record_url("brands", brand.id),
                title: brand.name,
            })
            .collect();

        Ok(vec![
            ("products", product_hits),
            ("categories", category_hits),
            ("brands", brand_hits),
        ])
    })
    .await?;

    let results: Vec<SearchGroup> = groups
        .into_iter()
        .filter(|(_, hits)| !hits.is_empty())
        .filter_map(|(slug, hits)| {
            resources::find(slug).map(|resource| SearchGroup {
                resource: resource.slug,
                label: resource.plural_label,
                hits,
            })
        })
        .collect();
    Ok(HttpResponse::Ok().json(json!({ "results": results })))
}
