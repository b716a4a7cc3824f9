use actix_web::{web, HttpResponse};
use log::info;

use super::{blocking, today};
use crate::auth::AdminUser;
use crate::error::AppError;
use crate::models::{BulkDeleteRequest, BulkDeleteResponse, PaginatedResponse, ProductForm, ProductQuery};
use crate::state::AppState;
use crate::validation::{validate_new_product, validate_product_changes};

pub async fn list_products(
    state: web::Data<AppState>,
    _admin: AdminUser,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = query.into_inner().into_filter(None);
    let catalog = state.catalog.clone();
    let (page, per_page) = (filter.page, filter.per_page);
    let (items, total) = blocking(move || Ok(catalog.list_products(&filter)?)).await?;
    Ok(HttpResponse::Ok().json(PaginatedResponse::new(items, total, page, per_page)))
}

pub async fn get_product(
    state: web::Data<AppState>,
    _admin: AdminUser,
    id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    let catalog = state.catalog.clone();
    let product = blocking(move || Ok(catalog.get_product(id)?)).await?;
    Ok(HttpResponse::Ok().json(product))
}

pub async fn create_product(
    state: web::Data<AppState>,
    admin: AdminUser,
    form: web::Json<ProductForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let catalog = state.catalog.clone();
    let product = blocking(move || {
        let new_product = validate_new_product(catalog.as_ref(), &form, today())?;
        let created = catalog.create_product(new_product, None)?;
        Ok(catalog.get_product(created.id)?)
    })
    .await?;

    info!("{} created product {} ({})", admin.user.email, product.product.id, product.product.slug);
    Ok(HttpResponse::Created().json(product))
}

pub async fn update_product(
    state: web::Data<AppState>,
    admin: AdminUser,
    id: web::Path<i32>,
    form: web::Json<ProductForm>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    let form = form.into_inner();
    let catalog = state.catalog.clone();
    let product = blocking(move || {
        catalog.get_product(id)?;
        let changes = validate_product_changes(catalog.as_ref(), id, &form, today())?;
        catalog.update_product(id, changes)?;
        Ok(catalog.get_product(id)?)
    })
    .await?;

    info!("{} updated product {}", admin.user.email, id);
    Ok(HttpResponse::Ok().json(product))
}

pub async fn delete_product(
    state: web::Data<AppState>,
    admin: AdminUser,
    id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    let catalog = state.catalog.clone();
    blocking(move || Ok(catalog.delete_product(id)?)).await?;

    info!("{} deleted product {}", admin.user.email, id);
    Ok(HttpResponse::NoContent().finish())
}

pub async fn bulk_delete_products(
    state: web::Data<AppState>,
    admin: AdminUser,
    body: web::Json<BulkDeleteRequest>,
) -> Result<HttpResponse, AppError> {
    let ids = body.into_inner().ids;
    let catalog = state.catalog.clone();
    let deleted = blocking(move || Ok(catalog.delete_products(&ids)?)).await?;

    info!("{} bulk-deleted {} products", admin.user.email, deleted);
    Ok(HttpResponse::Ok().json(BulkDeleteResponse { deleted }))
}
