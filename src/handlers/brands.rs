use actix_web::{web, HttpResponse};
use log::info;

use super::blocking;
use crate::auth::AdminUser;
use crate::error::AppError;
use crate::models::{BrandForm, SelectOption};
use crate::state::AppState;
use crate::validation::{validate_brand_changes, validate_new_brand};

pub async fn list_brands(state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
    let catalog = state.catalog.clone();
    let brands = blocking(move || Ok(catalog.list_brands()?)).await?;
    Ok(HttpResponse::Ok().json(brands))
}

/// `{value, label}` pairs for the product form's brand select.
pub async fn brand_options(state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
    let catalog = state.catalog.clone();
    let brands = blocking(move || Ok(catalog.list_brands()?)).await?;
    let mut options: Vec<SelectOption> = brands
        .into_iter()
        .map(|brand| SelectOption {
            value: brand.id,
            label: brand.name,
        })
        .collect();
    options.sort_by(|a, b| a.label.cmp(&b.label));
    Ok(HttpResponse::Ok().json(options))
}

pub async fn get_brand(
    state: web::Data<AppState>,
    _admin: AdminUser,
    id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    let catalog = state.catalog.clone();
    let brand = blocking(move || Ok(catalog.get_brand(id)?)).await?;
    Ok(HttpResponse::Ok().json(brand))
}

pub async fn create_brand(
    state: web::Data<AppState>,
    admin: AdminUser,
    form: web::Json<BrandForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let catalog = state.catalog.clone();
    let brand = blocking(move || {
        let new_brand = validate_new_brand(catalog.as_ref(), &form)?;
        Ok(catalog.create_brand(new_brand)?)
    })
    .await?;

    info!("{} created brand {} ({})", admin.user.email, brand.id, brand.slug);
    Ok(HttpResponse::Created().json(brand))
}

pub async fn update_brand(
    state: web::Data<AppState>,
    admin: AdminUser,
    id: web::Path<i32>,
    form: web::Json<BrandForm>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    let form = form.into_inner();
    let catalog = state.catalog.clone();
    let brand = blocking(move || {
        catalog.get_brand(id)?;
        let changes = validate_brand_changes(catalog.as_ref(), id, &form)?;
        Ok(catalog.update_brand(id, changes)?)
    })
    .await?;

    info!("{} updated brand {}", admin.user.email, id);
    Ok(HttpResponse::Ok().json(brand))
}

/// Deleting a brand deletes its products with it.
pub async fn delete_brand(
    state: web::Data<AppState>,
    admin: AdminUser,
    id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    let catalog = state.catalog.clone();
    blocking(move || Ok(catalog.delete_brand(id)?)).await?;

    info!("{} deleted brand {}", admin.user.email, id);
    Ok(HttpResponse::NoContent().finish())
}
