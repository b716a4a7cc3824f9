//! Category CRUD plus the category's products relation manager.

use actix_web::{web, HttpResponse};
use log::info;

use super::{blocking, today};
use crate::auth::AdminUser;
use crate::db::CatalogStore;
use crate::error::AppError;
use crate::models::{
    AttachProductRequest, BulkDeleteRequest, BulkDeleteResponse, CategoryForm, PaginatedResponse, ProductForm,
    ProductQuery,
};
use crate::state::AppState;
use crate::validation::{
    validate_category_changes, validate_new_category, validate_new_product, validate_product_changes, ValidationErrors,
};

pub async fn list_categories(state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
    let catalog = state.catalog.clone();
    let categories = blocking(move || Ok(catalog.list_categories()?)).await?;
    Ok(HttpResponse::Ok().json(categories))
}

pub async fn get_category(
    state: web::Data<AppState>,
    _admin: AdminUser,
    id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    let catalog = state.catalog.clone();
    let category = blocking(move || Ok(catalog.get_category(id)?)).await?;
    Ok(HttpResponse::Ok().json(category))
}

pub async fn create_category(
    state: web::Data<AppState>,
    admin: AdminUser,
    form: web::Json<CategoryForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let catalog = state.catalog.clone();
    let category = blocking(move || {
        let new_category = validate_new_category(catalog.as_ref(), &form)?;
        Ok(catalog.create_category(new_category)?)
    })
    .await?;

    info!("{} created category {} ({})", admin.user.email, category.id, category.slug);
    Ok(HttpResponse::Created().json(category))
}

pub async fn update_category(
    state: web::Data<AppState>,
    admin: AdminUser,
    id: web::Path<i32>,
    form: web::Json<CategoryForm>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    let form = form.into_inner();
    let catalog = state.catalog.clone();
    let category = blocking(move || {
        catalog.get_category(id)?;
        let changes = validate_category_changes(catalog.as_ref(), id, &form)?;
        Ok(catalog.update_category(id, changes)?)
    })
    .await?;

    info!("{} updated category {}", admin.user.email, id);
    Ok(HttpResponse::Ok().json(category))
}

pub async fn delete_category(
    state: web::Data<AppState>,
    admin: AdminUser,
    id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    let catalog = state.catalog.clone();
    blocking(move || Ok(catalog.delete_category(id)?)).await?;

    info!("{} deleted category {}", admin.user.email, id);
    Ok(HttpResponse::NoContent().finish())
}

/// 404 unless the product is attached to the category.
fn ensure_attached(catalog: &dyn CatalogStore, category_id: i32, product_id: i32) -> Result<(), AppError> {
    catalog.get_category(category_id)?;
    if catalog.category_has_product(category_id, product_id)? {
        Ok(())
    } else {
        Err(AppError::NotFound("product"))
    }
}

pub async fn list_category_products(
    state: web::Data<AppState>,
    _admin: AdminUser,
    id: web::Path<i32>,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse, AppError> {
    let category_id = id.into_inner();
    let filter = query.into_inner().into_filter(Some(category_id));
    let (page, per_page) = (filter.page, filter.per_page);
    let catalog = state.catalog.clone();
    let (items, total) = blocking(move || {
        catalog.get_category(category_id)?;
        Ok(catalog.list_products(&filter)?)
    })
    .await?;
    Ok(HttpResponse::Ok().json(PaginatedResponse::new(items, total, page, per_page)))
}

/// Creates a product and attaches it to the category in one step.
pub async fn create_category_product(
    state: web::Data<AppState>,
    admin: AdminUser,
    id: web::Path<i32>,
    form: web::Json<ProductForm>,
) -> Result<HttpResponse, AppError> {
    let category_id = id.into_inner();
    let form = form.into_inner();
    let catalog = state.catalog.clone();
    let product = blocking(move || {
        catalog.get_category(category_id)?;
        let new_product = validate_new_product(catalog.as_ref(), &form, today())?;
        let created = catalog.create_product(new_product, Some(category_id))?;
        Ok(catalog.get_product(created.id)?)
    })
    .await?;

    info!(
        "{} created product {} in category {}",
        admin.user.email, product.product.id, category_id
    );
    Ok(HttpResponse::Created().json(product))
}

pub async fn attach_product(
    state: web::Data<AppState>,
    admin: AdminUser,
    id: web::Path<i32>,
    body: web::Json<AttachProductRequest>,
) -> Result<HttpResponse, AppError> {
    let category_id = id.into_inner();
    let product_id = body.product_id;
    let catalog = state.catalog.clone();
    let product = blocking(move || {
        catalog.get_category(category_id)?;
        let mut errors = ValidationErrors::default();
        let product = match catalog.get_product(product_id) {
            Ok(product) => Some(product),
            Err(crate::db::StoreError::NotFound) => {
                errors.add("product_id", "The selected product is invalid.");
                None
            }
            Err(other) => return Err(other.into()),
        };
        if product.is_some() && catalog.category_has_product(category_id, product_id)? {
            errors.add("product_id", "The product is already attached to this category.");
        }
        match product {
            Some(product) if errors.is_empty() => {
                catalog.attach_product(category_id, product_id)?;
                Ok(product)
            }
            _ => Err(AppError::Validation(errors)),
        }
    })
    .await?;

    info!("{} attached product {} to category {}", admin.user.email, product_id, category_id);
    Ok(HttpResponse::Ok().json(product))
}

/// Removes the pivot row only; the product itself is kept.
pub async fn detach_product(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, AppError> {
    let (category_id, product_id) = path.into_inner();
    let catalog = state.catalog.clone();
    blocking(move || {
        ensure_attached(catalog.as_ref(), category_id, product_id)?;
        Ok(catalog.detach_product(category_id, product_id)?)
    })
    .await?;

    info!("{} detached product {} from category {}", admin.user.email, product_id, category_id);
    Ok(HttpResponse::NoContent().finish())
}

pub async fn get_category_product(
    state: web::Data<AppState>,
    _admin: AdminUser,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, AppError> {
    let (category_id, product_id) = path.into_inner();
    let catalog = state.catalog.clone();
    let product = blocking(move || {
        ensure_attached(catalog.as_ref(), category_id, product_id)?;
        Ok(catalog.get_product(product_id)?)
    })
    .await?;
    Ok(HttpResponse::Ok().json(product))
}

pub async fn update_category_product(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<(i32, i32)>,
    form: web::Json<ProductForm>,
) -> Result<HttpResponse, AppError> {
    let (category_id, product_id) = path.into_inner();
    let form = form.into_inner();
    let catalog = state.catalog.clone();
    let product = blocking(move || {
        ensure_attached(catalog.as_ref(), category_id, product_id)?;
        let changes = validate_product_changes(catalog.as_ref(), product_id, &form, today())?;
        catalog.update_product(product_id, changes)?;
        Ok(catalog.get_product(product_id)?)
    })
    .await?;

    info!("{} updated product {} from category {}", admin.user.email, product_id, category_id);
    Ok(HttpResponse::Ok().json(product))
}

pub async fn delete_category_product(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, AppError> {
    let (category_id, product_id) = path.into_inner();
    let catalog = state.catalog.clone();
    blocking(move || {
        ensure_attached(catalog.as_ref(), category_id, product_id)?;
        Ok(catalog.delete_product(product_id)?)
    })
    .await?;

    info!("{} deleted product {} from category {}", admin.user.email, product_id, category_id);
    Ok(HttpResponse::NoContent().finish())
}

/// Deletes the given products, skipping any not attached to the category.
pub async fn bulk_delete_category_products(
    state: web::Data<AppState>,
    admin: AdminUser,
    id: web::Path<i32>,
    body: web::Json<BulkDeleteRequest>,
) -> Result<HttpResponse, AppError> {
    let category_id = id.into_inner();
    let ids = body.into_inner().ids;
    let catalog = state.catalog.clone();
    let deleted = blocking(move || {
        catalog.get_category(category_id)?;
        let mut attached = Vec::with_capacity(ids.len());
        for product_id in ids {
            if catalog.category_has_product(category_id, product_id)? {
                attached.push(product_id);
            }
        }
        Ok(catalog.delete_products(&attached)?)
    })
    .await?;

    info!(
        "{} bulk-deleted {} products from category {}",
        admin.user.email, deleted, category_id
    );
    Ok(HttpResponse::Ok().json(BulkDeleteResponse { deleted }))
}
