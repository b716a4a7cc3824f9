use actix_web::web;

use crate::auth;
use crate::error::{json_error_handler, query_error_handler};
use crate::handlers::{brands, categories, panel, products, uploads};

/// Registers the `/admin` panel and its JSON API. Literal segments such as
/// `bulk-delete` and `options` are registered before `{id}` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler));
    cfg.app_data(web::QueryConfig::default().error_handler(query_error_handler));
    cfg.service(
        web::scope("/admin")
            .route("", web::get().to(panel::home))
            .route("/login", web::get().to(auth::show_login))
            .route("/login", web::post().to(auth::login))
            .route("/logout", web::post().to(auth::logout))
            .service(
                web::scope("/api")
                    .route("/panel", web::get().to(panel::show_panel))
                    .route("/dashboard", web::get().to(panel::dashboard))
                    .route("/search", web::get().to(panel::search))
                    .route("/resources/{slug}/schema", web::get().to(panel::resource_schema))
                    .route("/uploads", web::post().to(uploads::upload_image))
                    // products
                    .route("/products", web::get().to(products::list_products))
                    .route("/products", web::post().to(products::create_product))
                    .route("/products/bulk-delete", web::post().to(products::bulk_delete_products))
                    .route("/products/{id}", web::get().to(products::get_product))
                    .route("/products/{id}", web::put().to(products::update_product))
                    .route("/products/{id}", web::delete().to(products::delete_product))
                    // brands
                    .route("/brands", web::get().to(brands::list_brands))
                    .route("/brands", web::post().to(brands::create_brand))
                    .route("/brands/options", web::get().to(brands::brand_options))
                    .route("/brands/{id}", web::get().to(brands::get_brand))
                    .route("/brands/{id}", web::put().to(brands::update_brand))
                    .route("/brands/{id}", web::delete().to(brands::delete_brand))
                    // categories and their products
                    .route("/categories", web::get().to(categories::list_categories))
                    .route("/categories", web::post().to(categories::create_category))
                    .route("/categories/{id}", web::get().to(categories::get_category))
                    .route("/categories/{id}", web::put().to(categories::update_category))
                    .route("/categories/{id}", web::delete().to(categories::delete_category))
                    .route("/categories/{id}/products", web::get().to(categories::list_category_products))
                    .route("/categories/{id}/products", web::post().to(categories::create_category_product))
                    .route("/categories/{id}/products/attach", web::post().to(categories::attach_product))
                    .route(
                        "/categories/{id}/products/bulk-delete",
                        web::post().to(categories::bulk_delete_category_products),
                    )
                    .route(
                        "/categories/{id}/products/{product_id}",
                        web::get().to(categories::get_category_product),
                    )
                    .route(
                        "/categories/{id}/products/{product_id}",
                        web::put().to(categories::update_category_product),
                    )
                    .route(
                        "/categories/{id}/products/{product_id}",
                        web::delete().to(categories::delete_category_product),
                    )
                    .route(
                        "/categories/{id}/products/{product_id}/detach",
                        web::post().to(categories::detach_product),
                    ),
            ),
    );
}
