#![allow(dead_code)]

use std::path::PathBuf;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web};
use serde_json::{json, Value};

use catalog_admin::auth::{ensure_bootstrap_admin, LoginResponse, CSRF_HEADER};
use catalog_admin::config::Settings;
use catalog_admin::db::{Brand, MemoryStore, NewBrand};
use catalog_admin::slug::slugify;
use catalog_admin::state::AppState;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "password";

pub fn storage_dir() -> PathBuf {
    std::env::temp_dir().join(format!("catalog-admin-test-{}", uuid::Uuid::new_v4()))
}

/// Memory-backed state with one admin account.
pub fn state() -> web::Data<AppState> {
    let mut settings = Settings::defaults().unwrap();
    settings.storage.root = storage_dir().to_string_lossy().into_owned();
    settings.admin.bootstrap_email = Some(ADMIN_EMAIL.to_string());
    settings.admin.bootstrap_password = Some(ADMIN_PASSWORD.to_string());

    let store = MemoryStore::new();
    ensure_bootstrap_admin(&store, &settings.admin).unwrap();
    web::Data::new(AppState::with_memory(store, settings))
}

pub fn brand(data: &web::Data<AppState>, name: &str) -> Brand {
    data.catalog
        .create_brand(NewBrand {
            name: name.to_string(),
            slug: slugify(name),
            url: None,
            description: None,
            is_visible: true,
        })
        .unwrap()
}

pub fn product_body(name: &str, sku: &str, brand_id: i32) -> Value {
    json!({
        "name": name,
        "sku": sku,
        "price": "49.90",
        "quantity": 10,
        "brand_id": brand_id,
    })
}

/// A signed-in browser: the session cookie plus the CSRF token unsafe
/// requests must echo back.
pub struct Session {
    pub cookie: Cookie<'static>,
    pub csrf: String,
}

impl Session {
    pub fn get(&self, uri: &str) -> test::TestRequest {
        test::TestRequest::get().uri(uri).cookie(self.cookie.clone())
    }

    pub fn post(&self, uri: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .cookie(self.cookie.clone())
            .insert_header((CSRF_HEADER, self.csrf.clone()))
    }

    pub fn put(&self, uri: &str) -> test::TestRequest {
        test::TestRequest::put()
            .uri(uri)
            .cookie(self.cookie.clone())
            .insert_header((CSRF_HEADER, self.csrf.clone()))
    }

    pub fn delete(&self, uri: &str) -> test::TestRequest {
        test::TestRequest::delete()
            .uri(uri)
            .cookie(self.cookie.clone())
            .insert_header((CSRF_HEADER, self.csrf.clone()))
    }
}

pub async fn sign_in<S, B>(app: &S, data: &web::Data<AppState>) -> Session
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/admin/login")
        .set_json(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 200, "login should succeed");

    let cookie_name = data.settings.session.cookie_name.clone();
    let cookie = resp
        .response()
        .cookies()
        .find(|cookie| cookie.name() == cookie_name)
        .expect("session cookie")
        .into_owned();
    let body: LoginResponse = test::read_body_json(resp).await;
    Session {
        cookie,
        csrf: body.csrf_token,
    }
}
