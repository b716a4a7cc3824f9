mod common;

use std::time::Duration;

use actix_web::http::header;
use actix_web::{test, App};
use chrono::Utc;
use serde_json::{json, Value};

use catalog_admin::db::NewAdminSession;

use catalog_admin::routes;
use common::{sign_in, state, ADMIN_EMAIL};

#[actix_web::test]
async fn test_api_requires_a_session() {
    let data = state();
    let app = test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;

    let req = test::TestRequest::get().uri("/admin/api/products").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Unauthenticated.");
}

#[actix_web::test]
async fn test_unsafe_methods_require_csrf_token() {
    let data = state();
    let app = test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;
    let session = sign_in(&app, &data).await;

    let req = test::TestRequest::post()
        .uri("/admin/api/categories")
        .cookie(session.cookie.clone())
        .set_json(json!({ "name": "Chaussures" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 419);

    let req = test::TestRequest::post()
        .uri("/admin/api/categories")
        .cookie(session.cookie.clone())
        .insert_header(("X-CSRF-TOKEN", "wrong"))
        .set_json(json!({ "name": "Chaussures" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 419);

    let req = session
        .post("/admin/api/categories")
        .set_json(json!({ "name": "Chaussures" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);
}

#[actix_web::test]
async fn test_wrong_password_is_rejected() {
    let data = state();
    let app = test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;

    let req = test::TestRequest::post()
        .uri("/admin/login")
        .set_json(json!({ "email": ADMIN_EMAIL, "password": "nope" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["email"][0], "These credentials do not match our records.");

    let req = test::TestRequest::post()
        .uri("/admin/login")
        .set_json(json!({}))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["password"].is_array());
}

#[actix_web::test]
async fn test_admin_home_redirects_until_signed_in() {
    let data = state();
    let app = test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;

    let req = test::TestRequest::get().uri("/admin").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/admin/login");

    let req = test::TestRequest::get().uri("/admin/login").to_request();
    let form: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(form["tabs"][0]["fields"][0]["name"], "email");

    let session = sign_in(&app, &data).await;
    let req = session.get("/admin").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["panel"]["path"], "admin");
    assert_eq!(body["user"]["email"], ADMIN_EMAIL);

    let req = session.get("/admin/login").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/admin");
}

#[actix_web::test]
async fn test_logout_ends_the_session() {
    let data = state();
    let app = test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;
    let session = sign_in(&app, &data).await;

    let req = session.post("/admin/logout").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = session.get("/admin/api/panel").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);
}

#[actix_web::test]
async fn test_rejected_requests_do_not_extend_the_session() {
    let data = state();
    let app = test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;
    let session = sign_in(&app, &data).await;
    let token = session.cookie.value().to_string();
    let issued = data.accounts.find_session(&token).unwrap().unwrap().expires_at;

    std::thread::sleep(Duration::from_millis(5));
    let req = test::TestRequest::post()
        .uri("/admin/api/categories")
        .cookie(session.cookie.clone())
        .insert_header(("X-CSRF-TOKEN", "wrong"))
        .set_json(json!({ "name": "Chaussures" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 419);
    assert_eq!(data.accounts.find_session(&token).unwrap().unwrap().expires_at, issued);

    let req = session.get("/admin/api/panel").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);
    assert!(data.accounts.find_session(&token).unwrap().unwrap().expires_at > issued);
}

#[actix_web::test]
async fn test_login_purges_expired_sessions() {
    let data = state();
    let app = test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;
    let first = sign_in(&app, &data).await;
    let user_id = data
        .accounts
        .find_session(first.cookie.value())
        .unwrap()
        .unwrap()
        .user_id;

    data.accounts
        .create_session(NewAdminSession {
            token: "stale".to_string(),
            user_id,
            csrf_token: "csrf".to_string(),
            expires_at: Utc::now().naive_utc() - chrono::Duration::minutes(1),
        })
        .unwrap();

    sign_in(&app, &data).await;
    assert!(data.accounts.find_session("stale").unwrap().is_none());
    assert!(data.accounts.find_session(first.cookie.value()).unwrap().is_some());
}
