mod common;

use actix_web::App;
use serde_json::{json, Value};

use catalog_admin::routes;
use common::{state, ADMIN_EMAIL, ADMIN_PASSWORD};

#[actix_rt::test]
async fn test_server_login_over_http() {
    let data = state();
    let srv = actix_test::start(move || App::new().app_data(data.clone()).configure(routes::configure));

    let resp = srv.get("/admin/api/panel").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let mut resp = srv
        .post("/admin/login")
        .send_json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["email"], ADMIN_EMAIL);
    assert!(body["csrf_token"].as_str().unwrap().len() >= 40);
}
