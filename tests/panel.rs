mod common;

use actix_web::{test, App};
use serde_json::{json, Value};

use catalog_admin::routes;
use common::{brand, product_body, sign_in, state, ADMIN_EMAIL};

#[actix_web::test]
async fn test_deleting_a_brand_removes_its_products() {
    let data = state();
    let acme = brand(&data, "Acme");
    let app = test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;
    let session = sign_in(&app, &data).await;

    let req = session
        .post("/admin/api/products")
        .set_json(product_body("Red Shoes", "RS-1", acme.id))
        .to_request();
    let product: Value = test::call_and_read_body_json(&app, req).await;

    let req = session.delete(&format!("/admin/api/brands/{}", acme.id)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);

    let req = session
        .get(&format!("/admin/api/products/{}", product["id"]))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn test_brand_crud_and_options() {
    let data = state();
    let app = test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;
    let session = sign_in(&app, &data).await;

    for name in ["Zeta", "Acme"] {
        let req = session
            .post("/admin/api/brands")
            .set_json(json!({ "name": name, "url": "https://example.com" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);
    }

    let req = session
        .post("/admin/api/brands")
        .set_json(json!({ "name": "Acme" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 422);

    let req = session.get("/admin/api/brands/options").to_request();
    let options: Value = test::call_and_read_body_json(&app, req).await;
    let labels: Vec<&str> = options.as_array().unwrap().iter().map(|o| o["label"].as_str().unwrap()).collect();
    assert_eq!(labels, vec!["Acme", "Zeta"]);

    let id = options[0]["value"].as_i64().unwrap();
    let req = session
        .put(&format!("/admin/api/brands/{}", id))
        .set_json(json!({ "name": "Acme Corp", "url": "not a url" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["url"].is_array());
}

#[actix_web::test]
async fn test_schema_and_panel_descriptors() {
    let data = state();
    let app = test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;
    let session = sign_in(&app, &data).await;

    let req = session.get("/admin/api/resources/products/schema").to_request();
    let schema: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(schema["form"]["tabs"].as_array().unwrap().len(), 3);
    assert_eq!(schema["table"]["bulk_actions"][0]["kind"], "delete_bulk");

    let req = session.get("/admin/api/resources/orders/schema").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = session.get("/admin/api/panel").to_request();
    let panel: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(panel["font"], "Outfit");
    assert_eq!(panel["global_search_key_bindings"], json!(["command+k", "ctrl+k"]));

    let req = session.get("/admin/api/dashboard").to_request();
    let dashboard: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(dashboard["widgets"][0]["user"]["email"], ADMIN_EMAIL);
    assert_eq!(dashboard["widgets"][1]["type"], "info");
}

#[actix_web::test]
async fn test_global_search() {
    let data = state();
    let acme = brand(&data, "Acme Shoes");
    let app = test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;
    let session = sign_in(&app, &data).await;

    let req = session
        .post("/admin/api/products")
        .set_json(product_body("Red Shoes", "RS-1", acme.id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = session.get("/admin/api/search?q=shoes").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let groups = body["results"].as_array().unwrap();
    let resources: Vec<&str> = groups.iter().map(|g| g["resource"].as_str().unwrap()).collect();
    assert_eq!(resources, vec!["products", "brands"]);
    assert_eq!(groups[0]["hits"][0]["title"], "Red Shoes");
    assert!(groups[0]["hits"][0]["url"].as_str().unwrap().ends_with("/edit"));

    let req = session.get("/admin/api/search?q=").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["results"], json!([]));
}

#[actix_web::test]
async fn test_global_search_matches_product_names_only() {
    let data = state();
    let shoe_co = brand(&data, "Shoe Co");
    let app = test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;
    let session = sign_in(&app, &data).await;

    // Plenty of products whose brand, not name, matches the term.
    for i in 0..60 {
        let req = session
            .post("/admin/api/products")
            .set_json(product_body(&format!("Boot {}", i), &format!("B-{}", i), shoe_co.id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);
    }
    let req = session
        .post("/admin/api/products")
        .set_json(product_body("Red Shoes", "RS-1", shoe_co.id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = session.get("/admin/api/search?q=shoe").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let products = &body["results"][0];
    assert_eq!(products["resource"], "products");
    let titles: Vec<&str> = products["hits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Red Shoes"]);
}

fn multipart(filename: &str, content_type: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "catalog-admin-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            filename, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}

#[actix_web::test]
async fn test_image_upload_keeps_file_name() {
    let data = state();
    let app = test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;
    let session = sign_in(&app, &data).await;

    let (content_type, body) = multipart("red shoe.png", "image/png", b"\x89PNG\r\n\x1a\n");
    let req = session
        .post("/admin/api/uploads")
        .insert_header(("content-type", content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let uploaded: Value = test::read_body_json(resp).await;
    assert_eq!(uploaded["path"], "form-attachments/red shoe.png");
    assert_eq!(uploaded["url"], "/storage/form-attachments/red shoe.png");

    let stored = std::path::Path::new(&data.settings.storage.root).join("form-attachments/red shoe.png");
    assert!(stored.exists());

    let (content_type, body) = multipart("fake.png", "image/png", b"just some text");
    let req = session
        .post("/admin/api/uploads")
        .insert_header(("content-type", content_type))
        .set_payload(body)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 422);
    let fake = std::path::Path::new(&data.settings.storage.root).join("form-attachments/fake.png");
    assert!(!fake.exists());

    let (content_type, body) = multipart("notes.txt", "text/plain", b"hello");
    let req = session
        .post("/admin/api/uploads")
        .insert_header(("content-type", content_type))
        .set_payload(body)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 422);
}
