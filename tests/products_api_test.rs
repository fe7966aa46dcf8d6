//! Integration tests for the product and product template HTTP surface.
//!
//! Exercises the catalog endpoints end to end: template creation and reads
//! (which carry the summed bulk quantity of the variants), product creation
//! with capacity and varietal composition, listing filters, the batched and
//! scoped quantity endpoints, quantity search, packaging generation over
//! HTTP, and the status endpoint.

mod common;

use axum::http::{Method, StatusCode};
use common::{read_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;
use vinifera_api::{
    entities::stock_location::LocationKind,
    services::{
        packaging::CreatePackagingInput,
        production_templates::{CreateProductionTemplateInput, RecipeInputLine},
    },
};

fn decimal_field(payload: &Value, pointer: &str) -> Decimal {
    serde_json::from_value(
        payload
            .pointer(pointer)
            .unwrap_or_else(|| panic!("missing field {}", pointer))
            .clone(),
    )
    .expect("field is a decimal")
}

#[tokio::test]
async fn templates_are_created_and_served_with_their_quantity() {
    let app = TestApp::new().await;
    let liter = app.uom("l").await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/product-templates",
            Some(json!({
                "name": "Tempranillo 2024",
                "default_uom_id": liter.id,
                "bulk": true,
            })),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let payload = read_json(created).await;
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["data"]["name"], json!("Tempranillo 2024"));
    assert_eq!(payload["data"]["bulk"], json!(true));
    let template_id = payload["data"]["id"].as_str().expect("template id").to_string();

    // A fresh template has no variants, so the summed quantity is zero.
    let fetched = app
        .request(
            Method::GET,
            &format!("/api/v1/product-templates/{}", template_id),
            None,
        )
        .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    let payload = read_json(fetched).await;
    assert_eq!(decimal_field(&payload, "/data/bulk_quantity"), Decimal::ZERO);

    // Stock a variant and the template read reflects it.
    let template_uuid = template_id.parse::<Uuid>().expect("uuid");
    let wine = app.create_product(template_uuid).await;
    let (storage, _) = app.storage_and_warehouse("Bodega").await;
    let press = app
        .create_location("Press house", LocationKind::Production, None)
        .await;
    app.record_done_move(wine.product.id, press.id, storage.id, dec!(100))
        .await;

    let fetched = app
        .request(
            Method::GET,
            &format!("/api/v1/product-templates/{}", template_id),
            None,
        )
        .await;
    let payload = read_json(fetched).await;
    assert_eq!(decimal_field(&payload, "/data/bulk_quantity"), dec!(100));
}

#[tokio::test]
async fn template_validation_maps_to_the_right_statuses() {
    let app = TestApp::new().await;
    let liter = app.uom("l").await;

    let blank_name = app
        .request(
            Method::POST,
            "/api/v1/product-templates",
            Some(json!({ "name": "", "default_uom_id": liter.id })),
        )
        .await;
    assert_eq!(blank_name.status(), StatusCode::BAD_REQUEST);
    let payload = read_json(blank_name).await;
    assert_eq!(payload["error"], json!("Bad Request"));
    assert!(payload["request_id"].is_string());

    let unknown_uom = app
        .request(
            Method::POST,
            "/api/v1/product-templates",
            Some(json!({ "name": "Orphan", "default_uom_id": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(unknown_uom.status(), StatusCode::NOT_FOUND);

    let missing = app
        .request(
            Method::GET,
            &format!("/api/v1/product-templates/{}", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn products_inherit_defaults_and_validate_their_units() {
    let app = TestApp::new().await;
    let liter = app.uom("l").await;
    let template = app.create_template("Bottled red", "u", false).await;

    // Capacity without an explicit unit falls back to liters.
    let created = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "template_id": template.id,
                "code": "RED-75",
                "capacity": "0.75",
                "vintage": 2023,
                "varieties": [
                    { "variety": "Tempranillo", "percent": "85" },
                    { "variety": "Graciano", "percent": "15" },
                ],
            })),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let payload = read_json(created).await;
    assert_eq!(payload["data"]["code"], json!("RED-75"));
    assert_eq!(payload["data"]["capacity_uom_id"], json!(liter.id));
    assert_eq!(decimal_field(&payload, "/data/capacity"), dec!(0.75));
    assert_eq!(payload["data"]["vintage"], json!(2023));
    assert_eq!(payload["data"]["bulk"], json!(false));
    assert_eq!(
        payload["data"]["varieties"].as_array().expect("varieties").len(),
        2
    );

    // A volume unit is not a weight.
    let bad_weight_uom = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "template_id": template.id,
                "weight": "1.2",
                "weight_uom_id": liter.id,
            })),
        )
        .await;
    assert_eq!(bad_weight_uom.status(), StatusCode::BAD_REQUEST);

    let ancient_vintage = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({ "template_id": template.id, "vintage": 1800 })),
        )
        .await;
    assert_eq!(ancient_vintage.status(), StatusCode::BAD_REQUEST);

    let orphan = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({ "template_id": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(orphan.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listings_filter_on_template_and_bulk_flag() {
    let app = TestApp::new().await;

    let wine_template = app.create_template("Tank wine", "l", true).await;
    let bottle_template = app.create_template("Bottled wine", "u", false).await;
    app.create_product(wine_template.id).await;
    app.create_product(wine_template.id).await;
    app.create_product(bottle_template.id).await;

    let bulk_only = app
        .request(Method::GET, "/api/v1/products?bulk=true", None)
        .await;
    assert_eq!(bulk_only.status(), StatusCode::OK);
    let payload = read_json(bulk_only).await;
    assert_eq!(payload["data"]["total"], json!(2));

    let packaged_only = app
        .request(Method::GET, "/api/v1/products?bulk=false", None)
        .await;
    let payload = read_json(packaged_only).await;
    assert_eq!(payload["data"]["total"], json!(1));
    assert_eq!(
        payload["data"]["items"][0]["template_id"],
        json!(bottle_template.id)
    );

    let by_template = app
        .request(
            Method::GET,
            &format!("/api/v1/products?template_id={}", wine_template.id),
            None,
        )
        .await;
    let payload = read_json(by_template).await;
    assert_eq!(payload["data"]["total"], json!(2));
    assert_eq!(payload["data"]["page"], json!(1));
    assert_eq!(payload["data"]["total_pages"], json!(1));
}

#[tokio::test]
async fn single_product_reads_carry_the_bulk_quantity() {
    let app = TestApp::new().await;

    let template = app.create_template("Garnacha tank", "l", true).await;
    let wine = app.create_product(template.id).await;
    let (storage, _) = app.storage_and_warehouse("Bodega").await;
    let press = app
        .create_location("Press", LocationKind::Production, None)
        .await;
    app.record_done_move(wine.product.id, press.id, storage.id, dec!(420))
        .await;

    let fetched = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{}", wine.product.id),
            None,
        )
        .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    let payload = read_json(fetched).await;
    assert_eq!(payload["data"]["bulk"], json!(true));
    assert_eq!(decimal_field(&payload, "/data/bulk_quantity"), dec!(420));
}

#[tokio::test]
async fn batched_quantities_preserve_request_order() {
    let app = TestApp::new().await;

    let template = app.create_template("Tank wine", "l", true).await;
    let (storage, _) = app.storage_and_warehouse("Bodega").await;
    let press = app
        .create_location("Press", LocationKind::Production, None)
        .await;

    let mut ids = Vec::new();
    for quantity in [dec!(10), dec!(20), dec!(30)] {
        let product = app.create_product(template.id).await;
        app.record_done_move(product.product.id, press.id, storage.id, quantity)
            .await;
        ids.push(product.product.id);
    }

    // Ask for them back to front; the response keeps the request order.
    let response = app
        .request(
            Method::POST,
            "/api/v1/products/bulk-quantities",
            Some(json!({ "product_ids": [ids[2], ids[0], ids[1]] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    let items = payload["data"].as_array().expect("quantity rows");
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["product_id"], json!(ids[2]));
    assert_eq!(items[1]["product_id"], json!(ids[0]));
    assert_eq!(items[2]["product_id"], json!(ids[1]));
    assert_eq!(decimal_field(&payload, "/data/0/bulk_quantity"), dec!(30));
    assert_eq!(decimal_field(&payload, "/data/1/bulk_quantity"), dec!(10));
    assert_eq!(decimal_field(&payload, "/data/2/bulk_quantity"), dec!(20));

    let empty = app
        .request(
            Method::POST,
            "/api/v1/products/bulk-quantities",
            Some(json!({ "product_ids": [] })),
        )
        .await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scoped_reads_parse_their_query_parameters() {
    let app = TestApp::new().await;

    let template = app.create_template("Tank wine", "l", true).await;
    let wine = app.create_product(template.id).await;
    let (storage, _) = app.storage_and_warehouse("Bodega").await;
    let cellar = app
        .create_location("Aging cellar", LocationKind::Production, None)
        .await;
    let press = app
        .create_location("Press", LocationKind::Production, None)
        .await;
    app.record_done_move(wine.product.id, press.id, storage.id, dec!(300))
        .await;
    app.record_done_move(wine.product.id, press.id, cellar.id, dec!(45))
        .await;

    // Default scope is the warehouse storage zone.
    let default_scope = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{}/bulk-quantity", wine.product.id),
            None,
        )
        .await;
    let payload = read_json(default_scope).await;
    assert_eq!(payload["data"]["product_id"], json!(wine.product.id));
    assert_eq!(decimal_field(&payload, "/data/bulk_quantity"), dec!(300));

    // An explicit location list overrides it.
    let scoped = app
        .request(
            Method::GET,
            &format!(
                "/api/v1/products/{}/bulk-quantity?locations={}",
                wine.product.id, cellar.id
            ),
            None,
        )
        .await;
    let payload = read_json(scoped).await;
    assert_eq!(decimal_field(&payload, "/data/bulk_quantity"), dec!(45));

    // Before the wine existed there was nothing on hand.
    let rewound = app
        .request(
            Method::GET,
            &format!(
                "/api/v1/products/{}/bulk-quantity?as_of=1990-01-01",
                wine.product.id
            ),
            None,
        )
        .await;
    let payload = read_json(rewound).await;
    assert_eq!(decimal_field(&payload, "/data/bulk_quantity"), Decimal::ZERO);

    let garbage = app
        .request(
            Method::GET,
            &format!(
                "/api/v1/products/{}/bulk-quantity?locations=cellar-3",
                wine.product.id
            ),
            None,
        )
        .await;
    assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);

    let unknown = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{}/bulk-quantity", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_returns_matching_product_ids() {
    let app = TestApp::new().await;

    let template = app.create_template("Tank wine", "l", true).await;
    let (storage, _) = app.storage_and_warehouse("Bodega").await;
    let press = app
        .create_location("Press", LocationKind::Production, None)
        .await;

    let big = app.create_product(template.id).await;
    let small = app.create_product(template.id).await;
    app.record_done_move(big.product.id, press.id, storage.id, dec!(100))
        .await;
    app.record_done_move(small.product.id, press.id, storage.id, dec!(30))
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/products/search/bulk-quantity",
            Some(json!({ "operator": "ge", "value": "50" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    let ids = payload["data"].as_array().expect("matching ids");
    assert_eq!(ids.len(), 1);
    assert_eq!(ids[0], json!(big.product.id));
}

#[tokio::test]
async fn packaging_generation_reports_over_http() {
    let app = TestApp::new().await;
    let liter = app.uom("l").await;

    let wine_template = app.create_template("Syrah 2023", "l", true).await;
    let wine = app.create_product(wine_template.id).await;
    let bottled_template = app.create_template("Syrah 2023 bottled", "u", false).await;

    let recipe = app
        .state
        .services
        .production_templates
        .create(CreateProductionTemplateInput {
            name: "Bottling Syrah".to_string(),
            packaging: Some(true),
            labeling: None,
            packaging_product_id: None,
            output_template_id: Some(bottled_template.id),
            quantity: None,
            uom_id: None,
            active: None,
            inputs: vec![RecipeInputLine {
                product_id: wine.product.id,
                quantity: dec!(1),
                uom_id: liter.id,
            }],
        })
        .await
        .expect("create packaging recipe");
    app.state
        .services
        .packaging
        .create_association(CreatePackagingInput {
            product_id: wine.product.id,
            production_template_id: recipe.template.id,
        })
        .await
        .expect("create association");

    let first = app
        .request(
            Method::POST,
            "/api/v1/products/generate-packaging",
            Some(json!({ "product_ids": [wine.product.id] })),
        )
        .await;
    assert_eq!(first.status(), StatusCode::OK);
    let payload = read_json(first).await;
    let report = payload["data"].as_array().expect("generation report");
    assert_eq!(report.len(), 1);
    assert_eq!(report[0]["source_product_id"], json!(wine.product.id));
    assert!(report[0]["packaged_product_id"].is_string());
    assert!(report[0]["bom_id"].is_string());

    // Everything is already generated, so the second run reports nothing.
    let second = app
        .request(
            Method::POST,
            "/api/v1/products/generate-packaging",
            Some(json!({ "product_ids": [wine.product.id] })),
        )
        .await;
    assert_eq!(second.status(), StatusCode::OK);
    let payload = read_json(second).await;
    assert_eq!(payload["data"].as_array().expect("report").len(), 0);
}

#[tokio::test]
async fn the_status_endpoint_names_the_service() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/status", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["data"]["service"], json!("vinifera-api"));
    assert_eq!(payload["data"]["status"], json!("ok"));
    assert!(payload["data"]["version"].is_string());
}
