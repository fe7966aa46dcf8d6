//! Integration tests for the protected bulk flag on product templates.
//!
//! The flag drives how quantities aggregate, so once any variant of a
//! template has stock moves on record the flag is frozen for access-checked
//! user calls. Internal callers and callers with checking disabled stay free
//! to edit, and re-submitting the current value never counts as a change.

mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use common::{read_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;
use vinifera_api::{
    context::RequestContext,
    entities::stock_location::LocationKind,
    entities::stock_move::MoveState,
    errors::ServiceError,
    services::products::UpdateProductTemplateInput,
};

fn flip_bulk(to: bool) -> UpdateProductTemplateInput {
    UpdateProductTemplateInput {
        bulk: Some(to),
        ..Default::default()
    }
}

#[tokio::test]
async fn bulk_flag_freezes_once_a_variant_has_moves() {
    let app = TestApp::new().await;
    let (storage, _) = app.storage_and_warehouse("Cellar").await;
    let production = app
        .create_location("Line", LocationKind::Production, None)
        .await;

    let template = app.create_template("Rioja Crianza", "l", true).await;
    let wine = app.create_product(template.id).await;
    app.record_done_move(wine.product.id, production.id, storage.id, dec!(10))
        .await;

    let user = RequestContext::for_user(Uuid::new_v4());
    let err = app
        .state
        .services
        .products
        .update_template(&user, template.id, flip_bulk(false))
        .await
        .expect_err("the guard should reject the edit");

    assert_matches!(err, ServiceError::Forbidden(ref msg) if msg.contains("Rioja Crianza"));
}

#[tokio::test]
async fn draft_moves_are_enough_to_freeze_the_flag() {
    let app = TestApp::new().await;
    let (storage, _) = app.storage_and_warehouse("Cellar").await;
    let production = app
        .create_location("Line", LocationKind::Production, None)
        .await;

    let template = app.create_template("Petit Verdot", "l", true).await;
    let wine = app.create_product(template.id).await;
    app.record_move_on(
        wine.product.id,
        production.id,
        storage.id,
        dec!(5),
        common::today(),
        MoveState::Draft,
    )
    .await;

    let user = RequestContext::for_user(Uuid::new_v4());
    let err = app
        .state
        .services
        .products
        .update_template(&user, template.id, flip_bulk(false))
        .await
        .expect_err("a draft move already freezes the flag");

    assert_matches!(err, ServiceError::Forbidden(_));
}

#[tokio::test]
async fn internal_callers_bypass_the_guard() {
    let app = TestApp::new().await;
    let (storage, _) = app.storage_and_warehouse("Cellar").await;
    let production = app
        .create_location("Line", LocationKind::Production, None)
        .await;

    let template = app.create_template("Syrah", "l", true).await;
    let wine = app.create_product(template.id).await;
    app.record_done_move(wine.product.id, production.id, storage.id, dec!(10))
        .await;

    let updated = app
        .state
        .services
        .products
        .update_template(&RequestContext::system(), template.id, flip_bulk(false))
        .await
        .expect("internal callers may edit the flag");

    assert!(!updated.bulk);
}

#[tokio::test]
async fn disabling_access_checks_bypasses_the_guard() {
    let app = TestApp::new().await;
    let (storage, _) = app.storage_and_warehouse("Cellar").await;
    let production = app
        .create_location("Line", LocationKind::Production, None)
        .await;

    let template = app.create_template("Merlot", "l", true).await;
    let wine = app.create_product(template.id).await;
    app.record_done_move(wine.product.id, production.id, storage.id, dec!(10))
        .await;

    let unchecked = RequestContext {
        check_access: false,
        ..RequestContext::for_user(Uuid::new_v4())
    };
    let updated = app
        .state
        .services
        .products
        .update_template(&unchecked, template.id, flip_bulk(false))
        .await
        .expect("a caller with checking disabled may edit the flag");

    assert!(!updated.bulk);
}

#[tokio::test]
async fn resubmitting_the_current_value_is_not_a_change() {
    let app = TestApp::new().await;
    let (storage, _) = app.storage_and_warehouse("Cellar").await;
    let production = app
        .create_location("Line", LocationKind::Production, None)
        .await;

    let template = app.create_template("Cabernet", "l", true).await;
    let wine = app.create_product(template.id).await;
    app.record_done_move(wine.product.id, production.id, storage.id, dec!(10))
        .await;

    // A write that carries bulk=true alongside a rename leaves the flag as it
    // is, so the guard stays out of the way.
    let user = RequestContext::for_user(Uuid::new_v4());
    let updated = app
        .state
        .services
        .products
        .update_template(
            &user,
            template.id,
            UpdateProductTemplateInput {
                name: Some("Cabernet Reserva".to_string()),
                bulk: Some(true),
                ..Default::default()
            },
        )
        .await
        .expect("a no-op flag write passes the guard");

    assert_eq!(updated.name, "Cabernet Reserva");
    assert!(updated.bulk);
}

#[tokio::test]
async fn templates_without_moves_stay_editable() {
    let app = TestApp::new().await;
    let template = app.create_template("Young blend", "l", false).await;

    let user = RequestContext::for_user(Uuid::new_v4());
    let updated = app
        .state
        .services
        .products
        .update_template(&user, template.id, flip_bulk(true))
        .await
        .expect("no moves, no guard");

    assert!(updated.bulk);
}

#[tokio::test]
async fn the_check_is_all_or_nothing_over_a_set() {
    let app = TestApp::new().await;
    let (storage, _) = app.storage_and_warehouse("Cellar").await;
    let production = app
        .create_location("Line", LocationKind::Production, None)
        .await;

    // Four clean templates and one frozen, with the frozen id last: batches
    // of two mean only the third probe can find it, so a short-circuiting or
    // per-record implementation would get this wrong.
    let mut ids = Vec::new();
    for i in 0..4 {
        let clean = app
            .create_template(&format!("Clean {}", i), "l", true)
            .await;
        ids.push(clean.id);
    }
    let frozen = app.create_template("Frozen", "l", true).await;
    let wine = app.create_product(frozen.id).await;
    app.record_done_move(wine.product.id, production.id, storage.id, dec!(1))
        .await;
    ids.push(frozen.id);

    let user = RequestContext::for_user(Uuid::new_v4());
    let err = app
        .state
        .services
        .products
        .assert_bulk_editable(&user, &ids)
        .await
        .expect_err("one frozen template fails the whole set");
    assert_matches!(err, ServiceError::Forbidden(ref msg) if msg.contains("Frozen"));

    // The same set without the frozen member passes.
    app.state
        .services
        .products
        .assert_bulk_editable(&user, &ids[..4])
        .await
        .expect("clean templates are editable");
}

#[tokio::test]
async fn http_layer_maps_the_guard_to_forbidden() {
    let app = TestApp::new().await;
    let (storage, _) = app.storage_and_warehouse("Cellar").await;
    let production = app
        .create_location("Line", LocationKind::Production, None)
        .await;

    let template = app.create_template("Tinto del pais", "l", true).await;
    let wine = app.create_product(template.id).await;
    app.record_done_move(wine.product.id, production.id, storage.id, dec!(10))
        .await;

    let uri = format!("/api/v1/product-templates/{}", template.id);
    let body = json!({ "bulk": false });

    let forbidden = app
        .request_as(Uuid::new_v4(), Method::PUT, &uri, Some(body.clone()))
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    let payload = read_json(forbidden).await;
    assert_eq!(payload["error"], "Forbidden");

    let unchecked = app
        .request_unchecked(Uuid::new_v4(), Method::PUT, &uri, Some(body.clone()))
        .await;
    assert_eq!(unchecked.status(), StatusCode::OK);

    // And back again as an internal caller, without identity headers.
    let internal = app
        .request(Method::PUT, &uri, Some(json!({ "bulk": true })))
        .await;
    assert_eq!(internal.status(), StatusCode::OK);
    let payload = read_json(internal).await;
    assert_eq!(payload["data"]["bulk"], json!(true));
}
