//! Integration tests for production templates (recipes).
//!
//! The field rules are a rule table rather than per-field UI states: plain
//! recipes need a batch quantity and unit, packaging and labeling are
//! mutually exclusive, and a packaging material only belongs on a packaging
//! recipe. Updates re-validate the merged state, and deletion is blocked
//! while packaging associations still reference the recipe.

mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use common::{read_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use test_case::test_case;
use uuid::Uuid;
use vinifera_api::{
    errors::ServiceError,
    services::{
        packaging::CreatePackagingInput,
        production_templates::{
            CreateProductionTemplateInput, RecipeInputLine, UpdateProductionTemplateInput,
        },
    },
};

#[test_case(false, false, false, false, false, StatusCode::BAD_REQUEST ; "plain recipe without batch data")]
#[test_case(false, false, true, false, false, StatusCode::BAD_REQUEST ; "plain recipe missing the unit")]
#[test_case(false, false, true, true, false, StatusCode::CREATED ; "plain recipe with quantity and unit")]
#[test_case(true, false, false, false, false, StatusCode::CREATED ; "packaging recipe skips batch data")]
#[test_case(false, true, false, false, false, StatusCode::CREATED ; "labeling recipe skips batch data")]
#[test_case(true, true, false, false, false, StatusCode::BAD_REQUEST ; "packaging and labeling exclude each other")]
#[test_case(false, true, false, false, true, StatusCode::BAD_REQUEST ; "material requires the packaging flag")]
#[test_case(true, false, false, false, true, StatusCode::CREATED ; "material on a packaging recipe")]
#[tokio::test]
async fn create_enforces_the_field_rules(
    packaging: bool,
    labeling: bool,
    with_quantity: bool,
    with_uom: bool,
    with_material: bool,
    expected: StatusCode,
) {
    let app = TestApp::new().await;
    let liter = app.uom("l").await;
    let material_template = app.create_template("Bottles", "u", false).await;
    let material = app.create_product(material_template.id).await;

    let mut body = json!({
        "name": "Recipe under test",
        "packaging": packaging,
        "labeling": labeling,
    });
    if with_quantity {
        body["quantity"] = json!("100");
    }
    if with_uom {
        body["uom_id"] = json!(liter.id);
    }
    if with_material {
        body["packaging_product_id"] = json!(material.product.id);
    }

    let response = app
        .request(Method::POST, "/api/v1/production-templates", Some(body))
        .await;
    assert_eq!(response.status(), expected);
}

#[tokio::test]
async fn update_revalidates_the_merged_state() {
    let app = TestApp::new().await;
    let material_template = app.create_template("Bottles", "u", false).await;
    let material = app.create_product(material_template.id).await;

    let recipe = app
        .state
        .services
        .production_templates
        .create(CreateProductionTemplateInput {
            name: "Bottling".to_string(),
            packaging: Some(true),
            labeling: None,
            packaging_product_id: Some(material.product.id),
            output_template_id: None,
            quantity: None,
            uom_id: None,
            active: None,
            inputs: Vec::new(),
        })
        .await
        .expect("create packaging recipe");

    // Turning packaging off while the material stays on the row violates the
    // rule table, even though neither field alone is invalid.
    let err = app
        .state
        .services
        .production_templates
        .update(
            recipe.template.id,
            UpdateProductionTemplateInput {
                packaging: Some(false),
                labeling: Some(true),
                ..Default::default()
            },
        )
        .await
        .expect_err("the merged state is re-validated");
    assert_matches!(err, ServiceError::ValidationError(_));

    let unchanged = app
        .state
        .services
        .production_templates
        .get(recipe.template.id)
        .await
        .expect("reload recipe");
    assert!(unchanged.template.packaging);
    assert!(!unchanged.template.labeling);
}

#[tokio::test]
async fn update_replaces_input_lines_wholesale() {
    let app = TestApp::new().await;
    let liter = app.uom("l").await;
    let kilogram = app.uom("kg").await;

    let wine_template = app.create_template("Verdejo 2024", "l", true).await;
    let wine = app.create_product(wine_template.id).await;
    let enology_template = app.create_template("Enology", "kg", false).await;
    let sulfite = app.create_product(enology_template.id).await;

    let recipe = app
        .state
        .services
        .production_templates
        .create(CreateProductionTemplateInput {
            name: "Stabilization".to_string(),
            packaging: None,
            labeling: None,
            packaging_product_id: None,
            output_template_id: None,
            quantity: Some(dec!(1000)),
            uom_id: Some(liter.id),
            active: None,
            inputs: vec![
                RecipeInputLine {
                    product_id: wine.product.id,
                    quantity: dec!(1000),
                    uom_id: liter.id,
                },
                RecipeInputLine {
                    product_id: sulfite.product.id,
                    quantity: dec!(0.05),
                    uom_id: kilogram.id,
                },
            ],
        })
        .await
        .expect("create recipe with two lines");
    assert_eq!(recipe.inputs.len(), 2);

    let updated = app
        .state
        .services
        .production_templates
        .update(
            recipe.template.id,
            UpdateProductionTemplateInput {
                inputs: Some(vec![RecipeInputLine {
                    product_id: wine.product.id,
                    quantity: dec!(500),
                    uom_id: liter.id,
                }]),
                ..Default::default()
            },
        )
        .await
        .expect("replace the line list");

    assert_eq!(updated.inputs.len(), 1);
    assert_eq!(updated.inputs[0].quantity, dec!(500));

    // An update without `inputs` leaves the lines alone.
    let renamed = app
        .state
        .services
        .production_templates
        .update(
            recipe.template.id,
            UpdateProductionTemplateInput {
                name: Some("Cold stabilization".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("rename only");
    assert_eq!(renamed.template.name, "Cold stabilization");
    assert_eq!(renamed.inputs.len(), 1);
}

#[tokio::test]
async fn unknown_input_products_are_rejected() {
    let app = TestApp::new().await;
    let liter = app.uom("l").await;

    let err = app
        .state
        .services
        .production_templates
        .create(CreateProductionTemplateInput {
            name: "Ghost recipe".to_string(),
            packaging: Some(true),
            labeling: None,
            packaging_product_id: None,
            output_template_id: None,
            quantity: None,
            uom_id: None,
            active: None,
            inputs: vec![RecipeInputLine {
                product_id: Uuid::new_v4(),
                quantity: dec!(1),
                uom_id: liter.id,
            }],
        })
        .await
        .expect_err("input lines must reference existing products");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn deletion_is_blocked_while_associations_reference_the_recipe() {
    let app = TestApp::new().await;
    let liter = app.uom("l").await;

    let wine_template = app.create_template("Mencia 2024", "l", true).await;
    let wine = app.create_product(wine_template.id).await;

    let recipe = app
        .state
        .services
        .production_templates
        .create(CreateProductionTemplateInput {
            name: "Bottling Mencia".to_string(),
            packaging: Some(true),
            labeling: None,
            packaging_product_id: None,
            output_template_id: None,
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
        .expect("create recipe");

    let association = app
        .state
        .services
        .packaging
        .create_association(CreatePackagingInput {
            product_id: wine.product.id,
            production_template_id: recipe.template.id,
        })
        .await
        .expect("create association");

    let services = &app.state.services;
    let err = services
        .production_templates
        .delete(recipe.template.id)
        .await
        .expect_err("a referenced recipe cannot be deleted");
    assert_matches!(err, ServiceError::Conflict(_));

    services
        .packaging
        .delete_association(association.id)
        .await
        .expect("remove the association");
    services
        .production_templates
        .delete(recipe.template.id)
        .await
        .expect("now the recipe can go");

    let err = services
        .production_templates
        .get(recipe.template.id)
        .await
        .expect_err("the recipe is gone");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn recipes_are_served_with_their_input_lines() {
    let app = TestApp::new().await;
    let liter = app.uom("l").await;

    let wine_template = app.create_template("Bobal 2024", "l", true).await;
    let wine = app.create_product(wine_template.id).await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/production-templates",
            Some(json!({
                "name": "Bottling Bobal",
                "packaging": true,
                "inputs": [
                    { "product_id": wine.product.id, "quantity": "1", "uom_id": liter.id }
                ]
            })),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let payload = read_json(created).await;
    assert_eq!(payload["success"], json!(true));
    let recipe_id = payload["data"]["id"].as_str().expect("recipe id").to_string();
    assert_eq!(payload["data"]["inputs"].as_array().expect("inputs").len(), 1);

    let fetched = app
        .request(
            Method::GET,
            &format!("/api/v1/production-templates/{}", recipe_id),
            None,
        )
        .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    let payload = read_json(fetched).await;
    assert_eq!(payload["data"]["name"], json!("Bottling Bobal"));
    assert_eq!(payload["data"]["packaging"], json!(true));
    assert_eq!(payload["data"]["inputs"].as_array().expect("inputs").len(), 1);

    let listed = app
        .request(
            Method::GET,
            "/api/v1/production-templates?page=1&per_page=10",
            None,
        )
        .await;
    assert_eq!(listed.status(), StatusCode::OK);
    let payload = read_json(listed).await;
    assert_eq!(payload["data"]["total"], json!(1));
    assert_eq!(payload["data"]["items"].as_array().expect("items").len(), 1);
}
