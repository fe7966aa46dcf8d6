//! Shared harness for integration tests.
//!
//! `TestApp` spins up the full application state against a file-backed SQLite
//! database in a temporary directory, runs the migrations (which also seed the
//! UOM catalog) and mounts the HTTP router, so tests can exercise either the
//! service layer through `state.services` or the API surface through
//! `request`. Each test binary gets its own database file; the pool is capped
//! at one connection because SQLite and this suite share a single writer.

// Each integration test binary compiles this module separately and uses its
// own subset of the helpers.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use vinifera_api::{
    config::AppConfig,
    context::{CHECK_ACCESS_HEADER, USER_ID_HEADER},
    db,
    entities::{
        product_template,
        stock_location::{self, LocationKind},
        stock_move::{self, MoveState},
        uom::{self, Entity as UomEntity},
    },
    events::{self, EventSender},
    handlers::AppServices,
    services::{
        products::{CreateProductInput, CreateProductTemplateInput, ProductDetail},
        stock::{CreateLocationInput, RecordMoveInput},
    },
    AppState,
};

/// Batch size wired into the services, deliberately tiny so that the batched
/// guard probes and quantity sums really run in more than one slice.
pub const TEST_BATCH_SIZE: usize = 2;

pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("vinifera_test.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let mut cfg = AppConfig::new(db_url, "127.0.0.1".to_string(), 0, "test".to_string());
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), event_sender.clone(), TEST_BATCH_SIZE);

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", vinifera_api::api_v1_routes())
            // Mirror the request-id middleware the binary applies in main.rs
            // so error payloads carry a request id, as in production.
            .layer(axum::middleware::from_fn(
                vinifera_api::tracing::request_id_middleware,
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Sends a request without identity headers, i.e. as an internal caller.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.dispatch(method, uri, body, None, None).await
    }

    /// Sends a request on behalf of a user, with access checking on.
    pub async fn request_as(
        &self,
        user_id: Uuid,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.dispatch(method, uri, body, Some(user_id), None).await
    }

    /// Sends a request on behalf of a user with access checking disabled.
    pub async fn request_unchecked(
        &self,
        user_id: Uuid,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.dispatch(method, uri, body, Some(user_id), Some(false))
            .await
    }

    async fn dispatch(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        user_id: Option<Uuid>,
        check_access: Option<bool>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(user_id) = user_id {
            builder = builder.header(USER_ID_HEADER, user_id.to_string());
        }
        if let Some(check) = check_access {
            builder = builder.header(CHECK_ACCESS_HEADER, if check { "true" } else { "false" });
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Looks a unit up in the seeded catalog by symbol ("l", "ml", "kg", ...).
    pub async fn uom(&self, symbol: &str) -> uom::Model {
        UomEntity::find()
            .filter(uom::Column::Symbol.eq(symbol))
            .one(&*self.state.db)
            .await
            .expect("query uom catalog")
            .unwrap_or_else(|| panic!("uom '{}' missing from the seeded catalog", symbol))
    }

    pub async fn create_template(
        &self,
        name: &str,
        uom_symbol: &str,
        bulk: bool,
    ) -> product_template::Model {
        let unit = self.uom(uom_symbol).await;
        self.state
            .services
            .products
            .create_template(CreateProductTemplateInput {
                name: name.to_string(),
                default_uom_id: unit.id,
                bulk: Some(bulk),
                active: None,
            })
            .await
            .expect("create product template")
    }

    /// Creates a bare variant of a template, without measures or composition.
    pub async fn create_product(&self, template_id: Uuid) -> ProductDetail {
        self.create_product_with(CreateProductInput {
            template_id,
            code: None,
            capacity: None,
            capacity_uom_id: None,
            net_weight: None,
            weight: None,
            weight_uom_id: None,
            bulk_product_id: None,
            denomination_of_origin: None,
            ecological: None,
            vintage: None,
            active: None,
            varieties: Vec::new(),
        })
        .await
    }

    pub async fn create_product_with(&self, input: CreateProductInput) -> ProductDetail {
        self.state
            .services
            .products
            .create_product(input)
            .await
            .expect("create product")
    }

    /// Creates a storage zone plus an active warehouse pointing at it and
    /// returns `(storage, warehouse)`. The storage zone is what the bulk
    /// aggregation reads from by default.
    pub async fn storage_and_warehouse(&self, name: &str) -> (stock_location::Model, stock_location::Model) {
        let storage = self
            .create_location(&format!("{} storage", name), LocationKind::Storage, None)
            .await;
        let warehouse = self
            .create_location(name, LocationKind::Warehouse, Some(storage.id))
            .await;
        (storage, warehouse)
    }

    pub async fn create_location(
        &self,
        name: &str,
        kind: LocationKind,
        storage_location_id: Option<Uuid>,
    ) -> stock_location::Model {
        self.state
            .services
            .stock
            .create_location(CreateLocationInput {
                name: name.to_string(),
                code: None,
                kind,
                parent_id: None,
                storage_location_id,
                active: None,
            })
            .await
            .expect("create stock location")
    }

    /// Records a move straight in the `done` state, effective today.
    pub async fn record_done_move(
        &self,
        product_id: Uuid,
        from: Uuid,
        to: Uuid,
        quantity: Decimal,
    ) -> stock_move::Model {
        self.record_move_on(product_id, from, to, quantity, today(), MoveState::Done)
            .await
    }

    pub async fn record_move_on(
        &self,
        product_id: Uuid,
        from: Uuid,
        to: Uuid,
        quantity: Decimal,
        effective_date: NaiveDate,
        state: MoveState,
    ) -> stock_move::Model {
        self.state
            .services
            .stock
            .record_move(RecordMoveInput {
                product_id,
                from_location_id: from,
                to_location_id: to,
                quantity,
                uom_id: None,
                effective_date: Some(effective_date),
                state: Some(state),
            })
            .await
            .expect("record stock move")
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Reads a response body and parses it as JSON.
pub async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse response body as json")
}
