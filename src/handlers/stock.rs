use super::common::PaginationParams;
use crate::entities::{
    stock_location::{self, LocationKind},
    stock_move::{self, MoveState},
};
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::stock::{CreateLocationInput, MoveFilter, RecordMoveInput};
use crate::ApiResponse;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Query filters for location listings
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct LocationListQuery {
    /// Filter by location kind
    pub kind: Option<LocationKind>,
}

/// Query filters for move listings
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct MoveListQuery {
    pub product_id: Option<Uuid>,
    pub state: Option<MoveState>,
}

/// Target state for a move transition
#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveStateRequest {
    pub state: MoveState,
}

/// Create a stock location
///
/// Warehouses must reference their storage zone; other kinds must not.
#[utoipa::path(
    post,
    path = "/api/v1/stock/locations",
    request_body = CreateLocationInput,
    responses(
        (status = 201, description = "Location created", body = crate::ApiResponse<crate::entities::stock_location::Model>,
            headers(
                ("X-Request-Id" = String, description = "Unique request identifier"),
            )
        ),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse)
    ),
    tag = "Stock"
)]
pub async fn create_location(
    State(state): State<AppState>,
    Json(input): Json<CreateLocationInput>,
) -> Result<(StatusCode, Json<ApiResponse<stock_location::Model>>), ServiceError> {
    input.validate()?;

    let location = state.services.stock.create_location(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(location))))
}

/// List stock locations
#[utoipa::path(
    get,
    path = "/api/v1/stock/locations",
    params(PaginationParams, LocationListQuery),
    responses(
        (status = 200, description = "List locations", body = crate::ApiResponse<crate::PaginatedResponse<crate::entities::stock_location::Model>>)
    ),
    tag = "Stock"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<LocationListQuery>,
) -> Result<Json<ApiResponse<crate::PaginatedResponse<stock_location::Model>>>, ServiceError> {
    let (items, total) = state
        .services
        .stock
        .list_locations(filter.kind, params.page, params.per_page)
        .await?;

    Ok(Json(ApiResponse::success(crate::PaginatedResponse::new(
        items,
        params.page,
        params.per_page,
        total,
    ))))
}

/// Get a stock location
#[utoipa::path(
    get,
    path = "/api/v1/stock/locations/{id}",
    params(
        ("id" = Uuid, Path, description = "Location ID")
    ),
    responses(
        (status = 200, description = "Location details", body = crate::ApiResponse<crate::entities::stock_location::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Stock"
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<stock_location::Model>>, ServiceError> {
    let location = state.services.stock.get_location(id).await?;
    Ok(Json(ApiResponse::success(location)))
}

/// Record a stock move
///
/// Moves are created in draft unless a state is given; only done moves count
/// towards on-hand quantities.
#[utoipa::path(
    post,
    path = "/api/v1/stock/moves",
    request_body = RecordMoveInput,
    responses(
        (status = 201, description = "Move recorded", body = crate::ApiResponse<crate::entities::stock_move::Model>,
            headers(
                ("X-Request-Id" = String, description = "Unique request identifier"),
            )
        ),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product or location", body = crate::errors::ErrorResponse)
    ),
    tag = "Stock"
)]
pub async fn record_move(
    State(state): State<AppState>,
    Json(input): Json<RecordMoveInput>,
) -> Result<(StatusCode, Json<ApiResponse<stock_move::Model>>), ServiceError> {
    input.validate()?;

    let mv = state.services.stock.record_move(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(mv))))
}

/// List stock moves
#[utoipa::path(
    get,
    path = "/api/v1/stock/moves",
    params(PaginationParams, MoveListQuery),
    responses(
        (status = 200, description = "List moves", body = crate::ApiResponse<crate::PaginatedResponse<crate::entities::stock_move::Model>>)
    ),
    tag = "Stock"
)]
pub async fn list_moves(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<MoveListQuery>,
) -> Result<Json<ApiResponse<crate::PaginatedResponse<stock_move::Model>>>, ServiceError> {
    let filter = MoveFilter {
        product_id: filter.product_id,
        state: filter.state,
    };

    let (items, total) = state
        .services
        .stock
        .list_moves(filter, params.page, params.per_page)
        .await?;

    Ok(Json(ApiResponse::success(crate::PaginatedResponse::new(
        items,
        params.page,
        params.per_page,
        total,
    ))))
}

/// Transition a stock move to done or cancelled
#[utoipa::path(
    put,
    path = "/api/v1/stock/moves/{id}/state",
    params(
        ("id" = Uuid, Path, description = "Move ID")
    ),
    request_body = MoveStateRequest,
    responses(
        (status = 200, description = "Move transitioned", body = crate::ApiResponse<crate::entities::stock_move::Model>),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Stock"
)]
pub async fn set_move_state(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MoveStateRequest>,
) -> Result<Json<ApiResponse<stock_move::Model>>, ServiceError> {
    let mv = state
        .services
        .stock
        .set_move_state(id, request.state)
        .await?;
    Ok(Json(ApiResponse::success(mv)))
}

/// Routes nested under /stock
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/locations", get(list_locations).post(create_location))
        .route("/locations/:id", get(get_location))
        .route("/moves", get(list_moves).post(record_move))
        .route("/moves/:id/state", put(set_move_state))
}
