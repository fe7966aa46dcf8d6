use crate::entities::uom::{self, Entity as UomEntity};
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::ApiResponse;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use sea_orm::{EntityTrait, QueryOrder};
use uuid::Uuid;

// The UOM catalog is seeded by the migrations and read-only over HTTP.

/// List units of measure
#[utoipa::path(
    get,
    path = "/api/v1/uoms",
    responses(
        (status = 200, description = "List units", body = crate::ApiResponse<Vec<crate::entities::uom::Model>>)
    ),
    tag = "UOMs"
)]
pub async fn list_uoms(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<uom::Model>>>, ServiceError> {
    let units = UomEntity::find()
        .order_by_asc(uom::Column::Name)
        .all(&*state.db)
        .await?;
    Ok(Json(ApiResponse::success(units)))
}

/// Get a unit of measure
#[utoipa::path(
    get,
    path = "/api/v1/uoms/{id}",
    params(
        ("id" = Uuid, Path, description = "UOM ID")
    ),
    responses(
        (status = 200, description = "Unit details", body = crate::ApiResponse<crate::entities::uom::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "UOMs"
)]
pub async fn get_uom(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<uom::Model>>, ServiceError> {
    let unit = UomEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("UOM {} not found", id)))?;
    Ok(Json(ApiResponse::success(unit)))
}

/// Routes nested under /uoms
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_uoms))
        .route("/:id", get(get_uom))
}
