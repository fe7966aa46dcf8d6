use super::common::PaginationParams;
use crate::entities::product_packaging;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::packaging::{CreatePackagingInput, UpdatePackagingInput};
use crate::ApiResponse;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

/// Query filters for association listings
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct AssociationListQuery {
    /// Restrict to associations of this source product
    pub product_id: Option<Uuid>,
}

/// Associate a product with a packaging or labeling recipe
///
/// The recipe must list the product among its inputs.
#[utoipa::path(
    post,
    path = "/api/v1/packaging-associations",
    request_body = CreatePackagingInput,
    responses(
        (status = 201, description = "Association created", body = crate::ApiResponse<crate::entities::product_packaging::Model>,
            headers(
                ("X-Request-Id" = String, description = "Unique request identifier"),
            )
        ),
        (status = 400, description = "Recipe does not package or does not list the product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product or recipe", body = crate::errors::ErrorResponse)
    ),
    tag = "Packaging"
)]
pub async fn create_association(
    State(state): State<AppState>,
    Json(input): Json<CreatePackagingInput>,
) -> Result<(StatusCode, Json<ApiResponse<product_packaging::Model>>), ServiceError> {
    let association = state.services.packaging.create_association(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(association))))
}

/// List packaging associations
#[utoipa::path(
    get,
    path = "/api/v1/packaging-associations",
    params(PaginationParams, AssociationListQuery),
    responses(
        (status = 200, description = "List associations", body = crate::ApiResponse<crate::PaginatedResponse<crate::entities::product_packaging::Model>>)
    ),
    tag = "Packaging"
)]
pub async fn list_associations(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<AssociationListQuery>,
) -> Result<Json<ApiResponse<crate::PaginatedResponse<product_packaging::Model>>>, ServiceError> {
    let (items, total) = state
        .services
        .packaging
        .list_associations(filter.product_id, params.page, params.per_page)
        .await?;

    Ok(Json(ApiResponse::success(crate::PaginatedResponse::new(
        items,
        params.page,
        params.per_page,
        total,
    ))))
}

/// Get a packaging association
#[utoipa::path(
    get,
    path = "/api/v1/packaging-associations/{id}",
    params(
        ("id" = Uuid, Path, description = "Association ID")
    ),
    responses(
        (status = 200, description = "Association details", body = crate::ApiResponse<crate::entities::product_packaging::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Packaging"
)]
pub async fn get_association(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<product_packaging::Model>>, ServiceError> {
    let association = state.services.packaging.get_association(id).await?;
    Ok(Json(ApiResponse::success(association)))
}

/// Re-point an association at another recipe
///
/// Rejected once a packaged product has been generated from it.
#[utoipa::path(
    put,
    path = "/api/v1/packaging-associations/{id}",
    params(
        ("id" = Uuid, Path, description = "Association ID")
    ),
    request_body = UpdatePackagingInput,
    responses(
        (status = 200, description = "Association updated", body = crate::ApiResponse<crate::entities::product_packaging::Model>),
        (status = 400, description = "Already generated or recipe invalid", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Packaging"
)]
pub async fn update_association(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePackagingInput>,
) -> Result<Json<ApiResponse<product_packaging::Model>>, ServiceError> {
    let association = state
        .services
        .packaging
        .update_association(id, input)
        .await?;
    Ok(Json(ApiResponse::success(association)))
}

/// Delete a packaging association
///
/// Rejected once a packaged product has been generated from it.
#[utoipa::path(
    delete,
    path = "/api/v1/packaging-associations/{id}",
    params(
        ("id" = Uuid, Path, description = "Association ID")
    ),
    responses(
        (status = 204, description = "Association deleted"),
        (status = 400, description = "Already generated", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Packaging"
)]
pub async fn delete_association(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.packaging.delete_association(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Routes nested under /packaging-associations
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_associations).post(create_association))
        .route(
            "/:id",
            get(get_association)
                .put(update_association)
                .delete(delete_association),
        )
}
