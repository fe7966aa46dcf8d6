use super::common::PaginationParams;
use crate::entities::production_template;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::production_templates::{
    CreateProductionTemplateInput, ProductionTemplateDetail, UpdateProductionTemplateInput,
};
use crate::ApiResponse;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use uuid::Uuid;
use validator::Validate;

/// Create a production template
///
/// Packaging and labeling templates relax the quantity and UOM requirement;
/// plain recipes must carry both.
#[utoipa::path(
    post,
    path = "/api/v1/production-templates",
    request_body = CreateProductionTemplateInput,
    responses(
        (status = 201, description = "Template created", body = crate::ApiResponse<crate::services::production_templates::ProductionTemplateDetail>,
            headers(
                ("X-Request-Id" = String, description = "Unique request identifier"),
            )
        ),
        (status = 400, description = "Field rules violated", body = crate::errors::ErrorResponse)
    ),
    tag = "Production Templates"
)]
pub async fn create_template(
    State(state): State<AppState>,
    Json(input): Json<CreateProductionTemplateInput>,
) -> Result<(StatusCode, Json<ApiResponse<ProductionTemplateDetail>>), ServiceError> {
    input.validate()?;

    let detail = state.services.production_templates.create(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(detail))))
}

/// List production templates with pagination
#[utoipa::path(
    get,
    path = "/api/v1/production-templates",
    params(PaginationParams),
    responses(
        (status = 200, description = "List templates", body = crate::ApiResponse<crate::PaginatedResponse<crate::entities::production_template::Model>>)
    ),
    tag = "Production Templates"
)]
pub async fn list_templates(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<crate::PaginatedResponse<production_template::Model>>>, ServiceError>
{
    let (items, total) = state
        .services
        .production_templates
        .list(params.page, params.per_page)
        .await?;

    Ok(Json(ApiResponse::success(crate::PaginatedResponse::new(
        items,
        params.page,
        params.per_page,
        total,
    ))))
}

/// Get a production template with its input lines
#[utoipa::path(
    get,
    path = "/api/v1/production-templates/{id}",
    params(
        ("id" = Uuid, Path, description = "Production template ID")
    ),
    responses(
        (status = 200, description = "Template details", body = crate::ApiResponse<crate::services::production_templates::ProductionTemplateDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Production Templates"
)]
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProductionTemplateDetail>>, ServiceError> {
    let detail = state.services.production_templates.get(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Update a production template
///
/// The field rules are re-validated against the merged state, so a template
/// cannot be flipped into an inconsistent shape.
#[utoipa::path(
    put,
    path = "/api/v1/production-templates/{id}",
    params(
        ("id" = Uuid, Path, description = "Production template ID")
    ),
    request_body = UpdateProductionTemplateInput,
    responses(
        (status = 200, description = "Template updated", body = crate::ApiResponse<crate::services::production_templates::ProductionTemplateDetail>),
        (status = 400, description = "Field rules violated", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Production Templates"
)]
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProductionTemplateInput>,
) -> Result<Json<ApiResponse<ProductionTemplateDetail>>, ServiceError> {
    input.validate()?;

    let detail = state
        .services
        .production_templates
        .update(id, input)
        .await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Routes nested under /production-templates
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_templates).post(create_template))
        .route("/:id", get(get_template).put(update_template))
}
