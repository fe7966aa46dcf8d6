use super::common::PaginationParams;
use crate::context::RequestContext;
use crate::entities::{product, product_template};
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::bulk_quantity::CompareOperator;
use crate::services::packaging::GeneratedPackaging;
use crate::services::products::{
    CreateProductInput, CreateProductTemplateInput, ProductDetail, ProductFilter,
    UpdateProductInput, UpdateProductTemplateInput,
};
use crate::ApiResponse;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Query filters for product listings
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ProductListQuery {
    /// Restrict to variants of this template
    pub template_id: Option<Uuid>,
    /// Filter on the template-level bulk flag
    pub bulk: Option<bool>,
    pub active: Option<bool>,
}

/// Location and date scope for stock quantity reads
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct StockScopeQuery {
    /// Comma separated location ids. Defaults to the storage zones of active
    /// warehouses.
    pub locations: Option<String>,
    /// Valuation date (YYYY-MM-DD). Defaults to today.
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "product_ids": ["550e8400-e29b-41d4-a716-446655440000"],
    "as_of": "2025-06-30"
}))]
pub struct BulkQuantitiesRequest {
    /// Products to aggregate
    #[validate(length(min = 1, max = 500))]
    pub product_ids: Vec<Uuid>,
    /// Location scope; empty means the storage zones of active warehouses
    #[serde(default)]
    pub locations: Vec<Uuid>,
    /// Valuation date; defaults to today
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "operator": "ge",
    "value": "1000",
    "locations": []
}))]
pub struct BulkQuantitySearchRequest {
    /// Comparison operator (eq, ne, lt, le, gt, ge)
    pub operator: CompareOperator,
    /// Right-hand side of the comparison, in liters
    pub value: Decimal,
    #[serde(default)]
    pub locations: Vec<Uuid>,
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct GeneratePackagingRequest {
    /// Source bulk products to process
    #[validate(length(min = 1, max = 100))]
    pub product_ids: Vec<Uuid>,
}

/// A product read together with its aggregated bulk quantity
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductWithQuantity {
    #[serde(flatten)]
    pub product: ProductDetail,
    /// Liters of bulk wine attributable to this product
    pub bulk_quantity: Decimal,
}

/// A template read together with the summed bulk quantity of its variants
#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateWithQuantity {
    #[serde(flatten)]
    pub template: product_template::Model,
    pub bulk_quantity: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkQuantityResponse {
    pub product_id: Uuid,
    pub bulk_quantity: Decimal,
}

fn parse_locations(raw: Option<&str>) -> Result<Vec<Uuid>, ServiceError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            Uuid::parse_str(part).map_err(|_| {
                ServiceError::InvalidInput(format!("Invalid location id: {}", part))
            })
        })
        .collect()
}

// Handler functions

/// Create a product template
#[utoipa::path(
    post,
    path = "/api/v1/product-templates",
    request_body = CreateProductTemplateInput,
    responses(
        (status = 201, description = "Template created", body = crate::ApiResponse<crate::entities::product_template::Model>,
            headers(
                ("X-Request-Id" = String, description = "Unique request identifier"),
            )
        ),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse)
    ),
    tag = "Product Templates"
)]
pub async fn create_template(
    State(state): State<AppState>,
    Json(input): Json<CreateProductTemplateInput>,
) -> Result<(StatusCode, Json<ApiResponse<product_template::Model>>), ServiceError> {
    input.validate()?;

    let template = state.services.products.create_template(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(template))))
}

/// List product templates with pagination
#[utoipa::path(
    get,
    path = "/api/v1/product-templates",
    params(PaginationParams),
    responses(
        (status = 200, description = "List templates", body = crate::ApiResponse<crate::PaginatedResponse<crate::entities::product_template::Model>>)
    ),
    tag = "Product Templates"
)]
pub async fn list_templates(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<crate::PaginatedResponse<product_template::Model>>>, ServiceError> {
    let (items, total) = state
        .services
        .products
        .list_templates(params.page, params.per_page)
        .await?;

    Ok(Json(ApiResponse::success(crate::PaginatedResponse::new(
        items,
        params.page,
        params.per_page,
        total,
    ))))
}

/// Get a product template with the summed bulk quantity of its variants
#[utoipa::path(
    get,
    path = "/api/v1/product-templates/{id}",
    params(
        ("id" = Uuid, Path, description = "Template ID")
    ),
    responses(
        (status = 200, description = "Template details", body = crate::ApiResponse<TemplateWithQuantity>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Product Templates"
)]
pub async fn get_template(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TemplateWithQuantity>>, ServiceError> {
    let template = state.services.products.get_template(id).await?;
    let bulk_quantity = state
        .services
        .bulk_quantity
        .template_bulk_quantity(&ctx, id)
        .await?;

    Ok(Json(ApiResponse::success(TemplateWithQuantity {
        template,
        bulk_quantity,
    })))
}

/// Update a product template
///
/// Changing `bulk` is rejected with 403 for access-checked callers once any
/// variant of the template has stock moves.
#[utoipa::path(
    put,
    path = "/api/v1/product-templates/{id}",
    params(
        ("id" = Uuid, Path, description = "Template ID")
    ),
    request_body = UpdateProductTemplateInput,
    responses(
        (status = 200, description = "Template updated", body = crate::ApiResponse<crate::entities::product_template::Model>),
        (status = 403, description = "Protected field frozen by existing stock moves", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Product Templates"
)]
pub async fn update_template(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProductTemplateInput>,
) -> Result<Json<ApiResponse<product_template::Model>>, ServiceError> {
    input.validate()?;

    let template = state
        .services
        .products
        .update_template(&ctx, id, input)
        .await?;
    Ok(Json(ApiResponse::success(template)))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Product created", body = crate::ApiResponse<crate::services::products::ProductDetail>,
            headers(
                ("X-Request-Id" = String, description = "Unique request identifier"),
            )
        ),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> Result<(StatusCode, Json<ApiResponse<ProductDetail>>), ServiceError> {
    input.validate()?;

    let detail = state.services.products.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(detail))))
}

/// List products with pagination and filtering
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(PaginationParams, ProductListQuery),
    responses(
        (status = 200, description = "List products", body = crate::ApiResponse<crate::PaginatedResponse<crate::entities::product::Model>>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<ProductListQuery>,
) -> Result<Json<ApiResponse<crate::PaginatedResponse<product::Model>>>, ServiceError> {
    let filter = ProductFilter {
        template_id: filter.template_id,
        bulk: filter.bulk,
        active: filter.active,
    };

    let (items, total) = state
        .services
        .products
        .list_products(filter, params.page, params.per_page)
        .await?;

    Ok(Json(ApiResponse::success(crate::PaginatedResponse::new(
        items,
        params.page,
        params.per_page,
        total,
    ))))
}

/// Get a product with its varietal composition and bulk quantity
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product details", body = crate::ApiResponse<ProductWithQuantity>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProductWithQuantity>>, ServiceError> {
    let detail = state.services.products.get_product(id).await?;
    let quantities = state
        .services
        .bulk_quantity
        .bulk_quantities(&ctx, &[id])
        .await?;
    let bulk_quantity = quantities.get(&id).copied().unwrap_or_default();

    Ok(Json(ApiResponse::success(ProductWithQuantity {
        product: detail,
        bulk_quantity,
    })))
}

/// Update a product
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProductInput,
    responses(
        (status = 200, description = "Product updated", body = crate::ApiResponse<crate::services::products::ProductDetail>),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> Result<Json<ApiResponse<ProductDetail>>, ServiceError> {
    input.validate()?;

    let detail = state.services.products.update_product(id, input).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Get the bulk quantity of one product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/bulk-quantity",
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        StockScopeQuery
    ),
    responses(
        (status = 200, description = "Aggregated bulk quantity", body = crate::ApiResponse<BulkQuantityResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn product_bulk_quantity(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Query(scope): Query<StockScopeQuery>,
) -> Result<Json<ApiResponse<BulkQuantityResponse>>, ServiceError> {
    // Unknown ids get a 404 rather than a silent zero
    state.services.products.get_product(id).await?;

    let locations = parse_locations(scope.locations.as_deref())?;
    let ctx = ctx.with_locations(locations).with_stock_date(scope.as_of);

    let quantities = state
        .services
        .bulk_quantity
        .bulk_quantities(&ctx, &[id])
        .await?;
    let bulk_quantity = quantities.get(&id).copied().unwrap_or_default();

    Ok(Json(ApiResponse::success(BulkQuantityResponse {
        product_id: id,
        bulk_quantity,
    })))
}

/// Get bulk quantities for a batch of products
#[utoipa::path(
    post,
    path = "/api/v1/products/bulk-quantities",
    request_body = BulkQuantitiesRequest,
    responses(
        (status = 200, description = "Aggregated bulk quantities", body = crate::ApiResponse<Vec<BulkQuantityResponse>>),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn bulk_quantities(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<BulkQuantitiesRequest>,
) -> Result<Json<ApiResponse<Vec<BulkQuantityResponse>>>, ServiceError> {
    request.validate()?;

    let ctx = ctx
        .with_locations(request.locations)
        .with_stock_date(request.as_of);
    let quantities = state
        .services
        .bulk_quantity
        .bulk_quantities(&ctx, &request.product_ids)
        .await?;

    let items = request
        .product_ids
        .iter()
        .map(|id| BulkQuantityResponse {
            product_id: *id,
            bulk_quantity: quantities.get(id).copied().unwrap_or_default(),
        })
        .collect();

    Ok(Json(ApiResponse::success(items)))
}

/// Search products by bulk quantity
#[utoipa::path(
    post,
    path = "/api/v1/products/search/bulk-quantity",
    request_body = BulkQuantitySearchRequest,
    responses(
        (status = 200, description = "Matching product ids", body = crate::ApiResponse<Vec<Uuid>>),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn search_by_bulk_quantity(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<BulkQuantitySearchRequest>,
) -> Result<Json<ApiResponse<Vec<Uuid>>>, ServiceError> {
    let ctx = ctx
        .with_locations(request.locations)
        .with_stock_date(request.as_of);
    let ids = state
        .services
        .bulk_quantity
        .search_by_bulk_quantity(&ctx, request.operator, request.value)
        .await?;

    Ok(Json(ApiResponse::success(ids)))
}

/// Generate packaged products for bulk sources
///
/// Walks every packaging association of each source that has no generated
/// product yet. Running it again is a no-op and returns an empty report.
#[utoipa::path(
    post,
    path = "/api/v1/products/generate-packaging",
    request_body = GeneratePackagingRequest,
    responses(
        (status = 200, description = "Generation report", body = crate::ApiResponse<Vec<crate::services::packaging::GeneratedPackaging>>,
            headers(
                ("X-Request-Id" = String, description = "Unique request identifier"),
            )
        ),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown source product", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn generate_packaging(
    State(state): State<AppState>,
    Json(request): Json<GeneratePackagingRequest>,
) -> Result<Json<ApiResponse<Vec<GeneratedPackaging>>>, ServiceError> {
    request.validate()?;

    let report = state
        .services
        .packaging
        .generate_packaged_products(&request.product_ids)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Routes nested under /product-templates
pub fn template_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_template).get(list_templates))
        .route("/:id", get(get_template).put(update_template))
}

/// Routes nested under /products
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/bulk-quantities", post(bulk_quantities))
        .route("/search/bulk-quantity", post(search_by_bulk_quantity))
        .route("/generate-packaging", post(generate_packaging))
        .route("/:id", get(get_product).put(update_product))
        .route("/:id/bulk-quantity", get(product_bulk_quantity))
}
