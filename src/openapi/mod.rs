use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vinifera API",
        version = "1.0.0",
        description = r#"
# Vinifera Bulk Wine API

API for managing agronomics bulk wine products: the catalog of bulk and
packaged products, packaging and labeling recipes, warehouse stock moves, and
the aggregation that values bulk stock in liters.

## Features

- **Product Catalog**: Templates with a bulk flag and variants carrying capacity, weights and varietal composition
- **Bulk Quantities**: Liters of bulk wine per product, aggregated across warehouse storage zones with capacity weighting
- **Production Templates**: Recipes, including packaging and labeling variants with conditional field rules
- **Packaging Associations**: Link bulk products to recipes and generate packaged products with their bill of materials
- **Stock**: Warehouse location tree and stock moves feeding the quantity aggregation

## Identity

Endpoints are unauthenticated but identity-aware. Two optional headers drive
field protection:

- `X-User-Id`: UUID of the acting user; absent means an internal caller
- `X-Check-Access`: set to `false` to bypass protected-field rules

Protected fields (such as a template's `bulk` flag once stock moves exist) are
frozen only for identified callers with access checking enabled.

## Error Handling

Errors use a consistent response format with appropriate HTTP status codes:

```json
{
  "error": "Bad Request",
  "message": "Validation error: ...",
  "request_id": "req-abc123xyz",
  "timestamp": "2025-04-09T10:30:00.000Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `per_page` (default 20) query
parameters and return items together with total counts.
        "#
    ),
    servers(
        (url = "/", description = "Current host"),
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Product Templates", description = "Templates and the bulk flag"),
        (name = "Products", description = "Products, bulk quantities and packaged-product generation"),
        (name = "Production Templates", description = "Recipes with packaging and labeling rules"),
        (name = "Packaging", description = "Associations between bulk products and recipes"),
        (name = "Stock", description = "Locations and stock moves"),
        (name = "UOMs", description = "Unit of measure catalog")
    ),
    paths(
        // Product templates
        crate::handlers::products::create_template,
        crate::handlers::products::list_templates,
        crate::handlers::products::get_template,
        crate::handlers::products::update_template,

        // Products
        crate::handlers::products::create_product,
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::product_bulk_quantity,
        crate::handlers::products::bulk_quantities,
        crate::handlers::products::search_by_bulk_quantity,
        crate::handlers::products::generate_packaging,

        // Production templates
        crate::handlers::production_templates::create_template,
        crate::handlers::production_templates::list_templates,
        crate::handlers::production_templates::get_template,
        crate::handlers::production_templates::update_template,

        // Packaging associations
        crate::handlers::packaging::create_association,
        crate::handlers::packaging::list_associations,
        crate::handlers::packaging::get_association,
        crate::handlers::packaging::update_association,
        crate::handlers::packaging::delete_association,

        // Stock
        crate::handlers::stock::create_location,
        crate::handlers::stock::list_locations,
        crate::handlers::stock::get_location,
        crate::handlers::stock::record_move,
        crate::handlers::stock::list_moves,
        crate::handlers::stock::set_move_state,

        // UOM catalog
        crate::handlers::uoms::list_uoms,
        crate::handlers::uoms::get_uom,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,

            // Entities
            crate::entities::product::Model,
            crate::entities::product_template::Model,
            crate::entities::product_variety::Model,
            crate::entities::product_packaging::Model,
            crate::entities::production_template::Model,
            crate::entities::production_template_input::Model,
            crate::entities::stock_location::Model,
            crate::entities::stock_location::LocationKind,
            crate::entities::stock_move::Model,
            crate::entities::stock_move::MoveState,
            crate::entities::uom::Model,
            crate::entities::uom::UomCategory,

            // Catalog types
            crate::services::products::CreateProductTemplateInput,
            crate::services::products::UpdateProductTemplateInput,
            crate::services::products::CreateProductInput,
            crate::services::products::UpdateProductInput,
            crate::services::products::VarietyInput,
            crate::services::products::ProductDetail,

            // Recipe types
            crate::services::production_templates::CreateProductionTemplateInput,
            crate::services::production_templates::UpdateProductionTemplateInput,
            crate::services::production_templates::RecipeInputLine,
            crate::services::production_templates::ProductionTemplateDetail,

            // Packaging types
            crate::services::packaging::CreatePackagingInput,
            crate::services::packaging::UpdatePackagingInput,
            crate::services::packaging::GeneratedPackaging,

            // Stock types
            crate::services::stock::CreateLocationInput,
            crate::services::stock::RecordMoveInput,
            crate::handlers::stock::MoveStateRequest,

            // Bulk quantity types
            crate::services::bulk_quantity::CompareOperator,
            crate::handlers::products::BulkQuantitiesRequest,
            crate::handlers::products::BulkQuantitySearchRequest,
            crate::handlers::products::GeneratePackagingRequest,
            crate::handlers::products::ProductWithQuantity,
            crate::handlers::products::TemplateWithQuantity,
            crate::handlers::products::BulkQuantityResponse,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_covers_the_api() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Vinifera API"));
        assert!(json.contains("/api/v1/products/generate-packaging"));
        assert!(json.contains("/api/v1/packaging-associations"));
        assert!(json.contains("/api/v1/stock/moves"));
    }
}
