// Catalog services
pub mod products;
pub mod production_templates;

// Packaging associations and packaged-product generation
pub mod packaging;

// Stock locations, moves, and bulk aggregation
pub mod bulk_quantity;
pub mod stock;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::uom;
use crate::errors::ServiceError;

/// Fetches a UOM by id, failing with NotFound when absent.
pub(crate) async fn uom_by_id<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<uom::Model, ServiceError> {
    uom::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("UOM {} not found", id)))
}

/// Fetches a UOM by its symbol. The catalog is seeded at migration time, so a
/// missing symbol is a deployment problem rather than user error.
pub(crate) async fn uom_by_symbol<C: ConnectionTrait>(
    conn: &C,
    symbol: &str,
) -> Result<uom::Model, ServiceError> {
    uom::Entity::find()
        .filter(uom::Column::Symbol.eq(symbol))
        .one(conn)
        .await?
        .ok_or_else(|| {
            ServiceError::InternalError(format!("UOM catalog is missing symbol '{}'", symbol))
        })
}
