use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of stock location. Bulk quantity aggregation defaults to the storage
/// zones of active warehouses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum LocationKind {
    #[sea_orm(string_value = "warehouse")]
    Warehouse,
    #[sea_orm(string_value = "storage")]
    Storage,
    #[sea_orm(string_value = "production")]
    Production,
    #[sea_orm(string_value = "supplier")]
    Supplier,
    #[sea_orm(string_value = "customer")]
    Customer,
    #[sea_orm(string_value = "lost_found")]
    LostFound,
}

/// Stock location entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "stock_locations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    pub code: Option<String>,

    pub kind: LocationKind,

    /// Parent location in the warehouse tree
    pub parent_id: Option<Uuid>,

    /// Storage zone of a warehouse; set only for `kind = warehouse`
    pub storage_location_id: Option<Uuid>,

    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::StorageLocationId",
        to = "Column::Id"
    )]
    StorageLocation,
}

impl ActiveModelBehavior for ActiveModel {}
