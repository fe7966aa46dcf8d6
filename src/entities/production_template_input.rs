use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Input line of a production template: an enology additive consumed at its
/// stated quantity when the recipe runs.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "production_template_inputs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub production_template_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub uom_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::production_template::Entity",
        from = "Column::ProductionTemplateId",
        to = "super::production_template::Column::Id"
    )]
    ProductionTemplate,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::uom::Entity",
        from = "Column::UomId",
        to = "super::uom::Column::Id"
    )]
    Uom,
}

impl Related<super::production_template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionTemplate.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
