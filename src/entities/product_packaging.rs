use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Association between a product and the packaging/labeling recipe applied to
/// it. `packaged_product_id` is recorded by generation; once set, the recipe
/// link is immutable (enforced by PackagingService).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "product_packagings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Source product the recipe packages or labels
    pub product_id: Uuid,

    /// Applied packaging/labeling recipe
    pub production_template_id: Uuid,

    /// Generated packaged product, NULL until generation runs
    pub packaged_product_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::production_template::Entity",
        from = "Column::ProductionTemplateId",
        to = "super::production_template::Column::Id"
    )]
    ProductionTemplate,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::PackagedProductId",
        to = "super::product::Column::Id"
    )]
    PackagedProduct,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::production_template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionTemplate.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            active_model.created_at = Set(Utc::now());
        }

        active_model.updated_at = Set(Some(Utc::now()));

        Ok(active_model)
    }
}
