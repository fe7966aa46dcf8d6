use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Product template entity: the product family shared by its variants.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate, ToSchema)]
#[sea_orm(table_name = "product_templates")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Template name
    #[validate(length(
        min = 1,
        max = 255,
        message = "Template name must be between 1 and 255 characters"
    ))]
    pub name: String,

    /// Default unit of measure for stock figures of this family
    pub default_uom_id: Uuid,

    /// Whether variants of this family are tracked as bulk (unpackaged) stock.
    /// Immutable once any variant has recorded stock moves.
    pub bulk: bool,

    /// Is the template active
    pub active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::uom::Entity",
        from = "Column::DefaultUomId",
        to = "super::uom::Column::Id"
    )]
    DefaultUom,
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::uom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DefaultUom.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
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
            if let ActiveValue::NotSet = active_model.bulk {
                active_model.bulk = Set(false);
            }

            if let ActiveValue::NotSet = active_model.active {
                active_model.active = Set(true);
            }

            active_model.created_at = Set(Utc::now());
        }

        active_model.updated_at = Set(Some(Utc::now()));

        let model: Model = active_model.clone().try_into().map_err(|_| {
            DbErr::Custom("Failed to convert ActiveModel to Model for validation".to_string())
        })?;

        if let Err(err) = model.validate() {
            return Err(DbErr::Custom(format!("Validation error: {}", err)));
        }

        Ok(active_model)
    }
}
