use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Product entity: a concrete variant of a product template. Bulk wine,
/// packaging materials, and generated packaged products all live here.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate, ToSchema)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning product template
    pub template_id: Uuid,

    /// Variant code suffix (SKU fragment)
    #[validate(length(max = 100, message = "Code cannot exceed 100 characters"))]
    pub code: Option<String>,

    /// Volumetric content of one packaged unit
    pub capacity: Option<Decimal>,

    /// Unit of the capacity figure (volume category, defaults to liter)
    pub capacity_uom_id: Option<Uuid>,

    /// Net weight of one packaged unit (content only)
    pub net_weight: Option<Decimal>,

    /// Gross weight of one packaged unit (content plus packaging material)
    pub weight: Option<Decimal>,

    /// Unit of the weight figures (weight category)
    pub weight_uom_id: Option<Uuid>,

    /// The unpackaged source this variant derives from. NULL when the
    /// product is itself the bulk source.
    pub bulk_product_id: Option<Uuid>,

    /// Denomination of origin label
    #[validate(length(max = 255))]
    pub denomination_of_origin: Option<String>,

    /// Ecological certification
    pub ecological: bool,

    /// Harvest year
    #[validate(range(min = 1900, max = 2100, message = "Vintage must be a plausible year"))]
    pub vintage: Option<i32>,

    /// Is the product active
    pub active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_template::Entity",
        from = "Column::TemplateId",
        to = "super::product_template::Column::Id"
    )]
    Template,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::BulkProductId",
        to = "Column::Id"
    )]
    BulkProduct,
    #[sea_orm(has_many = "super::product_variety::Entity")]
    Varieties,
    #[sea_orm(has_many = "super::product_packaging::Entity")]
    Packagings,
    #[sea_orm(has_many = "super::stock_move::Entity")]
    StockMoves,
}

impl Related<super::product_template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Template.def()
    }
}

impl Related<super::product_variety::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Varieties.def()
    }
}

impl Related<super::stock_move::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockMoves.def()
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
            if let ActiveValue::NotSet = active_model.ecological {
                active_model.ecological = Set(false);
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
