use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Production template entity: a manufacturing recipe. Packaging and labeling
/// recipes drive packaged-product generation; their quantity/uom pair is
/// optional, for plain recipes it is required (enforced by the service rule
/// table, not the schema).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate, ToSchema)]
#[sea_orm(table_name = "production_templates")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Recipe name
    #[validate(length(
        min = 1,
        max = 255,
        message = "Recipe name must be between 1 and 255 characters"
    ))]
    pub name: String,

    /// Recipe bottles bulk content into a packaging material
    pub packaging: bool,

    /// Recipe relabels an already packaged product
    pub labeling: bool,

    /// Packaging material product, only meaningful for packaging recipes
    pub packaging_product_id: Option<Uuid>,

    /// Product family the recipe outputs; recipes without one are skipped
    /// by packaged-product generation
    pub output_template_id: Option<Uuid>,

    /// Batch quantity of the recipe
    pub quantity: Option<Decimal>,

    /// Unit of the batch quantity
    pub uom_id: Option<Uuid>,

    /// Is the recipe active
    pub active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::PackagingProductId",
        to = "super::product::Column::Id"
    )]
    PackagingProduct,
    #[sea_orm(
        belongs_to = "super::product_template::Entity",
        from = "Column::OutputTemplateId",
        to = "super::product_template::Column::Id"
    )]
    OutputTemplate,
    #[sea_orm(has_many = "super::production_template_input::Entity")]
    Inputs,
}

impl Related<super::production_template_input::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inputs.def()
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
            if let ActiveValue::NotSet = active_model.packaging {
                active_model.packaging = Set(false);
            }

            if let ActiveValue::NotSet = active_model.labeling {
                active_model.labeling = Set(false);
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
