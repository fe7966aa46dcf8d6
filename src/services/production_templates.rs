use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        product::Entity as ProductEntity,
        product_packaging::{self, Entity as ProductPackagingEntity},
        product_template::Entity as ProductTemplateEntity,
        production_template::{self, Entity as ProductionTemplateEntity},
        production_template_input::{self, Entity as ProductionTemplateInputEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::uom_by_id,
};

/// One extra ingredient line of a recipe (enology products and their doses)
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct RecipeInputLine {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub uom_id: Uuid,
}

/// Payload for creating a production template
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductionTemplateInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub packaging: Option<bool>,
    pub labeling: Option<bool>,
    pub packaging_product_id: Option<Uuid>,
    pub output_template_id: Option<Uuid>,
    pub quantity: Option<Decimal>,
    pub uom_id: Option<Uuid>,
    pub active: Option<bool>,
    #[serde(default)]
    #[validate]
    pub inputs: Vec<RecipeInputLine>,
}

/// Payload for updating a production template. `inputs`, when present,
/// replaces the whole line list.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductionTemplateInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub packaging: Option<bool>,
    pub labeling: Option<bool>,
    pub packaging_product_id: Option<Uuid>,
    pub output_template_id: Option<Uuid>,
    pub quantity: Option<Decimal>,
    pub uom_id: Option<Uuid>,
    pub active: Option<bool>,
    #[validate]
    pub inputs: Option<Vec<RecipeInputLine>>,
}

/// Production template read model: the row plus its input lines
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductionTemplateDetail {
    #[serde(flatten)]
    pub template: production_template::Model,
    pub inputs: Vec<production_template_input::Model>,
}

/// Service for production templates (recipes) and their input lines
#[derive(Clone)]
pub struct ProductionTemplateService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

/// The field rules that replace per-field UI states: batch quantity and unit
/// are mandatory for plain recipes, a packaging material only makes sense on a
/// packaging recipe, and a recipe cannot both package and label.
pub fn validate_recipe_rules(
    packaging: bool,
    labeling: bool,
    quantity: Option<Decimal>,
    uom_id: Option<Uuid>,
    packaging_product_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    if packaging && labeling {
        return Err(ServiceError::ValidationError(
            "A production template cannot be both packaging and labeling".to_string(),
        ));
    }
    if packaging_product_id.is_some() && !packaging {
        return Err(ServiceError::ValidationError(
            "A packaging product may only be set on a packaging template".to_string(),
        ));
    }
    if !packaging && !labeling && (quantity.is_none() || uom_id.is_none()) {
        return Err(ServiceError::ValidationError(
            "Quantity and UOM are required unless the template is packaging or labeling"
                .to_string(),
        ));
    }
    Ok(())
}

impl ProductionTemplateService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a production template with its input lines
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        input: CreateProductionTemplateInput,
    ) -> Result<ProductionTemplateDetail, ServiceError> {
        let packaging = input.packaging.unwrap_or(false);
        let labeling = input.labeling.unwrap_or(false);

        validate_recipe_rules(
            packaging,
            labeling,
            input.quantity,
            input.uom_id,
            input.packaging_product_id,
        )?;

        let db = &*self.db;
        let txn = db.begin().await?;

        if let Some(product_id) = input.packaging_product_id {
            ProductEntity::find_by_id(product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Packaging product {} not found", product_id))
                })?;
        }
        if let Some(template_id) = input.output_template_id {
            ProductTemplateEntity::find_by_id(template_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Output template {} not found", template_id))
                })?;
        }
        if let Some(uom_id) = input.uom_id {
            uom_by_id(&txn, uom_id).await?;
        }

        let template_id = Uuid::new_v4();
        let model = production_template::ActiveModel {
            id: Set(template_id),
            name: Set(input.name),
            packaging: Set(packaging),
            labeling: Set(labeling),
            packaging_product_id: Set(input.packaging_product_id),
            output_template_id: Set(input.output_template_id),
            quantity: Set(input.quantity),
            uom_id: Set(input.uom_id),
            active: input.active.map_or(ActiveValue::NotSet, Set),
            ..Default::default()
        };

        let created = model.insert(&txn).await.map_err(|e| {
            error!("Failed to create production template: {}", e);
            ServiceError::db_error(e)
        })?;

        let lines = insert_input_lines(&txn, template_id, &input.inputs).await?;

        txn.commit().await?;

        info!(
            "Production template created: id={}, packaging={}, labeling={}, inputs={}",
            created.id,
            created.packaging,
            created.labeling,
            lines.len()
        );

        self.event_sender
            .send(Event::ProductionTemplateCreated(created.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(ProductionTemplateDetail {
            template: created,
            inputs: lines,
        })
    }

    /// Gets a production template with its input lines
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ProductionTemplateDetail, ServiceError> {
        let db = &*self.db;

        let template = ProductionTemplateEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Production template {} not found", id))
            })?;

        let inputs = ProductionTemplateInputEntity::find()
            .filter(production_template_input::Column::ProductionTemplateId.eq(id))
            .all(db)
            .await?;

        Ok(ProductionTemplateDetail { template, inputs })
    }

    /// Lists production templates, newest first
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<production_template::Model>, u64), ServiceError> {
        let paginator = ProductionTemplateEntity::find()
            .order_by_desc(production_template::Column::CreatedAt)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let templates = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((templates, total))
    }

    /// Updates a production template, re-validating the field rules against
    /// the merged state.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateProductionTemplateInput,
    ) -> Result<ProductionTemplateDetail, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let current = ProductionTemplateEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Production template {} not found", id))
            })?;

        let packaging = input.packaging.unwrap_or(current.packaging);
        let labeling = input.labeling.unwrap_or(current.labeling);
        let quantity = input.quantity.or(current.quantity);
        let uom_id = input.uom_id.or(current.uom_id);
        let packaging_product_id = input.packaging_product_id.or(current.packaging_product_id);

        validate_recipe_rules(packaging, labeling, quantity, uom_id, packaging_product_id)?;

        if let Some(product_id) = input.packaging_product_id {
            ProductEntity::find_by_id(product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Packaging product {} not found", product_id))
                })?;
        }
        if let Some(template_id) = input.output_template_id {
            ProductTemplateEntity::find_by_id(template_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Output template {} not found", template_id))
                })?;
        }
        if let Some(uom_id) = input.uom_id {
            uom_by_id(&txn, uom_id).await?;
        }

        let mut active_model = current.into_active_model();
        if let Some(name) = input.name {
            active_model.name = Set(name);
        }
        active_model.packaging = Set(packaging);
        active_model.labeling = Set(labeling);
        if let Some(product_id) = input.packaging_product_id {
            active_model.packaging_product_id = Set(Some(product_id));
        }
        if let Some(template_id) = input.output_template_id {
            active_model.output_template_id = Set(Some(template_id));
        }
        if let Some(quantity) = input.quantity {
            active_model.quantity = Set(Some(quantity));
        }
        if let Some(uom_id) = input.uom_id {
            active_model.uom_id = Set(Some(uom_id));
        }
        if let Some(active) = input.active {
            active_model.active = Set(active);
        }

        let updated = active_model.update(&txn).await.map_err(|e| {
            error!("Failed to update production template {}: {}", id, e);
            ServiceError::db_error(e)
        })?;

        let lines = match input.inputs {
            Some(lines) => {
                ProductionTemplateInputEntity::delete_many()
                    .filter(production_template_input::Column::ProductionTemplateId.eq(id))
                    .exec(&txn)
                    .await?;
                insert_input_lines(&txn, id, &lines).await?
            }
            None => {
                ProductionTemplateInputEntity::find()
                    .filter(production_template_input::Column::ProductionTemplateId.eq(id))
                    .all(&txn)
                    .await?
            }
        };

        txn.commit().await?;

        self.event_sender
            .send(Event::ProductionTemplateUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(ProductionTemplateDetail {
            template: updated,
            inputs: lines,
        })
    }

    /// Deletes a production template. Rejected while any packaging
    /// association still references it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let template = ProductionTemplateEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Production template {} not found", id))
            })?;

        let referenced = ProductPackagingEntity::find()
            .filter(product_packaging::Column::ProductionTemplateId.eq(id))
            .one(&txn)
            .await?;
        if referenced.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Production template \"{}\" is referenced by packaging associations",
                template.name
            )));
        }

        ProductionTemplateInputEntity::delete_many()
            .filter(production_template_input::Column::ProductionTemplateId.eq(id))
            .exec(&txn)
            .await?;
        template.delete(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send(Event::ProductionTemplateDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }
}

async fn insert_input_lines<C: sea_orm::ConnectionTrait>(
    conn: &C,
    template_id: Uuid,
    lines: &[RecipeInputLine],
) -> Result<Vec<production_template_input::Model>, ServiceError> {
    let mut created = Vec::with_capacity(lines.len());
    for line in lines {
        ProductEntity::find_by_id(line.product_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Input product {} not found", line.product_id))
            })?;
        uom_by_id(conn, line.uom_id).await?;

        let model = production_template_input::ActiveModel {
            id: Set(Uuid::new_v4()),
            production_template_id: Set(template_id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            uom_id: Set(line.uom_id),
        };
        created.push(model.insert(conn).await?);
    }
    Ok(created)
}
