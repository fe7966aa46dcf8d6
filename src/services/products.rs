use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    EntityTrait, IntoActiveModel, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    context::RequestContext,
    entities::{
        product::{self, Entity as ProductEntity},
        product_template::{self, Entity as ProductTemplateEntity},
        product_variety::{self, Entity as ProductVarietyEntity},
        stock_move::{self, Entity as StockMoveEntity},
        uom,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{uom_by_id, uom_by_symbol},
};

/// Payload for creating a product template
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductTemplateInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub default_uom_id: Uuid,
    pub bulk: Option<bool>,
    pub active: Option<bool>,
}

/// Payload for updating a product template. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductTemplateInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub default_uom_id: Option<Uuid>,
    pub bulk: Option<bool>,
    pub active: Option<bool>,
}

/// One varietal composition line
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct VarietyInput {
    #[validate(length(min = 1, max = 255))]
    pub variety: String,
    pub percent: Decimal,
}

/// Payload for creating a product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    pub template_id: Uuid,
    #[validate(length(max = 100))]
    pub code: Option<String>,
    pub capacity: Option<Decimal>,
    pub capacity_uom_id: Option<Uuid>,
    pub net_weight: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub weight_uom_id: Option<Uuid>,
    pub bulk_product_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub denomination_of_origin: Option<String>,
    pub ecological: Option<bool>,
    #[validate(range(min = 1900, max = 2100))]
    pub vintage: Option<i32>,
    pub active: Option<bool>,
    #[serde(default)]
    #[validate]
    pub varieties: Vec<VarietyInput>,
}

/// Payload for updating a product. `varieties`, when present, replaces the
/// whole composition list.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductInput {
    #[validate(length(max = 100))]
    pub code: Option<String>,
    pub capacity: Option<Decimal>,
    pub capacity_uom_id: Option<Uuid>,
    pub net_weight: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub weight_uom_id: Option<Uuid>,
    pub bulk_product_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub denomination_of_origin: Option<String>,
    pub ecological: Option<bool>,
    #[validate(range(min = 1900, max = 2100))]
    pub vintage: Option<i32>,
    pub active: Option<bool>,
    #[validate]
    pub varieties: Option<Vec<VarietyInput>>,
}

/// Product read model: the row plus the template-derived bulk flag and the
/// varietal composition.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: product::Model,
    pub bulk: bool,
    pub varieties: Vec<product_variety::Model>,
}

/// Filters for product listings
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProductFilter {
    pub template_id: Option<Uuid>,
    pub bulk: Option<bool>,
    pub active: Option<bool>,
}

/// Service for product templates and products
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    batch_size: usize,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender, batch_size: usize) -> Self {
        Self {
            db,
            event_sender,
            batch_size: batch_size.max(1),
        }
    }

    /// Creates a new product template
    #[instrument(skip(self))]
    pub async fn create_template(
        &self,
        input: CreateProductTemplateInput,
    ) -> Result<product_template::Model, ServiceError> {
        let db = &*self.db;

        let default_uom = uom_by_id(db, input.default_uom_id).await?;

        let template = product_template::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            default_uom_id: Set(default_uom.id),
            bulk: input.bulk.map_or(ActiveValue::NotSet, Set),
            active: input.active.map_or(ActiveValue::NotSet, Set),
            ..Default::default()
        };

        let created = template.insert(db).await.map_err(|e| {
            error!("Failed to create product template: {}", e);
            ServiceError::db_error(e)
        })?;

        info!(
            "Product template created: id={}, name={}, bulk={}",
            created.id, created.name, created.bulk
        );

        self.event_sender
            .send(Event::ProductTemplateCreated(created.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(created)
    }

    /// Gets a product template by id
    #[instrument(skip(self))]
    pub async fn get_template(&self, id: Uuid) -> Result<product_template::Model, ServiceError> {
        ProductTemplateEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product template {} not found", id)))
    }

    /// Lists product templates, newest first
    #[instrument(skip(self))]
    pub async fn list_templates(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product_template::Model>, u64), ServiceError> {
        let paginator = ProductTemplateEntity::find()
            .order_by_desc(product_template::Column::CreatedAt)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let templates = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((templates, total))
    }

    /// Updates a product template.
    ///
    /// Changing the `bulk` flag is subject to the modification guard: once any
    /// variant of the template has a stock move on record, the flag is frozen
    /// for access-checked callers.
    #[instrument(skip(self, ctx))]
    pub async fn update_template(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        input: UpdateProductTemplateInput,
    ) -> Result<product_template::Model, ServiceError> {
        let db = &*self.db;

        let current = self.get_template(id).await?;

        // Submitting the current value is not a change
        let bulk_changes = input.bulk.map_or(false, |b| b != current.bulk);
        if bulk_changes {
            self.assert_bulk_editable(ctx, &[id]).await?;
        }

        if let Some(uom_id) = input.default_uom_id {
            uom_by_id(db, uom_id).await?;
        }

        let mut active_model = current.into_active_model();
        if let Some(name) = input.name {
            active_model.name = Set(name);
        }
        if let Some(uom_id) = input.default_uom_id {
            active_model.default_uom_id = Set(uom_id);
        }
        if let Some(bulk) = input.bulk {
            active_model.bulk = Set(bulk);
        }
        if let Some(active) = input.active {
            active_model.active = Set(active);
        }

        let updated = active_model.update(db).await.map_err(|e| {
            error!("Failed to update product template {}: {}", id, e);
            ServiceError::db_error(e)
        })?;

        self.event_sender
            .send(Event::ProductTemplateUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// The modification guard: rejects protected-field changes on templates
    /// whose variants already have stock moves.
    ///
    /// Applies only to access-checked user contexts. The check is
    /// all-or-nothing over the given set: one frozen template fails the whole
    /// write. Template ids are probed in bounded slices with one existence
    /// query (LIMIT 1) per slice rather than one query per record.
    #[instrument(skip(self, ctx))]
    pub async fn assert_bulk_editable(
        &self,
        ctx: &RequestContext,
        template_ids: &[Uuid],
    ) -> Result<(), ServiceError> {
        if !ctx.enforces_access() || template_ids.is_empty() {
            return Ok(());
        }

        let db = &*self.db;

        for chunk in template_ids.chunks(self.batch_size) {
            let hit = StockMoveEntity::find()
                .join(JoinType::InnerJoin, stock_move::Relation::Product.def())
                .filter(product::Column::TemplateId.is_in(chunk.iter().copied()))
                .one(db)
                .await?;

            if let Some(mv) = hit {
                let name = template_name_for_product(db, mv.product_id).await?;
                return Err(ServiceError::Forbidden(format!(
                    "Cannot modify the bulk flag of \"{}\": its products already have stock moves",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Creates a product with its varietal composition
    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductDetail, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let template = ProductTemplateEntity::find_by_id(input.template_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product template {} not found", input.template_id))
            })?;

        if let Some(bulk_product_id) = input.bulk_product_id {
            ProductEntity::find_by_id(bulk_product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Bulk product {} not found", bulk_product_id))
                })?;
        }

        // Capacity defaults to liters when given without a unit
        let capacity_uom_id = match (input.capacity, input.capacity_uom_id) {
            (_, Some(uom_id)) => {
                let unit = uom_by_id(&txn, uom_id).await?;
                if unit.category != uom::UomCategory::Volume {
                    return Err(ServiceError::ValidationError(format!(
                        "Capacity UOM '{}' is not a volume unit",
                        unit.symbol
                    )));
                }
                Some(unit.id)
            }
            (Some(_), None) => Some(uom_by_symbol(&txn, uom::LITER).await?.id),
            (None, None) => None,
        };

        if let Some(uom_id) = input.weight_uom_id {
            let unit = uom_by_id(&txn, uom_id).await?;
            if unit.category != uom::UomCategory::Weight {
                return Err(ServiceError::ValidationError(format!(
                    "Weight UOM '{}' is not a weight unit",
                    unit.symbol
                )));
            }
        }

        let product_id = Uuid::new_v4();
        let model = product::ActiveModel {
            id: Set(product_id),
            template_id: Set(template.id),
            code: Set(input.code),
            capacity: Set(input.capacity),
            capacity_uom_id: Set(capacity_uom_id),
            net_weight: Set(input.net_weight),
            weight: Set(input.weight),
            weight_uom_id: Set(input.weight_uom_id),
            bulk_product_id: Set(input.bulk_product_id),
            denomination_of_origin: Set(input.denomination_of_origin),
            ecological: input.ecological.map_or(ActiveValue::NotSet, Set),
            vintage: Set(input.vintage),
            active: input.active.map_or(ActiveValue::NotSet, Set),
            ..Default::default()
        };

        let created = model.insert(&txn).await.map_err(|e| {
            error!("Failed to create product: {}", e);
            ServiceError::db_error(e)
        })?;

        let varieties = insert_varieties(&txn, product_id, &input.varieties).await?;

        txn.commit().await?;

        info!(
            "Product created: id={}, template={}, varieties={}",
            created.id,
            template.id,
            varieties.len()
        );

        self.event_sender
            .send(Event::ProductCreated(created.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(ProductDetail {
            product: created,
            bulk: template.bulk,
            varieties,
        })
    }

    /// Gets a product with its composition and template-derived bulk flag
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<ProductDetail, ServiceError> {
        let db = &*self.db;

        let product = ProductEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        let template = ProductTemplateEntity::find_by_id(product.template_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Product template {} not found",
                    product.template_id
                ))
            })?;

        let varieties = ProductVarietyEntity::find()
            .filter(product_variety::Column::ProductId.eq(id))
            .all(db)
            .await?;

        Ok(ProductDetail {
            product,
            bulk: template.bulk,
            varieties,
        })
    }

    /// Lists products with optional filtering, newest first. The `bulk`
    /// filter resolves through the owning template.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut query = ProductEntity::find();

        if let Some(template_id) = filter.template_id {
            query = query.filter(product::Column::TemplateId.eq(template_id));
        }
        if let Some(active) = filter.active {
            query = query.filter(product::Column::Active.eq(active));
        }
        if let Some(bulk) = filter.bulk {
            query = query
                .join(JoinType::InnerJoin, product::Relation::Template.def())
                .filter(product_template::Column::Bulk.eq(bulk));
        }

        let paginator = query
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((products, total))
    }

    /// Updates a product. When `varieties` is present the composition list is
    /// replaced wholesale.
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductDetail, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let current = ProductEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        if let Some(bulk_product_id) = input.bulk_product_id {
            if bulk_product_id == id {
                return Err(ServiceError::ValidationError(
                    "A product cannot be its own bulk source".to_string(),
                ));
            }
            ProductEntity::find_by_id(bulk_product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Bulk product {} not found", bulk_product_id))
                })?;
        }

        if let Some(uom_id) = input.capacity_uom_id {
            let unit = uom_by_id(&txn, uom_id).await?;
            if unit.category != uom::UomCategory::Volume {
                return Err(ServiceError::ValidationError(format!(
                    "Capacity UOM '{}' is not a volume unit",
                    unit.symbol
                )));
            }
        }
        if let Some(uom_id) = input.weight_uom_id {
            let unit = uom_by_id(&txn, uom_id).await?;
            if unit.category != uom::UomCategory::Weight {
                return Err(ServiceError::ValidationError(format!(
                    "Weight UOM '{}' is not a weight unit",
                    unit.symbol
                )));
            }
        }

        let template_id = current.template_id;
        let mut active_model = current.into_active_model();
        if let Some(code) = input.code {
            active_model.code = Set(Some(code));
        }
        if let Some(capacity) = input.capacity {
            active_model.capacity = Set(Some(capacity));
        }
        if let Some(uom_id) = input.capacity_uom_id {
            active_model.capacity_uom_id = Set(Some(uom_id));
        }
        if let Some(net_weight) = input.net_weight {
            active_model.net_weight = Set(Some(net_weight));
        }
        if let Some(weight) = input.weight {
            active_model.weight = Set(Some(weight));
        }
        if let Some(uom_id) = input.weight_uom_id {
            active_model.weight_uom_id = Set(Some(uom_id));
        }
        if let Some(bulk_product_id) = input.bulk_product_id {
            active_model.bulk_product_id = Set(Some(bulk_product_id));
        }
        if let Some(denomination) = input.denomination_of_origin {
            active_model.denomination_of_origin = Set(Some(denomination));
        }
        if let Some(ecological) = input.ecological {
            active_model.ecological = Set(ecological);
        }
        if let Some(vintage) = input.vintage {
            active_model.vintage = Set(Some(vintage));
        }
        if let Some(active) = input.active {
            active_model.active = Set(active);
        }

        let updated = active_model.update(&txn).await.map_err(|e| {
            error!("Failed to update product {}: {}", id, e);
            ServiceError::db_error(e)
        })?;

        let varieties = match input.varieties {
            Some(lines) => {
                ProductVarietyEntity::delete_many()
                    .filter(product_variety::Column::ProductId.eq(id))
                    .exec(&txn)
                    .await?;
                insert_varieties(&txn, id, &lines).await?
            }
            None => {
                ProductVarietyEntity::find()
                    .filter(product_variety::Column::ProductId.eq(id))
                    .all(&txn)
                    .await?
            }
        };

        let template = ProductTemplateEntity::find_by_id(template_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product template {} not found", template_id))
            })?;

        txn.commit().await?;

        self.event_sender
            .send(Event::ProductUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(ProductDetail {
            product: updated,
            bulk: template.bulk,
            varieties,
        })
    }
}

/// Resolves the template display name behind a product, for guard messages.
async fn template_name_for_product(
    db: &DatabaseConnection,
    product_id: Uuid,
) -> Result<String, ServiceError> {
    let name = ProductEntity::find_by_id(product_id)
        .find_also_related(ProductTemplateEntity)
        .one(db)
        .await?
        .and_then(|(_, template)| template.map(|t| t.name));

    Ok(name.unwrap_or_else(|| product_id.to_string()))
}

async fn insert_varieties<C: sea_orm::ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    lines: &[VarietyInput],
) -> Result<Vec<product_variety::Model>, ServiceError> {
    let mut created = Vec::with_capacity(lines.len());
    for line in lines {
        let model = product_variety::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            variety: Set(line.variety.clone()),
            percent: Set(line.percent),
        };
        created.push(model.insert(conn).await?);
    }
    Ok(created)
}
