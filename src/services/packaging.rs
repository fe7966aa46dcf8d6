use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        bom, bom_input, bom_output,
        product::{self, Entity as ProductEntity},
        product_bom,
        product_packaging::{self, Entity as ProductPackagingEntity},
        product_template::{self, Entity as ProductTemplateEntity},
        product_variety::{self, Entity as ProductVarietyEntity},
        production_template::{self, Entity as ProductionTemplateEntity},
        production_template_input::{self, Entity as ProductionTemplateInputEntity},
        uom,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{uom_by_id, uom_by_symbol},
};

/// Payload for creating a packaging association
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePackagingInput {
    pub product_id: Uuid,
    pub production_template_id: Uuid,
}

/// Payload for re-pointing an association at another recipe. Only allowed
/// while no packaged product has been generated.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePackagingInput {
    pub production_template_id: Option<Uuid>,
}

/// One generated packaged product, as reported by the bulk action
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GeneratedPackaging {
    pub source_product_id: Uuid,
    pub packaging_id: Uuid,
    pub packaged_product_id: Uuid,
    pub bom_id: Uuid,
}

/// Service for packaging associations and packaged-product generation
#[derive(Clone)]
pub struct PackagingService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl PackagingService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates an association between a product and a packaging or labeling
    /// recipe that lists the product among its inputs.
    #[instrument(skip(self))]
    pub async fn create_association(
        &self,
        input: CreatePackagingInput,
    ) -> Result<product_packaging::Model, ServiceError> {
        let db = &*self.db;

        validate_association_domain(db, input.product_id, input.production_template_id).await?;

        let model = product_packaging::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            production_template_id: Set(input.production_template_id),
            packaged_product_id: Set(None),
            ..Default::default()
        };

        let created = model.insert(db).await.map_err(|e| {
            error!("Failed to create packaging association: {}", e);
            ServiceError::db_error(e)
        })?;

        info!(
            "Packaging association created: id={}, product={}, recipe={}",
            created.id, created.product_id, created.production_template_id
        );

        self.event_sender
            .send(Event::PackagingCreated {
                packaging_id: created.id,
                product_id: created.product_id,
                production_template_id: created.production_template_id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(created)
    }

    /// Gets an association by id
    #[instrument(skip(self))]
    pub async fn get_association(
        &self,
        id: Uuid,
    ) -> Result<product_packaging::Model, ServiceError> {
        ProductPackagingEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Packaging association {} not found", id)))
    }

    /// Lists associations, optionally for one product
    #[instrument(skip(self))]
    pub async fn list_associations(
        &self,
        product_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product_packaging::Model>, u64), ServiceError> {
        let mut query =
            ProductPackagingEntity::find().order_by_desc(product_packaging::Column::CreatedAt);
        if let Some(product_id) = product_id {
            query = query.filter(product_packaging::Column::ProductId.eq(product_id));
        }

        let paginator = query.paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let associations = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((associations, total))
    }

    /// Re-points an association at another recipe. The recipe link is frozen
    /// once a packaged product has been generated.
    #[instrument(skip(self))]
    pub async fn update_association(
        &self,
        id: Uuid,
        input: UpdatePackagingInput,
    ) -> Result<product_packaging::Model, ServiceError> {
        let db = &*self.db;

        let current = ProductPackagingEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Packaging association {} not found", id))
            })?;

        let Some(template_id) = input.production_template_id else {
            return Ok(current);
        };
        if template_id == current.production_template_id {
            return Ok(current);
        }

        if current.packaged_product_id.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "Packaging association {} already has a generated product; its recipe cannot change",
                id
            )));
        }

        validate_association_domain(db, current.product_id, template_id).await?;

        let mut active_model = current.into_active_model();
        active_model.production_template_id = Set(template_id);
        let updated = active_model.update(db).await.map_err(|e| {
            error!("Failed to update packaging association {}: {}", id, e);
            ServiceError::db_error(e)
        })?;

        self.event_sender
            .send(Event::PackagingUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Deletes an association that has not generated a packaged product yet
    #[instrument(skip(self))]
    pub async fn delete_association(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;

        let association = ProductPackagingEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Packaging association {} not found", id))
            })?;

        if association.packaged_product_id.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "Packaging association {} already has a generated product and cannot be deleted",
                id
            )));
        }

        ProductPackagingEntity::delete_by_id(id).exec(db).await?;

        self.event_sender
            .send(Event::PackagingDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }

    /// Generates packaged products for every unprocessed association of the
    /// given products. Each source product is written in its own transaction;
    /// associations that already carry a packaged product are skipped, so the
    /// action is idempotent.
    #[instrument(skip(self, product_ids))]
    pub async fn generate_packaged_products(
        &self,
        product_ids: &[Uuid],
    ) -> Result<Vec<GeneratedPackaging>, ServiceError> {
        let db = &*self.db;
        let mut report = Vec::new();

        for &source_id in product_ids {
            let source = ProductEntity::find_by_id(source_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", source_id))
                })?;

            let pending = ProductPackagingEntity::find()
                .filter(product_packaging::Column::ProductId.eq(source_id))
                .filter(product_packaging::Column::PackagedProductId.is_null())
                .all(db)
                .await?;
            if pending.is_empty() {
                continue;
            }

            let txn = db.begin().await?;

            let source_template = ProductTemplateEntity::find_by_id(source.template_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Product template {} not found",
                        source.template_id
                    ))
                })?;
            let source_varieties = ProductVarietyEntity::find()
                .filter(product_variety::Column::ProductId.eq(source_id))
                .all(&txn)
                .await?;

            let mut generated = Vec::new();
            for association in pending {
                if let Some(row) = generate_for_association(
                    &txn,
                    &source,
                    &source_template,
                    &source_varieties,
                    association,
                )
                .await?
                {
                    generated.push(row);
                }
            }

            txn.commit().await?;

            info!(
                "Packaged products generated: source={}, count={}",
                source_id,
                generated.len()
            );

            for row in &generated {
                self.event_sender
                    .send(Event::PackagedProductGenerated {
                        source_product_id: row.source_product_id,
                        packaged_product_id: row.packaged_product_id,
                        bom_id: row.bom_id,
                    })
                    .await
                    .map_err(ServiceError::EventError)?;
            }
            report.extend(generated);
        }

        Ok(report)
    }
}

/// The association domain: the recipe packages or labels, and the product is
/// one of the recipe's inputs.
async fn validate_association_domain<C: sea_orm::ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    production_template_id: Uuid,
) -> Result<production_template::Model, ServiceError> {
    let template = ProductionTemplateEntity::find_by_id(production_template_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Production template {} not found",
                production_template_id
            ))
        })?;

    if !template.packaging && !template.labeling {
        return Err(ServiceError::ValidationError(format!(
            "Production template \"{}\" neither packages nor labels",
            template.name
        )));
    }

    ProductEntity::find_by_id(product_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

    let listed = ProductionTemplateInputEntity::find()
        .filter(production_template_input::Column::ProductionTemplateId.eq(production_template_id))
        .filter(production_template_input::Column::ProductId.eq(product_id))
        .one(conn)
        .await?;
    if listed.is_none() {
        return Err(ServiceError::ValidationError(format!(
            "Product {} is not an input of production template \"{}\"",
            product_id, template.name
        )));
    }

    Ok(template)
}

/// Net and gross weight of one packaged unit: the capacity converted to mass
/// at density 1, plus the empty material's own weight, both rounded to the
/// weight unit's digits.
fn packaged_weights(
    capacity: Decimal,
    capacity_uom: &uom::Model,
    material_weight: Decimal,
    weight_uom: &uom::Model,
) -> Result<(Decimal, Decimal), ServiceError> {
    let net = uom::volume_to_weight(capacity, capacity_uom, weight_uom).ok_or_else(|| {
        ServiceError::ValidationError(format!(
            "Cannot derive a weight from capacity in \"{}\"",
            capacity_uom.symbol
        ))
    })?;
    let net = weight_uom.round(net);
    let gross = weight_uom.round(net + material_weight);
    Ok((net, gross))
}

/// Runs one association: creates the packaged product, its varietal copies,
/// its BOM, and records the output on the association. Returns None when the
/// recipe has no output template.
async fn generate_for_association(
    txn: &DatabaseTransaction,
    source: &product::Model,
    source_template: &product_template::Model,
    source_varieties: &[product_variety::Model],
    association: product_packaging::Model,
) -> Result<Option<GeneratedPackaging>, ServiceError> {
    let recipe = ProductionTemplateEntity::find_by_id(association.production_template_id)
        .one(txn)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Production template {} not found",
                association.production_template_id
            ))
        })?;

    // Recipes without an output family are not generable; skip quietly.
    let Some(output_template_id) = recipe.output_template_id else {
        return Ok(None);
    };
    let output_template = ProductTemplateEntity::find_by_id(output_template_id)
        .one(txn)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Output template {} not found", output_template_id))
        })?;

    let material = match recipe.packaging_product_id {
        Some(material_id) => Some(
            ProductEntity::find_by_id(material_id)
                .one(txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Packaging product {} not found", material_id))
                })?,
        ),
        None => None,
    };

    let liter = uom_by_symbol(txn, uom::LITER).await?;
    let kilogram = uom_by_symbol(txn, uom::KILOGRAM).await?;
    let unit = uom_by_symbol(txn, uom::UNIT).await?;

    // Packaging computes the measures from the material; labeling carries the
    // source's measures through unchanged.
    let (capacity, capacity_uom_id, net_weight, weight, weight_uom_id, source_input_quantity) =
        if recipe.packaging {
            let capacity = material
                .as_ref()
                .and_then(|m| m.capacity)
                .unwrap_or(Decimal::ONE);
            let capacity_uom_id = material
                .as_ref()
                .and_then(|m| m.capacity_uom_id)
                .unwrap_or(liter.id);
            let weight_uom_id = material
                .as_ref()
                .and_then(|m| m.weight_uom_id)
                .unwrap_or(kilogram.id);

            let capacity_uom = if capacity_uom_id == liter.id {
                liter.clone()
            } else {
                uom_by_id(txn, capacity_uom_id).await?
            };
            let weight_uom = if weight_uom_id == kilogram.id {
                kilogram.clone()
            } else {
                uom_by_id(txn, weight_uom_id).await?
            };

            let material_weight = material
                .as_ref()
                .and_then(|m| m.weight)
                .unwrap_or(Decimal::ZERO);
            let (net, gross) =
                packaged_weights(capacity, &capacity_uom, material_weight, &weight_uom)?;

            (
                Some(capacity),
                Some(capacity_uom_id),
                Some(net),
                Some(gross),
                Some(weight_uom_id),
                capacity,
            )
        } else {
            (
                source.capacity,
                source.capacity_uom_id,
                source.net_weight,
                source.weight,
                source.weight_uom_id,
                Decimal::ONE,
            )
        };

    let packaged_id = Uuid::new_v4();
    let packaged = product::ActiveModel {
        id: Set(packaged_id),
        template_id: Set(output_template_id),
        code: Set(None),
        capacity: Set(capacity),
        capacity_uom_id: Set(capacity_uom_id),
        net_weight: Set(net_weight),
        weight: Set(weight),
        weight_uom_id: Set(weight_uom_id),
        bulk_product_id: Set(Some(source.bulk_product_id.unwrap_or(source.id))),
        denomination_of_origin: Set(source.denomination_of_origin.clone()),
        ecological: Set(source.ecological),
        vintage: Set(source.vintage),
        ..Default::default()
    };
    let packaged = packaged.insert(txn).await?;

    for variety in source_varieties {
        let copy = product_variety::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(packaged_id),
            variety: Set(variety.variety.clone()),
            percent: Set(variety.percent),
        };
        copy.insert(txn).await?;
    }

    let bom_id = Uuid::new_v4();
    let bom_model = bom::ActiveModel {
        id: Set(bom_id),
        name: Set(output_template.name.clone()),
        ..Default::default()
    };
    bom_model.insert(txn).await?;

    // The recipe's own line for the source is replaced by the concrete
    // source product at the packaged capacity.
    let source_input = bom_input::ActiveModel {
        id: Set(Uuid::new_v4()),
        bom_id: Set(bom_id),
        product_id: Set(source.id),
        quantity: Set(source_input_quantity),
        uom_id: Set(source_template.default_uom_id),
    };
    source_input.insert(txn).await?;

    if let Some(material) = &material {
        let material_template = ProductTemplateEntity::find_by_id(material.template_id)
            .one(txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Product template {} not found",
                    material.template_id
                ))
            })?;
        let material_input = bom_input::ActiveModel {
            id: Set(Uuid::new_v4()),
            bom_id: Set(bom_id),
            product_id: Set(material.id),
            quantity: Set(Decimal::ONE),
            uom_id: Set(material_template.default_uom_id),
        };
        material_input.insert(txn).await?;
    }

    let enology_lines = ProductionTemplateInputEntity::find()
        .filter(production_template_input::Column::ProductionTemplateId.eq(recipe.id))
        .all(txn)
        .await?;
    for line in enology_lines {
        if line.product_id == source.id {
            continue;
        }
        let enology_input = bom_input::ActiveModel {
            id: Set(Uuid::new_v4()),
            bom_id: Set(bom_id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            uom_id: Set(line.uom_id),
        };
        enology_input.insert(txn).await?;
    }

    let output = bom_output::ActiveModel {
        id: Set(Uuid::new_v4()),
        bom_id: Set(bom_id),
        product_id: Set(packaged_id),
        quantity: Set(Decimal::ONE),
        uom_id: Set(unit.id),
    };
    output.insert(txn).await?;

    let link = product_bom::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(packaged_id),
        bom_id: Set(bom_id),
        sequence: Set(1),
    };
    link.insert(txn).await?;

    let mut done = association.into_active_model();
    done.packaged_product_id = Set(Some(packaged_id));
    let association = done.update(txn).await?;

    Ok(Some(GeneratedPackaging {
        source_product_id: source.id,
        packaging_id: association.id,
        packaged_product_id: packaged_id,
        bom_id,
    }))
}
