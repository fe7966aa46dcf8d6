use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    context::RequestContext,
    entities::{
        product::{self, Entity as ProductEntity},
        product_template::{self, Entity as ProductTemplateEntity},
    },
    errors::ServiceError,
    services::stock::StockService,
};

/// Comparison operator for quantity searches
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CompareOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOperator {
    pub fn matches(self, left: Decimal, right: Decimal) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Ne => left != right,
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Gt => left > right,
            Self::Ge => left >= right,
        }
    }
}

/// Service computing bulk quantities: the volume of a wine lot still on hand,
/// whether it sits in tanks or has already been bottled.
#[derive(Clone)]
pub struct BulkQuantityService {
    db: Arc<DatabaseConnection>,
    stock: Arc<StockService>,
    batch_size: usize,
}

impl BulkQuantityService {
    pub fn new(db: Arc<DatabaseConnection>, stock: Arc<StockService>, batch_size: usize) -> Self {
        Self {
            db,
            stock,
            batch_size: batch_size.max(1),
        }
    }

    /// Bulk quantity per requested product: raw stock of the product's bulk
    /// source plus, per packaged derivative of that source, the derivative's
    /// stock weighted by its capacity. Stock is read at the context's
    /// locations (default: storage zones of active warehouses) and as-of date
    /// (default: today). Products without stock map to zero.
    #[instrument(skip(self, ctx, product_ids))]
    pub async fn bulk_quantities(
        &self,
        ctx: &RequestContext,
        product_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Decimal>, ServiceError> {
        let mut result: HashMap<Uuid, Decimal> =
            product_ids.iter().map(|id| (*id, Decimal::ZERO)).collect();
        if product_ids.is_empty() {
            return Ok(result);
        }

        let locations = if ctx.locations.is_empty() {
            self.stock.storage_locations_of_warehouses().await?
        } else {
            ctx.locations.clone()
        };
        let as_of = ctx.as_of.unwrap_or_else(|| Utc::now().date_naive());

        let requested = self.load_products(product_ids).await?;
        let bulk_flags = self.template_bulk_flags(&requested).await?;

        // Requested bulk products without a distinct source count through
        // their own raw stock and never again as a derivative. Everything
        // else is an output product whose source joins the bulk set.
        let mut bulk_sources: HashSet<Uuid> = HashSet::new();
        let mut outputs: HashMap<Uuid, (Option<Uuid>, Option<Decimal>)> = HashMap::new();
        for p in &requested {
            let is_bulk = bulk_flags.get(&p.template_id).copied().unwrap_or(false);
            if is_bulk && p.bulk_product_id.is_none() {
                bulk_sources.insert(p.id);
                continue;
            }
            if let Some(source) = p.bulk_product_id {
                bulk_sources.insert(source);
            }
            outputs.insert(p.id, (p.bulk_product_id, p.capacity));
        }

        // Repackaging chains all point at the same source, so every packaged
        // derivative is found here whether it was requested or not.
        let source_ids: Vec<Uuid> = bulk_sources.iter().copied().collect();
        for chunk in source_ids.chunks(self.batch_size) {
            let derivatives = ProductEntity::find()
                .filter(product::Column::BulkProductId.is_in(chunk.iter().copied()))
                .all(&*self.db)
                .await?;
            for d in derivatives {
                outputs.entry(d.id).or_insert((d.bulk_product_id, d.capacity));
            }
        }

        let output_ids: Vec<Uuid> = outputs.keys().copied().collect();
        let bulk_raw = self
            .stock
            .quantities_by_product(&source_ids, &locations, as_of)
            .await?;
        let output_raw = self
            .stock
            .quantities_by_product(&output_ids, &locations, as_of)
            .await?;

        let mut derivatives_by_source: HashMap<Uuid, Vec<(Uuid, Option<Decimal>)>> =
            HashMap::new();
        for (id, (source, capacity)) in &outputs {
            if let Some(source) = source {
                derivatives_by_source
                    .entry(*source)
                    .or_default()
                    .push((*id, *capacity));
            }
        }

        for p in &requested {
            let source = p.bulk_product_id.unwrap_or(p.id);
            let mut total = bulk_raw.get(&source).copied().unwrap_or_default();
            if let Some(derivatives) = derivatives_by_source.get(&source) {
                for (derivative_id, capacity) in derivatives {
                    let quantity = output_raw.get(derivative_id).copied().unwrap_or_default();
                    total += quantity * capacity.unwrap_or(Decimal::ONE);
                }
            }
            result.insert(p.id, total);
        }

        Ok(result)
    }

    /// Product ids whose bulk quantity satisfies `operator value`
    #[instrument(skip(self, ctx))]
    pub async fn search_by_bulk_quantity(
        &self,
        ctx: &RequestContext,
        operator: CompareOperator,
        value: Decimal,
    ) -> Result<Vec<Uuid>, ServiceError> {
        let candidate_ids: Vec<Uuid> = ProductEntity::find()
            .select_only()
            .column(product::Column::Id)
            .into_tuple::<Uuid>()
            .all(&*self.db)
            .await?;

        let quantities = self.bulk_quantities(ctx, &candidate_ids).await?;
        let mut matching: Vec<Uuid> = quantities
            .into_iter()
            .filter(|(_, quantity)| operator.matches(*quantity, value))
            .map(|(id, _)| id)
            .collect();
        matching.sort_unstable();
        Ok(matching)
    }

    /// Bulk quantity of a template: the sum over its variants
    #[instrument(skip(self, ctx))]
    pub async fn template_bulk_quantity(
        &self,
        ctx: &RequestContext,
        template_id: Uuid,
    ) -> Result<Decimal, ServiceError> {
        ProductTemplateEntity::find_by_id(template_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product template {} not found", template_id))
            })?;

        let variant_ids: Vec<Uuid> = ProductEntity::find()
            .select_only()
            .column(product::Column::Id)
            .filter(product::Column::TemplateId.eq(template_id))
            .into_tuple::<Uuid>()
            .all(&*self.db)
            .await?;

        let quantities = self.bulk_quantities(ctx, &variant_ids).await?;
        Ok(variant_ids
            .iter()
            .filter_map(|id| quantities.get(id))
            .copied()
            .sum())
    }

    async fn load_products(&self, ids: &[Uuid]) -> Result<Vec<product::Model>, ServiceError> {
        let mut products = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(self.batch_size) {
            let found = ProductEntity::find()
                .filter(product::Column::Id.is_in(chunk.iter().copied()))
                .all(&*self.db)
                .await?;
            products.extend(found);
        }
        Ok(products)
    }

    async fn template_bulk_flags(
        &self,
        products: &[product::Model],
    ) -> Result<HashMap<Uuid, bool>, ServiceError> {
        let mut template_ids: Vec<Uuid> = products.iter().map(|p| p.template_id).collect();
        template_ids.sort_unstable();
        template_ids.dedup();

        let mut flags = HashMap::with_capacity(template_ids.len());
        for chunk in template_ids.chunks(self.batch_size) {
            let templates = ProductTemplateEntity::find()
                .filter(product_template::Column::Id.is_in(chunk.iter().copied()))
                .all(&*self.db)
                .await?;
            for template in templates {
                flags.insert(template.id, template.bulk);
            }
        }
        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn operators_compare_decimals() {
        assert!(CompareOperator::Eq.matches(dec!(10), dec!(10)));
        assert!(!CompareOperator::Eq.matches(dec!(10), dec!(11)));
        assert!(CompareOperator::Ne.matches(dec!(10), dec!(11)));
        assert!(CompareOperator::Lt.matches(dec!(9), dec!(10)));
        assert!(CompareOperator::Le.matches(dec!(10), dec!(10)));
        assert!(!CompareOperator::Gt.matches(dec!(10), dec!(10)));
        assert!(CompareOperator::Ge.matches(dec!(10), dec!(10)));
    }

    #[test]
    fn operators_parse_from_tokens() {
        assert_eq!(CompareOperator::from_str("gt"), Ok(CompareOperator::Gt));
        assert_eq!(CompareOperator::from_str("le"), Ok(CompareOperator::Le));
        assert!(CompareOperator::from_str("between").is_err());
    }

    #[test]
    fn operators_display_as_tokens() {
        assert_eq!(CompareOperator::Ge.to_string(), "ge");
        assert_eq!(CompareOperator::Ne.to_string(), "ne");
    }
}
