use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue, ActiveValue::Set, ColumnTrait,
    ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        product::Entity as ProductEntity,
        product_template::Entity as ProductTemplateEntity,
        stock_location::{self, Entity as StockLocationEntity, LocationKind},
        stock_move::{self, Entity as StockMoveEntity, MoveState},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::uom_by_id,
};

/// Payload for creating a stock location
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLocationInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 64))]
    pub code: Option<String>,
    pub kind: LocationKind,
    pub parent_id: Option<Uuid>,
    /// Storage zone, required for warehouses and rejected elsewhere
    pub storage_location_id: Option<Uuid>,
    pub active: Option<bool>,
}

/// Payload for recording a stock move
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RecordMoveInput {
    pub product_id: Uuid,
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    pub quantity: Decimal,
    /// Defaults to the default UOM of the product's template
    pub uom_id: Option<Uuid>,
    /// Defaults to today
    pub effective_date: Option<NaiveDate>,
    pub state: Option<MoveState>,
}

/// Filters for listing stock moves
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct MoveFilter {
    pub product_id: Option<Uuid>,
    pub state: Option<MoveState>,
}

/// Whether a move may leave its current state for `to`. Done and cancelled
/// moves are frozen.
fn can_transition(from: MoveState, to: MoveState) -> bool {
    matches!(
        (from, to),
        (MoveState::Draft, MoveState::Done) | (MoveState::Draft, MoveState::Cancelled)
    )
}

#[derive(Debug, FromQueryResult)]
struct QuantityRow {
    product_id: Uuid,
    total: Option<Decimal>,
}

/// Service for stock locations, stock moves and on-hand quantities
#[derive(Clone)]
pub struct StockService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    batch_size: usize,
}

impl StockService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender, batch_size: usize) -> Self {
        Self {
            db,
            event_sender,
            batch_size: batch_size.max(1),
        }
    }

    /// Creates a stock location. Warehouses must point at their storage zone;
    /// other kinds must not.
    #[instrument(skip(self))]
    pub async fn create_location(
        &self,
        input: CreateLocationInput,
    ) -> Result<stock_location::Model, ServiceError> {
        input.validate()?;

        let db = &*self.db;

        match (input.kind, input.storage_location_id) {
            (LocationKind::Warehouse, None) => {
                return Err(ServiceError::ValidationError(
                    "A warehouse requires a storage location".to_string(),
                ));
            }
            (LocationKind::Warehouse, Some(storage_id)) => {
                let storage = StockLocationEntity::find_by_id(storage_id)
                    .one(db)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "Storage location {} not found",
                            storage_id
                        ))
                    })?;
                if storage.kind != LocationKind::Storage {
                    return Err(ServiceError::ValidationError(
                        "The storage location of a warehouse must be of kind storage".to_string(),
                    ));
                }
            }
            (_, Some(_)) => {
                return Err(ServiceError::ValidationError(
                    "Only warehouses have a storage location".to_string(),
                ));
            }
            (_, None) => {}
        }

        if let Some(parent_id) = input.parent_id {
            StockLocationEntity::find_by_id(parent_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Parent location {} not found", parent_id))
                })?;
        }

        let model = stock_location::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            code: Set(input.code),
            kind: Set(input.kind),
            parent_id: Set(input.parent_id),
            storage_location_id: Set(input.storage_location_id),
            active: Set(input.active.unwrap_or(true)),
        };

        let created = model.insert(db).await.map_err(|e| {
            error!("Failed to create stock location: {}", e);
            ServiceError::db_error(e)
        })?;

        info!("Stock location created: id={}, kind={:?}", created.id, created.kind);

        self.event_sender
            .send(Event::StockLocationCreated(created.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(created)
    }

    /// Gets a stock location by id
    #[instrument(skip(self))]
    pub async fn get_location(&self, id: Uuid) -> Result<stock_location::Model, ServiceError> {
        StockLocationEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock location {} not found", id)))
    }

    /// Lists stock locations, optionally restricted to one kind
    #[instrument(skip(self))]
    pub async fn list_locations(
        &self,
        kind: Option<LocationKind>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<stock_location::Model>, u64), ServiceError> {
        let mut query = StockLocationEntity::find().order_by_asc(stock_location::Column::Name);
        if let Some(kind) = kind {
            query = query.filter(stock_location::Column::Kind.eq(kind));
        }

        let paginator = query.paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let locations = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((locations, total))
    }

    /// Records a stock move in draft state (unless another state is given)
    #[instrument(skip(self))]
    pub async fn record_move(
        &self,
        input: RecordMoveInput,
    ) -> Result<stock_move::Model, ServiceError> {
        if input.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Move quantity must be positive".to_string(),
            ));
        }
        if input.from_location_id == input.to_location_id {
            return Err(ServiceError::ValidationError(
                "Source and destination locations must differ".to_string(),
            ));
        }

        let db = &*self.db;
        let txn = db.begin().await?;

        let product = ProductEntity::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        for location_id in [input.from_location_id, input.to_location_id] {
            StockLocationEntity::find_by_id(location_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Stock location {} not found", location_id))
                })?;
        }

        let uom_id = match input.uom_id {
            Some(uom_id) => uom_by_id(&txn, uom_id).await?.id,
            None => {
                let template = ProductTemplateEntity::find_by_id(product.template_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "Product template {} not found",
                            product.template_id
                        ))
                    })?;
                template.default_uom_id
            }
        };

        let model = stock_move::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            from_location_id: Set(input.from_location_id),
            to_location_id: Set(input.to_location_id),
            quantity: Set(input.quantity),
            uom_id: Set(uom_id),
            effective_date: Set(input
                .effective_date
                .unwrap_or_else(|| Utc::now().date_naive())),
            state: input.state.map_or(ActiveValue::NotSet, Set),
            ..Default::default()
        };

        let created = model.insert(&txn).await.map_err(|e| {
            error!("Failed to record stock move: {}", e);
            ServiceError::db_error(e)
        })?;

        txn.commit().await?;

        info!(
            "Stock move recorded: id={}, product={}, quantity={}",
            created.id, created.product_id, created.quantity
        );

        self.event_sender
            .send(Event::StockMoveRecorded {
                move_id: created.id,
                product_id: created.product_id,
                quantity: created.quantity,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(created)
    }

    /// Completes or cancels a draft move
    #[instrument(skip(self))]
    pub async fn set_move_state(
        &self,
        id: Uuid,
        state: MoveState,
    ) -> Result<stock_move::Model, ServiceError> {
        let db = &*self.db;

        let current = StockMoveEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock move {} not found", id)))?;

        if !can_transition(current.state, state) {
            return Err(ServiceError::InvalidOperation(format!(
                "Stock move {} cannot go from {:?} to {:?}",
                id, current.state, state
            )));
        }

        let mut active_model = current.into_active_model();
        active_model.state = Set(state);
        let updated = active_model.update(db).await.map_err(|e| {
            error!("Failed to update stock move {}: {}", id, e);
            ServiceError::db_error(e)
        })?;

        let event = match state {
            MoveState::Done => Event::StockMoveDone(id),
            MoveState::Cancelled => Event::StockMoveCancelled(id),
            MoveState::Draft => Event::StockMoveRecorded {
                move_id: id,
                product_id: updated.product_id,
                quantity: updated.quantity,
            },
        };
        self.event_sender
            .send(event)
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Lists stock moves, newest first
    #[instrument(skip(self))]
    pub async fn list_moves(
        &self,
        filter: MoveFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<stock_move::Model>, u64), ServiceError> {
        let mut query = StockMoveEntity::find().order_by_desc(stock_move::Column::CreatedAt);
        if let Some(product_id) = filter.product_id {
            query = query.filter(stock_move::Column::ProductId.eq(product_id));
        }
        if let Some(state) = filter.state {
            query = query.filter(stock_move::Column::State.eq(state));
        }

        let paginator = query.paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let moves = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((moves, total))
    }

    /// Storage zones of all active warehouses, the default location set for
    /// bulk quantity aggregation.
    #[instrument(skip(self))]
    pub async fn storage_locations_of_warehouses(&self) -> Result<Vec<Uuid>, ServiceError> {
        let warehouses = StockLocationEntity::find()
            .filter(stock_location::Column::Kind.eq(LocationKind::Warehouse))
            .filter(stock_location::Column::Active.eq(true))
            .all(&*self.db)
            .await?;

        let mut storage: Vec<Uuid> = warehouses
            .into_iter()
            .filter_map(|w| w.storage_location_id)
            .collect();
        storage.sort_unstable();
        storage.dedup();
        Ok(storage)
    }

    /// On-hand quantity per product inside `locations` as of `as_of`: the sum
    /// of done moves into the set minus the sum of done moves out of it.
    /// Products without any moves are absent from the map. Queries run per
    /// bounded slice of product ids.
    #[instrument(skip(self, product_ids, locations))]
    pub async fn quantities_by_product(
        &self,
        product_ids: &[Uuid],
        locations: &[Uuid],
        as_of: NaiveDate,
    ) -> Result<HashMap<Uuid, Decimal>, ServiceError> {
        let mut quantities: HashMap<Uuid, Decimal> = HashMap::new();
        if product_ids.is_empty() || locations.is_empty() {
            return Ok(quantities);
        }

        let db = &*self.db;
        for chunk in product_ids.chunks(self.batch_size) {
            let incoming = sum_moves_by_product(
                db,
                chunk,
                stock_move::Column::ToLocationId,
                locations,
                as_of,
            )
            .await?;
            for (product_id, total) in incoming {
                *quantities.entry(product_id).or_default() += total;
            }

            let outgoing = sum_moves_by_product(
                db,
                chunk,
                stock_move::Column::FromLocationId,
                locations,
                as_of,
            )
            .await?;
            for (product_id, total) in outgoing {
                *quantities.entry(product_id).or_default() -= total;
            }
        }

        Ok(quantities)
    }

    /// On-hand quantity of a single product, see [`Self::quantities_by_product`]
    pub async fn on_hand(
        &self,
        product_id: Uuid,
        locations: &[Uuid],
        as_of: NaiveDate,
    ) -> Result<Decimal, ServiceError> {
        let quantities = self
            .quantities_by_product(&[product_id], locations, as_of)
            .await?;
        Ok(quantities.get(&product_id).copied().unwrap_or_default())
    }
}

/// Grouped sum of done moves touching `locations` through `location_column`
/// (incoming via `ToLocationId`, outgoing via `FromLocationId`).
async fn sum_moves_by_product<C: ConnectionTrait>(
    conn: &C,
    product_ids: &[Uuid],
    location_column: stock_move::Column,
    locations: &[Uuid],
    as_of: NaiveDate,
) -> Result<HashMap<Uuid, Decimal>, ServiceError> {
    let rows = StockMoveEntity::find()
        .select_only()
        .column(stock_move::Column::ProductId)
        .column_as(Expr::col(stock_move::Column::Quantity).sum(), "total")
        .filter(stock_move::Column::ProductId.is_in(product_ids.iter().copied()))
        .filter(location_column.is_in(locations.iter().copied()))
        .filter(stock_move::Column::State.eq(MoveState::Done))
        .filter(stock_move::Column::EffectiveDate.lte(as_of))
        .group_by(stock_move::Column::ProductId)
        .into_model::<QuantityRow>()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.product_id, row.total.unwrap_or_default()))
        .collect())
}
