pub mod common;
pub mod packaging;
pub mod production_templates;
pub mod products;
pub mod stock;
pub mod uoms;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::bulk_quantity::BulkQuantityService;
use crate::services::packaging::PackagingService;
use crate::services::production_templates::ProductionTemplateService;
use crate::services::products::ProductService;
use crate::services::stock::StockService;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub production_templates: Arc<ProductionTemplateService>,
    pub packaging: Arc<PackagingService>,
    pub stock: Arc<StockService>,
    pub bulk_quantity: Arc<BulkQuantityService>,
}

impl AppServices {
    /// Wires every service to the shared pool and event channel. `batch_size`
    /// caps the id slices handed to the batched stock and product queries.
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, batch_size: usize) -> Self {
        let products = Arc::new(ProductService::new(
            db.clone(),
            event_sender.clone(),
            batch_size,
        ));
        let production_templates = Arc::new(ProductionTemplateService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let packaging = Arc::new(PackagingService::new(db.clone(), event_sender.clone()));
        let stock = Arc::new(StockService::new(db.clone(), event_sender, batch_size));
        let bulk_quantity = Arc::new(BulkQuantityService::new(db, stock.clone(), batch_size));

        Self {
            products,
            production_templates,
            packaging,
            stock,
            bulk_quantity,
        }
    }
}
