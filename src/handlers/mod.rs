pub mod common;
pub mod discount;
pub mod orders;
pub mod products;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{CatalogService, DiscountService, ImageStore, OrderService};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: OrderService,
    pub catalog: CatalogService,
    pub discounts: DiscountService,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        images: ImageStore,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            orders: OrderService::new(db.clone(), event_sender.clone()),
            catalog: CatalogService::new(db.clone(), images, event_sender.clone()),
            discounts: DiscountService::new(db, event_sender),
        }
    }
}
