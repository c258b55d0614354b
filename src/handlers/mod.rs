pub mod auth;
pub mod chat;
pub mod checkout;
pub mod common;
pub mod demo_requests;
pub mod orders;
pub mod products;
pub mod purchases;
pub mod seed;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<crate::services::catalog::CatalogService>,
    pub checkout: Arc<crate::services::checkout::CheckoutService>,
    pub orders: Arc<crate::services::orders::OrderQueryService>,
    pub purchases: Arc<crate::services::purchases::PurchaseService>,
    pub chat: Arc<crate::services::chat::ChatService>,
    pub demo_requests: Arc<crate::services::demo_requests::DemoRequestService>,
    pub users: Arc<crate::services::users::UserService>,
    pub seed: Arc<crate::services::seed::SeedService>,
}

impl AppServices {
    /// Build the services container over a shared pool and event channel
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            catalog: Arc::new(crate::services::catalog::CatalogService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            checkout: Arc::new(crate::services::checkout::CheckoutService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            orders: Arc::new(crate::services::orders::OrderQueryService::new(
                db_pool.clone(),
            )),
            purchases: Arc::new(crate::services::purchases::PurchaseService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            chat: Arc::new(crate::services::chat::ChatService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            demo_requests: Arc::new(crate::services::demo_requests::DemoRequestService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            users: Arc::new(crate::services::users::UserService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            seed: Arc::new(crate::services::seed::SeedService::new(
                db_pool,
                event_sender,
            )),
        }
    }
}
