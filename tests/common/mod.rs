// Not every test binary exercises every helper
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use serde_json::Value;
use storefront_api::{
    api_v1_routes,
    config::AppConfig,
    db,
    entities::product,
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Test harness: application state and router backed by a throwaway
/// SQLite database, with helpers for seeding and driving requests.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state
    pub async fn new() -> Self {
        let db_dir = TempDir::new().expect("temp dir for test database");
        let db_path = db_dir.path().join("storefront_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()));
        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Issue a JSON request against the in-memory router
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request construction");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    /// Seed one catalog product directly through the service layer
    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> product::Model {
        self.seed_product_with(name, price, stock, None, None).await
    }

    /// Seed a product with optional seller and pre-discount price
    pub async fn seed_product_with(
        &self,
        name: &str,
        price: Decimal,
        stock: i32,
        seller_id: Option<Uuid>,
        original_price: Option<Decimal>,
    ) -> product::Model {
        use storefront_api::services::catalog::CreateProductInput;

        self.state
            .services
            .catalog
            .create_product(CreateProductInput {
                name: name.to_string(),
                price,
                original_price,
                stock_quantity: stock,
                seller_id,
                category: storefront_api::entities::product::ProductCategory::Electronics,
                condition: storefront_api::entities::product::ProductCondition::New,
                ..Default::default()
            })
            .await
            .expect("seed product")
    }

    /// Current stock state of one product, straight from the database
    pub async fn product_stock(&self, product_id: Uuid) -> (i32, bool) {
        let model = product::Entity::find_by_id(product_id)
            .one(&*self.state.db)
            .await
            .expect("stock query")
            .expect("product exists");
        (model.stock_quantity, model.in_stock)
    }
}

/// Decode a response body as JSON
pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Parse a Decimal out of a JSON value that may be a string or number
pub fn decimal_of(value: &Value) -> Decimal {
    serde_json::from_value(value.clone()).expect("decimal value")
}
