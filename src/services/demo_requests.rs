use crate::{
    entities::{
        demo_request::{self, DemoRequestStatus},
        DemoRequest,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::orders::ProductSummary,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Input for creating a demo request
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateDemoRequestInput {
    pub product_id: Uuid,
    pub buyer_id: Uuid,
    pub buyer_name: String,
    pub seller_id: Uuid,
    pub advance_payment: Decimal,
    pub message: String,
}

/// Demo request with its product excerpt for seller dashboards
#[derive(Debug, Serialize)]
pub struct DemoRequestDetail {
    #[serde(flatten)]
    pub request: demo_request::Model,
    pub product: Option<ProductSummary>,
}

/// Buyer-seller demo scheduling workflow
#[derive(Clone)]
pub struct DemoRequestService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl DemoRequestService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn create_request(
        &self,
        input: CreateDemoRequestInput,
    ) -> Result<demo_request::Model, ServiceError> {
        if input.advance_payment < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Advance payment cannot be negative".to_string(),
            ));
        }

        let request_id = Uuid::new_v4();
        let row = demo_request::ActiveModel {
            id: Set(request_id),
            product_id: Set(input.product_id),
            buyer_id: Set(input.buyer_id),
            buyer_name: Set(input.buyer_name),
            seller_id: Set(input.seller_id),
            advance_payment: Set(input.advance_payment),
            status: Set(DemoRequestStatus::Pending),
            message: Set(input.message),
            created_at: Set(Utc::now()),
        };
        let model = row.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::DemoRequestCreated(request_id))
            .await;

        info!("Created demo request: {}", request_id);
        Ok(model)
    }

    /// A seller's demo requests, newest first, with product excerpts
    #[instrument(skip(self))]
    pub async fn requests_for_seller(
        &self,
        seller_id: Uuid,
    ) -> Result<Vec<DemoRequestDetail>, ServiceError> {
        let rows = DemoRequest::find()
            .filter(demo_request::Column::SellerId.eq(seller_id))
            .order_by_desc(demo_request::Column::CreatedAt)
            .find_also_related(crate::entities::Product)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(request, product)| DemoRequestDetail {
                request,
                product: product.as_ref().map(ProductSummary::from),
            })
            .collect())
    }

    /// Moves a request through its status workflow
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        request_id: Uuid,
        status: DemoRequestStatus,
    ) -> Result<demo_request::Model, ServiceError> {
        let request = DemoRequest::find_by_id(request_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Demo request {} not found", request_id))
            })?;

        let mut active: demo_request::ActiveModel = request.into();
        active.status = Set(status);
        let model = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::DemoRequestStatusChanged {
                request_id,
                new_status: format!("{:?}", status).to_lowercase(),
            })
            .await;

        Ok(model)
    }
}
