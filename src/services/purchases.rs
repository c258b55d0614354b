use crate::{
    entities::{
        product,
        purchase::{self, PaymentMethod, PaymentStatus, PurchaseStatus},
        Product, Purchase,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Input for the legacy single-purchase endpoint, kept for callers that
/// predate the checkout flow
#[derive(Debug, Deserialize, Serialize)]
pub struct CreatePurchaseInput {
    pub product_id: Uuid,
    pub buyer_id: Uuid,
    pub buyer_name: String,
    pub seller_id: Option<Uuid>,
    pub amount: Decimal,
    pub quantity: Option<i32>,
}

/// Revenue aggregate for one product
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductStats {
    pub product_name: String,
    pub total_sales: u64,
    pub total_revenue: Decimal,
    pub quantity: i64,
}

/// One month of a seller's sales series, keyed `YYYY-MM`
#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlyStats {
    pub month: String,
    pub sales: u64,
    pub revenue: Decimal,
}

/// Seller revenue overview across completed purchases
#[derive(Debug, Serialize, ToSchema)]
pub struct SellerAnalytics {
    pub total_purchases: u64,
    pub total_revenue: Decimal,
    pub product_stats: Vec<ProductStats>,
    pub monthly_data: Vec<MonthlyStats>,
}

/// Purchase records: legacy creation and seller-facing aggregation
#[derive(Clone)]
pub struct PurchaseService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl PurchaseService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Create a standalone purchase. The seller defaults from the product
    /// when the caller does not supply one.
    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn create_purchase(
        &self,
        input: CreatePurchaseInput,
    ) -> Result<purchase::Model, ServiceError> {
        let quantity = input.quantity.unwrap_or(1);
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }
        if input.amount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Amount cannot be negative".to_string(),
            ));
        }

        let seller_id = match input.seller_id {
            Some(id) => Some(id),
            None => Product::find_by_id(input.product_id)
                .one(&*self.db)
                .await?
                .and_then(|p| p.seller_id),
        };

        let purchase_id = Uuid::new_v4();
        let row = purchase::ActiveModel {
            id: Set(purchase_id),
            product_id: Set(input.product_id),
            buyer_id: Set(input.buyer_id),
            buyer_name: Set(input.buyer_name),
            seller_id: Set(seller_id),
            order_id: Set(None),
            amount: Set(input.amount),
            quantity: Set(quantity),
            status: Set(PurchaseStatus::Pending),
            payment_status: Set(PaymentStatus::Pending),
            payment_method: Set(PaymentMethod::Cod),
            shipping_address: Set(String::new()),
            purchase_date: Set(Utc::now()),
        };
        let model = row.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::PurchaseCreated(purchase_id))
            .await;

        info!("Created standalone purchase: {}", purchase_id);
        Ok(model)
    }

    /// Completed purchases of one product, newest first
    #[instrument(skip(self))]
    pub async fn purchases_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<purchase::Model>, ServiceError> {
        Purchase::find()
            .filter(purchase::Column::ProductId.eq(product_id))
            .filter(purchase::Column::Status.eq(PurchaseStatus::Completed))
            .order_by_desc(purchase::Column::PurchaseDate)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Aggregates a seller's completed purchases: totals, per-product
    /// stats in order of first sale, and an ascending monthly series.
    #[instrument(skip(self))]
    pub async fn seller_analytics(&self, seller_id: Uuid) -> Result<SellerAnalytics, ServiceError> {
        let purchases = Purchase::find()
            .filter(purchase::Column::SellerId.eq(seller_id))
            .filter(purchase::Column::Status.eq(PurchaseStatus::Completed))
            .order_by_desc(purchase::Column::PurchaseDate)
            .all(&*self.db)
            .await?;

        let mut product_ids: Vec<Uuid> = purchases.iter().map(|p| p.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();
        let product_names: HashMap<Uuid, String> = Product::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        let mut total_revenue = Decimal::ZERO;
        let mut stats_order: Vec<Uuid> = Vec::new();
        let mut by_product: HashMap<Uuid, ProductStats> = HashMap::new();
        let mut by_month: HashMap<String, MonthlyStats> = HashMap::new();

        for p in &purchases {
            total_revenue += p.amount;

            let entry = by_product.entry(p.product_id).or_insert_with(|| {
                stats_order.push(p.product_id);
                ProductStats {
                    product_name: product_names
                        .get(&p.product_id)
                        .cloned()
                        .unwrap_or_else(|| p.product_id.to_string()),
                    total_sales: 0,
                    total_revenue: Decimal::ZERO,
                    quantity: 0,
                }
            });
            entry.total_sales += 1;
            entry.total_revenue += p.amount;
            entry.quantity += p.quantity as i64;

            let month = p.purchase_date.format("%Y-%m").to_string();
            let monthly = by_month.entry(month.clone()).or_insert(MonthlyStats {
                month,
                sales: 0,
                revenue: Decimal::ZERO,
            });
            monthly.sales += 1;
            monthly.revenue += p.amount;
        }

        let product_stats = stats_order
            .into_iter()
            .filter_map(|id| by_product.remove(&id))
            .collect();

        let mut monthly_data: Vec<MonthlyStats> = by_month.into_values().collect();
        monthly_data.sort_by(|a, b| a.month.cmp(&b.month));

        Ok(SellerAnalytics {
            total_purchases: purchases.len() as u64,
            total_revenue,
            product_stats,
            monthly_data,
        })
    }
}
