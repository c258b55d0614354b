use crate::{
    entities::{order, product, purchase, Order, Product, Purchase},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// Display-oriented product excerpt attached to purchases in order views
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub price: Decimal,
    pub slug: String,
}

impl From<&product::Model> for ProductSummary {
    fn from(model: &product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            image: model.image.clone(),
            price: model.price,
            slug: model.slug.clone(),
        }
    }
}

/// A purchase with its product excerpt expanded. The product is optional:
/// a reseed can remove the catalog row while the purchase survives.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseDetail {
    #[serde(flatten)]
    pub purchase: purchase::Model,
    pub product: Option<ProductSummary>,
}

/// An order with its member purchases expanded for display
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithPurchases {
    #[serde(flatten)]
    pub order: order::Model,
    pub purchases: Vec<PurchaseDetail>,
}

/// Seller-facing order view: orders that contain at least one of the
/// seller's purchases (filtered to those purchases), plus purchases that
/// never belonged to an order.
#[derive(Debug, Serialize)]
pub struct SellerOrdersView {
    pub orders: Vec<OrderWithPurchases>,
    pub standalone_purchases: Vec<PurchaseDetail>,
}

/// Read side of orders: buyer history, seller view, single lookup
#[derive(Clone)]
pub struct OrderQueryService {
    db: Arc<DatabaseConnection>,
}

impl OrderQueryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// A buyer's orders, newest first, with purchases and product excerpts
    #[instrument(skip(self))]
    pub async fn orders_for_buyer(
        &self,
        buyer_id: Uuid,
    ) -> Result<Vec<OrderWithPurchases>, ServiceError> {
        let orders = Order::find()
            .filter(order::Column::BuyerId.eq(buyer_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let purchases = Purchase::find()
            .filter(purchase::Column::OrderId.is_in(order_ids))
            .all(&*self.db)
            .await?;

        let summaries = self
            .product_summaries(purchases.iter().map(|p| p.product_id))
            .await?;

        let mut by_order: HashMap<Uuid, Vec<PurchaseDetail>> = HashMap::new();
        for purchase in purchases {
            let Some(order_id) = purchase.order_id else {
                continue;
            };
            let product = summaries.get(&purchase.product_id).cloned();
            by_order
                .entry(order_id)
                .or_default()
                .push(PurchaseDetail { purchase, product });
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let purchases = by_order.remove(&order.id).unwrap_or_default();
                OrderWithPurchases { order, purchases }
            })
            .collect())
    }

    /// Single order by its human-readable order number
    #[instrument(skip(self))]
    pub async fn order_by_number(
        &self,
        order_number: &str,
    ) -> Result<OrderWithPurchases, ServiceError> {
        let order = Order::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_number)))?;

        self.expand_order(order).await
    }

    /// Expand one order into its purchase details
    pub(crate) async fn expand_order(
        &self,
        order: order::Model,
    ) -> Result<OrderWithPurchases, ServiceError> {
        let purchases = Purchase::find()
            .filter(purchase::Column::OrderId.eq(order.id))
            .all(&*self.db)
            .await?;

        let summaries = self
            .product_summaries(purchases.iter().map(|p| p.product_id))
            .await?;

        let purchases = purchases
            .into_iter()
            .map(|purchase| {
                let product = summaries.get(&purchase.product_id).cloned();
                PurchaseDetail { purchase, product }
            })
            .collect();

        Ok(OrderWithPurchases { order, purchases })
    }

    /// Seller view: the seller's purchases, newest first, grouped by parent
    /// order where one exists. Orders keep only the purchases belonging to
    /// this seller; purchases without an order are listed standalone.
    #[instrument(skip(self))]
    pub async fn orders_for_seller(
        &self,
        seller_id: Uuid,
    ) -> Result<SellerOrdersView, ServiceError> {
        let purchases = Purchase::find()
            .filter(purchase::Column::SellerId.eq(seller_id))
            .order_by_desc(purchase::Column::PurchaseDate)
            .all(&*self.db)
            .await?;

        let summaries = self
            .product_summaries(purchases.iter().map(|p| p.product_id))
            .await?;

        let order_ids: Vec<Uuid> = purchases.iter().filter_map(|p| p.order_id).collect();
        let orders: HashMap<Uuid, order::Model> = Order::find()
            .filter(order::Column::Id.is_in(order_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|o| (o.id, o))
            .collect();

        // Orders appear in the position of their most recent purchase
        let mut grouped: Vec<(Uuid, Vec<PurchaseDetail>)> = Vec::new();
        let mut index_of: HashMap<Uuid, usize> = HashMap::new();
        let mut standalone = Vec::new();

        for purchase in purchases {
            let product = summaries.get(&purchase.product_id).cloned();
            let detail = PurchaseDetail { purchase, product };

            match detail.purchase.order_id {
                Some(order_id) if orders.contains_key(&order_id) => {
                    let idx = *index_of.entry(order_id).or_insert_with(|| {
                        grouped.push((order_id, Vec::new()));
                        grouped.len() - 1
                    });
                    grouped[idx].1.push(detail);
                }
                _ => standalone.push(detail),
            }
        }

        let mut orders_view = Vec::with_capacity(grouped.len());
        for (order_id, purchases) in grouped {
            if let Some(order) = orders.get(&order_id) {
                orders_view.push(OrderWithPurchases {
                    order: order.clone(),
                    purchases,
                });
            }
        }

        Ok(SellerOrdersView {
            orders: orders_view,
            standalone_purchases: standalone,
        })
    }

    async fn product_summaries(
        &self,
        product_ids: impl Iterator<Item = Uuid>,
    ) -> Result<HashMap<Uuid, ProductSummary>, ServiceError> {
        let mut ids: Vec<Uuid> = product_ids.collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let products = Product::find()
            .filter(product::Column::Id.is_in(ids))
            .all(&*self.db)
            .await?;

        Ok(products
            .iter()
            .map(|p| (p.id, ProductSummary::from(p)))
            .collect())
    }
}
