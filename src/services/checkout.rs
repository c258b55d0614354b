use crate::{
    entities::{
        order::{self, OrderStatus},
        product,
        purchase::{self, PaymentMethod, PurchaseStatus},
        Product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::orders::{OrderWithPurchases, ProductSummary, PurchaseDetail},
};
use chrono::Utc;
use futures::future::try_join_all;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// One cart line submitted at checkout: product reference, quantity, and
/// the unit price the client saw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

/// Checkout input: buyer identity, cart lines, shipping and payment terms,
/// and the claimed total. The total is stored as submitted; it is not
/// reconciled against the purchase sum at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutInput {
    pub buyer_id: Uuid,
    pub buyer_name: String,
    pub lines: Vec<CartLine>,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub total_amount: Decimal,
}

/// Checkout/order processor.
///
/// Validates the whole cart before touching anything, then runs the
/// mutation sequence inside a single transaction: per line a conditional
/// stock decrement (guarded by `stock_quantity >= quantity`, so a racing
/// checkout cannot oversell) followed by the purchase insert, then the
/// order row. Any failure before commit rolls the whole checkout back;
/// there is no partially visible state.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CheckoutService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(buyer_id = %input.buyer_id, lines = input.lines.len()))]
    pub async fn checkout(&self, input: CheckoutInput) -> Result<OrderWithPurchases, ServiceError> {
        if input.lines.is_empty() {
            return Err(ServiceError::InvalidInput("Cart is empty".to_string()));
        }
        for line in &input.lines {
            if line.quantity < 1 {
                return Err(ServiceError::ValidationError(format!(
                    "Quantity for product {} must be at least 1",
                    line.product_id
                )));
            }
            if line.price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Price for product {} cannot be negative",
                    line.product_id
                )));
            }
        }

        // Fail-fast validation pass over the whole cart before any mutation
        let validated = try_join_all(
            input
                .lines
                .iter()
                .map(|line| self.validate_line(line.clone())),
        )
        .await?;

        let order_id = Uuid::new_v4();
        let order_number = generate_order_number();
        let now = Utc::now();
        let payment_status = input.payment_method.initial_payment_status();

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start checkout transaction");
            ServiceError::DatabaseError(e)
        })?;

        // The order row goes in first so purchases can reference it
        let order_row = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            buyer_id: Set(input.buyer_id),
            buyer_name: Set(input.buyer_name.clone()),
            total_amount: Set(input.total_amount),
            payment_status: Set(payment_status),
            payment_method: Set(input.payment_method),
            shipping_address: Set(input.shipping_address.clone()),
            order_status: Set(OrderStatus::Confirmed),
            created_at: Set(now),
        };
        let order_model = order_row.insert(&txn).await?;

        let mut purchases = Vec::with_capacity(validated.len());
        let mut depleted = Vec::new();

        for (line, product) in &validated {
            // Conditional decrement: the stock guard arbitrates racing
            // checkouts; zero affected rows means another buyer won
            let result = product::Entity::update_many()
                .col_expr(
                    product::Column::StockQuantity,
                    Expr::col(product::Column::StockQuantity).sub(line.quantity),
                )
                .col_expr(
                    product::Column::InStock,
                    Expr::expr(Expr::col(product::Column::StockQuantity).sub(line.quantity)).gt(0),
                )
                .filter(product::Column::Id.eq(product.id))
                .filter(product::Column::StockQuantity.gte(line.quantity))
                .exec(&txn)
                .await?;

            if result.rows_affected == 0 {
                txn.rollback().await.map_err(ServiceError::DatabaseError)?;
                return Err(ServiceError::InsufficientStock(format!(
                    "Insufficient stock for {}. Requested: {}",
                    product.name, line.quantity
                )));
            }

            let purchase_row = purchase::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product.id),
                buyer_id: Set(input.buyer_id),
                buyer_name: Set(input.buyer_name.clone()),
                seller_id: Set(product.seller_id),
                order_id: Set(Some(order_id)),
                amount: Set(line.price * Decimal::from(line.quantity)),
                quantity: Set(line.quantity),
                status: Set(PurchaseStatus::Completed),
                payment_status: Set(payment_status),
                payment_method: Set(input.payment_method),
                shipping_address: Set(input.shipping_address.clone()),
                purchase_date: Set(now),
            };
            let purchase_model = purchase_row.insert(&txn).await?;

            if product.stock_quantity - line.quantity <= 0 {
                depleted.push(product.id);
            }

            purchases.push(PurchaseDetail {
                purchase: purchase_model,
                product: Some(ProductSummary::from(product)),
            });
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_number = %order_number, "Failed to commit checkout transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_number = %order_number,
            buyer_id = %input.buyer_id,
            purchases = purchases.len(),
            "Checkout completed"
        );

        for detail in &purchases {
            self.event_sender
                .send_or_log(Event::PurchaseCreated(detail.purchase.id))
                .await;
        }
        for product_id in depleted {
            self.event_sender
                .send_or_log(Event::StockDepleted(product_id))
                .await;
        }
        self.event_sender
            .send_or_log(Event::OrderPlaced {
                order_id,
                order_number,
                total_amount: input.total_amount,
            })
            .await;

        Ok(OrderWithPurchases {
            order: order_model,
            purchases,
        })
    }

    /// Checks one cart line against the live catalog: the product must
    /// exist, be marked in stock, and cover the requested quantity.
    async fn validate_line(
        &self,
        line: CartLine,
    ) -> Result<(CartLine, product::Model), ServiceError> {
        let product = Product::find_by_id(line.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", line.product_id))
            })?;

        if !product.in_stock || product.stock_quantity < line.quantity {
            return Err(ServiceError::InsufficientStock(format!(
                "Insufficient stock for {}. Available: {}, Requested: {}",
                product.name, product.stock_quantity, line.quantity
            )));
        }

        Ok((line, product))
    }
}

const ORDER_NUMBER_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ORDER_NUMBER_SUFFIX_LEN: usize = 9;

/// Human-readable order identifier: `ORD-<epoch-ms>-<9-char-base36>`.
/// Uniqueness is probabilistic; the unique index on the column is the
/// collision backstop.
pub fn generate_order_number() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .map(|_| ORDER_NUMBER_ALPHABET[rng.gen_range(0..ORDER_NUMBER_ALPHABET.len())] as char)
        .collect();
    format!("ORD-{}-{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_numbers_follow_the_documented_format() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), ORDER_NUMBER_SUFFIX_LEN);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn order_numbers_are_distinct_across_calls() {
        let a = generate_order_number();
        let b = generate_order_number();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn empty_carts_are_rejected_before_any_database_work() {
        let service = CheckoutService::new(
            Arc::new(sea_orm::DatabaseConnection::Disconnected),
            Arc::new(EventSender::new(tokio::sync::mpsc::channel(1).0)),
        );

        let result = service
            .checkout(CheckoutInput {
                buyer_id: Uuid::new_v4(),
                buyer_name: "Buyer".to_string(),
                lines: Vec::new(),
                shipping_address: "1 Test Lane".to_string(),
                payment_method: PaymentMethod::Cod,
                total_amount: Decimal::ZERO,
            })
            .await;

        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn non_positive_quantities_are_rejected_before_any_database_work() {
        let service = CheckoutService::new(
            Arc::new(sea_orm::DatabaseConnection::Disconnected),
            Arc::new(EventSender::new(tokio::sync::mpsc::channel(1).0)),
        );

        let result = service
            .checkout(CheckoutInput {
                buyer_id: Uuid::new_v4(),
                buyer_name: "Buyer".to_string(),
                lines: vec![CartLine {
                    product_id: Uuid::new_v4(),
                    quantity: 0,
                    price: Decimal::from(10),
                }],
                shipping_address: "1 Test Lane".to_string(),
                payment_method: PaymentMethod::Cod,
                total_amount: Decimal::ZERO,
            })
            .await;

        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }
}
