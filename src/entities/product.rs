use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Catalog item. `in_stock` is derived from `stock_quantity` and must be
/// recomputed whenever stock mutates; `rating` is the running average of the
/// product's reviews, rounded to one decimal.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Product name must be between 1 and 255 characters"
    ))]
    pub name: String,

    /// URL-safe identifier derived from the name
    #[sea_orm(unique)]
    pub slug: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(column_type = "Text")]
    pub long_description: String,

    pub price: Decimal,

    /// Pre-discount price; a value above `price` marks a discounted item
    pub original_price: Option<Decimal>,

    pub image: String,

    /// Gallery image URLs
    #[sea_orm(column_type = "Json")]
    pub images: Json,

    pub category: ProductCategory,
    pub brand: String,
    pub featured: bool,
    pub in_stock: bool,
    pub stock_quantity: i32,
    pub condition: ProductCondition,

    /// Owning user for seller-listed products; null for house catalog items
    pub seller_id: Option<Uuid>,
    pub seller_name: String,
    pub seller_contact: String,
    pub is_user_product: bool,

    /// Derived review average, 0 when unreviewed
    pub rating: f32,

    #[sea_orm(column_type = "Json")]
    pub specifications: Json,

    /// Comma-separated tag list
    #[sea_orm(column_type = "Text")]
    pub tags: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::purchase::Entity")]
    Purchases,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SellerId",
        to = "super::user::Column::Id"
    )]
    Seller,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seller.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Closed category set for the storefront
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ProductCategory {
    #[sea_orm(string_value = "Electronics")]
    Electronics,
    #[sea_orm(string_value = "Fashion")]
    Fashion,
    #[sea_orm(string_value = "Accessories")]
    Accessories,
    #[sea_orm(string_value = "Home")]
    Home,
    #[sea_orm(string_value = "Sports")]
    Sports,
    #[default]
    #[sea_orm(string_value = "Other")]
    Other,
}

/// Item condition for seller listings
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ProductCondition {
    #[default]
    #[sea_orm(string_value = "New")]
    New,
    #[serde(rename = "Like New")]
    #[sea_orm(string_value = "Like New")]
    LikeNew,
    #[sea_orm(string_value = "Excellent")]
    Excellent,
    #[sea_orm(string_value = "Good")]
    Good,
    #[sea_orm(string_value = "Fair")]
    Fair,
    #[sea_orm(string_value = "Poor")]
    Poor,
}
