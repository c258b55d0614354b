use crate::{
    entities::{
        product::{self, ProductCategory, ProductCondition},
        review, Product, Review,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, Query, SimpleExpr, SubQueryStatement},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const DEFAULT_LIMIT: u64 = 50;
const MAX_LIMIT: u64 = 100;
const FEATURED_LIMIT: u64 = 6;

/// Derives a URL-safe slug from a product name: lowercase, alphanumerics
/// kept, whitespace/underscore runs collapsed to single hyphens, everything
/// else dropped, no leading or trailing hyphen.
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_hyphen = true;
        }
    }

    slug
}

/// Explicit filter specification for product listing; every field is
/// optional and present fields are combined conjunctively.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<ProductCategory>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub brand: Option<String>,
    pub condition: Option<ProductCondition>,
    pub min_rating: Option<f32>,
    pub in_stock: Option<bool>,
    pub has_discount: Option<bool>,
    pub is_user_product: Option<bool>,
    pub tag: Option<String>,
    pub search: Option<String>,
}

/// Closed sort-key enumeration for product listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    #[default]
    Newest,
    Oldest,
    PriceLow,
    PriceHigh,
    Rating,
    RatingLow,
    Name,
    NameDesc,
    Reviews,
    Discount,
}

/// One page of a filtered product listing
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<product::Model>,
    pub total: u64,
    pub limit: u64,
    pub skip: u64,
}

/// Input for creating a product
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CreateProductInput {
    pub name: String,
    pub slug: Option<String>,
    pub description: String,
    pub long_description: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub image: String,
    pub images: Vec<String>,
    pub category: ProductCategory,
    pub brand: String,
    pub featured: bool,
    pub stock_quantity: i32,
    pub condition: ProductCondition,
    pub seller_id: Option<Uuid>,
    pub seller_name: String,
    pub seller_contact: String,
    pub specifications: serde_json::Map<String, serde_json::Value>,
    pub tags: Vec<String>,
}

/// Input for partially updating a product
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub category: Option<ProductCategory>,
    pub brand: Option<String>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
    pub stock_quantity: Option<i32>,
    pub condition: Option<ProductCondition>,
    pub seller_name: Option<String>,
    pub seller_contact: Option<String>,
    pub specifications: Option<serde_json::Map<String, serde_json::Value>>,
    pub tags: Option<Vec<String>>,
}

/// Input for appending a review
#[derive(Debug, Deserialize, Serialize)]
pub struct AddReviewInput {
    pub user_name: String,
    pub rating: i32,
    pub comment: String,
}

/// Product catalog service: listing, lookup, maintenance, and reviews
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// List products matching `filter`, ordered by `sort`, paginated by
    /// `limit`/`skip`. Discount ordering cannot be expressed as a native
    /// sort key, so that variant fetches the whole filtered set and sorts
    /// by the derived discount in memory before slicing.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
        sort: ProductSort,
        limit: Option<u64>,
        skip: Option<u64>,
    ) -> Result<ProductPage, ServiceError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let skip = skip.unwrap_or(0);

        let condition = build_filter_condition(&filter);
        let base = Product::find().filter(condition);

        let total = base.clone().count(&*self.db).await?;

        let products = if sort == ProductSort::Discount {
            let mut all = base.all(&*self.db).await?;
            all.sort_by(|a, b| discount_of(b).cmp(&discount_of(a)));
            all.into_iter()
                .skip(skip as usize)
                .take(limit as usize)
                .collect()
        } else {
            apply_sort(base, sort)
                .limit(limit)
                .offset(skip)
                .all(&*self.db)
                .await?
        };

        Ok(ProductPage {
            products,
            total,
            limit,
            skip,
        })
    }

    /// Fixed-size featured subset
    #[instrument(skip(self))]
    pub async fn featured_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        Product::find()
            .filter(product::Column::Featured.eq(true))
            .limit(FEATURED_LIMIT)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<product::Model, ServiceError> {
        Product::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", slug)))
    }

    /// Reviews for a product, oldest first
    #[instrument(skip(self))]
    pub async fn product_reviews(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<review::Model>, ServiceError> {
        Review::find()
            .filter(review::Column::ProductId.eq(product_id))
            .order_by_asc(review::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// A seller's listed products
    #[instrument(skip(self))]
    pub async fn products_by_seller(
        &self,
        seller_id: Uuid,
    ) -> Result<Vec<product::Model>, ServiceError> {
        Product::find()
            .filter(product::Column::SellerId.eq(seller_id))
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Create a catalog item. The slug is derived from the name when not
    /// supplied; products carrying seller information are marked as user
    /// listings.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let slug = match input.slug {
            Some(ref slug) if !slug.trim().is_empty() => slug.trim().to_lowercase(),
            _ => generate_slug(&input.name),
        };
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Product name does not yield a usable slug".to_string(),
            ));
        }
        self.ensure_unique_slug(&slug, None).await?;

        let is_user_product = input.seller_id.is_some() || !input.seller_name.is_empty();

        let product_id = Uuid::new_v4();
        let product = product::ActiveModel {
            id: Set(product_id),
            name: Set(input.name),
            slug: Set(slug),
            description: Set(input.description),
            long_description: Set(input.long_description),
            price: Set(input.price),
            original_price: Set(input.original_price),
            image: Set(input.image),
            images: Set(serde_json::json!(input.images)),
            category: Set(input.category),
            brand: Set(input.brand),
            featured: Set(input.featured),
            in_stock: Set(input.stock_quantity > 0),
            stock_quantity: Set(input.stock_quantity),
            condition: Set(input.condition),
            seller_id: Set(input.seller_id),
            seller_name: Set(input.seller_name),
            seller_contact: Set(input.seller_contact),
            is_user_product: Set(is_user_product),
            rating: Set(0.0),
            specifications: Set(serde_json::Value::Object(input.specifications)),
            tags: Set(input.tags.join(",")),
            created_at: Set(Utc::now()),
        };

        let product = product.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product_id))
            .await;

        info!("Created product: {}", product_id);
        Ok(product)
    }

    /// Partially update a product; a name change regenerates the slug
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let product = self.get_product(product_id).await?;
        let renamed = input
            .name
            .as_ref()
            .is_some_and(|name| *name != product.name);
        let mut active: product::ActiveModel = product.into();

        if let Some(name) = input.name {
            if renamed {
                let slug = generate_slug(&name);
                if slug.is_empty() {
                    return Err(ServiceError::ValidationError(
                        "Product name does not yield a usable slug".to_string(),
                    ));
                }
                self.ensure_unique_slug(&slug, Some(product_id)).await?;
                active.slug = Set(slug);
            }
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(long_description) = input.long_description {
            active.long_description = Set(long_description);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(original_price) = input.original_price {
            active.original_price = Set(Some(original_price));
        }
        if let Some(image) = input.image {
            active.image = Set(image);
        }
        if let Some(images) = input.images {
            active.images = Set(serde_json::json!(images));
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(brand) = input.brand {
            active.brand = Set(brand);
        }
        if let Some(featured) = input.featured {
            active.featured = Set(featured);
        }
        if let Some(stock_quantity) = input.stock_quantity {
            active.stock_quantity = Set(stock_quantity);
            active.in_stock = Set(stock_quantity > 0);
        } else if let Some(in_stock) = input.in_stock {
            active.in_stock = Set(in_stock);
        }
        if let Some(condition) = input.condition {
            active.condition = Set(condition);
        }
        if let Some(seller_name) = input.seller_name {
            active.seller_name = Set(seller_name);
        }
        if let Some(seller_contact) = input.seller_contact {
            active.seller_contact = Set(seller_contact);
        }
        if let Some(specifications) = input.specifications {
            active.specifications = Set(serde_json::Value::Object(specifications));
        }
        if let Some(tags) = input.tags {
            active.tags = Set(tags.join(","));
        }

        let product = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        info!("Updated product: {}", product_id);
        Ok(product)
    }

    /// Append a review and recompute the product's average rating
    #[instrument(skip(self, input), fields(rating = input.rating))]
    pub async fn add_review(
        &self,
        product_id: Uuid,
        input: AddReviewInput,
    ) -> Result<(product::Model, Vec<review::Model>), ServiceError> {
        if !(1..=5).contains(&input.rating) {
            return Err(ServiceError::ValidationError(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        let product = self.get_product(product_id).await?;

        let review = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            user_name: Set(input.user_name),
            rating: Set(input.rating),
            comment: Set(input.comment),
            created_at: Set(Utc::now()),
        };
        review.insert(&*self.db).await?;

        let reviews = self.product_reviews(product_id).await?;
        let average = average_rating(reviews.iter().map(|r| r.rating));

        let mut active: product::ActiveModel = product.into();
        active.rating = Set(average);
        let product = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ReviewAdded {
                product_id,
                rating: input.rating,
            })
            .await;

        Ok((product, reviews))
    }

    async fn ensure_unique_slug(
        &self,
        slug: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = Product::find().filter(product::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            query = query.filter(product::Column::Id.ne(id));
        }

        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Slug '{}' already exists",
                slug
            )));
        }

        Ok(())
    }
}

/// Average of review ratings rounded to one decimal; 0 when unreviewed
pub fn average_rating(ratings: impl Iterator<Item = i32>) -> f32 {
    let (sum, count) = ratings.fold((0i64, 0i64), |(sum, count), r| (sum + r as i64, count + 1));
    if count == 0 {
        return 0.0;
    }
    ((sum as f32 / count as f32) * 10.0).round() / 10.0
}

/// Discount derived for in-memory sorting; zero when not discounted
fn discount_of(model: &product::Model) -> Decimal {
    model
        .original_price
        .filter(|original| *original > model.price)
        .map(|original| original - model.price)
        .unwrap_or(Decimal::ZERO)
}

fn build_filter_condition(filter: &ProductFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(category) = filter.category {
        condition = condition.add(product::Column::Category.eq(category));
    }
    if let Some(ref brand) = filter.brand {
        condition = condition.add(product::Column::Brand.eq(brand.clone()));
    }
    if let Some(item_condition) = filter.condition {
        condition = condition.add(product::Column::Condition.eq(item_condition));
    }
    if let Some(in_stock) = filter.in_stock {
        condition = condition.add(product::Column::InStock.eq(in_stock));
    }
    if let Some(is_user_product) = filter.is_user_product {
        condition = condition.add(product::Column::IsUserProduct.eq(is_user_product));
    }
    if let Some(min_rating) = filter.min_rating {
        condition = condition.add(product::Column::Rating.gte(min_rating));
    }
    if let Some(min_price) = filter.min_price {
        condition = condition.add(product::Column::Price.gte(min_price));
    }
    if let Some(max_price) = filter.max_price {
        condition = condition.add(product::Column::Price.lte(max_price));
    }
    if filter.has_discount == Some(true) {
        condition = condition
            .add(product::Column::OriginalPrice.is_not_null())
            .add(Expr::col(product::Column::OriginalPrice).gt(Expr::col(product::Column::Price)));
    }
    if let Some(ref tag) = filter.tag {
        condition = condition.add(product::Column::Tags.contains(tag.as_str()));
    }
    if let Some(ref term) = filter.search {
        let pattern = format!("%{}%", term.to_lowercase());
        let mut any = Condition::any();
        for column in [
            product::Column::Name,
            product::Column::Description,
            product::Column::LongDescription,
            product::Column::Brand,
            product::Column::Tags,
        ] {
            any = any.add(Expr::expr(Func::lower(Expr::col(column))).like(pattern.clone()));
        }
        condition = condition.add(any);
    }

    condition
}

fn apply_sort(select: Select<product::Entity>, sort: ProductSort) -> Select<product::Entity> {
    match sort {
        ProductSort::Newest => select.order_by_desc(product::Column::CreatedAt),
        ProductSort::Oldest => select.order_by_asc(product::Column::CreatedAt),
        ProductSort::PriceLow => select.order_by_asc(product::Column::Price),
        ProductSort::PriceHigh => select.order_by_desc(product::Column::Price),
        ProductSort::Rating => select.order_by_desc(product::Column::Rating),
        ProductSort::RatingLow => select.order_by_asc(product::Column::Rating),
        ProductSort::Name => select.order_by_asc(product::Column::Name),
        ProductSort::NameDesc => select.order_by_desc(product::Column::Name),
        ProductSort::Reviews => select.order_by_desc(review_count_expr()),
        // Discount ordering is resolved in memory by the caller
        ProductSort::Discount => select,
    }
}

/// Correlated COUNT subquery over the reviews table, used for the
/// review-count sort key
fn review_count_expr() -> SimpleExpr {
    SimpleExpr::SubQuery(
        None,
        Box::new(SubQueryStatement::SelectStatement(
            Query::select()
                .expr(review::Column::Id.count())
                .from(review::Entity)
                .and_where(
                    Expr::col((review::Entity, review::Column::ProductId))
                        .equals((product::Entity, product::Column::Id)),
                )
                .to_owned(),
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn slug_generation_matches_catalog_conventions() {
        assert_eq!(generate_slug("Premium Smartphone Pro"), "premium-smartphone-pro");
        assert_eq!(generate_slug("  4K Ultra HD TV  "), "4k-ultra-hd-tv");
        assert_eq!(generate_slug("Café & Co.'s  _deluxe_  set!"), "caf-cos-deluxe-set");
        assert_eq!(generate_slug("---"), "");
        assert_eq!(generate_slug("Wireless; Earbuds (Pro)"), "wireless-earbuds-pro");
    }

    #[test]
    fn average_rating_rounds_to_one_decimal() {
        assert_eq!(average_rating([5, 4].into_iter()), 4.5);
        assert_eq!(average_rating([4, 4, 5].into_iter()), 4.3);
        assert_eq!(average_rating(std::iter::empty()), 0.0);
    }

    #[test]
    fn discount_ignores_non_discounted_products() {
        let mut model = product_fixture();
        assert_eq!(discount_of(&model), Decimal::ZERO);

        model.original_price = Some(dec!(120));
        assert_eq!(discount_of(&model), dec!(20));

        // An original price at or below the sale price is not a discount
        model.original_price = Some(dec!(100));
        assert_eq!(discount_of(&model), Decimal::ZERO);
    }

    #[test]
    fn default_sort_is_newest() {
        assert_eq!(ProductSort::default(), ProductSort::Newest);
        let parsed: ProductSort = serde_json::from_str("\"price-low\"").unwrap();
        assert_eq!(parsed, ProductSort::PriceLow);
        let parsed: ProductSort = serde_json::from_str("\"name-desc\"").unwrap();
        assert_eq!(parsed, ProductSort::NameDesc);
    }

    fn product_fixture() -> product::Model {
        product::Model {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            slug: "test".to_string(),
            description: String::new(),
            long_description: String::new(),
            price: dec!(100),
            original_price: None,
            image: String::new(),
            images: serde_json::json!([]),
            category: ProductCategory::Electronics,
            brand: String::new(),
            featured: false,
            in_stock: true,
            stock_quantity: 5,
            condition: ProductCondition::New,
            seller_id: None,
            seller_name: String::new(),
            seller_contact: String::new(),
            is_user_product: false,
            rating: 0.0,
            specifications: serde_json::json!({}),
            tags: String::new(),
            created_at: Utc::now(),
        }
    }
}
