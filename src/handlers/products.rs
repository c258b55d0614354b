use crate::entities::{
    product::{self, ProductCategory, ProductCondition},
    review,
};
use crate::handlers::common::{created_response, map_service_error, success_response, validate_input};
use crate::services::catalog::{
    AddReviewInput, CreateProductInput, ProductFilter, ProductSort, UpdateProductInput,
};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for product endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/featured", get(featured_products))
        .route("/slug/:slug", get(get_product_by_slug))
        .route("/user/:user_id", get(products_by_seller))
        .route("/:id", get(get_product).put(update_product))
        .route("/:id/reviews", post(add_review))
}

/// Flat query-string parameters for the filtered product listing
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
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
    #[serde(default)]
    pub sort: ProductSort,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

impl ProductListQuery {
    fn into_parts(self) -> (ProductFilter, ProductSort, Option<u64>, Option<u64>) {
        let filter = ProductFilter {
            category: self.category,
            min_price: self.min_price,
            max_price: self.max_price,
            brand: self.brand,
            condition: self.condition,
            min_rating: self.min_rating,
            in_stock: self.in_stock,
            has_discount: self.has_discount,
            is_user_product: self.is_user_product,
            tag: self.tag,
            search: self.search,
        };
        (filter, self.sort, self.limit, self.skip)
    }
}

/// List products with filters, sort, and pagination
#[utoipa::path(
    get,
    path = "/api/v1/products",
    responses(
        (status = 200, description = "Filtered product listing"),
        (status = 400, description = "Malformed filter parameter", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub(crate) async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (filter, sort, limit, skip) = query.into_parts();
    let page = state
        .services
        .catalog
        .list_products(filter, sort, limit, skip)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductPageResponse {
        products: page
            .products
            .into_iter()
            .map(ProductResponse::from_model)
            .collect(),
        total: page.total,
        limit: page.limit,
        skip: page.skip,
    }))
}

/// Fixed-size featured subset
async fn featured_products(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .catalog
        .featured_products()
        .await
        .map_err(map_service_error)?;

    let products: Vec<ProductResponse> = products
        .into_iter()
        .map(ProductResponse::from_model)
        .collect();
    Ok(success_response(products))
}

/// Single product by id, reviews included
#[utoipa::path(
    get,
    path = "/api/v1/products/:id",
    responses(
        (status = 200, description = "Product retrieved"),
        (status = 400, description = "Malformed product id", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub(crate) async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_product_id(&id)?;
    let product = state
        .services
        .catalog
        .get_product(id)
        .await
        .map_err(map_service_error)?;
    let reviews = state
        .services
        .catalog
        .product_reviews(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::with_reviews(
        product, reviews,
    )))
}

/// Single product by slug, reviews included
async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .catalog
        .get_product_by_slug(&slug)
        .await
        .map_err(map_service_error)?;
    let reviews = state
        .services
        .catalog
        .product_reviews(product.id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::with_reviews(
        product, reviews,
    )))
}

/// A seller's listed products
async fn products_by_seller(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .catalog
        .products_by_seller(user_id)
        .await
        .map_err(map_service_error)?;

    let products: Vec<ProductResponse> = products
        .into_iter()
        .map(ProductResponse::from_model)
        .collect();
    Ok(success_response(products))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub(crate) async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateProductInput {
        name: payload.name.trim().to_string(),
        slug: payload.slug,
        description: payload.description.unwrap_or_default(),
        long_description: payload.long_description.unwrap_or_default(),
        price: payload.price,
        original_price: payload.original_price,
        image: payload.image.clone().unwrap_or_default(),
        images: payload
            .images
            .unwrap_or_else(|| payload.image.into_iter().collect()),
        category: payload.category,
        brand: payload.brand.unwrap_or_default(),
        featured: payload.featured.unwrap_or(false),
        stock_quantity: payload.stock_quantity.unwrap_or(0),
        condition: payload.condition.unwrap_or(ProductCondition::New),
        seller_id: payload.seller_id,
        seller_name: payload.seller_name.unwrap_or_default(),
        seller_contact: payload.seller_contact.unwrap_or_default(),
        specifications: payload.specifications.unwrap_or_default(),
        tags: payload.tags.unwrap_or_default(),
    };

    let product = state
        .services
        .catalog
        .create_product(input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(ProductResponse::from_model(product)))
}

/// Update a product; renaming regenerates the slug
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_product_id(&id)?;
    validate_input(&payload)?;

    let input = UpdateProductInput {
        name: payload.name,
        description: payload.description,
        long_description: payload.long_description,
        price: payload.price,
        original_price: payload.original_price,
        image: payload.image,
        images: payload.images,
        category: payload.category,
        brand: payload.brand,
        featured: payload.featured,
        in_stock: payload.in_stock,
        stock_quantity: payload.stock_quantity,
        condition: payload.condition,
        seller_name: payload.seller_name,
        seller_contact: payload.seller_contact,
        specifications: payload.specifications,
        tags: payload.tags,
    };

    let product = state
        .services
        .catalog
        .update_product(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::from_model(product)))
}

/// Append a review and return the product with its recomputed rating
async fn add_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AddReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_product_id(&id)?;
    validate_input(&payload)?;

    let (product, reviews) = state
        .services
        .catalog
        .add_review(
            id,
            AddReviewInput {
                user_name: payload.user_name,
                rating: payload.rating,
                comment: payload.comment.unwrap_or_default(),
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::with_reviews(
        product, reviews,
    )))
}

fn parse_product_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest {
        message: "Invalid product ID format".to_string(),
        details: None,
    })
}

// Request/Response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Product name is required"))]
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub category: ProductCategory,
    pub brand: Option<String>,
    pub featured: Option<bool>,
    pub stock_quantity: Option<i32>,
    pub condition: Option<ProductCondition>,
    pub seller_id: Option<Uuid>,
    pub seller_name: Option<String>,
    pub seller_contact: Option<String>,
    pub specifications: Option<serde_json::Map<String, serde_json::Value>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Product name cannot be blank"))]
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

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddReviewRequest {
    #[validate(length(min = 1, message = "Reviewer name is required"))]
    pub user_name: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductPageResponse {
    pub products: Vec<ProductResponse>,
    pub total: u64,
    pub limit: u64,
    pub skip: u64,
}

/// Outward product shape: tags and images as arrays, reviews attached on
/// detail endpoints
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub long_description: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    pub image: String,
    pub images: Vec<String>,
    pub category: ProductCategory,
    pub brand: String,
    pub featured: bool,
    pub in_stock: bool,
    pub stock_quantity: i32,
    pub condition: ProductCondition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<Uuid>,
    pub seller_name: String,
    pub seller_contact: String,
    pub is_user_product: bool,
    pub rating: f32,
    pub specifications: serde_json::Value,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<review::Model>>,
}

impl ProductResponse {
    pub fn from_model(model: product::Model) -> Self {
        let images = serde_json::from_value(model.images.clone()).unwrap_or_default();
        let tags = model
            .tags
            .split(',')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            long_description: model.long_description,
            price: model.price,
            original_price: model.original_price,
            image: model.image,
            images,
            category: model.category,
            brand: model.brand,
            featured: model.featured,
            in_stock: model.in_stock,
            stock_quantity: model.stock_quantity,
            condition: model.condition,
            seller_id: model.seller_id,
            seller_name: model.seller_name,
            seller_contact: model.seller_contact,
            is_user_product: model.is_user_product,
            rating: model.rating,
            specifications: model.specifications,
            tags,
            created_at: model.created_at,
            reviews: None,
        }
    }

    pub fn with_reviews(model: product::Model, reviews: Vec<review::Model>) -> Self {
        let mut response = Self::from_model(model);
        response.reviews = Some(reviews);
        response
    }
}
