use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = r#"
# Storefront API

Backend for a marketplace storefront: a filtered product catalog, cart
checkout with inventory decrement, order history for buyers and sellers,
buyer-seller chat, demo scheduling, and seller revenue analytics.

## Error Handling

Failures return a consistent JSON body with conventional status codes
(400 validation, 401 auth, 404 not found, 409 conflict, 422 insufficient
stock, 500 unexpected):

```json
{
  "error": "Unprocessable Entity",
  "message": "Insufficient stock for Ultra-Slim Laptop. Requested: 3",
  "timestamp": "2026-01-01T00:00:00Z"
}
```

## Pagination

The product listing accepts `limit` (default 50, max 100) and `skip`
query parameters and reports the filtered `total`.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Products", description = "Catalog listing and maintenance"),
        (name = "Auth", description = "Account registration and login"),
        (name = "Checkout", description = "Cart checkout and order creation"),
        (name = "Orders", description = "Order retrieval"),
        (name = "Purchases", description = "Purchase records and seller analytics"),
        (name = "Seed", description = "Destructive catalog seeding")
    ),
    paths(
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::checkout::checkout,
        crate::handlers::orders::get_order,
        crate::handlers::purchases::seller_analytics,
        crate::handlers::seed::seed_catalog,
    ),
    components(schemas(
        crate::handlers::products::CreateProductRequest,
        crate::handlers::products::UpdateProductRequest,
        crate::handlers::products::AddReviewRequest,
        crate::handlers::auth::RegisterRequest,
        crate::handlers::auth::LoginRequest,
        crate::handlers::auth::UserProfile,
        crate::handlers::auth::AuthResponse,
        crate::handlers::checkout::CheckoutRequest,
        crate::handlers::checkout::CartItemRequest,
        crate::handlers::purchases::CreatePurchaseRequest,
        crate::handlers::chat::SendMessageRequest,
        crate::handlers::chat::MarkReadResponse,
        crate::handlers::demo_requests::CreateDemoRequestRequest,
        crate::handlers::demo_requests::UpdateDemoRequestRequest,
        crate::handlers::seed::SeedResponse,
        crate::services::orders::ProductSummary,
        crate::services::purchases::SellerAnalytics,
        crate::services::purchases::ProductStats,
        crate::services::purchases::MonthlyStats,
        crate::services::chat::ConversationSummary,
        crate::services::seed::SeededProduct,
        crate::entities::product::ProductCategory,
        crate::entities::product::ProductCondition,
        crate::entities::purchase::PaymentMethod,
        crate::entities::purchase::PaymentStatus,
        crate::entities::purchase::PurchaseStatus,
        crate::entities::order::OrderStatus,
        crate::entities::demo_request::DemoRequestStatus,
        crate::errors::ErrorResponse,
    ))
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Storefront API"));
        assert!(json.contains("/api/v1/checkout"));
    }
}
