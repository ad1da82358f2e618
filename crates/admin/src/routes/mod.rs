//! HTTP routes.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                             - Liveness
//! GET  /health/ready                       - Readiness (database ping)
//! GET  /uploads/...                        - Uploaded files (static)
//!
//! # Under /api/v1
//! POST /auth/login                         - Login (public, rate limited)
//! POST /auth/refresh-token                 - New token pair (public)
//! GET  /auth/profile                       - Current user
//!
//! GET  /categories/root                    - Active top-level categories (public)
//! PUT  /notifications/{id}/read            - Mark one notification read
//! PUT  /notifications/read-all?user=       - Mark a user's notifications read
//! POST /coupons/validate                   - Price a coupon
//! POST /uploads/single/{collection}        - Upload one image
//! POST /uploads/{collection}               - Upload up to 10 images
//!
//! # CRUD (see `resource`) for every entity
//! /users /categories /brands /vendors /products
//! /product-attributes (alias /productattributes)
//! /product-variants (alias /productvariants)
//! /locations /product-inventories /addresses /carts /orders
//! /payments /payment-methods /coupons /notifications
//! /activity-logs (alias /activityLogs, read-only)
//! ```

pub mod auth;
pub mod categories;
pub mod coupons;
pub mod health;
pub mod notifications;
pub mod resource;
pub mod response;
pub mod uploads;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::db::{
    activity_logs::ActivityLogs, addresses::Addresses, brands::Brands, carts::Carts,
    categories::Categories, coupons::Coupons, inventories::Inventories, locations::Locations,
    notifications::Notifications, orders::Orders, payment_methods::PaymentMethods,
    payments::Payments, product_attributes::ProductAttributes,
    product_variants::ProductVariants, products::Products, users::Users, vendors::Vendors,
};
use crate::state::AppState;

pub use response::{ApiResponse, JsonBody, Listing};

/// Every route under `/api/v1`.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/uploads", uploads::router(state))
        .nest("/users", resource::router::<Users>())
        .nest(
            "/categories",
            resource::router::<Categories>().route("/root", get(categories::roots)),
        )
        .nest("/brands", resource::router::<Brands>())
        .nest("/vendors", resource::router::<Vendors>())
        .nest("/products", resource::router::<Products>())
        .nest("/product-attributes", resource::router::<ProductAttributes>())
        .nest("/productattributes", resource::router::<ProductAttributes>())
        .nest("/product-variants", resource::router::<ProductVariants>())
        .nest("/productvariants", resource::router::<ProductVariants>())
        .nest("/locations", resource::router::<Locations>())
        .nest("/product-inventories", resource::router::<Inventories>())
        .nest("/addresses", resource::router::<Addresses>())
        .nest("/carts", resource::router::<Carts>())
        .nest("/orders", resource::router::<Orders>())
        .nest("/payments", resource::router::<Payments>())
        .nest("/payment-methods", resource::router::<PaymentMethods>())
        .nest(
            "/coupons",
            resource::router::<Coupons>().route("/validate", post(coupons::validate)),
        )
        .nest(
            "/notifications",
            resource::router::<Notifications>()
                .route("/read-all", put(notifications::mark_all_read))
                .route("/{id}/read", put(notifications::mark_read)),
        )
        .nest("/activity-logs", resource::read_only_router::<ActivityLogs>())
        .nest("/activityLogs", resource::read_only_router::<ActivityLogs>())
}

/// Routes outside the versioned API.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}
