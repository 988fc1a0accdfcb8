//! Domain models for the storefront.
//!
//! Models derive `sqlx::FromRow` directly: the core newtypes decode from
//! their column types, so rows arrive already typed.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod content;
pub mod order;
pub mod review;
pub mod session;
pub mod store_request;
pub mod user;

pub use address::{Address, AddressInput, AddressRequest, AddressSnapshot};
pub use cart::{Cart, CartLine};
pub use catalog::{
    Brand, Category, Page, ProductDetail, ProductImage, ProductListParams, ProductQuery,
    ProductSort, ProductSummary,
};
pub use content::{Banner, HomeContent, Testimonial};
pub use order::{Order, OrderItem, OrderSummary};
pub use review::{Review, ReviewInput, ReviewRequest};
pub use session::{CurrentUser, keys as session_keys};
pub use store_request::{StoreRequest, StoreRequestForm, StoreRequestInput};
pub use user::{ProfileInput, ProfileRequest, User};
