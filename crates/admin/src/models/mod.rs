//! Domain models for the back office.
//!
//! Request bodies (`*Request`) deserialize loosely and convert into
//! validated `*Input` values with `TryFrom`; rows derive `sqlx::FromRow`.

pub mod admin_user;
pub mod banner;
pub mod brand;
pub mod dashboard;
pub mod order;
pub mod page;
pub mod session;
pub mod store_request;
pub mod testimonial;

pub use admin_user::AdminUser;
pub use banner::{Banner, BannerInput, BannerRequest};
pub use brand::{Brand, BrandInput, BrandRequest};
pub use dashboard::{Dashboard, StatusCount};
pub use order::{Order, OrderFilter, OrderItem, OrderSummary, StatusUpdate};
pub use page::Page;
pub use session::{CurrentAdmin, keys as session_keys};
pub use store_request::{Decision, DecisionRequest, StoreRequest, StoreRequestFilter};
pub use testimonial::{Testimonial, TestimonialInput, TestimonialRequest};
