//! Orders as the back office sees them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use cradlix_core::{
    Email, Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, UserId,
};

/// Order list row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: OrderId,
    pub user_id: UserId,
    pub customer_email: Email,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total: Money,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Full order with customer, address snapshot and lines.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub customer_name: String,
    pub customer_email: Email,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
    pub currency: String,
    pub receipt: Option<String>,
    pub shipping_address: JsonValue,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_slug: String,
    pub unit_price: Money,
    pub quantity: i32,
    pub line_total: Money,
}

/// `?status=&page=`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
}

/// `POST /api/admin/orders/{id}/status` body.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}
