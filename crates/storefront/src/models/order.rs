//! Orders and order lines.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;

use cradlix_core::{Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, UserId};

use super::AddressSnapshot;

/// A placed order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    #[serde(skip)]
    pub user_id: UserId,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
    pub currency: String,
    pub receipt: Option<String>,
    pub shipping_address: Json<AddressSnapshot>,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Statuses from which the customer may still cancel.
    ///
    /// Prepaid orders can only be abandoned before payment; a COD order can
    /// be cancelled until it ships.
    #[must_use]
    pub const fn customer_cancellable(&self) -> &'static [OrderStatus] {
        match self.payment_method {
            PaymentMethod::Razorpay => &[OrderStatus::PendingPayment],
            PaymentMethod::CashOnDelivery => {
                &[OrderStatus::PendingPayment, OrderStatus::Processing]
            }
        }
    }
}

/// A line on an order, frozen at purchase time.
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

/// Order list entry.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: OrderId,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total: Money,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(status: OrderStatus, payment_method: PaymentMethod) -> Order {
        Order {
            id: OrderId::new(1),
            user_id: UserId::new(1),
            status,
            payment_method,
            subtotal: Money::from_rupees(100),
            shipping_fee: Money::from_rupees(49),
            total: Money::from_rupees(149),
            currency: "INR".to_string(),
            receipt: None,
            shipping_address: Json(AddressSnapshot {
                full_name: "Asha".to_string(),
                phone: "9876543210".to_string(),
                line1: "1 MG Road".to_string(),
                line2: None,
                landmark: None,
                city: "Pune".to_string(),
                state: "Maharashtra".to_string(),
                pincode: "411001".to_string(),
            }),
            razorpay_order_id: None,
            razorpay_payment_id: None,
            paid_at: None,
            cancelled_at: None,
            created_at: Utc::now(),
            items: Vec::new(),
        }
    }

    fn can_cancel(status: OrderStatus, method: PaymentMethod) -> bool {
        order(status, method).customer_cancellable().contains(&status)
    }

    #[test]
    fn test_customer_cancellation_policy() {
        use OrderStatus::*;
        use PaymentMethod::*;
        assert!(can_cancel(PendingPayment, Razorpay));
        assert!(can_cancel(PendingPayment, CashOnDelivery));
        assert!(can_cancel(Processing, CashOnDelivery));
        assert!(!can_cancel(Processing, Razorpay));
        assert!(!can_cancel(Paid, Razorpay));
        assert!(!can_cancel(Shipped, CashOnDelivery));
        assert!(!can_cancel(Cancelled, Razorpay));
    }
}
