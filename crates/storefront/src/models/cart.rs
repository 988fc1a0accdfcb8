//! Shopping cart.

use serde::Serialize;

use cradlix_core::{Money, ProductId};

use crate::services::checkout::Pricing;

/// Most units of one product a cart line may hold.
pub const MAX_LINE_QUANTITY: i32 = 10;

/// A cart line joined with current product data.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub product_id: ProductId,
    pub slug: String,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: Money,
    pub quantity: i32,
    #[serde(skip)]
    pub stock: i32,
    #[serde(skip)]
    pub is_active: bool,
    #[sqlx(skip)]
    pub line_total: Money,
    #[sqlx(skip)]
    pub in_stock: bool,
}

impl CartLine {
    /// Fill the derived fields after loading from the database.
    #[must_use]
    pub fn priced(mut self) -> Self {
        self.line_total = self.unit_price * self.quantity.unsigned_abs();
        self.in_stock = self.is_active && self.stock >= self.quantity;
        self
    }
}

/// The cart response body.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub items: Vec<CartLine>,
    pub item_count: i64,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
}

impl Cart {
    #[must_use]
    pub fn new(lines: Vec<CartLine>, pricing: &Pricing) -> Self {
        let items: Vec<CartLine> = lines.into_iter().map(CartLine::priced).collect();
        let subtotal: Money = items.iter().map(|l| l.line_total).sum();
        let totals = pricing.totals(subtotal);
        Self {
            item_count: items.iter().map(|l| i64::from(l.quantity)).sum(),
            items,
            subtotal: totals.subtotal,
            shipping_fee: totals.shipping_fee,
            total: totals.total,
        }
    }
}

/// Validate a requested line quantity.
///
/// # Errors
///
/// Returns a client message when the quantity is outside 1..=10.
pub fn check_quantity(quantity: i32) -> Result<i32, cradlix_core::validation::ValidationError> {
    if (1..=MAX_LINE_QUANTITY).contains(&quantity) {
        Ok(quantity)
    } else {
        Err(cradlix_core::validation::ValidationError::new(format!(
            "quantity must be between 1 and {MAX_LINE_QUANTITY}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckoutConfig;

    fn line(price: i64, quantity: i32, stock: i32) -> CartLine {
        CartLine {
            product_id: ProductId::new(1),
            slug: "bamboo-washcloth".to_string(),
            name: "Bamboo Washcloth".to_string(),
            image_url: None,
            unit_price: Money::from_rupees(price),
            quantity,
            stock,
            is_active: true,
            line_total: Money::ZERO,
            in_stock: false,
        }
    }

    #[test]
    fn test_cart_below_free_shipping() {
        let pricing = Pricing::from(CheckoutConfig::default());
        let cart = Cart::new(vec![line(150, 2, 5)], &pricing);
        assert_eq!(cart.item_count, 2);
        assert_eq!(cart.subtotal, Money::from_rupees(300));
        assert_eq!(cart.shipping_fee, Money::from_rupees(49));
        assert_eq!(cart.total, Money::from_rupees(349));
        assert!(cart.items.first().is_some_and(|l| l.in_stock));
    }

    #[test]
    fn test_cart_flags_short_stock() {
        let pricing = Pricing::from(CheckoutConfig::default());
        let cart = Cart::new(vec![line(600, 3, 2)], &pricing);
        assert_eq!(cart.shipping_fee, Money::ZERO);
        assert!(cart.items.first().is_some_and(|l| !l.in_stock));
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(check_quantity(0).is_err());
        assert!(check_quantity(1).is_ok());
        assert!(check_quantity(10).is_ok());
        assert!(check_quantity(11).is_err());
    }
}
