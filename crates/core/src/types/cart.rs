//! Cart types.
//!
//! The cart is server-persisted and scoped to a session cookie. Items carry
//! denormalized product data so a cart can render without extra lookups.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A line in the cart. `price` and `subtotal` are integer cents;
/// `subtotal = price * quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub product_name: String,
    pub product_slug: String,
    pub product_image_url: Option<String>,
    pub variant_name: Option<String>,
    pub price: i64,
    pub quantity: u32,
    pub subtotal: i64,
}

/// The cart as returned by the API. Items are in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub items: Vec<CartItem>,
    pub total: i64,
    pub item_count: u32,
}

impl Cart {
    /// Recompute line subtotals, the cart total, and the item count from the
    /// lines themselves. Integer-cent arithmetic throughout.
    pub fn recompute_totals(&mut self) {
        for item in &mut self.items {
            item.subtotal = item.price * i64::from(item.quantity);
        }
        self.total = self.items.iter().map(|i| i.subtotal).sum();
        self.item_count = self.items.iter().map(|i| i.quantity).sum();
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Request body for `POST /api/v1/cart/items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<Uuid>,
    pub quantity: u32,
}

/// Request body for `PUT /api/v1/cart/items/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, quantity: u32) -> CartItem {
        CartItem {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            variant_id: None,
            product_name: "Stoneware Mug".to_string(),
            product_slug: "stoneware-mug".to_string(),
            product_image_url: None,
            variant_name: None,
            price,
            quantity,
            subtotal: 0,
        }
    }

    #[test]
    fn test_recompute_totals() {
        let mut cart = Cart {
            items: vec![item(1999, 2), item(450, 3)],
            ..Cart::default()
        };
        cart.recompute_totals();

        assert_eq!(cart.items[0].subtotal, 3998);
        assert_eq!(cart.items[1].subtotal, 1350);
        assert_eq!(cart.total, 5348);
        assert_eq!(cart.item_count, 5);
    }

    #[test]
    fn test_empty_cart_totals() {
        let mut cart = Cart::default();
        cart.recompute_totals();
        assert_eq!(cart.total, 0);
        assert_eq!(cart.item_count, 0);
        assert!(cart.is_empty());
    }
}
