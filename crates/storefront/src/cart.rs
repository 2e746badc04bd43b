//! Cart operations and optimistic prediction.
//!
//! A [`CartOp`] describes one user intent against the cart. Before the
//! network round trip the operation is applied to the cached cart by
//! [`predict`], a pure function, so the UI updates instantly; the server's
//! authoritative cart overwrites the prediction when the call completes.
//!
//! Quantities are validated here, before any network call.

use uuid::Uuid;

use meridian_core::{Cart, CartItem, Product, ProductVariant};

use crate::error::ClientError;

/// Smallest quantity a cart line may hold.
pub const MIN_QUANTITY: u32 = 1;
/// Largest quantity a cart line may hold.
pub const MAX_QUANTITY: u32 = 99;

/// Everything needed to render a cart line before the server has confirmed
/// it. Prices are integer cents.
#[derive(Debug, Clone)]
pub struct NewCartLine {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: u32,
    pub price: i64,
    pub product_name: String,
    pub product_slug: String,
    pub product_image_url: Option<String>,
    pub variant_name: Option<String>,
}

impl NewCartLine {
    /// Build a line for a product without variants.
    #[must_use]
    pub fn for_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            variant_id: None,
            quantity,
            price: product.price,
            product_name: product.name.clone(),
            product_slug: product.slug.clone(),
            product_image_url: product.primary_image().map(|img| img.url.clone()),
            variant_name: None,
        }
    }

    /// Build a line for a specific variant; the variant price wins.
    #[must_use]
    pub fn for_variant(product: &Product, variant: &ProductVariant, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            variant_id: Some(variant.id),
            quantity,
            price: variant.price,
            product_name: product.name.clone(),
            product_slug: product.slug.clone(),
            product_image_url: product.primary_image().map(|img| img.url.clone()),
            variant_name: Some(variant.name.clone()),
        }
    }
}

/// One mutation against the cart.
#[derive(Debug, Clone)]
pub enum CartOp {
    AddItem(NewCartLine),
    SetQuantity { item_id: Uuid, quantity: u32 },
    RemoveItem { item_id: Uuid },
    Clear,
}

/// What a mutation is ordered against. Rapid mutations on the same target
/// must land in issue order; mutations on different targets are independent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MutationTarget {
    /// An existing cart line.
    Line(Uuid),
    /// A product/variant pair being added (no line id exists yet).
    Product {
        product_id: Uuid,
        variant_id: Option<Uuid>,
    },
    /// The whole cart.
    Cart,
}

impl CartOp {
    /// Reject out-of-range quantities before any network call.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] if the quantity is outside
    /// [`MIN_QUANTITY`]..=[`MAX_QUANTITY`].
    pub fn validate(&self) -> Result<(), ClientError> {
        let quantity = match self {
            Self::AddItem(line) => line.quantity,
            Self::SetQuantity { quantity, .. } => *quantity,
            Self::RemoveItem { .. } | Self::Clear => return Ok(()),
        };
        if (MIN_QUANTITY..=MAX_QUANTITY).contains(&quantity) {
            Ok(())
        } else {
            Err(ClientError::Validation(format!(
                "quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}, got {quantity}"
            )))
        }
    }

    /// The ordering target of this operation.
    #[must_use]
    pub fn target(&self) -> MutationTarget {
        match self {
            Self::AddItem(line) => MutationTarget::Product {
                product_id: line.product_id,
                variant_id: line.variant_id,
            },
            Self::SetQuantity { item_id, .. } | Self::RemoveItem { item_id } => {
                MutationTarget::Line(*item_id)
            }
            Self::Clear => MutationTarget::Cart,
        }
    }
}

/// Apply an operation to a cart snapshot, producing the predicted next
/// state. Pure; totals are recomputed with integer-cent arithmetic.
///
/// Adding a product+variant already in the cart merges into the existing
/// line, mirroring the server's upsert. Operations referencing a line the
/// snapshot does not contain leave the cart unchanged - the server response
/// will reconcile.
#[must_use]
pub fn predict(current: &Cart, op: &CartOp) -> Cart {
    let mut next = current.clone();
    match op {
        CartOp::AddItem(line) => {
            if let Some(existing) = next
                .items
                .iter_mut()
                .find(|i| i.product_id == line.product_id && i.variant_id == line.variant_id)
            {
                existing.quantity += line.quantity;
            } else {
                next.items.push(CartItem {
                    // Placeholder id; the server's line id replaces it on
                    // write-back.
                    id: Uuid::new_v4(),
                    product_id: line.product_id,
                    variant_id: line.variant_id,
                    product_name: line.product_name.clone(),
                    product_slug: line.product_slug.clone(),
                    product_image_url: line.product_image_url.clone(),
                    variant_name: line.variant_name.clone(),
                    price: line.price,
                    quantity: line.quantity,
                    subtotal: 0,
                });
            }
        }
        CartOp::SetQuantity { item_id, quantity } => {
            if let Some(item) = next.items.iter_mut().find(|i| i.id == *item_id) {
                item.quantity = *quantity;
            }
        }
        CartOp::RemoveItem { item_id } => {
            next.items.retain(|i| i.id != *item_id);
        }
        CartOp::Clear => {
            next.items.clear();
        }
    }
    next.recompute_totals();
    next
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cart_with(items: Vec<CartItem>) -> Cart {
        let mut cart = Cart {
            id: Uuid::new_v4(),
            items,
            total: 0,
            item_count: 0,
        };
        cart.recompute_totals();
        cart
    }

    fn item(product_id: Uuid, price: i64, quantity: u32) -> CartItem {
        CartItem {
            id: Uuid::new_v4(),
            product_id,
            variant_id: None,
            product_name: "Walnut Board".to_string(),
            product_slug: "walnut-board".to_string(),
            product_image_url: None,
            variant_name: None,
            price,
            quantity,
            subtotal: 0,
        }
    }

    fn line(product_id: Uuid, price: i64, quantity: u32) -> NewCartLine {
        NewCartLine {
            product_id,
            variant_id: None,
            quantity,
            price,
            product_name: "Walnut Board".to_string(),
            product_slug: "walnut-board".to_string(),
            product_image_url: None,
            variant_name: None,
        }
    }

    #[test]
    fn test_add_new_line() {
        let cart = cart_with(vec![]);
        let next = predict(&cart, &CartOp::AddItem(line(Uuid::new_v4(), 1999, 2)));

        assert_eq!(next.items.len(), 1);
        assert_eq!(next.items[0].subtotal, 3998);
        assert_eq!(next.total, 3998);
        assert_eq!(next.item_count, 2);
    }

    #[test]
    fn test_add_merges_same_product_and_variant() {
        let product_id = Uuid::new_v4();
        let cart = cart_with(vec![item(product_id, 450, 1)]);
        let next = predict(&cart, &CartOp::AddItem(line(product_id, 450, 2)));

        assert_eq!(next.items.len(), 1);
        assert_eq!(next.items[0].quantity, 3);
        assert_eq!(next.total, 1350);
    }

    #[test]
    fn test_set_quantity_recomputes_totals() {
        let cart = cart_with(vec![item(Uuid::new_v4(), 1999, 2)]);
        let item_id = cart.items[0].id;
        let next = predict(&cart, &CartOp::SetQuantity { item_id, quantity: 5 });

        assert_eq!(next.items[0].quantity, 5);
        assert_eq!(next.items[0].subtotal, 9995);
        assert_eq!(next.total, 9995);
        assert_eq!(next.item_count, 5);
    }

    #[test]
    fn test_set_quantity_unknown_line_is_noop() {
        let cart = cart_with(vec![item(Uuid::new_v4(), 1999, 2)]);
        let next = predict(
            &cart,
            &CartOp::SetQuantity {
                item_id: Uuid::new_v4(),
                quantity: 5,
            },
        );
        assert_eq!(next, cart);
    }

    #[test]
    fn test_remove_and_clear() {
        let cart = cart_with(vec![item(Uuid::new_v4(), 1999, 1), item(Uuid::new_v4(), 450, 2)]);
        let first_id = cart.items[0].id;

        let next = predict(&cart, &CartOp::RemoveItem { item_id: first_id });
        assert_eq!(next.items.len(), 1);
        assert_eq!(next.total, 900);

        let cleared = predict(&cart, &CartOp::Clear);
        assert!(cleared.is_empty());
        assert_eq!(cleared.total, 0);
        assert_eq!(cleared.item_count, 0);
        assert_eq!(cleared.id, cart.id);
    }

    #[test]
    fn test_quantity_bounds() {
        let ok = CartOp::SetQuantity {
            item_id: Uuid::new_v4(),
            quantity: 99,
        };
        assert!(ok.validate().is_ok());

        let zero = CartOp::SetQuantity {
            item_id: Uuid::new_v4(),
            quantity: 0,
        };
        assert!(matches!(
            zero.validate(),
            Err(ClientError::Validation(_))
        ));

        let too_many = CartOp::AddItem(line(Uuid::new_v4(), 100, 100));
        assert!(too_many.validate().is_err());

        assert!(CartOp::Clear.validate().is_ok());
    }
}
