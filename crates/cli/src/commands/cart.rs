//! Cart management commands.
//!
//! Mutations go through the storefront's optimistic coordinator; from a
//! one-shot CLI the visible effect is the reconciled server cart, but the
//! same calls drive instant updates for any long-lived subscriber.

use std::error::Error;
use std::io::{self, BufRead, Write};

use uuid::Uuid;

use meridian_core::{Cart, format_price};
use meridian_storefront::cart::NewCartLine;
use meridian_storefront::state::Storefront;

use super::FetchFailed;

/// Show the cart.
pub async fn show(storefront: &Storefront) -> Result<(), Box<dyn Error>> {
    let entry = storefront.cart_now().await;
    if let Some(error) = entry.error {
        return Err(Box::new(FetchFailed(error)));
    }
    match entry.data {
        Some(cart) => print_cart(&cart),
        None => println!("Your cart is empty."),
    }
    Ok(())
}

/// Add a product (or one of its variants) to the cart.
pub async fn add(
    storefront: &Storefront,
    product_id: Uuid,
    variant_id: Option<Uuid>,
    quantity: u32,
) -> Result<(), Box<dyn Error>> {
    // The optimistic prediction needs the product's name and price.
    let entry = storefront.product_now(product_id).await;
    if let Some(error) = entry.error {
        return Err(Box::new(FetchFailed(error)));
    }
    let Some(product) = entry.data else {
        return Err(format!("product {product_id} not found").into());
    };

    let line = match variant_id {
        Some(vid) => {
            let variant = product
                .variants
                .iter()
                .find(|v| v.id == vid)
                .ok_or_else(|| format!("variant {vid} not found on {}", product.name))?;
            NewCartLine::for_variant(&product, variant, quantity)
        }
        None => NewCartLine::for_product(&product, quantity),
    };

    let cart = storefront.add_item(line).await?;
    println!("Added {} x{quantity}.", product.name);
    print_cart(&cart);
    Ok(())
}

/// Set a cart line's quantity.
pub async fn update(
    storefront: &Storefront,
    item_id: Uuid,
    quantity: u32,
) -> Result<(), Box<dyn Error>> {
    let cart = storefront.set_quantity(item_id, quantity).await?;
    print_cart(&cart);
    Ok(())
}

/// Remove a cart line.
pub async fn remove(storefront: &Storefront, item_id: Uuid) -> Result<(), Box<dyn Error>> {
    let cart = storefront.remove_item(item_id).await?;
    print_cart(&cart);
    Ok(())
}

/// Empty the cart, asking first unless `--yes` was passed. The coordinator
/// itself clears unconditionally; the prompt lives here.
pub async fn clear(storefront: &Storefront, yes: bool) -> Result<(), Box<dyn Error>> {
    if !yes && !confirm("Clear the entire cart?")? {
        println!("Kept the cart.");
        return Ok(());
    }
    let cart = storefront.clear_cart().await?;
    print_cart(&cart);
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool, io::Error> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    println!("Cart ({} items):", cart.item_count);
    for item in &cart.items {
        let name = match &item.variant_name {
            Some(variant) => format!("{} ({variant})", item.product_name),
            None => item.product_name.clone(),
        };
        println!(
            "  {}  {:>10}  x{:<3} {}  = {}",
            item.id,
            format_price(item.price),
            item.quantity,
            name,
            format_price(item.subtotal)
        );
    }
    println!("Total: {}", format_price(cart.total));
}
