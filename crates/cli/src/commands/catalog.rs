//! Catalog browsing commands.

use std::error::Error;

use uuid::Uuid;

use meridian_core::{Category, Product, ProductSort, format_price};
use meridian_storefront::catalog::{CatalogQuery, page_window};
use meridian_storefront::state::Storefront;

use super::FetchFailed;

/// List products with filters and pagination.
pub async fn list(
    storefront: &Storefront,
    page: u32,
    per_page: u32,
    sort: ProductSort,
    category: Option<Uuid>,
    search: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let mut query = CatalogQuery::default().with_per_page(per_page);
    query.set_category(category);
    query.set_sort(sort);
    if let Some(text) = search {
        query.set_search(text);
    }
    query.set_page(page);

    let entry = storefront.products_now(&query).await;
    if let Some(error) = entry.error {
        return Err(Box::new(FetchFailed(error)));
    }
    let Some(listing) = entry.data else {
        println!("No products found.");
        return Ok(());
    };

    if listing.data.is_empty() {
        println!("No products found.");
        return Ok(());
    }

    for product in &listing.data {
        print_product_row(product);
    }

    let meta = listing.pagination;
    println!(
        "\nPage {} of {} ({} products)",
        meta.page, meta.total_pages, meta.total_items
    );
    if let Some(window) = page_window(meta.page, meta.total_pages) {
        let mut parts: Vec<String> = Vec::new();
        if window.show_first {
            parts.push("1".to_string());
        }
        if window.leading_gap {
            parts.push("...".to_string());
        }
        for p in &window.pages {
            if *p == meta.page {
                parts.push(format!("[{p}]"));
            } else {
                parts.push(p.to_string());
            }
        }
        if window.trailing_gap {
            parts.push("...".to_string());
        }
        if window.show_last {
            parts.push(meta.total_pages.to_string());
        }
        println!("Pages: {}", parts.join(" "));
    }

    Ok(())
}

/// Show one product in detail.
pub async fn show(storefront: &Storefront, id: Uuid) -> Result<(), Box<dyn Error>> {
    let entry = storefront.product_now(id).await;
    if let Some(error) = entry.error {
        return Err(Box::new(FetchFailed(error)));
    }
    let Some(product) = entry.data else {
        println!("Product not found.");
        return Ok(());
    };

    println!("{}  {}", product.name, format_price(product.price));
    if let Some(compare_at) = product.compare_at_price {
        println!("  was {}", format_price(compare_at));
    }
    if let Some(category) = &product.category {
        println!("  category: {}", category.name);
    }
    if let Some(description) = &product.short_description {
        println!("\n{description}");
    }
    if !product.variants.is_empty() {
        println!("\nVariants:");
        for variant in &product.variants {
            println!(
                "  {}  {}  {}  (stock: {})",
                variant.id,
                variant.name,
                format_price(variant.price),
                variant.stock_quantity
            );
        }
    }
    println!("\nid: {}", product.id);

    Ok(())
}

/// Print the category tree.
pub async fn categories(storefront: &Storefront) -> Result<(), Box<dyn Error>> {
    let entry = storefront.categories_now().await;
    if let Some(error) = entry.error {
        return Err(Box::new(FetchFailed(error)));
    }
    let tree = entry.data.unwrap_or_default();
    if tree.is_empty() {
        println!("No categories.");
        return Ok(());
    }
    for root in &tree {
        print_category(root, 0);
    }
    Ok(())
}

fn print_category(category: &Category, depth: usize) {
    println!(
        "{}{}  ({})",
        "  ".repeat(depth),
        category.name,
        category.id
    );
    for child in &category.children {
        print_category(child, depth + 1);
    }
}

fn print_product_row(product: &Product) {
    let price = format_price(product.price);
    let marker = if product.stock_quantity > 0 { "" } else { "  [out of stock]" };
    println!("{}  {:>10}  {}{}", product.id, price, product.name, marker);
}
