//! Wire types for the Meridian shop API.
//!
//! Field names and serde attributes match the API's JSON exactly.

pub mod cart;
pub mod category;
pub mod pagination;
pub mod price;
pub mod product;

pub use cart::{AddToCartRequest, Cart, CartItem, UpdateCartItemRequest};
pub use category::{Category, CategorySummary};
pub use pagination::{Paginated, PaginationMeta};
pub use price::format_price;
pub use product::{Product, ProductImage, ProductSort, ProductStatus, ProductVariant};
