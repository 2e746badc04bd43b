//! Process-scoped storefront state.
//!
//! [`Storefront`] wires the API client, one cache store per resource
//! family, and the fetch/mutation coordinators into a single handle. It is
//! created at application start and injected explicitly - no ambient
//! global - so tests and tools can hold isolated instances side by side.
//!
//! Read paths are stale-while-revalidate: they return the cached snapshot
//! immediately (a loading entry on the first call) and refresh in the
//! background; subscribers are notified when the refresh lands.

use std::sync::Arc;

use uuid::Uuid;

use meridian_core::{
    AddToCartRequest, Cart, Category, Paginated, Product, UpdateCartItemRequest,
};

use crate::api::ApiClient;
use crate::cart::{CartOp, NewCartLine};
use crate::catalog::CatalogQuery;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::sync::fetch::{FetchCoordinator, FreshnessPolicy};
use crate::sync::key::{CacheKey, build_key};
use crate::sync::mutation::MutationCoordinator;
use crate::sync::store::{CacheEntry, CacheStore, EntryPatch, SubscriptionGuard};

/// The storefront handle shared by every view.
///
/// Cheaply cloneable via `Arc`; all clones share caches, subscriptions, and
/// the cart session.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: ClientConfig,
    api: ApiClient,

    products: CacheStore<Paginated<Product>>,
    product_details: CacheStore<Product>,
    categories: CacheStore<Vec<Category>>,
    cart: CacheStore<Cart>,

    product_fetches: FetchCoordinator<Paginated<Product>>,
    detail_fetches: FetchCoordinator<Product>,
    category_fetches: FetchCoordinator<Vec<Category>>,
    cart_fetches: FetchCoordinator<Cart>,
    cart_mutations: MutationCoordinator,

    categories_key: CacheKey,
    cart_key: CacheKey,
}

impl Storefront {
    /// Create a new storefront handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api = ApiClient::new(&config)?;

        let products: CacheStore<Paginated<Product>> = CacheStore::new("products");
        let product_details: CacheStore<Product> = CacheStore::new("product");
        let categories: CacheStore<Vec<Category>> = CacheStore::new("categories");
        let cart: CacheStore<Cart> = CacheStore::new("cart");

        let cart_key = build_key("cart", &[]);

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                api,
                product_fetches: FetchCoordinator::new(products.clone()),
                detail_fetches: FetchCoordinator::new(product_details.clone()),
                category_fetches: FetchCoordinator::new(categories.clone()),
                cart_fetches: FetchCoordinator::new(cart.clone()),
                cart_mutations: MutationCoordinator::new(cart.clone(), cart_key.clone()),
                products,
                product_details,
                categories,
                cart,
                categories_key: build_key("categories", &[]),
                cart_key,
                config,
            }),
        })
    }

    /// Get a reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // =========================================================================
    // Catalog reads (stale-while-revalidate)
    // =========================================================================

    /// Snapshot of the product listing for `query`, refreshing in the
    /// background when stale.
    #[must_use]
    pub fn products(&self, query: &CatalogQuery) -> CacheEntry<Paginated<Product>> {
        let key = query.cache_key();
        self.refresh_products(&key, query);
        self.read_or_loading(&self.inner.products, key)
    }

    /// Like [`Storefront::products`], but waits for any refresh it started.
    /// One-shot callers (the CLI) use this to observe settled state.
    pub async fn products_now(&self, query: &CatalogQuery) -> CacheEntry<Paginated<Product>> {
        let key = query.cache_key();
        if let Some(handle) = self.refresh_products(&key, query) {
            let _ = handle.await;
        }
        self.read_or_loading(&self.inner.products, key)
    }

    fn refresh_products(
        &self,
        key: &CacheKey,
        query: &CatalogQuery,
    ) -> Option<tokio::task::JoinHandle<()>> {
        let api = self.inner.api.clone();
        let query = query.clone();
        self.inner.product_fetches.ensure_fresh(
            key,
            FreshnessPolicy::new(self.inner.config.staleness.catalog),
            move || async move { api.list_products(&query).await },
        )
    }

    /// Snapshot of one product, refreshing in the background when stale.
    #[must_use]
    pub fn product(&self, id: Uuid) -> CacheEntry<Product> {
        let key = product_key(id);
        self.refresh_product(&key, id);
        self.read_or_loading(&self.inner.product_details, key)
    }

    /// Like [`Storefront::product`], but waits for any refresh it started.
    pub async fn product_now(&self, id: Uuid) -> CacheEntry<Product> {
        let key = product_key(id);
        if let Some(handle) = self.refresh_product(&key, id) {
            let _ = handle.await;
        }
        self.read_or_loading(&self.inner.product_details, key)
    }

    fn refresh_product(&self, key: &CacheKey, id: Uuid) -> Option<tokio::task::JoinHandle<()>> {
        let api = self.inner.api.clone();
        self.inner.detail_fetches.ensure_fresh(
            key,
            FreshnessPolicy::new(self.inner.config.staleness.product),
            move || async move { api.get_product(id).await },
        )
    }

    /// Snapshot of the category tree, refreshing in the background when
    /// stale.
    #[must_use]
    pub fn categories(&self) -> CacheEntry<Vec<Category>> {
        self.refresh_categories();
        self.read_or_loading(&self.inner.categories, self.inner.categories_key.clone())
    }

    /// Like [`Storefront::categories`], but waits for any refresh it
    /// started.
    pub async fn categories_now(&self) -> CacheEntry<Vec<Category>> {
        if let Some(handle) = self.refresh_categories() {
            let _ = handle.await;
        }
        self.read_or_loading(&self.inner.categories, self.inner.categories_key.clone())
    }

    fn refresh_categories(&self) -> Option<tokio::task::JoinHandle<()>> {
        let api = self.inner.api.clone();
        self.inner.category_fetches.ensure_fresh(
            &self.inner.categories_key,
            FreshnessPolicy::new(self.inner.config.staleness.categories),
            move || async move { api.list_categories().await },
        )
    }

    /// Snapshot of the cart. Cached cart data is always revalidated -
    /// another tab or device may have changed it.
    #[must_use]
    pub fn cart(&self) -> CacheEntry<Cart> {
        self.refresh_cart();
        self.read_or_loading(&self.inner.cart, self.inner.cart_key.clone())
    }

    /// Like [`Storefront::cart`], but waits for any refresh it started.
    pub async fn cart_now(&self) -> CacheEntry<Cart> {
        if let Some(handle) = self.refresh_cart() {
            let _ = handle.await;
        }
        self.read_or_loading(&self.inner.cart, self.inner.cart_key.clone())
    }

    fn refresh_cart(&self) -> Option<tokio::task::JoinHandle<()>> {
        let api = self.inner.api.clone();
        self.inner
            .cart_fetches
            .ensure_fresh(&self.inner.cart_key, FreshnessPolicy::ALWAYS_STALE, move || async move {
                api.get_cart().await
            })
    }

    fn read_or_loading<T: Clone>(&self, store: &CacheStore<T>, key: CacheKey) -> CacheEntry<T> {
        store
            .read(&key)
            .unwrap_or_else(|| CacheEntry::loading(key))
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Be notified on every write to the listing entry for `query`.
    #[must_use]
    pub fn subscribe_products<F>(
        &self,
        query: &CatalogQuery,
        callback: F,
    ) -> SubscriptionGuard<Paginated<Product>>
    where
        F: Fn(&CacheEntry<Paginated<Product>>) + Send + Sync + 'static,
    {
        self.inner.products.subscribe(&query.cache_key(), callback)
    }

    /// Be notified on every write to one product's entry.
    #[must_use]
    pub fn subscribe_product<F>(&self, id: Uuid, callback: F) -> SubscriptionGuard<Product>
    where
        F: Fn(&CacheEntry<Product>) + Send + Sync + 'static,
    {
        self.inner.product_details.subscribe(&product_key(id), callback)
    }

    /// Be notified on every write to the category tree entry.
    #[must_use]
    pub fn subscribe_categories<F>(&self, callback: F) -> SubscriptionGuard<Vec<Category>>
    where
        F: Fn(&CacheEntry<Vec<Category>>) + Send + Sync + 'static,
    {
        self.inner
            .categories
            .subscribe(&self.inner.categories_key, callback)
    }

    /// Be notified on every write to the cart entry, optimistic writes
    /// included.
    #[must_use]
    pub fn subscribe_cart<F>(&self, callback: F) -> SubscriptionGuard<Cart>
    where
        F: Fn(&CacheEntry<Cart>) + Send + Sync + 'static,
    {
        self.inner.cart.subscribe(&self.inner.cart_key, callback)
    }

    // =========================================================================
    // Cart mutations (optimistic)
    // =========================================================================

    /// Add a line to the cart. The cached cart updates immediately; the
    /// server's cart replaces the prediction when the call completes.
    ///
    /// # Errors
    ///
    /// Validation errors before any network call; otherwise the failed
    /// server call's error, after the cache has been rolled back.
    pub async fn add_item(&self, line: NewCartLine) -> Result<Cart> {
        let request = AddToCartRequest {
            product_id: line.product_id,
            variant_id: line.variant_id,
            quantity: line.quantity,
        };
        let api = self.inner.api.clone();
        self.inner
            .cart_mutations
            .mutate(CartOp::AddItem(line), async move {
                api.add_cart_item(&request).await
            })
            .await
    }

    /// Set a cart line's quantity.
    ///
    /// # Errors
    ///
    /// As [`Storefront::add_item`].
    pub async fn set_quantity(&self, item_id: Uuid, quantity: u32) -> Result<Cart> {
        let request = UpdateCartItemRequest { quantity };
        let api = self.inner.api.clone();
        self.inner
            .cart_mutations
            .mutate(CartOp::SetQuantity { item_id, quantity }, async move {
                api.update_cart_item(item_id, &request).await
            })
            .await
    }

    /// Remove a cart line. The API returns no body on DELETE, so the server
    /// call re-fetches the cart for authoritative reconciliation.
    ///
    /// # Errors
    ///
    /// As [`Storefront::add_item`].
    pub async fn remove_item(&self, item_id: Uuid) -> Result<Cart> {
        let api = self.inner.api.clone();
        self.inner
            .cart_mutations
            .mutate(CartOp::RemoveItem { item_id }, async move {
                api.remove_cart_item(item_id).await?;
                api.get_cart().await
            })
            .await
    }

    /// Empty the cart. Unconditional once invoked - confirmation is the
    /// caller's concern.
    ///
    /// # Errors
    ///
    /// As [`Storefront::add_item`].
    pub async fn clear_cart(&self) -> Result<Cart> {
        let api = self.inner.api.clone();
        self.inner
            .cart_mutations
            .mutate(CartOp::Clear, async move {
                api.clear_cart().await?;
                api.get_cart().await
            })
            .await
    }

    // =========================================================================
    // Prefetch (degrading)
    // =========================================================================

    /// Warm the listing cache for `query`. Failures degrade to an empty
    /// result page instead of propagating - the catalog page renders empty
    /// rather than crashing.
    pub async fn prefetch_catalog(&self, query: &CatalogQuery) {
        let key = query.cache_key();
        match self.inner.api.list_products(query).await {
            Ok(page) => {
                self.inner
                    .products
                    .write(&key, EntryPatch::fresh(page));
            }
            Err(error) => {
                tracing::warn!(%error, "catalog prefetch failed, degrading to empty page");
                self.inner.products.write(
                    &key,
                    EntryPatch::fresh(Paginated::empty(query.per_page())),
                );
            }
        }
    }

    /// Warm the category cache. Failures degrade to an empty tree.
    pub async fn prefetch_categories(&self) {
        match self.inner.api.list_categories().await {
            Ok(tree) => {
                self.inner.categories.write(
                    &self.inner.categories_key,
                    EntryPatch::fresh(tree),
                );
            }
            Err(error) => {
                tracing::warn!(%error, "category prefetch failed, degrading to empty tree");
                self.inner.categories.write(
                    &self.inner.categories_key,
                    EntryPatch::fresh(Vec::new()),
                );
            }
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Mark the cart entry stale so the next read revalidates, without
    /// clearing the displayed data.
    pub fn invalidate_cart(&self) {
        self.inner.cart.invalidate(&self.inner.cart_key);
    }

    /// Drop all cached state (logout / session change). Subscribers are
    /// detached; outstanding guards become no-ops.
    pub fn reset(&self) {
        self.inner.products.clear();
        self.inner.product_details.clear();
        self.inner.categories.clear();
        self.inner.cart.clear();
        self.inner.cart_mutations.reset();
        tracing::info!("storefront state reset");
    }
}

fn product_key(id: Uuid) -> CacheKey {
    build_key("product", &[("id", Some(id.to_string()))])
}
