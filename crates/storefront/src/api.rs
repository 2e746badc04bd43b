//! HTTP client for the Meridian shop API.
//!
//! One method per API operation, all JSON. The cart is scoped to a session
//! cookie, so the underlying reqwest client keeps a cookie store; every
//! clone of [`ApiClient`] shares it.
//!
//! Responses are read as text before parsing so non-JSON error pages end up
//! in the error, not in a parse failure with no context.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use meridian_core::{AddToCartRequest, Cart, Category, Paginated, Product, UpdateCartItemRequest};

use crate::catalog::CatalogQuery;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Client for the Meridian shop API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            // The cart session lives in a cookie; keep it across requests.
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_url.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        format!("{base}{path}")
    }

    /// Send a request and parse the JSON body, mapping non-2xx statuses to
    /// errors. `what` names the resource for 404 reporting.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            tracing::error!(
                %status,
                body = %body.chars().take(500).collect::<String>(),
                "API returned non-success status"
            );
            return Err(ClientError::api(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "failed to parse API response"
            );
            ClientError::Parse(e)
        })
    }

    /// Send a request that answers 2xx with no meaningful body.
    async fn execute_no_body(&self, request: reqwest::RequestBuilder, what: &str) -> Result<()> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                %status,
                body = %body.chars().take(500).collect::<String>(),
                "API returned non-success status"
            );
            return Err(ClientError::api(status, &body));
        }
        Ok(())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List products for the given catalog query.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or parsing fails.
    #[instrument(skip(self, query), fields(page = query.page()))]
    pub async fn list_products(&self, query: &CatalogQuery) -> Result<Paginated<Product>> {
        let request = self
            .inner
            .http
            .get(self.endpoint("/api/v1/products"))
            .query(&query.query_pairs());
        self.execute(request, "products").await
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] for unknown ids; otherwise request
    /// or parse errors.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: Uuid) -> Result<Product> {
        let request = self
            .inner
            .http
            .get(self.endpoint(&format!("/api/v1/products/{id}")));
        self.execute(request, &format!("product {id}")).await
    }

    /// List the category tree (roots with nested children).
    ///
    /// # Errors
    ///
    /// Returns an error if the request or parsing fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let request = self.inner.http.get(self.endpoint("/api/v1/categories"));
        self.execute(request, "categories").await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the session's cart, creating it server-side if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or parsing fails.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Cart> {
        let request = self.inner.http.get(self.endpoint("/api/v1/cart"));
        self.execute(request, "cart").await
    }

    /// Add an item to the cart; returns the updated cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or parsing fails.
    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn add_cart_item(&self, request: &AddToCartRequest) -> Result<Cart> {
        let req = self
            .inner
            .http
            .post(self.endpoint("/api/v1/cart/items"))
            .json(request);
        self.execute(req, "cart").await
    }

    /// Update a cart item's quantity; returns the updated cart.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] for unknown items; otherwise
    /// request or parse errors.
    #[instrument(skip(self, request), fields(item_id = %item_id))]
    pub async fn update_cart_item(
        &self,
        item_id: Uuid,
        request: &UpdateCartItemRequest,
    ) -> Result<Cart> {
        let req = self
            .inner
            .http
            .put(self.endpoint(&format!("/api/v1/cart/items/{item_id}")))
            .json(request);
        self.execute(req, &format!("cart item {item_id}")).await
    }

    /// Remove a cart item. The API answers 2xx with no body; callers wanting
    /// the resulting cart follow up with [`ApiClient::get_cart`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] for unknown items; otherwise
    /// request errors.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove_cart_item(&self, item_id: Uuid) -> Result<()> {
        let req = self
            .inner
            .http
            .delete(self.endpoint(&format!("/api/v1/cart/items/{item_id}")));
        self.execute_no_body(req, &format!("cart item {item_id}"))
            .await
    }

    /// Empty the cart. 2xx with no body, like [`ApiClient::remove_cart_item`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<()> {
        let req = self.inner.http.delete(self.endpoint("/api/v1/cart"));
        self.execute_no_body(req, "cart").await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ClientConfig::for_base_url(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        let api = client("http://localhost:3001");
        assert_eq!(
            api.endpoint("/api/v1/products"),
            "http://localhost:3001/api/v1/products"
        );

        // Trailing slash on the base URL does not double up.
        let api = client("http://localhost:3001/");
        assert_eq!(api.endpoint("/api/v1/cart"), "http://localhost:3001/api/v1/cart");
    }
}
