//! # Backend
//!
//! The `PosBackend` trait is the seam between the cashier session and the
//! REST backend. `HttpBackend` talks to the real server; `InMemoryBackend`
//! (see [`crate::memory`]) stands in for it in tests.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        HttpBackend request                              │
//! │                                                                         │
//! │  endpoint(path) ──► reqwest + bearer token ──► status?                  │
//! │                                                  │                      │
//! │                         2xx ◄────────────────────┴──► 4xx/5xx           │
//! │                          │                              │               │
//! │              Envelope<T>::into_data          ErrorBody ──► ClientError  │
//! │                          │                   (401 → Unauthorized)       │
//! │              Dto::into_domain(scale)                                    │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                   kasir_core type                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use kasir_core::{Customer, Product, ReceiptRequest, Store, Transaction, TransactionRequest, User};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session_store::AuthSession;
use crate::wire::{
    AuthResponseDto, CustomerDto, Envelope, ErrorBody, FindOrCreateCustomerBody, LoginBody,
    MoneyScale, Page, ProductDto, StoreDto, TransactionBody, TransactionDto, UserDto,
};

// =============================================================================
// Backend Trait
// =============================================================================

/// Operations the cashier needs from the REST backend.
///
/// Every call except `login` takes the bearer token. Store-scoped calls take
/// the active outlet id.
#[async_trait]
pub trait PosBackend: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, email: &str, password: &str) -> ClientResult<AuthSession>;

    /// `GET /auth/me`
    async fn current_user(&self, token: &str) -> ClientResult<User>;

    /// `GET /stores`
    async fn list_stores(&self, token: &str) -> ClientResult<Vec<Store>>;

    /// `GET /stores/{store}/products?search&per_page`
    async fn search_products(
        &self,
        token: &str,
        store_id: Uuid,
        query: &str,
        per_page: u32,
    ) -> ClientResult<Page<Product>>;

    /// `GET /stores/{store}/products/{id}`
    async fn product_by_id(
        &self,
        token: &str,
        store_id: Uuid,
        product_id: Uuid,
    ) -> ClientResult<Product>;

    /// `GET /stores/{store}/products/barcode/{code}`
    async fn product_by_barcode(
        &self,
        token: &str,
        store_id: Uuid,
        barcode: &str,
    ) -> ClientResult<Product>;

    /// `GET /stores/{store}/customers?search&per_page`
    async fn search_customers(
        &self,
        token: &str,
        store_id: Uuid,
        query: &str,
        per_page: u32,
    ) -> ClientResult<Page<Customer>>;

    /// `POST /stores/{store}/customers/find-or-create`
    async fn find_or_create_customer(
        &self,
        token: &str,
        store_id: Uuid,
        phone: &str,
        name: Option<&str>,
    ) -> ClientResult<Customer>;

    /// `POST /stores/{store}/transactions`
    async fn create_transaction(
        &self,
        token: &str,
        store_id: Uuid,
        request: &TransactionRequest,
    ) -> ClientResult<Transaction>;

    /// `POST /stores/{store}/whatsapp/send-receipt`
    async fn send_receipt(
        &self,
        token: &str,
        store_id: Uuid,
        request: &ReceiptRequest,
    ) -> ClientResult<()>;
}

// =============================================================================
// HTTP Backend
// =============================================================================

/// `PosBackend` over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: reqwest::Client,
    scale: MoneyScale,
}

impl HttpBackend {
    /// Builds a client from validated configuration.
    ///
    /// The base URL always gets a trailing slash so relative joins keep the
    /// `/api` prefix.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let mut base_url = Url::parse(&config.api.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(HttpBackend {
            base_url,
            http,
            scale: MoneyScale::new(config.currency.decimals),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn search_endpoint(&self, segments: &[&str], query: &str, per_page: u32) -> ClientResult<Url> {
        let mut url = self.endpoint(segments)?;
        {
            let mut pairs = url.query_pairs_mut();
            if !query.is_empty() {
                pairs.append_pair("search", query);
            }
            pairs.append_pair("per_page", &per_page.to_string());
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request and unwraps the envelope.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        self.send_envelope::<T>(builder).await?.into_data()
    }

    async fn send_envelope<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> ClientResult<Envelope<T>> {
        let res = builder.send().await.map_err(|e| {
            warn!(error = %e, "Backend request failed");
            ClientError::from(e)
        })?;

        let status = res.status();
        if status.is_success() {
            return res.json::<Envelope<T>>().await.map_err(|e| {
                ClientError::Decode(e.to_string())
            });
        }

        let message = res
            .json::<ErrorBody>()
            .await
            .map(ErrorBody::into_message)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown error").to_string());

        warn!(status = status.as_u16(), %message, "Backend returned an error");
        Err(ClientError::from_status(status.as_u16(), message))
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: Url,
        token: Option<&str>,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(Method::POST, url, token).json(body))
            .await
    }

    async fn get<T: DeserializeOwned>(&self, url: Url, token: &str) -> ClientResult<T> {
        self.send(self.request(Method::GET, url, Some(token))).await
    }
}

/// When a token issued at `now` with a lifetime of `expires_in` seconds
/// expires. A lifetime chrono can't represent is a decode error.
fn token_expiry(now: DateTime<Utc>, expires_in: i64) -> ClientResult<DateTime<Utc>> {
    Duration::try_seconds(expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| ClientError::Decode(format!("token lifetime out of range: {}s", expires_in)))
}

#[async_trait]
impl PosBackend for HttpBackend {
    async fn login(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        debug!(email, "Logging in");
        let url = self.endpoint(&["auth", "login"])?;
        let auth: AuthResponseDto = self
            .post_json(url, None, &LoginBody { email, password })
            .await?;

        Ok(AuthSession {
            token: auth.access_token,
            user: auth.user.into(),
            expires_at: token_expiry(Utc::now(), auth.expires_in)?,
        })
    }

    async fn current_user(&self, token: &str) -> ClientResult<User> {
        let url = self.endpoint(&["auth", "me"])?;
        let user: UserDto = self.get(url, token).await?;
        Ok(user.into())
    }

    async fn list_stores(&self, token: &str) -> ClientResult<Vec<Store>> {
        let url = self.endpoint(&["stores"])?;
        let stores: Vec<StoreDto> = self.get(url, token).await?;
        stores.into_iter().map(StoreDto::into_domain).collect()
    }

    async fn search_products(
        &self,
        token: &str,
        store_id: Uuid,
        query: &str,
        per_page: u32,
    ) -> ClientResult<Page<Product>> {
        let store = store_id.to_string();
        let url = self.search_endpoint(&["stores", &store, "products"], query, per_page)?;
        let page: Page<ProductDto> = self.get(url, token).await?;
        page.try_map(|dto| dto.into_domain(self.scale))
    }

    async fn product_by_id(
        &self,
        token: &str,
        store_id: Uuid,
        product_id: Uuid,
    ) -> ClientResult<Product> {
        let store = store_id.to_string();
        let product = product_id.to_string();
        let url = self.endpoint(&["stores", &store, "products", &product])?;
        let dto: ProductDto = self.get(url, token).await?;
        dto.into_domain(self.scale)
    }

    async fn product_by_barcode(
        &self,
        token: &str,
        store_id: Uuid,
        barcode: &str,
    ) -> ClientResult<Product> {
        let store = store_id.to_string();
        let url = self.endpoint(&["stores", &store, "products", "barcode", barcode])?;
        let dto: ProductDto = self.get(url, token).await?;
        dto.into_domain(self.scale)
    }

    async fn search_customers(
        &self,
        token: &str,
        store_id: Uuid,
        query: &str,
        per_page: u32,
    ) -> ClientResult<Page<Customer>> {
        let store = store_id.to_string();
        let url = self.search_endpoint(&["stores", &store, "customers"], query, per_page)?;
        let page: Page<CustomerDto> = self.get(url, token).await?;
        page.try_map(|dto| dto.into_domain(self.scale))
    }

    async fn find_or_create_customer(
        &self,
        token: &str,
        store_id: Uuid,
        phone: &str,
        name: Option<&str>,
    ) -> ClientResult<Customer> {
        let store = store_id.to_string();
        let url = self.endpoint(&["stores", &store, "customers", "find-or-create"])?;
        let dto: CustomerDto = self
            .post_json(url, Some(token), &FindOrCreateCustomerBody { phone, name })
            .await?;
        dto.into_domain(self.scale)
    }

    async fn create_transaction(
        &self,
        token: &str,
        store_id: Uuid,
        request: &TransactionRequest,
    ) -> ClientResult<Transaction> {
        let store = store_id.to_string();
        let url = self.endpoint(&["stores", &store, "transactions"])?;
        let body = TransactionBody::from_request(request, self.scale);
        debug!(items = body.items.len(), payment_type = %body.payment_type, "Submitting transaction");

        let dto: TransactionDto = self.post_json(url, Some(token), &body).await?;
        dto.into_domain(self.scale)
    }

    async fn send_receipt(
        &self,
        token: &str,
        store_id: Uuid,
        request: &ReceiptRequest,
    ) -> ClientResult<()> {
        let store = store_id.to_string();
        let url = self.endpoint(&["stores", &store, "whatsapp", "send-receipt"])?;
        let builder = self.request(Method::POST, url, Some(token)).json(request);
        self.send_envelope::<serde_json::Value>(builder)
            .await?
            .into_unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        let mut config = ClientConfig::default();
        config.api.base_url = base.to_string();
        HttpBackend::new(&config).unwrap()
    }

    #[test]
    fn test_token_expiry_rejects_out_of_range_lifetime() {
        let now = Utc::now();
        assert_eq!(token_expiry(now, 3_600).unwrap(), now + Duration::hours(1));
        assert!(matches!(token_expiry(now, i64::MAX), Err(ClientError::Decode(_))));
        assert!(matches!(token_expiry(now, i64::MIN), Err(ClientError::Decode(_))));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        assert_eq!(
            backend("http://localhost:8080/api").base_url().as_str(),
            "http://localhost:8080/api/"
        );
        assert_eq!(
            backend("http://localhost:8080/api/").base_url().as_str(),
            "http://localhost:8080/api/"
        );
    }

    #[test]
    fn test_endpoint_keeps_api_prefix() {
        let b = backend("http://localhost:8080/api");
        let store = "6f1c1f4e-4a8e-4a57-9d0e-3f2d3f1b2c11";
        let url = b
            .endpoint(&["stores", store, "products", "barcode", "899100"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/stores/6f1c1f4e-4a8e-4a57-9d0e-3f2d3f1b2c11/products/barcode/899100"
        );
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let b = backend("http://localhost:8080/api");
        let url = b.endpoint(&["stores", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/stores/a%2Fb");
    }

    #[test]
    fn test_search_endpoint_query() {
        let b = backend("http://localhost:8080/api");
        let url = b
            .search_endpoint(&["stores", "s1", "products"], "kopi susu", 20)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/stores/s1/products?search=kopi+susu&per_page=20"
        );

        let url = b.search_endpoint(&["stores", "s1", "customers"], "", 10).unwrap();
        assert_eq!(url.query(), Some("per_page=10"));
    }
}
