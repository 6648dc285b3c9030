use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use super::{EntityStore, ProductFilter};
use crate::errors::StoreError;
use crate::models::{NewProduct, Product, ProductId, ProductPatch, Supplier};

const API_KEY_HEADER: &str = "x-api-key";
const SUPPLIER_MODEL: &str = "supplier";
const PRODUCT_MODEL: &str = "product";

/// Response envelope of the hosted data API.
#[derive(Debug, Deserialize)]
struct DataResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Serialize)]
struct ListRequest<'a, F> {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a F>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    id: &'a ProductId,
}

/// Entity store reached over HTTP.
///
/// Each operation is `POST {base_url}/{model}/{operation}` with a JSON body.
/// No timeout and no retry are applied; a request that never resolves is
/// awaited for as long as the caller keeps the future alive.
#[derive(Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, StoreError> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized)
            .map_err(|e| StoreError::Transport(format!("invalid store url {}: {}", base_url, e)))?;
        let client = reqwest::Client::builder()
            .gzip(true)
            .build()
            .map_err(StoreError::from)?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    #[instrument(skip(self, body), fields(base = %self.base_url))]
    async fn call<B, T>(&self, model: &str, operation: &str, body: &B) -> Result<Option<T>, StoreError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(&format!("{}/{}", model, operation))
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let mut request = self.client.post(url).json(body);
        if let Some(ref key) = self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "store request failed");
            return Err(StoreError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let envelope: DataResponse<T> = serde_json::from_slice(&bytes)?;
        if !envelope.errors.is_empty() {
            return Err(StoreError::Rejected(
                envelope.errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        debug!(present = envelope.data.is_some(), "store request completed");
        Ok(envelope.data)
    }
}

#[async_trait]
impl EntityStore for HttpStore {
    async fn list_suppliers(&self) -> Result<Vec<Supplier>, StoreError> {
        let request: ListRequest<'_, ProductFilter> = ListRequest { filter: None };
        let suppliers: Option<Vec<Supplier>> =
            self.call(SUPPLIER_MODEL, "list", &request).await?;
        Ok(suppliers.unwrap_or_default())
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, StoreError> {
        let request = ListRequest {
            filter: Some(&filter),
        };
        let products: Option<Vec<Product>> = self.call(PRODUCT_MODEL, "list", &request).await?;
        Ok(products.unwrap_or_default())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Option<Product>, StoreError> {
        self.call(PRODUCT_MODEL, "create", &product).await
    }

    async fn update_product(&self, patch: ProductPatch) -> Result<Option<Product>, StoreError> {
        self.call(PRODUCT_MODEL, "update", &patch).await
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let _: Option<serde_json::Value> = self
            .call(PRODUCT_MODEL, "delete", &DeleteRequest { id: &id })
            .await?;
        Ok(())
    }
}
