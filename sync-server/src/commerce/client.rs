//! CommerceClient — HTTP client for the commerce platform REST API
//!
//! Plain REST without an SDK: catalog search/create, draft sale
//! create/delete. Authenticated with the access token from configuration;
//! every call carries a conservative timeout and surfaces non-2xx bodies
//! in the error.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CatalogProduct, CommerceApi, CommerceError, DraftSaleRequest};

const ACCESS_TOKEN_HEADER: &str = "X-Access-Token";
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// HTTP client for the commerce platform
pub struct CommerceClient {
    client: Client,
    base_url: String,
    access_token: String,
}

// ========== Wire types ==========

#[derive(Debug, Deserialize)]
struct VariantDto {
    id: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ProductDto {
    id: serde_json::Value,
    title: String,
    #[serde(default)]
    price: f64,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    variants: Vec<VariantDto>,
}

#[derive(Debug, Deserialize)]
struct ProductSearchResponse {
    #[serde(default)]
    products: Vec<ProductDto>,
}

#[derive(Debug, Serialize)]
struct ProductCreateRequest<'a> {
    title: &'a str,
    price: f64,
}

#[derive(Debug, Serialize)]
struct DraftSaleCreateRequest<'a> {
    customer_name: Option<&'a str>,
    customer_email: Option<&'a str>,
    line_items: &'a [super::DraftLineItem],
    /// Comma-separated, the platform's tag convention
    tags: String,
    note: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct DraftSaleCreateResponse {
    id: serde_json::Value,
}

fn id_string(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl From<ProductDto> for CatalogProduct {
    fn from(dto: ProductDto) -> Self {
        Self {
            id: id_string(&dto.id),
            title: dto.title,
            price: dto.price,
            tags: dto.tags,
            variant_id: dto.variants.first().map(|v| id_string(&v.id)),
        }
    }
}

impl CommerceClient {
    /// Create a client against the platform base URL (no trailing slash)
    pub fn new(base_url: &str, access_token: &str) -> Result<Self, CommerceError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CommerceError::Http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, CommerceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CommerceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl CommerceApi for CommerceClient {
    async fn search_products(&self, title: &str) -> Result<Vec<CatalogProduct>, CommerceError> {
        let url = format!("{}/catalog/products", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .query(&[("title", title)])
            .send()
            .await
            .map_err(|e| CommerceError::Http(e.to_string()))?;

        let parsed: ProductSearchResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| CommerceError::Decode(e.to_string()))?;

        Ok(parsed.products.into_iter().map(Into::into).collect())
    }

    async fn create_product(
        &self,
        title: &str,
        price: f64,
    ) -> Result<CatalogProduct, CommerceError> {
        let url = format!("{}/catalog/products", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(&ProductCreateRequest { title, price })
            .send()
            .await
            .map_err(|e| CommerceError::Http(e.to_string()))?;

        let dto: ProductDto = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| CommerceError::Decode(e.to_string()))?;

        Ok(dto.into())
    }

    async fn create_draft_sale(&self, draft: &DraftSaleRequest) -> Result<String, CommerceError> {
        let url = format!("{}/draft_sales", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(&DraftSaleCreateRequest {
                customer_name: draft.customer_name.as_deref(),
                customer_email: draft.customer_email.as_deref(),
                line_items: &draft.line_items,
                tags: draft.tags.join(", "),
                note: draft.note.as_deref(),
            })
            .send()
            .await
            .map_err(|e| CommerceError::Http(e.to_string()))?;

        let parsed: DraftSaleCreateResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| CommerceError::Decode(e.to_string()))?;

        Ok(id_string(&parsed.id))
    }

    async fn delete_draft_sale(&self, draft_sale_id: &str) -> Result<(), CommerceError> {
        let url = format!("{}/draft_sales/{draft_sale_id}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .send()
            .await
            .map_err(|e| CommerceError::Http(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }
}
