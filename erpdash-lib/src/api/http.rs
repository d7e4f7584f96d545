//! HTTP implementation of the resource accessors

use async_trait::async_trait;
use log::debug;
use reqwest::Method;
use reqwest::RequestBuilder;
use reqwest::header::ACCEPT;
use reqwest::header::HeaderValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::MutationApi;
use super::ResourceApi;
use crate::ErpClient;
use crate::error::ApiError;
use crate::error::Error;
use crate::model::Application;
use crate::model::DataSource;
use crate::model::ModelSchema;
use crate::model::Tenant;
use crate::model::Transaction;
use crate::model::TransactionSpec;

/// Query parameter carrying the tenant filter.
const TENANT_PARAM: &str = "tenantId";

impl ErpClient {
    /// Builds a resource URL from path segments and an optional tenant filter.
    ///
    /// Segments are percent-encoded individually.
    pub(crate) fn endpoint(
        &self,
        segments: &[&str],
        tenant: Option<&str>,
    ) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if let Some(tenant) = tenant {
            url.query_pairs_mut().append_pair(TENANT_PARAM, tenant);
        }
        Ok(url)
    }

    /// Starts an authenticated request.
    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, Error> {
        debug!("{} {}", method, url);

        let mut request = self
            .inner
            .http_client
            .request(method, url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(provider) = &self.inner.token_provider {
            let token = provider.get_token(self.inner.base_url.as_str()).await?;
            request = request.bearer_auth(&token.access_token);
        }

        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        Ok(request)
    }

    /// Sends a request and decodes a JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let response = request.send().await.map_err(ApiError::from)?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::from)?;

        if !status.is_success() {
            return Err(ApiError::http(status.as_u16(), error_message(&body, status)).into());
        }

        serde_json::from_str(&body)
            .map_err(|e| ApiError::parse_with_body(e.to_string(), body).into())
    }

    /// Sends a request whose response body is ignored.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), Error> {
        let response = request.send().await.map_err(ApiError::from)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::http(status.as_u16(), error_message(&body, status)).into());
        }

        Ok(())
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        tenant: Option<&str>,
    ) -> Result<Vec<T>, Error> {
        let url = self.endpoint(segments, tenant)?;
        let request = self.request(Method::GET, url).await?;
        self.send_json(request).await
    }

    async fn send_record<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        tenant: Option<&str>,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.endpoint(segments, tenant)?;
        let request = self.request(method, url).await?.json(body);
        self.send_json(request).await
    }

    async fn delete(&self, segments: &[&str], tenant: Option<&str>) -> Result<(), Error> {
        let url = self.endpoint(segments, tenant)?;
        let request = self.request(Method::DELETE, url).await?;
        self.send_empty(request).await
    }
}

/// Picks a readable message out of an error response body.
///
/// Understands `{"message": ..}` and `{"error": ..}` bodies, otherwise
/// falls back to the raw body or the status reason.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "error"] {
            if let Some(message) = json.get(field).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }
    if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        body.to_string()
    }
}

#[async_trait]
impl ResourceApi for ErpClient {
    async fn tenants(&self) -> Result<Vec<Tenant>, Error> {
        self.get_list(&["tenants"], None).await
    }

    async fn transaction_types(&self) -> Result<Vec<String>, Error> {
        self.get_list(&["transactions", "types"], None).await
    }

    async fn transactions(
        &self,
        transaction_type: &str,
        tenant: Option<&str>,
    ) -> Result<Vec<Transaction>, Error> {
        self.get_list(&["transactions", transaction_type], tenant).await
    }

    async fn data_sources(&self, tenant: Option<&str>) -> Result<Vec<DataSource>, Error> {
        self.get_list(&["datasources"], tenant).await
    }

    async fn applications(&self, tenant: Option<&str>) -> Result<Vec<Application>, Error> {
        self.get_list(&["applications"], tenant).await
    }

    async fn transaction_specs(
        &self,
        application_id: &str,
        tenant: Option<&str>,
    ) -> Result<Vec<TransactionSpec>, Error> {
        self.get_list(&["applications", application_id, "specifications"], tenant)
            .await
    }

    async fn model_schemas(&self) -> Result<Vec<ModelSchema>, Error> {
        self.get_list(&["models"], None).await
    }
}

#[async_trait]
impl MutationApi for ErpClient {
    async fn create_tenant(&self, tenant: &Tenant) -> Result<Tenant, Error> {
        self.send_record(Method::POST, &["tenants"], None, tenant).await
    }

    async fn update_tenant(&self, id: &str, tenant: &Tenant) -> Result<Tenant, Error> {
        self.send_record(Method::PUT, &["tenants", id], None, tenant)
            .await
    }

    async fn delete_tenant(&self, id: &str) -> Result<(), Error> {
        self.delete(&["tenants", id], None).await
    }

    async fn create_transaction(
        &self,
        transaction_type: &str,
        tenant: Option<&str>,
        transaction: &Transaction,
    ) -> Result<Transaction, Error> {
        self.send_record(
            Method::POST,
            &["transactions", transaction_type],
            tenant,
            transaction,
        )
        .await
    }

    async fn update_transaction(
        &self,
        transaction_type: &str,
        tenant: Option<&str>,
        id: &str,
        transaction: &Transaction,
    ) -> Result<Transaction, Error> {
        self.send_record(
            Method::PUT,
            &["transactions", transaction_type, id],
            tenant,
            transaction,
        )
        .await
    }

    async fn delete_transaction(
        &self,
        transaction_type: &str,
        tenant: Option<&str>,
        id: &str,
    ) -> Result<(), Error> {
        self.delete(&["transactions", transaction_type, id], tenant)
            .await
    }
}
