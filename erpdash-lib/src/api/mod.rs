//! Remote resource accessors
//!
//! [`ResourceApi`] is the read side the cache wraps: one method per resource
//! type, each returning the current authoritative list for its parameters.
//! [`MutationApi`] is the write side. [`crate::ErpClient`] implements both
//! over HTTP.

mod http;

use std::fmt;

use async_trait::async_trait;

use crate::error::Error;
use crate::model::Application;
use crate::model::DataSource;
use crate::model::ModelSchema;
use crate::model::Tenant;
use crate::model::Transaction;
use crate::model::TransactionSpec;

/// Resource types served by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Tenants,
    TransactionTypes,
    Transactions,
    DataSources,
    Applications,
    TransactionSpecs,
    ModelSchemas,
}

impl Resource {
    /// The tag that starts every cache key of this resource.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Tenants => "tenants",
            Self::TransactionTypes => "transaction_types",
            Self::Transactions => "transactions",
            Self::DataSources => "data_sources",
            Self::Applications => "applications",
            Self::TransactionSpecs => "transaction_specs",
            Self::ModelSchemas => "model_schemas",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Read access to the remote resources.
///
/// A `tenant` of `None` means no tenant filter.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// All tenants.
    async fn tenants(&self) -> Result<Vec<Tenant>, Error>;

    /// Names of the known transaction types.
    async fn transaction_types(&self) -> Result<Vec<String>, Error>;

    /// Transactions of one type.
    async fn transactions(
        &self,
        transaction_type: &str,
        tenant: Option<&str>,
    ) -> Result<Vec<Transaction>, Error>;

    /// Registered data sources.
    async fn data_sources(&self, tenant: Option<&str>) -> Result<Vec<DataSource>, Error>;

    /// Registered applications.
    async fn applications(&self, tenant: Option<&str>) -> Result<Vec<Application>, Error>;

    /// Transaction specifications of one application.
    async fn transaction_specs(
        &self,
        application_id: &str,
        tenant: Option<&str>,
    ) -> Result<Vec<TransactionSpec>, Error>;

    /// All model schemas, soft-deleted ones included.
    async fn model_schemas(&self) -> Result<Vec<ModelSchema>, Error>;
}

/// Write access to tenants and transactions.
#[async_trait]
pub trait MutationApi: Send + Sync {
    /// Creates a tenant and returns it as stored.
    async fn create_tenant(&self, tenant: &Tenant) -> Result<Tenant, Error>;

    /// Replaces a tenant and returns it as stored.
    async fn update_tenant(&self, id: &str, tenant: &Tenant) -> Result<Tenant, Error>;

    /// Deletes a tenant.
    async fn delete_tenant(&self, id: &str) -> Result<(), Error>;

    /// Creates a transaction and returns it as stored.
    async fn create_transaction(
        &self,
        transaction_type: &str,
        tenant: Option<&str>,
        transaction: &Transaction,
    ) -> Result<Transaction, Error>;

    /// Replaces a transaction and returns it as stored.
    async fn update_transaction(
        &self,
        transaction_type: &str,
        tenant: Option<&str>,
        id: &str,
        transaction: &Transaction,
    ) -> Result<Transaction, Error>;

    /// Deletes a transaction.
    async fn delete_transaction(
        &self,
        transaction_type: &str,
        tenant: Option<&str>,
        id: &str,
    ) -> Result<(), Error>;
}
