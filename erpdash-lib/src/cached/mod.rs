//! Stale-while-revalidate accessors
//!
//! [`CachedApi`] wraps a [`ResourceApi`] with the shared [`Cache`]. Every
//! accessor answers from cache when it can and refreshes the entry in the
//! background for the next caller; on a miss it fetches, caches and returns.
//!
//! # Example
//!
//! ```ignore
//! let api = CachedApi::new(client, Cache::in_memory());
//!
//! // First call fetches; later calls answer from cache and revalidate.
//! let tenants = api.tenants(false).await?;
//! let invoices = api.transactions("Invoice", "acme", false).await?;
//!
//! // After a user switch, drop everything.
//! api.invalidate_all();
//! ```

pub mod keys;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use dashmap::DashSet;
use log::debug;
use log::warn;
use tokio_util::task::TaskTracker;

use crate::Response;
use crate::TenantScope;
use crate::api::MutationApi;
use crate::api::Resource;
use crate::api::ResourceApi;
use crate::cache::Cache;
use crate::cache::TtlTier;
use crate::error::Error;
use crate::model::Application;
use crate::model::DataSource;
use crate::model::ModelSchema;
use crate::model::Tenant;
use crate::model::Transaction;
use crate::model::TransactionSpec;
use crate::model::without_deleted;

/// Shared result of a cached accessor.
pub type Cached<T> = Response<Arc<Vec<T>>>;

/// Resources cached under a single key regardless of parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingletonResource {
    Tenants,
    TransactionTypes,
    ModelSchemas,
}

impl SingletonResource {
    /// The cache key of the resource.
    pub fn key(self) -> String {
        match self {
            Self::Tenants => keys::tenants(),
            Self::TransactionTypes => keys::transaction_types(),
            Self::ModelSchemas => keys::model_schemas(),
        }
    }
}

impl From<SingletonResource> for Resource {
    fn from(resource: SingletonResource) -> Self {
        match resource {
            SingletonResource::Tenants => Resource::Tenants,
            SingletonResource::TransactionTypes => Resource::TransactionTypes,
            SingletonResource::ModelSchemas => Resource::ModelSchemas,
        }
    }
}

/// Resource accessors backed by a stale-while-revalidate cache.
///
/// Cheap to clone; clones share the cache, the accessor and the background
/// refresh bookkeeping.
///
/// A hit spawns at most one background refresh per key at a time. There is
/// no ordering between a background refresh and a later forced refresh of
/// the same key: whichever finishes last wins the entry.
pub struct CachedApi<A> {
    inner: Arc<CachedApiInner<A>>,
}

struct CachedApiInner<A> {
    api: Arc<A>,
    cache: Cache,
    /// Keys with a background refresh in flight.
    refreshing: DashSet<String>,
    tasks: TaskTracker,
    shut_down: AtomicBool,
}

impl<A> Clone for CachedApi<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: ResourceApi + 'static> CachedApi<A> {
    /// Wraps an accessor with the given cache.
    pub fn new(api: A, cache: Cache) -> Self {
        Self::from_shared(Arc::new(api), cache)
    }

    /// Wraps a shared accessor with the given cache.
    pub fn from_shared(api: Arc<A>, cache: Cache) -> Self {
        Self {
            inner: Arc::new(CachedApiInner {
                api,
                cache,
                refreshing: DashSet::new(),
                tasks: TaskTracker::new(),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// The wrapped accessor.
    pub fn api(&self) -> &A {
        &self.inner.api
    }

    /// The shared cache.
    pub fn cache(&self) -> &Cache {
        &self.inner.cache
    }

    // === Accessors ===

    /// All tenants.
    pub async fn tenants(&self, force_refresh: bool) -> Result<Cached<Tenant>, Error> {
        self.load(
            Resource::Tenants,
            keys::tenants(),
            force_refresh,
            |api: Arc<A>| async move { api.tenants().await },
        )
        .await
    }

    /// Names of the transaction types.
    pub async fn transaction_types(&self, force_refresh: bool) -> Result<Cached<String>, Error> {
        self.load(
            Resource::TransactionTypes,
            keys::transaction_types(),
            force_refresh,
            |api: Arc<A>| async move { api.transaction_types().await },
        )
        .await
    }

    /// Transactions of one type, for a tenant or `"global"`.
    pub async fn transactions(
        &self,
        transaction_type: &str,
        tenant: impl Into<TenantScope>,
        force_refresh: bool,
    ) -> Result<Cached<Transaction>, Error> {
        let tenant = tenant.into();
        let key = keys::transactions(transaction_type, &tenant);
        let transaction_type = transaction_type.to_string();
        self.load(Resource::Transactions, key, force_refresh, move |api: Arc<A>| {
            let transaction_type = transaction_type.clone();
            let tenant = tenant.clone();
            async move { api.transactions(&transaction_type, tenant.filter()).await }
        })
        .await
    }

    /// Data sources, for a tenant or `"global"`.
    pub async fn data_sources(
        &self,
        tenant: impl Into<TenantScope>,
        force_refresh: bool,
    ) -> Result<Cached<DataSource>, Error> {
        let tenant = tenant.into();
        let key = keys::data_sources(&tenant);
        self.load(Resource::DataSources, key, force_refresh, move |api: Arc<A>| {
            let tenant = tenant.clone();
            async move { api.data_sources(tenant.filter()).await }
        })
        .await
    }

    /// Applications, for a tenant or `"global"`.
    pub async fn applications(
        &self,
        tenant: impl Into<TenantScope>,
        force_refresh: bool,
    ) -> Result<Cached<Application>, Error> {
        let tenant = tenant.into();
        let key = keys::applications(&tenant);
        self.load(Resource::Applications, key, force_refresh, move |api: Arc<A>| {
            let tenant = tenant.clone();
            async move { api.applications(tenant.filter()).await }
        })
        .await
    }

    /// Transaction specifications of an application, for a tenant or `"global"`.
    pub async fn transaction_specs(
        &self,
        application_id: &str,
        tenant: impl Into<TenantScope>,
        force_refresh: bool,
    ) -> Result<Cached<TransactionSpec>, Error> {
        let tenant = tenant.into();
        let key = keys::transaction_specs(application_id, &tenant);
        let application_id = application_id.to_string();
        self.load(
            Resource::TransactionSpecs,
            key,
            force_refresh,
            move |api: Arc<A>| {
                let application_id = application_id.clone();
                let tenant = tenant.clone();
                async move {
                    api.transaction_specs(&application_id, tenant.filter())
                        .await
                }
            },
        )
        .await
    }

    /// Model schemas, without soft-deleted ones.
    pub async fn model_schemas(&self, force_refresh: bool) -> Result<Cached<ModelSchema>, Error> {
        self.load(
            Resource::ModelSchemas,
            keys::model_schemas(),
            force_refresh,
            |api: Arc<A>| async move { api.model_schemas().await.map(without_deleted) },
        )
        .await
    }

    // === Invalidation ===

    /// Drops every cached entry. Use after a user or session change, or a
    /// mutation with unknown reach.
    pub fn invalidate_all(&self) {
        self.inner.cache.clear();
    }

    /// Drops the single entry of a parameterless resource.
    pub fn invalidate(&self, resource: SingletonResource) {
        self.inner.cache.invalidate(&resource.key());
    }

    /// Drops every entry scoped to the tenant, across resource types.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_tenant(&self, tenant: impl Into<TenantScope>) -> usize {
        self.inner
            .cache
            .invalidate_pattern(&keys::tenant_pattern(&tenant.into()))
    }

    /// Drops the transactions entry of one type and tenant.
    pub fn invalidate_transactions(&self, transaction_type: &str, tenant: impl Into<TenantScope>) {
        self.inner
            .cache
            .invalidate(&keys::transactions(transaction_type, &tenant.into()));
    }

    /// Drops the data sources entry of one tenant.
    pub fn invalidate_data_sources(&self, tenant: impl Into<TenantScope>) {
        self.inner.cache.invalidate(&keys::data_sources(&tenant.into()));
    }

    /// Drops the applications entry of one tenant.
    pub fn invalidate_applications(&self, tenant: impl Into<TenantScope>) {
        self.inner.cache.invalidate(&keys::applications(&tenant.into()));
    }

    /// Drops the specifications entry of one application and tenant.
    pub fn invalidate_transaction_specs(
        &self,
        application_id: &str,
        tenant: impl Into<TenantScope>,
    ) {
        self.inner
            .cache
            .invalidate(&keys::transaction_specs(application_id, &tenant.into()));
    }

    // === Background refreshes ===

    /// Number of background refreshes in flight.
    pub fn pending_refreshes(&self) -> usize {
        self.inner.tasks.len()
    }

    /// Waits until every background refresh spawned so far has finished.
    pub async fn settle(&self) {
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        self.inner.tasks.reopen();
    }

    /// Stops spawning background refreshes and waits for running ones.
    ///
    /// Hits are still served afterwards, just not revalidated.
    pub async fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::SeqCst);
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
    }

    /// Serves `key` from cache or fetches it.
    ///
    /// `fetch` is the only way the resource is loaded, for both the
    /// foreground and the background path, so both see the same parameters.
    async fn load<T, F, Fut>(
        &self,
        resource: Resource,
        key: String,
        force_refresh: bool,
        fetch: F,
    ) -> Result<Response<Arc<T>>, Error>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        if !force_refresh {
            if let Some(entry) = self.inner.cache.entry(&key) {
                if let Some(data) = entry.downcast::<T>() {
                    debug!("cache hit for {}", key);
                    let expires_at = entry.expires_at();
                    self.revalidate(key, fetch);
                    return Ok(Response::cache_hit(data, entry.created_at, expires_at));
                }
            }
            debug!("cache miss for {}", key);
        } else {
            debug!("forced refresh of {}", key);
        }

        let data = fetch(Arc::clone(&self.inner.api))
            .await
            .map_err(|e| Error::fetch(resource, e))?;
        let data = Arc::new(data);
        let entry = self
            .inner
            .cache
            .set_shared(&key, Arc::clone(&data), TtlTier::Default);

        Ok(Response::cache_miss(data, entry.created_at, entry.expires_at()))
    }

    /// Spawns a background refresh of `key` unless one is already running.
    fn revalidate<T, F, Fut>(&self, key: String, fetch: F)
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        if self.inner.shut_down.load(Ordering::SeqCst) {
            return;
        }
        if !self.inner.refreshing.insert(key.clone()) {
            debug!("refresh of {} already in flight", key);
            return;
        }

        let guard = RefreshGuard {
            inner: Arc::clone(&self.inner),
            key,
        };
        self.inner.tasks.spawn(async move {
            let RefreshGuard { inner, key } = &guard;
            match fetch(Arc::clone(&inner.api)).await {
                Ok(fresh) => {
                    inner
                        .cache
                        .set_shared(key, Arc::new(fresh), TtlTier::Default);
                    debug!("revalidated {}", key);
                }
                Err(e) => warn!("background refresh of {} failed: {}", key, e),
            }
        });
    }
}

/// Releases a key's in-flight mark when its refresh task ends, including by
/// panic or by the task being dropped unpolled.
struct RefreshGuard<A> {
    inner: Arc<CachedApiInner<A>>,
    key: String,
}

impl<A> Drop for RefreshGuard<A> {
    fn drop(&mut self) {
        self.inner.refreshing.remove(&self.key);
    }
}

impl<A: ResourceApi + MutationApi + 'static> CachedApi<A> {
    /// Creates a tenant and drops the cached tenant list.
    pub async fn create_tenant(&self, tenant: &Tenant) -> Result<Tenant, Error> {
        let created = self.inner.api.create_tenant(tenant).await?;
        self.invalidate(SingletonResource::Tenants);
        Ok(created)
    }

    /// Updates a tenant and drops the cached tenant list.
    pub async fn update_tenant(&self, id: &str, tenant: &Tenant) -> Result<Tenant, Error> {
        let updated = self.inner.api.update_tenant(id, tenant).await?;
        self.invalidate(SingletonResource::Tenants);
        Ok(updated)
    }

    /// Deletes a tenant and drops the tenant list and everything scoped to it.
    pub async fn delete_tenant(&self, id: &str) -> Result<(), Error> {
        self.inner.api.delete_tenant(id).await?;
        self.invalidate(SingletonResource::Tenants);
        self.invalidate_tenant(id);
        Ok(())
    }

    /// Creates a transaction and drops the affected transaction lists.
    pub async fn create_transaction(
        &self,
        transaction_type: &str,
        tenant: impl Into<TenantScope>,
        transaction: &Transaction,
    ) -> Result<Transaction, Error> {
        let tenant = tenant.into();
        let created = self
            .inner
            .api
            .create_transaction(transaction_type, tenant.filter(), transaction)
            .await?;
        self.invalidate_transaction_lists(transaction_type, &tenant);
        Ok(created)
    }

    /// Updates a transaction and drops the affected transaction lists.
    pub async fn update_transaction(
        &self,
        transaction_type: &str,
        tenant: impl Into<TenantScope>,
        id: &str,
        transaction: &Transaction,
    ) -> Result<Transaction, Error> {
        let tenant = tenant.into();
        let updated = self
            .inner
            .api
            .update_transaction(transaction_type, tenant.filter(), id, transaction)
            .await?;
        self.invalidate_transaction_lists(transaction_type, &tenant);
        Ok(updated)
    }

    /// Deletes a transaction and drops the affected transaction lists.
    pub async fn delete_transaction(
        &self,
        transaction_type: &str,
        tenant: impl Into<TenantScope>,
        id: &str,
    ) -> Result<(), Error> {
        let tenant = tenant.into();
        self.inner
            .api
            .delete_transaction(transaction_type, tenant.filter(), id)
            .await?;
        self.invalidate_transaction_lists(transaction_type, &tenant);
        Ok(())
    }

    /// A tenant's change also shows up in the global list.
    fn invalidate_transaction_lists(&self, transaction_type: &str, tenant: &TenantScope) {
        self.invalidate_transactions(transaction_type, tenant.clone());
        if !tenant.is_global() {
            self.invalidate_transactions(transaction_type, TenantScope::Global);
        }
    }
}
