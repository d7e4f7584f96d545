//! Stale-while-revalidate behavior of the cached accessors, driven by an
//! in-memory accessor and tokio's paused clock.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use erpdash_lib::api::MutationApi;
use erpdash_lib::api::Resource;
use erpdash_lib::api::ResourceApi;
use erpdash_lib::cache::Cache;
use erpdash_lib::cache::CacheConfig;
use erpdash_lib::cache::InMemoryCache;
use erpdash_lib::error::ApiError;
use erpdash_lib::error::Error;
use erpdash_lib::keys;
use erpdash_lib::model::Application;
use erpdash_lib::model::DataSource;
use erpdash_lib::model::ModelSchema;
use erpdash_lib::model::Tenant;
use erpdash_lib::model::Transaction;
use erpdash_lib::model::TransactionSpec;
use erpdash_lib::CachedApi;
use erpdash_lib::SingletonResource;
use erpdash_lib::TenantScope;

// =============================================================================
// Mock accessor
// =============================================================================

/// One recorded accessor call: method name and tenant filter.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Call {
    method: &'static str,
    tenant: Option<String>,
}

#[derive(Default)]
struct MockApi {
    calls: Mutex<Vec<Call>>,
    tenants: Mutex<Vec<Tenant>>,
    schemas: Mutex<Vec<ModelSchema>>,
    fail: AtomicBool,
    /// Makes the next transaction types call panic.
    panic_next: AtomicBool,
    transaction_calls: AtomicUsize,
    /// Delay applied to the next transactions calls, in order.
    transaction_delays: Mutex<VecDeque<Duration>>,
}

impl MockApi {
    fn with_tenants(tenants: &[(&str, &str)]) -> Self {
        let api = Self::default();
        api.set_tenants(tenants);
        api
    }

    fn set_tenants(&self, tenants: &[(&str, &str)]) {
        *self.tenants.lock().unwrap() = tenants
            .iter()
            .map(|(id, name)| Tenant::new(*id, *name))
            .collect();
    }

    fn record(&self, method: &'static str, tenant: Option<&str>) -> Result<(), Error> {
        self.calls.lock().unwrap().push(Call {
            method,
            tenant: tenant.map(str::to_string),
        });
        if self.fail.load(Ordering::SeqCst) {
            return Err(ApiError::http(503, "unavailable").into());
        }
        Ok(())
    }

    fn calls(&self, method: &str) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    fn count(&self, method: &str) -> usize {
        self.calls(method).len()
    }
}

#[async_trait]
impl ResourceApi for MockApi {
    async fn tenants(&self) -> Result<Vec<Tenant>, Error> {
        self.record("tenants", None)?;
        Ok(self.tenants.lock().unwrap().clone())
    }

    async fn transaction_types(&self) -> Result<Vec<String>, Error> {
        self.record("transaction_types", None)?;
        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("transaction types accessor blew up");
        }
        Ok(vec!["Invoice".to_string(), "Order".to_string()])
    }

    async fn transactions(
        &self,
        transaction_type: &str,
        tenant: Option<&str>,
    ) -> Result<Vec<Transaction>, Error> {
        let n = self.transaction_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.transaction_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.record("transactions", tenant)?;
        let mut tx = Transaction::new(format!("v{}", n)).with_type(transaction_type);
        tx.tenant_id = tenant.map(str::to_string);
        Ok(vec![tx])
    }

    async fn data_sources(&self, tenant: Option<&str>) -> Result<Vec<DataSource>, Error> {
        self.record("data_sources", tenant)?;
        Ok(vec![DataSource::new("ds-1", "Ledger")])
    }

    async fn applications(&self, tenant: Option<&str>) -> Result<Vec<Application>, Error> {
        self.record("applications", tenant)?;
        Ok(vec![Application::new("app-1", "Billing")])
    }

    async fn transaction_specs(
        &self,
        application_id: &str,
        tenant: Option<&str>,
    ) -> Result<Vec<TransactionSpec>, Error> {
        self.record("transaction_specs", tenant)?;
        Ok(vec![TransactionSpec::new(
            format!("{}-spec", application_id),
            "Invoice",
        )])
    }

    async fn model_schemas(&self) -> Result<Vec<ModelSchema>, Error> {
        self.record("model_schemas", None)?;
        Ok(self.schemas.lock().unwrap().clone())
    }
}

#[async_trait]
impl MutationApi for MockApi {
    async fn create_tenant(&self, tenant: &Tenant) -> Result<Tenant, Error> {
        self.record("create_tenant", None)?;
        self.tenants.lock().unwrap().push(tenant.clone());
        Ok(tenant.clone())
    }

    async fn update_tenant(&self, id: &str, tenant: &Tenant) -> Result<Tenant, Error> {
        self.record("update_tenant", None)?;
        let mut tenants = self.tenants.lock().unwrap();
        if let Some(existing) = tenants.iter_mut().find(|t| t.id == id) {
            *existing = tenant.clone();
        }
        Ok(tenant.clone())
    }

    async fn delete_tenant(&self, id: &str) -> Result<(), Error> {
        self.record("delete_tenant", None)?;
        self.tenants.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }

    async fn create_transaction(
        &self,
        _transaction_type: &str,
        tenant: Option<&str>,
        transaction: &Transaction,
    ) -> Result<Transaction, Error> {
        self.record("create_transaction", tenant)?;
        Ok(transaction.clone())
    }

    async fn update_transaction(
        &self,
        _transaction_type: &str,
        tenant: Option<&str>,
        _id: &str,
        transaction: &Transaction,
    ) -> Result<Transaction, Error> {
        self.record("update_transaction", tenant)?;
        Ok(transaction.clone())
    }

    async fn delete_transaction(
        &self,
        _transaction_type: &str,
        tenant: Option<&str>,
        _id: &str,
    ) -> Result<(), Error> {
        self.record("delete_transaction", tenant)?;
        Ok(())
    }
}

fn cached(api: MockApi) -> (Arc<MockApi>, CachedApi<MockApi>) {
    let api = Arc::new(api);
    let cached = CachedApi::from_shared(Arc::clone(&api), Cache::in_memory());
    (api, cached)
}

fn tenant_ids(tenants: &[Tenant]) -> Vec<&str> {
    tenants.iter().map(|t| t.id.as_str()).collect()
}

// =============================================================================
// Stale-while-revalidate
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_walkthrough_with_five_minute_ttl() {
    let (api, cached) = cached(MockApi::with_tenants(&[("T1", "One"), ("T2", "Two")]));

    // t=0: empty cache, fetch and store
    let r = cached.tenants(false).await.unwrap();
    assert!(r.cache.is_miss());
    assert_eq!(tenant_ids(r.data()), ["T1", "T2"]);
    assert_eq!(api.count("tenants"), 1);
    assert!(cached.cache().has("tenants"));

    // t=60s: hit with the old list, background refresh picks up T3
    api.set_tenants(&[("T1", "One"), ("T2", "Two"), ("T3", "Three")]);
    tokio::time::advance(Duration::from_secs(60)).await;
    let r = cached.tenants(false).await.unwrap();
    assert!(r.is_cached());
    assert_eq!(tenant_ids(r.data()), ["T1", "T2"]);
    cached.settle().await;
    assert_eq!(api.count("tenants"), 2);

    // t=90s: hit with the refreshed list
    tokio::time::advance(Duration::from_secs(30)).await;
    let r = cached.tenants(false).await.unwrap();
    assert!(r.is_cached());
    assert_eq!(tenant_ids(r.data()), ["T1", "T2", "T3"]);
    cached.settle().await;

    // t=400s: the last write (t=90s) is past its TTL, so this is a miss
    tokio::time::advance(Duration::from_secs(310)).await;
    let r = cached.tenants(false).await.unwrap();
    assert!(r.cache.is_miss());
    assert_eq!(tenant_ids(r.data()), ["T1", "T2", "T3"]);
    assert_eq!(api.count("tenants"), 4);
}

#[tokio::test(start_paused = true)]
async fn test_back_to_back_calls_trigger_one_extra_fetch() {
    let (api, cached) = cached(MockApi::with_tenants(&[("T1", "One")]));

    let first = cached.tenants(false).await.unwrap();
    let second = cached.tenants(false).await.unwrap();
    cached.settle().await;

    assert_eq!(first.data(), second.data());
    assert!(Arc::ptr_eq(first.data(), second.data()));
    assert_eq!(api.count("tenants"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_hits_share_one_background_refresh() {
    let (api, cached) = cached(MockApi::with_tenants(&[("T1", "One")]));
    cached.tenants(false).await.unwrap();

    // Neither spawned refresh gets polled before the second call.
    let a = cached.tenants(false).await.unwrap();
    let b = cached.tenants(false).await.unwrap();
    assert!(a.is_cached() && b.is_cached());
    assert_eq!(cached.pending_refreshes(), 1);

    cached.settle().await;
    assert_eq!(api.count("tenants"), 2);
    assert_eq!(cached.pending_refreshes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_force_refresh_skips_cache() {
    let (api, cached) = cached(MockApi::with_tenants(&[("T1", "One")]));
    cached.tenants(false).await.unwrap();

    api.set_tenants(&[("T9", "Nine")]);
    let r = cached.tenants(true).await.unwrap();
    assert!(r.cache.is_miss());
    assert_eq!(tenant_ids(r.data()), ["T9"]);
    assert_eq!(cached.pending_refreshes(), 0);
    assert_eq!(api.count("tenants"), 2);

    let r = cached.tenants(false).await.unwrap();
    assert_eq!(tenant_ids(r.data()), ["T9"]);
}

#[tokio::test(start_paused = true)]
async fn test_configured_ttl_applies_to_accessors() {
    let api = Arc::new(MockApi::with_tenants(&[("T1", "One")]));
    let cache = Cache::new(
        InMemoryCache::new(),
        CacheConfig::default().with_default_ttl(Duration::from_secs(10)),
    );
    let cached = CachedApi::from_shared(Arc::clone(&api), cache);

    let r = cached.tenants(false).await.unwrap();
    assert_eq!(
        r.expires_at() - r.cached_at(),
        chrono::Duration::seconds(10)
    );

    tokio::time::advance(Duration::from_secs(11)).await;
    assert!(cached.tenants(false).await.unwrap().cache.is_miss());
}

#[tokio::test(start_paused = true)]
async fn test_ttl_beyond_calendar_range_is_served() {
    let api = Arc::new(MockApi::default());
    let cache = Cache::new(
        InMemoryCache::new(),
        CacheConfig::default().with_default_ttl(Duration::from_secs(10_000_000_000_000)),
    );
    let cached = CachedApi::from_shared(Arc::clone(&api), cache);

    let miss = cached.transaction_types(false).await.unwrap();
    assert!(miss.cache.is_miss());
    assert_eq!(miss.expires_at(), chrono::DateTime::<chrono::Utc>::MAX_UTC);

    let hit = cached.transaction_types(false).await.unwrap();
    assert!(hit.is_cached());
    cached.settle().await;
    assert_eq!(api.count("transaction_types"), 2);
}

// =============================================================================
// Tenant scoping
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_tenants_never_share_entries() {
    let (api, cached) = cached(MockApi::default());

    let a = cached.transactions("Invoice", "tenant-A", false).await.unwrap();
    let b = cached.transactions("Invoice", "tenant-B", false).await.unwrap();
    assert!(a.cache.is_miss() && b.cache.is_miss());
    assert_eq!(a.data()[0].tenant_id.as_deref(), Some("tenant-A"));
    assert_eq!(b.data()[0].tenant_id.as_deref(), Some("tenant-B"));
    assert_eq!(api.count("transactions"), 2);

    assert_eq!(
        cached.cache().keys(),
        vec![
            "transactions:Invoice:tenant-A".to_string(),
            "transactions:Invoice:tenant-B".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_tenant_invalidation_keeps_other_tenants() {
    let (_api, cached) = cached(MockApi::default());

    cached.transactions("Invoice", "tenant-A", false).await.unwrap();
    cached.data_sources("tenant-A", false).await.unwrap();
    cached.transaction_specs("app-1", "tenant-A", false).await.unwrap();
    cached.transactions("Invoice", "tenant-B", false).await.unwrap();
    cached.transactions("Invoice", "tenant-AB", false).await.unwrap();
    cached.tenants(false).await.unwrap();

    assert_eq!(cached.invalidate_tenant("tenant-A"), 3);

    let cache = cached.cache();
    assert!(!cache.has(&keys::transactions("Invoice", &"tenant-A".into())));
    assert!(!cache.has(&keys::data_sources(&"tenant-A".into())));
    assert!(cache.has(&keys::transactions("Invoice", &"tenant-B".into())));
    assert!(cache.has(&keys::transactions("Invoice", &"tenant-AB".into())));
    assert!(cache.has(&keys::tenants()));

    let b = cached.transactions("Invoice", "tenant-B", false).await.unwrap();
    assert!(b.is_cached());
}

#[tokio::test(start_paused = true)]
async fn test_global_sentinel_means_no_filter() {
    let (api, cached) = cached(MockApi::default());

    let r = cached.data_sources("global", false).await.unwrap();
    assert!(r.cache.is_miss());
    // served from cache; the background refresh must not filter either
    cached.data_sources("global", false).await.unwrap();
    cached.settle().await;

    let calls = api.calls("data_sources");
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.tenant.is_none()));
    assert!(cached.cache().has("data_sources:global"));
}

#[tokio::test(start_paused = true)]
async fn test_tenant_filter_reaches_background_refresh() {
    let (api, cached) = cached(MockApi::default());

    cached.applications("acme", false).await.unwrap();
    cached.applications("acme", false).await.unwrap();
    cached.settle().await;

    let calls = api.calls("applications");
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.tenant.as_deref() == Some("acme")));
}

#[tokio::test(start_paused = true)]
async fn test_global_and_tenant_entries_are_separate() {
    let (_api, cached) = cached(MockApi::default());

    cached.applications("global", false).await.unwrap();
    let r = cached.applications("acme", false).await.unwrap();
    assert!(r.cache.is_miss());
    assert_eq!(cached.cache().len(), 2);
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_foreground_failure_propagates() {
    let (api, cached) = cached(MockApi::default());
    api.fail.store(true, Ordering::SeqCst);

    let err = cached.tenants(false).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Fetch {
            resource: Resource::Tenants,
            ..
        }
    ));
    assert_eq!(err.status_code(), Some(503));
    assert!(cached.cache().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_background_failure_is_swallowed() {
    let (api, cached) = cached(MockApi::with_tenants(&[("T1", "One")]));
    cached.tenants(false).await.unwrap();

    api.fail.store(true, Ordering::SeqCst);
    let r = cached.tenants(false).await.unwrap();
    assert!(r.is_cached());
    cached.settle().await;
    assert_eq!(api.count("tenants"), 2);

    // the stale entry is still served, and another refresh is attempted
    let r = cached.tenants(false).await.unwrap();
    assert_eq!(tenant_ids(r.data()), ["T1"]);
    cached.settle().await;
    assert_eq!(api.count("tenants"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_refresh_is_retried_on_next_hit() {
    let (api, cached) = cached(MockApi::default());
    cached.transaction_types(false).await.unwrap();

    api.panic_next.store(true, Ordering::SeqCst);
    assert!(cached.transaction_types(false).await.unwrap().is_cached());
    cached.settle().await;
    assert_eq!(api.count("transaction_types"), 2);
    assert_eq!(cached.pending_refreshes(), 0);

    // the panicked refresh must not leave the key marked as in flight
    assert!(cached.transaction_types(false).await.unwrap().is_cached());
    cached.settle().await;
    assert_eq!(api.count("transaction_types"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_is_not_retried() {
    let (api, cached) = cached(MockApi::default());
    api.fail.store(true, Ordering::SeqCst);

    assert!(cached.transaction_types(false).await.is_err());
    cached.settle().await;
    assert_eq!(api.count("transaction_types"), 1);
}

// =============================================================================
// Resource specifics
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_model_schemas_drop_deleted_before_caching() {
    let api = MockApi::default();
    *api.schemas.lock().unwrap() = vec![
        ModelSchema::new("1", "Invoice").with_state("active"),
        ModelSchema::new("2", "Legacy").with_state("deleted"),
    ];
    let (_api, cached) = cached(api);

    let r = cached.model_schemas(false).await.unwrap();
    assert_eq!(r.data().len(), 1);

    let stored = cached
        .cache()
        .get::<Vec<ModelSchema>>(&keys::model_schemas())
        .unwrap();
    assert!(stored.iter().all(|s| !s.is_deleted()));

    // background path filters too
    cached.model_schemas(false).await.unwrap();
    cached.settle().await;
    let stored = cached
        .cache()
        .get::<Vec<ModelSchema>>(&keys::model_schemas())
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_result_is_cached() {
    let (api, cached) = cached(MockApi::default());

    let r = cached.tenants(false).await.unwrap();
    assert!(r.data().is_empty());
    let r = cached.tenants(false).await.unwrap();
    assert!(r.is_cached());
    assert!(r.data().is_empty());
    cached.settle().await;
    assert_eq!(api.count("tenants"), 2);
}

// =============================================================================
// Invalidation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_singleton_invalidation() {
    let (_api, cached) = cached(MockApi::default());
    cached.tenants(false).await.unwrap();
    cached.transaction_types(false).await.unwrap();
    cached.model_schemas(false).await.unwrap();

    cached.invalidate(SingletonResource::TransactionTypes);
    assert!(!cached.cache().has("transaction_types"));
    assert!(cached.cache().has("tenants"));
    assert!(cached.cache().has("model_schemas"));

    assert!(cached.transaction_types(false).await.unwrap().cache.is_miss());
}

#[tokio::test(start_paused = true)]
async fn test_invalidate_all() {
    let (_api, cached) = cached(MockApi::default());
    cached.tenants(false).await.unwrap();
    cached.data_sources("acme", false).await.unwrap();
    cached.transaction_specs("app-1", "global", false).await.unwrap();

    cached.invalidate_all();
    assert!(cached.cache().is_empty());
    assert!(cached.tenants(false).await.unwrap().cache.is_miss());
}

#[tokio::test(start_paused = true)]
async fn test_per_key_invalidation() {
    let (_api, cached) = cached(MockApi::default());
    cached.transactions("Invoice", "acme", false).await.unwrap();
    cached.transactions("Order", "acme", false).await.unwrap();
    cached.transaction_specs("app-1", "acme", false).await.unwrap();

    cached.invalidate_transactions("Invoice", "acme");
    cached.invalidate_transaction_specs("app-1", "acme");

    assert_eq!(
        cached.cache().keys(),
        vec!["transactions:Order:acme".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_invalidate_data_sources_and_applications() {
    let (_api, cached) = cached(MockApi::default());
    cached.data_sources("acme", false).await.unwrap();
    cached.data_sources("global", false).await.unwrap();
    cached.applications("acme", false).await.unwrap();
    cached.applications("other", false).await.unwrap();

    cached.invalidate_data_sources("acme");
    cached.invalidate_applications("other");

    assert_eq!(
        cached.cache().keys(),
        vec![
            "applications:acme".to_string(),
            "data_sources:global".to_string(),
        ]
    );
    assert!(cached.data_sources("acme", false).await.unwrap().cache.is_miss());
    assert!(cached.applications("acme", false).await.unwrap().is_cached());
}

#[tokio::test(start_paused = true)]
async fn test_create_transaction_invalidates_tenant_and_global_lists() {
    let (api, cached) = cached(MockApi::default());
    cached.transactions("Invoice", "acme", false).await.unwrap();
    cached.transactions("Invoice", "global", false).await.unwrap();
    cached.transactions("Invoice", "other", false).await.unwrap();
    cached.transactions("Order", "acme", false).await.unwrap();

    let tx = Transaction::new("new").with_type("Invoice");
    let created = cached.create_transaction("Invoice", "acme", &tx).await.unwrap();
    assert_eq!(created.id, "new");
    assert_eq!(
        api.calls("create_transaction")[0].tenant.as_deref(),
        Some("acme")
    );

    assert_eq!(
        cached.cache().keys(),
        vec![
            "transactions:Invoice:other".to_string(),
            "transactions:Order:acme".to_string(),
        ]
    );
    let r = cached.transactions("Invoice", "acme", false).await.unwrap();
    assert!(r.cache.is_miss());
}

#[tokio::test(start_paused = true)]
async fn test_update_transaction_invalidates_tenant_and_global_lists() {
    let (api, cached) = cached(MockApi::default());
    cached.transactions("Invoice", "acme", false).await.unwrap();
    cached.transactions("Invoice", "global", false).await.unwrap();
    cached.transactions("Invoice", "other", false).await.unwrap();

    let tx = Transaction::new("v1").with_field("amount", 10);
    cached
        .update_transaction("Invoice", "acme", "v1", &tx)
        .await
        .unwrap();
    assert_eq!(
        api.calls("update_transaction")[0].tenant.as_deref(),
        Some("acme")
    );
    assert_eq!(
        cached.cache().keys(),
        vec!["transactions:Invoice:other".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_global_transaction_mutation_drops_global_list_only() {
    let (api, cached) = cached(MockApi::default());
    cached.transactions("Invoice", "global", false).await.unwrap();
    cached.transactions("Invoice", "acme", false).await.unwrap();

    let tx = Transaction::new("new");
    cached
        .create_transaction("Invoice", "global", &tx)
        .await
        .unwrap();
    assert_eq!(api.calls("create_transaction")[0].tenant, None);
    assert_eq!(
        cached.cache().keys(),
        vec!["transactions:Invoice:acme".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_update_tenant_refreshes_tenant_list() {
    let (_api, cached) = cached(MockApi::with_tenants(&[("T1", "One"), ("T2", "Two")]));
    cached.tenants(false).await.unwrap();
    cached.data_sources("T1", false).await.unwrap();

    let updated = cached
        .update_tenant("T1", &Tenant::new("T1", "Uno"))
        .await
        .unwrap();
    assert_eq!(updated.name, "Uno");
    assert_eq!(cached.cache().keys(), vec!["data_sources:T1".to_string()]);

    let r = cached.tenants(false).await.unwrap();
    assert!(r.cache.is_miss());
    let names: Vec<&str> = r.data().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Uno", "Two"]);
}

#[tokio::test(start_paused = true)]
async fn test_mutations_invalidate_affected_lists() {
    let (api, cached) = cached(MockApi::with_tenants(&[("T1", "One")]));
    cached.tenants(false).await.unwrap();
    cached.transactions("Invoice", "acme", false).await.unwrap();
    cached.transactions("Invoice", "global", false).await.unwrap();
    cached.transactions("Invoice", "other", false).await.unwrap();

    cached.create_tenant(&Tenant::new("T2", "Two")).await.unwrap();
    let r = cached.tenants(false).await.unwrap();
    assert!(r.cache.is_miss());
    assert_eq!(tenant_ids(r.data()), ["T1", "T2"]);

    cached
        .delete_transaction("Invoice", "acme", "v1")
        .await
        .unwrap();
    assert_eq!(
        api.calls("delete_transaction")[0].tenant.as_deref(),
        Some("acme")
    );
    assert_eq!(
        cached.cache().keys(),
        vec![
            "tenants".to_string(),
            "transactions:Invoice:other".to_string()
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_delete_tenant_drops_its_entries() {
    let (_api, cached) = cached(MockApi::with_tenants(&[("acme", "Acme")]));
    cached.tenants(false).await.unwrap();
    cached.data_sources("acme", false).await.unwrap();
    cached.data_sources("other", false).await.unwrap();

    cached.delete_tenant("acme").await.unwrap();
    assert_eq!(cached.cache().keys(), vec!["data_sources:other".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_mutation_keeps_cache() {
    let (api, cached) = cached(MockApi::with_tenants(&[("T1", "One")]));
    cached.tenants(false).await.unwrap();

    api.fail.store(true, Ordering::SeqCst);
    assert!(cached.update_tenant("T1", &Tenant::new("T1", "Uno")).await.is_err());
    assert!(cached.cache().has("tenants"));
}

// =============================================================================
// Background task lifecycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_revalidation() {
    let (api, cached) = cached(MockApi::with_tenants(&[("T1", "One")]));
    cached.tenants(false).await.unwrap();

    cached.shutdown().await;
    let r = cached.tenants(false).await.unwrap();
    assert!(r.is_cached());
    assert_eq!(cached.pending_refreshes(), 0);
    assert_eq!(api.count("tenants"), 1);
}

/// A background refresh that started before a forced refresh can finish
/// after it and overwrite the newer result. Nothing orders the two writes;
/// this pins that behavior.
#[tokio::test(start_paused = true)]
async fn test_slow_background_refresh_overwrites_forced_refresh() {
    let (api, cached) = cached(MockApi::default());
    let key = keys::transactions("Invoice", &TenantScope::from("acme"));
    let stored = |cached: &CachedApi<MockApi>| {
        cached
            .cache()
            .get::<Vec<Transaction>>(&key)
            .map(|txs| txs[0].id.clone())
    };

    // v1 seeds the cache
    cached.transactions("Invoice", "acme", false).await.unwrap();

    // the hit spawns a refresh that will take 10s to return v2
    api.transaction_delays
        .lock()
        .unwrap()
        .push_back(Duration::from_secs(10));
    cached.transactions("Invoice", "acme", false).await.unwrap();
    while api.transaction_calls.load(Ordering::SeqCst) < 2 {
        tokio::task::yield_now().await;
    }

    // the forced refresh returns v3 right away
    let forced = cached.transactions("Invoice", "acme", true).await.unwrap();
    assert_eq!(forced.data()[0].id, "v3");
    assert_eq!(stored(&cached).as_deref(), Some("v3"));

    // then the slow refresh lands with older data
    cached.settle().await;
    assert_eq!(stored(&cached).as_deref(), Some("v2"));
}
