//! Cache keys of the cached accessors
//!
//! Every tenant-scoped key ends with the tenant segment, so
//! [`tenant_pattern`] reaches all of a tenant's entries across resource
//! types.

use crate::TenantScope;
use crate::api::Resource;
use crate::cache::CacheKey;
use crate::cache::KeyPattern;
use crate::cache::KEY_SEPARATOR;
use crate::cache::encode_segment;

/// `tenants`
pub fn tenants() -> String {
    CacheKey::new(Resource::Tenants.tag()).build()
}

/// `transaction_types`
pub fn transaction_types() -> String {
    CacheKey::new(Resource::TransactionTypes.tag()).build()
}

/// `transactions:{type}:{tenant}`
pub fn transactions(transaction_type: &str, tenant: &TenantScope) -> String {
    CacheKey::new(Resource::Transactions.tag())
        .segment(transaction_type)
        .segment(tenant.key_segment())
        .build()
}

/// `data_sources:{tenant}`
pub fn data_sources(tenant: &TenantScope) -> String {
    CacheKey::new(Resource::DataSources.tag())
        .segment(tenant.key_segment())
        .build()
}

/// `applications:{tenant}`
pub fn applications(tenant: &TenantScope) -> String {
    CacheKey::new(Resource::Applications.tag())
        .segment(tenant.key_segment())
        .build()
}

/// `transaction_specs:{application}:{tenant}`
pub fn transaction_specs(application_id: &str, tenant: &TenantScope) -> String {
    CacheKey::new(Resource::TransactionSpecs.tag())
        .segment(application_id)
        .segment(tenant.key_segment())
        .build()
}

/// `model_schemas`
pub fn model_schemas() -> String {
    CacheKey::new(Resource::ModelSchemas.tag()).build()
}

/// Matches every key scoped to the tenant.
pub fn tenant_pattern(tenant: &TenantScope) -> KeyPattern {
    KeyPattern::suffix(format!(
        "{}{}",
        KEY_SEPARATOR,
        encode_segment(tenant.key_segment())
    ))
}
