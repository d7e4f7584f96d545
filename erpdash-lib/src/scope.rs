//! Tenant scoping

use std::fmt;

/// Tenant id that means "no tenant filter".
pub const GLOBAL_TENANT: &str = "global";

/// The tenant selection a tenant-scoped query runs under.
///
/// Converting from a string maps the `"global"` sentinel (and the empty
/// string) to [`TenantScope::Global`]. The API is then queried without a
/// tenant filter, while the cache key still carries `global` so global and
/// per-tenant results never share an entry.
///
/// # Example
///
/// ```
/// use erpdash_lib::TenantScope;
///
/// assert_eq!(TenantScope::from("global").filter(), None);
/// assert_eq!(TenantScope::from("acme").filter(), Some("acme"));
/// assert_eq!(TenantScope::from("global").key_segment(), "global");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TenantScope {
    /// All tenants.
    #[default]
    Global,
    /// A single tenant.
    Tenant(String),
}

impl TenantScope {
    /// Scope for a tenant id, honoring the `"global"` sentinel.
    pub fn from_id(id: &str) -> Self {
        if id.is_empty() || id == GLOBAL_TENANT {
            Self::Global
        } else {
            Self::Tenant(id.to_string())
        }
    }

    /// The tenant filter to send to the API, `None` for global.
    pub fn filter(&self) -> Option<&str> {
        match self {
            Self::Global => None,
            Self::Tenant(id) => Some(id),
        }
    }

    /// The tenant segment of a cache key.
    pub fn key_segment(&self) -> &str {
        match self {
            Self::Global => GLOBAL_TENANT,
            Self::Tenant(id) => id,
        }
    }

    /// Returns `true` for the global scope.
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }
}

impl From<&str> for TenantScope {
    fn from(id: &str) -> Self {
        Self::from_id(id)
    }
}

impl From<String> for TenantScope {
    fn from(id: String) -> Self {
        Self::from_id(&id)
    }
}

impl From<&String> for TenantScope {
    fn from(id: &String) -> Self {
        Self::from_id(id)
    }
}

impl From<Option<&str>> for TenantScope {
    fn from(id: Option<&str>) -> Self {
        id.map(Self::from_id).unwrap_or_default()
    }
}

impl fmt::Display for TenantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_segment())
    }
}
