//! Query commands and their output

use std::sync::Arc;

use clap::Subcommand;
use erpdash_lib::CachedApi;
use erpdash_lib::ErpClient;
use erpdash_lib::Response;
use serde_json::Value;

/// Reads served through the shared cache.
#[derive(Debug, Clone, Subcommand)]
pub enum Query {
    /// List tenants
    Tenants {
        /// Skip the cache
        #[arg(long)]
        refresh: bool,
    },
    /// List transaction types
    Types {
        #[arg(long)]
        refresh: bool,
    },
    /// List transactions of a type
    Transactions {
        /// Transaction type, e.g. Invoice
        transaction_type: String,
        /// Tenant id, or "global" for all tenants
        #[arg(long, default_value = "global")]
        tenant: String,
        #[arg(long)]
        refresh: bool,
    },
    /// List data sources
    DataSources {
        #[arg(long, default_value = "global")]
        tenant: String,
        #[arg(long)]
        refresh: bool,
    },
    /// List applications
    Applications {
        #[arg(long, default_value = "global")]
        tenant: String,
        #[arg(long)]
        refresh: bool,
    },
    /// List the transaction specifications of an application
    Specs {
        application_id: String,
        #[arg(long, default_value = "global")]
        tenant: String,
        #[arg(long)]
        refresh: bool,
    },
    /// List model schemas
    Schemas {
        #[arg(long)]
        refresh: bool,
    },
}

impl Query {
    /// Runs the query and prints the result as JSON on stdout.
    ///
    /// The cache status goes to stderr so stdout stays machine-readable.
    pub async fn run(&self, api: &CachedApi<ErpClient>) -> anyhow::Result<()> {
        let rendered = match self {
            Self::Tenants { refresh } => render(api.tenants(*refresh).await?)?,
            Self::Types { refresh } => render(api.transaction_types(*refresh).await?)?,
            Self::Transactions {
                transaction_type,
                tenant,
                refresh,
            } => render(
                api.transactions(transaction_type, tenant.as_str(), *refresh)
                    .await?,
            )?,
            Self::DataSources { tenant, refresh } => {
                render(api.data_sources(tenant.as_str(), *refresh).await?)?
            }
            Self::Applications { tenant, refresh } => {
                render(api.applications(tenant.as_str(), *refresh).await?)?
            }
            Self::Specs {
                application_id,
                tenant,
                refresh,
            } => render(
                api.transaction_specs(application_id, tenant.as_str(), *refresh)
                    .await?,
            )?,
            Self::Schemas { refresh } => render(api.model_schemas(*refresh).await?)?,
        };

        eprintln!("{} ({} records)", rendered.status, rendered.count);
        println!("{}", serde_json::to_string_pretty(&rendered.value)?);
        Ok(())
    }
}

struct Rendered {
    status: String,
    count: usize,
    value: Value,
}

fn render<T: serde::Serialize>(response: Response<Arc<Vec<T>>>) -> anyhow::Result<Rendered> {
    let status = if response.is_cached() {
        format!("{} (cached {})", response.cache, response.cached_at().to_rfc3339())
    } else {
        response.cache.to_string()
    };
    let records = response.into_inner();
    Ok(Rendered {
        status,
        count: records.len(),
        value: serde_json::to_value(records.as_slice())?,
    })
}
