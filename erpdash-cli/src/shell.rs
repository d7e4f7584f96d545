//! Interactive shell
//!
//! Every line runs against the same cache, so repeated queries are served
//! from memory and revalidated in the background.

use clap::Parser;
use clap::Subcommand;
use erpdash_lib::CachedApi;
use erpdash_lib::ErpClient;
use erpdash_lib::SingletonResource;
use log::info;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;

use crate::commands::Query;

#[derive(Debug, Parser)]
#[command(name = "erpdash", no_binary_name = true, disable_help_flag = true)]
struct Line {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Subcommand)]
enum ShellCommand {
    #[command(flatten)]
    Query(Query),
    /// Drop cached entries
    Invalidate {
        #[command(subcommand)]
        target: Invalidate,
    },
    /// Drop the whole cache (e.g. after switching user)
    Clear,
    /// Show cached keys
    Stats,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Subcommand)]
enum Invalidate {
    /// The tenant list
    Tenants,
    /// The transaction type list
    Types,
    /// The model schema list
    Schemas,
    /// Everything scoped to one tenant
    Tenant { tenant: String },
    /// Transactions of one type and tenant
    Transactions {
        transaction_type: String,
        #[arg(long, default_value = "global")]
        tenant: String,
    },
}

/// Runs the read-eval loop until `quit` or end of input.
pub async fn run(api: &CachedApi<ErpClient>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"erpdash> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else { break };
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let command = match Line::try_parse_from(words) {
            Ok(line) => line.command,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match command {
            ShellCommand::Query(query) => {
                if let Err(e) = query.run(api).await {
                    eprintln!("error: {:#}", e);
                }
            }
            ShellCommand::Invalidate { target } => invalidate(api, target),
            ShellCommand::Clear => {
                api.invalidate_all();
                info!("cache cleared from shell");
                eprintln!("cache cleared");
            }
            ShellCommand::Stats => {
                let keys = api.cache().keys();
                eprintln!(
                    "{} entries, {} refreshes in flight",
                    keys.len(),
                    api.pending_refreshes()
                );
                for key in keys {
                    println!("{}", key);
                }
            }
            ShellCommand::Quit => break,
        }
    }

    Ok(())
}

fn invalidate(api: &CachedApi<ErpClient>, target: Invalidate) {
    match target {
        Invalidate::Tenants => api.invalidate(SingletonResource::Tenants),
        Invalidate::Types => api.invalidate(SingletonResource::TransactionTypes),
        Invalidate::Schemas => api.invalidate(SingletonResource::ModelSchemas),
        Invalidate::Tenant { tenant } => {
            let removed = api.invalidate_tenant(tenant.as_str());
            eprintln!("{} entries removed", removed);
        }
        Invalidate::Transactions {
            transaction_type,
            tenant,
        } => api.invalidate_transactions(&transaction_type, tenant.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<ShellCommand, clap::Error> {
        Line::try_parse_from(line.split_whitespace()).map(|l| l.command)
    }

    #[test]
    fn test_parses_queries() {
        let cmd = parse("transactions Invoice --tenant acme --refresh").unwrap();
        match cmd {
            ShellCommand::Query(Query::Transactions {
                transaction_type,
                tenant,
                refresh,
            }) => {
                assert_eq!(transaction_type, "Invoice");
                assert_eq!(tenant, "acme");
                assert!(refresh);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tenant_defaults_to_global() {
        match parse("data-sources").unwrap() {
            ShellCommand::Query(Query::DataSources { tenant, refresh }) => {
                assert_eq!(tenant, "global");
                assert!(!refresh);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parses_invalidation() {
        assert!(matches!(
            parse("invalidate tenant acme").unwrap(),
            ShellCommand::Invalidate {
                target: Invalidate::Tenant { .. }
            }
        ));
        assert!(matches!(parse("exit").unwrap(), ShellCommand::Quit));
        assert!(parse("bogus").is_err());
    }
}
