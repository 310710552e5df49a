use bizdata_sync::infra::remote::{RemoteConnector, RemoteStore, RestConnector};
use bizdata_sync::{DataLayerConfig, Table};
use tracing_subscriber::EnvFilter;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight\n\
         \n\
         Reads env vars (or .env):\n\
           REMOTE_URL (required), REMOTE_API_KEY, LOCAL_STORE_URL,\n\
           MAX_RETRIES, RETRY_BASE_DELAY_MS, REQUEST_TIMEOUT_SECS\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    let config = DataLayerConfig::from_env()?;

    println!("> Preflight:");
    println!("  REMOTE_URL={}", config.remote_url.as_deref().unwrap_or("<unset>"));
    println!(
        "  REMOTE_API_KEY={}",
        if config.remote_api_key.is_some() { "<set>" } else { "<unset>" }
    );
    println!("  LOCAL_STORE_URL={}", config.local_store_url);
    println!(
        "  MAX_RETRIES={} RETRY_BASE_DELAY_MS={} REQUEST_TIMEOUT_SECS={}",
        config.max_retries,
        config.retry_base_delay.as_millis(),
        config.request_timeout_secs
    );

    let Some(rest) = config.rest_config() else {
        anyhow::bail!("REMOTE_URL is not set; the service would run offline-only");
    };

    let connector = RestConnector::new(rest);
    if !connector.probe_network().await {
        anyhow::bail!("remote endpoint is unreachable");
    }
    println!("  Remote reachable: yes");

    let remote = connector.connect().await?;

    let mut missing = Vec::new();
    for table in Table::ALL {
        match remote.probe(table).await {
            Ok(()) => println!("  [ok]      {}", table),
            Err(e) if e.is_table_missing() => {
                println!("  [missing] {}", table);
                missing.push(table);
            }
            Err(e) => println!("  [error]   {} ({})", table, e),
        }
    }

    if missing.is_empty() {
        println!("> Preflight OK: all {} tables present.", Table::ALL.len());
    } else {
        println!(
            "> Preflight OK with {} missing table(s); they will be served from the local cache.",
            missing.len()
        );
    }
    Ok(())
}
