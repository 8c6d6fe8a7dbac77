use clap::{Parser, Subcommand};
use color_eyre::Result;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

use storefront_catalog::catalog::{self, CatalogService};
use storefront_catalog::config::Config;
use storefront_catalog::logging;

#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(about = "Query the print-on-demand product catalog")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/storefront/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Override the API base URL
  #[arg(long, global = true)]
  base_url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List displayable products
  Products {
    /// Skip the cache and go to the API
    #[arg(long)]
    refresh: bool,

    /// Only show products matching this term
    #[arg(short, long)]
    search: Option<String>,
  },
  /// Show one product
  Product {
    /// Product id
    id: String,
  },
  /// Summarize the displayable catalog
  Stats,
  /// Probe the worker and the products endpoint
  Health,
  /// Run every probe and report where the catalog came from
  Check,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = Config::load(args.config.as_deref())?;
  if let Some(base_url) = args.base_url {
    config.api.base_url = base_url;
  }

  let _guard = logging::init(&config.logging)?;

  let service = CatalogService::new(&config)?;

  match args.command {
    Command::Products { refresh, search } => {
      let result = service.load_products_with_source(refresh).await;
      let products = match search.as_deref() {
        Some(term) => catalog::search(&result.data, term),
        None => result.data.iter().collect(),
      };
      print_json(&json!({
        "source": result.source,
        "cached_at": result.cached_at,
        "count": products.len(),
        "products": products,
      }))?;
    }
    Command::Product { id } => {
      let product = service.load_product(&id).await?;
      print_json(&product)?;
    }
    Command::Stats => {
      let products = service.load_products(false).await;
      print_json(&catalog::stats(&products))?;
    }
    Command::Health => {
      let worker = service.check_worker_health().await;
      let api = service.check_api_health().await;
      print_json(&json!({ "worker": worker, "api": api }))?;
    }
    Command::Check => {
      let worker = service.check_worker_health().await;
      let api = service.check_api_health().await;
      let result = service.load_products_with_source(true).await;
      let first_product = match result.data.first() {
        Some(product) => Some(service.load_product(&product.id.to_string()).await?),
        None => None,
      };
      print_json(&json!({
        "base_url": config.api.base_url,
        "worker": worker,
        "api": api,
        "catalog": {
          "source": result.source,
          "degraded": result.is_degraded(),
          "count": result.data.len(),
          "stats": catalog::stats(&result.data),
        },
        "first_product": first_product,
      }))?;
    }
  }

  Ok(())
}
