use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use realty_catalog::catalog::{
    CatalogClient, CatalogParams, CatalogStore, CatalogView, CategoryFilter, QueryResult,
    QueryState, SortKey,
};
use realty_catalog::config::Settings;
use realty_catalog::models::ListingStatus;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "realty-catalog", version, about = "Browse the property catalog")]
struct Cli {
    /// Config file (defaults to ./realty-catalog.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search, sort and page through the full catalog
    Listings(ListingsArgs),
    /// Show the featured listings
    Featured(FeaturedArgs),
}

#[derive(Debug, Args)]
struct ListingsArgs {
    /// all, off-plan or ready
    #[arg(long, default_value = "all")]
    category: CategoryFilter,
    /// available, sold or reserved
    #[arg(long)]
    status: Option<ListingStatus>,
    #[arg(long, default_value = "")]
    search: String,
    /// newest, price_asc or price_desc
    #[arg(long, default_value = "newest")]
    sort: SortKey,
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// Defaults to the configured page size
    #[arg(long)]
    per_page: Option<usize>,
    /// Write the served page as JSON
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct FeaturedArgs {
    #[arg(long)]
    status: Option<ListingStatus>,
    /// Defaults to the configured featured limit
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    out: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("realty_catalog=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("realty_catalog=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;
    info!("Using catalog at {}", settings.api.base_url);

    let client = CatalogClient::with_options(&settings.api.base_url, settings.client_options())?;
    let store = CatalogStore::new(client, settings.normalizer())
        .with_timeout(settings.request_timeout());

    let (state, params, out) = match cli.command {
        Command::Listings(args) => {
            let state = QueryState {
                category: args.category,
                status: args.status,
                search: args.search,
                sort: args.sort,
                page: args.page,
                per_page: args.per_page.unwrap_or(settings.catalog.page_size),
            };
            let params = state
                .catalog_params()
                .with_limit(settings.catalog.listings_limit);
            (state, params, args.out)
        }
        Command::Featured(args) => {
            let limit = args.limit.unwrap_or(settings.catalog.featured_limit);
            let state = QueryState {
                status: args.status,
                per_page: limit as usize,
                ..QueryState::default()
            };
            (state, CatalogParams::featured(args.status).with_limit(limit), args.out)
        }
    };

    store.reload(params).await;

    match store.view(&state) {
        CatalogView::Loading => bail!("Catalog is still loading"),
        CatalogView::Error { message } => bail!("Could not load listings: {message}"),
        CatalogView::Empty => {
            println!("No properties found. Check back soon.");
        }
        CatalogView::Page(result) => {
            print_page(&result, state.per_page);
            if let Some(path) = out {
                let json = serde_json::to_string_pretty(&result)?;
                tokio::fs::write(&path, json)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Saved page to {}", path.display());
            }
        }
    }

    Ok(())
}

fn print_page(result: &QueryResult, per_page: usize) {
    let offset = result.page_number.saturating_sub(1) * per_page.max(1);
    for (i, listing) in result.page.iter().enumerate() {
        println!("{}. {} ({})", offset + i + 1, listing.title, listing.price);
        println!("   {} beds, {} baths, {}", listing.beds, listing.baths, listing.property_type);
        println!("   Location: {}, {}", listing.location, listing.city);
        println!(
            "   {} / {}{}",
            listing.category.as_str(),
            listing.status.as_str(),
            if listing.featured { " / featured" } else { "" }
        );
        if !listing.tags.is_empty() {
            println!("   Tags: {}", listing.tags.join(", "));
        }
        println!("   Image: {}", listing.image);
        println!();
    }
    println!(
        "Page {} of {} ({} matching)",
        result.page_number, result.total_pages, result.total_count
    );
}
