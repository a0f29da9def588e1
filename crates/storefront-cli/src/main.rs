use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use storefront_core::{
    query, Category, Config, FavoritesStore, HttpProductSource, Product, ProductId,
    ProductQueries, ProductQuery, ProductSource, Route, SortOrder,
};
use storefront_tui::App;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "storefront")]
#[command(version, about = "Browse a product catalog from the terminal", long_about = None)]
struct Cli {
    /// Catalog root URL, e.g. https://fakestoreapi.com
    #[arg(long, global = true, env = "STOREFRONT_BASE_URL")]
    base_url: Option<String>,

    /// Override how long search input must settle before filtering
    #[arg(long, global = true)]
    debounce_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List products, optionally filtered and sorted
    Products {
        /// Match against title, description and category
        #[arg(long)]
        search: Option<String>,
        /// men's clothing, women's clothing, jewelery or electronics
        #[arg(long)]
        category: Option<Category>,
        /// asc or desc by price
        #[arg(long)]
        sort: Option<SortOrder>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one product
    Show {
        /// Product id; anything that isn't one is simply not found
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.command.is_none());

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring config file: {}", e);
            Config::default().apply_env(|key| std::env::var(key).ok())
        }
    };
    if let Some(url) = cli.base_url.filter(|u| !u.trim().is_empty()) {
        config.api.base_url = Some(url);
    }
    if let Some(ms) = cli.debounce_ms {
        config.search.debounce_ms = ms;
    }

    let source = HttpProductSource::from_config(&config.api);
    if !source.is_configured() {
        tracing::warn!("No usable catalog URL; every fetch will fail until one is set");
    }

    match cli.command {
        Some(Commands::Products {
            search,
            category,
            sort,
            json,
        }) => {
            let mut query = ProductQuery::new().sort(sort.unwrap_or_default());
            if let Some(search) = search {
                query = query.search(search);
            }
            if let Some(category) = category {
                query = query.category(category);
            }
            tracing::info!("Listing products: {:?}", query);

            let products = source.fetch_products().await.context("Failed to load products")?;
            let visible = query::derive(Some(products.as_slice()), &query);

            if json {
                println!("{}", serde_json::to_string_pretty(&visible)?);
            } else if visible.is_empty() {
                println!("{}", storefront_core::views::NO_MATCHING_PRODUCTS);
            } else {
                for product in visible {
                    print_row(product);
                }
            }
        }
        Some(Commands::Show { id, json }) => {
            tracing::info!("Showing product: {}", id);
            let Some(id) = product_id(&id) else {
                println!("{}", storefront_core::views::PRODUCT_NOT_FOUND);
                return Ok(());
            };
            let product = source.fetch_product(id).await.context("Failed to load product")?;

            match product {
                Some(product) if json => println!("{}", serde_json::to_string_pretty(&product)?),
                Some(product) => print_details(&product),
                None => println!("{}", storefront_core::views::PRODUCT_NOT_FOUND),
            }
        }
        Some(Commands::Config { save }) => {
            if let Ok(path) = Config::config_path() {
                println!("# {}", path.display());
            }
            if save {
                config.save()?;
                tracing::info!("Configuration saved");
            }
            print!("{}", config.to_toml()?);
        }
        None => {
            let queries = Arc::new(ProductQueries::new(Arc::new(source)));
            let app = App::new(queries, FavoritesStore::new(), config.search.debounce());
            storefront_tui::run_tui(app, config.ui.tick_rate()).await?;
        }
    }

    Ok(())
}

/// Same rule as a `/products/{id}` route: an id that doesn't parse is not found
fn product_id(raw: &str) -> Option<ProductId> {
    Route::ProductDetails(raw.to_string()).product_id()
}

/// stderr normally; a log file while the TUI has the screen
fn init_logging(tui: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront=info".into());

    let log_file = if tui { open_log_file() } else { None };

    match log_file {
        Some(file) => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
            .init(),
        None => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::cache_dir()?.join("storefront");
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("storefront.log"))
        .ok()
}

fn print_row(product: &Product) {
    println!(
        "{:>4}  {:>10}  {:<18}  {}",
        product.id.0,
        product.price.to_string(),
        product.category.as_deref().unwrap_or("-"),
        product.title
    );
}

fn print_details(product: &Product) {
    println!("{}", product.title);
    println!("  Price:     {}", product.price);
    println!("  Category:  {}", product.category.as_deref().unwrap_or("-"));
    if let Some(rating) = product.rating {
        println!("  Rating:    {} ({} reviews)", rating.stars().render(), rating.count);
    }
    if let Some(description) = &product.description {
        println!();
        println!("{}", description);
    }
}
