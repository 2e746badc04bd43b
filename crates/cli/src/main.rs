//! Meridian CLI - a terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! meridian products list --sort price_asc --search mug --page 2
//!
//! # Inspect one product
//! meridian products show 0195c7a2-...
//!
//! # Show the category tree
//! meridian categories
//!
//! # Manage the cart (session persists via the API's cookie)
//! meridian cart show
//! meridian cart add 0195c7a2-... --quantity 2
//! meridian cart update 0195d001-... 3
//! meridian cart remove 0195d001-...
//! meridian cart clear --yes
//! ```
//!
//! Configuration comes from the environment (`MERIDIAN_API_URL` at minimum);
//! a `.env` file is honored.

#![cfg_attr(not(test), forbid(unsafe_code))]
// A CLI talks on stdout.
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use meridian_core::ProductSort;
use meridian_storefront::config::ClientConfig;
use meridian_storefront::state::Storefront;

mod commands;

#[derive(Parser)]
#[command(name = "meridian")]
#[command(author, version, about = "Meridian terminal storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Show the category tree
    Categories,
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products with filters and pagination
    List {
        /// Page to show
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Results per page
        #[arg(long, default_value_t = 12)]
        per_page: u32,

        /// Sort order
        #[arg(short, long, value_enum, default_value_t = SortArg::CreatedAtDesc)]
        sort: SortArg,

        /// Filter by category id
        #[arg(short, long)]
        category: Option<Uuid>,

        /// Full-text search
        #[arg(short = 'q', long)]
        search: Option<String>,
    },
    /// Show one product
    Show {
        /// Product id
        id: Uuid,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product to the cart
    Add {
        /// Product id
        product_id: Uuid,

        /// Variant id (defaults to the base product)
        #[arg(short, long)]
        variant: Option<Uuid>,

        /// Quantity to add
        #[arg(short = 'n', long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a cart line's quantity
    Update {
        /// Cart item id
        item_id: Uuid,

        /// New quantity
        quantity: u32,
    },
    /// Remove a cart line
    Remove {
        /// Cart item id
        item_id: Uuid,
    },
    /// Empty the cart
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Sort order as a CLI flag, mapped onto the API's wire values.
#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    PriceAsc,
    PriceDesc,
    CreatedAtDesc,
    NameAsc,
}

impl From<SortArg> for ProductSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::PriceAsc => Self::PriceAsc,
            SortArg::PriceDesc => Self::PriceDesc,
            SortArg::CreatedAtDesc => Self::CreatedAtDesc,
            SortArg::NameAsc => Self::NameAsc,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let storefront = Storefront::new(config)?;

    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List {
                page,
                per_page,
                sort,
                category,
                search,
            } => {
                commands::catalog::list(
                    &storefront,
                    page,
                    per_page,
                    sort.into(),
                    category,
                    search.as_deref(),
                )
                .await?;
            }
            ProductsAction::Show { id } => commands::catalog::show(&storefront, id).await?,
        },
        Commands::Categories => commands::catalog::categories(&storefront).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&storefront).await?,
            CartAction::Add {
                product_id,
                variant,
                quantity,
            } => commands::cart::add(&storefront, product_id, variant, quantity).await?,
            CartAction::Update { item_id, quantity } => {
                commands::cart::update(&storefront, item_id, quantity).await?;
            }
            CartAction::Remove { item_id } => commands::cart::remove(&storefront, item_id).await?,
            CartAction::Clear { yes } => commands::cart::clear(&storefront, yes).await?,
        },
    }
    Ok(())
}
