//! Catalog console CLI - terminal companion to the web console.
//!
//! # Usage
//!
//! ```bash
//! # Store the auth key used as the bearer token
//! cc-cli login <key>
//!
//! # Show whether a token is stored and which API is configured
//! cc-cli status
//!
//! # List the second page of products, most expensive first
//! cc-cli products list --sort cost --direction desc --page 1
//!
//! # Delete a product without the confirmation prompt
//! cc-cli products delete 42 --yes
//! ```
//!
//! # Environment Variables
//!
//! Same as the web console: `PRODUCT_API_URL` is required, the token lives
//! at `CONSOLE_TOKEN_PATH`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cc-cli")]
#[command(author, version, about = "Catalog console CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store an auth key as the bearer token
    Login {
        /// Opaque auth key
        key: String,
    },
    /// Forget the stored token
    Logout,
    /// Show login state and the configured API
    Status,
    /// Work with products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List one page of products
    List {
        /// Sort column (`id`, `sku`, `name`, `cost`)
        #[arg(short, long)]
        sort: Option<String>,

        /// Sort direction (`asc`, `desc`)
        #[arg(short, long, default_value = "asc")]
        direction: String,

        /// Zero-based page index
        #[arg(short, long, default_value_t = 0)]
        page: usize,

        /// Rows per page (defaults to `CONSOLE_PAGE_SIZE`)
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Delete a product after confirmation
    Delete {
        /// Product ID
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_console_cli=info,catalog_console_admin=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let state = commands::load_state()?;

    match cli.command {
        Commands::Login { key } => commands::auth::login(&state, &key)?,
        Commands::Logout => commands::auth::logout(&state)?,
        Commands::Status => commands::auth::status(&state),
        Commands::Products { action } => match action {
            ProductsAction::List {
                sort,
                direction,
                page,
                page_size,
            } => {
                let options = commands::products::ListOptions {
                    sort,
                    direction,
                    page,
                    page_size,
                };
                commands::products::list(&state, &options).await?;
            }
            ProductsAction::Delete { id, yes } => {
                commands::products::delete(&state, id, yes).await?;
            }
        },
    }

    commands::flush_toasts(&state);
    state.products().destroy();
    Ok(())
}
