//! Command-line storefront client for Cellar
//! Every subcommand maps to one client operation; exit status is non-zero
//! when the operation's code is negative.

mod render;

use anyhow::{Context, Result};
use cellar_client::{ClientConfig, ConnectionMode, LoginOutcome, Storefront};
use cellar_core::{User, Wine};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// CLI argument parser
#[derive(Parser, Debug)]
#[command(name = "cellar")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Browse the cellar, fill a cart and place orders", long_about = None)]
struct Args {
    /// Server address
    #[arg(short, long, global = true, default_value = "127.0.0.1:4316")]
    server: String,

    /// Connect and read timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Reuse one connection for all requests
    #[arg(long, global = true, default_value_t = false)]
    persistent: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(clap::Args, Debug)]
struct Credentials {
    #[arg(short, long)]
    email: String,
    #[arg(short, long)]
    password: String,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Enter as guest
    Guest,
    /// Log in and print the resolved account
    Login(Credentials),
    /// List the whole catalog
    Wines,
    /// Search by name fragment and year
    Search {
        #[arg(short, long, default_value = "")]
        name: String,
        #[arg(short, long, default_value = "")]
        year: String,
    },
    /// Show the cart
    Cart(Credentials),
    /// Add bottles to the cart
    Add {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(short, long)]
        wine: u32,
        /// Taken as text so malformed numbers are reported, not rejected by the parser
        #[arg(short, long, allow_hyphen_values = true)]
        quantity: String,
    },
    /// Remove a wine from the cart
    Remove {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(short, long)]
        wine: u32,
    },
    /// Submit the cart as an order
    Buy(Credentials),
    /// Show order history
    Orders(Credentials),
    /// Log in, add one wine and submit in one go
    Purchase {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(short, long)]
        wine: u32,
        #[arg(short, long, allow_hyphen_values = true)]
        quantity: i64,
    },
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::with_addr(self.server.clone());
        if let Some(secs) = self.timeout_secs {
            let timeout = Duration::from_secs(secs);
            config = config.with_timeouts(timeout, timeout);
        }
        if self.persistent {
            config = config.with_mode(ConnectionMode::Persistent);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    setup_logging(&args.log_level)?;

    let shop = Storefront::connect(args.client_config());
    let code = run(&shop, args.command).await?;

    Ok(if code < 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Execute one subcommand, returning its caller-facing code
async fn run(shop: &Storefront, command: Cmd) -> Result<i32> {
    match command {
        Cmd::Guest => {
            let guest = shop.session.guest_login().await.context("Guest login failed")?;
            println!("{}", render::actor(&guest));
            Ok(guest.level())
        }
        Cmd::Login(credentials) => {
            let outcome = shop.session.login(&credentials.email, &credentials.password).await;
            match outcome.user() {
                Some(user) => println!("{}", render::actor(user)),
                None => println!("login failed: {:?}", outcome),
            }
            Ok(outcome.code())
        }
        Cmd::Wines => {
            let wines = shop.catalog.list_catalog().await.context("Failed to fetch catalog")?;
            print!("{}", render::wines(&wines));
            Ok(0)
        }
        Cmd::Search { name, year } => {
            let found = shop.catalog.search(&name, &year).await.context("Search failed")?;
            print!("{}", render::wines(&found));
            Ok(0)
        }
        Cmd::Cart(credentials) => {
            let user = authenticate(shop, &credentials).await?;
            let cart = shop.catalog.list_cart(&user).await.context("Failed to fetch cart")?;
            print!("{}", render::wines(&cart));
            Ok(0)
        }
        Cmd::Add {
            credentials,
            wine,
            quantity,
        } => {
            let user = authenticate(shop, &credentials).await?;
            let outcome = shop
                .catalog
                .add_to_cart_input(&user, &Wine::with_id(wine), &quantity)
                .await;
            println!("{:?} (code {})", outcome, outcome.code());
            Ok(outcome.code())
        }
        Cmd::Remove { credentials, wine } => {
            let user = authenticate(shop, &credentials).await?;
            let removed = shop
                .catalog
                .remove_from_cart(&user, &Wine::with_id(wine))
                .await
                .context("Failed to remove from cart")?;
            println!("{}", if removed { "removed" } else { "not in cart" });
            Ok(if removed { 0 } else { -1 })
        }
        Cmd::Buy(credentials) => {
            let user = authenticate(shop, &credentials).await?;
            let outcome = shop.checkout.submit_order(&user).await;
            match &outcome {
                cellar_client::SubmitOutcome::Placed(order) => print!("{}", render::order(order)),
                other => println!("order not placed: {:?}", other),
            }
            Ok(outcome.code())
        }
        Cmd::Orders(credentials) => {
            let user = authenticate(shop, &credentials).await?;
            let orders = shop.catalog.list_orders(&user).await.context("Failed to fetch orders")?;
            print!("{}", render::orders(&orders));
            Ok(0)
        }
        Cmd::Purchase {
            credentials,
            wine,
            quantity,
        } => {
            let verdict = shop
                .purchase(
                    &credentials.email,
                    &credentials.password,
                    &Wine::with_id(wine),
                    quantity,
                )
                .await;
            println!("{}", verdict);
            Ok(if verdict.is_success() { 0 } else { -1 })
        }
    }
}

/// Log in; negative login codes abort the command
async fn authenticate(shop: &Storefront, credentials: &Credentials) -> Result<User> {
    match shop.session.login(&credentials.email, &credentials.password).await {
        LoginOutcome::Success(user) => Ok(user),
        other => anyhow::bail!("Login failed: {:?} (code {})", other, other.code()),
    }
}

/// Setup logging with tracing
fn setup_logging(level: &str) -> Result<()> {
    let log_level = level.parse::<Level>().unwrap_or(Level::WARN);

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}
