//! Refill CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the document tables
//! refill-cli migrate
//!
//! # Give an existing account the admin role
//! refill-cli admin promote -e owner@refill.ph
//!
//! # Add a subscription plan to the catalogue
//! refill-cli plan create -n Family -g 5 -p 22.50 -m 2 -b 50
//!
//! # Add a product for one-time orders
//! refill-cli product create -n "Round gallon" -p 35.50
//! ```
//!
//! All commands read `REFILL_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "refill-cli")]
#[command(author, version, about = "Refill CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage subscription plans
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },
    /// Manage products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant the admin role to a registered account
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum PlanAction {
    /// Create an admin-defined plan
    Create {
        /// Plan name shown to customers
        #[arg(short, long)]
        name: String,

        /// Gallons delivered each week
        #[arg(short, long)]
        gallons_per_week: u32,

        /// Price per gallon in pesos (e.g. 22.50)
        #[arg(short, long)]
        price_per_gallon: Decimal,

        /// Duration in months
        #[arg(short, long)]
        months: u32,

        /// Loyalty points attached to the plan
        #[arg(short, long, default_value_t = 0)]
        bonus_points: u64,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Create a product for one-time orders
    Create {
        /// Product name
        #[arg(short, long)]
        name: String,

        /// Unit price in pesos
        #[arg(short, long)]
        price: Decimal,

        /// Optional image URL
        #[arg(short, long)]
        image_url: Option<String>,
    },
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
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Promote { email } => commands::admin::promote(&email).await?,
        },
        Commands::Plan { action } => match action {
            PlanAction::Create {
                name,
                gallons_per_week,
                price_per_gallon,
                months,
                bonus_points,
            } => {
                commands::catalogue::create_plan(
                    name,
                    gallons_per_week,
                    price_per_gallon,
                    months,
                    bonus_points,
                )
                .await?;
            }
        },
        Commands::Product { action } => match action {
            ProductAction::Create {
                name,
                price,
                image_url,
            } => commands::catalogue::create_product(name, price, image_url).await?,
        },
    }
    Ok(())
}
