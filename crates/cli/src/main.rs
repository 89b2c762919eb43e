//! Tidemark CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply every migration in `migrations/`
//! tidemark migrate
//!
//! # Create an admin user
//! tidemark admin create -e admin@example.com -n "Admin Name" -r super_admin -p '<password>'
//!
//! # Load demo catalog, orders and refunds
//! tidemark seed --file demo/seed.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tidemark")]
#[command(author, version, about = "Tidemark CLI tools")]
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
    /// Seed the database with demo data
    Seed {
        /// YAML file describing the demo data
        #[arg(short, long, default_value = "demo/seed.yaml")]
        file: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin`, `admin`, `viewer`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Login password (min 8 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
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
            AdminAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::admin::create_user(&email, &name, &role, &password).await?;
            }
        },
        Commands::Seed { file } => commands::seed::run(&file).await?,
    }
    Ok(())
}
