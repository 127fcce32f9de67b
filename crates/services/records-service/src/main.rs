//! Records Service - command line entry point.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use common::AppResult;
use domain::{AccountResponse, SignupRequest};
use records_service_lib::config::RecordsServiceConfig;
use records_service_lib::infra::Database;
use records_service_lib::repository::Repository;
use records_service_lib::service::CredentialService;
use records_service_lib::Records;

#[derive(Parser)]
#[command(name = "records-service")]
#[command(about = "Campus records accounts and data access")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing tables and indexes
    InitSchema,
    /// Create an account
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long, env = "RECORDS_SIGNUP_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// User type id (see `user-types`)
        #[arg(long)]
        user_type: Option<i32>,
        /// Create the account deactivated
        #[arg(long)]
        inactive: bool,
    },
    /// Check a username/password pair
    Verify {
        #[arg(long)]
        username: String,
        #[arg(long, env = "RECORDS_VERIFY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List accounts (without secrets) as JSON lines
    Accounts,
    /// List user types as `id<TAB>name`
    UserTypes,
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = RecordsServiceConfig::from_env();
    init_tracing(cli.verbose, &config.service.log_level);

    if let Err(e) = run(cli.command, config).await {
        tracing::error!(code = e.code(), "Command failed: {}", e);
        eprintln!("error: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: RecordsServiceConfig) -> AppResult<()> {
    match command {
        Commands::InitSchema => {
            let db = Database::connect_without_schema(&config.database).await?;
            db.ping().await?;
            db.ensure_schema().await?;
            println!("schema ready");
        }
        Commands::Signup {
            username,
            password,
            user_type,
            inactive,
        } => {
            let records = Records::connect(&config).await?;
            let mut request = SignupRequest::new(username, password);
            request.user_type_id = user_type;
            request.is_active = !inactive;

            let account = records.credentials.create_account(Some(request)).await?;
            print_json(&AccountResponse::from(account));
        }
        Commands::Verify { username, password } => {
            let records = Records::connect(&config).await?;
            let account = records
                .credentials
                .verify_password(&username, &password)
                .await?;
            print_json(&AccountResponse::from(account));
        }
        Commands::Accounts => {
            let records = Records::connect(&config).await?;
            for model in records.accounts.get_all().await? {
                print_json(&AccountResponse::from(domain::Account::from(model)));
            }
        }
        Commands::UserTypes => {
            let records = Records::connect(&config).await?;
            for user_type in records.user_types.get_all().await? {
                println!("{}\t{}", user_type.id, user_type.name);
            }
        }
    }

    Ok(())
}

fn print_json(response: &AccountResponse) {
    match serde_json::to_string(response) {
        Ok(line) => println!("{}", line),
        Err(e) => tracing::error!("Failed to encode account: {}", e),
    }
}

/// Initialize tracing subscriber
fn init_tracing(verbose: bool, default_level: &str) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
