//! Multisig Ledger CLI Application
//!
//! A command-line interface for administering a multisig ledger.

use clap::{Parser, Subcommand};
use multisig_ledger::api::{create_router, ApiState};
use multisig_ledger::cli::{self, AppState};
use multisig_ledger::storage::{DataDirLock, Storage};
use std::path::Path;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multisig")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "An M-of-N multisig transaction ledger in Rust", long_about = None)]
struct Cli {
    /// Data directory for ledger storage
    #[arg(short, long, default_value = ".multisig_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new ledger
    Init {
        /// Owner addresses (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        owners: Vec<String>,

        /// Confirmations required to execute
        #[arg(short, long)]
        required: usize,

        /// Replace an existing ledger
        #[arg(long)]
        force: bool,
    },

    /// Owner key operations
    Key {
        #[command(subcommand)]
        action: KeyCommands,
    },

    /// Deposit native funds into the wallet
    Fund {
        /// Depositor's address
        #[arg(short, long)]
        from: String,

        /// Amount in whole coins, e.g. 0.5
        #[arg(short, long)]
        amount: String,
    },

    /// Propose a transaction
    Submit {
        /// Submitting owner's address
        #[arg(short, long)]
        from: String,

        /// Destination address
        #[arg(short, long)]
        to: String,

        /// Value in whole coins
        #[arg(short, long, default_value = "0")]
        value: String,

        /// Hex call payload
        #[arg(long)]
        data: Option<String>,
    },

    /// Confirm a transaction
    Confirm {
        /// Confirming owner's address
        #[arg(short, long)]
        from: String,

        /// Transaction index
        #[arg(short, long)]
        index: usize,
    },

    /// Revoke a confirmation
    Revoke {
        /// Revoking owner's address
        #[arg(short, long)]
        from: String,

        /// Transaction index
        #[arg(short, long)]
        index: usize,
    },

    /// Show a transaction
    Show {
        /// Transaction index
        #[arg(short, long)]
        index: usize,
    },

    /// List pending transactions
    Pending,

    /// Display ledger information
    Status,

    /// Show the audit log
    Events {
        /// Number of events to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Restore the ledger from a backup
    Restore {
        /// Backup number, 0 is the most recent
        #[arg(short, long, default_value = "0")]
        backup: usize,
    },

    /// REST API server
    Api {
        #[command(subcommand)]
        action: ApiCommands,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Create a new owner key
    New {
        /// Optional label for the key
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Import an owner key from its hex private key
    Import {
        #[arg(short, long)]
        private_key: String,

        #[arg(short, long)]
        label: Option<String>,
    },

    /// List all owner keys
    List,
}

#[derive(Subcommand)]
enum ApiCommands {
    /// Start the REST API server
    Start {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that run before a ledger exists
    match &cli.command {
        Commands::Init {
            owners,
            required,
            force,
        } => return cli::cmd_init(&cli.data_dir, owners, *required, *force),
        Commands::Key { action } => return run_key_command(action, &cli.data_dir),
        Commands::Api { action } => return run_api_command(action, &cli.data_dir),
        _ => {}
    }

    // Inspection commands leave the data directory unlocked
    let read_only = matches!(
        cli.command,
        Commands::Show { .. } | Commands::Pending | Commands::Status | Commands::Events { .. }
    );
    let mut state = if read_only {
        AppState::read_only(cli.data_dir.clone())?
    } else {
        AppState::new(cli.data_dir.clone())?
    };

    // Process commands
    match cli.command {
        Commands::Init { .. } | Commands::Key { .. } | Commands::Api { .. } => unreachable!(),

        Commands::Fund { from, amount } => {
            cli::cmd_fund(&mut state, &from, &amount)?;
        }

        Commands::Submit {
            from,
            to,
            value,
            data,
        } => {
            cli::cmd_submit(&mut state, &from, &to, &value, data.as_deref())?;
        }

        Commands::Confirm { from, index } => {
            cli::cmd_confirm(&mut state, &from, index)?;
        }

        Commands::Revoke { from, index } => {
            cli::cmd_revoke(&mut state, &from, index)?;
        }

        Commands::Show { index } => {
            cli::cmd_show(&state, index)?;
        }

        Commands::Pending => {
            cli::cmd_pending(&state)?;
        }

        Commands::Status => {
            cli::cmd_status(&state)?;
        }

        Commands::Events { limit } => {
            cli::cmd_events(&state, limit)?;
        }

        Commands::Restore { backup } => {
            cli::cmd_restore(&mut state, backup)?;
        }
    }

    Ok(())
}

fn run_key_command(action: &KeyCommands, data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let keystore = cli::open_keystore(data_dir)?;

    match action {
        KeyCommands::New { label } => cli::cmd_key_new(&keystore, label.as_deref()),
        KeyCommands::Import { private_key, label } => {
            cli::cmd_key_import(&keystore, private_key, label.as_deref())
        }
        KeyCommands::List => cli::cmd_key_list(&keystore),
    }
}

fn run_api_command(action: &ApiCommands, data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        match action {
            ApiCommands::Start { port } => {
                // CLI commands that write the ledger fail while the server runs
                let lock = DataDirLock::acquire(data_dir)?;
                let storage = Storage::in_dir(data_dir)?;

                if !storage.exists() {
                    return Err(format!(
                        "No ledger found in {:?}. Create one with: multisig init",
                        data_dir
                    )
                    .into());
                }

                println!("📂 Loading ledger...");
                let wallet = storage.load()?;
                println!(
                    "   {} wallet at {}",
                    wallet.ledger.owner_set().description(),
                    wallet.address()
                );

                // Create API state
                let state = ApiState::new(wallet, storage);

                // Clone state for shutdown handler
                let shutdown_state = state.clone();

                // Create router
                let app = create_router(state);

                // Start server
                let addr = format!("0.0.0.0:{}", port);
                println!("🚀 REST API server starting on http://localhost:{}", port);

                println!();
                println!("📖 Available endpoints:");
                println!("   GET  /health                                 - Health check");
                println!("   GET  /api/ledger                             - Ledger info");
                println!("   GET  /api/events                             - Audit log");
                println!("   POST /api/deposit                            - Fund the wallet");
                println!("   GET  /api/transactions                       - List transactions");
                println!("   GET  /api/transactions/pending               - Pending transactions");
                println!("   GET  /api/transactions/{{index}}               - Get transaction");
                println!("   GET  /api/transactions/{{index}}/confirmations - Confirming owners");
                println!("   POST /api/transactions                       - Submit (signed)");
                println!("   POST /api/transactions/{{index}}/confirm       - Confirm (signed)");
                println!("   POST /api/transactions/{{index}}/revoke        - Revoke (signed)");
                println!();

                // Handle Ctrl+C with graceful shutdown
                tokio::spawn(async move {
                    tokio::signal::ctrl_c().await.ok();
                    println!("\n📴 Shutting down API server...");

                    // Save before exit
                    println!("💾 Saving data...");
                    let wallet = shutdown_state.wallet.read().await;
                    match shutdown_state.storage.save(&wallet) {
                        Ok(()) => println!("✅ Data saved successfully!"),
                        Err(e) => log::error!("Failed to save ledger on shutdown: {}", e),
                    }
                    drop(lock);
                    std::process::exit(0);
                });

                let listener = tokio::net::TcpListener::bind(&addr).await?;
                axum::serve(listener, app).await?;
            }
        }

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}
