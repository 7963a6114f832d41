use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use verimail::{Verimail, VerimailBuilder, VerimailConfig};

const PURGE_INTERVAL: Duration = Duration::from_secs(600);

/// Command line interface for Verimail
///
/// Configuration is read from the environment (`BASE_URL`,
/// `VERIMAIL_STORE_URL`, `GOOGLE_SERVICE_ACCOUNT_CREDENTIALS`, `SHEET_ID`,
/// `MAILER_*`, ...).
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command to execute (default: serve)
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available CLI commands
#[derive(clap::Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "VERIMAIL_BIND", default_value = "0.0.0.0:3000")]
        bind: SocketAddr,

        /// Log confirmation links instead of emailing them
        #[arg(long)]
        no_mail: bool,
    },
    /// Run database migrations
    Migrate,
    /// Issue a confirmation link and print it
    Issue {
        /// Address to confirm
        email: String,
    },
    /// Remove expired codes
    Purge,
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve {
        bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
        no_mail: false,
    });

    match command {
        Commands::Serve { bind, no_mail } => {
            let verimail = Arc::new(builder(!no_mail)?.build().await?);
            serve(verimail, bind).await?;
        }
        Commands::Migrate => {
            println!("Running migrations...");
            one_shot()?.build().await?;
        }
        Commands::Issue { email } => {
            let verimail = one_shot()?.build().await?;
            let link = verimail.issue_link(&email).await?;
            println!("{}", link.url);
        }
        Commands::Purge => {
            let verimail = one_shot()?.build().await?;
            let removed = verimail.purge_expired().await?;
            println!("Removed {removed} expired codes");
        }
        Commands::Version => {
            println!("Verimail v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn builder(with_mail: bool) -> Result<VerimailBuilder, Box<dyn std::error::Error>> {
    let builder = VerimailBuilder::new(VerimailConfig::from_env()?).apply_migrations(true);

    #[cfg(feature = "mailer")]
    let builder = if with_mail {
        builder.with_mailer_config(verimail::MailerConfig::from_env())
    } else {
        builder
    };
    #[cfg(not(feature = "mailer"))]
    let _ = with_mail;

    Ok(builder)
}

/// Builder for commands that exit straight away and so need codes to persist
fn one_shot() -> Result<VerimailBuilder, Box<dyn std::error::Error>> {
    Ok(builder(false)?.require_persistent_store(true))
}

async fn serve(verimail: Arc<Verimail>, bind: SocketAddr) -> std::io::Result<()> {
    let housekeeping = {
        let verimail = verimail.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PURGE_INTERVAL);
            loop {
                interval.tick().await;
                if let Err(e) = verimail.purge_expired().await {
                    tracing::warn!(error = %e, "Failed to purge expired codes");
                }
            }
        })
    };

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(%bind, "Verimail listening");

    let result = axum::serve(listener, verimail.router())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await;

    housekeeping.abort();
    result
}
