use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;

use bookd::cli::{self, AvailArgs, BookArgs, OutputFormat};
use bookd::config::EngineSettings;
use bookd::models::{ModeParams, UpdateBookingBody};

#[derive(Parser)]
#[command(name = "bookd")]
#[command(about = "Appointment availability and booking engine", version)]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Mode-specific requirements shared by `avail` and `book`
#[derive(Args)]
struct ModeArgs {
    /// Staff member (staff modes)
    #[arg(long)]
    staff: Option<String>,
    /// Resource type (resource modes; defaults to the service's only one)
    #[arg(long)]
    resource_type: Option<String>,
    /// Units of the resource type (default 1)
    #[arg(long)]
    quantity: Option<u32>,
}

impl From<ModeArgs> for ModeParams {
    fn from(args: ModeArgs) -> Self {
        ModeParams {
            staff_id: args.staff,
            resource_type_id: args.resource_type,
            quantity: args.quantity,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List bookable slots for a service
    Avail {
        #[arg(long)]
        business: String,
        #[arg(long)]
        service: String,
        /// Window start (e.g., "2026-03-02T08:00" or RFC 3339)
        #[arg(long)]
        from: String,
        /// Window end
        #[arg(long)]
        to: String,
        /// Slot step in minutes (server default when omitted)
        #[arg(long)]
        interval: Option<u32>,
        #[command(flatten)]
        mode: ModeArgs,
        /// Skip slots overlapping this customer's bookings
        #[arg(long)]
        customer: Option<String>,
        /// Display timezone (e.g., "America/New_York")
        #[arg(long)]
        timezone: Option<String>,
    },
    /// Book a slot
    Book {
        #[arg(long)]
        customer: String,
        #[arg(long)]
        business: String,
        #[arg(long)]
        service: String,
        /// Start time (e.g., "2026-03-02T09:30")
        #[arg(long)]
        at: String,
        #[command(flatten)]
        mode: ModeArgs,
        #[arg(long)]
        notes: Option<String>,
        /// Refuse if the customer already has an overlapping booking
        #[arg(long)]
        no_overlap: bool,
    },
    /// Change a booking
    Update {
        #[arg(long)]
        booking: String,
        /// New start time
        #[arg(long)]
        at: Option<String>,
        /// New staff member
        #[arg(long)]
        staff: Option<String>,
        /// New status: confirmed, cancelled, or completed
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Refuse if the customer already has an overlapping booking
        #[arg(long)]
        no_overlap: bool,
    },
    /// Cancel a booking
    Cancel {
        #[arg(long)]
        booking: String,
    },
    /// Show a booking
    Show {
        #[arg(long)]
        booking: String,
    },
    /// Load a business definition into a local database
    Seed {
        /// Database file path
        #[arg(long, default_value = "./bookd.db")]
        db: String,
        /// Business definition (JSON)
        #[arg(long)]
        file: String,
    },
    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
        /// Database file path
        #[arg(long, default_value = "./bookd.db")]
        db: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set server URL
    Server {
        /// Server URL
        url: String,
    },
    /// Set the default display timezone
    Timezone {
        /// IANA zone name
        zone: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bookd=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                cli::run_config_show(format)?;
            }
            ConfigAction::Server { url } => {
                cli::run_config_server(&url, format)?;
            }
            ConfigAction::Timezone { zone } => {
                cli::run_config_timezone(&zone, format)?;
            }
        },
        Commands::Avail {
            business,
            service,
            from,
            to,
            interval,
            mode,
            customer,
            timezone,
        } => {
            let args = AvailArgs {
                business,
                service,
                from,
                to,
                interval,
                mode: mode.into(),
                customer,
                timezone,
            };
            cli::run_avail(args, format).await?;
        }
        Commands::Book {
            customer,
            business,
            service,
            at,
            mode,
            notes,
            no_overlap,
        } => {
            let args = BookArgs {
                customer,
                business,
                service,
                at,
                mode: mode.into(),
                notes,
                no_overlap,
            };
            cli::run_book(args, format).await?;
        }
        Commands::Update {
            booking,
            at,
            staff,
            status,
            notes,
            no_overlap,
        } => {
            let body = UpdateBookingBody {
                booking_time: at,
                staff_id: staff,
                status,
                notes,
                prevent_customer_overlap: no_overlap,
            };
            cli::run_update(&booking, body, format).await?;
        }
        Commands::Cancel { booking } => {
            cli::run_cancel(&booking, format).await?;
        }
        Commands::Show { booking } => {
            cli::run_show(&booking, format).await?;
        }
        Commands::Seed { db, file } => {
            cli::run_seed(&db, &file, format)?;
        }
        Commands::Serve { port, db } => {
            let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;
            bookd::server::run_server(addr, &db, EngineSettings::from_env()).await?;
        }
    }

    Ok(())
}
