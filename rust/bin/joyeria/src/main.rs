//! `joyeria`, the admin client for the jewelry-order backend.
//!
//! Log in, then work the order dashboard and the vendor/client screens of
//! your role from the terminal.

mod commands;
mod config;

use std::io::Write;

use clap::{Parser, Subcommand};
use joyeria_auth::View;
use joyeria_orders::{OrderAction, Tab};
use joyeria_types::{OrderStatus, Role};

use commands::users::UserFields;
use commands::App;

/// Joyería admin CLI.
#[derive(Parser, Debug)]
#[command(name = "joyeria", about = "Joyería admin client", version)]
struct Cli {
    /// Path to client config file (default: ~/.joyeria/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Backend URL for this invocation (overrides the config file).
    #[arg(long = "server", global = true)]
    server: Option<String>,

    /// Output format: table or json.
    #[arg(long = "output", short = 'o', global = true, default_value = "table")]
    output: String,

    /// Log debug output to stderr.
    #[arg(long = "verbose", short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and store the session.
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Password (prefer the interactive prompt).
        #[arg(long)]
        password: Option<String>,
    },

    /// Clear the stored session.
    Logout,

    /// Show the logged-in profile.
    Whoami,

    /// Client configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Orders ("pedidos") on your dashboard.
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },

    /// All accounts (admin).
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Your clients (vendor).
    Clients {
        #[command(subcommand)]
        action: ClientsAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write settings to the config file (`--server` sets the backend URL).
    Set {
        #[arg(long)]
        session_path: Option<String>,
    },
    /// Print the effective settings.
    Show,
}

#[derive(Subcommand, Debug)]
enum OrdersAction {
    /// List one tab of the dashboard.
    List {
        /// solicitado, descargado, capturado or historial.
        #[arg(long)]
        tab: Option<Tab>,
        /// Only this client's orders (admin).
        #[arg(long)]
        client: Option<String>,
    },
    /// Mark a requested order as downloaded.
    Download { id: String },
    /// Mark a downloaded order as captured.
    Capture { id: String },
    /// Set any status (admin).
    SetStatus { id: String, estado: OrderStatus },
    /// Flag an order as cancelled (admin).
    Cancel { id: String },
    /// Clear the cancelled flag (admin).
    Reactivate { id: String },
    /// Delete an order (admin).
    Delete {
        id: String,
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum UsersAction {
    List {
        /// Only accounts with this role.
        #[arg(long)]
        role: Option<Role>,
    },
    Get { id: String },
    /// List the clients of one vendor.
    Clients { vendor_id: String },
    Create {
        #[command(flatten)]
        fields: UserFields,
    },
    Update {
        id: String,
        #[command(flatten)]
        fields: UserFields,
    },
    Delete {
        id: String,
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ClientsAction {
    List,
    Get { id: String },
    Create {
        #[command(flatten)]
        fields: UserFields,
    },
    Update {
        id: String,
        #[command(flatten)]
        fields: UserFields,
    },
    Delete {
        id: String,
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::ClientConfig::default_path);
    let server = cli.server.as_deref();

    if let Commands::Config { action } = &cli.command {
        return match action {
            ConfigAction::Set { session_path } => {
                commands::config::set(server, session_path.as_deref(), &config_path)
            }
            ConfigAction::Show => commands::config::show(server, &config_path),
        };
    }

    let app = App::open(&config_path, server, cli.output == "json")?;
    run(&app, cli.command).await.map_err(commands::explain)
}

async fn run(app: &App, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { email, password } => {
            let email = match email {
                Some(e) => e,
                None => {
                    eprint!("Email: ");
                    std::io::stderr().flush()?;
                    let mut s = String::new();
                    std::io::stdin().read_line(&mut s)?;
                    s.trim().to_string()
                }
            };
            let password = match password {
                Some(p) => p,
                None => rpassword::prompt_password("Password: ")?,
            };
            commands::session::login(app, &email, &password).await?;
        }

        Commands::Logout => commands::session::logout(app)?,

        Commands::Whoami => commands::session::whoami(app)?,

        Commands::Config { .. } => {}

        Commands::Orders { action } => {
            use commands::orders;
            let (order_action, id, yes) = match action {
                OrdersAction::List { tab, client } => return orders::list(app, tab, client).await,
                OrdersAction::Download { id } => (OrderAction::Download, id, false),
                OrdersAction::Capture { id } => (OrderAction::Capture, id, false),
                OrdersAction::SetStatus { id, estado } => (OrderAction::SetStatus(estado), id, false),
                OrdersAction::Cancel { id } => (OrderAction::Cancel, id, false),
                OrdersAction::Reactivate { id } => (OrderAction::Reactivate, id, false),
                OrdersAction::Delete { id, yes } => (OrderAction::Delete, id, yes),
            };
            orders::apply(app, order_action, &id, yes).await?;
        }

        Commands::Users { action } => {
            use commands::users;
            let view = View::AdminUsers;
            match action {
                UsersAction::List { role } => users::list(app, view, role).await?,
                UsersAction::Get { id } => users::get(app, view, &id).await?,
                UsersAction::Clients { vendor_id } => users::clients_of(app, &vendor_id).await?,
                UsersAction::Create { fields } => users::create(app, view, fields).await?,
                UsersAction::Update { id, fields } => users::update(app, view, &id, fields).await?,
                UsersAction::Delete { id, yes } => users::delete(app, view, &id, yes).await?,
            }
        }

        Commands::Clients { action } => {
            use commands::users;
            let view = View::VendorClients;
            match action {
                ClientsAction::List => users::list(app, view, None).await?,
                ClientsAction::Get { id } => users::get(app, view, &id).await?,
                ClientsAction::Create { fields } => users::create(app, view, fields).await?,
                ClientsAction::Update { id, fields } => users::update(app, view, &id, fields).await?,
                ClientsAction::Delete { id, yes } => users::delete(app, view, &id, yes).await?,
            }
        }
    }
    Ok(())
}
