//! fintrack CLI
//!
//! Command-line front end for the tracker backend:
//! - Log in and out, register
//! - Show the dashboard (optionally live) and analytics
//! - Manage transactions and the profile
//! - Change display preferences

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fintrack::screens::{self, account, auth, overview, profile, transactions, Action};
use fintrack::{
    AggregateFetcher, AggregateSource, AnalyticsView, ApiClient, ClientError, ClientResult,
    Config, Currency, DashboardView, FileCredentialStore, LocalStore, LoggingConfig, Notice,
    PollEvent, PollHandle, Preferences, Route, Theme, Transaction, TransactionInput,
    TransactionKind, ViewModel,
};

#[derive(Parser)]
#[command(name = "fintrack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Track expenses and income from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/fintrack/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend API root, overrides the config file
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session token
    Login {
        email: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account
    Register {
        username: String,
        email: String,
        #[arg(short, long)]
        password: Option<String>,
        /// Profile picture to upload
        #[arg(long)]
        photo: Option<PathBuf>,
    },

    /// End the session
    Logout,

    /// Totals, category breakdown and recent transactions
    Dashboard {
        /// Keep refreshing until interrupted
        #[arg(short, long)]
        watch: bool,
    },

    /// Income vs expenses and category shares
    Analytics,

    /// List transactions
    List {
        /// Only show one kind (expense, income)
        #[arg(short, long)]
        kind: Option<TransactionKind>,
    },

    /// Show one transaction
    Show { id: String },

    /// Add an expense or income entry
    Add {
        title: String,
        amount: f64,
        category: String,
        /// expense or income
        #[arg(short, long, default_value = "expense")]
        kind: TransactionKind,
        /// Date as YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Edit a transaction; omitted fields keep their current value
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(short, long)]
        kind: Option<TransactionKind>,
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a transaction
    Delete {
        id: String,
        /// Confirm without prompting
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the profile, or update it when any option is given
    Profile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        photo: Option<PathBuf>,
    },

    /// Permanently delete the account
    DeleteAccount {
        /// Confirmation text (prompted when omitted)
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Show or change display preferences
    Settings {
        #[arg(long)]
        theme: Option<Theme>,
        /// Switch between light and dark
        #[arg(long, conflicts_with = "theme")]
        toggle_theme: bool,
        /// Currency symbol or code (₹, $, €, £, ¥ / INR, USD, EUR, GBP, JPY)
        #[arg(long)]
        currency: Option<Currency>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match Config::load_with_env(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    init_logging(&config.logging);

    if let Err(e) = run(cli.command, config).await {
        match e.downcast_ref::<ClientError>() {
            Some(err) if screens::redirect_for(err) == Some(Route::Login) => {
                eprintln!("{}", err);
                eprintln!("Log in with: {}", route_hint(Route::Login));
            }
            _ => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fintrack={}", logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(command: Commands, config: Config) -> anyhow::Result<()> {
    let store = Arc::new(
        LocalStore::open(config.state_path())
            .with_context(|| format!("Failed to open {:?}", config.state_path()))?,
    );
    let prefs = Preferences::new(Arc::clone(&store));
    let session = Arc::new(FileCredentialStore::new(store));
    let client = Arc::new(ApiClient::new(config.client_config(), session)?);
    let currency = prefs.currency();

    match command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };
            announce(
                auth::login(&client, &email, &password).await,
                Action::Login,
                "Logged in successfully",
            )?;
        }

        Commands::Register {
            username,
            email,
            password,
            photo,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };
            let registration = auth::Registration {
                username,
                email,
                password,
                photo,
            };
            announce(
                auth::register(&client, &registration).await,
                Action::Register,
                "Registration successful!",
            )?;
        }

        Commands::Logout => {
            announce(auth::logout(&client).await, Action::Logout, "Logged out")?;
        }

        Commands::Dashboard { watch } => {
            let fetcher = Arc::new(AggregateFetcher::new(Arc::clone(&client)));
            if watch {
                watch_dashboard(fetcher, &config, currency).await?;
            } else {
                let dashboard = overview::load_dashboard(fetcher.as_ref()).await?;
                print_dashboard(&dashboard, currency);
            }
        }

        Commands::Analytics => {
            let fetcher = AggregateFetcher::new(Arc::clone(&client));
            let analytics = overview::load_analytics(&fetcher).await?;
            print_analytics(&analytics, currency);
        }

        Commands::List { kind } => {
            let mut items = transactions::list(&client).await?;
            if let Some(kind) = kind {
                items.retain(|tx| tx.kind() == kind);
            }
            print_transactions(&items, currency);
        }

        Commands::Show { id } => {
            let tx = transactions::get(&client, &id).await?;
            print_transaction(&tx, currency);
        }

        Commands::Add {
            title,
            amount,
            category,
            kind,
            date,
            description,
        } => {
            let input = TransactionInput {
                title,
                amount,
                kind,
                category,
                date: date.unwrap_or_else(|| chrono::Local::now().date_naive()),
                description,
            };
            let success = match kind {
                TransactionKind::Expense => "Expense added successfully!",
                TransactionKind::Income => "Income added successfully!",
            };
            announce(
                transactions::create(&client, &input).await,
                Action::CreateTransaction,
                success,
            )?;
        }

        Commands::Edit {
            id,
            title,
            amount,
            category,
            kind,
            date,
            description,
        } => {
            let current = transactions::get(&client, &id).await?;
            let date = date
                .or_else(|| current.day())
                .ok_or_else(|| anyhow!("Transaction {} has no readable date; pass --date", id))?;
            let input = TransactionInput {
                title: title.unwrap_or_else(|| current.title.clone()),
                amount: amount.unwrap_or_else(|| current.magnitude()),
                kind: kind.unwrap_or_else(|| current.kind()),
                category: category.unwrap_or_else(|| current.category.clone()),
                date,
                description: description.or_else(|| current.description.clone()),
            };
            announce(
                transactions::update(&client, &id, &input).await,
                Action::UpdateTransaction,
                "Transaction updated successfully!",
            )?;
        }

        Commands::Delete { id, yes } => {
            let confirmed = yes || {
                let answer = prompt("Are you sure you want to delete this transaction? [y/N] ")?;
                matches!(answer.trim(), "y" | "Y" | "yes")
            };
            announce(
                transactions::delete(&client, &id, confirmed).await,
                Action::DeleteTransaction,
                "Transaction deleted",
            )?;
        }

        Commands::Profile {
            username,
            password,
            photo,
        } => {
            if username.is_none() && password.is_none() && photo.is_none() {
                let current = profile::get(&client).await?;
                println!("Username: {}", current.username);
                println!("Email:    {}", current.email);
                if let Some(photo) = &current.photo {
                    println!("Photo:    {}", photo);
                }
            } else {
                let username = match username {
                    Some(u) => u,
                    None => profile::get(&client).await?.username,
                };
                let changes = profile::ProfileUpdate {
                    username,
                    password,
                    photo,
                };
                announce(
                    profile::update(&client, &changes).await,
                    Action::UpdateProfile,
                    "Profile updated successfully!",
                )?;
            }
        }

        Commands::DeleteAccount { confirm } => {
            let typed = match confirm {
                Some(c) => c,
                None => prompt(&format!(
                    "This cannot be undone. Type {} to confirm: ",
                    account::DELETE_CONFIRMATION
                ))?,
            };
            announce(
                account::delete(&client, &typed).await,
                Action::DeleteAccount,
                "Account deleted",
            )?;
        }

        Commands::Settings {
            theme,
            toggle_theme,
            currency,
        } => {
            if let Some(theme) = theme {
                prefs.set_theme(theme)?;
            } else if toggle_theme {
                prefs.toggle_theme()?;
            }
            if let Some(currency) = currency {
                prefs.set_currency(currency)?;
            }
            println!("Theme:    {}", prefs.theme());
            println!(
                "Currency: {} ({})",
                prefs.currency(),
                prefs.currency().code()
            );
        }

        Commands::Config { output } => {
            let content = fintrack::generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

/// Print the success text and where to go next; errors are reported by `main`
fn announce<T>(result: ClientResult<T>, action: Action, success: &str) -> ClientResult<T> {
    let notice = Notice::from_result(&result, success);
    if notice.is_success() {
        println!("{}", notice.message);
        if let Some(route) = screens::route_after(action) {
            println!("Next: {}", route_hint(route));
        }
    }
    result
}

fn route_hint(route: Route) -> &'static str {
    match route {
        Route::Login => "fintrack login <email>",
        Route::Register => "fintrack register <username> <email>",
        Route::Dashboard => "fintrack dashboard",
        Route::Expenses => "fintrack list",
    }
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn watch_dashboard(
    fetcher: Arc<AggregateFetcher>,
    config: &Config,
    currency: Currency,
) -> anyhow::Result<()> {
    let endpoints = DashboardView::endpoints();
    let view = Arc::new(RwLock::new(ViewModel::with_defaults(&endpoints)));
    let source: Arc<dyn AggregateSource> = fetcher;

    let (handle, mut events) =
        PollHandle::mount(source, endpoints, Arc::clone(&view), &config.poll_config());

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(PollEvent::Applied { .. }) => {
                    let dashboard = DashboardView::from_view(&*view.read().await);
                    print!("\x1b[2J\x1b[H");
                    print_dashboard(&dashboard, currency);
                    println!();
                    println!("Refreshing every {}s, Ctrl-C to stop", config.polling.interval_secs);
                }
                Some(PollEvent::Discarded { .. }) => {}
                Some(PollEvent::Unauthorized) | None => {
                    handle.unmount().await;
                    return Err(ClientError::Unauthorized.into());
                }
            },
            _ = tokio::signal::ctrl_c() => {
                handle.unmount().await;
                return Ok(());
            }
        }
    }
}

fn print_dashboard(dashboard: &DashboardView, currency: Currency) {
    println!("Welcome back, {}", dashboard.greeting_name());
    if let Some(error) = &dashboard.error {
        println!("! {}", error);
    }
    println!();
    print_summary(&dashboard.summary, currency);

    if !dashboard.categories.is_empty() {
        println!();
        println!("{:<20} {:>14}", "Category", "Spent");
        println!("{}", "-".repeat(35));
        for category in &dashboard.categories {
            println!(
                "{:<20} {:>14}",
                category.name,
                currency.format(category.total)
            );
        }
    }

    println!();
    println!("Recent transactions:");
    print_transactions(&dashboard.recent, currency);
}

fn print_analytics(analytics: &AnalyticsView, currency: Currency) {
    if let Some(error) = &analytics.error {
        println!("! {}", error);
    }
    print_summary(&analytics.summary, currency);

    let shares = analytics.category_shares();
    if !shares.is_empty() {
        println!();
        println!("{:<20} {:>8}", "Category", "Share");
        println!("{}", "-".repeat(29));
        for (name, share) in shares {
            println!("{:<20} {:>7.1}%", name, share * 100.0);
        }
    }
}

fn print_summary(summary: &fintrack::Summary, currency: Currency) {
    println!("Income:   {}", currency.format(summary.income));
    println!("Expenses: {}", currency.format(summary.total_expense));
    println!("Balance:  {}", currency.format(summary.balance()));
}

fn print_transactions(items: &[Transaction], currency: Currency) {
    if items.is_empty() {
        println!("No transactions yet.");
        println!();
        println!("Add one with:");
        println!("  fintrack add \"Groceries\" 450 Food");
        return;
    }

    println!(
        "{:<26} {:<10} {:<8} {:<14} {:<24} {:>12}",
        "ID", "Date", "Type", "Category", "Title", "Amount"
    );
    println!("{}", "-".repeat(99));
    for tx in items {
        let date = tx
            .day()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let amount = match tx.kind() {
            TransactionKind::Expense => currency.format(-tx.magnitude()),
            TransactionKind::Income => currency.format(tx.magnitude()),
        };
        println!(
            "{:<26} {:<10} {:<8} {:<14} {:<24} {:>12}",
            tx.id,
            date,
            tx.kind(),
            tx.category,
            truncate(&tx.title, 24),
            amount
        );
    }
}

fn print_transaction(tx: &Transaction, currency: Currency) {
    println!("ID:          {}", tx.id);
    println!("Title:       {}", tx.title);
    println!("Type:        {}", tx.kind());
    println!("Category:    {}", tx.category);
    println!("Amount:      {}", currency.format(tx.magnitude()));
    println!("Date:        {}", tx.date);
    if let Some(description) = tx.description.as_deref().filter(|d| !d.is_empty()) {
        println!("Description: {}", description);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
