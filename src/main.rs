// src/main.rs
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Builder;
use log::{error, warn};
use std::path::PathBuf;
use std::sync::Arc;
use trade_wars::api::Page;
use trade_wars::models::{Identity, TradeAction, TradeRequest};
use trade_wars::portfolio::{first_name, format_percent, format_usd, load_portfolio};
use trade_wars::{AccountContext, ApiClient, Config, FileStore, LoadOutcome, SessionStore};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;
type Accounts = AccountContext<ApiClient, Arc<FileStore>>;

#[derive(Parser)]
#[command(name = "trade-wars", version, about = "Command-line client for Trade Wars")]
struct Cli {
    /// Backend base URL (overrides TRADE_WARS_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where the session and account selection are kept (overrides TRADE_WARS_STATE_FILE)
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a user and sign in as them
    Signup {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        password: String,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Sign out and forget the selected account
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Latest quote for a ticker
    Quote { ticker: String },
    #[command(flatten)]
    Account(AccountCommand),
}

/// Commands that need a signed-in user.
#[derive(Subcommand)]
enum AccountCommand {
    /// List your accounts; the selected one is starred
    Accounts,
    /// Open a new trading account
    CreateAccount { name: String },
    /// Switch the account used by dashboard, trade and history
    Select { account_id: i64 },
    /// Value the selected account at current prices
    Dashboard,
    /// Buy or sell on the selected account
    Trade {
        action: Side,
        ticker: String,
        shares: i64,
        price: f64,
    },
    /// Trade history of the selected account
    History {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
    },
    /// List tournaments
    Tournaments {
        /// Only tournaments you have entered
        #[arg(long)]
        mine: bool,
    },
    /// Standings of a tournament
    Leaderboard { tournament_id: i64 },
    /// Enter a tournament, which opens a tournament account
    Enter { tournament_id: i64 },
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Buy,
    Sell,
}

impl From<Side> for TradeAction {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => TradeAction::Buy,
            Side::Sell => TradeAction::Sell,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(2);
        }
    };
    Builder::new()
        .filter_level(config.log_level)
        .format_timestamp_secs()
        .init();

    if let Err(e) = run(cli, config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mut config: Config) -> AppResult<()> {
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(path) = cli.state_file {
        config.state_file = path;
    }

    let store = Arc::new(FileStore::new(&config.state_file));
    let api = ApiClient::from_config(&config)?;
    let session = SessionStore::new(store.clone());
    session.restore();
    let accounts: Accounts = AccountContext::new(api.clone(), store);

    match cli.command {
        Command::Signup {
            email,
            name,
            password,
        } => {
            let identity = api.sign_up(&email, &password, &name).await?;
            session.login(identity.clone());
            load_accounts(&accounts, &identity).await;
            println!("Welcome, {}!", first_name(&identity));
        }
        Command::Login { email, password } => {
            let identity = api.sign_in(&email, &password).await?;
            session.login(identity.clone());
            load_accounts(&accounts, &identity).await;
            println!("Signed in as {} <{}>.", identity.name, identity.email);
            print_accounts(&accounts);
        }
        Command::Logout => {
            session.logout();
            accounts.load(None).await;
            println!("Signed out.");
        }
        Command::Whoami => match session.identity() {
            Some(identity) => println!("{} <{}> (user {})", identity.name, identity.email, identity.id),
            None => println!("Not signed in."),
        },
        Command::Quote { ticker } => {
            let quote = api.quote(&ticker).await?;
            println!(
                "{} {} ({} today, prev close {})",
                ticker.to_uppercase(),
                format_usd(quote.c),
                format_percent(quote.dp.unwrap_or(0.0)),
                format_usd(quote.pc)
            );
        }
        Command::Account(command) => {
            let identity = session
                .identity()
                .ok_or("not signed in; run `trade-wars login` first")?;
            load_accounts(&accounts, &identity).await;
            run_signed_in(command, &api, &accounts, &identity).await?;
        }
    }
    Ok(())
}

async fn run_signed_in(
    command: AccountCommand,
    api: &ApiClient,
    accounts: &Accounts,
    identity: &Identity,
) -> AppResult<()> {
    match command {
        AccountCommand::Accounts => print_accounts(accounts),
        AccountCommand::CreateAccount { name } => {
            let account = accounts.create_account(identity, &name).await?;
            println!("Opened account {} ({}).", account.id, account.name);
        }
        AccountCommand::Select { account_id } => {
            accounts.select(Some(account_id));
            if accounts.selected_id() != Some(account_id) {
                return Err(format!("you have no account {account_id}").into());
            }
            println!("Selected account {account_id}.");
        }
        AccountCommand::Dashboard => {
            let account_id = selected(accounts)?;
            let snapshot = load_portfolio(api, account_id).await?;
            let v = &snapshot.valuation;
            println!("Hello, {}. {}", first_name(identity), snapshot.account.name);
            println!("  Portfolio value  {}", format_usd(v.total));
            println!("  Cash             {}", format_usd(v.cash));
            println!(
                "  Since start      {} ({})",
                format_usd(v.change),
                format_percent(v.change_percent)
            );
            for (ticker, shares) in snapshot.positions.iter() {
                match snapshot.quotes.get(ticker) {
                    Some(q) => println!("  {ticker:<6} {shares:>6} @ {}", format_usd(q.c)),
                    None => println!("  {ticker:<6} {shares:>6} @ (no quote)"),
                }
            }
        }
        AccountCommand::Trade {
            action,
            ticker,
            shares,
            price,
        } => {
            let account_id = selected(accounts)?;
            let request = TradeRequest {
                action: action.into(),
                ticker: ticker.to_uppercase(),
                shares,
                price,
            };
            let account = api.trade(account_id, &request).await?;
            println!("Done. Cash left: {}", format_usd(account.cash));
            accounts.refresh().await;
        }
        AccountCommand::History { page, size } => {
            let account_id = selected(accounts)?;
            let history = api.account_transactions(account_id, Page { page, size }).await?;
            if history.is_empty() {
                println!("No trades yet.");
            }
            for tx in history {
                let when = tx
                    .timestamp
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "{when:<16} {:<4} {:<6} {:>8} @ {}",
                    tx.action,
                    tx.stock_ticker,
                    tx.shares,
                    format_usd(tx.price)
                );
            }
        }
        AccountCommand::Tournaments { mine } => {
            let tournaments = if mine {
                api.user_tournaments(identity.id).await?
            } else {
                api.list_tournaments().await?
            };
            for t in tournaments {
                println!(
                    "{:>4}  {:<24} {}/{}  {}",
                    t.id,
                    t.name,
                    t.current_participants,
                    t.max_participants,
                    t.status.unwrap_or_default()
                );
            }
        }
        AccountCommand::Leaderboard { tournament_id } => {
            for (rank, entry) in api.leaderboard(tournament_id).await?.iter().enumerate() {
                println!(
                    "{:>3}. {:<24} {}",
                    rank + 1,
                    entry.account_name,
                    format_usd(entry.cash + entry.total_holding_value)
                );
            }
        }
        AccountCommand::Enter { tournament_id } => {
            let message = api.enter_tournament(tournament_id, identity.id).await?;
            println!("{message}");
            accounts.refresh().await;
            print_accounts(accounts);
        }
    }
    Ok(())
}

async fn load_accounts(accounts: &Accounts, identity: &Identity) {
    if let LoadOutcome::Failed(e) = accounts.load(Some(identity)).await {
        warn!("Continuing without accounts: {}", e);
    }
}

fn selected(accounts: &Accounts) -> AppResult<i64> {
    accounts
        .selected_id()
        .ok_or_else(|| "no account selected; create one with `trade-wars create-account`".into())
}

fn print_accounts(accounts: &Accounts) {
    let snapshot = accounts.snapshot();
    if snapshot.accounts.is_empty() {
        println!("No accounts yet.");
    }
    for account in &snapshot.accounts {
        let marker = if snapshot.selected_id == Some(account.id) { '*' } else { ' ' };
        let tournament = account
            .tournament_name
            .as_deref()
            .map(|t| format!("  [{t}]"))
            .unwrap_or_default();
        println!(
            "{marker} {:>4}  {:<24} {}{tournament}",
            account.id,
            account.name,
            format_usd(account.cash)
        );
    }
}
