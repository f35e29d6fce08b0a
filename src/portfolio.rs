// src/portfolio.rs
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::{Account, Holding, Identity, Quote};
use futures::future::join_all;
use log::{info, warn};
use std::collections::BTreeMap;

pub const STARTING_BALANCE: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Positions(BTreeMap<String, i64>);

impl Positions {
    pub fn from_holdings(holdings: &[Holding]) -> Self {
        let mut positions = BTreeMap::new();
        for holding in holdings.iter().filter(|h| h.shares != 0) {
            *positions.entry(holding.stock_ticker.clone()).or_insert(0) += holding.shares;
        }
        Positions(positions)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(t, s)| (t.as_str(), *s))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioValuation {
    pub cash: f64,
    pub equity: f64,
    pub total: f64,
    pub change: f64,
    pub change_percent: f64,
}

impl PortfolioValuation {
    /// Marks positions to the last fetched price. A ticker with no quote
    /// counts as worth nothing.
    pub fn compute(cash: f64, positions: &Positions, quotes: &BTreeMap<String, Quote>) -> Self {
        let equity: f64 = positions
            .iter()
            .map(|(ticker, shares)| {
                let price = quotes.get(ticker).map_or(0.0, |q| q.c);
                shares as f64 * price
            })
            .sum();
        let total = cash + equity;
        let change = total - STARTING_BALANCE;
        PortfolioValuation {
            cash,
            equity,
            total,
            change,
            change_percent: change / STARTING_BALANCE * 100.0,
        }
    }

    pub fn is_gain(&self) -> bool {
        self.change >= 0.0
    }
}

#[derive(Debug, Clone)]
pub struct PortfolioSnapshot {
    pub account: Account,
    pub positions: Positions,
    pub quotes: BTreeMap<String, Quote>,
    pub valuation: PortfolioValuation,
}

/// Fetches the account and a quote for each open position. Quote failures
/// are logged and the ticker is valued at zero; only the account fetch can
/// fail the call.
pub async fn load_portfolio(api: &ApiClient, account_id: i64) -> Result<PortfolioSnapshot, ApiError> {
    let account = api.get_account(account_id).await?;
    let positions = Positions::from_holdings(&account.holdings);

    let fetches = positions.tickers().map(|ticker| async move {
        (ticker.to_string(), api.quote(ticker).await)
    });
    let mut quotes = BTreeMap::new();
    for (ticker, result) in join_all(fetches).await {
        match result {
            Ok(quote) => {
                quotes.insert(ticker, quote);
            }
            Err(e) => warn!("No quote for {}: {}", ticker, e),
        }
    }

    let valuation = PortfolioValuation::compute(account.cash, &positions, &quotes);
    info!(
        "Account {} valued at {} across {} positions.",
        account.id,
        format_usd(valuation.total),
        positions.len()
    );
    Ok(PortfolioSnapshot {
        account,
        positions,
        quotes,
        valuation,
    })
}

pub fn first_name(identity: &Identity) -> &str {
    identity.name.split_whitespace().next().unwrap_or("")
}

pub fn format_usd(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();
    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, digit) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

pub fn format_percent(value: f64) -> String {
    let hundredths = (value * 100.0).round();
    let sign = if hundredths < 0.0 { '-' } else { '+' };
    format!("{sign}{:.2}%", hundredths.abs() / 100.0)
}
