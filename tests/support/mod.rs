// tests/support/mod.rs
#![allow(dead_code)]

//! In-process stand-in for the Trade Wars backend, served by warp on an
//! ephemeral port.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use warp::http::StatusCode;
use warp::reply::{json as reply_json, with_status, Response};
use warp::{Filter, Rejection, Reply};

pub const ADA_ID: i64 = 1;
pub const ADA_EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "hunter2";
/// Listing accounts for this user fails with HTTP 500.
pub const BROKEN_USER: i64 = 500;
/// Listing accounts for this user answers with a JSON object.
pub const ODD_USER: i64 = 404_404;
/// `GET /accounts/{id}` for this id answers 200 with a body that is not JSON.
pub const GARBLED_ACCOUNT: i64 = 999;
/// Quotes for this ticker fail with HTTP 500.
pub const FAILING_TICKER: &str = "FAIL";

/// The one tournament that exists when the backend starts.
pub const SPRING_CUP: i64 = 5;

#[derive(Default)]
struct State {
    accounts: Vec<Value>,
    next_id: i64,
    tournaments: Vec<Value>,
    entries: Vec<(i64, i64)>,
    last_tournament_body: Option<Value>,
}

impl State {
    fn insert(&mut self, user_id: i64, name: &str, cash: f64, tournament: Option<&str>) -> Value {
        self.next_id += 1;
        let account = json!({
            "id": self.next_id,
            "userId": user_id,
            "name": name,
            "cash": cash,
            "holdings": [],
            "transactions": [],
            "tournamentId": tournament.map(|_| SPRING_CUP),
            "tournamentName": tournament,
        });
        self.accounts.push(account.clone());
        account
    }

    fn add_tournament(&mut self, id: i64, name: &str, max_participants: i64) -> Value {
        let tournament = json!({
            "id": id,
            "name": name,
            "maxParticipants": max_participants,
            "currentParticipants": 0,
            "startDate": "2025-04-01T00:00:00",
            "endDate": "2025-04-30T00:00:00",
            "status": "UPCOMING",
        });
        self.tournaments.push(tournament.clone());
        tournament
    }

    fn find_mut(&mut self, id: i64) -> Option<&mut Value> {
        self.accounts.iter_mut().find(|a| a["id"] == id)
    }
}

type Shared = Arc<Mutex<State>>;

pub struct MockBackend {
    pub base_url: String,
    state: Shared,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        state.lock().unwrap().add_tournament(SPRING_CUP, "Spring Cup", 10);
        let (addr, server) = warp::serve(routes(state.clone())).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        MockBackend {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    pub fn add_account(&self, user_id: i64, name: &str, cash: f64) -> i64 {
        let account = self.state.lock().unwrap().insert(user_id, name, cash, None);
        account["id"].as_i64().unwrap()
    }

    pub fn add_holding(&self, account_id: i64, ticker: &str, shares: i64, average_price: f64) {
        let mut state = self.state.lock().unwrap();
        let account = state.find_mut(account_id).expect("unknown account");
        account["holdings"].as_array_mut().unwrap().push(json!({
            "stockTicker": ticker,
            "shares": shares,
            "averagePrice": average_price,
            "accountId": account_id,
        }));
    }

    pub fn remove_account(&self, account_id: i64) {
        self.state.lock().unwrap().accounts.retain(|a| a["id"] != account_id);
    }

    pub fn account(&self, account_id: i64) -> Option<Value> {
        self.state.lock().unwrap().find_mut(account_id).cloned()
    }

    /// Raw JSON body of the last `POST /tournaments`.
    pub fn last_tournament_body(&self) -> Option<Value> {
        self.state.lock().unwrap().last_tournament_body.clone()
    }
}

/// Reserves a port and releases it, so connecting there is refused.
pub fn dead_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

pub fn scratch_file(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir()
        .join(format!("trade-wars-it-{}-{}", std::process::id(), n))
        .join(name)
}

pub fn ada() -> Value {
    json!({
        "id": ADA_ID,
        "name": "Ada Lovelace",
        "email": ADA_EMAIL,
        "createdAt": "2025-01-02T03:04:05",
        "lastLoginAt": "2025-03-01T09:00:00"
    })
}

fn with_state(state: Shared) -> impl Filter<Extract = (Shared,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

type Query = HashMap<String, String>;

fn routes(state: Shared) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    account_routes(state.clone())
        .or(user_routes())
        .or(stock_routes())
        .or(tournament_routes(state))
        .or(transaction_routes())
}

fn account_routes(state: Shared) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("api" / "accounts")
        .and(warp::get())
        .and(warp::query::<Query>())
        .and(with_state(state.clone()))
        .map(list_accounts_handler);

    let create = warp::path!("api" / "accounts")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .map(create_account_handler);

    let dashboard = warp::path!("api" / "accounts" / "dashboard")
        .and(warp::get())
        .and(warp::query::<Query>())
        .and(with_state(state.clone()))
        .map(dashboard_handler);

    let get = warp::path!("api" / "accounts" / i64)
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(get_account_handler);

    let delete = warp::path!("api" / "accounts" / i64)
        .and(warp::delete())
        .and(with_state(state.clone()))
        .map(delete_account_handler);

    let rename = warp::path!("api" / "accounts" / i64 / "rename")
        .and(warp::patch())
        .and(warp::query::<Query>())
        .and(with_state(state.clone()))
        .map(rename_account_handler);

    let trade = warp::path!("api" / "accounts" / i64 / "trade")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state))
        .map(trade_handler);

    list.or(create)
        .or(dashboard)
        .or(get)
        .or(delete)
        .or(rename)
        .or(trade)
}

fn user_routes() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let login = warp::path!("api" / "users" / "login")
        .and(warp::post())
        .and(warp::body::json())
        .map(login_handler);

    let signup = warp::path!("api" / "users" / "signup")
        .and(warp::post())
        .and(warp::body::json())
        .map(signup_handler);

    login.or(signup)
}

fn stock_routes() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let quote = warp::path!("api" / "stock" / "quote")
        .and(warp::get())
        .and(warp::query::<Query>())
        .map(quote_handler);

    let search = warp::path!("api" / "stock" / "search")
        .and(warp::get())
        .and(warp::query::<Query>())
        .map(search_handler);

    let metrics = warp::path!("api" / "stock" / "metrics")
        .and(warp::get())
        .and(warp::query::<Query>())
        .map(metrics_handler);

    let news = warp::path!("api" / "stock" / "news")
        .and(warp::get())
        .and(warp::query::<Query>())
        .map(news_handler);

    quote.or(search).or(metrics).or(news)
}

fn tournament_routes(state: Shared) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("api" / "tournaments")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(list_tournaments_handler);

    let create = warp::path!("api" / "tournaments")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .map(create_tournament_handler);

    let enter = warp::path!("api" / "tournaments" / i64 / "enter")
        .and(warp::post())
        .and(warp::query::<Query>())
        .and(with_state(state.clone()))
        .map(enter_tournament_handler);

    let leaderboard = warp::path!("api" / "tournaments" / i64 / "leaderboard")
        .and(warp::get())
        .map(leaderboard_handler);

    let for_user = warp::path!("api" / "tournaments" / "user" / i64)
        .and(warp::get())
        .and(with_state(state))
        .map(user_tournaments_handler);

    list.or(create).or(enter).or(leaderboard).or(for_user)
}

fn transaction_routes() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("api" / "transactions")
        .and(warp::get())
        .and(warp::query::<Query>())
        .map(transactions_handler);

    let get = warp::path!("api" / "transactions" / i64)
        .and(warp::get())
        .map(get_transaction_handler);

    list.or(get)
}

fn query_i64(query: &Query, key: &str) -> Option<i64> {
    query.get(key).and_then(|v| v.parse().ok())
}

fn list_accounts_handler(query: Query, state: Shared) -> Response {
    let Some(user_id) = query_i64(&query, "userId") else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    match user_id {
        BROKEN_USER => with_status("database unavailable", StatusCode::INTERNAL_SERVER_ERROR).into_response(),
        ODD_USER => reply_json(&json!({"unexpected": true})).into_response(),
        _ => {
            let state = state.lock().unwrap();
            let list: Vec<&Value> = state
                .accounts
                .iter()
                .filter(|a| a["userId"] == user_id)
                .collect();
            reply_json(&list).into_response()
        }
    }
}

fn create_account_handler(body: Value, state: Shared) -> Response {
    let name = body["name"].as_str().unwrap_or("").trim().to_string();
    let Some(user_id) = body["userId"].as_i64() else {
        return with_status("userId required", StatusCode::BAD_REQUEST).into_response();
    };
    if name.is_empty() {
        return with_status("Account name required", StatusCode::BAD_REQUEST).into_response();
    }
    let account = state.lock().unwrap().insert(user_id, &name, 10_000.0, None);
    let mut created = account;
    // creation replies carry only the summary fields
    if let Some(obj) = created.as_object_mut() {
        obj.retain(|k, _| matches!(k.as_str(), "id" | "name" | "cash"));
    }
    with_status(reply_json(&created), StatusCode::CREATED).into_response()
}

fn dashboard_handler(query: Query, state: Shared) -> Response {
    let Some(user_id) = query_i64(&query, "userId") else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let state = state.lock().unwrap();
    let mut total_cash = 0.0;
    let mut total_stocks: HashMap<String, i64> = HashMap::new();
    for account in state.accounts.iter().filter(|a| a["userId"] == user_id) {
        total_cash += account["cash"].as_f64().unwrap_or(0.0);
        for h in account["holdings"].as_array().into_iter().flatten() {
            *total_stocks
                .entry(h["stockTicker"].as_str().unwrap_or("").to_string())
                .or_default() += h["shares"].as_i64().unwrap_or(0);
        }
    }
    reply_json(&json!({"totalCash": total_cash, "totalStocks": total_stocks})).into_response()
}

fn get_account_handler(id: i64, state: Shared) -> Response {
    if id == GARBLED_ACCOUNT {
        return with_status("<html>oops</html>", StatusCode::OK).into_response();
    }
    let state = state.lock().unwrap();
    match state.accounts.iter().find(|a| a["id"] == id) {
        Some(account) => reply_json(account).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn delete_account_handler(id: i64, state: Shared) -> Response {
    let mut state = state.lock().unwrap();
    let before = state.accounts.len();
    state.accounts.retain(|a| a["id"] != id);
    if state.accounts.len() == before {
        return StatusCode::NOT_FOUND.into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

fn rename_account_handler(id: i64, query: Query, state: Shared) -> Response {
    let Some(name) = query.get("name").filter(|n| !n.trim().is_empty()) else {
        return with_status("name required", StatusCode::BAD_REQUEST).into_response();
    };
    let mut state = state.lock().unwrap();
    match state.find_mut(id) {
        Some(account) => {
            account["name"] = json!(name);
            reply_json(&*account).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn trade_handler(id: i64, body: Value, state: Shared) -> Response {
    let mut state = state.lock().unwrap();
    let Some(account) = state.find_mut(id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let shares = body["shares"].as_i64().unwrap_or(0);
    let price = body["price"].as_f64().unwrap_or(0.0);
    let ticker = body["ticker"].as_str().unwrap_or("").to_string();
    let cost = shares as f64 * price;
    let cash = account["cash"].as_f64().unwrap_or(0.0);
    match body["action"].as_str() {
        Some("buy") if cash < cost => {
            with_status("Not enough cash to complete purchase.", StatusCode::BAD_REQUEST).into_response()
        }
        Some("buy") => {
            account["cash"] = json!(cash - cost);
            account["holdings"].as_array_mut().unwrap().push(json!({
                "stockTicker": ticker,
                "shares": shares,
                "averagePrice": price,
                "accountId": id,
            }));
            reply_json(&*account).into_response()
        }
        _ => with_status("Invalid action type. Must be 'buy' or 'sell'.", StatusCode::BAD_REQUEST)
            .into_response(),
    }
}

fn login_handler(body: Value) -> Response {
    if body["email"] != ADA_EMAIL {
        return StatusCode::NOT_FOUND.into_response();
    }
    if body["password"] != PASSWORD {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    reply_json(&ada()).into_response()
}

fn signup_handler(body: Value) -> Response {
    if body["email"] == ADA_EMAIL {
        return StatusCode::CONFLICT.into_response();
    }
    let identity = json!({
        "id": 2,
        "name": body["name"],
        "email": body["email"],
        "createdAt": "2025-03-01T09:00:00",
        "lastLoginAt": null
    });
    with_status(reply_json(&identity), StatusCode::CREATED).into_response()
}

fn quote_handler(query: Query) -> Response {
    let ticker = query.get("ticker").cloned().unwrap_or_default();
    let price = match ticker.as_str() {
        FAILING_TICKER => {
            return with_status("provider error", StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
        "AAPL" => 200.0,
        _ => 50.0,
    };
    reply_json(&json!({
        "c": price, "d": 1.5, "dp": 0.75, "h": price + 2.0, "l": price - 2.0,
        "o": price - 1.0, "pc": price - 1.5, "t": 1_740_000_000
    }))
    .into_response()
}

fn search_handler(query: Query) -> Response {
    let Some(q) = query.get("query") else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    reply_json(&json!({
        "count": 1,
        "result": [{"symbol": q.to_uppercase(), "description": format!("{} INC", q.to_uppercase())}]
    }))
    .into_response()
}

fn metrics_handler(query: Query) -> Response {
    let Some(ticker) = query.get("ticker") else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    reply_json(&json!({
        "symbol": ticker,
        "metric": {"52WeekHigh": 237.23, "52WeekLow": 164.08}
    }))
    .into_response()
}

fn news_handler(query: Query) -> Response {
    let Some(category) = query.get("category") else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    reply_json(&json!([
        {"category": category, "headline": "Markets open higher", "id": 1},
        {"category": category, "headline": "Chipmakers rally", "id": 2}
    ]))
    .into_response()
}

fn transactions_handler(query: Query) -> Response {
    let (Some(account_id), Some(page), Some(size)) = (
        query_i64(&query, "accountId"),
        query_i64(&query, "page"),
        query_i64(&query, "size"),
    ) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    if page > 0 {
        return reply_json(&json!([])).into_response();
    }
    let list: Vec<Value> = (0..size.min(2))
        .map(|i| {
            json!({
                "id": 100 + i,
                "accountId": account_id,
                "action": "buy",
                "stockTicker": "AAPL",
                "shares": 1.0,
                "price": 190.0 + i as f64,
                "timestamp": format!("2025-03-0{}T14:30:00", 2 - i)
            })
        })
        .collect();
    reply_json(&list).into_response()
}

fn get_transaction_handler(id: i64) -> Response {
    if id != 100 {
        return StatusCode::NOT_FOUND.into_response();
    }
    reply_json(&json!({
        "id": id,
        "accountId": 7,
        "action": "sell",
        "stockTicker": "MSFT",
        "shares": 3.0,
        "price": 410.25,
        "timestamp": "2025-03-03T10:15:00"
    }))
    .into_response()
}

fn list_tournaments_handler(state: Shared) -> Response {
    reply_json(&state.lock().unwrap().tournaments).into_response()
}

fn create_tournament_handler(body: Value, state: Shared) -> Response {
    let Some(name) = body["name"].as_str().filter(|n| !n.is_empty()).map(str::to_string) else {
        return with_status("name required", StatusCode::BAD_REQUEST).into_response();
    };
    let mut state = state.lock().unwrap();
    state.last_tournament_body = Some(body.clone());
    let id = state.tournaments.len() as i64 + SPRING_CUP;
    let max = body["maxParticipants"].as_i64().unwrap_or(100);
    let created = state.add_tournament(id, &name, max);
    with_status(reply_json(&created), StatusCode::CREATED).into_response()
}

fn user_tournaments_handler(user_id: i64, state: Shared) -> Response {
    let state = state.lock().unwrap();
    let entered: Vec<&Value> = state
        .tournaments
        .iter()
        .filter(|t| state.entries.iter().any(|&(tid, uid)| t["id"] == tid && uid == user_id))
        .collect();
    reply_json(&entered).into_response()
}

fn enter_tournament_handler(tournament_id: i64, query: Query, state: Shared) -> Response {
    let Some(user_id) = query_i64(&query, "userId") else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    if tournament_id != SPRING_CUP {
        return with_status("Tournament not found", StatusCode::NOT_FOUND).into_response();
    }
    let mut state = state.lock().unwrap();
    state.insert(user_id, "Spring Cup Account", 25_000.0, Some("Spring Cup"));
    state.entries.push((tournament_id, user_id));
    with_status("User entered tournament successfully", StatusCode::CREATED).into_response()
}

fn leaderboard_handler(tournament_id: i64) -> Response {
    if tournament_id != SPRING_CUP {
        return StatusCode::NOT_FOUND.into_response();
    }
    reply_json(&json!([
        {"accountName": "Spring Cup Account", "cash": 20000.0, "totalHoldingValue": 7000.0, "totalStocks": 0},
        {"accountName": "Other Account", "cash": 25000.0, "totalHoldingValue": 0.0, "totalStocks": 0}
    ]))
    .into_response()
}
