//! signaldesk: terminal front end for the AI trade-signal desk.
//!
//! Signs in against the backend, requests and lists signals, drives the
//! position lifecycle and reports portfolio and journal statistics.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use signal_desk::api::{
    ApiClient, ApiError, CandleQuery, DeleteCandlesQuery, ImportQuery, MarketDataClient,
    PositionQuery, RetryPolicy, SignalQuery, DEFAULT_USER_ID,
};
use signal_desk::config::Settings;
use signal_desk::format::{
    exit_reason_label, format_compact, format_currency, format_date, format_duration,
    format_percent, format_pnl, format_price, format_relative_time,
};
use signal_desk::metrics::JournalCalculator;
use signal_desk::models::{
    validate_series, win_rate_tone, Candle, ClosePositionRequest, Direction,
    ExecutePositionRequest, ExitReason, OpenPositionRequest, Position, PositionStatus,
    RegisterRequest, Signal, SignalRequest, Timeframe, TradeLevels, TradingMode,
};
use signal_desk::session::{jwt, Session, SqliteStore};
use signal_desk::trading;

/// Trade-signal desk CLI.
#[derive(Parser)]
#[command(name = "signaldesk")]
#[command(about = "Request AI trade signals and manage positions", long_about = None)]
struct Cli {
    /// Credential database URL
    #[arg(short, long)]
    database: Option<String>,

    /// Backend base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SIGNALDESK_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the token
    Login {
        username: String,

        #[arg(long, env = "SIGNALDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in with it
    Register {
        username: String,

        email: String,

        #[arg(long, env = "SIGNALDESK_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        full_name: Option<String>,
    },

    /// Forget the saved credentials
    Logout,

    /// Show the signed-in user and token expiry
    Whoami,

    /// Ask the AI service for a new signal
    Generate {
        #[arg(short, long)]
        symbol: Option<String>,

        #[arg(short, long)]
        timeframe: Option<Timeframe>,

        /// Trading mode (SCALPING, INTRADAY, SWING)
        #[arg(short, long)]
        mode: Option<TradingMode>,

        /// Candles sent to the generator (defaults by mode)
        #[arg(long)]
        candles: Option<u32>,

        /// Maximum risk per trade, in percent
        #[arg(long)]
        max_risk: Option<Decimal>,
    },

    /// List signal history
    Signals {
        #[arg(short, long)]
        symbol: Option<String>,

        #[arg(short, long)]
        timeframe: Option<Timeframe>,

        /// Only signals created at or after this RFC 3339 time
        #[arg(long)]
        from: Option<DateTime<Utc>>,

        /// Only signals created at or before this RFC 3339 time
        #[arg(long)]
        to: Option<DateTime<Utc>>,

        #[arg(short, long, default_value = "0")]
        page: u32,
    },

    /// Show one signal
    Signal { id: u64 },

    /// List positions
    Positions {
        #[arg(short, long)]
        symbol: Option<String>,

        /// PENDING, OPEN, CLOSED or CANCELLED
        #[arg(long)]
        status: Option<PositionStatus>,

        #[arg(short, long, default_value = "0")]
        page: u32,
    },

    /// Open a pending position, from a signal or from explicit levels
    Open {
        /// Follow the levels of this signal
        #[arg(long, conflicts_with_all = ["symbol", "direction", "entry", "stop", "target"])]
        signal: Option<u64>,

        #[arg(long)]
        symbol: Option<String>,

        /// LONG or SHORT
        #[arg(long)]
        direction: Option<Direction>,

        #[arg(long)]
        entry: Option<Decimal>,

        #[arg(long)]
        stop: Option<Decimal>,

        #[arg(long)]
        target: Option<Decimal>,

        #[arg(short, long)]
        quantity: Decimal,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Fill a pending position
    Execute {
        id: u64,

        /// Actual fill price
        #[arg(long)]
        price: Decimal,
    },

    /// Close an open position
    Close {
        id: u64,

        #[arg(long)]
        price: Decimal,

        /// TP_HIT, SL_HIT, MANUAL_EXIT, TIME_EXIT, TRAILING_STOP, RISK_MANAGEMENT
        #[arg(long, default_value = "MANUAL_EXIT")]
        reason: ExitReason,

        #[arg(long)]
        fees: Option<Decimal>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Cancel a pending position
    Cancel { id: u64 },

    /// Portfolio statistics and open positions
    Stats {
        #[arg(short, long, default_value = DEFAULT_USER_ID)]
        user: String,
    },

    /// Journal metrics computed from closed positions
    Journal {
        #[arg(short, long)]
        symbol: Option<String>,

        /// Maximum pages of closed positions to read
        #[arg(long, default_value = "10")]
        max_pages: u32,
    },

    /// Show candles, optionally with an EMA
    Candles {
        #[arg(short, long)]
        symbol: Option<String>,

        #[arg(short, long)]
        timeframe: Option<Timeframe>,

        #[arg(short, long, default_value = "50")]
        limit: u32,

        /// EMA period to overlay
        #[arg(long)]
        ema: Option<usize>,

        /// Read from the public market-data API instead of the backend
        #[arg(long)]
        live: bool,
    },

    /// Have the backend import candles from the market-data API (admin)
    Import {
        #[arg(short, long)]
        symbol: Option<String>,

        #[arg(short, long)]
        timeframe: Option<Timeframe>,

        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Delete stored candles on the backend (admin)
    Purge {
        /// Restrict to one symbol
        #[arg(short, long)]
        symbol: Option<String>,

        /// Restrict to one timeframe
        #[arg(short, long)]
        timeframe: Option<Timeframe>,
    },

    /// Poll live candles until Ctrl+C
    Watch {
        #[arg(short, long)]
        symbol: Option<String>,

        #[arg(short, long)]
        timeframe: Option<Timeframe>,

        /// Polling interval in seconds
        #[arg(short, long, default_value = "30")]
        interval: u64,

        #[arg(long, default_value = "20")]
        ema: usize,
    },

    /// Offline position size and risk/reward calculator
    Size {
        /// Account balance
        #[arg(short, long)]
        balance: Decimal,

        /// Percent of the balance to risk
        #[arg(short, long, default_value = "1")]
        risk: Decimal,

        #[arg(long)]
        entry: Decimal,

        #[arg(long)]
        stop: Decimal,

        #[arg(long)]
        target: Option<Decimal>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut settings = Settings::from_env();
    if let Some(url) = &cli.api_url {
        settings.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(database) = &cli.database {
        settings.database = database.clone();
    }

    if let Err(e) = run(cli.command, settings).await {
        match e.downcast_ref::<ApiError>() {
            Some(api) => {
                eprintln!("Error: {}", api.user_message());
                for (field, message) in api.field_errors() {
                    eprintln!("  {}: {}", field, message);
                }
                debug!(error = %api, "Request failed");
            }
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Commands, settings: Settings) -> Result<()> {
    // Offline commands need neither the backend nor the credential store.
    match command {
        Commands::Size {
            balance,
            risk,
            entry,
            stop,
            target,
        } => return print_size(balance, risk, entry, stop, target),
        Commands::Watch {
            symbol,
            timeframe,
            interval,
            ema,
        } => {
            let market = MarketDataClient::with_base_url(&settings.market_url)?;
            let symbol = symbol.unwrap_or_else(|| settings.symbol.clone());
            let timeframe = timeframe.unwrap_or(settings.timeframe);
            let retry = settings.retry_policy();
            return watch(&market, &retry, &symbol, timeframe, interval, ema).await;
        }
        _ => {}
    }

    let store = SqliteStore::new(&settings.database)
        .await
        .context("Failed to open credential store")?;
    let session = Arc::new(Session::load(store).await?);

    if session.is_authenticated().await && session.is_token_expired().await {
        warn!("Saved token has expired; run 'signaldesk login' again");
    }

    let client = ApiClient::new(&settings.api_url, settings.timeout, session.clone())?;
    let retry = settings.retry_policy();

    match command {
        Commands::Login { username, password } => {
            info!(username = %username, "Signing in");
            let login = client.login(&username, &password).await?;
            println!("Signed in as {}", login.user.display_name());
        }

        Commands::Register {
            username,
            email,
            password,
            full_name,
        } => {
            let request = RegisterRequest {
                username,
                email,
                password,
                full_name,
            };
            let login = client.register(&request).await?;
            println!("Account created. Signed in as {}", login.user.display_name());
        }

        Commands::Logout => {
            client.logout().await?;
            println!("Signed out.");
        }

        Commands::Whoami => match session.current_user().await {
            Some(user) => {
                println!("\n=== {} ===", user.display_name());
                println!("Username: {}", user.username);
                println!("Email:    {}", user.email);
                println!("Roles:    {}", user.roles.join(", "));
                println!("Status:   {}", user.status);
                if let Some(token) = session.token().await {
                    let expiry = match jwt::expires_at(&token) {
                        Ok(Some(at)) => format!(
                            "{} ({})",
                            format_date(Some(at)),
                            format_relative_time(Some(at))
                        ),
                        Ok(None) => "never".to_string(),
                        Err(e) => format!("unreadable token: {}", e),
                    };
                    println!("Token:    expires {}", expiry);
                }
            }
            None => println!("Not signed in. Use 'signaldesk login <username>'."),
        },

        Commands::Generate {
            symbol,
            timeframe,
            mode,
            candles,
            max_risk,
        } => {
            let mut request = SignalRequest::new(
                symbol.unwrap_or_else(|| settings.symbol.clone()),
                timeframe.unwrap_or(settings.timeframe),
                mode.unwrap_or(settings.mode),
            );
            if let Some(count) = candles {
                request = request.with_candle_count(count);
            }
            if let Some(max_risk) = max_risk {
                request = request.with_max_risk(max_risk);
            }

            info!(
                symbol = %request.symbol_code,
                timeframe = %request.timeframe,
                mode = %request.mode,
                "Requesting signal"
            );
            let signal = client.generate_signal(&request).await?;
            print_signal(&signal);
        }

        Commands::Signals {
            symbol,
            timeframe,
            from,
            to,
            page,
        } => {
            let query = SignalQuery::new(
                symbol.unwrap_or_else(|| settings.symbol.clone()),
                timeframe.unwrap_or(settings.timeframe),
            )
            .between(from, to)
            .page(page, settings.page_size);

            let page = retry.run("signals", || client.signals(&query)).await?;

            println!(
                "\n{:>6} {:<18} {:<8} {:>14} {:>14} {:>14} {:>6}",
                "ID", "CREATED", "SIDE", "ENTRY", "STOP", "TARGET", "R:R"
            );
            println!("{}", "-".repeat(86));
            for signal in &page.content {
                let symbol = signal.symbol_code.as_str();
                println!(
                    "{:>6} {:<18} {:<8} {:>14} {:>14} {:>14} {:>6}",
                    signal.id,
                    format_date(Some(signal.created_at)),
                    signal.direction.metadata().label,
                    format_price(signal.entry_price, symbol),
                    format_price(signal.stop_loss, symbol),
                    format_price(signal.take_profit, symbol),
                    ratio(signal.effective_risk_reward()),
                );
            }
            print_page_footer(page.number, page.total_pages, page.total_elements);
        }

        Commands::Signal { id } => {
            let signal = retry.run("signal", || client.signal(id)).await?;
            print_signal(&signal);
        }

        Commands::Positions {
            symbol,
            status,
            page,
        } => {
            let mut query = PositionQuery::default().page(page, settings.page_size);
            if let Some(symbol) = symbol {
                query = query.symbol(symbol);
            }
            if let Some(status) = status {
                query = query.status(status);
            }

            let page = retry.run("positions", || client.positions(&query)).await?;
            print_positions(&page.content);
            print_page_footer(page.number, page.total_pages, page.total_elements);
        }

        Commands::Open {
            signal,
            symbol,
            direction,
            entry,
            stop,
            target,
            quantity,
            notes,
        } => {
            let mut request = match signal {
                Some(id) => {
                    let signal = retry.run("signal", || client.signal(id)).await?;
                    OpenPositionRequest::from_signal(&signal, quantity)?
                }
                None => {
                    let (Some(symbol), Some(direction), Some(entry), Some(stop_loss), Some(take_profit)) =
                        (symbol, direction, entry, stop, target)
                    else {
                        bail!("Either --signal or all of --symbol, --direction, --entry, --stop and --target are required");
                    };
                    let levels = TradeLevels {
                        entry,
                        stop_loss,
                        take_profit,
                    };
                    OpenPositionRequest::new(symbol, direction, levels, quantity)?
                }
            };
            if let Some(notes) = notes {
                request = request.with_notes(notes);
            }

            let position = client.open_position(&request).await?;
            println!("Opened position {} ({})", position.id, position.status);
            print_position(&position);
        }

        Commands::Execute { id, price } => {
            let request = ExecutePositionRequest::new(price)?;
            let position = client.execute_position(id, &request).await?;
            println!("Position {} is {}", position.id, position.status);
            print_position(&position);
        }

        Commands::Close {
            id,
            price,
            reason,
            fees,
            notes,
        } => {
            let mut request = ClosePositionRequest::new(price, reason)?;
            request.fees = fees;
            request.notes = notes;

            let position = client.close_position(id, &request).await?;
            println!("Position {} is {}", position.id, position.status);
            print_position(&position);
        }

        Commands::Cancel { id } => {
            let position = client.cancel_position(id).await?;
            println!("Position {} is {}", position.id, position.status);
        }

        Commands::Stats { user } => {
            let (stats, open) = futures::try_join!(
                retry.run("portfolio stats", || client.portfolio_stats(&user)),
                retry.run("open positions", || client.open_positions(&user))
            )?;

            let tone = win_rate_tone(stats.win_rate);
            let total = format_pnl(Some(stats.total_pnl));

            println!("\n=== Portfolio ===");
            println!("Positions:        {}", stats.total_positions);
            println!("  Open:           {}", stats.open_positions);
            println!("  Pending:        {}", stats.pending_positions);
            println!("  Closed:         {}", stats.closed_positions);

            println!("\n=== Performance ===");
            println!("Total P&L:        {}", total.text);
            println!("Average P&L:      {}", format_pnl(Some(stats.average_pnl)).text);
            println!("Best Trade:       {}", format_pnl(Some(stats.best_trade_pnl)).text);
            println!("Worst Trade:      {}", format_pnl(Some(stats.worst_trade_pnl)).text);
            println!("Win Rate:         {:.1}% ({:?})", stats.win_rate, tone);
            if let Some(rr) = stats.average_risk_reward {
                println!("Avg R:R:          {}", ratio(Some(rr)));
            }
            if let Some(fees) = stats.total_fees {
                println!("Fees:             {}", format_currency(Some(fees), 2));
            }
            if stats.average_trade_duration_ms.is_some() {
                println!(
                    "Avg Duration:     {}",
                    format_duration(stats.average_trade_duration_ms)
                );
            }

            if !open.is_empty() {
                println!("\n=== Open Positions ({}) ===", open.len());
                print_positions(&open);
            }
        }

        Commands::Journal { symbol, max_pages } => {
            let mut query = PositionQuery::default()
                .status(PositionStatus::Closed)
                .page(0, settings.page_size);
            if let Some(symbol) = symbol {
                query = query.symbol(symbol);
            }

            let mut closed: Vec<Position> = Vec::new();
            for _ in 0..max_pages.max(1) {
                let page = retry.run("closed positions", || client.positions(&query)).await?;
                let next = page.next_page();
                closed.extend(page.into_content());
                match next {
                    Some(number) => query.page = number,
                    None => break,
                }
            }
            debug!(count = closed.len(), "Loaded closed positions");

            print_journal(&closed);
        }

        Commands::Candles {
            symbol,
            timeframe,
            limit,
            ema,
            live,
        } => {
            let symbol = symbol.unwrap_or_else(|| settings.symbol.clone());
            let timeframe = timeframe.unwrap_or(settings.timeframe);

            let candles = if live {
                let market = MarketDataClient::with_base_url(&settings.market_url)?;
                retry
                    .run("klines", || market.klines(&symbol, timeframe, limit))
                    .await?
            } else {
                let query = CandleQuery {
                    symbol_code: symbol.to_uppercase(),
                    timeframe,
                    limit: Some(limit),
                };
                retry.run("candles", || client.candles(&query)).await?
            };

            print_candles(&candles, ema)?;
        }

        Commands::Import {
            symbol,
            timeframe,
            limit,
        } => {
            if !session.is_admin().await {
                warn!("Candle import needs an admin account; the backend will likely refuse");
            }
            let query = ImportQuery {
                symbol: symbol.unwrap_or_else(|| settings.symbol.clone()).to_uppercase(),
                timeframe: timeframe.unwrap_or(settings.timeframe),
                limit,
            };
            let result = client.import_candles(&query).await?;
            println!(
                "Imported {} {} {} candles from {}",
                result.imported_count, result.symbol, result.timeframe, result.source
            );
            if !result.message.is_empty() {
                println!("{}", result.message);
            }
        }

        Commands::Purge { symbol, timeframe } => {
            if !session.is_admin().await {
                warn!("Candle deletion needs an admin account; the backend will likely refuse");
            }
            let query = DeleteCandlesQuery {
                symbol_code: symbol.map(|s| s.trim().to_uppercase()),
                timeframe,
            };
            let result = client.delete_candles(&query).await?;
            println!("Deleted {} candles", result.deleted_count);
        }

        Commands::Size { .. } | Commands::Watch { .. } => {}
    }

    Ok(())
}

/// Poll the market-data API until interrupted. Failed polls are logged
/// and the loop keeps going.
async fn watch(
    market: &MarketDataClient,
    retry: &RetryPolicy,
    symbol: &str,
    timeframe: Timeframe,
    interval_secs: u64,
    period: usize,
) -> Result<()> {
    let limit = u32::try_from(period.max(1) * 3).unwrap_or(u32::MAX).min(1000);

    println!("\n=== Watching {} {} ===", symbol.to_uppercase(), timeframe);
    println!("Polling interval: {}s", interval_secs);
    println!("Press Ctrl+C to stop.\n");

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Received shutdown signal");
                break;
            }
            _ = ticker.tick() => {
                let poll = retry.run("klines", || market.klines(symbol, timeframe, limit));
                let Some(outcome) = interruptible(poll, shutdown.as_mut()).await else {
                    info!("Received shutdown signal during a poll");
                    break;
                };
                match outcome {
                    Ok(candles) => {
                        let Some(last) = candles.last() else {
                            warn!(symbol = %symbol, "No candles returned");
                            continue;
                        };
                        let ema = trading::ema(&candles, period).last();
                        println!(
                            "[{}] {} close {:.2} | EMA{} {} | vol {}",
                            chrono::Local::now().format("%H:%M:%S"),
                            symbol.to_uppercase(),
                            last.close,
                            period,
                            ema.map(|p| format!("{:.2}", p.value)).unwrap_or_else(|| "-".to_string()),
                            last.volume
                                .and_then(Decimal::from_f64_retain)
                                .map(|v| format_compact(Some(v)))
                                .unwrap_or_else(|| "-".to_string()),
                        );
                    }
                    Err(e) => {
                        error!(error = %e, "Poll failed");
                    }
                }
            }
        }
    }

    println!("\nStopped watching.");
    Ok(())
}

/// Run `work` unless `shutdown` completes first.
async fn interruptible<W, S>(work: W, shutdown: Pin<&mut S>) -> Option<W::Output>
where
    W: Future,
    S: Future,
{
    tokio::select! {
        _ = shutdown => None,
        output = work => Some(output),
    }
}

fn print_signal(signal: &Signal) {
    let meta = signal.direction.metadata();
    let symbol = signal.symbol_code.as_str();

    println!("\n=== Signal #{} ===", signal.id);
    println!("Symbol:      {} ({} {})", symbol, signal.timeframe, signal.mode.label());
    println!("Direction:   {} {} ({})", meta.arrow, meta.label, meta.action);
    println!("Created:     {}", format_date(Some(signal.created_at)));

    if signal.direction.is_directional() {
        println!("\n--- Levels ---");
        println!("Entry:       {}", format_price(signal.entry_price, symbol));
        println!("Stop Loss:   {}", format_price(signal.stop_loss, symbol));
        println!("Take Profit: {}", format_price(signal.take_profit, symbol));
        println!("R:R:         {}", ratio(signal.effective_risk_reward()));
        if let Some(profit) = signal.potential_profit {
            println!("Potential:   {}", format_currency(Some(profit), 2));
        }
        if let Some(risk) = signal.risk_amount {
            println!("At Risk:     {}", format_currency(Some(risk), 2));
        }
    }
    println!(
        "Actionable:  {}",
        if signal.is_actionable() { "Yes" } else { "No" }
    );

    if let Some(reasoning) = &signal.reasoning {
        println!("\n--- Reasoning ---");
        println!("{}", reasoning);
    }
}

fn print_positions(positions: &[Position]) {
    if positions.is_empty() {
        println!("No positions.");
        return;
    }

    println!(
        "\n{:>6} {:<10} {:<6} {:<10} {:>14} {:>10} {:>14} {:<14}",
        "ID", "SYMBOL", "SIDE", "STATUS", "ENTRY", "QTY", "P&L", "EXIT"
    );
    println!("{}", "-".repeat(92));
    for position in positions {
        let symbol = position.symbol_code.as_str();
        println!(
            "{:>6} {:<10} {:<6} {:<10} {:>14} {:>10} {:>14} {:<14}",
            position.id,
            truncate(symbol, 10),
            position.direction.metadata().label,
            position.status.as_str(),
            format_price(Some(position.entry_price()), symbol),
            position.quantity.normalize(),
            format_pnl(position.realized_pnl_or_computed()).text,
            truncate(exit_reason_label(position.exit_reason), 14),
        );
    }
}

fn print_position(position: &Position) {
    let symbol = position.symbol_code.as_str();

    println!("\n--- Position #{} ---", position.id);
    println!("Symbol:      {} {}", symbol, position.direction.metadata().label);
    println!("Status:      {}", position.status);
    println!("Entry:       {}", format_price(Some(position.entry_price()), symbol));
    println!("Stop Loss:   {}", format_price(Some(position.stop_loss), symbol));
    println!("Take Profit: {}", format_price(Some(position.take_profit), symbol));
    println!("Quantity:    {}", position.quantity.normalize());
    if let Ok(rr) = position.planned_risk_reward() {
        println!("Planned R:R: {}", ratio(Some(rr)));
    }
    if position.exit_price.is_some() {
        println!("Exit:        {}", format_price(position.exit_price, symbol));
        println!("Reason:      {}", exit_reason_label(position.exit_reason));
        println!(
            "P&L:         {} ({})",
            format_pnl(position.realized_pnl_or_computed()).text,
            format_percent(position.realized_pnl_percent, 2)
        );
        println!("Held:        {}", format_duration(position.duration().map(|d| d.num_milliseconds())));
    }
}

fn print_journal(closed: &[Position]) {
    let m = JournalCalculator::calculate(closed);
    if m.closed_trades == 0 {
        println!("No closed positions yet.");
        return;
    }

    println!("\n=== Journal ===");
    println!("Closed Trades:  {}", m.closed_trades);
    println!("Total P&L:      {}", format_pnl(Some(m.total_pnl)).text);
    println!("Average P&L:    {}", format_pnl(Some(m.average_pnl)).text);
    println!("Fees:           {}", format_currency(Some(m.total_fees), 2));

    println!("\n--- Win/Loss ---");
    println!("Win Rate:       {:.1}%", m.win_rate);
    println!("Winning Trades: {}", m.winning_trades);
    println!("Losing Trades:  {}", m.losing_trades);
    println!("Breakeven:      {}", m.breakeven_trades);
    println!("Avg Win:        {}", format_currency(Some(m.avg_win), 2));
    println!("Avg Loss:       {}", format_currency(Some(m.avg_loss), 2));
    println!("Best Trade:     {}", format_pnl(m.best_trade).text);
    println!("Worst Trade:    {}", format_pnl(m.worst_trade).text);

    println!("\n--- Edge ---");
    println!(
        "Profit Factor:  {}",
        m.profit_factor
            .map(|pf| format!("{:.2}", pf))
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Expectancy:     {}", format_pnl(Some(m.expectancy)).text);
    println!("Avg R:R:        {}", ratio(m.average_risk_reward));

    println!("\n--- Risk ---");
    println!(
        "Max Drawdown:   {} ({:.1}%)",
        format_currency(Some(m.max_drawdown), 2),
        m.max_drawdown_pct * 100.0
    );
    println!(
        "P&L Std Dev:    {}",
        m.pnl_std_dev
            .map(|sd| format!("{:.2}", sd))
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Win Streak:     {}", m.longest_win_streak);
    println!("Loss Streak:    {}", m.longest_loss_streak);
}

fn print_candles(candles: &[Candle], period: Option<usize>) -> Result<()> {
    validate_series(candles)?;

    let ema: Vec<Option<f64>> = match period {
        Some(period) => {
            let points: Vec<_> = trading::ema(candles, period).collect();
            let offset = candles.len() - points.len();
            (0..candles.len())
                .map(|i| i.checked_sub(offset).map(|j| points[j].value))
                .collect()
        }
        None => vec![None; candles.len()],
    };

    println!(
        "\n{:<18} {:>12} {:>12} {:>12} {:>12} {:>10} {:>12}",
        "TIME", "OPEN", "HIGH", "LOW", "CLOSE", "VOLUME", "EMA"
    );
    println!("{}", "-".repeat(94));
    for (candle, ema) in candles.iter().zip(ema) {
        println!(
            "{:<18} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>10} {:>12}",
            format_date(Some(candle.time)),
            candle.open,
            candle.high,
            candle.low,
            candle.close,
            candle
                .volume
                .and_then(Decimal::from_f64_retain)
                .map(|v| format_compact(Some(v)))
                .unwrap_or_else(|| "-".to_string()),
            ema.map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    println!("\n{} candles", candles.len());
    Ok(())
}

fn print_size(
    balance: Decimal,
    risk_percent: Decimal,
    entry: Decimal,
    stop: Decimal,
    target: Option<Decimal>,
) -> Result<()> {
    let direction = if stop < entry {
        Direction::Long
    } else {
        Direction::Short
    };
    let size = trading::position_size(balance, risk_percent, entry, stop)?;
    let at_risk = balance * risk_percent / Decimal::ONE_HUNDRED;

    println!("\n=== Position Size ===");
    println!("Direction:   {}", direction.metadata().label);
    println!("At Risk:     {} ({}%)", format_currency(Some(at_risk), 2), risk_percent.normalize());
    println!("Size:        {} units", size.round_dp(6).normalize());
    println!("Notional:    {}", format_currency(Some(size * entry), 2));

    if let Some(target) = target {
        let rr = trading::risk_reward(entry, stop, target)?;
        let profit = trading::pnl(entry, target, size, direction);
        println!("R:R:         {}", ratio(Some(rr)));
        println!("At Target:   {}", format_pnl(Some(profit)).text);
        if !signal_desk::validate::is_valid_take_profit(
            entry.to_f64().unwrap_or_default(),
            target.to_f64().unwrap_or_default(),
            direction,
        ) {
            println!("Warning: target is on the wrong side of the entry for a {} trade", direction);
        }
    }
    Ok(())
}

fn print_page_footer(number: u32, total_pages: u32, total_elements: u64) {
    println!(
        "\nPage {} of {} ({} total)",
        number + 1,
        total_pages.max(1),
        total_elements
    );
}

fn ratio(value: Option<Decimal>) -> String {
    value
        .map(|r| format!("{}:1", r.round_dp(2).normalize()))
        .unwrap_or_else(|| "-".to_string())
}

/// Truncate a string with ellipsis if too long.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_interruptible_returns_finished_work() {
        let shutdown = std::future::pending::<()>();
        tokio::pin!(shutdown);
        assert_eq!(interruptible(async { 7 }, shutdown.as_mut()).await, Some(7));
    }

    #[tokio::test]
    async fn test_shutdown_during_work_wins() {
        let (tx, rx) = oneshot::channel::<()>();
        let shutdown = async move {
            let _ = rx.await;
        };
        tokio::pin!(shutdown);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = tx.send(());
        });

        let slow_poll = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            1u32
        };
        assert_eq!(interruptible(slow_poll, shutdown.as_mut()).await, None);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("BTCUSDT", 10), "BTCUSDT");
        assert_eq!(truncate("MANUAL_EXIT_LONG", 10), "MANUAL_...");
    }
}
