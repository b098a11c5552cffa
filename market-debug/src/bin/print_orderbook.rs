//! Orderbook Snapshot Printer
//!
//! Simple CLI tool that drives one symbol's book through a synthetic
//! sequence of quotes/trades and prints the resulting snapshot. Useful for
//! debugging book/statistics logic during development; a real deployment
//! would instead point this at the live feed (out of this crate's scope).
//!
//! ## Usage
//!
//! ```bash
//! market-debug print-orderbook --symbol AAPL --levels 5 --format pretty
//! ```

use anyhow::Result;
use clap::Parser;
use market_core::{Book, BookManager, Price, Quantity, Symbol, Timestamp};
use tracing::info;

#[derive(Parser)]
#[command(name = "print-orderbook")]
#[command(about = "Print a synthetic orderbook snapshot", long_about = None)]
struct Args {
    /// Symbol to simulate
    #[arg(short, long, default_value = "AAPL")]
    symbol: String,

    /// Number of levels to display per side
    #[arg(short, long, default_value = "5")]
    levels: usize,

    /// Output format (pretty, compact, json)
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

fn main() -> Result<()> {
    market_core::logging::init_tracing("info", false);
    let args = Args::parse();
    info!(symbol = %args.symbol, format = %args.format, "printing synthetic orderbook snapshot");

    let manager = BookManager::new();
    let symbol = Symbol::new(&args.symbol);
    seed_synthetic_book(&manager, symbol);

    match args.format.as_str() {
        "json" => print_json(&manager, symbol, args.levels),
        "compact" => print_compact(&args.symbol, &manager.get(symbol).expect("book was just created"), args.levels),
        _ => print_pretty(&args.symbol, &manager.get(symbol).expect("book was just created"), args.levels),
    }

    Ok(())
}

/// Feeds a plausible depth ladder and a handful of trades into a fresh
/// book, standing in for the external live feed this crate does not own.
fn seed_synthetic_book(manager: &BookManager, symbol: Symbol) {
    use market_core::Side;

    manager.get_or_create(symbol);
    let book = manager.get(symbol).unwrap();

    let mid = 150.00;
    for i in 0..10u64 {
        book.apply_add(
            Price::from_f64(mid - 0.01 * (i + 1) as f64),
            Quantity::new(500 + i * 120),
            Side::Buy,
            Timestamp::ZERO,
        );
        book.apply_add(
            Price::from_f64(mid + 0.01 * (i + 1) as f64),
            Quantity::new(300 + i * 90),
            Side::Sell,
            Timestamp::ZERO,
        );
    }

    for (price, qty) in [(150.01, 200u64), (149.99, 150), (150.02, 80)] {
        book.apply_trade(Timestamp::ZERO, Price::from_f64(price), Quantity::new(qty)).unwrap();
    }
}

fn print_pretty(symbol: &str, book: &Book, max_levels: usize) {
    let mid = book.mid_price();
    let spread = book.spread();
    let imbalance = book.imbalance();

    println!();
    println!("== {symbol} orderbook ==");
    println!("updates: {}", book.update_count());
    println!();

    let asks = book.top_n_asks(max_levels);
    let max_size = asks.iter().map(|l| l.total_quantity.raw()).max().unwrap_or(1);

    println!("        ASKS        SIZE       BAR");
    for level in asks.iter().rev() {
        let bar = ascii_bar(level.total_quantity.raw(), max_size, 20);
        println!("   {:>10.4}   {:>8}  {}", level.price.to_f64(), level.total_quantity, bar);
    }

    println!("   --------------------------------");
    println!("    MID: {:.4}   spread: {:.4}   imbalance: {:+.3}", mid.to_f64(), spread.to_f64(), imbalance);
    println!("   --------------------------------");

    let bids = book.top_n_bids(max_levels);
    println!("        BIDS        SIZE       BAR");
    for level in &bids {
        let bar = ascii_bar(level.total_quantity.raw(), max_size, 20);
        println!("   {:>10.4}   {:>8}  {}", level.price.to_f64(), level.total_quantity, bar);
    }
    println!();

    let stats = book.get_statistics();
    println!(
        "stats: last={:.4} high={:.4} low={:.4} open={:.4} vwap={:.4} volume={} trades={} volatility={:.6}",
        stats.last_price.to_f64(),
        stats.high.to_f64(),
        stats.low.to_f64(),
        stats.open.to_f64(),
        stats.vwap.to_f64(),
        stats.total_volume,
        stats.trade_count,
        stats.volatility,
    );
}

fn print_compact(symbol: &str, book: &Book, max_levels: usize) {
    println!(
        "{symbol}  mid={:.4}  spread={:.4}  imbalance={:+.3}",
        book.mid_price().to_f64(),
        book.spread().to_f64(),
        book.imbalance()
    );
    for level in book.top_n_asks(max_levels).iter().rev() {
        println!("ASK  {:>10.4}  {:>8}", level.price.to_f64(), level.total_quantity);
    }
    for level in book.top_n_bids(max_levels) {
        println!("BID  {:>10.4}  {:>8}", level.price.to_f64(), level.total_quantity);
    }
}

fn print_json(manager: &BookManager, symbol: Symbol, max_levels: usize) {
    let snapshot = manager.book_snapshot(symbol, max_levels).expect("book was just created");
    println!("{}", serde_json::to_string_pretty(&snapshot).unwrap());
}

fn ascii_bar(size: u64, max_size: u64, width: usize) -> String {
    if max_size == 0 {
        return " ".repeat(width);
    }
    let filled = (((size as f64 / max_size as f64) * width as f64) as usize).min(width);
    "#".repeat(filled) + &"-".repeat(width - filled)
}
