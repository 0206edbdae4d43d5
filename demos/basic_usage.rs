// ============================================================================
// Basic Usage Example
// ============================================================================

use matching_core::prelude::*;
use matching_core::telemetry;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();

    println!("=== Matching Engine Example ===\n");

    // Instruments, auto-creation and buffering may also come from MATCHING_* env vars
    let engine = MatchingEngineBuilder::new()
        .instrument_config(
            InstrumentConfig::new("BTC-USD").with_tick_size(Price::from_parts(0, 50_000_000)?),
        )
        .auto_create(false)
        .notifier(Arc::new(LoggingNotifier))
        .build()?;

    println!("Created matching engine for {:?}\n", engine.instruments());

    // Add sell orders at different prices
    println!("Adding sell orders...");
    for i in 0i64..5 {
        engine.submit(OrderRequest::sell(
            "BTC-USD",
            Price::from_integer(50000 + i * 100)?,
            1,
        ))?;
    }

    // Add buy orders, as a transport layer would hand them over
    println!("Adding buy orders...");
    for i in 0i64..5 {
        let price = (49900 - i * 100).to_string();
        engine.submit(OrderRequest::parse("BTC-USD", "buy", &price, "1")?)?;
    }

    // Get order book snapshot
    println!("\n=== Order Book Snapshot ===");
    let snapshot = engine.book_snapshot_with_depth("BTC-USD", 5);

    println!("\nBids:");
    for level in &snapshot.bids {
        println!("  {} @ {} ({} orders)", level.quantity, level.price, level.order_count);
    }

    println!("\nAsks:");
    for level in &snapshot.asks {
        println!("  {} @ {} ({} orders)", level.quantity, level.price, level.order_count);
    }

    println!("\nSpread: {:?}", snapshot.spread.map(|s| s.to_string()));

    // Submit an aggressive buy that crosses the first three ask levels
    println!("\n=== Submitting Crossing Order ===");
    let result = engine.submit(OrderRequest::buy("BTC-USD", Price::from_integer(50200)?, 4))?;

    println!("\nFills:");
    for fill in &result.fills {
        println!(
            "  #{} {} @ {} (maker {})",
            fill.sequence_number, fill.quantity, fill.price, fill.maker_order_id
        );
    }
    println!(
        "Filled {} / resting {} for order {}",
        result.filled_quantity, result.resting_quantity, result.order_id
    );

    // Pull the remainder back out of the book
    let cancelled = engine.cancel(result.order_id)?;
    println!("Cancelled {} @ {}", cancelled.cancelled_quantity, cancelled.price);

    // Rejections are ordinary errors
    if let Err(err) = engine.submit(OrderRequest::buy("BTC-USD", Price::from_parts(100, 10_000_000)?, 1)) {
        println!("Rejected: {}", err);
    }

    // Final snapshot
    println!("\n=== Final Order Book ===");
    let final_snapshot = engine.book_snapshot("BTC-USD");
    println!("Bids: {} levels", final_snapshot.bids.len());
    println!("Asks: {} levels", final_snapshot.asks.len());
    println!("Spread: {:?}", final_snapshot.spread.map(|s| s.to_string()));

    engine.shutdown();
    Ok(())
}
