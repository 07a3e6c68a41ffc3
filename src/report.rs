use rust_decimal::{Decimal, RoundingStrategy};

use crate::dispatch::DispatchResult;

/// Success percentage over the full recipient list, rounded to two decimal
/// places. The degenerate zero-total case never reaches the loop, but the
/// guard keeps this total.
pub fn success_percentage(succeeded: usize, total: usize) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(succeeded as u64) / Decimal::from(total as u64) * Decimal::from(100))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Final run summary, printed after the loop has visited every recipient.
pub fn print_summary(result: &DispatchResult) {
    println!();
    println!("=== Transfer Summary ===");
    println!(
        "Successful transfers: {} of {}",
        result.succeeded, result.total
    );
    if result.skipped > 0 {
        println!("Skipped (invalid address): {}", result.skipped);
    }
    if result.failed > 0 {
        println!("Failed: {}", result.failed);
    }
    println!(
        "Success rate: {:.2}%",
        success_percentage(result.succeeded, result.total)
    );
    println!("========================");
}
