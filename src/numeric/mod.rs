// ============================================================================
// Numeric Module
// Fixed-point prices and integer quantities for the matching core
// ============================================================================
//
// - Price: i64 scaled by 10^8, so price comparison and crossing checks never
//   touch floating point
// - Quantity: whole units, the book never holds fractional size
// - NumericError: failures while parsing or combining values

mod errors;
mod price;

pub use errors::{NumericError, NumericResult};
pub use price::Price;

/// Order and trade size in whole units
pub type Quantity = u64;
