// ============================================================================
// Domain Models Module
// Contains all core domain entities and value objects
// ============================================================================

pub mod config;
pub mod fill;
pub mod order;
pub mod order_book;
pub mod price_level;

pub use config::{EngineConfig, InstrumentConfig};
pub use fill::Fill;
pub use order::{Order, OrderId, OrderRequest, Side};
pub use order_book::{DepthLevel, MakerFill, OrderBook, OrderBookSide, OrderBookSnapshot};
pub use price_level::PriceLevel;
