//! Common imports for embedding applications.

pub use crate::book::{BookManager, LevelInfo, Order, OrderBook, OrderId, Price, Qty, Side, Trade};
pub use crate::config::EngineConfig;
pub use crate::error::CoreError;
pub use crate::md::{EventFlag, MarketDataEvent, MarketDataHandler};
pub use crate::pool::{Handle, Pool};
pub use crate::quoter::AvellanedaStoikov;
pub use crate::ring::{MpmcRing, SpscRing};
pub use crate::risk::RiskEngine;
pub use crate::signal::ObiSignal;
pub use crate::strategy::{OrderSink, StrategyEngine};
