//! Tools module - capabilities the model can invoke
//!
//! Contains the capability registry, argument validation, and the finance lookups.

pub mod finance;
pub mod registry;
pub mod schema;

pub use finance::{PriceLookup, PriceQuote, SymbolLookup, YahooFinance};
pub use registry::{Capability, CapabilityRegistry, FnCapability};
