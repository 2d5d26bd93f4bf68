pub mod breakdown;
pub mod error;
pub mod fallback;
pub mod history;
pub mod insights;
pub mod model;
pub mod parse;
pub mod ports;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use breakdown::MacroBreakdown;
pub use error::{CollaboratorError, SearchError};
pub use fallback::StaticFallbackTable;
pub use history::{HistorySink, MemoryHistoryStore, SearchHistory};
pub use model::{FoodQuery, FoodRecord, FoodSource, ImagePayload, Nutrients, ResolvedResult};
pub use ports::{FoodDatabase, GenerativeFoodModel};
pub use resolver::{FoodResolver, IdentifyFailurePolicy, ResolverConfig, UnmatchedQueryPolicy};
