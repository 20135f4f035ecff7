pub mod client;
pub mod collation;
pub mod games;
pub mod rawg;
pub mod sort;

pub use games::{Game, GameDraft, GameField, GameId, GameStatus, ListKind, ValidationError};
pub use sort::{SortConfig, SortDirection, SortKey};
