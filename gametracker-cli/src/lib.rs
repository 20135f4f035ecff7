pub mod config;
pub mod covers;
pub mod import;
pub mod library;
pub mod storage;

pub use library::{ImportOutcome, Library, LibraryError};
pub use storage::{FileStorage, MemoryStorage, Storage};
