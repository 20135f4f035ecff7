#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("no header row found")]
    MissingHeader,

    #[error("quoted field starting on line {line} is never closed")]
    UnterminatedQuote { line: usize },

    #[error("header {name:?} appears more than once (line {line})")]
    DuplicateHeader { name: String, line: usize },
}
