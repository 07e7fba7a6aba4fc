mod book;
mod suggestion;

pub use book::{Book, BookPatch, NewBook};
pub use suggestion::{BookSearchResult, BookSuggestion};
