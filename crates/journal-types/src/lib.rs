pub mod message;
pub mod event;
pub mod run;
pub mod config;
pub mod error;
pub mod session;
pub mod locale;


pub use error::{ErrorKind, JournalError};
pub type Result<T> = std::result::Result<T, JournalError>;
