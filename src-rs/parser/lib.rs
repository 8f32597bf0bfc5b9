pub mod command;
pub mod executor;
pub mod resolver;
pub mod types;

pub use command::CommandParser;
pub use executor::{ExecutionMode, ParserExecutor};
pub use types::{Backend, DocumentParser, ParseJob, ParseMethod, ParseOptions, ParserError};
