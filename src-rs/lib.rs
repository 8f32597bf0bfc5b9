pub mod config;
pub mod error;
pub mod gate;
pub mod gateway;
pub mod helpers;
pub mod result;

#[path = "parser/lib.rs"]
pub mod parser;
#[path = "ingest/lib.rs"]
pub mod ingest;
#[path = "task/lib.rs"]
pub mod task;
#[path = "api/lib.rs"]
pub mod api;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use gateway::Gateway;
pub use result::ParseOutput;
