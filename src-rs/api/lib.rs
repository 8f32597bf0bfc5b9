pub use crate::config::GatewayConfig;
pub use crate::error::ApiError;
pub use crate::gateway::Gateway;
pub use crate::result::ParseOutput;
pub use crate::task::{Task, TaskStatus, TaskStore};

pub mod auth;
pub mod handlers;
pub mod server;
