//! CLI command handling

pub mod classify;
pub mod output;
pub mod permissions;
pub mod query;
pub mod relay;

pub use classify::*;
pub use output::*;
pub use permissions::*;
pub use query::*;
pub use relay::*;
