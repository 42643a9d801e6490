pub mod auth;
pub mod pipeline;
pub mod resolver;
pub mod sync;
