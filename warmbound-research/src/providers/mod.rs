pub mod chat;
pub mod endpoint;
