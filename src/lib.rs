pub mod args;
pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod message;
pub mod prelude;
pub mod printer;
pub mod reply;
pub mod request;
pub mod session;
