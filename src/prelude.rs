pub use crate::args::{Args, Commands, Output, Style};
pub use crate::client::{Endpoint, HttpEndpoint};
pub use crate::config::{Config, Settings};
pub use crate::error::Error;
pub use crate::message::{Conversation, Message, Role};
pub use crate::printer::Printer;
pub use crate::session::Session;

pub type Result<T> = std::result::Result<T, Error>;
