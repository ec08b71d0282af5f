pub mod chat;
pub mod events;
pub mod prompt;
pub mod selection;
pub mod session;
