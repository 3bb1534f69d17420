pub mod conversation;
pub mod display;
pub mod listing;
pub mod message;
