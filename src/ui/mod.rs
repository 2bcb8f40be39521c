//! Terminal presentation: the page, the launcher bar and the chat panel

pub mod app;
pub mod conversation;

pub use app::run;
