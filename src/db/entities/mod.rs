pub mod author_questions;
pub mod authors;
pub mod notify_history;
pub mod notify_receivers;
pub mod questions;
