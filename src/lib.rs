pub mod config;
pub mod db;
pub mod error;
pub mod notify;
pub mod scheduler;
pub mod source;
