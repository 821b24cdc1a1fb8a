pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod forms;
pub mod listview;
pub mod manage;
pub mod models;
pub mod render;
pub mod session;
pub mod tally;
pub mod tasks;
