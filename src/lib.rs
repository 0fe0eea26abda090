pub mod config;
pub mod pose;
pub mod session;
pub mod tracker;
pub mod workout;
