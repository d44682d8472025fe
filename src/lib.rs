pub mod aggregator;
pub mod config;
pub mod directions;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod poller;
pub mod stations;
