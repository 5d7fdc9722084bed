pub mod app;
pub mod cli;
pub mod config;
pub mod image;
pub mod output;
pub mod pagination;
pub mod query;
pub mod record;
pub mod store;

#[cfg(test)]
mod tests;
