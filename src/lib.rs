pub mod app_state;
pub mod collector;
pub mod config;
pub mod entities;
pub mod entries;
pub mod extractor;
pub mod fetcher;
pub mod health;
pub mod jobs;
pub mod notify;
pub mod repositories;
pub mod site;
