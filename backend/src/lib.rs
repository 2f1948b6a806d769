pub mod authz;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod types;
pub mod utils;
pub mod validation;
pub mod workflow;
