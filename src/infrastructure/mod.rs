pub mod backends;
pub mod config;
pub mod db;
pub mod registry;
pub mod repositories;
