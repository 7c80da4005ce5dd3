pub mod handler;
pub mod memory;
pub mod model;
pub mod query;
pub mod service;
