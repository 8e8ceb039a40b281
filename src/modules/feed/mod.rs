pub mod filter;
pub mod model;
pub mod repository;
pub mod repository_http;
pub mod service;
