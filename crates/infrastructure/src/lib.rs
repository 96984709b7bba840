//! Ferrous Filters Infrastructure Layer
pub mod catalog;
pub mod database;
pub mod http;
pub mod repositories;
pub mod storage;
