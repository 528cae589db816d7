#![doc = include_str!("../README.md")]

/// Baidu Cloud Object Storage client
pub mod bos;
pub mod config;
/// Credentials used to sign bos requests
pub mod credentials;
pub mod key;
pub mod listing;
pub mod memory;
pub mod progress;
pub mod repo;
pub mod storage;
pub mod wagon;
