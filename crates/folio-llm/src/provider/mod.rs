//! Hosted model providers

pub mod google;

pub use google::GoogleProvider;
