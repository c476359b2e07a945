pub mod activity;
pub mod adapter;
pub mod auth;
pub mod classify;
pub mod cleanup;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod error;
pub mod exif_meta;
pub mod instagram;
pub mod lookups;
pub mod query;
pub mod runner;
pub mod tools;
pub mod whois;
