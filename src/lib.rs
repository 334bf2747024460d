pub mod adapter;
pub mod archive;
pub mod chem;
pub mod config;
pub mod domain;
pub mod error;
pub mod formats;
pub mod fs_util;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod recipe;
pub mod sources;
pub mod table;
pub mod transfer;
