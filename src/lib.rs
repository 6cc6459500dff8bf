extern crate lazy_static;

pub mod app_manager;
pub mod config;
pub mod discovery;
pub mod entk;
pub mod error;
pub mod gulf_coast;
pub mod mat_utils;
pub mod raster;
pub mod sites;
