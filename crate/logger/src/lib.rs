//! Copyright 2024 Cosmian Tech SAS

pub mod log_utils;

pub use log_utils::log_init;
