pub mod mechanism;
pub mod slot;
