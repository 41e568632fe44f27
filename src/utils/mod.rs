//! Utility functions and types

pub mod data_loader;

pub use data_loader::{normalize_non_finite, DataLoader, FileFormat};
