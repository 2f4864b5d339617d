//! School records service: role-scoped CRUD over colleges, departments, courses, subjects,
//! students, professors and accounts, plus the enrollment lifecycle.

pub mod access;
pub mod config;
pub mod directory;
pub mod enrollment;
pub mod error;
pub mod seed;
pub mod telemetry;

pub use error::{AppError, ServiceError};
