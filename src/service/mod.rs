//! Runtime services: object mapping, validation and the per-module data-access runtime.

mod dao;
pub mod mapper;
mod validation;
pub use dao::{Dao, DataAccess, DynamicAccess};
pub use validation::RecordValidator;
