pub mod error;
pub mod models;
pub mod parse;
pub mod problem;
pub mod report;
pub mod solver;

pub use error::{CflpError, InputError};
pub use models::cflp::ModelError;
pub use models::{CflpModel, CflpSolver, ModelBuilder};
pub use problem::{InputData, Tables, Variant};
pub use report::Report;
