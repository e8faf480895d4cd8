pub mod cflp;
pub mod utils;

pub use cflp::{CflpModel, CflpSolver, ModelBuilder};
