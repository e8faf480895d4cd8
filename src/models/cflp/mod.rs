//! The capacitated facility location model in its two variants.

pub mod divisible_demand;
pub mod model;
pub mod sets_and_parameters;
pub mod single_allocation;

pub use divisible_demand::{DivisibleDemandModel, DivisibleDemandVariables};
pub use model::{CflpModel, CflpSolver, FlowVariables, ModelBuilder};
pub use sets_and_parameters::{Parameters, Sets};
pub use single_allocation::{SingleAllocationModel, SingleAllocationVariables};

use crate::solver::{SolverAdapter, SolverError, VarId};
use derive_more::Display;

#[derive(Debug, Display)]
pub enum ModelError {
    /// The instance violates a bound the formulation relies on
    #[display(fmt = "invalid parameter: {}", _0)]
    InvalidParameter(String),
    /// The engine rejected a variable or a constraint
    #[display(fmt = "failed to build the model: {}", _0)]
    Construction(SolverError),
}

impl From<SolverError> for ModelError {
    fn from(err: SolverError) -> Self {
        ModelError::Construction(err)
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Construction(err) => Some(err),
            ModelError::InvalidParameter(_) => None,
        }
    }
}

/// The part of the model that differs between the variants: how product flows from the
/// plants through the facilities to the customers.
///
/// The facility variables `z`, their fixed costs and the facility count constraint are
/// shared, and built by [`ModelBuilder`] before a formulation is asked for its share.
pub trait Formulation {
    type Variables;

    /// Creates the flow variables, each carrying its objective coefficient
    fn build_objective<S: SolverAdapter>(
        &self,
        solver: &mut S,
    ) -> Result<Self::Variables, SolverError>;

    /// Adds the constraints on the flow variables and those linking them to `z`
    fn build_constraints<S: SolverAdapter>(
        &self,
        solver: &mut S,
        z: &[VarId],
        vars: &Self::Variables,
    ) -> Result<(), SolverError>;
}
