//! The capability surface the model builder depends on.
//!
//! A [`SolverAdapter`] accepts variables and linear constraints, optimizes, and hands back
//! variable values. The engines themselves live behind it: [`MicrolpSolver`] (pure Rust,
//! the default), `GurobiSolver` (feature `gurobi`) and [`ModelRecorder`], which only
//! records what it is given.

pub mod expr;
#[cfg(feature = "gurobi")]
pub mod gurobi;
pub mod microlp;
pub mod record;

use derive_more::{Deref, Display, From, Into};
use serde::Serialize;
use std::ops::Range;
use std::time::Duration;

pub use self::expr::LinExpr;
#[cfg(feature = "gurobi")]
pub use self::gurobi::GurobiSolver;
pub use self::microlp::MicrolpSolver;
pub use self::record::ModelRecorder;

/// Handle to a variable inside a solver adapter. Handles are handed out in creation order.
#[derive(Deref, Debug, Display, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
#[display(fmt = "#{}", _0)]
pub struct VarId(usize);

/// Relation between the left- and right-hand side of a constraint
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConstrSense {
    #[display(fmt = "<=")]
    Less,
    #[display(fmt = "==")]
    Equal,
    #[display(fmt = ">=")]
    Greater,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

/// Outcome of a call to [`SolverAdapter::optimize`]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[display(fmt = "OPTIMAL")]
    Optimal,
    #[display(fmt = "INFEASIBLE")]
    Infeasible,
    #[display(fmt = "UNBOUNDED")]
    Unbounded,
    #[display(fmt = "TIME_LIMIT")]
    TimeLimit,
    #[display(fmt = "ERROR")]
    Error,
}

impl Status {
    pub fn is_optimal(&self) -> bool {
        matches!(self, Status::Optimal)
    }
}

/// Options handed to an engine when it is created. Engines that cannot honour an option
/// log a warning and carry on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverConfig {
    /// Wall clock limit for `optimize`
    pub time_limit: Option<Duration>,
    /// Relative MIP gap at which the search stops
    pub mip_gap: Option<f64>,
    /// Number of threads the engine may use
    pub threads: Option<usize>,
    /// Let the engine print its own progress log
    pub solver_output: bool,
}

#[derive(Debug, Display)]
pub enum SolverError {
    /// The engine rejected an operation
    #[display(fmt = "solver engine error: {}", _0)]
    Engine(String),
    /// The handle was not created by this adapter
    #[display(fmt = "unknown variable {}", _0)]
    UnknownVariable(VarId),
    /// Values were requested without an optimal solution being available
    #[display(fmt = "no solution available (status: {})", _0)]
    NoSolution(Status),
    /// The adapter does not provide the operation
    #[display(fmt = "operation not supported by this engine: {}", _0)]
    Unsupported(&'static str),
}

impl std::error::Error for SolverError {}

/// The operations the model builder and the reporter need from a MILP engine.
///
/// Dropping an adapter releases every native resource it holds, so an early return with
/// `?` never leaks an engine model.
pub trait SolverAdapter {
    /// Acquire the engine resources
    fn new(config: &SolverConfig) -> Result<Self, SolverError>
    where
        Self: Sized;

    /// Add a {0, 1} variable with the given objective coefficient
    fn add_binary_variable(&mut self, name: &str, objective: f64) -> Result<VarId, SolverError>;

    /// Add a continuous variable within `bounds` (both ends inclusive, either may be infinite)
    fn add_continuous_variable(
        &mut self,
        name: &str,
        bounds: Range<f64>,
        objective: f64,
    ) -> Result<VarId, SolverError>;

    /// Add the constraint `lhs sense rhs`
    fn add_constraint(
        &mut self,
        name: &str,
        lhs: LinExpr,
        sense: ConstrSense,
        rhs: LinExpr,
    ) -> Result<(), SolverError>;

    fn set_objective_sense(&mut self, sense: ObjectiveSense) -> Result<(), SolverError>;

    /// Run the engine. Blocks until it reports a final status.
    fn optimize(&mut self) -> Result<Status, SolverError>;

    /// The status reported by the last call to `optimize`, if any
    fn status(&self) -> Option<Status>;

    /// Value of `var` in the optimal solution
    fn value(&self, var: VarId) -> Result<f64, SolverError>;

    /// Objective value of the optimal solution
    fn objective_value(&self) -> Result<f64, SolverError>;

    /// Release the engine resources. Equivalent to dropping the adapter.
    fn dispose(self)
    where
        Self: Sized,
    {
    }
}

/// Checks that values may be read, i.e. that the last solve ended in an optimal status.
pub(crate) fn require_optimal(status: Option<Status>) -> Result<(), SolverError> {
    match status {
        Some(Status::Optimal) => Ok(()),
        Some(other) => Err(SolverError::NoSolution(other)),
        None => Err(SolverError::Unsupported("reading values before optimize")),
    }
}
