use super::{
    require_optimal, ConstrSense, LinExpr, ObjectiveSense, SolverAdapter, SolverConfig,
    SolverError, Status, VarId,
};
use log::{debug, error, trace, warn};
use std::ops::Range;

struct Column {
    name: String,
    bounds: (f64, f64),
    objective: f64,
    binary: bool,
}

struct Row {
    name: String,
    terms: Vec<(VarId, f64)>,
    sense: ConstrSense,
    rhs: f64,
}

impl Row {
    /// Whether a row without any variable holds, i.e. `0 sense rhs`
    fn holds_without_terms(&self) -> bool {
        match self.sense {
            ConstrSense::Less => 0.0 <= self.rhs,
            ConstrSense::Equal => self.rhs == 0.0,
            ConstrSense::Greater => 0.0 >= self.rhs,
        }
    }
}

/// Pure Rust engine backed by `microlp`.
///
/// The model is collected column by column and row by row, and only handed to `microlp`
/// when [`SolverAdapter::optimize`] is called. It has no time or gap limit: the search
/// always runs to proven optimality.
pub struct MicrolpSolver {
    columns: Vec<Column>,
    rows: Vec<Row>,
    sense: ObjectiveSense,
    status: Option<Status>,
    values: Vec<f64>,
    objective: f64,
}

impl MicrolpSolver {
    fn add_column(&mut self, column: Column) -> VarId {
        trace!("column {}: {}", self.columns.len(), column.name);
        self.columns.push(column);
        VarId(self.columns.len() - 1)
    }
}

impl SolverAdapter for MicrolpSolver {
    fn new(config: &SolverConfig) -> Result<Self, SolverError> {
        if config.time_limit.is_some() {
            warn!("microlp does not support a time limit, ignoring it");
        }
        if config.mip_gap.is_some() {
            warn!("microlp does not support a MIP gap, ignoring it");
        }
        if config.threads.is_some() {
            warn!("microlp is single threaded, ignoring the thread count");
        }
        if config.solver_output {
            warn!("microlp has no progress output of its own");
        }

        Ok(MicrolpSolver {
            columns: Vec::new(),
            rows: Vec::new(),
            sense: ObjectiveSense::Minimize,
            status: None,
            values: Vec::new(),
            objective: 0.0,
        })
    }

    fn add_binary_variable(&mut self, name: &str, objective: f64) -> Result<VarId, SolverError> {
        Ok(self.add_column(Column {
            name: name.to_string(),
            bounds: (0.0, 1.0),
            objective,
            binary: true,
        }))
    }

    fn add_continuous_variable(
        &mut self,
        name: &str,
        bounds: Range<f64>,
        objective: f64,
    ) -> Result<VarId, SolverError> {
        if bounds.start > bounds.end || bounds.start.is_nan() || bounds.end.is_nan() {
            return Err(SolverError::Engine(format!(
                "invalid bounds {:?} for variable {}",
                bounds, name
            )));
        }
        Ok(self.add_column(Column {
            name: name.to_string(),
            bounds: (bounds.start, bounds.end),
            objective,
            binary: false,
        }))
    }

    fn add_constraint(
        &mut self,
        name: &str,
        lhs: LinExpr,
        sense: ConstrSense,
        rhs: LinExpr,
    ) -> Result<(), SolverError> {
        let (terms, rhs) = LinExpr::normalized(&lhs, &rhs);
        if let Some((var, _)) = terms.iter().find(|(var, _)| **var >= self.columns.len()) {
            return Err(SolverError::UnknownVariable(*var));
        }
        if !rhs.is_finite() {
            return Err(SolverError::Engine(format!(
                "constraint {} has a non-finite right-hand side",
                name
            )));
        }

        self.rows.push(Row {
            name: name.to_string(),
            terms,
            sense,
            rhs,
        });
        Ok(())
    }

    fn set_objective_sense(&mut self, sense: ObjectiveSense) -> Result<(), SolverError> {
        self.sense = sense;
        Ok(())
    }

    fn optimize(&mut self) -> Result<Status, SolverError> {
        use ::microlp::{ComparisonOp, OptimizationDirection, Problem};

        debug!(
            "Handing {} columns and {} rows to microlp",
            self.columns.len(),
            self.rows.len()
        );

        let direction = match self.sense {
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
        };
        let mut problem = Problem::new(direction);

        let vars: Vec<_> = self
            .columns
            .iter()
            .map(|column| match column.binary {
                true => problem.add_binary_var(column.objective),
                false => problem.add_var(column.objective, column.bounds),
            })
            .collect();

        for row in &self.rows {
            if row.terms.is_empty() {
                if row.holds_without_terms() {
                    continue;
                }
                debug!("Row {} can never hold", row.name);
                self.status = Some(Status::Infeasible);
                return Ok(Status::Infeasible);
            }

            let op = match row.sense {
                ConstrSense::Less => ComparisonOp::Le,
                ConstrSense::Equal => ComparisonOp::Eq,
                ConstrSense::Greater => ComparisonOp::Ge,
            };
            let terms: Vec<_> = row
                .terms
                .iter()
                .map(|(var, coeff)| (vars[**var], *coeff))
                .collect();
            problem.add_constraint(terms, op, row.rhs);
        }

        let status = match problem.solve() {
            Ok(solution) => {
                self.values = vars.iter().map(|var| solution[*var]).collect();
                self.objective = solution.objective();
                Status::Optimal
            }
            Err(::microlp::Error::Infeasible) => Status::Infeasible,
            Err(::microlp::Error::Unbounded) => Status::Unbounded,
            Err(err) => {
                error!("microlp failed: {}", err);
                Status::Error
            }
        };

        debug!("microlp finished with status {}", status);
        self.status = Some(status);
        Ok(status)
    }

    fn status(&self) -> Option<Status> {
        self.status
    }

    fn value(&self, var: VarId) -> Result<f64, SolverError> {
        require_optimal(self.status)?;
        self.values
            .get(*var)
            .copied()
            .ok_or(SolverError::UnknownVariable(var))
    }

    fn objective_value(&self) -> Result<f64, SolverError> {
        require_optimal(self.status)?;
        Ok(self.objective)
    }
}
