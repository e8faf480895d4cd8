use super::{
    require_optimal, ConstrSense, LinExpr, ObjectiveSense, SolverAdapter, SolverConfig,
    SolverError, Status, VarId,
};
use grb::prelude::*;
use log::{debug, info};
use std::ops::Range;

impl From<grb::Error> for SolverError {
    fn from(err: grb::Error) -> Self {
        SolverError::Engine(err.to_string())
    }
}

/// Gurobi engine through `grb`.
///
/// Objective coefficients are collected alongside the variables and set as one objective
/// expression right before the model is optimized.
pub struct GurobiSolver {
    model: Model,
    vars: Vec<Var>,
    objective: Vec<f64>,
    sense: grb::ModelSense,
    status: Option<Status>,
}

impl GurobiSolver {
    fn add(
        &mut self,
        name: &str,
        vtype: VarType,
        bounds: Range<f64>,
        objective: f64,
    ) -> Result<VarId, SolverError> {
        let var = self.model.add_var(
            name,
            vtype,
            0.0,
            bounds.start,
            bounds.end,
            std::iter::empty(),
        )?;
        self.vars.push(var);
        self.objective.push(objective);
        Ok(VarId(self.vars.len() - 1))
    }

    fn convert_status(status: grb::Status) -> Status {
        match status {
            grb::Status::Optimal => Status::Optimal,
            grb::Status::Infeasible | grb::Status::InfOrUnbd => Status::Infeasible,
            grb::Status::Unbounded => Status::Unbounded,
            grb::Status::TimeLimit => Status::TimeLimit,
            other => {
                info!("Gurobi stopped with status {:?}", other);
                Status::Error
            }
        }
    }
}

impl SolverAdapter for GurobiSolver {
    fn new(config: &SolverConfig) -> Result<Self, SolverError> {
        let mut model = Model::new("cflp")?;
        if !config.solver_output {
            model.set_param(param::OutputFlag, 0)?;
        }
        if let Some(limit) = config.time_limit {
            model.set_param(param::TimeLimit, limit.as_secs_f64())?;
        }
        if let Some(gap) = config.mip_gap {
            model.set_param(param::MIPGap, gap)?;
        }
        if let Some(threads) = config.threads {
            model.set_param(param::Threads, threads as i32)?;
        }

        Ok(GurobiSolver {
            model,
            vars: Vec::new(),
            objective: Vec::new(),
            sense: grb::ModelSense::Minimize,
            status: None,
        })
    }

    fn add_binary_variable(&mut self, name: &str, objective: f64) -> Result<VarId, SolverError> {
        self.add(name, VarType::Binary, 0.0..1.0, objective)
    }

    fn add_continuous_variable(
        &mut self,
        name: &str,
        bounds: Range<f64>,
        objective: f64,
    ) -> Result<VarId, SolverError> {
        self.add(name, VarType::Continuous, bounds, objective)
    }

    fn add_constraint(
        &mut self,
        name: &str,
        lhs: LinExpr,
        sense: ConstrSense,
        rhs: LinExpr,
    ) -> Result<(), SolverError> {
        let (terms, rhs) = LinExpr::normalized(&lhs, &rhs);
        if let Some((var, _)) = terms.iter().find(|(var, _)| **var >= self.vars.len()) {
            return Err(SolverError::UnknownVariable(*var));
        }

        let lhs = terms
            .iter()
            .map(|(var, coeff)| *coeff * self.vars[**var])
            .grb_sum();
        let constr = match sense {
            ConstrSense::Less => c!(lhs <= rhs),
            ConstrSense::Equal => c!(lhs == rhs),
            ConstrSense::Greater => c!(lhs >= rhs),
        };
        self.model.add_constr(name, constr)?;
        Ok(())
    }

    fn set_objective_sense(&mut self, sense: ObjectiveSense) -> Result<(), SolverError> {
        self.sense = match sense {
            ObjectiveSense::Minimize => grb::ModelSense::Minimize,
            ObjectiveSense::Maximize => grb::ModelSense::Maximize,
        };
        Ok(())
    }

    fn optimize(&mut self) -> Result<Status, SolverError> {
        // pending variables and constraints must be visible before the objective is set
        self.model.update()?;

        let objective = self
            .vars
            .iter()
            .zip(&self.objective)
            .map(|(var, coeff)| *coeff * *var)
            .grb_sum();
        self.model.set_objective(objective, self.sense)?;

        self.model.optimize()?;
        let status = GurobiSolver::convert_status(self.model.status()?);
        debug!("Gurobi finished with status {}", status);

        self.status = Some(status);
        Ok(status)
    }

    fn status(&self) -> Option<Status> {
        self.status
    }

    fn value(&self, var: VarId) -> Result<f64, SolverError> {
        require_optimal(self.status)?;
        let var = self
            .vars
            .get(*var)
            .ok_or(SolverError::UnknownVariable(var))?;
        Ok(self.model.get_obj_attr(attr::X, var)?)
    }

    fn objective_value(&self) -> Result<f64, SolverError> {
        require_optimal(self.status)?;
        Ok(self.model.get_attr(attr::ObjVal)?)
    }

    fn dispose(self) {
        debug!("Releasing Gurobi model with {} variables", self.vars.len());
    }
}
