use super::model::activity_constraints;
use super::sets_and_parameters::{Parameters, Sets};
use super::Formulation;
use crate::models::utils::AddVars;
use crate::solver::expr::LinSum;
use crate::solver::{ConstrSense, SolverAdapter, SolverError, VarId};
use itertools::iproduct;

#[derive(Debug, Clone, PartialEq)]
pub struct DivisibleDemandVariables {
    /// quantity of product k moved from plant i through facility j to customer r,
    /// indexed `[k][i][j][r]`
    pub s: Vec<Vec<Vec<Vec<VarId>>>>,
}

/// Demand may be split freely: every product of every customer can come from any mix of
/// plants and open facilities.
pub struct DivisibleDemandModel<'a> {
    sets: &'a Sets,
    parameters: &'a Parameters,
}

impl<'a> DivisibleDemandModel<'a> {
    pub fn new(sets: &'a Sets, parameters: &'a Parameters) -> DivisibleDemandModel<'a> {
        DivisibleDemandModel { sets, parameters }
    }

    /// Every customer receives exactly its demand of every product
    fn demand_constraints<S: SolverAdapter>(
        &self,
        solver: &mut S,
        s: &[Vec<Vec<Vec<VarId>>>],
    ) -> Result<(), SolverError> {
        for (r, k) in iproduct!(&self.sets.R, &self.sets.K) {
            let lhs = iproduct!(&self.sets.I, &self.sets.J)
                .map(|(i, j)| &s[*k][*i][*j][*r])
                .lin_sum();
            solver.add_constraint(
                &format!("demand_{}_{}", r, k),
                lhs,
                ConstrSense::Equal,
                self.parameters.D[*r][*k].into(),
            )?;
        }

        Ok(())
    }

    /// Plants ship no more of a product than they can make
    fn capacity_constraints<S: SolverAdapter>(
        &self,
        solver: &mut S,
        s: &[Vec<Vec<Vec<VarId>>>],
    ) -> Result<(), SolverError> {
        for (i, k) in iproduct!(&self.sets.I, &self.sets.K) {
            let lhs = iproduct!(&self.sets.J, &self.sets.R)
                .map(|(j, r)| &s[*k][*i][*j][*r])
                .lin_sum();
            solver.add_constraint(
                &format!("capacity_{}_{}", i, k),
                lhs,
                ConstrSense::Less,
                self.parameters.P[*i][*k].into(),
            )?;
        }

        Ok(())
    }
}

#[allow(non_snake_case)]
impl Formulation for DivisibleDemandModel<'_> {
    type Variables = DivisibleDemandVariables;

    fn build_objective<S: SolverAdapter>(
        &self,
        solver: &mut S,
    ) -> Result<DivisibleDemandVariables, SolverError> {
        let K = self.sets.K.len();
        let I = self.sets.I.len();
        let J = self.sets.J.len();
        let R = self.sets.R.len();
        let parameters = self.parameters;

        // quantity of product k on the path plant i, facility j, customer r
        let s = (K, I, J, R).cont(solver, "s", |(k, i, j, r)| {
            parameters.path_cost(k, i, j, r)
        })?;

        Ok(DivisibleDemandVariables { s })
    }

    fn build_constraints<S: SolverAdapter>(
        &self,
        solver: &mut S,
        z: &[VarId],
        vars: &DivisibleDemandVariables,
    ) -> Result<(), SolverError> {
        self.demand_constraints(solver, &vars.s)?;
        self.capacity_constraints(solver, &vars.s)?;

        let sets = self.sets;
        activity_constraints(solver, sets, self.parameters, z, |j| {
            iproduct!(&sets.I, &sets.R, &sets.K)
                .map(|(i, r, k)| &vars.s[*k][*i][j][*r])
                .lin_sum()
        })
    }
}
