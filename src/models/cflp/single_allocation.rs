use super::model::activity_constraints;
use super::sets_and_parameters::{Parameters, Sets};
use super::Formulation;
use crate::models::utils::AddVars;
use crate::solver::expr::LinSum;
use crate::solver::{ConstrSense, LinExpr, SolverAdapter, SolverError, VarId};
use itertools::iproduct;

#[derive(Debug, Clone, PartialEq)]
pub struct SingleAllocationVariables {
    /// quantity of product k shipped from plant i to facility j, indexed `[k][i][j]`
    pub x: Vec<Vec<Vec<VarId>>>,
    /// 1 if customer r is served by facility j, indexed `[j][r]`
    pub y: Vec<Vec<VarId>>,
}

/// Every customer receives its whole bundle of products from exactly one open facility.
/// Facilities are supplied by the plants through the `x` flows, and each facility must
/// take in exactly what its assigned customers demand.
pub struct SingleAllocationModel<'a> {
    sets: &'a Sets,
    parameters: &'a Parameters,
}

#[allow(non_snake_case)]
impl<'a> SingleAllocationModel<'a> {
    pub fn new(sets: &'a Sets, parameters: &'a Parameters) -> SingleAllocationModel<'a> {
        SingleAllocationModel { sets, parameters }
    }

    /// Each customer is assigned to exactly one facility
    fn assignment_constraints<S: SolverAdapter>(
        &self,
        solver: &mut S,
        y: &[Vec<VarId>],
    ) -> Result<(), SolverError> {
        for r in &self.sets.R {
            let lhs = self.sets.J.iter().map(|j| &y[*j][*r]).lin_sum();
            solver.add_constraint(
                &format!("assign_{}", r),
                lhs,
                ConstrSense::Equal,
                1.0.into(),
            )?;
        }

        Ok(())
    }

    /// Plants ship no more of a product than they can make
    fn capacity_constraints<S: SolverAdapter>(
        &self,
        solver: &mut S,
        x: &[Vec<Vec<VarId>>],
    ) -> Result<(), SolverError> {
        for (i, k) in iproduct!(&self.sets.I, &self.sets.K) {
            let lhs = self.sets.J.iter().map(|j| &x[*k][*i][*j]).lin_sum();
            solver.add_constraint(
                &format!("capacity_{}_{}", i, k),
                lhs,
                ConstrSense::Less,
                self.parameters.P[*i][*k].into(),
            )?;
        }

        Ok(())
    }

    /// What a facility takes in of a product equals what its customers demand of it
    fn balance_constraints<S: SolverAdapter>(
        &self,
        solver: &mut S,
        vars: &SingleAllocationVariables,
    ) -> Result<(), SolverError> {
        let D = &self.parameters.D;

        for (j, k) in iproduct!(&self.sets.J, &self.sets.K) {
            let inflow = self.sets.I.iter().map(|i| &vars.x[*k][*i][*j]).lin_sum();
            let outflow = self
                .sets
                .R
                .iter()
                .map(|r| (D[*r][*k], vars.y[*j][*r]))
                .collect();
            solver.add_constraint(
                &format!("balance_{}_{}", j, k),
                inflow,
                ConstrSense::Equal,
                outflow,
            )?;
        }

        Ok(())
    }
}

#[allow(non_snake_case)]
impl Formulation for SingleAllocationModel<'_> {
    type Variables = SingleAllocationVariables;

    fn build_objective<S: SolverAdapter>(
        &self,
        solver: &mut S,
    ) -> Result<SingleAllocationVariables, SolverError> {
        let K = self.sets.K.len();
        let I = self.sets.I.len();
        let J = self.sets.J.len();
        let R = self.sets.R.len();
        let parameters = self.parameters;

        // quantity of product k shipped from plant i to facility j
        let x = (K, I, J).cont(solver, "x", |(k, i, j)| parameters.inbound_cost(k, i, j))?;

        // 1 if facility j serves customer r, paying for the delivery and handling of the
        // whole bundle
        let y = (J, R).binary(solver, "y", |(j, r)| parameters.assignment_cost(j, r))?;

        Ok(SingleAllocationVariables { x, y })
    }

    fn build_constraints<S: SolverAdapter>(
        &self,
        solver: &mut S,
        z: &[VarId],
        vars: &SingleAllocationVariables,
    ) -> Result<(), SolverError> {
        self.assignment_constraints(solver, &vars.y)?;
        self.capacity_constraints(solver, &vars.x)?;

        let bundle = &self.parameters.bundle;
        activity_constraints(solver, self.sets, self.parameters, z, |j| {
            self.sets
                .R
                .iter()
                .map(|r| (bundle[*r], vars.y[j][*r]))
                .collect::<LinExpr>()
        })?;

        self.balance_constraints(solver, vars)
    }
}
