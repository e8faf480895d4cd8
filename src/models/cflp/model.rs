use super::divisible_demand::{DivisibleDemandModel, DivisibleDemandVariables};
use super::sets_and_parameters::{Parameters, Sets};
use super::single_allocation::{SingleAllocationModel, SingleAllocationVariables};
use super::{Formulation, ModelError};
use crate::error::{CflpError, InputError};
use crate::models::utils::AddVars;
use crate::problem::{FacilityIndex, InputData, Variant};
use crate::report::Report;
use crate::solver::expr::LinSum;
use crate::solver::record::ModelStats;
use crate::solver::{
    ConstrSense, LinExpr, ModelRecorder, ObjectiveSense, SolverAdapter, SolverConfig, SolverError,
    VarId,
};
use log::{debug, info, warn};

/// Flow variables of whichever variant was built
#[derive(Debug, Clone, PartialEq)]
pub enum FlowVariables {
    Single(SingleAllocationVariables),
    Divisible(DivisibleDemandVariables),
}

/// Handles to every variable of a built model
#[derive(Debug, Clone, PartialEq)]
pub struct CflpModel {
    /// 1 if facility j is open
    pub z: Vec<VarId>,
    pub flows: FlowVariables,
}

impl CflpModel {
    /// The variant the flow variables belong to
    pub fn variant(&self) -> Variant {
        match self.flows {
            FlowVariables::Single(_) => Variant::SingleAllocation,
            FlowVariables::Divisible(_) => Variant::DivisibleDemand,
        }
    }
}

/// Bounds the throughput of every facility by its own activity levels, scaled by whether it
/// is open: a closed facility handles nothing, an open one between `Q_min` and `Q_max`.
pub(super) fn activity_constraints<S: SolverAdapter>(
    solver: &mut S,
    sets: &Sets,
    parameters: &Parameters,
    z: &[VarId],
    mut throughput: impl FnMut(FacilityIndex) -> LinExpr,
) -> Result<(), SolverError> {
    for j in &sets.J {
        let activity = throughput(*j);
        solver.add_constraint(
            &format!("max_activity_{}", j),
            activity.clone(),
            ConstrSense::Less,
            LinExpr::term(parameters.Q_max[*j], z[*j]),
        )?;
        solver.add_constraint(
            &format!("min_activity_{}", j),
            activity,
            ConstrSense::Greater,
            LinExpr::term(parameters.Q_min[*j], z[*j]),
        )?;
    }

    Ok(())
}

/// Turns a validated instance into a MILP inside a solver adapter
pub struct ModelBuilder {
    variant: Variant,
    sets: Sets,
    parameters: Parameters,
}

impl ModelBuilder {
    /// Checks once more that `p <= J` and that no facility has its minimum activity above
    /// its maximum, so that no engine is touched for an instance that cannot be built
    pub fn new(data: &InputData, variant: Variant) -> Result<ModelBuilder, ModelError> {
        data.check_parameters().map_err(|err| match err {
            InputError::InvalidParameter(reason) => ModelError::InvalidParameter(reason),
            other => ModelError::InvalidParameter(other.to_string()),
        })?;

        Ok(ModelBuilder {
            variant,
            sets: Sets::new(data),
            parameters: Parameters::new(data),
        })
    }

    /// Emits the variables, the objective and the constraints of the chosen variant
    pub fn build<S: SolverAdapter>(&self, solver: &mut S) -> Result<CflpModel, ModelError> {
        info!("Building {} model", self.variant);

        if !self.parameters.covers_demand() {
            warn!("The plants cannot cover the demand of every product, the model is infeasible");
        }

        let parameters = &self.parameters;

        // 1 if facility j is open, paying its fixed cost
        let z = self.sets.J.len().binary(solver, "z", |j| parameters.F[j])?;
        solver.set_objective_sense(ObjectiveSense::Minimize)?;

        let flows = match self.variant {
            Variant::SingleAllocation => {
                let formulation = SingleAllocationModel::new(&self.sets, &self.parameters);
                let vars = formulation.build_objective(solver)?;
                self.open_facilities_constraint(solver, &z)?;
                formulation.build_constraints(solver, &z, &vars)?;
                FlowVariables::Single(vars)
            }
            Variant::DivisibleDemand => {
                let formulation = DivisibleDemandModel::new(&self.sets, &self.parameters);
                let vars = formulation.build_objective(solver)?;
                self.open_facilities_constraint(solver, &z)?;
                formulation.build_constraints(solver, &z, &vars)?;
                FlowVariables::Divisible(vars)
            }
        };

        info!("Successfully built {} model", self.variant);
        Ok(CflpModel { z, flows })
    }

    /// Exactly `p` facilities are opened
    fn open_facilities_constraint<S: SolverAdapter>(
        &self,
        solver: &mut S,
        z: &[VarId],
    ) -> Result<(), SolverError> {
        solver.add_constraint(
            "open_facilities",
            z.iter().lin_sum(),
            ConstrSense::Equal,
            self.parameters.p.into(),
        )
    }
}

/// The whole pipeline for one instance: build, optimize, report
pub struct CflpSolver {}

impl CflpSolver {
    /// Solves `data` under `variant` with the engine `S`.
    ///
    /// The engine is only created once the instance has passed validation, and it is
    /// released when this returns, whether it succeeds or not. A solve that does not end
    /// in an optimal status still yields a report, carrying only that status.
    pub fn solve<S: SolverAdapter>(
        data: &InputData,
        variant: Variant,
        config: &SolverConfig,
    ) -> Result<Report, CflpError> {
        let builder = ModelBuilder::new(data, variant)?;

        let mut solver = S::new(config)?;
        let model = builder.build(&mut solver)?;

        info!("Optimizing {} model", variant);
        let status = solver.optimize()?;
        info!("Solve finished with status {}", status);

        let report = Report::new(data, &model, &solver)?;
        solver.dispose();

        Ok(report)
    }

    /// Builds the model without solving it and returns its size
    pub fn dry_run(data: &InputData, variant: Variant) -> Result<ModelStats, CflpError> {
        let builder = ModelBuilder::new(data, variant)?;
        let mut recorder = ModelRecorder::default();
        builder.build(&mut recorder)?;

        let stats = recorder.stats();
        debug!("{} model statistics:\n{}", variant, stats);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::utils::ConvertVars;
    use crate::problem::fixtures::*;
    use crate::solver::{MicrolpSolver, Status};
    use itertools::iproduct;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::ops::Range;

    const EPS: f64 = 1e-6;

    fn record(data: &InputData, variant: Variant) -> (ModelRecorder, CflpModel) {
        let mut rec = ModelRecorder::default();
        let model = ModelBuilder::new(data, variant)
            .unwrap()
            .build(&mut rec)
            .unwrap();
        (rec, model)
    }

    fn index(rec: &ModelRecorder, name: &str) -> usize {
        rec.vars.iter().position(|v| v.name == name).unwrap()
    }

    /// An engine that fails the test if anything reaches it
    struct Untouchable;

    impl SolverAdapter for Untouchable {
        fn new(_: &SolverConfig) -> Result<Self, SolverError> {
            panic!("the engine must not be created")
        }
        fn add_binary_variable(&mut self, _: &str, _: f64) -> Result<VarId, SolverError> {
            unreachable!()
        }
        fn add_continuous_variable(
            &mut self,
            _: &str,
            _: Range<f64>,
            _: f64,
        ) -> Result<VarId, SolverError> {
            unreachable!()
        }
        fn add_constraint(
            &mut self,
            _: &str,
            _: LinExpr,
            _: ConstrSense,
            _: LinExpr,
        ) -> Result<(), SolverError> {
            unreachable!()
        }
        fn set_objective_sense(&mut self, _: ObjectiveSense) -> Result<(), SolverError> {
            unreachable!()
        }
        fn optimize(&mut self) -> Result<Status, SolverError> {
            unreachable!()
        }
        fn status(&self) -> Option<Status> {
            unreachable!()
        }
        fn value(&self, _: VarId) -> Result<f64, SolverError> {
            unreachable!()
        }
        fn objective_value(&self) -> Result<f64, SolverError> {
            unreachable!()
        }
    }

    #[test]
    fn single_allocation_structure() {
        let data = InputData::new(two_by_two(), 1).unwrap();
        let (rec, _) = record(&data, Variant::SingleAllocation);

        let stats = rec.stats();
        assert_eq!(stats.binary_vars, 2 + 4);
        assert_eq!(stats.continuous_vars, 4);
        // count, 2 assignments, 2 capacities, 2 x 2 activity bounds, 2 balances
        assert_eq!(stats.constrs(), 11);
        assert_eq!(rec.sense, Some(ObjectiveSense::Minimize));

        // 50 y_0_0 + 50 y_0_1 - 200 z_0 <= 0
        let max_activity = rec.constr("max_activity_0").unwrap();
        assert_eq!(max_activity.sense, ConstrSense::Less);
        assert_eq!(max_activity.rhs, 0.0);
        assert_eq!(
            max_activity.terms,
            vec![
                (index(&rec, "z_0"), -200.0),
                (index(&rec, "y_0_0"), 50.0),
                (index(&rec, "y_0_1"), 50.0),
            ]
        );

        // x_0_0_1 + x_0_1_1 - 50 y_1_0 - 50 y_1_1 == 0
        let balance = rec.constr("balance_1_0").unwrap();
        assert_eq!(balance.sense, ConstrSense::Equal);
        assert_eq!(balance.terms.len(), 4);
        assert!(balance.terms.contains(&(index(&rec, "y_1_1"), -50.0)));

        assert_eq!(rec.var("z_1").unwrap().objective, 20.0);
        assert_eq!(rec.var("x_0_1_0").unwrap().objective, 1.0);
        assert_eq!(rec.var("y_0_1").unwrap().objective, 100.0);
        assert_eq!(rec.constr("open_facilities").unwrap().rhs, 1.0);
    }

    #[test]
    fn divisible_demand_structure() {
        let data = InputData::new(two_by_two(), 1).unwrap();
        let (rec, _) = record(&data, Variant::DivisibleDemand);

        let stats = rec.stats();
        assert_eq!(stats.binary_vars, 2);
        assert_eq!(stats.continuous_vars, 8);
        // count, 2 demands, 2 capacities, 2 x 2 activity bounds
        assert_eq!(stats.constrs(), 9);

        let demand = rec.constr("demand_1_0").unwrap();
        assert_eq!(demand.sense, ConstrSense::Equal);
        assert_eq!(demand.rhs, 50.0);
        assert_eq!(demand.terms.len(), 4);

        // c_k * (l_ij + l_jr) + g_j
        assert_eq!(rec.var("s_0_1_0_1").unwrap().objective, 3.0);
        assert!(rec.constr("balance_0_0").is_none());
    }

    #[test]
    fn min_activity_links_throughput_to_the_open_facility() {
        let mut tables = two_by_two();
        tables.min_activity = vec![30, 0];
        let data = InputData::new(tables, 1).unwrap();

        // 50 y_0_0 + 50 y_0_1 - 30 z_0 >= 0
        let (rec, _) = record(&data, Variant::SingleAllocation);
        let min_activity = rec.constr("min_activity_0").unwrap();
        assert_eq!(min_activity.sense, ConstrSense::Greater);
        assert_eq!(min_activity.rhs, 0.0);
        assert_eq!(
            min_activity.terms,
            vec![
                (index(&rec, "z_0"), -30.0),
                (index(&rec, "y_0_0"), 50.0),
                (index(&rec, "y_0_1"), 50.0),
            ]
        );

        // every path through facility 0, minus 30 z_0, is at least 0
        let (rec, _) = record(&data, Variant::DivisibleDemand);
        let min_activity = rec.constr("min_activity_0").unwrap();
        assert_eq!(min_activity.sense, ConstrSense::Greater);
        assert_eq!(min_activity.rhs, 0.0);
        assert_eq!(min_activity.terms.len(), 5);
        assert_eq!(min_activity.terms[0], (index(&rec, "z_0"), -30.0));
        for (i, r) in iproduct!(0..2, 0..2) {
            let s = index(&rec, &format!("s_0_{}_0_{}", i, r));
            assert!(min_activity.terms.contains(&(s, 1.0)));
        }
    }

    #[test]
    fn unreachable_min_activity_opens_the_dearer_facility() {
        // facility 1 is cheaper but needs 200 units, the customers only want 100
        let mut tables = two_by_two();
        tables.min_activity = vec![200, 0];
        tables.max_activity = vec![300, 200];
        let data = InputData::new(tables, 1).unwrap();

        for variant in [Variant::SingleAllocation, Variant::DivisibleDemand] {
            let report =
                CflpSolver::solve::<MicrolpSolver>(&data, variant, &SolverConfig::default())
                    .unwrap();
            assert_eq!(report.status, Status::Optimal);
            // fixed 20, inbound 100 x 1, outbound 100 x 1, marginal 100 x 1
            assert!((report.total_cost.unwrap() - 320.0).abs() < EPS);
            assert_eq!(report.open_facilities(), vec![1]);
        }
    }

    #[test]
    fn building_twice_gives_the_same_model() {
        let data = InputData::new(split_bundle(), 2).unwrap();
        for variant in [Variant::SingleAllocation, Variant::DivisibleDemand] {
            let (first, first_vars) = record(&data, variant);
            let (second, second_vars) = record(&data, variant);
            assert_eq!(first, second);
            assert_eq!(first_vars, second_vars);
        }
    }

    #[test]
    fn min_activity_above_max_never_reaches_the_engine() {
        let data = InputData::new(two_by_two(), 1)
            .unwrap()
            .with_activity_unchecked(0, 9999, 200);

        assert!(matches!(
            ModelBuilder::new(&data, Variant::SingleAllocation),
            Err(ModelError::InvalidParameter(_))
        ));
        let result = CflpSolver::solve::<Untouchable>(
            &data,
            Variant::SingleAllocation,
            &SolverConfig::default(),
        );
        assert!(matches!(
            result,
            Err(CflpError::Model(ModelError::InvalidParameter(_)))
        ));
    }

    #[test]
    fn too_many_open_facilities_never_reach_the_engine() {
        let data = InputData::new(two_by_two(), 1)
            .unwrap()
            .with_open_facilities_unchecked(3);

        for variant in [Variant::SingleAllocation, Variant::DivisibleDemand] {
            let result = CflpSolver::solve::<Untouchable>(&data, variant, &SolverConfig::default());
            assert!(matches!(
                result,
                Err(CflpError::Model(ModelError::InvalidParameter(_)))
            ));
        }
    }

    #[test]
    fn dry_run_reports_the_model_size() {
        let data = InputData::new(two_by_two(), 1).unwrap();
        let stats = CflpSolver::dry_run(&data, Variant::DivisibleDemand).unwrap();
        assert_eq!(stats.vars(), 10);
        assert_eq!(stats.equal_constrs, 3);
    }

    #[test]
    fn two_by_two_opens_the_cheaper_facility() {
        let data = InputData::new(two_by_two(), 1).unwrap();

        for variant in [Variant::SingleAllocation, Variant::DivisibleDemand] {
            let report =
                CflpSolver::solve::<MicrolpSolver>(&data, variant, &SolverConfig::default())
                    .unwrap();
            assert_eq!(report.status, Status::Optimal);
            // fixed 10, inbound 100 x 1, outbound 100 x 1, marginal 100 x 1
            assert!((report.total_cost.unwrap() - 310.0).abs() < EPS);
            assert_eq!(report.open_facilities(), vec![0]);
        }
    }

    #[test]
    fn single_allocation_keeps_the_bundle_together() {
        let data = InputData::new(split_bundle(), 2).unwrap();
        let mut solver = MicrolpSolver::new(&SolverConfig::default()).unwrap();
        let model = ModelBuilder::new(&data, Variant::SingleAllocation)
            .unwrap()
            .build(&mut solver)
            .unwrap();
        assert_eq!(solver.optimize().unwrap(), Status::Optimal);
        // one leg of 10 units over distance 10 cannot be avoided
        assert!((solver.objective_value().unwrap() - 130.0).abs() < EPS);

        let vars = match &model.flows {
            FlowVariables::Single(vars) => vars,
            other => panic!("unexpected variables {:?}", other),
        };
        let y = vars.y.convert(&solver).unwrap();
        let serving: Vec<_> = (0..2).filter(|j| y[*j][0] > 0.99).collect();
        assert_eq!(serving.len(), 1);
    }

    #[test]
    fn divisible_demand_splits_the_bundle() {
        let data = InputData::new(split_bundle(), 2).unwrap();
        let mut solver = MicrolpSolver::new(&SolverConfig::default()).unwrap();
        let model = ModelBuilder::new(&data, Variant::DivisibleDemand)
            .unwrap()
            .build(&mut solver)
            .unwrap();
        assert_eq!(solver.optimize().unwrap(), Status::Optimal);
        assert!((solver.objective_value().unwrap() - 40.0).abs() < EPS);

        let vars = match &model.flows {
            FlowVariables::Divisible(vars) => vars,
            other => panic!("unexpected variables {:?}", other),
        };
        let s = vars.s.convert(&solver).unwrap();
        // product 1 from plant 1 through facility 1, product 2 from plant 2 through facility 2
        assert!((s[0][0][0][0] - 10.0).abs() < EPS);
        assert!((s[1][1][1][0] - 10.0).abs() < EPS);
    }

    #[allow(non_snake_case)]
    fn check_single_allocation(
        data: &InputData,
        solver: &MicrolpSolver,
        vars: &SingleAllocationVariables,
        z: &[f64],
    ) {
        let x = vars.x.convert(solver).unwrap();
        let y = vars.y.convert(solver).unwrap();
        let (K, I, J, R) = (data.products(), data.plants(), data.facilities(), data.customers());

        for r in 0..R {
            let serving = (0..J).filter(|j| y[*j][r] > 0.99).count();
            assert_eq!(serving, 1, "customer {} is served by {} facilities", r, serving);
        }

        for (j, k) in iproduct!(0..J, 0..K) {
            let inflow: f64 = (0..I).map(|i| x[k][i][j]).sum();
            let outflow: f64 = (0..R)
                .map(|r| data.demand(r, k) as f64 * y[j][r])
                .sum();
            assert!((inflow - outflow).abs() < EPS, "facility {} is out of balance", j);
        }

        for (k, i, j) in iproduct!(0..K, 0..I, 0..J) {
            if z[j] < 0.5 {
                assert!(x[k][i][j] < EPS, "closed facility {} receives product", j);
            }
        }
        for (j, r) in iproduct!(0..J, 0..R) {
            if z[j] < 0.5 {
                assert!(y[j][r] < EPS, "closed facility {} serves customer {}", j, r);
            }
        }
    }

    #[allow(non_snake_case)]
    fn check_divisible_demand(
        data: &InputData,
        solver: &MicrolpSolver,
        vars: &DivisibleDemandVariables,
        z: &[f64],
    ) {
        let s = vars.s.convert(solver).unwrap();
        let (K, I, J, R) = (data.products(), data.plants(), data.facilities(), data.customers());

        for (r, k) in iproduct!(0..R, 0..K) {
            let delivered: f64 = iproduct!(0..I, 0..J).map(|(i, j)| s[k][i][j][r]).sum();
            assert!((delivered - data.demand(r, k) as f64).abs() < EPS);
        }

        for (k, i, j, r) in iproduct!(0..K, 0..I, 0..J, 0..R) {
            if z[j] < 0.5 {
                assert!(s[k][i][j][r] < EPS, "closed facility {} carries flow", j);
            }
        }
    }

    #[test]
    fn optimal_solutions_respect_the_model_on_random_instances() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let data = random(&mut rng);

            for variant in [Variant::SingleAllocation, Variant::DivisibleDemand] {
                let mut solver = MicrolpSolver::new(&SolverConfig::default()).unwrap();
                let model = ModelBuilder::new(&data, variant)
                    .unwrap()
                    .build(&mut solver)
                    .unwrap();
                assert_eq!(solver.optimize().unwrap(), Status::Optimal);

                let z = model.z.convert(&solver).unwrap();
                let open = z.iter().filter(|z| **z > 0.99).count();
                assert_eq!(open, data.open_facilities());

                match &model.flows {
                    FlowVariables::Single(vars) => {
                        check_single_allocation(&data, &solver, vars, &z)
                    }
                    FlowVariables::Divisible(vars) => {
                        check_divisible_demand(&data, &solver, vars, &z)
                    }
                }
            }
        }
    }
}
