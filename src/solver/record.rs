use super::{
    ConstrSense, LinExpr, ObjectiveSense, SolverAdapter, SolverConfig, SolverError, Status, VarId,
};
use serde::Serialize;
use std::fmt::Display;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VarKind {
    Binary,
    Continuous,
}

/// A variable as it was handed to the recorder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedVar {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    pub upper: f64,
    pub objective: f64,
}

/// A constraint in normalized form, `terms sense rhs`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedConstr {
    pub name: String,
    pub terms: Vec<(usize, f64)>,
    pub sense: ConstrSense,
    pub rhs: f64,
}

/// An engine that never solves anything, it just keeps the model it was given.
///
/// Used to inspect a formulation (`--dry-run`) and to compare builds structurally.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelRecorder {
    pub vars: Vec<RecordedVar>,
    pub constrs: Vec<RecordedConstr>,
    pub sense: Option<ObjectiveSense>,
}

impl ModelRecorder {
    pub fn stats(&self) -> ModelStats {
        let count = |sense: ConstrSense| self.constrs.iter().filter(|c| c.sense == sense).count();
        ModelStats {
            binary_vars: self
                .vars
                .iter()
                .filter(|v| v.kind == VarKind::Binary)
                .count(),
            continuous_vars: self
                .vars
                .iter()
                .filter(|v| v.kind == VarKind::Continuous)
                .count(),
            less_constrs: count(ConstrSense::Less),
            equal_constrs: count(ConstrSense::Equal),
            greater_constrs: count(ConstrSense::Greater),
            nonzeros: self.constrs.iter().map(|c| c.terms.len()).sum(),
        }
    }

    /// Finds a recorded constraint by name
    pub fn constr(&self, name: &str) -> Option<&RecordedConstr> {
        self.constrs.iter().find(|c| c.name == name)
    }

    /// Finds a recorded variable by name
    pub fn var(&self, name: &str) -> Option<&RecordedVar> {
        self.vars.iter().find(|v| v.name == name)
    }
}

/// Size summary of a recorded model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub binary_vars: usize,
    pub continuous_vars: usize,
    pub less_constrs: usize,
    pub equal_constrs: usize,
    pub greater_constrs: usize,
    pub nonzeros: usize,
}

impl ModelStats {
    pub fn vars(&self) -> usize {
        self.binary_vars + self.continuous_vars
    }

    pub fn constrs(&self) -> usize {
        self.less_constrs + self.equal_constrs + self.greater_constrs
    }
}

impl Display for ModelStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Variables:   {} ({} binary, {} continuous)",
            self.vars(),
            self.binary_vars,
            self.continuous_vars
        )?;
        writeln!(
            f,
            "Constraints: {} ({} <=, {} ==, {} >=)",
            self.constrs(),
            self.less_constrs,
            self.equal_constrs,
            self.greater_constrs
        )?;
        write!(f, "Nonzeros:    {}", self.nonzeros)
    }
}

impl SolverAdapter for ModelRecorder {
    fn new(_config: &SolverConfig) -> Result<Self, SolverError> {
        Ok(ModelRecorder::default())
    }

    fn add_binary_variable(&mut self, name: &str, objective: f64) -> Result<VarId, SolverError> {
        self.vars.push(RecordedVar {
            name: name.to_string(),
            kind: VarKind::Binary,
            lower: 0.0,
            upper: 1.0,
            objective,
        });
        Ok(VarId(self.vars.len() - 1))
    }

    fn add_continuous_variable(
        &mut self,
        name: &str,
        bounds: Range<f64>,
        objective: f64,
    ) -> Result<VarId, SolverError> {
        self.vars.push(RecordedVar {
            name: name.to_string(),
            kind: VarKind::Continuous,
            lower: bounds.start,
            upper: bounds.end,
            objective,
        });
        Ok(VarId(self.vars.len() - 1))
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
        self.constrs.push(RecordedConstr {
            name: name.to_string(),
            terms: terms.into_iter().map(|(v, c)| (*v, c)).collect(),
            sense,
            rhs,
        });
        Ok(())
    }

    fn set_objective_sense(&mut self, sense: ObjectiveSense) -> Result<(), SolverError> {
        self.sense = Some(sense);
        Ok(())
    }

    fn optimize(&mut self) -> Result<Status, SolverError> {
        Err(SolverError::Unsupported("the recorder does not solve models"))
    }

    fn status(&self) -> Option<Status> {
        None
    }

    fn value(&self, _var: VarId) -> Result<f64, SolverError> {
        Err(SolverError::Unsupported("the recorder holds no values"))
    }

    fn objective_value(&self) -> Result<f64, SolverError> {
        Err(SolverError::Unsupported("the recorder holds no values"))
    }
}
