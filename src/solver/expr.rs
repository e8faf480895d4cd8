use super::VarId;
use std::collections::BTreeMap;
use std::iter::FromIterator;

/// A linear expression `sum(coeff * var) + constant`.
///
/// Terms are kept in insertion order and may repeat a variable; [`LinExpr::normalized`]
/// merges them before an expression is handed to an engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinExpr {
    pub fn new() -> LinExpr {
        LinExpr::default()
    }

    pub fn constant(value: f64) -> LinExpr {
        LinExpr {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// `coeff * var`
    pub fn term(coeff: f64, var: VarId) -> LinExpr {
        LinExpr {
            terms: vec![(var, coeff)],
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, coeff: f64, var: VarId) -> &mut Self {
        self.terms.push((var, coeff));
        self
    }

    pub fn add_constant(&mut self, value: f64) -> &mut Self {
        self.constant += value;
        self
    }

    /// Turns `lhs sense rhs` into `terms sense constant`, where every variable appears once,
    /// zero coefficients are dropped and the terms are ordered by variable.
    pub fn normalized(lhs: &LinExpr, rhs: &LinExpr) -> (Vec<(VarId, f64)>, f64) {
        let mut merged: BTreeMap<VarId, f64> = BTreeMap::new();
        for (var, coeff) in &lhs.terms {
            *merged.entry(*var).or_insert(0.0) += coeff;
        }
        for (var, coeff) in &rhs.terms {
            *merged.entry(*var).or_insert(0.0) -= coeff;
        }

        let terms = merged.into_iter().filter(|(_, c)| *c != 0.0).collect();
        (terms, rhs.constant - lhs.constant)
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        LinExpr::term(1.0, var)
    }
}

impl From<f64> for LinExpr {
    fn from(value: f64) -> Self {
        LinExpr::constant(value)
    }
}

impl FromIterator<(f64, VarId)> for LinExpr {
    fn from_iter<I: IntoIterator<Item = (f64, VarId)>>(iter: I) -> Self {
        let mut expr = LinExpr::new();
        for (coeff, var) in iter {
            expr.add_term(coeff, var);
        }
        expr
    }
}

impl Extend<(f64, VarId)> for LinExpr {
    fn extend<I: IntoIterator<Item = (f64, VarId)>>(&mut self, iter: I) {
        for (coeff, var) in iter {
            self.add_term(coeff, var);
        }
    }
}

/// Sum of variables, each with coefficient one
pub trait LinSum {
    fn lin_sum(self) -> LinExpr;
}

impl<'a, I> LinSum for I
where
    I: IntoIterator<Item = &'a VarId>,
{
    fn lin_sum(self) -> LinExpr {
        self.into_iter().map(|var| (1.0, *var)).collect()
    }
}
