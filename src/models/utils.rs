use crate::solver::{SolverAdapter, SolverError, VarId};

pub trait AddVars {
    type Out;

    /// Create a variable with a closure
    fn vars_with<F: FnMut(Self) -> Result<VarId, SolverError>>(
        &self,
        func: F,
    ) -> Result<Self::Out, SolverError>
    where
        Self: Sized;

    /// The name of the variable at this index, e.g. `x_0_1_2`
    fn label(&self, base_name: &str) -> String;

    /// Binary variables, with objective coefficients given by `objective`
    fn binary<S: SolverAdapter>(
        &self,
        solver: &mut S,
        base_name: &str,
        mut objective: impl FnMut(Self) -> f64,
    ) -> Result<Self::Out, SolverError>
    where
        Self: Sized + Copy,
    {
        self.vars_with(|idx| solver.add_binary_variable(&idx.label(base_name), objective(idx)))
    }

    /// Continuous non-negative variables, with objective coefficients given by `objective`
    fn cont<S: SolverAdapter>(
        &self,
        solver: &mut S,
        base_name: &str,
        mut objective: impl FnMut(Self) -> f64,
    ) -> Result<Self::Out, SolverError>
    where
        Self: Sized + Copy,
    {
        self.vars_with(|idx| {
            solver.add_continuous_variable(
                &idx.label(base_name),
                0.0..f64::INFINITY,
                objective(idx),
            )
        })
    }
}

impl AddVars for usize {
    type Out = Vec<VarId>;

    fn vars_with<F: FnMut(Self) -> Result<VarId, SolverError>>(
        &self,
        mut func: F,
    ) -> Result<Self::Out, SolverError>
    where
        Self: Sized,
    {
        let mut vec = Vec::with_capacity(*self);
        for i in 0..*self {
            vec.push(func(i)?);
        }

        Ok(vec)
    }

    fn label(&self, base_name: &str) -> String {
        format!("{}_{}", base_name, self)
    }
}

impl AddVars for (usize, usize) {
    type Out = Vec<<usize as AddVars>::Out>;

    fn vars_with<F: FnMut(Self) -> Result<VarId, SolverError>>(
        &self,
        mut func: F,
    ) -> Result<Self::Out, SolverError>
    where
        Self: Sized,
    {
        let mut out = Vec::with_capacity(self.0);
        for i in 0..self.0 {
            out.push(self.1.vars_with(|j| func((i, j)))?);
        }

        Ok(out)
    }

    fn label(&self, base_name: &str) -> String {
        self.1.label(&self.0.label(base_name))
    }
}

impl AddVars for (usize, usize, usize) {
    type Out = Vec<<(usize, usize) as AddVars>::Out>;

    fn vars_with<F: FnMut(Self) -> Result<VarId, SolverError>>(
        &self,
        mut func: F,
    ) -> Result<Self::Out, SolverError>
    where
        Self: Sized,
    {
        let mut out = Vec::with_capacity(self.0);
        for i in 0..self.0 {
            out.push((self.1, self.2).vars_with(|(j, k)| func((i, j, k)))?)
        }

        Ok(out)
    }

    fn label(&self, base_name: &str) -> String {
        (self.1, self.2).label(&self.0.label(base_name))
    }
}

impl AddVars for (usize, usize, usize, usize) {
    type Out = Vec<<(usize, usize, usize) as AddVars>::Out>;

    fn vars_with<F: FnMut(Self) -> Result<VarId, SolverError>>(
        &self,
        mut func: F,
    ) -> Result<Self::Out, SolverError>
    where
        Self: Sized,
    {
        let mut out = Vec::with_capacity(self.0);
        for i in 0..self.0 {
            out.push((self.1, self.2, self.3).vars_with(|(j, k, l)| func((i, j, k, l)))?)
        }

        Ok(out)
    }

    fn label(&self, base_name: &str) -> String {
        (self.1, self.2, self.3).label(&self.0.label(base_name))
    }
}

/// Trait that converts variable handles to their values in a solved model
pub trait ConvertVars {
    type Out;
    fn convert<S: SolverAdapter>(&self, solver: &S) -> Result<Self::Out, SolverError>;
}

impl<T: ConvertVars> ConvertVars for Vec<T> {
    type Out = Vec<T::Out>;

    fn convert<S: SolverAdapter>(&self, solver: &S) -> Result<Self::Out, SolverError> {
        let mut out = Vec::with_capacity(self.len());
        for e in self {
            out.push(e.convert(solver)?);
        }
        Ok(out)
    }
}

impl ConvertVars for VarId {
    type Out = f64;

    fn convert<S: SolverAdapter>(&self, solver: &S) -> Result<Self::Out, SolverError> {
        solver.value(*self)
    }
}
