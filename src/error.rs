use crate::models::cflp::ModelError;
use crate::parse::Table;
use crate::solver::SolverError;
use derive_more::{Display, From};
use std::path::PathBuf;

/// Everything that can be wrong with the input before a model is built
#[derive(Debug, Display)]
pub enum InputError {
    /// A referenced input file does not exist
    #[display(fmt = "file '{}' does not exist", "_0.display()")]
    MissingFile(PathBuf),
    /// An input file exists but could not be read
    #[display(fmt = "could not read '{}': {}", "path.display()", source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Non-numeric token, ragged rows or a table whose size does not match the others
    #[display(fmt = "malformed {}: {}", table, reason)]
    MalformedInput { table: Table, reason: String },
    /// A value that parses but violates a bound of the problem
    #[display(fmt = "invalid parameter: {}", _0)]
    InvalidParameter(String),
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl InputError {
    pub(crate) fn malformed(table: Table, reason: impl Into<String>) -> InputError {
        InputError::MalformedInput {
            table,
            reason: reason.into(),
        }
    }
}

/// Top level error of a run
#[derive(Debug, Display, From)]
pub enum CflpError {
    #[display(fmt = "{}", _0)]
    Input(InputError),
    #[display(fmt = "{}", _0)]
    Model(ModelError),
    #[display(fmt = "{}", _0)]
    Solver(SolverError),
}

impl std::error::Error for CflpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CflpError::Input(err) => Some(err),
            CflpError::Model(err) => Some(err),
            CflpError::Solver(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let missing = InputError::MissingFile(PathBuf::from("data/demand.csv"));
        assert_eq!(missing.to_string(), "file 'data/demand.csv' does not exist");

        let malformed = InputError::malformed(Table::Demand, "line 2: 'x' is not a number");
        assert_eq!(
            malformed.to_string(),
            "malformed demand table: line 2: 'x' is not a number"
        );
    }

    #[test]
    fn wraps_lower_layers() {
        let err: CflpError = InputError::InvalidParameter("p = 4 exceeds 3 facilities".into()).into();
        assert!(matches!(err, CflpError::Input(InputError::InvalidParameter(_))));
        assert_eq!(
            err.to_string(),
            "invalid parameter: p = 4 exceeds 3 facilities"
        );
    }
}
