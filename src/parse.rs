//! Reading the comma separated input tables.

use crate::error::InputError;
use crate::problem::{InputData, Quantity, Tables};
use derive_more::Display;
use log::{debug, trace};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The nine input tables, in the order they are given on the command line
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    #[display(fmt = "demand table")]
    Demand,
    #[display(fmt = "plant capacity table")]
    PlantCapacity,
    #[display(fmt = "facility minimum activity table")]
    MinActivity,
    #[display(fmt = "facility maximum activity table")]
    MaxActivity,
    #[display(fmt = "facility fixed cost table")]
    FixedCost,
    #[display(fmt = "facility marginal cost table")]
    MarginalCost,
    #[display(fmt = "product transport cost table")]
    TransportCost,
    #[display(fmt = "plant to facility distance table")]
    PlantDistance,
    #[display(fmt = "facility to customer distance table")]
    CustomerDistance,
}

/// A value that may appear in a table
pub trait Cell: FromStr {
    /// What the value should look like, for error messages
    const EXPECTED: &'static str;
}

impl Cell for Quantity {
    const EXPECTED: &'static str = "a non-negative integer";
}

impl Cell for f64 {
    const EXPECTED: &'static str = "a number";
}

/// Parses the rows of a table. Blank lines are skipped, tokens are trimmed, and every row
/// must have as many values as the first one.
pub fn parse_rows<T: Cell>(table: Table, content: &str) -> Result<Vec<Vec<T>>, InputError> {
    let mut rows: Vec<Vec<T>> = Vec::new();

    for (n, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let row = line
            .split(',')
            .map(|token| {
                let token = token.trim();
                token.parse::<T>().map_err(|_| {
                    InputError::malformed(
                        table,
                        format!("line {}: '{}' is not {}", n + 1, token, T::EXPECTED),
                    )
                })
            })
            .collect::<Result<Vec<T>, InputError>>()?;

        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                return Err(InputError::malformed(
                    table,
                    format!(
                        "line {} has {} values, but earlier rows have {}",
                        n + 1,
                        row.len(),
                        first.len()
                    ),
                ));
            }
        }

        trace!("{} row {}: {} values", table, rows.len(), row.len());
        rows.push(row);
    }

    Ok(rows)
}

/// Parses a table holding one value per facility or product. It may be written as a single
/// row or as a single column.
pub fn parse_vector<T: Cell>(table: Table, content: &str) -> Result<Vec<T>, InputError> {
    let mut rows = parse_rows::<T>(table, content)?;

    match rows.len() {
        0 => Ok(Vec::new()),
        1 => Ok(rows.remove(0)),
        _ if rows.iter().all(|row| row.len() == 1) => Ok(rows.into_iter().flatten().collect()),
        n => Err(InputError::malformed(
            table,
            format!("expected a single row or a single column, found {} rows", n),
        )),
    }
}

/// Parses the desired number of open facilities
pub fn parse_open_facilities(token: &str) -> Result<usize, InputError> {
    let value: i64 = token.trim().parse().map_err(|_| {
        InputError::InvalidParameter(format!(
            "the number of open facilities '{}' is not an integer",
            token
        ))
    })?;

    usize::try_from(value).map_err(|_| {
        InputError::InvalidParameter(format!(
            "the number of open facilities must not be negative, got {}",
            value
        ))
    })
}

fn read(table: Table, path: &Path) -> Result<String, InputError> {
    debug!("Reading {} from {}", table, path.display());
    std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Paths to the nine input tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFiles {
    pub demand: PathBuf,
    pub plant_capacity: PathBuf,
    pub min_activity: PathBuf,
    pub max_activity: PathBuf,
    pub fixed_cost: PathBuf,
    pub marginal_cost: PathBuf,
    pub transport_cost: PathBuf,
    pub plant_distance: PathBuf,
    pub customer_distance: PathBuf,
}

impl InputFiles {
    /// All paths, in command line order
    pub fn paths(&self) -> [(Table, &Path); 9] {
        [
            (Table::Demand, self.demand.as_path()),
            (Table::PlantCapacity, self.plant_capacity.as_path()),
            (Table::MinActivity, self.min_activity.as_path()),
            (Table::MaxActivity, self.max_activity.as_path()),
            (Table::FixedCost, self.fixed_cost.as_path()),
            (Table::MarginalCost, self.marginal_cost.as_path()),
            (Table::TransportCost, self.transport_cost.as_path()),
            (Table::PlantDistance, self.plant_distance.as_path()),
            (Table::CustomerDistance, self.customer_distance.as_path()),
        ]
    }

    /// Fails on the first path that does not exist
    pub fn check_exist(&self) -> Result<(), InputError> {
        match self.paths().iter().find(|(_, path)| !path.exists()) {
            Some((_, path)) => Err(InputError::MissingFile(path.to_path_buf())),
            None => Ok(()),
        }
    }

    /// Reads every table. No file is parsed unless all of them exist.
    pub fn read(&self) -> Result<Tables, InputError> {
        self.check_exist()?;

        let rows = |table: Table, path: &Path| -> Result<Vec<Vec<f64>>, InputError> {
            parse_rows(table, &read(table, path)?)
        };
        let vector = |table: Table, path: &Path| -> Result<Vec<f64>, InputError> {
            parse_vector(table, &read(table, path)?)
        };
        let quantities = |table: Table, path: &Path| -> Result<Vec<Quantity>, InputError> {
            parse_vector(table, &read(table, path)?)
        };

        Ok(Tables {
            demand: parse_rows(Table::Demand, &read(Table::Demand, &self.demand)?)?,
            plant_capacity: parse_rows(
                Table::PlantCapacity,
                &read(Table::PlantCapacity, &self.plant_capacity)?,
            )?,
            min_activity: quantities(Table::MinActivity, &self.min_activity)?,
            max_activity: quantities(Table::MaxActivity, &self.max_activity)?,
            fixed_cost: vector(Table::FixedCost, &self.fixed_cost)?,
            marginal_cost: vector(Table::MarginalCost, &self.marginal_cost)?,
            transport_cost: vector(Table::TransportCost, &self.transport_cost)?,
            plant_distance: rows(Table::PlantDistance, &self.plant_distance)?,
            customer_distance: rows(Table::CustomerDistance, &self.customer_distance)?,
        })
    }

    /// Reads and validates the instance
    pub fn load(&self, open_facilities: usize) -> Result<InputData, InputError> {
        let data = InputData::new(self.read()?, open_facilities)?;
        debug!(
            "Loaded instance with {} products, {} plants, {} facilities and {} customers",
            data.products(),
            data.plants(),
            data.facilities(),
            data.customers()
        );
        Ok(data)
    }
}
