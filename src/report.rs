//! Decoding a solved model into the facilities to open and the flows to run.

use crate::models::cflp::{CflpModel, FlowVariables};
use crate::models::utils::ConvertVars;
use crate::problem::{
    CustomerIndex, FacilityIndex, InputData, PlantIndex, ProductIndex, Quantity, Variant,
};
use crate::solver::{SolverAdapter, SolverError, Status};
use derive_more::Display;
use itertools::iproduct;
use serde::Serialize;
use std::fmt::{self, Formatter};

/// A binary variable above this value is taken to be one
pub const BINARY_THRESHOLD: f64 = 0.99;
/// Path flows at or below this amount are left out of the report
pub const FLOW_THRESHOLD: f64 = 1e-9;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityState {
    Open,
    Closed,
}

/// Quantity of one product on the path plant, facility, customer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathFlow {
    pub product: ProductIndex,
    pub plant: PlantIndex,
    pub facility: FacilityIndex,
    pub customer: CustomerIndex,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Flows {
    SingleAllocation {
        /// quantity of product k shipped from plant i to facility j, indexed `[k][i][j]`
        shipments: Vec<Vec<Vec<f64>>>,
        /// quantity of product k delivered by facility j to customer r, indexed `[k][j][r]`
        deliveries: Vec<Vec<Vec<Quantity>>>,
        /// the open facility serving each customer. A customer without demand adds nothing
        /// to any activity level, so the solver may point it at a closed facility; it is
        /// then left unassigned.
        assignment: Vec<Option<FacilityIndex>>,
    },
    DivisibleDemand {
        /// number of products, so that products without flow still get a section
        products: usize,
        paths: Vec<PathFlow>,
    },
}

/// The outcome of a solve. Everything but the status is left out unless it was optimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub variant: Variant,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub facilities: Vec<FacilityState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flows: Option<Flows>,
}

impl Report {
    /// Reads the solution of `model` out of `solver`, which must have been optimized
    pub fn new<S: SolverAdapter>(
        data: &InputData,
        model: &CflpModel,
        solver: &S,
    ) -> Result<Report, SolverError> {
        let variant = model.variant();
        let status = solver
            .status()
            .ok_or(SolverError::Unsupported("reporting on a model that was never optimized"))?;

        if !status.is_optimal() {
            return Ok(Report {
                variant,
                status,
                total_cost: None,
                facilities: Vec::new(),
                flows: None,
            });
        }

        let facilities: Vec<FacilityState> = model
            .z
            .convert(solver)?
            .into_iter()
            .map(|z| match z > BINARY_THRESHOLD {
                true => FacilityState::Open,
                false => FacilityState::Closed,
            })
            .collect();

        let flows = match &model.flows {
            FlowVariables::Single(vars) => {
                let shipments = vars.x.convert(solver)?;
                let y = vars.y.convert(solver)?;

                let deliveries: Vec<Vec<Vec<Quantity>>> = (0..data.products())
                    .map(|k| {
                        (0..data.facilities())
                            .map(|j| {
                                (0..data.customers())
                                    .map(|r| match y[j][r] > BINARY_THRESHOLD {
                                        true => data.demand(r, k),
                                        false => 0,
                                    })
                                    .collect()
                            })
                            .collect()
                    })
                    .collect();

                Flows::SingleAllocation {
                    shipments,
                    deliveries,
                    assignment: assignment(&y, &facilities),
                }
            }
            FlowVariables::Divisible(vars) => {
                let s = vars.s.convert(solver)?;
                let paths: Vec<PathFlow> = iproduct!(
                    0..data.products(),
                    0..data.plants(),
                    0..data.facilities(),
                    0..data.customers()
                )
                .filter(|(k, i, j, r)| s[*k][*i][*j][*r] > FLOW_THRESHOLD)
                .map(|(k, i, j, r)| PathFlow {
                    product: k,
                    plant: i,
                    facility: j,
                    customer: r,
                    amount: s[k][i][j][r],
                })
                .collect();

                Flows::DivisibleDemand {
                    products: data.products(),
                    paths,
                }
            }
        };

        Ok(Report {
            variant,
            status,
            total_cost: Some(solver.objective_value()?),
            facilities,
            flows: Some(flows),
        })
    }

    /// Indices of the facilities that are open
    pub fn open_facilities(&self) -> Vec<FacilityIndex> {
        self.facilities
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == FacilityState::Open)
            .map(|(j, _)| j)
            .collect()
    }
}

/// The open facility each customer is assigned to, indexed by customer. `y` is indexed
/// `[j][r]`.
fn assignment(y: &[Vec<f64>], facilities: &[FacilityState]) -> Vec<Option<FacilityIndex>> {
    let customers = y.first().map_or(0, |row| row.len());
    (0..customers)
        .map(|r| {
            (0..facilities.len()).find(|j| {
                facilities[*j] == FacilityState::Open && y[*j][r] > BINARY_THRESHOLD
            })
        })
        .collect()
}

const COLUMN: usize = 12;

fn header(f: &mut Formatter<'_>, label: &str, count: usize) -> fmt::Result {
    write!(f, "{:<w$}", "From/To", w = COLUMN)?;
    for n in 0..count {
        write!(f, "{:<w$}", format!("{} {}", label, n + 1), w = COLUMN)?;
    }
    writeln!(f)
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "***{} SOLUTION***", self.status)?;
        writeln!(f)?;

        let (total_cost, flows) = match (self.total_cost, &self.flows) {
            (Some(cost), Some(flows)) => (cost, flows),
            _ => return writeln!(f, "No solution available for the {} model", self.variant),
        };

        writeln!(f, "Total Cost: {:.2}", total_cost)?;
        writeln!(f)?;

        for (j, state) in self.facilities.iter().enumerate() {
            writeln!(f, "Facility {}: {}", j + 1, state)?;
        }
        writeln!(f)?;

        match flows {
            Flows::SingleAllocation {
                shipments,
                deliveries,
                ..
            } => {
                for (k, shipped) in shipments.iter().enumerate() {
                    writeln!(f, "Product {}", k + 1)?;
                    header(f, "Facility", self.facilities.len())?;
                    for (i, row) in shipped.iter().enumerate() {
                        write!(f, "{:<w$}", format!("Plant {}", i + 1), w = COLUMN)?;
                        for amount in row {
                            write!(f, "{:<w$.2}", amount, w = COLUMN)?;
                        }
                        writeln!(f)?;
                    }
                    writeln!(f)?;
                }

                for (k, delivered) in deliveries.iter().enumerate() {
                    writeln!(f, "Product {}", k + 1)?;
                    let customers = delivered.first().map_or(0, |row| row.len());
                    header(f, "Customer", customers)?;
                    for (j, row) in delivered.iter().enumerate() {
                        write!(f, "{:<w$}", format!("Facility {}", j + 1), w = COLUMN)?;
                        for amount in row {
                            write!(f, "{:<w$}", amount, w = COLUMN)?;
                        }
                        writeln!(f)?;
                    }
                    writeln!(f)?;
                }
            }
            Flows::DivisibleDemand { products, paths } => {
                for k in 0..*products {
                    writeln!(f, "Product {}", k + 1)?;
                    for path in paths.iter().filter(|p| p.product == k) {
                        writeln!(
                            f,
                            "Plant {} → Facility {} → Customer {}: {:.2}",
                            path.plant + 1,
                            path.facility + 1,
                            path.customer + 1,
                            path.amount
                        )?;
                    }
                    writeln!(f)?;
                }
            }
        }

        Ok(())
    }
}
