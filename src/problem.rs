use crate::error::InputError;
use crate::parse::Table;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The type used for demand, capacity and activity levels
pub type Quantity = u64;
/// The type used for distance
pub type Distance = f64;
/// The type used for cost
pub type Cost = f64;

pub type ProductIndex = usize;
pub type PlantIndex = usize;
pub type FacilityIndex = usize;
pub type CustomerIndex = usize;

/// Which of the two formulations to build
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Every customer is served by exactly one open facility
    #[display(fmt = "single allocation")]
    SingleAllocation,
    /// Demand may be split across facilities and plants
    #[display(fmt = "divisible demand")]
    DivisibleDemand,
}

impl FromStr for Variant {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "single" => Ok(Variant::SingleAllocation),
            "divisible" => Ok(Variant::DivisibleDemand),
            other => Err(InputError::InvalidParameter(format!(
                "unknown variant '{}', expected 'single' or 'divisible'",
                other
            ))),
        }
    }
}

/// The tables as they are read, before any cross-table validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    /// Demand of product k for customer r, indexed `[r][k]`
    pub demand: Vec<Vec<Quantity>>,
    /// Capacity of product k at plant i, indexed `[i][k]`
    pub plant_capacity: Vec<Vec<Quantity>>,
    /// Minimum activity level of facility j
    pub min_activity: Vec<Quantity>,
    /// Maximum activity level of facility j
    pub max_activity: Vec<Quantity>,
    /// Facility fixed cost
    pub fixed_cost: Vec<Cost>,
    /// Facility marginal cost
    pub marginal_cost: Vec<Cost>,
    /// Unit transportation cost of product k
    pub transport_cost: Vec<Cost>,
    /// Distance from plant i to facility j, indexed `[i][j]`
    pub plant_distance: Vec<Vec<Distance>>,
    /// Distance from facility j to customer r, indexed `[j][r]`
    pub customer_distance: Vec<Vec<Distance>>,
}

/// A validated facility location instance. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct InputData {
    /// Number of products (K)
    products: usize,
    /// Number of plants (I)
    plants: usize,
    /// Number of candidate facilities (J)
    facilities: usize,
    /// Number of customers (R)
    customers: usize,
    tables: Tables,
    /// Desired number of open facilities
    open_facilities: usize,
}

impl InputData {
    /// Validates the tables against each other and against `open_facilities`.
    ///
    /// The customer and product counts come from the demand table, the plant count from
    /// the capacity table and the facility count from the minimum activity table. Every
    /// other table must agree with them.
    pub fn new(tables: Tables, open_facilities: usize) -> Result<InputData, InputError> {
        let customers = tables.demand.len();
        if customers == 0 {
            return Err(InputError::malformed(Table::Demand, "the table has no rows"));
        }
        let products = tables.demand[0].len();
        if products == 0 {
            return Err(InputError::malformed(Table::Demand, "the table has no columns"));
        }
        check_matrix(Table::Demand, &tables.demand, customers, products)?;

        let plants = tables.plant_capacity.len();
        if plants == 0 {
            return Err(InputError::malformed(
                Table::PlantCapacity,
                "the table has no rows",
            ));
        }
        check_matrix(Table::PlantCapacity, &tables.plant_capacity, plants, products)?;

        let facilities = tables.min_activity.len();
        if facilities == 0 {
            return Err(InputError::malformed(Table::MinActivity, "the table is empty"));
        }
        check_vector(Table::MaxActivity, &tables.max_activity, facilities)?;
        check_vector(Table::FixedCost, &tables.fixed_cost, facilities)?;
        check_vector(Table::MarginalCost, &tables.marginal_cost, facilities)?;
        check_vector(Table::TransportCost, &tables.transport_cost, products)?;
        check_matrix(Table::PlantDistance, &tables.plant_distance, plants, facilities)?;
        check_matrix(
            Table::CustomerDistance,
            &tables.customer_distance,
            facilities,
            customers,
        )?;

        check_reals(Table::FixedCost, tables.fixed_cost.iter(), true)?;
        check_reals(Table::MarginalCost, tables.marginal_cost.iter(), false)?;
        check_reals(Table::TransportCost, tables.transport_cost.iter(), true)?;
        check_reals(Table::PlantDistance, tables.plant_distance.iter().flatten(), true)?;
        check_reals(
            Table::CustomerDistance,
            tables.customer_distance.iter().flatten(),
            true,
        )?;

        let data = InputData {
            products,
            plants,
            facilities,
            customers,
            tables,
            open_facilities,
        };
        data.check_parameters()?;
        Ok(data)
    }

    /// The parameter bounds the formulation relies on: `p <= J` and `q_min <= q_max`
    pub fn check_parameters(&self) -> Result<(), InputError> {
        if self.open_facilities > self.facilities {
            return Err(InputError::InvalidParameter(format!(
                "{} open facilities requested, but there are only {} candidate facilities",
                self.open_facilities, self.facilities
            )));
        }

        for j in 0..self.facilities {
            let (min, max) = (self.min_activity(j), self.max_activity(j));
            if min > max {
                return Err(InputError::InvalidParameter(format!(
                    "facility {} has minimum activity {} above its maximum activity {}",
                    j + 1,
                    min,
                    max
                )));
            }
        }

        Ok(())
    }

    /// Number of products (K)
    pub fn products(&self) -> usize {
        self.products
    }

    /// Number of plants (I)
    pub fn plants(&self) -> usize {
        self.plants
    }

    /// Number of candidate facilities (J)
    pub fn facilities(&self) -> usize {
        self.facilities
    }

    /// Number of customers (R)
    pub fn customers(&self) -> usize {
        self.customers
    }

    /// Desired number of open facilities (p)
    pub fn open_facilities(&self) -> usize {
        self.open_facilities
    }

    pub fn demand(&self, r: CustomerIndex, k: ProductIndex) -> Quantity {
        self.tables.demand[r][k]
    }

    pub fn plant_capacity(&self, i: PlantIndex, k: ProductIndex) -> Quantity {
        self.tables.plant_capacity[i][k]
    }

    pub fn min_activity(&self, j: FacilityIndex) -> Quantity {
        self.tables.min_activity[j]
    }

    pub fn max_activity(&self, j: FacilityIndex) -> Quantity {
        self.tables.max_activity[j]
    }

    pub fn fixed_cost(&self, j: FacilityIndex) -> Cost {
        self.tables.fixed_cost[j]
    }

    pub fn marginal_cost(&self, j: FacilityIndex) -> Cost {
        self.tables.marginal_cost[j]
    }

    pub fn transport_cost(&self, k: ProductIndex) -> Cost {
        self.tables.transport_cost[k]
    }

    pub fn plant_distance(&self, i: PlantIndex, j: FacilityIndex) -> Distance {
        self.tables.plant_distance[i][j]
    }

    pub fn customer_distance(&self, j: FacilityIndex, r: CustomerIndex) -> Distance {
        self.tables.customer_distance[j][r]
    }
}

fn check_vector<T>(table: Table, values: &[T], expected: usize) -> Result<(), InputError> {
    if values.len() != expected {
        return Err(InputError::malformed(
            table,
            format!("expected {} values, found {}", expected, values.len()),
        ));
    }
    Ok(())
}

fn check_matrix<T>(
    table: Table,
    rows: &[Vec<T>],
    expected_rows: usize,
    expected_cols: usize,
) -> Result<(), InputError> {
    if rows.len() != expected_rows {
        return Err(InputError::malformed(
            table,
            format!("expected {} rows, found {}", expected_rows, rows.len()),
        ));
    }
    for (n, row) in rows.iter().enumerate() {
        if row.len() != expected_cols {
            return Err(InputError::malformed(
                table,
                format!(
                    "row {} has {} values, expected {}",
                    n + 1,
                    row.len(),
                    expected_cols
                ),
            ));
        }
    }
    Ok(())
}

fn check_reals<'a>(
    table: Table,
    values: impl Iterator<Item = &'a f64>,
    non_negative: bool,
) -> Result<(), InputError> {
    for value in values {
        if !value.is_finite() {
            return Err(InputError::malformed(
                table,
                format!("{} is not a finite number", value),
            ));
        }
        if non_negative && *value < 0.0 {
            return Err(InputError::InvalidParameter(format!(
                "{} contains the negative value {}",
                table, value
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
impl InputData {
    /// Overrides the activity bounds of facility `j` without validation
    pub(crate) fn with_activity_unchecked(
        mut self,
        j: FacilityIndex,
        min: Quantity,
        max: Quantity,
    ) -> Self {
        self.tables.min_activity[j] = min;
        self.tables.max_activity[j] = max;
        self
    }

    /// Overrides the desired number of open facilities without validation
    pub(crate) fn with_open_facilities_unchecked(mut self, p: usize) -> Self {
        self.open_facilities = p;
        self
    }
}

/// Small instances shared by the tests of several modules
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use rand::Rng;

    /// Two plants (capacity 100 of the only product), two facilities (fixed costs 10 and
    /// 20, marginal cost 1, activity 0..=200), two customers demanding 50 each, unit
    /// transport cost and every distance 1. One facility should open.
    pub fn two_by_two() -> Tables {
        Tables {
            demand: vec![vec![50], vec![50]],
            plant_capacity: vec![vec![100], vec![100]],
            min_activity: vec![0, 0],
            max_activity: vec![200, 200],
            fixed_cost: vec![10.0, 20.0],
            marginal_cost: vec![1.0, 1.0],
            transport_cost: vec![1.0],
            plant_distance: vec![vec![1.0, 1.0], vec![1.0, 1.0]],
            customer_distance: vec![vec![1.0, 1.0], vec![1.0, 1.0]],
        }
    }

    /// One customer wanting 10 of two products. Plant 1 only makes product 1 and sits
    /// next to facility 1, plant 2 only makes product 2 and sits next to facility 2.
    /// Both facilities open, so routing each product through its own facility is cheapest.
    pub fn split_bundle() -> Tables {
        Tables {
            demand: vec![vec![10, 10]],
            plant_capacity: vec![vec![100, 0], vec![0, 100]],
            min_activity: vec![0, 0],
            max_activity: vec![100, 100],
            fixed_cost: vec![0.0, 0.0],
            marginal_cost: vec![0.0, 0.0],
            transport_cost: vec![1.0, 1.0],
            plant_distance: vec![vec![1.0, 10.0], vec![10.0, 1.0]],
            customer_distance: vec![vec![1.0], vec![1.0]],
        }
    }

    /// A random instance that is feasible for any `p` in `1..=J` under both variants:
    /// plants can cover all demand and facilities have no minimum activity. Every customer
    /// demands at least one unit of every product.
    pub fn random(rng: &mut impl Rng) -> InputData {
        let products = rng.gen_range(1..=2);
        let plants = rng.gen_range(1..=2);
        let facilities = rng.gen_range(2..=3);
        let customers = rng.gen_range(2..=3);

        let demand: Vec<Vec<Quantity>> = (0..customers)
            .map(|_| (0..products).map(|_| rng.gen_range(1..=20)).collect())
            .collect();
        let total: Quantity = demand.iter().flatten().sum();

        let tables = Tables {
            demand,
            plant_capacity: (0..plants)
                .map(|_| (0..products).map(|_| total).collect())
                .collect(),
            min_activity: vec![0; facilities],
            max_activity: vec![total; facilities],
            fixed_cost: (0..facilities)
                .map(|_| rng.gen_range(0..50) as f64)
                .collect(),
            marginal_cost: (0..facilities)
                .map(|_| rng.gen_range(0..5) as f64)
                .collect(),
            transport_cost: (0..products).map(|_| rng.gen_range(1..4) as f64).collect(),
            plant_distance: (0..plants)
                .map(|_| (0..facilities).map(|_| rng.gen_range(1..10) as f64).collect())
                .collect(),
            customer_distance: (0..facilities)
                .map(|_| (0..customers).map(|_| rng.gen_range(1..10) as f64).collect())
                .collect(),
        };

        let p = rng.gen_range(1..=facilities);
        InputData::new(tables, p).expect("random instances are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn derives_the_index_sets() {
        let data = InputData::new(split_bundle(), 2).unwrap();
        assert_eq!(data.products(), 2);
        assert_eq!(data.plants(), 2);
        assert_eq!(data.facilities(), 2);
        assert_eq!(data.customers(), 1);
        assert_eq!(data.demand(0, 1), 10);
        assert_eq!(data.plant_distance(1, 0), 10.0);
    }

    #[test]
    fn p_may_range_from_zero_to_the_facility_count() {
        assert!(InputData::new(two_by_two(), 0).is_ok());
        assert!(InputData::new(two_by_two(), 2).is_ok());
        assert!(matches!(
            InputData::new(two_by_two(), 3),
            Err(InputError::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_min_activity_above_max_activity() {
        let mut tables = two_by_two();
        tables.min_activity[1] = 9999;
        let err = InputData::new(tables, 1).unwrap_err();
        assert!(matches!(err, InputError::InvalidParameter(_)));
        assert!(err.to_string().contains("facility 2"));
    }

    #[test]
    fn rejects_ragged_rows() {
        let mut tables = two_by_two();
        tables.plant_distance[1].push(1.0);
        assert!(matches!(
            InputData::new(tables, 1),
            Err(InputError::MalformedInput {
                table: Table::PlantDistance,
                ..
            })
        ));
    }

    #[test]
    fn rejects_tables_that_disagree_on_a_domain() {
        // three customers in the distance table, two in the demand table
        let mut tables = two_by_two();
        for row in tables.customer_distance.iter_mut() {
            row.push(1.0);
        }
        assert!(matches!(
            InputData::new(tables, 1),
            Err(InputError::MalformedInput {
                table: Table::CustomerDistance,
                ..
            })
        ));

        let mut tables = two_by_two();
        tables.transport_cost.push(2.0);
        assert!(matches!(
            InputData::new(tables, 1),
            Err(InputError::MalformedInput {
                table: Table::TransportCost,
                ..
            })
        ));
    }

    #[test]
    fn rejects_negative_costs_but_not_negative_marginal_costs() {
        let mut tables = two_by_two();
        tables.marginal_cost[0] = -2.5;
        assert!(InputData::new(tables, 1).is_ok());

        let mut tables = two_by_two();
        tables.fixed_cost[0] = -1.0;
        assert!(matches!(
            InputData::new(tables, 1),
            Err(InputError::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_empty_demand() {
        let mut tables = two_by_two();
        tables.demand.clear();
        assert!(matches!(
            InputData::new(tables, 1),
            Err(InputError::MalformedInput {
                table: Table::Demand,
                ..
            })
        ));
    }

    #[test]
    fn variant_tokens() {
        assert_eq!("single".parse::<Variant>().unwrap(), Variant::SingleAllocation);
        assert_eq!(
            "divisible".parse::<Variant>().unwrap(),
            Variant::DivisibleDemand
        );
        assert!("split".parse::<Variant>().is_err());
    }
}
