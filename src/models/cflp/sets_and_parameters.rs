use crate::problem::{CustomerIndex, FacilityIndex, InputData, PlantIndex, ProductIndex};

/// sets for the facility location model
#[derive(Debug, Clone, PartialEq)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of products
    pub K: Vec<ProductIndex>,
    /// Set of plants
    pub I: Vec<PlantIndex>,
    /// Set of candidate facilities
    pub J: Vec<FacilityIndex>,
    /// Set of customers
    pub R: Vec<CustomerIndex>,
}

impl Sets {
    pub fn new(data: &InputData) -> Sets {
        Sets {
            K: (0..data.products()).collect(),
            I: (0..data.plants()).collect(),
            J: (0..data.facilities()).collect(),
            R: (0..data.customers()).collect(),
        }
    }
}

/// parameters for the facility location model, as the coefficients they become
#[derive(Debug, Clone, PartialEq)]
#[allow(non_snake_case)]
pub struct Parameters {
    /// Number of facilities to open
    pub p: f64,
    /// demand of product k by customer r, indexed `[r][k]`
    pub D: Vec<Vec<f64>>,
    /// total demand of customer r over all products
    pub bundle: Vec<f64>,
    /// capacity of product k at plant i, indexed `[i][k]`
    pub P: Vec<Vec<f64>>,
    /// minimum activity of facility j
    pub Q_min: Vec<f64>,
    /// maximum activity of facility j
    pub Q_max: Vec<f64>,
    /// fixed cost of opening facility j
    pub F: Vec<f64>,
    /// marginal cost per unit handled at facility j
    pub G: Vec<f64>,
    /// unit transportation cost of product k
    pub C: Vec<f64>,
    /// distance from plant i to facility j
    pub L_in: Vec<Vec<f64>>,
    /// distance from facility j to customer r
    pub L_out: Vec<Vec<f64>>,
}

#[allow(non_snake_case)]
impl Parameters {
    pub fn new(data: &InputData) -> Parameters {
        let K = data.products();
        let I = data.plants();
        let J = data.facilities();
        let R = data.customers();

        let D: Vec<Vec<f64>> = (0..R)
            .map(|r| (0..K).map(|k| data.demand(r, k) as f64).collect())
            .collect();
        let bundle: Vec<f64> = D.iter().map(|row| row.iter().sum()).collect();

        Parameters {
            p: data.open_facilities() as f64,
            D,
            bundle,
            P: (0..I)
                .map(|i| (0..K).map(|k| data.plant_capacity(i, k) as f64).collect())
                .collect(),
            Q_min: (0..J).map(|j| data.min_activity(j) as f64).collect(),
            Q_max: (0..J).map(|j| data.max_activity(j) as f64).collect(),
            F: (0..J).map(|j| data.fixed_cost(j)).collect(),
            G: (0..J).map(|j| data.marginal_cost(j)).collect(),
            C: (0..K).map(|k| data.transport_cost(k)).collect(),
            L_in: (0..I)
                .map(|i| (0..J).map(|j| data.plant_distance(i, j)).collect())
                .collect(),
            L_out: (0..J)
                .map(|j| (0..R).map(|r| data.customer_distance(j, r)).collect())
                .collect(),
        }
    }

    /// Cost of moving one unit of product k from plant i to facility j
    pub fn inbound_cost(&self, k: ProductIndex, i: PlantIndex, j: FacilityIndex) -> f64 {
        self.C[k] * self.L_in[i][j]
    }

    /// Cost of serving the whole bundle of customer r from facility j: outbound transport
    /// plus the marginal cost of handling it
    pub fn assignment_cost(&self, j: FacilityIndex, r: CustomerIndex) -> f64 {
        self.D[r]
            .iter()
            .enumerate()
            .map(|(k, d)| (self.C[k] * self.L_out[j][r] + self.G[j]) * d)
            .sum()
    }

    /// Cost of one unit of product k on the path plant i, facility j, customer r
    pub fn path_cost(
        &self,
        k: ProductIndex,
        i: PlantIndex,
        j: FacilityIndex,
        r: CustomerIndex,
    ) -> f64 {
        self.C[k] * (self.L_in[i][j] + self.L_out[j][r]) + self.G[j]
    }

    /// Total capacity of every plant for product k
    pub fn total_capacity(&self, k: ProductIndex) -> f64 {
        self.P.iter().map(|row| row[k]).sum()
    }

    /// Whether the plants can cover the demand of every product, a cheap necessary
    /// condition for feasibility
    pub fn covers_demand(&self) -> bool {
        let K = self.C.len();
        (0..K).all(|k| self.D.iter().map(|row| row[k]).sum::<f64>() <= self.total_capacity(k))
    }
}
