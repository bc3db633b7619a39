//! Regression models used by the forecaster
//!
//! Model fitting sits behind [`SpendRegressor`] so the forecaster never
//! depends on a particular model's internals. [`RegressorFactory`] builds the
//! models for each forecast; tests swap in a factory that returns fixed
//! predictions.
//!
//! Both built-in models are refit on every forecast. At a few dozen monthly
//! rows this is cheap.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::features::FEATURE_COUNT;
use crate::config::ForecastConfig;
use crate::error::{Error, Result};

pub type FeatureVector = [f64; FEATURE_COUNT];

/// A model that predicts a month's total spend from its feature vector
pub trait SpendRegressor: Send {
    /// Model name reported in forecast results
    fn name(&self) -> &str;

    /// Fit the model; `features` and `targets` have the same length
    fn fit(&mut self, features: &[FeatureVector], targets: &[f64]) -> Result<()>;

    /// Predict for one feature vector (only valid after a successful fit)
    fn predict(&self, features: &FeatureVector) -> f64;
}

/// Builds the models the forecaster blends
pub trait RegressorFactory: Send + Sync {
    /// Primary model, always fitted
    fn linear(&self, config: &ForecastConfig) -> Box<dyn SpendRegressor>;

    /// Secondary model, fitted once there is enough history
    fn ensemble(&self, config: &ForecastConfig) -> Box<dyn SpendRegressor>;
}

/// Linear regression plus bagged regression trees
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRegressorFactory;

impl RegressorFactory for DefaultRegressorFactory {
    fn linear(&self, _config: &ForecastConfig) -> Box<dyn SpendRegressor> {
        Box::new(LinearRegression::new())
    }

    fn ensemble(&self, config: &ForecastConfig) -> Box<dyn SpendRegressor> {
        Box::new(BaggedTrees::new(config.n_trees, config.max_depth, config.seed))
    }
}

fn check_shapes(features: &[FeatureVector], targets: &[f64]) -> Result<()> {
    if features.is_empty() {
        return Err(Error::Model("cannot fit on zero rows".to_string()));
    }
    if features.len() != targets.len() {
        return Err(Error::Model(format!(
            "{} feature rows but {} targets",
            features.len(),
            targets.len()
        )));
    }
    if features.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
        return Err(Error::Model("non-finite training value".to_string()));
    }
    Ok(())
}

/// Solve `a * x = b` by Gaussian elimination with partial pivoting
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < f64::EPSILON {
            return Err(Error::Model("singular system".to_string()));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

/// Ordinary least squares with an intercept
///
/// Columns are centred and solved in their raw units with a tiny ridge term,
/// so when there are fewer rows than features the fit lands on the (near)
/// minimum-norm solution instead of failing. Constant columns get a zero
/// coefficient.
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    coefficients: FeatureVector,
    intercept: f64,
}

impl LinearRegression {
    const RIDGE: f64 = 1e-8;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn coefficients(&self) -> &FeatureVector {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl SpendRegressor for LinearRegression {
    fn name(&self) -> &str {
        "LinearRegression"
    }

    fn fit(&mut self, features: &[FeatureVector], targets: &[f64]) -> Result<()> {
        check_shapes(features, targets)?;
        let n = features.len();
        let n_f = n as f64;

        let y_mean = targets.iter().sum::<f64>() / n_f;
        let mut x_mean = [0.0; FEATURE_COUNT];
        for row in features {
            for (j, v) in row.iter().enumerate() {
                x_mean[j] += v / n_f;
            }
        }

        // Columns with no spread drop out of the fit
        let active: Vec<usize> = (0..FEATURE_COUNT)
            .filter(|&j| {
                let ss: f64 = features.iter().map(|r| (r[j] - x_mean[j]).powi(2)).sum();
                (ss / n_f).sqrt() > 1e-12
            })
            .collect();

        self.coefficients = [0.0; FEATURE_COUNT];
        self.intercept = y_mean;
        if active.is_empty() {
            return Ok(());
        }

        let z: Vec<Vec<f64>> = features
            .iter()
            .map(|r| {
                active.iter().map(|&j| r[j] - x_mean[j]).collect()
            })
            .collect();
        let yc: Vec<f64> = targets.iter().map(|y| y - y_mean).collect();
        let p = active.len();
        let ridge = Self::RIDGE * n_f;

        let beta: Vec<f64> = if n >= p {
            // Primal: (Z'Z + λI) β = Z'y
            let mut a = vec![vec![0.0; p]; p];
            let mut b = vec![0.0; p];
            for (row, y) in z.iter().zip(&yc) {
                for i in 0..p {
                    b[i] += row[i] * y;
                    for k in 0..p {
                        a[i][k] += row[i] * row[k];
                    }
                }
            }
            for (i, a_row) in a.iter_mut().enumerate() {
                a_row[i] += ridge;
            }
            solve(a, b)?
        } else {
            // Dual: β = Z' (ZZ' + λI)^-1 y
            let mut k = vec![vec![0.0; n]; n];
            for i in 0..n {
                for j in 0..n {
                    k[i][j] = z[i].iter().zip(&z[j]).map(|(a, b)| a * b).sum();
                }
                k[i][i] += ridge;
            }
            let alpha = solve(k, yc)?;
            (0..p)
                .map(|c| z.iter().zip(&alpha).map(|(row, a)| row[c] * a).sum())
                .collect()
        };

        for (c, &j) in active.iter().enumerate() {
            self.coefficients[j] = beta[c];
        }
        self.intercept = y_mean
            - self
                .coefficients
                .iter()
                .zip(&x_mean)
                .map(|(c, m)| c * m)
                .sum::<f64>();

        Ok(())
    }

    fn predict(&self, features: &FeatureVector) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, x: &FeatureVector) -> f64 {
        match self {
            Node::Leaf(value) => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if x[*feature] <= *threshold {
                    left.predict(x)
                } else {
                    right.predict(x)
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// A CART regression tree split on squared error
#[derive(Debug, Clone)]
pub struct RegressionTree {
    max_depth: usize,
    root: Node,
}

impl RegressionTree {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            root: Node::Leaf(0.0),
        }
    }

    /// Fit on the rows selected by `sample` (indices may repeat)
    pub fn fit_sample(&mut self, features: &[FeatureVector], targets: &[f64], sample: &[usize]) {
        self.root = Self::build(features, targets, sample.to_vec(), 0, self.max_depth);
    }

    pub fn predict(&self, x: &FeatureVector) -> f64 {
        self.root.predict(x)
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    fn build(
        features: &[FeatureVector],
        targets: &[f64],
        sample: Vec<usize>,
        depth: usize,
        max_depth: usize,
    ) -> Node {
        let n = sample.len() as f64;
        let sum: f64 = sample.iter().map(|&i| targets[i]).sum();
        let mean = sum / n;

        if depth >= max_depth || sample.len() < 2 {
            return Node::Leaf(mean);
        }

        let sq_sum: f64 = sample.iter().map(|&i| targets[i].powi(2)).sum();
        let parent_sse = sq_sum - sum * sum / n;
        if parent_sse <= 1e-9 {
            return Node::Leaf(mean);
        }

        // (feature, threshold, sse)
        let mut best: Option<(usize, f64, f64)> = None;
        for feature in 0..FEATURE_COUNT {
            let mut order = sample.clone();
            order.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for split in 1..order.len() {
                let moved = targets[order[split - 1]];
                left_sum += moved;
                left_sq += moved * moved;

                let lo = features[order[split - 1]][feature];
                let hi = features[order[split]][feature];
                if lo == hi {
                    continue;
                }

                let left_n = split as f64;
                let right_n = n - left_n;
                let right_sum = sum - left_sum;
                let right_sq = sq_sum - left_sq;
                let sse = (left_sq - left_sum * left_sum / left_n)
                    + (right_sq - right_sum * right_sum / right_n);

                if best.map_or(true, |(_, _, b)| sse < b) {
                    best = Some((feature, (lo + hi) / 2.0, sse));
                }
            }
        }

        match best {
            Some((feature, threshold, sse)) if sse < parent_sse => {
                let (left, right): (Vec<usize>, Vec<usize>) = sample
                    .into_iter()
                    .partition(|&i| features[i][feature] <= threshold);
                Node::Split {
                    feature,
                    threshold,
                    left: Box::new(Self::build(features, targets, left, depth + 1, max_depth)),
                    right: Box::new(Self::build(features, targets, right, depth + 1, max_depth)),
                }
            }
            _ => Node::Leaf(mean),
        }
    }
}

/// Bootstrap-aggregated regression trees with a fixed seed
#[derive(Debug, Clone)]
pub struct BaggedTrees {
    n_trees: usize,
    max_depth: usize,
    seed: u64,
    trees: Vec<RegressionTree>,
}

impl BaggedTrees {
    pub fn new(n_trees: usize, max_depth: usize, seed: u64) -> Self {
        Self {
            n_trees: n_trees.max(1),
            max_depth,
            seed,
            trees: Vec::new(),
        }
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

impl SpendRegressor for BaggedTrees {
    fn name(&self) -> &str {
        "BaggedTrees"
    }

    fn fit(&mut self, features: &[FeatureVector], targets: &[f64]) -> Result<()> {
        check_shapes(features, targets)?;
        let n = features.len();
        let mut rng = StdRng::seed_from_u64(self.seed);

        self.trees = (0..self.n_trees)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let mut tree = RegressionTree::new(self.max_depth);
                tree.fit_sample(features, targets, &sample);
                tree
            })
            .collect();

        Ok(())
    }

    fn predict(&self, features: &FeatureVector) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict(features)).sum::<f64>() / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(i: f64, total: f64, change: f64, vol: f64, count: f64) -> FeatureVector {
        [i, total, change, vol, count]
    }

    #[test]
    fn test_linear_recovers_exact_relationship() {
        // total = 100 + 50 * month_index; other columns constant
        let x: Vec<FeatureVector> = (0..8)
            .map(|i| row(i as f64, 0.0, 0.0, 0.0, 3.0))
            .collect();
        let y: Vec<f64> = (0..8).map(|i| 100.0 + 50.0 * i as f64).collect();

        let mut lr = LinearRegression::new();
        lr.fit(&x, &y).unwrap();

        let pred = lr.predict(&row(8.0, 0.0, 0.0, 0.0, 3.0));
        assert!((pred - 500.0).abs() < 1e-3, "pred = {}", pred);
        assert_eq!(lr.coefficients()[4], 0.0);
    }

    #[test]
    fn test_linear_underdetermined_interpolates_training_rows() {
        // Two rows, five features: min-norm fit passes through both points
        let x = vec![
            row(0.0, 1000.0, 0.0, 0.0, 4.0),
            row(1.0, 1050.0, 50.0, 35.0, 5.0),
        ];
        let y = vec![1000.0, 1050.0];

        let mut lr = LinearRegression::new();
        lr.fit(&x, &y).unwrap();

        assert!((lr.predict(&x[0]) - 1000.0).abs() < 1e-3);
        assert!((lr.predict(&x[1]) - 1050.0).abs() < 1e-3);
    }

    #[test]
    fn test_linear_underdetermined_uses_raw_min_norm() {
        // Two months of history: the weight follows the raw difference
        // between the rows, so the spend columns dominate month_index
        let x = vec![
            row(0.0, 1000.0, 0.0, 0.0, 2.0),
            row(1.0, 1200.0, 200.0, 141.42, 2.0),
        ];
        let y = vec![1200.0, 1100.0];
        let next = row(2.0, 1200.0, 0.0, 115.47, 2.0);

        let mut lr = LinearRegression::new();
        lr.fit(&x, &y).unwrap();

        let d: Vec<f64> = x[1].iter().zip(&x[0]).map(|(a, b)| a - b).collect();
        let d_sq: f64 = d.iter().map(|v| v * v).sum();
        let step = (y[1] - y[0]) / d_sq;
        let expected = (y[0] + y[1]) / 2.0
            + (0..FEATURE_COUNT)
                .map(|j| d[j] * step * (next[j] - (x[0][j] + x[1][j]) / 2.0))
                .sum::<f64>();

        let pred = lr.predict(&next);
        assert!(
            (pred - expected).abs() < 1e-6 * expected.abs(),
            "pred = {}, expected = {}",
            pred,
            expected
        );
        assert!(lr.coefficients()[1].abs() > lr.coefficients()[0].abs());
        assert_eq!(lr.coefficients()[4], 0.0);
    }

    #[test]
    fn test_linear_single_row_predicts_its_target() {
        let x = vec![row(0.0, 700.0, 0.0, 0.0, 2.0)];
        let mut lr = LinearRegression::new();
        lr.fit(&x, &[700.0]).unwrap();
        assert_eq!(lr.predict(&row(5.0, 1.0, 1.0, 1.0, 1.0)), 700.0);
    }

    #[test]
    fn test_fit_rejects_bad_shapes() {
        let mut lr = LinearRegression::new();
        assert!(lr.fit(&[], &[]).is_err());
        assert!(lr.fit(&[row(0.0, 1.0, 0.0, 0.0, 1.0)], &[1.0, 2.0]).is_err());
        assert!(lr
            .fit(&[row(0.0, f64::NAN, 0.0, 0.0, 1.0)], &[1.0])
            .is_err());
    }

    #[test]
    fn test_tree_splits_step_function() {
        let x: Vec<FeatureVector> = (0..6)
            .map(|i| row(i as f64, 0.0, 0.0, 0.0, 0.0))
            .collect();
        let y = vec![10.0, 10.0, 10.0, 90.0, 90.0, 90.0];
        let sample: Vec<usize> = (0..6).collect();

        let mut tree = RegressionTree::new(3);
        tree.fit_sample(&x, &y, &sample);

        assert_eq!(tree.predict(&row(1.0, 0.0, 0.0, 0.0, 0.0)), 10.0);
        assert_eq!(tree.predict(&row(4.0, 0.0, 0.0, 0.0, 0.0)), 90.0);
        // A clean step needs exactly one split
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_tree_respects_max_depth() {
        let x: Vec<FeatureVector> = (0..16)
            .map(|i| row(i as f64, 0.0, 0.0, 0.0, 0.0))
            .collect();
        let y: Vec<f64> = (0..16).map(|i| (i * i) as f64).collect();
        let sample: Vec<usize> = (0..16).collect();

        let mut tree = RegressionTree::new(2);
        tree.fit_sample(&x, &y, &sample);
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_bagged_trees_reproducible_and_bounded() {
        let x: Vec<FeatureVector> = (0..5)
            .map(|i| row(i as f64, 1000.0 + 50.0 * i as f64, 50.0, 20.0, 4.0))
            .collect();
        let y: Vec<f64> = x.iter().map(|r| r[1]).collect();
        let query = row(5.0, 1300.0, 50.0, 20.0, 4.0);

        let mut a = BaggedTrees::new(50, 3, 42);
        a.fit(&x, &y).unwrap();
        let mut b = BaggedTrees::new(50, 3, 42);
        b.fit(&x, &y).unwrap();

        assert_eq!(a.trees().len(), 50);
        assert_eq!(a.predict(&query), b.predict(&query));

        // Tree predictions are averages of training targets
        let pred = a.predict(&query);
        assert!((1000.0..=1200.0).contains(&pred), "pred = {}", pred);
    }

    #[test]
    fn test_default_factory_names() {
        let config = ForecastConfig::default();
        let factory = DefaultRegressorFactory;
        assert_eq!(factory.linear(&config).name(), "LinearRegression");
        assert_eq!(factory.ensemble(&config).name(), "BaggedTrees");
    }
}
