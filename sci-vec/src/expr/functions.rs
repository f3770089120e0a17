//! The math-function table consulted by expressions.

use crate::buffer::is_empty_value;
use crate::error::{Error, Result};
use crate::sort;
use crate::stats::{self, Statistic};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// Applied to every element; empty elements are passed through untouched.
pub type PointFn = fn(f64) -> Result<f64>;
/// Reduces a vector to one value.
pub type ScalarFn = fn(&[f64]) -> Result<f64>;
/// Transforms a whole vector.
pub type VectorFn = fn(&[f64]) -> Result<Vec<f64>>;
/// Produces each output element independently of the input values.
pub type FillFn = fn(&mut StdRng) -> f64;

/// A registered function, tagged by calling convention.
#[derive(Debug, Clone, Copy)]
pub enum MathFunction {
    /// Element-wise, length preserving.
    Point(PointFn),
    /// Reducing to a single value.
    Scalar(ScalarFn),
    /// Whole-vector transform.
    Vector(VectorFn),
    /// Ignores the input values and fills every slot.
    NoArgs(FillFn),
}

/// Registered math functions, keyed by name.
#[derive(Debug)]
pub struct FunctionTable {
    functions: BTreeMap<String, MathFunction>,
    rng: RefCell<StdRng>,
}

impl FunctionTable {
    /// A table holding only the built-in functions, with the random
    /// generator seeded by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        let mut table = Self {
            functions: BTreeMap::new(),
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        };
        table.install_builtins();
        table
    }

    /// Register (or replace) `name`.
    pub fn register(&mut self, name: impl Into<String>, function: MathFunction) {
        self.functions.insert(name.into(), function);
    }

    /// Remove `name`, returning the function it named.
    pub fn unregister(&mut self, name: &str) -> Option<MathFunction> {
        self.functions.remove(name)
    }

    /// Look up `name`.
    pub fn get(&self, name: &str) -> Option<MathFunction> {
        self.functions.get(name).copied()
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Apply `function` to `values`.
    pub fn apply(&self, function: MathFunction, values: &[f64]) -> Result<Vec<f64>> {
        match function {
            MathFunction::Point(f) => values
                .iter()
                .map(|&x| if is_empty_value(x) { Ok(x) } else { f(x) })
                .collect(),
            MathFunction::Scalar(f) => Ok(vec![f(values)?]),
            MathFunction::Vector(f) => f(values),
            MathFunction::NoArgs(f) => {
                let mut rng = self.rng.borrow_mut();
                Ok(values.iter().map(|_| f(&mut rng)).collect())
            }
        }
    }

    fn install_builtins(&mut self) {
        use MathFunction::{NoArgs, Point, Scalar, Vector};

        self.register("abs", Point(|x| Ok(x.abs())));
        self.register("acos", Point(|x| unit_domain("acos", x).map(f64::acos)));
        self.register("asin", Point(|x| unit_domain("asin", x).map(f64::asin)));
        self.register("atan", Point(|x| Ok(x.atan())));
        self.register("ceil", Point(|x| Ok(x.ceil())));
        self.register("cos", Point(|x| Ok(x.cos())));
        self.register("cosh", Point(|x| Ok(x.cosh())));
        self.register("exp", Point(|x| Ok(x.exp())));
        self.register("floor", Point(|x| Ok(x.floor())));
        self.register("log", Point(|x| positive("log", x).map(f64::ln)));
        self.register("log10", Point(|x| positive("log10", x).map(f64::log10)));
        self.register("round", Point(|x| Ok(x.round())));
        self.register("sin", Point(|x| Ok(x.sin())));
        self.register("sinh", Point(|x| Ok(x.sinh())));
        self.register("sqrt", Point(|x| {
            if x < 0.0 {
                Err(Error::domain("sqrt", x))
            } else {
                Ok(x.sqrt())
            }
        }));
        self.register("tan", Point(|x| Ok(x.tan())));
        self.register("tanh", Point(|x| Ok(x.tanh())));

        self.register("adev", Scalar(|v| Ok(Statistic::Adev.evaluate(v))));
        self.register("kurtosis", Scalar(|v| Ok(Statistic::Kurtosis.evaluate(v))));
        self.register("length", Scalar(|v| Ok(v.len() as f64)));
        self.register("max", Scalar(|v| Ok(Statistic::Max.evaluate(v))));
        self.register("mean", Scalar(|v| Ok(Statistic::Mean.evaluate(v))));
        self.register("median", Scalar(|v| Ok(Statistic::Median.evaluate(v))));
        self.register("min", Scalar(|v| Ok(Statistic::Min.evaluate(v))));
        self.register("prod", Scalar(|v| Ok(Statistic::Prod.evaluate(v))));
        self.register("q1", Scalar(|v| Ok(Statistic::Q1.evaluate(v))));
        self.register("q3", Scalar(|v| Ok(Statistic::Q3.evaluate(v))));
        self.register("sdev", Scalar(|v| Ok(Statistic::Stdev.evaluate(v))));
        self.register("skew", Scalar(|v| Ok(Statistic::Skew.evaluate(v))));
        self.register("sum", Scalar(|v| Ok(Statistic::Sum.evaluate(v))));
        self.register("var", Scalar(|v| Ok(Statistic::Variance.evaluate(v))));

        self.register("norm", Vector(|v| Ok(stats::normalize(v))));
        self.register("sort", Vector(|v| Ok(sort::sorted(v))));
        self.register("nz", Vector(|v| {
            Ok(stats::indices(v, stats::ElementClass::Nonzero)
                .into_iter()
                .map(|i| i as f64)
                .collect())
        }));

        self.register("random", NoArgs(|rng| rng.random::<f64>()));
    }
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

fn unit_domain(func: &str, x: f64) -> Result<f64> {
    if x.abs() > 1.0 {
        Err(Error::domain(func, x))
    } else {
        Ok(x)
    }
}

fn positive(func: &str, x: f64) -> Result<f64> {
    if x <= 0.0 {
        Err(Error::domain(func, x))
    } else {
        Ok(x)
    }
}
