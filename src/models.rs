use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::artifact;
use crate::error::{DecodeError, LoadError, PredictError};
use crate::features::{self, FlightQuery};

/// Output space a regressor was fitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scale {
    Price,
    /// Natural log of the price; predictions are exponentiated.
    LogPrice,
}

impl Scale {
    fn apply(self, raw: f64) -> f64 {
        match self {
            Scale::Price => raw,
            Scale::LogPrice => raw.exp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub feature_names: Vec<String>,
    pub intercept: f64,
    pub weights: Vec<f64>,
    pub scale: Scale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// `x[feature] <= threshold` continues at `left`, otherwise at `right`.
    Split {
        feature: u32,
        threshold: f64,
        left: u32,
        right: u32,
    },
    Leaf {
        value: f64,
    },
}

/// Flat tree, root at index 0. Children always sit after their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestRegressor {
    pub feature_names: Vec<String>,
    pub trees: Vec<RegressionTree>,
    pub scale: Scale,
}

/// Everything an artifact can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FareModel {
    Linear(LinearRegressor),
    Forest(ForestRegressor),
}

fn finite(what: &str, value: f64) -> Result<(), DecodeError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DecodeError::shape(format!("{} is not finite ({})", what, value)))
    }
}

impl RegressionTree {
    fn validate(&self, tree: usize, feature_count: usize) -> Result<(), DecodeError> {
        if self.nodes.is_empty() {
            return Err(DecodeError::shape(format!("tree {} has no nodes", tree)));
        }
        let len = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature as usize >= feature_count {
                        return Err(DecodeError::shape(format!(
                            "tree {} node {} splits on feature {} of {}",
                            tree, i, feature, feature_count
                        )));
                    }
                    finite("split threshold", threshold)?;
                    for child in [left as usize, right as usize] {
                        if child <= i || child >= len {
                            return Err(DecodeError::shape(format!(
                                "tree {} node {} points at node {} (must be in {}..{})",
                                tree,
                                i,
                                child,
                                i + 1,
                                len
                            )));
                        }
                    }
                }
                Node::Leaf { value } => finite("leaf value", value)?,
            }
        }
        Ok(())
    }

    /// Walks from the root. Only call on validated trees.
    fn evaluate(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = x.get(*feature as usize).copied().unwrap_or(f64::NAN);
                    idx = (if value <= *threshold { *left } else { *right }) as usize;
                }
                Some(Node::Leaf { value }) => return *value,
                None => return f64::NAN,
            }
        }
    }
}

impl FareModel {
    pub fn kind(&self) -> &'static str {
        match self {
            FareModel::Linear(_) => "linear",
            FareModel::Forest(_) => "forest",
        }
    }

    pub fn feature_names(&self) -> &[String] {
        match self {
            FareModel::Linear(m) => &m.feature_names,
            FareModel::Forest(m) => &m.feature_names,
        }
    }

    /// Check that a freshly decoded model can actually be evaluated against
    /// the current feature encoding.
    pub fn validate(&self) -> Result<(), DecodeError> {
        let expected = features::feature_names();
        if self.feature_names() != expected.as_slice() {
            return Err(DecodeError::shape(format!(
                "model was fitted on {} features that do not match the {} this build encodes",
                self.feature_names().len(),
                expected.len()
            )));
        }

        match self {
            FareModel::Linear(m) => {
                if m.weights.len() != m.feature_names.len() {
                    return Err(DecodeError::shape(format!(
                        "{} weights for {} features",
                        m.weights.len(),
                        m.feature_names.len()
                    )));
                }
                finite("intercept", m.intercept)?;
                for w in &m.weights {
                    finite("weight", *w)?;
                }
            }
            FareModel::Forest(m) => {
                if m.trees.is_empty() {
                    return Err(DecodeError::shape("forest has no trees"));
                }
                for (i, tree) in m.trees.iter().enumerate() {
                    tree.validate(i, m.feature_names.len())?;
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, x: &[f64]) -> f64 {
        match self {
            FareModel::Linear(m) => {
                let raw = m.intercept + m.weights.iter().zip(x).map(|(w, v)| w * v).sum::<f64>();
                m.scale.apply(raw)
            }
            FareModel::Forest(m) => {
                let total: f64 = m.trees.iter().map(|t| t.evaluate(x)).sum();
                m.scale.apply(total / m.trees.len() as f64)
            }
        }
    }

    /// Log-scale linear model reproducing the booking form's pricing rule:
    /// a class base fare times airline and stop-count multipliers.
    pub fn baseline() -> Self {
        const ECONOMY_BASE: f64 = 4000.0;
        const BUSINESS_BASE: f64 = 8000.0;
        const MULTIPLIERS: [(&str, f64); 9] = [
            ("airline=SpiceJet", 0.9),
            ("airline=AirAsia", 0.85),
            ("airline=Vistara", 1.2),
            ("airline=GO_FIRST", 0.95),
            ("airline=Indigo", 1.0),
            ("airline=Air_India", 1.1),
            ("stops=zero", 1.0),
            ("stops=one", 1.2),
            ("stops=two_or_more", 1.5),
        ];

        let feature_names = features::feature_names();
        let mut weights = vec![0.0; feature_names.len()];
        let mut set = |name: &str, multiplier: f64| {
            if let Some(i) = features::feature_index(name) {
                weights[i] = multiplier.ln();
            }
        };
        for (name, multiplier) in MULTIPLIERS {
            set(name, multiplier);
        }
        set("class=Business", BUSINESS_BASE / ECONOMY_BASE);

        FareModel::Linear(LinearRegressor {
            feature_names,
            intercept: ECONOMY_BASE.ln(),
            weights,
            scale: Scale::LogPrice,
        })
    }
}

/// Predicted fare in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Fare(pub u64);

impl std::fmt::Display for Fare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub trait Predictor {
    fn predict(&self, query: &FlightQuery, as_of: NaiveDate) -> Result<Fare, PredictError>;
}

/// A loaded model. Callers only get to ask it for fares.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelHandle {
    model: FareModel,
}

impl ModelHandle {
    pub fn new(model: FareModel) -> Result<Self, DecodeError> {
        model.validate()?;
        Ok(Self { model })
    }

    pub fn kind(&self) -> &'static str {
        self.model.kind()
    }
}

impl Predictor for ModelHandle {
    fn predict(&self, query: &FlightQuery, as_of: NaiveDate) -> Result<Fare, PredictError> {
        let x = features::encode(query, as_of)?;
        let fare = self.model.evaluate(&x);
        if !fare.is_finite() {
            return Err(PredictError::NonFinite(fare));
        }
        Ok(Fare(fare.max(0.0).round() as u64))
    }
}

/// Load a model from a local file path.
pub fn load_model(path: impl AsRef<Path>) -> Result<ModelHandle, LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| LoadError::from_io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "read model artifact");

    let model = artifact::decode(&bytes).map_err(|reason| LoadError::decode(path, reason))?;
    tracing::info!(path = %path.display(), kind = model.kind(), "loaded fare model");

    Ok(ModelHandle { model })
}
