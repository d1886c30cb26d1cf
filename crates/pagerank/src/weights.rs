//! Edge weights and edge evaluators

use crate::graph::{Edge, EdgeAddress};
use credrank_common::errors::{RankError, Result};
use serde::{Deserialize, Serialize};

/// How much mass an edge carries in each direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeWeight {
    /// Weight of the flow src -> dst
    pub to_weight: f64,
    /// Weight of the flow dst -> src
    pub fro_weight: f64,
}

impl EdgeWeight {
    pub fn new(to_weight: f64, fro_weight: f64) -> Self {
        Self {
            to_weight,
            fro_weight,
        }
    }

    /// Fail unless both weights are finite and nonnegative. `label` names the
    /// edge (or edge type) in the error.
    pub fn check(&self, label: &str) -> Result<()> {
        let valid = |w: f64| w.is_finite() && w >= 0.0;
        if valid(self.to_weight) && valid(self.fro_weight) {
            Ok(())
        } else {
            Err(RankError::NegativeEdgeWeight {
                edge: label.to_string(),
                to_weight: self.to_weight,
                fro_weight: self.fro_weight,
            })
        }
    }
}

/// Edge evaluator keyed on edge type (edge address prefix)
///
/// The most specific matching prefix wins; edges matching no prefix get the
/// default weight.
#[derive(Debug, Clone)]
pub struct EdgeTypeWeights {
    /// Sorted most specific first
    types: Vec<(EdgeAddress, EdgeWeight)>,
    default: EdgeWeight,
}

impl EdgeTypeWeights {
    pub fn new(default: EdgeWeight) -> Result<Self> {
        default.check("<default>")?;
        Ok(Self {
            types: Vec::new(),
            default,
        })
    }

    /// Register a weight for every edge whose address starts with `prefix`
    pub fn with_type(mut self, prefix: EdgeAddress, weight: EdgeWeight) -> Result<Self> {
        weight.check(&prefix.to_string())?;
        self.types.retain(|(existing, _)| *existing != prefix);
        self.types.push((prefix, weight));
        self.types
            .sort_by(|(a, _), (b, _)| b.as_str().len().cmp(&a.as_str().len()));
        Ok(self)
    }

    pub fn weight(&self, edge: &Edge) -> EdgeWeight {
        self.types
            .iter()
            .find(|(prefix, _)| edge.address.has_prefix(prefix))
            .map(|(_, weight)| *weight)
            .unwrap_or(self.default)
    }

    /// Borrow as a plain edge evaluator
    pub fn evaluator(&self) -> impl Fn(&Edge) -> EdgeWeight + '_ {
        move |edge| self.weight(edge)
    }
}
