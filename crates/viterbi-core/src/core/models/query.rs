use super::ids::QueryId;
use thiserror::Error;

/// Evidence attached to a single variable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Evidence {
    /// No evidence; the variable is free and may be chosen as a pivot.
    #[default]
    Unknown,
    True,
    False,
    /// Soft evidence: probability in the open interval (0, 1) that the variable is true.
    Partial(f64),
}

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("Query id {query_id} is out of range for a query of size {size}")]
    OutOfRange { query_id: QueryId, size: usize },

    #[error("Partial probability {probability} for query id {query_id} must lie strictly between 0 and 1")]
    InvalidProbability { query_id: QueryId, probability: f64 },
}

/// A dense assignment of [`Evidence`] to every query id.
///
/// Fresh queries leave every variable unknown. The engine also uses this type for
/// its decision output, in which every variable reachable from the graph is set to
/// either true or false.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphQuery {
    states: Vec<Evidence>,
}

impl GraphQuery {
    pub fn new(size: usize) -> Self {
        Self {
            states: vec![Evidence::Unknown; size],
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Returns the evidence for `id`, or `None` when the id lies outside the query.
    pub fn get(&self, id: QueryId) -> Option<Evidence> {
        self.states.get(id.index()).copied()
    }

    pub fn set(&mut self, id: QueryId, evidence: Evidence) -> Result<(), QueryError> {
        if let Evidence::Partial(probability) = evidence {
            if !(probability > 0.0 && probability < 1.0) {
                return Err(QueryError::InvalidProbability {
                    query_id: id,
                    probability,
                });
            }
        }
        let size = self.size();
        let slot = self
            .states
            .get_mut(id.index())
            .ok_or(QueryError::OutOfRange { query_id: id, size })?;
        *slot = evidence;
        Ok(())
    }

    pub fn set_true(&mut self, id: QueryId) -> Result<(), QueryError> {
        self.set(id, Evidence::True)
    }

    pub fn set_false(&mut self, id: QueryId) -> Result<(), QueryError> {
        self.set(id, Evidence::False)
    }

    pub fn set_unknown(&mut self, id: QueryId) -> Result<(), QueryError> {
        self.set(id, Evidence::Unknown)
    }

    pub fn set_partial(&mut self, id: QueryId, probability: f64) -> Result<(), QueryError> {
        self.set(id, Evidence::Partial(probability))
    }

    pub fn is_true(&self, id: QueryId) -> bool {
        self.get(id) == Some(Evidence::True)
    }

    pub fn is_false(&self, id: QueryId) -> bool {
        self.get(id) == Some(Evidence::False)
    }

    pub fn is_unknown(&self, id: QueryId) -> bool {
        self.get(id) == Some(Evidence::Unknown)
    }

    pub fn is_partial(&self, id: QueryId) -> bool {
        matches!(self.get(id), Some(Evidence::Partial(_)))
    }

    pub fn partial(&self, id: QueryId) -> Option<f64> {
        match self.get(id) {
            Some(Evidence::Partial(p)) => Some(p),
            _ => None,
        }
    }

    /// Number of query ids that carry no evidence.
    pub fn free_count(&self) -> usize {
        self.states
            .iter()
            .filter(|state| **state == Evidence::Unknown)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QueryId, Evidence)> + '_ {
        self.states
            .iter()
            .enumerate()
            .map(|(i, state)| (QueryId(i), *state))
    }
}
