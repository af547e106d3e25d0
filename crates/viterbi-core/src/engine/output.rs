use crate::core::models::ids::QueryId;
use crate::core::models::query::GraphQuery;

/// The free variable whose resolution would most change the best-state probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    pub query_id: QueryId,
    /// Best probability with the variable false over best probability with it true.
    pub ratio: f64,
}

/// Result of one evaluation.
///
/// `state` and `pivot` are only filled in by a full evaluation. A full evaluation of a
/// query without free variables reports no pivot.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub state: Option<GraphQuery>,
    pub max_probability: f64,
    pub total_probability: f64,
    pub pivot: Option<Pivot>,
}

impl Output {
    pub(crate) fn probabilities(max_probability: f64, total_probability: f64) -> Self {
        Self {
            state: None,
            max_probability,
            total_probability,
            pivot: None,
        }
    }

    /// Whether any joint state is consistent with the evidence.
    pub fn is_feasible(&self) -> bool {
        self.total_probability > 0.0
    }

    pub fn pivot_id(&self) -> Option<QueryId> {
        self.pivot.map(|pivot| pivot.query_id)
    }

    pub fn pivot_ratio(&self) -> Option<f64> {
        self.pivot.map(|pivot| pivot.ratio)
    }

    /// Share of the total probability carried by the best joint state.
    pub fn confidence(&self) -> Option<f64> {
        self.is_feasible()
            .then(|| self.max_probability / self.total_probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probabilities_only_output_has_no_state_or_pivot() {
        let output = Output::probabilities(3.0, 4.0);
        assert!(output.state.is_none());
        assert_eq!(output.pivot_id(), None);
        assert_eq!(output.pivot_ratio(), None);
        assert!(output.is_feasible());
        assert_eq!(output.confidence(), Some(0.75));
    }

    #[test]
    fn infeasible_output_has_no_confidence() {
        let output = Output::probabilities(0.0, 0.0);
        assert!(!output.is_feasible());
        assert_eq!(output.confidence(), None);
    }

    #[test]
    fn pivot_accessors_read_through() {
        let output = Output {
            pivot: Some(Pivot {
                query_id: QueryId(4),
                ratio: 0.5,
            }),
            ..Output::probabilities(1.0, 2.0)
        };
        assert_eq!(output.pivot_id(), Some(QueryId(4)));
        assert_eq!(output.pivot_ratio(), Some(0.5));
    }
}
