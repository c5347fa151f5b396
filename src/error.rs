use thiserror::Error;

/// Reasons a ShowPlan document cannot be turned into a plan tree.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("plan XML is not well-formed: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("no RelOp element found in plan XML")]
    NoOperator,
    #[error("plan XML nests elements deeper than {limit} levels")]
    TooDeep { limit: usize },
}
