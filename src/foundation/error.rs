use crate::foundation::core::{GraphId, NodeId};
use std::fmt;

/// Convenience result type used across flowgraph.
pub type FlowResult<T> = Result<T, FlowError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum FlowError {
    /// Invalid user-provided project, composition or graph data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while parsing or evaluating an `expr` node.
    #[error("expression error: {0}")]
    Expression(String),

    /// Errors while running an evaluation pass (malformed runtime values).
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Broken structural invariant; indicates corrupted state rather than bad input.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlowError {
    /// Build a [`FlowError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FlowError::Expression`] value.
    pub fn expression(msg: impl Into<String>) -> Self {
        Self::Expression(msg.into())
    }

    /// Build a [`FlowError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`FlowError::Invariant`] value.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Build a [`FlowError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors a recomputation pass may swallow (fail-soft).
    ///
    /// Invariant and validation failures are never recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Expression(_) | Self::Evaluation(_))
    }
}

/// One compilation problem inside a composition.
///
/// Compilers return every problem they find as a list so callers can display all of them at
/// once instead of stopping at the first.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CompositionError {
    /// Graph the problem was found in, if it is graph-specific.
    pub graph: Option<GraphId>,
    /// Node the problem was found in, if it is node-specific.
    pub node: Option<NodeId>,
    /// Human readable description.
    pub message: String,
}

impl CompositionError {
    /// Problem located on a specific node.
    pub fn at_node(graph: &GraphId, node: &NodeId, message: impl Into<String>) -> Self {
        Self {
            graph: Some(graph.clone()),
            node: Some(node.clone()),
            message: message.into(),
        }
    }

    /// Problem located on a whole graph.
    pub fn at_graph(graph: &GraphId, message: impl Into<String>) -> Self {
        Self {
            graph: Some(graph.clone()),
            node: None,
            message: message.into(),
        }
    }

    /// Problem not tied to a single graph (e.g. layer ordering).
    pub fn composition(message: impl Into<String>) -> Self {
        Self {
            graph: None,
            node: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for CompositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.graph, &self.node) {
            (Some(g), Some(n)) => write!(f, "{g}/{n}: {}", self.message),
            (Some(g), None) => write!(f, "{g}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for CompositionError {}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
