//! Reconciliation errors.

use crate::props::PropertyError;

/// Errors from a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    /// A declared property could not be defined or applied.
    #[error("node {node}: {source}")]
    Property {
        /// uid of the node whose property failed.
        node: u64,
        #[source]
        source: PropertyError,
    },
}
