//! Traces of gossiped packages and connected blocks.
//!
//! A trace is a JSON array of steps:
//!
//! ```json
//! [
//!   { "step": "package", "height": 1, "updates": [{ "sidechain": 0, "wt_prime": "..", "workscore": 1 }] },
//!   { "step": "mine", "height": 1, "updates": [], "proposals": [] },
//!   { "step": "block", "height": 2, "commitment": "..", "proposals": [] }
//! ]
//! ```

use std::{fs, path::Path};

use anyhow::{Context, Result};
use scdb_primitives::{
    hashes::ScdbHash,
    scripts::commitments::BundleProposal,
    types::BlockHeight,
    update::{UpdateMessage, UpdatePackage},
};
use serde::Deserialize;

/// A single step of a trace.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub(crate) enum TraceStep {
    /// A package received from a peer.
    Package {
        height: BlockHeight,
        updates: Vec<UpdateMessage>,
    },

    /// A block whose coinbase carries the given data.
    Block {
        height: BlockHeight,
        #[serde(default)]
        commitment: Option<ScdbHash>,
        #[serde(default)]
        proposals: Vec<BundleProposal>,
    },

    /// A block mined locally that commits to `updates`.
    Mine {
        height: BlockHeight,
        #[serde(default)]
        updates: Vec<UpdateMessage>,
        #[serde(default)]
        proposals: Vec<BundleProposal>,
    },
}

impl TraceStep {
    pub(crate) const fn height(&self) -> BlockHeight {
        match self {
            TraceStep::Package { height, .. }
            | TraceStep::Block { height, .. }
            | TraceStep::Mine { height, .. } => *height,
        }
    }
}

/// Builds the package of a `package` or `mine` step.
pub(crate) fn package(height: BlockHeight, updates: Vec<UpdateMessage>) -> UpdatePackage {
    UpdatePackage::new(height, updates)
}

/// Reads a trace from a JSON file.
pub(crate) fn from_path(path: &Path) -> Result<Vec<TraceStep>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read trace {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse trace {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_step_kinds() {
        let wt = "11".repeat(32);
        let trace = format!(
            r#"[
                {{ "step": "package", "height": 1, "updates": [{{ "sidechain": 0, "wt_prime": "{wt}", "workscore": 2 }}] }},
                {{ "step": "mine", "height": 1 }},
                {{ "step": "block", "height": 2, "proposals": [{{ "sidechain": 1, "wt_prime": "{wt}" }}] }}
            ]"#
        );

        let steps: Vec<TraceStep> = serde_json::from_str(&trace).unwrap();

        assert_eq!(steps.len(), 3);
        assert!(matches!(&steps[0], TraceStep::Package { updates, .. } if updates.len() == 1));
        assert!(matches!(&steps[1], TraceStep::Mine { updates, .. } if updates.is_empty()));
        assert!(matches!(
            &steps[2],
            TraceStep::Block { commitment: None, proposals, .. } if proposals.len() == 1
        ));
        assert_eq!(steps[2].height(), 2);
    }
}
