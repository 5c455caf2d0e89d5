//! Coinbase outputs carrying sidechain DB data.

use bitcoin::{Amount, ScriptBuf, TxOut};
use scdb_params::prelude::ScdbParams;
use scdb_primitives::{
    hashes::ScdbHash,
    scripts::commitments::{data_outputs, BundleProposal},
};

/// The subsidy output every test coinbase starts with.
pub fn subsidy_output() -> TxOut {
    TxOut {
        value: Amount::from_btc(50.0).expect("subsidy must be valid"),
        script_pubkey: ScriptBuf::new(),
    }
}

/// Builds the outputs of a coinbase that commits to `commitment` and proposes `proposals`.
pub fn coinbase_outputs(
    params: &ScdbParams,
    commitment: Option<ScdbHash>,
    proposals: &[BundleProposal],
) -> Vec<TxOut> {
    std::iter::once(subsidy_output())
        .chain(data_outputs(
            &params.commitment_tag,
            &params.bundle_commit_tag,
            commitment.as_ref(),
            proposals,
        ))
        .collect()
}
