//! Coinbase `OP_RETURN` outputs that commit to sidechain DB data.
//!
//! Two kinds of commitment live in a block's coinbase:
//!
//! - the sidechain DB commitment: `OP_RETURN <commitment tag | scdb hash>`, stating the hash of the
//!   sidechain DB after the block's update has been applied.
//! - bundle proposals: `OP_RETURN <bundle tag | sidechain | wt^ hash>`, nominating a withdrawal
//!   bundle for the next verification period.

use bitcoin::{
    hashes::Hash,
    opcodes::all::OP_RETURN,
    script::{Builder, Instruction},
    Amount, Script, ScriptBuf, TxOut,
};
use scdb_params::types::{Tag, TAG_SIZE};
use serde::{Deserialize, Serialize};

use super::push_bytes;
use crate::{
    errors::{CommitmentError, CommitmentResult},
    hashes::{ScdbHash, WtPrimeHash},
    types::SidechainIdx,
};

const HASH_SIZE: usize = 32;

/// The size of the payload of a sidechain DB commitment.
pub const SCDB_COMMITMENT_LEN: usize = TAG_SIZE + HASH_SIZE;

/// The size of the payload of a bundle proposal.
pub const BUNDLE_PROPOSAL_LEN: usize = TAG_SIZE + 1 + HASH_SIZE;

/// A withdrawal bundle nominated in a coinbase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BundleProposal {
    /// The sidechain that the bundle withdraws from.
    pub sidechain: SidechainIdx,

    /// The proposed bundle.
    pub wt_prime: WtPrimeHash,
}

/// Builds the coinbase output script that commits to `hash`.
pub fn commitment_script(tag: &Tag, hash: &ScdbHash) -> ScriptBuf {
    let mut payload = Vec::with_capacity(SCDB_COMMITMENT_LEN);
    payload.extend_from_slice(tag.as_bytes());
    payload.extend_from_slice(hash.as_byte_array());

    op_return(&payload)
}

/// Returns the sidechain DB hash committed to by `script`, if it is a commitment.
pub fn parse_scdb_commitment(script: &Script, tag: &Tag) -> Option<ScdbHash> {
    let payload = tagged_payload(script, tag, SCDB_COMMITMENT_LEN)?;
    let hash = <[u8; HASH_SIZE]>::try_from(payload).ok()?;

    Some(ScdbHash::from_byte_array(hash))
}

/// Finds the sidechain DB commitment among a coinbase's outputs.
///
/// Repeating the same commitment is harmless. Two different commitments make the block ambiguous
/// and are rejected. `Ok(None)` means the block carries no sidechain DB update.
pub fn find_scdb_commitment<'a>(
    outputs: impl IntoIterator<Item = &'a TxOut>,
    tag: &Tag,
) -> CommitmentResult<Option<ScdbHash>> {
    let mut found: Option<ScdbHash> = None;

    for hash in outputs
        .into_iter()
        .filter_map(|txout| parse_scdb_commitment(&txout.script_pubkey, tag))
    {
        match found {
            None => found = Some(hash),
            Some(first) if first != hash => {
                return Err(CommitmentError::Conflicting {
                    first,
                    second: hash,
                });
            }
            Some(_) => {}
        }
    }

    Ok(found)
}

/// Builds the coinbase output script that proposes a withdrawal bundle.
pub fn bundle_proposal_script(tag: &Tag, proposal: &BundleProposal) -> ScriptBuf {
    let mut payload = Vec::with_capacity(BUNDLE_PROPOSAL_LEN);
    payload.extend_from_slice(tag.as_bytes());
    payload.push(proposal.sidechain);
    payload.extend_from_slice(proposal.wt_prime.as_byte_array());

    op_return(&payload)
}

/// Returns the bundle proposed by `script`, if it is a proposal.
pub fn parse_bundle_proposal(script: &Script, tag: &Tag) -> Option<BundleProposal> {
    let payload = tagged_payload(script, tag, BUNDLE_PROPOSAL_LEN)?;
    let (&sidechain, hash) = payload.split_first()?;
    let hash = <[u8; HASH_SIZE]>::try_from(hash).ok()?;

    Some(BundleProposal {
        sidechain,
        wt_prime: WtPrimeHash::from_byte_array(hash),
    })
}

/// Returns every bundle proposal among a coinbase's outputs in output order.
pub fn find_bundle_proposals<'a>(
    outputs: impl IntoIterator<Item = &'a TxOut>,
    tag: &Tag,
) -> Vec<BundleProposal> {
    outputs
        .into_iter()
        .filter_map(|txout| parse_bundle_proposal(&txout.script_pubkey, tag))
        .collect()
}

/// Builds the zero-valued coinbase outputs that commit to `commitment` and propose `proposals`.
///
/// The commitment, if any, comes first, followed by the proposals in order.
pub fn data_outputs(
    commitment_tag: &Tag,
    bundle_tag: &Tag,
    commitment: Option<&ScdbHash>,
    proposals: &[BundleProposal],
) -> Vec<TxOut> {
    commitment
        .map(|hash| commitment_script(commitment_tag, hash))
        .into_iter()
        .chain(
            proposals
                .iter()
                .map(|proposal| bundle_proposal_script(bundle_tag, proposal)),
        )
        .map(|script_pubkey| TxOut {
            value: Amount::ZERO,
            script_pubkey,
        })
        .collect()
}

fn op_return(payload: &[u8]) -> ScriptBuf {
    Builder::new()
        .push_opcode(OP_RETURN)
        .push_slice(push_bytes(payload))
        .into_script()
}

/// Returns the bytes after `tag` if `script` is exactly `OP_RETURN <tag | data>` with a push of
/// `len` bytes.
fn tagged_payload<'s>(script: &'s Script, tag: &Tag, len: usize) -> Option<&'s [u8]> {
    let mut instructions = script.instructions();

    match instructions.next()? {
        Ok(Instruction::Op(op)) if op == OP_RETURN => {}
        _ => return None,
    }

    let push = match instructions.next()? {
        Ok(Instruction::PushBytes(push)) => push.as_bytes(),
        _ => return None,
    };

    if instructions.next().is_some() || push.len() != len || !tag.is_prefix_of(push) {
        return None;
    }

    Some(&push[TAG_SIZE..])
}
