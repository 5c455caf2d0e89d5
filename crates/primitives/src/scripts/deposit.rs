//! Recognition of sidechain deposit outputs.
//!
//! A deposit locks main-chain value to a sidechain by embedding the deposit flag, the sidechain
//! index and a destination key hash in the output script. Two encodings are in use:
//!
//! - [`DepositLayout::Unconditional`]: `OP_TRUE <flag> <key hash> <sidechain> OP_DROP OP_2DROP`. The
//!   drops leave only `OP_TRUE` on the stack so the output is anyone-can-spend from the main chain's
//!   point of view.
//! - [`DepositLayout::DirectPush`]: a single 25-byte push of `flag | sidechain | key hash`.
//!
//! Anything else is not a deposit. Recognition never fails loudly since arbitrary scripts are
//! expected on chain.

use bitcoin::{
    hashes::Hash,
    opcodes::{
        all::{OP_2DROP, OP_DROP, OP_PUSHNUM_1, OP_PUSHNUM_16},
        Opcode, OP_TRUE,
    },
    script::{read_scriptint, Builder, Instruction},
    Amount, PubkeyHash, Script, ScriptBuf, Transaction,
};
use scdb_params::types::{Tag, TAG_SIZE};
use serde::{Deserialize, Serialize};

use super::push_bytes;
use crate::types::{SidechainIdx, DESTINATION_SIZE};

/// The length of the single push in a [`DepositLayout::DirectPush`] script.
pub const DIRECT_PUSH_LEN: usize = TAG_SIZE + 1 + DESTINATION_SIZE;

/// The number of instructions in a [`DepositLayout::Unconditional`] script.
const UNCONDITIONAL_INSTRUCTIONS: usize = 6;

/// The encoding a deposit was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositLayout {
    /// `OP_TRUE <flag> <key hash> <sidechain> OP_DROP OP_2DROP`.
    Unconditional,

    /// A single push of `flag | sidechain | key hash`.
    DirectPush,
}

/// A sidechain deposit decoded from an output script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SidechainDeposit {
    /// The sidechain the value is bound to.
    pub sidechain: SidechainIdx,

    /// The key hash that receives the value on the sidechain.
    pub destination: PubkeyHash,

    /// How the deposit was encoded.
    pub layout: DepositLayout,
}

/// A deposit output of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositOutput {
    /// The index of the output in the transaction.
    pub vout: u32,

    /// The value transferred to the sidechain.
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub amount: Amount,

    /// The decoded deposit.
    pub deposit: SidechainDeposit,
}

/// Decodes `script` as a sidechain deposit marked with `flag`.
///
/// Returns `None` for anything that is not exactly one of the two layouts.
pub fn recognize_deposit(script: &Script, flag: &Tag) -> Option<SidechainDeposit> {
    parse_direct_push(script, flag).or_else(|| parse_unconditional(script, flag))
}

/// Returns every deposit output of `tx` along with its index and value.
pub fn find_deposits(tx: &Transaction, flag: &Tag) -> Vec<DepositOutput> {
    tx.output
        .iter()
        .enumerate()
        .filter_map(|(vout, txout)| {
            recognize_deposit(&txout.script_pubkey, flag).map(|deposit| DepositOutput {
                vout: vout as u32,
                amount: txout.value,
                deposit,
            })
        })
        .collect()
}

fn parse_direct_push(script: &Script, flag: &Tag) -> Option<SidechainDeposit> {
    let bytes = script.as_bytes();
    let (&len, payload) = bytes.split_first()?;

    if len as usize != DIRECT_PUSH_LEN || payload.len() != DIRECT_PUSH_LEN {
        return None;
    }

    let (flag_bytes, rest) = payload.split_at(TAG_SIZE);
    if flag_bytes != flag.as_bytes() {
        return None;
    }

    let (&sidechain, destination) = rest.split_first()?;

    Some(SidechainDeposit {
        sidechain,
        destination: to_destination(destination)?,
        layout: DepositLayout::DirectPush,
    })
}

fn parse_unconditional(script: &Script, flag: &Tag) -> Option<SidechainDeposit> {
    // a malformed push anywhere disqualifies the whole script
    let instructions = script
        .instructions()
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    let [Instruction::Op(op_true), Instruction::PushBytes(flag_push), Instruction::PushBytes(destination), sidechain, Instruction::Op(drop), Instruction::Op(drop2)] =
        <[Instruction<'_>; UNCONDITIONAL_INSTRUCTIONS]>::try_from(instructions).ok()?
    else {
        return None;
    };

    if op_true != OP_TRUE || drop != OP_DROP || drop2 != OP_2DROP {
        return None;
    }

    if flag_push.as_bytes() != flag.as_bytes() {
        return None;
    }

    Some(SidechainDeposit {
        sidechain: decode_sidechain(&sidechain)?,
        destination: to_destination(destination.as_bytes())?,
        layout: DepositLayout::Unconditional,
    })
}

/// Decodes a script number that must be minimally encoded and fit a [`SidechainIdx`].
fn decode_sidechain(instruction: &Instruction<'_>) -> Option<SidechainIdx> {
    let value = match instruction {
        Instruction::PushBytes(bytes) => read_scriptint(bytes.as_bytes()).ok()?,
        Instruction::Op(op) => small_int(*op)?,
    };

    SidechainIdx::try_from(value).ok()
}

fn small_int(op: Opcode) -> Option<i64> {
    let code = op.to_u8();
    (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8())
        .contains(&code)
        .then(|| (code - OP_PUSHNUM_1.to_u8() + 1) as i64)
}

fn to_destination(bytes: &[u8]) -> Option<PubkeyHash> {
    <[u8; DESTINATION_SIZE]>::try_from(bytes)
        .ok()
        .map(PubkeyHash::from_byte_array)
}

/// Builds an [`DepositLayout::Unconditional`] deposit script.
///
/// The sidechain index is pushed as a minimal script number.
pub fn unconditional_deposit_script(
    flag: &Tag,
    sidechain: SidechainIdx,
    destination: &PubkeyHash,
) -> ScriptBuf {
    Builder::new()
        .push_opcode(OP_TRUE)
        .push_slice(push_bytes(flag.as_bytes()))
        .push_slice(push_bytes(destination.as_byte_array()))
        .push_int(sidechain as i64)
        .push_opcode(OP_DROP)
        .push_opcode(OP_2DROP)
        .into_script()
}

/// Builds a [`DepositLayout::DirectPush`] deposit script.
pub fn direct_push_deposit_script(
    flag: &Tag,
    sidechain: SidechainIdx,
    destination: &PubkeyHash,
) -> ScriptBuf {
    let mut payload = Vec::with_capacity(DIRECT_PUSH_LEN);
    payload.extend_from_slice(flag.as_bytes());
    payload.push(sidechain);
    payload.extend_from_slice(destination.as_byte_array());

    Builder::new().push_slice(push_bytes(&payload)).into_script()
}
