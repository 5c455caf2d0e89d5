//! Re-exports of the most commonly used params types.

pub use crate::{
    errors::{ParamsError, ParamsResult, TagError},
    scdb::ScdbParams,
    sidechain::{SidechainParams, SidechainTable},
    types::{SidechainIdx, Tag, TAG_SIZE},
};
