//! Hash types of the sidechain DB.

use bitcoin::hashes::{hash_newtype, sha256d};

hash_newtype! {
    /// Content-addressed identifier of a withdrawal bundle (WT^).
    pub struct WtPrimeHash(sha256d::Hash);

    /// The commitment to the full sidechain DB state that a block carries in its coinbase.
    pub struct ScdbHash(sha256d::Hash);
}
