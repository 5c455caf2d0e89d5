//! Output scripts that carry sidechain DB data.

use bitcoin::script::PushBytesBuf;

pub mod commitments;
pub mod deposit;

fn push_bytes(data: &[u8]) -> PushBytesBuf {
    let mut push_data = PushBytesBuf::new();
    push_data
        .extend_from_slice(data)
        .expect("data should be within limit");

    push_data
}
