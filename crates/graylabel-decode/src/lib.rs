//! Gray-code label reader.
//!
//! Given the reference frame, the bit-plane frames and the confirmed light
//! pixel positions, every position is assigned the sequential index its LED
//! broadcast: the ring brightness on each bit-plane is compared against the
//! same ring on the reference frame, the bits are packed most significant
//! first and the Gray code is decoded.

mod error;
mod labels;
mod params;
mod reader;

pub use error::DecodeError;
pub use labels::{LabelCollision, LabelMap};
pub use params::LabelParams;
pub use reader::{read_bits, read_labels};
