pub mod encoder;
pub(crate) mod sampler;

pub use encoder::{encode_jpeg, EncodedFrame};
