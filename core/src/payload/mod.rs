// Payload module: the logical message carried inside a QR code

pub mod codec;
pub mod types;

pub use codec::{parse, parse_bounded, serialize, MalformedPayload, MAX_SERIALIZED_SIZE};
pub use types::SharedPayload;
