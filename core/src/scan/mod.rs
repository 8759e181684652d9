// Scan module: scan-to-display round trip

pub mod session;

pub use session::{
    FailureReason, ScanError, ScanEvent, ScanFailure, ScanSession, ScanSource, ScanState,
};
