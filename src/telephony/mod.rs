//! Telephony signal handling

pub mod classifier;

pub use classifier::{CallEventClassifier, CallSignal, CallState};
