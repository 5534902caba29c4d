//! Bridge to the OSA script interpreter
//!
//! Information Hiding:
//! - Wire format and escaping hidden in `codec`
//! - Script text and argument binding hidden in `script`
//! - Process lifecycle hidden behind the `ScriptRunner` trait

pub mod codec;
pub mod error;
pub mod executor;
pub mod outcome;
pub mod replay;
pub mod script;

pub use error::{BridgeError, FailureKind};
pub use executor::{OsaScriptExecutor, ScriptOutput, ScriptRunner, SerializedRunner};
pub use outcome::Outcome;
pub use replay::ReplayRunner;
pub use script::{Application, Operation, ParamSpec, Params, Script};

/// Result type returned by every adapter operation
pub type BridgeResult<T> = Result<Outcome<T>, BridgeError>;
