//! Purpose: Define the stable public API boundary for jsonsieve.
//! Exports: Error model, query processing, and both data-source implementations.
//! Role: Public, additive-only surface; the CLI and tests go through this module.
//! Invariants: This module is the only public path used by the binary.

mod remote;

use serde_json::Value;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::query::{Query, apply};
pub use crate::core::source::FileSource;
pub use remote::RemoteSource;

/// The two implementations of the data-provider contract. The server holds
/// one of these, chosen at startup; `init` always uses the remote variant.
#[derive(Clone, Debug)]
pub enum Source {
    File(FileSource),
    Remote(RemoteSource),
}

impl Source {
    pub fn load(&self) -> Result<Vec<Value>, Error> {
        match self {
            Source::File(source) => source.load(),
            Source::Remote(source) => source.load(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Source::File(source) => source.path().display().to_string(),
            Source::Remote(source) => source.url().to_string(),
        }
    }
}
