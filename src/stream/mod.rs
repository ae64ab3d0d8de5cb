mod chunk;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod handles;
mod header;
pub mod peek;
pub mod pump;
pub mod signal;
pub mod sniff;
pub mod state;

pub use config::*;
pub use diagnostics::*;
pub use error::*;
pub use handles::*;
pub use peek::*;
pub use pump::*;
pub use sniff::*;
pub use state::{Drain, WaitFor};
