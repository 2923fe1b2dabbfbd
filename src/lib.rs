pub mod error;
pub mod opcode;
pub mod config;
pub mod table;
pub mod lexer;
pub mod translate;
pub mod tape;
pub mod io;
pub mod ops;
pub mod dialect;
pub mod machine;
pub mod sync;
pub mod dialects;
pub mod definition;

pub use config::{EdgePolicy, LexMode, MachineConfig, OutputMode};
pub use dialect::{Dialect, Handler, convert};
pub use error::{Error, Fault, Result};
pub use machine::Machine;
pub use opcode::Opcode;
pub use table::TokenTable;
pub use translate::Instruction;
