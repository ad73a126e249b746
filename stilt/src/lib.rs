pub mod bytecode;
mod error;
pub mod lang;
pub mod vm;

pub use self::{
    error::{CompileError, CompileErrorKind, StiltError, StiltResult, VmError},
    lang::{compile, compile_with_keywords},
};

/// Version of *this* implementation.
pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use super::{
        bytecode::{Op, Program},
        error::{CompileError, StiltError, StiltResult, VmError},
        lang::compile,
        vm::{execute, InputBuffer, ReaderBuffer, StiltVm},
    };
}
