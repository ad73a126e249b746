//! Result and errors.
use std::{
    fmt::{self, Display, Formatter},
    io,
    string::FromUtf8Error,
};

use smol_str::SmolStr;

use crate::lang::tokens::{Pos, TokenKind};

pub type StiltResult<T> = std::result::Result<T, StiltError>;

#[derive(Debug)]
pub enum StiltError {
    /// Lexical, syntactic or semantic failure while compiling.
    Compile(CompileError),
    /// Fatal error during VM execution.
    Vm(VmError),
    Fmt(fmt::Error),
    Io(io::Error),
    Utf8(FromUtf8Error),
}

impl Display for StiltError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Compile(err) => write!(f, "{}", err),
            Self::Vm(err) => write!(f, "runtime error: {}", err),
            Self::Fmt(err) => write!(f, "{}", err),
            Self::Io(err) => write!(f, "{}", err),
            Self::Utf8(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for StiltError {}

impl From<CompileError> for StiltError {
    fn from(err: CompileError) -> Self {
        StiltError::Compile(err)
    }
}

impl From<VmError> for StiltError {
    fn from(err: VmError) -> Self {
        StiltError::Vm(err)
    }
}

impl From<fmt::Error> for StiltError {
    fn from(err: fmt::Error) -> Self {
        StiltError::Fmt(err)
    }
}

impl From<io::Error> for StiltError {
    fn from(err: io::Error) -> Self {
        StiltError::Io(err)
    }
}

impl From<FromUtf8Error> for StiltError {
    fn from(err: FromUtf8Error) -> Self {
        StiltError::Utf8(err)
    }
}

/// Compile-time failure at a known source position.
#[derive(Debug)]
pub struct CompileError {
    pub pos: Pos,
    pub kind: CompileErrorKind,
}

impl CompileError {
    pub fn new(pos: Pos, kind: CompileErrorKind) -> Self {
        Self { pos, kind }
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "Error at {}", self.pos)?;
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for CompileError {}

#[derive(Debug)]
pub enum CompileErrorKind {
    // ------------------------------------------------------------------------
    // Lexical
    UnknownCharacter(char),
    UnterminatedString,
    UnterminatedComment,
    MalformedNumber(SmolStr),
    MalformedChar,

    // ------------------------------------------------------------------------
    // Syntactic
    /// Token mismatch: a description of what was expected, and what was found.
    UnexpectedToken {
        expected: String,
        found: TokenKind,
    },

    // ------------------------------------------------------------------------
    // Semantic
    DuplicateSymbol(SmolStr),
    UnknownSymbol(SmolStr),
    TypeMismatch(String),
    OverloadNoMatch(SmolStr),
    OverloadAmbiguous(SmolStr),
    ArrayIndexOutOfRange {
        index: i32,
        size: i32,
    },
    InvalidLValue,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    FunctionNotDeclared(SmolStr),
    FunctionNotDefined(SmolStr),
    FunctionRedefinition(SmolStr),
}

impl Display for CompileErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        use CompileErrorKind as E;
        match self {
            E::UnknownCharacter(c) => write!(f, "unknown character {c:?}"),
            E::UnterminatedString => write!(f, "unterminated string literal"),
            E::UnterminatedComment => write!(f, "unterminated block comment"),
            E::MalformedNumber(text) => write!(f, "malformed number literal '{text}'"),
            E::MalformedChar => write!(f, "malformed char literal"),
            E::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            E::DuplicateSymbol(name) => write!(f, "symbol '{name}' is already declared"),
            E::UnknownSymbol(name) => write!(f, "unknown symbol '{name}'"),
            E::TypeMismatch(detail) => write!(f, "type mismatch: {detail}"),
            E::OverloadNoMatch(name) => {
                write!(f, "no overload of '{name}' matches the argument types")
            }
            E::OverloadAmbiguous(name) => {
                write!(f, "call of '{name}' is ambiguous between overloads")
            }
            E::ArrayIndexOutOfRange { index, size } => {
                write!(f, "array index {index} is out of range for size {size}")
            }
            E::InvalidLValue => write!(f, "expression is not assignable"),
            E::BreakOutsideLoop => write!(f, "'break' outside of a loop"),
            E::ContinueOutsideLoop => write!(f, "'continue' outside of a loop"),
            E::FunctionNotDeclared(name) => write!(f, "function '{name}' is not declared"),
            E::FunctionNotDefined(name) => {
                write!(f, "function '{name}' is declared but never defined")
            }
            E::FunctionRedefinition(name) => write!(f, "function '{name}' is already defined"),
        }
    }
}

/// Fatal error raised by the VM execution loop.
#[derive(Debug)]
pub enum VmError {
    DivisionByZero,
    /// The program popped more values than it pushed. A compiler bug guard.
    StackUnderflow,
    /// A load referenced a slot beyond the current stack extent.
    UninitializedSlot,
    /// A `READ_*` instruction could not parse its input token.
    InvalidInput(String),
    /// Value kinds the type checker should have excluded.
    Runtime(&'static str),
}

impl Display for VmError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::StackUnderflow => write!(f, "VM stack underflow"),
            Self::UninitializedSlot => write!(f, "read of uninitialized variable"),
            Self::InvalidInput(detail) => write!(f, "invalid input: {detail}"),
            Self::Runtime(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for VmError {}
