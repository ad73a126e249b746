//! Bytecode representation.
//!
//! A compiled program is a flat vector of instructions in postfix order,
//! together with the string pool and the function registry the VM needs
//! at run time. The vector only ever grows during compilation; the one
//! exception is backpatching, where a previously reserved jump target is
//! written exactly once.
use std::fmt::{self, Write};

use log::trace;
use smol_str::SmolStr;

/// Operation codes of the stack machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum Op {
    // ------------------------------------------------------------------------
    // Literals
    /// Push an integer immediate.
    PushInt,
    /// Push a float; the argument holds the IEEE-754 bits.
    PushFloat,
    /// Push a char immediate.
    PushChar,
    /// Push a bool immediate (0 or 1).
    PushBool,
    /// Push a string from the pool; the argument is the pool index.
    PushString,

    // ------------------------------------------------------------------------
    // Locals
    /// Push the value at frame slot `arg1`.
    LoadVar,
    /// Pop a value into frame slot `arg1`.
    StoreVar,
    /// Pop an index; push the element at `arg1 + index`.
    LoadElem,
    /// Pop a value, pop an index; store at `arg1 + index`.
    StoreElem,

    // ------------------------------------------------------------------------
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // ------------------------------------------------------------------------
    // Unary
    Neg,
    Not,
    BNot,

    // ------------------------------------------------------------------------
    // Bitwise and shifts
    And,
    Or,
    Xor,
    Shl,
    Shr,

    // ------------------------------------------------------------------------
    // Comparisons
    CmpEq,
    CmpNe,
    CmpLt,
    CmpLe,
    CmpGt,
    CmpGe,

    // ------------------------------------------------------------------------
    // Logic; both operands are already on the stack, there is no
    // short-circuiting.
    LogAnd,
    LogOr,

    // ------------------------------------------------------------------------
    // Control flow
    /// Unconditional jump to instruction `arg1`.
    Jump,
    /// Pop a value; jump to `arg1` when it is falsy.
    JumpIfFalse,

    // ------------------------------------------------------------------------
    // Functions
    /// Call the function with registry index `arg1`.
    Call,
    RetValue,
    RetVoid,

    // ------------------------------------------------------------------------
    // I/O
    Print,
    ReadInt,
    ReadFloat,
    ReadBool,
    ReadChar,
    ReadString,

    // ------------------------------------------------------------------------
    // Misc
    Nop,
    Halt,
}

impl Op {
    /// Whether the instruction carries a meaningful first argument.
    pub fn has_arg(&self) -> bool {
        use Op as O;
        matches!(
            self,
            O::PushInt
                | O::PushFloat
                | O::PushChar
                | O::PushBool
                | O::PushString
                | O::LoadVar
                | O::StoreVar
                | O::LoadElem
                | O::StoreElem
                | O::Jump
                | O::JumpIfFalse
                | O::Call
        )
    }

    pub fn is_jump(&self) -> bool {
        matches!(self, Op::Jump | Op::JumpIfFalse)
    }
}

impl fmt::Display for Op {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Op as O;
        let name = match self {
            O::PushInt     => "PUSH_INT",
            O::PushFloat   => "PUSH_FLOAT",
            O::PushChar    => "PUSH_CHAR",
            O::PushBool    => "PUSH_BOOL",
            O::PushString  => "PUSH_STRING",
            O::LoadVar     => "LOAD_VAR",
            O::StoreVar    => "STORE_VAR",
            O::LoadElem    => "LOAD_ELEM",
            O::StoreElem   => "STORE_ELEM",
            O::Add         => "ADD",
            O::Sub         => "SUB",
            O::Mul         => "MUL",
            O::Div         => "DIV",
            O::Mod         => "MOD",
            O::Neg         => "NEG",
            O::Not         => "NOT",
            O::BNot        => "BNOT",
            O::And         => "AND",
            O::Or          => "OR",
            O::Xor         => "XOR",
            O::Shl         => "SHL",
            O::Shr         => "SHR",
            O::CmpEq       => "CMP_EQ",
            O::CmpNe       => "CMP_NE",
            O::CmpLt       => "CMP_LT",
            O::CmpLe       => "CMP_LE",
            O::CmpGt       => "CMP_GT",
            O::CmpGe       => "CMP_GE",
            O::LogAnd      => "LOG_AND",
            O::LogOr       => "LOG_OR",
            O::Jump        => "JUMP",
            O::JumpIfFalse => "JUMP_IF_FALSE",
            O::Call        => "CALL",
            O::RetValue    => "RET_VALUE",
            O::RetVoid     => "RET_VOID",
            O::Print       => "PRINT",
            O::ReadInt     => "READ_INT",
            O::ReadFloat   => "READ_FLOAT",
            O::ReadBool    => "READ_BOOL",
            O::ReadChar    => "READ_CHAR",
            O::ReadString  => "READ_STRING",
            O::Nop         => "NOP",
            O::Halt        => "HALT",
        };
        write!(f, "{name}")
    }
}

/// One instruction with up to two integer arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instr {
    pub op: Op,
    pub arg1: i32,
    pub arg2: i32,
}

impl Instr {
    pub fn new(op: Op, arg1: i32, arg2: i32) -> Self {
        Self { op, arg1, arg2 }
    }
}

/// Entry in the function registry.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub name: SmolStr,
    pub param_count: usize,
    /// Instruction pointer of the function body; negative while the
    /// function is declared but not yet defined.
    pub entry_ip: i32,
}

/// A compiled program: instructions, string pool and function registry.
///
/// Immutable once handed to the VM.
#[derive(Debug, Default)]
pub struct Program {
    code: Vec<Instr>,
    strings: Vec<String>,
    functions: Vec<FunctionInfo>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next emitted instruction will occupy.
    #[inline]
    pub fn current_ip(&self) -> usize {
        self.code.len()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    #[inline]
    pub fn instr(&self, ip: usize) -> &Instr {
        &self.code[ip]
    }

    pub fn code(&self) -> &[Instr] {
        &self.code
    }

    /// Append an instruction and return its index.
    pub fn emit(&mut self, op: Op, arg1: i32, arg2: i32) -> usize {
        let ip = self.code.len();
        trace!("emit {ip}: {op} {arg1}, {arg2}");
        self.code.push(Instr::new(op, arg1, arg2));
        ip
    }

    pub fn emit_op(&mut self, op: Op) -> usize {
        self.emit(op, 0, 0)
    }

    /// Emit a jump with a placeholder target, to be patched later.
    pub fn emit_jump(&mut self, op: Op) -> usize {
        debug_assert!(op.is_jump());
        self.emit(op, -1, 0)
    }

    /// Write the target of a previously reserved jump.
    pub fn patch_jump(&mut self, at: usize, target: usize) {
        let instr = &mut self.code[at];
        debug_assert!(instr.op.is_jump(), "patching a non-jump at {at}");
        debug_assert_eq!(instr.arg1, -1, "jump at {at} patched twice");
        instr.arg1 = target as i32;
    }

    /// Intern a string and return its pool index.
    pub fn add_string(&mut self, s: &str) -> usize {
        match self.strings.iter().position(|pooled| pooled == s) {
            Some(idx) => idx,
            None => {
                self.strings.push(s.to_string());
                self.strings.len() - 1
            }
        }
    }

    pub fn string(&self, idx: usize) -> &str {
        &self.strings[idx]
    }

    /// Register a function and return its registry index. The entry IP
    /// is filled in when the definition is compiled.
    pub fn add_function(&mut self, name: SmolStr, param_count: usize) -> usize {
        self.functions.push(FunctionInfo {
            name,
            param_count,
            entry_ip: -1,
        });
        self.functions.len() - 1
    }

    pub fn set_function_entry(&mut self, index: usize, entry_ip: usize) {
        self.functions[index].entry_ip = entry_ip as i32;
    }

    pub fn function(&self, index: usize) -> &FunctionInfo {
        &self.functions[index]
    }

    pub fn functions(&self) -> &[FunctionInfo] {
        &self.functions
    }

    /// Render the program as a human readable listing.
    pub fn dump(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        for (ip, instr) in self.code.iter().enumerate() {
            if instr.op.has_arg() {
                writeln!(buf, "{ip}:\t{} {}", instr.op, instr.arg1)?;
            } else {
                writeln!(buf, "{ip}:\t{}", instr.op)?;
            }
        }

        writeln!(buf, "--- String pool ---")?;
        for (idx, s) in self.strings.iter().enumerate() {
            writeln!(buf, "{idx}: {s:?}")?;
        }

        writeln!(buf, "--- Functions ---")?;
        for (idx, func) in self.functions.iter().enumerate() {
            writeln!(
                buf,
                "{idx}: {} /{} entry {}",
                func.name, func.param_count, func.entry_ip
            )?;
        }

        Ok(buf)
    }
}
