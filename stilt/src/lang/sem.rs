//! Semantic analysis.
//!
//! The analyzer owns the scoped symbol tables, the function overload
//! sets and the operand type stack. The parser drives it: for every
//! rvalue it compiles it pushes one type, and for every operand an
//! operator consumes it pops one. That mirror-stack discipline keeps all
//! operator checks local.
use std::collections::HashMap;

use log::debug;
use smol_str::SmolStr;

use crate::error::CompileErrorKind;

use super::{
    tokens::{Pos, TokenKind},
    types::{BaseKind, Type},
};

/// A declared variable or array.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: SmolStr,
    pub ty: Type,
    /// Frame slot of the value; for arrays, of the first element.
    pub slot: usize,
}

type Scope = HashMap<SmolStr, Symbol>;

/// A function in the overload set.
#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    pub name: SmolStr,
    pub return_type: Type,
    pub params: Vec<Type>,
    pub defined: bool,
    /// Whether any call site resolved to this overload.
    pub called: bool,
    /// Index into the program's function registry.
    pub registry_index: usize,
    /// Position of the declaration, for diagnostics.
    pub pos: Pos,
}

/// Bookkeeping for one function call being parsed. Calls nest, so these
/// form a stack.
#[derive(Debug)]
struct CallContext {
    name: SmolStr,
    args: Vec<Type>,
}

pub struct Analyzer {
    /// Innermost scope is last. Lookup walks from the tail.
    scopes: Vec<Scope>,
    /// Next free frame slot in the current function.
    next_slot: usize,
    /// Return type of the function being compiled; `main` counts as void.
    return_type: Type,
    /// Operand type stack mirroring the runtime value stack.
    type_stack: Vec<Type>,
    functions: Vec<FunctionSymbol>,
    /// Overload sets: name to indices into `functions`.
    overloads: HashMap<SmolStr, Vec<usize>>,
    calls: Vec<CallContext>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new()],
            next_slot: 0,
            return_type: Type::VOID,
            type_stack: Vec::new(),
            functions: Vec::new(),
            overloads: HashMap::new(),
            calls: Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Scopes

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    pub fn leave_scope(&mut self) {
        debug_assert!(!self.scopes.is_empty(), "scope stack underflow");
        self.scopes.pop();
    }

    /// Start a fresh function body: locals of the previous function are
    /// gone, slot numbering restarts at zero and the expected return
    /// type is recorded.
    pub fn enter_function_scope(&mut self, return_type: Type) {
        self.scopes.clear();
        self.scopes.push(Scope::new());
        self.next_slot = 0;
        self.return_type = return_type;
    }

    pub fn declare_variable(
        &mut self,
        name: &SmolStr,
        ty: Type,
    ) -> Result<usize, CompileErrorKind> {
        self.declare(name, ty, 1)
    }

    /// Declare a fixed-size array. The array reserves `size` consecutive
    /// slots starting at the returned base slot.
    pub fn declare_array(
        &mut self,
        name: &SmolStr,
        element: Type,
        size: i32,
    ) -> Result<usize, CompileErrorKind> {
        debug_assert!(size > 0);
        self.declare(name, Type::array(element, size), size as usize)
    }

    fn declare(
        &mut self,
        name: &SmolStr,
        ty: Type,
        slot_count: usize,
    ) -> Result<usize, CompileErrorKind> {
        let scope = self
            .scopes
            .last_mut()
            .unwrap_or_else(|| unreachable!("no open scope"));
        if scope.contains_key(name) {
            return Err(CompileErrorKind::DuplicateSymbol(name.clone()));
        }

        let slot = self.next_slot;
        self.next_slot += slot_count;
        scope.insert(
            name.clone(),
            Symbol {
                name: name.clone(),
                ty,
                slot,
            },
        );
        Ok(slot)
    }

    /// Find a symbol, walking scopes from innermost outwards.
    pub fn lookup_variable(&self, name: &str) -> Result<&Symbol, CompileErrorKind> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .ok_or_else(|| CompileErrorKind::UnknownSymbol(SmolStr::new(name)))
    }

    // ------------------------------------------------------------------------
    // Type stack

    pub fn push_type(&mut self, ty: Type) {
        self.type_stack.push(ty);
    }

    /// Underflow here means the parser lost track of its own emission;
    /// that is a bug, not a user error.
    pub fn pop_type(&mut self) -> Type {
        self.type_stack.pop().expect("type stack underflow")
    }

    pub fn peek_type(&self) -> Option<&Type> {
        self.type_stack.last()
    }

    pub fn type_depth(&self) -> usize {
        self.type_stack.len()
    }

    // ------------------------------------------------------------------------
    // Operator checks

    /// Validate a binary operator against the two types on top of the
    /// stack and push the result type.
    pub fn check_binary_op(&mut self, op: TokenKind) -> Result<(), CompileErrorKind> {
        use TokenKind as T;

        let right = self.pop_type();
        let left = self.pop_type();

        let result = match op {
            T::Plus | T::Minus | T::Star | T::Slash => {
                if left.is_numeric() && right.is_numeric() {
                    Some(common_arith_type(&left, &right))
                } else {
                    None
                }
            }
            T::Percent | T::Amp | T::Pipe | T::Caret | T::Shl | T::Shr => {
                if left.is_integral() && right.is_integral() {
                    Some(common_arith_type(&left, &right))
                } else {
                    None
                }
            }
            T::Less | T::Greater | T::LessEqual | T::GreaterEqual | T::EqualEqual
            | T::BangEqual => {
                if left.is_numeric() && right.is_numeric() {
                    Some(Type::BOOL)
                } else {
                    None
                }
            }
            T::AmpAmp | T::PipePipe => {
                if left.is_integral() && right.is_integral() {
                    Some(Type::BOOL)
                } else {
                    None
                }
            }
            _ => unreachable!("{op} is not a binary operator"),
        };

        match result {
            Some(ty) => {
                self.push_type(ty);
                Ok(())
            }
            None => Err(CompileErrorKind::TypeMismatch(format!(
                "operator {op} cannot be applied to '{left}' and '{right}'"
            ))),
        }
    }

    /// Validate a unary operator against the type on top of the stack
    /// and push the result type.
    pub fn check_unary_op(&mut self, op: TokenKind) -> Result<(), CompileErrorKind> {
        use TokenKind as T;

        let operand = self.pop_type();

        let result = match op {
            T::Minus | T::PlusPlus | T::MinusMinus => {
                if operand.is_numeric() {
                    Some(operand.clone())
                } else {
                    None
                }
            }
            T::Bang => {
                if operand.is_integral() {
                    Some(Type::BOOL)
                } else {
                    None
                }
            }
            T::Tilde => {
                if operand.is_integral() {
                    Some(operand.clone())
                } else {
                    None
                }
            }
            _ => unreachable!("{op} is not a unary operator"),
        };

        match result {
            Some(ty) => {
                self.push_type(ty);
                Ok(())
            }
            None => Err(CompileErrorKind::TypeMismatch(format!(
                "operator {op} cannot be applied to '{operand}'"
            ))),
        }
    }

    /// Validate `dst = src` with source and destination types on the
    /// stack, the source on top. Pushes the source type as the result of
    /// the assignment expression.
    pub fn check_assignment(&mut self) -> Result<(), CompileErrorKind> {
        let src = self.pop_type();
        let dst = self.pop_type();

        if !dst.assignable_from(&src) {
            return Err(CompileErrorKind::TypeMismatch(format!(
                "cannot assign '{src}' to '{dst}'"
            )));
        }

        self.push_type(src);
        Ok(())
    }

    /// Validate an `if`/`while`/`for` condition: bool or integral.
    pub fn check_condition(&mut self) -> Result<(), CompileErrorKind> {
        let cond = self.pop_type();
        if cond.is_integral() {
            Ok(())
        } else {
            Err(CompileErrorKind::TypeMismatch(format!(
                "condition must be bool or integral, got '{cond}'"
            )))
        }
    }

    /// Validate a `return` against the enclosing function's return type.
    /// `has_value` tells whether an expression was compiled (its type is
    /// then on the stack).
    pub fn check_return(&mut self, has_value: bool) -> Result<(), CompileErrorKind> {
        if !has_value {
            return if self.return_type.is_void() {
                Ok(())
            } else {
                Err(CompileErrorKind::TypeMismatch(format!(
                    "return without a value in function returning '{}'",
                    self.return_type
                )))
            };
        }

        let actual = self.pop_type();
        if self.return_type.is_void() {
            return Err(CompileErrorKind::TypeMismatch(
                "return with a value in a void function".to_string(),
            ));
        }
        if !self.return_type.assignable_from(&actual) {
            return Err(CompileErrorKind::TypeMismatch(format!(
                "cannot return '{actual}' from function returning '{}'",
                self.return_type
            )));
        }
        Ok(())
    }

    /// Validate a `print` argument: anything but void.
    pub fn check_print(&mut self) -> Result<(), CompileErrorKind> {
        let ty = self.pop_type();
        if ty.is_void() {
            Err(CompileErrorKind::TypeMismatch(
                "cannot print a void value".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    /// Validate a `read` target: a scalar variable.
    pub fn check_read_target(&self, ty: &Type) -> Result<(), CompileErrorKind> {
        let scalar = !ty.is_array
            && matches!(
                ty.base,
                BaseKind::Int | BaseKind::Float | BaseKind::Bool | BaseKind::Char
            );
        if scalar {
            Ok(())
        } else {
            Err(CompileErrorKind::TypeMismatch(format!(
                "read target must be a scalar variable, got '{ty}'"
            )))
        }
    }

    /// Validate an array index with its type on top of the stack.
    pub fn check_array_index(&mut self) -> Result<(), CompileErrorKind> {
        let index = self.pop_type();
        if index.is_integral() {
            Ok(())
        } else {
            Err(CompileErrorKind::TypeMismatch(format!(
                "array index must be integral, got '{index}'"
            )))
        }
    }

    // ------------------------------------------------------------------------
    // Functions

    /// Record a forward declaration. Fails when the same signature was
    /// already declared, or when an existing overload differs only in
    /// return type.
    pub fn declare_function(
        &mut self,
        name: &SmolStr,
        return_type: Type,
        params: Vec<Type>,
        pos: Pos,
    ) -> Result<usize, CompileErrorKind> {
        if let Some(existing) = self.find_overload(name, &params) {
            let existing = &self.functions[existing];
            return Err(if existing.return_type == return_type {
                CompileErrorKind::FunctionRedefinition(name.clone())
            } else {
                CompileErrorKind::TypeMismatch(format!(
                    "conflicting return type for overload of '{name}'"
                ))
            });
        }

        Ok(self.insert_function(name, return_type, params, false, pos))
    }

    /// Record a definition, matching it against an earlier declaration
    /// of the same signature when one exists. Returns the function index
    /// and whether the symbol is new (and so still needs a registry
    /// entry).
    pub fn define_function(
        &mut self,
        name: &SmolStr,
        return_type: Type,
        params: Vec<Type>,
        pos: Pos,
    ) -> Result<(usize, bool), CompileErrorKind> {
        if let Some(index) = self.find_overload(name, &params) {
            let func = &mut self.functions[index];
            if func.defined {
                return Err(CompileErrorKind::FunctionRedefinition(name.clone()));
            }
            if func.return_type != return_type {
                return Err(CompileErrorKind::TypeMismatch(format!(
                    "definition of '{name}' does not match its declared return type '{}'",
                    func.return_type
                )));
            }
            func.defined = true;
            return Ok((index, false));
        }

        let index = self.insert_function(name, return_type, params, true, pos);
        Ok((index, true))
    }

    fn insert_function(
        &mut self,
        name: &SmolStr,
        return_type: Type,
        params: Vec<Type>,
        defined: bool,
        pos: Pos,
    ) -> usize {
        debug!(
            "function {name}/{} {}",
            params.len(),
            if defined { "defined" } else { "declared" }
        );

        let index = self.functions.len();
        self.functions.push(FunctionSymbol {
            name: name.clone(),
            return_type,
            params,
            defined,
            called: false,
            registry_index: usize::MAX,
            pos,
        });
        self.overloads.entry(name.clone()).or_default().push(index);
        index
    }

    pub fn set_registry_index(&mut self, function: usize, registry_index: usize) {
        self.functions[function].registry_index = registry_index;
    }

    pub fn function(&self, index: usize) -> &FunctionSymbol {
        &self.functions[index]
    }

    pub fn functions(&self) -> &[FunctionSymbol] {
        &self.functions
    }

    fn find_overload(&self, name: &str, params: &[Type]) -> Option<usize> {
        self.overloads.get(name).and_then(|set| {
            set.iter()
                .copied()
                .find(|&idx| self.functions[idx].params == params)
        })
    }

    /// Open a call context for `name`. The function must have at least
    /// one declared overload.
    pub fn begin_call(&mut self, name: &SmolStr) -> Result<(), CompileErrorKind> {
        if !self.overloads.contains_key(name) {
            return Err(CompileErrorKind::FunctionNotDeclared(name.clone()));
        }
        self.calls.push(CallContext {
            name: name.clone(),
            args: Vec::new(),
        });
        Ok(())
    }

    /// Record one argument: its type is popped off the type stack into
    /// the innermost call context.
    pub fn add_call_arg(&mut self) {
        let arg = self.pop_type();
        self.calls
            .last_mut()
            .expect("call argument outside of a call")
            .args
            .push(arg);
    }

    /// Close the innermost call context and resolve the overload.
    ///
    /// An overload whose parameters equal the argument types exactly
    /// wins outright; otherwise there must be exactly one overload the
    /// arguments are assignment-compatible with. The chosen function's
    /// return type is pushed.
    pub fn end_call(&mut self) -> Result<(usize, Type), CompileErrorKind> {
        let call = self.calls.pop().expect("end_call without begin_call");
        let set = self
            .overloads
            .get(call.name.as_str())
            .unwrap_or_else(|| unreachable!("call context for undeclared function"));

        let exact: Vec<usize> = set
            .iter()
            .copied()
            .filter(|&idx| self.functions[idx].params == call.args)
            .collect();

        let chosen = if exact.len() == 1 {
            exact[0]
        } else {
            let compatible: Vec<usize> = set
                .iter()
                .copied()
                .filter(|&idx| {
                    let params = &self.functions[idx].params;
                    params.len() == call.args.len()
                        && params
                            .iter()
                            .zip(&call.args)
                            .all(|(param, arg)| param.assignable_from(arg))
                })
                .collect();
            match compatible.len() {
                1 => compatible[0],
                0 => return Err(CompileErrorKind::OverloadNoMatch(call.name)),
                _ => return Err(CompileErrorKind::OverloadAmbiguous(call.name)),
            }
        };

        self.functions[chosen].called = true;
        let return_type = self.functions[chosen].return_type.clone();
        let registry_index = self.functions[chosen].registry_index;
        self.push_type(return_type.clone());
        Ok((registry_index, return_type))
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::new()
    }
}

/// Arithmetic result type: int with int stays int, any float makes it
/// float, everything else (char/bool operands) promotes to int.
fn common_arith_type(left: &Type, right: &Type) -> Type {
    if left.base == BaseKind::Float || right.base == BaseKind::Float {
        Type::FLOAT
    } else {
        Type::INT
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn name(s: &str) -> SmolStr {
        SmolStr::new(s)
    }

    #[test]
    fn test_slot_allocation() {
        let mut sem = Analyzer::new();
        sem.enter_function_scope(Type::VOID);
        assert_eq!(sem.declare_variable(&name("a"), Type::INT).unwrap(), 0);
        assert_eq!(sem.declare_array(&name("xs"), Type::INT, 4).unwrap(), 1);
        // The array reserved four slots.
        assert_eq!(sem.declare_variable(&name("b"), Type::FLOAT).unwrap(), 5);

        // Nested blocks extend numbering without reuse.
        sem.enter_scope();
        assert_eq!(sem.declare_variable(&name("c"), Type::INT).unwrap(), 6);
        sem.leave_scope();
        assert_eq!(sem.declare_variable(&name("d"), Type::INT).unwrap(), 7);
    }

    #[test]
    fn test_function_scope_resets_slots() {
        let mut sem = Analyzer::new();
        sem.enter_function_scope(Type::VOID);
        sem.declare_variable(&name("a"), Type::INT).unwrap();
        sem.enter_function_scope(Type::INT);
        assert_eq!(sem.declare_variable(&name("b"), Type::INT).unwrap(), 0);
        // Locals of the previous function are no longer visible.
        assert!(sem.lookup_variable("a").is_err());
    }

    #[test]
    fn test_duplicate_and_shadowing() {
        let mut sem = Analyzer::new();
        sem.enter_function_scope(Type::VOID);
        sem.declare_variable(&name("x"), Type::INT).unwrap();
        assert!(matches!(
            sem.declare_variable(&name("x"), Type::INT),
            Err(CompileErrorKind::DuplicateSymbol(_))
        ));

        // Same name in a nested scope is fine and wins lookups.
        sem.enter_scope();
        let inner = sem.declare_variable(&name("x"), Type::FLOAT).unwrap();
        assert_eq!(sem.lookup_variable("x").unwrap().slot, inner);
        sem.leave_scope();
        assert_eq!(sem.lookup_variable("x").unwrap().ty, Type::INT);
    }

    #[test]
    fn test_binary_op_promotion() {
        let mut sem = Analyzer::new();

        sem.push_type(Type::INT);
        sem.push_type(Type::INT);
        sem.check_binary_op(TokenKind::Plus).unwrap();
        assert_eq!(sem.pop_type(), Type::INT);

        sem.push_type(Type::INT);
        sem.push_type(Type::FLOAT);
        sem.check_binary_op(TokenKind::Star).unwrap();
        assert_eq!(sem.pop_type(), Type::FLOAT);

        sem.push_type(Type::CHAR);
        sem.push_type(Type::CHAR);
        sem.check_binary_op(TokenKind::Plus).unwrap();
        assert_eq!(sem.pop_type(), Type::INT);

        sem.push_type(Type::INT);
        sem.push_type(Type::INT);
        sem.check_binary_op(TokenKind::Less).unwrap();
        assert_eq!(sem.pop_type(), Type::BOOL);
    }

    #[test]
    fn test_binary_op_rejections() {
        let mut sem = Analyzer::new();

        sem.push_type(Type::FLOAT);
        sem.push_type(Type::INT);
        assert!(sem.check_binary_op(TokenKind::Percent).is_err());

        let mut sem = Analyzer::new();
        sem.push_type(Type::STR);
        sem.push_type(Type::INT);
        assert!(sem.check_binary_op(TokenKind::Plus).is_err());
    }

    #[test]
    fn test_overload_resolution_prefers_exact() {
        let mut sem = Analyzer::new();
        let pos = Pos::new(1, 1);
        let f_int = sem
            .declare_function(&name("f"), Type::INT, vec![Type::INT], pos)
            .unwrap();
        sem.set_registry_index(f_int, 0);
        let f_float = sem
            .declare_function(&name("f"), Type::FLOAT, vec![Type::FLOAT], pos)
            .unwrap();
        sem.set_registry_index(f_float, 1);

        // f(2) -> the int overload, even though int converts to float.
        sem.begin_call(&name("f")).unwrap();
        sem.push_type(Type::INT);
        sem.add_call_arg();
        let (registry, ret) = sem.end_call().unwrap();
        assert_eq!(registry, 0);
        assert_eq!(ret, Type::INT);
        assert_eq!(sem.pop_type(), Type::INT);

        // f(2.0) -> the float overload.
        sem.begin_call(&name("f")).unwrap();
        sem.push_type(Type::FLOAT);
        sem.add_call_arg();
        let (registry, ret) = sem.end_call().unwrap();
        assert_eq!(registry, 1);
        assert_eq!(ret, Type::FLOAT);
    }

    #[test]
    fn test_overload_no_match_and_ambiguous() {
        let mut sem = Analyzer::new();
        let pos = Pos::new(1, 1);
        sem.declare_function(&name("g"), Type::VOID, vec![Type::INT], pos)
            .unwrap();
        sem.declare_function(&name("g"), Type::VOID, vec![Type::FLOAT], pos)
            .unwrap();

        // No overload takes two arguments.
        sem.begin_call(&name("g")).unwrap();
        sem.push_type(Type::INT);
        sem.add_call_arg();
        sem.push_type(Type::INT);
        sem.add_call_arg();
        assert!(matches!(
            sem.end_call(),
            Err(CompileErrorKind::OverloadNoMatch(_))
        ));

        // A char argument converts to int but not to float.
        sem.begin_call(&name("g")).unwrap();
        sem.push_type(Type::CHAR);
        sem.add_call_arg();
        let (_, ret) = sem.end_call().unwrap();
        assert_eq!(ret, Type::VOID);

        // Declaring a char overload as well makes the int call exact but
        // a bool call impossible either way.
        sem.declare_function(&name("h"), Type::VOID, vec![Type::INT], pos)
            .unwrap();
        sem.declare_function(&name("h"), Type::VOID, vec![Type::BOOL], pos)
            .unwrap();
        sem.begin_call(&name("h")).unwrap();
        sem.push_type(Type::BOOL);
        sem.add_call_arg();
        // Exact match on the bool overload, no ambiguity.
        let (_, ret) = sem.end_call().unwrap();
        assert_eq!(ret, Type::VOID);
    }

    #[test]
    fn test_overload_differing_only_in_return_type() {
        let mut sem = Analyzer::new();
        let pos = Pos::new(1, 1);
        sem.declare_function(&name("f"), Type::INT, vec![Type::INT], pos)
            .unwrap();
        assert!(matches!(
            sem.declare_function(&name("f"), Type::FLOAT, vec![Type::INT], pos),
            Err(CompileErrorKind::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_define_matches_declaration() {
        let mut sem = Analyzer::new();
        let pos = Pos::new(1, 1);
        let declared = sem
            .declare_function(&name("f"), Type::INT, vec![Type::INT], pos)
            .unwrap();

        let (defined, is_new) = sem
            .define_function(&name("f"), Type::INT, vec![Type::INT], pos)
            .unwrap();
        assert_eq!(declared, defined);
        assert!(!is_new);

        // Defining the same signature twice is an error.
        assert!(matches!(
            sem.define_function(&name("f"), Type::INT, vec![Type::INT], pos),
            Err(CompileErrorKind::FunctionRedefinition(_))
        ));

        // Declared return type must match the definition.
        sem.declare_function(&name("g"), Type::INT, vec![], pos)
            .unwrap();
        assert!(matches!(
            sem.define_function(&name("g"), Type::FLOAT, vec![], pos),
            Err(CompileErrorKind::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_nested_calls() {
        let mut sem = Analyzer::new();
        let pos = Pos::new(1, 1);
        let f = sem
            .declare_function(&name("f"), Type::INT, vec![Type::INT], pos)
            .unwrap();
        sem.set_registry_index(f, 0);

        // f(f(1)): the inner call resolves while the outer context is
        // still open.
        sem.begin_call(&name("f")).unwrap();
        sem.begin_call(&name("f")).unwrap();
        sem.push_type(Type::INT);
        sem.add_call_arg();
        sem.end_call().unwrap();
        sem.add_call_arg();
        let (_, ret) = sem.end_call().unwrap();
        assert_eq!(ret, Type::INT);
        assert_eq!(sem.type_depth(), 1);
    }

    #[test]
    fn test_assignment_and_condition_checks() {
        let mut sem = Analyzer::new();

        sem.push_type(Type::FLOAT);
        sem.push_type(Type::INT);
        sem.check_assignment().unwrap();
        // The assignment's result is the source type.
        assert_eq!(sem.pop_type(), Type::INT);

        sem.push_type(Type::INT);
        sem.push_type(Type::FLOAT);
        assert!(sem.check_assignment().is_err());

        let mut sem = Analyzer::new();
        sem.push_type(Type::INT);
        sem.check_condition().unwrap();
        sem.push_type(Type::FLOAT);
        assert!(sem.check_condition().is_err());
    }

    #[test]
    fn test_return_checks() {
        let mut sem = Analyzer::new();
        sem.enter_function_scope(Type::INT);
        assert!(sem.check_return(false).is_err());
        sem.push_type(Type::CHAR);
        sem.check_return(true).unwrap();

        sem.enter_function_scope(Type::VOID);
        sem.check_return(false).unwrap();
        sem.push_type(Type::INT);
        assert!(sem.check_return(true).is_err());
    }
}
