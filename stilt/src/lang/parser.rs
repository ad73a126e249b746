//! Parser and code emitter.
//!
//! A single pass over the token stream drives everything: the parser
//! recognizes the grammar, calls into the [`Analyzer`] to keep the
//! symbol tables and the operand type stack in step, and appends
//! bytecode as it goes. Operators emit after their operands, which
//! yields postfix code without any intermediate tree. Forward jumps are
//! emitted with a placeholder target and patched once the target
//! instruction index is known.
//!
//! Identifiers compile lazily: recognizing `x` or `a[i]` only records a
//! deferred lvalue descriptor and pushes its type. The descriptor
//! becomes a store when an `=` follows, and a load at the next
//! sub-expression boundary otherwise (see [`Parser::finalize_rvalue`]).
use log::debug;

use crate::{
    bytecode::{Op, Program},
    error::{CompileError, CompileErrorKind},
};

use super::{
    sem::Analyzer,
    token_stream::TokenStream,
    tokens::{Keyword, Pos, TokenKind},
    types::{BaseKind, Type},
};

/// Deferred lvalue, waiting to become either a load or a store.
#[derive(Debug)]
enum LValue {
    /// Simple variable at a frame slot.
    Var { slot: usize },
    /// Array element. The index expression is already compiled, so at
    /// run time the index sits on the value stack.
    Elem { base_slot: usize },
}

/// Per-loop patch bookkeeping. Only the innermost loop owns pending
/// `break` jumps.
struct LoopFrame {
    /// Where `continue` goes: the condition (while) or the step (for).
    continue_ip: usize,
    /// Pending `break` jumps, patched to the loop end.
    break_jumps: Vec<usize>,
}

/// Binary operator tiers from lowest to highest precedence. Each tier
/// maps its token kinds to the opcode the operator emits.
#[rustfmt::skip]
const BINARY_TIERS: &[&[(TokenKind, Op)]] = &[
    &[(TokenKind::PipePipe, Op::LogOr)],
    &[(TokenKind::AmpAmp, Op::LogAnd)],
    &[(TokenKind::Pipe, Op::Or)],
    &[(TokenKind::Caret, Op::Xor)],
    &[(TokenKind::Amp, Op::And)],
    &[(TokenKind::EqualEqual, Op::CmpEq), (TokenKind::BangEqual, Op::CmpNe)],
    &[
        (TokenKind::Less, Op::CmpLt),
        (TokenKind::Greater, Op::CmpGt),
        (TokenKind::LessEqual, Op::CmpLe),
        (TokenKind::GreaterEqual, Op::CmpGe),
    ],
    &[(TokenKind::Shl, Op::Shl), (TokenKind::Shr, Op::Shr)],
    &[(TokenKind::Plus, Op::Add), (TokenKind::Minus, Op::Sub)],
    &[(TokenKind::Star, Op::Mul), (TokenKind::Slash, Op::Div), (TokenKind::Percent, Op::Mod)],
];

pub struct Parser<'a> {
    stream: TokenStream<'a>,
    sem: Analyzer,
    program: Program,
    pending_lvalue: Option<LValue>,
    /// Innermost loop is last.
    loops: Vec<LoopFrame>,
}

impl<'a> Parser<'a> {
    pub fn new(stream: TokenStream<'a>) -> Self {
        Self {
            stream,
            sem: Analyzer::new(),
            program: Program::new(),
            pending_lvalue: None,
            loops: Vec::new(),
        }
    }

    /// Compile a whole program.
    ///
    /// Layout: a jump to `main`'s entry, then the function bodies in
    /// definition order (each behind its own skip jump), then `main`,
    /// closed by `HALT`.
    pub fn parse_program(mut self) -> Result<Program, CompileError> {
        let entry_jump = self.program.emit_jump(Op::Jump);

        while self.match_keyword(Keyword::Declare) {
            self.parse_fn_decl()?;
        }

        while self.at_type_token() {
            self.parse_fn_def()?;
        }

        self.parse_main(entry_jump)?;

        if !self.stream.match_kind(TokenKind::Eof) {
            return Err(self.stream.unexpected("end of file after 'main'"));
        }

        self.check_called_functions_defined()?;

        debug_assert_eq!(self.sem.type_depth(), 0, "unbalanced type stack");
        debug!(
            "compiled {} instructions, {} functions",
            self.program.len(),
            self.program.functions().len()
        );
        Ok(self.program)
    }

    // ------------------------------------------------------------------------
    // Helpers

    #[inline(never)]
    #[cold]
    fn error_at(&self, pos: Pos, kind: CompileErrorKind) -> CompileError {
        CompileError::new(pos, kind)
    }

    fn match_keyword(&self, keyword: Keyword) -> bool {
        self.stream.match_kind(TokenKind::Keyword(keyword))
    }

    fn expect_keyword(&mut self, keyword: Keyword, what: &str) -> Result<(), CompileError> {
        self.stream.expect(TokenKind::Keyword(keyword), what)?;
        Ok(())
    }

    fn at_type_token(&self) -> bool {
        matches!(
            self.stream.current().kind,
            TokenKind::Keyword(
                Keyword::Int | Keyword::Char | Keyword::Bool | Keyword::Float | Keyword::Void
            )
        )
    }

    /// Parse a scalar type name.
    fn parse_type(&mut self) -> Result<Type, CompileError> {
        let base = match self.stream.current().kind {
            TokenKind::Keyword(Keyword::Int) => BaseKind::Int,
            TokenKind::Keyword(Keyword::Char) => BaseKind::Char,
            TokenKind::Keyword(Keyword::Bool) => BaseKind::Bool,
            TokenKind::Keyword(Keyword::Float) => BaseKind::Float,
            TokenKind::Keyword(Keyword::Void) => BaseKind::Void,
            _ => return Err(self.stream.unexpected("a type")),
        };
        self.stream.advance()?;
        Ok(Type::scalar(base))
    }

    /// Commit a deferred lvalue as a load. Every decision point that
    /// changes which kind of emission follows an lvalue calls this
    /// first.
    fn finalize_rvalue(&mut self) {
        if let Some(lvalue) = self.pending_lvalue.take() {
            match lvalue {
                LValue::Var { slot } => self.program.emit(Op::LoadVar, slot as i32, 0),
                LValue::Elem { base_slot } => self.program.emit(Op::LoadElem, base_slot as i32, 0),
            };
        }
    }

    // ------------------------------------------------------------------------
    // Top level

    /// `declare type ident ( [type {, type}] ) ;`
    fn parse_fn_decl(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Declare, "'declare'")?;
        let return_type = self.parse_type()?;
        let name = self.stream.expect(TokenKind::Ident, "function name")?;

        self.stream.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.stream.match_kind(TokenKind::RParen) {
            loop {
                params.push(self.parse_param_type()?);
                if !self.stream.eat(TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.stream.expect(TokenKind::RParen, "')' after parameter types")?;
        self.stream.expect(TokenKind::Semicolon, "';' after declaration")?;

        let param_count = params.len();
        let index = self
            .sem
            .declare_function(&name.lexeme, return_type, params, name.pos)
            .map_err(|kind| self.error_at(name.pos, kind))?;
        let registry = self.program.add_function(name.lexeme.clone(), param_count);
        self.sem.set_registry_index(index, registry);
        Ok(())
    }

    fn parse_param_type(&mut self) -> Result<Type, CompileError> {
        let pos = self.stream.current().pos;
        let ty = self.parse_type()?;
        if ty.is_void() {
            return Err(self.error_at(
                pos,
                CompileErrorKind::TypeMismatch("parameter cannot be void".to_string()),
            ));
        }
        Ok(ty)
    }

    /// `type ident ( [param {, param}] ) block`
    fn parse_fn_def(&mut self) -> Result<(), CompileError> {
        let return_type = self.parse_type()?;
        let name = self.stream.expect(TokenKind::Ident, "function name")?;

        self.stream.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.stream.match_kind(TokenKind::RParen) {
            loop {
                let ty = self.parse_param_type()?;
                let param = self.stream.expect(TokenKind::Ident, "parameter name")?;
                params.push((param, ty));
                if !self.stream.eat(TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.stream.expect(TokenKind::RParen, "')' after parameters")?;

        let param_types: Vec<Type> = params.iter().map(|(_, ty)| ty.clone()).collect();
        let (index, is_new) = self
            .sem
            .define_function(&name.lexeme, return_type.clone(), param_types, name.pos)
            .map_err(|kind| self.error_at(name.pos, kind))?;
        if is_new {
            let registry = self.program.add_function(name.lexeme.clone(), params.len());
            self.sem.set_registry_index(index, registry);
        }
        let registry = self.sem.function(index).registry_index;

        // Execution must not fall into the body; it is only entered
        // through CALL.
        let skip = self.program.emit_jump(Op::Jump);
        self.program
            .set_function_entry(registry, self.program.current_ip());

        self.sem.enter_function_scope(return_type.clone());
        // The call protocol leaves the arguments at the bottom of the
        // new frame, so the parameters take slots 0..n in order.
        for (param, ty) in params {
            self.sem
                .declare_variable(&param.lexeme, ty)
                .map_err(|kind| self.error_at(param.pos, kind))?;
        }

        self.parse_block()?;

        if return_type.is_void() {
            // Safety net for void functions without a trailing `return;`.
            self.program.emit_op(Op::RetVoid);
        }
        let after = self.program.current_ip();
        self.program.patch_jump(skip, after);
        Ok(())
    }

    /// `main block`, closed with `HALT`.
    fn parse_main(&mut self, entry_jump: usize) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Main, "'main'")?;
        self.program.patch_jump(entry_jump, self.program.current_ip());

        self.sem.enter_function_scope(Type::VOID);
        self.parse_block()?;
        self.program.emit_op(Op::Halt);
        Ok(())
    }

    /// A function that was called somewhere must have received a body by
    /// the end of the program.
    fn check_called_functions_defined(&self) -> Result<(), CompileError> {
        for func in self.sem.functions() {
            if func.called && !func.defined {
                return Err(self.error_at(
                    func.pos,
                    CompileErrorKind::FunctionNotDefined(func.name.clone()),
                ));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Statements

    fn parse_block(&mut self) -> Result<(), CompileError> {
        self.stream.expect(TokenKind::LBrace, "'{' to begin block")?;
        self.sem.enter_scope();

        while !self.stream.match_kind(TokenKind::RBrace) {
            if self.stream.match_kind(TokenKind::Eof) {
                return Err(self.stream.unexpected("'}' to close block"));
            }
            let depth = self.sem.type_depth();
            self.parse_stmt()?;
            debug_assert_eq!(
                self.sem.type_depth(),
                depth,
                "a statement must leave the type stack balanced"
            );
        }

        self.stream.expect(TokenKind::RBrace, "'}' to close block")?;
        self.sem.leave_scope();
        Ok(())
    }

    fn parse_stmt(&mut self) -> Result<(), CompileError> {
        use Keyword as K;

        if self.at_type_token() {
            return self.parse_decl_stmt();
        }

        match self.stream.current().kind {
            TokenKind::Keyword(K::If) => self.parse_if_stmt(),
            TokenKind::Keyword(K::While) => self.parse_while_stmt(),
            TokenKind::Keyword(K::For) => self.parse_for_stmt(),
            TokenKind::Keyword(K::Return) => self.parse_return_stmt(),
            TokenKind::Keyword(K::Break) => self.parse_break_stmt(),
            TokenKind::Keyword(K::Continue) => self.parse_continue_stmt(),
            TokenKind::Keyword(K::Print) => self.parse_print_stmt(),
            TokenKind::Keyword(K::Read) => self.parse_read_stmt(),
            TokenKind::LBrace => self.parse_block(),
            _ => self.parse_expr_stmt(),
        }
    }

    /// `type ident [ '[' intLit ']' ] ;`
    fn parse_decl_stmt(&mut self) -> Result<(), CompileError> {
        let type_pos = self.stream.current().pos;
        let ty = self.parse_type()?;
        if ty.is_void() {
            return Err(self.error_at(
                type_pos,
                CompileErrorKind::TypeMismatch("cannot declare a variable of type void".to_string()),
            ));
        }

        let name = self.stream.expect(TokenKind::Ident, "variable name")?;

        if self.stream.eat(TokenKind::LBracket)? {
            let size_token = self.stream.expect(TokenKind::IntLiteral, "array size")?;
            let size: i32 = size_token.lexeme.parse().map_err(|_| {
                self.error_at(
                    size_token.pos,
                    CompileErrorKind::MalformedNumber(size_token.lexeme.clone()),
                )
            })?;
            self.stream
                .expect(TokenKind::RBracket, "']' after array size")?;
            if size <= 0 {
                return Err(self.error_at(
                    size_token.pos,
                    CompileErrorKind::TypeMismatch("array size must be positive".to_string()),
                ));
            }
            self.sem
                .declare_array(&name.lexeme, ty, size)
                .map_err(|kind| self.error_at(name.pos, kind))?;
        } else {
            self.sem
                .declare_variable(&name.lexeme, ty)
                .map_err(|kind| self.error_at(name.pos, kind))?;
        }

        self.stream
            .expect(TokenKind::Semicolon, "';' after declaration")?;
        Ok(())
    }

    /// `if (cond) block { elif (cond) block } [ else (block | ifStmt) ]`
    fn parse_if_stmt(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::If, "'if'")?;
        let mut false_jump = self.parse_condition_parens()?;
        self.parse_block()?;

        // Jumps to the end of the whole chain, one per taken branch.
        let mut end_jumps = Vec::new();

        while self.match_keyword(Keyword::Elif) {
            self.stream.advance()?;
            end_jumps.push(self.program.emit_jump(Op::Jump));
            self.program
                .patch_jump(false_jump, self.program.current_ip());
            false_jump = self.parse_condition_parens()?;
            self.parse_block()?;
        }

        if self.match_keyword(Keyword::Else) {
            self.stream.advance()?;
            end_jumps.push(self.program.emit_jump(Op::Jump));
            self.program
                .patch_jump(false_jump, self.program.current_ip());
            if self.match_keyword(Keyword::If) {
                self.parse_if_stmt()?;
            } else {
                self.parse_block()?;
            }
        } else {
            self.program
                .patch_jump(false_jump, self.program.current_ip());
        }

        let end = self.program.current_ip();
        for jump in end_jumps {
            self.program.patch_jump(jump, end);
        }
        Ok(())
    }

    /// `( cond )` with the condition compiled and checked; returns the
    /// reserved `JUMP_IF_FALSE`.
    fn parse_condition_parens(&mut self) -> Result<usize, CompileError> {
        self.stream.expect(TokenKind::LParen, "'(' before condition")?;
        let cond_pos = self.stream.current().pos;
        self.parse_expr()?;
        self.finalize_rvalue();
        self.sem
            .check_condition()
            .map_err(|kind| self.error_at(cond_pos, kind))?;
        self.stream.expect(TokenKind::RParen, "')' after condition")?;
        Ok(self.program.emit_jump(Op::JumpIfFalse))
    }

    /// `while (cond) block`
    fn parse_while_stmt(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::While, "'while'")?;
        let start = self.program.current_ip();
        let false_jump = self.parse_condition_parens()?;

        self.loops.push(LoopFrame {
            continue_ip: start,
            break_jumps: Vec::new(),
        });
        self.parse_block()?;
        let frame = self.loops.pop().unwrap_or_else(|| unreachable!());

        self.program.emit(Op::Jump, start as i32, 0);
        let end = self.program.current_ip();
        self.program.patch_jump(false_jump, end);
        for jump in frame.break_jumps {
            self.program.patch_jump(jump, end);
        }
        Ok(())
    }

    /// `for ( [init] ; [cond] ; [step] ) block`
    ///
    /// The step is laid out before the body but executed between
    /// iterations, so `continue` only needs to target the step.
    fn parse_for_stmt(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::For, "'for'")?;
        self.stream.expect(TokenKind::LParen, "'(' after 'for'")?;

        if !self.stream.match_kind(TokenKind::Semicolon) {
            self.parse_expr()?;
            self.finalize_rvalue();
            self.sem.pop_type();
        }
        self.stream
            .expect(TokenKind::Semicolon, "';' after loop initializer")?;

        let cond_ip = self.program.current_ip();
        if self.stream.match_kind(TokenKind::Semicolon) {
            // Absent condition means run forever.
            self.program.emit(Op::PushBool, 1, 0);
        } else {
            let cond_pos = self.stream.current().pos;
            self.parse_expr()?;
            self.finalize_rvalue();
            self.sem
                .check_condition()
                .map_err(|kind| self.error_at(cond_pos, kind))?;
        }
        self.stream
            .expect(TokenKind::Semicolon, "';' after loop condition")?;

        let false_jump = self.program.emit_jump(Op::JumpIfFalse);
        let body_jump = self.program.emit_jump(Op::Jump);

        let step_ip = self.program.current_ip();
        if !self.stream.match_kind(TokenKind::RParen) {
            self.parse_expr()?;
            self.finalize_rvalue();
            self.sem.pop_type();
        }
        self.stream
            .expect(TokenKind::RParen, "')' after loop step")?;
        self.program.emit(Op::Jump, cond_ip as i32, 0);

        self.program
            .patch_jump(body_jump, self.program.current_ip());
        self.loops.push(LoopFrame {
            continue_ip: step_ip,
            break_jumps: Vec::new(),
        });
        self.parse_block()?;
        let frame = self.loops.pop().unwrap_or_else(|| unreachable!());

        self.program.emit(Op::Jump, step_ip as i32, 0);
        let end = self.program.current_ip();
        self.program.patch_jump(false_jump, end);
        for jump in frame.break_jumps {
            self.program.patch_jump(jump, end);
        }
        Ok(())
    }

    /// `return [expr] ;`
    fn parse_return_stmt(&mut self) -> Result<(), CompileError> {
        let pos = self.stream.current().pos;
        self.expect_keyword(Keyword::Return, "'return'")?;

        if self.stream.match_kind(TokenKind::Semicolon) {
            self.sem
                .check_return(false)
                .map_err(|kind| self.error_at(pos, kind))?;
            self.program.emit_op(Op::RetVoid);
        } else {
            self.parse_expr()?;
            self.finalize_rvalue();
            self.sem
                .check_return(true)
                .map_err(|kind| self.error_at(pos, kind))?;
            self.program.emit_op(Op::RetValue);
        }

        self.stream
            .expect(TokenKind::Semicolon, "';' after return")?;
        Ok(())
    }

    fn parse_break_stmt(&mut self) -> Result<(), CompileError> {
        let pos = self.stream.current().pos;
        self.expect_keyword(Keyword::Break, "'break'")?;
        self.stream.expect(TokenKind::Semicolon, "';' after break")?;

        let jump = self.program.emit_jump(Op::Jump);
        match self.loops.last_mut() {
            Some(frame) => frame.break_jumps.push(jump),
            None => return Err(self.error_at(pos, CompileErrorKind::BreakOutsideLoop)),
        }
        Ok(())
    }

    fn parse_continue_stmt(&mut self) -> Result<(), CompileError> {
        let pos = self.stream.current().pos;
        self.expect_keyword(Keyword::Continue, "'continue'")?;
        self.stream
            .expect(TokenKind::Semicolon, "';' after continue")?;

        match self.loops.last() {
            Some(frame) => {
                self.program.emit(Op::Jump, frame.continue_ip as i32, 0);
                Ok(())
            }
            None => Err(self.error_at(pos, CompileErrorKind::ContinueOutsideLoop)),
        }
    }

    /// `print ( expr ) ;`
    fn parse_print_stmt(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Print, "'print'")?;
        self.stream.expect(TokenKind::LParen, "'(' after 'print'")?;

        let arg_pos = self.stream.current().pos;
        self.parse_expr()?;
        self.finalize_rvalue();
        self.sem
            .check_print()
            .map_err(|kind| self.error_at(arg_pos, kind))?;
        self.program.emit_op(Op::Print);

        self.stream
            .expect(TokenKind::RParen, "')' after 'print' argument")?;
        self.stream
            .expect(TokenKind::Semicolon, "';' after 'print(...)'")?;
        Ok(())
    }

    /// `read ( ident ) ;`
    fn parse_read_stmt(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Read, "'read'")?;
        self.stream.expect(TokenKind::LParen, "'(' after 'read'")?;

        let name = self.stream.expect(TokenKind::Ident, "variable name")?;
        let symbol = self
            .sem
            .lookup_variable(&name.lexeme)
            .map_err(|kind| self.error_at(name.pos, kind))?;
        let (slot, ty) = (symbol.slot, symbol.ty.clone());
        self.sem
            .check_read_target(&ty)
            .map_err(|kind| self.error_at(name.pos, kind))?;

        let op = match ty.base {
            BaseKind::Int => Op::ReadInt,
            BaseKind::Float => Op::ReadFloat,
            BaseKind::Bool => Op::ReadBool,
            BaseKind::Char => Op::ReadChar,
            _ => unreachable!("read target already checked"),
        };
        self.program.emit_op(op);
        self.program.emit(Op::StoreVar, slot as i32, 0);

        self.stream
            .expect(TokenKind::RParen, "')' after 'read' argument")?;
        self.stream
            .expect(TokenKind::Semicolon, "';' after 'read(...)'")?;
        Ok(())
    }

    /// `expr ;` — the value is discarded at the type level.
    fn parse_expr_stmt(&mut self) -> Result<(), CompileError> {
        self.parse_expr()?;
        self.finalize_rvalue();
        self.sem.pop_type();
        self.stream
            .expect(TokenKind::Semicolon, "';' after expression")?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Expressions

    /// `assign { , assign }` — the comma operator keeps only the last
    /// operand's type.
    fn parse_expr(&mut self) -> Result<(), CompileError> {
        let depth = self.sem.type_depth();

        self.parse_assign()?;
        while self.stream.match_kind(TokenKind::Comma) {
            self.finalize_rvalue();
            self.sem.pop_type();
            self.stream.advance()?;
            self.parse_assign()?;
        }

        debug_assert_eq!(
            self.sem.type_depth(),
            depth + 1,
            "an expression must push exactly one type"
        );
        Ok(())
    }

    /// `logicalOr [ = assign ]` — right-associative.
    fn parse_assign(&mut self) -> Result<(), CompileError> {
        self.parse_binary(0)?;

        if self.stream.match_kind(TokenKind::Assign) {
            let assign_pos = self.stream.current().pos;
            let target = self
                .pending_lvalue
                .take()
                .ok_or_else(|| self.error_at(assign_pos, CompileErrorKind::InvalidLValue))?;

            self.stream.advance()?;
            self.parse_assign()?;
            self.finalize_rvalue();

            self.sem
                .check_assignment()
                .map_err(|kind| self.error_at(assign_pos, kind))?;

            match target {
                LValue::Var { slot } => self.program.emit(Op::StoreVar, slot as i32, 0),
                LValue::Elem { base_slot } => {
                    self.program.emit(Op::StoreElem, base_slot as i32, 0)
                }
            };
        }
        Ok(())
    }

    /// One tier of left-associative binary operators; recursion moves
    /// to the next-higher tier.
    fn parse_binary(&mut self, tier: usize) -> Result<(), CompileError> {
        if tier == BINARY_TIERS.len() {
            return self.parse_unary();
        }

        self.parse_binary(tier + 1)?;
        loop {
            let current = self.stream.current().kind;
            let Some(&(kind, op)) = BINARY_TIERS[tier].iter().find(|(kind, _)| *kind == current)
            else {
                return Ok(());
            };

            let op_pos = self.stream.current().pos;
            // The left operand is complete; commit any deferred load
            // before the right side starts emitting.
            self.finalize_rvalue();
            self.stream.advance()?;
            self.parse_binary(tier + 1)?;
            self.finalize_rvalue();

            self.sem
                .check_binary_op(kind)
                .map_err(|err| self.error_at(op_pos, err))?;
            self.program.emit_op(op);
        }
    }

    /// `(- | ! | ~ | ++ | --) unary | primary`
    fn parse_unary(&mut self) -> Result<(), CompileError> {
        use TokenKind as T;

        let kind = self.stream.current().kind;
        if !matches!(kind, T::Minus | T::Bang | T::Tilde | T::PlusPlus | T::MinusMinus) {
            return self.parse_primary();
        }

        let op_pos = self.stream.current().pos;
        self.stream.advance()?;
        self.parse_unary()?;

        match kind {
            T::Minus | T::Bang | T::Tilde => {
                self.finalize_rvalue();
                self.sem
                    .check_unary_op(kind)
                    .map_err(|err| self.error_at(op_pos, err))?;
                let op = match kind {
                    T::Minus => Op::Neg,
                    T::Bang => Op::Not,
                    _ => Op::BNot,
                };
                self.program.emit_op(op);
            }
            T::PlusPlus | T::MinusMinus => {
                // Read-modify-write needs the target twice, which only
                // works for a simple variable.
                let slot = match self.pending_lvalue.take() {
                    Some(LValue::Var { slot }) => slot,
                    _ => return Err(self.error_at(op_pos, CompileErrorKind::InvalidLValue)),
                };
                self.sem
                    .check_unary_op(kind)
                    .map_err(|err| self.error_at(op_pos, err))?;

                self.program.emit(Op::LoadVar, slot as i32, 0);
                self.program.emit(Op::PushInt, 1, 0);
                self.program
                    .emit_op(if kind == T::PlusPlus { Op::Add } else { Op::Sub });
                self.program.emit(Op::StoreVar, slot as i32, 0);
                self.program.emit(Op::LoadVar, slot as i32, 0);
            }
            _ => unreachable!(),
        }
        Ok(())
    }

    /// `( expr ) | literal | call | lvalue`
    fn parse_primary(&mut self) -> Result<(), CompileError> {
        use Keyword as K;
        use TokenKind as T;

        let token = self.stream.current().clone();
        match token.kind {
            T::LParen => {
                self.stream.advance()?;
                self.parse_expr()?;
                self.stream.expect(T::RParen, "')' after expression")?;
                Ok(())
            }
            T::IntLiteral => {
                let value: i32 = token.lexeme.parse().map_err(|_| {
                    self.error_at(
                        token.pos,
                        CompileErrorKind::MalformedNumber(token.lexeme.clone()),
                    )
                })?;
                self.stream.advance()?;
                self.program.emit(Op::PushInt, value, 0);
                self.sem.push_type(Type::INT);
                Ok(())
            }
            T::FloatLiteral => {
                let value: f32 = token.lexeme.parse().map_err(|_| {
                    self.error_at(
                        token.pos,
                        CompileErrorKind::MalformedNumber(token.lexeme.clone()),
                    )
                })?;
                self.stream.advance()?;
                self.program.emit(Op::PushFloat, value.to_bits() as i32, 0);
                self.sem.push_type(Type::FLOAT);
                Ok(())
            }
            T::CharLiteral => {
                let c = token.lexeme.chars().next().unwrap_or('\0');
                self.stream.advance()?;
                self.program.emit(Op::PushChar, c as u8 as i32, 0);
                self.sem.push_type(Type::CHAR);
                Ok(())
            }
            T::StringLiteral => {
                let index = self.program.add_string(&token.lexeme);
                self.stream.advance()?;
                self.program.emit(Op::PushString, index as i32, 0);
                self.sem.push_type(Type::STR);
                Ok(())
            }
            T::Keyword(K::True) => {
                self.stream.advance()?;
                self.program.emit(Op::PushBool, 1, 0);
                self.sem.push_type(Type::BOOL);
                Ok(())
            }
            T::Keyword(K::False) => {
                self.stream.advance()?;
                self.program.emit(Op::PushBool, 0, 0);
                self.sem.push_type(Type::BOOL);
                Ok(())
            }
            T::Ident => {
                if self.stream.peek_next()?.kind == T::LParen {
                    self.parse_call()
                } else {
                    self.parse_lvalue()
                }
            }
            _ => Err(self.stream.unexpected("an expression")),
        }
    }

    /// `ident ( [assign {, assign}] )` — arguments are compiled left to
    /// right so they land on the runtime stack in declaration order.
    fn parse_call(&mut self) -> Result<(), CompileError> {
        let name = self.stream.expect(TokenKind::Ident, "function name")?;
        self.sem
            .begin_call(&name.lexeme)
            .map_err(|kind| self.error_at(name.pos, kind))?;

        self.stream.expect(TokenKind::LParen, "'('")?;
        if !self.stream.match_kind(TokenKind::RParen) {
            loop {
                self.parse_assign()?;
                self.finalize_rvalue();
                self.sem.add_call_arg();
                if !self.stream.eat(TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.stream.expect(TokenKind::RParen, "')' after arguments")?;

        let (registry, _return_type) = self
            .sem
            .end_call()
            .map_err(|kind| self.error_at(name.pos, kind))?;
        self.program.emit(Op::Call, registry as i32, 0);
        Ok(())
    }

    /// `ident [ '[' expr ']' ]` — only records the deferred lvalue and
    /// pushes its type; no load is emitted yet.
    fn parse_lvalue(&mut self) -> Result<(), CompileError> {
        let name = self.stream.expect(TokenKind::Ident, "variable name")?;
        let symbol = self
            .sem
            .lookup_variable(&name.lexeme)
            .map_err(|kind| self.error_at(name.pos, kind))?;
        let (slot, ty) = (symbol.slot, symbol.ty.clone());

        if self.stream.match_kind(TokenKind::LBracket) {
            if !ty.is_array {
                return Err(self.error_at(
                    name.pos,
                    CompileErrorKind::TypeMismatch(format!("'{}' is not an array", name.lexeme)),
                ));
            }
            self.stream.advance()?;

            let index_pos = self.stream.current().pos;
            let index_start = self.program.current_ip();
            self.parse_expr()?;
            self.finalize_rvalue();
            self.sem
                .check_array_index()
                .map_err(|kind| self.error_at(index_pos, kind))?;

            // A plain literal index is checked against the array bounds
            // right here at compile time.
            if self.program.current_ip() == index_start + 1 {
                let instr = self.program.instr(index_start);
                if instr.op == Op::PushInt
                    && (instr.arg1 < 0 || instr.arg1 >= ty.array_size)
                {
                    return Err(self.error_at(
                        index_pos,
                        CompileErrorKind::ArrayIndexOutOfRange {
                            index: instr.arg1,
                            size: ty.array_size,
                        },
                    ));
                }
            }

            self.stream
                .expect(TokenKind::RBracket, "']' after array index")?;

            self.pending_lvalue = Some(LValue::Elem { base_slot: slot });
            self.sem.push_type(ty.element_type().clone());
        } else {
            if ty.is_array {
                return Err(self.error_at(
                    name.pos,
                    CompileErrorKind::TypeMismatch(format!(
                        "array '{}' cannot be used as a value",
                        name.lexeme
                    )),
                ));
            }
            self.pending_lvalue = Some(LValue::Var { slot });
            self.sem.push_type(ty);
        }
        Ok(())
    }
}
