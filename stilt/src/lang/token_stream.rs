//! Token stream with one token of lookahead.
use crate::error::{CompileError, CompileErrorKind};

use super::{
    lexer::Lexer,
    tokens::{Token, TokenKind},
};

/// Stream of tokens driving the parser.
///
/// Tokens are lazily lexed. The stream always holds the current token;
/// [`peek_next`](TokenStream::peek_next) provides the single token of
/// lookahead the grammar needs (distinguishing a call `f(` from a plain
/// identifier).
pub struct TokenStream<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peeked: Option<Token>,
}

impl<'a> TokenStream<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self, CompileError> {
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            peeked: None,
        })
    }

    /// The token the parser is currently looking at.
    #[inline]
    pub fn current(&self) -> &Token {
        &self.current
    }

    /// Advance to the next token.
    ///
    /// Advancing past end-of-source keeps returning the `Eof` token.
    pub fn advance(&mut self) -> Result<&Token, CompileError> {
        self.current = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        Ok(&self.current)
    }

    /// Look one token past the current one without advancing.
    pub fn peek_next(&mut self) -> Result<&Token, CompileError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token()?);
        }
        // Unwrap is fine: just stored.
        Ok(self.peeked.as_ref().unwrap())
    }

    /// Whether the current token has the given kind.
    #[inline]
    pub fn match_kind(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consume the current token when it matches, otherwise leave it.
    pub fn eat(&mut self, kind: TokenKind) -> Result<bool, CompileError> {
        if self.match_kind(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Return the current token and advance.
    ///
    /// # Errors
    ///
    /// Returns an `UnexpectedToken` error carrying `what` when the
    /// current token does not have the expected kind. The stream is not
    /// advanced in that case.
    pub fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, CompileError> {
        if self.current.kind != kind {
            return Err(self.unexpected(what));
        }
        let token = self.current.clone();
        self.advance()?;
        Ok(token)
    }

    /// Build a token-mismatch error at the current position.
    #[inline(never)]
    #[cold]
    pub fn unexpected(&self, expected: &str) -> CompileError {
        CompileError::new(
            self.current.pos,
            CompileErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: self.current.kind,
            },
        )
    }
}
