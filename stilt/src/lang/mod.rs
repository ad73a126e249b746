//! Language front end: lexing, parsing, semantic analysis and code
//! emission, all in a single pass.
pub mod lexer;
pub mod parser;
pub mod sem;
pub mod token_stream;
pub mod tokens;
pub mod types;

use crate::{bytecode::Program, error::CompileError};

/// Compile a source text into a runnable program.
pub fn compile(source: impl AsRef<str>) -> Result<Program, CompileError> {
    compile_with_keywords(source, tokens::KeywordTable::default())
}

/// Compile with a custom keyword table, e.g. one loaded from a keyword
/// file.
pub fn compile_with_keywords(
    source: impl AsRef<str>,
    keywords: tokens::KeywordTable,
) -> Result<Program, CompileError> {
    let lexer = lexer::Lexer::with_keywords(source.as_ref(), keywords);
    let stream = token_stream::TokenStream::new(lexer)?;
    parser::Parser::new(stream).parse_program()
}

pub use self::{
    lexer::Lexer,
    parser::Parser,
    sem::Analyzer,
    token_stream::TokenStream,
    tokens::{Keyword, KeywordTable, Pos, Token, TokenKind},
    types::{BaseKind, Type},
};
