//! Tokens
use std::fmt;

use log::warn;
use smol_str::SmolStr;

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Original text of the token. For char and string literals this is
    /// the decoded content, without quotes.
    pub lexeme: SmolStr,
    pub pos: Pos,
}

/// Line and column of a token in the source text, both starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[rustfmt::skip]
pub enum TokenKind {
    // ------------------------------------------------------------------------
    // Literals
    IntLiteral,
    FloatLiteral,
    CharLiteral,
    StringLiteral,

    Ident,
    /// Identifier in the set of reserved words.
    Keyword(Keyword),

    // ------------------------------------------------------------------------
    // Operators
    Assign,       // =
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Percent,      // %
    Amp,          // &
    Pipe,         // |
    Caret,        // ^
    Tilde,        // ~
    Bang,         // !
    Less,         // <
    Greater,      // >
    LessEqual,    // <=
    GreaterEqual, // >=
    EqualEqual,   // ==
    BangEqual,    // !=
    AmpAmp,       // &&
    PipePipe,     // ||
    PlusPlus,     // ++
    MinusMinus,   // --
    Shl,          // <<
    Shr,          // >>

    // ------------------------------------------------------------------------
    // Punctuation
    LParen,       // (
    RParen,       // )
    LBrace,       // {
    RBrace,       // }
    LBracket,     // [
    RBracket,     // ]
    Comma,        // ,
    Semicolon,    // ;

    // ------------------------------------------------------------------------
    // Special
    /// Unsupported character that should be treated as an error.
    Unknown,
    /// End-of-source
    Eof,
}

impl fmt::Display for TokenKind {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TokenKind as T;
        match self {
            T::IntLiteral    => write!(f, "integer literal"),
            T::FloatLiteral  => write!(f, "float literal"),
            T::CharLiteral   => write!(f, "char literal"),
            T::StringLiteral => write!(f, "string literal"),
            T::Ident         => write!(f, "identifier"),
            T::Keyword(kw)   => write!(f, "'{}'", kw),
            T::Assign        => write!(f, "'='"),
            T::Plus          => write!(f, "'+'"),
            T::Minus         => write!(f, "'-'"),
            T::Star          => write!(f, "'*'"),
            T::Slash         => write!(f, "'/'"),
            T::Percent       => write!(f, "'%'"),
            T::Amp           => write!(f, "'&'"),
            T::Pipe          => write!(f, "'|'"),
            T::Caret         => write!(f, "'^'"),
            T::Tilde         => write!(f, "'~'"),
            T::Bang          => write!(f, "'!'"),
            T::Less          => write!(f, "'<'"),
            T::Greater       => write!(f, "'>'"),
            T::LessEqual     => write!(f, "'<='"),
            T::GreaterEqual  => write!(f, "'>='"),
            T::EqualEqual    => write!(f, "'=='"),
            T::BangEqual     => write!(f, "'!='"),
            T::AmpAmp        => write!(f, "'&&'"),
            T::PipePipe      => write!(f, "'||'"),
            T::PlusPlus      => write!(f, "'++'"),
            T::MinusMinus    => write!(f, "'--'"),
            T::Shl           => write!(f, "'<<'"),
            T::Shr           => write!(f, "'>>'"),
            T::LParen        => write!(f, "'('"),
            T::RParen        => write!(f, "')'"),
            T::LBrace        => write!(f, "'{{'"),
            T::RBrace        => write!(f, "'}}'"),
            T::LBracket      => write!(f, "'['"),
            T::RBracket      => write!(f, "']'"),
            T::Comma         => write!(f, "','"),
            T::Semicolon     => write!(f, "';'"),
            T::Unknown       => write!(f, "unknown token"),
            T::Eof           => write!(f, "end of file"),
        }
    }
}

/// Reserved keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[rustfmt::skip]
pub enum Keyword {
    // Types
    Int,
    Char,
    Bool,
    Float,
    Void,

    // Control flow
    If,
    Elif,
    Else,
    While,
    For,
    Return,
    Break,
    Continue,

    // Built-in statements
    Print,
    Read,

    // Literals
    True,
    False,

    // Top level
    Declare,
    Main,
}

impl Keyword {
    /// Every keyword, in canonical order.
    pub const ALL: &[Keyword] = &[
        Keyword::Int,
        Keyword::Char,
        Keyword::Bool,
        Keyword::Float,
        Keyword::Void,
        Keyword::If,
        Keyword::Elif,
        Keyword::Else,
        Keyword::While,
        Keyword::For,
        Keyword::Return,
        Keyword::Break,
        Keyword::Continue,
        Keyword::Print,
        Keyword::Read,
        Keyword::True,
        Keyword::False,
        Keyword::Declare,
        Keyword::Main,
    ];

    /// Canonical spelling of the keyword.
    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        use Keyword as K;
        match self {
            K::Int      => "int",
            K::Char     => "char",
            K::Bool     => "bool",
            K::Float    => "float",
            K::Void     => "void",
            K::If       => "if",
            K::Elif     => "elif",
            K::Else     => "else",
            K::While    => "while",
            K::For      => "for",
            K::Return   => "return",
            K::Break    => "break",
            K::Continue => "continue",
            K::Print    => "print",
            K::Read     => "read",
            K::True     => "true",
            K::False    => "false",
            K::Declare  => "declare",
            K::Main     => "main",
        }
    }

    pub fn parse(text: impl AsRef<str>) -> Option<Self> {
        Keyword::ALL
            .iter()
            .find(|kw| kw.as_str() == text.as_ref())
            .copied()
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mapping from identifier spellings to keywords.
///
/// The default table contains every canonical spelling. A table loaded
/// from a keyword file contains only the words listed there, so source
/// using an omitted keyword fails to parse as that keyword.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    words: HashMap<SmolStr, Keyword>,
}

impl KeywordTable {
    /// Build a table from a whitespace-separated word list.
    ///
    /// Words that are not canonical keyword names are skipped with a
    /// warning, the way the historical keyword files were treated.
    pub fn from_words<'a>(words: impl Iterator<Item = &'a str>) -> Self {
        let mut table = HashMap::new();
        for word in words {
            match Keyword::parse(word) {
                Some(keyword) => {
                    table.insert(SmolStr::new(word), keyword);
                }
                None => warn!("ignoring unknown keyword {word:?}"),
            }
        }
        Self { words: table }
    }

    pub fn lookup(&self, word: &str) -> Option<Keyword> {
        self.words.get(word).copied()
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        let words = Keyword::ALL
            .iter()
            .map(|kw| (SmolStr::new_static(kw.as_str()), *kw))
            .collect();
        Self { words }
    }
}
