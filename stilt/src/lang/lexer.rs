//! Lexical analysis
use smol_str::SmolStr;

use crate::error::{CompileError, CompileErrorKind};

use super::tokens::{Keyword, KeywordTable, Pos, Token, TokenKind};

/// Sentinel for "no more characters".
const EOF_CHAR: char = '\0';

pub struct Lexer<'a> {
    chars: std::str::Chars<'a>,
    /// Character the lexer is currently looking at.
    current: char,
    /// One character of lookahead, needed for compound operators,
    /// comments and the dot in float literals.
    next: char,
    line: u32,
    column: u32,
    keywords: KeywordTable,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_keywords(source, KeywordTable::default())
    }

    pub fn with_keywords(source: &'a str, keywords: KeywordTable) -> Self {
        let mut chars = source.chars();
        let current = chars.next().unwrap_or(EOF_CHAR);
        let next = chars.next().unwrap_or(EOF_CHAR);
        Self {
            chars,
            current,
            next,
            line: 1,
            column: 1,
            keywords,
        }
    }

    /// Position of the character the lexer is looking at.
    fn pos(&self) -> Pos {
        Pos::new(self.line, self.column)
    }

    fn at_end(&self) -> bool {
        self.current == EOF_CHAR
    }

    /// Step one character forward.
    fn advance(&mut self) {
        if self.current == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.current = self.next;
        self.next = self.chars.next().unwrap_or(EOF_CHAR);
    }

    fn error(&self, pos: Pos, kind: CompileErrorKind) -> CompileError {
        CompileError::new(pos, kind)
    }

    /// Scan the source characters and construct the next token.
    ///
    /// Each call starts with the cursor at the first unconsumed character
    /// and leaves it just past the returned token's text. Once the source
    /// is exhausted an [`TokenKind::Eof`] token is returned on every call.
    pub fn next_token(&mut self) -> Result<Token, CompileError> {
        use TokenKind as T;

        self.skip_whitespace_and_comments()?;

        let pos = self.pos();

        if self.at_end() {
            return Ok(Token {
                kind: T::Eof,
                lexeme: SmolStr::default(),
                pos,
            });
        }

        match self.current {
            c if is_ident_start(c) => Ok(self.consume_ident(pos)),
            c if is_digit(c) => self.consume_number(pos),
            '\'' => self.consume_char_literal(pos),
            '"' => self.consume_string_literal(pos),
            _ => self.consume_operator(pos),
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), CompileError> {
        loop {
            while self.current.is_whitespace() {
                self.advance();
            }

            if self.current == '/' && self.next == '/' {
                while !self.at_end() && self.current != '\n' {
                    self.advance();
                }
                continue;
            }

            if self.current == '/' && self.next == '*' {
                let start = self.pos();
                self.advance();
                self.advance();
                while !(self.current == '*' && self.next == '/') {
                    if self.at_end() {
                        return Err(self.error(start, CompileErrorKind::UnterminatedComment));
                    }
                    self.advance();
                }
                self.advance();
                self.advance();
                continue;
            }

            return Ok(());
        }
    }

    fn consume_ident(&mut self, pos: Pos) -> Token {
        debug_assert!(is_ident_start(self.current));

        let mut word = String::new();
        while is_ident_cont(self.current) {
            word.push(self.current);
            self.advance();
        }

        let kind = match self.keywords.lookup(&word) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Ident,
        };

        Token {
            kind,
            lexeme: SmolStr::new(word),
            pos,
        }
    }

    fn consume_number(&mut self, pos: Pos) -> Result<Token, CompileError> {
        debug_assert!(is_digit(self.current));

        let mut text = String::new();
        let mut kind = TokenKind::IntLiteral;

        while is_digit(self.current) {
            text.push(self.current);
            self.advance();
        }

        // A dot makes this a float literal, but only when a digit follows,
        // so `a[i].` style punctuation is never swallowed.
        if self.current == '.' && is_digit(self.next) {
            kind = TokenKind::FloatLiteral;
            text.push('.');
            self.advance();
            while is_digit(self.current) {
                text.push(self.current);
                self.advance();
            }
        }

        // `12abc` is one malformed token, not a number and an identifier.
        if is_ident_start(self.current) {
            while is_ident_cont(self.current) {
                text.push(self.current);
                self.advance();
            }
            return Err(self.error(pos, CompileErrorKind::MalformedNumber(SmolStr::new(text))));
        }

        Ok(Token {
            kind,
            lexeme: SmolStr::new(text),
            pos,
        })
    }

    fn consume_char_literal(&mut self, pos: Pos) -> Result<Token, CompileError> {
        debug_assert_eq!(self.current, '\'');
        self.advance();

        if self.at_end() || self.current == '\'' || self.current == '\n' {
            return Err(self.error(pos, CompileErrorKind::MalformedChar));
        }

        let content = if self.current == '\\' {
            self.advance();
            let decoded = unescape(self.current);
            self.advance();
            decoded
        } else {
            let c = self.current;
            self.advance();
            c
        };

        if self.current != '\'' {
            return Err(self.error(pos, CompileErrorKind::MalformedChar));
        }
        self.advance();

        Ok(Token {
            kind: TokenKind::CharLiteral,
            lexeme: SmolStr::new(content.to_string()),
            pos,
        })
    }

    fn consume_string_literal(&mut self, pos: Pos) -> Result<Token, CompileError> {
        debug_assert_eq!(self.current, '"');
        self.advance();

        let mut content = String::new();
        loop {
            match self.current {
                '"' => break,
                '\n' | EOF_CHAR => {
                    return Err(self.error(pos, CompileErrorKind::UnterminatedString));
                }
                '\\' => {
                    self.advance();
                    content.push(unescape(self.current));
                    self.advance();
                }
                c => {
                    content.push(c);
                    self.advance();
                }
            }
        }
        self.advance();

        Ok(Token {
            kind: TokenKind::StringLiteral,
            lexeme: SmolStr::new(content),
            pos,
        })
    }

    fn consume_operator(&mut self, pos: Pos) -> Result<Token, CompileError> {
        use TokenKind as T;

        let two = [self.current, self.next];
        let kind = match two {
            ['=', '='] => Some(T::EqualEqual),
            ['!', '='] => Some(T::BangEqual),
            ['<', '='] => Some(T::LessEqual),
            ['>', '='] => Some(T::GreaterEqual),
            ['&', '&'] => Some(T::AmpAmp),
            ['|', '|'] => Some(T::PipePipe),
            ['+', '+'] => Some(T::PlusPlus),
            ['-', '-'] => Some(T::MinusMinus),
            ['<', '<'] => Some(T::Shl),
            ['>', '>'] => Some(T::Shr),
            _ => None,
        };

        if let Some(kind) = kind {
            let lexeme = SmolStr::new(two.iter().collect::<String>());
            self.advance();
            self.advance();
            return Ok(Token { kind, lexeme, pos });
        }

        let c = self.current;
        let kind = match c {
            '=' => T::Assign,
            '+' => T::Plus,
            '-' => T::Minus,
            '*' => T::Star,
            '/' => T::Slash,
            '%' => T::Percent,
            '&' => T::Amp,
            '|' => T::Pipe,
            '^' => T::Caret,
            '~' => T::Tilde,
            '!' => T::Bang,
            '<' => T::Less,
            '>' => T::Greater,
            '(' => T::LParen,
            ')' => T::RParen,
            '{' => T::LBrace,
            '}' => T::RBrace,
            '[' => T::LBracket,
            ']' => T::RBracket,
            ',' => T::Comma,
            ';' => T::Semicolon,
            _ => return Err(self.error(pos, CompileErrorKind::UnknownCharacter(c))),
        };
        self.advance();

        Ok(Token {
            kind,
            lexeme: SmolStr::new(c.to_string()),
            pos,
        })
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_cont(c: char) -> bool {
    is_ident_start(c) || is_digit(c)
}

impl<'a> IntoIterator for Lexer<'a> {
    type Item = Result<Token, CompileError>;
    type IntoIter = LexerIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        LexerIter {
            lexer: self,
            done: false,
        }
    }
}

/// Convenience iterator that wraps the lexer.
///
/// Yields tokens until the first `Eof` token inclusive, or until the
/// first lexical error.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct LexerIter<'a> {
    lexer: Lexer<'a>,
    done: bool,
}

impl<'a> Iterator for LexerIter<'a> {
    type Item = Result<Token, CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.lexer.next_token();
        match &result {
            Ok(token) if token.kind == TokenKind::Eof => self.done = true,
            Err(_) => self.done = true,
            _ => {}
        }
        Some(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .into_iter()
            .map(|result| result.expect("lex error").kind)
            .collect()
    }

    #[test]
    fn test_lex_operators() {
        use TokenKind as T;
        assert_eq!(
            kinds("== != <= >= && || ++ -- << >> = < >"),
            vec![
                T::EqualEqual,
                T::BangEqual,
                T::LessEqual,
                T::GreaterEqual,
                T::AmpAmp,
                T::PipePipe,
                T::PlusPlus,
                T::MinusMinus,
                T::Shl,
                T::Shr,
                T::Assign,
                T::Less,
                T::Greater,
                T::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_statement() {
        use TokenKind as T;
        assert_eq!(
            kinds("int x; x = 5;"),
            vec![
                T::Keyword(Keyword::Int),
                T::Ident,
                T::Semicolon,
                T::Ident,
                T::Assign,
                T::IntLiteral,
                T::Semicolon,
                T::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_comments() {
        use TokenKind as T;
        let source = "1 // line comment\n/* block\ncomment */ 2";
        assert_eq!(kinds(source), vec![T::IntLiteral, T::IntLiteral, T::Eof]);
    }

    #[test]
    fn test_lex_positions() {
        let mut lexer = Lexer::new("ab\n  cd");
        let first = lexer.next_token().unwrap();
        let second = lexer.next_token().unwrap();
        assert_eq!(first.pos, Pos::new(1, 1));
        assert_eq!(second.pos, Pos::new(2, 3));
    }

    #[test]
    fn test_lex_literals() {
        let mut lexer = Lexer::new("3.25 'a' '\\n' \"hi\\tthere\"");

        let float = lexer.next_token().unwrap();
        assert_eq!(float.kind, TokenKind::FloatLiteral);
        assert_eq!(float.lexeme, "3.25");

        let ch = lexer.next_token().unwrap();
        assert_eq!(ch.kind, TokenKind::CharLiteral);
        assert_eq!(ch.lexeme, "a");

        let newline = lexer.next_token().unwrap();
        assert_eq!(newline.kind, TokenKind::CharLiteral);
        assert_eq!(newline.lexeme, "\n");

        let string = lexer.next_token().unwrap();
        assert_eq!(string.kind, TokenKind::StringLiteral);
        assert_eq!(string.lexeme, "hi\tthere");
    }

    #[test]
    fn test_lex_malformed_number() {
        let mut lexer = Lexer::new("12abc");
        assert!(matches!(
            lexer.next_token().unwrap_err().kind,
            CompileErrorKind::MalformedNumber(_)
        ));
    }

    #[test]
    fn test_lex_unterminated_string() {
        let mut lexer = Lexer::new("\"oops");
        assert!(matches!(
            lexer.next_token().unwrap_err().kind,
            CompileErrorKind::UnterminatedString
        ));
    }

    #[test]
    fn test_lex_unknown_character() {
        let mut lexer = Lexer::new("@");
        assert!(matches!(
            lexer.next_token().unwrap_err().kind,
            CompileErrorKind::UnknownCharacter('@')
        ));
    }
}
