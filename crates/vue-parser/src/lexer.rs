//! Tag-interior lexer using logos.
//!
//! Only the inside of start tags is tokenized: attribute names, `=`,
//! quoted and unquoted values, and the tag terminators. Text content and
//! raw block bodies are read by hand since they have no token structure.

use logos::Logos;
use source_map::Span;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The absolute span of the token in the component source.
    pub span: Span,
}

/// Token kinds found between a tag name and the end of its start tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Default)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    /// `>`
    #[token(">", priority = 10)]
    RAngle,

    /// `/>`
    #[token("/>", priority = 10)]
    SlashRAngle,

    /// `=`
    #[token("=", priority = 10)]
    Eq,

    /// `"..."`
    #[regex(r#""[^"]*""#, priority = 6)]
    DoubleQuoted,

    /// `'...'`
    #[regex(r"'[^']*'", priority = 6)]
    SingleQuoted,

    /// A quote that never closes.
    #[regex(r#""[^"]*"#, priority = 5)]
    #[regex(r"'[^']*", priority = 5)]
    Unterminated,

    /// An attribute name or unquoted value (`class`, `:foo`, `@click.stop`, `#default`).
    #[regex(r#"[^\s"'<>/=]+"#, priority = 4)]
    Name,

    /// A stray `/` not followed by `>`.
    #[token("/", priority = 9)]
    Slash,

    /// A `<` inside a start tag, usually a missing `>`.
    #[token("<", priority = 10)]
    LAngle,

    /// End of input.
    Eof,

    /// Invalid/unknown token
    #[default]
    Error,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::RAngle => "'>'",
            TokenKind::SlashRAngle => "'/>'",
            TokenKind::Eq => "'='",
            TokenKind::DoubleQuoted => "quoted value",
            TokenKind::SingleQuoted => "quoted value",
            TokenKind::Unterminated => "unterminated value",
            TokenKind::Name => "name",
            TokenKind::Slash => "'/'",
            TokenKind::LAngle => "'<'",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid token",
        }
    }

    /// Whether the token ends a start tag.
    pub fn closes_tag(&self) -> bool {
        matches!(self, TokenKind::RAngle | TokenKind::SlashRAngle)
    }
}

/// A lexer over the tail of a component source, starting at `offset`.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    base: u32,
    len: u32,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer that starts reading `source` at byte `offset`.
    pub fn new(source: &'src str, offset: usize) -> Self {
        let tail = source.get(offset..).unwrap_or_default();
        Self {
            inner: TokenKind::lexer(tail),
            base: offset as u32,
            len: source.len() as u32,
            finished: false,
        }
    }

    /// Returns the text of the current token.
    pub fn slice(&self) -> &'src str {
        self.inner.slice()
    }

    fn absolute(&self, range: std::ops::Range<usize>) -> Span {
        Span::new(self.base + range.start as u32, self.base + range.end as u32)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.inner.next() {
            Some(result) => {
                let kind = result.unwrap_or(TokenKind::Error);
                Some(Token {
                    kind,
                    span: self.absolute(self.inner.span()),
                })
            }
            None => {
                self.finished = true;
                Some(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(self.len, self.len),
                })
            }
        }
    }
}
