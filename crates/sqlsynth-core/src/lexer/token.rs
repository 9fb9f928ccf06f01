//! Token types produced by the clause lexer.

use super::Span;

/// Keywords the clause scanner cares about.
///
/// Every other word lexes as [`TokenKind::Identifier`]; the scanner only
/// needs to recognise clause boundaries, not the full SQL grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    // Query structure
    Select,
    From,
    Where,
    Group,
    Order,
    By,
    Having,
    With,

    // Select list modifiers
    Distinct,
    Unique,
    All,
    Top,

    // Paging
    Limit,
    Offset,
    Fetch,
    First,
    Next,
    Row,
    Rows,
    Only,

    // Set operations
    Union,
    Intersect,
    Except,
    Minus,

    // Trailing suffixes
    For,
    Update,
    Share,
    Read,
    No,
    Key,
    Lock,
    In,
    Mode,
    Option,
    Xml,
    Json,
    Browse,
}

impl Keyword {
    /// Attempts to parse a keyword from a word (case-insensitive).
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SELECT" => Some(Self::Select),
            "FROM" => Some(Self::From),
            "WHERE" => Some(Self::Where),
            "GROUP" => Some(Self::Group),
            "ORDER" => Some(Self::Order),
            "BY" => Some(Self::By),
            "HAVING" => Some(Self::Having),
            "WITH" => Some(Self::With),
            "DISTINCT" => Some(Self::Distinct),
            "UNIQUE" => Some(Self::Unique),
            "ALL" => Some(Self::All),
            "TOP" => Some(Self::Top),
            "LIMIT" => Some(Self::Limit),
            "OFFSET" => Some(Self::Offset),
            "FETCH" => Some(Self::Fetch),
            "FIRST" => Some(Self::First),
            "NEXT" => Some(Self::Next),
            "ROW" => Some(Self::Row),
            "ROWS" => Some(Self::Rows),
            "ONLY" => Some(Self::Only),
            "UNION" => Some(Self::Union),
            "INTERSECT" => Some(Self::Intersect),
            "EXCEPT" => Some(Self::Except),
            "MINUS" => Some(Self::Minus),
            "FOR" => Some(Self::For),
            "UPDATE" => Some(Self::Update),
            "SHARE" => Some(Self::Share),
            "READ" => Some(Self::Read),
            "NO" => Some(Self::No),
            "KEY" => Some(Self::Key),
            "LOCK" => Some(Self::Lock),
            "IN" => Some(Self::In),
            "MODE" => Some(Self::Mode),
            "OPTION" => Some(Self::Option),
            "XML" => Some(Self::Xml),
            "JSON" => Some(Self::Json),
            "BROWSE" => Some(Self::Browse),
            _ => None,
        }
    }
}

/// The kind of a token.
///
/// Literal payloads are not materialised; the text is recovered from the
/// token span when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A recognised keyword.
    Keyword(Keyword),
    /// Any other bare word.
    Identifier,
    /// A `"quoted"`, `` `quoted` `` or `[bracketed]` identifier.
    QuotedIdentifier,
    /// A `'string'` or `$tag$dollar quoted$tag$` literal.
    String,
    /// A numeric literal.
    Number,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// Any other punctuation or operator.
    Symbol,
    /// A string or quoted identifier missing its closing delimiter.
    Unterminated,
    /// End of input.
    Eof,
}

/// A token with its kind and location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// The token kind.
    pub kind: TokenKind,
    /// The source location.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is the end-of-input token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the keyword if this token is one.
    #[must_use]
    pub const fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    /// Returns true if this token is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.keyword() == Some(keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_case_insensitive() {
        assert_eq!(Keyword::from_str("select"), Some(Keyword::Select));
        assert_eq!(Keyword::from_str("OrDeR"), Some(Keyword::Order));
        assert_eq!(Keyword::from_str("users"), None);
    }

    #[test]
    fn test_token_keyword_accessors() {
        let token = Token::new(TokenKind::Keyword(Keyword::From), Span::new(0, 4));
        assert!(token.is_keyword(Keyword::From));
        assert!(!token.is_keyword(Keyword::Select));
        assert!(!token.is_eof());
        assert_eq!(Token::new(TokenKind::Comma, Span::new(0, 1)).keyword(), None);
    }
}
