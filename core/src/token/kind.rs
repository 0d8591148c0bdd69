use once_cell::sync::Lazy;

use crate::util::fast_map::{FastHashMap, fast_hash_map_with_capacity};

/// Coarse classification of a token, used by the parser for "any literal"/"any
/// name" checks and by the context map for category-keyed rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum TokenCategory {
    #[default]
    None,
    Identifier,
    Keyword,
    Operator,
    Delimiter,
    Grouping,
    Comment,
    NumericLiteral,
    StringLiteral,
    CharacterLiteral,
    IncompleteMultiLineStringLiteral,
    WhiteSpace,
    EndOfStream,
    Error,
}

impl TokenCategory {
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenCategory::NumericLiteral
                | TokenCategory::StringLiteral
                | TokenCategory::CharacterLiteral
                | TokenCategory::IncompleteMultiLineStringLiteral
        )
    }

    pub fn is_string_like(self) -> bool {
        matches!(
            self,
            TokenCategory::StringLiteral
                | TokenCategory::CharacterLiteral
                | TokenCategory::IncompleteMultiLineStringLiteral
        )
    }

    /// Name used by the context map (`@identifier`, `@numeric`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let category = match name.to_ascii_lowercase().as_str() {
            "identifier" => TokenCategory::Identifier,
            "keyword" => TokenCategory::Keyword,
            "operator" => TokenCategory::Operator,
            "delimiter" => TokenCategory::Delimiter,
            "grouping" => TokenCategory::Grouping,
            "comment" => TokenCategory::Comment,
            "numeric" | "number" => TokenCategory::NumericLiteral,
            "string" => TokenCategory::StringLiteral,
            "char" | "character" => TokenCategory::CharacterLiteral,
            "incomplete_string" => TokenCategory::IncompleteMultiLineStringLiteral,
            "whitespace" => TokenCategory::WhiteSpace,
            "eof" => TokenCategory::EndOfStream,
            "error" => TokenCategory::Error,
            _ => return None,
        };
        Some(category)
    }
}

macro_rules! token_kinds {
    ($($kw:ident => $text:literal),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum TokenKind {
            EndOfFile,
            NewLine,
            Comment,
            Invalid,
            Ident,
            NumberLiteral,
            StringLiteral,
            Add,              // +
            Subtract,         // -
            Multiply,         // *
            Divide,           // /
            Power,            // **
            LessThan,         // <
            GreaterThan,      // >
            Equals,           // =
            Exclamation,      // !
            SingleBar,        // |
            Comma,            // ,
            Dot,              // .
            Colon,            // :
            Semicolon,        // ;
            QuestionMark,     // ?
            LeftParenthesis,  // (
            RightParenthesis, // )
            LeftBracket,      // [
            RightBracket,     // ]
            $($kw,)*
        }

        const KEYWORDS: &[(TokenKind, &str)] = &[$((TokenKind::$kw, $text),)*];

        impl TokenKind {
            /// Canonical source text of the kind (lowercase for keywords).
            pub fn text(self) -> &'static str {
                match self {
                    TokenKind::EndOfFile => "<eof>",
                    TokenKind::NewLine => "<newline>",
                    TokenKind::Comment => "<comment>",
                    TokenKind::Invalid => "<invalid>",
                    TokenKind::Ident => "<identifier>",
                    TokenKind::NumberLiteral => "<number>",
                    TokenKind::StringLiteral => "<string>",
                    TokenKind::Add => "+",
                    TokenKind::Subtract => "-",
                    TokenKind::Multiply => "*",
                    TokenKind::Divide => "/",
                    TokenKind::Power => "**",
                    TokenKind::LessThan => "<",
                    TokenKind::GreaterThan => ">",
                    TokenKind::Equals => "=",
                    TokenKind::Exclamation => "!",
                    TokenKind::SingleBar => "|",
                    TokenKind::Comma => ",",
                    TokenKind::Dot => ".",
                    TokenKind::Colon => ":",
                    TokenKind::Semicolon => ";",
                    TokenKind::QuestionMark => "?",
                    TokenKind::LeftParenthesis => "(",
                    TokenKind::RightParenthesis => ")",
                    TokenKind::LeftBracket => "[",
                    TokenKind::RightBracket => "]",
                    $(TokenKind::$kw => $text,)*
                }
            }

            pub fn is_keyword(self) -> bool {
                match self {
                    $(TokenKind::$kw => true,)*
                    _ => false,
                }
            }
        }
    };
}

token_kinds! {
    Absolute => "absolute",
    Accept => "accept",
    Action => "action",
    After => "after",
    All => "all",
    And => "and",
    Any => "any",
    Append => "append",
    Array => "array",
    As => "as",
    Ascii => "ascii",
    At => "at",
    Attribute => "attribute",
    Attributes => "attributes",
    Auto => "auto",
    Before => "before",
    Between => "between",
    Bigint => "bigint",
    Black => "black",
    Blink => "blink",
    Blue => "blue",
    Bold => "bold",
    Boolean => "boolean",
    By => "by",
    Byte => "byte",
    Call => "call",
    Cancel => "cancel",
    Case => "case",
    Catch => "catch",
    Change => "change",
    Char => "char",
    Character => "character",
    Clipped => "clipped",
    Close => "close",
    Column => "column",
    Constant => "constant",
    Construct => "construct",
    Continue => "continue",
    Count => "count",
    Current => "current",
    Cursor => "cursor",
    Cyan => "cyan",
    Database => "database",
    Date => "date",
    Datetime => "datetime",
    Day => "day",
    Dec => "dec",
    Decimal => "decimal",
    Declare => "declare",
    Defaults => "defaults",
    Define => "define",
    Delete => "delete",
    Dialog => "dialog",
    Dim => "dim",
    Dimension => "dimension",
    Display => "display",
    Dynamic => "dynamic",
    Else => "else",
    End => "end",
    Error => "error",
    Execute => "execute",
    Exit => "exit",
    Fetch => "fetch",
    Fgl => "fgl",
    Field => "field",
    First => "first",
    Float => "float",
    For => "for",
    Foreach => "foreach",
    Form => "form",
    Found => "found",
    Fraction => "fraction",
    Free => "free",
    From => "from",
    Function => "function",
    Globals => "globals",
    Green => "green",
    Help => "help",
    Hold => "hold",
    Hour => "hour",
    Idle => "idle",
    If => "if",
    Immediate => "immediate",
    Import => "import",
    In => "in",
    Infield => "infield",
    Initialize => "initialize",
    Inout => "inout",
    Input => "input",
    Insert => "insert",
    InstanceOf => "instanceof",
    Int => "int",
    Integer => "integer",
    Interval => "interval",
    Into => "into",
    Invisible => "invisible",
    Is => "is",
    Keep => "keep",
    Key => "key",
    Last => "last",
    Let => "let",
    Like => "like",
    Magenta => "magenta",
    Main => "main",
    Matches => "matches",
    MaxCount => "maxcount",
    Menu => "menu",
    Message => "message",
    Minute => "minute",
    Mod => "mod",
    Money => "money",
    Month => "month",
    Name => "name",
    Next => "next",
    Normal => "normal",
    Not => "not",
    Null => "null",
    Numeric => "numeric",
    Of => "of",
    On => "on",
    Open => "open",
    Or => "or",
    Order => "order",
    Otherwise => "otherwise",
    Out => "out",
    Prepare => "prepare",
    Previous => "previous",
    Private => "private",
    Program => "program",
    Public => "public",
    Raise => "raise",
    Real => "real",
    Record => "record",
    Red => "red",
    Relative => "relative",
    Reoptimization => "reoptimization",
    Report => "report",
    Return => "return",
    Returning => "returning",
    Reverse => "reverse",
    Row => "row",
    Schema => "schema",
    Scroll => "scroll",
    Second => "second",
    Select => "select",
    Set => "set",
    Sleep => "sleep",
    Smallfloat => "smallfloat",
    Smallint => "smallint",
    Spaces => "spaces",
    Sql => "sql",
    SqlError => "sqlerror",
    Step => "step",
    Stop => "stop",
    String => "string",
    Text => "text",
    Then => "then",
    Through => "through",
    Thru => "thru",
    Tinyint => "tinyint",
    To => "to",
    Try => "try",
    Type => "type",
    Unbuffered => "unbuffered",
    Underline => "underline",
    Units => "units",
    Update => "update",
    Using => "using",
    Values => "values",
    Varchar => "varchar",
    Warning => "warning",
    When => "when",
    Whenever => "whenever",
    Where => "where",
    While => "while",
    White => "white",
    With => "with",
    Without => "without",
    Year => "year",
    Yellow => "yellow",
}

static KEYWORD_TABLE: Lazy<FastHashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut map = fast_hash_map_with_capacity(KEYWORDS.len());
    for (kind, text) in KEYWORDS {
        map.insert(*text, *kind);
    }
    map
});

const SYMBOLS: &[TokenKind] = &[
    TokenKind::Add,
    TokenKind::Subtract,
    TokenKind::Multiply,
    TokenKind::Divide,
    TokenKind::Power,
    TokenKind::LessThan,
    TokenKind::GreaterThan,
    TokenKind::Equals,
    TokenKind::Exclamation,
    TokenKind::SingleBar,
    TokenKind::Comma,
    TokenKind::Dot,
    TokenKind::Colon,
    TokenKind::Semicolon,
    TokenKind::QuestionMark,
    TokenKind::LeftParenthesis,
    TokenKind::RightParenthesis,
    TokenKind::LeftBracket,
    TokenKind::RightBracket,
];

/// Keywords that start a statement. Expression parsing never claims one of
/// these as a name, and the context engine treats them as the lookback
/// boundary.
pub const STATEMENT_KEYWORDS: &[TokenKind] = &[
    TokenKind::Call,
    TokenKind::Case,
    TokenKind::Close,
    TokenKind::Constant,
    TokenKind::Construct,
    TokenKind::Continue,
    TokenKind::Declare,
    TokenKind::Define,
    TokenKind::Delete,
    TokenKind::Dialog,
    TokenKind::Display,
    TokenKind::End,
    TokenKind::Error,
    TokenKind::Execute,
    TokenKind::Exit,
    TokenKind::Fetch,
    TokenKind::For,
    TokenKind::Foreach,
    TokenKind::Free,
    TokenKind::Function,
    TokenKind::Globals,
    TokenKind::If,
    TokenKind::Import,
    TokenKind::Initialize,
    TokenKind::Input,
    TokenKind::Insert,
    TokenKind::Let,
    TokenKind::Main,
    TokenKind::Menu,
    TokenKind::Message,
    TokenKind::Open,
    TokenKind::Prepare,
    TokenKind::Private,
    TokenKind::Public,
    TokenKind::Return,
    TokenKind::Select,
    TokenKind::Sleep,
    TokenKind::Sql,
    TokenKind::Try,
    TokenKind::Type,
    TokenKind::Update,
    TokenKind::Whenever,
    TokenKind::While,
];

impl TokenKind {
    /// Case-insensitive keyword lookup.
    pub fn from_keyword(word: &str) -> Option<TokenKind> {
        if let Some(kind) = KEYWORD_TABLE.get(word) {
            return Some(*kind);
        }
        KEYWORD_TABLE.get(word.to_ascii_lowercase().as_str()).copied()
    }

    /// Keyword or symbol lookup by source text.
    pub fn from_text(text: &str) -> Option<TokenKind> {
        SYMBOLS
            .iter()
            .copied()
            .find(|kind| kind.text() == text)
            .or_else(|| TokenKind::from_keyword(text))
    }

    /// Single-character symbolic operators, the range the expression loop
    /// accepts between terms.
    pub fn is_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Add
                | TokenKind::Subtract
                | TokenKind::Multiply
                | TokenKind::Divide
                | TokenKind::Power
                | TokenKind::LessThan
                | TokenKind::GreaterThan
                | TokenKind::Equals
                | TokenKind::Exclamation
                | TokenKind::SingleBar
        )
    }

    pub fn is_statement_keyword(self) -> bool {
        STATEMENT_KEYWORDS.contains(&self)
    }

    pub fn is_datetime_qualifier(self) -> bool {
        matches!(
            self,
            TokenKind::Year
                | TokenKind::Month
                | TokenKind::Day
                | TokenKind::Hour
                | TokenKind::Minute
                | TokenKind::Second
                | TokenKind::Fraction
        )
    }

    /// Category implied by a kind when it is not determined by the lexeme.
    pub fn category(self) -> TokenCategory {
        match self {
            TokenKind::EndOfFile => TokenCategory::EndOfStream,
            TokenKind::NewLine => TokenCategory::WhiteSpace,
            TokenKind::Comment => TokenCategory::Comment,
            TokenKind::Invalid => TokenCategory::Error,
            TokenKind::Ident => TokenCategory::Identifier,
            TokenKind::NumberLiteral => TokenCategory::NumericLiteral,
            TokenKind::StringLiteral => TokenCategory::StringLiteral,
            TokenKind::Comma | TokenKind::Dot | TokenKind::Colon | TokenKind::Semicolon | TokenKind::QuestionMark => {
                TokenCategory::Delimiter
            }
            TokenKind::LeftParenthesis
            | TokenKind::RightParenthesis
            | TokenKind::LeftBracket
            | TokenKind::RightBracket => TokenCategory::Grouping,
            kind if kind.is_operator() => TokenCategory::Operator,
            _ => TokenCategory::Keyword,
        }
    }

    pub fn keywords() -> impl Iterator<Item = TokenKind> {
        KEYWORDS.iter().map(|(kind, _)| *kind)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

impl TryFrom<String> for TokenKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        TokenKind::from_text(&value).ok_or_else(|| format!("unknown token `{}`", value))
    }
}
