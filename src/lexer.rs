use core::fmt;

use logos::{FilterResult, Lexer, Logos, Skip};
use tracing::warn;

use crate::error::SyntaxError;


#[derive(Debug, Default)]
pub struct LexerExtras {
    pub line: usize,
}

fn newline<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Skip {
    lex.extras.line += 1;
    Skip
}

// Runs to the first `*/`. An unterminated comment eats the rest of the input.
fn block_comment<'a>(lex: &mut Lexer<'a, Token<'a>>) -> FilterResult<(), ()> {
    let Some(end) = lex.remainder().find("*/") else {
        lex.bump(lex.remainder().len());
        return FilterResult::Error(());
    };

    let newlines = lex.remainder()[..end].matches('\n').count();
    lex.extras.line += newlines;
    lex.bump(end + 2);
    FilterResult::Skip
}

fn text<'a>(lex: &mut Lexer<'a, Token<'a>>) -> &'a str {
    let slice = lex.slice();
    &slice[1..slice.len() - 1]
}

#[derive(Debug, Clone, PartialEq, Logos)]
#[logos(extras = LexerExtras)]
#[logos(skip r"[ \t\r\f]+")]
pub enum Token<'a> {
    #[regex(r"\n", newline)]
    Newline,

    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    #[token("val")]
    Val,
    #[token("var")]
    Var,
    #[token("fun")]
    Fun,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("step")]
    Step,
    #[token("downTo")]
    DownTo,
    #[token("println")]
    Println,
    #[token("readLine")]
    ReadLine,

    #[token("Int")]
    IntType,
    #[token("String")]
    StringType,
    #[token("Boolean")]
    BooleanType,

    #[token("true", |_| true)]
    #[token("false", |_| false)]
    Boolean(bool),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    #[regex(r#""[^"\n]*""#, text)]
    Text(&'a str),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice())]
    Identifier(&'a str),

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Times,
    #[token("/")]
    Divide,
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("!")]
    Not,
    #[token("==")]
    Equals,
    #[token("!=")]
    NotEquals,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEquals,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEquals,
    #[token("=")]
    Assign,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("..")]
    Range,
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Boolean(value) => return write!(f, "{}", value),
            Self::Integer(value) => return write!(f, "{}", value),
            Self::Text(value) => return write!(f, "\"{}\"", value),
            Self::Identifier(name) => name,
            Self::Newline => "\\n",
            Self::LineComment | Self::BlockComment => "comment",
            Self::Val => "val",
            Self::Var => "var",
            Self::Fun => "fun",
            Self::Return => "return",
            Self::If => "if",
            Self::Else => "else",
            Self::While => "while",
            Self::For => "for",
            Self::In => "in",
            Self::Step => "step",
            Self::DownTo => "downTo",
            Self::Println => "println",
            Self::ReadLine => "readLine",
            Self::IntType => "Int",
            Self::StringType => "String",
            Self::BooleanType => "Boolean",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Times => "*",
            Self::Divide => "/",
            Self::And => "&&",
            Self::Or => "||",
            Self::Not => "!",
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::Less => "<",
            Self::LessEquals => "<=",
            Self::Greater => ">",
            Self::GreaterEquals => ">=",
            Self::Assign => "=",
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::LeftBrace => "{",
            Self::RightBrace => "}",
            Self::Comma => ",",
            Self::Colon => ":",
            Self::Semicolon => ";",
            Self::Range => "..",
        };
        write!(f, "{}", symbol)
    }
}

/// A token together with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<'a> {
    pub token: Token<'a>,
    pub line: usize,
}

/// Scans `source` into tokens. Characters that match no rule are reported and
/// skipped; scanning always runs to the end of the input.
pub fn tokenize<'a>(source: &'a str) -> (Vec<Spanned<'a>>, Vec<SyntaxError>) {
    let mut tokens = vec![];
    let mut errors = vec![];
    let mut tokenizer = Token::lexer_with_extras(source, LexerExtras { line: 1 });

    while let Some(result) = tokenizer.next() {
        let line = tokenizer.extras.line;
        match result {
            Ok(token) => tokens.push(Spanned { token, line }),
            Err(_) => {
                let found = tokenizer.slice();
                let error = if found.starts_with("/*") {
                    SyntaxError::UnterminatedComment { line }
                } else {
                    SyntaxError::IllegalCharacter { found: found.to_owned(), line }
                };
                warn!("{}", error);
                errors.push(error);
            }
        }
    }

    (tokens, errors)
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    fn kinds(source: &str) -> Vec<Token<'_>> {
        tokenize(source).0.into_iter().map(|spanned| spanned.token).collect_vec()
    }

    #[test]
    fn keywords_are_retyped_and_booleans_folded() {
        assert_eq!(kinds("val value = true"), vec![
            Token::Val,
            Token::Identifier("value"),
            Token::Assign,
            Token::Boolean(true),
        ]);
        assert_eq!(kinds("for (i in 3 downTo 1 step 2)"), vec![
            Token::For, Token::LeftParen, Token::Identifier("i"), Token::In,
            Token::Integer(3), Token::DownTo, Token::Integer(1), Token::Step,
            Token::Integer(2), Token::RightParen,
        ]);
    }

    #[test]
    fn range_does_not_swallow_integers() {
        assert_eq!(kinds("1..10"), vec![Token::Integer(1), Token::Range, Token::Integer(10)]);
    }

    #[test]
    fn comments_are_dropped_and_lines_tracked() {
        let (tokens, errors) = tokenize("val a = 1 // one\n/* two\nthree */ var b = \"x\"\n\nprintln(b)");
        assert!(errors.is_empty());

        let lines = tokens.iter().map(|spanned| (spanned.token.to_string(), spanned.line)).collect_vec();
        assert_eq!(lines[0], ("val".to_owned(), 1));
        assert_eq!(lines[4], ("var".to_owned(), 3));
        assert_eq!(lines[7], ("\"x\"".to_owned(), 3));
        assert_eq!(lines[8], ("println".to_owned(), 5));
    }

    #[test]
    fn block_comment_forms() {
        assert_eq!(tokenize("/* two */ val a = 1"), tokenize("val a = 1"));
        assert_eq!(kinds("/** x **/ val"), vec![Token::Val]);
        assert_eq!(kinds("1 /*/ still comment */ / 2"), vec![Token::Integer(1), Token::Divide, Token::Integer(2)]);

        let (tokens, errors) = tokenize("/* two\nthree\n*/ val");
        assert!(errors.is_empty());
        assert_eq!(tokens, vec![Spanned { token: Token::Val, line: 3 }]);
    }

    #[test]
    fn unterminated_block_comment_is_reported() {
        let (tokens, errors) = tokenize("val a = 1\n/* never\nclosed");
        assert_eq!(tokens.len(), 4);
        assert_eq!(errors, vec![SyntaxError::UnterminatedComment { line: 2 }]);
    }

    #[test]
    fn illegal_characters_are_reported_and_skipped() {
        let (tokens, errors) = tokenize("val a = 1 $\nval b = 2");
        assert_eq!(errors, vec![SyntaxError::IllegalCharacter { found: "$".to_owned(), line: 1 }]);
        assert_eq!(tokens.len(), 8);
        assert_eq!(tokens[7].line, 2);
    }
}
