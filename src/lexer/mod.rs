use logos::Logos;

#[cfg(test)]
pub mod test;

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \n\r\t\f]+")] // Ignore this regex pattern between tokens
#[logos(skip r"#[^\n]*")] // Line comments
#[derive(Clone)]
pub enum Token {
    #[regex(r"true|false", |lex| {
        lex.slice().parse::<bool>().unwrap()
    })]
    Bool(bool),

    // fallible: a literal past i64::MAX becomes an error token instead
    // of a panic
    #[regex(r"0|[1-9][0-9]*", |lex| {
        lex.slice().parse::<i64>().ok()
    }, priority = 3)]
    Int(i64),

    #[regex(r#""([^"\\]*(\\.[^"\\]*)*)""#, |lex| {
        let s = lex.slice();
        s[1..s.len()-1]
            .replace("\\\"", "\"")
            .replace("\\\\", "\\")
        // Removes quotes and handles escape sequences
    })]
    String(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex|{
        lex.slice().to_string()
    })]
    Ident(String),

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Div,

    #[token("==")]
    Eq,

    #[token("!=")]
    NotEq,

    #[token("<")]
    Less,

    #[token(">")]
    Greater,

    #[token("<=")]
    LessEq,

    #[token(">=")]
    GreaterEq,

    #[token("and")]
    And,

    #[token("or")]
    Or,

    #[token("not")]
    Not,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token("=")]
    Assign,

    #[token(".")]
    Dot,

    #[token("module")]
    KeywordModule,

    #[token("def")]
    KeywordDef,

    #[token("for")]
    KeywordFor,

    #[token("in")]
    KeywordIn,

    #[token("range")]
    KeywordRange,

    #[token("if")]
    KeywordIf,

    #[token("else")]
    KeywordElse,

    #[token("assert")]
    KeywordAssert,

    #[token("from")]
    KeywordFrom,

    #[token("import")]
    KeywordImport,
}
