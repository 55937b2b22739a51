pub mod expression;
pub mod statement;

#[cfg(test)]
pub mod test;

use crate::ast::ASTNode;
use crate::diagnostics::{DiagCode, Diagnostic};
use crate::lexer::Token;

use logos::SpannedIter;

use std::iter::Peekable;
use std::ops::Range;

type TokenIter<'a> = Peekable<SpannedIter<'a, Token>>;

pub struct Parser<'a> {
    tokens: TokenIter<'a>,
    file: String,
    /// Span of the most recently seen token, for end-of-file reports.
    last_span: Range<usize>,
    pub errors: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: TokenIter<'a>, file: String) -> Self {
        Parser {
            tokens,
            file,
            last_span: 0..0,
            errors: vec![],
        }
    }

    pub fn parse_program(&mut self) -> Vec<(ASTNode, Range<usize>)> {
        let mut tree = vec![];
        while let Some((token, span)) = self.tokens.peek() {
            let span = span.clone();
            self.last_span = span.clone();
            let Ok(token) = token else {
                self.error(
                    DiagCode::SyntaxError,
                    span.clone(),
                    "unrecognized token".to_string(),
                );
                self.tokens.next();
                continue;
            };
            match token {
                Token::KeywordModule => {
                    if let Some(node) = self.parse_module() {
                        tree.push(node);
                    }
                }
                Token::KeywordDef
                | Token::KeywordFor
                | Token::KeywordIf
                | Token::KeywordAssert
                | Token::KeywordFrom
                | Token::Ident(_) => {
                    let (stmt, span) = self.parse_statement();
                    tree.push((ASTNode::Stmt((stmt, span.clone())), span));
                }
                Token::KeywordElse => {
                    self.error(
                        DiagCode::MisplacedControlFlow,
                        span,
                        "'else' without a preceding 'if' block".to_string(),
                    );
                    self.tokens.next();
                    self.synchronize();
                }
                Token::KeywordIn | Token::KeywordRange | Token::KeywordImport => {
                    let keyword = keyword_text(token);
                    self.error(
                        DiagCode::MisplacedControlFlow,
                        span,
                        format!("'{}' is only valid inside its owning statement", keyword),
                    );
                    self.tokens.next();
                    self.synchronize();
                }
                _ => {
                    let message =
                        format!("expected a statement or module definition, found {:?}", token);
                    self.error(DiagCode::UnknownKeyword, span, message);
                    self.tokens.next();
                    self.synchronize();
                }
            }
        }
        tree
    }

    pub(crate) fn error(&mut self, code: DiagCode, span: Range<usize>, message: String) {
        self.errors
            .push(Diagnostic::error(code, self.file.clone(), span, message));
    }

    pub(crate) fn file(&self) -> &str {
        &self.file
    }

    pub(crate) fn peek_token(&mut self) -> Option<(&Token, Range<usize>)> {
        loop {
            match self.tokens.peek() {
                Some((Err(_), span)) => {
                    let span = span.clone();
                    self.error(
                        DiagCode::SyntaxError,
                        span,
                        "unrecognized token".to_string(),
                    );
                    self.tokens.next();
                }
                _ => break,
            }
        }
        match self.tokens.peek() {
            Some((Ok(token), span)) => {
                self.last_span = span.clone();
                Some((token, span.clone()))
            }
            _ => None,
        }
    }

    pub(crate) fn next_token(&mut self) -> Option<(Token, Range<usize>)> {
        self.peek_token()?;
        match self.tokens.next() {
            Some((Ok(token), span)) => Some((token, span)),
            _ => None,
        }
    }

    /// Consume the next token if it matches, reporting a syntax error
    /// otherwise. Returns the matched span.
    pub(crate) fn expect(&mut self, expected: &Token, what: &str) -> Option<Range<usize>> {
        match self.peek_token() {
            Some((token, span)) if token == expected => {
                self.tokens.next();
                Some(span)
            }
            Some((token, span)) => {
                let message = format!("expected {}, found {:?}", what, token);
                self.error(DiagCode::SyntaxError, span, message);
                None
            }
            None => {
                let end = self.end_span();
                self.error(
                    DiagCode::SyntaxError,
                    end,
                    format!("expected {} but reached end of file", what),
                );
                None
            }
        }
    }

    pub(crate) fn expect_ident(&mut self, what: &str) -> Option<(String, Range<usize>)> {
        match self.peek_token() {
            Some((Token::Ident(name), span)) => {
                let name = name.clone();
                self.tokens.next();
                Some((name, span))
            }
            Some((token, span)) => {
                let message = format!("expected {}, found {:?}", what, token);
                self.error(DiagCode::SyntaxError, span, message);
                None
            }
            None => {
                let end = self.end_span();
                self.error(
                    DiagCode::SyntaxError,
                    end,
                    format!("expected {} but reached end of file", what),
                );
                None
            }
        }
    }

    pub(crate) fn end_span(&self) -> Range<usize> {
        self.last_span.end..self.last_span.end
    }

    /// Skip ahead to the next plausible statement start so one bad
    /// statement does not cascade into dozens of reports.
    pub(crate) fn synchronize(&mut self) {
        while let Some((token, _)) = self.peek_token() {
            match token {
                Token::KeywordModule
                | Token::KeywordDef
                | Token::KeywordFor
                | Token::KeywordIf
                | Token::KeywordAssert
                | Token::KeywordFrom
                | Token::RBrace => return,
                _ => {
                    self.tokens.next();
                }
            }
        }
    }
}

fn keyword_text(token: &Token) -> &'static str {
    match token {
        Token::KeywordIn => "in",
        Token::KeywordRange => "range",
        Token::KeywordImport => "import",
        _ => "?",
    }
}
