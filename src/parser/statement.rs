use crate::ast::{ASTNode, Arg, ImportList, ModuleDef, Param, Stmt};
use crate::diagnostics::DiagCode;
use crate::lexer::Token;
use crate::parser::Parser;

use std::ops::Range;

impl Parser<'_> {
    /// Parses one statement. The caller guarantees the next token starts
    /// one (def/for/if/assert/from or an identifier).
    pub fn parse_statement(&mut self) -> (Stmt, Range<usize>) {
        let Some((token, span)) = self.peek_token() else {
            let end = self.end_span();
            self.error(
                DiagCode::SyntaxError,
                end.clone(),
                "expected a statement but reached end of file".to_string(),
            );
            return (Stmt::Error, end);
        };
        match token {
            Token::KeywordDef => self.parse_def(),
            Token::KeywordFor => self.parse_for(),
            Token::KeywordIf => self.parse_if(),
            Token::KeywordAssert => self.parse_assert(),
            Token::KeywordFrom => self.parse_import(),
            Token::Ident(_) => self.parse_assign(),
            _ => {
                let message = format!("expected a statement, found {:?}", token);
                self.error(DiagCode::SyntaxError, span.clone(), message);
                self.next_token();
                self.synchronize();
                (Stmt::Error, span)
            }
        }
    }

    /// `module Name(a, b = 3) { ... }`
    pub fn parse_module(&mut self) -> Option<(ASTNode, Range<usize>)> {
        let Some((_, span_module)) = self.next_token() else {
            unreachable!()
        };
        let name = self.expect_ident("a module name after 'module'")?;

        self.expect(&Token::LParen, "'(' after the module name")?;
        let mut params: Vec<Param> = vec![];
        loop {
            match self.peek_token() {
                Some((Token::RParen, _)) => {
                    self.next_token();
                    break;
                }
                Some((Token::Comma, _)) => {
                    self.next_token();
                }
                Some((Token::Ident(_), _)) => {
                    let (param, param_span) = self.expect_ident("a parameter name")?;
                    if params.iter().any(|p| p.name.0 == param) {
                        self.error(
                            DiagCode::DuplicateParameter,
                            param_span.clone(),
                            format!("parameter '{}' is declared twice", param),
                        );
                    }
                    let default = if let Some((Token::Assign, _)) = self.peek_token() {
                        self.next_token();
                        Some(self.parse_expression())
                    } else {
                        None
                    };
                    params.push(Param {
                        name: (param, param_span),
                        default,
                    });
                }
                Some((token, span)) => {
                    let message =
                        format!("expected a parameter name or ')', found {:?}", token);
                    self.error(DiagCode::SyntaxError, span, message);
                    self.synchronize();
                    return None;
                }
                None => {
                    let end = self.end_span();
                    self.error(
                        DiagCode::SyntaxError,
                        end,
                        "unclosed parameter list, reached end of file".to_string(),
                    );
                    return None;
                }
            }
        }

        let (body, _) = self.parse_block("module body")?;
        let span = span_module.start..name.1.end;
        Some((
            ASTNode::Module(ModuleDef {
                name,
                params,
                body,
                file: self.file().to_string(),
            }),
            span,
        ))
    }

    /// `{ statement* }` with UnterminatedBlock on EOF. Returns the body
    /// and the span of the closing brace.
    fn parse_block(&mut self, what: &str) -> Option<(Vec<(Stmt, Range<usize>)>, Range<usize>)> {
        let open = self.expect(&Token::LBrace, &format!("'{{' to open the {}", what))?;
        let mut body = vec![];
        loop {
            match self.peek_token() {
                Some((Token::RBrace, close)) => {
                    self.next_token();
                    return Some((body, close));
                }
                Some((_, _)) => {
                    let (stmt, span) = self.parse_statement();
                    body.push((stmt, span));
                }
                None => {
                    self.error(
                        DiagCode::UnterminatedBlock,
                        open,
                        format!("this {} is never closed", what),
                    );
                    return None;
                }
            }
        }
    }

    /// Call form: `def name Type(arg=expr, ...)`.
    fn parse_def(&mut self) -> (Stmt, Range<usize>) {
        let Some((_, span_def)) = self.next_token() else {
            unreachable!()
        };
        let Some(name) = self.expect_ident("an instance name after 'def'") else {
            self.synchronize();
            return (Stmt::Error, span_def);
        };
        let Some(ty) = self.expect_ident("an element or module type") else {
            self.synchronize();
            return (Stmt::Error, span_def);
        };
        let Some((args, close)) = self.parse_args() else {
            self.synchronize();
            return (Stmt::Error, span_def.start..ty.1.end);
        };
        let span = span_def.start..close.end;
        (Stmt::Def { name, ty, args }, span)
    }

    /// Assignment form: `name = Type(field: expr, ...)`. Normalizes to the
    /// same Def node as the call form.
    fn parse_assign(&mut self) -> (Stmt, Range<usize>) {
        let Some((Token::Ident(name), span_name)) = self.next_token() else {
            unreachable!()
        };
        if self.expect(&Token::Assign, "'=' after the instance name").is_none() {
            self.synchronize();
            return (Stmt::Error, span_name);
        }
        let Some(ty) = self.expect_ident("an element or module type") else {
            self.synchronize();
            return (Stmt::Error, span_name);
        };
        let Some((args, close)) = self.parse_args() else {
            self.synchronize();
            return (Stmt::Error, span_name.start..ty.1.end);
        };
        let span = span_name.start..close.end;
        (
            Stmt::Def {
                name: (name, span_name),
                ty,
                args,
            },
            span,
        )
    }

    /// `(name=expr, ...)` or `(name: expr, ...)`; the separators are
    /// interchangeable. Argument names are kept verbatim — whether
    /// `position` aliases `pos` depends on the callee, which is only
    /// known at expansion time.
    fn parse_args(&mut self) -> Option<(Vec<Arg>, Range<usize>)> {
        self.expect(&Token::LParen, "'(' to open the argument list")?;
        let mut args: Vec<Arg> = vec![];
        loop {
            match self.peek_token() {
                Some((Token::RParen, close)) => {
                    self.next_token();
                    return Some((args, close));
                }
                Some((Token::Comma, _)) => {
                    self.next_token();
                }
                Some((Token::Ident(_), _)) => {
                    let (raw_name, name_span) = self.expect_ident("an argument name")?;
                    match self.peek_token() {
                        Some((Token::Assign, _)) | Some((Token::Colon, _)) => {
                            self.next_token();
                        }
                        Some((token, span)) => {
                            let message =
                                format!("expected '=' or ':' after argument name, found {:?}", token);
                            self.error(DiagCode::SyntaxError, span, message);
                            return None;
                        }
                        None => {
                            let end = self.end_span();
                            self.error(
                                DiagCode::SyntaxError,
                                end,
                                "unclosed argument list, reached end of file".to_string(),
                            );
                            return None;
                        }
                    }
                    let value = self.parse_expression();
                    args.push(Arg {
                        name: (raw_name, name_span),
                        value,
                    });
                }
                Some((token, span)) => {
                    let message = format!("expected an argument or ')', found {:?}", token);
                    self.error(DiagCode::SyntaxError, span, message);
                    return None;
                }
                None => {
                    let end = self.end_span();
                    self.error(
                        DiagCode::SyntaxError,
                        end,
                        "unclosed argument list, reached end of file".to_string(),
                    );
                    return None;
                }
            }
        }
    }

    /// `for i in range(a, b) { ... }`
    fn parse_for(&mut self) -> (Stmt, Range<usize>) {
        let Some((_, span_for)) = self.next_token() else {
            unreachable!()
        };
        let Some(var) = self.expect_ident("a loop variable after 'for'") else {
            self.synchronize();
            return (Stmt::Error, span_for);
        };
        if self.expect(&Token::KeywordIn, "'in' after the loop variable").is_none()
            || self.expect(&Token::KeywordRange, "'range'").is_none()
            || self.expect(&Token::LParen, "'(' after 'range'").is_none()
        {
            self.synchronize();
            return (Stmt::Error, span_for);
        }
        let start = self.parse_expression();
        if self.expect(&Token::Comma, "',' between range bounds").is_none() {
            self.synchronize();
            return (Stmt::Error, span_for);
        }
        let end = self.parse_expression();
        if self.expect(&Token::RParen, "')' to close 'range'").is_none() {
            self.synchronize();
            return (Stmt::Error, span_for);
        }
        let Some((body, close)) = self.parse_block("for body") else {
            return (Stmt::Error, span_for);
        };
        let span = span_for.start..close.end;
        (
            Stmt::For {
                var,
                start,
                end,
                body,
            },
            span,
        )
    }

    /// `if cond { ... } else { ... }`; the condition may be parenthesized.
    fn parse_if(&mut self) -> (Stmt, Range<usize>) {
        let Some((_, span_if)) = self.next_token() else {
            unreachable!()
        };
        let condition = self.parse_expression();
        let Some((then_body, mut close)) = self.parse_block("if body") else {
            return (Stmt::Error, span_if);
        };
        let else_body = if let Some((Token::KeywordElse, _)) = self.peek_token() {
            self.next_token();
            match self.parse_block("else body") {
                Some((body, else_close)) => {
                    close = else_close;
                    Some(body)
                }
                None => return (Stmt::Error, span_if),
            }
        } else {
            None
        };
        let span = span_if.start..close.end;
        (
            Stmt::If {
                condition,
                then_body,
                else_body,
            },
            span,
        )
    }

    /// `assert(expr)`
    fn parse_assert(&mut self) -> (Stmt, Range<usize>) {
        let Some((_, span_assert)) = self.next_token() else {
            unreachable!()
        };
        if self.expect(&Token::LParen, "'(' after 'assert'").is_none() {
            self.synchronize();
            return (Stmt::Error, span_assert);
        }
        let condition = self.parse_expression();
        let Some(close) = self.expect(&Token::RParen, "')' to close 'assert'") else {
            self.synchronize();
            return (Stmt::Error, span_assert);
        };
        let span = span_assert.start..close.end;
        (Stmt::Assert { condition }, span)
    }

    /// `from "path" import Name, Name` or `from "path" import *`
    fn parse_import(&mut self) -> (Stmt, Range<usize>) {
        let Some((_, span_from)) = self.next_token() else {
            unreachable!()
        };
        let path = match self.peek_token() {
            Some((Token::String(path), span)) => {
                let path = path.clone();
                self.next_token();
                (path, span)
            }
            Some((token, span)) => {
                let message = format!("expected a quoted import path, found {:?}", token);
                self.error(DiagCode::SyntaxError, span, message);
                self.synchronize();
                return (Stmt::Error, span_from);
            }
            None => {
                let end = self.end_span();
                self.error(
                    DiagCode::SyntaxError,
                    end,
                    "expected an import path but reached end of file".to_string(),
                );
                return (Stmt::Error, span_from);
            }
        };
        if self.expect(&Token::KeywordImport, "'import' after the path").is_none() {
            self.synchronize();
            return (Stmt::Error, span_from);
        }

        // wildcard import pulls in every module the file defines
        if let Some((Token::Star, star_span)) = self.peek_token() {
            self.next_token();
            let span = span_from.start..star_span.end;
            return (
                Stmt::Import {
                    path,
                    names: ImportList::All,
                },
                span,
            );
        }

        let mut names = vec![];
        let Some(first) = self.expect_ident("a module name to import") else {
            self.synchronize();
            return (Stmt::Error, span_from);
        };
        names.push(first);
        while let Some((Token::Comma, _)) = self.peek_token() {
            self.next_token();
            let Some(next) = self.expect_ident("a module name after ','") else {
                self.synchronize();
                return (Stmt::Error, span_from);
            };
            names.push(next);
        }

        let span = span_from.start..names.last().map(|n| n.1.end).unwrap_or(path.1.end);
        (
            Stmt::Import {
                path,
                names: ImportList::Names(names),
            },
            span,
        )
    }
}
