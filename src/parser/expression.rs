use crate::ast::{BinOp, Expr, UnOp};
use crate::diagnostics::DiagCode;
use crate::lexer::Token;
use crate::parser::Parser;

use std::ops::Range;

impl Parser<'_> {
    pub fn parse_expression(&mut self) -> (Expr, Range<usize>) {
        self.parse_or()
    }

    fn parse_or(&mut self) -> (Expr, Range<usize>) {
        let mut l_expr = self.parse_and();
        while let Some((Token::Or, _)) = self.peek_token() {
            self.next_token();
            let r_expr = self.parse_and();
            l_expr = binop(BinOp::Or, l_expr, r_expr);
        }
        l_expr
    }

    fn parse_and(&mut self) -> (Expr, Range<usize>) {
        let mut l_expr = self.parse_comparison();
        while let Some((Token::And, _)) = self.peek_token() {
            self.next_token();
            let r_expr = self.parse_comparison();
            l_expr = binop(BinOp::And, l_expr, r_expr);
        }
        l_expr
    }

    fn parse_comparison(&mut self) -> (Expr, Range<usize>) {
        let l_expr = self.parse_additive();
        let operator = match self.peek_token() {
            Some((Token::Eq, _)) => BinOp::Eq,
            Some((Token::NotEq, _)) => BinOp::NotEq,
            Some((Token::Less, _)) => BinOp::Less,
            Some((Token::Greater, _)) => BinOp::Greater,
            Some((Token::LessEq, _)) => BinOp::LessEq,
            Some((Token::GreaterEq, _)) => BinOp::GreaterEq,
            _ => return l_expr,
        };
        self.next_token();
        let r_expr = self.parse_additive();
        binop(operator, l_expr, r_expr)
    }

    fn parse_additive(&mut self) -> (Expr, Range<usize>) {
        let mut l_expr = self.parse_multiplicative();
        loop {
            let operator = match self.peek_token() {
                Some((Token::Plus, _)) => BinOp::Add,
                Some((Token::Minus, _)) => BinOp::Sub,
                _ => return l_expr,
            };
            self.next_token();
            let r_expr = self.parse_multiplicative();
            l_expr = binop(operator, l_expr, r_expr);
        }
    }

    fn parse_multiplicative(&mut self) -> (Expr, Range<usize>) {
        let mut l_expr = self.parse_unary();
        loop {
            let operator = match self.peek_token() {
                Some((Token::Star, _)) => BinOp::Mul,
                Some((Token::Div, _)) => BinOp::Div,
                _ => return l_expr,
            };
            self.next_token();
            let r_expr = self.parse_unary();
            l_expr = binop(operator, l_expr, r_expr);
        }
    }

    fn parse_unary(&mut self) -> (Expr, Range<usize>) {
        match self.peek_token() {
            Some((Token::Minus, span)) => {
                self.next_token();
                let expression = self.parse_unary();
                let full = span.start..expression.1.end;
                (
                    Expr::UnOp {
                        unop: UnOp::Minus,
                        expression: Box::new(expression),
                    },
                    full,
                )
            }
            Some((Token::Not, span)) => {
                self.next_token();
                let expression = self.parse_unary();
                let full = span.start..expression.1.end;
                (
                    Expr::UnOp {
                        unop: UnOp::Not,
                        expression: Box::new(expression),
                    },
                    full,
                )
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> (Expr, Range<usize>) {
        let Some((token, span)) = self.next_token() else {
            let end = self.end_span();
            self.error(
                DiagCode::SyntaxError,
                end.clone(),
                "expected an expression but reached end of file".to_string(),
            );
            return (Expr::Error, end);
        };

        match token {
            Token::Int(i) => (Expr::Int(i), span),
            Token::String(s) => (Expr::Str(s), span),
            Token::Bool(b) => (Expr::Bool(b), span),

            Token::Ident(name) => {
                // `instance.attr` access, used in assertions
                if let Some((Token::Dot, _)) = self.peek_token() {
                    self.next_token();
                    let Some((attr, attr_span)) = self.expect_ident("an attribute name after '.'")
                    else {
                        return (Expr::Error, span);
                    };
                    (
                        Expr::Attr {
                            target: (name, span.clone()),
                            attr,
                        },
                        span.start..attr_span.end,
                    )
                } else {
                    (Expr::Variable(name), span)
                }
            }

            Token::LParen => {
                let first = self.parse_expression();
                match self.peek_token() {
                    Some((Token::RParen, close)) => {
                        self.next_token();
                        // parenthesized expression, not a tuple
                        (first.0, span.start..close.end)
                    }
                    Some((Token::Comma, _)) => {
                        let mut elements = vec![first];
                        while let Some((Token::Comma, _)) = self.peek_token() {
                            self.next_token();
                            elements.push(self.parse_expression());
                        }
                        match self.peek_token() {
                            Some((Token::RParen, close)) => {
                                self.next_token();
                                (Expr::Tuple(elements), span.start..close.end)
                            }
                            _ => {
                                self.error(
                                    DiagCode::SyntaxError,
                                    span.clone(),
                                    "unclosed tuple, expected ')'".to_string(),
                                );
                                (Expr::Error, span)
                            }
                        }
                    }
                    _ => {
                        self.error(
                            DiagCode::SyntaxError,
                            span.clone(),
                            "unclosed parenthesis, expected ')'".to_string(),
                        );
                        (Expr::Error, span)
                    }
                }
            }

            other => {
                let message = format!("expected an expression, found {:?}", other);
                self.error(DiagCode::SyntaxError, span.clone(), message);
                (Expr::Error, span)
            }
        }
    }
}

fn binop(
    operator: BinOp,
    l_expr: (Expr, Range<usize>),
    r_expr: (Expr, Range<usize>),
) -> (Expr, Range<usize>) {
    let span = l_expr.1.start..r_expr.1.end;
    (
        Expr::BinOp {
            operator,
            l_value: Box::new(l_expr),
            r_value: Box::new(r_expr),
        },
        span,
    )
}
