use crate::ast::{BinOp, Expr, Facing, UnOp, Value};
use crate::catalog::ElementType;
use crate::diagnostics::{DiagCode, Diagnostic};
use crate::expand::{apply_binop, Binding, Instance, Obligation};

use std::collections::HashMap;
use std::ops::Range;

/// Checks every deferred assert against the finished layout. Conditions
/// are evaluated in the bindings captured where the assert appeared;
/// instance attributes read the final placement and signal state.
pub fn check_assertions(
    obligations: &[Obligation],
    instances: &[Instance],
    powers: &HashMap<usize, i64>,
) -> Vec<Diagnostic> {
    let mut diags = vec![];
    for obligation in obligations {
        let eval = Eval {
            env: &obligation.env,
            instances,
            powers,
            file: &obligation.file,
        };
        match eval.eval(&obligation.condition) {
            Err(diag) => diags.push(diag),
            Ok(Value::Bool(true)) => {}
            Ok(Value::Bool(false)) => {
                diags.push(failure(&eval, &obligation.condition));
            }
            Ok(other) => {
                diags.push(Diagnostic::error(
                    DiagCode::TypeMismatch,
                    obligation.file.to_string(),
                    obligation.condition.1.clone(),
                    format!("assert condition must be a bool, got {}", other.type_name()),
                ));
            }
        }
    }
    diags
}

/// A failed top-level comparison names both sides; anything else just
/// reports the condition.
fn failure(eval: &Eval<'_>, condition: &(Expr, Range<usize>)) -> Diagnostic {
    let mut diag = Diagnostic::error(
        DiagCode::AssertionFailed,
        eval.file.to_string(),
        condition.1.clone(),
        "assertion does not hold".to_string(),
    );
    if let Expr::BinOp {
        operator: BinOp::Eq,
        l_value,
        r_value,
    } = &condition.0
    {
        if let (Ok(actual), Ok(expected)) = (eval.eval(l_value), eval.eval(r_value)) {
            diag = diag.with_note(format!("expected {}, found {}", expected, actual));
        }
    }
    diag
}

struct Eval<'a> {
    env: &'a HashMap<String, Binding>,
    instances: &'a [Instance],
    powers: &'a HashMap<usize, i64>,
    file: &'a str,
}

impl Eval<'_> {
    fn eval(&self, expr: &(Expr, Range<usize>)) -> Result<Value, Diagnostic> {
        let (expr, span) = expr;
        match expr {
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),

            Expr::Variable(name) => match self.env.get(name) {
                Some(Binding::Value(value)) => Ok(value.clone()),
                Some(Binding::Instance(_)) => Err(self.error(
                    DiagCode::TypeMismatch,
                    span,
                    format!("'{}' names an instance; compare one of its attributes", name),
                )),
                None => {
                    if let Some(f) = Facing::from_name(name) {
                        Ok(Value::Facing(f))
                    } else if let Some(ty) = ElementType::from_name(name) {
                        Ok(Value::Str(ty.name().to_string()))
                    } else {
                        Err(self.error(
                            DiagCode::UnboundName,
                            span,
                            format!("'{}' is not bound in the asserting scope", name),
                        ))
                    }
                }
            },

            Expr::Attr { target, attr } => self.eval_attr(target, attr, span),

            Expr::Tuple(elements) => {
                if elements.len() != 3 {
                    return Err(self.error(
                        DiagCode::TypeMismatch,
                        span,
                        format!("position tuples take three components, got {}", elements.len()),
                    ));
                }
                let mut coords = [0i64; 3];
                for (i, element) in elements.iter().enumerate() {
                    match self.eval(element)? {
                        Value::Int(v) => coords[i] = v,
                        other => {
                            return Err(self.error(
                                DiagCode::TypeMismatch,
                                &element.1,
                                format!(
                                    "position components must be integers, got {}",
                                    other.type_name()
                                ),
                            ))
                        }
                    }
                }
                Ok(Value::Pos(crate::ast::Position::new(
                    coords[0], coords[1], coords[2],
                )))
            }

            Expr::BinOp {
                operator,
                l_value,
                r_value,
            } => {
                let lhs = self.eval(l_value)?;
                let rhs = self.eval(r_value)?;
                apply_binop(*operator, &lhs, &rhs)
                    .map_err(|message| self.error(DiagCode::TypeMismatch, span, message))
            }

            Expr::UnOp { unop, expression } => {
                let value = self.eval(expression)?;
                match (unop, value) {
                    (UnOp::Minus, Value::Int(i)) => Ok(Value::Int(-i)),
                    (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (UnOp::Minus, other) => Err(self.error(
                        DiagCode::TypeMismatch,
                        span,
                        format!("'-' expects an integer, got {}", other.type_name()),
                    )),
                    (UnOp::Not, other) => Err(self.error(
                        DiagCode::TypeMismatch,
                        span,
                        format!("'not' expects a bool, got {}", other.type_name()),
                    )),
                }
            }

            Expr::Error => Err(self.error(
                DiagCode::TypeMismatch,
                span,
                "assert condition did not parse".to_string(),
            )),
        }
    }

    fn eval_attr(
        &self,
        target: &(String, Range<usize>),
        attr: &str,
        span: &Range<usize>,
    ) -> Result<Value, Diagnostic> {
        let inst = match self.env.get(&target.0) {
            Some(Binding::Instance(id)) => &self.instances[*id],
            Some(Binding::Value(value)) => {
                return Err(self.error(
                    DiagCode::TypeMismatch,
                    &target.1,
                    format!("'{}' is a {}, not an instance", target.0, value.type_name()),
                ))
            }
            None => {
                return Err(self.error(
                    DiagCode::UnboundName,
                    &target.1,
                    format!("'{}' is not bound in the asserting scope", target.0),
                ))
            }
        };
        match attr {
            "pos" | "position" => Ok(Value::Pos(inst.position)),
            "type" => Ok(Value::Str(inst.element.name().to_string())),
            "facing" => match inst.facing {
                Some(f) => Ok(Value::Facing(f)),
                None => Err(self.error(
                    DiagCode::TypeMismatch,
                    span,
                    format!("'{}' has no facing", inst.scoped_name()),
                )),
            },
            "power" => {
                let power = self
                    .powers
                    .get(&inst.id)
                    .copied()
                    .or(inst.power)
                    .unwrap_or(0);
                Ok(Value::Int(power))
            }
            other => Err(self.error(
                DiagCode::TypeMismatch,
                span,
                format!("instances have no attribute '{}'", other),
            )),
        }
    }

    fn error(&self, code: DiagCode, span: &Range<usize>, message: String) -> Diagnostic {
        Diagnostic::error(code, self.file.to_string(), span.clone(), message)
    }
}
