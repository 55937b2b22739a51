use crate::ast::{BinOp, Expr, Facing, Position, Stmt, UnOp, Value};
use crate::catalog::ElementType;
use crate::diagnostics::{DiagCode, Diagnostic};
use crate::table::ModuleTable;

use log::debug;

use std::collections::HashMap;
use std::ops::Range;


/// Module calls may nest through parameters but not unboundedly; a chain
/// this deep is a runaway recursion.
const MAX_CALL_DEPTH: usize = 256;

/// A fully resolved element placement. Immutable once emitted.
#[derive(Debug, Clone)]
pub struct Instance {
    pub id: usize,
    pub name: String,
    /// Chain of module-call names that own this instance.
    pub path: Vec<String>,
    pub element: ElementType,
    pub position: Position,
    pub facing: Option<Facing>,
    pub power: Option<i64>,
    pub material: Option<String>,
    pub file: String,
    pub span: Range<usize>,
}

impl Instance {
    /// Dotted owning path plus the local name, for diagnostics.
    pub fn scoped_name(&self) -> String {
        if self.path.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.path.join("."), self.name)
        }
    }
}

/// What a name resolves to during expansion.
#[derive(Debug, Clone)]
pub enum Binding {
    Value(Value),
    Instance(usize),
}

/// One link of the scope chain. Each module call and loop iteration gets
/// its own link; inner bindings shadow outer ones.
pub struct Scope<'p> {
    bindings: HashMap<String, Binding>,
    parent: Option<&'p Scope<'p>>,
}

impl<'p> Scope<'p> {
    pub fn root() -> Self {
        Scope {
            bindings: HashMap::new(),
            parent: None,
        }
    }

    pub fn child(parent: &'p Scope<'p>) -> Self {
        Scope {
            bindings: HashMap::new(),
            parent: Some(parent),
        }
    }

    pub fn bind(&mut self, name: impl Into<String>, binding: Binding) {
        self.bindings.insert(name.into(), binding);
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        match self.bindings.get(name) {
            Some(binding) => Some(binding),
            None => self.parent.and_then(|p| p.lookup(name)),
        }
    }

    /// Snapshot of every visible binding, inner scopes shadowing outer.
    /// Taken when an assert is captured so the obligation can be checked
    /// after the scope itself is gone.
    pub fn flatten(&self) -> HashMap<String, Binding> {
        let mut chain = vec![self];
        let mut cur = self;
        while let Some(parent) = cur.parent {
            chain.push(parent);
            cur = parent;
        }
        let mut flat = HashMap::new();
        for scope in chain.into_iter().rev() {
            for (name, binding) in &scope.bindings {
                flat.insert(name.clone(), binding.clone());
            }
        }
        flat
    }
}

/// A deferred `assert`, tied to the bindings visible where it appeared.
#[derive(Debug, Clone)]
pub struct Obligation {
    pub condition: (Expr, Range<usize>),
    pub file: String,
    pub env: HashMap<String, Binding>,
}

/// Everything expansion produced.
#[derive(Debug)]
pub struct Expansion {
    pub instances: Vec<Instance>,
    pub obligations: Vec<Obligation>,
    pub errors: Vec<Diagnostic>,
}

/// Depth-first, order-preserving statement walker. All errors are
/// collected; a failed statement never aborts its siblings.
pub struct Expander<'t> {
    table: &'t ModuleTable,
    instances: Vec<Instance>,
    obligations: Vec<Obligation>,
    errors: Vec<Diagnostic>,
    max_instances: Option<usize>,
    limit_hit: bool,
    call_depth: usize,
}

impl<'t> Expander<'t> {
    pub fn new(table: &'t ModuleTable, max_instances: Option<usize>) -> Self {
        Expander {
            table,
            instances: vec![],
            obligations: vec![],
            errors: vec![],
            max_instances,
            limit_hit: false,
            call_depth: 0,
        }
    }

    pub fn expand(mut self, body: &[(Stmt, Range<usize>)], entry_file: &str) -> Expansion {
        let mut scope = Scope::root();
        let mut path = vec![];
        self.expand_stmts(body, entry_file, &mut scope, &mut path);
        debug!(
            "expansion produced {} instances, {} assert obligations",
            self.instances.len(),
            self.obligations.len()
        );
        Expansion {
            instances: self.instances,
            obligations: self.obligations,
            errors: self.errors,
        }
    }

    fn expand_stmts(
        &mut self,
        stmts: &[(Stmt, Range<usize>)],
        file: &str,
        scope: &mut Scope<'_>,
        path: &mut Vec<String>,
    ) {
        for (stmt, span) in stmts {
            if self.limit_hit {
                return;
            }
            match stmt {
                Stmt::Def { name, ty, args } => {
                    self.expand_def(name, ty, args, span, file, scope, path);
                }
                Stmt::For {
                    var,
                    start,
                    end,
                    body,
                } => {
                    let Some(start_val) = self.eval(start, file, scope) else {
                        continue;
                    };
                    let Some(end_val) = self.eval(end, file, scope) else {
                        continue;
                    };
                    let (Value::Int(lo), Value::Int(hi)) = (&start_val, &end_val) else {
                        self.errors.push(
                            Diagnostic::error(
                                DiagCode::TypeMismatch,
                                file.to_string(),
                                span.clone(),
                                format!(
                                    "range bounds must be integers, got {} and {}",
                                    start_val.type_name(),
                                    end_val.type_name()
                                ),
                            ),
                        );
                        continue;
                    };
                    // half-open interval, sequential iteration order
                    for i in *lo..*hi {
                        if self.limit_hit {
                            return;
                        }
                        let mut child = Scope::child(scope);
                        child.bind(var.0.clone(), Binding::Value(Value::Int(i)));
                        self.expand_stmts(body, file, &mut child, path);
                    }
                }
                Stmt::If {
                    condition,
                    then_body,
                    else_body,
                } => {
                    let Some(cond) = self.eval(condition, file, scope) else {
                        continue;
                    };
                    let Value::Bool(cond) = cond else {
                        self.errors.push(Diagnostic::error(
                            DiagCode::TypeMismatch,
                            file.to_string(),
                            condition.1.clone(),
                            format!("condition must be a bool, got {}", cond.type_name()),
                        ));
                        continue;
                    };
                    if cond {
                        let mut child = Scope::child(scope);
                        self.expand_stmts(then_body, file, &mut child, path);
                    } else if let Some(else_body) = else_body {
                        let mut child = Scope::child(scope);
                        self.expand_stmts(else_body, file, &mut child, path);
                    }
                }
                Stmt::Assert { condition } => {
                    self.obligations.push(Obligation {
                        condition: condition.clone(),
                        file: file.to_string(),
                        env: scope.flatten(),
                    });
                }
                // imports were consumed during table construction
                Stmt::Import { .. } => {}
                Stmt::Error => {}
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_def(
        &mut self,
        name: &(String, Range<usize>),
        ty: &(String, Range<usize>),
        args: &[crate::ast::Arg],
        span: &Range<usize>,
        file: &str,
        scope: &mut Scope<'_>,
        path: &mut Vec<String>,
    ) {
        // evaluate every argument in the caller's scope first
        let mut values: Vec<(String, Value, Range<usize>)> = vec![];
        let mut failed = false;
        for arg in args {
            match self.eval(&arg.value, file, scope) {
                Some(value) => values.push((arg.name.0.clone(), value, arg.value.1.clone())),
                None => failed = true,
            }
        }
        if failed {
            // the binding is broken; skip this statement, keep siblings
            return;
        }

        if let Some(def) = self.table.get(&ty.0) {
            self.expand_module_call(name, def, &values, span, file, scope, path);
        } else if let Some(element) = ElementType::from_name(&ty.0) {
            self.emit_instance(name, element, &values, span, file, scope, path);
        } else {
            self.errors.push(Diagnostic::error(
                DiagCode::UndefinedModule,
                file.to_string(),
                ty.1.clone(),
                format!("'{}' is neither an element type nor a known module", ty.0),
            ));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_module_call(
        &mut self,
        name: &(String, Range<usize>),
        def: &crate::ast::ModuleDef,
        values: &[(String, Value, Range<usize>)],
        span: &Range<usize>,
        file: &str,
        scope: &mut Scope<'_>,
        path: &mut Vec<String>,
    ) {
        if self.call_depth >= MAX_CALL_DEPTH {
            self.limit_hit = true;
            self.errors.push(Diagnostic::error(
                DiagCode::ResourceLimitExceeded,
                file.to_string(),
                span.clone(),
                format!("module calls nested deeper than {}", MAX_CALL_DEPTH),
            ));
            return;
        }

        // reject arguments that match no parameter
        let mut mismatch = false;
        for (arg_name, _, arg_span) in values {
            if !def.params.iter().any(|p| &p.name.0 == arg_name) {
                self.errors.push(Diagnostic::error(
                    DiagCode::ArgumentMismatch,
                    file.to_string(),
                    arg_span.clone(),
                    format!("module '{}' has no parameter '{}'", def.name.0, arg_name),
                ));
                mismatch = true;
            }
        }

        // bind parameters: explicit arguments win, defaults fill the rest
        // (defaults are evaluated in the caller's scope, at call time)
        let mut bindings: Vec<(String, Value)> = vec![];
        for param in &def.params {
            if let Some((_, value, _)) = values.iter().find(|(n, _, _)| n == &param.name.0) {
                bindings.push((param.name.0.clone(), value.clone()));
            } else if let Some(default) = &param.default {
                match self.eval(default, &def.file, scope) {
                    Some(value) => bindings.push((param.name.0.clone(), value)),
                    None => mismatch = true,
                }
            } else {
                self.errors.push(Diagnostic::error(
                    DiagCode::ArgumentMismatch,
                    file.to_string(),
                    span.clone(),
                    format!(
                        "call to '{}' leaves required parameter '{}' unbound",
                        def.name.0, param.name.0
                    ),
                ));
                mismatch = true;
            }
        }
        if mismatch {
            // a call that fails to bind emits no instances
            return;
        }

        let mut child = Scope::child(scope);
        for (param, value) in bindings {
            child.bind(param, Binding::Value(value));
        }

        path.push(name.0.clone());
        self.call_depth += 1;
        self.expand_stmts(&def.body, &def.file, &mut child, path);
        self.call_depth -= 1;
        path.pop();
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_instance(
        &mut self,
        name: &(String, Range<usize>),
        element: ElementType,
        values: &[(String, Value, Range<usize>)],
        span: &Range<usize>,
        file: &str,
        scope: &mut Scope<'_>,
        path: &mut Vec<String>,
    ) {
        let mut position = None;
        let mut facing = None;
        let mut power = None;
        let mut material = None;
        let mut failed = false;

        for (field, value, field_span) in values {
            // the assignment form spells this field `position`; the alias
            // only applies to element constructors, so it is resolved here
            // and not in the parser
            let field = match field.as_str() {
                "position" => "pos",
                other => other,
            };
            match (field, value) {
                ("pos", Value::Pos(p)) => position = Some(*p),
                ("pos", other) => {
                    self.type_error(file, field_span, "pos", "a position tuple", other);
                    failed = true;
                }
                ("facing", Value::Facing(f)) => facing = Some(*f),
                // string spellings like "up" are accepted too
                ("facing", Value::Str(s)) if Facing::from_name(s).is_some() => {
                    facing = Facing::from_name(s);
                }
                ("facing", other) => {
                    self.type_error(file, field_span, "facing", "a direction", other);
                    failed = true;
                }
                ("power", Value::Int(p)) => power = Some(*p),
                ("power", other) => {
                    self.type_error(file, field_span, "power", "an integer", other);
                    failed = true;
                }
                ("material", Value::Str(m)) => material = Some(m.clone()),
                ("material", other) => {
                    self.type_error(file, field_span, "material", "a string", other);
                    failed = true;
                }
                (unknown, _) => {
                    self.errors.push(Diagnostic::error(
                        DiagCode::ArgumentMismatch,
                        file.to_string(),
                        field_span.clone(),
                        format!("'{}' is not a constructor field of {}", unknown, element),
                    ));
                    failed = true;
                }
            }
        }

        let Some(position) = position else {
            if !failed {
                self.errors.push(Diagnostic::error(
                    DiagCode::ArgumentMismatch,
                    file.to_string(),
                    span.clone(),
                    format!("{} needs a 'pos' field", element),
                ));
            }
            return;
        };
        if failed {
            return;
        }

        if let Some(max) = self.max_instances {
            if self.instances.len() >= max {
                self.limit_hit = true;
                self.errors.push(Diagnostic::error(
                    DiagCode::ResourceLimitExceeded,
                    file.to_string(),
                    span.clone(),
                    format!("instance limit of {} exceeded", max),
                ));
                return;
            }
        }

        let id = self.instances.len();
        self.instances.push(Instance {
            id,
            name: name.0.clone(),
            path: path.clone(),
            element,
            position,
            facing,
            power,
            material,
            file: file.to_string(),
            span: span.clone(),
        });
        scope.bind(name.0.clone(), Binding::Instance(id));
    }

    fn type_error(
        &mut self,
        file: &str,
        span: &Range<usize>,
        field: &str,
        expected: &str,
        got: &Value,
    ) {
        self.errors.push(Diagnostic::error(
            DiagCode::TypeMismatch,
            file.to_string(),
            span.clone(),
            format!("'{}' expects {}, got {}", field, expected, got.type_name()),
        ));
    }

    /// Evaluates an expression against the scope chain. Returns None when
    /// a diagnostic was recorded; callers skip the affected statement.
    fn eval(
        &mut self,
        expr: &(Expr, Range<usize>),
        file: &str,
        scope: &Scope<'_>,
    ) -> Option<Value> {
        let (expr, span) = expr;
        match expr {
            Expr::Int(i) => Some(Value::Int(*i)),
            Expr::Str(s) => Some(Value::Str(s.clone())),
            Expr::Bool(b) => Some(Value::Bool(*b)),

            Expr::Variable(name) => match scope.lookup(name) {
                Some(Binding::Value(value)) => Some(value.clone()),
                Some(Binding::Instance(_)) => {
                    self.errors.push(Diagnostic::error(
                        DiagCode::TypeMismatch,
                        file.to_string(),
                        span.clone(),
                        format!("'{}' names an instance, not a value", name),
                    ));
                    None
                }
                None => {
                    // bare direction and element-type words are literals
                    if let Some(f) = Facing::from_name(name) {
                        Some(Value::Facing(f))
                    } else if let Some(ty) = ElementType::from_name(name) {
                        Some(Value::Str(ty.name().to_string()))
                    } else {
                        self.errors.push(Diagnostic::error(
                            DiagCode::UnboundName,
                            file.to_string(),
                            span.clone(),
                            format!("'{}' is not bound in any enclosing scope", name),
                        ));
                        None
                    }
                }
            },

            Expr::Tuple(elements) => {
                if elements.len() != 3 {
                    self.errors.push(Diagnostic::error(
                        DiagCode::TypeMismatch,
                        file.to_string(),
                        span.clone(),
                        format!("position tuples take three components, got {}", elements.len()),
                    ));
                    return None;
                }
                let mut coords = [0i64; 3];
                for (i, element) in elements.iter().enumerate() {
                    match self.eval(element, file, scope)? {
                        Value::Int(v) => coords[i] = v,
                        other => {
                            self.errors.push(Diagnostic::error(
                                DiagCode::TypeMismatch,
                                file.to_string(),
                                element.1.clone(),
                                format!(
                                    "position components must be integers, got {}",
                                    other.type_name()
                                ),
                            ));
                            return None;
                        }
                    }
                }
                Some(Value::Pos(Position::new(coords[0], coords[1], coords[2])))
            }

            Expr::Attr { .. } => {
                self.errors.push(Diagnostic::error(
                    DiagCode::TypeMismatch,
                    file.to_string(),
                    span.clone(),
                    "attribute access is only valid inside assert".to_string(),
                ));
                None
            }

            Expr::BinOp {
                operator,
                l_value,
                r_value,
            } => {
                let lhs = self.eval(l_value, file, scope)?;
                let rhs = self.eval(r_value, file, scope)?;
                match apply_binop(*operator, &lhs, &rhs) {
                    Ok(value) => Some(value),
                    Err(message) => {
                        self.errors.push(Diagnostic::error(
                            DiagCode::TypeMismatch,
                            file.to_string(),
                            span.clone(),
                            message,
                        ));
                        None
                    }
                }
            }

            Expr::UnOp { unop, expression } => {
                let value = self.eval(expression, file, scope)?;
                match (unop, value) {
                    (UnOp::Minus, Value::Int(i)) => Some(Value::Int(-i)),
                    (UnOp::Not, Value::Bool(b)) => Some(Value::Bool(!b)),
                    (UnOp::Minus, other) => {
                        self.errors.push(Diagnostic::error(
                            DiagCode::TypeMismatch,
                            file.to_string(),
                            span.clone(),
                            format!("'-' expects an integer, got {}", other.type_name()),
                        ));
                        None
                    }
                    (UnOp::Not, other) => {
                        self.errors.push(Diagnostic::error(
                            DiagCode::TypeMismatch,
                            file.to_string(),
                            span.clone(),
                            format!("'not' expects a bool, got {}", other.type_name()),
                        ));
                        None
                    }
                }
            }

            Expr::Error => None,
        }
    }
}

/// Shared binary-operator semantics; the assertion evaluator reuses this.
pub fn apply_binop(operator: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, String> {
    use Value::*;
    match (operator, lhs, rhs) {
        (BinOp::Add, Int(a), Int(b)) => Ok(Int(a + b)),
        (BinOp::Sub, Int(a), Int(b)) => Ok(Int(a - b)),
        (BinOp::Mul, Int(a), Int(b)) => Ok(Int(a * b)),
        (BinOp::Div, Int(_), Int(0)) => Err("division by zero".to_string()),
        (BinOp::Div, Int(a), Int(b)) => Ok(Int(a / b)),

        // component-wise position arithmetic
        (BinOp::Add, Pos(a), Pos(b)) => Ok(Pos(Position::new(a.x + b.x, a.y + b.y, a.z + b.z))),
        (BinOp::Sub, Pos(a), Pos(b)) => Ok(Pos(Position::new(a.x - b.x, a.y - b.y, a.z - b.z))),
        (BinOp::Mul, Pos(a), Int(k)) | (BinOp::Mul, Int(k), Pos(a)) => {
            Ok(Pos(Position::new(a.x * k, a.y * k, a.z * k)))
        }

        (BinOp::Eq, a, b) if same_kind(a, b) => Ok(Bool(a == b)),
        (BinOp::NotEq, a, b) if same_kind(a, b) => Ok(Bool(a != b)),

        (BinOp::Less, Int(a), Int(b)) => Ok(Bool(a < b)),
        (BinOp::Greater, Int(a), Int(b)) => Ok(Bool(a > b)),
        (BinOp::LessEq, Int(a), Int(b)) => Ok(Bool(a <= b)),
        (BinOp::GreaterEq, Int(a), Int(b)) => Ok(Bool(a >= b)),

        (BinOp::And, Bool(a), Bool(b)) => Ok(Bool(*a && *b)),
        (BinOp::Or, Bool(a), Bool(b)) => Ok(Bool(*a || *b)),

        (op, a, b) => Err(format!(
            "'{}' is not defined between {} and {}",
            op.symbol(),
            a.type_name(),
            b.type_name()
        )),
    }
}

fn same_kind(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}
