use super::*;
use crate::ast::{BinOp, Expr, ImportList, Stmt};
use crate::lexer::Token;

use logos::Logos;

// Helper function to parse input without file I/O
fn parse_str(input: &str) -> (Vec<(ASTNode, Range<usize>)>, Vec<Diagnostic>) {
    let lexer = Token::lexer(input).spanned().peekable();
    let mut parser = Parser::new(lexer, "test.rl".to_string());
    let ast = parser.parse_program();
    (ast, parser.errors)
}

fn only_stmt(ast: &[(ASTNode, Range<usize>)]) -> &Stmt {
    assert_eq!(ast.len(), 1);
    match &ast[0].0 {
        ASTNode::Stmt((stmt, _)) => stmt,
        other => panic!("expected a statement, got {:?}", other),
    }
}

#[test]
fn test_parse_def_call_form() {
    let (ast, errors) = parse_str("def bottom sticky_piston(pos=(0, 1, 2), facing=up)");
    assert!(errors.is_empty());

    let Stmt::Def { name, ty, args } = only_stmt(&ast) else {
        panic!("expected def");
    };
    assert_eq!(name.0, "bottom");
    assert_eq!(ty.0, "sticky_piston");
    assert_eq!(args.len(), 2);
    assert_eq!(args[0].name.0, "pos");
    assert!(matches!(args[0].value.0, Expr::Tuple(_)));
    assert_eq!(args[1].name.0, "facing");
}

#[test]
fn test_parse_assignment_form_normalizes_to_def() {
    let (ast, errors) = parse_str("btn = Button(position: (0, 2, 1), facing: south)");
    assert!(errors.is_empty());

    let Stmt::Def { name, ty, args } = only_stmt(&ast) else {
        panic!("expected def");
    };
    assert_eq!(name.0, "btn");
    assert_eq!(ty.0, "Button");
    // argument names are kept verbatim; whether `position` aliases `pos`
    // is the callee's business, decided at expansion time
    assert_eq!(args[0].name.0, "position");
    assert_eq!(args[1].name.0, "facing");
}

#[test]
fn test_parse_module_with_params_and_default() {
    let (ast, errors) = parse_str(
        "module Column(height, x_pos = 0) {
            def p piston(pos=(x_pos, 0, 0), facing=up)
        }",
    );
    assert!(errors.is_empty());
    assert_eq!(ast.len(), 1);

    let ASTNode::Module(def) = &ast[0].0 else {
        panic!("expected a module definition");
    };
    assert_eq!(def.name.0, "Column");
    assert_eq!(def.params.len(), 2);
    assert_eq!(def.params[0].name.0, "height");
    assert!(def.params[0].default.is_none());
    assert!(def.params[1].default.is_some());
    assert_eq!(def.body.len(), 1);
}

#[test]
fn test_duplicate_parameter_rejected() {
    let (_ast, errors) = parse_str("module M(a, a) { }");
    assert!(errors
        .iter()
        .any(|e| e.code == DiagCode::DuplicateParameter));
}

#[test]
fn test_parse_for_loop() {
    let (ast, errors) = parse_str(
        "for i in range(0, 5) {
            def p piston(pos=(0, i, 0))
        }",
    );
    assert!(errors.is_empty());

    let Stmt::For { var, start, end, body } = only_stmt(&ast) else {
        panic!("expected for");
    };
    assert_eq!(var.0, "i");
    assert!(matches!(start.0, Expr::Int(0)));
    assert!(matches!(end.0, Expr::Int(5)));
    assert_eq!(body.len(), 1);
}

#[test]
fn test_parse_if_else() {
    let (ast, errors) = parse_str(
        "if (i > 2) {
            def g glass(pos=(1, i, 0))
        } else {
            def s stone(pos=(1, i, 0))
        }",
    );
    assert!(errors.is_empty());

    let Stmt::If { condition, then_body, else_body } = only_stmt(&ast) else {
        panic!("expected if");
    };
    let Expr::BinOp { operator, .. } = &condition.0 else {
        panic!("expected comparison");
    };
    assert_eq!(*operator, BinOp::Greater);
    assert_eq!(then_body.len(), 1);
    assert_eq!(else_body.as_ref().unwrap().len(), 1);
}

#[test]
fn test_parse_assert_with_attribute() {
    let (ast, errors) = parse_str("assert(piston.facing == up)");
    assert!(errors.is_empty());

    let Stmt::Assert { condition } = only_stmt(&ast) else {
        panic!("expected assert");
    };
    let Expr::BinOp { operator: BinOp::Eq, l_value, .. } = &condition.0 else {
        panic!("expected equality");
    };
    let Expr::Attr { target, attr } = &l_value.0 else {
        panic!("expected attribute access");
    };
    assert_eq!(target.0, "piston");
    assert_eq!(attr, "facing");
}

#[test]
fn test_parse_named_import() {
    let (ast, errors) = parse_str(r#"from "modules/pistons.rl" import DoublePistonExtender, TriplePistonExtender"#);
    assert!(errors.is_empty());

    let Stmt::Import { path, names } = only_stmt(&ast) else {
        panic!("expected import");
    };
    assert_eq!(path.0, "modules/pistons.rl");
    let ImportList::Names(names) = names else {
        panic!("expected named import");
    };
    assert_eq!(names.len(), 2);
    assert_eq!(names[0].0, "DoublePistonExtender");
}

#[test]
fn test_parse_wildcard_import() {
    let (ast, errors) = parse_str(r#"from "modules/pistons.rl" import *"#);
    assert!(errors.is_empty());

    let Stmt::Import { names, .. } = only_stmt(&ast) else {
        panic!("expected import");
    };
    assert!(matches!(names, ImportList::All));
}

#[test]
fn test_unterminated_block() {
    let (_ast, errors) = parse_str("module M() { def p piston(pos=(0, 0, 0))");
    assert!(errors.iter().any(|e| e.code == DiagCode::UnterminatedBlock));
}

#[test]
fn test_unknown_toplevel_keyword() {
    let (_ast, errors) = parse_str("5");
    assert!(errors.iter().any(|e| e.code == DiagCode::UnknownKeyword));
}

#[test]
fn test_stray_else_is_misplaced_control_flow() {
    let (_ast, errors) = parse_str("else { }");
    assert!(errors
        .iter()
        .any(|e| e.code == DiagCode::MisplacedControlFlow));
}

#[test]
fn test_arithmetic_precedence() {
    let (ast, errors) = parse_str("def p piston(pos=(start_x + i * 2, 0, 0))");
    assert!(errors.is_empty());

    let Stmt::Def { args, .. } = only_stmt(&ast) else {
        panic!("expected def");
    };
    let Expr::Tuple(elements) = &args[0].value.0 else {
        panic!("expected tuple");
    };
    // start_x + (i * 2), not (start_x + i) * 2
    let Expr::BinOp { operator: BinOp::Add, r_value, .. } = &elements[0].0 else {
        panic!("expected addition at the top");
    };
    assert!(matches!(
        r_value.0,
        Expr::BinOp { operator: BinOp::Mul, .. }
    ));
}

#[test]
fn test_int_literal_overflow_is_a_syntax_error() {
    let (_ast, errors) = parse_str("def a stone(pos=(99999999999999999999, 0, 0))");
    assert!(errors.iter().any(|e| e.code == DiagCode::SyntaxError));
}

#[test]
fn test_for_span_covers_whole_body() {
    let input = "for i in range(0, 2) {\n    def s stone(pos=(0, i, 0))\n}";
    let (ast, errors) = parse_str(input);
    assert!(errors.is_empty());
    // the statement span runs to the closing brace, not the range header
    assert_eq!(ast[0].1.end, input.len());
}

#[test]
fn test_if_else_span_covers_whole_body() {
    let input = "if (1 > 0) {\n    def g glass(pos=(0, 0, 0))\n} else {\n    def s stone(pos=(0, 0, 0))\n}";
    let (ast, errors) = parse_str(input);
    assert!(errors.is_empty());
    assert_eq!(ast[0].1.end, input.len());
}

#[test]
fn test_error_recovery_continues_parsing() {
    // first statement is broken, second is fine and must still parse
    let (ast, errors) = parse_str(
        "def broken ?
         def ok stone(pos=(0, 0, 0))",
    );
    assert!(!errors.is_empty());
    assert!(ast.iter().any(|(node, _)| {
        matches!(node, ASTNode::Stmt((Stmt::Def { name, .. }, _)) if name.0 == "ok")
    }));
}
