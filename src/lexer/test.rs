use super::*;

fn lex_all(input: &str) -> Vec<Token> {
    Token::lexer(input).map(|t| t.unwrap()).collect()
}

#[test]
fn test_lex_def_statement() {
    let tokens = lex_all("def bottom sticky_piston(pos=(x, y, z), facing=facing)");
    assert_eq!(tokens[0], Token::KeywordDef);
    assert_eq!(tokens[1], Token::Ident("bottom".to_string()));
    assert_eq!(tokens[2], Token::Ident("sticky_piston".to_string()));
    assert_eq!(tokens[3], Token::LParen);
    assert_eq!(tokens[4], Token::Ident("pos".to_string()));
    assert_eq!(tokens[5], Token::Assign);
}

#[test]
fn test_lex_assignment_form() {
    let tokens = lex_all("btn = Button(position: (0, 2, 1), facing: south)");
    assert_eq!(tokens[0], Token::Ident("btn".to_string()));
    assert_eq!(tokens[1], Token::Assign);
    assert_eq!(tokens[2], Token::Ident("Button".to_string()));
    assert!(tokens.contains(&Token::Colon));
}

#[test]
fn test_lex_comments_skipped() {
    let tokens = lex_all("# a comment\n5 # trailing comment");
    assert_eq!(tokens, vec![Token::Int(5)]);
}

#[test]
fn test_lex_comment_at_eof_without_newline() {
    let tokens = lex_all("5 # no trailing newline");
    assert_eq!(tokens, vec![Token::Int(5)]);
}

#[test]
fn test_lex_keywords_and_range() {
    let tokens = lex_all("for i in range(0, 5) { }");
    assert_eq!(
        tokens,
        vec![
            Token::KeywordFor,
            Token::Ident("i".to_string()),
            Token::KeywordIn,
            Token::KeywordRange,
            Token::LParen,
            Token::Int(0),
            Token::Comma,
            Token::Int(5),
            Token::RParen,
            Token::LBrace,
            Token::RBrace,
        ]
    );
}

#[test]
fn test_lex_int_overflow_is_an_error_token() {
    let tokens: Vec<_> = Token::lexer("99999999999999999999").collect();
    assert_eq!(tokens.len(), 1);
    assert!(tokens[0].is_err());
}

#[test]
fn test_lex_string_literal() {
    let tokens = lex_all(r#"from "modules/pistons.rl" import DoublePistonExtender"#);
    assert_eq!(tokens[0], Token::KeywordFrom);
    assert_eq!(tokens[1], Token::String("modules/pistons.rl".to_string()));
    assert_eq!(tokens[2], Token::KeywordImport);
}

#[test]
fn test_lex_comparison_operators() {
    let tokens = lex_all("i > 2 == <= >=");
    assert_eq!(tokens[1], Token::Greater);
    assert_eq!(tokens[3], Token::Eq);
    assert_eq!(tokens[4], Token::LessEq);
    assert_eq!(tokens[5], Token::GreaterEq);
}
