//! msl-par — recursive-descent parser turning a token stream into a
//! [`msl_ast::Program`].

mod error;
mod parser;

pub use error::ParseError;
pub use parser::parse;

#[cfg(test)]
mod tests {
    use super::*;
    use msl_ast::{BinOp, Expr, LiteralValue, Stmt};
    use msl_util::Handler;

    fn parse_source(source: &str) -> Result<msl_ast::Program, ParseError> {
        let mut handler = Handler::new();
        let tokens = msl_lex::tokenize(source, &mut handler);
        parse(tokens, &mut handler)
    }

    #[test]
    fn parses_a_variable_declaration_with_multiple_declarators() {
        let program = parse_source("let a = 1, b, c = a + 1;").unwrap();
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Stmt::VariableDeclaration(decl) => assert_eq!(decl.declarations.len(), 3),
            other => panic!("expected a variable declaration, got {other:?}"),
        }
    }

    #[test]
    fn binary_operators_respect_precedence() {
        let program = parse_source("1 + 2 * 3;").unwrap();
        match &program.statements[0] {
            Stmt::Expression(stmt) => match &stmt.expr {
                Expr::Binary(bin) => {
                    assert_eq!(bin.op, BinOp::Add);
                    assert!(matches!(&*bin.right, Expr::Binary(_)));
                }
                other => panic!("expected a binary expression, got {other:?}"),
            },
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn disambiguates_a_zero_arg_function_from_a_parenthesized_expression() {
        let program = parse_source("() { return 1; };").unwrap();
        match &program.statements[0] {
            Stmt::Expression(stmt) => assert!(matches!(stmt.expr, Expr::Function(_))),
            other => panic!("expected a function expression statement, got {other:?}"),
        }
    }

    #[test]
    fn parenthesized_expression_is_not_mistaken_for_a_function() {
        let program = parse_source("(1 + 2);").unwrap();
        match &program.statements[0] {
            Stmt::Expression(stmt) => assert!(matches!(stmt.expr, Expr::Binary(_))),
            other => panic!("expected a binary expression statement, got {other:?}"),
        }
    }

    #[test]
    fn disambiguates_a_multi_arg_function_header() {
        let program = parse_source("(a, b) { return a + b; };").unwrap();
        match &program.statements[0] {
            Stmt::Expression(stmt) => match &stmt.expr {
                Expr::Function(f) => assert_eq!(f.params.len(), 2),
                other => panic!("expected a function expression, got {other:?}"),
            },
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn rejects_an_invalid_assignment_target() {
        let result = parse_source("1 + 1 = 2;");
        assert!(result.is_err());
    }

    #[test]
    fn object_and_array_literals_parse() {
        let program = parse_source(r#"let o = { a: 1, b: 2 }; let arr = [1, 2, 3];"#).unwrap();
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn recovers_after_an_error_and_reports_the_first_one() {
        let mut handler = Handler::new();
        let tokens = msl_lex::tokenize("let = 1; let y = 2;", &mut handler);
        let result = parse(tokens, &mut handler);
        assert!(result.is_err());
        assert!(handler.has_errors());
    }

    #[test]
    fn literal_null_parses() {
        let program = parse_source("null;").unwrap();
        match &program.statements[0] {
            Stmt::Expression(stmt) => {
                assert!(matches!(stmt.expr, Expr::Literal(ref l) if l.value == LiteralValue::Null))
            }
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }
}
