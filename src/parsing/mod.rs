//! Parsing
//!
//! This module is responsible for turning the source code from its string form
//! into a syntax tree. The main interface is [parse] which takes the token
//! sequence produced by [tokenize] and builds an [ast::Program].
//!
//! Internally, parsing works in two phases:
//! - the [lexer] scans the source text and turns it into a stream of tokens
//! - the [parser] builds the tree from these tokens by recursive descent
//!
//! The lexer is total; malformed input surfaces here, as a [ParseError].

use miette::Diagnostic;
use thiserror::Error;

use crate::ast;

mod lexer;
mod parser;

pub use lexer::{tokenize, Token, TokenKind};

#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A rule required a specific token and found something else
    #[error("Line {line}, Column {column}: {message}. Got '{lexeme}'")]
    UnexpectedToken {
        line: u32,
        column: u32,
        message: String,
        lexeme: String,
    },

    /// No expression alternative matched; also rejects `Unknown` tokens
    #[error("Line {line}, Column {column}: Unexpected token '{lexeme}'")]
    UnexpectedPrimary {
        line: u32,
        column: u32,
        lexeme: String,
    },

    #[error("Line {line}, Column {column}: Number literal out of range. Got '{lexeme}'")]
    InvalidNumber {
        line: u32,
        column: u32,
        lexeme: String,
    },

    #[error("Only identifiers can be called as functions")]
    InvalidCallee,
}

/// Parse a token sequence into a syntax tree
///
/// The sequence must end with the lexer's `Eof` token. The first syntax
/// error aborts parsing; there is no multi-error recovery.
pub fn parse(tokens: Vec<Token>) -> Result<ast::Program, ParseError> {
    parser::Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expression, Program, Statement};

    fn parse_source(src: &str) -> Result<Program, ParseError> {
        parse(tokenize(src))
    }

    fn binop(op: &str, lhs: Expression, rhs: Expression) -> Expression {
        Expression::BinOp {
            op: op.to_string(),
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    #[test]
    fn program() {
        let src = r#"
function main() {
    var x = 3;
    x = x + 1;
    return x;
}
        "#;

        assert_eq!(
            parse_source(src).unwrap(),
            Program {
                statements: vec![Statement::FnDecl {
                    name: String::from("main"),
                    params: vec![],
                    body: vec![
                        Statement::VarDecl {
                            name: String::from("x"),
                            initializer: Some(Expression::NumberLit(3)),
                        },
                        Statement::Assign {
                            name: String::from("x"),
                            value: binop(
                                "+",
                                Expression::Var(String::from("x")),
                                Expression::NumberLit(1)
                            ),
                        },
                        Statement::Return(Some(Expression::Var(String::from("x")))),
                    ],
                }],
            }
        );
    }

    #[test]
    fn empty_program() {
        assert_eq!(parse_source("").unwrap(), Program { statements: vec![] });
    }

    #[test]
    fn parsing_is_deterministic() {
        let src = "function main() { return 1 + 2 * 3; }";
        assert_eq!(parse_source(src).unwrap(), parse_source(src).unwrap());
    }

    #[test]
    fn precedence() {
        // 1 + 2 * 3 == (1 + (2 * 3))
        assert_eq!(
            parse_source("1 + 2 * 3;").unwrap().statements,
            vec![Statement::ExprStmt(binop(
                "+",
                Expression::NumberLit(1),
                binop("*", Expression::NumberLit(2), Expression::NumberLit(3)),
            ))]
        );

        // a || b && c == (a || (b && c))
        assert_eq!(
            parse_source("a || b && c;").unwrap().statements,
            vec![Statement::ExprStmt(binop(
                "||",
                Expression::Var(String::from("a")),
                binop(
                    "&&",
                    Expression::Var(String::from("b")),
                    Expression::Var(String::from("c"))
                ),
            ))]
        );

        // 1 < 2 == 3 < 4 groups the comparisons first
        assert_eq!(
            parse_source("1 < 2 == 3 < 4;").unwrap().statements,
            vec![Statement::ExprStmt(binop(
                "==",
                binop("<", Expression::NumberLit(1), Expression::NumberLit(2)),
                binop("<", Expression::NumberLit(3), Expression::NumberLit(4)),
            ))]
        );
    }

    #[test]
    fn left_associativity() {
        // 1 - 2 - 3 == ((1 - 2) - 3)
        assert_eq!(
            parse_source("1 - 2 - 3;").unwrap().statements,
            vec![Statement::ExprStmt(binop(
                "-",
                binop("-", Expression::NumberLit(1), Expression::NumberLit(2)),
                Expression::NumberLit(3),
            ))]
        );
    }

    #[test]
    fn unary_is_right_associative() {
        assert_eq!(
            parse_source("!-x;").unwrap().statements,
            vec![Statement::ExprStmt(Expression::UnaryOp {
                op: String::from("!"),
                operand: Box::new(Expression::UnaryOp {
                    op: String::from("-"),
                    operand: Box::new(Expression::Var(String::from("x"))),
                }),
            })]
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(
            parse_source("(1 + 2) * 3;").unwrap().statements,
            vec![Statement::ExprStmt(binop(
                "*",
                binop("+", Expression::NumberLit(1), Expression::NumberLit(2)),
                Expression::NumberLit(3),
            ))]
        );
    }

    #[test]
    fn assignment_vs_expression_statement() {
        // leading IDENTIFIER ASSIGN is an assignment…
        assert_eq!(
            parse_source("x = 1;").unwrap().statements,
            vec![Statement::Assign {
                name: String::from("x"),
                value: Expression::NumberLit(1),
            }]
        );

        // …while IDENTIFIER followed by anything else is an expression
        assert_eq!(
            parse_source("x == 1;").unwrap().statements,
            vec![Statement::ExprStmt(binop(
                "==",
                Expression::Var(String::from("x")),
                Expression::NumberLit(1),
            ))]
        );

        assert_eq!(
            parse_source("f(1);").unwrap().statements,
            vec![Statement::ExprStmt(Expression::Call {
                function: String::from("f"),
                args: vec![Expression::NumberLit(1)],
            })]
        );
    }

    #[test]
    fn var_declaration_without_initializer() {
        assert_eq!(
            parse_source("var x;").unwrap().statements,
            vec![Statement::VarDecl {
                name: String::from("x"),
                initializer: None,
            }]
        );
    }

    #[test]
    fn if_without_else() {
        assert_eq!(
            parse_source("if (x) y = 1;").unwrap().statements,
            vec![Statement::If {
                condition: Expression::Var(String::from("x")),
                then_branch: Box::new(Statement::Assign {
                    name: String::from("y"),
                    value: Expression::NumberLit(1),
                }),
                else_branch: None,
            }]
        );
    }

    #[test]
    fn else_binds_to_innermost_if() {
        let program = parse_source("if (a) if (b) x = 1; else x = 2;").unwrap();
        let Statement::If {
            then_branch,
            else_branch: outer_else,
            ..
        } = &program.statements[0]
        else {
            panic!("expected if statement");
        };

        assert!(outer_else.is_none());
        assert!(matches!(
            then_branch.as_ref(),
            Statement::If {
                else_branch: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn function_parameters() {
        assert_eq!(
            parse_source("function add(a, b) { return a + b; }")
                .unwrap()
                .statements,
            vec![Statement::FnDecl {
                name: String::from("add"),
                params: vec![String::from("a"), String::from("b")],
                body: vec![Statement::Return(Some(binop(
                    "+",
                    Expression::Var(String::from("a")),
                    Expression::Var(String::from("b")),
                )))],
            }]
        );
    }

    #[test]
    fn missing_semicolon() {
        let err = parse_source("var x = 1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Line 1, Column 10: Expected ';' after variable declaration. Got ''"
        );
    }

    #[test]
    fn double_equal_fails_at_second_operator() {
        let err = parse_source("a == == b;").unwrap_err();
        assert_eq!(err.to_string(), "Line 1, Column 6: Unexpected token '=='");
    }

    #[test]
    fn only_identifiers_can_be_called() {
        let err = parse_source("1(2);").unwrap_err();
        assert_eq!(err, ParseError::InvalidCallee);
        assert_eq!(err.to_string(), "Only identifiers can be called as functions");

        // a call result is not a callable identifier either
        let err = parse_source("f()(1);").unwrap_err();
        assert_eq!(err, ParseError::InvalidCallee);
    }

    #[test]
    fn trailing_comma_is_rejected() {
        let err = parse_source("f(1,);").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedPrimary { .. }));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = parse_source("a & b;").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Line 1, Column 3: Expected ';' after expression. Got '&'"
        );
    }

    #[test]
    fn number_literal_out_of_range() {
        let err = parse_source("2147483648;").unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { .. }));
    }
}
