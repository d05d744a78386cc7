//! The syntax tree produced by the parser
//!
//! Expressions and statements are two disjoint sums. Every child is uniquely
//! owned; there are no back-pointers. Operators keep their textual spelling
//! (`"+"`, `"<="`, `"&&"`, …), which the code generator matches on.

use std::borrow::Cow;
use std::{fmt, io};

use ptree::{print_tree, Style, TreeItem};

pub type Ident = String;

/// An ordered sequence of top-level statements
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    NumberLit(i32),
    BoolLit(bool),
    Var(Ident),

    BinOp {
        op: String,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    UnaryOp {
        op: String,
        operand: Box<Expression>,
    },

    Call {
        function: Ident,
        args: Vec<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    VarDecl {
        name: Ident,
        initializer: Option<Expression>,
    },

    Assign {
        name: Ident,
        value: Expression,
    },

    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },

    While {
        condition: Expression,
        body: Box<Statement>,
    },

    Block(Vec<Statement>),

    /// The body holds the statements of the function's block directly,
    /// so a declaration can never carry a bare statement as its body.
    FnDecl {
        name: Ident,
        params: Vec<Ident>,
        body: Vec<Statement>,
    },

    Return(Option<Expression>),

    ExprStmt(Expression),
}

impl Program {
    /// Render the tree to stdout, one top-level statement per root
    pub fn pretty_print(&self) -> io::Result<()> {
        for stmt in &self.statements {
            print_tree(&AstNode::Stmt(stmt))?;
        }
        Ok(())
    }
}

/// A borrowed view of either tree category, so one [TreeItem] covers both
#[derive(Clone, Copy)]
pub enum AstNode<'a> {
    Stmt(&'a Statement),
    Expr(&'a Expression),
}

impl fmt::Display for AstNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Stmt(stmt) => match stmt {
                Statement::VarDecl { name, .. } => write!(f, "VAR {name}"),
                Statement::Assign { name, .. } => write!(f, "ASSIGN {name}"),
                Statement::If { .. } => write!(f, "IF"),
                Statement::While { .. } => write!(f, "WHILE"),
                Statement::Block(_) => write!(f, "BLOCK"),
                Statement::FnDecl { name, params, .. } => {
                    write!(f, "FUNCTION {name}({})", params.join(", "))
                }
                Statement::Return(_) => write!(f, "RETURN"),
                Statement::ExprStmt(_) => write!(f, "EXPR"),
            },
            AstNode::Expr(expr) => match expr {
                Expression::NumberLit(n) => write!(f, "{n}"),
                Expression::BoolLit(b) => write!(f, "{b}"),
                Expression::Var(name) => write!(f, "{name}"),
                Expression::BinOp { op, .. } => write!(f, "{op}"),
                Expression::UnaryOp { op, .. } => write!(f, "unary {op}"),
                Expression::Call { function, .. } => write!(f, "CALL {function}"),
            },
        }
    }
}

impl<'a> TreeItem for AstNode<'a> {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, style: &Style) -> io::Result<()> {
        write!(f, "{}", style.paint(self))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        let children = match self {
            AstNode::Stmt(stmt) => match stmt {
                Statement::VarDecl { initializer, .. } => {
                    initializer.iter().map(AstNode::Expr).collect()
                }
                Statement::Assign { value, .. } => vec![AstNode::Expr(value)],
                Statement::If {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    let mut children = vec![AstNode::Expr(condition), AstNode::Stmt(then_branch)];
                    if let Some(else_branch) = else_branch {
                        children.push(AstNode::Stmt(else_branch));
                    }
                    children
                }
                Statement::While { condition, body } => {
                    vec![AstNode::Expr(condition), AstNode::Stmt(body)]
                }
                Statement::Block(statements) => statements.iter().map(AstNode::Stmt).collect(),
                Statement::FnDecl { body, .. } => body.iter().map(AstNode::Stmt).collect(),
                Statement::Return(value) => value.iter().map(AstNode::Expr).collect(),
                Statement::ExprStmt(expr) => vec![AstNode::Expr(expr)],
            },
            AstNode::Expr(expr) => match expr {
                Expression::NumberLit(_) | Expression::BoolLit(_) | Expression::Var(_) => vec![],
                Expression::BinOp { lhs, rhs, .. } => {
                    vec![AstNode::Expr(lhs), AstNode::Expr(rhs)]
                }
                Expression::UnaryOp { operand, .. } => vec![AstNode::Expr(operand)],
                Expression::Call { args, .. } => args.iter().map(AstNode::Expr).collect(),
            },
        };

        Cow::from(children)
    }
}
