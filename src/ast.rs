use crate::value::{Type, Value};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Val,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `..`
    Ascending,
    /// `downTo`
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equals,
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal { value: Value, line: usize },
    Identifier { name: String, line: usize },
    Unary { operator: UnaryOperator, operand: Box<Expr>, line: usize },
    Binary { operator: BinaryOperator, left: Box<Expr>, right: Box<Expr>, line: usize },
    Call { name: String, arguments: Vec<Expr>, line: usize },
    ReadLine { line: usize },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Self::Literal { line, .. }
            | Self::Identifier { line, .. }
            | Self::Unary { line, .. }
            | Self::Binary { line, .. }
            | Self::Call { line, .. }
            | Self::ReadLine { line } => *line,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<Type>,
    pub body: Vec<Stmt>,
    /// Trailing `return` of a function with a declared return type, kept apart
    /// from the executable body.
    pub return_expression: Option<Expr>,
    pub line: usize,
}

impl FunctionDeclaration {
    /// Only a bare `fun main() { ... }` counts as the entry point.
    pub fn is_main(&self) -> bool {
        self.name == "main" && self.parameters.is_empty() && self.return_type.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VariableDeclaration {
        mutability: Mutability,
        name: String,
        ty: Option<Type>,
        initializer: Expr,
        line: usize,
    },
    Assignment { name: String, value: Expr, line: usize },
    Function(FunctionDeclaration),
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
        line: usize,
    },
    While { condition: Expr, body: Vec<Stmt>, line: usize },
    For {
        variable: String,
        start: Expr,
        direction: Direction,
        end: Expr,
        step: Option<Expr>,
        body: Vec<Stmt>,
        line: usize,
    },
    /// A function call or `readLine()` used as a statement.
    Expression(Expr),
    Println { argument: Expr, line: usize },
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Self::VariableDeclaration { line, .. }
            | Self::Assignment { line, .. }
            | Self::If { line, .. }
            | Self::While { line, .. }
            | Self::For { line, .. }
            | Self::Println { line, .. } => *line,
            Self::Function(declaration) => declaration.line,
            Self::Expression(expression) => expression.line(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub statements: Vec<Stmt>,
}
