mod ast;
mod builtin;
mod config;
mod context;
mod error;
mod interpreter;
mod lexer;
mod parser;
mod scope;
mod value;

#[cfg(test)]
mod test_utils;

pub use ast::{BinaryOperator, Direction, Expr, FunctionDeclaration, Mutability, Parameter, Script, Stmt, UnaryOperator};
pub use config::InterpreterConfig;
pub use context::EvaluationContext;
pub use error::{ScriptError, SyntaxError};
pub use lexer::{tokenize, Spanned, Token};
pub use parser::{parse, Parsed, Parser};
pub use value::{Type, Value};
