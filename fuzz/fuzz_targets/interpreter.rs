#![no_main]

use core::fmt;

use itertools::Itertools;
use kotlite::{EvaluationContext, InterpreterConfig};
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};

// Names are drawn from a small pool so declarations and uses collide often
#[derive(Arbitrary, Debug, Clone, Copy)]
enum Name { A, B, C, F, G }

impl fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            Name::A => "a",
            Name::B => "b",
            Name::C => "c",
            Name::F => "f",
            Name::G => "g",
        })
    }
}

#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzType { Int, String, Boolean }

impl fmt::Display for FuzzType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            FuzzType::Int => "Int",
            FuzzType::String => "String",
            FuzzType::Boolean => "Boolean",
        })
    }
}

#[derive(Arbitrary, Debug)]
enum FuzzExpr {
    Int(i64),
    Text(String),
    Boolean(bool),
    Variable(Name),
    Call(Name, Vec<FuzzExpr>),
    ReadLine,
    Negate(Box<FuzzExpr>),
    Not(Box<FuzzExpr>),
    Binary(Box<FuzzExpr>, Operator, Box<FuzzExpr>),
}

#[derive(Arbitrary, Debug, Clone, Copy)]
enum Operator {
    Add, Sub, Mul, Div,
    Eq, NotEq, Less, LessEq, Greater, GreaterEq,
    And, Or,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::Less => "<",
            Operator::LessEq => "<=",
            Operator::Greater => ">",
            Operator::GreaterEq => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
        })
    }
}

impl fmt::Display for FuzzExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FuzzExpr::Int(value) => write!(f, "{}", value.unsigned_abs()),
            FuzzExpr::Text(value) => write!(f, "\"{}\"", value.replace(['"', '\\', '\n'], "")),
            FuzzExpr::Boolean(value) => write!(f, "{}", value),
            FuzzExpr::Variable(name) => write!(f, "{}", name),
            FuzzExpr::Call(name, arguments) => write!(f, "{}({})", name, arguments.iter().join(", ")),
            FuzzExpr::ReadLine => write!(f, "readLine()"),
            FuzzExpr::Negate(operand) => write!(f, "-({})", operand),
            FuzzExpr::Not(operand) => write!(f, "!({})", operand),
            FuzzExpr::Binary(left, operator, right) => write!(f, "({}) {} ({})", left, operator, right),
        }
    }
}

#[derive(Arbitrary, Debug)]
enum FuzzStmt {
    Val(Name, Option<FuzzType>, FuzzExpr),
    Var(Name, Option<FuzzType>, FuzzExpr),
    Assign(Name, FuzzExpr),
    Function(Name, Vec<(Name, FuzzType)>, Option<(FuzzType, FuzzExpr)>, Vec<FuzzStmt>),
    If(FuzzExpr, Vec<FuzzStmt>, Option<Vec<FuzzStmt>>),
    While(FuzzExpr, Vec<FuzzStmt>),
    For(Name, FuzzExpr, bool, FuzzExpr, Option<FuzzExpr>, Vec<FuzzStmt>),
    Println(FuzzExpr),
    Call(Name, Vec<FuzzExpr>),
}

fn block(statements: &[FuzzStmt]) -> String {
    statements.iter().map(FuzzStmt::to_string).join("\n")
}

fn annotation(ty: &Option<FuzzType>) -> String {
    ty.map(|ty| format!(": {}", ty)).unwrap_or_default()
}

impl fmt::Display for FuzzStmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FuzzStmt::Val(name, ty, value) => write!(f, "val {}{} = {}", name, annotation(ty), value),
            FuzzStmt::Var(name, ty, value) => write!(f, "var {}{} = {}", name, annotation(ty), value),
            FuzzStmt::Assign(name, value) => write!(f, "{} = {}", name, value),
            FuzzStmt::Function(name, parameters, returns, body) => {
                let parameters = parameters.iter().map(|(name, ty)| format!("{}: {}", name, ty)).join(", ");
                match returns {
                    Some((ty, value)) => write!(f, "fun {}({}): {} {{\n{}\nreturn {}\n}}", name, parameters, ty, block(body), value),
                    None => write!(f, "fun {}({}) {{\n{}\n}}", name, parameters, block(body)),
                }
            }
            FuzzStmt::If(condition, then_branch, else_branch) => {
                write!(f, "if ({}) {{\n{}\n}}", condition, block(then_branch))?;
                match else_branch {
                    Some(else_branch) => write!(f, " else {{\n{}\n}}", block(else_branch)),
                    None => Ok(()),
                }
            }
            FuzzStmt::While(condition, body) => write!(f, "while ({}) {{\n{}\n}}", condition, block(body)),
            FuzzStmt::For(variable, start, descending, end, step, body) => {
                let range = if *descending { "downTo" } else { ".." };
                let step = step.as_ref().map(|step| format!(" step {}", step)).unwrap_or_default();
                write!(f, "for ({} in {} {} {}{}) {{\n{}\n}}", variable, start, range, end, step, block(body))
            }
            FuzzStmt::Println(value) => write!(f, "println({})", value),
            FuzzStmt::Call(name, arguments) => write!(f, "{}({})", name, arguments.iter().join(", ")),
        }
    }
}

fuzz_target!(|input: (Vec<FuzzStmt>, Vec<FuzzStmt>)| {
    let (declarations, body) = input;
    let source = format!("{}\nfun main() {{\n{}\n}}", block(&declarations), block(&body));

    let config = InterpreterConfig::default().with_iteration_limit(50);
    let mut context = EvaluationContext::new("line\n".as_bytes(), std::io::sink()).with_config(config);
    let _ = context.evaluate_str(&source);
});
