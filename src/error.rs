use core::{error::Error, fmt};



/// Diagnostics produced while turning source text into an AST. None of these
/// abort the parse: the lexer skips illegal characters and the parser
/// resynchronizes at the next closing brace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    IllegalCharacter { found: String, line: usize },
    UnterminatedComment { line: usize },
    UnexpectedToken { found: String, line: usize },
    NestingTooDeep { line: usize },
    UnexpectedEof,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IllegalCharacter { found, line } => write!(f, "Illegal character '{}' at line {}", found, line),
            Self::UnterminatedComment { line } => write!(f, "Unterminated comment starting at line {}", line),
            Self::UnexpectedToken { found, line } => write!(f, "Syntax error at '{}' (line {})", found, line),
            Self::NestingTooDeep { line } => write!(f, "Nesting too deep (line {})", line),
            Self::UnexpectedEof => write!(f, "Syntax error at EOF"),
        }
    }
}

impl Error for SyntaxError {}

/// Failures raised while evaluating a script. Every one of them aborts the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    MissingOrDuplicateMain { count: usize },
    DuplicateDeclaration { name: String, line: usize },
    DuplicateParameter { name: String, line: usize },
    UndeclaredVariable { name: String, line: usize },
    ImmutableReassignment { name: String, line: usize },
    TypeMismatch { details: String, line: usize },
    ControlFlowTypeError { construct: &'static str, found: String, line: usize },
    ArityOrOverloadMismatch { name: String, signature: String, line: usize },
    DivisionByZero { line: usize },
    IntegerOverflow { line: usize },
    InvalidStep { step: i64, line: usize },
    RuntimeLimitExceeded { construct: &'static str, limit: usize, line: usize },
    TopLevelViolation { line: usize },
    Io { message: String, line: usize },
}

impl ScriptError {
    /// Stable name of the failure kind, independent of its payload.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MissingOrDuplicateMain { .. } => "MissingOrDuplicateMain",
            Self::DuplicateDeclaration { .. } => "DuplicateDeclaration",
            Self::DuplicateParameter { .. } => "DuplicateParameter",
            Self::UndeclaredVariable { .. } => "UndeclaredVariable",
            Self::ImmutableReassignment { .. } => "ImmutableReassignment",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::ControlFlowTypeError { .. } => "ControlFlowTypeError",
            Self::ArityOrOverloadMismatch { .. } => "ArityOrOverloadMismatch",
            Self::DivisionByZero { .. } => "DivisionByZero",
            Self::IntegerOverflow { .. } => "IntegerOverflow",
            Self::InvalidStep { .. } => "InvalidStep",
            Self::RuntimeLimitExceeded { .. } => "RuntimeLimitExceeded",
            Self::TopLevelViolation { .. } => "TopLevelViolation",
            Self::Io { .. } => "Io",
        }
    }

    /// Source line that triggered the failure, if the failure has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MissingOrDuplicateMain { .. } => None,
            Self::DuplicateDeclaration { line, .. }
            | Self::DuplicateParameter { line, .. }
            | Self::UndeclaredVariable { line, .. }
            | Self::ImmutableReassignment { line, .. }
            | Self::TypeMismatch { line, .. }
            | Self::ControlFlowTypeError { line, .. }
            | Self::ArityOrOverloadMismatch { line, .. }
            | Self::DivisionByZero { line }
            | Self::IntegerOverflow { line }
            | Self::InvalidStep { line, .. }
            | Self::RuntimeLimitExceeded { line, .. }
            | Self::TopLevelViolation { line }
            | Self::Io { line, .. } => Some(*line),
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingOrDuplicateMain { count } =>
                write!(f, "Exactly one main function is required, found {}", count),
            Self::DuplicateDeclaration { name, line } =>
                write!(f, "'{}' already declared in this scope, line {}", name, line),
            Self::DuplicateParameter { name, line } =>
                write!(f, "Parameter names must be unique, '{}' repeated, line {}", name, line),
            Self::UndeclaredVariable { name, line } =>
                write!(f, "Variable '{}' not declared, line {}", name, line),
            Self::ImmutableReassignment { name, line } =>
                write!(f, "Variable '{}' is declared with 'val' and cannot be assigned, line {}", name, line),
            Self::TypeMismatch { details, line } =>
                write!(f, "Type mismatch: {}, line {}", details, line),
            Self::ControlFlowTypeError { construct, found, line } =>
                write!(f, "The condition of '{}' must be Boolean, got {}, line {}", construct, found, line),
            Self::ArityOrOverloadMismatch { name, signature, line } =>
                write!(f, "No function '{}' accepting ({}), line {}", name, signature, line),
            Self::DivisionByZero { line } =>
                write!(f, "Division by zero, line {}", line),
            Self::IntegerOverflow { line } =>
                write!(f, "Integer overflow, line {}", line),
            Self::InvalidStep { step, line } =>
                write!(f, "Step must be positive, got {}, line {}", step, line),
            Self::RuntimeLimitExceeded { construct: "call", limit, line } =>
                write!(f, "Calls nested deeper than {}, possible infinite recursion, line {}", limit, line),
            Self::RuntimeLimitExceeded { construct, limit, line } =>
                write!(f, "'{}' loop exceeded {} iterations, possible infinite loop, line {}", construct, limit, line),
            Self::TopLevelViolation { line } =>
                write!(f, "Only declarations are allowed outside a function body, line {}", line),
            Self::Io { message, line } =>
                write!(f, "I/O failure: {}, line {}", message, line),
        }
    }
}

impl Error for ScriptError {}
