use core::cmp::Ordering;

use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    ast::{BinaryOperator, Direction, Expr, FunctionDeclaration, Mutability, Script, Stmt, UnaryOperator},
    builtin::Console,
    config::InterpreterConfig,
    error::ScriptError,
    scope::{FunctionEntry, ScopeChain, ScopeId, ScopeTag},
    value::{Type, Value},
};


pub(crate) type EvaluationResult = Result<Value, ScriptError>;

fn type_mismatch(details: String, line: usize) -> ScriptError {
    ScriptError::TypeMismatch { details, line }
}

fn evaluate_unary(operator: UnaryOperator, operand: Value, line: usize) -> EvaluationResult {
    match (operator, operand) {
        (UnaryOperator::Negate, Value::Int(value)) =>
            value.checked_neg().map(Value::Int).ok_or(ScriptError::IntegerOverflow { line }),
        (UnaryOperator::Not, Value::Boolean(value)) => Ok(Value::Boolean(!value)),
        (UnaryOperator::Negate, other) =>
            Err(type_mismatch(format!("operand of unary '-' must be Int, got {}", other.kind()), line)),
        (UnaryOperator::Not, other) =>
            Err(type_mismatch(format!("operand of '!' must be Boolean, got {}", other.kind()), line)),
    }
}

fn evaluate_arithmetic(operator: BinaryOperator, left: Value, right: Value, line: usize) -> EvaluationResult {
    // Text on the left absorbs anything on the right
    if let (BinaryOperator::Add, Value::Text(text)) = (operator, &left) {
        return Ok(Value::Text(format!("{}{}", text, right)));
    }

    let (left, right) = match (left, right) {
        (Value::Int(left), Value::Int(right)) => (left, right),
        (left, right) => return Err(type_mismatch(
            format!("both operands must be Int, got {} and {}", left.kind(), right.kind()),
            line,
        )),
    };

    let result = match operator {
        BinaryOperator::Add => left.checked_add(right),
        BinaryOperator::Subtract => left.checked_sub(right),
        BinaryOperator::Multiply => left.checked_mul(right),
        BinaryOperator::Divide => {
            if right == 0 { return Err(ScriptError::DivisionByZero { line }); }
            left.checked_div(right)
        }
        _ => unreachable!("only arithmetic operators are dispatched here"),
    };

    result.map(Value::Int).ok_or(ScriptError::IntegerOverflow { line })
}

fn evaluate_comparison(operator: BinaryOperator, left: Value, right: Value, line: usize) -> EvaluationResult {
    if left.kind() != right.kind() {
        return Err(type_mismatch(format!("cannot compare {} with {}", left.kind(), right.kind()), line));
    }

    let ordering = match operator {
        BinaryOperator::Equals => return Ok(Value::Boolean(left == right)),
        BinaryOperator::NotEquals => return Ok(Value::Boolean(left != right)),
        _ => match (&left, &right) {
            (Value::Int(left), Value::Int(right)) => left.cmp(right),
            (Value::Text(left), Value::Text(right)) => left.cmp(right),
            _ => return Err(type_mismatch(format!("values of type {} are not ordered", left.kind()), line)),
        },
    };

    Ok(Value::Boolean(match operator {
        BinaryOperator::Less => ordering == Ordering::Less,
        BinaryOperator::LessEquals => ordering != Ordering::Greater,
        BinaryOperator::Greater => ordering == Ordering::Greater,
        BinaryOperator::GreaterEquals => ordering != Ordering::Less,
        _ => unreachable!("only ordering operators reach this point"),
    }))
}

fn evaluate_logical(operator: BinaryOperator, left: Value, right: Value, line: usize) -> EvaluationResult {
    match (operator, left, right) {
        (BinaryOperator::And, Value::Boolean(left), Value::Boolean(right)) => Ok(Value::Boolean(left && right)),
        (BinaryOperator::Or, Value::Boolean(left), Value::Boolean(right)) => Ok(Value::Boolean(left || right)),
        (_, left, right) => Err(type_mismatch(
            format!("both operands must be Boolean, got {} and {}", left.kind(), right.kind()),
            line,
        )),
    }
}

fn evaluate_binary(operator: BinaryOperator, left: Value, right: Value, line: usize) -> EvaluationResult {
    match operator {
        BinaryOperator::Add | BinaryOperator::Subtract | BinaryOperator::Multiply | BinaryOperator::Divide
            => evaluate_arithmetic(operator, left, right, line),
        BinaryOperator::Equals | BinaryOperator::NotEquals
        | BinaryOperator::Less | BinaryOperator::LessEquals
        | BinaryOperator::Greater | BinaryOperator::GreaterEquals
            => evaluate_comparison(operator, left, right, line),
        BinaryOperator::And | BinaryOperator::Or => evaluate_logical(operator, left, right, line),
    }
}

fn range_step(current: i64, end: i64, step: i64, direction: Direction) -> Option<i64> {
    match direction {
        Direction::Ascending => current.checked_add(step).filter(|next| *next <= end),
        Direction::Descending => current.checked_sub(step).filter(|next| *next >= end),
    }
}

// Equal bounds run once whichever way the range points
fn range_start(start: i64, end: i64, direction: Direction) -> Option<i64> {
    match (start.cmp(&end), direction) {
        (Ordering::Equal, _)
        | (Ordering::Less, Direction::Ascending)
        | (Ordering::Greater, Direction::Descending) => Some(start),
        _ => None,
    }
}

pub(crate) struct Interpreter<'a, 'io> {
    scopes: ScopeChain<'a>,
    current: ScopeId,
    console: Console<'io>,
    config: InterpreterConfig,
    call_depth: usize,
}

impl<'a, 'io> Interpreter<'a, 'io> {
    pub fn new(config: InterpreterConfig, console: Console<'io>) -> Self {
        let mut scopes = ScopeChain::new();
        let current = scopes.root();
        Self { scopes, current, console, config, call_depth: 0 }
    }

    /// Runs every top-level declaration in a fresh root scope, then calls
    /// `main`.
    pub fn evaluate_script(&mut self, script: &'a Script) -> EvaluationResult {
        let mains = script.statements.iter()
            .filter_map(|statement| match statement {
                Stmt::Function(declaration) if declaration.is_main() => Some(declaration),
                _ => None,
            })
            .collect_vec();
        let [main] = mains[..] else {
            return Err(ScriptError::MissingOrDuplicateMain { count: mains.len() });
        };

        self.current = self.scopes.root();
        self.evaluate_statements(&script.statements)?;
        self.call(&main.name, vec![], main.line)
    }

    fn in_scope<T>(
        &mut self,
        parent: ScopeId,
        tag: ScopeTag,
        f: impl FnOnce(&mut Self) -> Result<T, ScriptError>,
    ) -> Result<T, ScriptError> {
        let caller = self.current;
        let scope = self.scopes.enter(Some(parent), tag);
        self.current = scope;

        let result = f(self);

        self.scopes.exit(scope);
        self.current = caller;
        result
    }

    fn require_function_body(&self, line: usize) -> Result<(), ScriptError> {
        if self.scopes.is_inside_function(self.current) {
            Ok(())
        } else {
            Err(ScriptError::TopLevelViolation { line })
        }
    }

    fn evaluate_statements(&mut self, statements: &'a [Stmt]) -> EvaluationResult {
        let mut result = Value::Unit;
        for statement in statements {
            result = self.evaluate_statement(statement)?;
        }
        Ok(result)
    }

    fn evaluate_statement(&mut self, statement: &'a Stmt) -> EvaluationResult {
        trace!(line = statement.line(), "statement");
        match statement {
            Stmt::VariableDeclaration { mutability, name, ty, initializer, line } =>
                self.evaluate_variable_declaration(*mutability, name, *ty, initializer, *line),
            Stmt::Assignment { name, value, line } => self.evaluate_assignment(name, value, *line),
            Stmt::Function(declaration) => self.evaluate_function_declaration(declaration),
            Stmt::If { condition, then_branch, else_branch, line } =>
                self.evaluate_if(condition, then_branch, else_branch.as_deref(), *line),
            Stmt::While { condition, body, line } => self.evaluate_while(condition, body, *line),
            Stmt::For { variable, start, direction, end, step, body, line } =>
                self.evaluate_for(variable, start, *direction, end, step.as_ref(), body, *line),
            Stmt::Expression(expression) => self.evaluate(expression),
            Stmt::Println { argument, line } => {
                self.require_function_body(*line)?;
                let value = self.evaluate(argument)?;
                self.console.println(&value, *line)?;
                Ok(value)
            }
        }
    }

    fn evaluate_variable_declaration(
        &mut self,
        mutability: Mutability,
        name: &str,
        declared: Option<Type>,
        initializer: &'a Expr,
        line: usize,
    ) -> EvaluationResult {
        let value = self.evaluate(initializer)?;

        let ty = match declared {
            Some(declared) if declared != value.kind() => return Err(type_mismatch(
                format!("'{}' is declared {} but initialized with {}", name, declared, value.kind()),
                line,
            )),
            Some(declared) => declared,
            None => value.kind(),
        };

        self.scopes.declare_variable(self.current, mutability, name, value.clone(), ty, line)?;
        Ok(value)
    }

    fn evaluate_assignment(&mut self, name: &str, expression: &'a Expr, line: usize) -> EvaluationResult {
        self.require_function_body(line)?;
        let value = self.evaluate(expression)?;

        if !self.scopes.lookup_mutable_declared(self.current, name) {
            return Err(if self.scopes.lookup_declared(self.current, name) {
                ScriptError::ImmutableReassignment { name: name.to_owned(), line }
            } else {
                ScriptError::UndeclaredVariable { name: name.to_owned(), line }
            });
        }

        if let Some(declared) = self.scopes.get_type(self.current, name) {
            if declared != value.kind() {
                return Err(type_mismatch(
                    format!("cannot assign {} to '{}' of type {}", value.kind(), name, declared),
                    line,
                ));
            }
        }

        self.scopes.assign_variable(self.current, name, value.clone());
        Ok(value)
    }

    fn evaluate_condition(&mut self, condition: &'a Expr, construct: &'static str, line: usize) -> Result<bool, ScriptError> {
        match self.evaluate(condition)? {
            Value::Boolean(value) => Ok(value),
            other => Err(ScriptError::ControlFlowTypeError { construct, found: other.kind().to_string(), line }),
        }
    }

    fn evaluate_if(
        &mut self,
        condition: &'a Expr,
        then_branch: &'a [Stmt],
        else_branch: Option<&'a [Stmt]>,
        line: usize,
    ) -> EvaluationResult {
        self.require_function_body(line)?;

        if self.evaluate_condition(condition, "if", line)? {
            self.in_scope(self.current, ScopeTag::If, |this| this.evaluate_statements(then_branch))
        } else if let Some(else_branch) = else_branch {
            self.in_scope(self.current, ScopeTag::Else, |this| this.evaluate_statements(else_branch))
        } else {
            Ok(Value::Unit)
        }
    }

    fn check_iteration(&self, iterations: usize, construct: &'static str, line: usize) -> Result<(), ScriptError> {
        let limit = self.config.iteration_limit;
        if iterations >= limit {
            return Err(ScriptError::RuntimeLimitExceeded { construct, limit, line });
        }
        trace!(construct, iteration = iterations + 1, line, "loop iteration");
        Ok(())
    }

    fn evaluate_while(&mut self, condition: &'a Expr, body: &'a [Stmt], line: usize) -> EvaluationResult {
        self.require_function_body(line)?;

        let mut result = Value::Unit;
        let mut iterations = 0;
        while self.evaluate_condition(condition, "while", line)? {
            self.check_iteration(iterations, "while", line)?;
            iterations += 1;
            result = self.in_scope(self.current, ScopeTag::While, |this| this.evaluate_statements(body))?;
        }

        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate_for(
        &mut self,
        variable: &'a str,
        start: &'a Expr,
        direction: Direction,
        end: &'a Expr,
        step: Option<&'a Expr>,
        body: &'a [Stmt],
        line: usize,
    ) -> EvaluationResult {
        self.require_function_body(line)?;

        let start = self.evaluate(start)?;
        let end = self.evaluate(end)?;
        let explicit_step = step.is_some();
        let step = match step {
            Some(step) => self.evaluate(step)?,
            None => Value::Int(1),
        };

        let (start, end, step) = match (start, end, step) {
            (Value::Int(start), Value::Int(end), Value::Int(step)) => (start, end, step),
            (start, end, step) => return Err(type_mismatch(
                format!(
                    "range values must be Int, got start {}, end {}, step {}",
                    start.kind(), end.kind(), step.kind()
                ),
                line,
            )),
        };
        if explicit_step && step <= 0 {
            return Err(ScriptError::InvalidStep { step, line });
        }

        let mut result = Value::Unit;
        let mut iterations = 0;
        let mut next = range_start(start, end, direction);
        while let Some(current) = next {
            self.check_iteration(iterations, "for", line)?;
            iterations += 1;

            result = self.in_scope(self.current, ScopeTag::Variables, |this| {
                this.scopes.declare_variable(this.current, Mutability::Val, variable, Value::Int(current), Type::Int, line)?;
                this.in_scope(this.current, ScopeTag::For, |this| this.evaluate_statements(body))
            })?;
            next = range_step(current, end, step, direction);
        }

        Ok(result)
    }

    fn evaluate_function_declaration(&mut self, declaration: &'a FunctionDeclaration) -> EvaluationResult {
        if let Some(name) = declaration.parameters.iter().map(|parameter| &parameter.name).duplicates().next() {
            return Err(ScriptError::DuplicateParameter { name: name.clone(), line: declaration.line });
        }

        let entry = FunctionEntry {
            name: &declaration.name,
            parameters: &declaration.parameters,
            body: &declaration.body,
            return_type: declaration.return_type,
            return_expression: declaration.return_expression.as_ref(),
            defining_scope: self.current,
        };
        self.scopes.declare_function(self.current, entry, declaration.line)?;

        Ok(Value::Unit)
    }

    // Parameters bind under the defining scope, not the caller's
    fn call(&mut self, name: &str, arguments: Vec<Value>, line: usize) -> EvaluationResult {
        let argument_types = arguments.iter().map(Value::kind).collect_vec();
        let function = self.scopes.resolve_function(self.current, name, &argument_types)
            .ok_or_else(|| ScriptError::ArityOrOverloadMismatch {
                name: name.to_owned(),
                signature: argument_types.iter().join(", "),
                line,
            })?;
        debug!(function = name, signature = %argument_types.iter().join(", "), depth = self.scopes.depth(), "call");

        let limit = self.config.call_depth_limit;
        if self.call_depth >= limit {
            return Err(ScriptError::RuntimeLimitExceeded { construct: "call", limit, line });
        }

        self.call_depth += 1;
        let result = self.in_scope(function.defining_scope, ScopeTag::Variables, |this| {
            for (parameter, value) in function.parameters.iter().zip(arguments) {
                this.scopes.declare_variable(this.current, Mutability::Val, &parameter.name, value, parameter.ty, line)?;
            }

            this.in_scope(this.current, ScopeTag::Function, |this| {
                this.evaluate_statements(function.body)?;

                let returned = match function.return_expression {
                    Some(expression) => this.evaluate(expression)?,
                    None => Value::Unit,
                };
                match function.return_type {
                    Some(expected) if expected != returned.kind() => Err(type_mismatch(
                        format!("function '{}' is expected to return {}, but returned {}", name, expected, returned.kind()),
                        line,
                    )),
                    _ => Ok(returned),
                }
            })
        });
        self.call_depth -= 1;
        result
    }

    fn evaluate(&mut self, expression: &'a Expr) -> EvaluationResult {
        match expression {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Identifier { name, line } => self.scopes.get_value(self.current, name)
                .ok_or_else(|| ScriptError::UndeclaredVariable { name: name.clone(), line: *line }),
            Expr::Unary { operator, operand, line } => {
                let operand = self.evaluate(operand)?;
                evaluate_unary(*operator, operand, *line)
            }
            Expr::Binary { operator, left, right, line } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                evaluate_binary(*operator, left, right, *line)
            }
            Expr::Call { name, arguments, line } => {
                self.require_function_body(*line)?;
                let arguments = arguments.iter()
                    .map(|argument| self.evaluate(argument))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(name, arguments, *line)
            }
            Expr::ReadLine { line } => {
                self.require_function_body(*line)?;
                self.console.read_line(*line)
            }
        }
    }
}
