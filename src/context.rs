use std::io::{self, BufRead, StdinLock, Stdout, Write};

use tracing::{info, warn};

use crate::{
    ast::Script,
    builtin::Console,
    config::InterpreterConfig,
    error::ScriptError,
    interpreter::Interpreter,
    parser::parse,
    value::Value,
};


/// Runs scripts against a fixed pair of input and output streams.
///
/// Each evaluation starts from an empty root scope, so nothing declared by
/// one script is visible to the next. The streams persist across runs.
pub struct EvaluationContext<R, W> {
    config: InterpreterConfig,
    input: R,
    output: W,
}

impl EvaluationContext<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> EvaluationContext<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { config: InterpreterConfig::default(), input, output }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn evaluate_script(&mut self, script: &Script) -> Result<Value, ScriptError> {
        let console = Console::new(&mut self.input, &mut self.output);
        let mut interpreter = Interpreter::new(self.config.clone(), console);

        let result = interpreter.evaluate_script(script);
        match &result {
            Ok(value) => info!(%value, "script finished"),
            Err(error) => warn!(error = error.name(), line = ?error.line(), "script failed: {}", error),
        }
        result
    }

    /// Parses and runs `source`. Syntax errors are reported through the log
    /// and do not stop evaluation: whatever the parser recovered still runs.
    pub fn evaluate_str(&mut self, source: &str) -> Result<Value, ScriptError> {
        let parsed = parse(source);
        if !parsed.is_clean() {
            warn!(count = parsed.errors.len(), "running a script that had syntax errors");
        }
        self.evaluate_script(&parsed.script)
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_do_not_share_declarations() {
        let mut context = EvaluationContext::new("".as_bytes(), Vec::new());
        assert_eq!(context.evaluate_str("val shared = 1\nfun main() {}"), Ok(Value::Unit));
        assert_eq!(
            context.evaluate_str("fun main() { println(shared) }"),
            Err(ScriptError::UndeclaredVariable { name: "shared".to_owned(), line: 1 })
        );
    }

    #[test]
    fn recovered_statements_still_run() {
        let source = "fun broken() { val = 2 }\nfun main() { println(\"still here\") }";
        let mut context = EvaluationContext::new("".as_bytes(), Vec::new());

        assert_eq!(context.evaluate_str(source), Ok(Value::Unit));
        assert_eq!(context.into_output(), b"still here\n");
    }

    #[test]
    fn input_is_consumed_across_runs() {
        let source = "fun main() { println(readLine()) }";
        let mut context = EvaluationContext::new("one\ntwo\n".as_bytes(), Vec::new())
            .with_config(InterpreterConfig::default().with_iteration_limit(10));

        assert_eq!(context.config().iteration_limit, 10);
        assert!(context.evaluate_str(source).is_ok());
        assert!(context.evaluate_str(source).is_ok());
        assert_eq!(context.evaluate_str(source).map_err(|error| error.name()), Err("Io"));
        assert_eq!(context.into_output(), b"one\ntwo\n");
    }
}
