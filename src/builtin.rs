use std::io::{BufRead, Write};

use crate::{error::ScriptError, value::Value};


/// The two channels a script can talk to: `readLine()` pulls from `input`,
/// `println(..)` pushes to `output`.
pub(crate) struct Console<'io> {
    input: &'io mut dyn BufRead,
    output: &'io mut dyn Write,
}

impl<'io> Console<'io> {
    pub fn new(input: &'io mut dyn BufRead, output: &'io mut dyn Write) -> Self {
        Self { input, output }
    }

    pub fn println(&mut self, value: &Value, line: usize) -> Result<(), ScriptError> {
        writeln!(self.output, "{}", value)
            .and_then(|_| self.output.flush())
            .map_err(|error| ScriptError::Io { message: error.to_string(), line })
    }

    /// Reads one line without its terminator. Hitting end of input is an error.
    pub fn read_line(&mut self, line: usize) -> Result<Value, ScriptError> {
        let mut buffer = String::new();
        let read = self.input.read_line(&mut buffer)
            .map_err(|error| ScriptError::Io { message: error.to_string(), line })?;
        if read == 0 {
            return Err(ScriptError::Io { message: "end of input".to_owned(), line });
        }

        let trimmed = buffer.trim_end_matches(['\n', '\r']).len();
        buffer.truncate(trimmed);
        Ok(Value::Text(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_line_strips_terminators_and_fails_at_end() {
        let mut input = "first\r\nsecond\n".as_bytes();
        let mut output = Vec::new();
        let mut console = Console::new(&mut input, &mut output);

        assert_eq!(console.read_line(1), Ok(Value::Text("first".to_owned())));
        assert_eq!(console.read_line(2), Ok(Value::Text("second".to_owned())));
        assert_eq!(console.read_line(3).map_err(|error| error.name()), Err("Io"));
    }

    #[test]
    fn println_appends_a_newline() -> anyhow::Result<()> {
        let mut input = "".as_bytes();
        let mut output = Vec::new();
        let mut console = Console::new(&mut input, &mut output);

        console.println(&Value::Int(3), 1)?;
        console.println(&Value::Boolean(true), 2)?;
        assert_eq!(String::from_utf8(output)?, "3\ntrue\n");
        Ok(())
    }
}
