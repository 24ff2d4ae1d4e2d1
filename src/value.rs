use core::fmt;


/// Kind tag of a runtime value. Type annotations in source can only name the
/// first three; `Unit` is what a procedure call evaluates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    String,
    Boolean,
    Unit,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            Self::Int => "Int",
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::Unit => "Unit",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Text(String),
    Boolean(bool),
    Unit,
}

impl Value {
    pub fn kind(&self) -> Type {
        match self {
            Self::Int(_) => Type::Int,
            Self::Text(_) => Type::String,
            Self::Boolean(_) => Type::Boolean,
            Self::Unit => Type::Unit,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => value.fmt(f),
            Self::Text(value) => value.fmt(f),
            Self::Boolean(value) => value.fmt(f),
            Self::Unit => write!(f, "Unit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printed_forms() {
        assert_eq!(Value::Int(-42).to_string(), "-42");
        assert_eq!(Value::Text("hi".to_owned()).to_string(), "hi");
        assert_eq!(Value::Boolean(false).to_string(), "false");
        assert_eq!(Value::Unit.to_string(), "Unit");
    }

    #[test]
    fn kinds_follow_the_variant() {
        assert_eq!(Value::Int(0).kind(), Type::Int);
        assert_eq!(Value::Text(String::new()).kind(), Type::String);
        assert_eq!(Value::Boolean(true).kind(), Type::Boolean);
        assert_eq!(Value::Unit.kind(), Type::Unit);
    }
}
