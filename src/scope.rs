use std::collections::HashMap;

use itertools::Itertools;
use tracing::debug;

use crate::{
    ast::{Expr, Mutability, Parameter, Stmt},
    error::ScriptError,
    value::{Type, Value},
};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeTag {
    Root,
    Function,
    // Call parameters, or a `for` loop variable
    Variables,
    If,
    Else,
    While,
    For,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScopeId(usize);

#[derive(Debug, Clone)]
pub(crate) struct Variable {
    pub mutability: Mutability,
    pub ty: Type,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub(crate) struct FunctionEntry<'a> {
    pub name: &'a str,
    pub parameters: &'a [Parameter],
    pub body: &'a [Stmt],
    pub return_type: Option<Type>,
    pub return_expression: Option<&'a Expr>,
    pub defining_scope: ScopeId,
}

impl<'a> FunctionEntry<'a> {
    fn accepts(&self, argument_types: &[Type]) -> bool {
        self.parameters.len() == argument_types.len()
            && self.parameters.iter().zip(argument_types).all(|(parameter, ty)| parameter.ty == *ty)
    }
}

#[derive(Debug)]
struct Scope<'a> {
    tag: ScopeTag,
    variables: HashMap<String, Variable>,
    // Registration order decides ties between overloads.
    functions: Vec<FunctionEntry<'a>>,
    parent: Option<ScopeId>,
}

/// Every live scope in creation order. Leaving a block truncates its scope
/// away, so a `ScopeId` is valid exactly as long as its block runs.
#[derive(Debug, Default)]
pub(crate) struct ScopeChain<'a> {
    scopes: Vec<Scope<'a>>,
}

impl<'a> ScopeChain<'a> {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn root(&mut self) -> ScopeId {
        self.scopes.clear();
        self.enter(None, ScopeTag::Root)
    }

    pub fn enter(&mut self, parent: Option<ScopeId>, tag: ScopeTag) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope { tag, variables: HashMap::new(), functions: Vec::new(), parent });
        debug!(scope = id.0, ?tag, parent = ?parent.map(|parent| parent.0), "entered scope");
        id
    }

    pub fn exit(&mut self, scope: ScopeId) {
        debug!(scope = scope.0, discarded = self.scopes.len().saturating_sub(scope.0), "left scope");
        self.scopes.truncate(scope.0);
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn get(&self, id: ScopeId) -> &Scope<'a> {
        &self.scopes[id.0]
    }

    fn get_mut(&mut self, id: ScopeId) -> &mut Scope<'a> {
        &mut self.scopes[id.0]
    }

    fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = &Scope<'a>> + '_ {
        std::iter::successors(Some(self.get(id)), move |scope| scope.parent.map(|parent| self.get(parent)))
    }

    fn lookup(&self, id: ScopeId, name: &str) -> Option<&Variable> {
        self.ancestors(id).find_map(|scope| scope.variables.get(name))
    }

    pub fn declare_variable(
        &mut self,
        id: ScopeId,
        mutability: Mutability,
        name: &str,
        value: Value,
        ty: Type,
        line: usize,
    ) -> Result<(), ScriptError> {
        let scope = self.get_mut(id);
        if scope.variables.contains_key(name) {
            return Err(ScriptError::DuplicateDeclaration { name: name.to_owned(), line });
        }

        scope.variables.insert(name.to_owned(), Variable { mutability, ty, value });
        Ok(())
    }

    pub fn assign_variable(&mut self, id: ScopeId, name: &str, value: Value) {
        let mut current = Some(id);
        while let Some(id) = current {
            let scope = self.get_mut(id);
            if let Some(variable) = scope.variables.get_mut(name) {
                variable.value = value;
                return;
            }
            current = scope.parent;
        }
    }

    pub fn lookup_declared(&self, id: ScopeId, name: &str) -> bool {
        self.lookup(id, name).is_some()
    }

    pub fn lookup_mutable_declared(&self, id: ScopeId, name: &str) -> bool {
        self.lookup(id, name).is_some_and(|variable| variable.mutability == Mutability::Var)
    }

    pub fn get_value(&self, id: ScopeId, name: &str) -> Option<Value> {
        self.lookup(id, name).map(|variable| variable.value.clone())
    }

    pub fn get_type(&self, id: ScopeId, name: &str) -> Option<Type> {
        self.lookup(id, name).map(|variable| variable.ty)
    }

    pub fn is_inside_function(&self, id: ScopeId) -> bool {
        self.ancestors(id).any(|scope| scope.tag == ScopeTag::Function)
    }

    pub fn declare_function(&mut self, id: ScopeId, entry: FunctionEntry<'a>, line: usize) -> Result<(), ScriptError> {
        let signature = entry.parameters.iter().map(|parameter| parameter.ty).collect_vec();
        let scope = self.get_mut(id);

        if scope.functions.iter().any(|existing| existing.name == entry.name && existing.accepts(&signature)) {
            return Err(ScriptError::DuplicateDeclaration {
                name: format!("{}({})", entry.name, signature.iter().join(", ")),
                line,
            });
        }

        scope.functions.push(entry);
        Ok(())
    }

    // Within one scope the first registered match wins
    pub fn resolve_function(&self, id: ScopeId, name: &str, argument_types: &[Type]) -> Option<FunctionEntry<'a>> {
        self.ancestors(id)
            .find_map(|scope| scope.functions.iter().find(|entry| entry.name == name && entry.accepts(argument_types)))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_BODY: &[Stmt] = &[];

    fn entry<'a>(name: &'a str, parameters: &'a [Parameter], defining_scope: ScopeId) -> FunctionEntry<'a> {
        FunctionEntry { name, parameters, body: EMPTY_BODY, return_type: None, return_expression: None, defining_scope }
    }

    fn parameter(name: &str, ty: Type) -> Parameter {
        Parameter { name: name.to_owned(), ty }
    }

    #[test]
    fn duplicate_in_same_scope_but_shadowing_allowed() -> anyhow::Result<()> {
        let mut chain = ScopeChain::new();
        let root = chain.root();
        chain.declare_variable(root, Mutability::Val, "x", Value::Int(1), Type::Int, 1)?;

        assert_eq!(
            chain.declare_variable(root, Mutability::Var, "x", Value::Int(2), Type::Int, 2),
            Err(ScriptError::DuplicateDeclaration { name: "x".to_owned(), line: 2 })
        );

        let inner = chain.enter(Some(root), ScopeTag::Function);
        chain.declare_variable(inner, Mutability::Var, "x", Value::Text("shadow".to_owned()), Type::String, 3)?;
        assert_eq!(chain.get_value(inner, "x"), Some(Value::Text("shadow".to_owned())));
        assert_eq!(chain.get_type(inner, "x"), Some(Type::String));
        assert_eq!(chain.get_value(root, "x"), Some(Value::Int(1)));
        Ok(())
    }

    #[test]
    fn assignment_walks_outwards_and_mutability_is_the_nearest_binding() -> anyhow::Result<()> {
        let mut chain = ScopeChain::new();
        let root = chain.root();
        chain.declare_variable(root, Mutability::Var, "counter", Value::Int(0), Type::Int, 1)?;
        let inner = chain.enter(Some(root), ScopeTag::While);

        assert!(chain.lookup_mutable_declared(inner, "counter"));
        chain.assign_variable(inner, "counter", Value::Int(5));
        assert_eq!(chain.get_value(root, "counter"), Some(Value::Int(5)));

        chain.declare_variable(inner, Mutability::Val, "counter", Value::Int(9), Type::Int, 2)?;
        assert!(chain.lookup_declared(inner, "counter"));
        assert!(!chain.lookup_mutable_declared(inner, "counter"));

        chain.assign_variable(inner, "missing", Value::Int(1));
        assert!(!chain.lookup_declared(inner, "missing"));
        Ok(())
    }

    #[test]
    fn exiting_destroys_the_scope_and_its_descendants() -> anyhow::Result<()> {
        let mut chain = ScopeChain::new();
        let root = chain.root();
        let branch = chain.enter(Some(root), ScopeTag::If);
        let nested = chain.enter(Some(branch), ScopeTag::While);
        chain.declare_variable(nested, Mutability::Val, "temp", Value::Boolean(true), Type::Boolean, 1)?;

        chain.exit(branch);
        assert_eq!(chain.depth(), 1);
        assert!(!chain.lookup_declared(root, "temp"));
        Ok(())
    }

    #[test]
    fn inside_function_checks_the_whole_chain() {
        let mut chain = ScopeChain::new();
        let root = chain.root();
        assert!(!chain.is_inside_function(root));

        let function = chain.enter(Some(root), ScopeTag::Function);
        let body = chain.enter(Some(function), ScopeTag::For);
        assert!(chain.is_inside_function(body));
    }

    #[test]
    fn overloads_by_signature() -> anyhow::Result<()> {
        let by_int = [parameter("x", Type::Int)];
        let by_text = [parameter("x", Type::String)];
        let by_int_again = [parameter("y", Type::Int)];

        let mut chain = ScopeChain::new();
        let root = chain.root();
        chain.declare_function(root, entry("f", &by_int, root), 1)?;
        chain.declare_function(root, entry("f", &by_text, root), 2)?;

        assert_eq!(
            chain.declare_function(root, entry("f", &by_int_again, root), 3),
            Err(ScriptError::DuplicateDeclaration { name: "f(Int)".to_owned(), line: 3 })
        );

        let resolved = chain.resolve_function(root, "f", &[Type::String]);
        assert_eq!(resolved.map(|entry| entry.parameters), Some(&by_text[..]));
        assert!(chain.resolve_function(root, "f", &[Type::Int]).is_some());
        assert!(chain.resolve_function(root, "f", &[Type::Boolean]).is_none());
        assert!(chain.resolve_function(root, "f", &[Type::Int, Type::Int]).is_none());
        Ok(())
    }

    #[test]
    fn inner_overload_shadows_outer_only_for_its_own_signature() -> anyhow::Result<()> {
        let outer_int = [parameter("x", Type::Int)];
        let outer_text = [parameter("x", Type::String)];
        let inner_int = [parameter("z", Type::Int)];

        let mut chain = ScopeChain::new();
        let root = chain.root();
        chain.declare_function(root, entry("g", &outer_int, root), 1)?;
        chain.declare_function(root, entry("g", &outer_text, root), 2)?;

        let inner = chain.enter(Some(root), ScopeTag::Function);
        chain.declare_function(inner, entry("g", &inner_int, inner), 3)?;

        let by_int = chain.resolve_function(inner, "g", &[Type::Int]).map(|entry| entry.defining_scope);
        let by_text = chain.resolve_function(inner, "g", &[Type::String]).map(|entry| entry.defining_scope);
        assert_eq!(by_int, Some(inner));
        assert_eq!(by_text, Some(root));
        Ok(())
    }
}
