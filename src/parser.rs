use tracing::{debug, warn};

use crate::{
    ast::{BinaryOperator, Direction, Expr, FunctionDeclaration, Mutability, Parameter, Script, Stmt, UnaryOperator},
    error::SyntaxError,
    lexer::{tokenize, Spanned, Token},
    value::{Type, Value},
};


type ParseResult<O> = Result<O, SyntaxError>;

// Bounds the recursion of blocks, parenthesized expressions and unary chains
const MAX_NESTING: usize = 100;

/// Statements swallowed by error recovery are absent from `script`.
#[derive(Debug, Default)]
pub struct Parsed {
    pub script: Script,
    pub errors: Vec<SyntaxError>,
}

impl Parsed {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn parse(input: &str) -> Parsed {
    let (tokens, mut errors) = tokenize(input);

    let mut parser = Parser::new(&tokens);
    let script = parser.parse_script();
    errors.extend(parser.errors);

    Parsed { script, errors }
}

fn additive_operator(token: &Token<'_>) -> Option<BinaryOperator> {
    match token {
        Token::Plus => Some(BinaryOperator::Add),
        Token::Minus => Some(BinaryOperator::Subtract),
        _ => None,
    }
}

fn multiplicative_operator(token: &Token<'_>) -> Option<BinaryOperator> {
    match token {
        Token::Times => Some(BinaryOperator::Multiply),
        Token::Divide => Some(BinaryOperator::Divide),
        _ => None,
    }
}

fn relational_operator(token: &Token<'_>) -> Option<BinaryOperator> {
    match token {
        Token::Less => Some(BinaryOperator::Less),
        Token::LessEquals => Some(BinaryOperator::LessEquals),
        Token::Greater => Some(BinaryOperator::Greater),
        Token::GreaterEquals => Some(BinaryOperator::GreaterEquals),
        _ => None,
    }
}

fn equality_operator(token: &Token<'_>) -> Option<BinaryOperator> {
    match token {
        Token::Equals => Some(BinaryOperator::Equals),
        Token::NotEquals => Some(BinaryOperator::NotEquals),
        _ => None,
    }
}

fn and_operator(token: &Token<'_>) -> Option<BinaryOperator> {
    matches!(token, Token::And).then_some(BinaryOperator::And)
}

fn or_operator(token: &Token<'_>) -> Option<BinaryOperator> {
    matches!(token, Token::Or).then_some(BinaryOperator::Or)
}

/// Recursive-descent parser over a scanned token slice.
///
/// Precedence, lowest to highest: `||`, `&&`, `== !=`, `< <= > >=`
/// (non-associative), `+ -`, `* /`, unary `! -`. Binary levels are
/// left-associative.
pub struct Parser<'t, 'a> {
    tokens: &'t [Spanned<'a>],
    position: usize,
    depth: usize,
    errors: Vec<SyntaxError>,
}

impl<'t, 'a> Parser<'t, 'a> {
    pub fn new(tokens: &'t [Spanned<'a>]) -> Self {
        Self { tokens, position: 0, depth: 0, errors: Vec::new() }
    }

    /// Parses the whole token stream. A syntax error inside a statement is
    /// reported, the parser resynchronizes past the next `}`, and parsing
    /// resumes from there.
    pub fn parse_script(&mut self) -> Script {
        let mut statements = vec![];

        if self.tokens.is_empty() {
            self.report(SyntaxError::UnexpectedEof);
        }

        while self.peek().is_some() {
            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(error) => {
                    let at_end = error == SyntaxError::UnexpectedEof;
                    self.report(error);
                    if at_end { break; }
                    self.synchronize();
                }
            }
        }

        Script { statements }
    }

    fn report(&mut self, error: SyntaxError) {
        warn!("{}", error);
        self.errors.push(error);
    }

    fn synchronize(&mut self) {
        let start = self.position;
        self.advance();
        while let Some(spanned) = self.advance() {
            if spanned.token == Token::RightBrace { break; }
        }
        debug!(skipped = self.position - start, "resynchronized after syntax error");
    }

    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            let line = self.peek().or(self.tokens.last()).map_or(1, |spanned| spanned.line);
            return Err(SyntaxError::NestingTooDeep { line });
        }

        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&'t Spanned<'a>> {
        let tokens = self.tokens;
        tokens.get(self.position)
    }

    fn peek_token(&self) -> Option<&'t Token<'a>> {
        self.peek().map(|spanned| &spanned.token)
    }

    fn peek_second(&self) -> Option<&'t Token<'a>> {
        let tokens = self.tokens;
        tokens.get(self.position + 1).map(|spanned| &spanned.token)
    }

    fn advance(&mut self) -> Option<&'t Spanned<'a>> {
        let spanned = self.peek();
        if spanned.is_some() { self.position += 1; }
        spanned
    }

    fn unexpected(&self) -> SyntaxError {
        match self.peek() {
            Some(spanned) => SyntaxError::UnexpectedToken { found: spanned.token.to_string(), line: spanned.line },
            None => SyntaxError::UnexpectedEof,
        }
    }

    fn check(&self, expected: &Token<'a>) -> bool {
        self.peek_token().is_some_and(|token| token == expected)
    }

    fn eat(&mut self, expected: &Token<'a>) -> bool {
        let found = self.check(expected);
        if found { self.position += 1; }
        found
    }

    fn expect(&mut self, expected: &Token<'a>) -> ParseResult<&'t Spanned<'a>> {
        if !self.check(expected) { return Err(self.unexpected()); }
        self.advance().ok_or(SyntaxError::UnexpectedEof)
    }

    fn expect_identifier(&mut self) -> ParseResult<(String, usize)> {
        match self.peek() {
            Some(Spanned { token: Token::Identifier(name), line }) => {
                self.position += 1;
                Ok((name.to_string(), *line))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_type(&mut self) -> ParseResult<Type> {
        let ty = match self.peek_token() {
            Some(Token::IntType) => Type::Int,
            Some(Token::StringType) => Type::String,
            Some(Token::BooleanType) => Type::Boolean,
            _ => return Err(self.unexpected()),
        };
        self.position += 1;
        Ok(ty)
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let statement = match self.peek_token() {
            None => return Err(SyntaxError::UnexpectedEof),
            Some(Token::Val | Token::Var) => self.parse_variable_declaration()?,
            Some(Token::Fun) => Stmt::Function(self.parse_function_declaration()?),
            Some(Token::If) => self.parse_if()?,
            Some(Token::While) => self.parse_while()?,
            Some(Token::For) => self.parse_for()?,
            Some(Token::Println) => self.parse_println()?,
            Some(Token::ReadLine) => Stmt::Expression(self.parse_read_line()?),
            Some(Token::Identifier(_)) => match self.peek_second() {
                Some(Token::Assign) => self.parse_assignment()?,
                Some(Token::LeftParen) => Stmt::Expression(self.parse_call()?),
                _ => {
                    self.position += 1;
                    return Err(self.unexpected());
                }
            },
            Some(_) => return Err(self.unexpected()),
        };

        self.eat(&Token::Semicolon);
        Ok(statement)
    }

    fn parse_variable_declaration(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance().ok_or(SyntaxError::UnexpectedEof)?;
        let mutability = match keyword.token {
            Token::Val => Mutability::Val,
            _ => Mutability::Var,
        };

        let (name, _) = self.expect_identifier()?;
        let ty = if self.eat(&Token::Colon) { Some(self.parse_type()?) } else { None };
        self.expect(&Token::Assign)?;
        let initializer = self.parse_expression()?;

        Ok(Stmt::VariableDeclaration { mutability, name, ty, initializer, line: keyword.line })
    }

    fn parse_assignment(&mut self) -> ParseResult<Stmt> {
        let (name, line) = self.expect_identifier()?;
        self.expect(&Token::Assign)?;
        let value = self.parse_expression()?;

        Ok(Stmt::Assignment { name, value, line })
    }

    fn parse_parameters(&mut self) -> ParseResult<Vec<Parameter>> {
        let mut parameters = vec![];
        if self.check(&Token::RightParen) { return Ok(parameters); }

        loop {
            let (name, _) = self.expect_identifier()?;
            self.expect(&Token::Colon)?;
            let ty = self.parse_type()?;
            parameters.push(Parameter { name, ty });

            if !self.eat(&Token::Comma) { return Ok(parameters); }
        }
    }

    fn parse_function_declaration(&mut self) -> ParseResult<FunctionDeclaration> {
        let line = self.expect(&Token::Fun)?.line;
        let (name, _) = self.expect_identifier()?;

        self.expect(&Token::LeftParen)?;
        let parameters = self.parse_parameters()?;
        self.expect(&Token::RightParen)?;

        let return_type = if self.eat(&Token::Colon) { Some(self.parse_type()?) } else { None };
        let (body, return_expression) = match return_type {
            Some(_) => {
                let (body, expression) = self.parse_block_with_return()?;
                (body, Some(expression))
            }
            None => (self.parse_block()?, None),
        };

        Ok(FunctionDeclaration { name, parameters, return_type, body, return_expression, line })
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(&Token::LeftBrace)?;

        self.nested(|parser| {
            let mut statements = vec![];
            while !parser.eat(&Token::RightBrace) {
                statements.push(parser.parse_statement()?);
            }
            Ok(statements)
        })
    }

    fn parse_block_with_return(&mut self) -> ParseResult<(Vec<Stmt>, Expr)> {
        self.expect(&Token::LeftBrace)?;
        self.nested(Self::parse_block_with_return_body)
    }

    // The return expression must close the block
    fn parse_block_with_return_body(&mut self) -> ParseResult<(Vec<Stmt>, Expr)> {
        let mut statements = vec![];
        while !self.eat(&Token::Return) {
            if self.check(&Token::RightBrace) { return Err(self.unexpected()); }
            statements.push(self.parse_statement()?);
        }

        let expression = self.parse_expression()?;
        self.eat(&Token::Semicolon);
        self.expect(&Token::RightBrace)?;

        Ok((statements, expression))
    }

    fn parse_condition(&mut self) -> ParseResult<Expr> {
        self.expect(&Token::LeftParen)?;
        let condition = self.parse_expression()?;
        self.expect(&Token::RightParen)?;
        Ok(condition)
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let line = self.expect(&Token::If)?.line;
        let condition = self.parse_condition()?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.eat(&Token::Else) { Some(self.parse_block()?) } else { None };

        Ok(Stmt::If { condition, then_branch, else_branch, line })
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let line = self.expect(&Token::While)?.line;
        let condition = self.parse_condition()?;
        let body = self.parse_block()?;

        Ok(Stmt::While { condition, body, line })
    }

    fn parse_for(&mut self) -> ParseResult<Stmt> {
        let line = self.expect(&Token::For)?.line;
        self.expect(&Token::LeftParen)?;
        let (variable, _) = self.expect_identifier()?;
        self.expect(&Token::In)?;

        let start = self.parse_expression()?;
        let direction = match self.peek_token() {
            Some(Token::Range) => Direction::Ascending,
            Some(Token::DownTo) => Direction::Descending,
            _ => return Err(self.unexpected()),
        };
        self.position += 1;
        let end = self.parse_expression()?;
        let step = if self.eat(&Token::Step) { Some(self.parse_expression()?) } else { None };

        self.expect(&Token::RightParen)?;
        let body = self.parse_block()?;

        Ok(Stmt::For { variable, start, direction, end, step, body, line })
    }

    fn parse_println(&mut self) -> ParseResult<Stmt> {
        let line = self.expect(&Token::Println)?.line;
        let argument = self.parse_condition()?;

        Ok(Stmt::Println { argument, line })
    }

    fn parse_read_line(&mut self) -> ParseResult<Expr> {
        let line = self.expect(&Token::ReadLine)?.line;
        self.expect(&Token::LeftParen)?;
        self.expect(&Token::RightParen)?;

        Ok(Expr::ReadLine { line })
    }

    fn parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut arguments = vec![];
        if self.check(&Token::RightParen) { return Ok(arguments); }

        loop {
            arguments.push(self.parse_expression()?);
            if !self.eat(&Token::Comma) { return Ok(arguments); }
        }
    }

    fn parse_call(&mut self) -> ParseResult<Expr> {
        let (name, line) = self.expect_identifier()?;
        self.expect(&Token::LeftParen)?;
        let arguments = self.parse_arguments()?;
        self.expect(&Token::RightParen)?;

        Ok(Expr::Call { name, arguments, line })
    }

    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.nested(Self::parse_or)
    }

    fn parse_left_associative(
        &mut self,
        operand: fn(&mut Self) -> ParseResult<Expr>,
        recognizer: fn(&Token<'_>) -> Option<BinaryOperator>,
    ) -> ParseResult<Expr> {
        let mut left = operand(self)?;

        while let Some(operator) = self.peek().and_then(|spanned| recognizer(&spanned.token).map(|op| (op, spanned.line))) {
            let (operator, line) = operator;
            self.position += 1;
            let right = operand(self)?;
            left = Expr::Binary { operator, left: Box::new(left), right: Box::new(right), line };
        }

        Ok(left)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        self.parse_left_associative(Self::parse_and, or_operator)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        self.parse_left_associative(Self::parse_equality, and_operator)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        self.parse_left_associative(Self::parse_relational, equality_operator)
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let left = self.parse_additive()?;

        let Some(spanned) = self.peek() else { return Ok(left) };
        let Some(operator) = relational_operator(&spanned.token) else { return Ok(left) };
        self.position += 1;
        let right = self.parse_additive()?;

        // `a < b < c` has no meaning
        if self.peek_token().and_then(relational_operator).is_some() {
            return Err(self.unexpected());
        }

        Ok(Expr::Binary { operator, left: Box::new(left), right: Box::new(right), line: spanned.line })
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        self.parse_left_associative(Self::parse_multiplicative, additive_operator)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        self.parse_left_associative(Self::parse_unary, multiplicative_operator)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let operator = match self.peek_token() {
            Some(Token::Not) => UnaryOperator::Not,
            Some(Token::Minus) => UnaryOperator::Negate,
            _ => return self.parse_primary(),
        };
        let line = self.advance().map_or(0, |spanned| spanned.line);
        let operand = self.nested(Self::parse_unary)?;

        Ok(Expr::Unary { operator, operand: Box::new(operand), line })
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let Some(spanned) = self.peek() else { return Err(SyntaxError::UnexpectedEof) };
        let line = spanned.line;

        let value = match &spanned.token {
            Token::Integer(value) => Value::Int(*value),
            Token::Text(value) => Value::Text(value.to_string()),
            Token::Boolean(value) => Value::Boolean(*value),
            Token::ReadLine => return self.parse_read_line(),
            Token::Identifier(name) => {
                if self.peek_second() == Some(&Token::LeftParen) { return self.parse_call(); }
                self.position += 1;
                return Ok(Expr::Identifier { name: name.to_string(), line });
            }
            Token::LeftParen => return self.parse_condition(),
            _ => return Err(self.unexpected()),
        };

        self.position += 1;
        Ok(Expr::Literal { value, line })
    }
}
