//! Recursive-descent parser with panic-mode recovery (§4.2).
//!
//! Each grammar production gets its own method, from `declaration` down
//! to `primary`, in precedence-climbing order — the same shape
//! `faxc-par` uses for its (much larger) grammar, minus the Pratt
//! binding-power table: this grammar is small and fixed enough that
//! spelling out one method per precedence level reads more plainly than
//! a binding-power loop would.

use log::trace;
use msl_ast::*;
use msl_lex::{Token, TokenKind};
use msl_util::{Handler, Span, Symbol};
use std::rc::Rc;

use crate::error::ParseError;

type PResult<T> = Result<T, ParseError>;

pub struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    handler: &'a mut Handler,
}

/// Parses a complete token stream into a [`Program`].
///
/// Every declaration-level error is recorded in `handler` and the
/// parser resynchronizes and keeps going, so a single run surfaces as
/// many errors as it can find — but this function still returns `Err`
/// with the *first* one, matching §4.2's "the first error is re-raised
/// to the driver after recovery so the surrounding run is aborted."
pub fn parse(tokens: Vec<Token>, handler: &mut Handler) -> PResult<Program> {
    let mut parser = Parser::new(tokens, handler);
    let mut statements = Vec::new();
    let mut first_error = None;

    while !parser.is_at_end() {
        match parser.declaration() {
            Ok(stmt) => statements.push(stmt),
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
                parser.synchronize();
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => {
            trace!("parsed {} top-level statements", statements.len());
            Ok(Program { statements })
        }
    }
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token>, handler: &'a mut Handler) -> Self {
        Self { tokens, position: 0, handler }
    }

    // === token stream plumbing ===

    fn peek(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn peek_kind_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.position + offset).map(|t| &t.kind)
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1).min(self.tokens.len() - 1)]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek().kind == *kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> PResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected {context}, found '{}'", self.peek().lexeme)))
        }
    }

    fn error(&mut self, message: impl Into<String>) -> ParseError {
        let span = token_span(self.peek());
        let err = ParseError::new(message, span);
        self.handler.error(err.message.clone(), span);
        err
    }

    /// Advances past a `;`, or up to (not past) the next token that
    /// plausibly starts a new statement (§4.2).
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if matches!(self.previous().kind, TokenKind::Semicolon) {
                return;
            }
            if matches!(
                self.peek().kind,
                TokenKind::Let
                    | TokenKind::For
                    | TokenKind::If
                    | TokenKind::While
                    | TokenKind::Do
                    | TokenKind::Print
            ) {
                return;
            }
            self.advance();
        }
    }

    // === declarations & statements ===

    fn declaration(&mut self) -> PResult<Stmt> {
        if self.check(&TokenKind::Let) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn var_declaration(&mut self) -> PResult<Stmt> {
        let start = token_span(self.peek());
        self.advance(); // `let`

        let mut declarations = vec![self.declarator()?];
        while self.eat(&TokenKind::Comma) {
            declarations.push(self.declarator()?);
        }
        self.expect(TokenKind::Semicolon, "';' after variable declaration")?;

        Ok(Stmt::VariableDeclaration(VariableDeclaration { declarations, span: start }))
    }

    fn declarator(&mut self) -> PResult<VariableDeclarator> {
        let name_token = self.expect(TokenKind::Identifier, "variable name")?;
        let name = Symbol::intern(&name_token.lexeme);
        let init = if self.eat(&TokenKind::Eq) { Some(self.expression()?) } else { None };
        Ok(VariableDeclarator { name, init })
    }

    fn statement(&mut self) -> PResult<Stmt> {
        match &self.peek().kind {
            TokenKind::Continue => {
                let span = token_span(self.peek());
                self.advance();
                self.expect(TokenKind::Semicolon, "';' after 'continue'")?;
                Ok(Stmt::Continue(span))
            }
            TokenKind::Break => {
                let span = token_span(self.peek());
                self.advance();
                self.expect(TokenKind::Semicolon, "';' after 'break'")?;
                Ok(Stmt::Break(span))
            }
            TokenKind::Do => self.do_while_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::If => self.if_statement(),
            TokenKind::Print => self.print_statement(),
            TokenKind::Return => self.return_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::LBrace => Ok(Stmt::Block(self.block()?)),
            _ => {
                let span = token_span(self.peek());
                let expr = self.expression()?;
                self.expect(TokenKind::Semicolon, "';' after expression")?;
                Ok(Stmt::Expression(ExpressionStmt { expr, span }))
            }
        }
    }

    fn block(&mut self) -> PResult<Block> {
        let span = token_span(self.peek());
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Block { statements, span })
    }

    fn do_while_statement(&mut self) -> PResult<Stmt> {
        let span = token_span(self.peek());
        self.advance(); // `do`
        let body = Box::new(self.statement()?);
        self.expect(TokenKind::While, "'while' after 'do' body")?;
        self.expect(TokenKind::LParen, "'(' after 'while'")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RParen, "')' after condition")?;
        self.expect(TokenKind::Semicolon, "';' after do-while statement")?;
        Ok(Stmt::DoWhile(DoWhileStmt { body, condition, span }))
    }

    fn for_statement(&mut self) -> PResult<Stmt> {
        let span = token_span(self.peek());
        self.advance(); // `for`
        self.expect(TokenKind::LParen, "'(' after 'for'")?;

        let init = if self.eat(&TokenKind::Semicolon) {
            None
        } else if self.check(&TokenKind::Let) {
            let decl = self.var_declaration()?;
            match decl {
                Stmt::VariableDeclaration(v) => Some(Box::new(ForInit::VariableDeclaration(v))),
                _ => unreachable!(),
            }
        } else {
            let expr = self.expression()?;
            self.expect(TokenKind::Semicolon, "';' after for-loop initializer")?;
            Some(Box::new(ForInit::Expression(expr)))
        };

        let test = if self.check(&TokenKind::Semicolon) { None } else { Some(self.expression()?) };
        self.expect(TokenKind::Semicolon, "';' after for-loop condition")?;

        let update = if self.check(&TokenKind::RParen) { None } else { Some(self.expression()?) };
        self.expect(TokenKind::RParen, "')' after for-loop clauses")?;

        let body = Box::new(self.statement()?);
        Ok(Stmt::For(ForStmt { init, test, update, body, span }))
    }

    fn if_statement(&mut self) -> PResult<Stmt> {
        let span = token_span(self.peek());
        self.advance(); // `if`
        self.expect(TokenKind::LParen, "'(' after 'if'")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RParen, "')' after if-condition")?;
        let consequent = Box::new(self.statement()?);
        let alternate =
            if self.eat(&TokenKind::Else) { Some(Box::new(self.statement()?)) } else { None };
        Ok(Stmt::If(IfStmt { condition, consequent, alternate, span }))
    }

    fn print_statement(&mut self) -> PResult<Stmt> {
        let span = token_span(self.peek());
        self.advance(); // `print`
        let argument = self.expression()?;
        self.expect(TokenKind::Semicolon, "';' after print statement")?;
        Ok(Stmt::Print(PrintStmt { argument, span }))
    }

    fn return_statement(&mut self) -> PResult<Stmt> {
        let span = token_span(self.peek());
        self.advance(); // `return`
        let argument =
            if self.check(&TokenKind::Semicolon) { None } else { Some(self.expression()?) };
        self.expect(TokenKind::Semicolon, "';' after return statement")?;
        Ok(Stmt::Return(ReturnStmt { argument, span }))
    }

    fn while_statement(&mut self) -> PResult<Stmt> {
        let span = token_span(self.peek());
        self.advance(); // `while`
        self.expect(TokenKind::LParen, "'(' after 'while'")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RParen, "')' after while-condition")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While(WhileStmt { condition, body, span }))
    }

    // === expressions, lowest to highest precedence ===

    fn expression(&mut self) -> PResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> PResult<Expr> {
        let target = self.logic_or()?;

        let op = match &self.peek().kind {
            TokenKind::Eq => Some(AssignOp::Assign),
            TokenKind::PlusEq => Some(AssignOp::AddAssign),
            TokenKind::MinusEq => Some(AssignOp::SubAssign),
            TokenKind::StarEq => Some(AssignOp::MulAssign),
            TokenKind::SlashEq => Some(AssignOp::DivAssign),
            TokenKind::PercentEq => Some(AssignOp::RemAssign),
            _ => None,
        };

        let Some(op) = op else { return Ok(target) };
        let op_span = token_span(self.peek());
        self.advance();

        if !is_assignable(&target) {
            return Err(self.error_at("invalid assignment target", op_span));
        }

        let value = Box::new(self.assignment()?);
        Ok(Expr::Assignment(AssignmentExpr { target: Box::new(target), op, value, span: op_span }))
    }

    fn error_at(&mut self, message: impl Into<String>, span: Span) -> ParseError {
        let err = ParseError::new(message, span);
        self.handler.error(err.message.clone(), span);
        err
    }

    fn logic_or(&mut self) -> PResult<Expr> {
        let mut left = self.logic_and()?;
        while self.check(&TokenKind::OrOr) {
            let span = token_span(self.peek());
            self.advance();
            let right = self.logic_and()?;
            left = Expr::Logical(LogicalExpr {
                left: Box::new(left),
                op: LogicalOp::Or,
                right: Box::new(right),
                span,
            });
        }
        Ok(left)
    }

    fn logic_and(&mut self) -> PResult<Expr> {
        let mut left = self.equality()?;
        while self.check(&TokenKind::AndAnd) {
            let span = token_span(self.peek());
            self.advance();
            let right = self.equality()?;
            left = Expr::Logical(LogicalExpr {
                left: Box::new(left),
                op: LogicalOp::And,
                right: Box::new(right),
                span,
            });
        }
        Ok(left)
    }

    fn equality(&mut self) -> PResult<Expr> {
        let mut left = self.comparison()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::BangEq => BinOp::NotEq,
                _ => break,
            };
            let span = token_span(self.peek());
            self.advance();
            let right = self.comparison()?;
            left = Expr::Binary(BinaryExpr { left: Box::new(left), op, right: Box::new(right), span });
        }
        Ok(left)
    }

    fn comparison(&mut self) -> PResult<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Gt => BinOp::Gt,
                TokenKind::GtEq => BinOp::GtEq,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::LtEq => BinOp::LtEq,
                _ => break,
            };
            let span = token_span(self.peek());
            self.advance();
            let right = self.term()?;
            left = Expr::Binary(BinaryExpr { left: Box::new(left), op, right: Box::new(right), span });
        }
        Ok(left)
    }

    fn term(&mut self) -> PResult<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let span = token_span(self.peek());
            self.advance();
            let right = self.factor()?;
            left = Expr::Binary(BinaryExpr { left: Box::new(left), op, right: Box::new(right), span });
        }
        Ok(left)
    }

    fn factor(&mut self) -> PResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Rem,
                _ => break,
            };
            let span = token_span(self.peek());
            self.advance();
            let right = self.unary()?;
            left = Expr::Binary(BinaryExpr { left: Box::new(left), op, right: Box::new(right), span });
        }
        Ok(left)
    }

    fn unary(&mut self) -> PResult<Expr> {
        let span = token_span(self.peek());
        match &self.peek().kind {
            TokenKind::Bang => {
                self.advance();
                Ok(Expr::Unary(UnaryExpr { op: UnOp::Not, operand: Box::new(self.unary()?), span }))
            }
            TokenKind::Minus => {
                self.advance();
                Ok(Expr::Unary(UnaryExpr { op: UnOp::Neg, operand: Box::new(self.unary()?), span }))
            }
            TokenKind::Plus => {
                self.advance();
                Ok(Expr::Unary(UnaryExpr { op: UnOp::Plus, operand: Box::new(self.unary()?), span }))
            }
            TokenKind::PlusPlus => {
                self.advance();
                let target = Box::new(self.unary()?);
                self.require_assignable(&target)?;
                Ok(Expr::Update(UpdateExpr { op: UpdateOp::Increment, prefix: true, target, span }))
            }
            TokenKind::MinusMinus => {
                self.advance();
                let target = Box::new(self.unary()?);
                self.require_assignable(&target)?;
                Ok(Expr::Update(UpdateExpr { op: UpdateOp::Decrement, prefix: true, target, span }))
            }
            _ => self.postfix(),
        }
    }

    fn require_assignable(&mut self, expr: &Expr) -> PResult<()> {
        if is_assignable(expr) {
            Ok(())
        } else {
            let span = expr.span();
            Err(self.error_at("invalid update target", span))
        }
    }

    fn postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            match &self.peek().kind {
                TokenKind::LParen => {
                    let span = token_span(self.peek());
                    self.advance();
                    let mut arguments = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        arguments.push(self.expression()?);
                        while self.eat(&TokenKind::Comma) {
                            arguments.push(self.expression()?);
                        }
                    }
                    self.expect(TokenKind::RParen, "')' after call arguments")?;
                    expr = Expr::Call(CallExpr { callee: Box::new(expr), arguments, span });
                }
                TokenKind::Dot => {
                    let span = token_span(self.peek());
                    self.advance();
                    let name_token = self.expect(TokenKind::Identifier, "property name after '.'")?;
                    let property = Symbol::intern(&name_token.lexeme);
                    expr = Expr::Member(MemberExpr { object: Box::new(expr), property, span });
                }
                TokenKind::LBracket => {
                    let span = token_span(self.peek());
                    self.advance();
                    let index = Box::new(self.expression()?);
                    self.expect(TokenKind::RBracket, "']' after index expression")?;
                    expr = Expr::ArrayMember(ArrayMemberExpr { object: Box::new(expr), index, span });
                }
                TokenKind::PlusPlus => {
                    let span = token_span(self.peek());
                    self.advance();
                    self.require_assignable(&expr)?;
                    expr = Expr::Update(UpdateExpr {
                        op: UpdateOp::Increment,
                        prefix: false,
                        target: Box::new(expr),
                        span,
                    });
                }
                TokenKind::MinusMinus => {
                    let span = token_span(self.peek());
                    self.advance();
                    self.require_assignable(&expr)?;
                    expr = Expr::Update(UpdateExpr {
                        op: UpdateOp::Decrement,
                        prefix: false,
                        target: Box::new(expr),
                        span,
                    });
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> PResult<Expr> {
        let span = token_span(self.peek());
        match self.peek().kind.clone() {
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal(LiteralExpr { value: LiteralValue::Null, span }))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(LiteralExpr { value: LiteralValue::Boolean(true), span }))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(LiteralExpr { value: LiteralValue::Boolean(false), span }))
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal(LiteralExpr { value: LiteralValue::Number(n), span }))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Literal(LiteralExpr { value: LiteralValue::String(s), span }))
            }
            TokenKind::Identifier => {
                let lexeme = self.peek().lexeme.clone();
                self.advance();
                Ok(Expr::Identifier(IdentifierExpr { name: Symbol::intern(&lexeme), span }))
            }
            TokenKind::LBrace => self.object_expr(),
            TokenKind::LBracket => self.array_expr(),
            TokenKind::LParen => {
                if self.looks_like_function_header() {
                    self.function_expr()
                } else {
                    self.advance();
                    let expr = self.expression()?;
                    self.expect(TokenKind::RParen, "')' after expression")?;
                    Ok(expr)
                }
            }
            _ => Err(self.error(format!("expected expression, found '{}'", self.peek().lexeme))),
        }
    }

    /// Peeks up to three tokens past an unconsumed `(` to tell a
    /// function-expression header apart from a parenthesized
    /// expression (§4.2's disambiguation rule).
    fn looks_like_function_header(&self) -> bool {
        match self.peek_kind_at(1) {
            Some(TokenKind::RParen) => matches!(self.peek_kind_at(2), Some(TokenKind::LBrace)),
            Some(TokenKind::Identifier) => match self.peek_kind_at(2) {
                Some(TokenKind::Comma) => true,
                Some(TokenKind::RParen) => matches!(self.peek_kind_at(3), Some(TokenKind::LBrace)),
                _ => false,
            },
            _ => false,
        }
    }

    fn function_expr(&mut self) -> PResult<Expr> {
        let span = token_span(self.peek());
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            let first = self.expect(TokenKind::Identifier, "parameter name")?;
            params.push(Symbol::intern(&first.lexeme));
            while self.eat(&TokenKind::Comma) {
                let next = self.expect(TokenKind::Identifier, "parameter name")?;
                params.push(Symbol::intern(&next.lexeme));
            }
        }
        self.expect(TokenKind::RParen, "')' after parameters")?;
        let body = Rc::new(self.block()?);
        Ok(Expr::Function(FunctionExpr { params, body, span }))
    }

    fn object_expr(&mut self) -> PResult<Expr> {
        let span = token_span(self.peek());
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut properties = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            properties.push(self.object_property()?);
            while self.eat(&TokenKind::Comma) {
                properties.push(self.object_property()?);
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Expr::Object(ObjectExpr { properties, span }))
    }

    fn object_property(&mut self) -> PResult<(Symbol, Expr)> {
        let name_token = self.expect(TokenKind::Identifier, "property name")?;
        let name = Symbol::intern(&name_token.lexeme);
        self.expect(TokenKind::Colon, "':' after property name")?;
        let value = self.expression()?;
        Ok((name, value))
    }

    fn array_expr(&mut self) -> PResult<Expr> {
        let span = token_span(self.peek());
        self.expect(TokenKind::LBracket, "'['")?;
        let mut elements = Vec::new();
        if !self.check(&TokenKind::RBracket) {
            elements.push(self.expression()?);
            while self.eat(&TokenKind::Comma) {
                elements.push(self.expression()?);
            }
        }
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(Expr::Array(ArrayExpr { elements, span }))
    }
}

fn is_assignable(expr: &Expr) -> bool {
    matches!(expr, Expr::Identifier(_) | Expr::Member(_) | Expr::ArrayMember(_))
}

fn token_span(token: &Token) -> Span {
    token.span
}
