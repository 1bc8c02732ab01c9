//! The tree-walking evaluator (§4.6–§4.8).

use std::rc::Rc;

use msl_ast::{
    ArrayExpr, ArrayMemberExpr, AssignOp, AssignmentExpr, BinOp, BinaryExpr, Block, DoWhileStmt,
    Expr, ForInit, ForStmt, FunctionExpr, IfStmt, LiteralValue, LogicalExpr, LogicalOp,
    MemberExpr, ObjectExpr, Program, Stmt, UnOp, UnaryExpr, UpdateExpr, UpdateOp,
    VariableDeclaration, WhileStmt,
};
use msl_heap::{Builtin, Function, Heap, Stack};
use msl_heap::{Environment, Value};
use msl_util::{LineReader, OutputSink, Span, Symbol};

use crate::error::RuntimeError;
use crate::signal::Signal;

/// Holds the heap and the variable stack, and the I/O seams built-ins
/// read from and write to. Generic over the sink/reader so tests can
/// swap in [`msl_util::BufferSink`]/[`msl_util::FixedLines`] without the
/// evaluator ever touching real stdio.
pub struct Evaluator<'a> {
    heap: Heap,
    stack: Stack,
    output: &'a mut dyn OutputSink,
    input: &'a mut dyn LineReader,
}

impl<'a> Evaluator<'a> {
    pub fn new(output: &'a mut dyn OutputSink, input: &'a mut dyn LineReader) -> Self {
        let mut heap = Heap::new();
        let mut stack = Stack::new();
        stack.push(Environment::new());

        let print_handle = heap.allocate_builtin(&stack, Builtin::Print);
        let read_handle = heap.allocate_builtin(&stack, Builtin::Read);
        stack.top_mut().define(Symbol::intern("Print"), Value::Function(print_handle));
        stack.top_mut().define(Symbol::intern("Read"), Value::Function(read_handle));

        Self { heap, stack, output, input }
    }

    /// Exposes the heap for callers (the driver's REPL, tests) that
    /// need to render a final expression's value after `run` returns.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Runs every top-level statement against the globals frame, which
    /// stays at the bottom of the stack for the whole call (§3
    /// invariant: "globals remain at the bottom for the program's
    /// duration").
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        match self.execute_statements(&program.statements)? {
            Signal::Normal | Signal::Return(_) => Ok(()),
            Signal::Break | Signal::Continue => {
                Err(RuntimeError::new("'break'/'continue' used outside of a loop", Span::DUMMY))
            }
        }
    }

    fn execute_statements(&mut self, statements: &[Stmt]) -> Result<Signal, RuntimeError> {
        for stmt in statements {
            let signal = self.execute(stmt)?;
            if !matches!(signal, Signal::Normal) {
                return Ok(signal);
            }
        }
        Ok(Signal::Normal)
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Signal, RuntimeError> {
        match stmt {
            Stmt::Expression(s) => {
                self.evaluate(&s.expr)?;
                Ok(Signal::Normal)
            }
            Stmt::Print(s) => {
                let value = self.evaluate(&s.argument)?;
                let text = self.heap.to_display_string(&value);
                self.output.write_out(&text);
                self.output.write_out("\n");
                Ok(Signal::Normal)
            }
            Stmt::VariableDeclaration(decl) => self.execute_var_declaration(decl),
            Stmt::Block(block) => self.execute_block(block),
            Stmt::If(s) => self.execute_if(s),
            Stmt::While(s) => self.execute_while(s),
            Stmt::DoWhile(s) => self.execute_do_while(s),
            Stmt::For(s) => self.execute_for(s),
            Stmt::Return(s) => {
                let value = match &s.argument {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                Ok(Signal::Return(value))
            }
            Stmt::Break(_) => Ok(Signal::Break),
            Stmt::Continue(_) => Ok(Signal::Continue),
        }
    }

    fn execute_var_declaration(&mut self, decl: &VariableDeclaration) -> Result<Signal, RuntimeError> {
        for declarator in &decl.declarations {
            let value = match &declarator.init {
                Some(expr) => self.evaluate(expr)?,
                None => Value::Null,
            };
            if !self.stack.define(declarator.name, value) {
                return Err(RuntimeError::new(
                    format!("'{}' is already declared in this scope", declarator.name),
                    decl.span,
                ));
            }
        }
        Ok(Signal::Normal)
    }

    fn execute_block(&mut self, block: &Block) -> Result<Signal, RuntimeError> {
        self.stack.push(Environment::new());
        let result = self.execute_statements(&block.statements);
        self.stack.pop();
        result
    }

    fn execute_if(&mut self, s: &IfStmt) -> Result<Signal, RuntimeError> {
        let condition = self.evaluate(&s.condition)?;
        if self.heap.to_boolean(&condition) {
            self.execute(&s.consequent)
        } else if let Some(alternate) = &s.alternate {
            self.execute(alternate)
        } else {
            Ok(Signal::Normal)
        }
    }

    fn execute_while(&mut self, s: &WhileStmt) -> Result<Signal, RuntimeError> {
        self.stack.push(Environment::new());
        let result = self.run_while_body(s);
        self.stack.pop();
        result
    }

    fn run_while_body(&mut self, s: &WhileStmt) -> Result<Signal, RuntimeError> {
        loop {
            let condition = self.evaluate(&s.condition)?;
            if !self.heap.to_boolean(&condition) {
                return Ok(Signal::Normal);
            }
            match self.execute(&s.body)? {
                Signal::Normal | Signal::Continue => {}
                Signal::Break => return Ok(Signal::Normal),
                signal @ Signal::Return(_) => return Ok(signal),
            }
        }
    }

    /// Unlike `while`, `do...while` pushes no frame of its own — an
    /// asymmetry the original implementation this evaluates like has,
    /// preserved deliberately rather than "fixed" (§9).
    fn execute_do_while(&mut self, s: &DoWhileStmt) -> Result<Signal, RuntimeError> {
        loop {
            match self.execute(&s.body)? {
                Signal::Normal | Signal::Continue => {}
                Signal::Break => return Ok(Signal::Normal),
                signal @ Signal::Return(_) => return Ok(signal),
            }
            let condition = self.evaluate(&s.condition)?;
            if !self.heap.to_boolean(&condition) {
                return Ok(Signal::Normal);
            }
        }
    }

    fn execute_for(&mut self, s: &ForStmt) -> Result<Signal, RuntimeError> {
        self.stack.push(Environment::new());
        let result = self.run_for_body(s);
        self.stack.pop();
        result
    }

    fn run_for_body(&mut self, s: &ForStmt) -> Result<Signal, RuntimeError> {
        if let Some(init) = &s.init {
            match init.as_ref() {
                ForInit::VariableDeclaration(decl) => {
                    if !matches!(self.execute_var_declaration(decl)?, Signal::Normal) {
                        unreachable!("variable declarations never yield a non-normal signal")
                    }
                }
                ForInit::Expression(expr) => {
                    self.evaluate(expr)?;
                }
            }
        }

        loop {
            let proceed = match &s.test {
                Some(expr) => {
                    let value = self.evaluate(expr)?;
                    self.heap.to_boolean(&value)
                }
                None => true,
            };
            if !proceed {
                return Ok(Signal::Normal);
            }

            match self.execute(&s.body)? {
                Signal::Normal | Signal::Continue => {}
                Signal::Break => return Ok(Signal::Normal),
                signal @ Signal::Return(_) => return Ok(signal),
            }

            if let Some(update) = &s.update {
                self.evaluate(update)?;
            }
        }
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(e) => Ok(literal_value(&e.value)),
            Expr::Identifier(e) => self
                .stack
                .lookup(e.name)
                .cloned()
                .ok_or_else(|| RuntimeError::new(format!("undefined variable '{}'", e.name), e.span)),
            Expr::Binary(e) => self.evaluate_binary(e),
            Expr::Logical(e) => self.evaluate_logical(e),
            Expr::Unary(e) => self.evaluate_unary(e),
            Expr::Update(e) => self.evaluate_update(e),
            Expr::Assignment(e) => self.evaluate_assignment(e),
            Expr::Call(e) => self.evaluate_call(e),
            Expr::Function(e) => self.evaluate_function(e),
            Expr::Member(e) => self.evaluate_member(e),
            Expr::ArrayMember(e) => self.evaluate_array_member(e),
            Expr::Object(e) => self.evaluate_object(e),
            Expr::Array(e) => self.evaluate_array(e),
        }
    }

    fn evaluate_binary(&mut self, e: &BinaryExpr) -> Result<Value, RuntimeError> {
        let left = self.evaluate(&e.left)?;
        let right = self.evaluate(&e.right)?;
        Ok(match e.op {
            BinOp::Add => self.heap.add(&left, &right),
            BinOp::Sub => self.heap.sub(&left, &right),
            BinOp::Mul => self.heap.mul(&left, &right),
            BinOp::Div => self.heap.div(&left, &right),
            BinOp::Rem => self.heap.rem(&left, &right),
            BinOp::Eq => Value::Boolean(self.heap.equals(&left, &right)),
            BinOp::NotEq => Value::Boolean(self.heap.not_equals(&left, &right)),
            BinOp::Lt => Value::Boolean(self.heap.less_than(&left, &right)),
            BinOp::LtEq => Value::Boolean(self.heap.less_than_or_equal(&left, &right)),
            BinOp::Gt => Value::Boolean(self.heap.greater_than(&left, &right)),
            BinOp::GtEq => Value::Boolean(self.heap.greater_than_or_equal(&left, &right)),
        })
    }

    fn evaluate_logical(&mut self, e: &LogicalExpr) -> Result<Value, RuntimeError> {
        let left = self.evaluate(&e.left)?;
        match e.op {
            LogicalOp::And => {
                if self.heap.to_boolean(&left) {
                    self.evaluate(&e.right)
                } else {
                    Ok(left)
                }
            }
            LogicalOp::Or => {
                if self.heap.to_boolean(&left) {
                    Ok(left)
                } else {
                    self.evaluate(&e.right)
                }
            }
        }
    }

    fn evaluate_unary(&mut self, e: &UnaryExpr) -> Result<Value, RuntimeError> {
        let operand = self.evaluate(&e.operand)?;
        Ok(match e.op {
            UnOp::Not => self.heap.not(&operand),
            UnOp::Neg => self.heap.negate(&operand),
            UnOp::Plus => self.heap.unary_plus(&operand),
        })
    }

    fn evaluate_update(&mut self, e: &UpdateExpr) -> Result<Value, RuntimeError> {
        let old = self.evaluate(&e.target)?;
        let old_number = match old {
            Value::Number(n) => n,
            _ => return Err(RuntimeError::new("'++'/'--' operand must be a number", e.span)),
        };
        let new_number = match e.op {
            UpdateOp::Increment => old_number + 1.0,
            UpdateOp::Decrement => old_number - 1.0,
        };
        let new_value = Value::Number(new_number);
        self.assign_to(&e.target, new_value.clone(), e.span)?;
        Ok(if e.prefix { new_value } else { old })
    }

    fn evaluate_assignment(&mut self, e: &AssignmentExpr) -> Result<Value, RuntimeError> {
        let rhs = self.evaluate(&e.value)?;
        let final_value = if e.op == AssignOp::Assign {
            rhs
        } else {
            let current = self.evaluate(&e.target)?;
            match e.op {
                AssignOp::AddAssign => self.heap.add(&current, &rhs),
                AssignOp::SubAssign => self.heap.sub(&current, &rhs),
                AssignOp::MulAssign => self.heap.mul(&current, &rhs),
                AssignOp::DivAssign => self.heap.div(&current, &rhs),
                AssignOp::RemAssign => self.heap.rem(&current, &rhs),
                AssignOp::Assign => unreachable!(),
            }
        };
        self.assign_to(&e.target, final_value.clone(), e.span)?;
        Ok(final_value)
    }

    fn assign_to(&mut self, target: &Expr, value: Value, span: Span) -> Result<(), RuntimeError> {
        match target {
            Expr::Identifier(id) => {
                if self.stack.assign(id.name, value) {
                    Ok(())
                } else {
                    Err(RuntimeError::new(format!("undefined variable '{}'", id.name), span))
                }
            }
            Expr::Member(m) => {
                let object = self.evaluate(&m.object)?;
                match object {
                    Value::Object(handle) => {
                        let obj = self
                            .heap
                            .object_mut(handle)
                            .ok_or_else(|| RuntimeError::new("dangling object handle", span))?;
                        obj.set(m.property, value);
                        Ok(())
                    }
                    _ => Err(RuntimeError::new("cannot assign a property of a non-object value", span)),
                }
            }
            Expr::ArrayMember(a) => {
                let array_value = self.evaluate(&a.object)?;
                let handle = match array_value {
                    Value::Array(h) => h,
                    _ => return Err(RuntimeError::new("cannot index a non-array value", span)),
                };
                let index_value = self.evaluate(&a.index)?;
                let n = match index_value {
                    Value::Number(n) => n,
                    _ => return Err(RuntimeError::new("array index must be a number", span)),
                };
                let array = self
                    .heap
                    .array_mut(handle)
                    .ok_or_else(|| RuntimeError::new("dangling array handle", span))?;
                let index = array_index(n, array.len())
                    .ok_or_else(|| RuntimeError::new("array index out of range", span))?;
                array.elements[index] = value;
                Ok(())
            }
            _ => unreachable!("the parser only ever produces assignable targets here"),
        }
    }

    fn evaluate_call(&mut self, e: &msl_ast::CallExpr) -> Result<Value, RuntimeError> {
        let callee = self.evaluate(&e.callee)?;
        let function = match callee {
            Value::Function(handle) => self
                .heap
                .function(handle)
                .cloned()
                .ok_or_else(|| RuntimeError::new("dangling function handle", e.span))?,
            _ => return Err(RuntimeError::new("value is not callable", e.span)),
        };

        let mut arguments = Vec::with_capacity(e.arguments.len());
        for arg in &e.arguments {
            arguments.push(self.evaluate(arg)?);
        }

        match function {
            Function::User(user) => {
                if user.params.len() != arguments.len() {
                    return Err(RuntimeError::new(
                        format!(
                            "expected {} argument(s), got {}",
                            user.params.len(),
                            arguments.len()
                        ),
                        e.span,
                    ));
                }
                self.call_user(&user.params, &user.body, arguments, e.span)
            }
            Function::Builtin(Builtin::Print) => self.call_print(&arguments),
            Function::Builtin(Builtin::Read) => Ok(self.call_read()),
        }
    }

    /// Implements §4.7: bind params to args in a fresh frame, run the
    /// body against it, and let a `return` (or falling off the end)
    /// determine the result. The body is not a closure over its
    /// defining environment — it's evaluated against whatever frame is
    /// pushed here, on top of the live stack at call time.
    fn call_user(
        &mut self,
        params: &[Symbol],
        body: &Rc<Block>,
        arguments: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let mut frame = Environment::new();
        for (param, argument) in params.iter().zip(arguments) {
            frame.define(*param, argument);
        }

        self.stack.push(frame);
        let result = self.execute_statements(&body.statements);
        self.stack.pop();

        match result? {
            Signal::Return(value) => Ok(value),
            Signal::Normal => Ok(Value::Null),
            Signal::Break | Signal::Continue => {
                Err(RuntimeError::new("'break'/'continue' escaped a function body", span))
            }
        }
    }

    fn call_print(&mut self, arguments: &[Value]) -> Result<Value, RuntimeError> {
        let rendered: Vec<String> =
            arguments.iter().map(|v| self.heap.to_display_string(v)).collect();
        self.output.write_out(&rendered.join(" "));
        self.output.write_out("\n");
        Ok(Value::Null)
    }

    fn call_read(&mut self) -> Value {
        match self.input.read_line() {
            Some(line) => Value::string(line),
            None => Value::Null,
        }
    }

    fn evaluate_function(&mut self, e: &FunctionExpr) -> Result<Value, RuntimeError> {
        let handle =
            self.heap.allocate_user_function(&self.stack, e.params.clone(), Rc::clone(&e.body));
        Ok(Value::Function(handle))
    }

    fn evaluate_member(&mut self, e: &MemberExpr) -> Result<Value, RuntimeError> {
        let object = self.evaluate(&e.object)?;
        Ok(match object {
            Value::Object(handle) => self.heap.object(handle).map(|o| o.get(e.property)).unwrap_or(Value::Null),
            _ => Value::Null,
        })
    }

    fn evaluate_array_member(&mut self, e: &ArrayMemberExpr) -> Result<Value, RuntimeError> {
        let array_value = self.evaluate(&e.object)?;
        let handle = match array_value {
            Value::Array(h) => h,
            _ => return Err(RuntimeError::new("cannot index a non-array value", e.span)),
        };
        let index_value = self.evaluate(&e.index)?;
        let n = match index_value {
            Value::Number(n) => n,
            _ => return Err(RuntimeError::new("array index must be a number", e.span)),
        };
        let array = self
            .heap
            .array(handle)
            .ok_or_else(|| RuntimeError::new("dangling array handle", e.span))?;
        let index = array_index(n, array.len())
            .ok_or_else(|| RuntimeError::new("array index out of range", e.span))?;
        Ok(array.elements[index].clone())
    }

    /// GC is disabled for the duration of construction so a partially
    /// built Object can't be swept mid-expression (§4.4, §5), and
    /// re-enabled on every exit path including an evaluation error.
    fn evaluate_object(&mut self, e: &ObjectExpr) -> Result<Value, RuntimeError> {
        let handle = self.heap.allocate_object(&self.stack);
        self.heap.disable_gc();
        let result = self.populate_object(handle, &e.properties);
        self.heap.enable_gc();
        result?;
        Ok(Value::Object(handle))
    }

    fn populate_object(
        &mut self,
        handle: msl_heap::Handle<msl_heap::Object>,
        properties: &[(Symbol, Expr)],
    ) -> Result<(), RuntimeError> {
        for (name, expr) in properties {
            let value = self.evaluate(expr)?;
            self.heap
                .object_mut(handle)
                .expect("handle allocated by this call is still live")
                .set(*name, value);
        }
        Ok(())
    }

    fn evaluate_array(&mut self, e: &ArrayExpr) -> Result<Value, RuntimeError> {
        let handle = self.heap.allocate_array(&self.stack);
        self.heap.disable_gc();
        let result = self.populate_array(handle, &e.elements);
        self.heap.enable_gc();
        result?;
        Ok(Value::Array(handle))
    }

    fn populate_array(
        &mut self,
        handle: msl_heap::Handle<msl_heap::Array>,
        elements: &[Expr],
    ) -> Result<(), RuntimeError> {
        for expr in elements {
            let value = self.evaluate(expr)?;
            self.heap
                .array_mut(handle)
                .expect("handle allocated by this call is still live")
                .elements
                .push(value);
        }
        Ok(())
    }
}

fn literal_value(value: &LiteralValue) -> Value {
    match value {
        LiteralValue::Null => Value::Null,
        LiteralValue::Boolean(b) => Value::Boolean(*b),
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::String(s) => Value::string(s.clone()),
    }
}

/// A valid array index must be a non-negative integer in range.
fn array_index(n: f64, len: usize) -> Option<usize> {
    if n.is_finite() && n >= 0.0 && n.fract() == 0.0 {
        let index = n as usize;
        if index < len {
            return Some(index);
        }
    }
    None
}
