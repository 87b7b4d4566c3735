//! The tree-walking evaluator: runs a parsed program against a [`Turtle`]
//! and a variable [`Environment`], threading procedure calls through a
//! flat, recursion-friendly procedure table.

use ahash::AHashMap;
use rand::Rng;

use crate::ast::{
    BinOp, Builtin1, Builtin2, Expr, ListItem, MoveKind, Procedure, StateReporter, Stmt,
};
use crate::error::{EvalError, EvalErrorType};
use crate::scope::{Environment, Lookup};
use crate::token::Position;
use crate::turtle::Turtle;
use crate::value::Value;

/// Guards against runaway recursion and runaway loops. Both default to
/// generous values; a host embedding the interpreter under tighter limits
/// can construct one directly and install it via [`Interpreter::with_limits`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub max_call_depth: usize,
    pub max_loop_iterations: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_call_depth: 256,
            max_loop_iterations: 10_000_000,
        }
    }
}

/// How a statement sequence finished: fell off the end, hit `stop`, or hit
/// `output` with a value. Only caught at a procedure-call boundary; at the
/// top level, `Stop`/`Output` escaping a program is a runtime error.
enum Flow {
    Normal,
    Stop,
    Output(Value),
}

type StmtResult = Result<Flow, EvalError>;
type ExprResult = Result<Value, EvalError>;

/// Most procedure calls in Logo programs pass a handful of arguments, so an
/// inline-capacity vector keeps small argument lists inline, avoiding a heap
/// allocation for the common case.
type ArgVec = smallvec::SmallVec<[Value; 4]>;

/// Ties together the procedure table, the turtle, and the accumulated
/// textual output for one running program.
pub struct Interpreter {
    procedures: AHashMap<String, Procedure>,
    turtle: Turtle,
    output_buffer: String,
    limits: Limits,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            procedures: AHashMap::new(),
            turtle: Turtle::new(),
            output_buffer: String::new(),
            limits: Limits::default(),
            call_depth: 0,
        }
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            limits,
            ..Self::new()
        }
    }

    pub fn turtle(&self) -> &Turtle {
        &self.turtle
    }

    /// The accumulated output as discrete lines: `print`/`show` each end a
    /// line, `type` does not, so consecutive `type`s (and any `type`
    /// immediately followed by `print`) share a line, matching a real
    /// terminal's behavior.
    pub fn output(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.output_buffer.split('\n').map(str::to_string).collect();
        if self.output_buffer.ends_with('\n') {
            lines.pop();
        }
        lines
    }

    /// Parses and runs a whole program against this interpreter's state.
    /// Procedure definitions accumulate across calls, so a host can `run`
    /// several fragments against the same `Interpreter` in sequence.
    pub fn run(&mut self, source: &str) -> crate::error::Result<()> {
        let program = crate::parse::parse(source)?;
        let mut env = Environment::new();
        for stmt in &program {
            match self.exec_stmt(stmt, &mut env)? {
                Flow::Normal => {}
                Flow::Stop | Flow::Output(_) => {
                    return Err(EvalError {
                        error_type: EvalErrorType::TopLevelControlTransfer,
                        pos: stmt_pos(stmt),
                        context: None,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    fn emit(&mut self, text: &str, newline: bool) {
        self.output_buffer.push_str(text);
        if newline {
            self.output_buffer.push('\n');
        }
    }

    fn exec_block(&mut self, body: &[Stmt], env: &mut Environment) -> StmtResult {
        for stmt in body {
            match self.exec_stmt(stmt, env)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &mut Environment) -> StmtResult {
        match stmt {
            Stmt::Move(kind, e, _) => {
                let n = self.eval_number(e, env)?;
                match kind {
                    MoveKind::Forward => self.turtle.forward(n),
                    MoveKind::Back => self.turtle.back(n),
                    MoveKind::Right => self.turtle.right(n),
                    MoveKind::Left => self.turtle.left(n),
                }
                Ok(Flow::Normal)
            }
            Stmt::PenUp(_) => {
                self.turtle.pen_up();
                Ok(Flow::Normal)
            }
            Stmt::PenDown(_) => {
                self.turtle.pen_down();
                Ok(Flow::Normal)
            }
            Stmt::PenColor(e, _) => {
                let text = self.eval_text(e, env)?;
                self.turtle.set_pen_color(text);
                Ok(Flow::Normal)
            }
            Stmt::PenSize(e, _) => {
                let n = self.eval_number(e, env)?;
                self.turtle.set_pen_size(n);
                Ok(Flow::Normal)
            }
            Stmt::Home(_) => {
                self.turtle.home();
                Ok(Flow::Normal)
            }
            Stmt::SetXY(ex, ey, _) => {
                let x = self.eval_number(ex, env)?;
                let y = self.eval_number(ey, env)?;
                self.turtle.set_xy(x, y);
                Ok(Flow::Normal)
            }
            Stmt::SetX(e, _) => {
                let x = self.eval_number(e, env)?;
                self.turtle.set_x(x);
                Ok(Flow::Normal)
            }
            Stmt::SetY(e, _) => {
                let y = self.eval_number(e, env)?;
                self.turtle.set_y(y);
                Ok(Flow::Normal)
            }
            Stmt::SetHeading(e, _) => {
                let h = self.eval_number(e, env)?;
                self.turtle.set_heading(h);
                Ok(Flow::Normal)
            }
            Stmt::Circle(e, _) => {
                let r = self.eval_number(e, env)?;
                self.turtle.circle(r);
                Ok(Flow::Normal)
            }
            Stmt::Arc(ea, er, _) => {
                let a = self.eval_number(ea, env)?;
                let r = self.eval_number(er, env)?;
                self.turtle.arc(a, r);
                Ok(Flow::Normal)
            }
            Stmt::ClearScreen(_) => {
                self.turtle.clear_screen();
                Ok(Flow::Normal)
            }
            Stmt::HideTurtle(_) => {
                self.turtle.hide();
                Ok(Flow::Normal)
            }
            Stmt::ShowTurtle(_) => {
                self.turtle.show();
                Ok(Flow::Normal)
            }
            Stmt::Repeat(count_e, body, pos) => {
                let n = self.eval_number(count_e, env)?;
                let count = n.floor().max(0.0) as u64;
                let mut iterations = 0u64;
                for _ in 0..count {
                    iterations += 1;
                    self.check_loop_guard(iterations, *pos)?;
                    match self.exec_block(body, env)? {
                        Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::While(cond_e, body, pos) => {
                let mut iterations = 0u64;
                loop {
                    let cond = self.eval_expr(cond_e, env)?;
                    if !cond.is_truthy() {
                        return Ok(Flow::Normal);
                    }
                    iterations += 1;
                    self.check_loop_guard(iterations, *pos)?;
                    match self.exec_block(body, env)? {
                        Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                }
            }
            Stmt::For(var, start_e, end_e, step_e, body, pos) => {
                let start = self.eval_number(start_e, env)?;
                let end = self.eval_number(end_e, env)?;
                let step = match step_e {
                    Some(e) => self.eval_number(e, env)?,
                    None => 1.0,
                };
                env.push_for_frame(var, Value::Number(start));
                let mut iterations = 0u64;
                let result = loop {
                    let current = match env.get(var) {
                        Lookup::Found(Value::Number(n)) => n,
                        _ => unreachable!("for-loop variable is always a bound number"),
                    };
                    let continue_loop = if step > 0.0 {
                        current <= end
                    } else if step < 0.0 {
                        current >= end
                    } else {
                        current == end && iterations == 0
                    };
                    if !continue_loop {
                        break Ok(Flow::Normal);
                    }
                    iterations += 1;
                    if let Err(e) = self.check_loop_guard(iterations, *pos) {
                        break Err(e);
                    }
                    match self.exec_block(body, env) {
                        Ok(Flow::Normal) => {}
                        Ok(flow) => break Ok(flow),
                        Err(e) => break Err(e),
                    }
                    env.make(var, Value::Number(current + step));
                };
                env.pop_for_frame();
                result
            }
            Stmt::If(cond_e, then_body, _) => {
                let cond = self.eval_expr(cond_e, env)?;
                if cond.is_truthy() {
                    self.exec_block(then_body, env)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::IfElse(cond_e, then_body, else_body, _) => {
                let cond = self.eval_expr(cond_e, env)?;
                if cond.is_truthy() {
                    self.exec_block(then_body, env)
                } else {
                    self.exec_block(else_body, env)
                }
            }
            Stmt::Define(proc, _) => {
                self.procedures.insert(proc.name.clone(), proc.clone());
                Ok(Flow::Normal)
            }
            Stmt::Stop(_) => Ok(Flow::Stop),
            Stmt::Output(e, _) => {
                let v = self.eval_expr(e, env)?;
                Ok(Flow::Output(v))
            }
            Stmt::Make(name, e, _) => {
                let v = self.eval_expr(e, env)?;
                env.make(name, v);
                Ok(Flow::Normal)
            }
            Stmt::Local(name, _) => {
                env.local(name);
                Ok(Flow::Normal)
            }
            Stmt::Print(e, _) => {
                let v = self.eval_expr(e, env)?;
                self.emit(&v.display_string(), true);
                Ok(Flow::Normal)
            }
            Stmt::Type(e, _) => {
                let v = self.eval_expr(e, env)?;
                self.emit(&v.display_string(), false);
                Ok(Flow::Normal)
            }
            Stmt::Show(e, _) => {
                let v = self.eval_expr(e, env)?;
                self.emit(&v.show_string(), true);
                Ok(Flow::Normal)
            }
            Stmt::Call(name, arg_exprs, pos) => {
                let args = self.eval_args(arg_exprs, env)?;
                // A procedure invoked as a statement discards whatever flow
                // it produces internally -- `stop` and `output` are both
                // fully absorbed at this call boundary.
                self.call_procedure(name, args, *pos, env)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn check_loop_guard(&self, iterations: u64, pos: Position) -> Result<(), EvalError> {
        if iterations > self.limits.max_loop_iterations {
            return Err(EvalError {
                error_type: EvalErrorType::TooManyIterations {
                    limit: self.limits.max_loop_iterations as usize,
                },
                pos,
                context: None,
            });
        }
        Ok(())
    }

    fn eval_args(&mut self, exprs: &[Expr], env: &mut Environment) -> Result<ArgVec, EvalError> {
        exprs.iter().map(|e| self.eval_expr(e, env)).collect()
    }

    /// Resolves and runs a user-defined procedure, returning whatever value
    /// `output` produced (`None` if the body ran out, or hit bare `stop`).
    /// Shared by statement-position calls (which discard the result) and
    /// expression-position calls (which require one).
    fn call_procedure(
        &mut self,
        name: &str,
        args: ArgVec,
        pos: Position,
        env: &Environment,
    ) -> Result<Option<Value>, EvalError> {
        let key = name.to_lowercase();
        let proc = self.procedures.get(&key).cloned().ok_or_else(|| EvalError {
            error_type: EvalErrorType::UndefinedProcedure(name.to_string()),
            pos,
            context: None,
        })?;
        if proc.params.len() != args.len() {
            return Err(EvalError {
                error_type: EvalErrorType::ArityError {
                    name: proc.name.clone(),
                    expected: proc.params.len(),
                    got: args.len(),
                },
                pos,
                context: None,
            });
        }

        self.call_depth += 1;
        if self.call_depth > self.limits.max_call_depth {
            self.call_depth -= 1;
            return Err(EvalError {
                error_type: EvalErrorType::RecursionLimit {
                    limit: self.limits.max_call_depth,
                },
                pos,
                context: None,
            });
        }

        let mut call_env = env.call_frame();
        for (param, value) in proc.params.iter().zip(args) {
            call_env.bind_param(param, value);
        }

        let result = self.exec_block(&proc.body, &mut call_env);
        self.call_depth -= 1;

        match result {
            Ok(Flow::Output(v)) => Ok(Some(v)),
            Ok(Flow::Stop) | Ok(Flow::Normal) => Ok(None),
            Err(mut e) => {
                if e.context.is_none() {
                    e.context = Some(proc.name.clone());
                }
                Err(e)
            }
        }
    }

    fn eval_expr(&mut self, expr: &Expr, env: &mut Environment) -> ExprResult {
        match expr {
            Expr::NumberLit(n, _) => Ok(Value::Number(*n)),
            Expr::TextLit(s, _) => Ok(Value::text(s.clone())),
            Expr::ListLit(items, _) => Ok(Value::List(self.eval_list_items(items, env)?)),
            Expr::Var(name, pos) => match env.get(name) {
                Lookup::Found(v) => Ok(v),
                Lookup::Unset | Lookup::Missing => Err(EvalError {
                    error_type: EvalErrorType::UndefinedVariable(name.clone()),
                    pos: *pos,
                    context: None,
                }),
            },
            Expr::Neg(e, _) => {
                let n = self.eval_number(e, env)?;
                Ok(Value::Number(-n))
            }
            Expr::Not(e, _) => {
                let v = self.eval_expr(e, env)?;
                Ok(Value::bool(!v.is_truthy()))
            }
            Expr::BinOp(op, a, b, pos) => self.eval_binop(*op, a, b, *pos, env),
            Expr::Builtin1(b, e, pos) => self.eval_builtin1(*b, e, *pos, env),
            Expr::Builtin2(b, a, c, pos) => self.eval_builtin2(*b, a, c, *pos, env),
            Expr::BuiltinList(exprs, _) => {
                Ok(Value::List(self.eval_args(exprs, env)?.into_vec()))
            }
            Expr::Sentence(a, b, _) => {
                let va = self.eval_expr(a, env)?;
                let vb = self.eval_expr(b, env)?;
                let mut items = match va {
                    Value::List(items) => items,
                    other => vec![other],
                };
                match vb {
                    Value::List(more) => items.extend(more),
                    other => items.push(other),
                }
                Ok(Value::List(items))
            }
            Expr::State(reporter, _) => Ok(match reporter {
                StateReporter::Xcor => Value::Number(self.turtle.x()),
                StateReporter::Ycor => Value::Number(self.turtle.y()),
                StateReporter::Heading => Value::Number(self.turtle.heading()),
                StateReporter::PenDownP => Value::bool(self.turtle.pen_is_down()),
            }),
            Expr::Atan(a, b, _) => {
                let va = self.eval_number(a, env)?;
                match b {
                    Some(b) => {
                        let vb = self.eval_number(b, env)?;
                        Ok(Value::Number(va.atan2(vb).to_degrees()))
                    }
                    None => Ok(Value::Number(va.atan().to_degrees())),
                }
            }
            Expr::FunCall(name, arg_exprs, pos) => {
                let args = self.eval_args(arg_exprs, env)?;
                match self.call_procedure(name, args, *pos, env)? {
                    Some(v) => Ok(v),
                    None => Err(EvalError {
                        error_type: EvalErrorType::NoValueProduced {
                            name: name.clone(),
                        },
                        pos: *pos,
                        context: None,
                    }),
                }
            }
        }
    }

    fn eval_list_items(
        &mut self,
        items: &[ListItem],
        env: &mut Environment,
    ) -> Result<Vec<Value>, EvalError> {
        items
            .iter()
            .map(|item| match item {
                ListItem::Number(n) => Ok(Value::Number(*n)),
                ListItem::Word(w) => Ok(Value::text(w.clone())),
                ListItem::Param(name, pos) => match env.get(name) {
                    Lookup::Found(v) => Ok(v),
                    Lookup::Unset | Lookup::Missing => Err(EvalError {
                        error_type: EvalErrorType::UndefinedVariable(name.clone()),
                        pos: *pos,
                        context: None,
                    }),
                },
                ListItem::List(inner) => Ok(Value::List(self.eval_list_items(inner, env)?)),
            })
            .collect()
    }

    fn eval_number(&mut self, e: &Expr, env: &mut Environment) -> Result<f64, EvalError> {
        let v = self.eval_expr(e, env)?;
        as_number(&v, e.pos())
    }

    fn eval_text(&mut self, e: &Expr, env: &mut Environment) -> Result<String, EvalError> {
        let v = self.eval_expr(e, env)?;
        Ok(v.display_string())
    }

    fn eval_binop(
        &mut self,
        op: BinOp,
        a: &Expr,
        b: &Expr,
        pos: Position,
        env: &mut Environment,
    ) -> ExprResult {
        match op {
            BinOp::Or => {
                let va = self.eval_expr(a, env)?;
                if va.is_truthy() {
                    return Ok(Value::bool(true));
                }
                let vb = self.eval_expr(b, env)?;
                Ok(Value::bool(vb.is_truthy()))
            }
            BinOp::And => {
                let va = self.eval_expr(a, env)?;
                if !va.is_truthy() {
                    return Ok(Value::bool(false));
                }
                let vb = self.eval_expr(b, env)?;
                Ok(Value::bool(vb.is_truthy()))
            }
            BinOp::Eq => {
                let va = self.eval_expr(a, env)?;
                let vb = self.eval_expr(b, env)?;
                Ok(Value::bool(va == vb))
            }
            BinOp::Ne => {
                let va = self.eval_expr(a, env)?;
                let vb = self.eval_expr(b, env)?;
                Ok(Value::bool(va != vb))
            }
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                let na = self.eval_number(a, env)?;
                let nb = self.eval_number(b, env)?;
                let result = match op {
                    BinOp::Lt => na < nb,
                    BinOp::Gt => na > nb,
                    BinOp::Le => na <= nb,
                    BinOp::Ge => na >= nb,
                    _ => unreachable!(),
                };
                Ok(Value::bool(result))
            }
            BinOp::Add | BinOp::Sub | BinOp::Mul => {
                let na = self.eval_number(a, env)?;
                let nb = self.eval_number(b, env)?;
                Ok(Value::Number(match op {
                    BinOp::Add => na + nb,
                    BinOp::Sub => na - nb,
                    BinOp::Mul => na * nb,
                    _ => unreachable!(),
                }))
            }
            BinOp::Div => {
                let na = self.eval_number(a, env)?;
                let nb = self.eval_number(b, env)?;
                if nb == 0.0 {
                    return Err(EvalError {
                        error_type: EvalErrorType::DivisionByZero,
                        pos,
                        context: None,
                    });
                }
                Ok(Value::Number(na / nb))
            }
            BinOp::Mod => {
                let na = self.eval_number(a, env)?;
                let nb = self.eval_number(b, env)?;
                if nb == 0.0 {
                    return Err(EvalError {
                        error_type: EvalErrorType::DivisionByZero,
                        pos,
                        context: None,
                    });
                }
                Ok(Value::Number(na % nb))
            }
        }
    }

    fn eval_builtin1(
        &mut self,
        b: Builtin1,
        e: &Expr,
        pos: Position,
        env: &mut Environment,
    ) -> ExprResult {
        match b {
            Builtin1::Sqrt => Ok(Value::Number(self.eval_number(e, env)?.sqrt())),
            Builtin1::Abs => Ok(Value::Number(self.eval_number(e, env)?.abs())),
            Builtin1::Int => Ok(Value::Number(self.eval_number(e, env)?.trunc())),
            Builtin1::Round => Ok(Value::Number(self.eval_number(e, env)?.round())),
            Builtin1::Sin => Ok(Value::Number(self.eval_number(e, env)?.to_radians().sin())),
            Builtin1::Cos => Ok(Value::Number(self.eval_number(e, env)?.to_radians().cos())),
            Builtin1::Tan => Ok(Value::Number(self.eval_number(e, env)?.to_radians().tan())),
            Builtin1::First => {
                let v = self.eval_expr(e, env)?;
                first_of(&v, pos)
            }
            Builtin1::Last => {
                let v = self.eval_expr(e, env)?;
                last_of(&v, pos)
            }
            Builtin1::ButFirst => {
                let v = self.eval_expr(e, env)?;
                butfirst_of(&v, pos)
            }
            Builtin1::ButLast => {
                let v = self.eval_expr(e, env)?;
                butlast_of(&v, pos)
            }
            Builtin1::Count => {
                let v = self.eval_expr(e, env)?;
                count_of(&v, pos)
            }
            Builtin1::Thing => {
                let name = self.eval_text(e, env)?;
                match env.get(&name) {
                    Lookup::Found(v) => Ok(v),
                    Lookup::Unset | Lookup::Missing => Err(EvalError {
                        error_type: EvalErrorType::UndefinedVariable(name),
                        pos,
                        context: None,
                    }),
                }
            }
            Builtin1::Random => {
                let n = self.eval_number(e, env)?;
                let bound = n.floor() as i64;
                if bound <= 0 {
                    return Ok(Value::Number(0.0));
                }
                let roll = rand::thread_rng().gen_range(0..bound);
                Ok(Value::Number(roll as f64))
            }
        }
    }

    fn eval_builtin2(
        &mut self,
        b: Builtin2,
        a: &Expr,
        c: &Expr,
        pos: Position,
        env: &mut Environment,
    ) -> ExprResult {
        match b {
            Builtin2::Sum => Ok(Value::Number(self.eval_number(a, env)? + self.eval_number(c, env)?)),
            Builtin2::Difference => {
                Ok(Value::Number(self.eval_number(a, env)? - self.eval_number(c, env)?))
            }
            Builtin2::Product => {
                Ok(Value::Number(self.eval_number(a, env)? * self.eval_number(c, env)?))
            }
            Builtin2::Quotient => {
                let na = self.eval_number(a, env)?;
                let nb = self.eval_number(c, env)?;
                if nb == 0.0 {
                    return Err(EvalError {
                        error_type: EvalErrorType::DivisionByZero,
                        pos,
                        context: None,
                    });
                }
                Ok(Value::Number(na / nb))
            }
            Builtin2::Remainder => {
                let na = self.eval_number(a, env)?;
                let nb = self.eval_number(c, env)?;
                if nb == 0.0 {
                    return Err(EvalError {
                        error_type: EvalErrorType::DivisionByZero,
                        pos,
                        context: None,
                    });
                }
                Ok(Value::Number(na % nb))
            }
            Builtin2::Power => {
                Ok(Value::Number(self.eval_number(a, env)?.powf(self.eval_number(c, env)?)))
            }
            Builtin2::Item => {
                let idx = self.eval_number(a, env)? as i64;
                let v = self.eval_expr(c, env)?;
                item_of(idx, &v, pos)
            }
            Builtin2::Word => {
                let ta = self.eval_text(a, env)?;
                let tb = self.eval_text(c, env)?;
                Ok(Value::text(format!("{}{}", ta, tb)))
            }
            Builtin2::Towards => {
                let x = self.eval_number(a, env)?;
                let y = self.eval_number(c, env)?;
                let dx = x - self.turtle.x();
                let dy = y - self.turtle.y();
                let heading = dx.atan2(dy).to_degrees();
                let heading = if heading < 0.0 { heading + 360.0 } else { heading };
                Ok(Value::Number(heading))
            }
            Builtin2::Fput => {
                let item = self.eval_expr(a, env)?;
                let v = self.eval_expr(c, env)?;
                match v {
                    Value::List(mut items) => {
                        items.insert(0, item);
                        Ok(Value::List(items))
                    }
                    other => Err(type_error("list", other.type_name(), pos)),
                }
            }
            Builtin2::Lput => {
                let item = self.eval_expr(a, env)?;
                let v = self.eval_expr(c, env)?;
                match v {
                    Value::List(mut items) => {
                        items.push(item);
                        Ok(Value::List(items))
                    }
                    other => Err(type_error("list", other.type_name(), pos)),
                }
            }
        }
    }
}

fn as_number(v: &Value, pos: Position) -> Result<f64, EvalError> {
    v.as_number().ok_or_else(|| type_error("number", v.type_name(), pos))
}

fn type_error(expected: &str, got: &str, pos: Position) -> EvalError {
    EvalError {
        error_type: EvalErrorType::TypeError {
            expected: expected.to_string(),
            got: got.to_string(),
        },
        pos,
        context: None,
    }
}

fn first_of(v: &Value, pos: Position) -> ExprResult {
    match v {
        Value::List(items) => items
            .first()
            .cloned()
            .ok_or_else(|| out_of_bounds(0, 1, pos)),
        Value::Text(s) => s
            .chars()
            .next()
            .map(|c| Value::text(c.to_string()))
            .ok_or_else(|| out_of_bounds(0, 1, pos)),
        other => Err(type_error("list or text", other.type_name(), pos)),
    }
}

fn last_of(v: &Value, pos: Position) -> ExprResult {
    match v {
        Value::List(items) => items
            .last()
            .cloned()
            .ok_or_else(|| out_of_bounds(0, 1, pos)),
        Value::Text(s) => s
            .chars()
            .last()
            .map(|c| Value::text(c.to_string()))
            .ok_or_else(|| out_of_bounds(0, 1, pos)),
        other => Err(type_error("list or text", other.type_name(), pos)),
    }
}

fn butfirst_of(v: &Value, pos: Position) -> ExprResult {
    match v {
        Value::List(items) => {
            if items.is_empty() {
                return Err(out_of_bounds(0, 1, pos));
            }
            Ok(Value::List(items[1..].to_vec()))
        }
        Value::Text(s) => {
            let mut chars = s.chars();
            if chars.next().is_none() {
                return Err(out_of_bounds(0, 1, pos));
            }
            Ok(Value::text(chars.as_str().to_string()))
        }
        other => Err(type_error("list or text", other.type_name(), pos)),
    }
}

fn butlast_of(v: &Value, pos: Position) -> ExprResult {
    match v {
        Value::List(items) => {
            if items.is_empty() {
                return Err(out_of_bounds(0, 1, pos));
            }
            Ok(Value::List(items[..items.len() - 1].to_vec()))
        }
        Value::Text(s) => {
            if s.is_empty() {
                return Err(out_of_bounds(0, 1, pos));
            }
            let mut chars: Vec<char> = s.chars().collect();
            chars.pop();
            Ok(Value::text(chars.into_iter().collect::<String>()))
        }
        other => Err(type_error("list or text", other.type_name(), pos)),
    }
}

fn count_of(v: &Value, pos: Position) -> ExprResult {
    match v {
        Value::List(items) => Ok(Value::Number(items.len() as f64)),
        Value::Text(s) => Ok(Value::Number(s.chars().count() as f64)),
        other => Err(type_error("list or text", other.type_name(), pos)),
    }
}

fn item_of(idx: i64, v: &Value, pos: Position) -> ExprResult {
    match v {
        Value::List(items) => {
            if idx < 1 || idx as usize > items.len() {
                return Err(out_of_bounds(items.len(), idx, pos));
            }
            Ok(items[idx as usize - 1].clone())
        }
        Value::Text(s) => {
            let chars: Vec<char> = s.chars().collect();
            if idx < 1 || idx as usize > chars.len() {
                return Err(out_of_bounds(chars.len(), idx, pos));
            }
            Ok(Value::text(chars[idx as usize - 1].to_string()))
        }
        other => Err(type_error("list or text", other.type_name(), pos)),
    }
}

fn out_of_bounds(len: usize, index: i64, pos: Position) -> EvalError {
    EvalError {
        error_type: EvalErrorType::IndexOutOfBounds { len, index },
        pos,
        context: None,
    }
}

fn stmt_pos(stmt: &Stmt) -> Position {
    match stmt {
        Stmt::Move(_, _, p)
        | Stmt::PenUp(p)
        | Stmt::PenDown(p)
        | Stmt::PenColor(_, p)
        | Stmt::PenSize(_, p)
        | Stmt::Home(p)
        | Stmt::SetXY(_, _, p)
        | Stmt::SetX(_, p)
        | Stmt::SetY(_, p)
        | Stmt::SetHeading(_, p)
        | Stmt::Circle(_, p)
        | Stmt::Arc(_, _, p)
        | Stmt::ClearScreen(p)
        | Stmt::HideTurtle(p)
        | Stmt::ShowTurtle(p)
        | Stmt::Repeat(_, _, p)
        | Stmt::While(_, _, p)
        | Stmt::For(_, _, _, _, _, p)
        | Stmt::If(_, _, p)
        | Stmt::IfElse(_, _, _, p)
        | Stmt::Define(_, p)
        | Stmt::Stop(p)
        | Stmt::Output(_, p)
        | Stmt::Make(_, _, p)
        | Stmt::Local(_, p)
        | Stmt::Print(_, p)
        | Stmt::Type(_, p)
        | Stmt::Show(_, p)
        | Stmt::Call(_, _, p) => *p,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> Interpreter {
        let mut interp = Interpreter::new();
        interp.run(src).unwrap_or_else(|e| panic!("run failed for {:?}: {}", src, e));
        interp
    }

    #[test]
    fn square_via_repeat_draws_four_segments_and_returns_home() {
        let interp = run("repeat 4 [forward 100 right 90]");
        assert_eq!(interp.turtle().lines().len(), 4);
        assert!(interp.turtle().x().abs() < 1e-9);
        assert!(interp.turtle().y().abs() < 1e-9);
    }

    #[test]
    fn procedure_called_twice_draws_two_independent_squares() {
        let interp = run(
            "to sq :n\nrepeat 4 [forward :n right 90]\nend\nsq 50 sq 50",
        );
        assert_eq!(interp.turtle().lines().len(), 8);
    }

    #[test]
    fn recursive_factorial_outputs_via_output() {
        let interp = run(
            "to fact :n\nif :n = 0 [output 1]\noutput :n * fact :n - 1\nend\nprint fact 5",
        );
        assert_eq!(interp.output(), vec!["120".to_string()]);
    }

    #[test]
    fn while_loop_counts_up() {
        let interp = run(
            "make \"i 0\nwhile [:i < 3] [print :i make \"i :i + 1]",
        );
        assert_eq!(interp.output(), vec!["0", "1", "2"]);
    }

    #[test]
    fn list_builtins_compose() {
        let interp = run("print fput 1 list 2 3");
        assert_eq!(interp.output(), vec!["[1 2 3]".to_string()]);
    }

    #[test]
    fn penup_then_pendown_records_only_the_second_move() {
        let interp = run("penup forward 50 pendown forward 50");
        assert_eq!(interp.turtle().lines().len(), 1);
    }

    #[test]
    fn undefined_procedure_is_a_runtime_error() {
        let mut interp = Interpreter::new();
        let err = interp.run("nosuchproc").unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Eval(EvalError {
                error_type: EvalErrorType::UndefinedProcedure(_),
                ..
            })
        ));
    }

    #[test]
    fn arity_mismatch_is_a_runtime_error_in_both_positions() {
        let mut interp = Interpreter::new();
        interp.run("to one :a\noutput :a\nend").unwrap();
        let stmt_err = interp.run("one 1 2").unwrap_err();
        assert!(matches!(
            stmt_err,
            crate::error::Error::Eval(EvalError {
                error_type: EvalErrorType::ArityError { .. },
                ..
            })
        ));
        let expr_err = interp.run("print one 1 2").unwrap_err();
        assert!(matches!(
            expr_err,
            crate::error::Error::Eval(EvalError {
                error_type: EvalErrorType::ArityError { .. },
                ..
            })
        ));
    }

    #[test]
    fn top_level_stop_is_a_runtime_error() {
        let mut interp = Interpreter::new();
        let err = interp.run("stop").unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Eval(EvalError {
                error_type: EvalErrorType::TopLevelControlTransfer,
                ..
            })
        ));
    }

    #[test]
    fn no_value_from_a_procedure_is_a_runtime_error_in_expression_position() {
        let mut interp = Interpreter::new();
        interp.run("to noop\nstop\nend").unwrap();
        let err = interp.run("print noop").unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Eval(EvalError {
                error_type: EvalErrorType::NoValueProduced { .. },
                ..
            })
        ));
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let mut interp = Interpreter::new();
        let err = interp.run("print 1 / 0").unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Eval(EvalError {
                error_type: EvalErrorType::DivisionByZero,
                ..
            })
        ));
    }

    #[test]
    fn deeply_recursive_procedure_hits_the_call_depth_guard() {
        let mut interp = Interpreter::new();
        interp.run("to loop\nloop\nend").unwrap();
        let err = interp.run("loop").unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Eval(EvalError {
                error_type: EvalErrorType::RecursionLimit { .. },
                ..
            })
        ));
    }
}
