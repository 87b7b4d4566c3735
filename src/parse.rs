//! Recursive-descent, operator-precedence parser: tokens in, AST out.

use crate::ast::{
    BinOp, Builtin1, Builtin2, Expr, ListItem, MoveKind, Procedure, StateReporter, Stmt,
};
use crate::error::{ParseError, ParseErrorType};
use crate::token::{Lexer, Position, Token, TokenKind};

/// Resolves Logo's short command aliases to their canonical (lowercase) name.
/// Shared between statement dispatch and expression-position builtin lookup,
/// since e.g. `bf` is valid in both contexts.
fn resolve_alias(word: &str) -> &str {
    match word {
        "fd" => "forward",
        "bk" => "back",
        "rt" => "right",
        "lt" => "left",
        "pu" => "penup",
        "pd" => "pendown",
        "pc" => "pencolor",
        "ps" => "pensize",
        "cs" => "clearscreen",
        "ht" => "hideturtle",
        "st" => "showturtle",
        "seth" => "setheading",
        "bf" => "butfirst",
        "bl" => "butlast",
        "op" => "output",
        other => other,
    }
}

fn is_statement_keyword(word: &str) -> bool {
    matches!(
        word,
        "forward"
            | "back"
            | "right"
            | "left"
            | "penup"
            | "pendown"
            | "pencolor"
            | "pensize"
            | "home"
            | "setxy"
            | "setx"
            | "sety"
            | "setheading"
            | "circle"
            | "arc"
            | "clearscreen"
            | "hideturtle"
            | "showturtle"
            | "repeat"
            | "while"
            | "for"
            | "if"
            | "ifelse"
            | "to"
            | "end"
            | "stop"
            | "output"
            | "make"
            | "local"
            | "print"
            | "type"
            | "show"
    )
}

/// Is this token one that can begin an expression? Shared by statement-level
/// procedure-call argument collection and expression-level user-function-call
/// argument collection, since both are argument-greedy in the same way.
fn starts_expression(tok: &Token) -> bool {
    match tok.kind {
        TokenKind::Number
        | TokenKind::String
        | TokenKind::QuotedWord
        | TokenKind::Param
        | TokenKind::LBracket
        | TokenKind::LParen => true,
        TokenKind::Operator => tok.text == "-",
        // A following Word never starts another greedy argument -- not even
        // "not" or a builtin name -- so a call's argument list always ends at
        // the next command.
        _ => false,
    }
}

pub fn parse(source: &str) -> Result<Vec<Stmt>, crate::error::Error> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    Ok(parser.parse_program()?)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn skip_newlines(&mut self) {
        while self.peek().kind == TokenKind::Newline {
            self.advance();
        }
    }

    fn err(&self, error_type: ParseErrorType, pos: Position) -> ParseError {
        ParseError { error_type, pos }
    }

    fn expect_kind(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            let pos = self.peek().pos;
            Err(self.err(ParseErrorType::UnexpectedToken(what.to_string()), pos))
        }
    }

    fn word_lower(&self) -> Option<String> {
        if self.peek().kind == TokenKind::Word {
            Some(self.peek().text.to_lowercase())
        } else {
            None
        }
    }

    fn parse_program(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while self.peek().kind != TokenKind::Eof {
            stmts.push(self.parse_statement()?);
            self.skip_newlines();
        }
        Ok(stmts)
    }

    /// Parses `[...]` as a list of statements (repeat/if/ifelse/for/to bodies).
    fn parse_stmt_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let open = self.peek().pos;
        self.expect_kind(TokenKind::LBracket, "[")?;
        let mut stmts = Vec::new();
        self.skip_newlines();
        loop {
            if self.peek().kind == TokenKind::RBracket {
                self.advance();
                return Ok(stmts);
            }
            if self.peek().kind == TokenKind::Eof {
                return Err(self.err(ParseErrorType::UnclosedBracket, open));
            }
            stmts.push(self.parse_statement()?);
            self.skip_newlines();
        }
    }

    /// Parses `[ EXPR ]`: the `while` condition block wraps a single expression.
    fn parse_expr_block(&mut self) -> Result<Expr, ParseError> {
        let open = self.peek().pos;
        self.expect_kind(TokenKind::LBracket, "[")?;
        let expr = self.parse_or()?;
        if self.peek().kind != TokenKind::RBracket {
            return Err(self.err(ParseErrorType::UnclosedBracket, open));
        }
        self.advance();
        Ok(expr)
    }

    /// Parses `[...]` as a list *literal*: numbers are numbers, `:param`s are
    /// evaluated at construction time, bare words are text atoms (not variable
    /// lookups), and nested `[...]` recurse.
    fn parse_list_literal_items(&mut self) -> Result<Vec<ListItem>, ParseError> {
        let open = self.peek().pos;
        self.expect_kind(TokenKind::LBracket, "[")?;
        let mut items = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::RBracket => {
                    self.advance();
                    return Ok(items);
                }
                TokenKind::Eof => return Err(self.err(ParseErrorType::UnclosedBracket, open)),
                TokenKind::Newline => {
                    self.advance();
                }
                TokenKind::Number => {
                    let tok = self.advance();
                    items.push(ListItem::Number(tok.number));
                }
                TokenKind::String => {
                    let tok = self.advance();
                    items.push(ListItem::Word(tok.text));
                }
                TokenKind::Word | TokenKind::QuotedWord => {
                    let tok = self.advance();
                    items.push(ListItem::Word(tok.text));
                }
                TokenKind::Param => {
                    let tok = self.advance();
                    items.push(ListItem::Param(tok.text, tok.pos));
                }
                TokenKind::LBracket => {
                    items.push(ListItem::List(self.parse_list_literal_items()?));
                }
                _ => {
                    let pos = self.peek().pos;
                    let text = self.peek().text.clone();
                    return Err(self.err(ParseErrorType::UnexpectedToken(text), pos));
                }
            }
        }
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let tok = self.peek().clone();
        if tok.kind != TokenKind::Word {
            return Err(self.err(
                ParseErrorType::UnexpectedToken(tok.text.clone()),
                tok.pos,
            ));
        }
        let word = resolve_alias(&tok.text.to_lowercase()).to_string();
        let pos = tok.pos;

        macro_rules! one_arg_move {
            ($kind:expr) => {{
                self.advance();
                let e = self.parse_or()?;
                Ok(Stmt::Move($kind, e, pos))
            }};
        }

        match word.as_str() {
            "forward" => one_arg_move!(MoveKind::Forward),
            "back" => one_arg_move!(MoveKind::Back),
            "right" => one_arg_move!(MoveKind::Right),
            "left" => one_arg_move!(MoveKind::Left),
            "penup" => {
                self.advance();
                Ok(Stmt::PenUp(pos))
            }
            "pendown" => {
                self.advance();
                Ok(Stmt::PenDown(pos))
            }
            "pencolor" => {
                self.advance();
                Ok(Stmt::PenColor(self.parse_or()?, pos))
            }
            "pensize" => {
                self.advance();
                Ok(Stmt::PenSize(self.parse_or()?, pos))
            }
            "home" => {
                self.advance();
                Ok(Stmt::Home(pos))
            }
            "setxy" => {
                self.advance();
                let x = self.parse_or()?;
                let y = self.parse_or()?;
                Ok(Stmt::SetXY(x, y, pos))
            }
            "setx" => {
                self.advance();
                Ok(Stmt::SetX(self.parse_or()?, pos))
            }
            "sety" => {
                self.advance();
                Ok(Stmt::SetY(self.parse_or()?, pos))
            }
            "setheading" => {
                self.advance();
                Ok(Stmt::SetHeading(self.parse_or()?, pos))
            }
            "circle" => {
                self.advance();
                Ok(Stmt::Circle(self.parse_or()?, pos))
            }
            "arc" => {
                self.advance();
                let a = self.parse_or()?;
                let r = self.parse_or()?;
                Ok(Stmt::Arc(a, r, pos))
            }
            "clearscreen" => {
                self.advance();
                Ok(Stmt::ClearScreen(pos))
            }
            "hideturtle" => {
                self.advance();
                Ok(Stmt::HideTurtle(pos))
            }
            "showturtle" => {
                self.advance();
                Ok(Stmt::ShowTurtle(pos))
            }
            "repeat" => {
                self.advance();
                let n = self.parse_or()?;
                let body = self.parse_stmt_block()?;
                Ok(Stmt::Repeat(n, body, pos))
            }
            "while" => {
                self.advance();
                let cond = self.parse_expr_block()?;
                let body = self.parse_stmt_block()?;
                Ok(Stmt::While(cond, body, pos))
            }
            "for" => self.parse_for(pos),
            "if" => {
                self.advance();
                let cond = self.parse_or()?;
                let then_body = self.parse_stmt_block()?;
                Ok(Stmt::If(cond, then_body, pos))
            }
            "ifelse" => {
                self.advance();
                let cond = self.parse_or()?;
                let then_body = self.parse_stmt_block()?;
                self.skip_newlines();
                let else_body = self.parse_stmt_block()?;
                Ok(Stmt::IfElse(cond, then_body, else_body, pos))
            }
            "to" => self.parse_define(pos),
            "end" => Err(self.err(ParseErrorType::UnexpectedToken("end".to_string()), pos)),
            "stop" => {
                self.advance();
                Ok(Stmt::Stop(pos))
            }
            "output" => {
                self.advance();
                Ok(Stmt::Output(self.parse_or()?, pos))
            }
            "make" => {
                self.advance();
                let name = self.expect_quoted_name()?;
                let value = self.parse_or()?;
                Ok(Stmt::Make(name, value, pos))
            }
            "local" => {
                self.advance();
                let name = self.expect_quoted_name()?;
                Ok(Stmt::Local(name, pos))
            }
            "print" => {
                self.advance();
                Ok(Stmt::Print(self.parse_or()?, pos))
            }
            "type" => {
                self.advance();
                Ok(Stmt::Type(self.parse_or()?, pos))
            }
            "show" => {
                self.advance();
                Ok(Stmt::Show(self.parse_or()?, pos))
            }
            _ => {
                // Unknown word: a call to a user-defined procedure, greedily
                // consuming argument expressions (never a following Word).
                self.advance();
                let args = self.collect_greedy_args()?;
                Ok(Stmt::Call(word, args, pos))
            }
        }
    }

    /// `"word` is how Logo spells a bareword atom used as a name argument
    /// (e.g. `make "x ...`, `local "v`).
    fn expect_quoted_name(&mut self) -> Result<String, ParseError> {
        if self.peek().kind == TokenKind::QuotedWord {
            Ok(self.advance().text)
        } else {
            let pos = self.peek().pos;
            Err(self.err(ParseErrorType::ExpectedWord, pos))
        }
    }

    fn parse_for(&mut self, pos: Position) -> Result<Stmt, ParseError> {
        self.advance(); // 'for'
        let var = self.expect_quoted_name()?;
        let start = self.parse_or()?;
        let end = self.parse_or()?;
        let step = if self.peek().kind == TokenKind::LBracket {
            None
        } else {
            Some(self.parse_or()?)
        };
        let body = self.parse_stmt_block()?;
        Ok(Stmt::For(var, start, end, step, body, pos))
    }

    fn parse_define(&mut self, pos: Position) -> Result<Stmt, ParseError> {
        self.advance(); // 'to'
        let name = self.expect_word_token()?;
        let mut params = Vec::new();
        while self.peek().kind == TokenKind::Param {
            params.push(self.advance().text);
        }
        self.skip_newlines();
        let mut body = Vec::new();
        loop {
            self.skip_newlines();
            match self.word_lower() {
                Some(w) if w == "end" => {
                    self.advance();
                    break;
                }
                Some(w) if w == "to" => {
                    let pos = self.peek().pos;
                    return Err(self.err(
                        ParseErrorType::UnexpectedToken("to".to_string()),
                        pos,
                    ));
                }
                _ => {
                    if self.peek().kind == TokenKind::Eof {
                        return Err(self.err(ParseErrorType::MissingEnd, pos));
                    }
                    body.push(self.parse_statement()?);
                }
            }
        }
        Ok(Stmt::Define(
            Procedure {
                name: name.to_lowercase(),
                params,
                body,
            },
            pos,
        ))
    }

    fn expect_word_token(&mut self) -> Result<String, ParseError> {
        if self.peek().kind == TokenKind::Word {
            Ok(self.advance().text)
        } else {
            let pos = self.peek().pos;
            Err(self.err(ParseErrorType::ExpectedWord, pos))
        }
    }

    /// Greedily collects expression arguments while the next token starts an
    /// expression; stops at a following Word (the next command).
    fn collect_greedy_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        while starts_expression(self.peek()) {
            args.push(self.parse_or()?);
        }
        Ok(args)
    }

    // ---- expression grammar, lowest to highest precedence ----

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.word_lower().as_deref() == Some("or") {
            let pos = self.peek().pos;
            self.advance();
            let right = self.parse_and()?;
            left = Expr::BinOp(BinOp::Or, Box::new(left), Box::new(right), pos);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;
        while self.word_lower().as_deref() == Some("and") {
            let pos = self.peek().pos;
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::BinOp(BinOp::And, Box::new(left), Box::new(right), pos);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_additive()?;
        let op = match self.peek().text.as_str() {
            "=" if self.peek().kind == TokenKind::Operator => Some(BinOp::Eq),
            "<" if self.peek().kind == TokenKind::Operator => Some(BinOp::Lt),
            ">" if self.peek().kind == TokenKind::Operator => Some(BinOp::Gt),
            "<=" if self.peek().kind == TokenKind::Operator => Some(BinOp::Le),
            ">=" if self.peek().kind == TokenKind::Operator => Some(BinOp::Ge),
            "<>" if self.peek().kind == TokenKind::Operator => Some(BinOp::Ne),
            _ => None,
        };
        match op {
            Some(op) => {
                let pos = self.peek().pos;
                self.advance();
                let right = self.parse_additive()?;
                Ok(Expr::BinOp(op, Box::new(left), Box::new(right), pos))
            }
            None => Ok(left),
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = if self.peek().is_operator("+") {
                Some(BinOp::Add)
            } else if self.peek().is_operator("-") {
                Some(BinOp::Sub)
            } else {
                None
            };
            match op {
                Some(op) => {
                    let pos = self.peek().pos;
                    self.advance();
                    let right = self.parse_multiplicative()?;
                    left = Expr::BinOp(op, Box::new(left), Box::new(right), pos);
                }
                None => return Ok(left),
            }
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = if self.peek().is_operator("*") {
                Some(BinOp::Mul)
            } else if self.peek().is_operator("/") {
                Some(BinOp::Div)
            } else if self.peek().is_operator("%") {
                Some(BinOp::Mod)
            } else {
                None
            };
            match op {
                Some(op) => {
                    let pos = self.peek().pos;
                    self.advance();
                    let right = self.parse_unary()?;
                    left = Expr::BinOp(op, Box::new(left), Box::new(right), pos);
                }
                None => return Ok(left),
            }
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.peek().is_operator("-") {
            let pos = self.peek().pos;
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(operand), pos));
        }
        if self.word_lower().as_deref() == Some("not") {
            let pos = self.peek().pos;
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(operand), pos));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Number => {
                self.advance();
                Ok(Expr::NumberLit(tok.number, tok.pos))
            }
            TokenKind::String | TokenKind::QuotedWord => {
                self.advance();
                Ok(Expr::TextLit(tok.text, tok.pos))
            }
            TokenKind::Param => {
                self.advance();
                Ok(Expr::Var(tok.text, tok.pos))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_or()?;
                if self.peek().kind != TokenKind::RParen {
                    return Err(self.err(ParseErrorType::UnclosedParen, tok.pos));
                }
                self.advance();
                Ok(expr)
            }
            TokenKind::LBracket => {
                let items = self.parse_list_literal_items()?;
                Ok(Expr::ListLit(items, tok.pos))
            }
            TokenKind::Word => self.parse_word_primary(tok),
            _ => Err(self.err(ParseErrorType::MissingOperand, tok.pos)),
        }
    }

    fn parse_word_primary(&mut self, tok: Token) -> Result<Expr, ParseError> {
        let word = resolve_alias(&tok.text.to_lowercase()).to_string();
        let pos = tok.pos;

        if is_statement_keyword(&word) {
            return Err(self.err(ParseErrorType::KeywordInExpression(word), pos));
        }

        macro_rules! b1 {
            ($variant:expr) => {{
                self.advance();
                let e = self.parse_unary()?;
                Ok(Expr::Builtin1($variant, Box::new(e), pos))
            }};
        }
        macro_rules! b2 {
            ($variant:expr) => {{
                self.advance();
                let a = self.parse_unary()?;
                let b = self.parse_unary()?;
                Ok(Expr::Builtin2($variant, Box::new(a), Box::new(b), pos))
            }};
        }

        match word.as_str() {
            "sqrt" => b1!(Builtin1::Sqrt),
            "abs" => b1!(Builtin1::Abs),
            "int" => b1!(Builtin1::Int),
            "round" => b1!(Builtin1::Round),
            "sin" => b1!(Builtin1::Sin),
            "cos" => b1!(Builtin1::Cos),
            "tan" => b1!(Builtin1::Tan),
            "first" => b1!(Builtin1::First),
            "last" => b1!(Builtin1::Last),
            "butfirst" => b1!(Builtin1::ButFirst),
            "butlast" => b1!(Builtin1::ButLast),
            "count" => b1!(Builtin1::Count),
            "thing" => b1!(Builtin1::Thing),
            "random" => b1!(Builtin1::Random),
            "sum" => b2!(Builtin2::Sum),
            "difference" => b2!(Builtin2::Difference),
            "product" => b2!(Builtin2::Product),
            "quotient" => b2!(Builtin2::Quotient),
            "remainder" => b2!(Builtin2::Remainder),
            "power" => b2!(Builtin2::Power),
            "item" => b2!(Builtin2::Item),
            "word" => b2!(Builtin2::Word),
            "towards" => b2!(Builtin2::Towards),
            "fput" => b2!(Builtin2::Fput),
            "lput" => b2!(Builtin2::Lput),
            "xcor" => {
                self.advance();
                Ok(Expr::State(StateReporter::Xcor, pos))
            }
            "ycor" => {
                self.advance();
                Ok(Expr::State(StateReporter::Ycor, pos))
            }
            "heading" => {
                self.advance();
                Ok(Expr::State(StateReporter::Heading, pos))
            }
            "pendown?" => {
                self.advance();
                Ok(Expr::State(StateReporter::PenDownP, pos))
            }
            "atan" => {
                self.advance();
                let first = self.parse_unary()?;
                let second = if starts_expression(self.peek()) {
                    Some(Box::new(self.parse_unary()?))
                } else {
                    None
                };
                Ok(Expr::Atan(Box::new(first), second, pos))
            }
            "list" => {
                self.advance();
                let args = self.collect_greedy_args()?;
                Ok(Expr::BuiltinList(args, pos))
            }
            "sentence" => {
                self.advance();
                let a = self.parse_unary()?;
                let b = self.parse_unary()?;
                Ok(Expr::Sentence(Box::new(a), Box::new(b), pos))
            }
            _ => {
                self.advance();
                let args = self.collect_greedy_args()?;
                Ok(Expr::FunCall(word, args, pos))
            }
        }
    }
}
