//! Recursive-descent, precedence-climbing parser over the token stream
//! produced by `lexer` (§10.1).
//!
//! Grounded on the teacher's `parser/parser.rs` `Parser { tokens, pos }`
//! cursor idiom (`peek`/`advance`/`check_iteration_limit`-style helpers);
//! the grammar itself is REXX's, not bash's.
//!
//! Two deliberate simplifications versus classical REXX surface syntax,
//! recorded in DESIGN.md: every `IF`/`DO`/`SELECT` requires an explicit
//! `END`, and string concatenation requires the explicit `||` operator —
//! classical REXX's "adjacent terms separated only by a blank concatenate"
//! rule depends on preserved inter-token whitespace, which `lexer::Lexer`
//! does not retain.

use super::lexer::{Lexer, SpannedToken, Token};
use crate::ast::{
    ArithOp, CallArg, Command, CommandKind, CompareOp, DoKind, DoNode, Expr, InterpretMode,
    LogicalOp, NumericSetting, ParseNode, ParseSource, ParseTemplatePart, Script, SignalNode,
    StringTemplate, TraceMode, UnaryOp, WhenClause,
};

/// Clause/block keywords that terminate an expression even though they are
/// lexed as plain identifiers.
const STOPWORDS: &[&str] = &[
    "THEN", "ELSE", "END", "TO", "BY", "WHILE", "UNTIL", "OVER", "FOREVER", "WHEN", "OTHERWISE",
    "WITH", "AS", "IMPORT", "EXPORT", "PRESERVE", "DEADLINE", "CLASSIC", "ISOLATED", "DO",
];

pub fn parse_script(source: &str) -> Result<Script, String> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    let mut commands = Vec::new();
    loop {
        parser.skip_newlines();
        if parser.is_eof() {
            break;
        }
        commands.push(parser.parse_statement()?);
    }
    Ok(Script { commands })
}

pub fn parse_expression_str(source: &str) -> Result<Expr, String> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.skip_newlines();
    let expr = parser.parse_expr()?;
    parser.skip_newlines();
    if !parser.is_eof() {
        return Err(format!("unexpected trailing tokens after expression: {:?}", parser.peek()));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|t| &t.token)
    }

    fn peek_line(&self) -> u32 {
        self.tokens[self.pos].line
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].token.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn is_eof(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn at_newline_or_eof(&self) -> bool {
        matches!(self.peek(), Token::Newline | Token::Eof)
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Token::Newline) {
            self.advance();
        }
    }

    fn peek_op(&self, op: &str) -> bool {
        matches!(self.peek(), Token::Op(s) if s == op)
    }

    fn peek_op_any(&self, ops: &[&str]) -> Option<String> {
        if let Token::Op(s) = self.peek() {
            if ops.contains(&s.as_str()) {
                return Some(s.clone());
            }
        }
        None
    }

    fn peek_ident_ci(&self, word: &str) -> bool {
        matches!(self.peek(), Token::Ident(w) if w.eq_ignore_ascii_case(word))
    }

    fn at_terminator(&self, terminators: &[&str]) -> bool {
        if let Token::Ident(w) = self.peek() {
            terminators.iter().any(|t| w.eq_ignore_ascii_case(t))
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> Result<String, String> {
        match self.advance() {
            Token::Ident(name) => Ok(name),
            other => Err(format!("expected identifier, found {:?} at line {}", other, self.peek_line())),
        }
    }

    fn expect_ident_ci(&mut self, expected: &str) -> Result<(), String> {
        match self.advance() {
            Token::Ident(w) if w.eq_ignore_ascii_case(expected) => Ok(()),
            other => Err(format!("expected '{}', found {:?} at line {}", expected, other, self.peek_line())),
        }
    }

    fn expect_str(&mut self) -> Result<String, String> {
        match self.advance() {
            Token::Str(s) => Ok(s),
            other => Err(format!("expected string literal, found {:?} at line {}", other, self.peek_line())),
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<(), String> {
        match self.advance() {
            Token::Op(s) if s == op => Ok(()),
            other => Err(format!("expected '{}', found {:?} at line {}", op, other, self.peek_line())),
        }
    }

    fn parse_ident_list(&mut self) -> Result<Vec<String>, String> {
        let mut out = vec![self.expect_ident()?];
        while self.peek_op(",") {
            self.advance();
            out.push(self.expect_ident()?);
        }
        Ok(out)
    }

    fn parse_block(&mut self, terminators: &[&str]) -> Result<Vec<Command>, String> {
        let mut body = Vec::new();
        loop {
            self.skip_newlines();
            if self.at_terminator(terminators) || self.is_eof() {
                break;
            }
            body.push(self.parse_statement()?);
        }
        Ok(body)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_statement(&mut self) -> Result<Command, String> {
        let line = self.peek_line();

        if let Token::Ident(name) = self.peek().clone() {
            if self.peek_at(1) == Some(&Token::Op(":".to_string())) {
                self.advance();
                self.advance();
                return Ok(Command::new(line, CommandKind::Label { name }));
            }
        }

        match self.peek().clone() {
            Token::Str(s) => {
                self.advance();
                Ok(Command::new(line, CommandKind::QuotedString { template: StringTemplate::literal(s) }))
            }
            Token::Ident(word) => match word.to_ascii_uppercase().as_str() {
                "LET" => {
                    self.advance();
                    self.parse_assignment(line)
                }
                "SAY" => {
                    self.advance();
                    let value = self.parse_expr()?;
                    Ok(Command::new(line, CommandKind::Say { value }))
                }
                "IF" => self.parse_if(line),
                "DO" => self.parse_do(line),
                "SELECT" => self.parse_select(line),
                "CALL" => self.parse_call(line),
                "RETURN" => {
                    self.advance();
                    let value = if self.at_newline_or_eof() { None } else { Some(self.parse_expr()?) };
                    Ok(Command::new(line, CommandKind::Return { value }))
                }
                "EXIT" => {
                    self.advance();
                    let code = if self.at_newline_or_eof() { None } else { Some(self.parse_expr()?) };
                    Ok(Command::new(line, CommandKind::Exit { code }))
                }
                "ADDRESS" => self.parse_address(line),
                "SIGNAL" => self.parse_signal(line),
                "NUMERIC" => self.parse_numeric(line),
                "PARSE" => self.parse_parse(line),
                "PUSH" => {
                    self.advance();
                    let value = self.parse_expr()?;
                    Ok(Command::new(line, CommandKind::Push { value }))
                }
                "QUEUE" => {
                    self.advance();
                    let value = self.parse_expr()?;
                    Ok(Command::new(line, CommandKind::Queue { value }))
                }
                "PULL" => {
                    self.advance();
                    let variable = if self.at_newline_or_eof() { None } else { Some(self.expect_ident()?) };
                    Ok(Command::new(line, CommandKind::Pull { variable }))
                }
                "TRACE" => self.parse_trace(line),
                "INTERPRET" => self.parse_interpret(line),
                "NOINTERPRET" => {
                    self.advance();
                    Ok(Command::new(line, CommandKind::NoInterpret))
                }
                "RETRY_ON_STALE" => self.parse_retry_on_stale(line),
                "REQUIRE" => self.parse_require(line),
                _ => self.parse_assignment_or_call(line),
            },
            other => Err(format!("unexpected token {:?} at line {}", other, line)),
        }
    }

    fn parse_assignment(&mut self, line: u32) -> Result<Command, String> {
        let variable = self.expect_ident()?;
        self.expect_op("=")?;
        let value = self.parse_expr()?;
        Ok(Command::new(line, CommandKind::Assignment { variable, value }))
    }

    fn parse_assignment_or_call(&mut self, line: u32) -> Result<Command, String> {
        let name = self.expect_ident()?;
        match self.peek().clone() {
            Token::Op(op) if op == "=" => {
                self.advance();
                let value = self.parse_expr()?;
                Ok(Command::new(line, CommandKind::Assignment { variable: name, value }))
            }
            Token::Op(op) if op == "(" => {
                self.advance();
                let call_args = self.parse_call_args()?;
                self.expect_op(")")?;
                Ok(Command::new(line, CommandKind::FunctionCall { name, args: call_args_to_exprs(call_args) }))
            }
            other => Err(format!(
                "expected '=' or '(' after identifier '{}', found {:?} at line {}",
                name, other, line
            )),
        }
    }

    fn parse_if(&mut self, line: u32) -> Result<Command, String> {
        self.advance();
        let condition = self.parse_expr()?;
        self.expect_ident_ci("THEN")?;
        let then_body = self.parse_block(&["ELSE", "END"])?;
        let else_body = if self.at_terminator(&["ELSE"]) {
            self.advance();
            Some(self.parse_block(&["END"])?)
        } else {
            None
        };
        self.expect_ident_ci("END")?;
        Ok(Command::new(line, CommandKind::If { condition, then_body, else_body }))
    }

    fn parse_select(&mut self, line: u32) -> Result<Command, String> {
        self.advance();
        self.skip_newlines();
        let mut whens = Vec::new();
        while self.at_terminator(&["WHEN"]) {
            self.advance();
            let condition = self.parse_expr()?;
            self.expect_ident_ci("THEN")?;
            let body = self.parse_block(&["WHEN", "OTHERWISE", "END"])?;
            whens.push(WhenClause { condition, body });
            self.skip_newlines();
        }
        if whens.is_empty() {
            return Err(format!("SELECT with no WHEN clauses at line {}", line));
        }
        let otherwise = if self.at_terminator(&["OTHERWISE"]) {
            self.advance();
            Some(self.parse_block(&["END"])?)
        } else {
            None
        };
        self.expect_ident_ci("END")?;
        Ok(Command::new(line, CommandKind::Select { whens, otherwise }))
    }

    fn parse_do(&mut self, line: u32) -> Result<Command, String> {
        self.advance();

        let kind = if self.at_terminator(&["WHILE"]) {
            self.advance();
            let condition = self.parse_expr()?;
            DoKind::While { condition }
        } else if self.at_terminator(&["UNTIL"]) {
            self.advance();
            let condition = self.parse_expr()?;
            DoKind::Until { condition }
        } else if self.at_terminator(&["FOREVER"]) {
            self.advance();
            DoKind::Forever
        } else if matches!(self.peek(), Token::Ident(_)) && self.peek_at(1) == Some(&Token::Op("=".to_string()))
        {
            let variable = self.expect_ident()?;
            self.advance();
            let start = self.parse_expr()?;
            self.expect_ident_ci("TO")?;
            let end = self.parse_expr()?;
            let step = if self.at_terminator(&["BY"]) {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };
            DoKind::Range { variable, start, end, step }
        } else if matches!(self.peek(), Token::Ident(_))
            && matches!(self.peek_at(1), Some(Token::Ident(w)) if w.eq_ignore_ascii_case("OVER"))
        {
            let variable = self.expect_ident()?;
            self.advance();
            let collection = self.parse_expr()?;
            DoKind::Over { variable, collection }
        } else {
            let count = self.parse_expr()?;
            DoKind::Repeat { count }
        };

        let body = self.parse_block(&["END"])?;
        self.expect_ident_ci("END")?;
        Ok(Command::new(line, CommandKind::Do(DoNode { body, kind })))
    }

    fn parse_call(&mut self, line: u32) -> Result<Command, String> {
        self.advance();
        let subroutine = self.expect_ident()?;
        let mut arguments = Vec::new();
        if !self.at_newline_or_eof() {
            loop {
                arguments.push(self.parse_expr()?);
                if self.peek_op(",") {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        Ok(Command::new(line, CommandKind::Call { subroutine, arguments }))
    }

    fn parse_address(&mut self, line: u32) -> Result<Command, String> {
        self.advance();
        let target = self.expect_ident()?;
        if let Token::Str(_) = self.peek() {
            let command_string = StringTemplate::literal(self.expect_str()?);
            Ok(Command::new(line, CommandKind::AddressWithString { target, command_string }))
        } else {
            Ok(Command::new(line, CommandKind::Address { target }))
        }
    }

    fn parse_signal(&mut self, line: u32) -> Result<Command, String> {
        self.advance();
        let node = if self.at_terminator(&["ON"]) {
            self.advance();
            let condition = self.expect_ident()?;
            self.expect_ident_ci("NAME")?;
            let label = self.expect_ident()?;
            SignalNode::On { condition, label }
        } else if self.at_terminator(&["OFF"]) {
            self.advance();
            let condition = self.expect_ident()?;
            SignalNode::Off { condition }
        } else {
            let label = self.expect_ident()?;
            SignalNode::Jump { label }
        };
        Ok(Command::new(line, CommandKind::Signal(node)))
    }

    fn parse_numeric(&mut self, line: u32) -> Result<Command, String> {
        self.advance();
        let keyword = self.expect_ident()?;
        let setting = match keyword.to_ascii_uppercase().as_str() {
            "DIGITS" => NumericSetting::Digits,
            "FUZZ" => NumericSetting::Fuzz,
            "FORM" => NumericSetting::Form,
            other => return Err(format!("unknown NUMERIC setting '{}' at line {}", other, line)),
        };
        let value = self.parse_expr()?;
        Ok(Command::new(line, CommandKind::Numeric { setting, value }))
    }

    fn parse_parse(&mut self, line: u32) -> Result<Command, String> {
        self.advance();
        let keyword = self.expect_ident()?;
        let source = match keyword.to_ascii_uppercase().as_str() {
            "ARG" => ParseSource::Arg,
            "VALUE" => {
                let expr = self.parse_expr()?;
                self.expect_ident_ci("WITH")?;
                ParseSource::Value(expr)
            }
            "VAR" => {
                let name = self.expect_ident()?;
                self.expect_ident_ci("WITH")?;
                ParseSource::Var(name)
            }
            other => return Err(format!("unknown PARSE source '{}' at line {}", other, line)),
        };
        let mut template = Vec::new();
        while !self.at_newline_or_eof() {
            match self.advance() {
                Token::Ident(name) => template.push(ParseTemplatePart::Variable(name)),
                Token::Str(lit) => template.push(ParseTemplatePart::Literal(lit)),
                other => return Err(format!("unexpected token {:?} in PARSE template at line {}", other, line)),
            }
        }
        Ok(Command::new(line, CommandKind::Parse(ParseNode { source, template })))
    }

    fn parse_trace(&mut self, line: u32) -> Result<Command, String> {
        self.advance();
        let keyword = self.expect_ident()?;
        let mode = match keyword.to_ascii_uppercase().as_str() {
            "OFF" => TraceMode::Off,
            "ALL" => TraceMode::All,
            "RESULTS" => TraceMode::Results,
            "INTERMEDIATE" => TraceMode::Intermediate,
            "NORMAL" => TraceMode::Normal,
            other => return Err(format!("unknown TRACE mode '{}' at line {}", other, line)),
        };
        Ok(Command::new(line, CommandKind::Trace { mode }))
    }

    fn parse_interpret(&mut self, line: u32) -> Result<Command, String> {
        self.advance();
        let source = self.parse_expr()?;
        let mut mode = InterpretMode::Default;
        let mut import = Vec::new();
        let mut export = Vec::new();
        loop {
            if self.at_terminator(&["CLASSIC"]) {
                self.advance();
                mode = InterpretMode::Classic;
            } else if self.at_terminator(&["ISOLATED"]) {
                self.advance();
                mode = InterpretMode::Isolated;
            } else if self.at_terminator(&["IMPORT"]) {
                self.advance();
                import = self.parse_ident_list()?;
            } else if self.at_terminator(&["EXPORT"]) {
                self.advance();
                export = self.parse_ident_list()?;
            } else {
                break;
            }
        }
        Ok(Command::new(line, CommandKind::InterpretStatement { source, mode, import, export }))
    }

    fn parse_retry_on_stale(&mut self, line: u32) -> Result<Command, String> {
        self.advance();
        let mut preserve = Vec::new();
        let mut deadline_secs = None;
        loop {
            if self.at_terminator(&["PRESERVE"]) {
                self.advance();
                preserve = self.parse_ident_list()?;
            } else if self.at_terminator(&["DEADLINE"]) {
                self.advance();
                match self.advance() {
                    Token::Number(n) => {
                        deadline_secs =
                            Some(n.parse::<f64>().map_err(|e| format!("invalid DEADLINE value: {}", e))?)
                    }
                    other => return Err(format!("expected a number after DEADLINE, found {:?}", other)),
                }
            } else {
                break;
            }
        }
        self.expect_ident_ci("DO")?;
        let body = self.parse_block(&["END"])?;
        self.expect_ident_ci("END")?;
        Ok(Command::new(line, CommandKind::RetryOnStale { body, preserve, deadline_secs }))
    }

    fn parse_require(&mut self, line: u32) -> Result<Command, String> {
        self.advance();
        let path = self.expect_str()?;
        let mut args = vec![Expr::StringLiteral(path)];
        if self.at_terminator(&["AS"]) {
            self.advance();
            let clause = self.expect_str()?;
            args.push(Expr::Comparison {
                op: CompareOp::EqLoose,
                left: Box::new(Expr::Variable("AS".to_string())),
                right: Box::new(Expr::StringLiteral(clause)),
            });
        }
        Ok(Command::new(line, CommandKind::FunctionCall { name: "REQUIRE".to_string(), args }))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expr(&mut self) -> Result<Expr, String> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and()?;
        while self.peek_op("|") {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Logical { op: LogicalOp::Or, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_comparison()?;
        while self.peek_op("&") {
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Logical { op: LogicalOp::And, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_concat()?;
        loop {
            let op_text = match self.peek_op_any(&[
                "==", "\\==", "\u{ac}==", "=", "\\=", "\u{ac}=", "<>", "<=", ">=", "<", ">",
            ]) {
                Some(s) => s,
                None => break,
            };
            self.advance();
            let op = match op_text.as_str() {
                "==" => CompareOp::EqStrict,
                "\\==" | "\u{ac}==" => CompareOp::NeStrict,
                "=" => CompareOp::EqLoose,
                "\\=" | "\u{ac}=" | "<>" => CompareOp::NeLoose,
                "<=" => CompareOp::Le,
                ">=" => CompareOp::Ge,
                "<" => CompareOp::Lt,
                ">" => CompareOp::Gt,
                _ => unreachable!(),
            };
            let right = self.parse_concat()?;
            left = Expr::Comparison { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_concat(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_additive()?;
        while self.peek_op("||") {
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Concat { strict: true, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = if self.peek_op("+") {
                ArithOp::Add
            } else if self.peek_op("-") {
                ArithOp::Sub
            } else {
                break;
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Arithmetic { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_power()?;
        loop {
            let op = if self.peek_op("*") {
                ArithOp::Mul
            } else if self.peek_op("/") {
                ArithOp::Div
            } else if self.peek_op("%") {
                ArithOp::IntDiv
            } else if self.peek_op("//") {
                ArithOp::Modulo
            } else {
                break;
            };
            self.advance();
            let right = self.parse_power()?;
            left = Expr::Arithmetic { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Expr, String> {
        let left = self.parse_unary()?;
        if self.peek_op("**") {
            self.advance();
            let right = self.parse_power()?;
            Ok(Expr::Arithmetic { op: ArithOp::Power, left: Box::new(left), right: Box::new(right) })
        } else {
            Ok(left)
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        if self.peek_op("-") {
            self.advance();
            let operand = self.parse_unary()?;
            Ok(Expr::Unary { op: UnaryOp::Negate, operand: Box::new(operand) })
        } else if self.peek_op("+") {
            self.advance();
            let operand = self.parse_unary()?;
            Ok(Expr::Unary { op: UnaryOp::Plus, operand: Box::new(operand) })
        } else if self.peek_op("\\") || self.peek_op("\u{ac}") {
            self.advance();
            let operand = self.parse_unary()?;
            Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand) })
        } else if self.peek_ident_ci("NOT") {
            self.advance();
            let operand = self.parse_unary()?;
            Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand) })
        } else {
            self.parse_primary()
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        let line = self.peek_line();
        match self.advance() {
            Token::Number(n) => {
                if n.contains('.') || n.to_ascii_lowercase().contains('e') {
                    n.parse::<f64>().map(Expr::FloatLiteral).map_err(|e| e.to_string())
                } else {
                    n.parse::<i64>().map(Expr::IntLiteral).map_err(|e| e.to_string())
                }
            }
            Token::Str(s) => Ok(Expr::StringLiteral(s)),
            Token::Ident(word) => {
                if word.eq_ignore_ascii_case("TRUE") {
                    Ok(Expr::BoolLiteral(true))
                } else if word.eq_ignore_ascii_case("FALSE") {
                    Ok(Expr::BoolLiteral(false))
                } else if self.peek_op("(") {
                    self.advance();
                    let args = self.parse_call_args()?;
                    self.expect_op(")")?;
                    Ok(Expr::FunctionCall { name: word, args })
                } else {
                    Ok(Expr::Variable(word))
                }
            }
            Token::Op(op) if op == "(" => {
                let inner = self.parse_expr()?;
                self.expect_op(")")?;
                Ok(inner)
            }
            Token::Op(op) if op == "[" => {
                let mut items = Vec::new();
                if !self.peek_op("]") {
                    loop {
                        items.push(self.parse_expr()?);
                        if self.peek_op(",") {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect_op("]")?;
                Ok(Expr::ArrayLiteral(items))
            }
            other => Err(format!("unexpected token {:?} in expression at line {}", other, line)),
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<CallArg>, String> {
        let mut args = Vec::new();
        if self.peek_op(")") {
            return Ok(args);
        }
        loop {
            if let Token::Ident(name) = self.peek().clone() {
                if self.peek_at(1) == Some(&Token::Op("=".to_string())) && !STOPWORDS.contains(&name.to_ascii_uppercase().as_str())
                {
                    self.advance();
                    self.advance();
                    let value = self.parse_expr()?;
                    args.push(CallArg::named(name, value));
                    if self.peek_op(",") {
                        self.advance();
                        continue;
                    } else {
                        break;
                    }
                }
            }
            let value = self.parse_expr()?;
            args.push(CallArg::positional(value));
            if self.peek_op(",") {
                self.advance();
            } else {
                break;
            }
        }
        Ok(args)
    }
}

/// Inverse of the engine's `to_call_args`: a statement-level `FunctionCall`
/// has a flat `Vec<Expr>` with no separate name slots, so a named argument is
/// represented as the same loose-equality `Comparison` shape.
fn call_args_to_exprs(args: Vec<CallArg>) -> Vec<Expr> {
    args.into_iter()
        .map(|arg| match arg.name {
            Some(name) => Expr::Comparison {
                op: CompareOp::EqLoose,
                left: Box::new(Expr::Variable(name)),
                right: Box::new(arg.value),
            },
            None => arg.value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ArithOp, CommandKind, Expr};

    #[test]
    fn parses_simple_assignment_and_say() {
        let script = parse_script("x = 1 + 2\nSAY x\n").unwrap();
        assert_eq!(script.commands.len(), 2);
        match &script.commands[0].kind {
            CommandKind::Assignment { variable, value } => {
                assert_eq!(variable, "x");
                assert_eq!(
                    *value,
                    Expr::Arithmetic {
                        op: ArithOp::Add,
                        left: Box::new(Expr::IntLiteral(1)),
                        right: Box::new(Expr::IntLiteral(2)),
                    }
                );
            }
            other => panic!("expected assignment, got {:?}", other),
        }
        assert!(matches!(&script.commands[1].kind, CommandKind::Say { .. }));
    }

    #[test]
    fn parses_if_then_else_end() {
        let script = parse_script("IF x > 1 THEN\nSAY \"big\"\nELSE\nSAY \"small\"\nEND\n").unwrap();
        assert_eq!(script.commands.len(), 1);
        match &script.commands[0].kind {
            CommandKind::If { then_body, else_body, .. } => {
                assert_eq!(then_body.len(), 1);
                assert_eq!(else_body.as_ref().unwrap().len(), 1);
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn parses_do_range_with_step() {
        let script = parse_script("DO i = 1 TO 10 BY 2\nSAY i\nEND\n").unwrap();
        match &script.commands[0].kind {
            CommandKind::Do(node) => match &node.kind {
                DoKind::Range { variable, step, .. } => {
                    assert_eq!(variable, "i");
                    assert!(step.is_some());
                }
                other => panic!("expected range, got {:?}", other),
            },
            other => panic!("expected do, got {:?}", other),
        }
    }

    #[test]
    fn parses_signal_on_and_labels() {
        let script = parse_script("SIGNAL ON ERROR NAME HANDLER\nEXIT 1\nHANDLER:\nSAY \"caught\"\n").unwrap();
        match &script.commands[0].kind {
            CommandKind::Signal(SignalNode::On { condition, label }) => {
                assert_eq!(condition, "ERROR");
                assert_eq!(label, "HANDLER");
            }
            other => panic!("expected SIGNAL ON, got {:?}", other),
        }
        assert!(matches!(&script.commands[2].kind, CommandKind::Label { .. }));
    }

    #[test]
    fn parses_require_with_as_clause() {
        let script = parse_script("REQUIRE \"json-utils\" AS \"util_(.*)\"\n").unwrap();
        match &script.commands[0].kind {
            CommandKind::FunctionCall { name, args } => {
                assert_eq!(name, "REQUIRE");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected function call, got {:?}", other),
        }
    }

    #[test]
    fn parses_function_call_with_named_argument() {
        let expr = parse_expression_str("ARRAY_JOIN(arr, separator = \",\")").unwrap();
        match expr {
            Expr::FunctionCall { name, args } => {
                assert_eq!(name, "ARRAY_JOIN");
                assert_eq!(args.len(), 2);
                assert_eq!(args[1].name.as_deref(), Some("separator"));
            }
            other => panic!("expected function call, got {:?}", other),
        }
    }

    #[test]
    fn strict_equality_is_distinguished_from_loose() {
        let expr = parse_expression_str("a == b").unwrap();
        assert!(matches!(expr, Expr::Comparison { op: CompareOp::EqStrict, .. }));
        let expr = parse_expression_str("a = b").unwrap();
        assert!(matches!(expr, Expr::Comparison { op: CompareOp::EqLoose, .. }));
    }
}
