//! Command-node and expression types.
//!
//! `Script` is the parser's top-level output: a flat, ordered list of
//! `Command`s, each carrying its original source line for diagnostics
//! (SPEC_FULL.md §3, "Command Node").

/// A parsed program: a flat sequence of top-level commands.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub commands: Vec<Command>,
}

/// One parsed statement, tagged per SPEC_FULL.md §3.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub line: u32,
    pub kind: CommandKind,
}

impl Command {
    pub fn new(line: u32, kind: CommandKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    /// `LET var = expr` or bare `var = expr`.
    Assignment {
        variable: String,
        value: Expr,
    },
    /// A bare function/operation call used as a statement, e.g. `REQUIRE "x"`.
    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },
    If {
        condition: Expr,
        then_body: Vec<Command>,
        else_body: Option<Vec<Command>>,
    },
    Do(DoNode),
    Select {
        whens: Vec<WhenClause>,
        otherwise: Option<Vec<Command>>,
    },
    Call {
        subroutine: String,
        arguments: Vec<Expr>,
    },
    Return {
        value: Option<Expr>,
    },
    Exit {
        code: Option<Expr>,
    },
    Say {
        value: Expr,
    },
    Address {
        target: String,
    },
    AddressWithString {
        target: String,
        command_string: StringTemplate,
    },
    QuotedString {
        template: StringTemplate,
    },
    HeredocString {
        template: StringTemplate,
    },
    Signal(SignalNode),
    Label {
        name: String,
    },
    Numeric {
        setting: NumericSetting,
        value: Expr,
    },
    Parse(ParseNode),
    Push {
        value: Expr,
    },
    Queue {
        value: Expr,
    },
    Pull {
        variable: Option<String>,
    },
    Trace {
        mode: TraceMode,
    },
    InterpretStatement {
        source: Expr,
        mode: InterpretMode,
        import: Vec<String>,
        export: Vec<String>,
    },
    NoInterpret,
    RetryOnStale {
        body: Vec<Command>,
        preserve: Vec<String>,
        deadline_secs: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhenClause {
    pub condition: Expr,
    pub body: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NumericSetting {
    Digits,
    Fuzz,
    Form,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpretMode {
    Default,
    Classic,
    Isolated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceMode {
    Off,
    All,
    Results,
    Intermediate,
    Normal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignalNode {
    On { condition: String, label: String },
    Off { condition: String },
    Jump { label: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode {
    pub source: ParseSource,
    pub template: Vec<ParseTemplatePart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseSource {
    Arg,
    Value(Expr),
    Var(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseTemplatePart {
    Variable(String),
    Literal(String),
}

/// The various `DO` shapes selected by which fields are populated,
/// per SPEC_FULL.md §4.3.
#[derive(Debug, Clone, PartialEq)]
pub struct DoNode {
    pub body: Vec<Command>,
    pub kind: DoKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DoKind {
    Range {
        variable: String,
        start: Expr,
        end: Expr,
        step: Option<Expr>,
    },
    While {
        condition: Expr,
    },
    Until {
        condition: Expr,
    },
    Repeat {
        count: Expr,
    },
    Over {
        variable: String,
        collection: Expr,
    },
    Forever,
}

/// A template string with embedded interpolation placeholders, used by
/// `SAY`, quoted-string/heredoc ADDRESS commands, and `QUOTED_STRING` nodes.
/// Interpolation itself is performed by C3 (`interpreter::interpolation`).
#[derive(Debug, Clone, PartialEq)]
pub struct StringTemplate {
    pub raw: String,
}

impl StringTemplate {
    pub fn literal(s: impl Into<String>) -> Self {
        Self { raw: s.into() }
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    StringLiteral(String),
    IntLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    Variable(String),
    ArrayLiteral(Vec<Expr>),
    Arithmetic {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Comparison {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Concat {
        strict: bool, // true: `||`, false: juxtaposition (space-joined)
        left: Box<Expr>,
        right: Box<Expr>,
    },
    FunctionCall {
        name: String,
        args: Vec<CallArg>,
    },
    MethodCall {
        target: String,
        method: String,
        args: Vec<CallArg>,
    },
}

/// A call argument, optionally named (`NAME=value`) for operations that take
/// a named-parameter mapping (C8).
#[derive(Debug, Clone, PartialEq)]
pub struct CallArg {
    pub name: Option<String>,
    pub value: Expr,
}

impl CallArg {
    pub fn positional(value: Expr) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: Expr) -> Self {
        Self { name: Some(name.into()), value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Modulo,
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    EqLoose,
    EqStrict,
    NeLoose,
    NeStrict,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}
