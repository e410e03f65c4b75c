use super::Spanned;
use serde_derive::{Deserialize, Serialize};

/// An ordered list of commands, each tagged with its source line.
pub type Commands = Vec<Spanned<Command>>;

fn join<T: std::fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<String>>()
        .join(separator)
}

/// A reference to a scalar or to a single array element.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum Identifier {
    /// `a`
    Scalar(String),
    /// `t[5]`
    Element(String, i64),
    /// `t[i]`, where `i` names a scalar
    IndexedBy(String, String),
}

impl Identifier {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::Scalar(name.into())
    }

    pub fn element(name: impl Into<String>, index: i64) -> Self {
        Self::Element(name.into(), index)
    }

    pub fn indexed_by(name: impl Into<String>, index: impl Into<String>) -> Self {
        Self::IndexedBy(name.into(), index.into())
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::Scalar(name) => write!(f, "{}", name),
            Identifier::Element(name, index) => write!(f, "{}[{}]", name, index),
            Identifier::IndexedBy(name, index) => write!(f, "{}[{}]", name, index),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum Value {
    Number(i64),
    Identifier(Identifier),
}

impl Value {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Identifier(Identifier::scalar(name))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<Identifier> for Value {
    fn from(value: Identifier) -> Self {
        Self::Identifier(value)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Identifier(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct BinaryExpression {
    pub left: Value,
    pub operator: BinaryOperator,
    pub right: Value,
}

impl std::fmt::Display for BinaryExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.left, self.operator, self.right)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum Expression {
    Value(Value),
    Binary(BinaryExpression),
}

impl Expression {
    pub fn binary(
        left: impl Into<Value>,
        operator: BinaryOperator,
        right: impl Into<Value>,
    ) -> Self {
        Self::Binary(BinaryExpression {
            left: left.into(),
            operator,
            right: right.into(),
        })
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<i64> for Expression {
    fn from(value: i64) -> Self {
        Self::Value(Value::Number(value))
    }
}

impl From<Identifier> for Expression {
    fn from(value: Identifier) -> Self {
        Self::Value(Value::Identifier(value))
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Value(v) => write!(f, "{}", v),
            Expression::Binary(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Comparison::Equal => "=",
            Comparison::NotEqual => "!=",
            Comparison::Less => "<",
            Comparison::Greater => ">",
            Comparison::LessOrEqual => "<=",
            Comparison::GreaterOrEqual => ">=",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub left: Value,
    pub operator: Comparison,
    pub right: Value,
}

impl Condition {
    pub fn new(left: impl Into<Value>, operator: Comparison, right: impl Into<Value>) -> Self {
        Self {
            left: left.into(),
            operator,
            right: right.into(),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.left, self.operator, self.right)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct IfCommand {
    pub condition: Condition,
    pub then_branch: Commands,
    pub else_branch: Option<Commands>,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct WhileCommand {
    pub condition: Condition,
    pub body: Commands,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct RepeatUntilCommand {
    pub body: Commands,
    pub condition: Condition,
}

/// Shared shape of `FOR i FROM a TO b` and `FOR i FROM a DOWNTO b`.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ForCommand {
    pub iterator: String,
    pub from: Value,
    pub to: Value,
    pub body: Commands,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct CallCommand {
    pub name: String,
    pub arguments: Vec<String>,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum Command {
    Assign {
        target: Identifier,
        expression: Expression,
    },
    If(IfCommand),
    While(WhileCommand),
    RepeatUntil(RepeatUntilCommand),
    ForTo(ForCommand),
    ForDownTo(ForCommand),
    Call(CallCommand),
    Read(Identifier),
    Write(Value),
}

impl Command {
    pub fn assign(target: Identifier, expression: impl Into<Expression>) -> Self {
        Self::Assign {
            target,
            expression: expression.into(),
        }
    }

    pub fn if_then(condition: Condition, then_branch: Commands) -> Self {
        Self::If(IfCommand {
            condition,
            then_branch,
            else_branch: None,
        })
    }

    pub fn if_else(condition: Condition, then_branch: Commands, else_branch: Commands) -> Self {
        Self::If(IfCommand {
            condition,
            then_branch,
            else_branch: Some(else_branch),
        })
    }

    pub fn while_loop(condition: Condition, body: Commands) -> Self {
        Self::While(WhileCommand { condition, body })
    }

    pub fn repeat_until(body: Commands, condition: Condition) -> Self {
        Self::RepeatUntil(RepeatUntilCommand { body, condition })
    }

    pub fn for_to(
        iterator: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
        body: Commands,
    ) -> Self {
        Self::ForTo(ForCommand {
            iterator: iterator.into(),
            from: from.into(),
            to: to.into(),
            body,
        })
    }

    pub fn for_down_to(
        iterator: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
        body: Commands,
    ) -> Self {
        Self::ForDownTo(ForCommand {
            iterator: iterator.into(),
            from: from.into(),
            to: to.into(),
            body,
        })
    }

    pub fn call<S: Into<String>>(
        name: impl Into<String>,
        arguments: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::Call(CallCommand {
            name: name.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        })
    }

    pub fn read(target: Identifier) -> Self {
        Self::Read(target)
    }

    pub fn write(source: impl Into<Value>) -> Self {
        Self::Write(source.into())
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Assign { target, expression } => write!(f, "{} := {};", target, expression),
            Command::If(cmd) => {
                write!(f, "IF {} THEN {}", cmd.condition, join(&cmd.then_branch, " "))?;
                if let Some(else_branch) = &cmd.else_branch {
                    write!(f, " ELSE {}", join(else_branch, " "))?;
                }
                write!(f, " ENDIF")
            }
            Command::While(cmd) => write!(
                f,
                "WHILE {} DO {} ENDWHILE",
                cmd.condition,
                join(&cmd.body, " ")
            ),
            Command::RepeatUntil(cmd) => write!(
                f,
                "REPEAT {} UNTIL {};",
                join(&cmd.body, " "),
                cmd.condition
            ),
            Command::ForTo(cmd) => write!(
                f,
                "FOR {} FROM {} TO {} DO {} ENDFOR",
                cmd.iterator,
                cmd.from,
                cmd.to,
                join(&cmd.body, " ")
            ),
            Command::ForDownTo(cmd) => write!(
                f,
                "FOR {} FROM {} DOWNTO {} DO {} ENDFOR",
                cmd.iterator,
                cmd.from,
                cmd.to,
                join(&cmd.body, " ")
            ),
            Command::Call(cmd) => write!(f, "{}({});", cmd.name, cmd.arguments.join(", ")),
            Command::Read(target) => write!(f, "READ {};", target),
            Command::Write(source) => write!(f, "WRITE {};", source),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum Declaration {
    Scalar(String),
    /// `t[start:end]`, both bounds inclusive.
    Array { name: String, start: i64, end: i64 },
}

impl Declaration {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::Scalar(name.into())
    }

    pub fn array(name: impl Into<String>, start: i64, end: i64) -> Self {
        Self::Array {
            name: name.into(),
            start,
            end,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Declaration::Scalar(name) | Declaration::Array { name, .. } => name,
        }
    }
}

impl std::fmt::Display for Declaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Declaration::Scalar(name) => write!(f, "{}", name),
            Declaration::Array { name, start, end } => write!(f, "{}[{}:{}]", name, start, end),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum ParameterKind {
    Scalar,
    Array,
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterKind::Scalar => write!(f, "scalar"),
            ParameterKind::Array => write!(f, "array"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Scalar,
        }
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Array,
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ParameterKind::Scalar => write!(f, "{}", self.name),
            ParameterKind::Array => write!(f, "T {}", self.name),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Procedure {
    pub name: Spanned<String>,
    pub parameters: Vec<Parameter>,
    pub declarations: Vec<Spanned<Declaration>>,
    pub commands: Commands,
}

impl Procedure {
    pub fn new(
        name: Spanned<String>,
        parameters: Vec<Parameter>,
        declarations: Vec<Spanned<Declaration>>,
        commands: Commands,
    ) -> Self {
        Self {
            name,
            parameters,
            declarations,
            commands,
        }
    }
}

impl std::fmt::Display for Procedure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PROCEDURE {}({}) IS", self.name, join(&self.parameters, ", "))?;
        if !self.declarations.is_empty() {
            write!(f, " {}", join(&self.declarations, ", "))?;
        }
        write!(f, " BEGIN {} END", join(&self.commands, " "))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct Main {
    pub declarations: Vec<Spanned<Declaration>>,
    pub commands: Commands,
}

impl Main {
    pub fn new(declarations: Vec<Spanned<Declaration>>, commands: Commands) -> Self {
        Self {
            declarations,
            commands,
        }
    }
}

impl std::fmt::Display for Main {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PROGRAM IS")?;
        if !self.declarations.is_empty() {
            write!(f, " {}", join(&self.declarations, ", "))?;
        }
        write!(f, " BEGIN {} END", join(&self.commands, " "))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub procedures: Vec<Procedure>,
    pub main: Main,
}

impl Program {
    pub fn new(procedures: Vec<Procedure>, main: Main) -> Self {
        Self { procedures, main }
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for procedure in &self.procedures {
            writeln!(f, "{}", procedure)?;
        }
        write!(f, "{}", self.main)
    }
}
