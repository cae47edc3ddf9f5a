// SQL Abstract Syntax Tree (AST) definitions

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub projections: Vec<SelectItem>,
    pub from: TableReference,
    pub where_clause: Option<Expression>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    AllColumns,
    AllColumnsFrom(String),
    Expression(Expression, Option<String>), // expression, alias
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableReference {
    pub name: String,
    pub alias: Option<String>,
}

/// Literal as it appeared in the SQL text. Numeric literals keep their raw
/// text; conversion to a typed operand happens at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(String),
    Float(String),
    Boolean(bool),
    Null,
}

/// Column reference such as `age`, `s.age` or `address.city`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub path: Vec<String>,
}

impl ColumnRef {
    pub fn new(path: Vec<String>) -> Self {
        Self { path }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self {
            path: vec![name.into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),

    Column(ColumnRef),

    // left op right for = != < <= > >=
    Comparison {
        left: Box<Expression>,
        op: ComparisonOperator,
        right: Box<Expression>,
    },

    Like {
        expression: Box<Expression>,
        pattern: Box<Expression>,
        escape: Option<Box<Expression>>,
        negated: bool,
    },

    Between {
        expression: Box<Expression>,
        low: Box<Expression>,
        high: Box<Expression>,
        negated: bool,
    },

    And(Box<Expression>, Box<Expression>),

    Or(Box<Expression>, Box<Expression>),

    Not(Box<Expression>),

    IsNull {
        expression: Box<Expression>,
        negated: bool,
    },

    InList {
        expression: Box<Expression>,
        list: Vec<Expression>,
        negated: bool,
    },

    Arithmetic {
        left: Box<Expression>,
        op: ArithmeticOperator,
        right: Box<Expression>,
    },

    // Unary minus
    Negate(Box<Expression>),

    Function {
        name: String,
        args: Vec<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "!=",
            ComparisonOperator::Less => "<",
            ComparisonOperator::LessEqual => "<=",
            ComparisonOperator::Greater => ">",
            ComparisonOperator::GreaterEqual => ">=",
        }
    }

    pub fn is_ordering(&self) -> bool {
        !matches!(self, ComparisonOperator::Equal | ComparisonOperator::NotEqual)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
}

impl Expression {
    pub fn column(name: impl Into<String>) -> Self {
        Expression::Column(ColumnRef::name(name))
    }

    pub fn column_path(path: &[&str]) -> Self {
        Expression::Column(ColumnRef::new(
            path.iter().map(|s| s.to_string()).collect(),
        ))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::Literal(Literal::String(value.into()))
    }

    pub fn integer(value: i64) -> Self {
        Expression::Literal(Literal::Integer(value.to_string()))
    }

    pub fn float(raw: impl Into<String>) -> Self {
        Expression::Literal(Literal::Float(raw.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Expression::Literal(Literal::Boolean(value))
    }

    pub fn compare(self, op: ComparisonOperator, other: Expression) -> Self {
        Expression::Comparison {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    pub fn eq(self, other: Expression) -> Self {
        self.compare(ComparisonOperator::Equal, other)
    }

    pub fn gt(self, other: Expression) -> Self {
        self.compare(ComparisonOperator::Greater, other)
    }

    pub fn lt(self, other: Expression) -> Self {
        self.compare(ComparisonOperator::Less, other)
    }

    pub fn and(self, other: Expression) -> Self {
        Expression::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expression) -> Self {
        Expression::Or(Box::new(self), Box::new(other))
    }

    pub fn between(self, low: Expression, high: Expression, negated: bool) -> Self {
        Expression::Between {
            expression: Box::new(self),
            low: Box::new(low),
            high: Box::new(high),
            negated,
        }
    }

    pub fn is_null(self, negated: bool) -> Self {
        Expression::IsNull {
            expression: Box::new(self),
            negated,
        }
    }

    /// Short name of the construct, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Literal(_) => "literal",
            Expression::Column(_) => "column reference",
            Expression::Comparison { .. } => "comparison",
            Expression::Like { negated: false, .. } => "LIKE",
            Expression::Like { negated: true, .. } => "NOT LIKE",
            Expression::Between { negated: false, .. } => "BETWEEN",
            Expression::Between { negated: true, .. } => "NOT BETWEEN",
            Expression::And(..) => "AND",
            Expression::Or(..) => "OR",
            Expression::Not(_) => "NOT",
            Expression::IsNull { negated: false, .. } => "IS NULL",
            Expression::IsNull { negated: true, .. } => "IS NOT NULL",
            Expression::InList { negated: false, .. } => "IN",
            Expression::InList { negated: true, .. } => "NOT IN",
            Expression::Arithmetic { .. } => "arithmetic expression",
            Expression::Negate(_) => "unary minus",
            Expression::Function { .. } => "function call",
        }
    }

    /// Move the direct children of this node into `out`
    fn take_children(&mut self, out: &mut Vec<Expression>) {
        fn unlink(child: &mut Expression) -> Expression {
            std::mem::replace(child, Expression::Literal(Literal::Null))
        }

        match self {
            Expression::Literal(_) | Expression::Column(_) => {}
            Expression::Comparison { left, right, .. }
            | Expression::Arithmetic { left, right, .. }
            | Expression::And(left, right)
            | Expression::Or(left, right) => {
                out.push(unlink(left));
                out.push(unlink(right));
            }
            Expression::Like {
                expression,
                pattern,
                escape,
                ..
            } => {
                out.push(unlink(expression));
                out.push(unlink(pattern));
                if let Some(escape) = escape {
                    out.push(unlink(escape));
                }
            }
            Expression::Between {
                expression,
                low,
                high,
                ..
            } => {
                out.push(unlink(expression));
                out.push(unlink(low));
                out.push(unlink(high));
            }
            Expression::Not(expression)
            | Expression::Negate(expression)
            | Expression::IsNull { expression, .. } => out.push(unlink(expression)),
            Expression::InList {
                expression, list, ..
            } => {
                out.push(unlink(expression));
                out.append(list);
            }
            Expression::Function { args, .. } => out.append(args),
        }
    }
}

// Long AND/OR chains are left-deep; dropping them recursively can exhaust the
// stack, so children are unlinked onto a heap stack first.
impl Drop for Expression {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.take_children(&mut pending);
        while let Some(mut child) = pending.pop() {
            child.take_children(&mut pending);
        }
    }
}
