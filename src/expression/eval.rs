//! WHERE clause evaluation against JSON records.

use crate::expression::{
    coerce, compare, evaluate_between, like, ColumnNames, ColumnResolver, ExpressionError,
    ExpressionResult, Operand,
};
use crate::record::Record;
use crate::sql::{Expression, Literal};
use log::debug;

/// Evaluator for WHERE clauses over a single record
pub struct ExpressionEvaluator<'a> {
    /// The record to evaluate against
    record: &'a Record,
    resolver: ColumnResolver<'a>,
}

impl<'a> ExpressionEvaluator<'a> {
    /// Create a new evaluator. `alias` is the table alias from the FROM
    /// clause, if any.
    pub fn new(record: &'a Record, column_names: &'a ColumnNames, alias: Option<&'a str>) -> Self {
        Self {
            record,
            resolver: ColumnResolver::new(column_names, alias),
        }
    }

    /// Also accept the table name itself as a column qualifier
    pub fn with_table(mut self, table: &'a str) -> Self {
        self.resolver = self.resolver.with_table(table);
        self
    }

    /// Reduce a WHERE clause to a boolean
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<bool> {
        match expr {
            // The parser's constant-false clause, and its counterpart
            Expression::Literal(Literal::Boolean(b)) => Ok(*b),

            Expression::Comparison { left, op, right } => {
                let operand = self.operand(right)?;
                let value = self.column_value(left)?;
                compare(&value, *op, &operand)
            }

            Expression::Between {
                expression,
                low,
                high,
                negated,
            } => {
                let value = self.column_value(expression)?;
                let low = self.operand(low)?;
                let high = self.operand(high)?;
                let within = evaluate_between(&value, &low, &high)?;
                Ok(within != *negated)
            }

            Expression::Like {
                expression,
                pattern,
                escape,
                negated,
            } => {
                let value = self.column_value(expression)?;
                let pattern = self.string_literal(pattern, "LIKE pattern")?;
                let escape = match escape {
                    Some(escape) => Some(self.escape_char(escape)?),
                    None => None,
                };
                Ok(like(&value, &pattern, escape)? != *negated)
            }

            Expression::And(..) => {
                let mut result = true;
                for operand in connective_operands(expr) {
                    // Every operand is evaluated; the first error wins
                    result &= self.evaluate(operand)?;
                }
                Ok(result)
            }

            Expression::Or(..) => {
                let mut first_error = None;
                for operand in connective_operands(expr) {
                    match self.evaluate(operand) {
                        Ok(true) => return Ok(true),
                        Ok(false) => {}
                        Err(e) => {
                            first_error.get_or_insert(e);
                        }
                    }
                }
                // No operand is true, so any error leaves the result undetermined
                match first_error {
                    Some(e) => Err(e),
                    None => Ok(false),
                }
            }

            Expression::Literal(_)
            | Expression::Column(_)
            | Expression::Not(_)
            | Expression::IsNull { .. }
            | Expression::InList { .. }
            | Expression::Arithmetic { .. }
            | Expression::Negate(_)
            | Expression::Function { .. } => Err(self.unsupported(expr.kind())),
        }
    }

    /// Textual value of the column on the left of a predicate
    fn column_value(&self, expr: &Expression) -> ExpressionResult<String> {
        match expr {
            Expression::Column(column) => Ok(self.resolver.resolve(self.record, column)),
            other => Err(self.unsupported(format!(
                "{} on the left-hand side of a predicate",
                other.kind()
            ))),
        }
    }

    /// Coerce a literal operand. `-5` arrives as a negated literal.
    fn operand(&self, expr: &Expression) -> ExpressionResult<Operand> {
        match expr {
            Expression::Literal(literal) => coerce(literal),
            Expression::Negate(inner) => self.operand(inner)?.negate(),
            other => Err(self.unsupported(format!("{} as a comparison operand", other.kind()))),
        }
    }

    fn string_literal(&self, expr: &Expression, role: &str) -> ExpressionResult<String> {
        match expr {
            Expression::Literal(Literal::String(s)) => Ok(s.clone()),
            other => Err(self.unsupported(format!("{} as {}", other.kind(), role))),
        }
    }

    fn escape_char(&self, expr: &Expression) -> ExpressionResult<char> {
        let escape = self.string_literal(expr, "ESCAPE character")?;
        let mut chars = escape.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ExpressionError::InvalidLiteral {
                literal: escape,
                reason: "ESCAPE must be a single character".to_string(),
            }),
        }
    }

    fn unsupported(&self, construct: impl Into<String>) -> ExpressionError {
        let construct = construct.into();
        debug!("unsupported construct in WHERE clause: {}", construct);
        ExpressionError::unsupported(construct)
    }
}

/// Operands of a chain of the same connective (`a OR b OR c`), in source
/// order. Walked with an explicit stack so long chains do not recurse.
fn connective_operands(expr: &Expression) -> Vec<&Expression> {
    fn split<'e>(
        connective: &Expression,
        e: &'e Expression,
    ) -> Option<(&'e Expression, &'e Expression)> {
        match (connective, e) {
            (Expression::And(..), Expression::And(left, right))
            | (Expression::Or(..), Expression::Or(left, right)) => Some((left, right)),
            _ => None,
        }
    }

    let mut operands = Vec::new();
    let mut pending = vec![expr];
    while let Some(current) = pending.pop() {
        match split(expr, current) {
            Some((left, right)) => {
                pending.push(right);
                pending.push(left);
            }
            None => operands.push(current),
        }
    }
    operands
}

/// Evaluate `expr` against `record`
pub fn evaluate_where(
    record: &Record,
    column_names: &ColumnNames,
    alias: Option<&str>,
    expr: &Expression,
) -> ExpressionResult<bool> {
    ExpressionEvaluator::new(record, column_names, alias).evaluate(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_record;
    use crate::sql::{ArithmeticOperator, ColumnRef, ComparisonOperator, Parser};

    fn condition(sql: &str) -> Expression {
        Parser::new(sql).parse_condition().unwrap()
    }

    fn eval(json: &str, sql: &str) -> ExpressionResult<bool> {
        let record = parse_record(json).unwrap();
        evaluate_where(&record, &ColumnNames::new(), None, &condition(sql))
    }

    #[test]
    fn test_comparison() {
        assert!(eval(r#"{"age": 42}"#, "age > 30").unwrap());
        assert!(!eval(r#"{"age": 42}"#, "age < 30").unwrap());
        assert!(eval(r#"{"name": "alice"}"#, "name = 'alice'").unwrap());
        assert!(eval(r#"{"name": "alice"}"#, "name <> 'bob'").unwrap());
        assert!(eval(r#"{"price": 2.5}"#, "price >= 2.50").unwrap());
        assert!(eval(r#"{"active": true}"#, "active = TRUE").unwrap());
    }

    #[test]
    fn test_negative_operands() {
        assert!(eval(r#"{"t": -3}"#, "t < -2").unwrap());
        assert!(eval(r#"{"t": -3}"#, "t > -3.5").unwrap());
        assert!(eval(r#"{"t": -3}"#, "t BETWEEN -5 AND 0").unwrap());
    }

    #[test]
    fn test_constant_clauses() {
        assert!(!eval(r#"{"a": 1}"#, "FALSE").unwrap());
        assert!(eval(r#"{"a": 1}"#, "TRUE").unwrap());
        assert!(eval(r#"{"a": 1}"#, "1").unwrap_err().is_unsupported());
        assert!(eval(r#"{"a": 1}"#, "NULL").unwrap_err().is_unsupported());
    }

    #[test]
    fn test_between() {
        assert!(eval(r#"{"age": 20}"#, "age BETWEEN 18 AND 25").unwrap());
        assert!(!eval(r#"{"age": 30}"#, "age BETWEEN 18 AND 25").unwrap());
        assert!(eval(r#"{"age": 30}"#, "age NOT BETWEEN 18 AND 25").unwrap());
        assert!(eval(r#"{"age": 20}"#, "age BETWEEN 25 AND 18").unwrap());

        let err = eval(r#"{"age": "old"}"#, "age NOT BETWEEN 18 AND 25").unwrap_err();
        assert!(matches!(err, ExpressionError::TypeMismatch { .. }));

        let err = eval(r#"{"age": 20}"#, "age BETWEEN low AND 25").unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_like() {
        assert!(eval(r#"{"name": "alice"}"#, "name LIKE 'al%'").unwrap());
        assert!(eval(r#"{"name": "alice"}"#, "name NOT LIKE 'b%'").unwrap());
        assert!(eval(r#"{"code": "10%"}"#, "code LIKE '10!%' ESCAPE '!'").unwrap());

        let err = eval(r#"{"name": "a"}"#, "name LIKE 'a' ESCAPE '!!'").unwrap_err();
        assert!(matches!(err, ExpressionError::InvalidLiteral { .. }));
        assert!(eval(r#"{"name": "a"}"#, "name LIKE other")
            .unwrap_err()
            .is_unsupported());
    }

    #[test]
    fn test_nested_boolean_logic() {
        let json = r#"{"a": 1, "b": 2, "c": 3}"#;
        assert!(eval(json, "(a = 1 AND b = 2) AND (c = 3 OR c = 4)").unwrap());
        assert!(eval(json, "a = 9 OR (b = 2 AND c BETWEEN 1 AND 5)").unwrap());
        assert!(!eval(json, "(a = 1 OR b = 9) AND (c = 9 OR (a = 9 AND b = 2))").unwrap());
    }

    #[test]
    fn test_and_propagates_errors() {
        let json = r#"{"a": 1, "s": "text"}"#;
        assert!(eval(json, "a = 2 AND s > 5").is_err());
        assert!(eval(json, "s > 5 AND a = 1").is_err());
        assert!(eval(json, "a = 1 AND s IS NULL").unwrap_err().is_unsupported());
    }

    #[test]
    fn test_or_short_circuits_only_on_true() {
        let json = r#"{"a": 1, "s": "text"}"#;
        assert!(eval(json, "a = 1 OR s > 5").unwrap());
        assert!(eval(json, "s > 5 OR a = 1").unwrap());
        assert!(eval(json, "a = 1 OR s IS NULL").unwrap());

        let err = eval(json, "a = 2 OR s > 5").unwrap_err();
        assert!(matches!(err, ExpressionError::TypeMismatch { .. }));
        let err = eval(json, "s IS NULL OR a = 2").unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_long_connective_chains() {
        let record = parse_record(r#"{"a": 99999, "s": "text"}"#).unwrap();
        let names = ColumnNames::new();
        let eval = |expr: &Expression| evaluate_where(&record, &names, None, expr);
        let term = |i: i64| Expression::column("a").eq(Expression::integer(i));

        // Left-deep, as the parser builds them
        let mut any = term(0);
        let mut all = Expression::column("a").gt(Expression::integer(-1));
        for i in 1..100_000 {
            any = any.or(term(i));
            all = all.and(Expression::column("a").gt(Expression::integer(-1 - i)));
        }
        assert!(eval(&any).unwrap());
        assert!(eval(&all).unwrap());

        // Right-deep: `a = 0 OR (a = 1 OR (...))`
        let mut nested = term(100_000);
        for i in (0..100_000).rev() {
            nested = term(i).or(nested);
        }
        assert!(!evaluate_where(&Record::new(), &names, None, &nested).unwrap());

        // The error rules hold across the whole chain
        let mut chain = Expression::column("s").gt(Expression::integer(5));
        for i in 0..50_000 {
            chain = chain.or(term(-i - 1));
        }
        assert!(matches!(
            eval(&chain).unwrap_err(),
            ExpressionError::TypeMismatch { .. }
        ));
        assert!(eval(&chain.or(term(99999))).unwrap());
    }

    #[test]
    fn test_unsupported_constructs() {
        let json = r#"{"a": 1, "b": 2}"#;
        for sql in [
            "a IS NULL",
            "a IS NOT NULL",
            "NOT a = 1",
            "a IN (1, 2)",
            "a + 1 > 2",
            "a = b",
            "a",
            "UPPER(a) = 'X'",
            "a = NULL",
            "-a > 1",
        ] {
            let err = eval(json, sql).unwrap_err();
            assert!(err.is_unsupported(), "{} should be unsupported: {}", sql, err);
        }

        let expr = Expression::Arithmetic {
            left: Box::new(Expression::integer(1)),
            op: ArithmeticOperator::Plus,
            right: Box::new(Expression::integer(2)),
        };
        let record = Record::new();
        let err = evaluate_where(&record, &ColumnNames::new(), None, &expr).unwrap_err();
        assert_eq!(
            err,
            ExpressionError::unsupported("arithmetic expression")
        );
    }

    #[test]
    fn test_alias_and_table_qualifiers() {
        let record = parse_record(r#"{"age": 42, "address": {"city": "Oslo"}}"#).unwrap();
        let names = ColumnNames::new();
        let evaluator = ExpressionEvaluator::new(&record, &names, Some("s")).with_table("S3Object");

        assert!(evaluator.evaluate(&condition("s.age = 42")).unwrap());
        assert!(evaluator.evaluate(&condition("S3Object.age = 42")).unwrap());
        assert!(evaluator
            .evaluate(&condition("s.address.city = 'Oslo'"))
            .unwrap());
        assert!(!evaluator.evaluate(&condition("t.age = 42")).unwrap());
    }

    #[test]
    fn test_positional_fallback() {
        let record = parse_record(r#"{"x": 7, "y": "seven"}"#).unwrap();
        let names = ColumnNames::from_names(["id", "label"]);

        let expr = Expression::Column(ColumnRef::name("LABEL"))
            .compare(ComparisonOperator::Equal, Expression::string("seven"));
        assert!(evaluate_where(&record, &names, None, &expr).unwrap());
        assert!(evaluate_where(&record, &names, None, &condition("id = 7")).unwrap());
    }

    #[test]
    fn test_missing_fields() {
        assert!(!eval("{}", "age > 10").unwrap());
        assert!(!eval("{}", "name = 'x'").unwrap());
        assert!(eval("{}", "name = ''").unwrap());
        assert!(!eval(r#"{"name": null}"#, "name = 'x'").unwrap());
    }
}
