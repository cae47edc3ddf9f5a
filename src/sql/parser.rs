// SQL parser - converts tokens to a SELECT statement AST

use super::ast::*;
use super::lexer::Lexer;
use super::token::Token;
use anyhow::{bail, Result};

/// Deepest nesting of parentheses, NOT and unary signs accepted in a query
pub const MAX_NESTING_DEPTH: usize = 64;

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    pub fn new(sql: &str) -> Self {
        let tokens = Lexer::new(sql).tokenize();
        Parser {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// Parse a complete SELECT statement
    pub fn parse(&mut self) -> Result<SelectStatement> {
        let statement = self.parse_select()?;

        if self.match_token(&Token::Semicolon) {
            self.advance();
        }
        if !self.match_token(&Token::Eof) {
            bail!("Unexpected token after statement: {:?}", self.current_token());
        }

        Ok(statement)
    }

    /// Parse a standalone expression, e.g. a bare WHERE clause
    pub fn parse_condition(&mut self) -> Result<Expression> {
        let expr = self.parse_expression()?;
        if !self.match_token(&Token::Eof) {
            bail!("Unexpected token after expression: {:?}", self.current_token());
        }
        Ok(expr)
    }

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect_token(Token::Select)?;

        let projections = self.parse_select_items()?;

        self.expect_token(Token::From)?;
        let from = self.parse_table_reference()?;

        let where_clause = if self.match_token(&Token::Where) {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };

        let limit = if self.match_token(&Token::Limit) {
            self.advance();
            let n = self.expect_number()?;
            Some(
                n.parse::<u64>()
                    .map_err(|e| anyhow::anyhow!("Invalid LIMIT {}: {}", n, e))?,
            )
        } else {
            None
        };

        Ok(SelectStatement {
            projections,
            from,
            where_clause,
            limit,
        })
    }

    /// Parse SELECT items
    fn parse_select_items(&mut self) -> Result<Vec<SelectItem>> {
        let mut items = vec![];

        loop {
            if self.match_token(&Token::Star) {
                self.advance();
                items.push(SelectItem::AllColumns);
            } else if let (Token::Identifier(table), Token::Dot, Token::Star) =
                (self.current_token(), self.peek_token(1), self.peek_token(2))
            {
                self.position += 3;
                items.push(SelectItem::AllColumnsFrom(table));
            } else {
                let expr = self.parse_expression()?;
                let alias = if self.match_token(&Token::As) {
                    self.advance();
                    Some(self.expect_identifier()?)
                } else if let Token::Identifier(alias) = self.current_token() {
                    self.advance();
                    Some(alias)
                } else {
                    None
                };
                items.push(SelectItem::Expression(expr, alias));
            }

            if !self.match_token(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(items)
    }

    /// Parse table reference
    fn parse_table_reference(&mut self) -> Result<TableReference> {
        let mut name = self.expect_identifier()?;
        // Dotted sources such as `S3Object.records` keep their dotted name
        while self.match_token(&Token::Dot) {
            self.advance();
            name.push('.');
            name.push_str(&self.expect_identifier()?);
        }

        let alias = if self.match_token(&Token::As) {
            self.advance();
            Some(self.expect_identifier()?)
        } else if let Token::Identifier(alias) = self.current_token() {
            self.advance();
            Some(alias)
        } else {
            None
        };

        Ok(TableReference { name, alias })
    }

    /// Parse expression
    fn parse_expression(&mut self) -> Result<Expression> {
        self.nested(Self::parse_or)
    }

    /// Parse OR expression
    fn parse_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_and()?;

        while self.match_token(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Expression::Or(Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    /// Parse AND expression
    fn parse_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_not()?;

        while self.match_token(&Token::And) {
            self.advance();
            let right = self.parse_not()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    /// Parse NOT expression
    fn parse_not(&mut self) -> Result<Expression> {
        if self.match_token(&Token::Not) {
            self.advance();
            let operand = self.nested(Self::parse_not)?;
            Ok(Expression::Not(Box::new(operand)))
        } else {
            self.parse_comparison()
        }
    }

    /// Parse comparison expression
    fn parse_comparison(&mut self) -> Result<Expression> {
        let left = self.parse_addition()?;

        if self.match_token(&Token::Is) {
            self.advance();
            let negated = if self.match_token(&Token::Not) {
                self.advance();
                true
            } else {
                false
            };
            self.expect_token(Token::Null)?;
            return Ok(Expression::IsNull {
                expression: Box::new(left),
                negated,
            });
        }

        // NOT BETWEEN / NOT LIKE / NOT IN
        let negated = if self.match_token(&Token::Not)
            && matches!(
                self.peek_token(1),
                Token::Between | Token::Like | Token::In
            ) {
            self.advance();
            true
        } else {
            false
        };

        if self.match_token(&Token::In) {
            self.advance();
            self.expect_token(Token::LeftParen)?;
            let list = self.parse_expression_list()?;
            self.expect_token(Token::RightParen)?;
            return Ok(Expression::InList {
                expression: Box::new(left),
                list,
                negated,
            });
        }

        if self.match_token(&Token::Between) {
            self.advance();
            let low = self.parse_addition()?;
            self.expect_token(Token::And)?;
            let high = self.parse_addition()?;
            return Ok(Expression::Between {
                expression: Box::new(left),
                low: Box::new(low),
                high: Box::new(high),
                negated,
            });
        }

        if self.match_token(&Token::Like) {
            self.advance();
            let pattern = self.parse_addition()?;
            let escape = if self.match_token(&Token::Escape) {
                self.advance();
                Some(Box::new(self.parse_addition()?))
            } else {
                None
            };
            return Ok(Expression::Like {
                expression: Box::new(left),
                pattern: Box::new(pattern),
                escape,
                negated,
            });
        }

        let op = match self.current_token() {
            Token::Equal => Some(ComparisonOperator::Equal),
            Token::NotEqual => Some(ComparisonOperator::NotEqual),
            Token::Less => Some(ComparisonOperator::Less),
            Token::Greater => Some(ComparisonOperator::Greater),
            Token::LessEqual => Some(ComparisonOperator::LessEqual),
            Token::GreaterEqual => Some(ComparisonOperator::GreaterEqual),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let right = self.parse_addition()?;
            Ok(Expression::Comparison {
                left: Box::new(left),
                op,
                right: Box::new(right),
            })
        } else {
            Ok(left)
        }
    }

    /// Parse addition/subtraction expression
    fn parse_addition(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplication()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => ArithmeticOperator::Plus,
                Token::Minus => ArithmeticOperator::Minus,
                _ => break,
            };
            self.advance();

            let right = self.parse_multiplication()?;
            left = Expression::Arithmetic {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse multiplication/division expression
    fn parse_multiplication(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => ArithmeticOperator::Multiply,
                Token::Slash => ArithmeticOperator::Divide,
                Token::Percent => ArithmeticOperator::Modulo,
                _ => break,
            };
            self.advance();

            let right = self.parse_unary()?;
            left = Expression::Arithmetic {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse unary expression
    fn parse_unary(&mut self) -> Result<Expression> {
        match self.current_token() {
            Token::Plus => {
                self.advance();
                self.nested(Self::parse_unary)
            }
            Token::Minus => {
                self.advance();
                let operand = self.nested(Self::parse_unary)?;
                Ok(Expression::Negate(Box::new(operand)))
            }
            _ => self.parse_primary(),
        }
    }

    /// Parse primary expression
    fn parse_primary(&mut self) -> Result<Expression> {
        match self.current_token() {
            Token::Number(n) => {
                self.advance();
                if n.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
                    Ok(Expression::Literal(Literal::Float(n)))
                } else {
                    Ok(Expression::Literal(Literal::Integer(n)))
                }
            }
            Token::String(s) => {
                self.advance();
                Ok(Expression::Literal(Literal::String(s)))
            }
            Token::True => {
                self.advance();
                Ok(Expression::Literal(Literal::Boolean(true)))
            }
            Token::False => {
                self.advance();
                Ok(Expression::Literal(Literal::Boolean(false)))
            }
            Token::Null => {
                self.advance();
                Ok(Expression::Literal(Literal::Null))
            }
            Token::Identifier(name) => {
                self.advance();

                if self.match_token(&Token::LeftParen) {
                    self.advance();
                    let args = if self.match_token(&Token::RightParen) {
                        vec![]
                    } else {
                        self.parse_expression_list()?
                    };
                    self.expect_token(Token::RightParen)?;
                    return Ok(Expression::Function { name, args });
                }

                let mut path = vec![name];
                while self.match_token(&Token::Dot) {
                    self.advance();
                    path.push(self.expect_path_segment()?);
                }
                Ok(Expression::Column(ColumnRef::new(path)))
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_token(Token::RightParen)?;
                Ok(expr)
            }
            Token::Illegal(text) => bail!("Illegal token: {}", text),
            _ => bail!("Unexpected token: {:?}", self.current_token()),
        }
    }

    /// Parse list of expressions
    fn parse_expression_list(&mut self) -> Result<Vec<Expression>> {
        let mut expressions = vec![];

        loop {
            expressions.push(self.parse_expression()?);
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(expressions)
    }

    // Helper methods

    /// Run `parse` one nesting level deeper
    fn nested<T>(&mut self, parse: fn(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            bail!(
                "Expression nested too deeply (more than {} levels)",
                MAX_NESTING_DEPTH
            );
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn current_token(&self) -> Token {
        self.peek_token(0)
    }

    fn peek_token(&self, offset: usize) -> Token {
        self.tokens
            .get(self.position + offset)
            .cloned()
            .unwrap_or(Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len().saturating_sub(1) {
            self.position += 1;
        }
    }

    fn match_token(&self, token: &Token) -> bool {
        self.current_token() == *token
    }

    fn expect_token(&mut self, token: Token) -> Result<()> {
        if self.current_token() == token {
            self.advance();
            Ok(())
        } else {
            bail!("Expected {:?}, found {:?}", token, self.current_token())
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.current_token() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => bail!("Expected identifier, found {:?}", other),
        }
    }

    /// Path segments after a dot are names (the lexer never makes keywords
    /// there, so `s.limit` works) or array indexes (`items.0`)
    fn expect_path_segment(&mut self) -> Result<String> {
        let segment = match self.current_token() {
            Token::Identifier(name) => name,
            Token::Number(n) if n.bytes().all(|b| b.is_ascii_digit()) => n,
            other => bail!("Expected column name after '.', found {:?}", other),
        };
        self.advance();
        Ok(segment)
    }

    fn expect_number(&mut self) -> Result<String> {
        match self.current_token() {
            Token::Number(n) => {
                self.advance();
                Ok(n)
            }
            other => bail!("Expected number, found {:?}", other),
        }
    }
}

/// Parse a SELECT statement from SQL text
pub fn parse_select(sql: &str) -> Result<SelectStatement> {
    Parser::new(sql).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn where_clause(sql: &str) -> Expression {
        parse_select(sql)
            .unwrap()
            .where_clause
            .expect("Expected WHERE clause")
    }

    #[test]
    fn test_parse_select_simple() {
        let select = parse_select("SELECT * FROM S3Object").unwrap();
        assert_eq!(select.projections, vec![SelectItem::AllColumns]);
        assert_eq!(select.from.name, "S3Object");
        assert!(select.from.alias.is_none());
        assert!(select.where_clause.is_none());
        assert!(select.limit.is_none());
    }

    #[test]
    fn test_parse_alias_and_limit() {
        let select = parse_select("select s.* from S3Object AS s where s.age > 3 limit 5;").unwrap();
        assert_eq!(
            select.projections,
            vec![SelectItem::AllColumnsFrom("s".to_string())]
        );
        assert_eq!(select.from.alias.as_deref(), Some("s"));
        assert_eq!(select.limit, Some(5));
        assert_eq!(
            select.where_clause,
            Some(Expression::column_path(&["s", "age"]).gt(Expression::integer(3)))
        );
    }

    #[test]
    fn test_parse_where_precedence() {
        let expr = where_clause("SELECT * FROM t WHERE a = 1 OR b = 2 AND c = 3");
        assert_eq!(
            expr,
            Expression::column("a").eq(Expression::integer(1)).or(Expression::column("b")
                .eq(Expression::integer(2))
                .and(Expression::column("c").eq(Expression::integer(3))))
        );
    }

    #[test]
    fn test_parse_between_binds_its_and() {
        let expr = where_clause("SELECT * FROM t WHERE age NOT BETWEEN 18 AND 25 AND ok = true");
        assert_eq!(
            expr,
            Expression::column("age")
                .between(Expression::integer(18), Expression::integer(25), true)
                .and(Expression::column("ok").eq(Expression::boolean(true)))
        );
    }

    #[test]
    fn test_parse_like_in_and_null_tests() {
        let expr = where_clause("SELECT * FROM t WHERE name NOT LIKE 'a!%%' ESCAPE '!'");
        assert_eq!(
            expr,
            Expression::Like {
                expression: Box::new(Expression::column("name")),
                pattern: Box::new(Expression::string("a!%%")),
                escape: Some(Box::new(Expression::string("!"))),
                negated: true,
            }
        );

        let expr = where_clause("SELECT * FROM t WHERE status IN ('a', 'b')");
        assert!(matches!(expr, Expression::InList { negated: false, ref list, .. } if list.len() == 2));

        let expr = where_clause("SELECT * FROM t WHERE status IS NOT NULL");
        assert_eq!(expr, Expression::column("status").is_null(true));
    }

    #[test]
    fn test_parse_literals() {
        let expr = where_clause("SELECT * FROM t WHERE price >= -2.50");
        assert_eq!(
            expr,
            Expression::column("price").compare(
                ComparisonOperator::GreaterEqual,
                Expression::Negate(Box::new(Expression::float("2.50")))
            )
        );

        assert_eq!(
            where_clause("SELECT * FROM t WHERE false"),
            Expression::boolean(false)
        );
    }

    #[test]
    fn test_parse_nested_paths_and_functions() {
        let expr = where_clause("SELECT * FROM t WHERE t.address.city = 'Oslo' AND items.0 > 1");
        assert_eq!(
            expr,
            Expression::column_path(&["t", "address", "city"])
                .eq(Expression::string("Oslo"))
                .and(Expression::column_path(&["items", "0"]).gt(Expression::integer(1)))
        );

        let expr = where_clause("SELECT * FROM t WHERE lower(name) = 'x'");
        assert!(matches!(
            expr,
            Expression::Comparison { ref left, .. } if matches!(**left, Expression::Function { .. })
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_select("SELECT * WHERE a = 1").is_err());
        assert!(parse_select("SELECT * FROM t WHERE a = 'open").is_err());
        assert!(parse_select("SELECT * FROM t WHERE a BETWEEN 1").is_err());
        assert!(parse_select("SELECT * FROM t WHERE a = 1 garbage here").is_err());
        assert!(parse_select("SELECT * FROM t LIMIT many").is_err());
    }

    #[test]
    fn test_parse_keyword_path_segments_keep_case() {
        let expr = where_clause("SELECT * FROM t WHERE s.Limit = 1 AND s.from.AND > 2");
        assert_eq!(
            expr,
            Expression::column_path(&["s", "Limit"])
                .eq(Expression::integer(1))
                .and(Expression::column_path(&["s", "from", "AND"]).gt(Expression::integer(2)))
        );
    }

    #[test]
    fn test_parse_nesting_limit() {
        let nested = |depth: usize| {
            format!(
                "SELECT * FROM t WHERE {}a = 1{}",
                "(".repeat(depth),
                ")".repeat(depth)
            )
        };
        assert!(parse_select(&nested(MAX_NESTING_DEPTH - 1)).is_ok());

        let err = parse_select(&nested(100_000)).unwrap_err();
        assert!(err.to_string().contains("nested too deeply"));

        let nots = format!("SELECT * FROM t WHERE {}a = 1", "NOT ".repeat(100_000));
        assert!(parse_select(&nots).is_err());
        let signs = format!("SELECT * FROM t WHERE a = {}1", "- ".repeat(100_000));
        assert!(parse_select(&signs).is_err());
    }

    #[test]
    fn test_parse_long_flat_chain() {
        let terms: Vec<String> = (0..100_000).map(|i| format!("a = {}", i)).collect();
        let sql = format!("SELECT * FROM t WHERE {}", terms.join(" OR "));
        let expr = parse_select(&sql).unwrap().where_clause.unwrap();
        assert!(matches!(expr, Expression::Or(..)));
    }

    #[test]
    fn test_parse_condition() {
        let expr = Parser::new("(a > 1 OR b < 2) AND c = 'x'")
            .parse_condition()
            .unwrap();
        assert!(matches!(expr, Expression::And(..)));
    }
}
