// SQL lexer - tokenizes SELECT statements

use super::token::Token;

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
    /// The previous token was `.`, so the next word is a path segment
    after_dot: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let input: Vec<char> = input.chars().collect();
        let current_char = input.first().copied();
        Lexer {
            input,
            position: 0,
            current_char,
            after_dot: false,
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        let token = self.scan_token();
        self.after_dot = token == Token::Dot;
        token
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let Some(ch) = self.current_char else {
            return Token::Eof;
        };

        match ch {
            '+' => {
                self.advance();
                Token::Plus
            }
            '-' => {
                self.advance();
                if self.current_char == Some('-') {
                    self.skip_comment();
                    return self.scan_token();
                }
                Token::Minus
            }
            '*' => {
                self.advance();
                Token::Star
            }
            '/' => {
                self.advance();
                Token::Slash
            }
            '%' => {
                self.advance();
                Token::Percent
            }
            '=' => {
                self.advance();
                // Accept `==` as an alias
                if self.current_char == Some('=') {
                    self.advance();
                }
                Token::Equal
            }
            '<' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::LessEqual
                } else if self.current_char == Some('>') {
                    self.advance();
                    Token::NotEqual
                } else {
                    Token::Less
                }
            }
            '>' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::GreaterEqual
                } else {
                    Token::Greater
                }
            }
            '!' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::NotEqual
                } else {
                    Token::Illegal("!".to_string())
                }
            }
            '(' => {
                self.advance();
                Token::LeftParen
            }
            ')' => {
                self.advance();
                Token::RightParen
            }
            ',' => {
                self.advance();
                Token::Comma
            }
            ';' => {
                self.advance();
                Token::Semicolon
            }
            '.' => {
                self.advance();
                Token::Dot
            }
            '\'' => self.read_string(),
            '"' | '`' => self.read_quoted_identifier(ch),
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            c if c.is_ascii_digit() => self.read_number(),
            c => {
                self.advance();
                Token::Illegal(c.to_string())
            }
        }
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip single-line comments starting with --
    fn skip_comment(&mut self) {
        while let Some(ch) = self.current_char {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if self.after_dot {
            return Token::Identifier(identifier);
        }
        Token::keyword_from_str(&identifier).unwrap_or(Token::Identifier(identifier))
    }

    /// Read a quoted identifier (e.g., "first name"). Quoted identifiers are
    /// never keywords.
    fn read_quoted_identifier(&mut self, quote: char) -> Token {
        self.advance();
        let mut identifier = String::new();

        while let Some(ch) = self.current_char {
            if ch == quote {
                if self.peek() == Some(quote) {
                    identifier.push(quote);
                    self.advance();
                    self.advance();
                    continue;
                }
                self.advance();
                return Token::Identifier(identifier);
            }
            identifier.push(ch);
            self.advance();
        }

        Token::Illegal(format!("{}{}", quote, identifier))
    }

    /// Read a string literal; `''` inside the literal is an escaped quote
    fn read_string(&mut self) -> Token {
        self.advance();
        let mut string = String::new();

        while let Some(ch) = self.current_char {
            if ch == '\'' {
                if self.peek() == Some('\'') {
                    string.push('\'');
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    return Token::String(string);
                }
            } else {
                string.push(ch);
                self.advance();
            }
        }

        Token::Illegal(format!("'{}", string))
    }

    /// Read a number: digits, optional fraction, optional exponent
    fn read_number(&mut self) -> Token {
        let mut number = String::new();
        let mut has_dot = false;

        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot && self.peek().is_some_and(|c| c.is_ascii_digit()) {
                has_dot = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if matches!(self.current_char, Some('e' | 'E')) {
            let digits_at = match self.peek() {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self
                .input
                .get(self.position + digits_at)
                .is_some_and(|c| c.is_ascii_digit())
            {
                for _ in 0..digits_at {
                    if let Some(ch) = self.current_char {
                        number.push(ch);
                    }
                    self.advance();
                }
                while let Some(ch) = self.current_char {
                    if !ch.is_ascii_digit() {
                        break;
                    }
                    number.push(ch);
                    self.advance();
                }
            }
        }

        Token::Number(number)
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }

        tokens
    }
}
