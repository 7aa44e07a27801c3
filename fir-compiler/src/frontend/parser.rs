//! Handwritten recursive-descent parser for the source language.
//!
//! Grammar (informal):
//! ```text
//! program  := stmt*
//! stmt     := "let" IDENT (":" IDENT)? ("=" expr)? ";"
//!           | "if" "(" expr ")" stmt ("else" stmt)?
//!           | "for" "(" (let_decl | expr)? ";" expr? ";" expr? ")" stmt
//!           | "while" "(" expr ")" stmt
//!           | "function" IDENT? "(" params ")" (":" IDENT)? (block | ";")
//!           | "return" expr? ";"
//!           | block
//!           | expr ";"
//! block    := "{" stmt* "}"
//! params   := (param ("," param)*)?
//! param    := IDENT (":" IDENT)?
//! expr     := assign
//! assign   := or ("=" assign)?
//! or       := and ("||" and)*
//! and      := equality ("&&" equality)*
//! equality := rel (("==" | "!=") rel)*
//! rel      := add (("<" | "<=" | ">" | ">=") add)*
//! add      := mul (("+" | "-") mul)*
//! mul      := unary (("*" | "/" | "%") unary)*
//! unary    := ("-" | "!") unary | postfix
//! postfix  := primary ("(" args ")" | "[" expr "]")*
//! primary  := NUMBER | BIGINT | STRING | "true" | "false" | IDENT | "(" expr ")"
//! ```

use crate::frontend::lexer::{self, SpannedToken, Token};
use crate::ir::ast::{AstNodeIdGenerator, BinOp, Expr, Param, Program, Stmt, UnOp};
use crate::CompileError;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub position: usize,
    pub message: String,
}

/// Parse source text into an AST, mapping lexical and syntax errors
/// to `CompileError` with line/column positions and a context line.
pub fn parse(source: &str) -> Result<Program, CompileError> {
    let tokens = lexer::lex(source)?;
    let mut parser = Parser::new(&tokens, source.len());
    parser.parse_program().map_err(|e| {
        let (line, col) = lexer::position_to_line_col(source, e.position);
        CompileError::Parse {
            line,
            col,
            context: lexer::get_error_context(source, e.position),
            message: e.message,
        }
    })
}

pub struct Parser<'t> {
    tokens: &'t [SpannedToken],
    pos: usize,
    end: usize,
    ids: AstNodeIdGenerator,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [SpannedToken], source_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            end: source_len,
            ids: AstNodeIdGenerator::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Token stream helpers
    // -----------------------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn current_position(&self) -> usize {
        self.tokens.get(self.pos).map(|t| t.start).unwrap_or(self.end)
    }

    fn check(&self, t: &Token) -> bool {
        self.peek() == Some(t)
    }

    fn eat(&mut self, t: &Token) -> bool {
        if self.check(t) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, t: &Token) -> Result<(), ParseError> {
        if self.eat(t) {
            Ok(())
        } else {
            Err(self.error_expected(&format!("'{}'", t)))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error_expected("identifier")),
        }
    }

    fn error_expected(&self, what: &str) -> ParseError {
        let found = match self.peek() {
            Some(t) => format!("'{}'", t),
            None => "end of input".to_string(),
        };
        ParseError {
            position: self.current_position(),
            message: format!("Expected {}, found {}", what, found),
        }
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        while self.peek().is_some() {
            statements.push(self.parse_stmt()?);
        }
        Ok(Program { statements })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            Some(Token::Let) => self.parse_let(),
            Some(Token::If) => self.parse_if(),
            Some(Token::For) => self.parse_for(),
            Some(Token::While) => self.parse_while(),
            Some(Token::Function) => self.parse_function(),
            Some(Token::Return) => self.parse_return(),
            Some(Token::LBrace) => self.parse_block(),
            _ => {
                let id = self.ids.next();
                let expr = self.parse_expr()?;
                self.expect(&Token::Semicolon)?;
                Ok(Stmt::Expr { id, expr })
            }
        }
    }

    fn parse_let(&mut self) -> Result<Stmt, ParseError> {
        let stmt = self.parse_let_decl()?;
        self.expect(&Token::Semicolon)?;
        Ok(stmt)
    }

    /// `let name [: annotation] [= expr]` without the trailing semicolon,
    /// shared between plain declarations and for-loop initializers.
    fn parse_let_decl(&mut self) -> Result<Stmt, ParseError> {
        let id = self.ids.next();
        self.expect(&Token::Let)?;
        let name = self.expect_ident()?;
        let annotation = if self.eat(&Token::Colon) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        let init = if self.eat(&Token::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Stmt::VarDecl {
            id,
            name,
            annotation,
            init,
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let id = self.ids.next();
        self.expect(&Token::If)?;
        self.expect(&Token::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(&Token::RParen)?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.eat(&Token::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt::If {
            id,
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let id = self.ids.next();
        self.expect(&Token::For)?;
        self.expect(&Token::LParen)?;

        let init = if self.check(&Token::Semicolon) {
            None
        } else if self.check(&Token::Let) {
            Some(Box::new(self.parse_let_decl()?))
        } else {
            let expr_id = self.ids.next();
            let expr = self.parse_expr()?;
            Some(Box::new(Stmt::Expr { id: expr_id, expr }))
        };
        self.expect(&Token::Semicolon)?;

        let condition = if self.check(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&Token::Semicolon)?;

        let update = if self.check(&Token::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&Token::RParen)?;

        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::For {
            id,
            init,
            condition,
            update,
            body,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let id = self.ids.next();
        self.expect(&Token::While)?;
        self.expect(&Token::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(&Token::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::While {
            id,
            condition,
            body,
        })
    }

    fn parse_function(&mut self) -> Result<Stmt, ParseError> {
        let id = self.ids.next();
        self.expect(&Token::Function)?;
        let name = match self.peek() {
            Some(Token::Ident(_)) => Some(self.expect_ident()?),
            _ => None,
        };
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                let param_id = self.ids.next();
                let param_name = self.expect_ident()?;
                let annotation = if self.eat(&Token::Colon) {
                    Some(self.expect_ident()?)
                } else {
                    None
                };
                params.push(Param {
                    id: param_id,
                    name: param_name,
                    annotation,
                });
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        let return_annotation = if self.eat(&Token::Colon) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        // A bare `;` instead of a body is the ambient declaration form.
        let body = if self.eat(&Token::Semicolon) {
            None
        } else {
            self.expect(&Token::LBrace)?;
            let mut body = Vec::new();
            while !self.check(&Token::RBrace) {
                if self.peek().is_none() {
                    return Err(self.error_expected("'}'"));
                }
                body.push(self.parse_stmt()?);
            }
            self.expect(&Token::RBrace)?;
            Some(body)
        };
        Ok(Stmt::Function {
            id,
            name,
            params,
            return_annotation,
            body,
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let id = self.ids.next();
        self.expect(&Token::Return)?;
        let value = if self.check(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&Token::Semicolon)?;
        Ok(Stmt::Return { id, value })
    }

    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        let id = self.ids.next();
        self.expect(&Token::LBrace)?;
        let mut statements = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(self.error_expected("'}'"));
            }
            statements.push(self.parse_stmt()?);
        }
        self.expect(&Token::RBrace)?;
        Ok(Stmt::Block { id, statements })
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_assign()
    }

    fn parse_assign(&mut self) -> Result<Expr, ParseError> {
        let target = self.parse_or()?;
        if self.eat(&Token::Assign) {
            let id = self.ids.next();
            let value = self.parse_assign()?;
            return Ok(Expr::Assign {
                id,
                target: Box::new(target),
                value: Box::new(value),
            });
        }
        Ok(target)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::OrOr) {
            let id = self.ids.next();
            let right = self.parse_and()?;
            left = Expr::Binary {
                id,
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;
        while self.eat(&Token::AndAnd) {
            let id = self.ids.next();
            let right = self.parse_equality()?;
            left = Expr::Binary {
                id,
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_rel()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinOp::Eq,
                Some(Token::NotEq) => BinOp::Ne,
                _ => break,
            };
            self.pos += 1;
            let id = self.ids.next();
            let right = self.parse_rel()?;
            left = Expr::Binary {
                id,
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_rel(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_add()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinOp::Lt,
                Some(Token::Le) => BinOp::Le,
                Some(Token::Gt) => BinOp::Gt,
                Some(Token::Ge) => BinOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let id = self.ids.next();
            let right = self.parse_add()?;
            left = Expr::Binary {
                id,
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_add(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let id = self.ids.next();
            let right = self.parse_mul()?;
            left = Expr::Binary {
                id,
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_mul(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let id = self.ids.next();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                id,
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(Token::Minus) => Some(UnOp::Neg),
            Some(Token::Bang) => Some(UnOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let id = self.ids.next();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                id,
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check(&Token::LParen) {
                let callee = match &expr {
                    Expr::Ident(_, name) => name.clone(),
                    _ => {
                        return Err(ParseError {
                            position: self.current_position(),
                            message: "Only named functions can be called".to_string(),
                        })
                    }
                };
                self.pos += 1;
                let mut args = Vec::new();
                if !self.check(&Token::RParen) {
                    loop {
                        args.push(self.parse_expr()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&Token::RParen)?;
                let id = self.ids.next();
                expr = Expr::Call { id, callee, args };
            } else if self.eat(&Token::LBracket) {
                let index = self.parse_expr()?;
                self.expect(&Token::RBracket)?;
                let id = self.ids.next();
                expr = Expr::Index {
                    id,
                    base: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek().cloned() {
            Some(Token::Number(value)) => {
                self.pos += 1;
                Ok(Expr::Number(self.ids.next(), value))
            }
            Some(Token::BigInt(value)) => {
                self.pos += 1;
                Ok(Expr::BigInt(self.ids.next(), value))
            }
            Some(Token::True) => {
                self.pos += 1;
                Ok(Expr::Bool(self.ids.next(), true))
            }
            Some(Token::False) => {
                self.pos += 1;
                Ok(Expr::Bool(self.ids.next(), false))
            }
            Some(Token::String(value)) => {
                self.pos += 1;
                Ok(Expr::Str(self.ids.next(), value))
            }
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok(Expr::Ident(self.ids.next(), name))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            _ => Err(self.error_expected("an expression")),
        }
    }
}
