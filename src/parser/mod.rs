//! Parser module - recursive-descent parser over the token stream
//!
//! One method per grammar production, driven by a single token of lookahead.
//! Expressions use precedence climbing:
//! `or` < `and` < `not` < comparison < additive < multiplicative < unary < primary.

mod ast;
mod unparse;

pub use ast::*;
pub use unparse::unparse;

use crate::error::SyntaxError;
use crate::lexer::{string_value, Token, TokenKind};
use crate::semantic::Type;
use log::debug;

/// Deepest allowed recursion through parentheses, calls, unary operators and blocks
pub const MAX_NESTING: usize = 64;

/// Tallest expression tree an operator chain may build (`1 + 2 + ... + n`)
pub const MAX_EXPR_HEIGHT: usize = 256;

/// Parse a token stream into an AST
pub fn parse(tokens: &[Token]) -> Result<Program, SyntaxError> {
    let program = Parser::new(tokens).parse_program()?;
    debug!(
        "parser: {} top-level statements",
        program.statements.len()
    );
    Ok(program)
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    /// Returned by `peek` once the slice is exhausted
    eof: Token,
    /// Number of enclosing blocks
    depth: usize,
    /// Blocks plus open parentheses, calls and unary operators
    nesting: usize,
    in_function: bool,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        let (line, column) = tokens
            .last()
            .map(|t| (t.line, t.column))
            .unwrap_or((1, 1));
        Self {
            tokens,
            pos: 0,
            eof: Token::new(TokenKind::Eof, "", line, column),
            depth: 0,
            nesting: 0,
            in_function: false,
        }
    }

    fn parse_program(mut self) -> Result<Program, SyntaxError> {
        let mut statements = Vec::new();
        loop {
            while self.peek().kind == TokenKind::Newline {
                self.advance();
            }
            if self.peek().is_eof() {
                break;
            }
            if let Some(stmt) = self.statement()? {
                statements.push(stmt);
            }
        }
        Ok(Program { statements })
    }

    // --- statements ---

    /// Parse one statement. `pass` yields `None`.
    fn statement(&mut self) -> Result<Option<Stmt>, SyntaxError> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Keyword => match tok.lexeme.as_str() {
                "def" => {
                    if self.depth > 0 {
                        return Err(SyntaxError::new(
                            "statement (function definitions are only allowed at top level)",
                            tok,
                        ));
                    }
                    self.function_def().map(Some)
                }
                "if" => self.if_stmt().map(Some),
                "while" => self.while_stmt().map(Some),
                _ => self.simple_statement(),
            },
            _ => self.simple_statement(),
        }
    }

    /// Statements that fit on one line (also allowed right after a ':')
    fn simple_statement(&mut self) -> Result<Option<Stmt>, SyntaxError> {
        let tok = self.peek().clone();
        let stmt = match tok.kind {
            TokenKind::Keyword => match tok.lexeme.as_str() {
                "return" => self.return_stmt()?,
                "pass" => {
                    self.advance();
                    self.expect_newline()?;
                    return Ok(None);
                }
                "print" => self.print_stmt()?,
                _ => return Err(SyntaxError::new("statement", &tok)),
            },
            TokenKind::Identifier => {
                let next = self.peek_at(1);
                if next.is_symbol("(") {
                    self.call_stmt()?
                } else if next.is_symbol(":") || is_assign_operator(next) {
                    self.assign_stmt()?
                } else {
                    return Err(SyntaxError::new("'=', ':' or '(' after identifier", next));
                }
            }
            _ => return Err(SyntaxError::new("statement", &tok)),
        };
        Ok(Some(stmt))
    }

    fn function_def(&mut self) -> Result<Stmt, SyntaxError> {
        let def = self.advance();
        let name = self.expect_identifier()?;
        self.expect_symbol("(")?;

        let mut params = Vec::new();
        if !self.peek().is_symbol(")") {
            loop {
                let tok = self.peek().clone();
                let name = self.expect_identifier()?;
                let type_hint = if self.peek().is_symbol(":") {
                    self.advance();
                    Some(self.type_hint(false)?)
                } else {
                    None
                };
                params.push(Param {
                    name,
                    type_hint,
                    pos: tok.location(),
                });
                if !self.peek().is_symbol(",") {
                    break;
                }
                self.advance();
            }
        }
        self.expect_symbol(")")?;

        let return_type = if self.peek().is_symbol("->") {
            self.advance();
            Some(self.type_hint(true)?)
        } else {
            None
        };
        self.expect_symbol(":")?;

        self.in_function = true;
        let body = self.block();
        self.in_function = false;

        Ok(Stmt::FunctionDef {
            name,
            params,
            return_type,
            body: body?,
            pos: def.location(),
        })
    }

    /// `if` / `elif` header plus its blocks. An `elif` becomes a nested If in the else branch.
    fn if_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let keyword = self.advance();
        let condition = self.expr()?;
        self.expect_symbol(":")?;
        let then_branch = self.block()?;

        let else_branch = if self.peek().is_keyword("elif") {
            // each elif is one more nested If
            self.enter("block")?;
            let nested = self.if_stmt();
            self.nesting -= 1;
            Some(vec![nested?])
        } else if self.peek().is_keyword("else") {
            self.advance();
            self.expect_symbol(":")?;
            Some(self.block()?)
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            pos: keyword.location(),
        })
    }

    fn while_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let keyword = self.advance();
        let condition = self.expr()?;
        self.expect_symbol(":")?;
        let body = self.block()?;
        Ok(Stmt::While {
            condition,
            body,
            pos: keyword.location(),
        })
    }

    fn return_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let keyword = self.peek().clone();
        if !self.in_function {
            return Err(SyntaxError::new(
                "statement ('return' outside function)",
                &keyword,
            ));
        }
        self.advance();
        let value = if self.peek().kind == TokenKind::Newline {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect_newline()?;
        Ok(Stmt::Return {
            value,
            pos: keyword.location(),
        })
    }

    fn print_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let keyword = self.advance();
        self.expect_symbol("(")?;
        let argument = self.expr()?;
        self.expect_symbol(")")?;
        self.expect_newline()?;
        Ok(Stmt::Print {
            argument,
            pos: keyword.location(),
        })
    }

    fn call_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let callee_tok = self.advance();
        let args = self.call_args()?;
        self.expect_newline()?;
        Ok(Stmt::Call {
            callee: callee_tok.lexeme.clone(),
            args,
            pos: callee_tok.location(),
        })
    }

    /// `x = e`, `x: T = e`, or `x op= e` (rewritten to `x = x op e`)
    fn assign_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let target_tok = self.advance();
        let annotation = if self.peek().is_symbol(":") {
            self.advance();
            Some(self.type_hint(false)?)
        } else {
            None
        };

        let op_tok = self.peek().clone();
        let augmented = match op_tok.lexeme.as_str() {
            "=" if op_tok.kind == TokenKind::Operator => None,
            "+=" => Some(BinOp::Add),
            "-=" => Some(BinOp::Sub),
            "*=" => Some(BinOp::Mul),
            "/=" => Some(BinOp::Div),
            _ => return Err(SyntaxError::new("'='", &op_tok)),
        };
        if augmented.is_some() && annotation.is_some() {
            return Err(SyntaxError::new("'='", &op_tok));
        }
        self.advance();

        let rhs = self.expr()?;
        self.expect_newline()?;

        let value = match augmented {
            Some(op) => Expr::BinOp {
                left: Box::new(Expr::Name {
                    id: target_tok.lexeme.clone(),
                    pos: target_tok.location(),
                }),
                op,
                right: Box::new(rhs),
                pos: op_tok.location(),
            },
            None => rhs,
        };
        Ok(Stmt::Assign {
            target: target_tok.lexeme.clone(),
            annotation,
            value,
            pos: target_tok.location(),
        })
    }

    /// `NEWLINE INDENT statement+ DEDENT`, or a single simple statement on the same line
    fn block(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.enter("block")?;
        self.depth += 1;
        let result = self.block_inner();
        self.depth -= 1;
        self.nesting -= 1;
        result
    }

    fn block_inner(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        if self.peek().kind != TokenKind::Newline {
            return Ok(self.simple_statement()?.into_iter().collect());
        }
        self.advance();
        self.expect_kind(TokenKind::Indent, "indented block")?;

        let mut body = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Dedent => {
                    self.advance();
                    break;
                }
                TokenKind::Newline => {
                    self.advance();
                }
                _ => {
                    if let Some(stmt) = self.statement()? {
                        body.push(stmt);
                    }
                }
            }
        }
        Ok(body)
    }

    fn type_hint(&mut self, allow_none: bool) -> Result<Type, SyntaxError> {
        let tok = self.peek().clone();
        let expected = if allow_none {
            "type (int, float, str, bool or None)"
        } else {
            "type (int, float, str or bool)"
        };
        if tok.kind != TokenKind::Identifier {
            return Err(SyntaxError::new(expected, &tok));
        }
        match Type::from_hint(&tok.lexeme) {
            Some(Type::Void) if !allow_none => Err(SyntaxError::new(expected, &tok)),
            Some(ty) => {
                self.advance();
                Ok(ty)
            }
            None => Err(SyntaxError::new(expected, &tok)),
        }
    }

    // --- expressions ---

    fn expr(&mut self) -> Result<Expr, SyntaxError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.and_expr()?;
        let mut height = None;
        while self.peek().is_keyword("or") {
            let op_tok = self.advance();
            let right = self.and_expr()?;
            left = link(left, &mut height, BinOp::Or, right, &op_tok)?;
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.not_expr()?;
        let mut height = None;
        while self.peek().is_keyword("and") {
            let op_tok = self.advance();
            let right = self.not_expr()?;
            left = link(left, &mut height, BinOp::And, right, &op_tok)?;
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Expr, SyntaxError> {
        if self.peek().is_keyword("not") {
            self.enter("expression")?;
            let op_tok = self.advance();
            let operand = self.not_expr();
            self.nesting -= 1;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand?),
                pos: op_tok.location(),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.additive()?;
        let mut height = None;
        loop {
            let op = match self.operator() {
                Some("==") => BinOp::Eq,
                Some("!=") => BinOp::NotEq,
                Some("<") => BinOp::Lt,
                Some(">") => BinOp::Gt,
                Some("<=") => BinOp::LtEq,
                Some(">=") => BinOp::GtEq,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.additive()?;
            left = link(left, &mut height, op, right, &op_tok)?;
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.term()?;
        let mut height = None;
        loop {
            let op = match self.operator() {
                Some("+") => BinOp::Add,
                Some("-") => BinOp::Sub,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.term()?;
            left = link(left, &mut height, op, right, &op_tok)?;
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.unary()?;
        let mut height = None;
        loop {
            let op = match self.operator() {
                Some("*") => BinOp::Mul,
                Some("/") => BinOp::Div,
                Some("%") => BinOp::Mod,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.unary()?;
            left = link(left, &mut height, op, right, &op_tok)?;
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.operator() {
            Some("-") => UnaryOp::Neg,
            Some("+") => UnaryOp::Pos,
            _ => return self.primary(),
        };
        self.enter("expression")?;
        let op_tok = self.advance();
        let operand = self.unary();
        self.nesting -= 1;
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand?),
            pos: op_tok.location(),
        })
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let tok = self.peek().clone();
        let pos = tok.location();
        match tok.kind {
            TokenKind::Number => {
                self.advance();
                let value = if tok.lexeme.contains('.') {
                    tok.lexeme
                        .parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .map(LiteralValue::Float)
                        .ok_or_else(|| SyntaxError::new("float literal within 64-bit range", &tok))?
                } else {
                    tok.lexeme
                        .parse::<i64>()
                        .map(LiteralValue::Int)
                        .map_err(|_| SyntaxError::new("integer literal within 64-bit range", &tok))?
                };
                Ok(Expr::Literal { value, pos })
            }
            TokenKind::String => {
                self.advance();
                Ok(Expr::Literal {
                    value: LiteralValue::Str(string_value(&tok.lexeme)),
                    pos,
                })
            }
            TokenKind::Keyword if tok.lexeme == "True" || tok.lexeme == "False" => {
                self.advance();
                Ok(Expr::Literal {
                    value: LiteralValue::Bool(tok.lexeme == "True"),
                    pos,
                })
            }
            TokenKind::Identifier => {
                self.advance();
                if self.peek().is_symbol("(") {
                    self.enter("expression")?;
                    let args = self.call_args();
                    self.nesting -= 1;
                    Ok(Expr::Call {
                        callee: tok.lexeme,
                        args: args?,
                        pos,
                    })
                } else {
                    Ok(Expr::Name {
                        id: tok.lexeme,
                        pos,
                    })
                }
            }
            TokenKind::Delimiter if tok.lexeme == "(" => {
                self.enter("expression")?;
                self.advance();
                let inner = self.expr();
                self.nesting -= 1;
                let inner = inner?;
                self.expect_symbol(")")?;
                Ok(inner)
            }
            _ => Err(SyntaxError::new("expression", &tok)),
        }
    }

    /// `'(' [expr (',' expr)*] ')'`
    fn call_args(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        self.expect_symbol("(")?;
        let mut args = Vec::new();
        if !self.peek().is_symbol(")") {
            loop {
                args.push(self.expr()?);
                if !self.peek().is_symbol(",") {
                    break;
                }
                self.advance();
            }
        }
        self.expect_symbol(")")?;
        Ok(args)
    }
}

impl Parser<'_> {
    /// Go one nesting level deeper; the caller decrements `nesting` when done
    fn enter(&mut self, what: &str) -> Result<(), SyntaxError> {
        if self.nesting >= MAX_NESTING {
            return Err(SyntaxError::new(
                format!("less deeply nested {what}"),
                self.peek(),
            ));
        }
        self.nesting += 1;
        Ok(())
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&self.eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Lexeme of the current token when it is an operator
    fn operator(&self) -> Option<&str> {
        let tok = self.peek();
        (tok.kind == TokenKind::Operator).then_some(tok.lexeme.as_str())
    }

    fn expect_symbol(&mut self, symbol: &str) -> Result<Token, SyntaxError> {
        if self.peek().is_symbol(symbol) {
            Ok(self.advance())
        } else {
            Err(SyntaxError::new(format!("'{symbol}'"), self.peek()))
        }
    }

    fn expect_kind(&mut self, kind: TokenKind, expected: &str) -> Result<Token, SyntaxError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(SyntaxError::new(expected, self.peek()))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, SyntaxError> {
        self.expect_kind(TokenKind::Identifier, "identifier")
            .map(|tok| tok.lexeme)
    }

    fn expect_newline(&mut self) -> Result<(), SyntaxError> {
        self.expect_kind(TokenKind::Newline, "end of line").map(|_| ())
    }
}

fn is_assign_operator(tok: &Token) -> bool {
    tok.kind == TokenKind::Operator && matches!(tok.lexeme.as_str(), "=" | "+=" | "-=" | "*=" | "/=")
}

/// Extend a left-associative chain by one operator. `height` caches the
/// height of `left` once the chain has more than one operand.
fn link(
    left: Expr,
    height: &mut Option<usize>,
    op: BinOp,
    right: Expr,
    op_tok: &Token,
) -> Result<Expr, SyntaxError> {
    let left_height = height.unwrap_or_else(|| expr_height(&left));
    let new_height = left_height.max(expr_height(&right)) + 1;
    if new_height > MAX_EXPR_HEIGHT {
        return Err(SyntaxError::new("less deeply nested expression", op_tok));
    }
    *height = Some(new_height);
    Ok(binop(left, op, right, op_tok))
}

/// Height of an expression tree (a lone literal or name is 1)
fn expr_height(expr: &Expr) -> usize {
    let mut tallest = 0;
    let mut stack = vec![(expr, 1)];
    while let Some((expr, height)) = stack.pop() {
        tallest = tallest.max(height);
        match expr {
            Expr::BinOp { left, right, .. } => {
                stack.push((left.as_ref(), height + 1));
                stack.push((right.as_ref(), height + 1));
            }
            Expr::UnaryOp { operand, .. } => stack.push((operand.as_ref(), height + 1)),
            Expr::Call { args, .. } => stack.extend(args.iter().map(|a| (a, height + 1))),
            Expr::Literal { .. } | Expr::Name { .. } => {}
        }
    }
    tallest
}

fn binop(left: Expr, op: BinOp, right: Expr, op_tok: &Token) -> Expr {
    Expr::BinOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
        pos: op_tok.location(),
    }
}
