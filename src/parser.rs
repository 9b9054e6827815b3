//! Recursive-descent parser (§10, ambient)
//!
//! One token of lookahead; precedence-climbing for binary expressions
//! following C's standard precedence ladder. Produces the untyped
//! [`Program`] consumed by the semantic analyzer (§4.E). Parse errors abort
//! parsing of the current top-level declaration; the driver does not
//! attempt statement-level recovery.

use crate::ast::*;
use crate::constfold::fold_int;
use crate::diagnostics::{ParseError, SourceLocation};
use crate::lexer::{Keyword, Token, TokenKind};
use crate::types::{AggKind, Basic, FloatKind, IntKind, Member, TagRegistry, Type};

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    pub tags: TagRegistry,
}

type PResult<T> = Result<T, ParseError>;

pub fn parse(tokens: &[Token]) -> PResult<(Program, TagRegistry)> {
    let mut p = Parser {
        tokens,
        pos: 0,
        tags: TagRegistry::new(),
    };
    let program = p.parse_program()?;
    Ok((program, p.tags))
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn loc(&self) -> SourceLocation {
        self.tokens[self.pos].loc
    }

    fn bump(&mut self) -> &Token {
        let t = &self.tokens[self.pos];
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        ParseError {
            message: msg.into(),
            loc: self.loc(),
        }
    }

    fn at_punct(&self, s: &str) -> bool {
        matches!(self.peek(), TokenKind::Punct(p) if *p == s)
    }

    fn at_keyword(&self, k: Keyword) -> bool {
        matches!(self.peek(), TokenKind::Keyword(kw) if *kw == k)
    }

    fn eat_punct(&mut self, s: &str) -> PResult<()> {
        if self.at_punct(s) {
            self.bump();
            Ok(())
        } else {
            Err(self.err(format!("expected '{}'", s)))
        }
    }

    fn eat_ident(&mut self) -> PResult<String> {
        match self.peek().clone() {
            TokenKind::Ident(s) => {
                self.bump();
                Ok(s)
            }
            other => Err(self.err(format!("expected identifier, found {:?}", other))),
        }
    }

    fn is_type_start(&self) -> bool {
        use Keyword::*;
        matches!(
            self.peek(),
            TokenKind::Keyword(
                Int | Char | Short | Long | Unsigned | Signed | Float | Double | Void | Struct
                    | Union
            )
        )
    }

    fn parse_program(&mut self) -> PResult<Program> {
        let mut decls = Vec::new();
        while !matches!(self.peek(), TokenKind::Eof) {
            decls.push(self.parse_top_level_decl()?);
        }
        Ok(Program { decls })
    }

    // ---- type specifiers ----------------------------------------------

    /// Parses a storage class (if any) and a base type specifier, returning
    /// `(linkage, base_type)`. Does not consume pointer stars or the
    /// declarator name.
    fn parse_decl_specifiers(&mut self) -> PResult<(Linkage, Type)> {
        let mut linkage = Linkage::None;
        loop {
            if self.at_keyword(Keyword::Extern) {
                self.bump();
                linkage = Linkage::External;
            } else if self.at_keyword(Keyword::Static) {
                self.bump();
                linkage = Linkage::Static;
            } else {
                break;
            }
        }
        let ty = self.parse_type_spec()?;
        Ok((linkage, ty))
    }

    fn parse_type_spec(&mut self) -> PResult<Type> {
        if self.at_keyword(Keyword::Void) {
            self.bump();
            return Ok(Type::Void);
        }
        if self.at_keyword(Keyword::Struct) || self.at_keyword(Keyword::Union) {
            let kind = if self.at_keyword(Keyword::Struct) {
                AggKind::Struct
            } else {
                AggKind::Union
            };
            self.bump();
            let name = self.eat_ident()?;
            let members = if self.at_punct("{") {
                self.bump();
                let mut members = Vec::new();
                while !self.at_punct("}") {
                    let (_, base) = self.parse_decl_specifiers()?;
                    loop {
                        let (field_ty, field_name) = self.parse_declarator(base.clone())?;
                        members.push(Member {
                            name: field_name.ok_or_else(|| self.err("struct member needs a name"))?,
                            ty: field_ty,
                        });
                        if self.at_punct(",") {
                            self.bump();
                        } else {
                            break;
                        }
                    }
                    self.eat_punct(";")?;
                }
                self.eat_punct("}")?;
                Some(members)
            } else {
                None
            };
            let id = self
                .tags
                .declare(kind, &name, members)
                .map_err(|e| self.err(e.to_string()))?;
            return Ok(if kind == AggKind::Struct {
                Type::Struct(id)
            } else {
                Type::Union(id)
            });
        }

        let mut kws = Vec::new();
        loop {
            let kw = match self.peek() {
                TokenKind::Keyword(
                    k @ (Keyword::Int
                    | Keyword::Char
                    | Keyword::Short
                    | Keyword::Long
                    | Keyword::Unsigned
                    | Keyword::Signed
                    | Keyword::Float
                    | Keyword::Double),
                ) => *k,
                _ => break,
            };
            kws.push(kw);
            self.bump();
        }
        if kws.is_empty() {
            return Err(self.err("expected a type specifier"));
        }
        basic_from_keywords(&kws)
            .map(Type::Basic)
            .map_err(|e| self.err(e))
    }

    /// Parses `"*"* ident? ("[" const-expr? "]")*`, applying pointer stars to
    /// `base` then wrapping with array dimensions (outermost bracket first,
    /// §10 declarator grammar). Array bounds are folded to constants here
    /// (see `constfold`); declarator order matches `int *a[10]` meaning
    /// "array of 10 pointers to int": stars bind to the element type before
    /// the brackets wrap it.
    fn parse_declarator(&mut self, base: Type) -> PResult<(Type, Option<String>)> {
        let mut stars = 0;
        while self.at_punct("*") {
            self.bump();
            stars += 1;
        }
        let name = match self.peek() {
            TokenKind::Ident(s) => {
                let s = s.clone();
                self.bump();
                Some(s)
            }
            _ => None,
        };
        let mut elem = base;
        for _ in 0..stars {
            elem = Type::Pointer(Box::new(elem));
        }
        let mut dims: Vec<Option<u64>> = Vec::new();
        while self.at_punct("[") {
            self.bump();
            if self.at_punct("]") {
                dims.push(None);
            } else {
                let e = self.parse_conditional()?;
                let n = fold_int(&e)
                    .ok_or_else(|| self.err("array bound is not a constant expression"))?;
                dims.push(Some(n as u64));
            }
            self.eat_punct("]")?;
        }
        for dim in dims.into_iter().rev() {
            elem = Type::Array(Box::new(elem), dim);
        }
        Ok((elem, name))
    }

    fn parse_top_level_decl(&mut self) -> PResult<Decl> {
        let loc = self.loc();
        let (linkage, base) = self.parse_decl_specifiers()?;
        let (ty, name) = self.parse_declarator(base)?;
        let name = name.ok_or_else(|| self.err("declaration needs a name"))?;

        if self.at_punct("(") {
            let (params, variadic) = self.parse_param_list()?;
            let body = if self.at_punct("{") {
                Some(self.parse_block()?)
            } else {
                self.eat_punct(";")?;
                None
            };
            return Ok(Decl::Func(FuncDecl {
                name,
                ret: ty,
                params,
                variadic,
                linkage,
                body,
                loc,
            }));
        }

        let init = if self.at_punct("=") {
            self.bump();
            Some(self.parse_initializer()?)
        } else {
            None
        };
        self.eat_punct(";")?;
        Ok(Decl::Var(VarDecl {
            name,
            ty,
            linkage,
            init,
            loc,
        }))
    }

    fn parse_initializer(&mut self) -> PResult<Initializer> {
        if self.at_punct("{") {
            self.bump();
            let mut items = Vec::new();
            while !self.at_punct("}") {
                items.push(self.parse_initializer()?);
                if self.at_punct(",") {
                    self.bump();
                } else {
                    break;
                }
            }
            self.eat_punct("}")?;
            Ok(Initializer::List(items))
        } else {
            Ok(Initializer::Scalar(self.parse_assignment()?))
        }
    }

    fn parse_param_list(&mut self) -> PResult<(Vec<Param>, bool)> {
        self.eat_punct("(")?;
        let mut params = Vec::new();
        let mut variadic = false;
        if self.at_punct(")") {
            self.bump();
            return Ok((params, variadic));
        }
        if self.at_keyword(Keyword::Void) && self.peek_ahead_is_rparen() {
            self.bump();
            self.eat_punct(")")?;
            return Ok((params, variadic));
        }
        loop {
            if self.at_punct("...") {
                self.bump();
                variadic = true;
                break;
            }
            let (_, base) = self.parse_decl_specifiers()?;
            let (mut ty, name) = self.parse_declarator(base)?;
            // Array parameters decay to pointers immediately (no deferred
            // resolution needed, unlike object declarations).
            if let Type::Array(elem, _) = ty {
                ty = Type::Pointer(elem);
            }
            params.push(Param { name, ty });
            if self.at_punct(",") {
                self.bump();
            } else {
                break;
            }
        }
        self.eat_punct(")")?;
        Ok((params, variadic))
    }

    fn peek_ahead_is_rparen(&self) -> bool {
        self.tokens
            .get(self.pos + 1)
            .is_some_and(|t| matches!(t.kind, TokenKind::Punct(")")))
    }

    // ---- statements -----------------------------------------------------

    fn parse_block(&mut self) -> PResult<Block> {
        self.eat_punct("{")?;
        let mut items = Vec::new();
        while !self.at_punct("}") {
            items.push(self.parse_block_item()?);
        }
        self.eat_punct("}")?;
        Ok(items)
    }

    fn parse_block_item(&mut self) -> PResult<BlockItem> {
        if self.is_type_start() || self.at_keyword(Keyword::Extern) || self.at_keyword(Keyword::Static) {
            let loc = self.loc();
            let (linkage, base) = self.parse_decl_specifiers()?;
            let (ty, name) = self.parse_declarator(base)?;
            let name = name.ok_or_else(|| self.err("declaration needs a name"))?;
            let init = if self.at_punct("=") {
                self.bump();
                Some(self.parse_initializer()?)
            } else {
                None
            };
            self.eat_punct(";")?;
            Ok(BlockItem::Decl(Decl::Var(VarDecl {
                name,
                ty,
                linkage,
                init,
                loc,
            })))
        } else {
            Ok(BlockItem::Stmt(self.parse_stmt()?))
        }
    }

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        let loc = self.loc();
        if self.at_punct("{") {
            return Ok(Stmt::Block(self.parse_block()?));
        }
        if self.at_keyword(Keyword::If) {
            self.bump();
            self.eat_punct("(")?;
            let cond = self.parse_expr()?;
            self.eat_punct(")")?;
            let then = Box::new(self.parse_stmt()?);
            let else_ = if self.at_keyword(Keyword::Else) {
                self.bump();
                Some(Box::new(self.parse_stmt()?))
            } else {
                None
            };
            return Ok(Stmt::If { cond, then, else_ });
        }
        if self.at_keyword(Keyword::While) {
            self.bump();
            self.eat_punct("(")?;
            let cond = self.parse_expr()?;
            self.eat_punct(")")?;
            let body = Box::new(self.parse_stmt()?);
            return Ok(Stmt::While { cond, body });
        }
        if self.at_keyword(Keyword::Do) {
            self.bump();
            let body = Box::new(self.parse_stmt()?);
            if !self.at_keyword(Keyword::While) {
                return Err(self.err("expected 'while' after 'do' body"));
            }
            self.bump();
            self.eat_punct("(")?;
            let cond = self.parse_expr()?;
            self.eat_punct(")")?;
            self.eat_punct(";")?;
            return Ok(Stmt::DoWhile { body, cond });
        }
        if self.at_keyword(Keyword::For) {
            self.bump();
            self.eat_punct("(")?;
            let init = if self.at_punct(";") {
                self.bump();
                ForInit::Empty
            } else if self.is_type_start() {
                let (linkage, base) = self.parse_decl_specifiers()?;
                let (ty, name) = self.parse_declarator(base)?;
                let name = name.ok_or_else(|| self.err("declaration needs a name"))?;
                let init = if self.at_punct("=") {
                    self.bump();
                    Some(self.parse_initializer()?)
                } else {
                    None
                };
                self.eat_punct(";")?;
                ForInit::Decl(VarDecl {
                    name,
                    ty,
                    linkage,
                    init,
                    loc,
                })
            } else {
                let e = self.parse_expr()?;
                self.eat_punct(";")?;
                ForInit::Expr(e)
            };
            let cond = if self.at_punct(";") {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.eat_punct(";")?;
            let post = if self.at_punct(")") {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.eat_punct(")")?;
            let body = Box::new(self.parse_stmt()?);
            return Ok(Stmt::For {
                init,
                cond,
                post,
                body,
            });
        }
        if self.at_keyword(Keyword::Switch) {
            self.bump();
            self.eat_punct("(")?;
            let cond = self.parse_expr()?;
            self.eat_punct(")")?;
            let body = Box::new(self.parse_stmt()?);
            return Ok(Stmt::Switch { cond, body });
        }
        if self.at_keyword(Keyword::Case) {
            self.bump();
            let value = self.parse_conditional()?;
            self.eat_punct(":")?;
            let stmt = Box::new(self.parse_stmt()?);
            return Ok(Stmt::Case { value, stmt });
        }
        if self.at_keyword(Keyword::Default) {
            self.bump();
            self.eat_punct(":")?;
            return Ok(Stmt::Default(Box::new(self.parse_stmt()?)));
        }
        if self.at_keyword(Keyword::Break) {
            self.bump();
            self.eat_punct(";")?;
            return Ok(Stmt::Break(loc));
        }
        if self.at_keyword(Keyword::Continue) {
            self.bump();
            self.eat_punct(";")?;
            return Ok(Stmt::Continue(loc));
        }
        if self.at_keyword(Keyword::Return) {
            self.bump();
            let expr = if self.at_punct(";") {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.eat_punct(";")?;
            return Ok(Stmt::Return(expr, loc));
        }
        if self.at_keyword(Keyword::Goto) {
            self.bump();
            let name = self.eat_ident()?;
            self.eat_punct(";")?;
            return Ok(Stmt::Goto(name, loc));
        }
        if self.at_punct(";") {
            self.bump();
            return Ok(Stmt::Expr(None));
        }
        // `ident ":" stmt` — labeled statement. Lookahead two tokens to
        // distinguish from an expression statement starting with an ident.
        if let TokenKind::Ident(name) = self.peek().clone() {
            if self
                .tokens
                .get(self.pos + 1)
                .is_some_and(|t| matches!(t.kind, TokenKind::Punct(":")))
            {
                self.bump();
                self.bump();
                return Ok(Stmt::Label(name, Box::new(self.parse_stmt()?)));
            }
        }
        let e = self.parse_expr()?;
        self.eat_punct(";")?;
        Ok(Stmt::Expr(Some(e)))
    }

    // ---- expressions: precedence ladder ---------------------------------
    // comma < assignment < conditional < logical-or < logical-and <
    // bitwise-or < bitwise-xor < bitwise-and < equality < relational <
    // shift < additive < multiplicative < unary < postfix < primary

    fn parse_expr(&mut self) -> PResult<Expr> {
        let mut e = self.parse_assignment()?;
        while self.at_punct(",") {
            let loc = self.loc();
            self.bump();
            let rhs = self.parse_assignment()?;
            e = Expr::new(ExprKind::Comma(Box::new(e), Box::new(rhs)), loc);
        }
        Ok(e)
    }

    fn parse_assignment(&mut self) -> PResult<Expr> {
        let lhs = self.parse_conditional()?;
        let op = match self.peek() {
            TokenKind::Punct("=") => Some(None),
            TokenKind::Punct("+=") => Some(Some(BinOp::Add)),
            TokenKind::Punct("-=") => Some(Some(BinOp::Sub)),
            TokenKind::Punct("*=") => Some(Some(BinOp::Mul)),
            TokenKind::Punct("/=") => Some(Some(BinOp::Div)),
            TokenKind::Punct("%=") => Some(Some(BinOp::Mod)),
            TokenKind::Punct("&=") => Some(Some(BinOp::BitAnd)),
            TokenKind::Punct("|=") => Some(Some(BinOp::BitOr)),
            TokenKind::Punct("^=") => Some(Some(BinOp::BitXor)),
            TokenKind::Punct("<<=") => Some(Some(BinOp::Shl)),
            TokenKind::Punct(">>=") => Some(Some(BinOp::Shr)),
            _ => None,
        };
        if let Some(op) = op {
            let loc = self.loc();
            self.bump();
            let rhs = self.parse_assignment()?;
            return Ok(Expr::new(
                ExprKind::Assign {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                loc,
            ));
        }
        Ok(lhs)
    }

    fn parse_conditional(&mut self) -> PResult<Expr> {
        let cond = self.parse_binary(0)?;
        if self.at_punct("?") {
            let loc = self.loc();
            self.bump();
            let then = self.parse_expr()?;
            self.eat_punct(":")?;
            let else_ = self.parse_conditional()?;
            return Ok(Expr::new(
                ExprKind::Conditional {
                    cond: Box::new(cond),
                    then: Box::new(then),
                    else_: Box::new(else_),
                },
                loc,
            ));
        }
        Ok(cond)
    }

    fn binop_for(&self) -> Option<(BinOp, u8)> {
        Some(match self.peek() {
            TokenKind::Punct("||") => (BinOp::LogOr, 1),
            TokenKind::Punct("&&") => (BinOp::LogAnd, 2),
            TokenKind::Punct("|") => (BinOp::BitOr, 3),
            TokenKind::Punct("^") => (BinOp::BitXor, 4),
            TokenKind::Punct("&") => (BinOp::BitAnd, 5),
            TokenKind::Punct("==") => (BinOp::Eq, 6),
            TokenKind::Punct("!=") => (BinOp::Ne, 6),
            TokenKind::Punct("<") => (BinOp::Lt, 7),
            TokenKind::Punct("<=") => (BinOp::Le, 7),
            TokenKind::Punct(">") => (BinOp::Gt, 7),
            TokenKind::Punct(">=") => (BinOp::Ge, 7),
            TokenKind::Punct("<<") => (BinOp::Shl, 8),
            TokenKind::Punct(">>") => (BinOp::Shr, 8),
            TokenKind::Punct("+") => (BinOp::Add, 9),
            TokenKind::Punct("-") => (BinOp::Sub, 9),
            TokenKind::Punct("*") => (BinOp::Mul, 10),
            TokenKind::Punct("/") => (BinOp::Div, 10),
            TokenKind::Punct("%") => (BinOp::Mod, 10),
            _ => return None,
        })
    }

    /// Precedence-climbing binary expression parser; `min_prec` is the
    /// lowest-precedence operator this call is allowed to consume.
    fn parse_binary(&mut self, min_prec: u8) -> PResult<Expr> {
        let mut lhs = self.parse_unary()?;
        while let Some((op, prec)) = self.binop_for() {
            if prec < min_prec {
                break;
            }
            let loc = self.loc();
            self.bump();
            let rhs = self.parse_binary(prec + 1)?;
            lhs = Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), loc);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let loc = self.loc();
        if self.at_keyword(Keyword::Sizeof) {
            self.bump();
            if self.at_punct("(") && self.peek_is_type_after_lparen() {
                self.bump();
                let (_, base) = self.parse_decl_specifiers()?;
                let (ty, _) = self.parse_declarator(base)?;
                self.eat_punct(")")?;
                return Ok(Expr::new(ExprKind::SizeofType(ty), loc));
            }
            let inner = self.parse_unary()?;
            return Ok(Expr::new(ExprKind::SizeofExpr(Box::new(inner)), loc));
        }
        macro_rules! unary_op {
            ($punct:literal, $op:expr) => {
                if self.at_punct($punct) {
                    self.bump();
                    let inner = self.parse_unary()?;
                    return Ok(Expr::new(ExprKind::Unary($op, Box::new(inner)), loc));
                }
            };
        }
        unary_op!("+", UnaryOp::Plus);
        unary_op!("-", UnaryOp::Neg);
        unary_op!("!", UnaryOp::Not);
        unary_op!("~", UnaryOp::BitNot);
        if self.at_punct("&") {
            self.bump();
            let inner = self.parse_unary()?;
            return Ok(Expr::new(ExprKind::AddrOf(Box::new(inner)), loc));
        }
        if self.at_punct("*") {
            self.bump();
            let inner = self.parse_unary()?;
            return Ok(Expr::new(ExprKind::Deref(Box::new(inner)), loc));
        }
        if self.at_punct("++") {
            self.bump();
            let inner = self.parse_unary()?;
            return Ok(Expr::new(
                ExprKind::PreIncDec(IncDecOp::Inc, Box::new(inner)),
                loc,
            ));
        }
        if self.at_punct("--") {
            self.bump();
            let inner = self.parse_unary()?;
            return Ok(Expr::new(
                ExprKind::PreIncDec(IncDecOp::Dec, Box::new(inner)),
                loc,
            ));
        }
        self.parse_postfix()
    }

    fn peek_is_type_after_lparen(&self) -> bool {
        use Keyword::*;
        self.tokens.get(self.pos + 1).is_some_and(|t| {
            matches!(
                t.kind,
                TokenKind::Keyword(
                    Int | Char | Short | Long | Unsigned | Signed | Float | Double | Void
                        | Struct
                        | Union
                )
            )
        })
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut e = self.parse_primary()?;
        loop {
            let loc = self.loc();
            if self.at_punct("[") {
                self.bump();
                let index = self.parse_expr()?;
                self.eat_punct("]")?;
                e = Expr::new(
                    ExprKind::Index {
                        base: Box::new(e),
                        index: Box::new(index),
                    },
                    loc,
                );
            } else if self.at_punct("(") {
                self.bump();
                let mut args = Vec::new();
                if !self.at_punct(")") {
                    loop {
                        args.push(self.parse_assignment()?);
                        if self.at_punct(",") {
                            self.bump();
                        } else {
                            break;
                        }
                    }
                }
                self.eat_punct(")")?;
                e = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(e),
                        args,
                    },
                    loc,
                );
            } else if self.at_punct(".") {
                self.bump();
                let field = self.eat_ident()?;
                e = Expr::new(
                    ExprKind::Member {
                        base: Box::new(e),
                        field,
                        arrow: false,
                    },
                    loc,
                );
            } else if self.at_punct("->") {
                self.bump();
                let field = self.eat_ident()?;
                e = Expr::new(
                    ExprKind::Member {
                        base: Box::new(e),
                        field,
                        arrow: true,
                    },
                    loc,
                );
            } else if self.at_punct("++") {
                self.bump();
                e = Expr::new(ExprKind::PostIncDec(IncDecOp::Inc, Box::new(e)), loc);
            } else if self.at_punct("--") {
                self.bump();
                e = Expr::new(ExprKind::PostIncDec(IncDecOp::Dec, Box::new(e)), loc);
            } else {
                break;
            }
        }
        Ok(e)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let loc = self.loc();
        match self.peek().clone() {
            TokenKind::IntLiteral {
                text,
                unsigned: _,
                long: _,
            } => {
                self.bump();
                let v = parse_int_literal(&text).map_err(|e| self.err(e))?;
                Ok(Expr::new(ExprKind::IntLiteral(v), loc))
            }
            TokenKind::FloatLiteral { text, .. } => {
                self.bump();
                let v: f64 = text
                    .parse()
                    .map_err(|_| self.err("malformed floating literal"))?;
                Ok(Expr::new(ExprKind::FloatLiteral(v), loc))
            }
            TokenKind::StringLiteral(s) => {
                self.bump();
                Ok(Expr::new(ExprKind::StringLiteral(s), loc))
            }
            TokenKind::CharLiteral(c) => {
                self.bump();
                Ok(Expr::new(ExprKind::CharLiteral(c), loc))
            }
            TokenKind::Ident(name) => {
                self.bump();
                Ok(Expr::new(ExprKind::Variable(name), loc))
            }
            TokenKind::Punct("(") => {
                self.bump();
                let e = self.parse_expr()?;
                self.eat_punct(")")?;
                Ok(e)
            }
            other => Err(self.err(format!("unexpected token {:?}", other))),
        }
    }
}

/// Parses the digit portion of an integer literal, honoring the `0x`/`0`
/// prefixes (hex/octal) the lexer already separated from the suffix.
fn parse_int_literal(text: &str) -> Result<u64, String> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_err(|e| e.to_string());
    }
    if text.len() > 1 && text.starts_with('0') {
        return u64::from_str_radix(&text[1..], 8).map_err(|e| e.to_string());
    }
    text.parse().map_err(|e: std::num::ParseIntError| e.to_string())
}

/// Resolves a basic type from a keyword multiset, grounded on the original's
/// `from_str_multiset`.
fn basic_from_keywords(kws: &[Keyword]) -> Result<Basic, String> {
    use Keyword::*;
    let count = |k: Keyword| kws.iter().filter(|&&x| x == k).count();
    let has = |k: Keyword| count(k) > 0;

    if has(Float) {
        return Ok(Basic::Float(FloatKind::Float));
    }
    if has(Double) {
        return Ok(Basic::Float(if has(Long) {
            FloatKind::LongDouble
        } else {
            FloatKind::Double
        }));
    }
    let unsigned = has(Unsigned);
    if unsigned && has(Signed) {
        return Err("cannot combine 'signed' and 'unsigned'".into());
    }
    if has(Char) {
        return Ok(Basic::Int(if unsigned {
            IntKind::UChar
        } else if has(Signed) {
            IntKind::SChar
        } else {
            IntKind::Char
        }));
    }
    if has(Short) {
        return Ok(Basic::Int(if unsigned {
            IntKind::UShort
        } else {
            IntKind::Short
        }));
    }
    if count(Long) >= 2 {
        return Ok(Basic::Int(if unsigned {
            IntKind::ULLong
        } else {
            IntKind::LLong
        }));
    }
    if has(Long) {
        return Ok(Basic::Int(if unsigned {
            IntKind::ULong
        } else {
            IntKind::Long
        }));
    }
    Ok(Basic::Int(if unsigned { IntKind::UInt } else { IntKind::Int }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse_src(src: &str) -> (Program, TagRegistry) {
        let tokens = Lexer::new(src).tokenize().unwrap();
        parse(&tokens).unwrap()
    }

    #[test]
    fn parses_minimal_main() {
        let (program, _) = parse_src("int main(){return 2;}");
        assert_eq!(program.decls.len(), 1);
        match &program.decls[0] {
            Decl::Func(f) => {
                assert_eq!(f.name, "main");
                assert_eq!(f.ret, Type::int());
                assert!(f.body.is_some());
            }
            _ => panic!("expected a function"),
        }
    }

    #[test]
    fn parses_pointer_array_declarator_as_array_of_pointers() {
        let (program, _) = parse_src("int *a[10];");
        match &program.decls[0] {
            Decl::Var(v) => {
                assert_eq!(
                    v.ty,
                    Type::Array(Box::new(Type::Pointer(Box::new(Type::int()))), Some(10))
                );
            }
            _ => panic!("expected a var decl"),
        }
    }

    #[test]
    fn parses_for_loop_with_declaration_init() {
        let (program, _) = parse_src("int main(){int i; for(i=0;i<3;i++); return i;}");
        let Decl::Func(f) = &program.decls[0] else {
            panic!()
        };
        assert_eq!(f.body.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn parses_extern_decl() {
        let (program, _) = parse_src("extern int x; int main(){return x;}");
        match &program.decls[0] {
            Decl::Var(v) => assert_eq!(v.linkage, Linkage::External),
            _ => panic!(),
        }
    }

    #[test]
    fn precedence_of_logical_and_over_or() {
        let (program, _) = parse_src("int main(){return 1 && 0;}");
        let Decl::Func(f) = &program.decls[0] else {
            panic!()
        };
        let BlockItem::Stmt(Stmt::Return(Some(e), _)) = &f.body.as_ref().unwrap()[0] else {
            panic!()
        };
        assert!(matches!(e.kind, ExprKind::Binary(BinOp::LogAnd, _, _)));
    }

    #[test]
    fn unexpected_token_is_a_parse_error() {
        let tokens = Lexer::new("int main(){return }").tokenize().unwrap();
        assert!(parse(&tokens).is_err());
    }
}
