//! Semantic analyzer (§4.E)
//!
//! Bottom-up expression typing (populating each node's [`ExprAnnotation`])
//! and top-down declaration/control-flow analysis over the parser's untyped
//! `Program`. Errors are accumulated in a [`Diagnostics`] rather than
//! aborting the walk, so a single compilation surfaces every statement-level
//! problem it can find (§7 policy) rather than stopping at the first one.
//!
//! Constant folding is invoked here only at the two sites the language
//! requires it at analysis time: `case` label values and static/global
//! initializers. Array bounds are already folded by the parser (see the
//! design note in `constfold`).

use crate::ast::*;
use crate::constfold::fold_int;
use crate::diagnostics::{Diagnostics, SourceLocation};
use crate::symtab::SymbolTable;
use crate::types::{
    self, can_assign, can_cast, is_compatible, usual_arithmetic_conversions, Basic, FloatKind,
    IntKind, TagRegistry, Type,
};

pub struct Analyzer {
    pub symtab: SymbolTable,
    pub tags: TagRegistry,
    pub diags: Diagnostics,
}

impl Analyzer {
    pub fn new(tags: TagRegistry) -> Self {
        Analyzer {
            symtab: SymbolTable::new(),
            tags,
            diags: Diagnostics::new(),
        }
    }

    pub fn analyze(&mut self, program: &mut Program) {
        for decl in &mut program.decls {
            match decl {
                Decl::Func(f) => self.declare_function(f),
                Decl::Var(v) => self.analyze_global_var(v),
            }
        }
        for decl in &mut program.decls {
            if let Decl::Func(f) = decl {
                if f.body.is_some() {
                    self.analyze_function_body(f);
                }
            }
        }
    }

    fn func_type(f: &FuncDecl) -> Type {
        Type::Function {
            ret: Box::new(f.ret.clone()),
            params: Some(types::FuncParams {
                types: f.params.iter().map(|p| p.ty.clone()).collect(),
                variadic: f.variadic,
            }),
        }
    }

    fn declare_function(&mut self, f: &FuncDecl) {
        let ty = Self::func_type(f);
        if let Err(e) = self.symtab.add_symbol(&f.name, ty, f.body.is_some()) {
            self.diags.error(f.loc, e.to_string());
        }
    }

    fn analyze_global_var(&mut self, v: &mut VarDecl) {
        if let Err(e) = self.symtab.add_symbol(&v.name, v.ty.clone(), v.init.is_some()) {
            self.diags.error(v.loc, e.to_string());
        }
        if let Some(init) = &mut v.init {
            self.analyze_static_initializer(init, &v.ty, v.loc);
        }
    }

    /// Global/`static` initializers must themselves be constant expressions
    /// (§4.E). Scalar initializers are folded with [`fold_int`]; aggregate
    /// initializers recurse member-wise.
    fn analyze_static_initializer(&mut self, init: &mut Initializer, ty: &Type, loc: SourceLocation) {
        match init {
            Initializer::Scalar(e) => {
                let declared = self.analyze_expr(e);
                if !can_assign(&declared, ty, &self.tags) {
                    self.diags.error(
                        e.loc,
                        format!("cannot initialize {} with a value of type {}", ty, declared),
                    );
                }
                if ty.is_integer() && fold_int(e).is_none() {
                    self.diags
                        .error(e.loc, "initializer is not a constant expression");
                }
            }
            Initializer::List(items) => {
                let elem_ty = match ty {
                    Type::Array(elem, _) => (**elem).clone(),
                    Type::Struct(id) | Type::Union(id) => {
                        // Best-effort: type each item against its matching
                        // member if one is registered, else leave unchecked.
                        let members = self.tags.get(*id).and_then(|d| d.members.clone());
                        for (i, item) in items.iter_mut().enumerate() {
                            let mty = members
                                .as_ref()
                                .and_then(|m| m.get(i))
                                .map(|m| m.ty.clone())
                                .unwrap_or(Type::int());
                            self.analyze_static_initializer(item, &mty, loc);
                        }
                        return;
                    }
                    _ => {
                        self.diags
                            .error(loc, format!("type {} cannot be brace-initialized", ty));
                        return;
                    }
                };
                for item in items {
                    self.analyze_static_initializer(item, &elem_ty, loc);
                }
            }
        }
    }

    fn analyze_function_body(&mut self, f: &mut FuncDecl) {
        self.symtab.enter_function(f.ret.clone());
        for p in &f.params {
            if let Some(name) = &p.name {
                if let Err(e) = self.symtab.add_symbol(name, p.ty.clone(), true) {
                    self.diags.error(f.loc, e.to_string());
                }
            }
        }
        // First pass over the body records every label so forward `goto`s
        // resolve without a second traversal.
        if let Some(body) = &f.body {
            collect_labels(body, &mut self.symtab);
        }
        if let Some(body) = &mut f.body {
            for item in body {
                self.analyze_block_item(item);
            }
        }
        if let Err(e) = self.symtab.exit_function() {
            self.diags.error(f.loc, e.to_string());
        }
    }

    fn analyze_block_item(&mut self, item: &mut BlockItem) {
        match item {
            BlockItem::Decl(Decl::Var(v)) => {
                let linkage = match v.linkage {
                    Linkage::Static => true,
                    _ => false,
                };
                if let Err(e) = self.symtab.add_symbol(&v.name, v.ty.clone(), true) {
                    self.diags.error(v.loc, e.to_string());
                }
                if let Some(init) = &mut v.init {
                    if linkage {
                        self.analyze_static_initializer(init, &v.ty, v.loc);
                    } else {
                        self.analyze_initializer(init, &v.ty, v.loc);
                    }
                }
            }
            BlockItem::Decl(Decl::Func(f)) => self.declare_function(f),
            BlockItem::Stmt(s) => self.analyze_stmt(s),
        }
    }

    fn analyze_initializer(&mut self, init: &mut Initializer, ty: &Type, loc: SourceLocation) {
        match init {
            Initializer::Scalar(e) => {
                let t = self.analyze_expr(e);
                if !can_assign(&t, ty, &self.tags) {
                    self.diags.error(
                        e.loc,
                        format!("cannot initialize {} with a value of type {}", ty, t),
                    );
                }
            }
            Initializer::List(items) => {
                let elem_ty = match ty {
                    Type::Array(elem, _) => (**elem).clone(),
                    _ => {
                        self.diags
                            .error(loc, format!("type {} cannot be brace-initialized", ty));
                        return;
                    }
                };
                for item in items {
                    self.analyze_initializer(item, &elem_ty, loc);
                }
            }
        }
    }

    fn analyze_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Block(items) => {
                self.symtab.enter_scope();
                for item in items {
                    self.analyze_block_item(item);
                }
                self.symtab.exit_scope();
            }
            Stmt::Expr(e) => {
                if let Some(e) = e {
                    self.analyze_expr(e);
                }
            }
            Stmt::If { cond, then, else_ } => {
                self.require_scalar_condition(cond);
                self.analyze_stmt(then);
                if let Some(e) = else_ {
                    self.analyze_stmt(e);
                }
            }
            Stmt::While { cond, body } => {
                self.require_scalar_condition(cond);
                // Placeholder scope labels: only the stack discipline matters
                // here, codegen mints the real block names via `ValueRegistry`.
                self.symtab.enter_loop("while.break".into(), "while.cont".into());
                self.analyze_stmt(body);
                self.symtab.exit_loop();
            }
            Stmt::DoWhile { body, cond } => {
                self.symtab.enter_loop("do.break".into(), "do.cont".into());
                self.analyze_stmt(body);
                self.symtab.exit_loop();
                self.require_scalar_condition(cond);
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
            } => {
                self.symtab.enter_scope();
                match init {
                    ForInit::Decl(v) => {
                        if let Err(e) = self.symtab.add_symbol(&v.name, v.ty.clone(), true) {
                            self.diags.error(v.loc, e.to_string());
                        }
                        if let Some(i) = &mut v.init {
                            self.analyze_initializer(i, &v.ty, v.loc);
                        }
                    }
                    ForInit::Expr(e) => {
                        self.analyze_expr(e);
                    }
                    ForInit::Empty => {}
                }
                if let Some(c) = cond {
                    self.require_scalar_condition(c);
                }
                if let Some(p) = post {
                    self.analyze_expr(p);
                }
                self.symtab.enter_loop("for.break".into(), "for.cont".into());
                self.analyze_stmt(body);
                self.symtab.exit_loop();
                self.symtab.exit_scope();
            }
            Stmt::Switch { cond, body } => {
                let t = self.analyze_expr(cond);
                if !t.is_integer() {
                    self.diags
                        .error(cond.loc, "switch condition must have integer type");
                }
                self.symtab.push_switch();
                self.symtab.push_break_only("switch.break".into());
                self.analyze_stmt(body);
                self.symtab.pop_break_only();
                self.symtab.pop_switch();
            }
            Stmt::Case { value, stmt } => {
                let t = self.analyze_expr(value);
                if !t.is_integer() {
                    self.diags.error(value.loc, "case label must have integer type");
                }
                match fold_int(value) {
                    Some(v) => {
                        if let Err(e) = self.symtab.add_case(v) {
                            self.diags.error(value.loc, e.to_string());
                        }
                    }
                    None => self
                        .diags
                        .error(value.loc, "case label is not a constant expression"),
                }
                if !self.symtab.in_switch() {
                    self.diags
                        .error(value.loc, "'case' statement not in a switch");
                }
                self.analyze_stmt(stmt);
            }
            Stmt::Default(stmt) => {
                if let Err(e) = self.symtab.add_default() {
                    self.diags.error(SourceLocation::default(), e.to_string());
                }
                if !self.symtab.in_switch() {
                    self.diags
                        .error(SourceLocation::default(), "'default' statement not in a switch");
                }
                self.analyze_stmt(stmt);
            }
            Stmt::Break(loc) => {
                if self.symtab.break_target().is_none() {
                    self.diags.error(*loc, "'break' statement not in a loop or switch");
                }
            }
            Stmt::Continue(loc) => {
                if self.symtab.continue_target().is_none() {
                    self.diags.error(*loc, "'continue' statement not in a loop");
                }
            }
            Stmt::Return(expr, loc) => {
                let ret = self.symtab.return_type().cloned().unwrap_or(Type::Void);
                match expr {
                    Some(e) => {
                        let t = self.analyze_expr(e);
                        if ret.is_void() {
                            self.diags.error(*loc, "returning a value from a void function");
                        } else if !can_assign(&t, &ret, &self.tags) {
                            self.diags
                                .error(e.loc, format!("returning {} from a function returning {}", t, ret));
                        }
                    }
                    None => {
                        if !ret.is_void() {
                            self.diags.error(*loc, "non-void function must return a value");
                        }
                    }
                }
            }
            Stmt::Goto(name, loc) => {
                self.symtab.require_label(name);
                let _ = loc;
            }
            Stmt::Label(name, stmt) => {
                self.symtab.add_label(name);
                self.analyze_stmt(stmt);
            }
        }
    }

    fn require_scalar_condition(&mut self, e: &mut Expr) {
        let t = self.analyze_expr(e);
        if !t.is_scalar() {
            self.diags
                .error(e.loc, format!("used type {} where a scalar is required", t));
        }
    }

    fn is_lvalue(e: &Expr) -> bool {
        matches!(
            e.kind,
            ExprKind::Variable(_) | ExprKind::Deref(_) | ExprKind::Index { .. } | ExprKind::Member { .. }
        )
    }

    /// Analyzes `e` bottom-up, filling its [`ExprAnnotation`], and returns its
    /// result type. Array-typed results decay to pointers in rvalue position
    /// per invariant (d); callers that need the undecayed type (e.g. `&arr`)
    /// re-derive it from the symbol table.
    fn analyze_expr(&mut self, e: &mut Expr) -> Type {
        let loc = e.loc;
        let ty = match &mut e.kind {
            ExprKind::IntLiteral(_) => Type::int(),
            ExprKind::FloatLiteral(_) => Type::Basic(Basic::Float(FloatKind::Double)),
            ExprKind::CharLiteral(_) => Type::Basic(Basic::Int(IntKind::Char)),
            ExprKind::StringLiteral(_) => {
                Type::Pointer(Box::new(Type::Basic(Basic::Int(IntKind::Char))))
            }
            ExprKind::Variable(name) => match self.symtab.symbol_type(name) {
                Some(t) => t.clone().decay(),
                None => {
                    self.diags
                        .error(loc, format!("use of undeclared identifier '{}'", name));
                    Type::int()
                }
            },
            ExprKind::Unary(op, inner) => {
                let t = self.analyze_expr(inner);
                match op {
                    UnaryOp::Plus | UnaryOp::Neg => {
                        if !t.is_arith() {
                            self.diags
                                .error(loc, format!("invalid operand type {} to unary operator", t));
                            Type::int()
                        } else if let Type::Basic(b) = t {
                            Type::Basic(types::integer_promotions(b))
                        } else {
                            t
                        }
                    }
                    UnaryOp::BitNot => {
                        if !t.is_integer() {
                            self.diags
                                .error(loc, "operand of '~' must have integer type".to_string());
                            Type::int()
                        } else if let Type::Basic(b) = t {
                            Type::Basic(types::integer_promotions(b))
                        } else {
                            t
                        }
                    }
                    UnaryOp::Not => {
                        if !t.is_scalar() {
                            self.diags.error(loc, "operand of '!' must be scalar".to_string());
                        }
                        Type::int()
                    }
                }
            }
            ExprKind::AddrOf(inner) => {
                let t = self.analyze_expr(inner);
                if !Self::is_lvalue(inner) {
                    self.diags
                        .error(loc, "cannot take the address of a non-lvalue");
                }
                Type::Pointer(Box::new(t))
            }
            ExprKind::Deref(inner) => {
                let t = self.analyze_expr(inner);
                match t {
                    Type::Pointer(elem) => *elem,
                    _ => {
                        self.diags
                            .error(loc, format!("cannot dereference non-pointer type {}", t));
                        Type::int()
                    }
                }
            }
            ExprKind::PreIncDec(_, inner) | ExprKind::PostIncDec(_, inner) => {
                let t = self.analyze_expr(inner);
                if !Self::is_lvalue(inner) {
                    self.diags
                        .error(loc, "increment/decrement operand must be an lvalue");
                }
                if !t.is_scalar() {
                    self.diags
                        .error(loc, format!("cannot increment/decrement type {}", t));
                }
                t
            }
            ExprKind::Binary(op, lhs, rhs) => self.analyze_binary(*op, lhs, rhs, loc),
            ExprKind::Assign { op, lhs, rhs } => self.analyze_assign(*op, lhs, rhs, loc),
            ExprKind::Conditional { cond, then, else_ } => {
                self.require_scalar_condition(cond);
                let t_then = self.analyze_expr(then);
                let t_else = self.analyze_expr(else_);
                if t_then.is_arith() && t_else.is_arith() {
                    match usual_arithmetic_conversions(&t_then, &t_else) {
                        Ok(b) => Type::Basic(b),
                        Err(e) => {
                            self.diags.error(loc, e.to_string());
                            t_then
                        }
                    }
                } else if is_compatible(&t_then, &t_else, &self.tags) {
                    t_then
                } else {
                    self.diags.error(
                        loc,
                        format!("incompatible operand types {} and {} in conditional", t_then, t_else),
                    );
                    t_then
                }
            }
            ExprKind::Call { callee, args } => self.analyze_call(callee, args, loc),
            ExprKind::Cast { to, expr } => {
                let t = self.analyze_expr(expr);
                if !can_cast(&t, to, &self.tags) {
                    self.diags
                        .error(loc, format!("cannot cast from {} to {}", t, to));
                }
                to.clone()
            }
            ExprKind::SizeofExpr(inner) => {
                self.analyze_expr(inner);
                Type::Basic(Basic::Int(IntKind::ULong))
            }
            ExprKind::SizeofType(_) => Type::Basic(Basic::Int(IntKind::ULong)),
            ExprKind::Comma(lhs, rhs) => {
                self.analyze_expr(lhs);
                self.analyze_expr(rhs)
            }
            ExprKind::Index { base, index } => {
                let bt = self.analyze_expr(base);
                let it = self.analyze_expr(index);
                if !it.is_integer() {
                    self.diags.error(index.loc, "array subscript is not an integer");
                }
                match bt {
                    Type::Pointer(elem) => *elem,
                    _ => {
                        self.diags
                            .error(loc, format!("subscripted value of type {} is not an array", bt));
                        Type::int()
                    }
                }
            }
            ExprKind::Member { base, field, arrow } => {
                self.analyze_member(base, field.as_str(), *arrow, loc)
            }
        };
        e.annotation.result_type = Some(ty.clone());
        e.annotation.analyzed = true;
        ty
    }

    fn analyze_binary(&mut self, op: BinOp, lhs: &mut Expr, rhs: &mut Expr, loc: SourceLocation) -> Type {
        let tl = self.analyze_expr(lhs);
        let tr = self.analyze_expr(rhs);

        if op.is_logical() {
            if !tl.is_scalar() || !tr.is_scalar() {
                self.diags
                    .error(loc, format!("invalid operands of type {} and {} to logical operator", tl, tr));
            }
            return Type::int();
        }

        // Pointer arithmetic: `ptr +/- int` and `ptr - ptr`.
        if matches!(op, BinOp::Add | BinOp::Sub) && (tl.is_pointer() || tr.is_pointer()) {
            return self.analyze_pointer_arith(op, &tl, &tr, lhs, rhs, loc);
        }

        if !tl.is_arith() || !tr.is_arith() {
            self.diags
                .error(loc, format!("invalid operands of type {} and {} to binary operator", tl, tr));
            return Type::int();
        }
        let common = match usual_arithmetic_conversions(&tl, &tr) {
            Ok(b) => Type::Basic(b),
            Err(e) => {
                self.diags.error(loc, e.to_string());
                return Type::int();
            }
        };
        if op.is_shift() {
            // Shift amount keeps the lhs's (promoted) type; the rhs only
            // needs its own integer promotion, not the usual conversions.
            lhs.annotation.operand_types = vec![common.clone()];
            rhs.annotation.operand_types = vec![tr];
            return common;
        }
        lhs.annotation.operand_types = vec![common.clone()];
        rhs.annotation.operand_types = vec![common.clone()];
        if op.is_comparison() {
            Type::int()
        } else {
            common
        }
    }

    fn analyze_pointer_arith(
        &mut self,
        op: BinOp,
        tl: &Type,
        tr: &Type,
        lhs: &Expr,
        rhs: &Expr,
        loc: SourceLocation,
    ) -> Type {
        match (tl, tr) {
            (Type::Pointer(elem), other) if other.is_integer() => {
                Type::Pointer(elem.clone())
            }
            (other, Type::Pointer(elem)) if other.is_integer() && op == BinOp::Add => {
                Type::Pointer(elem.clone())
            }
            (Type::Pointer(a), Type::Pointer(b)) if op == BinOp::Sub => {
                if !is_compatible(a, b, &self.tags) {
                    self.diags.error(
                        loc,
                        "subtracting pointers to incompatible types".to_string(),
                    );
                }
                Type::Basic(Basic::Int(IntKind::Long))
            }
            _ => {
                self.diags.error(
                    loc,
                    format!("invalid operands of type {} and {} to binary operator", tl, tr),
                );
                let _ = (lhs, rhs);
                Type::int()
            }
        }
    }

    fn analyze_assign(
        &mut self,
        op: Option<BinOp>,
        lhs: &mut Expr,
        rhs: &mut Expr,
        loc: SourceLocation,
    ) -> Type {
        let tl = self.analyze_expr(lhs);
        if !Self::is_lvalue(lhs) {
            self.diags.error(loc, "assignment requires an lvalue on the left");
        }
        let tr = self.analyze_expr(rhs);
        match op {
            None => {
                if !can_assign(&tr, &tl, &self.tags) {
                    self.diags
                        .error(loc, format!("cannot assign {} to {}", tr, tl));
                }
            }
            Some(binop) => {
                if binop.is_logical() || !tl.is_arith() && !tl.is_pointer() {
                    self.diags
                        .error(loc, format!("invalid compound assignment to type {}", tl));
                }
            }
        }
        tl
    }

    fn analyze_call(&mut self, callee: &mut Expr, args: &mut [Expr], loc: SourceLocation) -> Type {
        let name = match &callee.kind {
            ExprKind::Variable(n) => Some(n.clone()),
            _ => None,
        };
        let info = name.as_deref().and_then(|n| self.symtab.symbol_info(n).cloned());
        callee.annotation.analyzed = true;

        let Some(info) = info else {
            if let Some(n) = &name {
                self.diags
                    .error(loc, format!("call to undeclared function '{}'", n));
            } else {
                self.diags.error(loc, "called object is not a function");
            }
            for a in args {
                self.analyze_expr(a);
            }
            callee.annotation.result_type = Some(Type::int());
            return Type::int();
        };
        let Type::Function { ret, params } = &info.ty else {
            self.diags.error(loc, "called object is not a function");
            for a in args {
                self.analyze_expr(a);
            }
            callee.annotation.result_type = Some(Type::int());
            return Type::int();
        };
        callee.annotation.result_type = Some(info.ty.clone());
        let ret = (**ret).clone();
        if let Some(params) = params {
            if !params.variadic && args.len() != params.types.len() {
                self.diags.error(
                    loc,
                    format!(
                        "function call with {} arguments, expected {}",
                        args.len(),
                        params.types.len()
                    ),
                );
            }
            for (i, a) in args.iter_mut().enumerate() {
                let at = self.analyze_expr(a);
                if let Some(pt) = params.types.get(i) {
                    if !can_assign(&at, pt, &self.tags) {
                        self.diags
                            .error(a.loc, format!("passing {} to parameter of type {}", at, pt));
                    }
                }
            }
        } else {
            for a in args.iter_mut() {
                self.analyze_expr(a);
            }
        }
        ret
    }

    fn analyze_member(&mut self, base: &mut Expr, field: &str, arrow: bool, loc: SourceLocation) -> Type {
        let bt = self.analyze_expr(base);
        let agg_ty = if arrow {
            match &bt {
                Type::Pointer(inner) => (**inner).clone(),
                _ => {
                    self.diags
                        .error(loc, "member reference through non-pointer with '->'".to_string());
                    return Type::int();
                }
            }
        } else {
            bt
        };
        let id = match &agg_ty {
            Type::Struct(id) | Type::Union(id) => *id,
            _ => {
                self.diags
                    .error(loc, format!("type {} has no members", agg_ty));
                return Type::int();
            }
        };
        match self.tags.get(id).and_then(|d| d.members.clone()) {
            Some(members) => match members.iter().find(|m| m.name == field) {
                Some(m) => m.ty.clone(),
                None => {
                    self.diags.error(loc, format!("no member named '{}'", field));
                    Type::int()
                }
            },
            None => {
                self.diags
                    .error(loc, "member access on incomplete type".to_string());
                Type::int()
            }
        }
    }
}

/// Pre-scans a function body for `Stmt::Label` so forward `goto`s resolve
/// without requiring a second statement-level pass in `analyze_stmt`.
fn collect_labels(block: &Block, symtab: &mut SymbolTable) {
    for item in block {
        if let BlockItem::Stmt(s) = item {
            collect_labels_stmt(s, symtab);
        }
    }
}

fn collect_labels_stmt(stmt: &Stmt, symtab: &mut SymbolTable) {
    match stmt {
        Stmt::Label(name, inner) => {
            symtab.add_label(name);
            collect_labels_stmt(inner, symtab);
        }
        Stmt::Block(b) => collect_labels(b, symtab),
        Stmt::If { then, else_, .. } => {
            collect_labels_stmt(then, symtab);
            if let Some(e) = else_ {
                collect_labels_stmt(e, symtab);
            }
        }
        Stmt::While { body, .. } | Stmt::DoWhile { body, .. } | Stmt::For { body, .. } => {
            collect_labels_stmt(body, symtab)
        }
        Stmt::Switch { body, .. } => collect_labels_stmt(body, symtab),
        Stmt::Case { stmt, .. } | Stmt::Default(stmt) => collect_labels_stmt(stmt, symtab),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::parse;

    fn analyze_src(src: &str) -> Analyzer {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let (mut program, tags) = parse(&tokens).unwrap();
        let mut analyzer = Analyzer::new(tags);
        analyzer.analyze(&mut program);
        analyzer
    }

    #[test]
    fn accepts_well_typed_program() {
        let a = analyze_src("int main(){return 2;}");
        assert!(!a.diags.has_errors());
    }

    #[test]
    fn rejects_undeclared_identifier() {
        let a = analyze_src("int main(){return x;}");
        assert!(a.diags.has_errors());
    }

    #[test]
    fn rejects_duplicate_case_labels() {
        let a = analyze_src("int main(){switch(1){case 1: break; case 1: break;}return 0;}");
        assert!(a.diags.has_errors());
    }

    #[test]
    fn rejects_goto_to_missing_label() {
        let a = analyze_src("int main(){goto done; return 0;}");
        assert!(a.diags.has_errors());
    }

    #[test]
    fn accepts_goto_to_forward_label() {
        let a = analyze_src("int main(){goto done; done: return 0;}");
        assert!(!a.diags.has_errors());
    }

    #[test]
    fn break_outside_loop_is_an_error() {
        let a = analyze_src("int main(){break; return 0;}");
        assert!(a.diags.has_errors());
    }

    #[test]
    fn checks_call_argument_count() {
        let a = analyze_src("int f(int a); int main(){return f(1,2);}");
        assert!(a.diags.has_errors());
    }
}
