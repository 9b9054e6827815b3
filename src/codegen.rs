//! Code generator and basic-block emitter (§4.F, §4.G)
//!
//! Walks the fully-annotated AST produced by [`crate::sema`] and writes
//! textual LLVM IR. Grounded on the teacher's `codegen/` module: a
//! `CodeGen` struct accumulating output via `std::fmt::Write`, a small
//! hand-rolled [`CodeGenError`] (`Logic`/`Format`, matching
//! `codegen::error::CodeGenError`) rather than `thiserror`, and the same
//! "write the whole module into one `String`, assemble sections in a fixed
//! order" shape as `codegen::program::codegen_program_with_config`.
//!
//! The block emitter itself — instructions only reach `out` while the
//! current block has no terminator yet — generalizes the teacher's
//! `codegen_if_statement` branch/phi bookkeeping into the explicit
//! open/closed state machine §4.F describes.

use crate::ast::*;
use crate::config::CompilerConfig;
use crate::types::{self, ir_type, size, Basic, FloatKind, IntKind, TagRegistry, Type};
use crate::value::{Value, ValueRegistry};
use std::collections::HashMap;
use std::fmt::Write as _;

#[derive(Debug)]
pub enum CodeGenError {
    Logic(String),
    Format(std::fmt::Error),
}

impl std::fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeGenError::Logic(s) => write!(f, "{}", s),
            CodeGenError::Format(e) => write!(f, "IR generation error: {}", e),
        }
    }
}
impl std::error::Error for CodeGenError {}

impl From<String> for CodeGenError {
    fn from(s: String) -> Self {
        CodeGenError::Logic(s)
    }
}
impl From<std::fmt::Error> for CodeGenError {
    fn from(e: std::fmt::Error) -> Self {
        CodeGenError::Format(e)
    }
}

type CgResult<T> = Result<T, CodeGenError>;

/// A named local: its stack-slot address and declared type.
#[derive(Clone)]
struct Local {
    addr: Value,
    ty: Type,
}

pub struct CodeGen<'a> {
    tags: &'a TagRegistry,
    config: &'a CompilerConfig,
    values: ValueRegistry,
    out: String,
    locals: Vec<HashMap<String, Local>>,
    globals: HashMap<String, Type>,
    /// User label name -> generated IR block label, filled by a pre-scan of
    /// the function body so forward `goto`s can reference a name that is
    /// emitted later.
    labels: HashMap<String, String>,
    break_stack: Vec<String>,
    continue_stack: Vec<String>,
    /// Per-enclosing-`switch` map from a case's folded constant to the block
    /// label `collect_cases` minted for it, plus the `default:` label if any.
    case_label_stack: Vec<(HashMap<i128, String>, Option<String>)>,
    /// Whether the block currently being written still needs a terminator;
    /// `emit` drops instructions once it is `false` (dead code after a
    /// terminator, §4.F).
    block_open: bool,
    /// Module-level string literal constant pool, indexed by position —
    /// `@.str.N`'s raw (unescaped) text, collected as string-literal
    /// expressions are generated and emitted as global constants once the
    /// module body is complete.
    strings: Vec<String>,
}

pub fn codegen_program(program: &Program, tags: &TagRegistry, config: &CompilerConfig) -> CgResult<String> {
    let mut cg = CodeGen {
        tags,
        config,
        values: ValueRegistry::new(),
        out: String::new(),
        locals: Vec::new(),
        globals: HashMap::new(),
        labels: HashMap::new(),
        break_stack: Vec::new(),
        continue_stack: Vec::new(),
        case_label_stack: Vec::new(),
        block_open: false,
        strings: Vec::new(),
    };
    cg.run(program)
}

impl<'a> CodeGen<'a> {
    fn run(&mut self, program: &Program) -> CgResult<String> {
        let mut header = String::new();
        writeln!(header, "; ModuleID = 'cfront'")?;
        if let Some(triple) = &self.config.target_triple {
            writeln!(header, "target triple = \"{}\"", triple)?;
        }
        writeln!(header)?;

        let mut body = String::new();
        std::mem::swap(&mut self.out, &mut body);

        for decl in &program.decls {
            if let Decl::Var(v) = decl {
                self.globals.insert(v.name.clone(), v.ty.clone());
            }
        }
        for decl in &program.decls {
            match decl {
                Decl::Var(v) => self.codegen_global_var(v)?,
                Decl::Func(f) if f.body.is_some() => self.codegen_function(f)?,
                Decl::Func(_) => {}
            }
        }
        for decl in &program.decls {
            if let Decl::Func(f) = decl {
                if f.body.is_none() {
                    self.codegen_func_declare(f)?;
                }
            }
        }
        for name in self.values.undefined_globals().map(str::to_string).collect::<Vec<_>>() {
            let ty = self.globals.get(&name).cloned().unwrap_or(Type::int());
            writeln!(self.out, "@{} = external global {}", name, ir_type(&ty, self.tags))?;
        }

        for (i, s) in self.strings.iter().enumerate() {
            let (text, len) = string_constant_text(s);
            writeln!(
                header,
                "@.str.{} = private unnamed_addr constant [{} x i8] c\"{}\"",
                i, len, text
            )?;
        }
        if !self.strings.is_empty() {
            writeln!(header)?;
        }

        std::mem::swap(&mut self.out, &mut body);
        header.push_str(&body);
        Ok(header)
    }

    // ---- declarations ----------------------------------------------------

    fn codegen_global_var(&mut self, v: &VarDecl) -> CgResult<()> {
        let ty = ir_type(&v.ty, self.tags);
        let is_extern = matches!(v.linkage, Linkage::External) && v.init.is_none();
        if is_extern {
            self.values.add_global(&v.name, v.ty.clone(), false);
            return Ok(());
        }
        let init_text = match &v.init {
            Some(Initializer::Scalar(e)) => self.const_initializer_text(e, &v.ty),
            _ => zero_initializer(&v.ty, self.tags),
        };
        self.values.add_global(&v.name, v.ty.clone(), true);
        let linkage_kw = if matches!(v.linkage, Linkage::Static) {
            "internal "
        } else {
            ""
        };
        writeln!(self.out, "@{} = {}global {} {}", v.name, linkage_kw, ty, init_text)?;
        Ok(())
    }

    fn const_initializer_text(&self, e: &Expr, ty: &Type) -> String {
        if ty.is_float() {
            if let ExprKind::FloatLiteral(v) = &e.kind {
                return format_float(*v);
            }
            if let Some(v) = crate::constfold::fold_int(e) {
                return format_float(v as f64);
            }
        } else if let Some(v) = crate::constfold::fold_int(e) {
            return v.to_string();
        }
        zero_initializer(ty, self.tags)
    }

    fn codegen_func_declare(&mut self, f: &FuncDecl) -> CgResult<()> {
        let params = f
            .params
            .iter()
            .map(|p| ir_type(&p.ty, self.tags))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            self.out,
            "declare {} @{}({})",
            ir_type(&f.ret, self.tags),
            f.name,
            params
        )?;
        Ok(())
    }

    fn codegen_function(&mut self, f: &FuncDecl) -> CgResult<()> {
        self.values.reset_function();
        self.locals.clear();
        self.locals.push(HashMap::new());
        self.labels.clear();
        collect_labels(f.body.as_ref().unwrap(), &mut self.labels, &mut self.values);

        let params = f
            .params
            .iter()
            .map(|p| {
                let name = p.name.clone().unwrap_or_default();
                format!("{} %{}", ir_type(&p.ty, self.tags), name)
            })
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            self.out,
            "define {} @{}({}) {{",
            ir_type(&f.ret, self.tags),
            f.name,
            params
        )?;
        self.open_block("entry");

        for p in &f.params {
            let Some(name) = &p.name else { continue };
            let addr = self.values.add_local(name, p.ty.clone());
            self.emit(&format!("{} = alloca {}", addr.name, ir_type(&p.ty, self.tags)));
            self.emit(&format!(
                "store {} %{}, {} {}",
                ir_type(&p.ty, self.tags),
                name,
                self.ptr_ir(&p.ty),
                addr.name
            ));
            self.locals.last_mut().unwrap().insert(
                name.clone(),
                Local {
                    addr,
                    ty: p.ty.clone(),
                },
            );
        }

        for item in f.body.as_ref().unwrap() {
            self.codegen_block_item(item)?;
        }

        if self.block_open {
            self.emit_terminator(&ret_zero(&f.ret, self.tags));
        }
        writeln!(self.out, "}}")?;
        writeln!(self.out)?;
        self.locals.pop();
        Ok(())
    }

    // ---- basic-block emitter ----------------------------------------------

    fn open_block(&mut self, label: &str) {
        if self.block_open {
            self.emit_terminator(&format!("br label %{}", label));
        }
        let _ = writeln!(self.out, "{}:", label);
        self.block_open = true;
    }

    fn emit(&mut self, instr: &str) {
        if self.block_open {
            let _ = writeln!(self.out, "  {}", instr);
        }
    }

    fn emit_terminator(&mut self, instr: &str) {
        if self.block_open {
            let _ = writeln!(self.out, "  {}", instr);
            self.block_open = false;
        }
    }

    fn fresh_label(&mut self, prefix: &str) -> String {
        format!("{}.{}", prefix, self.values.new_local_name())
    }

    /// Textual type of a pointer to `pointee`, per `ir_type`'s pointee-specific
    /// pointer format (`i32*`, `%struct.0*`, …) — every `alloca`/`load`/
    /// `store`/`getelementptr` address operand needs this, not a bare `ptr`.
    fn ptr_ir(&self, pointee: &Type) -> String {
        format!("{}*", ir_type(pointee, self.tags))
    }

    /// Interns a string literal into the module-level constant pool,
    /// returning an `i8*` pointer to its first byte — a constant
    /// `getelementptr` expression, so no instruction needs to be emitted.
    fn intern_string(&mut self, s: &str) -> Value {
        let index = self.strings.len();
        self.strings.push(s.to_string());
        let len = s.as_bytes().len() + 1;
        let array_ty = format!("[{} x i8]", len);
        let expr = format!(
            "getelementptr inbounds ({}, {}* @.str.{}, i64 0, i64 0)",
            array_ty, array_ty, index
        );
        self.values.add_literal(
            expr,
            Type::Pointer(Box::new(Type::Basic(Basic::Int(IntKind::Char)))),
        )
    }

    // ---- statements --------------------------------------------------------

    fn codegen_block_item(&mut self, item: &BlockItem) -> CgResult<()> {
        match item {
            BlockItem::Decl(Decl::Var(v)) => self.codegen_local_var(v),
            BlockItem::Decl(Decl::Func(f)) => self.codegen_func_declare(f),
            BlockItem::Stmt(s) => self.codegen_stmt(s),
        }
    }

    fn codegen_local_var(&mut self, v: &VarDecl) -> CgResult<()> {
        let addr = self.values.add_local(&v.name, v.ty.clone());
        self.emit(&format!("{} = alloca {}", addr.name, ir_type(&v.ty, self.tags)));
        self.locals.last_mut().unwrap().insert(
            v.name.clone(),
            Local {
                addr: addr.clone(),
                ty: v.ty.clone(),
            },
        );
        if let Some(Initializer::Scalar(e)) = &v.init {
            let val = self.gen_expr(e)?;
            let val = self.convert(val, e.annotation.result(), &v.ty)?;
            self.emit(&format!(
                "store {} {}, {} {}",
                ir_type(&v.ty, self.tags),
                val.operand(),
                self.ptr_ir(&v.ty),
                addr.name
            ));
        }
        Ok(())
    }

    fn codegen_stmt(&mut self, stmt: &Stmt) -> CgResult<()> {
        match stmt {
            Stmt::Block(items) => {
                self.locals.push(HashMap::new());
                for item in items {
                    self.codegen_block_item(item)?;
                }
                self.locals.pop();
                Ok(())
            }
            Stmt::Expr(e) => {
                if let Some(e) = e {
                    self.gen_expr(e)?;
                }
                Ok(())
            }
            Stmt::If { cond, then, else_ } => self.codegen_if(cond, then, else_.as_deref()),
            Stmt::While { cond, body } => self.codegen_while(cond, body),
            Stmt::DoWhile { body, cond } => self.codegen_do_while(body, cond),
            Stmt::For {
                init,
                cond,
                post,
                body,
            } => self.codegen_for(init, cond, post, body),
            Stmt::Switch { cond, body } => self.codegen_switch(cond, body),
            Stmt::Case { value, stmt } => {
                let folded = crate::constfold::fold_int(value)
                    .ok_or_else(|| CodeGenError::Logic("case label is not a constant expression".into()))?;
                let label = self
                    .case_label_stack
                    .last()
                    .and_then(|(cases, _)| cases.get(&folded))
                    .cloned()
                    .ok_or_else(|| CodeGenError::Logic("'case' outside a switch".into()))?;
                self.open_block(&label);
                self.codegen_stmt(stmt)
            }
            Stmt::Default(stmt) => {
                let label = self
                    .case_label_stack
                    .last()
                    .and_then(|(_, default)| default.clone())
                    .ok_or_else(|| CodeGenError::Logic("'default' outside a switch".into()))?;
                self.open_block(&label);
                self.codegen_stmt(stmt)
            }
            Stmt::Break(_) => {
                let label = self
                    .break_stack
                    .last()
                    .cloned()
                    .ok_or_else(|| CodeGenError::Logic("'break' outside a loop or switch".into()))?;
                self.emit_terminator(&format!("br label %{}", label));
                Ok(())
            }
            Stmt::Continue(_) => {
                let label = self
                    .continue_stack
                    .last()
                    .cloned()
                    .ok_or_else(|| CodeGenError::Logic("'continue' outside a loop".into()))?;
                self.emit_terminator(&format!("br label %{}", label));
                Ok(())
            }
            Stmt::Return(expr, _) => {
                match expr {
                    Some(e) => {
                        let val = self.gen_expr(e)?;
                        let ty = e.annotation.result();
                        self.emit_terminator(&format!(
                            "ret {} {}",
                            ir_type(ty, self.tags),
                            val.operand()
                        ));
                    }
                    None => self.emit_terminator("ret void"),
                }
                Ok(())
            }
            Stmt::Goto(name, _) => {
                let label = self
                    .labels
                    .get(name)
                    .cloned()
                    .ok_or_else(|| CodeGenError::Logic(format!("undefined label '{}'", name)))?;
                self.emit_terminator(&format!("br label %{}", label));
                Ok(())
            }
            Stmt::Label(name, stmt) => {
                let label = self.labels[name].clone();
                self.open_block(&label);
                self.codegen_stmt(stmt)
            }
        }
    }

    fn codegen_if(&mut self, cond: &Expr, then: &Stmt, else_: Option<&Stmt>) -> CgResult<()> {
        let then_label = self.fresh_label("if.then");
        let else_label = self.fresh_label("if.else");
        let end_label = self.fresh_label("if.end");
        let has_else = else_.is_some();

        self.gen_condition_branch(cond, &then_label, if has_else { &else_label } else { &end_label })?;

        self.open_block(&then_label);
        self.codegen_stmt(then)?;
        if self.block_open {
            self.emit_terminator(&format!("br label %{}", end_label));
        }

        if let Some(else_stmt) = else_ {
            self.open_block(&else_label);
            self.codegen_stmt(else_stmt)?;
            if self.block_open {
                self.emit_terminator(&format!("br label %{}", end_label));
            }
        }

        self.open_block(&end_label);
        Ok(())
    }

    fn codegen_while(&mut self, cond: &Expr, body: &Stmt) -> CgResult<()> {
        let cond_label = self.fresh_label("while.cond");
        let body_label = self.fresh_label("while.body");
        let end_label = self.fresh_label("while.end");

        self.emit_terminator(&format!("br label %{}", cond_label));
        self.open_block(&cond_label);
        self.gen_condition_branch(cond, &body_label, &end_label)?;

        self.open_block(&body_label);
        self.break_stack.push(end_label.clone());
        self.continue_stack.push(cond_label.clone());
        self.codegen_stmt(body)?;
        self.break_stack.pop();
        self.continue_stack.pop();
        if self.block_open {
            self.emit_terminator(&format!("br label %{}", cond_label));
        }

        self.open_block(&end_label);
        Ok(())
    }

    fn codegen_do_while(&mut self, body: &Stmt, cond: &Expr) -> CgResult<()> {
        let body_label = self.fresh_label("do.body");
        let cond_label = self.fresh_label("do.cond");
        let end_label = self.fresh_label("do.end");

        self.emit_terminator(&format!("br label %{}", body_label));
        self.open_block(&body_label);
        self.break_stack.push(end_label.clone());
        self.continue_stack.push(cond_label.clone());
        self.codegen_stmt(body)?;
        self.break_stack.pop();
        self.continue_stack.pop();
        if self.block_open {
            self.emit_terminator(&format!("br label %{}", cond_label));
        }

        self.open_block(&cond_label);
        self.gen_condition_branch(cond, &body_label, &end_label)?;

        self.open_block(&end_label);
        Ok(())
    }

    fn codegen_for(
        &mut self,
        init: &ForInit,
        cond: &Option<Expr>,
        post: &Option<Expr>,
        body: &Stmt,
    ) -> CgResult<()> {
        self.locals.push(HashMap::new());
        match init {
            ForInit::Decl(v) => self.codegen_local_var(v)?,
            ForInit::Expr(e) => {
                self.gen_expr(e)?;
            }
            ForInit::Empty => {}
        }

        let cond_label = self.fresh_label("for.cond");
        let body_label = self.fresh_label("for.body");
        let post_label = self.fresh_label("for.post");
        let end_label = self.fresh_label("for.end");

        self.emit_terminator(&format!("br label %{}", cond_label));
        self.open_block(&cond_label);
        match cond {
            Some(c) => self.gen_condition_branch(c, &body_label, &end_label)?,
            None => self.emit_terminator(&format!("br label %{}", body_label)),
        }

        self.open_block(&body_label);
        self.break_stack.push(end_label.clone());
        self.continue_stack.push(post_label.clone());
        self.codegen_stmt(body)?;
        self.break_stack.pop();
        self.continue_stack.pop();
        if self.block_open {
            self.emit_terminator(&format!("br label %{}", post_label));
        }

        self.open_block(&post_label);
        if let Some(p) = post {
            self.gen_expr(p)?;
        }
        if self.block_open {
            self.emit_terminator(&format!("br label %{}", cond_label));
        }

        self.open_block(&end_label);
        self.locals.pop();
        Ok(())
    }

    /// `switch` lowers to a chain of equality branches rather than LLVM's
    /// native `switch` instruction, keeping the instruction set this
    /// compiler emits uniform (only `br`/`icmp`, no jump-table opcode).
    fn codegen_switch(&mut self, cond: &Expr, body: &Stmt) -> CgResult<()> {
        let val = self.gen_expr(cond)?;
        let ty = ir_type(cond.annotation.result(), self.tags);

        let mut case_labels = Vec::new();
        let mut default_label = None;
        collect_cases(body, self, &mut case_labels, &mut default_label)?;
        let case_map: HashMap<i128, String> = case_labels.iter().cloned().collect();

        let end_label = self.fresh_label("switch.end");
        let fallthrough = default_label.clone().unwrap_or_else(|| end_label.clone());

        let mut next_check = self.fresh_label("switch.check");
        self.emit_terminator(&format!("br label %{}", next_check));
        for (value, label) in &case_labels {
            self.open_block(&next_check);
            let cmp = self.values.new_temp(Type::Basic(Basic::Int(IntKind::Bool)));
            self.emit(&format!(
                "{} = icmp eq {} {}, {}",
                cmp.name,
                ty,
                val.operand(),
                value
            ));
            next_check = self.fresh_label("switch.check");
            self.emit_terminator(&format!(
                "br i1 {}, label %{}, label %{}",
                cmp.name, label, next_check
            ));
        }
        self.open_block(&next_check);
        self.emit_terminator(&format!("br label %{}", fallthrough));

        self.break_stack.push(end_label.clone());
        self.case_label_stack.push((case_map, default_label));
        self.codegen_stmt(body)?;
        self.case_label_stack.pop();
        self.break_stack.pop();
        if self.block_open {
            self.emit_terminator(&format!("br label %{}", end_label));
        }
        self.open_block(&end_label);
        Ok(())
    }

    /// Evaluates a condition and branches, implementing `&&`/`||` with their
    /// required short-circuit control flow rather than as eager boolean
    /// arithmetic (grounded on the teacher's `codegen_if_statement` three-block
    /// shape, generalized to cover arbitrary conditions).
    fn gen_condition_branch(&mut self, cond: &Expr, if_true: &str, if_false: &str) -> CgResult<()> {
        if let ExprKind::Binary(BinOp::LogAnd, l, r) = &cond.kind {
            let mid = self.fresh_label("and.rhs");
            self.gen_condition_branch(l, &mid, if_false)?;
            self.open_block(&mid);
            return self.gen_condition_branch(r, if_true, if_false);
        }
        if let ExprKind::Binary(BinOp::LogOr, l, r) = &cond.kind {
            let mid = self.fresh_label("or.rhs");
            self.gen_condition_branch(l, if_true, &mid)?;
            self.open_block(&mid);
            return self.gen_condition_branch(r, if_true, if_false);
        }
        if let ExprKind::Unary(UnaryOp::Not, inner) = &cond.kind {
            return self.gen_condition_branch(inner, if_false, if_true);
        }
        let val = self.gen_expr(cond)?;
        let test = self.to_bool(val, cond.annotation.result())?;
        self.emit_terminator(&format!(
            "br i1 {}, label %{}, label %{}",
            test.operand(),
            if_true,
            if_false
        ));
        Ok(())
    }

    fn to_bool(&mut self, v: Value, ty: &Type) -> CgResult<Value> {
        let zero = zero_initializer(ty, self.tags);
        let out = self.values.new_temp(Type::Basic(Basic::Int(IntKind::Bool)));
        let cmp = if ty.is_float() { "fcmp one" } else { "icmp ne" };
        self.emit(&format!(
            "{} = {} {} {}, {}",
            out.name,
            cmp,
            ir_type(ty, self.tags),
            v.operand(),
            zero
        ));
        Ok(out)
    }

    // ---- expressions --------------------------------------------------------

    fn lookup_local(&self, name: &str) -> Option<Local> {
        self.locals.iter().rev().find_map(|scope| scope.get(name).cloned())
    }

    fn gen_lvalue(&mut self, e: &Expr) -> CgResult<Value> {
        match &e.kind {
            ExprKind::Variable(name) => {
                if let Some(local) = self.lookup_local(name) {
                    Ok(local.addr)
                } else if let Some(ty) = self.globals.get(name).cloned() {
                    Ok(self.values.add_global(name, ty, true))
                } else {
                    Err(CodeGenError::Logic(format!("unknown identifier '{}'", name)))
                }
            }
            ExprKind::Deref(inner) => self.gen_expr(inner),
            ExprKind::Index { base, index } => {
                let base_addr = self.element_base_ptr(base)?;
                let idx = self.gen_expr(index)?;
                let elem_ty = e.annotation.result().clone();
                let out = self.values.new_temp(Type::Pointer(Box::new(elem_ty.clone())));
                self.emit(&format!(
                    "{} = getelementptr {}, {} {}, i64 {}",
                    out.name,
                    ir_type(&elem_ty, self.tags),
                    self.ptr_ir(&elem_ty),
                    base_addr.operand(),
                    idx.operand()
                ));
                Ok(out)
            }
            ExprKind::Member { base, field, arrow } => {
                let base_addr = if *arrow {
                    self.gen_expr(base)?
                } else {
                    self.gen_lvalue(base)?
                };
                let agg_ty = if *arrow {
                    match base.annotation.result() {
                        Type::Pointer(inner) => (**inner).clone(),
                        t => t.clone(),
                    }
                } else {
                    base.annotation.result().clone()
                };
                let (index, member_ty) = self.member_index(&agg_ty, field)?;
                let out = self.values.new_temp(Type::Pointer(Box::new(member_ty)));
                self.emit(&format!(
                    "{} = getelementptr {}, {} {}, i32 0, i32 {}",
                    out.name,
                    ir_type(&agg_ty, self.tags),
                    self.ptr_ir(&agg_ty),
                    base_addr.operand(),
                    index
                ));
                Ok(out)
            }
            _ => Err(CodeGenError::Logic("expression is not an lvalue".into())),
        }
    }

    fn member_index(&self, agg_ty: &Type, field: &str) -> CgResult<(usize, Type)> {
        let id = match agg_ty {
            Type::Struct(id) | Type::Union(id) => *id,
            _ => return Err(CodeGenError::Logic(format!("{} is not a struct or union", agg_ty))),
        };
        let def = self
            .tags
            .get(id)
            .ok_or_else(|| CodeGenError::Logic("unknown tag".into()))?;
        let members = def
            .members
            .as_ref()
            .ok_or_else(|| CodeGenError::Logic("incomplete type".into()))?;
        members
            .iter()
            .position(|m| m.name == field)
            .map(|i| (i, members[i].ty.clone()))
            .ok_or_else(|| CodeGenError::Logic(format!("no member named '{}'", field)))
    }

    /// Address of an array/pointer base for subscripting: arrays subscript
    /// directly off their stack slot (no load needed), pointers load the
    /// pointer value first.
    fn element_base_ptr(&mut self, base: &Expr) -> CgResult<Value> {
        if matches!(base.annotation.result(), Type::Array(_, _)) {
            self.gen_lvalue(base)
        } else {
            self.gen_expr(base)
        }
    }

    fn gen_expr(&mut self, e: &Expr) -> CgResult<Value> {
        let ty = e.annotation.result().clone();
        match &e.kind {
            ExprKind::IntLiteral(v) => Ok(self.values.add_literal(v.to_string(), ty)),
            ExprKind::FloatLiteral(v) => Ok(self.values.add_literal(format_float(*v), ty)),
            ExprKind::CharLiteral(c) => Ok(self.values.add_literal((*c as i64).to_string(), ty)),
            ExprKind::StringLiteral(s) => Ok(self.intern_string(s)),
            ExprKind::Variable(_) => {
                let addr = self.gen_lvalue(e)?;
                self.load(&addr, &ty)
            }
            ExprKind::Unary(op, inner) => self.gen_unary(*op, inner, &ty),
            ExprKind::AddrOf(inner) => self.gen_lvalue(inner),
            ExprKind::Deref(inner) => {
                let addr = self.gen_expr(inner)?;
                self.load(&addr, &ty)
            }
            ExprKind::PreIncDec(op, inner) => self.gen_incdec(*op, inner, true),
            ExprKind::PostIncDec(op, inner) => self.gen_incdec(*op, inner, false),
            ExprKind::Binary(op, l, r) => self.gen_binary(*op, e, l, r),
            ExprKind::Assign { op, lhs, rhs } => self.gen_assign(*op, lhs, rhs),
            ExprKind::Conditional { cond, then, else_ } => self.gen_conditional(cond, then, else_, &ty),
            ExprKind::Call { callee, args } => self.gen_call(callee, args, &ty),
            ExprKind::Cast { to, expr } => {
                let v = self.gen_expr(expr)?;
                self.convert(v, expr.annotation.result(), to)
            }
            ExprKind::SizeofExpr(inner) => {
                let n = size(inner.annotation.result(), self.tags);
                Ok(self.values.add_literal(n.to_string(), ty))
            }
            ExprKind::SizeofType(t) => {
                let n = size(t, self.tags);
                Ok(self.values.add_literal(n.to_string(), ty))
            }
            ExprKind::Comma(l, r) => {
                self.gen_expr(l)?;
                self.gen_expr(r)
            }
            ExprKind::Index { .. } | ExprKind::Member { .. } => {
                let addr = self.gen_lvalue(e)?;
                self.load(&addr, &ty)
            }
        }
    }

    fn load(&mut self, addr: &Value, ty: &Type) -> CgResult<Value> {
        if matches!(ty, Type::Array(_, _)) {
            return Ok(addr.clone());
        }
        let out = self.values.new_temp(ty.clone());
        self.emit(&format!(
            "{} = load {}, {} {}",
            out.name,
            ir_type(ty, self.tags),
            self.ptr_ir(ty),
            addr.operand()
        ));
        Ok(out)
    }

    fn gen_unary(&mut self, op: UnaryOp, inner: &Expr, ty: &Type) -> CgResult<Value> {
        let v = self.gen_expr(inner)?;
        if op == UnaryOp::Not {
            return self.to_bool_negated(v, inner.annotation.result());
        }
        let v = self.convert(v, inner.annotation.result(), ty)?;
        match op {
            UnaryOp::Plus => Ok(v),
            UnaryOp::Neg => {
                let out = self.values.new_temp(ty.clone());
                let instr = if ty.is_float() { "fneg" } else { "sub" };
                if ty.is_float() {
                    self.emit(&format!("{} = fneg {} {}", out.name, ir_type(ty, self.tags), v.operand()));
                } else {
                    self.emit(&format!(
                        "{} = {} {} 0, {}",
                        out.name,
                        instr,
                        ir_type(ty, self.tags),
                        v.operand()
                    ));
                }
                Ok(out)
            }
            UnaryOp::BitNot => {
                let out = self.values.new_temp(ty.clone());
                self.emit(&format!(
                    "{} = xor {} {}, -1",
                    out.name,
                    ir_type(ty, self.tags),
                    v.operand()
                ));
                Ok(out)
            }
            UnaryOp::Not => self.to_bool_negated(v, inner.annotation.result()),
        }
    }

    fn to_bool_negated(&mut self, v: Value, ty: &Type) -> CgResult<Value> {
        let zero = zero_initializer(ty, self.tags);
        let out = self.values.new_temp(Type::Basic(Basic::Int(IntKind::Bool)));
        let cmp = if ty.is_float() { "fcmp oeq" } else { "icmp eq" };
        self.emit(&format!(
            "{} = {} {} {}, {}",
            out.name,
            cmp,
            ir_type(ty, self.tags),
            v.operand(),
            zero
        ));
        Ok(out)
    }

    fn gen_incdec(&mut self, op: IncDecOp, inner: &Expr, pre: bool) -> CgResult<Value> {
        let ty = inner.annotation.result().clone();
        let addr = self.gen_lvalue(inner)?;
        let old = self.load(&addr, &ty)?;
        let delta = if ty.is_float() {
            "1.0".to_string()
        } else {
            "1".to_string()
        };
        let new = self.values.new_temp(ty.clone());
        let instr = match (op, ty.is_float()) {
            (IncDecOp::Inc, true) => "fadd",
            (IncDecOp::Dec, true) => "fsub",
            (IncDecOp::Inc, false) => "add",
            (IncDecOp::Dec, false) => "sub",
        };
        self.emit(&format!(
            "{} = {} {} {}, {}",
            new.name,
            instr,
            ir_type(&ty, self.tags),
            old.operand(),
            delta
        ));
        self.emit(&format!(
            "store {} {}, {} {}",
            ir_type(&ty, self.tags),
            new.operand(),
            self.ptr_ir(&ty),
            addr.operand()
        ));
        Ok(if pre { new } else { old })
    }

    fn gen_binary(&mut self, op: BinOp, e: &Expr, l: &Expr, r: &Expr) -> CgResult<Value> {
        let ty = e.annotation.result().clone();
        if op.is_logical() {
            return self.gen_logical(op, l, r);
        }
        let lv = self.gen_expr(l)?;
        let rv = self.gen_expr(r)?;

        if (l.annotation.result().is_pointer() || r.annotation.result().is_pointer())
            && matches!(op, BinOp::Add | BinOp::Sub)
        {
            return self.gen_pointer_arith(op, l, lv, r, rv, &ty);
        }

        let lt = e
            .annotation
            .operand_types
            .first()
            .cloned()
            .unwrap_or_else(|| ty.clone());
        let rt = e
            .annotation
            .operand_types
            .get(1)
            .cloned()
            .unwrap_or_else(|| lt.clone());
        let lv = self.convert(lv, l.annotation.result(), &lt)?;
        let rv = self.convert(rv, r.annotation.result(), &rt)?;

        let operand_ty = ir_type(&lt, self.tags);
        let is_float = lt.is_float();
        let unsigned = lt.is_unsigned_int();
        let out_ty = if op.is_comparison() {
            Type::Basic(Basic::Int(IntKind::Bool))
        } else {
            ty.clone()
        };
        let out = self.values.new_temp(out_ty);
        let mnemonic = binop_mnemonic(op, is_float, unsigned);
        self.emit(&format!(
            "{} = {} {} {}, {}",
            out.name,
            mnemonic,
            operand_ty,
            lv.operand(),
            rv.operand()
        ));
        Ok(out)
    }

    fn gen_pointer_arith(
        &mut self,
        op: BinOp,
        l: &Expr,
        lv: Value,
        r: &Expr,
        rv: Value,
        ty: &Type,
    ) -> CgResult<Value> {
        if let (Type::Pointer(a), Type::Pointer(b)) = (l.annotation.result(), r.annotation.result()) {
            let lhs_int = self.ptr_to_int(lv, a)?;
            let rhs_int = self.ptr_to_int(rv, b)?;
            let diff = self.values.new_temp(Type::Basic(Basic::Int(IntKind::Long)));
            self.emit(&format!(
                "{} = sub i64 {}, {}",
                diff.name,
                lhs_int.operand(),
                rhs_int.operand()
            ));
            let elem = size(a, self.tags).max(1);
            let out = self.values.new_temp(ty.clone());
            self.emit(&format!("{} = sdiv i64 {}, {}", out.name, diff.operand(), elem));
            return Ok(out);
        }
        let (ptr, ptr_ty, idx) = if l.annotation.result().is_pointer() {
            (lv, l.annotation.result().clone(), rv)
        } else {
            (rv, r.annotation.result().clone(), lv)
        };
        let elem_ty = match &ptr_ty {
            Type::Pointer(elem) => (**elem).clone(),
            other => other.clone(),
        };
        let idx = if op == BinOp::Sub {
            let neg = self.values.new_temp(Type::Basic(Basic::Int(IntKind::Long)));
            self.emit(&format!("{} = sub i64 0, {}", neg.name, idx.operand()));
            neg
        } else {
            idx
        };
        let out = self.values.new_temp(ptr_ty);
        self.emit(&format!(
            "{} = getelementptr {}, {} {}, i64 {}",
            out.name,
            ir_type(&elem_ty, self.tags),
            self.ptr_ir(&elem_ty),
            ptr.operand(),
            idx.operand()
        ));
        Ok(out)
    }

    fn ptr_to_int(&mut self, v: Value, pointee: &Type) -> CgResult<Value> {
        let out = self.values.new_temp(Type::Basic(Basic::Int(IntKind::Long)));
        self.emit(&format!(
            "{} = ptrtoint {} {} to i64",
            out.name,
            self.ptr_ir(pointee),
            v.operand()
        ));
        Ok(out)
    }

    /// Short-circuit `&&`/`||`: materializes the result into a stack slot
    /// written from each evaluated branch, loaded back at the join point —
    /// the same store/load-into-a-slot pattern the teacher's
    /// `codegen_if_statement` uses in place of an explicit phi.
    fn gen_logical(&mut self, op: BinOp, l: &Expr, r: &Expr) -> CgResult<Value> {
        let slot = self.values.new_temp(Type::Pointer(Box::new(Type::Basic(Basic::Int(IntKind::Bool)))));
        self.emit(&format!("{} = alloca i1", slot.name));

        let rhs_label = self.fresh_label(if op == BinOp::LogAnd { "and.rhs" } else { "or.rhs" });
        let short_label = self.fresh_label("logic.short");
        let end_label = self.fresh_label("logic.end");

        let lv = self.gen_expr(l)?;
        let ltest = self.to_bool(lv, l.annotation.result())?;
        if op == BinOp::LogAnd {
            self.emit_terminator(&format!(
                "br i1 {}, label %{}, label %{}",
                ltest.operand(),
                rhs_label,
                short_label
            ));
        } else {
            self.emit_terminator(&format!(
                "br i1 {}, label %{}, label %{}",
                ltest.operand(),
                short_label,
                rhs_label
            ));
        }

        let bool_ty = Type::Basic(Basic::Int(IntKind::Bool));

        self.open_block(&short_label);
        let short_val = if op == BinOp::LogAnd { "0" } else { "1" };
        self.emit(&format!(
            "store i1 {}, {} {}",
            short_val,
            self.ptr_ir(&bool_ty),
            slot.name
        ));
        self.emit_terminator(&format!("br label %{}", end_label));

        self.open_block(&rhs_label);
        let rv = self.gen_expr(r)?;
        let rtest = self.to_bool(rv, r.annotation.result())?;
        self.emit(&format!(
            "store i1 {}, {} {}",
            rtest.operand(),
            self.ptr_ir(&bool_ty),
            slot.name
        ));
        self.emit_terminator(&format!("br label %{}", end_label));

        self.open_block(&end_label);
        let out = self.values.new_temp(Type::Basic(Basic::Int(IntKind::Bool)));
        self.emit(&format!(
            "{} = load i1, {} {}",
            out.name,
            self.ptr_ir(&bool_ty),
            slot.name
        ));
        Ok(out)
    }

    fn gen_assign(&mut self, op: Option<BinOp>, lhs: &Expr, rhs: &Expr) -> CgResult<Value> {
        let addr = self.gen_lvalue(lhs)?;
        let lty = lhs.annotation.result().clone();
        let rv = self.gen_expr(rhs)?;
        let new_val = match op {
            None => self.convert(rv, rhs.annotation.result(), &lty)?,
            Some(binop) => {
                let cur = self.load(&addr, &lty)?;
                let rv = self.convert(rv, rhs.annotation.result(), &lty)?;
                if lty.is_pointer() && matches!(binop, BinOp::Add | BinOp::Sub) {
                    let elem_ty = match &lty {
                        Type::Pointer(elem) => (**elem).clone(),
                        _ => unreachable!(),
                    };
                    let idx = if binop == BinOp::Sub {
                        let neg = self.values.new_temp(Type::Basic(Basic::Int(IntKind::Long)));
                        self.emit(&format!("{} = sub i64 0, {}", neg.name, rv.operand()));
                        neg
                    } else {
                        rv
                    };
                    let out = self.values.new_temp(lty.clone());
                    self.emit(&format!(
                        "{} = getelementptr {}, {} {}, i64 {}",
                        out.name,
                        ir_type(&elem_ty, self.tags),
                        self.ptr_ir(&elem_ty),
                        cur.operand(),
                        idx.operand()
                    ));
                    out
                } else {
                    let out = self.values.new_temp(lty.clone());
                    let mnemonic = binop_mnemonic(binop, lty.is_float(), lty.is_unsigned_int());
                    self.emit(&format!(
                        "{} = {} {} {}, {}",
                        out.name,
                        mnemonic,
                        ir_type(&lty, self.tags),
                        cur.operand(),
                        rv.operand()
                    ));
                    out
                }
            }
        };
        self.emit(&format!(
            "store {} {}, {} {}",
            ir_type(&lty, self.tags),
            new_val.operand(),
            self.ptr_ir(&lty),
            addr.operand()
        ));
        Ok(new_val)
    }

    fn gen_conditional(&mut self, cond: &Expr, then: &Expr, else_: &Expr, ty: &Type) -> CgResult<Value> {
        let slot = self.values.new_temp(Type::Pointer(Box::new(ty.clone())));
        self.emit(&format!("{} = alloca {}", slot.name, ir_type(ty, self.tags)));

        let then_label = self.fresh_label("cond.then");
        let else_label = self.fresh_label("cond.else");
        let end_label = self.fresh_label("cond.end");
        self.gen_condition_branch(cond, &then_label, &else_label)?;

        self.open_block(&then_label);
        let tv = self.gen_expr(then)?;
        let tv = self.convert(tv, then.annotation.result(), ty)?;
        self.emit(&format!(
            "store {} {}, {} {}",
            ir_type(ty, self.tags),
            tv.operand(),
            self.ptr_ir(ty),
            slot.name
        ));
        self.emit_terminator(&format!("br label %{}", end_label));

        self.open_block(&else_label);
        let ev = self.gen_expr(else_)?;
        let ev = self.convert(ev, else_.annotation.result(), ty)?;
        self.emit(&format!(
            "store {} {}, {} {}",
            ir_type(ty, self.tags),
            ev.operand(),
            self.ptr_ir(ty),
            slot.name
        ));
        self.emit_terminator(&format!("br label %{}", end_label));

        self.open_block(&end_label);
        let out = self.values.new_temp(ty.clone());
        self.emit(&format!(
            "{} = load {}, {} {}",
            out.name,
            ir_type(ty, self.tags),
            self.ptr_ir(ty),
            slot.name
        ));
        Ok(out)
    }

    fn gen_call(&mut self, callee: &Expr, args: &[Expr], ty: &Type) -> CgResult<Value> {
        let name = match &callee.kind {
            ExprKind::Variable(n) => n.clone(),
            _ => return Err(CodeGenError::Logic("indirect calls are unsupported".into())),
        };
        let mut arg_vals = Vec::new();
        for a in args {
            let v = self.gen_expr(a)?;
            arg_vals.push(format!("{} {}", ir_type(a.annotation.result(), self.tags), v.operand()));
        }
        let args_text = arg_vals.join(", ");
        if ty.is_void() {
            self.emit(&format!("call void @{}({})", name, args_text));
            Ok(self.values.add_literal("0", Type::int()))
        } else {
            let out = self.values.new_temp(ty.clone());
            self.emit(&format!(
                "{} = call {} @{}({})",
                out.name,
                ir_type(ty, self.tags),
                name,
                args_text
            ));
            Ok(out)
        }
    }

    /// Inserts the IR conversion instruction between `from` and `to`, or
    /// returns `v` unchanged when no bit pattern change is needed.
    fn convert(&mut self, v: Value, from: &Type, to: &Type) -> CgResult<Value> {
        if from == to {
            return Ok(v);
        }
        let (from_ir, to_ir) = (ir_type(from, self.tags), ir_type(to, self.tags));
        if from_ir == to_ir {
            return Ok(v);
        }
        let out = self.values.new_temp(to.clone());
        let op = match (from, to) {
            (Type::Basic(Basic::Int(fk)), Type::Basic(Basic::Int(tk))) => {
                let fb = types::int_bits(*fk);
                let tb = types::int_bits(*tk);
                if tb > fb {
                    if from.is_unsigned_int() {
                        "zext"
                    } else {
                        "sext"
                    }
                } else if tb < fb {
                    "trunc"
                } else {
                    return Ok(Value::new(v.operand(), to.clone(), v.storage));
                }
            }
            (Type::Basic(Basic::Int(_)), Type::Basic(Basic::Float(_))) => {
                if from.is_unsigned_int() {
                    "uitofp"
                } else {
                    "sitofp"
                }
            }
            (Type::Basic(Basic::Float(_)), Type::Basic(Basic::Int(_))) => {
                if to.is_unsigned_int() {
                    "fptoui"
                } else {
                    "fptosi"
                }
            }
            (Type::Basic(Basic::Float(f1)), Type::Basic(Basic::Float(f2))) => {
                if float_rank(*f2) > float_rank(*f1) {
                    "fpext"
                } else {
                    "fptrunc"
                }
            }
            (Type::Pointer(_), Type::Basic(Basic::Int(_))) => "ptrtoint",
            (Type::Basic(Basic::Int(_)), Type::Pointer(_)) => "inttoptr",
            (Type::Pointer(_), Type::Pointer(_)) => {
                return Ok(Value::new(v.operand(), to.clone(), v.storage));
            }
            _ => return Err(CodeGenError::Logic(format!("no conversion from {} to {}", from, to))),
        };
        self.emit(&format!(
            "{} = {} {} {} to {}",
            out.name,
            op,
            from_ir,
            v.operand(),
            to_ir
        ));
        Ok(out)
    }
}

fn float_rank(k: FloatKind) -> u8 {
    match k {
        FloatKind::Float => 0,
        FloatKind::Double => 1,
        FloatKind::LongDouble => 2,
    }
}

fn binop_mnemonic(op: BinOp, is_float: bool, unsigned: bool) -> &'static str {
    use BinOp::*;
    match (op, is_float, unsigned) {
        (Add, true, _) => "fadd",
        (Sub, true, _) => "fsub",
        (Mul, true, _) => "fmul",
        (Div, true, _) => "fdiv",
        (Mod, true, _) => "frem",
        (Add, false, _) => "add",
        (Sub, false, _) => "sub",
        (Mul, false, _) => "mul",
        (Div, false, true) => "udiv",
        (Div, false, false) => "sdiv",
        (Mod, false, true) => "urem",
        (Mod, false, false) => "srem",
        (BitAnd, ..) => "and",
        (BitOr, ..) => "or",
        (BitXor, ..) => "xor",
        (Shl, ..) => "shl",
        (Shr, false, true) => "lshr",
        (Shr, false, false) => "ashr",
        (Shr, true, _) => unreachable!("shift is never applied to float operands"),
        (Lt, true, _) => "fcmp olt",
        (Le, true, _) => "fcmp ole",
        (Gt, true, _) => "fcmp ogt",
        (Ge, true, _) => "fcmp oge",
        (Eq, true, _) => "fcmp oeq",
        (Ne, true, _) => "fcmp one",
        (Lt, false, true) => "icmp ult",
        (Le, false, true) => "icmp ule",
        (Gt, false, true) => "icmp ugt",
        (Ge, false, true) => "icmp uge",
        (Lt, false, false) => "icmp slt",
        (Le, false, false) => "icmp sle",
        (Gt, false, false) => "icmp sgt",
        (Ge, false, false) => "icmp sge",
        (Eq, false, _) => "icmp eq",
        (Ne, false, _) => "icmp ne",
        (LogAnd, ..) | (LogOr, ..) => unreachable!("logical operators short-circuit, see gen_logical"),
    }
}

fn format_float(v: f64) -> String {
    format!("{:.6e}", v)
}

/// Renders `s` as LLVM's `c"..."` byte-array constant syntax, escaping every
/// byte outside printable ASCII (and `"`/`\`) as `\XX`, and appends the
/// trailing NUL C string literals carry. Returns the escaped text and the
/// array length (`len(bytes) + 1`) for the `[N x i8]` type.
fn string_constant_text(s: &str) -> (String, usize) {
    let mut text = String::new();
    for b in s.bytes() {
        match b {
            b'"' | b'\\' => text.push_str(&format!("\\{:02X}", b)),
            0x20..=0x7e => text.push(b as char),
            _ => text.push_str(&format!("\\{:02X}", b)),
        }
    }
    text.push_str("\\00");
    (text, s.as_bytes().len() + 1)
}

/// `zeroinitializer` is accepted by LLVM for any type — scalar or aggregate —
/// so there is no need to spell out a per-element array/struct literal here.
fn zero_initializer(ty: &Type, _tags: &TagRegistry) -> String {
    match ty {
        Type::Basic(Basic::Float(_)) => "0.0".to_string(),
        Type::Pointer(_) => "null".to_string(),
        Type::Basic(Basic::Int(_)) => "0".to_string(),
        _ => "zeroinitializer".to_string(),
    }
}

fn ret_zero(ty: &Type, tags: &TagRegistry) -> String {
    if ty.is_void() {
        "ret void".to_string()
    } else {
        format!("ret {} {}", ir_type(ty, tags), zero_initializer(ty, tags))
    }
}

/// Pre-scans a function body for user `Label`s, minting a collision-free IR
/// block label for each so forward `goto`s resolve before the label's block
/// is actually emitted.
fn collect_labels(block: &Block, out: &mut HashMap<String, String>, values: &mut ValueRegistry) {
    for item in block {
        if let BlockItem::Stmt(s) = item {
            collect_labels_stmt(s, out, values);
        }
    }
}

fn collect_labels_stmt(stmt: &Stmt, out: &mut HashMap<String, String>, values: &mut ValueRegistry) {
    match stmt {
        Stmt::Label(name, inner) => {
            out.insert(name.clone(), format!("label.{}.{}", name, values.new_local_name()));
            collect_labels_stmt(inner, out, values);
        }
        Stmt::Block(b) => collect_labels(b, out, values),
        Stmt::If { then, else_, .. } => {
            collect_labels_stmt(then, out, values);
            if let Some(e) = else_ {
                collect_labels_stmt(e, out, values);
            }
        }
        Stmt::While { body, .. } | Stmt::DoWhile { body, .. } | Stmt::For { body, .. } => {
            collect_labels_stmt(body, out, values)
        }
        Stmt::Switch { body, .. } => collect_labels_stmt(body, out, values),
        Stmt::Case { stmt, .. } | Stmt::Default(stmt) => collect_labels_stmt(stmt, out, values),
        _ => {}
    }
}

/// Pre-scans a `switch` body for `case`/`default` labels, minting an IR
/// block for each and folding its constant value, without yet emitting the
/// statements themselves (those run once, in source order, as the body is
/// walked normally).
fn collect_cases(
    stmt: &Stmt,
    cg: &mut CodeGen,
    out: &mut Vec<(i128, String)>,
    default_label: &mut Option<String>,
) -> CgResult<()> {
    match stmt {
        Stmt::Case { value, stmt } => {
            let v = crate::constfold::fold_int(value)
                .ok_or_else(|| CodeGenError::Logic("case label is not a constant expression".into()))?;
            let label = cg.fresh_label("switch.case");
            out.push((v, label));
            collect_cases(stmt, cg, out, default_label)
        }
        Stmt::Default(stmt) => {
            let label = cg.fresh_label("switch.default");
            *default_label = Some(label);
            collect_cases(stmt, cg, out, default_label)
        }
        Stmt::Block(items) => {
            for item in items {
                if let BlockItem::Stmt(s) = item {
                    collect_cases(s, cg, out, default_label)?;
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::parse;
    use crate::sema::Analyzer;

    fn compile(src: &str) -> String {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let (mut program, tags) = parse(&tokens).unwrap();
        let mut analyzer = Analyzer::new(tags);
        analyzer.analyze(&mut program);
        assert!(!analyzer.diags.has_errors(), "unexpected sema errors");
        codegen_program(&program, &analyzer.tags, &CompilerConfig::default()).unwrap()
    }

    #[test]
    fn emits_define_and_ret_for_minimal_main() {
        let ir = compile("int main(){return 2;}");
        assert!(ir.contains("define i32 @main()"));
        assert!(ir.contains("ret i32 2"));
    }

    #[test]
    fn bitwise_not_then_negate_lowers_to_xor_then_sub() {
        let ir = compile("int main(){return -~1;}");
        assert!(ir.contains("xor i32 1, -1"));
        assert!(ir.contains("sub i32 0,"));
    }

    #[test]
    fn compound_assignment_loads_adds_and_stores() {
        let ir = compile("int main(){int a; a = 0; a += 4; return a;}");
        assert!(ir.contains("add i32"));
        assert!(ir.matches("store i32").count() >= 2);
    }

    #[test]
    fn short_circuit_and_uses_three_blocks() {
        let ir = compile("int main(){return 1 && 0;}");
        assert!(ir.contains("and.rhs"));
        assert!(ir.contains("logic.short"));
        assert!(ir.contains("logic.end"));
    }

    #[test]
    fn for_loop_emits_four_labeled_blocks() {
        let ir = compile("int main(){int i; for(i=0;i<3;i++); return i;}");
        assert!(ir.contains("for.cond"));
        assert!(ir.contains("for.body"));
        assert!(ir.contains("for.post"));
        assert!(ir.contains("for.end"));
    }

    #[test]
    fn extern_global_without_definition_becomes_a_declare() {
        let ir = compile("extern int x; int main(){return x;}");
        assert!(ir.contains("@x = external global i32"));
    }

    #[test]
    fn string_literal_interns_into_a_constant_pool() {
        let ir = compile("int main(){char *s; s = \"hi\"; return 0;}");
        assert!(ir.contains("@.str.0 = private unnamed_addr constant [3 x i8] c\"hi\\00\""));
        assert!(ir.contains("getelementptr inbounds ([3 x i8], [3 x i8]* @.str.0, i64 0, i64 0)"));
    }

    #[test]
    fn pointer_params_and_loads_use_pointee_specific_types() {
        let ir = compile("int main(){int a; int *p; p = &a; return *p;}");
        assert!(ir.contains("alloca i32*"));
        assert!(ir.contains("load i32, i32*"));
        assert!(!ir.contains(" ptr "));
    }
}
