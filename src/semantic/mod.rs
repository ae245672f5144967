//! Semantic analysis module
//!
//! AST を型付きの平坦な IR に変換する。
//! - 名前解決と型検査 (ScopeStack)
//! - 制御構造を LABEL / JUMP / JUMPIFFALSE の列に展開
//! - 関数はシグネチャを先に集め、本体は最初の呼び出し時に変換する

mod builtins;
mod operators;
mod scope;
mod types;

pub use builtins::{get_builtin_info, is_builtin, BuiltinInfo};
pub use scope::*;
pub use types::*;

use crate::error::SemanticError;
use crate::ir::{
    BuiltinId, IrExpr, IrExprKind, IrFunction, IrInstr, IrProgram, LabelId, SourceLocation,
};
use crate::parser::{Expr, LiteralValue, Param, Program, Stmt};
use log::{debug, trace};
use operators::{binop_result, unaryop_result};
use std::collections::HashMap;

/// Name of the function that holds the top-level statements
pub const ENTRY_FUNCTION: &str = "main";

/// Lower a parsed program to IR
pub fn lower(program: &Program) -> Result<IrProgram, SemanticError> {
    let mut lowerer = Lowerer::new(program)?;
    let ir = lowerer.run(program)?;
    debug!(
        "semantic: lowered {} function(s) plus entry, {} entry instructions",
        ir.functions.len(),
        ir.entry.body.len()
    );
    Ok(ir)
}

/// A checked call, placed afterwards either in an expression or in a CALL statement
enum LoweredCall {
    Builtin { id: BuiltinId, arg: IrExpr, ty: Type },
    User { func: String, args: Vec<IrExpr>, ty: Type },
}

impl LoweredCall {
    fn into_expr(self) -> IrExpr {
        match self {
            LoweredCall::Builtin { id, arg, ty } => IrExpr::new(
                IrExprKind::Builtin {
                    id,
                    arg: Box::new(arg),
                },
                ty,
            ),
            LoweredCall::User { func, args, ty } => {
                IrExpr::new(IrExprKind::Call { func, args }, ty)
            }
        }
    }

    fn into_instr(self) -> IrInstr {
        match self {
            LoweredCall::Builtin { id, arg, .. } => IrInstr::Call {
                callee: id.name().to_string(),
                args: vec![arg],
            },
            LoweredCall::User { func, args, .. } => IrInstr::Call { callee: func, args },
        }
    }
}

#[derive(Debug)]
enum LoweringState {
    Pending,
    InProgress,
    Done(IrFunction),
}

/// Signature and lowering progress of one user function
#[derive(Debug)]
struct FunctionEntry<'p> {
    name: &'p str,
    params: &'p [Param],
    body: &'p [Stmt],
    /// Fixed on first call (or when lowered without one)
    param_types: Option<Vec<Type>>,
    /// Annotation, or the first valued `return` seen so far
    ret: Option<Type>,
    state: LoweringState,
}

/// Per-function lowering state
struct FunctionCtx {
    /// Index into the function table; `None` for the entry function
    index: Option<usize>,
    scopes: ScopeStack,
    next_label: u32,
    body: Vec<IrInstr>,
}

impl FunctionCtx {
    fn new(index: Option<usize>) -> Self {
        Self {
            index,
            scopes: ScopeStack::new(),
            next_label: 0,
            body: Vec::new(),
        }
    }

    fn new_label(&mut self) -> LabelId {
        let label = LabelId(self.next_label);
        self.next_label += 1;
        trace!("allocated label {label}");
        label
    }

    fn emit(&mut self, instr: IrInstr) {
        self.body.push(instr);
    }

    /// Wrap the body in FUNC_BEGIN / FUNC_END
    fn finish(self, name: &str, params: Vec<(String, Type)>, ret: Type) -> IrFunction {
        let mut body = Vec::with_capacity(self.body.len() + 2);
        body.push(IrInstr::FuncBegin {
            name: name.to_string(),
            params: params.clone(),
            ret,
        });
        body.extend(self.body);
        body.push(IrInstr::FuncEnd);
        let function = IrFunction {
            name: name.to_string(),
            params,
            ret,
            body,
        };
        debug_assert!(
            function.verify_labels().is_ok(),
            "lowering produced dangling labels in '{name}'"
        );
        function
    }
}

/// Lowering driver
struct Lowerer<'p> {
    functions: Vec<FunctionEntry<'p>>,
    by_name: HashMap<&'p str, usize>,
}

impl<'p> Lowerer<'p> {
    /// Pre-pass: collect every function signature
    fn new(program: &'p Program) -> Result<Self, SemanticError> {
        let mut functions = Vec::new();
        let mut by_name = HashMap::new();

        for stmt in &program.statements {
            let Stmt::FunctionDef {
                name,
                params,
                return_type,
                body,
                pos,
            } = stmt
            else {
                continue;
            };
            if is_builtin(name) {
                return Err(SemanticError::type_mismatch(
                    format!("cannot redefine built-in function '{name}'"),
                    *pos,
                ));
            }
            if by_name.contains_key(name.as_str()) {
                return Err(SemanticError::type_mismatch(
                    format!("duplicate function '{name}'"),
                    *pos,
                ));
            }
            for (i, param) in params.iter().enumerate() {
                if params[..i].iter().any(|p| p.name == param.name) {
                    return Err(SemanticError::type_mismatch(
                        format!("duplicate parameter '{}' in '{name}'", param.name),
                        param.pos,
                    ));
                }
            }

            by_name.insert(name.as_str(), functions.len());
            functions.push(FunctionEntry {
                name,
                params,
                body,
                param_types: None,
                ret: *return_type,
                state: LoweringState::Pending,
            });
        }
        trace!("collected {} function signature(s)", functions.len());

        Ok(Self { functions, by_name })
    }

    fn run(&mut self, program: &Program) -> Result<IrProgram, SemanticError> {
        let mut ctx = FunctionCtx::new(None);
        for stmt in &program.statements {
            self.lower_stmt(&mut ctx, stmt)?;
        }
        let entry = ctx.finish(ENTRY_FUNCTION, Vec::new(), Type::Int);

        // functions never called from the entry path
        for index in 0..self.functions.len() {
            if matches!(self.functions[index].state, LoweringState::Pending) {
                self.lower_function(index)?;
            }
        }

        let functions = std::mem::take(&mut self.functions)
            .into_iter()
            .filter_map(|entry| match entry.state {
                LoweringState::Done(function) => Some(function),
                _ => None,
            })
            .collect();

        Ok(IrProgram { functions, entry })
    }

    fn lower_function(&mut self, index: usize) -> Result<(), SemanticError> {
        let entry = &mut self.functions[index];
        let name = entry.name;
        let params = entry.params;
        let body = entry.body;
        let param_types = match &entry.param_types {
            Some(types) => types.clone(),
            None => params
                .iter()
                .map(|p| p.type_hint.unwrap_or(Type::String))
                .collect(),
        };
        entry.param_types = Some(param_types.clone());
        entry.state = LoweringState::InProgress;
        trace!("lowering function '{name}'");

        let mut ctx = FunctionCtx::new(Some(index));
        let typed_params: Vec<(String, Type)> = params
            .iter()
            .zip(&param_types)
            .map(|(p, ty)| (p.name.clone(), *ty))
            .collect();
        for (param, ty) in &typed_params {
            ctx.scopes.define(param, *ty);
        }

        for stmt in body {
            self.lower_stmt(&mut ctx, stmt)?;
        }

        let entry = &mut self.functions[index];
        let ret = entry.ret.unwrap_or(Type::Void);
        entry.ret = Some(ret);
        entry.state = LoweringState::Done(ctx.finish(name, typed_params, ret));
        Ok(())
    }

    // --- statements ---

    fn lower_block(&mut self, ctx: &mut FunctionCtx, stmts: &[Stmt]) -> Result<(), SemanticError> {
        ctx.scopes.push();
        trace!("scope push (depth {})", ctx.scopes.depth());
        for stmt in stmts {
            self.lower_stmt(ctx, stmt)?;
        }
        ctx.scopes.pop();
        trace!("scope pop (depth {})", ctx.scopes.depth());
        Ok(())
    }

    fn lower_stmt(&mut self, ctx: &mut FunctionCtx, stmt: &Stmt) -> Result<(), SemanticError> {
        match stmt {
            // collected by the pre-pass
            Stmt::FunctionDef { .. } => Ok(()),

            Stmt::Assign {
                target,
                annotation,
                value,
                pos,
            } => {
                let value = self.lower_value(ctx, value)?;
                let bound = ctx.scopes.lookup(target).map(|var| var.ty);
                if let Some(bound) = bound {
                    if let Some(declared) = annotation {
                        if *declared != bound {
                            return Err(SemanticError::type_mismatch(
                                format!(
                                    "'{target}' is already bound as {bound}, cannot redeclare as {declared}"
                                ),
                                *pos,
                            ));
                        }
                    }
                    if !bound.accepts(value.ty) {
                        return Err(SemanticError::type_mismatch(
                            format!("cannot assign {} to '{target}' of type {bound}", value.ty),
                            *pos,
                        ));
                    }
                } else {
                    let ty = annotation.unwrap_or(value.ty);
                    if !ty.accepts(value.ty) {
                        return Err(SemanticError::type_mismatch(
                            format!("cannot assign {} to '{target}' of type {ty}", value.ty),
                            *pos,
                        ));
                    }
                    ctx.scopes.define(target, ty);
                    ctx.emit(IrInstr::Declare {
                        name: target.clone(),
                        ty,
                    });
                }
                ctx.emit(IrInstr::Assign {
                    target: target.clone(),
                    value,
                });
                Ok(())
            }

            Stmt::Print { argument, .. } => {
                let value = self.lower_value(ctx, argument)?;
                ctx.emit(IrInstr::Print { value });
                Ok(())
            }

            Stmt::Call { callee, args, pos } => {
                let call = self.lower_call(ctx, callee, args, *pos, true)?;
                ctx.emit(call.into_instr());
                Ok(())
            }

            Stmt::Return { value, pos } => self.lower_return(ctx, value.as_ref(), *pos),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let cond = self.lower_condition(ctx, condition)?;
                let else_label = ctx.new_label();
                match else_branch {
                    None => {
                        ctx.emit(IrInstr::JumpIfFalse {
                            cond,
                            target: else_label,
                        });
                        self.lower_block(ctx, then_branch)?;
                        ctx.emit(IrInstr::Label(else_label));
                    }
                    Some(else_branch) => {
                        let end_label = ctx.new_label();
                        ctx.emit(IrInstr::JumpIfFalse {
                            cond,
                            target: else_label,
                        });
                        self.lower_block(ctx, then_branch)?;
                        ctx.emit(IrInstr::Jump(end_label));
                        ctx.emit(IrInstr::Label(else_label));
                        self.lower_block(ctx, else_branch)?;
                        ctx.emit(IrInstr::Label(end_label));
                    }
                }
                Ok(())
            }

            Stmt::While {
                condition, body, ..
            } => {
                let start = ctx.new_label();
                let end = ctx.new_label();
                ctx.emit(IrInstr::Label(start));
                let cond = self.lower_condition(ctx, condition)?;
                ctx.emit(IrInstr::JumpIfFalse { cond, target: end });
                self.lower_block(ctx, body)?;
                ctx.emit(IrInstr::Jump(start));
                ctx.emit(IrInstr::Label(end));
                Ok(())
            }
        }
    }

    fn lower_return(
        &mut self,
        ctx: &mut FunctionCtx,
        value: Option<&Expr>,
        pos: SourceLocation,
    ) -> Result<(), SemanticError> {
        let Some(index) = ctx.index else {
            return Err(SemanticError::type_mismatch(
                "'return' outside function",
                pos,
            ));
        };
        let value = value.map(|v| self.lower_value(ctx, v)).transpose()?;
        let found = value.as_ref().map_or(Type::Void, |v| v.ty);

        let entry = &mut self.functions[index];
        match entry.ret {
            None => entry.ret = Some(found),
            Some(expected) if expected.accepts(found) => {}
            Some(Type::Void) => {
                return Err(SemanticError::type_mismatch(
                    format!("'{}' does not return a value, found {found}", entry.name),
                    pos,
                ));
            }
            Some(expected) => {
                return Err(SemanticError::type_mismatch(
                    format!("'{}' returns {expected}, found {found}", entry.name),
                    pos,
                ));
            }
        }
        ctx.emit(IrInstr::Return(value));
        Ok(())
    }

    // --- expressions ---

    fn lower_condition(
        &mut self,
        ctx: &mut FunctionCtx,
        condition: &Expr,
    ) -> Result<IrExpr, SemanticError> {
        let cond = self.lower_value(ctx, condition)?;
        if !cond.ty.is_truthy() {
            return Err(SemanticError::type_mismatch(
                format!("condition must be bool, int or float, found {}", cond.ty),
                condition.pos(),
            ));
        }
        Ok(cond)
    }

    /// Lower an expression whose value is used
    fn lower_value(&mut self, ctx: &mut FunctionCtx, expr: &Expr) -> Result<IrExpr, SemanticError> {
        let value = self.lower_expr(ctx, expr)?;
        if value.ty == Type::Void {
            let name = match &value.kind {
                IrExprKind::Call { func, .. } => func.as_str(),
                _ => "expression",
            };
            return Err(SemanticError::type_mismatch(
                format!("'{name}' does not return a value"),
                expr.pos(),
            ));
        }
        Ok(value)
    }

    fn lower_expr(&mut self, ctx: &mut FunctionCtx, expr: &Expr) -> Result<IrExpr, SemanticError> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                LiteralValue::Int(n) => IrExpr::int(*n),
                LiteralValue::Float(x) => IrExpr::float(*x),
                LiteralValue::Str(s) => IrExpr::string(s.clone()),
                LiteralValue::Bool(b) => IrExpr::bool(*b),
            }),

            Expr::Name { id, pos } => match ctx.scopes.lookup(id) {
                Some(var) => Ok(IrExpr::var(id.clone(), var.ty)),
                None => Err(SemanticError::UnboundName {
                    identifier: id.clone(),
                    position: *pos,
                }),
            },

            Expr::BinOp {
                left,
                op,
                right,
                pos,
            } => {
                let left = self.lower_value(ctx, left)?;
                let right = self.lower_value(ctx, right)?;
                let (op, ty) = binop_result(op, left.ty, right.ty)
                    .map_err(|reason| SemanticError::type_mismatch(reason, *pos))?;
                Ok(IrExpr::new(
                    IrExprKind::BinOp {
                        left: Box::new(left),
                        op,
                        right: Box::new(right),
                    },
                    ty,
                ))
            }

            Expr::UnaryOp { op, operand, pos } => {
                let operand = self.lower_value(ctx, operand)?;
                let (op, ty) = unaryop_result(op, operand.ty)
                    .map_err(|reason| SemanticError::type_mismatch(reason, *pos))?;
                Ok(IrExpr::new(
                    IrExprKind::UnaryOp {
                        op,
                        operand: Box::new(operand),
                    },
                    ty,
                ))
            }

            Expr::Call { callee, args, pos } => self
                .lower_call(ctx, callee, args, *pos, false)
                .map(LoweredCall::into_expr),
        }
    }

    /// Lower a call to a builtin or user function.
    ///
    /// `as_statement` permits a recursive call whose return type is still unknown; its value
    /// is discarded, so it is typed void.
    fn lower_call(
        &mut self,
        ctx: &mut FunctionCtx,
        callee: &str,
        args: &[Expr],
        pos: SourceLocation,
        as_statement: bool,
    ) -> Result<LoweredCall, SemanticError> {
        let mut lowered = Vec::with_capacity(args.len());
        for arg in args {
            lowered.push(self.lower_value(ctx, arg)?);
        }

        if let Some(info) = get_builtin_info(callee) {
            if lowered.len() != 1 {
                return Err(SemanticError::ArityMismatch {
                    callee: callee.to_string(),
                    expected: 1,
                    found: lowered.len(),
                    position: pos,
                });
            }
            let arg = lowered.remove(0);
            let ty = info
                .result_type(arg.ty)
                .map_err(|reason| SemanticError::type_mismatch(reason, pos))?;
            return Ok(LoweredCall::Builtin {
                id: info.id,
                arg,
                ty,
            });
        }

        let Some(&index) = self.by_name.get(callee) else {
            return Err(SemanticError::UnboundName {
                identifier: callee.to_string(),
                position: pos,
            });
        };

        let entry = &mut self.functions[index];
        let params = entry.params;
        if params.len() != lowered.len() {
            return Err(SemanticError::ArityMismatch {
                callee: callee.to_string(),
                expected: params.len(),
                found: lowered.len(),
                position: pos,
            });
        }

        // the first call fixes unannotated parameter types
        let param_types = entry
            .param_types
            .get_or_insert_with(|| {
                params
                    .iter()
                    .zip(&lowered)
                    .map(|(p, arg)| p.type_hint.unwrap_or(arg.ty))
                    .collect()
            })
            .clone();
        for (i, (expected, arg)) in param_types.iter().zip(&lowered).enumerate() {
            if !expected.accepts(arg.ty) {
                return Err(SemanticError::type_mismatch(
                    format!(
                        "argument {} of {callee}() expects {expected}, found {}",
                        i + 1,
                        arg.ty
                    ),
                    args[i].pos(),
                ));
            }
        }

        if matches!(entry.state, LoweringState::Pending) {
            trace!("lowering '{callee}' on demand at {pos}");
            self.lower_function(index)?;
        }

        let entry = &self.functions[index];
        let ty = match entry.ret {
            Some(ty) => ty,
            None if as_statement => Type::Void,
            None => {
                return Err(SemanticError::type_mismatch(
                    format!("cannot infer return type of recursive call to '{callee}'"),
                    pos,
                ));
            }
        };
        Ok(LoweredCall::User {
            func: callee.to_string(),
            args: lowered,
            ty,
        })
    }
}

#[cfg(test)]
mod tests;
