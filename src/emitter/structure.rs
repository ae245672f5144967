//! Structured control flow recovery
//!
//! The lowering emits exactly two jump shapes:
//!
//! ```text
//! if:     JUMPIFFALSE c La; then...; [JUMP Lb; LABEL La; else...; LABEL Lb | LABEL La]
//! while:  LABEL La; JUMPIFFALSE c Lb; body...; JUMP La; LABEL Lb
//! ```
//!
//! Anything else is rejected with a `GenerationError`.

use crate::error::GenerationError;
use crate::ir::{IrExpr, IrFunction, IrInstr, IrOp, LabelId};
use crate::parser::MAX_NESTING;
use std::collections::HashMap;

/// A statement with its control structure restored
#[derive(Debug, Clone, PartialEq)]
pub enum Node<'a> {
    /// DECLARE, ASSIGN, PRINT, CALL or RETURN
    Simple(&'a IrInstr),
    If {
        cond: &'a IrExpr,
        then_branch: Vec<Node<'a>>,
        else_branch: Option<Vec<Node<'a>>>,
    },
    While {
        cond: &'a IrExpr,
        body: Vec<Node<'a>>,
    },
}

/// Rebuild the block tree of one function body
pub fn structure(function: &IrFunction) -> Result<Vec<Node<'_>>, GenerationError> {
    let body = &function.body;
    match body.first() {
        Some(IrInstr::FuncBegin { .. }) => {}
        Some(other) => {
            return Err(GenerationError::new(
                other.op(),
                format!("'{}' does not start with FUNC_BEGIN", function.name),
            ))
        }
        None => {
            return Err(GenerationError::new(
                IrOp::FuncBegin,
                format!("'{}' has an empty body", function.name),
            ))
        }
    }
    if body.len() < 2 || !matches!(body.last(), Some(IrInstr::FuncEnd)) {
        return Err(GenerationError::new(
            IrOp::FuncEnd,
            format!("'{}' does not end with FUNC_END", function.name),
        ));
    }

    function.verify_labels()?;
    let labels = function.label_index()?;
    let recover = Recover {
        instrs: body,
        labels,
    };
    recover.block(1, body.len() - 1, 0)
}

struct Recover<'a> {
    instrs: &'a [IrInstr],
    labels: HashMap<LabelId, usize>,
}

impl<'a> Recover<'a> {
    /// Position of `label`, required to lie strictly inside `(after, end)`
    fn label_within(
        &self,
        label: LabelId,
        after: usize,
        end: usize,
        op: IrOp,
    ) -> Result<usize, GenerationError> {
        match self.labels.get(&label) {
            Some(&pos) if pos > after && pos < end => Ok(pos),
            _ => Err(GenerationError::new(
                op,
                format!("jump to {label} leaves its enclosing block"),
            )),
        }
    }

    /// Recover the instructions in `[start, end)`, `depth` blocks below the function body
    fn block(
        &self,
        start: usize,
        end: usize,
        depth: usize,
    ) -> Result<Vec<Node<'a>>, GenerationError> {
        if depth > MAX_NESTING {
            let op = self.instrs.get(start).map_or(IrOp::FuncEnd, IrInstr::op);
            return Err(GenerationError::new(
                op,
                format!("control flow nested deeper than {MAX_NESTING} blocks"),
            ));
        }
        let mut nodes = Vec::new();
        let mut i = start;
        while i < end {
            let instr = &self.instrs[i];
            match instr {
                IrInstr::Label(head) => {
                    let (node, next) = self.while_loop(*head, i, end, depth)?;
                    nodes.push(node);
                    i = next;
                }
                IrInstr::JumpIfFalse { cond, target } => {
                    let (node, next) = self.if_stmt(cond, *target, i, end, depth)?;
                    nodes.push(node);
                    i = next;
                }
                IrInstr::Jump(target) => {
                    return Err(GenerationError::new(
                        IrOp::Jump,
                        format!("JUMP {target} is not part of an if/else or while shape"),
                    ))
                }
                IrInstr::FuncBegin { .. } | IrInstr::FuncEnd => {
                    return Err(GenerationError::new(
                        instr.op(),
                        "function boundary inside a function body",
                    ))
                }
                _ => {
                    nodes.push(Node::Simple(instr));
                    i += 1;
                }
            }
        }
        Ok(nodes)
    }

    /// `LABEL head; JUMPIFFALSE c exit; body; JUMP head; LABEL exit`
    fn while_loop(
        &self,
        head: LabelId,
        at: usize,
        end: usize,
        depth: usize,
    ) -> Result<(Node<'a>, usize), GenerationError> {
        let Some(IrInstr::JumpIfFalse { cond, target: exit }) = self.instrs.get(at + 1) else {
            return Err(GenerationError::new(
                IrOp::Label,
                format!("LABEL {head} is not the head of a while loop"),
            ));
        };
        let exit_pos = self.label_within(*exit, at + 1, end, IrOp::JumpIfFalse)?;
        match &self.instrs[exit_pos - 1] {
            IrInstr::Jump(back) if *back == head && exit_pos - 1 > at + 1 => {}
            _ => {
                return Err(GenerationError::new(
                    IrOp::Label,
                    format!("while loop at {head} does not jump back before {exit}"),
                ))
            }
        }
        let body = self.block(at + 2, exit_pos - 1, depth + 1)?;
        Ok((Node::While { cond, body }, exit_pos + 1))
    }

    /// `JUMPIFFALSE c else; then; [JUMP end; LABEL else; else...; LABEL end | LABEL else]`
    fn if_stmt(
        &self,
        cond: &'a IrExpr,
        else_label: LabelId,
        at: usize,
        end: usize,
        depth: usize,
    ) -> Result<(Node<'a>, usize), GenerationError> {
        let else_pos = self.label_within(else_label, at, end, IrOp::JumpIfFalse)?;

        if else_pos > at + 1 {
            if let IrInstr::Jump(end_label) = &self.instrs[else_pos - 1] {
                let end_pos = self.label_within(*end_label, else_pos, end, IrOp::Jump)?;
                let then_branch = self.block(at + 1, else_pos - 1, depth + 1)?;
                let else_branch = self.block(else_pos + 1, end_pos, depth + 1)?;
                return Ok((
                    Node::If {
                        cond,
                        then_branch,
                        else_branch: Some(else_branch),
                    },
                    end_pos + 1,
                ));
            }
        }

        let then_branch = self.block(at + 1, else_pos, depth + 1)?;
        Ok((
            Node::If {
                cond,
                then_branch,
                else_branch: None,
            },
            else_pos + 1,
        ))
    }
}
