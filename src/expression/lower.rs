use crate::definitions::builtin::Builtin;
use crate::expression::ast::{BindingId, CallOp, ExprKind, Expression};
use crate::expression::bytecode::{ChunkIdx, LocIdx, Op, Program, Table};
use crate::expression::error::EvalError;
use crate::types::value::Value;
use std::collections::HashMap;

/// Lower a parsed expression into a [`Program`].
///
/// Only fails on nodes a successful parse never produces.
pub(crate) fn lower_program(expr: &Expression) -> Result<Program, EvalError> {
    let mut program = Program::new();
    let root = program.new_chunk();
    let mut lowering = Lowering {
        program: &mut program,
        bindings: HashMap::new(),
    };
    lowering.lower(expr, root)?;
    Ok(program)
}

struct Lowering<'a> {
    program: &'a mut Program,
    bindings: HashMap<BindingId, ChunkIdx>,
}

impl Lowering<'_> {
    fn lower(&mut self, e: &Expression, chunk: ChunkIdx) -> Result<(), EvalError> {
        let loc = self.program.push_location(e.location.clone());
        match &e.kind {
            ExprKind::Literal(v) => {
                self.push_const(chunk, v.clone(), loc);
                Ok(())
            }
            ExprKind::Var { name, binding } => {
                let target = self.bindings.get(binding).copied().ok_or_else(|| {
                    EvalError::new(e.location.clone(), format!("unbound variable \"{name}\""))
                })?;
                self.program.emit(chunk, Op::LoadVar(target), loc);
                Ok(())
            }
            ExprKind::Let { bindings, body } => {
                for b in bindings {
                    let value_chunk = self.program.new_chunk();
                    self.lower(&b.value, value_chunk)?;
                    self.bindings.insert(b.binding, value_chunk);
                }
                self.lower(body, chunk)
            }
            ExprKind::Call { op, args, .. } => self.lower_call(e, op, args, chunk, loc),
            ExprKind::Poison => Err(EvalError::new(
                e.location.clone(),
                "cannot lower a node that failed to parse",
            )),
        }
    }

    fn lower_call(
        &mut self,
        e: &Expression,
        op: &CallOp,
        args: &[Expression],
        chunk: ChunkIdx,
        loc: LocIdx,
    ) -> Result<(), EvalError> {
        match op {
            CallOp::Builtin(Builtin::All) => self.lower_short_circuit(args, chunk, loc, false)?,
            CallOp::Builtin(Builtin::Any) => self.lower_short_circuit(args, chunk, loc, true)?,
            CallOp::Builtin(builtin) => {
                for a in args {
                    self.lower(a, chunk)?;
                }
                self.program.emit(
                    chunk,
                    Op::Call {
                        builtin: *builtin,
                        argc: args.len() as u32,
                    },
                    loc,
                );
            }
            CallOp::Compare(cmp) => {
                for a in args {
                    self.lower(a, chunk)?;
                }
                self.program.emit(chunk, Op::Compare(*cmp), loc);
            }
            CallOp::Assert => {
                let ty = self.program.push_type(e.ty.clone());
                self.lower_first_of(
                    args,
                    chunk,
                    loc,
                    Op::JumpIfType { ty, target: 0 },
                    Some(Op::ExpectType(ty)),
                )?;
            }
            CallOp::Coerce(target) => {
                self.lower_first_of(
                    args,
                    chunk,
                    loc,
                    Op::TryCoerce {
                        target: *target,
                        to: 0,
                    },
                    Some(Op::Coerce(*target)),
                )?;
            }
            CallOp::Coalesce => {
                self.lower_first_of(args, chunk, loc, Op::JumpIfNotNull(0), None)?;
            }
            CallOp::Case => {
                let (fallback, pairs) = split_last(args, e)?;
                let mut ends = Vec::with_capacity(pairs.len() / 2);
                for pair in pairs.chunks(2) {
                    self.lower(&pair[0], chunk)?;
                    let skip = self.program.emit(chunk, Op::JumpIfFalse(0), loc);
                    self.lower(&pair[1], chunk)?;
                    ends.push(self.program.emit(chunk, Op::Jump(0), loc));
                    let next = self.program.here(chunk);
                    self.program.patch(chunk, skip, next);
                }
                self.lower(fallback, chunk)?;
                self.patch_all(chunk, &ends);
            }
            CallOp::Match(spec) => {
                let (input, outputs) = split_first(args, e)?;
                self.lower(input, chunk)?;
                let table = self.program.push_table(Table::Match {
                    index: spec.index.clone(),
                    targets: Vec::new(),
                });
                self.program.emit(chunk, Op::Match(table), loc);
                let targets = self.lower_branches(outputs, chunk, loc)?;
                if let Table::Match { targets: t, .. } = &mut self.program.tables[table.0 as usize] {
                    *t = targets;
                }
            }
            CallOp::Step { stops } => {
                let (input, outputs) = split_first(args, e)?;
                self.lower(input, chunk)?;
                let table = self.program.push_table(Table::Step {
                    stops: stops.clone(),
                    targets: Vec::new(),
                });
                self.program.emit(chunk, Op::Step(table), loc);
                let targets = self.lower_branches(outputs, chunk, loc)?;
                if let Table::Step { targets: t, .. } = &mut self.program.tables[table.0 as usize] {
                    *t = targets;
                }
            }
            CallOp::Interpolate { curve, stops } => {
                let (input, outputs) = split_first(args, e)?;
                self.lower(input, chunk)?;
                let table = self.program.push_table(Table::Interpolate {
                    curve: *curve,
                    stops: stops.clone(),
                    single: Vec::new(),
                    segments: Vec::new(),
                });
                self.program.emit(chunk, Op::Interpolate(table), loc);

                let mut ends = Vec::new();
                let mut single = Vec::with_capacity(outputs.len());
                for out in outputs {
                    single.push(self.program.here(chunk));
                    self.lower(out, chunk)?;
                    ends.push(self.program.emit(chunk, Op::Jump(0), loc));
                }
                let mut segments = Vec::with_capacity(outputs.len().saturating_sub(1));
                for pair in outputs.windows(2) {
                    segments.push(self.program.here(chunk));
                    self.lower(&pair[0], chunk)?;
                    self.lower(&pair[1], chunk)?;
                    self.program.emit(chunk, Op::Blend, loc);
                    ends.push(self.program.emit(chunk, Op::Jump(0), loc));
                }
                self.patch_all(chunk, &ends);
                if let Table::Interpolate {
                    single: s,
                    segments: g,
                    ..
                } = &mut self.program.tables[table.0 as usize]
                {
                    *s = single;
                    *g = segments;
                }
            }
        }
        Ok(())
    }

    fn push_const(&mut self, chunk: ChunkIdx, v: Value, loc: LocIdx) {
        let c = self.program.push_const(v);
        self.program.emit(chunk, Op::PushConst(c), loc);
    }

    /// `all` stops at the first `false`, `any` at the first `true`.
    fn lower_short_circuit(
        &mut self,
        args: &[Expression],
        chunk: ChunkIdx,
        loc: LocIdx,
        stop_on: bool,
    ) -> Result<(), EvalError> {
        let mut exits = Vec::with_capacity(args.len());
        for a in args {
            self.lower(a, chunk)?;
            let jump = if stop_on {
                Op::JumpIfTrue(0)
            } else {
                Op::JumpIfFalse(0)
            };
            exits.push(self.program.emit(chunk, jump, loc));
        }
        self.push_const(chunk, Value::Boolean(!stop_on), loc);
        let done = self.program.emit(chunk, Op::Jump(0), loc);
        self.patch_all(chunk, &exits);
        self.push_const(chunk, Value::Boolean(stop_on), loc);
        let end = self.program.here(chunk);
        self.program.patch(chunk, done, end);
        Ok(())
    }

    /// Evaluate `args` in order; `exit_if` follows every argument but the last
    /// and exits with it when it qualifies, `last` follows the last one.
    fn lower_first_of(
        &mut self,
        args: &[Expression],
        chunk: ChunkIdx,
        loc: LocIdx,
        exit_if: Op,
        last: Option<Op>,
    ) -> Result<(), EvalError> {
        let mut exits = Vec::with_capacity(args.len());
        for (i, a) in args.iter().enumerate() {
            self.lower(a, chunk)?;
            if i + 1 < args.len() {
                exits.push(self.program.emit(chunk, exit_if, loc));
            } else if let Some(last) = last {
                self.program.emit(chunk, last, loc);
            }
        }
        self.patch_all(chunk, &exits);
        Ok(())
    }

    /// Lower each output followed by a jump past them all; returns their entry points.
    fn lower_branches(
        &mut self,
        outputs: &[Expression],
        chunk: ChunkIdx,
        loc: LocIdx,
    ) -> Result<Vec<u32>, EvalError> {
        let mut targets = Vec::with_capacity(outputs.len());
        let mut ends = Vec::with_capacity(outputs.len());
        for out in outputs {
            targets.push(self.program.here(chunk));
            self.lower(out, chunk)?;
            ends.push(self.program.emit(chunk, Op::Jump(0), loc));
        }
        self.patch_all(chunk, &ends);
        Ok(targets)
    }

    fn patch_all(&mut self, chunk: ChunkIdx, jumps: &[u32]) {
        let end = self.program.here(chunk);
        for &at in jumps {
            self.program.patch(chunk, at, end);
        }
    }
}

fn split_first<'a>(
    args: &'a [Expression],
    e: &Expression,
) -> Result<(&'a Expression, &'a [Expression]), EvalError> {
    args.split_first()
        .ok_or_else(|| EvalError::new(e.location.clone(), "missing operand"))
}

fn split_last<'a>(
    args: &'a [Expression],
    e: &Expression,
) -> Result<(&'a Expression, &'a [Expression]), EvalError> {
    args.split_last()
        .ok_or_else(|| EvalError::new(e.location.clone(), "missing operand"))
}

#[cfg(test)]
#[path = "../../tests/unit/expression/lower.rs"]
mod tests;
