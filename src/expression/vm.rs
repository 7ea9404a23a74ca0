use crate::expression::ast::{Expression, MatchKey};
use crate::expression::bytecode::{Chunk, ChunkIdx, Op, Program, Table};
use crate::expression::error::EvalError;
use crate::expression::lower::lower_program;
use crate::runtime::builtins;
use crate::runtime::context::{EvaluationContext, RuntimeContext};
use crate::runtime::interpolate::{blend, stop_index};
use crate::types::value::Value;

/// Reusable scratch space for evaluation: the value stack and the per-call
/// memo of `let` values.
///
/// Keep one per thread and pass it to
/// [`CompiledExpression::evaluate_with_stack`](crate::CompiledExpression::evaluate_with_stack)
/// to avoid reallocating for every feature.
#[derive(Debug, Default)]
pub struct EvalStack {
    values: Vec<Value>,
    memo: Vec<Option<Value>>,
}

impl EvalStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, chunks: usize) {
        self.values.clear();
        self.memo.clear();
        self.memo.resize(chunks, None);
    }
}

pub(crate) fn run(
    program: &Program,
    stack: &mut EvalStack,
    ctx: &dyn RuntimeContext,
) -> Result<Value, EvalError> {
    stack.reset(program.chunks.len());
    exec(program, Program::ROOT, stack, ctx)?;
    match (stack.values.pop(), stack.values.is_empty()) {
        (Some(v), true) => Ok(v),
        _ => Err(EvalError::new(
            program.locations.first().cloned().unwrap_or_default(),
            "unbalanced stack at end of program",
        )),
    }
}

/// Evaluate a context-independent expression; used for constant folding.
pub(crate) fn evaluate_constant(expr: &Expression) -> Result<Value, EvalError> {
    let program = lower_program(expr)?;
    run(&program, &mut EvalStack::new(), &EvaluationContext::default())
}

fn exec(
    p: &Program,
    chunk: ChunkIdx,
    stack: &mut EvalStack,
    ctx: &dyn RuntimeContext,
) -> Result<(), EvalError> {
    let c = p.chunk(chunk);
    let mut pc = 0usize;

    while pc < c.ops.len() {
        let at = pc;
        let fail = |msg: String| fail_at(p, c, at, msg);
        pc += 1;

        match c.ops[at] {
            Op::PushConst(idx) => {
                let v = p
                    .consts
                    .get(idx.0 as usize)
                    .ok_or_else(|| fail("const idx out of range".to_owned()))?;
                stack.values.push(v.clone());
            }
            Op::LoadVar(target) => {
                let slot = target.0 as usize;
                match stack.memo.get(slot).and_then(Option::as_ref) {
                    Some(v) => {
                        let v = v.clone();
                        stack.values.push(v);
                    }
                    None => {
                        exec(p, target, stack, ctx)?;
                        let v = top(stack).map_err(fail)?.clone();
                        if let Some(m) = stack.memo.get_mut(slot) {
                            *m = Some(v);
                        }
                    }
                }
            }

            Op::Call { builtin, argc } => {
                let start = stack
                    .values
                    .len()
                    .checked_sub(argc as usize)
                    .ok_or_else(|| fail("stack underflow in builtin call".to_owned()))?;
                let out = builtins::call(builtin, &stack.values[start..], ctx).map_err(fail)?;
                stack.values.truncate(start);
                stack.values.push(out);
            }
            Op::Compare(op) => {
                let b = pop(stack).map_err(fail)?;
                let a = pop(stack).map_err(fail)?;
                let r = builtins::compare(op, &a, &b).map_err(fail)?;
                stack.values.push(Value::Boolean(r));
            }

            Op::Jump(target) => pc = target as usize,
            Op::JumpIfFalse(target) => {
                if !pop_bool(stack).map_err(fail)? {
                    pc = target as usize;
                }
            }
            Op::JumpIfTrue(target) => {
                if pop_bool(stack).map_err(fail)? {
                    pc = target as usize;
                }
            }
            Op::JumpIfNotNull(target) => {
                if top(stack).map_err(fail)?.is_null() {
                    stack.values.pop();
                } else {
                    pc = target as usize;
                }
            }
            Op::JumpIfType { ty, target } => {
                if builtins::has_type(top(stack).map_err(fail)?, p.ty(ty)) {
                    pc = target as usize;
                } else {
                    stack.values.pop();
                }
            }
            Op::ExpectType(ty) => {
                let v = top(stack).map_err(fail)?;
                let want = p.ty(ty);
                if !builtins::has_type(v, want) {
                    return Err(fail(builtins::assertion_error(want, v)));
                }
            }
            Op::TryCoerce { target, to } => {
                let v = pop(stack).map_err(fail)?;
                if let Ok(out) = builtins::coerce(target, &v) {
                    stack.values.push(out);
                    pc = to as usize;
                }
            }
            Op::Coerce(target) => {
                let v = pop(stack).map_err(fail)?;
                let out = builtins::coerce(target, &v).map_err(fail)?;
                stack.values.push(out);
            }

            Op::Match(table) => {
                let Table::Match { index, targets } = p.table(table) else {
                    return Err(fail("match table expected".to_owned()));
                };
                let input = pop(stack).map_err(fail)?;
                let branch = MatchKey::of(&input)
                    .and_then(|k| index.get(&k).copied())
                    .unwrap_or(targets.len().saturating_sub(1));
                pc = jump_target(targets, branch).map_err(fail)?;
            }
            Op::Step(table) => {
                let Table::Step { stops, targets } = p.table(table) else {
                    return Err(fail("step table expected".to_owned()));
                };
                let input = pop_number(stack).map_err(fail)?;
                pc = jump_target(targets, stop_index(stops, input)).map_err(fail)?;
            }
            Op::Interpolate(table) => {
                let Table::Interpolate {
                    curve,
                    stops,
                    single,
                    segments,
                } = p.table(table)
                else {
                    return Err(fail("interpolate table expected".to_owned()));
                };
                let input = pop_number(stack).map_err(fail)?;
                let n = stops.len();
                pc = if n == 1 || stops.first().is_some_and(|s| input <= *s) {
                    jump_target(single, 0).map_err(fail)?
                } else if stops.last().is_some_and(|s| input >= *s) {
                    jump_target(single, n - 1).map_err(fail)?
                } else {
                    let i = stop_index(stops, input);
                    let t = curve.factor(input, stops[i], stops[i + 1]);
                    stack.values.push(Value::Number(t));
                    jump_target(segments, i).map_err(fail)?
                };
            }
            Op::Blend => {
                let upper = pop(stack).map_err(fail)?;
                let lower = pop(stack).map_err(fail)?;
                let t = pop_number(stack).map_err(fail)?;
                stack.values.push(blend(&lower, &upper, t).map_err(fail)?);
            }
        }
    }
    Ok(())
}

fn fail_at(p: &Program, c: &Chunk, pc: usize, message: String) -> EvalError {
    let location = c
        .locs
        .get(pc)
        .map(|l| p.location(*l).clone())
        .unwrap_or_default();
    EvalError::new(location, message)
}

fn jump_target(targets: &[u32], i: usize) -> Result<usize, String> {
    targets
        .get(i)
        .map(|t| *t as usize)
        .ok_or_else(|| format!("jump table has no entry {i}"))
}

fn top(stack: &EvalStack) -> Result<&Value, String> {
    stack
        .values
        .last()
        .ok_or_else(|| "stack underflow".to_owned())
}

fn pop(stack: &mut EvalStack) -> Result<Value, String> {
    stack
        .values
        .pop()
        .ok_or_else(|| "stack underflow".to_owned())
}

fn pop_bool(stack: &mut EvalStack) -> Result<bool, String> {
    match pop(stack)? {
        Value::Boolean(b) => Ok(b),
        other => Err(format!(
            "Expected value to be of type boolean, but found {} instead.",
            other.type_of()
        )),
    }
}

fn pop_number(stack: &mut EvalStack) -> Result<f64, String> {
    match pop(stack)? {
        Value::Number(n) => Ok(n),
        other => Err(format!(
            "Expected value to be of type number, but found {} instead.",
            other.type_of()
        )),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/vm.rs"]
mod tests;
