use crate::definitions::builtin::{Builtin, CoerceTarget, CompareOp};
use crate::expression::ast::MatchKey;
use crate::foundation::location::Location;
use crate::runtime::interpolate::Curve;
use crate::types::ty::Type;
use crate::types::value::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConstIdx(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkIdx(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TypeIdx(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TableIdx(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LocIdx(pub(crate) u32);

/// Jump targets are op indices within the current chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Op {
    PushConst(ConstIdx),
    /// Push the value of a `let` binding, running its chunk on first use.
    LoadVar(ChunkIdx),

    Call { builtin: Builtin, argc: u32 },
    Compare(CompareOp),

    Jump(u32),
    /// Pops a boolean.
    JumpIfFalse(u32),
    /// Pops a boolean.
    JumpIfTrue(u32),
    /// Keeps and jumps on a non-null top, pops a null.
    JumpIfNotNull(u32),
    /// Keeps and jumps when the top has `ty`, pops otherwise.
    JumpIfType { ty: TypeIdx, target: u32 },
    /// Fails unless the top has the type.
    ExpectType(TypeIdx),
    /// Pops; on success pushes the converted value and jumps.
    TryCoerce { target: CoerceTarget, to: u32 },
    /// Pops and pushes the converted value, or fails.
    Coerce(CoerceTarget),

    /// Pops the input and jumps to the selected branch.
    Match(TableIdx),
    /// Pops the input and jumps to the selected output.
    Step(TableIdx),
    /// Pops the input; jumps to a lone output, or pushes the factor and jumps
    /// to a segment that blends two outputs.
    Interpolate(TableIdx),
    /// Pops `upper`, `lower`, `t`; pushes the blend.
    Blend,
}

#[derive(Debug, Clone)]
pub(crate) enum Table {
    Match {
        index: HashMap<MatchKey, usize>,
        /// One per branch, then the fallback.
        targets: Vec<u32>,
    },
    Step {
        stops: Vec<f64>,
        targets: Vec<u32>,
    },
    Interpolate {
        curve: Curve,
        stops: Vec<f64>,
        /// Code producing output `i` alone.
        single: Vec<u32>,
        /// Code blending outputs `i` and `i + 1`.
        segments: Vec<u32>,
    },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Chunk {
    pub(crate) ops: Vec<Op>,
    /// Source location of each op, parallel to `ops`.
    pub(crate) locs: Vec<LocIdx>,
}

/// Lowered form of one expression. Chunk 0 is the root; every `let` value has
/// its own chunk so it can be evaluated lazily.
#[derive(Debug, Clone, Default)]
pub(crate) struct Program {
    pub(crate) chunks: Vec<Chunk>,
    pub(crate) consts: Vec<Value>,
    pub(crate) types: Vec<Type>,
    pub(crate) tables: Vec<Table>,
    pub(crate) locations: Vec<Location>,
}

impl Program {
    pub(crate) const ROOT: ChunkIdx = ChunkIdx(0);

    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn new_chunk(&mut self) -> ChunkIdx {
        let idx = ChunkIdx(self.chunks.len() as u32);
        self.chunks.push(Chunk::default());
        idx
    }

    pub(crate) fn push_const(&mut self, v: Value) -> ConstIdx {
        let idx = ConstIdx(self.consts.len() as u32);
        self.consts.push(v);
        idx
    }

    pub(crate) fn push_type(&mut self, t: Type) -> TypeIdx {
        let idx = TypeIdx(self.types.len() as u32);
        self.types.push(t);
        idx
    }

    pub(crate) fn push_table(&mut self, t: Table) -> TableIdx {
        let idx = TableIdx(self.tables.len() as u32);
        self.tables.push(t);
        idx
    }

    pub(crate) fn push_location(&mut self, l: Location) -> LocIdx {
        let idx = LocIdx(self.locations.len() as u32);
        self.locations.push(l);
        idx
    }

    pub(crate) fn chunk(&self, c: ChunkIdx) -> &Chunk {
        &self.chunks[c.0 as usize]
    }

    pub(crate) fn table(&self, t: TableIdx) -> &Table {
        &self.tables[t.0 as usize]
    }

    pub(crate) fn ty(&self, t: TypeIdx) -> &Type {
        &self.types[t.0 as usize]
    }

    pub(crate) fn location(&self, l: LocIdx) -> &Location {
        &self.locations[l.0 as usize]
    }

    /// Append `op` to `chunk`; returns its index.
    pub(crate) fn emit(&mut self, chunk: ChunkIdx, op: Op, loc: LocIdx) -> u32 {
        let c = &mut self.chunks[chunk.0 as usize];
        c.ops.push(op);
        c.locs.push(loc);
        (c.ops.len() - 1) as u32
    }

    /// Index the next emitted op will get.
    pub(crate) fn here(&self, chunk: ChunkIdx) -> u32 {
        self.chunk(chunk).ops.len() as u32
    }

    /// Point the jump at `at` to `target`.
    pub(crate) fn patch(&mut self, chunk: ChunkIdx, at: u32, target: u32) {
        match &mut self.chunks[chunk.0 as usize].ops[at as usize] {
            Op::Jump(t)
            | Op::JumpIfFalse(t)
            | Op::JumpIfTrue(t)
            | Op::JumpIfNotNull(t)
            | Op::JumpIfType { target: t, .. }
            | Op::TryCoerce { to: t, .. } => *t = target,
            _ => {}
        }
    }
}
