use std::collections::{BTreeMap, BTreeSet, VecDeque};
use serde::Serialize;

use rvlite::decoder::{Decoder, Op};
use rvlite::instructions::VIRTUAL_HALT_WORD;
use rvlite::isa::rv32::Rv32Decoder;
use rvlite::regs::ZERO;

use crate::model::{is_mapped, read_u32, Image};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind { Fallthrough, Branch, CondBranch, Call }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge { pub from: u32, pub to: u32, pub kind: EdgeKind }

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub visited: BTreeSet<u32>,
    pub edges: Vec<Edge>,
    /// Addresses where execution stops: halts and `jalr zero, ...` returns.
    pub exits: BTreeSet<u32>,
}

/// Walk every path reachable from `entries`, decoding at most `max_instr`
/// instructions. Indirect jumps end a path; `jalr` with a link register
/// also falls through, since it returns there.
pub fn analyze_entries(img: &Image, entries: &[u32], max_instr: usize) -> Analysis {
    let dec = Rv32Decoder::new();
    let mut queue: VecDeque<u32> = entries.iter().copied().filter(|&e| is_mapped(img, e)).collect();
    let mut out = Analysis::default();
    let push = |out: &mut Analysis, q: &mut VecDeque<u32>, e: Edge| {
        out.edges.push(e);
        if is_mapped(img, e.to) && !out.visited.contains(&e.to) { q.push_back(e.to); }
    };
    while let Some(pc) = queue.pop_front() {
        if out.visited.len() >= max_instr { break; }
        if !out.visited.insert(pc) { continue; }
        let Some(raw) = read_u32(img, pc) else { continue };
        let ft = pc.wrapping_add(4);
        if raw == VIRTUAL_HALT_WORD {
            out.exits.insert(pc);
            continue;
        }
        let Some(d) = dec.decode(raw) else {
            out.exits.insert(pc);
            continue;
        };
        let tgt = pc.wrapping_add(d.imm as u32);
        match d.op {
            Op::Halt => { out.exits.insert(pc); }
            Op::Jal if d.rd == ZERO => push(&mut out, &mut queue, Edge { from: pc, to: tgt, kind: EdgeKind::Branch }),
            Op::Jal => {
                push(&mut out, &mut queue, Edge { from: pc, to: tgt, kind: EdgeKind::Call });
                push(&mut out, &mut queue, Edge { from: pc, to: ft, kind: EdgeKind::Fallthrough });
            }
            Op::Jalr if d.rd == ZERO => { out.exits.insert(pc); }
            Op::Beq | Op::Bne | Op::Blt | Op::Bge | Op::Bltu | Op::Bgeu => {
                push(&mut out, &mut queue, Edge { from: pc, to: tgt, kind: EdgeKind::CondBranch });
                push(&mut out, &mut queue, Edge { from: pc, to: ft, kind: EdgeKind::Fallthrough });
            }
            _ => push(&mut out, &mut queue, Edge { from: pc, to: ft, kind: EdgeKind::Fallthrough }),
        }
    }
    out
}

/// `loc_XXXXXXXX` names for every branch, jump and call target.
pub fn target_labels(a: &Analysis) -> BTreeMap<u32, String> {
    a.edges
        .iter()
        .filter(|e| e.kind != EdgeKind::Fallthrough)
        .map(|e| (e.to, format!("loc_{:08x}", e.to)))
        .collect()
}
