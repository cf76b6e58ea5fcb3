//! Stack-discipline verification of lowered bodies.

use crate::body::{MethodBody, Op};

use super::LowerError;

/// `(pops, pushes)` of one instruction.
fn stack_effect(op: &Op, returns_value: bool) -> (usize, usize) {
    match op {
        Op::LdArg(_)
        | Op::LdArgA(_)
        | Op::LdLoc(_)
        | Op::LdLocA(_)
        | Op::LdcI4(_)
        | Op::LdcI8(_)
        | Op::LdcR4(_)
        | Op::LdcR8(_)
        | Op::LdNull => (0, 1),
        Op::StArg(_)
        | Op::StLoc(_)
        | Op::Pop
        | Op::InitObj(_)
        | Op::BrTrue(_)
        | Op::BrFalse(_) => (1, 0),
        Op::Add | Op::Sub | Op::Mul | Op::Div | Op::DivUn | Op::Clt | Op::Cgt | Op::Ceq => (2, 1),
        Op::Conv(_) | Op::LdLen | Op::LdObj(_) => (1, 1),
        Op::LdElem(_) | Op::LdElemA(_) => (2, 1),
        Op::StObj(_) => (2, 0),
        Op::Call(m) | Op::CallVirt(m) => (m.pops(), m.pushes()),
        Op::NewObj(m) => (m.arity, 1),
        Op::Dup => (1, 2),
        Op::Br(_) | Op::ThrowArgumentNull(_) => (0, 0),
        Op::Ret => (usize::from(returns_value), 0),
    }
}

/// Record `depth` as the stack depth on entry to `at`.
///
/// Returns `true` the first time `at` is reached. Every later edge into
/// `at` must arrive with the same depth.
fn record(depth_at: &mut [Option<u16>], at: usize, depth: u16) -> Result<bool, LowerError> {
    let Some(slot) = depth_at.get_mut(at) else {
        return Err(LowerError::FallsOffEnd);
    };
    match *slot {
        None => {
            *slot = Some(depth);
            Ok(true)
        }
        Some(seen) if seen == depth => Ok(false),
        Some(seen) => Err(LowerError::InconsistentStack {
            at,
            expected: seen,
            found: depth,
        }),
    }
}

/// Walk every reachable path and return the deepest stack reached.
///
/// Fails on underflow, on a label reached with two different depths, on a
/// `ret` that leaves values behind, and on control falling off the end.
/// Edges are checked when they are recorded, so a merge conflict is
/// reported before the merge target itself is examined.
#[expect(
    clippy::cast_possible_truncation,
    reason = "stack depth is bounded by instruction count, far below u16::MAX"
)]
pub fn verify(body: &MethodBody, returns_value: bool) -> Result<u16, LowerError> {
    let mut depth_at: Vec<Option<u16>> = vec![None; body.ops.len()];
    record(&mut depth_at, 0, 0)?;
    let mut work = vec![(0usize, 0u16)];
    let mut max = 0u16;

    while let Some((at, depth)) = work.pop() {
        let Some(op) = body.ops.get(at) else {
            return Err(LowerError::FallsOffEnd);
        };

        let (pops, pushes) = stack_effect(op, returns_value);
        let remaining = usize::from(depth)
            .checked_sub(pops)
            .ok_or(LowerError::StackUnderflow { at })?;
        let after = (remaining + pushes) as u16;
        max = max.max(after).max(depth);

        if matches!(op, Op::Ret) && remaining != 0 {
            return Err(LowerError::BadReturnDepth {
                at,
                depth: remaining as u16,
            });
        }
        if let Some(target) = op.target() {
            if record(&mut depth_at, target.index(), after)? {
                work.push((target.index(), after));
            }
        }
        if op.falls_through() && record(&mut depth_at, at + 1, after)? {
            work.push((at + 1, after));
        }
    }
    Ok(max)
}
