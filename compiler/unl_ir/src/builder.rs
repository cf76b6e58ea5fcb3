//! Builder for in-progress sequence IR functions.

use crate::ir::{
    BlockId, Const, Operand, SeqBlock, SeqFunction, SeqInstr, SeqTerminator, SeqValue, SeqVar,
    VarId, VarKind,
};
use crate::lower::LowerError;
use crate::types::{MethodRef, ParamMode, TypeRef};

/// In-progress basic block.
struct BlockBuilder {
    id: BlockId,
    body: Vec<SeqInstr>,
    terminator: Option<SeqTerminator>,
}

impl BlockBuilder {
    fn new(id: BlockId) -> Self {
        Self {
            id,
            body: Vec::new(),
            terminator: None,
        }
    }
}

/// Builder for one generated method body.
///
/// Position at a block, emit instructions, terminate. Blocks are laid out
/// in creation order when lowered, so creating the loop header before the
/// loop body keeps fall-through edges free.
pub struct SeqBuilder {
    blocks: Vec<BlockBuilder>,
    current_block: BlockId,
    vars: Vec<SeqVar>,
    next_param: u16,
}

impl Default for SeqBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SeqBuilder {
    /// Create a builder with the entry block allocated and selected.
    pub fn new() -> Self {
        Self {
            blocks: vec![BlockBuilder::new(BlockId::new(0))],
            current_block: BlockId::new(0),
            vars: Vec::new(),
            next_param: 0,
        }
    }

    // Block management

    #[expect(
        clippy::cast_possible_truncation,
        reason = "block indices never exceed u32"
    )]
    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(BlockBuilder::new(id));
        id
    }

    pub fn position_at(&mut self, block: BlockId) {
        debug_assert!(
            block.index() < self.blocks.len(),
            "BlockId {} out of bounds (have {} blocks)",
            block.raw(),
            self.blocks.len(),
        );
        self.current_block = block;
    }

    #[inline]
    pub fn current_block(&self) -> BlockId {
        self.current_block
    }

    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.blocks[self.current_block.index()].terminator.is_some()
    }

    #[inline]
    pub fn entry_block(&self) -> BlockId {
        BlockId::new(0)
    }

    // Variables

    #[expect(
        clippy::cast_possible_truncation,
        reason = "variable indices never exceed u32"
    )]
    fn push_var(&mut self, ty: TypeRef, kind: VarKind) -> VarId {
        let id = VarId::new(self.vars.len() as u32);
        self.vars.push(SeqVar { id, ty, kind });
        id
    }

    /// Declare the next parameter. Parameters take argument slots in the
    /// order they are declared.
    pub fn param(&mut self, name: impl Into<String>, ty: TypeRef, mode: ParamMode) -> VarId {
        self.declare_param(name.into(), ty, mode, None)
    }

    /// Declare an optional by-value parameter with a constant default.
    pub fn param_with_default(
        &mut self,
        name: impl Into<String>,
        ty: TypeRef,
        default: Const,
    ) -> VarId {
        self.declare_param(name.into(), ty, ParamMode::Value, Some(default))
    }

    fn declare_param(
        &mut self,
        name: String,
        ty: TypeRef,
        mode: ParamMode,
        default: Option<Const>,
    ) -> VarId {
        let index = self.next_param;
        self.next_param += 1;
        self.push_var(
            ty,
            VarKind::Param {
                index,
                name,
                mode,
                default,
            },
        )
    }

    /// Allocate a fresh mutable local.
    pub fn local(&mut self, ty: TypeRef) -> VarId {
        self.push_var(ty, VarKind::Local)
    }

    pub fn var_type(&self, var: VarId) -> Option<&TypeRef> {
        self.vars.get(var.index()).map(|v| &v.ty)
    }

    // Instruction emission

    fn push(&mut self, instr: SeqInstr) {
        let block = &mut self.blocks[self.current_block.index()];
        debug_assert!(
            block.terminator.is_none(),
            "emitting into terminated block {}",
            self.current_block.raw()
        );
        block.body.push(instr);
    }

    pub fn emit_assign(&mut self, dst: VarId, value: SeqValue) {
        self.push(SeqInstr::Assign { dst, value });
    }

    /// Assign `value` to a fresh local of type `ty`.
    pub fn emit_let(&mut self, ty: TypeRef, value: SeqValue) -> VarId {
        let dst = self.local(ty);
        self.emit_assign(dst, value);
        dst
    }

    /// Call `method`, binding a non-void result to a fresh local.
    pub fn emit_call(&mut self, method: MethodRef, args: Vec<Operand>) -> Option<VarId> {
        let dst = (!method.ret.is_void()).then(|| self.local(method.ret.clone()));
        self.push(SeqInstr::Call { dst, method, args });
        dst
    }

    /// Call a method whose result the caller needs.
    pub fn emit_call_value(
        &mut self,
        method: MethodRef,
        args: Vec<Operand>,
    ) -> Result<VarId, LowerError> {
        if method.ret.is_void() {
            return Err(LowerError::VoidResult {
                method: method.to_string(),
            });
        }
        let dst = self.local(method.ret.clone());
        self.emit_call_into(dst, method, args);
        Ok(dst)
    }

    /// Call `method` and store its result into an existing variable.
    pub fn emit_call_into(&mut self, dst: VarId, method: MethodRef, args: Vec<Operand>) {
        self.push(SeqInstr::Call {
            dst: Some(dst),
            method,
            args,
        });
    }

    /// Call `method` for its effect, discarding any result.
    pub fn emit_call_void(&mut self, method: MethodRef, args: Vec<Operand>) {
        self.push(SeqInstr::Call {
            dst: None,
            method,
            args,
        });
    }

    /// Construct a new value of the ctor's owner type into a fresh local.
    pub fn emit_construct(&mut self, ctor: MethodRef, args: Vec<Operand>) -> VarId {
        let dst = self.local(ctor.owner.clone());
        self.push(SeqInstr::Construct { dst, ctor, args });
        dst
    }

    /// Run a constructor on the storage of `target`.
    pub fn emit_init_in_place(&mut self, target: VarId, ctor: MethodRef, args: Vec<Operand>) {
        self.push(SeqInstr::InitInPlace { target, ctor, args });
    }

    /// Reset `target` to its type's default value.
    pub fn emit_init_default(&mut self, target: VarId) {
        self.push(SeqInstr::InitDefault { target });
    }

    // Terminators

    fn terminate(&mut self, terminator: SeqTerminator) {
        let block = &mut self.blocks[self.current_block.index()];
        debug_assert!(
            block.terminator.is_none(),
            "block {} already terminated",
            self.current_block.raw()
        );
        block.terminator = Some(terminator);
    }

    pub fn terminate_return(&mut self, value: Option<VarId>) {
        self.terminate(SeqTerminator::Return { value });
    }

    pub fn terminate_jump(&mut self, target: BlockId) {
        self.terminate(SeqTerminator::Jump { target });
    }

    pub fn terminate_branch(&mut self, cond: VarId, then_block: BlockId, else_block: BlockId) {
        self.terminate(SeqTerminator::Branch {
            cond,
            then_block,
            else_block,
        });
    }

    pub fn terminate_throw_argument_null(&mut self, param: impl Into<String>) {
        self.terminate(SeqTerminator::ThrowArgumentNull {
            param: param.into(),
        });
    }

    // Finalization

    /// Consume the builder and produce the finished function.
    ///
    /// Every block must be terminated.
    pub fn finish(
        self,
        name: impl Into<String>,
        return_type: TypeRef,
    ) -> Result<SeqFunction, LowerError> {
        let name = name.into();
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for bb in self.blocks {
            let Some(terminator) = bb.terminator else {
                return Err(LowerError::UnterminatedBlock {
                    function: name,
                    block: bb.id.raw(),
                });
            };
            blocks.push(SeqBlock {
                id: bb.id,
                body: bb.body,
                terminator,
            });
        }
        Ok(SeqFunction {
            name,
            vars: self.vars,
            blocks,
            return_type,
        })
    }
}

#[cfg(test)]
mod tests;
