//! `IrGenCtx`: the bundle of state threaded through IR Generation, mirroring
//! `SemanticCtx`'s "explicit threading, no globals" discipline (Design
//! Notes, "Global singletons").

use std::collections::HashMap;

use alir_ir::ast::Ast;
use alir_ir::{AstId, BasicBlock, CoreError, DiagnosticSink, Instruction, Module, NodeTypeTable, Span, TempId, Type, Value};

/// One loop/switch frame: where `continue` and `break` jump to. `continue`
/// has no target inside a switch frame.
pub struct LoopFrame {
    pub continue_target: Option<String>,
    pub break_target: String,
}

pub struct IrGenCtx<'a, S: DiagnosticSink> {
    pub ast: &'a Ast,
    pub types: &'a NodeTypeTable,
    pub module: Module,
    pub sink: &'a mut S,
    pub error_count: u32,
    pub filename: String,
    temp_counter: u32,
    label_counter: u32,
    blocks: Vec<BasicBlock>,
    current_block: usize,
    env: Vec<HashMap<String, Value>>,
    loop_stack: Vec<LoopFrame>,
    /// User-level function name → mangled name, for free-function call sites
    /// (method calls mangle via `ClassName_method` instead; see `mangle.rs`).
    function_names: HashMap<String, String>,
    /// Next `flux` suspend-state id to hand out; 0 is reserved for a
    /// resume function's initial entry.
    flux_state_counter: i64,
    /// `(state id, resume-block label)` pairs discovered while lowering a
    /// `flux` body, consumed once to build the resume function's dispatch
    /// `switch`.
    flux_dispatch: Vec<(i64, String)>,
}

impl<'a, S: DiagnosticSink> IrGenCtx<'a, S> {
    pub fn new(ast: &'a Ast, types: &'a NodeTypeTable, filename: impl Into<String>, sink: &'a mut S) -> Self {
        IrGenCtx {
            ast,
            types,
            module: Module::new(),
            sink,
            error_count: 0,
            filename: filename.into(),
            temp_counter: 0,
            label_counter: 0,
            blocks: Vec::new(),
            current_block: 0,
            env: vec![HashMap::new()],
            loop_stack: Vec::new(),
            function_names: HashMap::new(),
            flux_state_counter: 0,
            flux_dispatch: Vec::new(),
        }
    }

    /// Registers a free function's mangled name. Errs with
    /// [`CoreError::DuplicateFunction`] if `name` was already registered —
    /// Semantic's own scan pass should have rejected a duplicate declaration
    /// long before IR Generation's own layout pass runs, so this is an
    /// internal invariant check rather than a user-facing diagnostic.
    pub fn register_function(&mut self, name: impl Into<String>, mangled: impl Into<String>) -> Result<(), CoreError> {
        let name = name.into();
        if self.function_names.contains_key(&name) {
            return Err(CoreError::DuplicateFunction(name));
        }
        self.function_names.insert(name, mangled.into());
        Ok(())
    }

    pub fn function_mangled_name(&self, name: &str) -> Option<&str> {
        self.function_names.get(name).map(|s| s.as_str())
    }

    pub fn node_type(&self, id: AstId) -> Type {
        self.types.expect(id).clone()
    }

    /// Resets all per-function state. Called once before lowering each
    /// `FuncDef` body (including a flux function's resume function).
    pub fn start_function(&mut self) {
        self.blocks.clear();
        self.temp_counter = 0;
        self.label_counter = 0;
        self.current_block = 0;
        self.env = vec![HashMap::new()];
        self.loop_stack.clear();
        self.flux_state_counter = 0;
        self.flux_dispatch.clear();
    }

    /// Hands out the next `flux` suspend-state id (0 is reserved for the
    /// resume function's initial entry, so the first `emit` gets 1).
    pub fn fresh_flux_state(&mut self) -> i64 {
        self.flux_state_counter += 1;
        self.flux_state_counter
    }

    pub fn record_resume_point(&mut self, state: i64, label: impl Into<String>) {
        self.flux_dispatch.push((state, label.into()));
    }

    pub fn take_flux_dispatch(&mut self) -> Vec<(i64, String)> {
        std::mem::take(&mut self.flux_dispatch)
    }

    pub fn fresh_temp(&mut self, ty: Type) -> Value {
        let id = TempId(self.temp_counter);
        self.temp_counter += 1;
        Value::Temp { id, ty }
    }

    pub fn fresh_label(&mut self, prefix: &str) -> String {
        let label = format!("{prefix}_{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    pub fn push_env(&mut self) {
        self.env.push(HashMap::new());
    }

    pub fn pop_env(&mut self) {
        self.env.pop();
    }

    pub fn bind(&mut self, name: impl Into<String>, addr: Value) {
        self.env.last_mut().expect("env stack never empty").insert(name.into(), addr);
    }

    pub fn resolve_addr(&self, name: &str) -> Option<Value> {
        for scope in self.env.iter().rev() {
            if let Some(v) = scope.get(name) {
                return Some(v.clone());
            }
        }
        None
    }

    pub fn new_block(&mut self, label: impl Into<String>) -> usize {
        self.blocks.push(BasicBlock::new(label));
        self.blocks.len() - 1
    }

    pub fn set_current(&mut self, idx: usize) {
        self.current_block = idx;
    }

    pub fn current_block_index(&self) -> usize {
        self.current_block
    }

    pub fn current_block_label(&self) -> &str {
        &self.blocks[self.current_block].label
    }

    pub fn block_label_at(&self, idx: usize) -> &str {
        &self.blocks[idx].label
    }

    pub fn emit(&mut self, instr: Instruction) {
        self.blocks[self.current_block].push(instr);
    }

    pub fn current_has_terminator(&self) -> bool {
        self.blocks[self.current_block].has_terminator()
    }

    pub fn push_loop(&mut self, continue_target: Option<String>, break_target: String) {
        self.loop_stack.push(LoopFrame { continue_target, break_target });
    }

    pub fn pop_loop(&mut self) {
        self.loop_stack.pop();
    }

    pub fn break_target(&self) -> Option<&str> {
        self.loop_stack.last().map(|f| f.break_target.as_str())
    }

    /// Walks outward past any switch frames (whose `continue_target` is
    /// `None`) to the nearest enclosing loop's continue target.
    pub fn continue_target(&self) -> Option<&str> {
        self.loop_stack.iter().rev().find_map(|f| f.continue_target.as_deref())
    }

    pub fn take_blocks(&mut self) -> Vec<BasicBlock> {
        std::mem::take(&mut self.blocks)
    }

    pub fn span(&self, line: u32, col: u32) -> Span {
        Span::new(self.filename.clone(), line, col)
    }

    pub fn error(&mut self, line: u32, col: u32, msg: impl Into<String>) {
        self.error_count += 1;
        let span = self.span(line, col);
        self.sink.error(span, msg.into());
    }

    pub fn warning(&mut self, line: u32, col: u32, msg: impl Into<String>) {
        let span = self.span(line, col);
        self.sink.warning(span, msg.into());
    }
}
