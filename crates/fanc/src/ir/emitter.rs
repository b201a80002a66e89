//! Instruction stream with fresh register and label allocation

use super::inst::*;

/// A string constant placed in the global section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringConstant {
    /// Global name including the sigil: `@.str0`
    pub name: String,
    /// Array length, terminating NUL included
    pub len: usize,
}

/// Accumulates globals and function bodies in emission order.
///
/// The buffer tracks whether the current basic block has been terminated.
/// Falling through into a label inserts the branch LLVM requires, and
/// emitting past a terminator (code after `return` or `break`) opens a fresh,
/// unreachable block.
pub struct CodeBuffer {
    module: IrModule,
    current: Option<IrFunction>,
    next_register: u32,
    next_label: u32,
    next_string: u32,
    terminated: bool,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self {
            module: IrModule::new(),
            current: None,
            next_register: 0,
            next_label: 0,
            next_string: 0,
            terminated: false,
        }
    }

    pub fn fresh_register(&mut self) -> Register {
        let reg = Register(self.next_register);
        self.next_register += 1;
        reg
    }

    pub fn fresh_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Append a line of top-level text
    pub fn emit_global(&mut self, line: impl Into<String>) {
        self.module.globals.push(line.into());
    }

    /// Add a NUL-terminated string constant to the global section
    pub fn add_string(&mut self, value: &str) -> StringConstant {
        let name = format!("@.str{}", self.next_string);
        self.next_string += 1;

        let len = value.len() + 1;
        self.emit_global(format!(
            "{} = internal constant [{} x i8] c\"{}\\00\"",
            name,
            len,
            escape_bytes(value.as_bytes())
        ));

        StringConstant { name, len }
    }

    pub fn begin_function(&mut self, name: &str, return_type: IrType, params: Vec<IrType>) {
        self.end_function();
        self.current = Some(IrFunction::new(name, return_type, params));
        self.terminated = false;
    }

    pub fn end_function(&mut self) {
        if let Some(func) = self.current.take() {
            self.module.functions.push(func);
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn emit(&mut self, inst: Inst) {
        if let Inst::Label(label) = inst {
            self.emit_label(label);
            return;
        }

        if self.terminated {
            let label = self.fresh_label();
            self.push(Inst::Label(label));
        }

        self.terminated = inst.is_terminator();
        self.push(inst);
    }

    /// Start a new basic block, branching to it if control falls through
    pub fn emit_label(&mut self, label: Label) {
        if !self.terminated {
            self.push(Inst::Branch(label));
        }
        self.push(Inst::Label(label));
        self.terminated = false;
    }

    /// Close any open function and return the assembled module
    pub fn finish(mut self) -> IrModule {
        self.end_function();
        self.module
    }

    fn push(&mut self, inst: Inst) {
        if let Some(func) = &mut self.current {
            func.body.push(inst);
        }
    }
}

impl Default for CodeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Render bytes as the body of an LLVM `c"..."` literal
fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if (b.is_ascii_graphic() && b != b'"' && b != b'\\') || b == b' ' {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("\\{:02X}", b));
        }
    }
    out
}
