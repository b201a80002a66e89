//! IR instruction definitions
//!
//! Instructions render as LLVM IR text through their `Display` impls.

use std::fmt;

/// A virtual register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register(pub u32);

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%t{}", self.0)
    }
}

/// A basic block label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub u32);

impl Label {
    /// The label as a branch target or phi predecessor: `%label_3`
    pub fn target(self) -> String {
        format!("%{}", self)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "label_{}", self.0)
    }
}

/// An IR value (operand)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Register(Register),
    Immediate(i64),
    /// Positional function argument: `%0`, `%1`, ...
    Argument(usize),
}

impl From<Register> for Operand {
    fn from(reg: Register) -> Self {
        Operand::Register(reg)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(reg) => write!(f, "{}", reg),
            Operand::Immediate(value) => write!(f, "{}", value),
            Operand::Argument(index) => write!(f, "%{}", index),
        }
    }
}

/// The handful of LLVM types the generated code uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrType {
    I32,
    /// Pointer to character data
    I8Ptr,
    Void,
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::I32 => write!(f, "i32"),
            IrType::I8Ptr => write!(f, "i8*"),
            IrType::Void => write!(f, "void"),
        }
    }
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    And,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opcode = match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::SDiv => "sdiv",
            BinOp::UDiv => "udiv",
            BinOp::And => "and",
        };
        f.write_str(opcode)
    }
}

/// Integer comparison predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

impl fmt::Display for Cmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let predicate = match self {
            Cmp::Eq => "eq",
            Cmp::Ne => "ne",
            Cmp::Slt => "slt",
            Cmp::Sle => "sle",
            Cmp::Sgt => "sgt",
            Cmp::Sge => "sge",
        };
        f.write_str(predicate)
    }
}

/// IR instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Inst {
    /// Start of a basic block
    Label(Label),

    /// dst = frame of `count` i32 slots
    Alloca { dst: Register, count: usize },

    /// dst = &base[offset]
    SlotAddress {
        dst: Register,
        base: Register,
        offset: i32,
    },

    /// dst = address of the first character of a string constant
    StringAddress {
        dst: Register,
        global: String,
        len: usize,
    },

    /// dst = *addr
    Load { dst: Register, addr: Register },

    /// *addr = value
    Store { value: Operand, addr: Register },

    /// dst = lhs op rhs
    Binary {
        dst: Register,
        op: BinOp,
        lhs: Operand,
        rhs: Operand,
    },

    /// dst = lhs cmp rhs, an i1
    Compare {
        dst: Register,
        cmp: Cmp,
        ty: IrType,
        lhs: Operand,
        rhs: Operand,
    },

    /// dst = one of the incoming values, chosen by predecessor block
    Phi {
        dst: Register,
        incoming: Vec<(Operand, Label)>,
    },

    Call {
        dst: Option<Register>,
        return_type: IrType,
        callee: String,
        args: Vec<(IrType, Operand)>,
    },

    Branch(Label),

    CondBranch {
        cond: Register,
        on_true: Label,
        on_false: Label,
    },

    Return(Option<Operand>),
}

impl Inst {
    /// Whether this instruction ends its basic block
    pub fn is_terminator(&self) -> bool {
        matches!(self, Inst::Branch(_) | Inst::CondBranch { .. } | Inst::Return(_))
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inst::Label(label) => write!(f, "{}:", label),

            Inst::Alloca { dst, count } => write!(f, "{} = alloca i32, i32 {}", dst, count),

            Inst::SlotAddress { dst, base, offset } => {
                write!(f, "{} = getelementptr i32, i32* {}, i32 {}", dst, base, offset)
            }

            Inst::StringAddress { dst, global, len } => write!(
                f,
                "{} = getelementptr [{} x i8], [{} x i8]* {}, i32 0, i32 0",
                dst, len, len, global
            ),

            Inst::Load { dst, addr } => write!(f, "{} = load i32, i32* {}", dst, addr),

            Inst::Store { value, addr } => write!(f, "store i32 {}, i32* {}", value, addr),

            Inst::Binary { dst, op, lhs, rhs } => write!(f, "{} = {} i32 {}, {}", dst, op, lhs, rhs),

            Inst::Compare {
                dst,
                cmp,
                ty,
                lhs,
                rhs,
            } => write!(f, "{} = icmp {} {} {}, {}", dst, cmp, ty, lhs, rhs),

            Inst::Phi { dst, incoming } => {
                let incoming: Vec<String> = incoming
                    .iter()
                    .map(|(value, label)| format!("[{}, {}]", value, label.target()))
                    .collect();
                write!(f, "{} = phi i32 {}", dst, incoming.join(", "))
            }

            Inst::Call {
                dst,
                return_type,
                callee,
                args,
            } => {
                if let Some(dst) = dst {
                    write!(f, "{} = ", dst)?;
                }
                let args: Vec<String> =
                    args.iter().map(|(ty, value)| format!("{} {}", ty, value)).collect();
                write!(f, "call {} @{}({})", return_type, callee, args.join(", "))
            }

            Inst::Branch(label) => write!(f, "br label {}", label.target()),

            Inst::CondBranch {
                cond,
                on_true,
                on_false,
            } => write!(
                f,
                "br i1 {}, label {}, label {}",
                cond,
                on_true.target(),
                on_false.target()
            ),

            Inst::Return(Some(value)) => write!(f, "ret i32 {}", value),
            Inst::Return(None) => write!(f, "ret void"),
        }
    }
}

/// IR function
#[derive(Debug, Clone, PartialEq)]
pub struct IrFunction {
    pub name: String,
    pub return_type: IrType,
    pub params: Vec<IrType>,
    pub body: Vec<Inst>,
}

impl IrFunction {
    pub fn new(name: impl Into<String>, return_type: IrType, params: Vec<IrType>) -> Self {
        Self {
            name: name.into(),
            return_type,
            params,
            body: Vec::new(),
        }
    }
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        writeln!(f, "define {} @{}({}) {{", self.return_type, self.name, params.join(", "))?;
        for inst in &self.body {
            match inst {
                Inst::Label(_) => writeln!(f, "{}", inst)?,
                _ => writeln!(f, "  {}", inst)?,
            }
        }
        writeln!(f, "}}")
    }
}

/// IR module (whole program)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IrModule {
    /// Top-level text: declarations, constants and hand-written helpers
    pub globals: Vec<String>,
    pub functions: Vec<IrFunction>,
}

impl IrModule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.globals {
            writeln!(f, "{}", line)?;
        }
        for func in &self.functions {
            writeln!(f)?;
            write!(f, "{}", func)?;
        }
        Ok(())
    }
}
