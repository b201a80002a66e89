//! Printable record of every scope and declaration seen during analysis

use crate::types::Type;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    BeginScope,
    EndScope,
    Variable {
        name: String,
        ty: Type,
        offset: i32,
    },
    Function {
        name: String,
        return_type: Type,
        params: Vec<Type>,
    },
}

/// Declarations in the order they were made, nested by scope.
///
/// The trace outlives the scopes it describes, so it can be printed after
/// analysis finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeTrace {
    events: Vec<TraceEvent>,
}

impl ScopeTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_scope(&mut self) {
        self.events.push(TraceEvent::BeginScope);
    }

    pub fn end_scope(&mut self) {
        self.events.push(TraceEvent::EndScope);
    }

    pub fn variable(&mut self, name: &str, ty: Type, offset: i32) {
        self.events.push(TraceEvent::Variable {
            name: name.to_string(),
            ty,
            offset,
        });
    }

    pub fn function(&mut self, name: &str, return_type: Type, params: &[Type]) {
        self.events.push(TraceEvent::Function {
            name: name.to_string(),
            return_type,
            params: params.to_vec(),
        });
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }
}

impl fmt::Display for ScopeTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth = 0usize;

        for event in &self.events {
            if matches!(event, TraceEvent::EndScope) {
                depth = depth.saturating_sub(1);
            }
            let indent = "  ".repeat(depth);

            match event {
                TraceEvent::BeginScope => {
                    writeln!(f, "{}---begin scope---", indent)?;
                    depth += 1;
                }
                TraceEvent::EndScope => writeln!(f, "{}---end scope---", indent)?,
                TraceEvent::Variable { name, ty, offset } => {
                    writeln!(f, "{}{} {} {}", indent, name, ty, offset)?;
                }
                TraceEvent::Function {
                    name,
                    return_type,
                    params,
                } => {
                    let params: Vec<&str> = params.iter().map(|p| p.as_str()).collect();
                    writeln!(f, "{}{} ({})->{} 0", indent, name, params.join(","), return_type)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nested_rendering() {
        let mut trace = ScopeTrace::new();
        trace.function("add", Type::Int, &[Type::Int, Type::Byte]);
        trace.begin_scope();
        trace.variable("a", Type::Int, -1);
        trace.begin_scope();
        trace.variable("x", Type::Bool, 0);
        trace.end_scope();
        trace.end_scope();

        assert_eq!(
            trace.to_string(),
            "add (int,byte)->int 0\n\
             ---begin scope---\n\
             \x20 a int -1\n\
             \x20 ---begin scope---\n\
             \x20   x bool 0\n\
             \x20 ---end scope---\n\
             ---end scope---\n"
        );
    }
}
