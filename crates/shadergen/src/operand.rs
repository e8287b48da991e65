use bitflags::bitflags;

use crate::parameter::ParamRef;

bitflags! {
    /// Component mask applied to an operand.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpMask: u8 {
        const X = 1 << 0;
        const Y = 1 << 1;
        const Z = 1 << 2;
        const W = 1 << 3;
        const XY = Self::X.bits() | Self::Y.bits();
        const ALL = Self::X.bits() | Self::Y.bits() | Self::Z.bits() | Self::W.bits();
    }
}

impl OpMask {
    /// Single-component mask for lane `i` (0 = x ... 3 = w).
    pub fn component(i: usize) -> Self {
        match i {
            0 => Self::X,
            1 => Self::Y,
            2 => Self::Z,
            _ => Self::W,
        }
    }

    /// WGSL swizzle suffix, empty for the full mask.
    pub fn swizzle(self) -> String {
        if self.is_empty() || self == Self::ALL {
            return String::new();
        }
        let mut s = String::from(".");
        for (flag, c) in [(Self::X, 'x'), (Self::Y, 'y'), (Self::Z, 'z'), (Self::W, 'w')] {
            if self.contains(flag) {
                s.push(c);
            }
        }
        s
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSemantic {
    In,
    Out,
    InOut,
}

/// One argument of a function invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub param: ParamRef,
    pub semantic: OperandSemantic,
    pub mask: OpMask,
    /// Non-zero when this operand indexes the preceding operand.
    pub indirection_level: u16,
}

/// A call emitted into a function body, ordered by group then internal order.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInvocation {
    pub function_name: String,
    pub group_order: i32,
    pub internal_order: i32,
    pub operands: Vec<Operand>,
}

impl FunctionInvocation {
    pub fn new(function_name: impl Into<String>, group_order: i32, internal_order: i32) -> Self {
        Self {
            function_name: function_name.into(),
            group_order,
            internal_order,
            operands: Vec::new(),
        }
    }

    pub fn operand(mut self, param: ParamRef, semantic: OperandSemantic, mask: OpMask) -> Self {
        self.operands.push(Operand {
            param,
            semantic,
            mask,
            indirection_level: 0,
        });
        self
    }

    /// Push an operand used as an index into the previous operand.
    pub fn indexed_operand(
        mut self,
        param: ParamRef,
        semantic: OperandSemantic,
        mask: OpMask,
        indirection_level: u16,
    ) -> Self {
        self.operands.push(Operand {
            param,
            semantic,
            mask,
            indirection_level,
        });
        self
    }

    pub fn input(self, param: ParamRef) -> Self {
        self.operand(param, OperandSemantic::In, OpMask::ALL)
    }

    pub fn output(self, param: ParamRef) -> Self {
        self.operand(param, OperandSemantic::Out, OpMask::ALL)
    }
}
