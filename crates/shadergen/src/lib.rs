//! Shader generation: a small program IR assembled by composable stages and
//! written out as WGSL.
//!
//! A [`RenderState`] holds the stages for one [`Pass`]. Building it runs
//! every stage against a fresh [`ProgramSet`]; [`WgslWriter`] then turns
//! the programs into a module together with the binding and vertex-input
//! layout a renderer needs.
//!
//! # Invariants
//! - Stages run in ascending execution order.
//! - Statements within a function run in (group order, internal order).
//! - Every invocation writes exactly one output.

mod error;
pub mod ffp;
mod function;
mod library;
pub mod material;
mod operand;
mod parameter;
mod program;
mod render_state;
pub mod writer;

pub use error::ShaderGenError;
pub use function::Function;
pub use library::LibraryRegistry;
pub use material::{
    GpuProgramParameters, Pass, TextureAddressingMode, TextureType, TextureUnitState,
    UvwAddressingMode,
};
pub use operand::{FunctionInvocation, OpMask, Operand, OperandSemantic};
pub use parameter::{
    Content, GpuConstantType, ParamList, ParamRef, Parameter, Semantic, UniformParameter,
    Variability,
};
pub use program::{Program, ProgramSet, ProgramStage};
pub use render_state::{RenderState, SubRenderState, SubRenderStateFactory};
pub use writer::{GeneratedShader, UniformBinding, UniformSlot, VertexInputSlot, WgslWriter};

pub fn crate_info() -> &'static str {
    "gamekit-shadergen v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("shadergen"));
    }
}
