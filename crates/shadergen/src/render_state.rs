use std::any::Any;

use crate::error::ShaderGenError;
use crate::material::Pass;
use crate::program::ProgramSet;

/// One composable stage of shader generation.
///
/// Stages run in ascending [`execution_order`](SubRenderState::execution_order).
/// Each gets to resolve its parameters, declare library dependencies and
/// append invocations to the entry functions.
pub trait SubRenderState: Any {
    fn type_name(&self) -> &'static str;

    fn execution_order(&self) -> i32;

    /// Inspect the source pass. Returning `false` keeps the stage out of
    /// the render state.
    fn pre_add_to_render_state(&mut self, _src_pass: &Pass) -> bool {
        true
    }

    fn resolve_parameters(&mut self, programs: &mut ProgramSet) -> Result<(), ShaderGenError>;

    fn resolve_dependencies(&mut self, programs: &mut ProgramSet) -> Result<(), ShaderGenError>;

    fn add_function_invocations(&mut self, programs: &mut ProgramSet)
    -> Result<(), ShaderGenError>;

    /// Push per-pass constants before drawing.
    fn update_gpu_program_params(&mut self, _pass: &mut Pass) {}

    fn as_any(&self) -> &dyn Any;
}

/// Creates stages for passes that need them.
pub trait SubRenderStateFactory {
    fn type_name(&self) -> &'static str;

    /// A prepared stage for `pass`, or `None` when the pass doesn't need it.
    fn create_for_pass(&self, pass: &Pass) -> Option<Box<dyn SubRenderState>>;
}

/// Ordered collection of stages generating one pass's programs.
#[derive(Default)]
pub struct RenderState {
    stages: Vec<Box<dyn SubRenderState>>,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed-function stages for `pass`, extended by whatever `factories`
    /// accept it.
    pub fn for_pass(pass: &Pass, factories: &[&dyn SubRenderStateFactory]) -> Self {
        let mut state = Self::new();
        state.add_sub_render_state(Box::new(crate::ffp::FfpTransform::new()), pass);
        state.add_sub_render_state(Box::new(crate::ffp::FfpColour::new()), pass);
        state.add_sub_render_state(Box::new(crate::ffp::FfpTexturing::new()), pass);
        for factory in factories {
            if let Some(stage) = factory.create_for_pass(pass) {
                tracing::debug!(pass = %pass.name, stage = factory.type_name(), "stage added");
                state.stages.push(stage);
            }
        }
        state
    }

    /// Add `stage` if it accepts `src_pass`. Returns whether it was added.
    pub fn add_sub_render_state(
        &mut self,
        mut stage: Box<dyn SubRenderState>,
        src_pass: &Pass,
    ) -> bool {
        if !stage.pre_add_to_render_state(src_pass) {
            tracing::debug!(pass = %src_pass.name, stage = stage.type_name(), "stage skipped");
            return false;
        }
        self.stages.push(stage);
        true
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn type_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.type_name()).collect()
    }

    /// First stage of concrete type `T`.
    pub fn find_stage<T: SubRenderState>(&self) -> Option<&T> {
        self.stages
            .iter()
            .find_map(|s| s.as_any().downcast_ref::<T>())
    }

    /// Run every stage, in execution order, against a fresh program pair.
    pub fn build_programs(&mut self) -> Result<ProgramSet, ShaderGenError> {
        let _span = tracing::info_span!("build_programs", stages = self.stages.len()).entered();
        self.stages.sort_by_key(|s| s.execution_order());

        let mut programs = ProgramSet::new();
        for stage in self.stages.iter_mut() {
            stage.resolve_parameters(&mut programs)?;
            stage.resolve_dependencies(&mut programs)?;
            stage.add_function_invocations(&mut programs)?;
            tracing::trace!(stage = stage.type_name(), "stage applied");
        }
        Ok(programs)
    }

    pub fn update_gpu_program_params(&mut self, pass: &mut Pass) {
        for stage in self.stages.iter_mut() {
            stage.update_gpu_program_params(pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffp::{FfpColour, FfpTexturing, FfpTransform};
    use crate::material::{TextureType, TextureUnitState};

    #[test]
    fn untextured_pass_skips_texturing() {
        let pass = Pass::new("plain");
        let state = RenderState::for_pass(&pass, &[]);
        assert_eq!(state.len(), 2);
        assert!(state.find_stage::<FfpTexturing>().is_none());
    }

    #[test]
    fn stages_build_in_execution_order() {
        let pass = Pass::new("p").with_texture_unit(TextureUnitState::new("a.png"));
        let mut state = RenderState::new();
        state.add_sub_render_state(Box::new(FfpTexturing::new()), &pass);
        state.add_sub_render_state(Box::new(FfpColour::new()), &pass);
        state.add_sub_render_state(Box::new(FfpTransform::new()), &pass);
        state.build_programs().unwrap();
        assert_eq!(
            state.type_names(),
            ["FFP_Transform", "FFP_Colour", "FFP_Texturing"]
        );
    }

    #[test]
    fn find_stage_downcasts() {
        let pass = Pass::new("p")
            .with_texture_unit(TextureUnitState::new("a.png"))
            .with_texture_unit(TextureUnitState::new("sky").with_type(TextureType::Cube));
        let state = RenderState::for_pass(&pass, &[]);
        let texturing = state.find_stage::<FfpTexturing>().unwrap();
        assert_eq!(texturing.units(), [0]);
    }
}
