//! Recording in-memory [`GpuDevice`] used by the unit tests.
//!
//! Compile fails when the source contains [`COMPILE_FAIL_TOKEN`]; link fails
//! when any attached stage's source contained [`LINK_FAIL_TOKEN`]. Double
//! releases and releases of unknown handles panic so leaks and dangling
//! handles show up as test failures.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;

use crate::gpu::{FramebufferHandle, GpuDevice, OffscreenHandles, ProgramHandle, StageHandle, TextureHandle};
use crate::stage::StageKind;

pub(crate) const COMPILE_FAIL_TOKEN: &str = "FAIL_COMPILE";
pub(crate) const LINK_FAIL_TOKEN: &str = "FAIL_LINK";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GpuOp {
    Viewport(u32, u32),
    BindDefault,
    Clear,
    BindProgram(u32),
    Draw,
    Capture { framebuffer: u32, width: u32, height: u32 },
    BindTexture(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UniformValue {
    F32(f32),
    I32(i32),
    Vec2([f32; 2]),
}

#[derive(Default)]
struct FakeState {
    next_id: u32,
    stages: HashMap<u32, bool>,
    programs: HashSet<u32>,
    offscreens: HashSet<u32>,
    offscreens_created: usize,
    ops: Vec<GpuOp>,
    uniforms: Vec<(u32, String, UniformValue)>,
}

impl FakeState {
    fn alloc(&mut self) -> NonZeroU32 {
        self.next_id += 1;
        NonZeroU32::new(self.next_id).expect("fake ids start at 1")
    }
}

pub(crate) struct FakeDevice {
    state: RefCell<FakeState>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(FakeState::default()),
        }
    }

    pub fn live_stages(&self) -> usize {
        self.state.borrow().stages.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_offscreens(&self) -> usize {
        self.state.borrow().offscreens.len()
    }

    pub fn offscreens_created(&self) -> usize {
        self.state.borrow().offscreens_created
    }

    pub fn ops(&self) -> Vec<GpuOp> {
        self.state.borrow().ops.clone()
    }

    pub fn clear_recordings(&self) {
        let mut state = self.state.borrow_mut();
        state.ops.clear();
        state.uniforms.clear();
    }

    pub fn uniforms_for(&self, program: u32) -> Vec<(String, UniformValue)> {
        self.state
            .borrow()
            .uniforms
            .iter()
            .filter(|(owner, _, _)| *owner == program)
            .map(|(_, name, value)| (name.clone(), value.clone()))
            .collect()
    }

    fn record(&self, op: GpuOp) {
        self.state.borrow_mut().ops.push(op);
    }
}

impl GpuDevice for FakeDevice {
    fn compile_stage(&self, _kind: StageKind, source: &str) -> Result<StageHandle, String> {
        if source.contains(COMPILE_FAIL_TOKEN) {
            return Err("fake compile error".into());
        }
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        state.stages.insert(id.get(), source.contains(LINK_FAIL_TOKEN));
        Ok(StageHandle::new(id))
    }

    fn release_stage(&self, stage: StageHandle) {
        let mut state = self.state.borrow_mut();
        assert!(
            state.stages.remove(&stage.raw()).is_some(),
            "released unknown or already-released stage {}",
            stage.raw()
        );
    }

    fn link_program(&self, stages: &[&StageHandle]) -> Result<ProgramHandle, String> {
        let mut state = self.state.borrow_mut();
        for stage in stages {
            assert!(
                state.stages.contains_key(&stage.raw()),
                "linked against released stage {}",
                stage.raw()
            );
        }
        if stages.iter().any(|stage| state.stages[&stage.raw()]) {
            return Err("fake link error".into());
        }
        let id = state.alloc();
        state.programs.insert(id.get());
        Ok(ProgramHandle::new(id))
    }

    fn release_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        assert!(
            state.programs.remove(&program.raw()),
            "released unknown or already-released program {}",
            program.raw()
        );
    }

    fn create_offscreen(&self, _width: u32, _height: u32) -> Result<OffscreenHandles, String> {
        let mut state = self.state.borrow_mut();
        let framebuffer = state.alloc();
        let texture = state.alloc();
        state.offscreens.insert(framebuffer.get());
        state.offscreens_created += 1;
        Ok(OffscreenHandles {
            framebuffer: FramebufferHandle::new(framebuffer),
            texture: TextureHandle::new(texture),
        })
    }

    fn release_offscreen(&self, target: OffscreenHandles) {
        let mut state = self.state.borrow_mut();
        assert!(
            state.offscreens.remove(&target.framebuffer.raw()),
            "released unknown or already-released offscreen {}",
            target.framebuffer.raw()
        );
    }

    fn capture_default_target(&self, target: &OffscreenHandles, width: u32, height: u32) {
        self.record(GpuOp::Capture {
            framebuffer: target.framebuffer.raw(),
            width,
            height,
        });
    }

    fn bind_offscreen_texture(&self, target: &OffscreenHandles) {
        self.record(GpuOp::BindTexture(target.texture.raw()));
    }

    fn bind_default_target(&self) {
        self.record(GpuOp::BindDefault);
    }

    fn set_viewport(&self, width: u32, height: u32) {
        self.record(GpuOp::Viewport(width, height));
    }

    fn clear(&self, _color: [f32; 4]) {
        self.record(GpuOp::Clear);
    }

    fn bind_program(&self, program: &ProgramHandle) {
        self.record(GpuOp::BindProgram(program.raw()));
    }

    fn draw_fullscreen(&self) {
        self.record(GpuOp::Draw);
    }

    fn set_uniform_f32(&self, program: &ProgramHandle, name: &str, value: f32) {
        self.state.borrow_mut().uniforms.push((
            program.raw(),
            name.to_string(),
            UniformValue::F32(value),
        ));
    }

    fn set_uniform_i32(&self, program: &ProgramHandle, name: &str, value: i32) {
        self.state.borrow_mut().uniforms.push((
            program.raw(),
            name.to_string(),
            UniformValue::I32(value),
        ));
    }

    fn set_uniform_vec2(&self, program: &ProgramHandle, name: &str, value: [f32; 2]) {
        self.state.borrow_mut().uniforms.push((
            program.raw(),
            name.to_string(),
            UniformValue::Vec2(value),
        ));
    }
}
