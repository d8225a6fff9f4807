//! OpenGL backend for [`GpuDevice`] built on `glow`.
//!
//! The device must be created after a GL context has been made current on
//! the calling thread, and every method assumes that context is still
//! current; the host keeps the context alive for the device's lifetime.

use glow::HasContext;

use crate::error::RenderError;
use crate::gpu::{FramebufferHandle, GpuDevice, OffscreenHandles, ProgramHandle, StageHandle, TextureHandle};
use crate::stage::StageKind;

/// Two CCW triangles covering the viewport, three floats per vertex.
const CANVAS_VERTS: [f32; 18] = [
    -1.0, 1.0, 0.0, // top-left
    1.0, 1.0, 0.0, // top-right
    1.0, -1.0, 0.0, // bottom-right
    -1.0, -1.0, 0.0, // bottom-left
    -1.0, 1.0, 0.0, // top-left
    1.0, -1.0, 0.0, // bottom-right
];

/// `glow`-backed [`GpuDevice`] that also owns the shared full-screen quad.
pub struct GlDevice {
    gl: glow::Context,
    vao: glow::NativeVertexArray,
    vbo: glow::NativeBuffer,
}

impl GlDevice {
    /// Wraps a current GL context and uploads the full-screen quad.
    pub fn new(gl: glow::Context) -> Result<Self, RenderError> {
        unsafe {
            let vbo = gl
                .create_buffer()
                .map_err(|reason| RenderError::Device { reason })?;
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&CANVAS_VERTS),
                glow::STATIC_DRAW,
            );

            let vao = gl
                .create_vertex_array()
                .map_err(|reason| RenderError::Device { reason })?;
            gl.bind_vertex_array(Some(vao));
            gl.vertex_attrib_pointer_f32(
                0,
                3,
                glow::FLOAT,
                false,
                3 * std::mem::size_of::<f32>() as i32,
                0,
            );
            gl.enable_vertex_attrib_array(0);
            gl.bind_vertex_array(None);

            Ok(Self { gl, vao, vbo })
        }
    }

    /// Releases the quad buffers; the caller drops the GL context afterwards.
    pub fn destroy(self) {
        unsafe {
            self.gl.delete_vertex_array(self.vao);
            self.gl.delete_buffer(self.vbo);
        }
    }

    fn shader(stage: &StageHandle) -> glow::NativeShader {
        glow::NativeShader(stage.id())
    }

    fn program(program: &ProgramHandle) -> glow::NativeProgram {
        glow::NativeProgram(program.id())
    }

    fn framebuffer(handle: &FramebufferHandle) -> glow::NativeFramebuffer {
        glow::NativeFramebuffer(handle.id())
    }

    fn texture(handle: &TextureHandle) -> glow::NativeTexture {
        glow::NativeTexture(handle.id())
    }
}

impl GpuDevice for GlDevice {
    fn compile_stage(&self, kind: StageKind, source: &str) -> Result<StageHandle, String> {
        let gl = &self.gl;
        unsafe {
            let shader_type = match kind {
                StageKind::Vertex => glow::VERTEX_SHADER,
                StageKind::Fragment => glow::FRAGMENT_SHADER,
            };
            let shader = gl.create_shader(shader_type)?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(log);
            }
            Ok(StageHandle::new(shader.0))
        }
    }

    fn release_stage(&self, stage: StageHandle) {
        unsafe {
            self.gl.delete_shader(Self::shader(&stage));
        }
    }

    fn link_program(&self, stages: &[&StageHandle]) -> Result<ProgramHandle, String> {
        let gl = &self.gl;
        unsafe {
            let program = gl.create_program()?;
            for stage in stages {
                gl.attach_shader(program, Self::shader(stage));
            }
            gl.link_program(program);
            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(log);
            }
            for stage in stages {
                gl.detach_shader(program, Self::shader(stage));
            }
            Ok(ProgramHandle::new(program.0))
        }
    }

    fn release_program(&self, program: ProgramHandle) {
        unsafe {
            self.gl.delete_program(Self::program(&program));
        }
    }

    fn create_offscreen(&self, width: u32, height: u32) -> Result<OffscreenHandles, String> {
        let gl = &self.gl;
        unsafe {
            let framebuffer = gl.create_framebuffer()?;
            let texture = gl.create_texture()?;

            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width.max(1) as i32,
                height.max(1) as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                None,
            );

            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );

            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.bind_texture(glow::TEXTURE_2D, None);
            if status != glow::FRAMEBUFFER_COMPLETE {
                gl.delete_framebuffer(framebuffer);
                gl.delete_texture(texture);
                return Err(format!("framebuffer incomplete: 0x{status:x}"));
            }

            Ok(OffscreenHandles {
                framebuffer: FramebufferHandle::new(framebuffer.0),
                texture: TextureHandle::new(texture.0),
            })
        }
    }

    fn release_offscreen(&self, target: OffscreenHandles) {
        unsafe {
            self.gl.delete_framebuffer(Self::framebuffer(&target.framebuffer));
            self.gl.delete_texture(Self::texture(&target.texture));
        }
    }

    fn capture_default_target(&self, target: &OffscreenHandles, width: u32, height: u32) {
        let gl = &self.gl;
        unsafe {
            gl.bind_framebuffer(glow::READ_FRAMEBUFFER, None);
            gl.bind_framebuffer(
                glow::DRAW_FRAMEBUFFER,
                Some(Self::framebuffer(&target.framebuffer)),
            );
            gl.blit_framebuffer(
                0,
                0,
                width as i32,
                height as i32,
                0,
                0,
                width as i32,
                height as i32,
                glow::COLOR_BUFFER_BIT,
                glow::LINEAR,
            );
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }

    fn bind_offscreen_texture(&self, target: &OffscreenHandles) {
        unsafe {
            self.gl
                .bind_texture(glow::TEXTURE_2D, Some(Self::texture(&target.texture)));
        }
    }

    fn bind_default_target(&self) {
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }

    fn set_viewport(&self, width: u32, height: u32) {
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
        }
    }

    fn clear(&self, color: [f32; 4]) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn bind_program(&self, program: &ProgramHandle) {
        unsafe {
            self.gl.use_program(Some(Self::program(program)));
        }
    }

    fn draw_fullscreen(&self) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
            self.gl.draw_arrays(glow::TRIANGLES, 0, 6);
        }
    }

    fn set_uniform_f32(&self, program: &ProgramHandle, name: &str, value: f32) {
        let gl = &self.gl;
        unsafe {
            if let Some(location) = gl.get_uniform_location(Self::program(program), name) {
                gl.uniform_1_f32(Some(&location), value);
            }
        }
    }

    fn set_uniform_i32(&self, program: &ProgramHandle, name: &str, value: i32) {
        let gl = &self.gl;
        unsafe {
            if let Some(location) = gl.get_uniform_location(Self::program(program), name) {
                gl.uniform_1_i32(Some(&location), value);
            }
        }
    }

    fn set_uniform_vec2(&self, program: &ProgramHandle, name: &str, value: [f32; 2]) {
        let gl = &self.gl;
        unsafe {
            if let Some(location) = gl.get_uniform_location(Self::program(program), name) {
                gl.uniform_2_f32(Some(&location), value[0], value[1]);
            }
        }
    }
}
