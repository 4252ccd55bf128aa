use epo::error::{InitError, RenderError};
use epo::shader::{EmergenceUniforms, ShaderDialect, ShaderSource};
use epo::surface::GpuSurface;
use wasm_bindgen::JsCast;
use web_sys::{WebGlBuffer, WebGlProgram, WebGlRenderingContext as Gl, WebGlShader, WebGlUniformLocation};

const QUAD: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

struct Program {
    program: WebGlProgram,
    shaders: [WebGlShader; 2],
    quad: WebGlBuffer,
    /// Same order as [`EmergenceUniforms::entries`].
    locations: Vec<Option<WebGlUniformLocation>>,
}

/// [`GpuSurface`] over a WebGL 1 context on its own canvas.
pub(super) struct WebGlSurface {
    canvas: web_sys::HtmlCanvasElement,
    gl: Option<Gl>,
    program: Option<Program>,
    uniforms: EmergenceUniforms,
}

impl WebGlSurface {
    pub(super) fn new(canvas: web_sys::HtmlCanvasElement) -> Self {
        Self {
            canvas,
            gl: None,
            program: None,
            uniforms: EmergenceUniforms::default(),
        }
    }
}

fn compile(gl: &Gl, kind: u32, source: &str) -> Result<WebGlShader, InitError> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| InitError::ShaderCompile("create_shader returned null".to_string()))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);
    let ok = gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if ok {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(InitError::ShaderCompile(log))
    }
}

impl GpuSurface for WebGlSurface {
    fn dialect(&self) -> ShaderDialect {
        ShaderDialect::WebGl1
    }

    fn init(&mut self, source: &ShaderSource) -> Result<(), InitError> {
        let gl = self
            .canvas
            .get_context("webgl")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<Gl>().ok())
            .ok_or_else(|| InitError::GpuUnavailable("webgl context unavailable".to_string()))?;

        let vertex = compile(&gl, Gl::VERTEX_SHADER, &source.vertex)?;
        let fragment = compile(&gl, Gl::FRAGMENT_SHADER, &source.fragment)?;
        let program = gl
            .create_program()
            .ok_or_else(|| InitError::ShaderCompile("create_program returned null".to_string()))?;
        gl.attach_shader(&program, &vertex);
        gl.attach_shader(&program, &fragment);
        gl.link_program(&program);
        let linked = gl
            .get_program_parameter(&program, Gl::LINK_STATUS)
            .as_bool()
            .unwrap_or(false);
        if !linked {
            let log = gl.get_program_info_log(&program).unwrap_or_default();
            return Err(InitError::ShaderCompile(log));
        }
        gl.use_program(Some(&program));

        let quad = gl
            .create_buffer()
            .ok_or_else(|| InitError::GpuUnavailable("create_buffer returned null".to_string()))?;
        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&quad));
        let data = js_sys::Float32Array::from(&QUAD[..]);
        gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &data, Gl::STATIC_DRAW);
        let position = gl.get_attrib_location(&program, "a_position");
        if position >= 0 {
            gl.enable_vertex_attrib_array(position as u32);
            gl.vertex_attrib_pointer_with_i32(position as u32, 2, Gl::FLOAT, false, 0, 0);
        }

        let locations = self
            .uniforms
            .entries()
            .iter()
            .map(|(name, _)| gl.get_uniform_location(&program, name))
            .collect();

        self.program = Some(Program {
            program,
            shaders: [vertex, fragment],
            quad,
            locations,
        });
        self.gl = Some(gl);
        Ok(())
    }

    fn set_uniforms(&mut self, uniforms: &EmergenceUniforms) {
        self.uniforms = *uniforms;
    }

    fn draw_fullscreen(&mut self) -> Result<(), RenderError> {
        let (Some(gl), Some(p)) = (&self.gl, &self.program) else {
            return Err(RenderError("webgl surface not initialized".to_string()));
        };
        if gl.is_context_lost() {
            return Err(RenderError("webgl context lost".to_string()));
        }
        gl.viewport(0, 0, self.canvas.width() as i32, self.canvas.height() as i32);
        for ((_, values), location) in self.uniforms.entries().iter().zip(&p.locations) {
            let loc = location.as_ref();
            match values {
                [x] => gl.uniform1f(loc, *x),
                [x, y] => gl.uniform2f(loc, *x, *y),
                [x, y, z] => gl.uniform3f(loc, *x, *y, *z),
                _ => {}
            }
        }
        gl.draw_arrays(Gl::TRIANGLE_STRIP, 0, 4);
        Ok(())
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.canvas.set_width(width.max(1.0) as u32);
        self.canvas.set_height(height.max(1.0) as u32);
    }

    fn release(&mut self) {
        if let (Some(gl), Some(p)) = (&self.gl, self.program.take()) {
            for shader in &p.shaders {
                gl.delete_shader(Some(shader));
            }
            gl.delete_buffer(Some(&p.quad));
            gl.delete_program(Some(&p.program));
        }
    }
}
