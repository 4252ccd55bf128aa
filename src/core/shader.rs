//! Emergence field shader: source composition and the uniform block.
//!
//! The fragment shader is assembled from a shared prelude plus one field
//! function per level behavior, and a dispatcher generated from the behavior
//! registry's level ranges. Two dialects are emitted from the same body:
//! GLSL ES 1.00 for WebGL and GLSL 4.50 for wgpu.

use crate::level_behavior::behavior_ranges;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShaderDialect {
    #[default]
    WebGl1,
    Glsl450,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
    pub dialect: ShaderDialect,
}

/// std140 uniform block, 80 bytes. Field order matches [`UNIFORM_DECLS`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "gpu", derive(bytemuck::Pod, bytemuck::Zeroable))]
pub struct EmergenceUniforms {
    pub resolution: [f32; 2],
    /// Pointer position, normalized.
    pub mouse: [f32; 2],
    pub time: f32,
    pub morph_factor: f32,
    pub dimension: f32,
    pub glitch_intensity: f32,
    pub rotation_speed: f32,
    pub grid_density: f32,
    /// Level index plus fractional transition progress.
    pub emergence_level: f32,
    pub zoom_factor: f32,
    pub level_color: [f32; 3],
    pub epo_integration: f32,
    pub epo_dispersion: f32,
    pub information_density: f32,
    pub consciousness: f32,
    pub(crate) _pad: f32,
}

impl Default for EmergenceUniforms {
    fn default() -> Self {
        Self {
            resolution: [1280.0, 720.0],
            mouse: [0.5, 0.5],
            time: 0.0,
            morph_factor: 0.5,
            dimension: 4.0,
            glitch_intensity: 0.0,
            rotation_speed: 1.0,
            grid_density: 8.0,
            emergence_level: 0.0,
            zoom_factor: 1.0,
            level_color: [1.0, 1.0, 1.0],
            epo_integration: 0.5,
            epo_dispersion: 0.5,
            information_density: 0.3,
            consciousness: 0.1,
            _pad: 0.0,
        }
    }
}

impl EmergenceUniforms {
    /// `(name, components)` in declaration order, for per-name upload.
    pub fn entries(&self) -> [(&'static str, &[f32]); 15] {
        [
            ("u_resolution", self.resolution.as_slice()),
            ("u_mouse", self.mouse.as_slice()),
            ("u_time", std::slice::from_ref(&self.time)),
            ("u_morphFactor", std::slice::from_ref(&self.morph_factor)),
            ("u_dimension", std::slice::from_ref(&self.dimension)),
            ("u_glitchIntensity", std::slice::from_ref(&self.glitch_intensity)),
            ("u_rotationSpeed", std::slice::from_ref(&self.rotation_speed)),
            ("u_gridDensity", std::slice::from_ref(&self.grid_density)),
            ("u_emergenceLevel", std::slice::from_ref(&self.emergence_level)),
            ("u_zoomFactor", std::slice::from_ref(&self.zoom_factor)),
            ("u_levelColor", self.level_color.as_slice()),
            ("u_epoIntegration", std::slice::from_ref(&self.epo_integration)),
            ("u_epoDispersion", std::slice::from_ref(&self.epo_dispersion)),
            ("u_informationDensity", std::slice::from_ref(&self.information_density)),
            ("u_consciousness", std::slice::from_ref(&self.consciousness)),
        ]
    }
}

/// `(glsl type, name)` in block order.
pub const UNIFORM_DECLS: [(&str, &str); 15] = [
    ("vec2", "u_resolution"),
    ("vec2", "u_mouse"),
    ("float", "u_time"),
    ("float", "u_morphFactor"),
    ("float", "u_dimension"),
    ("float", "u_glitchIntensity"),
    ("float", "u_rotationSpeed"),
    ("float", "u_gridDensity"),
    ("float", "u_emergenceLevel"),
    ("float", "u_zoomFactor"),
    ("vec3", "u_levelColor"),
    ("float", "u_epoIntegration"),
    ("float", "u_epoDispersion"),
    ("float", "u_informationDensity"),
    ("float", "u_consciousness"),
];

const PRELUDE: &str = r#"
mat4 rotateXY(float a) {
    float c = cos(a);
    float s = sin(a);
    return mat4(c, -s, 0.0, 0.0, s, c, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
}

mat4 rotateXZ(float a) {
    float c = cos(a);
    float s = sin(a);
    return mat4(c, 0.0, -s, 0.0, 0.0, 1.0, 0.0, 0.0, s, 0.0, c, 0.0, 0.0, 0.0, 0.0, 1.0);
}

mat4 rotateXW(float a) {
    float c = cos(a);
    float s = sin(a);
    return mat4(c, 0.0, 0.0, -s, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, s, 0.0, 0.0, c);
}

vec2 projectTo2D(vec4 p4) {
    vec3 p3 = p4.xyz / (u_dimension - 1.0 + p4.w);
    return p3.xy / (2.0 + p3.z);
}

float hypercubeLattice(vec2 uv) {
    vec2 center = (uv - 0.5) * u_zoomFactor + 0.5;
    float t = u_time * u_rotationSpeed;
    float lattice = 0.0;
    for (int i = 0; i < 16; i++) {
        float fi = float(i);
        vec4 v = vec4(
            mod(fi, 2.0) * 2.0 - 1.0,
            mod(floor(fi / 2.0), 2.0) * 2.0 - 1.0,
            mod(floor(fi / 4.0), 2.0) * 2.0 - 1.0,
            mod(floor(fi / 8.0), 2.0) * 2.0 - 1.0);
        v = rotateXY(t * 0.5) * v;
        v = rotateXZ(t * 0.3) * v;
        v = rotateXW(t * 0.7) * v;
        vec2 p2 = projectTo2D(v) * 0.2 + 0.5;
        lattice += exp(-distance(center, p2) * u_gridDensity) * 0.1;
    }
    float edges = 0.0;
    for (int i = 0; i < 32; i++) {
        float k = float(i) / 32.0;
        vec2 e = vec2(sin(k * 6.28318 + t), cos(k * 6.28318 + t * 1.3)) * 0.3 + 0.5;
        edges += exp(-distance(center, e) * u_gridDensity * 2.0) * 0.05;
    }
    return mix(lattice, lattice + edges, u_morphFactor * 2.0);
}

float consciousnessField(vec2 uv) {
    float field = 0.0;
    vec2 center = vec2(0.5);
    for (int i = 0; i < 8; i++) {
        float a = float(i) * 0.785398;
        vec2 node = center + vec2(cos(a), sin(a)) * 0.3;
        field += exp(-distance(uv, node) * 15.0) * sin(u_time * 2.0 + float(i)) * 0.5 + 0.5;
    }
    field += exp(-distance(uv, center) * 10.0) * 2.0;
    return field * 0.2;
}
"#;

const OVERLAYS: &str = r#"
    float dist = distance(uv, vec2(0.5));
    color += vec3(0.0, 0.7, 1.0) * (u_epoIntegration / (1.0 + dist * 3.0)) * 0.2;
    color += vec3(1.0, 0.3, 0.1) * (u_epoDispersion * dist) * 0.1;
    color += vec3(0.8, 1.0, 0.8) * (u_informationDensity * exp(-dist * 2.0)) * 0.15;
    color += vec3(1.0, 0.9, 1.0) * u_consciousness * exp(-distance(uv, u_mouse) * 6.0) * 0.1;
    return color;
}
"#;

fn dispatcher() -> String {
    let ranges = behavior_ranges();
    let mut out = String::from(
        "\nvec3 generateEmergenceVisualization(vec2 uv) {\n    vec3 color;\n    float level = u_emergenceLevel;\n",
    );
    for (k, (_, last, behavior)) in ranges.iter().enumerate() {
        let call = format!("color = field_{}(uv);", behavior.name());
        if k == 0 {
            out.push_str(&format!("    if (level < {}.0) {{ {call} }}\n", last + 1));
        } else if k + 1 < ranges.len() {
            out.push_str(&format!("    else if (level < {}.0) {{ {call} }}\n", last + 1));
        } else {
            out.push_str(&format!("    else {{ {call} }}\n"));
        }
    }
    out.push_str(OVERLAYS);
    out
}

fn fragment_body() -> String {
    let mut body = String::from(PRELUDE);
    for (_, _, behavior) in behavior_ranges() {
        body.push_str(behavior.shader_snippet());
    }
    body.push_str(&dispatcher());
    body
}

const MAIN_BODY: &str = r#"
    vec2 uv = v_uv;
    uv += sin(uv.yx * 40.0 + u_time) * u_glitchIntensity * 0.01;
    vec4 outColor = vec4(generateEmergenceVisualization(uv), 1.0);
"#;

/// Full vertex + fragment source for `dialect`.
pub fn compose(dialect: ShaderDialect) -> ShaderSource {
    match dialect {
        ShaderDialect::WebGl1 => {
            let vertex = "attribute vec2 a_position;\nvarying vec2 v_uv;\nvoid main() {\n    v_uv = a_position * 0.5 + 0.5;\n    gl_Position = vec4(a_position, 0.0, 1.0);\n}\n".to_string();
            let mut fragment = String::from("precision highp float;\nvarying vec2 v_uv;\n");
            for (ty, name) in UNIFORM_DECLS {
                fragment.push_str(&format!("uniform {ty} {name};\n"));
            }
            fragment.push_str(&fragment_body());
            fragment.push_str(&format!("\nvoid main() {{{MAIN_BODY}    gl_FragColor = outColor;\n}}\n"));
            ShaderSource {
                vertex,
                fragment,
                dialect,
            }
        }
        ShaderDialect::Glsl450 => {
            let vertex = "#version 450\nlayout(location = 0) out vec2 v_uv;\nvoid main() {\n    vec2 pos = vec2(float((gl_VertexIndex << 1) & 2), float(gl_VertexIndex & 2));\n    v_uv = vec2(pos.x, 1.0 - pos.y);\n    gl_Position = vec4(pos * 2.0 - 1.0, 0.0, 1.0);\n}\n".to_string();
            let mut fragment = String::from(
                "#version 450\nlayout(location = 0) in vec2 v_uv;\nlayout(location = 0) out vec4 o_color;\nlayout(set = 0, binding = 0) uniform Uniforms {\n",
            );
            for (ty, name) in UNIFORM_DECLS {
                fragment.push_str(&format!("    {ty} {name};\n"));
            }
            fragment.push_str("    float u_pad;\n};\n");
            fragment.push_str(&fragment_body());
            fragment.push_str(&format!("\nvoid main() {{{MAIN_BODY}    o_color = outColor;\n}}\n"));
            ShaderSource {
                vertex,
                fragment,
                dialect,
            }
        }
    }
}
