//! Offscreen emergence shader rendering using wgpu.
//!
//! [`WgpuSurface`] implements [`GpuSurface`] by compiling the GLSL 4.50
//! dialect of the emergence shader through naga and drawing a fullscreen
//! triangle into an offscreen texture. The adapter and device are created
//! once per thread and shared by every surface on it.
//!
//! Enable with the `gpu` feature flag.

use std::borrow::Cow;
use std::cell::OnceCell;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::error::{InitError, RenderError};
use crate::shader::{EmergenceUniforms, ShaderDialect, ShaderSource};
use crate::surface::GpuSurface;

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

thread_local! {
    static GPU_DEVICE: OnceCell<Option<Rc<GpuDevice>>> = const { OnceCell::new() };
}

/// Adapter-independent handles shared by every surface on a thread.
pub struct GpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
}

impl GpuDevice {
    fn request() -> Option<GpuDevice> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("EPO Emergence"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .ok()?;

        Some(GpuDevice {
            device,
            queue,
            adapter_name: adapter.get_info().name,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }
}

/// The shared device for this thread, created on first use. A failed
/// request is remembered and not retried.
pub fn shared_device() -> Option<Rc<GpuDevice>> {
    GPU_DEVICE.with(|cell| {
        cell.get_or_init(|| {
            let dev = GpuDevice::request().map(Rc::new);
            match &dev {
                Some(d) => info!(adapter = d.adapter_name(), "GPU device ready"),
                None => warn!("no GPU adapter/device available"),
            }
            dev
        })
        .clone()
    })
}

struct Pipeline {
    gpu: Rc<GpuDevice>,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    target: wgpu::TextureView,
}

/// Offscreen fullscreen-quad target for the emergence shader.
pub struct WgpuSurface {
    width: u32,
    height: u32,
    uniforms: EmergenceUniforms,
    pipeline: Option<Pipeline>,
    frames: u64,
}

impl WgpuSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: to_extent(width),
            height: to_extent(height),
            uniforms: EmergenceUniforms::default(),
            pipeline: None,
            frames: 0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

fn to_extent(v: f32) -> u32 {
    if v.is_finite() && v >= 1.0 {
        v as u32
    } else {
        1
    }
}

fn create_target(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Emergence Target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn glsl_module(
    device: &wgpu::Device,
    label: &str,
    code: &str,
    stage: wgpu::naga::ShaderStage,
) -> Result<wgpu::ShaderModule, InitError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(code.to_string()),
            stage,
            defines: Default::default(),
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(e) => Err(InitError::ShaderCompile(format!("{label}: {e}"))),
        None => Ok(module),
    }
}

impl GpuSurface for WgpuSurface {
    fn dialect(&self) -> ShaderDialect {
        ShaderDialect::Glsl450
    }

    fn init(&mut self, source: &ShaderSource) -> Result<(), InitError> {
        if source.dialect != ShaderDialect::Glsl450 {
            return Err(InitError::ShaderCompile(format!(
                "wgpu needs GLSL 4.50, got {:?}",
                source.dialect
            )));
        }
        let gpu = shared_device()
            .ok_or_else(|| InitError::GpuUnavailable("no adapter".to_string()))?;
        let device = &gpu.device;

        let vertex = glsl_module(device, "Emergence Vertex", &source.vertex, wgpu::naga::ShaderStage::Vertex)?;
        let fragment = glsl_module(
            device,
            "Emergence Fragment",
            &source.fragment,
            wgpu::naga::ShaderStage::Fragment,
        )?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Emergence Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Emergence Uniforms"),
            size: std::mem::size_of::<EmergenceUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Emergence Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Emergence Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Emergence Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex,
                entry_point: Some("main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(e) = pollster::block_on(device.pop_error_scope()) {
            return Err(InitError::ShaderCompile(format!("pipeline: {e}")));
        }

        let target = create_target(device, self.width, self.height);
        debug!(width = self.width, height = self.height, "emergence pipeline built");
        self.pipeline = Some(Pipeline {
            gpu: Rc::clone(&gpu),
            pipeline,
            uniform_buffer,
            bind_group,
            target,
        });
        Ok(())
    }

    fn set_uniforms(&mut self, uniforms: &EmergenceUniforms) {
        self.uniforms = *uniforms;
    }

    fn draw_fullscreen(&mut self) -> Result<(), RenderError> {
        let Some(p) = &self.pipeline else {
            return Err(RenderError("surface was never initialized".to_string()));
        };
        let device = &p.gpu.device;
        p.gpu
            .queue
            .write_buffer(&p.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Emergence Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Emergence Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &p.target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&p.pipeline);
            pass.set_bind_group(0, &p.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        p.gpu.queue.submit(std::iter::once(encoder.finish()));
        if let Some(e) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError(e.to_string()));
        }
        self.frames += 1;
        Ok(())
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.width = to_extent(width);
        self.height = to_extent(height);
        if let Some(p) = &mut self.pipeline {
            p.target = create_target(&p.gpu.device, self.width, self.height);
        }
    }

    fn release(&mut self) {
        if self.pipeline.take().is_some() {
            debug!(frames = self.frames, "emergence pipeline released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::compose;

    #[test]
    fn uninitialized_surface_refuses_to_draw() {
        let mut s = WgpuSurface::new(0.0, f32::NAN);
        assert_eq!(s.size(), (1, 1));
        assert!(s.draw_fullscreen().is_err());
        s.release();
        s.release();
        assert!(!s.is_ready());
    }

    #[test]
    fn webgl_dialect_is_rejected() {
        let mut s = WgpuSurface::new(64.0, 64.0);
        let err = s.init(&compose(ShaderDialect::WebGl1));
        assert!(matches!(err, Err(InitError::ShaderCompile(_))));
    }

    #[test]
    fn draws_when_an_adapter_exists() {
        // Machines without an adapter only check that init reports it.
        let mut s = WgpuSurface::new(64.0, 64.0);
        match s.init(&compose(s.dialect())) {
            Ok(()) => {
                s.set_uniforms(&EmergenceUniforms::default());
                assert!(s.draw_fullscreen().is_ok());
                assert_eq!(s.frames(), 1);
            }
            Err(e) => println!("GPU path unavailable here: {e}"),
        }
    }
}
