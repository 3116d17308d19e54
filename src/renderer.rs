// --- File: renderer.rs ---
use crate::config::TankConfig;
use crate::constants::CLEAR_COLOR;
use crate::error::{FishbowlError, Result};
use crate::scene::{ColorVertex, SpriteVertex, TextureSlot, build_frame};
use crate::simulation::FishTank;
use crate::texture::{Sprite, SpriteSynthesizer, probe_synthesizer, synthesize_presets};
use bytemuck::{Pod, Zeroable};
use std::sync::Arc;
use winit::{dpi::PhysicalSize, window::Window};

// --- GPU Data Structures ---

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct GlobalUniforms {
    resolution: [f32; 2],
    // Multiplies sprite alpha; 1.0 unless fading.
    alpha: f32,
    _padding: f32,
}

impl ColorVertex {
    fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ColorVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

impl SpriteVertex {
    fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

// --- Window Surface ---

/// Device, queue and the window surface they present to.
pub struct GpuContext {
    surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
}

impl GpuContext {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        let size = PhysicalSize::new(size.width.max(1), size.height.max(1));

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(|e| FishbowlError::GpuUnavailable(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| FishbowlError::GpuUnavailable("no compatible adapter".into()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Tank Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|e| FishbowlError::GpuUnavailable(e.to_string()))?;

        // Colors and sprites are authored as sRGB bytes; blend them as-is.
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| FishbowlError::GpuUnavailable("surface has no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "GPU surface {}x{} using {:?} on {}",
            size.width,
            size.height,
            surface_format,
            adapter.get_info().name
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 || new_size == self.size {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        log::debug!("surface resized to {}x{}", new_size.width, new_size.height);
    }

    /// Re-applies the current configuration after the surface was lost.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Steps and draws the tank into the next swapchain image.
    pub fn render_frame(&self, tank: &mut TankRenderer) -> std::result::Result<(), wgpu::SurfaceError> {
        let output_texture = self.surface.get_current_texture()?;
        let view = output_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        tank.render(&self.device, &self.queue, &view);
        output_texture.present();
        Ok(())
    }
}

// --- Tank Renderer ---

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Everything created by `init` and released by `destroy`.
struct TankGpu {
    background_pipeline: Option<wgpu::RenderPipeline>,
    sprite_pipeline: Option<wgpu::RenderPipeline>,
    global_uniform_buffer: wgpu::Buffer,
    bind_group_globals: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    preset_textures: Vec<Option<GpuTexture>>,
    user_textures: Vec<GpuTexture>,
    background_buffer: wgpu::Buffer,
    background_capacity: usize,
    sprite_buffer: wgpu::Buffer,
    sprite_capacity: usize,
}

impl TankGpu {
    fn texture(&self, slot: TextureSlot) -> Option<&GpuTexture> {
        match slot {
            TextureSlot::Preset(i) => self.preset_textures.get(i).and_then(Option::as_ref),
            TextureSlot::User(i) => self.user_textures.get(i),
        }
    }
}

/// Owns the fish tank and the GPU resources that draw it. GPU-facing calls
/// made before `init` (or after `destroy`) do nothing.
pub struct TankRenderer {
    tank: FishTank,
    buffer_size: (u32, u32),
    dpr: f32,
    synthesizer: Box<dyn SpriteSynthesizer>,
    gpu: Option<TankGpu>,
}

// Initial vertex capacity, in vertices.
const INITIAL_SPRITE_VERTICES: usize = 6 * 7 * 32;

fn vertex_buffer(device: &wgpu::Device, label: &str, bytes: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: bytes.max(16) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl TankRenderer {
    /// `width`/`height` are buffer pixels; the tank works in `size / dpr`.
    pub fn new(width: u32, height: u32, dpr: f32, config: TankConfig) -> Self {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        let tank = FishTank::new(width as f32 / dpr, height as f32 / dpr, config);
        Self::with_tank(tank, width, height, dpr)
    }

    pub fn with_tank(tank: FishTank, width: u32, height: u32, dpr: f32) -> Self {
        Self {
            tank,
            buffer_size: (width, height),
            dpr,
            synthesizer: probe_synthesizer(),
            gpu: None,
        }
    }

    pub fn tank(&self) -> &FishTank {
        &self.tank
    }

    pub fn tank_mut(&mut self) -> &mut FishTank {
        &mut self.tank
    }

    pub fn is_initialized(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn user_texture_count(&self) -> usize {
        self.gpu.as_ref().map_or(0, |gpu| gpu.user_textures.len())
    }

    pub fn resize(&mut self, width: u32, height: u32, dpr: f32) {
        if dpr.is_finite() && dpr > 0.0 {
            self.dpr = dpr;
        }
        self.buffer_size = (width, height);
        self.tank
            .resize(width as f32 / self.dpr, height as f32 / self.dpr);
    }

    // --- Lifecycle ---

    /// Creates pipelines, buffers and preset textures. Calling it again
    /// releases the previous set first.
    pub fn init(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat) {
        if self.gpu.is_some() {
            self.release_gpu();
        }

        let bind_group_layout_globals =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Globals Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<GlobalUniforms>() as _,
                        ),
                    },
                    count: None,
                }],
            });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let global_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Global Uniform Buffer"),
            size: std::mem::size_of::<GlobalUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group_globals = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &bind_group_layout_globals,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_uniform_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sprite Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let (background_pipeline, sprite_pipeline) =
            Self::create_pipelines(device, format, &bind_group_layout_globals, &texture_layout);

        let background_capacity = 6 * 16;
        let background_buffer = vertex_buffer(
            device,
            "Background Vertex Buffer",
            background_capacity * std::mem::size_of::<ColorVertex>(),
        );
        let sprite_buffer = vertex_buffer(
            device,
            "Sprite Vertex Buffer",
            INITIAL_SPRITE_VERTICES * std::mem::size_of::<SpriteVertex>(),
        );

        let mut gpu = TankGpu {
            background_pipeline,
            sprite_pipeline,
            global_uniform_buffer,
            bind_group_globals,
            texture_layout,
            sampler,
            preset_textures: Vec::new(),
            user_textures: Vec::new(),
            background_buffer,
            background_capacity,
            sprite_buffer,
            sprite_capacity: INITIAL_SPRITE_VERTICES,
        };

        let preset_textures: Vec<Option<GpuTexture>> =
            synthesize_presets(self.synthesizer.as_ref())
                .into_iter()
                .map(|sprite| {
                    let sprite = sprite?;
                    upload_texture(device, queue, &gpu, &sprite, "Preset Fish Texture")
                        .inspect_err(|err| log::error!("preset texture upload failed: {err}"))
                        .ok()
                })
                .collect();
        gpu.preset_textures = preset_textures;
        log::info!(
            "tank renderer ready: {} preset sprites via {} synthesis",
            gpu.preset_textures.iter().flatten().count(),
            self.synthesizer.name()
        );
        self.gpu = Some(gpu);
    }

    fn create_pipelines(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        globals_layout: &wgpu::BindGroupLayout,
        texture_layout: &wgpu::BindGroupLayout,
    ) -> (Option<wgpu::RenderPipeline>, Option<wgpu::RenderPipeline>) {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Tank Shader Module"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            log::error!("tank shader failed to compile: {err}");
            return (None, None);
        }

        let targets = [Some(wgpu::ColorTargetState {
            format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let build = |label: &str,
                     layouts: &[&wgpu::BindGroupLayout],
                     vs: &str,
                     fs: &str,
                     buffer: wgpu::VertexBufferLayout| {
            device.push_error_scope(wgpu::ErrorFilter::Validation);
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: layouts,
                push_constant_ranges: &[],
            });
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(vs),
                    compilation_options: Default::default(),
                    buffers: &[buffer],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fs),
                    compilation_options: Default::default(),
                    targets: &targets,
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None, // Mirrored quads flip winding.
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });
            match pollster::block_on(device.pop_error_scope()) {
                Some(err) => {
                    log::error!("{label} failed to build: {err}");
                    None
                }
                None => Some(pipeline),
            }
        };

        let background = build(
            "Background Pipeline",
            &[globals_layout],
            "vs_background",
            "fs_background",
            ColorVertex::desc(),
        );
        let sprite = build(
            "Sprite Pipeline",
            &[globals_layout, texture_layout],
            "vs_sprite",
            "fs_sprite",
            SpriteVertex::desc(),
        );
        (background, sprite)
    }

    /// Releases every texture and buffer `init` created and drops all fish.
    pub fn destroy(&mut self) {
        self.release_gpu();
        self.tank.clear();
    }

    fn release_gpu(&mut self) {
        let Some(gpu) = self.gpu.take() else {
            return;
        };
        for tex in gpu.preset_textures.iter().flatten().chain(gpu.user_textures.iter()) {
            tex.texture.destroy();
        }
        gpu.global_uniform_buffer.destroy();
        gpu.background_buffer.destroy();
        gpu.sprite_buffer.destroy();
        log::debug!(
            "released {} user textures",
            gpu.user_textures.len()
        );
    }

    // --- Textures ---

    /// Uploads a straight-alpha RGBA image and returns its user texture index.
    pub fn load_user_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<usize> {
        let gpu = self.gpu.as_mut().ok_or(FishbowlError::NotInitialized)?;
        let sprite = Sprite {
            width,
            height,
            rgba: rgba.to_vec(),
        };
        let texture = upload_texture(device, queue, gpu, &sprite, "User Fish Texture")?;
        gpu.user_textures.push(texture);
        Ok(gpu.user_textures.len() - 1)
    }

    // --- Frame ---

    /// Advances the simulation one tick and draws it into `view`.
    pub fn render(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        self.tank.step();
        let (width, height) = (self.buffer_size.0 as f32, self.buffer_size.1 as f32);
        let frame = build_frame(&self.tank, width, height, self.dpr);

        queue.write_buffer(
            &gpu.global_uniform_buffer,
            0,
            bytemuck::cast_slice(&[GlobalUniforms {
                resolution: [width.max(1.0), height.max(1.0)],
                alpha: 1.0,
                _padding: 0.0,
            }]),
        );

        if frame.background.len() > gpu.background_capacity {
            gpu.background_buffer.destroy();
            gpu.background_capacity = frame.background.len().next_power_of_two();
            gpu.background_buffer = vertex_buffer(
                device,
                "Background Vertex Buffer (Resized)",
                gpu.background_capacity * std::mem::size_of::<ColorVertex>(),
            );
        }
        queue.write_buffer(&gpu.background_buffer, 0, bytemuck::cast_slice(&frame.background));

        let sprite_vertices: Vec<SpriteVertex> =
            frame.sprites.iter().flat_map(|q| q.triangles()).collect();
        if sprite_vertices.len() > gpu.sprite_capacity {
            gpu.sprite_buffer.destroy();
            gpu.sprite_capacity = sprite_vertices.len().next_power_of_two();
            log::debug!("growing sprite buffer to {} vertices", gpu.sprite_capacity);
            gpu.sprite_buffer = vertex_buffer(
                device,
                "Sprite Vertex Buffer (Resized)",
                gpu.sprite_capacity * std::mem::size_of::<SpriteVertex>(),
            );
        }
        if !sprite_vertices.is_empty() {
            queue.write_buffer(&gpu.sprite_buffer, 0, bytemuck::cast_slice(&sprite_vertices));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Tank Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Tank Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_bind_group(0, &gpu.bind_group_globals, &[]);

            if let Some(pipeline) = &gpu.background_pipeline {
                render_pass.set_pipeline(pipeline);
                render_pass.set_vertex_buffer(0, gpu.background_buffer.slice(..));
                render_pass.draw(0..frame.background.len() as u32, 0..1);
            }

            if let Some(pipeline) = &gpu.sprite_pipeline {
                render_pass.set_pipeline(pipeline);
                render_pass.set_vertex_buffer(0, gpu.sprite_buffer.slice(..));
                for (i, quad) in frame.sprites.iter().enumerate() {
                    // Not loaded yet: skip this frame.
                    let Some(texture) = gpu.texture(quad.texture) else {
                        continue;
                    };
                    let first = (i * 6) as u32;
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    render_pass.draw(first..first + 6, 0..1);
                }
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    gpu: &TankGpu,
    sprite: &Sprite,
    label: &str,
) -> Result<GpuTexture> {
    let expected = sprite.width as usize * sprite.height as usize * 4;
    if sprite.width == 0 || sprite.height == 0 || sprite.rgba.len() != expected {
        return Err(FishbowlError::TextureSize {
            width: sprite.width,
            height: sprite.height,
            expected,
            actual: sprite.rgba.len(),
        });
    }

    let size = wgpu::Extent3d {
        width: sprite.width,
        height: sprite.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &sprite.rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * sprite.width),
            rows_per_image: Some(sprite.height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: &gpu.texture_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&gpu.sampler),
            },
        ],
    });
    Ok(GpuTexture {
        texture,
        bind_group,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> TankRenderer {
        let tank = FishTank::with_seed(400.0, 300.0, TankConfig::default(), 3);
        TankRenderer::with_tank(tank, 800, 600, 2.0)
    }

    #[test]
    fn uninitialized_renderer_is_inert() {
        let mut r = renderer();
        r.tank_mut().add_ambient_fish(0);
        assert!(!r.is_initialized());
        assert_eq!(r.user_texture_count(), 0);
        r.destroy();
        assert_eq!(r.tank().fish_count(), 0);
    }

    #[test]
    fn resize_keeps_tank_in_logical_pixels() {
        let mut r = renderer();
        r.resize(1200, 900, 3.0);
        assert_eq!(r.tank().size(), (400.0, 300.0));
    }

    #[test]
    fn globals_match_shader_layout() {
        assert_eq!(std::mem::size_of::<GlobalUniforms>(), 16);
        assert_eq!(std::mem::size_of::<SpriteVertex>(), 16);
        assert_eq!(std::mem::size_of::<ColorVertex>(), 24);
    }
}
// --- End of File: renderer.rs ---
