use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use glam::Vec2;
use wgpu::util::DeviceExt;
use winit::{event::*, event_loop::EventLoop, window::CursorGrabMode, window::WindowBuilder};

use cardwall_core::{
    hit_test_field, screen_to_world_ray, Camera, CardField, CardPainter, FieldBounds, FieldConfig,
    FieldError, FrameMotion, TextureHandle, TextureUploader, UniformSnapshot, UploadError,
    WheelDelta, CARDS_WGSL, CARD_HALF_EXTENT,
};

// Fallback card texts used when no text source is configured.
const DEFAULT_CARD_TEXTS: &[&str] = &[
    "the wall remembers every word you gave it",
    "a hundred small signals drifting past",
    "hold and drag to pan the field",
    "scroll to let the cards stream by",
    "each card is drawn once and lives in the atlas",
    "distance softens what you are not reading",
    "hover to slow the stream down",
    "nothing here is fetched twice",
    "the pattern behind the text is never the same",
    "words wrap and settle at the center",
    "release and the motion eases out",
    "every instance shares one draw call",
];

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

// Mirrors the Uniforms struct in cards.wgsl.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    drag: [f32; 2],
    time: f32,
    scroll_offset: f32,
    scroll_velocity: f32,
    max_y: f32,
    card_half: [f32; 2],
    blur_near: f32,
    blur_far: f32,
    _pad: [f32; 2],
}

struct GpuState<'w> {
    window: &'w winit::window::Window,
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    quad_vb: wgpu::Buffer,
    sampler: wgpu::Sampler,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
    instance_vb: Option<wgpu::Buffer>,
}

impl<'w> GpuState<'w> {
    async fn new(window: &'w winit::window::Window) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No GPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps.formats[0];
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            desired_maximum_frame_latency: 2,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cards shader"),
            source: wgpu::ShaderSource::Wgsl(CARDS_WGSL.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniforms"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Quad corners for two triangles
        let quad_vertices: [f32; 12] = [
            -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, 1.0,
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vb"),
            contents: bytemuck::cast_slice(&quad_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("atlas sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cards bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("cards pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_buffers = [
            // slot 0: quad corners
            wgpu::VertexBufferLayout {
                array_stride: (std::mem::size_of::<f32>() * 2) as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                }],
            },
            // slot 1: static instance data (position, speed, uv_rect)
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<cardwall_core::InstanceData>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 1,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32,
                        offset: 12,
                        shader_location: 2,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x4,
                        offset: 16,
                        shader_location: 3,
                    },
                ],
            },
        ];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cards pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &vertex_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            pipeline,
            uniform_buffer,
            quad_vb,
            sampler,
            bind_group_layout,
            bind_group: None,
            instance_vb: None,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Wire the initialized field's static buffers and uploaded atlas views
    /// into the pipeline. A field with zero instances leaves the background
    /// clear as the only output.
    fn install_field(&mut self, field: &CardField, views: &[wgpu::TextureView]) {
        let buffers = field.instances();
        let (Some(a), Some(b)) = (field.atlas_handle(), field.blurred_handle()) else {
            log::warn!("field has no atlas; rendering background only");
            return;
        };
        let (Some(atlas_view), Some(blur_view)) = (views.get(a.0 as usize), views.get(b.0 as usize))
        else {
            log::error!("texture handles do not match uploaded views");
            return;
        };
        if buffers.is_empty() {
            return;
        }
        self.instance_vb = Some(self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("instance_vb"),
            contents: buffers.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cards bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(blur_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }));
    }

    fn render(
        &mut self,
        snap: &UniformSnapshot,
        camera: &Camera,
        bounds: &FieldBounds,
    ) -> Result<(), wgpu::SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: camera.view_proj().to_cols_array_2d(),
                drag: snap.drag.to_array(),
                time: snap.time,
                scroll_offset: snap.scroll_offset,
                scroll_velocity: snap.scroll_velocity,
                max_y: bounds.max_y,
                card_half: CARD_HALF_EXTENT,
                blur_near: bounds.z_near,
                blur_far: bounds.z_far,
                _pad: [0.0; 2],
            }),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("cards pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.04,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            // nothing to draw until the atlas and instance buffers exist
            if let (Some(bg), Some(ivb)) = (&self.bind_group, &self.instance_vb) {
                if snap.instance_count > 0 && snap.atlas.is_some() {
                    rpass.set_pipeline(&self.pipeline);
                    rpass.set_bind_group(0, bg, &[]);
                    rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
                    rpass.set_vertex_buffer(1, ivb.slice(..));
                    rpass.draw(0..6, 0..snap.instance_count);
                }
            }
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

/// Texture-upload capability backed by wgpu. Handles index into `views`.
struct GpuUploader<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    views: Vec<wgpu::TextureView>,
}

impl TextureUploader for GpuUploader<'_> {
    fn upload(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, UploadError> {
        if width == 0 || height == 0 || rgba.len() != (width as usize * height as usize * 4) {
            return Err(UploadError::Backend(format!(
                "raster size mismatch: {width}x{height} with {} bytes",
                rgba.len()
            )));
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("card atlas"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        let handle = TextureHandle(self.views.len() as u64);
        self.views
            .push(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        Ok(handle)
    }
}

fn load_font_bytes() -> anyhow::Result<Vec<u8>> {
    if let Ok(path) = std::env::var("CARDWALL_FONT") {
        return std::fs::read(&path)
            .map_err(|e| anyhow::anyhow!("cannot read font {path}: {e}"));
    }
    for path in FONT_CANDIDATES {
        if let Ok(bytes) = std::fs::read(path) {
            log::info!("using font {path}");
            return Ok(bytes);
        }
    }
    anyhow::bail!("no usable font found; set CARDWALL_FONT to a .ttf path")
}

fn load_card_texts() -> Vec<String> {
    match std::env::var("CARDWALL_CARDS") {
        Ok(path) => match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let texts: Vec<String> = contents
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect();
                if !texts.is_empty() {
                    return texts;
                }
                log::warn!("{path} contains no card texts, using built-in set");
            }
            Err(e) => {
                let err = FieldError::DataLoad(format!("{path}: {e}"));
                log::error!("{err}; using built-in set");
            }
        },
        Err(_) => {}
    }
    DEFAULT_CARD_TEXTS.iter().map(|s| s.to_string()).collect()
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let texts = load_card_texts();
    let font_bytes = load_font_bytes()?;
    let painter = CardPainter::from_font_bytes(&font_bytes)?;

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("cardwall")
        .build(&event_loop)?;
    let size = window.inner_size();
    let px = Vec2::new(size.width.max(1) as f32, size.height.max(1) as f32);

    let mut field = CardField::new(FieldConfig::default(), Vec2::ZERO, px);
    let world = field.camera().world_size_at(0.0);
    field.controller_mut().set_viewport(world, px);

    let mut state = pollster::block_on(GpuState::new(&window))?;

    let views = {
        let mut uploader = GpuUploader {
            device: &state.device,
            queue: &state.queue,
            views: Vec::new(),
        };
        if let Err(e) = field.initialize(&texts, &painter, &mut uploader) {
            log::error!("field initialization failed: {e}");
        }
        uploader.views
    };
    state.install_field(&field, &views);

    // The hover tester reads the previous frame's motion; instance data is
    // static so a one-time clone is enough.
    let hover_motion = Rc::new(RefCell::new(FrameMotion::default()));
    let viewport_px = Rc::new(RefCell::new(px));
    {
        let instances = field.instances().clone();
        let bounds = field.config().bounds;
        let motion = hover_motion.clone();
        let vp = viewport_px.clone();
        field.set_hit_tester(Box::new(move |pointer, camera| {
            let m = motion.borrow();
            let (ro, rd) = screen_to_world_ray(camera, pointer, *vp.borrow());
            hit_test_field(
                ro,
                rd,
                &instances,
                m.time,
                m.scroll_offset,
                m.drag,
                &bounds,
                Vec2::from(CARD_HALF_EXTENT),
            )
        }));
    }

    let mut last_frame = Instant::now();
    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::Resized(new_size) => {
                state.resize(new_size);
                let npx = Vec2::new(new_size.width.max(1) as f32, new_size.height.max(1) as f32);
                *viewport_px.borrow_mut() = npx;
                field.camera_mut().aspect = npx.x / npx.y.max(1.0);
                let world = field.camera().world_size_at(0.0);
                field.controller_mut().set_viewport(world, npx);
            }
            WindowEvent::CursorMoved { position, .. } => {
                field
                    .controller_mut()
                    .on_pointer_move(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => match button_state {
                ElementState::Pressed => {
                    let p = field.controller().pointer();
                    field.controller_mut().on_pointer_down(0, p.x, p.y);
                    // best-effort capture; dragging degrades gracefully
                    if let Err(e) = state.window.set_cursor_grab(CursorGrabMode::Confined) {
                        log::debug!("pointer capture unavailable: {e}");
                    }
                }
                ElementState::Released => {
                    field.controller_mut().on_pointer_up();
                    let _ = state.window.set_cursor_grab(CursorGrabMode::None);
                }
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => WheelDelta::Lines(y),
                    MouseScrollDelta::PixelDelta(pos) => WheelDelta::Pixels(pos.y as f32),
                };
                field.controller_mut().on_wheel(delta);
            }
            _ => {}
        },
        Event::AboutToWait => {
            let now = Instant::now();
            let dt = (now - last_frame).as_secs_f32();
            last_frame = now;

            let snap = field.tick(dt);
            *hover_motion.borrow_mut() = FrameMotion {
                time: snap.time,
                drag: snap.drag,
                scroll_offset: snap.scroll_offset,
                scroll_velocity: snap.scroll_velocity,
            };

            match state.render(&snap, field.camera(), &field.config().bounds) {
                Ok(_) => state.window.request_redraw(),
                Err(wgpu::SurfaceError::Lost) => state.resize(state.window.inner_size()),
                Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                Err(e) => log::error!("render error: {e:?}"),
            }
        }
        _ => {}
    })?;
    Ok(())
}
