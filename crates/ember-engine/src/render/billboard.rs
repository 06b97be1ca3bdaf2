use wgpu::util::DeviceExt;

use glam::Mat4;

use crate::billboard::{BillboardBatch, BillboardVertex};
use crate::camera::Camera;
use crate::render::{RenderCtx, RenderTarget};

use super::common::{CameraUniform, straight_alpha_blend, triangle_list, uniform_min_binding_size};

/// CPU-side RGBA8 image sampled by every billboard of a batch.
///
/// Pixels are straight-alpha, row-major, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct BillboardTexture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl BillboardTexture {
    /// Wraps raw RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> anyhow::Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "billboard texture has zero size");

        let expected = width as usize * height as usize * 4;
        anyhow::ensure!(
            pixels.len() == expected,
            "billboard texture {width}×{height} needs {expected} bytes, got {}",
            pixels.len()
        );

        Ok(Self { width, height, pixels })
    }

    /// 1×1 opaque white: billboards show their vertex color unchanged.
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        }
    }

    /// White disc whose alpha falls off smoothly from the center to the edge.
    pub fn soft_disc(size: u32) -> Self {
        let size = size.max(2);
        let half = size as f32 * 0.5;
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);

        for y in 0..size {
            for x in 0..size {
                let dx = (x as f32 + 0.5 - half) / half;
                let dy = (y as f32 + 0.5 - half) / half;
                let t = (1.0 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
                // smoothstep
                let alpha = t * t * (3.0 - 2.0 * t);
                pixels.extend_from_slice(&[255, 255, 255, (alpha * 255.0).round() as u8]);
            }
        }

        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels.get(i..i + 4).and_then(|p| p.try_into().ok())
    }
}

impl Default for BillboardTexture {
    fn default() -> Self {
        Self::white()
    }
}

/// GPU side of a `BillboardBatch`.
///
/// Owns one vertex buffer sized for the batch's full capacity, created from the
/// batch's pre-filled vertices. Each frame `upload` overwrites the leading
/// `vertex_count` vertices and `draw` issues a single non-indexed draw call.
///
/// Pipeline state lives inside the renderer's own render pass, so nothing leaks
/// into passes recorded afterwards.
#[derive(Default)]
pub struct BillboardRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    camera_ubo: Option<wgpu::Buffer>,

    sampler: Option<wgpu::Sampler>,
    texture: Option<wgpu::Texture>,
    texture_view: Option<wgpu::TextureView>,
    pending_texture: Option<BillboardTexture>,

    vertex_buffer: Option<wgpu::Buffer>,
    vertex_capacity: usize,
}

impl BillboardRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_texture(texture: BillboardTexture) -> Self {
        Self {
            pending_texture: Some(texture),
            ..Self::default()
        }
    }

    /// Replaces the sprite texture; it is uploaded on the next `draw`.
    pub fn set_texture(&mut self, texture: BillboardTexture) {
        self.pending_texture = Some(texture);
    }

    /// Copies the vertices written by the batch's last `update` to the GPU.
    ///
    /// The first call (or a batch with a different capacity) creates the vertex
    /// buffer from the batch's full pre-filled vertex array.
    pub fn upload(&mut self, ctx: &RenderCtx<'_>, batch: &BillboardBatch) {
        self.ensure_vertex_buffer(ctx, batch);

        let in_use = batch.vertices_in_use();
        if in_use.is_empty() {
            return;
        }
        let Some(vbo) = self.vertex_buffer.as_ref() else { return };
        ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(in_use));
    }

    /// Draws the batch's live billboards with `camera`.
    ///
    /// Call after `upload` in the same frame.
    pub fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        camera: &Camera,
        batch: &BillboardBatch,
    ) {
        let vertex_count = batch.vertex_count();
        if vertex_count == 0 {
            return;
        }

        self.ensure_pipeline(ctx);
        self.ensure_sampler(ctx);
        self.ensure_texture(ctx);
        self.ensure_bindings(ctx);

        // Mutating methods must happen before borrowing pipeline/buffers immutably.
        self.write_camera_uniform(ctx, camera.view_projection_matrix());

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(vbo) = self.vertex_buffer.as_ref() else {
            log::debug!("billboard renderer: draw before upload; skipped");
            return;
        };
        if vertex_count > self.vertex_capacity {
            return;
        }

        let mut rpass = target.load_pass("ember billboard pass");
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.draw(0..vertex_count as u32, 0..1);
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ember billboard shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/billboard.wgsl").into()),
        });

        let bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ember billboard bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(uniform_min_binding_size::<CameraUniform>()),
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
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ember billboard pipeline layout"),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ember billboard pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[BillboardVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(straight_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: triangle_list(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bgl);
        self.bind_group = None;
        self.camera_ubo = None;
    }

    fn ensure_sampler(&mut self, ctx: &RenderCtx<'_>) {
        if self.sampler.is_some() {
            return;
        }
        self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ember billboard sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        }));
    }

    fn ensure_texture(&mut self, ctx: &RenderCtx<'_>) {
        if self.texture.is_some() && self.pending_texture.is_none() {
            return;
        }
        let image = self.pending_texture.take().unwrap_or_default();

        let size = wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ember billboard texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.pixels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width()),
                rows_per_image: Some(image.height()),
            },
            size,
        );

        log::debug!("billboard renderer: texture {}×{} uploaded", image.width(), image.height());

        self.texture_view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.texture = Some(texture);
        self.bind_group = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.camera_ubo.is_some() {
            return;
        }

        let Some(bgl) = self.bind_group_layout.as_ref() else { return };
        let Some(view) = self.texture_view.as_ref() else { return };
        let Some(sampler) = self.sampler.as_ref() else { return };

        let camera_ubo = match self.camera_ubo.take() {
            Some(ubo) => ubo,
            None => ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("ember billboard camera ubo"),
                size: std::mem::size_of::<CameraUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
        };

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ember billboard bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        self.camera_ubo = Some(camera_ubo);
        self.bind_group = Some(bind_group);
    }

    fn ensure_vertex_buffer(&mut self, ctx: &RenderCtx<'_>, batch: &BillboardBatch) {
        let capacity = batch.vertices().len();
        if self.vertex_buffer.is_some() && self.vertex_capacity == capacity {
            return;
        }
        if capacity == 0 {
            return;
        }

        self.vertex_buffer = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ember billboard vbo"),
            contents: bytemuck::cast_slice(batch.vertices()),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        }));
        self.vertex_capacity = capacity;

        log::debug!("billboard renderer: vertex buffer for {capacity} vertices created");
    }

    fn write_camera_uniform(&mut self, ctx: &RenderCtx<'_>, view_proj: Mat4) {
        let Some(ubo) = self.camera_ubo.as_ref() else { return };
        let u = CameraUniform::new(view_proj, Mat4::IDENTITY);
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── texture validation ────────────────────────────────────────────────

    #[test]
    fn from_rgba8_accepts_exact_pixel_count() {
        let tex = BillboardTexture::from_rgba8(2, 3, vec![0; 24]).unwrap();
        assert_eq!((tex.width(), tex.height()), (2, 3));
    }

    #[test]
    fn from_rgba8_rejects_wrong_length() {
        let err = BillboardTexture::from_rgba8(2, 2, vec![0; 15]).unwrap_err();
        assert!(err.to_string().contains("needs 16 bytes"));
    }

    #[test]
    fn from_rgba8_rejects_zero_size() {
        assert!(BillboardTexture::from_rgba8(0, 4, Vec::new()).is_err());
    }

    // ── generated sprites ─────────────────────────────────────────────────

    #[test]
    fn soft_disc_is_opaque_in_the_middle_and_clear_at_corners() {
        let tex = BillboardTexture::soft_disc(32);
        assert_eq!(tex.pixels().len(), 32 * 32 * 4);

        let center = tex.pixel(16, 16).unwrap();
        let corner = tex.pixel(0, 0).unwrap();
        assert!(center[3] > 240);
        assert_eq!(corner[3], 0);
        assert_eq!(&center[..3], &[255, 255, 255]);
    }

    #[test]
    fn soft_disc_alpha_falls_off_monotonically() {
        let tex = BillboardTexture::soft_disc(64);
        let alphas: Vec<u8> = (32..64).map(|x| tex.pixel(x, 32).unwrap()[3]).collect();
        assert!(alphas.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn pixel_outside_image_is_none() {
        assert!(BillboardTexture::white().pixel(1, 0).is_none());
    }
}
