use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use gamekit_shadergen::ffp::WORLD_VIEW_PROJ;
use gamekit_shadergen::writer::{TEXTURE_GROUP, UNIFORM_GROUP};
use gamekit_shadergen::{GeneratedShader, Pass, UniformBinding, UniformSlot};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::constants::pack_constant;
use crate::error::RenderError;
use crate::mesh::{AtlasQuad, VertexLayoutPlan, build_quads};
use crate::shaders;
use crate::texture::{AtlasImage, upload_atlas_image};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Grid lines start fading at `FADE_START` and vanish at `FADE_END`.
const FADE_START: f32 = 15.0;
const FADE_END: f32 = 45.0;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FloorUniforms {
    view_proj: [[f32; 4]; 4],
    fade: [f32; 4],
}

impl FloorUniforms {
    fn new(view_proj: Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            fade: [FADE_START, FADE_END, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FloorVertex {
    position: [f32; 3],
    weight: f32,
}

/// Grid lines on the ground plane `z = height`. Axes are brightest, every
/// fifth line is emphasized.
fn grid_mesh(half_extent: i32, spacing: f32, height: f32) -> Vec<FloorVertex> {
    let extent = half_extent as f32 * spacing;
    let mut verts = Vec::with_capacity((2 * half_extent as usize + 1) * 4);
    for i in -half_extent..=half_extent {
        let offset = i as f32 * spacing;
        let weight = match i {
            0 => 1.0,
            i if i % 5 == 0 => 0.5,
            _ => 0.0,
        };
        for position in [
            [-extent, offset, height],
            [extent, offset, height],
            [offset, -extent, height],
            [offset, extent, height],
        ] {
            verts.push(FloorVertex { position, weight });
        }
    }
    verts
}

/// What [`AtlasQuadRenderer::new`] builds its pipeline from.
pub struct AtlasScene<'a> {
    pub shader: &'a GeneratedShader,
    pub layout: &'a VertexLayoutPlan,
    pub quads: &'a [AtlasQuad],
    /// Bound to every texture unit of the shader.
    pub atlas: &'a AtlasImage,
    pub floor_height: f32,
}

/// Draws atlas-sampled quads with a generated shader over a grid floor.
pub struct AtlasQuadRenderer {
    atlas_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,
    bind_groups: Vec<wgpu::BindGroup>,
    uniform_buffers: BTreeMap<String, (UniformSlot, wgpu::Buffer)>,
    quad_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
    quad_index_count: u32,
    grid_uniform_buffer: wgpu::Buffer,
    grid_bind_group: wgpu::BindGroup,
    grid_vertex_buffer: wgpu::Buffer,
    grid_vertex_count: u32,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl AtlasQuadRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        scene: AtlasScene<'_>,
    ) -> Result<Self, RenderError> {
        let shader = scene.shader;
        let visibility = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;

        // Group 0: one buffer per uniform constant.
        let mut uniform_buffers = BTreeMap::new();
        let mut uniform_layout_entries = Vec::new();
        for slot in shader.uniforms.iter().filter(|s| s.group == UNIFORM_GROUP) {
            let size = slot
                .buffer_size()
                .ok_or_else(|| RenderError::UnknownUniform(slot.name.clone()))?;
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(slot.name.as_str()),
                size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            uniform_layout_entries.push(wgpu::BindGroupLayoutEntry {
                binding: slot.binding,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            });
            uniform_buffers.insert(slot.name.clone(), (slot.clone(), buffer));
        }
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("atlas_uniform_layout"),
            entries: &uniform_layout_entries,
        });
        let uniform_entries: Vec<wgpu::BindGroupEntry> = uniform_buffers
            .values()
            .map(|(slot, buffer)| wgpu::BindGroupEntry {
                binding: slot.binding,
                resource: buffer.as_entire_binding(),
            })
            .collect();
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("atlas_uniform_bind_group"),
            layout: &uniform_layout,
            entries: &uniform_entries,
        });

        // Group 1: the atlas texture and sampler for every unit.
        let atlas_texture = upload_atlas_image(device, queue, scene.atlas);
        let atlas_view = atlas_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let atlas_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("atlas_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let texture_slots: Vec<&UniformSlot> = shader
            .uniforms
            .iter()
            .filter(|s| s.group == TEXTURE_GROUP)
            .collect();
        let texture_layout_entries: Vec<wgpu::BindGroupLayoutEntry> = texture_slots
            .iter()
            .map(|slot| wgpu::BindGroupLayoutEntry {
                binding: slot.binding,
                visibility,
                ty: match slot.kind {
                    UniformBinding::Sampler { .. } => {
                        wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                    }
                    _ => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                },
                count: None,
            })
            .collect();
        let texture_entries: Vec<wgpu::BindGroupEntry> = texture_slots
            .iter()
            .map(|slot| wgpu::BindGroupEntry {
                binding: slot.binding,
                resource: match slot.kind {
                    UniformBinding::Sampler { .. } => wgpu::BindingResource::Sampler(&atlas_sampler),
                    _ => wgpu::BindingResource::TextureView(&atlas_view),
                },
            })
            .collect();

        let mut layouts = vec![uniform_layout];
        let mut bind_groups = vec![uniform_bind_group];
        if !texture_slots.is_empty() {
            let texture_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("atlas_texture_layout"),
                    entries: &texture_layout_entries,
                });
            bind_groups.push(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("atlas_texture_bind_group"),
                layout: &texture_layout,
                entries: &texture_entries,
            }));
            layouts.push(texture_layout);
        }
        let layout_refs: Vec<&wgpu::BindGroupLayout> = layouts.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("atlas_pipeline_layout"),
            bind_group_layouts: &layout_refs,
            push_constant_ranges: &[],
        });

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("atlas_shader"),
            source: wgpu::ShaderSource::Wgsl(shader.source.as_str().into()),
        });
        let attributes = scene.layout.wgpu_attributes();
        let atlas_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("atlas_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(shader.vertex_entry),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: scene.layout.stride_bytes(),
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(shader.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let (quad_vertices, quad_indices) = build_quads(scene.layout, scene.quads);
        let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vertex_buffer"),
            contents: bytemuck::cast_slice(&quad_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_index_buffer"),
            contents: bytemuck::cast_slice(&quad_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        // Grid pipeline
        let grid_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_uniform_buffer"),
            contents: bytemuck::bytes_of(&FloorUniforms::new(Mat4::IDENTITY)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let grid_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grid_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let grid_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grid_bind_group"),
            layout: &grid_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: grid_uniform_buffer.as_entire_binding(),
            }],
        });
        let grid_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grid_pipeline_layout"),
            bind_group_layouts: &[&grid_layout],
            push_constant_ranges: &[],
        });
        let grid_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grid_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::GRID_SHADER.into()),
        });
        let grid_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grid_pipeline"),
            layout: Some(&grid_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &grid_shader,
                entry_point: Some("vs_grid"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<FloorVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &grid_shader,
                entry_point: Some("fs_grid"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(depth_state()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });
        let grid_verts = grid_mesh(50, 1.0, scene.floor_height);
        let grid_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_vertex_buffer"),
            contents: bytemuck::cast_slice(&grid_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });

        tracing::info!(
            uniforms = uniform_buffers.len(),
            textures = texture_slots.len() / 2,
            quads = scene.quads.len(),
            stride = scene.layout.stride_bytes(),
            "atlas renderer ready"
        );

        Ok(Self {
            atlas_pipeline,
            grid_pipeline,
            bind_groups,
            uniform_buffers,
            quad_vertex_buffer,
            quad_index_buffer,
            quad_index_count: quad_indices.len() as u32,
            grid_uniform_buffer,
            grid_bind_group,
            grid_vertex_buffer,
            grid_vertex_count: grid_verts.len() as u32,
            depth_texture: Self::create_depth_texture(device, width, height),
            surface_format,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Copy constants changed on `pass` into their uniform buffers.
    /// Returns how many were written.
    pub fn flush_params(&self, queue: &wgpu::Queue, pass: &mut Pass) -> Result<usize, RenderError> {
        let mut dirty = pass.vertex_params.take_dirty();
        dirty.extend(pass.fragment_params.take_dirty());
        let written = dirty.len();
        for (name, values) in dirty {
            let (slot, buffer) = self
                .uniform_buffers
                .get(&name)
                .ok_or_else(|| RenderError::UnknownUniform(name.clone()))?;
            let packed = pack_constant(slot, &values)?;
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&packed));
            tracing::trace!(name = %slot.name, floats = packed.len(), "constant uploaded");
        }
        Ok(written)
    }

    /// Render one frame: grid floor, then the atlas quads.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        view_proj: Mat4,
        background: [f32; 4],
    ) {
        queue.write_buffer(
            &self.grid_uniform_buffer,
            0,
            bytemuck::bytes_of(&FloorUniforms::new(view_proj)),
        );
        if let Some((_, buffer)) = self.uniform_buffers.get(WORLD_VIEW_PROJ) {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&view_proj.to_cols_array()));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let [r, g, b, a] = background.map(f64::from);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.grid_pipeline);
            pass.set_bind_group(0, &self.grid_bind_group, &[]);
            pass.set_vertex_buffer(0, self.grid_vertex_buffer.slice(..));
            pass.draw(0..self.grid_vertex_count, 0..1);

            if self.quad_index_count > 0 {
                pass.set_pipeline(&self.atlas_pipeline);
                for (group, bind_group) in self.bind_groups.iter().enumerate() {
                    pass.set_bind_group(group as u32, bind_group, &[]);
                }
                pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
                pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..self.quad_index_count, 0, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

fn depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: Default::default(),
        bias: Default::default(),
    }
}
