//! Procedural atlas images: each record's region gets its own tinted
//! checkerboard so sub-rectangle sampling is visible.

use gamekit_atlas::TextureAtlasRecord;

/// RGBA8 pixels, row-major from the top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

const PALETTE: [[u8; 3]; 6] = [
    [34, 139, 34],
    [134, 96, 67],
    [120, 120, 120],
    [200, 170, 60],
    [60, 110, 200],
    [170, 60, 160],
];

/// Magenta marks texels no record covers.
const UNCOVERED: [u8; 4] = [255, 0, 255, 255];

impl AtlasImage {
    /// Paint `records` into a `size`×`size` image.
    pub fn from_records(records: &[TextureAtlasRecord], size: u32, checks: u32) -> Self {
        let size = size.max(1);
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let u = (x as f32 + 0.5) / size as f32;
                let v = (y as f32 + 0.5) / size as f32;
                let texel = records
                    .iter()
                    .enumerate()
                    .find(|(_, r)| {
                        u >= r.offset_u
                            && u < r.offset_u + r.width
                            && v >= r.offset_v
                            && v < r.offset_v + r.height
                    })
                    .map(|(i, r)| {
                        let local_u = (u - r.offset_u) / r.width;
                        let local_v = (v - r.offset_v) / r.height;
                        checker(PALETTE[i % PALETTE.len()], local_u, local_v, checks)
                    })
                    .unwrap_or(UNCOVERED);
                pixels.extend_from_slice(&texel);
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    pub fn texel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.pixels.get(i..i + 4)?.try_into().ok()
    }
}

fn checker(base: [u8; 3], u: f32, v: f32, checks: u32) -> [u8; 4] {
    let checks = checks.max(1) as f32;
    let odd = ((u * checks) as u32 + (v * checks) as u32) % 2 == 1;
    let shade = |c: u8| if odd { c / 2 } else { c };
    [shade(base[0]), shade(base[1]), shade(base[2]), 255]
}

/// Upload `image` as a sampled sRGB texture.
pub fn upload_atlas_image(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &AtlasImage,
) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("atlas_texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
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
        &image.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(image.width * 4),
            rows_per_image: Some(image.height),
        },
        size,
    );
    texture
}
