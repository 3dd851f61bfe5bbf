//! Software implementation of [`DrawSurface`] over an RGBA image
//!
//! Drawing calls take logical pixels; the pixmap holds device pixels
//! (`logical * pixel_ratio`). Rectangles get exact area coverage, lines get
//! distance-based coverage, both blended with straight (non-premultiplied)
//! alpha in the stored image.

use glam::Vec2;
use image::{Rgba, RgbaImage};
use sandwind_core::Color;
use sandwind_engine::{CompositeMode, DrawSurface, LineCap};
use sandwind_runtime::SurfaceSize;

pub struct PixmapSurface {
    image: RgbaImage,
    scale: f32,
    fill: Color,
    stroke: Color,
    line_width: f32,
    line_cap: LineCap,
    global_alpha: f32,
    composite: CompositeMode,
}

impl PixmapSurface {
    /// Transparent pixmap sized for a logical surface
    pub fn new(size: SurfaceSize) -> Self {
        let (width, height) = size.device_pixels();
        Self {
            image: RgbaImage::new(width, height),
            scale: size.pixel_ratio,
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            global_alpha: 1.0,
            composite: CompositeMode::SourceOver,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Copy of the pixmap composited over an opaque background colour
    pub fn flatten(&self, background: Color) -> RgbaImage {
        let bg = background.with_alpha(1.0).to_rgba8();
        let mut out = RgbaImage::from_pixel(self.width(), self.height(), Rgba(bg));
        for (x, y, px) in self.image.enumerate_pixels() {
            let [r, g, b, a] = px.0;
            if a == 0 {
                continue;
            }
            let src = [unit(r), unit(g), unit(b), unit(a)];
            let dst = out.get_pixel_mut(x, y);
            dst.0 = source_over(src, dst.0);
        }
        out
    }

    /// Number of pixels with any coverage
    pub fn painted_pixels(&self) -> usize {
        self.image.pixels().filter(|p| p.0[3] > 0).count()
    }

    fn blend(&mut self, x: u32, y: u32, color: Color, coverage: f32) {
        let alpha = (color.a * self.global_alpha * coverage).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let src = [color.r, color.g, color.b, alpha];
        let dst = self.image.get_pixel_mut(x, y);
        dst.0 = match self.composite {
            CompositeMode::SourceOver => source_over(src, dst.0),
            CompositeMode::Lighter => lighter(src, dst.0),
        };
    }

    /// Clamp a device-space span to pixel indices `[start, end)`
    fn span(min: f32, max: f32, limit: u32) -> (u32, u32) {
        let start = min.floor().max(0.0);
        let end = max.ceil().min(limit as f32);
        if end <= start {
            return (0, 0);
        }
        (start as u32, end as u32)
    }
}

impl DrawSurface for PixmapSurface {
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if ![x, y, width, height].iter().all(|v| v.is_finite()) {
            return;
        }
        let (x0, x1) = ordered(x * self.scale, (x + width) * self.scale);
        let (y0, y1) = ordered(y * self.scale, (y + height) * self.scale);
        let (sx, ex) = Self::span(x0, x1, self.width());
        let (sy, ey) = Self::span(y0, y1, self.height());

        for py in sy..ey {
            for px in sx..ex {
                let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
                if cx >= x0 && cx <= x1 && cy >= y0 && cy <= y1 {
                    self.image.put_pixel(px, py, Rgba([0, 0, 0, 0]));
                }
            }
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if ![x, y, width, height].iter().all(|v| v.is_finite()) {
            return;
        }
        let (x0, x1) = ordered(x * self.scale, (x + width) * self.scale);
        let (y0, y1) = ordered(y * self.scale, (y + height) * self.scale);
        let (sx, ex) = Self::span(x0, x1, self.width());
        let (sy, ey) = Self::span(y0, y1, self.height());
        let color = self.fill;

        for py in sy..ey {
            let cover_y = overlap(py as f32, y0, y1);
            if cover_y <= 0.0 {
                continue;
            }
            for px in sx..ex {
                let cover = overlap(px as f32, x0, x1) * cover_y;
                if cover > 0.0 {
                    self.blend(px, py, color, cover);
                }
            }
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2) {
        if !(from.is_finite() && to.is_finite()) {
            return;
        }
        let half = (self.line_width * self.scale * 0.5).max(0.0);
        if half <= 0.0 {
            return;
        }
        let mut a = from * self.scale;
        let mut b = to * self.scale;
        let axis = b - a;
        let length = axis.length();
        let dir = if length > 0.0 { axis / length } else { Vec2::ZERO };

        if length <= 0.0 && self.line_cap != LineCap::Round {
            return;
        }
        if self.line_cap == LineCap::Square {
            a -= dir * half;
            b += dir * half;
        }
        let segment = b - a;
        let segment_len_sq = segment.length_squared();

        // thin lines fade instead of vanishing
        let thin = (half * 2.0).min(1.0);
        let pad = half + 1.0;
        let (sx, ex) = Self::span(a.x.min(b.x) - pad, a.x.max(b.x) + pad, self.width());
        let (sy, ey) = Self::span(a.y.min(b.y) - pad, a.y.max(b.y) + pad, self.height());
        let color = self.stroke;

        for py in sy..ey {
            for px in sx..ex {
                let center = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let t = if segment_len_sq > 0.0 {
                    (center - a).dot(segment) / segment_len_sq
                } else {
                    0.0
                };
                if self.line_cap != LineCap::Round && !(0.0..=1.0).contains(&t) {
                    continue;
                }
                let nearest = a + segment * t.clamp(0.0, 1.0);
                let distance = center.distance(nearest);
                let cover = (half + 0.5 - distance).clamp(0.0, 1.0) * thin;
                if cover > 0.0 {
                    self.blend(px, py, color, cover);
                }
            }
        }
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill = color;
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.stroke = color;
    }

    fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.line_width = width;
        }
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.line_cap = cap;
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() {
            self.global_alpha = alpha.clamp(0.0, 1.0);
        }
    }

    fn set_composite_mode(&mut self, mode: CompositeMode) {
        self.composite = mode;
    }
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Length of `[pixel, pixel + 1]` inside `[min, max]`
fn overlap(pixel: f32, min: f32, max: f32) -> f32 {
    ((pixel + 1.0).min(max) - pixel.max(min)).clamp(0.0, 1.0)
}

fn unit(channel: u8) -> f32 {
    f32::from(channel) / 255.0
}

fn quantize(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn source_over(src: [f32; 4], dst: [u8; 4]) -> [u8; 4] {
    let sa = src[3];
    let da = unit(dst[3]);
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let mix = |s: f32, d: u8| (s * sa + unit(d) * da * (1.0 - sa)) / out_a;
    [
        quantize(mix(src[0], dst[0])),
        quantize(mix(src[1], dst[1])),
        quantize(mix(src[2], dst[2])),
        quantize(out_a),
    ]
}

/// Additive blend on premultiplied values, like canvas `lighter`
fn lighter(src: [f32; 4], dst: [u8; 4]) -> [u8; 4] {
    let sa = src[3];
    let da = unit(dst[3]);
    let out_a = (sa + da).min(1.0);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let add = |s: f32, d: u8| (s * sa + unit(d) * da).min(out_a) / out_a;
    [
        quantize(add(src[0], dst[0])),
        quantize(add(src[1], dst[1])),
        quantize(add(src[2], dst[2])),
        quantize(out_a),
    ]
}
