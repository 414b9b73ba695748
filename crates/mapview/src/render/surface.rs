use image::RgbaImage;

use crate::sprites::{PixelRect, Rgb};

use super::ScreenRect;

/// Placement of one sprite on an [`OutputSurface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlitParams {
    pub x: i32,
    pub y: i32,
    /// Nearest-neighbour scale factor; non-positive or non-finite values draw at 1.0.
    pub scale: f64,
    /// Multiplied into every source pixel's alpha.
    pub alpha: u8,
    /// Part of the source image to draw; the whole image when `None`.
    pub source: Option<PixelRect>,
    /// Nothing outside this screen rectangle is written.
    pub clip: ScreenRect,
}

/// 2D pixel target the renderer composites into.
pub trait OutputSurface {
    fn size(&self) -> (u32, u32);
    fn clear_rect(&mut self, rect: ScreenRect, color: Rgb);
    fn blit(&mut self, image: &RgbaImage, params: &BlitParams);
}

impl OutputSurface for RgbaImage {
    fn size(&self) -> (u32, u32) {
        self.dimensions()
    }

    fn clear_rect(&mut self, rect: ScreenRect, color: Rgb) {
        let (width, height) = self.dimensions();
        fill_rect_rgba(self, width, height, rect, color);
    }

    fn blit(&mut self, image: &RgbaImage, params: &BlitParams) {
        let (width, height) = self.dimensions();
        blit_rgba(self, width, height, image, params);
    }
}

/// Borrowed RGBA8 frame, row-major with no padding (the `pixels` frame layout).
#[derive(Debug)]
pub struct FrameBuffer<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> FrameBuffer<'a> {
    /// Returns `None` when `frame` is smaller than `width * height` pixels.
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Option<Self> {
        let expected = width as usize * height as usize * 4;
        if frame.len() < expected {
            return None;
        }
        Some(Self {
            frame,
            width,
            height,
        })
    }
}

impl OutputSurface for FrameBuffer<'_> {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear_rect(&mut self, rect: ScreenRect, color: Rgb) {
        fill_rect_rgba(self.frame, self.width, self.height, rect, color);
    }

    fn blit(&mut self, image: &RgbaImage, params: &BlitParams) {
        blit_rgba(self.frame, self.width, self.height, image, params);
    }
}

fn fill_rect_rgba(frame: &mut [u8], width: u32, height: u32, rect: ScreenRect, color: Rgb) {
    let Some(area) = rect.intersect(&ScreenRect::new(0, 0, width, height)) else {
        return;
    };
    let pixel = [color.r, color.g, color.b, 255];
    let frame_width = width as usize;
    for y in area.y..area.bottom() {
        let row = y as usize * frame_width * 4;
        for x in area.x..area.right() {
            let offset = row + x as usize * 4;
            frame[offset..offset + 4].copy_from_slice(&pixel);
        }
    }
}

fn normalized_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

/// Nearest-neighbour scaled, source-over blended copy of `params.source`.
fn blit_rgba(frame: &mut [u8], width: u32, height: u32, image: &RgbaImage, params: &BlitParams) {
    if params.alpha == 0 || width == 0 || height == 0 {
        return;
    }
    let source = params
        .source
        .unwrap_or_else(|| PixelRect::new(0, 0, image.width(), image.height()));
    if !source.fits_within(image.width(), image.height()) {
        return;
    }

    let scale = normalized_scale(params.scale);
    let inv_scale = scale.recip();
    let scaled_w = (f64::from(source.w) * scale).round().max(1.0) as i32;
    let scaled_h = (f64::from(source.h) * scale).round().max(1.0) as i32;
    let target = ScreenRect::new(params.x, params.y, scaled_w as u32, scaled_h as u32);
    let Some(area) = target
        .intersect(&params.clip)
        .and_then(|area| area.intersect(&ScreenRect::new(0, 0, width, height)))
    else {
        return;
    };

    let frame_width = width as usize;
    let pixels = image.as_raw();
    let image_width = image.width() as usize;
    for out_y in area.y..area.bottom() {
        let dy = f64::from(out_y - params.y);
        let src_y = ((dy * inv_scale).floor() as u32).min(source.h - 1) + source.y;
        let src_row = src_y as usize * image_width * 4;
        let dst_row = out_y as usize * frame_width * 4;

        for out_x in area.x..area.right() {
            let dx = f64::from(out_x - params.x);
            let src_x = ((dx * inv_scale).floor() as u32).min(source.w - 1) + source.x;
            let src = src_row + src_x as usize * 4;
            let alpha = mul_alpha(pixels[src + 3], params.alpha);
            if alpha == 0 {
                continue;
            }
            let dst = dst_row + out_x as usize * 4;
            if alpha == u8::MAX {
                frame[dst..dst + 3].copy_from_slice(&pixels[src..src + 3]);
                frame[dst + 3] = u8::MAX;
                continue;
            }
            let inverse = u32::from(u8::MAX - alpha);
            for channel in 0..3 {
                let over = u32::from(pixels[src + channel]) * u32::from(alpha);
                let under = u32::from(frame[dst + channel]) * inverse;
                frame[dst + channel] = ((over + under + 127) / 255) as u8;
            }
            let under_alpha = u32::from(frame[dst + 3]) * inverse;
            frame[dst + 3] = (u32::from(alpha) + (under_alpha + 127) / 255).min(255) as u8;
        }
    }
}

fn mul_alpha(a: u8, b: u8) -> u8 {
    ((u32::from(a) * u32::from(b) + 127) / 255) as u8
}
