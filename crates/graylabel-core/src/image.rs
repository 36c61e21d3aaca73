//! Frame containers.
//!
//! All buffers are row-major. `RgbFrame` stores interleaved `R, G, B`
//! bytes; `HsvFrame` stores interleaved `H, S, V` bytes using the 8-bit
//! convention where hue degrees are halved (`0..180`) and saturation/value
//! span `0..=255`.

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

impl GrayImageView<'_> {
    /// Pixel value with coordinates clamped to the image (replicated border).
    #[inline]
    pub fn get_clamped(&self, x: i64, y: i64) -> u8 {
        let xc = x.clamp(0, self.width as i64 - 1) as usize;
        let yc = y.clamp(0, self.height as i64 - 1) as usize;
        self.data[yc * self.width + xc]
    }
}

/// Immutable RGB frame as delivered by a capture source or decoded from
/// storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbFrame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl RgbFrame {
    /// Wrap a raw interleaved RGB buffer. Returns `None` when the buffer
    /// length does not match `width * height * 3`.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        let expected = width.checked_mul(height)?.checked_mul(3)?;
        (data.len() == expected).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Frame filled with a single color.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Build a frame by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Apply a per-channel mapping, producing a new frame.
    pub fn map_channels(&self, mut f: impl FnMut(u8) -> u8) -> RgbFrame {
        RgbFrame {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Single-channel luma.
    pub fn to_gray(&self) -> GrayImage {
        let data = self
            .data
            .chunks_exact(3)
            .map(|px| rgb_to_luma(px[0], px[1], px[2]))
            .collect();
        GrayImage {
            width: self.width,
            height: self.height,
            data,
        }
    }

    pub fn to_hsv(&self) -> HsvFrame {
        let mut data = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(3) {
            let hsv = rgb_to_hsv(px[0], px[1], px[2]);
            data.extend_from_slice(&[hsv.h, hsv.s, hsv.v]);
        }
        HsvFrame {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

/// One 8-bit HSV sample (`h` in `0..180`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HsvFrame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl HsvFrame {
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Hsv {
        let i = (y * self.width + x) * 3;
        Hsv {
            h: self.data[i],
            s: self.data[i + 1],
            v: self.data[i + 2],
        }
    }

    /// Pixel at signed coordinates, `None` outside the frame.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> Option<Hsv> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.pixel(x as usize, y as usize))
    }
}

/// BT.601 luma in 14-bit fixed point, rounded.
#[inline]
pub fn rgb_to_luma(r: u8, g: u8, b: u8) -> u8 {
    const COEF_R: u32 = 4899;
    const COEF_G: u32 = 9617;
    const COEF_B: u32 = 1868;
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32 + (1 << 13)) >> 14) as u8
}

/// Convert one RGB sample to 8-bit HSV.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = (max - min) as f32;

    let s = if max == 0 {
        0
    } else {
        (255.0 * diff / max as f32).round() as u8
    };

    if diff == 0.0 {
        return Hsv { h: 0, s, v: max };
    }

    let (r, g, b) = (r as f32, g as f32, b as f32);
    let mut h = if max as f32 == r {
        60.0 * (g - b) / diff
    } else if max as f32 == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }
    let h = (h / 2.0).round() as u32 % 180;

    Hsv {
        h: h as u8,
        s,
        v: max,
    }
}
