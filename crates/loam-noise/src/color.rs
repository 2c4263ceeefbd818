use serde::Deserialize;

use crate::HeightMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);
    pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);

    #[inline]
    pub fn lerp(a: Rgba, b: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mut out = [0u8; 4];
        for (i, o) in out.iter_mut().enumerate() {
            let av = f32::from(a.0[i]);
            let bv = f32::from(b.0[i]);
            *o = (av + (bv - av) * t).round() as u8;
        }
        Rgba(out)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub name: String,
    /// Minimum normalized height for this region, in `[0, 1]`.
    pub threshold: f32,
    pub color: Rgba,
}

/// Regions ordered by ascending threshold.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionTable {
    regions: Vec<Region>,
}

impl RegionTable {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    #[inline]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// True when thresholds never decrease along the table.
    pub fn is_ascending(&self) -> bool {
        self.regions
            .windows(2)
            .all(|w| w[0].threshold <= w[1].threshold)
    }
}

/// Colour of the highest-threshold region at or below `height`.
///
/// The walk stops at the first threshold above `height`. Among equal thresholds
/// the first declared region wins. `None` when `height` sits below every region.
pub fn classify(height: f32, table: &RegionTable) -> Option<Rgba> {
    let mut matched: Option<&Region> = None;
    for region in table.regions() {
        if height < region.threshold {
            break;
        }
        match matched {
            Some(prev) if region.threshold <= prev.threshold => {}
            _ => matched = Some(region),
        }
    }
    matched.map(|r| r.color)
}

/// Per-cell colours for the interior of a chunk, row-major `edge × edge`.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorMap {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgba>,
}

impl ColorMap {
    /// Classifies the interior cells of a bordered map (rim excluded).
    pub fn from_heights(map: &HeightMap, table: &RegionTable) -> Self {
        let w = map.width().saturating_sub(2);
        let h = map.height().saturating_sub(2);
        let mut pixels = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                let v = map.get(x + 1, y + 1);
                pixels.push(classify(v, table).unwrap_or(Rgba::BLACK));
            }
        }
        Self {
            width: w,
            height: h,
            pixels,
        }
    }

    /// Black-to-white ramp over every sample of `map`.
    pub fn grayscale(map: &HeightMap) -> Self {
        let pixels = map
            .values()
            .iter()
            .map(|&v| Rgba::lerp(Rgba::BLACK, Rgba::WHITE, v))
            .collect();
        Self {
            width: map.width(),
            height: map.height(),
            pixels,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Rgba {
        self.pixels[y * self.width + x]
    }
}
