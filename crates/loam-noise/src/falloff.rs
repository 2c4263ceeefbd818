use crate::HeightMap;

const FALLOFF_A: f32 = 3.0;
const FALLOFF_B: f32 = 2.2;

/// Square mask that is ~0 in the middle and rises to 1 at the edges.
pub fn generate_falloff_map(size: usize) -> HeightMap {
    let mut values = Vec::with_capacity(size * size);
    let denom = size.max(1) as f32;
    for y in 0..size {
        for x in 0..size {
            let u = x as f32 / denom * 2.0 - 1.0;
            let v = y as f32 / denom * 2.0 - 1.0;
            values.push(falloff_curve(u.abs().max(v.abs())));
        }
    }
    HeightMap::from_values(size, size, values)
}

#[inline]
fn falloff_curve(v: f32) -> f32 {
    let a = v.powf(FALLOFF_A);
    let b = (FALLOFF_B - FALLOFF_B * v).powf(FALLOFF_A);
    if a + b > 0.0 { a / (a + b) } else { 0.0 }
}

/// `clamp01(h - mask)` per sample. Maps of different sizes are left untouched.
pub fn apply_falloff(map: &HeightMap, mask: &HeightMap) -> HeightMap {
    if map.width() != mask.width() || map.height() != mask.height() {
        return map.clone();
    }
    map.map(|x, y, h| (h - mask.get(x, y)).clamp(0.0, 1.0))
}
