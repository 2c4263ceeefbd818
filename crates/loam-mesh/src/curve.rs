/// Piecewise-linear remap applied to raw heights before scaling.
///
/// No keys means identity. Inputs outside the key range clamp to the end values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeightCurve {
    keys: Vec<(f32, f32)>,
}

impl HeightCurve {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn from_keys(keys: Vec<(f32, f32)>) -> Self {
        Self { keys }
    }

    #[inline]
    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }

    pub fn is_sorted(&self) -> bool {
        self.keys.windows(2).all(|w| w[0].0 <= w[1].0)
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => return t,
        };
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }
        // First key strictly past `t`; the one before it brackets `t` from below.
        let hi = self.keys.partition_point(|k| k.0 <= t);
        let (t0, v0) = self.keys[hi - 1];
        let (t1, v1) = self.keys[hi];
        let span = t1 - t0;
        if span <= 0.0 {
            return v1;
        }
        v0 + (v1 - v0) * ((t - t0) / span)
    }
}
