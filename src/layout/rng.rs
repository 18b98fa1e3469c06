use crate::layout::Vec2;

/// Small xorshift generator so a seed fully determines a layout
#[derive(Debug, Clone)]
pub(crate) struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub(crate) fn new(seed: u64) -> Self {
        // splitmix64 scramble so that neighbouring seeds diverge immediately
        let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        Self {
            state: if z == 0 { 0x2545_F491_4F6C_DD1D } else { z },
        }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform in `[0, 1)`
    pub(crate) fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `[-half, half)` on both axes
    pub(crate) fn point_in_square(&mut self, half: f64) -> Vec2 {
        Vec2::new(
            (self.next_f64() * 2.0 - 1.0) * half,
            (self.next_f64() * 2.0 - 1.0) * half,
        )
    }

    pub(crate) fn direction(&mut self) -> Vec2 {
        let angle = self.next_f64() * std::f64::consts::TAU;
        Vec2::new(angle.cos(), angle.sin())
    }
}
