/// Simple seeded Linear Congruential Generator for deterministic numerics.
///
/// Both the topic model initialization and the embedding need reproducible
/// draws; a fixed-constant LCG keeps identical input + identical seed
/// producing identical output on every run, with no platform-dependent state.
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        // LCG constants from Numerical Recipes
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform draw in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        // Use the top 53 bits; low LCG bits have short periods.
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Standard normal draw via Box-Muller.
    pub fn next_gaussian(&mut self) -> f64 {
        let u1 = self.next_f64().max(f64::MIN_POSITIVE);
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}
