//! Password strength estimation.

use std::fmt;

use crate::generator::{PasswordOptions, universe_size};

/// Base-2 logarithm. Returns 0 for non-positive input.
pub fn log2(x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    x.ln() / std::f64::consts::LN_2
}

/// Entropy in bits of `password`, assuming it was drawn uniformly from the
/// universe described by `options`.
pub fn entropy(password: &str, options: &PasswordOptions) -> f64 {
    let size = universe_size(options);
    if size == 0 {
        return 0.0;
    }
    password.chars().count() as f64 * log2(size as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    Weak,
    Fair,
    Strong,
    Excellent,
}

impl Strength {
    pub fn from_bits(bits: f64) -> Self {
        if bits < 60.0 {
            Strength::Weak
        } else if bits < 80.0 {
            Strength::Fair
        } else if bits < 128.0 {
            Strength::Strong
        } else {
            Strength::Excellent
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strength::Weak => "weak",
            Strength::Fair => "fair",
            Strength::Strong => "strong",
            Strength::Excellent => "excellent",
        };
        f.write_str(label)
    }
}
