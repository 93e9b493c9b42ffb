//! Provider metadata types usable across crates.

use serde::{Deserialize, Serialize};

/// Typed key for identifying providers in selections and records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProviderKey(pub &'static str);

impl ProviderKey {
    /// Construct a new typed provider key from a static name.
    ///
    /// This is useful when restricting a search to a subset of providers.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the inner static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl From<ProviderKey> for &'static str {
    fn from(k: ProviderKey) -> Self {
        k.0
    }
}

impl core::fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.0)
    }
}

/// Finest and coarsest resolution (meters per pixel) a provider can aggregate at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolutionLimits {
    /// Finest supported resolution.
    pub min_meters_per_pixel: f64,
    /// Coarsest supported resolution.
    pub max_meters_per_pixel: f64,
}

impl ResolutionLimits {
    /// True when both bounds are finite and positive and `min <= max`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let (lo, hi) = (self.min_meters_per_pixel, self.max_meters_per_pixel);
        lo.is_finite() && hi.is_finite() && lo > 0.0 && lo <= hi
    }

    /// Clamp a requested resolution into the supported span.
    ///
    /// `None` when the limits themselves are unusable (see [`is_valid`](Self::is_valid)).
    #[must_use]
    pub fn clamp(&self, meters_per_pixel: f64) -> Option<f64> {
        self.is_valid()
            .then(|| meters_per_pixel.clamp(self.min_meters_per_pixel, self.max_meters_per_pixel))
    }
}

impl Default for ResolutionLimits {
    fn default() -> Self {
        Self {
            min_meters_per_pixel: 10.0,
            max_meters_per_pixel: 1500.0,
        }
    }
}
