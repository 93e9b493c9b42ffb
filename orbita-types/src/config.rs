//! Configuration types shared across the orchestrator and connectors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{IntervalLength, Months};

/// How statistics series are laid out by the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RenderMode {
    /// One layer per chart; every primary channel is drawn.
    #[default]
    Single,
    /// Several layers side by side; each layer may show at most `max_channels`
    /// primary channels. A series exceeding it is marked unavailable.
    Compare {
        /// Primary channels the compare layout can render per layer.
        max_channels: usize,
    },
}

/// Global configuration for the `Orbita` orchestrator.
///
/// Missing fields take their [`Default`] values. Durations are encoded as
/// (fractional) seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitaConfig {
    /// Timeout for individual provider requests (one page or one chunk).
    #[serde(with = "secs")]
    pub provider_timeout: Duration,
    /// Optional overall deadline for fan-out operations (compare-mode statistics).
    #[serde(with = "opt_secs")]
    pub request_timeout: Option<Duration>,
    /// Records requested per provider page.
    pub page_size: usize,
    /// Widest window a single statistics request may cover.
    #[serde(with = "secs")]
    pub max_chunk_span: Duration,
    /// Default statistics interval length.
    pub interval: IntervalLength,
    /// Default allowed-months filter for searches.
    pub months: Months,
    /// Drop statistics samples whose auxiliary value (percent) exceeds this.
    pub max_auxiliary_value: Option<u8>,
    /// Request histograms and derive distribution bands.
    pub distribution: bool,
    /// Decimal places kept in derived value ranges.
    pub value_precision: u32,
    /// Layout the statistics are rendered in.
    pub render_mode: RenderMode,
}

impl Default for OrbitaConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
            request_timeout: None,
            page_size: 50,
            max_chunk_span: Duration::from_secs(365 * 24 * 60 * 60),
            interval: IntervalLength::default(),
            months: Months::all(),
            max_auxiliary_value: None,
            distribution: false,
            value_precision: 2,
            render_mode: RenderMode::Single,
        }
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

mod opt_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(d)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(D::Error::custom))
            .transpose()
    }
}
