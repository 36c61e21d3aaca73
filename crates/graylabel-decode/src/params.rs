use graylabel_core::RingSpec;
use serde::{Deserialize, Serialize};

/// Parameters of the label reader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelParams {
    /// A bit reads as `1` when the ring brightness is at least the reference
    /// brightness minus this margin (value channel units).
    pub on_threshold_margin: f32,
    /// Ring sampled around each pixel. Tighter than the scoring ring so
    /// neighbouring LEDs do not leak into the reading.
    pub ring: RingSpec,
}

impl Default for LabelParams {
    fn default() -> Self {
        Self {
            on_threshold_margin: 10.0,
            ring: RingSpec::new(1, 5, 30),
        }
    }
}
