//! Interpolators and the keyframe/spline data they sample.
//!
//! Curves are carried as stored; nothing here evaluates them.

use crate::error::Result;
use crate::nif_block;
use crate::refs::BlockRef;
use crate::stream::{NiStream, Streamable};

// ── Keys ─────────────────────────────────────────────────────────────────────

/// Interpolation mode of a key group. Decides which per-key fields follow
/// the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyType(pub u32);

impl KeyType {
    pub const NONE:         KeyType = KeyType(0);
    pub const LINEAR:       KeyType = KeyType(1);
    pub const QUADRATIC:    KeyType = KeyType(2);
    pub const TBC:          KeyType = KeyType(3);
    pub const XYZ_ROTATION: KeyType = KeyType(4);
    pub const CONSTANT:     KeyType = KeyType(5);
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloatKey {
    pub time:     f32,
    pub value:    f32,
    /// Quadratic tangents.
    pub forward:  f32,
    pub backward: f32,
    /// Tension, bias, continuity.
    pub tbc:      [f32; 3],
}

impl FloatKey {
    fn sync(&mut self, stream: &mut NiStream<'_>, interpolation: KeyType) -> Result<()> {
        stream.sync(&mut self.time)?;
        stream.sync(&mut self.value)?;
        match interpolation {
            KeyType::QUADRATIC => {
                stream.sync(&mut self.forward)?;
                stream.sync(&mut self.backward)
            }
            KeyType::TBC => stream.sync(&mut self.tbc),
            _ => Ok(()),
        }
    }
}

/// `u32` key count; the interpolation mode is only stored when there is at
/// least one key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloatKeyGroup {
    pub interpolation: KeyType,
    pub keys:          Vec<FloatKey>,
}

impl Streamable for FloatKeyGroup {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        let len = stream.sync_count::<u32>(self.keys.len())?;
        if len > 0 {
            stream.sync(&mut self.interpolation.0)?;
        }
        let interpolation = self.interpolation;
        if stream.is_reading() {
            self.keys.clear();
            for _ in 0..len {
                let mut key = FloatKey::default();
                key.sync(stream, interpolation)?;
                self.keys.push(key);
            }
            return Ok(());
        }
        for key in &mut self.keys {
            key.sync(stream, interpolation)?;
        }
        Ok(())
    }
}

// ── Data blocks ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NiFloatData {
    pub data: FloatKeyGroup,
}

impl Streamable for NiFloatData {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.data)
    }
}

nif_block!(NiFloatData = "NiFloatData" {});

/// Control points shared by every spline interpolator that points here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NiBSplineData {
    pub float_points: Vec<f32>,
    pub short_points: Vec<i16>,
}

impl Streamable for NiBSplineData {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync_f32_array::<u32>(&mut self.float_points)?;
        stream.sync_i16_array::<u32>(&mut self.short_points)
    }
}

nif_block!(NiBSplineData = "NiBSplineData" {});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NiBSplineBasisData {
    pub num_control_points: u32,
}

impl Streamable for NiBSplineBasisData {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.num_control_points)
    }
}

nif_block!(NiBSplineBasisData = "NiBSplineBasisData" {});

// ── Interpolators ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NiFloatInterpolator {
    /// Pose value used when there is no data.
    pub value: f32,
    pub data:  BlockRef<NiFloatData>,
}

impl Streamable for NiFloatInterpolator {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.value)?;
        stream.sync(&mut self.data)
    }
}

nif_block!(NiFloatInterpolator = "NiFloatInterpolator" { data });

/// Compressed float spline: short control points scaled by
/// `multiplier` around `bias`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NiBSplineCompFloatInterpolator {
    pub start:       f32,
    pub stop:        f32,
    pub spline_data: BlockRef<NiBSplineData>,
    pub basis_data:  BlockRef<NiBSplineBasisData>,
    pub base:        f32,
    pub offset:      u32,
    pub bias:        f32,
    pub multiplier:  f32,
}

impl Streamable for NiBSplineCompFloatInterpolator {
    fn sync(&mut self, stream: &mut NiStream<'_>) -> Result<()> {
        stream.sync(&mut self.start)?;
        stream.sync(&mut self.stop)?;
        stream.sync(&mut self.spline_data)?;
        stream.sync(&mut self.basis_data)?;
        stream.sync(&mut self.base)?;
        stream.sync(&mut self.offset)?;
        stream.sync(&mut self.bias)?;
        stream.sync(&mut self.multiplier)
    }
}

nif_block!(NiBSplineCompFloatInterpolator = "NiBSplineCompFloatInterpolator" { spline_data, basis_data });
