//! Cell-centred fields and their boundary classification.

use std::fmt;
use std::str::FromStr;

use bytemuck::Pod;
use serde::{Deserialize, Serialize};

use crate::data::DeviceBuffer;
use crate::mesh_error::MeshError;

/// Boundary condition class of a field on one patch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatchFieldKind {
    ZeroGradient,
    Mixed,
    DirectionMixed,
    /// Any other condition (fixed value, coupled, ...).
    Other,
}

impl PatchFieldKind {
    /// Whether near-patch weights are replaced by upwind weights.
    #[inline]
    pub fn stabilises_weights(self) -> bool {
        matches!(
            self,
            PatchFieldKind::ZeroGradient | PatchFieldKind::Mixed | PatchFieldKind::DirectionMixed
        )
    }

    /// Whether near-patch explicit corrections are zeroed.
    ///
    /// Narrower than [`stabilises_weights`](Self::stabilises_weights):
    /// `DirectionMixed` keeps its correction.
    #[inline]
    pub fn stabilises_correction(self) -> bool {
        matches!(self, PatchFieldKind::ZeroGradient | PatchFieldKind::Mixed)
    }

    pub fn type_name(self) -> &'static str {
        match self {
            PatchFieldKind::ZeroGradient => "zeroGradient",
            PatchFieldKind::Mixed => "mixed",
            PatchFieldKind::DirectionMixed => "directionMixed",
            PatchFieldKind::Other => "other",
        }
    }
}

impl fmt::Display for PatchFieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for PatchFieldKind {
    type Err = std::convert::Infallible;

    /// Unknown condition names classify as [`PatchFieldKind::Other`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "zeroGradient" => PatchFieldKind::ZeroGradient,
            "mixed" => PatchFieldKind::Mixed,
            "directionMixed" => PatchFieldKind::DirectionMixed,
            _ => PatchFieldKind::Other,
        })
    }
}

/// A named cell-centred field with one boundary classification per patch.
#[derive(Debug)]
pub struct VolField<T: Pod> {
    name: String,
    values: DeviceBuffer<T>,
    patch_kinds: Vec<PatchFieldKind>,
}

impl<T: Pod> VolField<T> {
    pub fn new(
        name: impl Into<String>,
        values: DeviceBuffer<T>,
        patch_kinds: Vec<PatchFieldKind>,
    ) -> Self {
        Self {
            name: name.into(),
            values,
            patch_kinds,
        }
    }

    pub fn from_host(
        name: impl Into<String>,
        values: &[T],
        patch_kinds: Vec<PatchFieldKind>,
    ) -> Result<Self, MeshError> {
        Ok(Self::new(name, DeviceBuffer::from_host(values)?, patch_kinds))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn values(&self) -> &DeviceBuffer<T> {
        &self.values
    }

    #[inline]
    pub fn patch_kinds(&self) -> &[PatchFieldKind] {
        &self.patch_kinds
    }

    /// Classification of patch `i`, if the field has one.
    pub fn patch_kind(&self, i: usize) -> Option<PatchFieldKind> {
        self.patch_kinds.get(i).copied()
    }
}
