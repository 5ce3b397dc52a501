use serde::{Deserialize, Serialize};

use crate::core::GrainError;

/// Grain filter parameters, as received from the host.
///
/// Field names follow the host-side option names; JSON uses the same names
/// in camelCase and every field is optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GrainParams {
    /// Vision filter standard deviation, in pixels. 0 = box filter.
    pub sigma: f32,
    /// Number of kernel sample points per output pixel.
    pub res: i32,
    /// Mean grain radius, in pixels.
    pub rad: f32,
    /// Grain radius log-normal deviation. 0 = constant radius.
    pub dev: f32,
    /// Base random seed.
    pub seed: u32,
    /// Constant grain across frames.
    pub cf: bool,
    /// Constant grain across planes.
    pub cp: bool,
    /// Skip the grain intersection pass.
    pub draft: bool,
}

impl Default for GrainParams {
    fn default() -> Self {
        Self {
            sigma: 0.35,
            res: 1024,
            rad: 0.025,
            dev: 0.0,
            seed: 12345,
            cf: false,
            cp: false,
            draft: false,
        }
    }
}

pub fn check_sigma(sigma: f32) -> bool {
    (0.0..=1.0).contains(&sigma)
}

pub fn check_res(res: i32) -> bool {
    res > 0
}

pub fn check_rad(rad: f32) -> bool {
    rad > 0.0
}

pub fn check_dev(dev: f32) -> bool {
    (0.0..=1.0).contains(&dev)
}

impl GrainParams {
    /// Parses a JSON parameter object and validates it.
    pub fn from_json(json: &str) -> Result<Self, GrainError> {
        let params: GrainParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Checks every parameter; the first offending one is reported.
    pub fn validate(&self) -> Result<(), GrainError> {
        if !check_sigma(self.sigma) {
            return Err(GrainError::InvalidSigma(self.sigma));
        }
        if !check_res(self.res) {
            return Err(GrainError::InvalidResolution(self.res));
        }
        if !check_rad(self.rad) {
            return Err(GrainError::InvalidRadius(self.rad));
        }
        if !check_dev(self.dev) {
            return Err(GrainError::InvalidDeviation(self.dev));
        }
        Ok(())
    }

    /// Seed of one picture plane.
    ///
    /// Planes get consecutive seeds and frames are spaced by 4, so up to four
    /// planes never share a seed with another frame.
    pub fn picture_seed(&self, frame_idx: u32, plane_idx: u32) -> u32 {
        let plane_term = if self.cp { 0 } else { plane_idx };
        let frame_term = if self.cf { 0 } else { frame_idx.wrapping_mul(4) };
        self.seed.wrapping_add(plane_term).wrapping_add(frame_term)
    }
}
