use wasm_bindgen::prelude::*;

use super::{FrameStats, GrainProcessor};
use crate::core::{CpuCaps, PlaneMut, PlaneRef};
use crate::domain::GrainParams;

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Grain filter exposed to JavaScript.
///
/// Planes cross the boundary as packed `Float32Array`s of luminance in
/// `[0, 1]`; the result has the same layout.
#[wasm_bindgen]
pub struct GrainFilter {
    processor: GrainProcessor,
    last_stats: FrameStats,
}

#[wasm_bindgen]
impl GrainFilter {
    /// Create a filter from a JSON parameter object (missing fields take
    /// their defaults).
    #[wasm_bindgen(constructor)]
    pub fn new(params_json: &str) -> Result<GrainFilter, JsValue> {
        let caps = CpuCaps::from_target();
        Self::with_caps(params_json, caps.simd4, caps.simd8)
    }

    /// Same as the constructor, with explicit vector capabilities.
    #[wasm_bindgen(js_name = withCaps)]
    pub fn with_caps(params_json: &str, simd4: bool, simd8: bool) -> Result<GrainFilter, JsValue> {
        let params = GrainParams::from_json(params_json).map_err(js_error)?;
        let processor =
            GrainProcessor::with_defaults(params, CpuCaps::new(simd4, simd8)).map_err(js_error)?;
        Ok(Self { processor, last_stats: FrameStats::default() })
    }

    /// Render the grain of the first plane of frame `frame`.
    pub fn render(&mut self, src: &[f32], width: u32, height: u32, frame: u32) -> Result<Vec<f32>, JsValue> {
        self.render_plane(src, width, height, frame, 0)
    }

    /// Render the grain of plane `plane` of frame `frame`.
    #[wasm_bindgen(js_name = renderPlane)]
    pub fn render_plane(
        &mut self,
        src: &[f32],
        width: u32,
        height: u32,
        frame: u32,
        plane: u32,
    ) -> Result<Vec<f32>, JsValue> {
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 || src.len() != w * h {
            return Err(js_error(format!(
                "expected a {}x{} plane ({} samples), got {} samples",
                width,
                height,
                w * h,
                src.len()
            )));
        }

        let mut out = vec![0.0f32; w * h];
        self.last_stats = self.processor.process_plane(
            &mut PlaneMut::packed(&mut out, w, h),
            PlaneRef::packed(src, w, h),
            frame,
            plane,
        );
        Ok(out)
    }

    /// Statistics of the last rendered plane as JSON.
    #[wasm_bindgen(js_name = statsJson)]
    pub fn stats_json(&self) -> String {
        self.last_stats.to_json()
    }

    #[wasm_bindgen(js_name = clearStats)]
    pub fn clear_stats(&mut self) {
        self.last_stats.reset();
    }

    /// Effective parameters (defaults filled in) as JSON.
    #[wasm_bindgen(js_name = paramsJson)]
    pub fn params_json(&self) -> String {
        self.processor.params().to_json()
    }

    #[wasm_bindgen(getter)]
    pub fn simd(&self) -> String {
        self.processor.level().name().to_string()
    }

    #[wasm_bindgen(getter, js_name = pointCount)]
    pub fn point_count(&self) -> u32 {
        self.processor.kernel().point_count() as u32
    }
}
