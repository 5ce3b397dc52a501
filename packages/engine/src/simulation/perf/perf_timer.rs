use super::FrameStats;

#[cfg(target_arch = "wasm32")]
type Mark = f64;
#[cfg(not(target_arch = "wasm32"))]
type Mark = std::time::Instant;

#[inline]
fn now() -> Mark {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::Instant::now()
    }
}

#[inline]
fn ms_since(mark: &Mark) -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        (js_sys::Date::now() - mark).max(0.0)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        mark.elapsed().as_secs_f64() * 1000.0
    }
}

/// Wall-clock time of the two passes of one frame (`Date.now()` in the
/// browser). Pass 2 stays at zero for draft frames.
pub(crate) struct PassTimer {
    mark: Mark,
    pass1_ms: f64,
    pass2_ms: f64,
}

impl PassTimer {
    pub(crate) fn start() -> Self {
        PassTimer { mark: now(), pass1_ms: 0.0, pass2_ms: 0.0 }
    }

    /// Closes pass 1; pass 2 is timed from here.
    pub(crate) fn end_pass1(&mut self) {
        self.pass1_ms = ms_since(&self.mark);
        self.mark = now();
    }

    pub(crate) fn end_pass2(&mut self) {
        self.pass2_ms = ms_since(&self.mark);
        self.mark = now();
    }

    pub(crate) fn record(&self, stats: &mut FrameStats) {
        stats.pass1_ms = self.pass1_ms;
        stats.pass2_ms = self.pass2_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_frames_report_no_pass2_time() {
        let mut timer = PassTimer::start();
        timer.end_pass1();
        let mut stats = FrameStats { pass2_ms: 5.0, ..FrameStats::default() };
        timer.record(&mut stats);
        assert!(stats.pass1_ms >= 0.0);
        assert_eq!(stats.pass2_ms, 0.0);
    }

    #[test]
    fn passes_are_timed_separately() {
        let mut timer = PassTimer::start();
        timer.end_pass1();
        std::thread::sleep(std::time::Duration::from_millis(2));
        timer.end_pass2();
        let mut stats = FrameStats::default();
        timer.record(&mut stats);
        assert!(stats.pass2_ms >= 1.0, "{}", stats.pass2_ms);
        assert!(stats.total_ms() >= stats.pass2_ms);
    }
}
