//! The physical output (monitor) cache.
//!
//! Querying display topology is expensive, so the cache is read-mostly:
//! [`OutputCache::flush`] first checks whether anything went stale and
//! returns immediately if not. On a detected staleness the entire cache
//! is rebuilt from scratch; consumers must not retain references into it
//! across a flush.

use fxhash::FxHashMap;

/// Identifies one physical monitor. On Windows this is the `HMONITOR`
/// value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MonitorId(pub u64);

/// A read-only snapshot of one output's mode and color capabilities,
/// captured at enumeration time. Callers re-flush the owning cache to
/// observe changes.
#[derive(Clone, Debug, PartialEq)]
pub struct Output {
    pub monitor: MonitorId,
    /// Adapter-facing device name (e.g. `\\.\DISPLAY1`).
    pub device_name: String,
    /// Human-readable monitor name.
    pub display_name: String,
    pub desktop_rect: api::Rect,
    pub refresh_rate: api::Rational,
    pub color_depth: u32,
    pub color_space: api::ColorSpace,
    pub hdr_supported: bool,
    pub hdr_enabled: bool,
    /// CIE xy chromaticity of the red/green/blue primaries and the white
    /// point.
    pub red_primary: [f32; 2],
    pub green_primary: [f32; 2],
    pub blue_primary: [f32; 2],
    pub white_point: [f32; 2],
    /// Luminance capabilities in nits.
    pub min_luminance: f32,
    pub max_luminance: f32,
    pub max_full_frame_luminance: f32,
    /// The white level an SDR image is presented at, in nits.
    pub sdr_white_nits: f32,
}

/// Enumerates outputs and checks snapshots for freshness. The production
/// implementation lives in the DXGI helpers; tests substitute their own.
pub trait OutputProvider {
    /// Whether the snapshot still matches the live topology.
    fn is_current(&self, output: &Output) -> bool;

    fn enumerate(&self) -> Vec<Output>;
}

/// A mapping from monitor handle to output snapshot.
pub struct OutputCache<P> {
    provider: P,
    outputs: FxHashMap<MonitorId, Output>,
}

impl<P: OutputProvider> OutputCache<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            outputs: FxHashMap::default(),
        }
    }

    /// Refreshes the cache if it is empty or any cached output reports
    /// stale. Returns whether a rebuild happened.
    pub fn flush(&mut self) -> bool {
        if !self.outputs.is_empty()
            && self
                .outputs
                .values()
                .all(|output| self.provider.is_current(output))
        {
            return false;
        }

        self.outputs.clear();
        for output in self.provider.enumerate() {
            log::debug!(
                "output cache: {} ({}) {}x{} @ {:.1} Hz hdr={}",
                output.device_name,
                output.display_name,
                output.desktop_rect.width(),
                output.desktop_rect.height(),
                output.refresh_rate.as_f32(),
                output.hdr_enabled,
            );
            self.outputs.insert(output.monitor, output);
        }
        true
    }

    pub fn get(&self, monitor: MonitorId) -> Option<&Output> {
        self.outputs.get(&monitor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Output> {
        self.outputs.values()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn output(monitor: u64, generation: u32) -> Output {
        Output {
            monitor: MonitorId(monitor),
            device_name: format!(r"\\.\DISPLAY{monitor}"),
            display_name: "Test Monitor".into(),
            desktop_rect: api::Rect {
                left: 0,
                top: 0,
                right: 1920,
                bottom: 1080,
            },
            refresh_rate: api::Rational {
                numerator: 60000 + generation,
                denominator: 1000,
            },
            color_depth: 8,
            color_space: api::ColorSpace::SrgbNonLinear,
            hdr_supported: false,
            hdr_enabled: false,
            red_primary: [0.64, 0.33],
            green_primary: [0.30, 0.60],
            blue_primary: [0.15, 0.06],
            white_point: [0.3127, 0.3290],
            min_luminance: 0.1,
            max_luminance: 300.0,
            max_full_frame_luminance: 270.0,
            sdr_white_nits: 80.0,
        }
    }

    struct StubProvider {
        generation: Rc<Cell<u32>>,
        enumerations: Rc<Cell<u32>>,
    }

    impl OutputProvider for StubProvider {
        fn is_current(&self, output: &Output) -> bool {
            output.refresh_rate.numerator == 60000 + self.generation.get()
        }

        fn enumerate(&self) -> Vec<Output> {
            self.enumerations.set(self.enumerations.get() + 1);
            vec![
                output(1, self.generation.get()),
                output(2, self.generation.get()),
            ]
        }
    }

    #[test]
    fn flush_skips_rebuild_while_current() {
        let generation = Rc::new(Cell::new(0));
        let enumerations = Rc::new(Cell::new(0));
        let mut cache = OutputCache::new(StubProvider {
            generation: Rc::clone(&generation),
            enumerations: Rc::clone(&enumerations),
        });

        // Empty cache always rebuilds.
        assert!(cache.flush());
        assert_eq!(cache.len(), 2);
        assert_eq!(enumerations.get(), 1);

        // Nothing stale, so no enumeration happens.
        assert!(!cache.flush());
        assert!(!cache.flush());
        assert_eq!(enumerations.get(), 1);

        // A mode change invalidates every snapshot and rebuilds once.
        generation.set(1);
        assert!(cache.flush());
        assert_eq!(enumerations.get(), 2);
        assert_eq!(
            cache.get(MonitorId(1)).unwrap().refresh_rate.numerator,
            60001
        );
    }

    #[test]
    fn rebuild_replaces_the_whole_container() {
        let generation = Rc::new(Cell::new(0));
        let enumerations = Rc::new(Cell::new(0));
        let mut cache = OutputCache::new(StubProvider {
            generation: Rc::clone(&generation),
            enumerations: Rc::clone(&enumerations),
        });
        cache.flush();

        let before: Vec<MonitorId> = cache.iter().map(|o| o.monitor).collect();
        assert_eq!(before.len(), 2);

        generation.set(2);
        cache.flush();
        assert_eq!(cache.len(), 2);
        assert!(cache.get(MonitorId(3)).is_none());
    }
}
