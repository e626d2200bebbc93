use crate::{COLOR_COUNT, ColorId, ThemeStore, default_rgba};

/// Read seam between the toolkit and the theme store. A source may be
/// unable to deliver individual entries; the cache degrades those to
/// the compiled-in defaults instead of failing.
pub trait ColorSource {
    fn version(&self) -> u64;
    fn read_color(&self, id: ColorId) -> Option<u32>;
}

impl ColorSource for ThemeStore {
    fn version(&self) -> u64 {
        ThemeStore::version(self)
    }

    fn read_color(&self, id: ColorId) -> Option<u32> {
        Some(ThemeStore::read_color(self, id))
    }
}

/// Stale-tolerant mirror of the store, one per toolkit environment.
/// Holds no reference to the store; the owner passes the source in on
/// each access.
#[derive(Debug, Clone)]
pub struct ColorCache {
    snapshot: [u32; COLOR_COUNT],
    version_seen: u64,
    valid: bool,
}

impl ColorCache {
    /// Probes only the source's version. The full pull is deferred to
    /// the first color access, so nothing pays for theme plumbing
    /// until a widget is actually drawn.
    #[must_use]
    pub fn new(source: &impl ColorSource) -> Self {
        Self {
            snapshot: [0; COLOR_COUNT],
            version_seen: source.version(),
            valid: false,
        }
    }

    /// Snapshot lookup, refreshing first when the cache was never
    /// filled or the source has moved on.
    pub fn get(&mut self, source: &impl ColorSource, id: ColorId) -> u32 {
        if !self.valid || self.version_seen != source.version() {
            self.refresh(source);
        }
        self.snapshot[id.index()]
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    fn refresh(&mut self, source: &impl ColorSource) {
        // Version first: a mutation racing the pull leaves us marked
        // stale rather than fresh.
        self.version_seen = source.version();
        for id in ColorId::ALL {
            self.snapshot[id.index()] = source
                .read_color(id)
                .unwrap_or_else(|| default_rgba(id));
        }
        self.valid = true;
    }
}
