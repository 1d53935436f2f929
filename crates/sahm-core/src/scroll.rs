//! Scroll-position trigger for infinite loading.

/// Distance from the bottom, in pixels, at which the next page is requested.
pub const DEFAULT_SCROLL_THRESHOLD: f64 = 1000.0;

/// Viewport geometry at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub content_height: f64,
}

impl ScrollMetrics {
    pub const fn new(scroll_top: f64, viewport_height: f64, content_height: f64) -> Self {
        Self {
            scroll_top,
            viewport_height,
            content_height,
        }
    }

    /// Unseen content below the viewport.
    pub fn remaining(&self) -> f64 {
        self.content_height - (self.scroll_top + self.viewport_height)
    }
}

/// Anything that can report its current scroll geometry.
pub trait Viewport: Send + Sync {
    fn metrics(&self) -> ScrollMetrics;
}

impl Viewport for ScrollMetrics {
    fn metrics(&self) -> ScrollMetrics {
        *self
    }
}

/// Controller flags that suppress the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollGate {
    pub has_more: bool,
    pub is_loading_more: bool,
    pub is_rate_limited: bool,
    pub is_searching: bool,
}

impl ScrollGate {
    pub const fn is_open(self) -> bool {
        self.has_more && !self.is_loading_more && !self.is_rate_limited && !self.is_searching
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfiniteScroll {
    threshold: f64,
}

impl Default for InfiniteScroll {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_THRESHOLD)
    }
}

impl InfiniteScroll {
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn should_load_more(&self, metrics: ScrollMetrics, gate: ScrollGate) -> bool {
        gate.is_open() && metrics.remaining() <= self.threshold
    }
}
