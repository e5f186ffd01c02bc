//! Viewport contract for scroll restoration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Scroll offsets in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

impl ScrollPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The scrollable surface a page view renders into.
#[async_trait]
pub trait Viewport: Send + Sync {
    /// Resolves at the next paint frame.
    async fn next_frame(&self);

    fn scroll_to(&self, position: ScrollPosition);
}
