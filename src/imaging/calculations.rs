//! Pure calculation functions for rendition dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// What to do for one rendition of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenditionPlan {
    /// Source already fits: copy the original bytes verbatim.
    Copy,
    /// Resample to exactly these dimensions.
    Resize { width: u32, height: u32 },
}

/// Scale `source` uniformly so its longer edge equals `bound`.
///
/// Equivalent to `ratio = min(bound / w, bound / h)` with each output
/// dimension truncated toward zero. Integer arithmetic keeps the longer edge
/// exactly at `bound`; no dimension drops below 1.
///
/// # Examples
/// ```
/// # use portfolio_media::imaging::fit_within_bound;
/// // 3000x2000 landscape into a 1200 box -> 1200x800
/// assert_eq!(fit_within_bound((3000, 2000), 1200), (1200, 800));
///
/// // 2000x3000 portrait into a 400 box -> 266x400
/// assert_eq!(fit_within_bound((2000, 3000), 400), (266, 400));
/// ```
pub fn fit_within_bound(source: (u32, u32), bound: u32) -> (u32, u32) {
    let (w, h) = source;
    let longer = w.max(h).max(1) as u64;
    let scale = |edge: u32| -> u32 {
        let scaled = edge as u64 * bound as u64 / longer;
        (scaled as u32).max(1)
    };
    if w >= h {
        (bound.max(1), scale(h))
    } else {
        (scale(w), bound.max(1))
    }
}

/// Decide between copy and resize for a source of `oriented` dimensions.
///
/// Never upscales: a source whose longer edge is within `bound` is copied.
pub fn plan_rendition(oriented: (u32, u32), bound: u32) -> RenditionPlan {
    let (w, h) = oriented;
    if w.max(h) <= bound {
        RenditionPlan::Copy
    } else {
        let (width, height) = fit_within_bound(oriented, bound);
        RenditionPlan::Resize { width, height }
    }
}
