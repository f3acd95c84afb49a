//! Frame cache and windowed preloader.
//!
//! The cache tracks one [`LoadState`] per frame index for the current device
//! class. Loads are fire-and-forget: [`FrameCache::ensure_range`] hands a
//! [`FetchRequest`] to a [`FrameFetcher`] and the host later reports the
//! outcome with [`FrameCache::complete`] or [`FrameCache::fail`], quoting the
//! request's [`LoadTicket`]. Tickets carry the cache generation, so results
//! that arrive after [`FrameCache::invalidate`] are discarded.

use std::collections::HashMap;

use log::{debug, warn};

use crate::{path, DeviceProfile};

/// Load state of a single frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState<I> {
    /// Never requested in this generation
    Unrequested,
    /// Request issued, result pending
    Loading,
    /// Image available
    Loaded(I),
    /// The fetch failed; not retried until the cache is invalidated
    Failed,
}

impl<I> LoadState<I> {
    #[inline]
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadState::Loaded(_))
    }
}

/// Identifies one issued request: which frame, for which cache generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub generation: u64,
    pub index: u32,
}

/// A request handed to the fetcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: LoadTicket,
    /// Asset locator produced by the path resolver
    pub locator: String,
}

/// Starts asynchronous image loads.
///
/// Implement this for your I/O mechanism (`HtmlImageElement` in the browser,
/// a decoder thread natively, a recorder in tests). `fetch` must not block;
/// the result is reported back to the cache through the engine.
///
/// Return `Err` when the load could not even be started; the frame is then
/// recorded as failed straight away.
///
/// No `Send` bounds: works in single-threaded WASM contexts.
pub trait FrameFetcher {
    fn fetch(&mut self, request: FetchRequest) -> Result<(), String>;
}

/// Outcome of reporting a finished load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// Ticket from an older generation (or not in flight); ignored
    Stale,
    /// Stored, but too far from the target frame to warrant a repaint
    Stored,
    /// Stored within the notification radius; the target should be redrawn
    Repaint,
}

/// Counts of frames per load state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub loading: usize,
    pub loaded: usize,
    pub failed: usize,
}

impl CacheStats {
    /// Number of frames that have been requested in this generation.
    #[inline]
    pub fn requested(&self) -> usize {
        self.loading + self.loaded + self.failed
    }
}

/// Per-device-class frame cache.
#[derive(Debug)]
pub struct FrameCache<I> {
    entries: HashMap<u32, LoadState<I>>,
    generation: u64,
    notify_radius: u32,
}

impl<I> FrameCache<I> {
    /// Create an empty cache. Completed loads within `notify_radius` frames
    /// of the current target report [`Completion::Repaint`].
    pub fn new(notify_radius: u32) -> Self {
        Self {
            entries: HashMap::new(),
            generation: 0,
            notify_radius,
        }
    }

    /// Current generation; bumped by every [`invalidate`](Self::invalidate).
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn notify_radius(&self) -> u32 {
        self.notify_radius
    }

    /// Request every unrequested frame in `[lo, hi]`.
    ///
    /// Frames already loading, loaded or failed are skipped, so calling this
    /// twice with the same bounds issues no duplicate requests. Returns the
    /// number of requests issued; a request the fetcher refuses is not
    /// counted and leaves the frame `Failed`.
    pub fn ensure_range<F: FrameFetcher + ?Sized>(
        &mut self,
        lo: u32,
        hi: u32,
        profile: &DeviceProfile,
        fetcher: &mut F,
    ) -> usize {
        let mut issued = 0;
        for index in lo..=hi {
            if self.entries.contains_key(&index) {
                continue;
            }
            let request = FetchRequest {
                ticket: LoadTicket {
                    generation: self.generation,
                    index,
                },
                locator: path::resolve(profile, index),
            };
            match fetcher.fetch(request) {
                Ok(()) => {
                    self.entries.insert(index, LoadState::Loading);
                    issued += 1;
                }
                Err(err) => {
                    warn!("could not request frame {index}: {err}");
                    self.entries.insert(index, LoadState::Failed);
                }
            }
        }
        issued
    }

    /// Record a successful load.
    ///
    /// `target` is the frame currently intended for display; it decides
    /// whether the caller should repaint.
    pub fn complete(&mut self, ticket: LoadTicket, image: I, target: u32) -> Completion {
        if !self.accepts(ticket) {
            debug!(
                "discarding stale load of frame {} (generation {} != {})",
                ticket.index, ticket.generation, self.generation
            );
            return Completion::Stale;
        }
        self.entries.insert(ticket.index, LoadState::Loaded(image));
        if ticket.index.abs_diff(target) <= self.notify_radius {
            Completion::Repaint
        } else {
            Completion::Stored
        }
    }

    /// Record a failed load. Returns `false` for stale tickets.
    pub fn fail(&mut self, ticket: LoadTicket) -> bool {
        if !self.accepts(ticket) {
            return false;
        }
        warn!("frame {} failed to load", ticket.index);
        self.entries.insert(ticket.index, LoadState::Failed);
        true
    }

    fn accepts(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.generation
            && matches!(self.entries.get(&ticket.index), Some(LoadState::Loading))
    }

    /// The loaded image for `index`, if any.
    #[inline]
    pub fn get(&self, index: u32) -> Option<&I> {
        match self.entries.get(&index) {
            Some(LoadState::Loaded(image)) => Some(image),
            _ => None,
        }
    }

    /// Load state of `index`.
    pub fn state(&self, index: u32) -> LoadState<&I> {
        match self.entries.get(&index) {
            None => LoadState::Unrequested,
            Some(LoadState::Unrequested) => LoadState::Unrequested,
            Some(LoadState::Loading) => LoadState::Loading,
            Some(LoadState::Loaded(image)) => LoadState::Loaded(image),
            Some(LoadState::Failed) => LoadState::Failed,
        }
    }

    /// Closest loaded frame to `target` within `radius`.
    ///
    /// The exact frame wins; otherwise candidates are tried at increasing
    /// distance, the earlier frame first at equal distance.
    pub fn nearest_loaded(&self, target: u32, radius: u32) -> Option<(u32, &I)> {
        if let Some(image) = self.get(target) {
            return Some((target, image));
        }
        for distance in 1..=radius {
            let below = target.checked_sub(distance);
            let above = target.checked_add(distance);
            for candidate in [below, above].into_iter().flatten() {
                if let Some(image) = self.get(candidate) {
                    return Some((candidate, image));
                }
            }
        }
        None
    }

    /// Drop every entry and start a new generation.
    ///
    /// Loads still in flight for the old generation become no-ops when they
    /// complete.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.generation = self.generation.wrapping_add(1);
        debug!("frame cache invalidated (generation {})", self.generation);
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        for state in self.entries.values() {
            match state {
                LoadState::Unrequested => {}
                LoadState::Loading => stats.loading += 1,
                LoadState::Loaded(_) => stats.loaded += 1,
                LoadState::Failed => stats.failed += 1,
            }
        }
        stats
    }

    /// Number of tracked (requested) frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetcher that records requests instead of performing them.
///
/// Useful for hosts that batch requests themselves and in tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingFetcher {
    pub requests: Vec<FetchRequest>,
}

impl RecordingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all recorded requests, leaving the recorder empty.
    pub fn drain(&mut self) -> Vec<FetchRequest> {
        std::mem::take(&mut self.requests)
    }
}

impl FrameFetcher for RecordingFetcher {
    fn fetch(&mut self, request: FetchRequest) -> Result<(), String> {
        self.requests.push(request);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> DeviceProfile {
        DeviceProfile::new("/adaline_frames")
    }

    fn ticket(cache: &FrameCache<&'static str>, index: u32) -> LoadTicket {
        LoadTicket {
            generation: cache.generation(),
            index,
        }
    }

    #[test]
    fn ensure_range_is_idempotent() {
        let mut cache: FrameCache<&str> = FrameCache::new(2);
        let mut fetcher = RecordingFetcher::new();

        assert_eq!(cache.ensure_range(136, 148, &desktop(), &mut fetcher), 13);
        assert_eq!(cache.ensure_range(136, 148, &desktop(), &mut fetcher), 0);
        assert_eq!(fetcher.requests.len(), 13);
        assert_eq!(fetcher.requests[0].locator, "/adaline_frames/136.jpg");
        assert_eq!(fetcher.requests[12].locator, "/adaline_frames/148.jpg");
        assert_eq!(cache.state(140), LoadState::Loading);
    }

    #[test]
    fn overlapping_ranges_only_request_new_frames() {
        let mut cache: FrameCache<&str> = FrameCache::new(2);
        let mut fetcher = RecordingFetcher::new();
        cache.ensure_range(10, 20, &desktop(), &mut fetcher);
        fetcher.drain();

        assert_eq!(cache.ensure_range(15, 25, &desktop(), &mut fetcher), 5);
        let indices: Vec<u32> = fetcher.requests.iter().map(|r| r.ticket.index).collect();
        assert_eq!(indices, vec![21, 22, 23, 24, 25]);
    }

    #[test]
    fn completion_notifies_near_target_only() {
        let mut cache = FrameCache::new(2);
        let mut fetcher = RecordingFetcher::new();
        cache.ensure_range(100, 120, &desktop(), &mut fetcher);

        assert_eq!(cache.complete(ticket(&cache, 102), "a", 100), Completion::Repaint);
        assert_eq!(cache.complete(ticket(&cache, 108), "b", 100), Completion::Stored);
        assert_eq!(cache.get(102), Some(&"a"));
        assert_eq!(cache.get(108), Some(&"b"));
    }

    #[test]
    fn completion_requires_in_flight_request() {
        let mut cache = FrameCache::new(2);
        // Never requested.
        assert_eq!(cache.complete(ticket(&cache, 5), "x", 5), Completion::Stale);
        assert_eq!(cache.get(5), None);
    }

    #[test]
    fn invalidate_discards_loaded_and_in_flight() {
        let mut cache = FrameCache::new(2);
        let mut fetcher = RecordingFetcher::new();
        cache.ensure_range(140, 144, &desktop(), &mut fetcher);
        let old = ticket(&cache, 142);
        cache.complete(ticket(&cache, 141), "loaded", 142);

        cache.invalidate();
        assert!(cache.is_empty());
        assert_eq!(cache.get(141), None);
        assert_eq!(cache.state(141), LoadState::Unrequested);

        // Late result from the old generation.
        assert_eq!(cache.complete(old, "late", 142), Completion::Stale);
        assert_eq!(cache.get(142), None);
        assert!(!cache.fail(old));
    }

    #[test]
    fn failed_frames_are_not_rerequested() {
        let mut cache: FrameCache<&str> = FrameCache::new(2);
        let mut fetcher = RecordingFetcher::new();
        cache.ensure_range(1, 3, &desktop(), &mut fetcher);
        assert!(cache.fail(ticket(&cache, 2)));
        assert_eq!(cache.state(2), LoadState::Failed);

        fetcher.drain();
        assert_eq!(cache.ensure_range(1, 3, &desktop(), &mut fetcher), 0);

        cache.invalidate();
        assert_eq!(cache.ensure_range(1, 3, &desktop(), &mut fetcher), 3);
    }

    #[test]
    fn refused_requests_are_recorded_as_failed() {
        struct OddOnly;
        impl FrameFetcher for OddOnly {
            fn fetch(&mut self, request: FetchRequest) -> Result<(), String> {
                if request.ticket.index % 2 == 1 {
                    Ok(())
                } else {
                    Err("no image element".into())
                }
            }
        }

        let mut cache: FrameCache<&str> = FrameCache::new(2);
        assert_eq!(cache.ensure_range(1, 4, &desktop(), &mut OddOnly), 2);
        assert_eq!(cache.state(1), LoadState::Loading);
        assert_eq!(cache.state(2), LoadState::Failed);
        assert_eq!(cache.stats().failed, 2);
        // Refused frames are not retried within the generation.
        assert_eq!(cache.ensure_range(1, 4, &desktop(), &mut OddOnly), 0);
    }

    #[test]
    fn nearest_loaded_searches_outward() {
        let mut cache = FrameCache::new(2);
        let mut fetcher = RecordingFetcher::new();
        cache.ensure_range(0, 30, &desktop(), &mut fetcher);
        cache.complete(ticket(&cache, 13), "13", 10);
        cache.complete(ticket(&cache, 7), "7", 10);

        // Equal distance: earlier frame wins.
        assert_eq!(cache.nearest_loaded(10, 6), Some((7, &"7")));
        assert_eq!(cache.nearest_loaded(12, 6), Some((13, &"13")));
        assert_eq!(cache.nearest_loaded(13, 6), Some((13, &"13")));
        assert_eq!(cache.nearest_loaded(25, 6), None);
        // Near zero the lower side is simply skipped.
        assert_eq!(cache.nearest_loaded(1, 6), Some((7, &"7")));
    }

    #[test]
    fn stats_track_states() {
        let mut cache = FrameCache::new(2);
        let mut fetcher = RecordingFetcher::new();
        cache.ensure_range(1, 4, &desktop(), &mut fetcher);
        cache.complete(ticket(&cache, 1), "1", 1);
        cache.fail(ticket(&cache, 2));

        let stats = cache.stats();
        assert_eq!(stats.loaded, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.loading, 2);
        assert_eq!(stats.requested(), 4);
    }
}
