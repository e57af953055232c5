use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use image::RgbImage;
use lru::LruCache;
use parking_lot::RwLock;

use super::{ImageSource, Tile, TileError};

/// Called with the source identifier after a raw image lands in the cache.
/// Runs on a worker task; it should only schedule a repaint.
pub type ReadyCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Scaled tile lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub source: String,
    pub cols: u16,
    pub rows: u16,
}

struct CacheState {
    raw: LruCache<String, Arc<RgbImage>>,
    scaled: LruCache<TileKey, Tile>,
    /// Sources with a fetch in flight
    loading: HashSet<String>,
}

/// Memoized images, shared between the render loop and loader tasks.
///
/// Raw decoded images are kept per source and scaled variants per
/// (source, cols, rows). A miss on the raw image starts one background
/// load per source; concurrent requests for the same source while it loads
/// are no-ops. No lock is held across a fetch, decode or resize.
///
/// With `max_entries` set, both maps evict least recently used entries.
/// Without it they grow for the lifetime of the session.
pub struct TileCache {
    state: RwLock<CacheState>,
    source: Arc<dyn ImageSource>,
    on_ready: ReadyCallback,
}

impl TileCache {
    pub fn new(
        source: Arc<dyn ImageSource>,
        max_entries: Option<usize>,
        on_ready: ReadyCallback,
    ) -> Arc<Self> {
        let (raw, scaled) = match max_entries.and_then(NonZeroUsize::new) {
            Some(cap) => (LruCache::new(cap), LruCache::new(cap)),
            None => (LruCache::unbounded(), LruCache::unbounded()),
        };

        Arc::new(Self {
            state: RwLock::new(CacheState {
                raw,
                scaled,
                loading: HashSet::new(),
            }),
            source,
            on_ready,
        })
    }

    /// Tile for `source` scaled to cover `cols` x `rows` cells.
    ///
    /// On a scaled miss with the raw image cached, the tile is computed and
    /// stored before returning. On a raw miss a background load is started
    /// and `None` returned; `on_ready` fires when a retry will succeed.
    pub fn get(self: &Arc<Self>, source: &str, cols: u16, rows: u16) -> Option<Tile> {
        if source.is_empty() || cols == 0 || rows == 0 {
            return None;
        }
        let key = TileKey {
            source: source.to_string(),
            cols,
            rows,
        };

        let raw = {
            let state = self.state.read();
            if let Some(tile) = state.scaled.peek(&key) {
                let tile = tile.clone();
                drop(state);
                self.touch(&key);
                return Some(tile);
            }
            state.raw.peek(source).cloned()
        };

        let Some(raw) = raw else {
            self.load_async(source);
            return None;
        };

        let tile = Tile::cover(&raw, cols, rows);
        self.state.write().scaled.put(key, tile.clone());
        Some(tile)
    }

    /// Start loading `source` unless it is cached or already loading.
    pub fn load_async(self: &Arc<Self>, source: &str) {
        {
            let mut state = self.state.write();
            if state.loading.contains(source) || state.raw.contains(source) {
                return;
            }
            state.loading.insert(source.to_string());
        }

        let cache = Arc::clone(self);
        let source = source.to_string();
        tokio::spawn(async move {
            let result = cache.fetch_and_decode(&source).await;

            let loaded = {
                let mut state = cache.state.write();
                state.loading.remove(&source);
                match result {
                    Ok(image) => {
                        state.raw.put(source.clone(), Arc::new(image));
                        true
                    }
                    Err(e) => {
                        tracing::warn!(source = %source, error = %e, "Image load failed");
                        false
                    }
                }
            };

            if loaded {
                tracing::debug!(source = %source, "Image loaded");
                (cache.on_ready)(&source);
            }
        });
    }

    async fn fetch_and_decode(&self, source: &str) -> Result<RgbImage, TileError> {
        let bytes = self.source.fetch(source).await?;
        tokio::task::spawn_blocking(move || {
            image::load_from_memory(&bytes)
                .map(|image| image.to_rgb8())
                .map_err(|e| TileError::Decode(e.to_string()))
        })
        .await
        .map_err(|e| TileError::Decode(format!("decode task failed: {e}")))?
    }

    /// Best-effort recency bump; skipped when a writer holds the lock.
    fn touch(&self, key: &TileKey) {
        if let Some(mut state) = self.state.try_write() {
            state.scaled.get(key);
        }
    }

    pub fn is_loading(&self, source: &str) -> bool {
        self.state.read().loading.contains(source)
    }

    pub fn has_raw(&self, source: &str) -> bool {
        self.state.read().raw.contains(source)
    }

    /// Number of scaled tiles held.
    pub fn tile_count(&self) -> usize {
        self.state.read().scaled.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([200, 100, 50]));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// Serves the same bytes for every source and counts requests.
    struct FakeSource {
        body: Vec<u8>,
        calls: AtomicUsize,
    }

    impl ImageSource for FakeSource {
        fn fetch(&self, _source: &str) -> BoxFuture<'_, Result<Vec<u8>, TileError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = self.body.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(body)
            }
            .boxed()
        }
    }

    fn cache_with(
        body: Vec<u8>,
        max_entries: Option<usize>,
    ) -> (Arc<TileCache>, Arc<FakeSource>, mpsc::UnboundedReceiver<String>) {
        let source = Arc::new(FakeSource {
            body,
            calls: AtomicUsize::new(0),
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let cache = TileCache::new(
            source.clone(),
            max_entries,
            Arc::new(move |s: &str| {
                let _ = tx.send(s.to_string());
            }),
        );
        (cache, source, rx)
    }

    async fn wait_idle(cache: &TileCache, source: &str) {
        for _ in 0..200 {
            if !cache.is_loading(source) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("load for {source} never finished");
    }

    #[tokio::test]
    async fn test_miss_loads_then_hits() {
        let (cache, _, mut ready) = cache_with(png(100, 50), None);

        assert!(cache.get("img", 24, 12).is_none());
        assert_eq!(ready.recv().await.as_deref(), Some("img"));

        let tile = cache.get("img", 24, 12).unwrap();
        assert_eq!((tile.cols(), tile.rows()), (48, 12));
        assert_eq!(cache.tile_count(), 1);
    }

    #[tokio::test]
    async fn test_load_async_is_single_flight() {
        let (cache, source, mut ready) = cache_with(png(4, 4), None);

        cache.load_async("img");
        cache.load_async("img");
        assert!(cache.get("img", 2, 1).is_none());
        ready.recv().await;

        // Loaded sources are not fetched again
        cache.load_async("img");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_decode_failure_leaves_no_entry() {
        let (cache, source, _ready) = cache_with(b"not an image".to_vec(), None);

        assert!(cache.get("bad", 4, 2).is_none());
        wait_idle(&cache, "bad").await;
        assert!(!cache.has_raw("bad"));

        // A later request retries
        assert!(cache.get("bad", 4, 2).is_none());
        wait_idle(&cache, "bad").await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_sized_request_is_none_without_fetch() {
        let (cache, source, _ready) = cache_with(png(4, 4), None);
        assert!(cache.get("img", 0, 5).is_none());
        assert!(cache.get("", 5, 5).is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bounded_cache_evicts_oldest_tile() {
        let (cache, _, mut ready) = cache_with(png(8, 8), Some(2));
        cache.load_async("img");
        ready.recv().await;

        cache.get("img", 2, 1).unwrap();
        cache.get("img", 4, 2).unwrap();
        cache.get("img", 6, 3).unwrap();
        assert_eq!(cache.tile_count(), 2);
    }
}
