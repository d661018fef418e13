//! Texture loading on a background thread.
//!
//! The render thread [`request`](TextureLoader::request)s image paths and
//! [`drain`](TextureLoader::drain)s decoded RGBA8 pixels once per frame, so a
//! slow or missing file never delays a frame. Failures come back as
//! [`AssetLoadError`] for the caller to log; nothing is retried.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum AssetLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Decoded image ready for GPU upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTexture {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

/// Read and decode one image file to RGBA8. Runs on the calling thread.
pub fn decode_file(path: &Path) -> Result<DecodedTexture, AssetLoadError> {
    let bytes = std::fs::read(path).map_err(|source| AssetLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image = image::load_from_memory(&bytes)
        .map_err(|source| AssetLoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(DecodedTexture {
        path: path.to_path_buf(),
        width,
        height,
        rgba: image.into_raw(),
    })
}

type LoadResult = Result<DecodedTexture, AssetLoadError>;

/// One worker thread decoding requested textures in request order.
pub struct TextureLoader {
    request_sender: Option<crossbeam_channel::Sender<PathBuf>>,
    /// Second handle on the request queue, used to discard what the worker
    /// has not started on shutdown.
    pending_requests: crossbeam_channel::Receiver<PathBuf>,
    result_receiver: crossbeam_channel::Receiver<LoadResult>,
    worker: Option<JoinHandle<()>>,
    requested: HashSet<PathBuf>,
}

impl TextureLoader {
    pub fn new() -> Self {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<PathBuf>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();

        let pending_requests = request_rx.clone();
        let worker = std::thread::Builder::new()
            .name("texture-loader".into())
            .spawn(move || {
                while let Ok(path) = request_rx.recv() {
                    let result = decode_file(&path);
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            });
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!("Could not spawn texture loader thread, textures disabled: {err}");
                None
            }
        };

        Self {
            request_sender: worker.as_ref().map(|_| request_tx),
            pending_requests,
            result_receiver: result_rx,
            worker,
            requested: HashSet::new(),
        }
    }

    /// Queue `path` for decoding. Returns `false` if it was already requested
    /// or the loader has shut down.
    pub fn request(&mut self, path: impl Into<PathBuf>) -> bool {
        let Some(sender) = &self.request_sender else {
            return false;
        };
        let path = path.into();
        if !self.requested.insert(path.clone()) {
            return false;
        }
        debug!("Requesting texture {}", path.display());
        sender.send(path).is_ok()
    }

    /// Everything decoded since the last drain. Never blocks.
    pub fn drain(&self) -> Vec<LoadResult> {
        self.result_receiver.try_iter().collect()
    }

    /// Stop accepting requests, discard queued ones and join the worker once
    /// its current decode finishes. Returns how many requests were discarded.
    pub fn shutdown(&mut self) -> usize {
        self.request_sender.take();
        let discarded = self.pending_requests.try_iter().count();
        if discarded > 0 {
            debug!("Discarded {discarded} pending texture requests");
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        discarded
    }
}

impl Default for TextureLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TextureLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        image.save(&path).unwrap();
        path
    }

    fn wait_for(loader: &TextureLoader, n: usize) -> Vec<LoadResult> {
        let start = Instant::now();
        let mut results = Vec::new();
        while results.len() < n {
            results.extend(loader.drain());
            assert!(
                start.elapsed() < Duration::from_secs(10),
                "timed out waiting for textures"
            );
            std::thread::sleep(Duration::from_millis(5));
        }
        results
    }

    #[test]
    fn test_decode_png_to_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "star.png", 4, 2);
        let texture = decode_file(&path).unwrap();
        assert_eq!((texture.width, texture.height), (4, 2));
        assert_eq!(texture.rgba.len(), 4 * 2 * 4);
        assert_eq!(&texture.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = decode_file(&dir.path().join("missing.png"));
        assert!(matches!(result, Err(AssetLoadError::Io { .. })));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        assert!(matches!(
            decode_file(&path),
            Err(AssetLoadError::Decode { .. })
        ));
    }

    #[test]
    fn test_loader_delivers_results_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_png(dir.path(), "a.png", 8, 8);
        let bad = dir.path().join("missing.png");

        let mut loader = TextureLoader::new();
        assert!(loader.request(&good));
        assert!(loader.request(&bad));

        let results = wait_for(&loader, 2);
        assert!(matches!(&results[0], Ok(t) if t.path == good));
        assert!(matches!(&results[1], Err(AssetLoadError::Io { path, .. }) if *path == bad));
    }

    #[test]
    fn test_duplicate_request_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png", 1, 1);
        let mut loader = TextureLoader::new();
        assert!(loader.request(&path));
        assert!(!loader.request(&path));
        assert_eq!(wait_for(&loader, 1).len(), 1);
    }

    #[test]
    fn test_shutdown_discards_queued_requests() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = TextureLoader::new();
        for i in 0..64 {
            let path = write_png(dir.path(), &format!("{i}.png"), 64, 64);
            assert!(loader.request(path));
        }

        let discarded = loader.shutdown();
        // Only decodes the worker had already started make it through.
        let finished = loader.drain().len();
        assert_eq!(finished + discarded, 64);
        assert!(loader.drain().is_empty());
    }

    #[test]
    fn test_no_requests_after_shutdown() {
        let mut loader = TextureLoader::new();
        assert_eq!(loader.shutdown(), 0);
        assert!(!loader.request("late.png"));
        assert!(loader.drain().is_empty());
    }
}
