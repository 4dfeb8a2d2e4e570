//! Fakes shared by the unit tests.
use std::collections::HashMap;
use std::io::{Error as IoError, ErrorKind, Read};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::*;

/// A lookup wrapping a `HashMap`, which remembers every locator it was asked to open.
pub(crate) struct MapLookup {
    files: Mutex<HashMap<String, Vec<u8>>>,
    opened: Mutex<Vec<String>>,
}

impl MapLookup {
    pub(crate) fn new() -> MapLookup {
        MapLookup {
            files: Mutex::new(Default::default()),
            opened: Mutex::new(vec![]),
        }
    }

    pub(crate) fn insert(&self, key: &str, value: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .insert(key.to_string(), value.as_bytes().to_vec())
    }

    pub(crate) fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

impl ResourceLookup for Arc<MapLookup> {
    type Reader = std::io::Cursor<Vec<u8>>;

    fn open(&self, locator: &Locator) -> Result<Self::Reader, IoError> {
        self.opened.lock().push(locator.to_string());
        let ret = self
            .files
            .lock()
            .get(locator.as_str())
            .ok_or_else(|| IoError::new(ErrorKind::NotFound, "Entry not found".to_string()))?
            .clone();
        Ok(std::io::Cursor::new(ret))
    }
}

/// Decodes text of the form `WxH` into an opaque buffer of that size, counting every call.
#[derive(Clone, Default)]
pub(crate) struct TextDecoder {
    calls: Arc<AtomicUsize>,
    delay_ms: Arc<AtomicU64>,
}

impl TextDecoder {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every decode take at least this long, to widen race windows.
    pub(crate) fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Decoder for TextDecoder {
    type Error = IoError;

    fn decode<R: Read>(&self, mut reader: R) -> Result<PixelBuffer, IoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }

        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let bad = || IoError::new(ErrorKind::InvalidData, format!("not an image: {:?}", text));
        let (w, h) = text.trim().split_once('x').ok_or_else(bad)?;
        let w = w.parse::<u32>().map_err(|_| bad())?;
        let h = h.parse::<u32>().map_err(|_| bad())?;
        Ok(PixelBuffer::filled(w, h, [200, 40, 40, 255]))
    }
}

/// The gray filter, counting calls and remembering the last intensity asked for.
#[derive(Clone, Default)]
pub(crate) struct CountingFilter {
    calls: Arc<AtomicUsize>,
    last_intensity: Arc<Mutex<Option<u8>>>,
}

impl CountingFilter {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_intensity(&self) -> Option<u8> {
        *self.last_intensity.lock()
    }
}

impl Filter for CountingFilter {
    fn desaturate(&self, buffer: &PixelBuffer, intensity: u8) -> PixelBuffer {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_intensity.lock() = Some(intensity);
        GrayFilter.desaturate(buffer, intensity)
    }
}
