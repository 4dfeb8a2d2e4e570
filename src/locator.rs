//! [Locator] names an encoded resource, and is the key of the primary cache.
use std::fmt;
use std::sync::Arc;

use relative_path::RelativePath;

/// An immutable, cheaply clonable identifier for an encoded resource such as `icons/print.png`.
///
/// Two locators are equal when their text is equal; no normalization happens unless [Locator::normalized] is used to
/// build one.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locator(Arc<str>);

impl Locator {
    pub fn new(text: impl Into<Arc<str>>) -> Locator {
        Locator(text.into())
    }

    /// Build a locator from a `/`-separated path, collapsing `.`, `..` and repeated separators.
    ///
    /// Leading separators are dropped, so `/icons/./print.png` and `icons/print.png` name the same entry.
    pub fn normalized(path: &str) -> Locator {
        let cleaned = RelativePath::new(path.trim_start_matches('/')).normalize();
        Locator(cleaned.as_str().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into the part before the extension and the extension itself (without the dot).
    ///
    /// Only the final path segment is considered, and a dot that starts the segment doesn't begin an extension.
    pub fn split_extension(&self) -> (&str, Option<&str>) {
        let text = self.as_str();
        let segment_start = text.rfind('/').map(|i| i + 1).unwrap_or(0);
        match text[segment_start..].rfind('.') {
            Some(0) | None => (text, None),
            Some(dot) => {
                let dot = segment_start + dot;
                (&text[..dot], Some(&text[dot + 1..]))
            }
        }
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Locator({:?})", self.as_str())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Locator {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for Locator {
    fn from(text: &str) -> Locator {
        Locator::new(text)
    }
}

impl From<String> for Locator {
    fn from(text: String) -> Locator {
        Locator::new(text)
    }
}

impl From<&Locator> for Locator {
    fn from(locator: &Locator) -> Locator {
        locator.clone()
    }
}
