//! The lookup contract every configuration origin implements, and the ordered
//! list that chains them.

use std::fmt;
use std::sync::Arc;

/// A read-only provider of string values keyed by `(key, path)`.
///
/// `path` is the dotted namespace of the configuration node doing the lookup;
/// implementations decide how to combine it with `key`. Absence is not an
/// error: return `None` and the next source in the list is consulted.
///
/// Backing data is fixed once the source is constructed, so repeated calls
/// with the same arguments must return the same result.
pub trait Source: Send + Sync {
    fn get(&self, key: &str, path: Option<&str>) -> Option<String>;
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn get(&self, key: &str, path: Option<&str>) -> Option<String> {
        (**self).get(key, path)
    }
}

impl<S: Source + ?Sized> Source for Arc<S> {
    fn get(&self, key: &str, path: Option<&str>) -> Option<String> {
        (**self).get(key, path)
    }
}

impl<S: Source + ?Sized> Source for &S {
    fn get(&self, key: &str, path: Option<&str>) -> Option<String> {
        (**self).get(key, path)
    }
}

/// Join a namespace path and a key into one dotted string.
pub fn join_key(path: Option<&str>, key: &str) -> String {
    match path {
        Some(p) if !p.is_empty() => format!("{p}.{key}"),
        _ => key.to_string(),
    }
}

/// A priority-ordered chain of sources. The first source to produce a
/// non-empty value wins; later sources are not consulted.
#[derive(Default)]
pub struct SourceList {
    sources: Vec<Box<dyn Source>>,
}

impl SourceList {
    /// Build a list from optional entries. `None` entries are dropped, so a
    /// source can be included conditionally without reshaping the list.
    pub fn new<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = Option<Box<dyn Source>>>,
    {
        Self {
            sources: sources.into_iter().flatten().collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a source at the lowest priority.
    pub fn push(&mut self, source: impl Source + 'static) {
        self.sources.push(Box::new(source));
    }

    pub fn with(mut self, source: impl Source + 'static) -> Self {
        self.push(source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Source for SourceList {
    fn get(&self, key: &str, path: Option<&str>) -> Option<String> {
        self.sources
            .iter()
            .enumerate()
            .find_map(|(index, source)| {
                let value = source.get(key, path).filter(|v| !v.is_empty())?;
                tracing::trace!(key, path, index, "config value found");
                Some(value)
            })
    }
}

impl FromIterator<Box<dyn Source>> for SourceList {
    fn from_iter<T: IntoIterator<Item = Box<dyn Source>>>(iter: T) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for SourceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceList")
            .field("sources", &self.sources.len())
            .finish()
    }
}
