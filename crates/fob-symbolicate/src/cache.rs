//! Request-scoped cache of decoded source maps.
//!
//! A [`SourceMapCache`] lives for exactly one symbolication request. Entries
//! are created lazily the first time a frame references a bundle URL and are
//! released when the cache is dropped, on every exit path of the request.

use crate::error::{Result, SymbolicateError};
use crate::reader::BundleReader;
use oxc_sourcemap::SourceMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Original source position of a generated position.
///
/// Every component is optional: a mapping may name a source without a symbol
/// name, and callers fall back field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginalPosition {
    pub source: Option<String>,
    /// 1-based line.
    pub line: Option<u32>,
    /// 0-based column.
    pub column: Option<u32>,
    pub name: Option<String>,
}

/// One mapping segment, indexed by generated position.
#[derive(Debug, Clone, Copy)]
struct Segment {
    dst_line: u32,
    dst_col: u32,
    src_line: u32,
    src_col: u32,
    source_id: Option<u32>,
    name_id: Option<u32>,
}

/// A decoded source map with a position index over its segments.
pub struct DecodedSourceMap {
    map: SourceMap,
    segments: Vec<Segment>,
}

impl DecodedSourceMap {
    /// Decodes source map JSON.
    pub fn decode(url: &str, raw: &str) -> Result<Self> {
        let map = SourceMap::from_json_string(raw).map_err(|e| SymbolicateError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let mut segments: Vec<Segment> = map
            .get_tokens()
            .map(|token| Segment {
                dst_line: token.get_dst_line(),
                dst_col: token.get_dst_col(),
                src_line: token.get_src_line(),
                src_col: token.get_src_col(),
                source_id: token.get_source_id(),
                name_id: token.get_name_id(),
            })
            .collect();
        segments.sort_by_key(|s| (s.dst_line, s.dst_col));

        Ok(Self { map, segments })
    }

    /// Looks up the original position of a generated position.
    ///
    /// `line` is 1-based, `column` 0-based. The closest segment at or before
    /// `column` on the same line wins; a position before the first segment of
    /// its line, or a segment without a source, yields `None`.
    pub fn original_position_for(&self, line: u32, column: u32) -> Option<OriginalPosition> {
        let dst_line = line.checked_sub(1)?;
        let idx = self
            .segments
            .partition_point(|s| (s.dst_line, s.dst_col) <= (dst_line, column));
        let segment = self.segments[..idx].last()?;
        if segment.dst_line != dst_line {
            return None;
        }

        let source = segment
            .source_id
            .and_then(|id| self.map.get_source(id))
            .map(|s| s.to_string())?;

        Some(OriginalPosition {
            source: Some(source),
            line: Some(segment.src_line + 1),
            column: Some(segment.src_col),
            name: segment
                .name_id
                .and_then(|id| self.map.get_name(id))
                .map(|s| s.to_string()),
        })
    }

    /// Number of mapping segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

impl std::fmt::Debug for DecodedSourceMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedSourceMap")
            .field("segments", &self.segments.len())
            .finish()
    }
}

/// Per-request cache of decoded source maps keyed by the exact frame `file`.
///
/// A bundle whose source map could not be read or decoded is cached as
/// unavailable, so it is attempted at most once per request.
pub struct SourceMapCache {
    entries: HashMap<String, Option<DecodedSourceMap>>,
    open: Arc<AtomicUsize>,
}

impl SourceMapCache {
    /// Creates an empty cache that reports its live decoders to `open`.
    pub fn new(open: Arc<AtomicUsize>) -> Self {
        Self {
            entries: HashMap::new(),
            open,
        }
    }

    /// Returns the decoded map for `file`, reading and decoding it on first use.
    pub async fn get_or_load<R>(&mut self, file: &str, reader: &R) -> Option<&DecodedSourceMap>
    where
        R: BundleReader + ?Sized,
    {
        if !self.entries.contains_key(file) {
            let decoded = match load(file, reader).await {
                Ok(decoded) => {
                    debug!(file, segments = decoded.segment_count(), "Decoded source map");
                    self.open.fetch_add(1, Ordering::SeqCst);
                    Some(decoded)
                }
                Err(e) => {
                    warn!(file, error = %e, "Source map unavailable, frames will stay unresolved");
                    None
                }
            };
            self.entries.insert(file.to_string(), decoded);
        }

        self.entries.get(file).and_then(Option::as_ref)
    }

    /// Returns the cached map for `file` without loading it.
    pub fn get(&self, file: &str) -> Option<&DecodedSourceMap> {
        self.entries.get(file).and_then(Option::as_ref)
    }

    /// Number of bundle URLs seen, decoded or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no bundle URL has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Releases every decoded map.
    pub fn clear(&mut self) {
        let decoded = self.entries.values().filter(|e| e.is_some()).count();
        self.entries.clear();
        if decoded > 0 {
            self.open.fetch_sub(decoded, Ordering::SeqCst);
            trace!(released = decoded, "Released source maps");
        }
    }
}

impl Drop for SourceMapCache {
    fn drop(&mut self) {
        self.clear();
    }
}

async fn load<R>(file: &str, reader: &R) -> Result<DecodedSourceMap>
where
    R: BundleReader + ?Sized,
{
    let raw = reader.read_source_map(file).await?;
    DecodedSourceMap::decode(file, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    // `index.js` line 1: col 0 -> a.ts 1:0, col 10 -> a.ts 2:4 named `f`,
    // col 15 has no source. Line 3: col 2 -> b.ts 5:0.
    const MAP: &str = r#"{
        "version": 3,
        "sources": ["a.ts", "b.ts"],
        "names": ["f"],
        "mappings": "AAAA,UACIA,K;;ECGJ"
    }"#;

    #[test]
    fn test_lookup_exact_and_lower_bound() {
        let map = DecodedSourceMap::decode("index.js", MAP).unwrap();

        let exact = map.original_position_for(1, 10).unwrap();
        assert_eq!(exact.source.as_deref(), Some("a.ts"));
        assert_eq!(exact.line, Some(2));
        assert_eq!(exact.column, Some(4));
        assert_eq!(exact.name.as_deref(), Some("f"));

        let between = map.original_position_for(1, 5).unwrap();
        assert_eq!(between.line, Some(1));
        assert_eq!(between.name, None);

        let other_source = map.original_position_for(3, 7).unwrap();
        assert_eq!(other_source.source.as_deref(), Some("b.ts"));
        assert_eq!(other_source.line, Some(5));
    }

    #[test]
    fn test_lookup_misses() {
        let map = DecodedSourceMap::decode("index.js", MAP).unwrap();

        // segment without a source
        assert!(map.original_position_for(1, 25).is_none());
        // unmapped line
        assert!(map.original_position_for(2, 0).is_none());
        // before the first segment of the line
        assert!(map.original_position_for(3, 1).is_none());
        // past the end
        assert!(map.original_position_for(40, 0).is_none());
        // line numbers are 1-based
        assert!(map.original_position_for(0, 0).is_none());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = DecodedSourceMap::decode("index.js", "not json").unwrap_err();
        assert!(matches!(err, SymbolicateError::Decode { .. }));
    }

    #[test]
    fn test_clear_releases_open_count() {
        let open = Arc::new(AtomicUsize::new(0));
        let mut cache = SourceMapCache::new(Arc::clone(&open));
        cache.entries.insert(
            "index.js".to_string(),
            Some(DecodedSourceMap::decode("index.js", MAP).unwrap()),
        );
        cache.entries.insert("missing.js".to_string(), None);
        open.fetch_add(1, Ordering::SeqCst);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("index.js").is_some());
        assert!(cache.get("missing.js").is_none());

        drop(cache);
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }
}
