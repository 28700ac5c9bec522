//! Stack trace symbolication.

use crate::cache::SourceMapCache;
use crate::code_frame::{self, CodeFrameOptions};
use crate::error::{Result, SymbolicateError};
use crate::frame::{CodeFrame, CodeFrameLocation, RawStackFrame, StackFrame, SymbolicationResult};
use crate::reader::BundleReader;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};
use tracing::{debug, error};

/// Frames in the bundler's module runtime get no code excerpt.
static BUNDLE_RUNTIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"webpack[/\\]runtime[/\\].+\s").expect("bundle runtime pattern is valid")
});

const WEBPACK_PROTOCOL: &str = "webpack://";

/// Transforms stack traces from the running application using source maps.
///
/// Raw frames point into the bundle, e.g. `index.bundle?platform=ios:567:1234`.
/// Resolved frames point into project sources, e.g. `Hello.tsx:10:9`.
///
/// Each [`process`](Symbolicator::process) call decodes source maps into its
/// own [`SourceMapCache`], so concurrent requests never share decoder state.
pub struct Symbolicator<R> {
    project_root: PathBuf,
    reader: R,
    code_frame: CodeFrameOptions,
    open_decoders: Arc<AtomicUsize>,
}

impl<R: BundleReader> Symbolicator<R> {
    /// Creates a symbolicator for the project at `project_root`.
    pub fn new(project_root: impl Into<PathBuf>, reader: R) -> Self {
        Self {
            project_root: project_root.into(),
            reader,
            code_frame: CodeFrameOptions::default(),
            open_decoders: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Overrides the code excerpt rendering options.
    pub fn with_code_frame_options(mut self, options: CodeFrameOptions) -> Self {
        self.code_frame = options;
        self
    }

    /// Number of source map decoders currently alive across in-flight requests.
    pub fn open_decoders(&self) -> usize {
        self.open_decoders.load(Ordering::SeqCst)
    }

    /// Symbolicates a stack trace.
    ///
    /// Only frames whose `file` is a remote bundle URL are kept; native and
    /// debugger-worker frames are dropped from the result. Each kept frame is
    /// resolved independently: when its source map is missing or invalid, or
    /// the position is unmapped, the frame is returned unchanged.
    ///
    /// The code excerpt comes from the first frame that is not collapsed and
    /// has a position. If that frame points into the bundle runtime, no
    /// excerpt is produced. Failing to read the excerpt source is logged and
    /// yields no excerpt.
    pub async fn process(&self, stack: Vec<RawStackFrame>) -> SymbolicationResult {
        let frames: Vec<(RawStackFrame, String)> = stack
            .into_iter()
            .filter_map(|frame| {
                let file = frame.file.clone()?;
                is_remote_bundle(&file).then_some((frame, file))
            })
            .collect();

        debug!(frames = frames.len(), "Symbolicating stack");

        // Dropped on every exit path, releasing all decoded maps.
        let mut cache = SourceMapCache::new(Arc::clone(&self.open_decoders));

        let mut resolved = Vec::with_capacity(frames.len());
        for (frame, file) in &frames {
            cache.get_or_load(file, &self.reader).await;
            resolved.push(resolve_frame(&cache, frame, file));
        }

        let code_frame = self.code_frame_for(&resolved).await;
        cache.clear();

        SymbolicationResult {
            stack: resolved,
            code_frame,
        }
    }

    async fn code_frame_for(&self, frames: &[StackFrame]) -> Option<CodeFrame> {
        let frame = frames.iter().find(|f| !f.collapse && f.has_position())?;

        if BUNDLE_RUNTIME.is_match(&frame.file) {
            return None;
        }

        match self.load_code_frame(frame).await {
            Ok(code_frame) => Some(code_frame),
            Err(e) => {
                error!(error = %e, "Failed to create code frame");
                None
            }
        }
    }

    async fn load_code_frame(&self, frame: &StackFrame) -> Result<CodeFrame> {
        let line = frame.line_number.unwrap_or_default();
        let column = frame.column.unwrap_or_default();

        let (file_name, source) = if points_at_bundle(&frame.file) {
            let source = self.reader.read_file(&frame.file).await?;
            (frame.file.clone(), source)
        } else {
            let path = project_path(&self.project_root, &frame.file)
                .ok_or_else(|| SymbolicateError::OutsideProject(frame.file.clone()))?;
            let source = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| SymbolicateError::Io {
                    path: path.clone(),
                    source,
                })?;
            (path.display().to_string(), source)
        };

        Ok(CodeFrame {
            content: code_frame::render(&source, line, column, &self.code_frame),
            location: CodeFrameLocation { row: line, column },
            file_name,
        })
    }
}

/// Resolves one frame through the cached source map of its bundle.
///
/// A successful lookup replaces each field with its original value, falling
/// back to the input value for every component the mapping lacks.
fn resolve_frame(cache: &SourceMapCache, frame: &RawStackFrame, file: &str) -> StackFrame {
    let (Some(line), Some(column)) = (frame.line_number, frame.column) else {
        return StackFrame::unresolved(frame, file);
    };
    if line == 0 || column == 0 {
        return StackFrame::unresolved(frame, file);
    }

    let Some(map) = cache.get(file) else {
        return StackFrame::unresolved(frame, file);
    };

    let Some(original) = map.original_position_for(line, column) else {
        return StackFrame::unresolved(frame, file);
    };
    let Some(source) = original.source else {
        return StackFrame::unresolved(frame, file);
    };

    StackFrame {
        line_number: original.line.filter(|l| *l > 0).or(frame.line_number),
        column: original.column.filter(|c| *c > 0).or(frame.column),
        file: source,
        method_name: original
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| frame.method_name.clone()),
        collapse: false,
    }
}

fn is_remote_bundle(file: &str) -> bool {
    file.starts_with("http") && !file.contains("debuggerWorker")
}

fn points_at_bundle(file: &str) -> bool {
    file.starts_with("http") && file.contains("index.bundle")
}

/// Maps a resolved source path onto the project directory.
///
/// Returns `None` for paths that escape `root` once normalized.
fn project_path(root: &Path, file: &str) -> Option<PathBuf> {
    let relative = file.strip_prefix(WEBPACK_PROTOCOL).unwrap_or(file);
    let relative = path_clean::clean(relative.trim_start_matches('/'));
    if relative.has_root() || relative.starts_with("..") {
        return None;
    }
    Some(path_clean::clean(root.join(relative)))
}
