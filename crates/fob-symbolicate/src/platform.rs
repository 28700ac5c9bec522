//! Platform inference from stack frame URLs.

use crate::frame::RawStackFrame;
use url::Url;

/// Infers the target platform from a stack trace.
///
/// Usually at least one frame carries the bundle URL, e.g.
/// `http://localhost:8081/index.bundle?platform=ios&dev=true`. The `platform`
/// query parameter wins; otherwise a `name.<platform>.<ext>` file name is
/// accepted. Frames without a file are skipped. Returns the first platform
/// found in stack order.
pub fn infer_platform_from_stack(stack: &[RawStackFrame]) -> Option<String> {
    stack
        .iter()
        .filter_map(|frame| frame.file.as_deref())
        .find_map(platform_from_file)
}

fn platform_from_file(file: &str) -> Option<String> {
    let base = Url::parse("file:///").ok()?;
    let url = base.join(file).ok()?;

    if let Some((_, platform)) = url.query_pairs().find(|(key, _)| key == "platform") {
        if !platform.is_empty() {
            return Some(platform.into_owned());
        }
    }

    let filename = url.path_segments()?.next_back()?;
    let mut parts = filename.split('.');
    let _name = parts.next()?;
    let platform = parts.next()?;
    parts.next()?;
    Some(platform.to_string())
}
