//! Stack frame and result types, serialized the way React Native sends them.

use serde::{Deserialize, Deserializer, Serialize};

/// Raw stack frame as reported by the running application.
///
/// `file` is the bundle URL (with query parameters) or `None` for native
/// frames, which are never symbolicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStackFrame {
    #[serde(default)]
    pub line_number: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub method_name: String,
}

impl RawStackFrame {
    /// Creates a frame pointing at `file:line:column`.
    pub fn new(
        file: impl Into<String>,
        line_number: u32,
        column: u32,
        method_name: impl Into<String>,
    ) -> Self {
        Self {
            line_number: Some(line_number),
            column: Some(column),
            file: Some(file.into()),
            method_name: method_name.into(),
        }
    }
}

/// Symbolicated frame.
///
/// Either the input frame unchanged (lookup miss) or the frame rewritten to
/// original source coordinates (lookup hit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub line_number: Option<u32>,
    pub column: Option<u32>,
    pub file: String,
    pub method_name: String,
    /// Deprioritized when choosing the frame for the code excerpt.
    pub collapse: bool,
}

impl StackFrame {
    /// Wraps an input frame that could not be resolved.
    pub(crate) fn unresolved(frame: &RawStackFrame, file: &str) -> Self {
        Self {
            line_number: frame.line_number,
            column: frame.column,
            file: file.to_string(),
            method_name: frame.method_name.clone(),
            collapse: false,
        }
    }

    /// Both coordinates are known and non-zero.
    pub(crate) fn has_position(&self) -> bool {
        matches!(self.line_number, Some(line) if line > 0)
            && matches!(self.column, Some(column) if column > 0)
    }
}

/// Row/column the code excerpt is centered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFrameLocation {
    pub row: u32,
    pub column: u32,
}

/// Highlighted source excerpt around the first relevant frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFrame {
    pub content: String,
    pub location: CodeFrameLocation,
    pub file_name: String,
}

/// Outcome of [`Symbolicator::process`](crate::Symbolicator::process).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolicationResult {
    pub stack: Vec<StackFrame>,
    pub code_frame: Option<CodeFrame>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_frame_accepts_nulls() {
        let frame: RawStackFrame = serde_json::from_value(json!({
            "lineNumber": null,
            "column": null,
            "file": null,
            "methodName": null
        }))
        .unwrap();

        assert_eq!(frame.file, None);
        assert_eq!(frame.method_name, "");
    }

    #[test]
    fn test_result_wire_format() {
        let result = SymbolicationResult {
            stack: vec![StackFrame {
                line_number: Some(3),
                column: Some(2),
                file: "App.tsx".to_string(),
                method_name: "render".to_string(),
                collapse: false,
            }],
            code_frame: None,
        };

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "stack": [{
                    "lineNumber": 3,
                    "column": 2,
                    "file": "App.tsx",
                    "methodName": "render",
                    "collapse": false
                }],
                "codeFrame": null
            })
        );
    }

    #[test]
    fn test_has_position_treats_zero_as_missing() {
        let mut frame = StackFrame {
            line_number: Some(1),
            column: Some(0),
            file: "a.js".to_string(),
            method_name: String::new(),
            collapse: false,
        };
        assert!(!frame.has_position());

        frame.column = Some(4);
        assert!(frame.has_position());

        frame.line_number = None;
        assert!(!frame.has_position());
    }
}
