//! Stack-trace symbolication for bundles served by the fob dev server.
//!
//! A running application reports stack frames that point into the bundle it
//! downloaded, e.g. `http://localhost:8081/index.bundle?platform=ios:567:1234`.
//! [`Symbolicator`] uses the bundle's source map to turn those into frames that
//! point at project sources (`App.tsx:10:9`), and renders a highlighted code
//! excerpt for the first frame worth showing.
//!
//! # Architecture
//!
//! - [`frame`] - wire types for raw and resolved frames
//! - [`cache`] - request-scoped cache of decoded source maps
//! - [`code_frame`] - fixed-width excerpt renderer
//! - [`platform`] - platform inference from frame URLs
//! - [`reader`] - the seam through which bundles and source maps are read
//!
//! # Example
//!
//! ```rust,no_run
//! use fob_symbolicate::{BundleReader, RawStackFrame, Symbolicator};
//!
//! async fn symbolicate<R: BundleReader>(reader: R, stack: Vec<RawStackFrame>) {
//!     let symbolicator = Symbolicator::new("/path/to/project", reader);
//!     let result = symbolicator.process(stack).await;
//!     for frame in &result.stack {
//!         println!("{} ({}:{:?})", frame.method_name, frame.file, frame.line_number);
//!     }
//! }
//! ```

pub mod cache;
pub mod code_frame;
pub mod error;
pub mod frame;
pub mod platform;
pub mod reader;
mod symbolicator;

pub use cache::{OriginalPosition, SourceMapCache};
pub use code_frame::CodeFrameOptions;
pub use error::{Result, SymbolicateError};
pub use frame::{CodeFrame, CodeFrameLocation, RawStackFrame, StackFrame, SymbolicationResult};
pub use platform::infer_platform_from_stack;
pub use reader::BundleReader;
pub use symbolicator::Symbolicator;
