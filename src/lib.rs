//! streamocr - streaming OCR client with PDF page selection.
//!
//! Submits images and PDFs to a remote OCR service and folds the streamed
//! recognition output into ordered multi-page text as it arrives.

pub mod accumulator;
pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod request;
pub mod selection;
pub mod session;
pub mod stream;
pub mod thumbnails;

pub use accumulator::{Accumulator, RenderView, Status};
pub use client::OcrClient;
pub use error::OcrError;
pub use selection::{PageRange, SelectionStore};
pub use session::{RenderSink, Session};
pub use stream::{FrameDecoder, StreamEvent};
