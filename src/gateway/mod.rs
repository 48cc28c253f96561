//! Request interpretation.
//!
//! [`IiifService`] turns a parsed IIIF path into either an info document or
//! rendered image bytes, calling the backend only once the request has
//! passed the grammar.
//!
//! ```text
//! parse path ─┬─ info  ─► dimensions ─► InfoDocument
//!             └─ image ─► dimensions ─► region ─► size ─► rotation
//!                                       ─► quality ─► RenderQuery ─► render
//! ```

mod service;

pub use service::{IiifResponse, IiifService, IiifSettings, ImageResponse, IMAGE_CONTENT_TYPE};
