//! Dashboard rendering.
//!
//! - `render`: pure (session, assignments) -> page markup
//! - `Markup`: escaped HTML produced by the templates in `templates/`
//! - `RenderTarget`: where each freshly rendered page is delivered

pub mod markup;
pub mod render;
pub mod target;

pub use markup::Markup;
pub(crate) use markup::render_template;
pub use render::{render, render_document, RenderOptions};
pub use target::{FileTarget, MemoryTarget, RenderTarget};
