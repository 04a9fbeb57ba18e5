use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};

use super::{render_document, Markup};

/// Receives every rendered page; each call fully replaces the previous one.
pub trait RenderTarget: Send {
    fn replace(&mut self, page: &Markup) -> Result<()>;
}

/// Writes each page as a complete HTML document to a file.
pub struct FileTarget {
    path: PathBuf,
}

impl FileTarget {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl RenderTarget for FileTarget {
    fn replace(&mut self, page: &Markup) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, render_document(page).as_str())
            .with_context(|| format!("Failed to write page to {}", self.path.display()))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Pages {
    latest: Option<Markup>,
    count: usize,
}

/// Keeps the latest page in memory. Clones share the same page.
#[derive(Debug, Clone, Default)]
pub struct MemoryTarget {
    pages: Arc<Mutex<Pages>>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<Markup> {
        self.pages.lock().unwrap_or_else(|e| e.into_inner()).latest.clone()
    }

    /// Number of pages rendered so far
    pub fn render_count(&self) -> usize {
        self.pages.lock().unwrap_or_else(|e| e.into_inner()).count
    }
}

impl RenderTarget for MemoryTarget {
    fn replace(&mut self, page: &Markup) -> Result<()> {
        let mut pages = self.pages.lock().unwrap_or_else(|e| e.into_inner());
        pages.latest = Some(page.clone());
        pages.count += 1;
        Ok(())
    }
}
