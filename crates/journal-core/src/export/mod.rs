//! Document exporter: response messages → paginated document → sink.

pub mod layout;
pub mod metrics;

use std::rc::Rc;
use journal_types::{
    Result,
    config::ExportConfig,
};
use crate::ports::{DocumentBackend, DocumentSink};
use layout::LayoutEngine;
use metrics::HelveticaMetrics;

/// Summary of a finished export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub file_name: String,
    pub pages: usize,
    pub groups: usize,
}

pub struct DocumentExporter {
    engine: LayoutEngine,
    backend: Rc<dyn DocumentBackend>,
    sink: Rc<dyn DocumentSink>,
}

impl DocumentExporter {
    pub fn new(
        config: ExportConfig,
        backend: Rc<dyn DocumentBackend>,
        sink: Rc<dyn DocumentSink>,
    ) -> Self {
        Self {
            engine: LayoutEngine::new(config, Box::new(HelveticaMetrics)),
            backend,
            sink,
        }
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    /// Render `responses` under `title` and hand the file to the sink.
    ///
    /// Returns `Ok(None)` without doing anything when the sink is not
    /// mounted or there is nothing to export; the next response triggers a
    /// fresh export anyway.
    pub fn export(&self, title: &str, responses: &[&str]) -> Result<Option<ExportReport>> {
        if !self.sink.is_mounted() {
            log::debug!("Export skipped: anchor not mounted");
            return Ok(None);
        }
        if responses.is_empty() {
            return Ok(None);
        }

        let doc = self.engine.layout(title, responses);
        let bytes = self.backend.render(&doc)?;
        let file_name = self.engine.config().file_name.clone();
        self.sink
            .save(&file_name, self.backend.content_type(), &bytes)?;

        log::info!(
            "Exported {} response(s) on {} page(s) to {} ({} bytes)",
            responses.len(),
            doc.page_count(),
            file_name,
            bytes.len()
        );
        Ok(Some(ExportReport {
            file_name,
            pages: doc.page_count(),
            groups: doc.group_count(),
        }))
    }
}
