//! Re-rendering of the panels that depend on a series.
//!
//! Each [`RenderTarget`] turns the current store contents into a [`View`].
//! The dispatcher keeps the latest view per target and regenerates the
//! affected ones whenever a series changes. Views are plain owned data, so
//! the terminal loop can paint them as often as it likes.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use ratatui::text::Line;
use tracing::{debug, error};

use crate::error::RenderError;
use crate::model::SeriesId;
use crate::store::DataStore;

/// One bar of a bar chart: label and value in tenths of a percent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bar {
    pub label: String,
    pub value: u64,
}

/// Rendered output of one target.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Lines(Vec<Line<'static>>),
    Bars(Vec<Bar>),
    /// The target could not render; shown in place of its content
    Failed(String),
}

impl View {
    /// Text content without styling, one string per line.
    pub fn plain_lines(&self) -> Vec<String> {
        match self {
            Self::Lines(lines) => lines
                .iter()
                .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
                .collect(),
            Self::Bars(bars) => bars
                .iter()
                .map(|b| format!("{} {:.1}%", b.label, b.value as f64 / 10.0))
                .collect(),
            Self::Failed(message) => vec![message.clone()],
        }
    }
}

/// A panel whose content is a pure function of the store.
pub trait RenderTarget: Send {
    fn name(&self) -> &'static str;

    /// Series this target reads.
    fn series(&self) -> &[SeriesId];

    fn render(&self, store: &DataStore) -> Result<View, RenderError>;
}

/// Summary of one dispatch.
#[derive(Debug, Default, PartialEq)]
pub struct RenderReport {
    pub rendered: Vec<&'static str>,
    pub failed: Vec<RenderError>,
}

#[derive(Default)]
pub struct RenderDispatcher {
    targets: Vec<Box<dyn RenderTarget>>,
    views: BTreeMap<&'static str, View>,
}

impl RenderDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, target: Box<dyn RenderTarget>) {
        debug!(panel = target.name(), series = ?target.series(), "Render target registered");
        self.targets.push(target);
    }

    pub fn with_target(mut self, target: Box<dyn RenderTarget>) -> Self {
        self.register(target);
        self
    }

    /// Regenerate every target subscribed to `series`.
    pub fn render_all(&mut self, series: SeriesId, store: &DataStore) -> RenderReport {
        self.render_matching(store, |t| t.series().contains(&series))
    }

    /// Regenerate every target.
    pub fn render_everything(&mut self, store: &DataStore) -> RenderReport {
        self.render_matching(store, |_| true)
    }

    fn render_matching<F>(&mut self, store: &DataStore, wanted: F) -> RenderReport
    where
        F: Fn(&dyn RenderTarget) -> bool,
    {
        let mut report = RenderReport::default();
        for target in self.targets.iter().filter(|t| wanted(&***t)) {
            let name = target.name();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| target.render(store)))
                .unwrap_or_else(|_| Err(RenderError::new(name, "panicked while rendering")));
            match outcome {
                Ok(view) => {
                    self.views.insert(name, view);
                    report.rendered.push(name);
                }
                Err(err) => {
                    error!(panel = name, error = %err, "Render failed");
                    self.views.insert(name, View::Failed(err.message.clone()));
                    report.failed.push(err);
                }
            }
        }
        report
    }

    /// Latest view of `target`, if it has rendered at least once.
    pub fn view(&self, target: &str) -> Option<&View> {
        self.views.get(target)
    }

    pub fn target_names(&self) -> Vec<&'static str> {
        self.targets.iter().map(|t| t.name()).collect()
    }
}
