//! Terminal portfolio dashboard.
//!
//! Four independently refreshed series (portfolio, market, team, news) are
//! pulled from the backend into a shared [`store::DataStore`]. After each
//! update the [`render::RenderDispatcher`] rebuilds only the panels bound to
//! that series.

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod source;
pub mod store;
pub mod ui;
pub mod views;
