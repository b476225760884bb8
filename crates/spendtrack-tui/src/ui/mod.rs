//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, the auth forms and overlays
//! - `input`: keyboard event handling per route
//! - `styles`: color scheme and text styling
//! - `views`: the protected views (dashboard, spends)

pub mod input;
pub mod render;
pub mod styles;
pub mod views;
