//! Beatcanvas library - audio-reactive 2D visualizer

pub mod audio;
pub mod beat;
pub mod canvas;
pub mod cli;
pub mod error;
pub mod metric;
pub mod modes;
pub mod params;
pub mod renderer;
pub mod rendering;
