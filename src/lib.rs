#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod export;
pub mod geom;
pub mod history;
pub mod parse;
pub mod pipeline;
pub mod scene;

use std::fmt;

use history::{ContourHistory, HistoryEntry, PointSource};
use parse::PointParseError;
use pipeline::{ContourError, ContourOptions, ContourOutput};
use scene::{Scene, SceneMetadata};
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

pub use geom::PointSample;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    // A second `initialize` keeps the logger that is already installed.
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("could not start the rayon thread pool: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Failures surfaced by [`ContourEngine`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] PointParseError),
    #[error(transparent)]
    Contour(#[from] ContourError),
    #[error("no contour map has been generated yet")]
    NoScene,
}

/// Public entry point for hosts.
///
/// Holds the last successful run and the run history. A failed run leaves
/// both untouched, so exports keep describing the last good scene.
#[wasm_bindgen]
pub struct ContourEngine {
    history: ContourHistory,
    last_output: Option<ContourOutput>,
}

impl Default for ContourEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl ContourEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ContourEngine {
        ContourEngine {
            history: ContourHistory::new(),
            last_output: None,
        }
    }

    /// Contours pasted `X,Y,Z` text and returns the serialised scene.
    #[wasm_bindgen]
    pub fn generate_from_text(
        &mut self,
        text: &str,
        interval: f64,
        resolution: Option<u32>,
    ) -> Result<JsValue, JsValue> {
        let options = request_options(interval, resolution);
        let scene = self.run_text(text, &options).map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(scene).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Contours a flat `[x0, y0, z0, x1, ...]` array and returns the serialised scene.
    #[wasm_bindgen]
    pub fn generate_from_points(
        &mut self,
        coords: Vec<f64>,
        interval: f64,
        resolution: Option<u32>,
    ) -> Result<JsValue, JsValue> {
        let points = parse::parse_flat_points(&coords).map_err(to_js_error)?;
        let options = request_options(interval, resolution);
        let scene = self
            .run(&points, &options, PointSource::Array)
            .map(|output| &output.scene)
            .map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(scene).map_err(|err| JsError::new(&err.to_string()).into())
    }

    #[wasm_bindgen]
    pub fn get_scene(&self) -> Result<JsValue, JsValue> {
        let scene = self.scene().ok_or_else(|| to_js_error(EngineError::NoScene))?;
        serde_wasm_bindgen::to_value(scene).map_err(|err| JsError::new(&err.to_string()).into())
    }

    #[wasm_bindgen]
    pub fn get_diagnostics(&self) -> Result<JsValue, JsValue> {
        let output = self
            .last_output
            .as_ref()
            .ok_or_else(|| to_js_error(EngineError::NoScene))?;
        serde_wasm_bindgen::to_value(&output.diagnostics)
            .map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// R12 DXF text of the last scene.
    #[wasm_bindgen]
    pub fn get_dxf(&self) -> Result<String, JsValue> {
        self.dxf().map_err(to_js_error)
    }

    /// Recent runs, newest first.
    #[wasm_bindgen]
    pub fn get_history(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.history.to_vec())
            .map_err(|err| JsError::new(&err.to_string()).into())
    }

    #[wasm_bindgen]
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl ContourEngine {
    /// Runs the pipeline and records the run on success.
    pub fn run(
        &mut self,
        points: &[PointSample],
        options: &ContourOptions,
        source: PointSource,
    ) -> Result<&ContourOutput, ContourError> {
        let metadata = SceneMetadata::for_interval(options.interval);
        let output = pipeline::generate_scene(points, options, metadata)?;
        debug_log!("contour run: {}", output.diagnostics.summary());

        self.history.record(&output.scene, options.interval, source);
        Ok(&*self.last_output.insert(output))
    }

    /// Parses `X,Y,Z` lines and runs the pipeline on them.
    pub fn run_text(&mut self, text: &str, options: &ContourOptions) -> Result<&Scene, EngineError> {
        let parsed = parse::parse_manual_points(text)?;
        if parsed.skipped > 0 {
            log::warn!("ignored {} malformed point rows", parsed.skipped);
        }
        let output = self.run(&parsed.points, options, PointSource::Manual)?;
        Ok(&output.scene)
    }

    #[must_use]
    pub fn scene(&self) -> Option<&Scene> {
        self.last_output.as_ref().map(|output| &output.scene)
    }

    #[must_use]
    pub fn last_output(&self) -> Option<&ContourOutput> {
        self.last_output.as_ref()
    }

    pub fn dxf(&self) -> Result<String, EngineError> {
        self.scene().map(export::write_dxf).ok_or(EngineError::NoScene)
    }

    #[must_use]
    pub fn history(&self) -> &ContourHistory {
        &self.history
    }

    pub fn history_entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.entries()
    }
}

fn request_options(interval: f64, resolution: Option<u32>) -> ContourOptions {
    let options = ContourOptions::new(interval);
    match resolution {
        Some(resolution) => options.with_resolution(resolution as usize),
        None => options,
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
