//! Destinations for the live-preview branch.
//!
//! With preview enabled the compiled chain is split in two; the second branch
//! is routed to whatever output a [`PreviewSink`] describes. The default is an
//! SDL window. Headless hosts can use [`NullPreview`] to keep the graph shape
//! without opening a display.

/// Output arguments for the preview branch, appended after the main output.
pub trait PreviewSink: Send + Sync {
    /// Arguments following `-map [prev]`.
    fn output_args(&self) -> Vec<String>;
}

/// SDL display window.
#[derive(Debug, Clone)]
pub struct SdlWindow {
    pub title: String,
}

impl Default for SdlWindow {
    fn default() -> Self {
        Self {
            title: "Live Preview".to_string(),
        }
    }
}

impl PreviewSink for SdlWindow {
    fn output_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            "rawvideo".to_string(),
            "-f".to_string(),
            "sdl".to_string(),
            self.title.clone(),
        ]
    }
}

/// Discards preview frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPreview;

impl PreviewSink for NullPreview {
    fn output_args(&self) -> Vec<String> {
        vec!["-f".to_string(), "null".to_string(), "-".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdl_window_uses_title_as_output() {
        let args = SdlWindow::default().output_args();
        assert_eq!(args, ["-c:v", "rawvideo", "-f", "sdl", "Live Preview"]);
    }

    #[test]
    fn null_preview_writes_nowhere() {
        assert_eq!(NullPreview.output_args(), ["-f", "null", "-"]);
    }
}
