use super::Rect;
use crate::av::PendingFrame;

/// Where decoded tiles end up.
pub trait Display {
    /// Takes ownership of a video frame that may still be decoding.
    fn show_frame(&mut self, rect: Rect, frame: PendingFrame);

    /// Draws `rect.width * rect.height` RGBA pixels.
    fn blit_image(&mut self, rect: Rect, pixels: &[u8]);
}

/// A display that keeps everything it is given
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub frames: Vec<(Rect, PendingFrame)>,
    pub blits: Vec<(Rect, Vec<u8>)>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for RecordingDisplay {
    fn show_frame(&mut self, rect: Rect, frame: PendingFrame) {
        self.frames.push((rect, frame));
    }

    fn blit_image(&mut self, rect: Rect, pixels: &[u8]) {
        self.blits.push((rect, pixels.to_vec()));
    }
}
