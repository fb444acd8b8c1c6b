/// Receives the reply as it grows.
///
/// `render` is called with the whole text accumulated so far after every
/// fragment, before the next fragment is requested.
pub trait ResponseRenderer: Send {
    /// Called once before the provider is contacted.
    fn begin(&mut self) {}

    fn render(&mut self, partial: &str);

    /// Called with the text that is committed to the transcript. May differ
    /// from the last `render` when a refusal or apology replaces the reply.
    fn finish(&mut self, committed: &str) {
        let _ = committed;
    }
}

/// Renderer that keeps every prefix it was shown.
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    pub frames: Vec<String>,
    pub began: bool,
    pub committed: Option<String>,
}

impl ResponseRenderer for RecordingRenderer {
    fn begin(&mut self) {
        self.began = true;
    }

    fn render(&mut self, partial: &str) {
        self.frames.push(partial.to_string());
    }

    fn finish(&mut self, committed: &str) {
        self.committed = Some(committed.to_string());
    }
}
