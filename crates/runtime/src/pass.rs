/// Render pass metadata.
///
/// The host drives one pass per animation frame (or per scripted step in a
/// headless session). Passes are the only clock the widget reads, so every
/// session can be replayed deterministically.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct RenderPass {
    /// 0-based pass index.
    pub index: u64,
}

impl RenderPass {
    pub fn new(index: u64) -> Self {
        Self { index }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1)
    }

    /// Number of passes elapsed since `earlier`.
    pub fn since(self, earlier: RenderPass) -> u64 {
        self.index.saturating_sub(earlier.index)
    }
}
