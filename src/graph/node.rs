/// Context passed to graph nodes during rendering
///
/// Carries what the host knows about the block being rendered. Nodes that
/// depend on the sample rate follow `sample_rate` when it changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCtx {
    pub sample_rate: f64,
}

impl RenderCtx {
    pub fn new(sample_rate: f64) -> Self {
        Self { sample_rate }
    }
}

/// Core trait for audio processing graph nodes
///
/// `out` holds the input block on entry and the processed block on return,
/// so nodes chain by rendering into the same buffer in sequence.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Check if this node is still producing sound
    ///
    /// Hosts use this to bypass or power down silent nodes.
    fn is_active(&self) -> bool {
        true
    }
}

/// Allow boxed graph nodes to be used as graph nodes (for dynamic dispatch)
impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(out, ctx)
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}
