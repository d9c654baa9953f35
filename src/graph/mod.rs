//! Block-processing nodes and the handles that control them.
//!
//! A node lives on the audio thread and is driven once per block through
//! [`GraphNode::render_block`]. Everything the control thread wants to change
//! goes through the node's handle: parameter targets via lock-free slots,
//! note events via a bounded queue. Changes made by the engine travel back
//! through a second queue.

/// Control-side facade with unbound and bound states.
pub mod controller;
/// ADSR amplitude envelope node and its control handle.
pub mod envelope;
/// Core trait shared by all graph nodes.
pub mod node;

pub use controller::EnvelopeController;
pub use envelope::{EnvelopeHandle, EnvelopeNode, EnvelopeParam};
pub use node::{GraphNode, RenderCtx};
