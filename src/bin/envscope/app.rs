//! Audio setup: binds the controller and moves the node into the cpal stream.

use std::f64::consts::TAU;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use saavy_automation::{
    graph::{EnvelopeController, EnvelopeNode, GraphNode, RenderCtx},
    patch::EnvelopeSettings,
    MAX_BLOCK_SIZE,
};

use super::ui::UiApp;

/// Fixed-pitch sine used as the envelope's input signal
struct Tone {
    phase: f64,
    frequency: f64,
}

impl GraphNode for Tone {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let step = TAU * self.frequency / ctx.sample_rate;
        for sample in out.iter_mut() {
            *sample = (self.phase.sin() * 0.3) as f32;
            self.phase = (self.phase + step) % TAU;
        }
    }
}

/// Tone source followed by the envelope, owned by the audio thread
struct Chain {
    tone: Tone,
    envelope: EnvelopeNode,
    ctx: RenderCtx,
    block: Vec<f32>,
}

impl Chain {
    fn fill(&mut self, data: &mut [f32], channels: usize) {
        let total_frames = data.len() / channels;
        let mut frames_written = 0;

        while frames_written < total_frames {
            let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
            let block = &mut self.block[..frames];

            self.tone.render_block(block, &self.ctx);
            self.envelope.render_block(block, &self.ctx);

            // Mono to all channels
            let out_off = frames_written * channels;
            for (i, &s) in block.iter().enumerate() {
                for ch in 0..channels {
                    data[out_off + i * channels + ch] = s;
                }
            }

            frames_written += frames;
        }
    }
}

pub struct Envscope {
    controller: EnvelopeController,
}

impl Envscope {
    pub fn new(settings: EnvelopeSettings) -> Self {
        Self {
            controller: EnvelopeController::new(settings),
        }
    }

    /// Open the default output device and run the UI until quit.
    pub fn run(mut self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = f64::from(config.sample_rate().0);
        let channels = usize::from(config.channels()).max(1);
        tracing::info!(sample_rate, channels, "opened output device");

        let envelope = self.controller.bind(sample_rate)?;
        let mut chain = Chain {
            tone: Tone {
                phase: 0.0,
                frequency: 220.0,
            },
            envelope,
            ctx: RenderCtx::new(sample_rate),
            block: vec![0.0; MAX_BLOCK_SIZE],
        };

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| chain.fill(data, channels),
            |err| tracing::error!(%err, "audio stream error"),
            None,
        )?;
        stream.play()?;

        let mut terminal = ratatui::init();
        let result = UiApp::new(self.controller, sample_rate).run(&mut terminal);
        ratatui::restore();

        result
    }
}
