//! Renders the tone mixer through a fake output and checks the audible envelope.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{AudioOutput, AudioRenderer};
use core_tones::{ToneCatalog, ToneConfig, ToneDefinition, ToneEngine, Waveform};
use parking_lot::Mutex;

/// Output that keeps the renderer so the test can pull blocks on demand.
#[derive(Default)]
struct CapturingOutput {
    renderer: Mutex<Option<Arc<dyn AudioRenderer>>>,
}

impl CapturingOutput {
    fn pull(&self, frames: usize) -> Vec<f32> {
        let mut buffer = vec![0.0; frames];
        if let Some(renderer) = self.renderer.lock().as_ref() {
            renderer.render(&mut buffer, 1);
        }
        buffer
    }
}

impl AudioOutput for CapturingOutput {
    fn sample_rate(&self) -> u32 {
        1000
    }

    fn start(&self, renderer: Arc<dyn AudioRenderer>) -> bridge_traits::error::Result<()> {
        *self.renderer.lock() = Some(renderer);
        Ok(())
    }

    fn resume(&self) -> bridge_traits::error::Result<()> {
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.renderer.lock().is_some()
    }
}

/// A square wave makes the envelope readable straight from the samples.
fn square_catalog() -> ToneCatalog {
    ToneCatalog::new(vec![ToneDefinition::new(
        "square",
        1.0,
        "Square",
        "test tone",
        Waveform::Square,
    )])
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

#[tokio::test(start_paused = true)]
async fn test_fade_in_then_fade_out() {
    let output = Arc::new(CapturingOutput::default());
    let config = ToneConfig {
        master_volume: 1.0,
        ..ToneConfig::default()
    };
    let engine = ToneEngine::new(square_catalog(), output.clone(), config);

    engine.enable("square").unwrap();

    // Start of the fade-in is near silence
    let first = output.pull(10);
    assert!(peak(&first) < 0.02);

    // Five time constants later the tone sits at its default level
    output.pull(2500);
    let settled = output.pull(10);
    assert!((peak(&settled) - 0.5).abs() < 0.01);

    engine.disable("square");
    output.pull(2500);
    let faded = output.pull(10);
    assert!(peak(&faded) < 0.01);

    tokio::time::sleep(Duration::from_millis(650)).await;
    assert_eq!(engine.mixer().voice_count(), 0);
    assert_eq!(peak(&output.pull(10)), 0.0);
}

#[tokio::test]
async fn test_master_volume_scales_every_tone() {
    let output = Arc::new(CapturingOutput::default());
    let config = ToneConfig {
        fade_in_secs: 0.0,
        volume_ramp_secs: 0.0,
        master_volume: 0.5,
        ..ToneConfig::default()
    };
    let engine = ToneEngine::new(square_catalog(), output.clone(), config);

    engine.enable("square").unwrap();
    assert!((peak(&output.pull(10)) - 0.25).abs() < 1e-6);

    engine.set_master_volume(1.0);
    assert!((peak(&output.pull(10)) - 0.5).abs() < 1e-6);
}
