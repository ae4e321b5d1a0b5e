//! Tone output on the default cpal device.
//!
//! cpal streams are not `Send` on every platform, so a dedicated audio thread
//! owns the stream and the public handle talks to it over a channel.

use bridge_traits::{
    audio::{AudioOutput, AudioRenderer},
    error::{BridgeError, Result},
};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

type RendererSlot = Arc<Mutex<Option<Arc<dyn AudioRenderer>>>>;

enum ToneCommand {
    Start(Sender<Result<()>>),
    Resume(Sender<Result<()>>),
    Shutdown,
}

/// [`AudioOutput`] backed by the default output device.
///
/// The stream is built lazily on the first [`start`](AudioOutput::start);
/// later calls only swap the renderer.
pub struct CpalToneOutput {
    command_tx: Sender<ToneCommand>,
    renderer: RendererSlot,
    running: Arc<AtomicBool>,
    sample_rate: u32,
    audio_thread: Option<JoinHandle<()>>,
}

impl CpalToneOutput {
    /// Open the default output device.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::AudioDevice`] when no output device exists or
    /// its configuration cannot be read.
    pub fn new() -> Result<Self> {
        let renderer: RendererSlot = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(false));
        let (command_tx, command_rx) = bounded::<ToneCommand>(8);
        let (ready_tx, ready_rx) = bounded::<Result<u32>>(1);

        let thread_renderer = Arc::clone(&renderer);
        let thread_running = Arc::clone(&running);
        let audio_thread = thread::Builder::new()
            .name("tone-output".to_string())
            .spawn(move || {
                audio_thread_run(thread_renderer, thread_running, command_rx, ready_tx)
            })
            .map_err(BridgeError::Io)?;

        let sample_rate = ready_rx.recv().map_err(|_| {
            BridgeError::AudioDevice("Audio thread exited during startup".to_string())
        })??;

        info!(sample_rate, "Tone output ready");
        Ok(Self {
            command_tx,
            renderer,
            running,
            sample_rate,
            audio_thread: Some(audio_thread),
        })
    }

    fn request(&self, command: impl FnOnce(Sender<Result<()>>) -> ToneCommand) -> Result<()> {
        let (reply_tx, reply_rx) = bounded(1);
        self.command_tx
            .send(command(reply_tx))
            .map_err(|_| BridgeError::AudioDevice("Audio thread is gone".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| BridgeError::AudioDevice("Audio thread is gone".to_string()))?
    }
}

impl AudioOutput for CpalToneOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&self, renderer: Arc<dyn AudioRenderer>) -> Result<()> {
        *self.renderer.lock() = Some(renderer);
        self.request(ToneCommand::Start)
    }

    fn resume(&self) -> Result<()> {
        self.request(ToneCommand::Resume)
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for CpalToneOutput {
    fn drop(&mut self) {
        self.command_tx.send(ToneCommand::Shutdown).ok();
        if let Some(handle) = self.audio_thread.take() {
            if handle.join().is_err() {
                warn!("Tone output thread panicked");
            }
        }
    }
}

fn audio_thread_run(
    renderer: RendererSlot,
    running: Arc<AtomicBool>,
    command_rx: Receiver<ToneCommand>,
    ready_tx: Sender<Result<u32>>,
) {
    let host = cpal::default_host();
    let opened = host
        .default_output_device()
        .ok_or_else(|| BridgeError::AudioDevice("No output device found".to_string()))
        .and_then(|device| {
            let supported = device
                .default_output_config()
                .map_err(|e| BridgeError::AudioDevice(e.to_string()))?;
            Ok((device, supported.config()))
        });

    let (device, config) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            ready_tx.send(Err(e)).ok();
            return;
        }
    };

    if ready_tx.send(Ok(config.sample_rate.0)).is_err() {
        return;
    }

    let mut stream: Option<Stream> = None;

    while let Ok(command) = command_rx.recv() {
        match command {
            ToneCommand::Start(reply) => {
                let result = match &stream {
                    Some(existing) => existing
                        .play()
                        .map_err(|e| BridgeError::AudioDevice(e.to_string())),
                    None => build_stream(&device, &config, Arc::clone(&renderer)).map(|built| {
                        stream = Some(built);
                    }),
                };
                if result.is_ok() {
                    running.store(true, Ordering::Release);
                }
                reply.send(result).ok();
            }
            ToneCommand::Resume(reply) => {
                let result = match &stream {
                    Some(existing) => existing
                        .play()
                        .map_err(|e| BridgeError::AudioDevice(e.to_string())),
                    None => Ok(()),
                };
                reply.send(result).ok();
            }
            ToneCommand::Shutdown => break,
        }
    }

    running.store(false, Ordering::Release);
    debug!("Tone output thread stopped");
}

fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    renderer: RendererSlot,
) -> Result<Stream> {
    let channels = config.channels as usize;
    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let current = renderer.lock().clone();
                match current {
                    Some(renderer) => renderer.render(data, channels),
                    None => data.fill(0.0),
                }
            },
            |err| error!(error = %err, "Tone output stream error"),
            None,
        )
        .map_err(|e| BridgeError::AudioDevice(format!("Failed to build stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| BridgeError::AudioDevice(format!("Failed to start stream: {}", e)))?;

    debug!(channels, sample_rate = config.sample_rate.0, "Tone output stream started");
    Ok(stream)
}
