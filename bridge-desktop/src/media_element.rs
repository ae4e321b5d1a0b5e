//! Network stream playback for desktop hosts.
//!
//! Each `play` opens a session on its own thread: a blocking HTTP response is
//! fed through symphonia, decoded samples go into a [`SampleQueue`] and a
//! cpal stream owned by the same thread drains it. Live radio has no useful
//! position, so pausing drops the session and the next `play` reconnects at
//! the live edge.

use async_trait::async_trait;
use bridge_traits::{
    audio::{MediaElement, MediaEvent},
    error::{BridgeError, Result},
};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, Stream, StreamConfig};
use parking_lot::Mutex;
use std::io::Read;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};

use crate::http::USER_AGENT;
use crate::sample_queue::SampleQueue;

const EVENT_CAPACITY: usize = 32;
const OUTPUT_CHANNELS: u16 = 2;
/// Seconds of audio buffered before output starts (and after a stall).
const PREROLL_SECONDS: f32 = 0.5;
const QUEUE_SECONDS: usize = 4;
const MAX_CONSECUTIVE_ERRORS: usize = 10;
const BACKOFF: Duration = Duration::from_millis(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// [`MediaElement`] that streams a URL to the default output device.
pub struct NetworkMediaElement {
    events: broadcast::Sender<MediaEvent>,
    state: Mutex<ElementState>,
    volume: Arc<AtomicU32>,
    generation: Arc<AtomicU64>,
}

#[derive(Default)]
struct ElementState {
    source: Option<String>,
    session: Option<Session>,
}

struct Session {
    cancelled: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl Session {
    fn is_live(&self) -> bool {
        !self.cancelled.load(Ordering::Acquire) && !self.finished.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

impl NetworkMediaElement {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            events,
            state: Mutex::new(ElementState::default()),
            volume: Arc::new(AtomicU32::new(1.0f32.to_bits())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Cancel the running session. Returns whether one was live.
    fn end_session(&self, state: &mut ElementState) -> bool {
        self.generation.fetch_add(1, Ordering::AcqRel);
        match state.session.take() {
            Some(session) => {
                let was_live = session.is_live();
                session.cancel();
                was_live
            }
            None => false,
        }
    }
}

impl Default for NetworkMediaElement {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaElement for NetworkMediaElement {
    fn set_source(&self, url: &str) {
        let mut state = self.state.lock();
        self.end_session(&mut state);
        state.source = Some(url.to_string());
        debug!(url, "Media source set");
    }

    async fn play(&self) -> Result<()> {
        let (ready_rx, url) = {
            let mut state = self.state.lock();
            let url = state
                .source
                .clone()
                .ok_or_else(|| BridgeError::OperationFailed("No source set".to_string()))?;

            if state.session.as_ref().is_some_and(Session::is_live) {
                return Ok(());
            }

            let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
            let session = Session {
                cancelled: Arc::new(AtomicBool::new(false)),
                finished: Arc::new(AtomicBool::new(false)),
            };
            let (ready_tx, ready_rx) = oneshot::channel();
            let context = SessionContext {
                url: url.clone(),
                generation,
                current: Arc::clone(&self.generation),
                cancelled: Arc::clone(&session.cancelled),
                finished: Arc::clone(&session.finished),
                volume: Arc::clone(&self.volume),
                events: self.events.clone(),
            };

            thread::Builder::new()
                .name("media-session".to_string())
                .spawn(move || run_session(context, ready_tx))
                .map_err(BridgeError::Io)?;

            state.session = Some(session);
            (ready_rx, url)
        };

        match ready_rx.await {
            Ok(Ok(())) => {
                info!(url = %url, "Stream session started");
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(BridgeError::OperationFailed(
                "Stream session ended before starting".to_string(),
            )),
        }
    }

    fn pause(&self) {
        let mut state = self.state.lock();
        if self.end_session(&mut state) {
            self.events.send(MediaEvent::Paused).ok();
        }
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        self.end_session(&mut state);
    }

    fn set_volume(&self, volume: f32) {
        self.volume
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Release);
    }

    fn is_paused(&self) -> bool {
        !self
            .state
            .lock()
            .session
            .as_ref()
            .is_some_and(Session::is_live)
    }

    fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.events.subscribe()
    }
}

impl Drop for NetworkMediaElement {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        self.end_session(&mut state);
    }
}

// ============================================================================
// Session thread
// ============================================================================

struct SessionContext {
    url: String,
    generation: u64,
    current: Arc<AtomicU64>,
    cancelled: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    volume: Arc<AtomicU32>,
    events: broadcast::Sender<MediaEvent>,
}

impl SessionContext {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || self.current.load(Ordering::Acquire) != self.generation
    }

    /// Events of superseded sessions are dropped.
    fn emit(&self, event: MediaEvent) {
        if !self.is_cancelled() {
            self.events.send(event).ok();
        }
    }
}

/// `ReadOnlySource` wants `Sync`; the response is only ever read from this
/// thread.
struct HttpBody(Mutex<reqwest::blocking::Response>);

impl Read for HttpBody {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.get_mut().read(buf)
    }
}

fn run_session(context: SessionContext, ready_tx: oneshot::Sender<Result<()>>) {
    let mut ready = Some(ready_tx);

    if let Err(e) = stream_to_output(&context, &mut ready) {
        match ready.take() {
            Some(tx) => {
                tx.send(Err(e)).ok();
            }
            None => {
                warn!(url = %context.url, error = %e, "Stream session failed");
                context.emit(MediaEvent::Error(e.to_string()));
            }
        }
    }

    context.finished.store(true, Ordering::Release);
    debug!(url = %context.url, generation = context.generation, "Stream session ended");
}

fn stream_to_output(
    context: &SessionContext,
    ready: &mut Option<oneshot::Sender<Result<()>>>,
) -> Result<()> {
    let (mut format, mut decoder, track_id) = open_stream(&context.url)?;

    let mut output: Option<(Stream, Arc<OutputShared>)> = None;
    let mut consecutive_errors = 0;

    loop {
        if context.is_cancelled() {
            return Ok(());
        }

        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                debug!(url = %context.url, "End of stream");
                if let Some((_, shared)) = &output {
                    drain(context, shared);
                    context.emit(MediaEvent::Paused);
                }
                return Ok(());
            }
            Err(e) => {
                return Err(BridgeError::OperationFailed(format!(
                    "Failed to read stream: {}",
                    e
                )))
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => {
                consecutive_errors = 0;
                decoded
            }
            Err(e @ (SymphoniaError::DecodeError(_) | SymphoniaError::IoError(_)))
                if consecutive_errors < MAX_CONSECUTIVE_ERRORS =>
            {
                consecutive_errors += 1;
                debug!(error = %e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => {
                return Err(BridgeError::OperationFailed(format!(
                    "Failed to decode stream: {}",
                    e
                )))
            }
        };

        let spec = *decoded.spec();
        let mut samples = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        samples.copy_interleaved_ref(decoded);
        let stereo = to_stereo(samples.samples(), spec.channels.count());

        if output.is_none() {
            let shared = Arc::new(OutputShared::new(spec.rate, Arc::clone(&context.volume)));
            let stream = open_output(spec.rate, Arc::clone(&shared))?;
            output = Some((stream, shared));
            if let Some(tx) = ready.take() {
                tx.send(Ok(())).ok();
            }
            context.emit(MediaEvent::Waiting);
        }

        if let Some((_, shared)) = &output {
            feed(context, shared, &stereo);
        }
    }
}

fn open_stream(url: &str) -> Result<(Box<dyn FormatReader>, Box<dyn Decoder>, u32)> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(None)
        .build()
        .map_err(|e| BridgeError::NotAvailable(format!("Failed to build HTTP client: {}", e)))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| BridgeError::OperationFailed(format!("Stream request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(BridgeError::OperationFailed(format!(
            "Stream returned HTTP {}",
            response.status()
        )));
    }

    let mut hint = Hint::new();
    if let Some(content_type) = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    {
        hint.mime_type(content_type);
    }
    if let Some(extension) = url_extension(url) {
        hint.with_extension(extension);
    }

    let source = ReadOnlySource::new(HttpBody(Mutex::new(response)));
    let stream = MediaSourceStream::new(Box::new(source), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| BridgeError::OperationFailed(format!("Unsupported stream format: {}", e)))?;

    let format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| BridgeError::OperationFailed("No audio track in stream".to_string()))?;
    let track_id = track.id;

    let decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| BridgeError::OperationFailed(format!("Unsupported codec: {}", e)))?;

    Ok((format, decoder, track_id))
}

/// File extension of the URL path, if it has one.
fn url_extension(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    let file = path.rsplit('/').next()?;
    let (_, extension) = file.rsplit_once('.')?;
    (!extension.is_empty() && extension.len() <= 4).then_some(extension)
}

/// Interleave into two channels: mono is duplicated, extra channels dropped.
fn to_stereo(samples: &[f32], channels: usize) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.iter().flat_map(|&s| [s, s]).collect(),
        2 => samples.to_vec(),
        n => samples
            .chunks_exact(n)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    }
}

// ============================================================================
// Output
// ============================================================================

struct OutputShared {
    queue: SampleQueue,
    /// Output is silent until enough audio is queued.
    buffering: AtomicBool,
    volume: Arc<AtomicU32>,
    preroll: usize,
}

impl OutputShared {
    fn new(sample_rate: u32, volume: Arc<AtomicU32>) -> Self {
        let per_second = sample_rate as usize * OUTPUT_CHANNELS as usize;
        Self {
            queue: SampleQueue::new(per_second * QUEUE_SECONDS),
            buffering: AtomicBool::new(true),
            volume,
            preroll: (per_second as f32 * PREROLL_SECONDS) as usize,
        }
    }

    fn render(&self, output: &mut [f32]) {
        if self.buffering.load(Ordering::Acquire) {
            output.fill(0.0);
            return;
        }

        let gain = f32::from_bits(self.volume.load(Ordering::Acquire));
        if self.queue.pop_into(output, gain) < output.len() {
            self.buffering.store(true, Ordering::Release);
        }
    }
}

fn open_output(sample_rate: u32, shared: Arc<OutputShared>) -> Result<Stream> {
    let device = cpal::default_host()
        .default_output_device()
        .ok_or_else(|| BridgeError::AudioDevice("No output device found".to_string()))?;

    let config = StreamConfig {
        channels: OUTPUT_CHANNELS,
        sample_rate: SampleRate(sample_rate),
        buffer_size: BufferSize::Default,
    };

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| shared.render(data),
            |err| warn!(error = %err, "Stream output error"),
            None,
        )
        .map_err(|e| BridgeError::AudioDevice(format!("Failed to build stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| BridgeError::AudioDevice(format!("Failed to start stream: {}", e)))?;

    Ok(stream)
}

/// Push decoded samples, waiting for room, and report buffering transitions.
fn feed(context: &SessionContext, shared: &OutputShared, samples: &[f32]) {
    let mut offset = 0;
    let mut reported_waiting = shared.buffering.load(Ordering::Acquire);

    while offset < samples.len() {
        if context.is_cancelled() {
            return;
        }

        offset += shared.queue.push(&samples[offset..]);

        let buffering = shared.buffering.load(Ordering::Acquire);
        if buffering && !reported_waiting {
            context.emit(MediaEvent::Waiting);
            reported_waiting = true;
        }
        if buffering && shared.queue.len() >= shared.preroll.min(shared.queue.capacity()) {
            shared.buffering.store(false, Ordering::Release);
            context.emit(MediaEvent::Playing);
            reported_waiting = false;
        }

        if offset < samples.len() {
            thread::sleep(BACKOFF);
        }
    }
}

/// Let the output play out what is queued.
fn drain(context: &SessionContext, shared: &OutputShared) {
    if shared.buffering.swap(false, Ordering::AcqRel) && !shared.queue.is_empty() {
        context.emit(MediaEvent::Playing);
    }
    while !shared.queue.is_empty() && !context.is_cancelled() {
        thread::sleep(BACKOFF);
    }
}
