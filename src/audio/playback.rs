//! Audio playback module using cpal.
//!
//! Plays narrated sentences through the default output device with interrupt support.
//! Includes automatic resampling when the device sample rate differs from the synthesizer.
//! Uses lock-free ring buffer to avoid mutex contention in audio callback.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use parking_lot::{Condvar, Mutex};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use tracing::{debug, info, warn};

use super::resampler::resample;
use super::util::{find_best_config, get_device_name};

/// Size of the playback ring buffer in samples (~11 seconds at 48kHz).
/// Long sentences from papers can exceed this; the remainder is fed as space frees up.
const PLAYBACK_RING_SIZE: usize = 524288;

/// Extra time allowed past the expected duration before giving up on a sentence.
const PLAYBACK_GRACE: Duration = Duration::from_secs(1);

/// How a call to [`Player::play`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every sample reached the device
    Completed,
    /// [`Player::interrupt`] was called
    Interrupted,
    /// The device stopped draining the buffer
    TimedOut,
}

/// Audio player that outputs samples to the speaker.
/// Uses a lock-free ring buffer for the audio callback to avoid priority inversion.
pub struct Player {
    /// Kept alive to maintain the audio stream
    _stream: Stream,
    /// Sample rate of the audio device
    device_sample_rate: u32,
    /// Sample rate of the input audio (TTS output)
    input_sample_rate: u32,
    /// Ring buffer producer for queuing samples
    producer: Mutex<ringbuf::HeapProd<f32>>,
    /// Number of samples currently queued
    queued_samples: Arc<AtomicUsize>,
    /// Flag to indicate playback should be interrupted
    interrupt: Arc<AtomicBool>,
    /// Flag to indicate playback is active
    playing: Arc<AtomicBool>,
    /// Mutex and Condvar for efficient waiting on playback completion
    playing_mutex: Arc<Mutex<()>>,
    playback_complete: Arc<Condvar>,
}

impl Player {
    /// Create a new audio player.
    ///
    /// # Arguments
    /// * `sample_rate` - The sample rate of the audio to play (24000 for Kokoro)
    ///
    /// # Errors
    /// Returns an error if:
    /// - No output device is available
    /// - Failed to get supported output configurations
    /// - Failed to build output stream
    pub fn new(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().context("No output device available")?;

        info!("Using output device: {}", get_device_name(&device));

        // Query device's preferred sample rate for better compatibility
        let device_sample_rate = match device.default_output_config() {
            Ok(default_config) => {
                let rate = default_config.sample_rate();
                info!("Using device's default sample rate: {} Hz", rate);
                rate
            }
            Err(_) => {
                let supported_configs = device.supported_output_configs().context("Failed to get supported output configs")?;
                let config = find_best_config(supported_configs, 48000)?;
                let rate = config.sample_rate();
                info!("Using fallback sample rate: {} Hz", rate);
                rate
            }
        };

        let supported_configs = device.supported_output_configs().context("Failed to get supported output configs")?;
        let config = find_best_config(supported_configs, device_sample_rate)?;

        if device_sample_rate != sample_rate {
            info!("Device sample rate {} Hz differs from input {} Hz - resampling will be applied", device_sample_rate, sample_rate);
        }

        debug!("Audio playback config: {} Hz, {} channels, {:?}", device_sample_rate, config.channels(), config.sample_format());

        let ring = HeapRb::<f32>::new(PLAYBACK_RING_SIZE);
        let (producer, mut consumer) = ring.split();

        let interrupt = Arc::new(AtomicBool::new(false));
        let playing = Arc::new(AtomicBool::new(false));
        let queued_samples = Arc::new(AtomicUsize::new(0));
        let playing_mutex = Arc::new(Mutex::new(()));
        let playback_complete = Arc::new(Condvar::new());

        let interrupt_clone = interrupt.clone();
        let playing_clone = playing.clone();
        let queued_samples_clone = queued_samples.clone();
        let playing_mutex_clone = playing_mutex.clone();
        let playback_complete_clone = playback_complete.clone();

        let channels = config.channels() as usize;
        let stream_config: StreamConfig = config.config();

        let err_fn = |err| {
            tracing::error!("Audio playback error: {}", err);
        };

        let stream = device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let interrupted = interrupt_clone.load(Ordering::Relaxed);

                let mut samples_read = 0;

                if interrupted {
                    // Discard whatever is queued and output silence
                    while consumer.try_pop().is_some() {}
                    data.fill(0.0);
                } else {
                    for frame in data.chunks_mut(channels) {
                        let sample = match consumer.try_pop() {
                            Some(sample) => {
                                samples_read += 1;
                                sample
                            }
                            None => 0.0,
                        };

                        // Duplicate mono sample to all channels
                        for channel in frame.iter_mut() {
                            *channel = sample;
                        }
                    }
                }

                if samples_read > 0 {
                    queued_samples_clone.fetch_sub(samples_read, Ordering::Relaxed);
                }

                if consumer.is_empty() || interrupted {
                    playing_clone.store(false, Ordering::SeqCst);
                    let _guard = playing_mutex_clone.lock();
                    playback_complete_clone.notify_all();
                }
            },
            err_fn,
            None,
        )?;

        stream.play().context("Failed to start playback stream")?;

        info!("Audio playback configured: input {} Hz -> device {} Hz", sample_rate, device_sample_rate);

        Ok(Self {
            _stream: stream,
            device_sample_rate,
            input_sample_rate: sample_rate,
            producer: Mutex::new(producer),
            queued_samples,
            interrupt,
            playing,
            playing_mutex,
            playback_complete,
        })
    }

    /// Play audio samples, blocking until they are played or playback is interrupted.
    ///
    /// # Arguments
    /// * `samples` - Mono f32 samples at the input sample rate
    pub fn play(&self, samples: &[f32]) -> PlaybackOutcome {
        if samples.is_empty() {
            return PlaybackOutcome::Completed;
        }

        self.interrupt.store(false, Ordering::SeqCst);

        let samples_to_play = if self.device_sample_rate != self.input_sample_rate {
            match resample(samples, self.input_sample_rate, self.device_sample_rate) {
                Ok(resampled) => {
                    debug!(
                        "Resampled {} -> {} samples ({} Hz -> {} Hz)",
                        samples.len(),
                        resampled.len(),
                        self.input_sample_rate,
                        self.device_sample_rate
                    );
                    resampled
                }
                Err(e) => {
                    tracing::error!("Resampling failed: {}, playing without resampling", e);
                    samples.to_vec()
                }
            }
        } else {
            samples.to_vec()
        };

        let duration_secs = samples_to_play.len() as f64 / self.device_sample_rate as f64;
        let deadline = Instant::now() + Duration::from_secs_f64(duration_secs) + PLAYBACK_GRACE;

        debug!("Playing {} samples at {} Hz", samples_to_play.len(), self.device_sample_rate);

        let mut pending: &[f32] = &samples_to_play;
        loop {
            if !pending.is_empty() {
                let written = self.producer.lock().push_slice(pending);
                self.queued_samples.fetch_add(written, Ordering::Relaxed);
                pending = &pending[written..];
                if written > 0 {
                    self.playing.store(true, Ordering::SeqCst);
                }
            }

            if self.interrupt.load(Ordering::Relaxed) {
                debug!("Playback interrupted");
                self.clear();
                return PlaybackOutcome::Interrupted;
            }

            if Instant::now() > deadline {
                warn!("Playback timeout exceeded");
                self.clear();
                return PlaybackOutcome::TimedOut;
            }

            if pending.is_empty() && !self.playing.load(Ordering::Relaxed) {
                break;
            }

            // Wait on condition variable with short timeout to check interrupts
            let mut guard = self.playing_mutex.lock();
            self.playback_complete.wait_for(&mut guard, Duration::from_millis(50));
        }

        debug!("Playback completed");
        PlaybackOutcome::Completed
    }

    /// Interrupt current playback.
    pub fn interrupt(&self) {
        self.interrupt.store(true, Ordering::SeqCst);
    }

    /// Stop playback and drain the buffer.
    ///
    /// The interrupt flag makes the audio callback discard queued samples and output silence.
    fn clear(&self) {
        let producer = self.producer.lock();
        self.interrupt.store(true, Ordering::SeqCst);
        self.queued_samples.store(0, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
        drop(producer);

        // Brief sleep to let the callback drain any remaining buffered samples
        std::thread::sleep(Duration::from_millis(20));
        self.interrupt.store(false, Ordering::SeqCst);
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.interrupt.store(true, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
    }
}
