use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::engine::decoder::AudioDecoder;
use crate::error::{PlayerError, Result};

const DEFAULT_SAMPLE_RATE: u32 = 44100;
const DEFAULT_CHANNELS: u32 = 2;

pub struct SymphoniaDecoder {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    // Some containers only reveal these once a packet is decoded
    sample_rate: Option<u32>,
    channels: Option<u32>,
    bits_per_sample: Option<u32>,
    n_frames: Option<u64>,
}

impl SymphoniaDecoder {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref).map_err(|source| PlayerError::Open {
            path: path_ref.to_path_buf(),
            source,
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path_ref.extension().and_then(|s| s.to_str()) {
            hint.with_extension(ext);
        }

        let meta_opts = MetadataOptions::default();
        let fmt_opts = FormatOptions::default();
        let dec_opts = DecoderOptions::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)?;

        let reader = probed.format;

        let track = reader.tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(PlayerError::NoTrack)?;

        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate;
        let channels = track.codec_params.channels.map(|c| c.count() as u32);
        let bits_per_sample = track.codec_params.bits_per_sample;
        let n_frames = track.codec_params.n_frames;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &dec_opts)?;

        debug!(
            path = %path_ref.display(),
            ?sample_rate,
            ?channels,
            ?bits_per_sample,
            "opened audio track"
        );

        Ok(Self {
            reader,
            decoder,
            track_id,
            sample_rate,
            channels,
            bits_per_sample,
            n_frames,
        })
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode_next(&mut self) -> Option<Vec<f32>> {
        loop {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(Error::IoError(ref err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => return None,
                Err(err) => {
                    warn!("Reader error: {}", err);
                    return None;
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(audio_buf) => {
                    let spec = *audio_buf.spec();
                    if self.sample_rate.is_none() || self.channels.is_none() {
                        debug!(rate = spec.rate, channels = spec.channels.count(), "format taken from first packet");
                        self.sample_rate.get_or_insert(spec.rate);
                        self.channels.get_or_insert(spec.channels.count() as u32);
                    }
                    let mut sample_buf = SampleBuffer::<f32>::new(audio_buf.capacity() as u64, spec);
                    sample_buf.copy_interleaved_ref(audio_buf);
                    return Some(sample_buf.samples().to_vec());
                }
                Err(Error::DecodeError(err)) => {
                    // A corrupt packet is skipped, the rest of the stream may still decode.
                    warn!("Decode error: {}", err);
                    continue;
                }
                Err(err) => {
                    warn!("Unexpected decoder error: {}", err);
                    return None;
                }
            }
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    fn channels(&self) -> u32 {
        self.channels.unwrap_or(DEFAULT_CHANNELS)
    }

    fn bits_per_sample(&self) -> Option<u32> {
        self.bits_per_sample
    }

    fn frames_hint(&self) -> Option<u64> {
        self.n_frames
    }
}
