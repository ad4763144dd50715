//! Pull-based PCM decoding for `StorageKind::Decoder` voices.
//!
//! Unlike `streaming_loader`'s background-thread-plus-ring-buffer model,
//! a [`PcmDecoder`] is driven synchronously by its caller (the mixer
//! worker's fill loop): each call to `read` decodes just enough to satisfy
//! the request, and `seek_to_sample` repositions for loop wraparound.

use std::io;

/// The format a decoder produces: fixed for the lifetime of the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFormat {
    pub channel_count: u16,
    pub bit_depth: u16,
    pub sample_rate: u32,
}

impl DecodedFormat {
    pub fn block_align(&self) -> u32 {
        self.channel_count as u32 * (self.bit_depth as u32 / 8)
    }
}

/// A sequential PCM source with a seek-by-sample primitive, decoded on
/// demand rather than resident in memory.
pub trait PcmDecoder: Send {
    fn format(&self) -> DecodedFormat;

    /// Best-effort total byte count; may exceed the true content length
    /// for streamed sources whose exact duration isn't known up front.
    /// `read` returning fewer bytes than requested (including zero) is the
    /// authoritative end-of-stream signal.
    fn total_bytes_estimate(&self) -> u64;

    /// Decodes into `out`, returning the number of bytes written (always a
    /// multiple of `format().block_align()`, possibly zero at end of
    /// stream). Never blocks on anything but local I/O.
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize>;

    /// Repositions the decode cursor to the given sample index.
    fn seek_to_sample(&mut self, sample: u64) -> io::Result<()>;
}

/// Decoder for the project's own raw 8-byte-header PCM/SFX format (see
/// `sfx_loader`): no resampling, no container parsing, direct byte copy.
pub struct RawPcmDecoder {
    data: Vec<u8>,
    format: DecodedFormat,
    data_start: usize,
    cursor: usize,
}

impl RawPcmDecoder {
    pub fn open(path: &std::path::Path) -> io::Result<Self> {
        let data = std::fs::read(path)?;
        if data.len() < 8 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "file too small for raw PCM header"));
        }
        let channel_count = u16::from_le_bytes([data[0], data[1]]);
        let sample_rate = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let format = DecodedFormat {
            channel_count: channel_count.max(1),
            bit_depth: 16,
            sample_rate,
        };
        Ok(RawPcmDecoder {
            data,
            format,
            data_start: 8,
            cursor: 8,
        })
    }
}

impl PcmDecoder for RawPcmDecoder {
    fn format(&self) -> DecodedFormat {
        self.format
    }

    fn total_bytes_estimate(&self) -> u64 {
        (self.data.len() - self.data_start) as u64
    }

    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let remaining = self.data.len() - self.cursor;
        let n = remaining.min(out.len());
        out[..n].copy_from_slice(&self.data[self.cursor..self.cursor + n]);
        self.cursor += n;
        Ok(n)
    }

    fn seek_to_sample(&mut self, sample: u64) -> io::Result<()> {
        let byte_offset = sample * self.format.block_align() as u64;
        self.cursor = (self.data_start as u64 + byte_offset).min(self.data.len() as u64) as usize;
        Ok(())
    }
}

#[cfg(feature = "streaming")]
pub use symphonia_decoder::SymphoniaDecoder;

#[cfg(feature = "streaming")]
mod symphonia_decoder {
    use super::{DecodedFormat, PcmDecoder};
    use std::collections::VecDeque;
    use std::io;
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::{Decoder, DecoderOptions};
    use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::units::Time;
    use symphonia::default::{get_codecs, get_probe};

    /// Sequential symphonia-backed decoder producing i16 interleaved PCM.
    /// Leftover bytes from a packet that didn't align with the caller's
    /// buffer size are held in `pending` until the next `read`.
    pub struct SymphoniaDecoder {
        format_reader: Box<dyn FormatReader>,
        decoder: Box<dyn Decoder>,
        track_id: u32,
        format: DecodedFormat,
        pending: VecDeque<u8>,
        estimated_total_bytes: u64,
        eof: bool,
    }

    impl SymphoniaDecoder {
        pub fn open(path: &std::path::Path) -> io::Result<Self> {
            let file = std::fs::File::open(path)?;
            let mss = MediaSourceStream::new(Box::new(file), Default::default());
            let probed = get_probe()
                .format(&Default::default(), mss, &FormatOptions::default(), &MetadataOptions::default())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("probe error: {e}")))?;
            let format_reader = probed.format;
            let track = format_reader
                .default_track()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "no default track"))?;
            let track_id = track.id;
            let decoder = get_codecs()
                .make(&track.codec_params, &DecoderOptions::default())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("codec make error: {e}")))?;

            let sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
            let channel_count = track
                .codec_params
                .channels
                .map(|c| c.count() as u16)
                .unwrap_or(1);
            let n_frames = track.codec_params.n_frames.unwrap_or(0);
            let block_align = channel_count as u64 * 2;
            let estimated_total_bytes = n_frames * block_align;

            Ok(SymphoniaDecoder {
                format_reader,
                decoder,
                track_id,
                format: DecodedFormat {
                    channel_count,
                    bit_depth: 16,
                    sample_rate,
                },
                pending: VecDeque::new(),
                estimated_total_bytes,
                eof: false,
            })
        }

        fn decode_next_packet_into_pending(&mut self) -> io::Result<bool> {
            loop {
                let packet = match self.format_reader.next_packet() {
                    Ok(p) => p,
                    Err(_) => {
                        self.eof = true;
                        return Ok(false);
                    }
                };
                if packet.track_id() != self.track_id {
                    continue;
                }
                match self.decoder.decode(&packet) {
                    Ok(audio_buf) => {
                        let spec = *audio_buf.spec();
                        let mut sample_buf = SampleBuffer::<i16>::new(audio_buf.capacity() as u64, spec);
                        sample_buf.copy_interleaved_ref(audio_buf);
                        for s in sample_buf.samples() {
                            self.pending.extend(s.to_le_bytes());
                        }
                        return Ok(true);
                    }
                    Err(_) => continue,
                }
            }
        }
    }

    impl PcmDecoder for SymphoniaDecoder {
        fn format(&self) -> DecodedFormat {
            self.format
        }

        fn total_bytes_estimate(&self) -> u64 {
            self.estimated_total_bytes
        }

        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            let mut written = 0;
            while written < out.len() {
                if self.pending.is_empty() {
                    if self.eof {
                        break;
                    }
                    if !self.decode_next_packet_into_pending()? {
                        break;
                    }
                    continue;
                }
                let byte = self.pending.pop_front().unwrap();
                out[written] = byte;
                written += 1;
            }
            Ok(written)
        }

        fn seek_to_sample(&mut self, sample: u64) -> io::Result<()> {
            self.pending.clear();
            self.eof = false;
            let frame = sample / self.format.channel_count.max(1) as u64;
            let ts = Time::from(frame as f64 / self.format.sample_rate as f64);
            self.format_reader
                .seek(
                    SeekMode::Accurate,
                    SeekTo::Time {
                        time: ts,
                        track_id: Some(self.track_id),
                    },
                )
                .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("seek error: {e}")))?;
            self.decoder.reset();
            Ok(())
        }
    }
}
