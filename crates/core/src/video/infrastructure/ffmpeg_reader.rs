use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::media::Type;
use ffmpeg_next::software::scaling;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Decodes video via ffmpeg-next (libavformat + libavcodec), handing
/// out tightly packed RGB24 frames.
pub struct FfmpegReader {
    input: Option<ffmpeg_next::format::context::Input>,
    stream_index: usize,
}

// Safety: used from one thread at a time; the raw pointers inside
// ffmpeg types are never shared.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self {
            input: None,
            stream_index: 0,
        }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let input = ffmpeg_next::format::input(path)?;
        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or("no video stream in input")?;
        self.stream_index = stream.index();

        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?
            .decoder()
            .video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames: stream.frames().max(0) as usize,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };

        self.input = Some(input);
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let stream_index = self.stream_index;
        let Some(input) = self.input.as_mut() else {
            return Box::new(std::iter::once(Err("reader is not open".into())));
        };

        match setup_decoder(input) {
            Ok((decoder, scaler)) => Box::new(DecodedFrames {
                input,
                decoder,
                scaler,
                stream_index,
                next_index: 0,
                flushing: false,
                done: false,
            }),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn close(&mut self) {
        self.input = None;
    }
}

fn setup_decoder(
    input: &ffmpeg_next::format::context::Input,
) -> Result<(ffmpeg_next::decoder::Video, scaling::Context), Box<dyn std::error::Error>> {
    let stream = input
        .streams()
        .best(Type::Video)
        .ok_or("no video stream in input")?;
    let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?
        .decoder()
        .video()?;
    let scaler = scaling::Context::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        Pixel::RGB24,
        decoder.width(),
        decoder.height(),
        scaling::Flags::BILINEAR,
    )?;
    Ok((decoder, scaler))
}

/// Pull-based decode loop: one frame per `next` call, nothing buffered
/// beyond the decoder's own state.
struct DecodedFrames<'a> {
    input: &'a mut ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: scaling::Context,
    stream_index: usize,
    next_index: usize,
    flushing: bool,
    done: bool,
}

impl DecodedFrames<'_> {
    fn receive_decoded(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }

        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.scaler.run(&decoded, &mut rgb) {
            return Some(Err(Box::new(e)));
        }

        let width = self.decoder.width();
        let height = self.decoder.height();
        let frame = Frame::new(
            packed_rgb(&rgb, width, height),
            width,
            height,
            3,
            self.next_index,
        );
        self.next_index += 1;
        Some(Ok(frame))
    }
}

impl Iterator for DecodedFrames<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some(result) = self.receive_decoded() {
                return Some(result);
            }
            if self.flushing {
                self.done = true;
                return None;
            }

            match self.input.packets().find(|(s, _)| s.index() == self.stream_index) {
                Some((_, packet)) => {
                    // A send failure on one packet is recoverable; the
                    // next packet may decode fine.
                    let _ = self.decoder.send_packet(&packet);
                }
                None => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                }
            }
        }
    }
}

/// Strips ffmpeg's row padding (stride may exceed `width * 3`) into a
/// contiguous RGB buffer.
fn packed_rgb(rgb: &ffmpeg_next::util::frame::video::Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
