use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::{Dictionary, Packet, Rational};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

/// Encodes RGB24 frames to an MPEG4 video file via ffmpeg-next.
pub struct FfmpegWriter {
    output: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<scaling::Context>,
    width: u32,
    height: u32,
    fps: i32,
    frames_written: usize,
}

// Safety: used from one thread at a time; the raw pointers inside
// ffmpeg types are never shared.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            output: None,
            encoder: None,
            scaler: None,
            width: 0,
            height: 0,
            fps: 0,
            frames_written: 0,
        }
    }

    fn drain_encoder(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let encoder = self.encoder.as_mut().ok_or("writer is not open")?;
        let output = self.output.as_mut().ok_or("writer is not open")?;
        let time_base = output
            .stream(0)
            .ok_or("output stream missing")?
            .time_base();

        let mut packet = Packet::empty();
        while encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(0);
            packet.rescale_ts(Rational(1, self.fps), time_base);
            packet.write_interleaved(output)?;
        }
        Ok(())
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        self.width = metadata.width;
        self.height = metadata.height;
        self.fps = match metadata.fps.round() as i32 {
            f if f > 0 => f,
            _ => 30,
        };

        let mut output = ffmpeg_next::format::output(path)?;
        let global_header = output
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
            .ok_or("MPEG4 encoder unavailable")?;
        let mut stream = output.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;
        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(Pixel::YUV420P);
        encoder_ctx.set_time_base(Rational(1, self.fps));
        encoder_ctx.set_frame_rate(Some(Rational(self.fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(Dictionary::new())?;
        stream.set_parameters(&encoder);
        output.write_header()?;

        self.scaler = Some(scaling::Context::get(
            Pixel::RGB24,
            metadata.width,
            metadata.height,
            Pixel::YUV420P,
            metadata.width,
            metadata.height,
            scaling::Flags::BILINEAR,
        )?);
        self.output = Some(output);
        self.encoder = Some(encoder);
        self.frames_written = 0;

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if self.encoder.is_none() || self.scaler.is_none() {
            return Err("writer is not open".into());
        }

        let mut rgb =
            ffmpeg_next::util::frame::video::Video::new(Pixel::RGB24, self.width, self.height);
        let stride = rgb.stride(0);
        let row_bytes = self.width as usize * 3;
        {
            let dst = rgb.data_mut(0);
            let src = frame.data();
            for row in 0..self.height as usize {
                dst[row * stride..row * stride + row_bytes]
                    .copy_from_slice(&src[row * row_bytes..(row + 1) * row_bytes]);
            }
        }

        let mut yuv = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .as_mut()
            .ok_or("writer is not open")?
            .run(&rgb, &mut yuv)?;
        yuv.set_pts(Some(self.frames_written as i64));

        self.encoder
            .as_mut()
            .ok_or("writer is not open")?
            .send_frame(&yuv)?;
        self.drain_encoder()?;

        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(encoder) = self.encoder.as_mut() {
            encoder.send_eof()?;
            self.drain_encoder()?;
            if let Some(output) = self.output.as_mut() {
                output.write_trailer()?;
            }
        }
        self.output = None;
        self.encoder = None;
        self.scaler = None;
        Ok(())
    }
}
