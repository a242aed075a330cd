use ndarray::{ArrayView3, ArrayViewMut3};

/// One video frame: contiguous RGB bytes in row-major order, plus the
/// frame's position in the source stream.
///
/// Pixel format conversion happens at the I/O boundary; everything above
/// it sees tightly packed `width * height * channels` bytes.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// `(height, width, channels)` view over the pixel data.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Single-channel luma rendition of this frame, as consumed by the
    /// cascade detector. Uses integer BT.601 weights; single-channel
    /// frames are copied through unchanged.
    pub fn to_gray(&self) -> GrayFrame {
        let c = self.channels as usize;

        if c == 1 {
            return GrayFrame::new(self.data.clone(), self.width, self.height);
        }

        let mut luma = Vec::with_capacity((self.width * self.height) as usize);
        for px in self.data.chunks_exact(c) {
            let r = px[0] as u32;
            let g = px[1] as u32;
            let b = px[2] as u32;
            luma.push(((299 * r + 587 * g + 114 * b + 500) / 1000) as u8);
        }
        GrayFrame::new(luma, self.width, self.height)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

/// Grayscale companion to [`Frame`]: one luma byte per pixel.
///
/// Detection never mutates pixels, so this type is read-only.
#[derive(Clone, Debug)]
pub struct GrayFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl GrayFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "data length must equal width * height"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
