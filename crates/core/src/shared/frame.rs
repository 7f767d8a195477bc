use ndarray::ArrayView3;

/// A single captured image: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
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
        }
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, 3)
    }

    /// Copies the pixels into an `image` buffer. `None` unless the frame is RGB.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        if self.channels != 3 {
            return None;
        }
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
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

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the rectangle `(x, y, width, height)` into a new frame.
    ///
    /// The rectangle is clamped to the frame bounds; an empty intersection
    /// yields `None`.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Option<Frame> {
        let x = x.min(self.width);
        let y = y.min(self.height);
        let w = width.min(self.width - x);
        let h = height.min(self.height - y);
        if w == 0 || h == 0 {
            return None;
        }

        let ch = self.channels as usize;
        let stride = self.width as usize * ch;
        let mut data = Vec::with_capacity(w as usize * h as usize * ch);
        for row in y as usize..(y + h) as usize {
            let start = row * stride + x as usize * ch;
            data.extend_from_slice(&self.data[start..start + w as usize * ch]);
        }
        Some(Frame::new(data, w, h, self.channels))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
