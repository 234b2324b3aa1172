use std::borrow::Cow;

use ndarray::{ArrayViewMut3, Axis};

/// Byte order of the colour channels in a [`Frame`].
///
/// Still images are decoded as RGB; camera captures frequently arrive as
/// BGR. The extractor always receives RGB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// A single image or video frame: contiguous pixel bytes in row-major order.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
    order: ChannelOrder,
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
            order: ChannelOrder::Rgb,
        }
    }

    /// Marks the pixel data as stored in `order`.
    pub fn with_channel_order(mut self, order: ChannelOrder) -> Self {
        self.order = order;
        self
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

    pub fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        let shape = self.shape();
        ArrayViewMut3::from_shape(shape, &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Returns the frame in RGB order, borrowing when no conversion is needed.
    ///
    /// Single-channel frames have no order and pass through unchanged.
    pub fn to_rgb(&self) -> Cow<'_, Frame> {
        if self.order == ChannelOrder::Rgb || self.channels < 3 {
            return Cow::Borrowed(self);
        }
        let mut converted = self.clone();
        let mut pixels = converted.as_ndarray_mut();
        for mut pixel in pixels.lanes_mut(Axis(2)) {
            pixel.swap(0, 2);
        }
        converted.order = ChannelOrder::Rgb;
        Cow::Owned(converted)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
