use crate::parser::{DisposalMethod, Frame, Palette, PixelSink, Screen};

use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    left: u32,
    top: u32,
    width: u32,
    height: u32,
}

impl Region {
    fn of(frame: &Frame) -> Self {
        Self {
            left: frame.left().into(),
            top: frame.top().into(),
            width: frame.width().into(),
            height: frame.height().into(),
        }
    }
}

/// A screen sized buffer of color indices that frames are composited onto.
///
/// Implements the disposal methods of the graphic control extension and
/// leaves pixels alone where a frame uses its transparent index. Writes
/// outside the screen are dropped.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    background: u8,
    indices: Vec<u8>,
    transparent: Option<u8>,
    disposal: Option<(DisposalMethod, Region)>,
    saved: Option<Vec<u8>>,
}

impl Canvas {
    pub fn new(width: u16, height: u16, background: u8) -> Self {
        let (width, height) = (width as u32, height as u32);
        Self {
            width,
            height,
            background,
            indices: vec![background; (width * height) as usize],
            transparent: None,
            disposal: None,
            saved: None,
        }
    }

    pub fn for_screen(screen: &Screen) -> Self {
        Self::new(
            screen.screen_width,
            screen.screen_height,
            screen.background_color_index,
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row major color indices.
    pub fn indicies(&self) -> &[u8] {
        &self.indices
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.indices[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    pub fn draw(&mut self, frame: &Frame) {
        self.begin_frame(frame);
        for (x, y, color_index) in frame.pixels() {
            self.write_pixel(x, y, color_index);
        }
        self.end_frame(frame);
    }

    /// Expands the indices to packed RGB. Indices the palette does not
    /// cover come out black.
    pub fn to_rgb(&self, palette: &Palette) -> Vec<u8> {
        self.indices
            .iter()
            .flat_map(|&index| palette.get(index).unwrap_or([0, 0, 0]))
            .collect()
    }

    fn dispose(&mut self) {
        match self.disposal.take() {
            Some((DisposalMethod::RestoreToBackgroundColor, region)) => {
                trace!("restoring {:?} to background", region);
                let right = (region.left + region.width).min(self.width);
                let bottom = (region.top + region.height).min(self.height);
                for y in region.top..bottom {
                    let row = (y * self.width) as usize;
                    for x in region.left..right {
                        self.indices[row + x as usize] = self.background;
                    }
                }
            }
            Some((DisposalMethod::RestoreToPrevious, _)) => {
                if let Some(saved) = self.saved.take() {
                    trace!("restoring previous canvas");
                    self.indices = saved;
                }
            }
            _ => {}
        }
    }
}

impl PixelSink for Canvas {
    fn begin_frame(&mut self, frame: &Frame) {
        self.dispose();
        if frame.disposal_method() == DisposalMethod::RestoreToPrevious {
            self.saved = Some(self.indices.clone());
        }
        self.transparent = frame.transparent_color_index();
    }

    fn write_pixel(&mut self, x: u32, y: u32, color_index: u8) {
        if Some(color_index) == self.transparent || x >= self.width || y >= self.height {
            return;
        }
        self.indices[(y * self.width + x) as usize] = color_index;
    }

    fn end_frame(&mut self, frame: &Frame) {
        self.disposal = Some((frame.disposal_method(), Region::of(frame)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_utils::{pack_codes, GifBuilder};
    use crate::parser::{decode, Decoder};

    /// Image data for a frame filled with one color index, written as
    /// nothing but literal codes.
    fn solid(index: u16, count: usize) -> Vec<u8> {
        let mut codes = vec![(4, 3)];
        let mut width = 3;
        for entries in 0..count {
            codes.push((index, width));
            // every literal after the first adds a table entry
            if entries + 6 >= 1 << width {
                width += 1;
            }
        }
        codes.push((5, width));
        pack_codes(&codes)
    }

    fn frames(data: &[u8]) -> Vec<Frame> {
        Decoder::new(data).collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn composites_frames() {
        let data = GifBuilder::with_global_palette(3, 2, 1, 0)
            .image(0, 0, 3, 2, 0x00, 2, &solid(1, 6))
            .image(1, 1, 1, 1, 0x00, 2, &solid(2, 1))
            .trailer();

        let mut canvas = Canvas::new(3, 2, 0);
        decode(&data[..], &mut canvas).unwrap();
        assert_eq!(canvas.indicies(), [1, 1, 1, 1, 2, 1]);
    }

    #[test]
    fn transparent_index_keeps_canvas() {
        let data = GifBuilder::with_global_palette(2, 1, 1, 0)
            .image(0, 0, 2, 1, 0x00, 2, &solid(1, 2))
            .graphic_control(0b00000001, 0, 3)
            .image(0, 0, 2, 1, 0x00, 2, &solid(3, 2))
            .trailer();

        let mut canvas = Canvas::new(2, 1, 0);
        for frame in frames(&data) {
            canvas.draw(&frame);
        }
        assert_eq!(canvas.indicies(), [1, 1]);
    }

    #[test]
    fn restore_to_background() {
        let data = GifBuilder::with_global_palette(2, 2, 1, 0)
            .graphic_control(0b00001000, 0, 0)
            .image(0, 0, 2, 1, 0x00, 2, &solid(1, 2))
            .image(0, 1, 1, 1, 0x00, 2, &solid(2, 1))
            .trailer();
        let frames = frames(&data);

        let mut canvas = Canvas::new(2, 2, 3);
        canvas.draw(&frames[0]);
        assert_eq!(canvas.indicies(), [1, 1, 3, 3]);
        canvas.draw(&frames[1]);
        assert_eq!(canvas.indicies(), [3, 3, 2, 3]);
    }

    #[test]
    fn restore_to_previous() {
        let data = GifBuilder::with_global_palette(2, 1, 1, 0)
            .image(0, 0, 2, 1, 0x00, 2, &solid(1, 2))
            .graphic_control(0b00001100, 0, 0)
            .image(0, 0, 1, 1, 0x00, 2, &solid(2, 1))
            .image(1, 0, 1, 1, 0x00, 2, &solid(0, 1))
            .trailer();
        let frames = frames(&data);

        let mut canvas = Canvas::new(2, 1, 0);
        canvas.draw(&frames[0]);
        canvas.draw(&frames[1]);
        assert_eq!(canvas.indicies(), [2, 1]);
        canvas.draw(&frames[2]);
        assert_eq!(canvas.indicies(), [1, 0]);
    }

    #[test]
    fn clips_to_screen() {
        let data = GifBuilder::with_global_palette(2, 2, 1, 0)
            .image(1, 1, 2, 2, 0x00, 2, &solid(1, 4))
            .trailer();

        let mut canvas = Canvas::new(2, 2, 0);
        decode(&data[..], &mut canvas).unwrap();
        assert_eq!(canvas.indicies(), [0, 0, 0, 1]);
        assert_eq!(canvas.get(1, 1), Some(1));
        assert_eq!(canvas.get(2, 1), None);
    }

    #[test]
    fn expands_to_rgb() {
        let mut canvas = Canvas::new(2, 1, 0);
        canvas.write_pixel(1, 0, 5);
        let palette = Palette::from(vec![[1, 2, 3], [4, 5, 6]]);

        assert_eq!(canvas.to_rgb(&palette), [1, 2, 3, 0, 0, 0]);
    }
}
