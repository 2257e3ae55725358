use std::cell::{Cell, RefCell};

use super::frame::Frame;

/// Window dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDimensions {
    pub width: u32,
    pub height: u32,
}

impl WindowDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Surface the face draws into - handles display and redraw requests
pub trait WindowContext {
    /// Get window dimensions in physical pixels
    fn dimensions(&self) -> WindowDimensions;

    /// Show a composed frame
    fn present(&self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Ask the host to call back with a draw (invalidate)
    fn request_redraw(&self);
}

/// Offscreen window: keeps the last presented frame and counts redraw requests
#[derive(Debug)]
pub struct HeadlessWindow {
    dims: Cell<WindowDimensions>,
    last_frame: RefCell<Option<Frame>>,
    redraw_requests: Cell<usize>,
}

impl HeadlessWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            dims: Cell::new(WindowDimensions::new(width, height)),
            last_frame: RefCell::new(None),
            redraw_requests: Cell::new(0),
        }
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.dims.set(WindowDimensions::new(width, height));
    }

    /// Number of redraw requests so far
    pub fn redraw_requests(&self) -> usize {
        self.redraw_requests.get()
    }

    /// Take the last presented frame
    pub fn take_frame(&self) -> Option<Frame> {
        self.last_frame.borrow_mut().take()
    }
}

impl WindowContext for HeadlessWindow {
    fn dimensions(&self) -> WindowDimensions {
        self.dims.get()
    }

    fn present(&self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        *self.last_frame.borrow_mut() = Some(frame.clone());
        Ok(())
    }

    fn request_redraw(&self) {
        self.redraw_requests.set(self.redraw_requests.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::canvas::Canvas;
    use crate::core::clock::ClockReading;

    #[test]
    fn test_window_dimensions_new() {
        let dims = WindowDimensions::new(454, 454);
        assert_eq!(dims.width, 454);
        assert_eq!(dims.height, 454);
    }

    // Mock window for testing trait implementation
    struct MockWindow {
        dims: WindowDimensions,
        presented: RefCell<Vec<u64>>,
        redraw_called: RefCell<usize>,
    }

    impl WindowContext for MockWindow {
        fn dimensions(&self) -> WindowDimensions {
            self.dims
        }

        fn present(&self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            if (frame.width, frame.height) != (self.dims.width, self.dims.height) {
                return Err("frame size mismatch".into());
            }
            self.presented.borrow_mut().push(frame.number);
            Ok(())
        }

        fn request_redraw(&self) {
            *self.redraw_called.borrow_mut() += 1;
        }
    }

    #[test]
    fn test_window_context_present() {
        let window = MockWindow {
            dims: WindowDimensions::new(4, 4),
            presented: RefCell::new(Vec::new()),
            redraw_called: RefCell::new(0),
        };

        let frame = Frame::new(9, ClockReading::default(), Canvas::new(4, 4));
        assert!(window.present(&frame).is_ok());
        assert_eq!(*window.presented.borrow(), vec![9]);

        let wrong = Frame::new(10, ClockReading::default(), Canvas::new(2, 2));
        assert!(window.present(&wrong).is_err());

        window.request_redraw();
        window.request_redraw();
        assert_eq!(*window.redraw_called.borrow(), 2);
    }

    #[test]
    fn headless_window_keeps_last_frame() {
        let window = HeadlessWindow::new(2, 2);
        window.present(&Frame::new(1, ClockReading::default(), Canvas::new(2, 2))).unwrap();
        window.present(&Frame::new(2, ClockReading::default(), Canvas::new(2, 2))).unwrap();
        window.request_redraw();

        assert_eq!(window.redraw_requests(), 1);
        assert_eq!(window.take_frame().map(|f| f.number), Some(2));
        assert!(window.take_frame().is_none());
    }
}
