use std::cell::RefCell;
use std::sync::Arc;
use winit::window::Window as WinitWindow;

use crate::core::surface_renderer::SurfaceRenderer;
use crate::core::{Frame, WindowContext, WindowDimensions};

/// Wrapper around winit Window presenting face frames through wgpu
pub struct Window {
    inner: Arc<WinitWindow>,
    renderer: RefCell<SurfaceRenderer>,
}

impl Window {
    pub fn new(window: Arc<WinitWindow>) -> Result<Self, Box<dyn std::error::Error>> {
        let renderer = SurfaceRenderer::new(window.clone())?;
        Ok(Self {
            inner: window,
            renderer: RefCell::new(renderer),
        })
    }

    /// Reconfigure the surface after a window resize
    pub fn resize(&self, width: u32, height: u32) {
        self.renderer.borrow_mut().resize(width, height);
    }
}

impl WindowContext for Window {
    fn dimensions(&self) -> WindowDimensions {
        let (width, height) = self.renderer.borrow().dimensions();
        WindowDimensions::new(width, height)
    }

    fn present(&self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.renderer.borrow().render_frame(frame)
    }

    fn request_redraw(&self) {
        self.inner.request_redraw();
    }
}
