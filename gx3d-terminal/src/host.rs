/// Terminal host: the view container beside the control panel and a fixed-rate frame clock
use gx3d_core::backend::RendererId;
use gx3d_core::host::{FrameRequest, FrameScheduler, HostContainer, ObserverId};
use gx3d_core::Viewport;
use std::time::{Duration, Instant};

pub const DEFAULT_FPS: u32 = 30;

/// The terminal region right of the panel, minus the status row
#[derive(Debug)]
pub struct TerminalHost {
    panel_width: u16,
    size: (u16, u16),
    attached: Option<RendererId>,
    observer: Option<ObserverId>,
    next_observer: u64,
}

impl TerminalHost {
    pub fn new(panel_width: u16, size: (u16, u16)) -> Self {
        Self {
            panel_width,
            size,
            attached: None,
            observer: None,
            next_observer: 0,
        }
    }

    /// Record a new terminal size. Returns whether the controller should be notified.
    pub fn set_terminal_size(&mut self, width: u16, height: u16) -> bool {
        self.size = (width, height);
        self.observer.is_some()
    }

    /// Top-left cell of the render surface
    pub fn surface_origin(&self) -> (u16, u16) {
        (self.panel_width, 0)
    }

    pub fn attached(&self) -> Option<RendererId> {
        self.attached
    }

    pub fn is_observed(&self) -> bool {
        self.observer.is_some()
    }
}

impl HostContainer for TerminalHost {
    fn bounds(&self) -> Option<Viewport> {
        let (width, height) = self.size;
        Some(Viewport::new(
            width.saturating_sub(self.panel_width) as u32,
            height.saturating_sub(1) as u32,
        ))
    }

    fn attach_surface(&mut self, renderer: RendererId) {
        if let Some(previous) = self.attached.replace(renderer) {
            log::warn!("Surface {} replaced by {} without detach", previous.0, renderer.0);
        }
    }

    fn detach_surface(&mut self, renderer: RendererId) {
        if self.attached == Some(renderer) {
            self.attached = None;
        }
    }

    fn observe_resize(&mut self) -> ObserverId {
        self.next_observer += 1;
        let observer = ObserverId(self.next_observer);
        self.observer = Some(observer);
        observer
    }

    fn unobserve_resize(&mut self, observer: ObserverId) {
        if self.observer == Some(observer) {
            self.observer = None;
        }
    }
}

/// Fixed-rate scheduler. A requested frame becomes due one frame period
/// after the previous one was taken.
#[derive(Debug)]
pub struct FrameClock {
    frame_time: Duration,
    last_frame: Instant,
    pending: Option<FrameRequest>,
    next_request: u64,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        let fps = fps.max(1);
        Self {
            frame_time: Duration::from_secs(1) / fps,
            last_frame: Instant::now(),
            pending: None,
            next_request: 0,
        }
    }

    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left before the pending frame is due; `None` when nothing is pending
    pub fn time_until_due(&self) -> Option<Duration> {
        self.pending?;
        Some(self.frame_time.saturating_sub(self.last_frame.elapsed()))
    }

    /// Consume the pending request if its frame is due
    pub fn take_due(&mut self) -> bool {
        match self.time_until_due() {
            Some(remaining) if remaining.is_zero() => {
                self.pending = None;
                self.last_frame = Instant::now();
                true
            }
            _ => false,
        }
    }

    /// Sleep out the rest of the frame period, then take the pending frame
    pub fn wait_for_frame(&mut self) -> bool {
        if let Some(remaining) = self.time_until_due() {
            std::thread::sleep(remaining);
        }
        self.take_due()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

impl FrameScheduler for FrameClock {
    fn request_frame(&mut self) -> FrameRequest {
        self.next_request += 1;
        let request = FrameRequest(self.next_request);
        self.pending = Some(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending == Some(request) {
            self.pending = None;
        }
    }
}
