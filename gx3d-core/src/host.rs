/// Host environment seams: the container the view lives in and the frame scheduler
use crate::backend::RendererId;
use crate::projection::Viewport;

/// Handle for a registered resize observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// Handle for a pending animation-frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Rectangular region that hosts the render surface
pub trait HostContainer {
    /// Current bounds, or `None` when the container does not exist yet
    fn bounds(&self) -> Option<Viewport>;

    fn attach_surface(&mut self, renderer: RendererId);

    fn detach_surface(&mut self, renderer: RendererId);

    /// Start delivering resize notifications for this container
    fn observe_resize(&mut self) -> ObserverId;

    fn unobserve_resize(&mut self, observer: ObserverId);
}

/// Per-frame callback registration, in the manner of `requestAnimationFrame`.
///
/// The host calls the controller's `tick` once for every request it honours.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameRequest;

    fn cancel_frame(&mut self, request: FrameRequest);
}
