//! Zoom, pan and rotate state for one displayed image.
//!
//! Pointer drags are coalesced: any number of `update_drag` calls between two
//! animation frames produce a single translate commit in `on_frame`, using
//! the most recent pointer position. The engine never schedules frames
//! itself; `update_drag` reports when the host must request one.

use serde::Serialize;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 3.0;
pub const ZOOM_STEP: f64 = 0.1;

// Zoom is held in tenths so repeated steps land exactly on the grid.
const MIN_ZOOM_TENTHS: u8 = 10;
const MAX_ZOOM_TENTHS: u8 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Translate {
    pub x: f64,
    pub y: f64,
}

impl Translate {
    pub const ORIGIN: Translate = Translate { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    pub fn clockwise(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }
}

/// Committed view state, as rendered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    zoom_tenths: u8,
    translate: Translate,
    rotation: Rotation,
    dragging: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom_tenths: MIN_ZOOM_TENTHS,
            translate: Translate::ORIGIN,
            rotation: Rotation::Deg0,
            dragging: false,
        }
    }
}

impl Viewport {
    pub fn zoom(&self) -> f64 {
        f64::from(self.zoom_tenths) / 10.0
    }

    pub fn translate(&self) -> Translate {
        self.translate
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Zoom as a whole percentage, e.g. `"130%"`.
    pub fn zoom_label(&self) -> String {
        format!("{}%", u32::from(self.zoom_tenths) * 10)
    }

    /// CSS transform equivalent of this viewport.
    pub fn css_transform(&self) -> String {
        format!(
            "translate({}px, {}px) scale({}) rotate({}deg)",
            self.translate.x,
            self.translate.y,
            self.zoom(),
            self.rotation.degrees()
        )
    }
}

#[derive(Debug, Default)]
pub struct ViewportEngine {
    viewport: Viewport,
    drag_origin: Translate,
    /// Translate computed from the latest pointer event, not yet committed.
    latest: Translate,
    frame_pending: bool,
    commits: u64,
}

impl ViewportEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Number of translate commits made by `on_frame`.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_tenths = (self.viewport.zoom_tenths + 1).min(MAX_ZOOM_TENTHS);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_tenths = self
            .viewport
            .zoom_tenths
            .saturating_sub(1)
            .max(MIN_ZOOM_TENTHS);
    }

    /// Back to 100% and centred. Rotation is kept. A drag in progress
    /// carries on from the centre at the current pointer position.
    pub fn reset(&mut self) {
        if self.viewport.dragging {
            self.drag_origin = Translate::new(
                self.drag_origin.x + self.latest.x,
                self.drag_origin.y + self.latest.y,
            );
        }
        self.viewport.zoom_tenths = MIN_ZOOM_TENTHS;
        self.viewport.translate = Translate::ORIGIN;
        self.latest = Translate::ORIGIN;
        self.frame_pending = false;
    }

    pub fn rotate(&mut self) {
        self.viewport.rotation = self.viewport.rotation.clockwise();
    }

    pub fn begin_drag(&mut self, pointer_x: f64, pointer_y: f64) {
        let current = self.viewport.translate;
        self.drag_origin = Translate::new(pointer_x - current.x, pointer_y - current.y);
        self.latest = current;
        self.viewport.dragging = true;
    }

    /// Record a pointer move. Returns `true` when the host must schedule an
    /// animation frame; further moves before that frame return `false` and
    /// only replace the pending position.
    pub fn update_drag(&mut self, pointer_x: f64, pointer_y: f64) -> bool {
        if !self.viewport.dragging {
            return false;
        }

        self.latest = Translate::new(pointer_x - self.drag_origin.x, pointer_y - self.drag_origin.y);

        if self.frame_pending {
            return false;
        }
        self.frame_pending = true;
        true
    }

    /// Animation frame callback. Commits the pending translate, if any.
    pub fn on_frame(&mut self) -> Option<Translate> {
        if !std::mem::take(&mut self.frame_pending) {
            return None;
        }
        self.viewport.translate = self.latest;
        self.commits += 1;
        Some(self.latest)
    }

    /// Stop dragging and drop any uncommitted move.
    pub fn end_drag(&mut self) {
        self.viewport.dragging = false;
        self.frame_pending = false;
        self.latest = self.viewport.translate;
    }
}
