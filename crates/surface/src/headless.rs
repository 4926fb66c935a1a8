//! In-process renderer that records every command.
//!
//! Used by tests and by the CLI's scripted sessions. A style change resets
//! the camera and marks every existing decoration stale, which is what a real
//! renderer does when it swaps its rendering context.

use std::cell::RefCell;
use std::rc::Rc;

use foundation::geo::{CameraState, FlyTo, LngLat};
use foundation::ids::LocationId;

use crate::marker::MarkerVisual;
use crate::traits::{
    Decoration, RenderSurface, Subscription, SurfaceError, SurfaceFactory, SurfaceOptions,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Construct { style_url: String },
    SetStyle(String),
    FlyTo(FlyTo),
    SetCamera(CameraState),
    Resize,
    AddDecoration(LocationId),
    MoveDecoration(LocationId),
    RemoveDecoration(LocationId),
    Hover(LocationId, bool),
    Remove,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMarker {
    pub serial: u64,
    pub id: LocationId,
    pub position: LngLat,
    pub fill: &'static str,
    pub hovered: bool,
    /// Created under a style that has since been replaced.
    pub stale: bool,
}

#[derive(Debug, Default)]
struct HeadlessState {
    camera: Option<CameraState>,
    markers: Vec<HeadlessMarker>,
    next_serial: u64,
    journal: Vec<SurfaceOp>,
    resize_count: u32,
    observers_attached: u32,
    removed: bool,
}

/// Read-only view of a headless surface, shared with its factory.
#[derive(Debug, Clone, Default)]
pub struct HeadlessProbe {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessProbe {
    pub fn camera(&self) -> Option<CameraState> {
        self.state.borrow().camera
    }

    /// Every marker still attached to the surface, stale or not.
    pub fn markers(&self) -> Vec<HeadlessMarker> {
        self.state.borrow().markers.clone()
    }

    /// Ids of markers attached under the current style, sorted. Duplicates
    /// are kept so leaks show up.
    pub fn live_ids(&self) -> Vec<LocationId> {
        let mut ids: Vec<LocationId> = self
            .state
            .borrow()
            .markers
            .iter()
            .filter(|m| !m.stale)
            .map(|m| m.id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn stale_count(&self) -> usize {
        self.state.borrow().markers.iter().filter(|m| m.stale).count()
    }

    pub fn marker(&self, id: &LocationId) -> Option<HeadlessMarker> {
        self.state
            .borrow()
            .markers
            .iter()
            .find(|m| &m.id == id && !m.stale)
            .cloned()
    }

    pub fn journal(&self) -> Vec<SurfaceOp> {
        self.state.borrow().journal.clone()
    }

    /// Number of journal entries matching `pred`.
    pub fn count_ops(&self, pred: impl Fn(&SurfaceOp) -> bool) -> usize {
        self.state.borrow().journal.iter().filter(|op| pred(op)).count()
    }

    pub fn last_flight(&self) -> Option<FlyTo> {
        self.state.borrow().journal.iter().rev().find_map(|op| match op {
            SurfaceOp::FlyTo(f) => Some(*f),
            _ => None,
        })
    }

    pub fn resize_count(&self) -> u32 {
        self.state.borrow().resize_count
    }

    pub fn observers_attached(&self) -> u32 {
        self.state.borrow().observers_attached
    }

    pub fn is_removed(&self) -> bool {
        self.state.borrow().removed
    }

    /// Simulates the user panning the map.
    pub fn pan_to(&self, camera: CameraState) {
        self.state.borrow_mut().camera = Some(camera);
    }
}

#[derive(Debug, Default)]
pub struct HeadlessFactory {
    probe: HeadlessProbe,
    fail_with: Option<String>,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory whose surfaces fail to construct.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            probe: HeadlessProbe::default(),
            fail_with: Some(message.into()),
        }
    }

    pub fn probe(&self) -> HeadlessProbe {
        self.probe.clone()
    }
}

impl SurfaceFactory for HeadlessFactory {
    fn construct(
        &mut self,
        options: &SurfaceOptions,
    ) -> Result<Box<dyn RenderSurface>, SurfaceError> {
        if let Some(msg) = &self.fail_with {
            return Err(SurfaceError::Init(msg.clone()));
        }
        {
            let mut st = self.probe.state.borrow_mut();
            st.camera = Some(options.camera);
            st.journal.push(SurfaceOp::Construct {
                style_url: options.style_url.clone(),
            });
        }
        Ok(Box::new(HeadlessSurface {
            state: self.probe.state.clone(),
        }))
    }

    fn observe_resize(&mut self, _container: &str) -> Box<dyn Subscription> {
        self.probe.state.borrow_mut().observers_attached += 1;
        Box::new(HeadlessSubscription {
            state: self.probe.state.clone(),
            attached: true,
        })
    }
}

struct HeadlessSurface {
    state: Rc<RefCell<HeadlessState>>,
}

impl RenderSurface for HeadlessSurface {
    fn set_style(&mut self, style_url: &str) {
        let mut st = self.state.borrow_mut();
        st.camera = Some(CameraState::new(LngLat::new(0.0, 0.0), 0.0));
        for m in &mut st.markers {
            m.stale = true;
        }
        st.journal.push(SurfaceOp::SetStyle(style_url.to_string()));
    }

    fn fly_to(&mut self, flight: FlyTo) {
        let mut st = self.state.borrow_mut();
        // Animations complete instantly here; a later call simply retargets.
        st.camera = Some(flight.target());
        st.journal.push(SurfaceOp::FlyTo(flight));
    }

    fn camera(&self) -> CameraState {
        self.state
            .borrow()
            .camera
            .unwrap_or(CameraState::new(LngLat::new(0.0, 0.0), 0.0))
    }

    fn set_camera(&mut self, camera: CameraState) {
        let mut st = self.state.borrow_mut();
        st.camera = Some(camera);
        st.journal.push(SurfaceOp::SetCamera(camera));
    }

    fn resize(&mut self) {
        let mut st = self.state.borrow_mut();
        st.resize_count += 1;
        st.journal.push(SurfaceOp::Resize);
    }

    fn add_decoration(
        &mut self,
        id: &LocationId,
        visual: &MarkerVisual,
        at: LngLat,
    ) -> Box<dyn Decoration> {
        let serial = {
            let mut st = self.state.borrow_mut();
            let serial = st.next_serial;
            st.next_serial += 1;
            st.markers.push(HeadlessMarker {
                serial,
                id: id.clone(),
                position: at,
                fill: visual.fill,
                hovered: false,
                stale: false,
            });
            st.journal.push(SurfaceOp::AddDecoration(id.clone()));
            serial
        };
        Box::new(HeadlessDecoration {
            state: self.state.clone(),
            serial,
            id: id.clone(),
        })
    }

    fn remove(&mut self) {
        let mut st = self.state.borrow_mut();
        st.removed = true;
        st.journal.push(SurfaceOp::Remove);
    }
}

struct HeadlessDecoration {
    state: Rc<RefCell<HeadlessState>>,
    serial: u64,
    id: LocationId,
}

impl HeadlessDecoration {
    fn with_marker(&self, f: impl FnOnce(&mut HeadlessMarker)) {
        let mut st = self.state.borrow_mut();
        if let Some(m) = st.markers.iter_mut().find(|m| m.serial == self.serial) {
            f(m);
        }
    }
}

impl Decoration for HeadlessDecoration {
    fn set_position(&mut self, at: LngLat) {
        self.with_marker(|m| m.position = at);
        self.state
            .borrow_mut()
            .journal
            .push(SurfaceOp::MoveDecoration(self.id.clone()));
    }

    fn set_hovered(&mut self, hovered: bool) {
        self.with_marker(|m| m.hovered = hovered);
        self.state
            .borrow_mut()
            .journal
            .push(SurfaceOp::Hover(self.id.clone(), hovered));
    }

    fn remove(&mut self) {
        let mut st = self.state.borrow_mut();
        let before = st.markers.len();
        st.markers.retain(|m| m.serial != self.serial);
        if st.markers.len() != before {
            st.journal.push(SurfaceOp::RemoveDecoration(self.id.clone()));
        }
    }
}

struct HeadlessSubscription {
    state: Rc<RefCell<HeadlessState>>,
    attached: bool,
}

impl Subscription for HeadlessSubscription {
    fn disconnect(&mut self) {
        if std::mem::take(&mut self.attached) {
            self.state.borrow_mut().observers_attached -= 1;
        }
    }
}
