//! mapbox-gl behind the surface traits.
//!
//! A small inline JS shim owns the `mapboxgl.Map` and marker elements; Rust
//! holds opaque handles to them. Every renderer callback is serialized to
//! JSON and pushed onto the host [`EventQueue`].

use foundation::geo::{CameraState, FlyTo, LngLat};
use foundation::ids::LocationId;
use surface::{
    Decoration, MarkerVisual, RenderSurface, Subscription, SurfaceError, SurfaceFactory,
    SurfaceOptions,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::events::{EventQueue, HostEvent};

#[wasm_bindgen(inline_js = "
export function atlas_map_create(container, style, lng, lat, zoom, token, emit) {
    if (typeof mapboxgl === 'undefined') {
        throw new Error('mapbox-gl is not loaded');
    }
    mapboxgl.accessToken = token;
    const map = new mapboxgl.Map({ container, style, center: [lng, lat], zoom });
    const send = (ev) => emit(JSON.stringify(ev));
    map.on('load', () => send({ kind: 'loaded' }));
    map.on('style.load', () => send({ kind: 'style_loaded' }));
    return { map, send };
}

export function atlas_map_set_style(h, style) {
    h.map.setStyle(style);
}

export function atlas_map_fly_to(h, lng, lat, zoom, duration) {
    h.map.flyTo({ center: [lng, lat], zoom, duration });
}

export function atlas_map_jump_to(h, lng, lat, zoom) {
    h.map.jumpTo({ center: [lng, lat], zoom });
}

export function atlas_map_camera(h) {
    const c = h.map.getCenter();
    return new Float64Array([c.lng, c.lat, h.map.getZoom()]);
}

export function atlas_map_resize(h) {
    h.map.resize();
}

export function atlas_map_remove(h) {
    h.map.remove();
}

export function atlas_marker_add(h, id, lng, lat, fill, border, shadow, hit, dot) {
    const el = document.createElement('div');
    el.className = 'atlas-marker';
    el.style.width = hit + 'px';
    el.style.height = hit + 'px';
    el.style.display = 'flex';
    el.style.alignItems = 'center';
    el.style.justifyContent = 'center';
    el.style.cursor = 'pointer';
    const inner = document.createElement('div');
    inner.style.width = dot + 'px';
    inner.style.height = dot + 'px';
    inner.style.borderRadius = '50%';
    inner.style.background = fill;
    inner.style.border = '2px solid ' + border;
    inner.style.boxShadow = shadow;
    inner.style.transition = 'transform 0.15s ease';
    el.appendChild(inner);
    el.addEventListener('click', (e) => {
        e.stopPropagation();
        h.send({ kind: 'click', id });
    });
    el.addEventListener('mouseenter', () => h.send({ kind: 'hover', id, on: true }));
    el.addEventListener('mouseleave', () => h.send({ kind: 'hover', id, on: false }));
    const marker = new mapboxgl.Marker({ element: el }).setLngLat([lng, lat]).addTo(h.map);
    return { marker, inner };
}

export function atlas_marker_move(m, lng, lat) {
    m.marker.setLngLat([lng, lat]);
}

export function atlas_marker_scale(m, scale) {
    m.inner.style.transform = 'scale(' + scale + ')';
}

export function atlas_marker_remove(m) {
    m.marker.remove();
}
")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn atlas_map_create(
        container: &str,
        style: &str,
        lng: f64,
        lat: f64,
        zoom: f64,
        token: &str,
        emit: &Closure<dyn FnMut(String)>,
    ) -> Result<JsValue, JsValue>;

    fn atlas_map_set_style(h: &JsValue, style: &str);
    fn atlas_map_fly_to(h: &JsValue, lng: f64, lat: f64, zoom: f64, duration: u32);
    fn atlas_map_jump_to(h: &JsValue, lng: f64, lat: f64, zoom: f64);
    fn atlas_map_camera(h: &JsValue) -> Vec<f64>;
    fn atlas_map_resize(h: &JsValue);
    fn atlas_map_remove(h: &JsValue);

    #[allow(clippy::too_many_arguments)]
    fn atlas_marker_add(
        h: &JsValue,
        id: &str,
        lng: f64,
        lat: f64,
        fill: &str,
        border: &str,
        shadow: &str,
        hit: u32,
        dot: u32,
    ) -> JsValue;
    fn atlas_marker_move(m: &JsValue, lng: f64, lat: f64);
    fn atlas_marker_scale(m: &JsValue, scale: f32);
    fn atlas_marker_remove(m: &JsValue);
}

pub struct MapboxFactory {
    access_token: String,
    queue: EventQueue,
}

impl MapboxFactory {
    pub fn new(access_token: impl Into<String>, queue: EventQueue) -> Self {
        Self {
            access_token: access_token.into(),
            queue,
        }
    }
}

impl SurfaceFactory for MapboxFactory {
    fn construct(
        &mut self,
        options: &SurfaceOptions,
    ) -> Result<Box<dyn RenderSurface>, SurfaceError> {
        let queue = self.queue.clone();
        let emit = Closure::<dyn FnMut(String)>::new(move |raw: String| {
            if let Err(e) = queue.push_json(&raw) {
                crate::log_error(&format!("dropping renderer event: {e}"));
            }
        });
        let camera = options.camera;
        let handle = atlas_map_create(
            &options.container,
            &options.style_url,
            camera.center.lng,
            camera.center.lat,
            camera.zoom,
            &self.access_token,
            &emit,
        )
        .map_err(|e| SurfaceError::Init(js_error_message(&e)))?;
        Ok(Box::new(MapboxSurface {
            handle,
            _emit: emit,
        }))
    }

    fn observe_resize(&mut self, container: &str) -> Box<dyn Subscription> {
        match ResizeWatch::attach(container, self.queue.clone()) {
            Ok(watch) => Box::new(watch),
            Err(e) => {
                crate::log_error(&format!("resize observation unavailable: {e}"));
                Box::new(NoWatch)
            }
        }
    }
}

struct MapboxSurface {
    handle: JsValue,
    // Keeps the JS -> Rust event callback alive as long as the map.
    _emit: Closure<dyn FnMut(String)>,
}

impl RenderSurface for MapboxSurface {
    fn set_style(&mut self, style_url: &str) {
        atlas_map_set_style(&self.handle, style_url);
    }

    fn fly_to(&mut self, flight: FlyTo) {
        atlas_map_fly_to(
            &self.handle,
            flight.center.lng,
            flight.center.lat,
            flight.zoom,
            flight.duration_ms,
        );
    }

    fn camera(&self) -> CameraState {
        match atlas_map_camera(&self.handle).as_slice() {
            [lng, lat, zoom] => CameraState::new(LngLat::new(*lng, *lat), *zoom),
            _ => CameraState::new(LngLat::new(0.0, 0.0), 0.0),
        }
    }

    fn set_camera(&mut self, camera: CameraState) {
        atlas_map_jump_to(&self.handle, camera.center.lng, camera.center.lat, camera.zoom);
    }

    fn resize(&mut self) {
        atlas_map_resize(&self.handle);
    }

    fn add_decoration(
        &mut self,
        id: &LocationId,
        visual: &MarkerVisual,
        at: LngLat,
    ) -> Box<dyn Decoration> {
        let marker = atlas_marker_add(
            &self.handle,
            id.as_str(),
            at.lng,
            at.lat,
            visual.fill,
            visual.border,
            visual.shadow,
            visual.hit_size_px,
            visual.dot_size_px,
        );
        Box::new(MapboxMarker {
            marker,
            hover_scale: visual.hover_scale,
            removed: false,
        })
    }

    fn remove(&mut self) {
        atlas_map_remove(&self.handle);
    }
}

struct MapboxMarker {
    marker: JsValue,
    hover_scale: f32,
    removed: bool,
}

impl Decoration for MapboxMarker {
    fn set_position(&mut self, at: LngLat) {
        atlas_marker_move(&self.marker, at.lng, at.lat);
    }

    fn set_hovered(&mut self, hovered: bool) {
        atlas_marker_scale(&self.marker, if hovered { self.hover_scale } else { 1.0 });
    }

    fn remove(&mut self) {
        if !std::mem::replace(&mut self.removed, true) {
            atlas_marker_remove(&self.marker);
        }
    }
}

/// `ResizeObserver` on the map container, feeding [`HostEvent::Resize`].
struct ResizeWatch {
    observer: web_sys::ResizeObserver,
    _callback: Closure<dyn FnMut(js_sys::Array)>,
}

impl ResizeWatch {
    fn attach(container: &str, queue: EventQueue) -> Result<Self, String> {
        let element = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(container))
            .ok_or_else(|| format!("no element with id {container:?}"))?;
        let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<web_sys::ResizeObserverEntry>() else {
                    continue;
                };
                let rect = entry.content_rect();
                queue.push(HostEvent::Resize {
                    width: rect.width().round().max(0.0) as u32,
                    height: rect.height().round().max(0.0) as u32,
                });
            }
        });
        let observer = web_sys::ResizeObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|e| js_error_message(&e))?;
        observer.observe(&element);
        Ok(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Subscription for ResizeWatch {
    fn disconnect(&mut self) {
        self.observer.disconnect();
    }
}

struct NoWatch;

impl Subscription for NoWatch {
    fn disconnect(&mut self) {}
}

pub(crate) fn js_error_message(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}
