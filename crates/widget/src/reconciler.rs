use std::collections::BTreeMap;

use catalog::{Location, LocationStore};
use foundation::geo::LngLat;
use foundation::ids::LocationId;
use surface::style::Theme;
use surface::{Decoration, MapSurfaceHandle, MarkerVisual};
use tracing::{debug, warn};

/// What one reconciliation did to the surface.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    /// The surface was not ready; nothing was touched.
    pub skipped: bool,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.removed == 0
    }
}

struct RenderedMarker {
    decoration: Box<dyn Decoration>,
    position: LngLat,
    hovered: bool,
}

/// Keeps the surface's markers in one-to-one correspondence with a
/// [`LocationStore`].
///
/// Decorations live only here. The store is never written.
pub struct MarkerReconciler {
    rendered: BTreeMap<LocationId, RenderedMarker>,
    theme: Theme,
}

impl std::fmt::Debug for MarkerReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerReconciler")
            .field("rendered", &self.rendered.keys().collect::<Vec<_>>())
            .field("theme", &self.theme)
            .finish()
    }
}

impl MarkerReconciler {
    pub fn new(theme: Theme) -> Self {
        Self {
            rendered: BTreeMap::new(),
            theme,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Takes effect for decorations created afterwards, i.e. on the next
    /// [`MarkerReconciler::rebuild_all`].
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn visual(&self) -> MarkerVisual {
        MarkerVisual::for_theme(self.theme)
    }

    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }

    pub fn is_rendered(&self, id: &LocationId) -> bool {
        self.rendered.contains_key(id)
    }

    pub fn rendered_ids(&self) -> Vec<LocationId> {
        self.rendered.keys().cloned().collect()
    }

    /// Diffs the rendered set against `store` and patches the surface.
    ///
    /// Does nothing while the surface is not ready. Otherwise, on return the
    /// rendered id set equals the store's id set.
    pub fn reconcile(
        &mut self,
        handle: &mut MapSurfaceHandle,
        store: &LocationStore,
    ) -> ReconcileReport {
        if !handle.is_ready() {
            debug!(state = ?handle.state(), "surface not ready, reconcile skipped");
            return ReconcileReport {
                skipped: true,
                ..ReconcileReport::default()
            };
        }

        let mut report = ReconcileReport::default();

        let stale: Vec<LocationId> = self
            .rendered
            .keys()
            .filter(|id| !store.contains(id))
            .cloned()
            .collect();
        for id in stale {
            if let Some(mut marker) = self.rendered.remove(&id) {
                marker.decoration.remove();
                report.removed += 1;
            }
        }

        let visual = self.visual();
        for location in store.iter() {
            let at = location.position();
            match self.rendered.get_mut(&location.id) {
                Some(marker) => {
                    if marker.position != at {
                        marker.decoration.set_position(at);
                        marker.position = at;
                        report.updated += 1;
                    }
                }
                None => {
                    if self.create(handle, &visual, location) {
                        report.created += 1;
                    }
                }
            }
        }

        if !report.is_noop() {
            debug!(
                created = report.created,
                updated = report.updated,
                removed = report.removed,
                "markers reconciled"
            );
        }
        report
    }

    /// Drops every decoration and recreates one per location. Only valid
    /// right after a style switch has completed.
    pub fn rebuild_all(&mut self, handle: &mut MapSurfaceHandle, store: &LocationStore) -> usize {
        self.clear();
        if !handle.is_ready() {
            warn!(state = ?handle.state(), "rebuild requested before surface is ready");
            return 0;
        }
        let visual = self.visual();
        let mut created = 0;
        for location in store.iter() {
            if self.create(handle, &visual, location) {
                created += 1;
            }
        }
        debug!(created, theme = self.theme.as_str(), "markers rebuilt");
        created
    }

    /// Removes every decoration without recreating any.
    pub fn clear(&mut self) -> usize {
        let removed = self.rendered.len();
        for (_, mut marker) in std::mem::take(&mut self.rendered) {
            marker.decoration.remove();
        }
        removed
    }

    /// Returns `false` when `id` has no decoration.
    pub fn set_hovered(&mut self, id: &LocationId, hovered: bool) -> bool {
        let Some(marker) = self.rendered.get_mut(id) else {
            return false;
        };
        if marker.hovered != hovered {
            marker.decoration.set_hovered(hovered);
            marker.hovered = hovered;
        }
        true
    }

    fn create(
        &mut self,
        handle: &mut MapSurfaceHandle,
        visual: &MarkerVisual,
        location: &Location,
    ) -> bool {
        let at = location.position();
        match handle.add_decoration(&location.id, visual, at) {
            Ok(decoration) => {
                self.rendered.insert(
                    location.id.clone(),
                    RenderedMarker {
                        decoration,
                        position: at,
                        hovered: false,
                    },
                );
                true
            }
            Err(e) => {
                warn!(id = %location.id, error = %e, "could not place marker");
                false
            }
        }
    }
}
