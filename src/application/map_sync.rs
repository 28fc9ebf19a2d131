// Map synchronization - Derives vessel markers from the latest telemetry batch
use crate::domain::geo::GeoPoint;
use crate::domain::marker::{ContextMenu, MarkerIcon, PixelPoint, VesselMarker, tooltip_for};
use crate::domain::vessel::VesselBatch;
use std::collections::HashMap;
use std::sync::Arc;

const MAX_MEMOIZED_ICONS: usize = 4096;
const MAX_ZOOM_LAYERS: usize = 32;

/// Icons are keyed on (zoom, heading). -0.0 and 0.0 share a slot.
type IconKey = (u64, u64);

fn icon_key(zoom: f64, heading: f64) -> IconKey {
    ((zoom + 0.0).to_bits(), (heading + 0.0).to_bits())
}

pub struct MapSynchronizer {
    zoom: f64,
    icons: HashMap<IconKey, MarkerIcon>,
    markers: Vec<VesselMarker>,
    synced: Option<(Arc<VesselBatch>, u64)>,
    icon_computations: usize,
}

impl MapSynchronizer {
    pub fn new(zoom: f64) -> Self {
        Self {
            zoom,
            icons: HashMap::new(),
            markers: Vec::new(),
            synced: None,
            icon_computations: 0,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Icons sized for another zoom level are useless once the map zooms, so the memo is reset.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom != self.zoom {
            self.zoom = zoom;
            self.icons.clear();
        }
    }

    pub fn markers(&self) -> &[VesselMarker] {
        &self.markers
    }

    /// Number of icons actually computed, as opposed to served from the memo
    pub fn icon_computations(&self) -> usize {
        self.icon_computations
    }

    /// Rebuild markers for a batch. Re-syncing the same batch at the same zoom is free.
    pub fn sync(&mut self, batch: &Arc<VesselBatch>) -> &[VesselMarker] {
        let zoom_bits = self.zoom.to_bits();
        if let Some((last, bits)) = &self.synced {
            if Arc::ptr_eq(last, batch) && *bits == zoom_bits {
                return &self.markers;
            }
        }

        let markers: Vec<VesselMarker> = batch
            .vessels
            .iter()
            .map(|vessel| VesselMarker {
                vessel_name: vessel.vessel_name.clone(),
                position: vessel.pose.geo_point(),
                icon: self.icon(vessel.pose.heading),
                tooltip: Some(tooltip_for(
                    &vessel.vessel_name,
                    &vessel.pose,
                    vessel.additional_info.as_deref(),
                )),
            })
            .collect();

        tracing::trace!("Synced {} markers at zoom {}", markers.len(), self.zoom);
        self.markers = markers;
        self.synced = Some((batch.clone(), zoom_bits));
        &self.markers
    }

    fn icon(&mut self, heading: f64) -> MarkerIcon {
        let key = icon_key(self.zoom, heading);
        if let Some(icon) = self.icons.get(&key) {
            return *icon;
        }

        if self.icons.len() >= MAX_MEMOIZED_ICONS {
            self.icons.clear();
        }
        let icon = MarkerIcon::new(self.zoom, heading);
        self.icon_computations += 1;
        self.icons.insert(key, icon);
        icon
    }

    /// Right-click on the map: remember the coordinate and place the menu relative to the container
    pub fn right_click(
        coordinate: GeoPoint,
        click: PixelPoint,
        container_origin: PixelPoint,
    ) -> ContextMenu {
        ContextMenu {
            coordinate,
            offset: PixelPoint::new(click.x - container_origin.x, click.y - container_origin.y),
        }
    }
}

/// One synchronizer per zoom level, so viewers at different zooms keep their own icon memo
pub struct MarkerLayers {
    default_zoom: f64,
    layers: HashMap<u64, MapSynchronizer>,
}

impl MarkerLayers {
    pub fn new(default_zoom: f64) -> Self {
        Self {
            default_zoom,
            layers: HashMap::new(),
        }
    }

    pub fn layer(&self, zoom: f64) -> Option<&MapSynchronizer> {
        self.layers.get(&(zoom + 0.0).to_bits())
    }

    pub fn sync(&mut self, zoom: Option<f64>, batch: &Arc<VesselBatch>) -> &[VesselMarker] {
        let zoom = zoom.unwrap_or(self.default_zoom);
        let key = (zoom + 0.0).to_bits();
        if !self.layers.contains_key(&key) && self.layers.len() >= MAX_ZOOM_LAYERS {
            self.layers.clear();
        }
        self.layers
            .entry(key)
            .or_insert_with(|| MapSynchronizer::new(zoom))
            .sync(batch)
    }
}
