use eframe::egui::{Pos2, Rect, Vec2, vec2};
use serde::Serialize;

use crate::config::DensityConfig;

/// Pan/zoom mapping world coordinates onto a viewport centered at its middle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub zoom: f32,
    pub pan: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

impl Camera {
    pub fn centered_on(world_center: Pos2, zoom: f32) -> Self {
        Self {
            zoom,
            pan: -world_center.to_vec2() * zoom,
        }
    }

    pub fn world_to_screen(&self, viewport: Rect, world: Vec2) -> Pos2 {
        viewport.center() + self.pan + world * self.zoom
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityAdjustment {
    ZoomedIn,
    ZoomedOut,
    Unchanged,
    MobileFit,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensityOutcome {
    pub camera: Camera,
    pub fit_zoom: f32,
    pub occupancy_pct: f32,
    pub ratio: f32,
    pub adjustment: DensityAdjustment,
}

pub fn fit_to_bounds(bounds: Rect, viewport: Vec2, padding: f32, config: &DensityConfig) -> Camera {
    let available = (viewport - Vec2::splat(padding * 2.0)).max(Vec2::splat(1.0));
    let size = bounds.size().max(Vec2::splat(1.0));
    let zoom = (available.x / size.x)
        .min(available.y / size.y)
        .clamp(config.min_zoom, config.max_zoom);
    Camera::centered_on(bounds.center(), zoom)
}

pub fn occupancy_pct(bounds: Rect, zoom: f32, viewport: Vec2) -> f32 {
    let area = (viewport.x * viewport.y).max(1.0);
    let occupied = (bounds.width() * zoom) * (bounds.height() * zoom);
    occupied.max(1.0) / area * 100.0
}

// Zoom multiplier for a measured occupancy; 1.0 inside the comfortable band.
pub fn density_ratio(occupancy_pct: f32, config: &DensityConfig) -> f32 {
    if occupancy_pct < config.low_occupancy_pct {
        (config.zoom_in_target_pct / occupancy_pct.max(1.0))
            .sqrt()
            .min(config.max_zoom_in)
    } else if occupancy_pct > config.high_occupancy_pct {
        (config.zoom_out_target_pct / occupancy_pct)
            .sqrt()
            .max(config.max_zoom_out)
    } else {
        1.0
    }
}

/// Fit, measure occupancy, then nudge zoom toward the target band around the bounds center.
pub fn tune_viewport(bounds: Rect, viewport: Vec2, config: &DensityConfig) -> DensityOutcome {
    if viewport.x < config.mobile_width {
        let camera = fit_to_bounds(bounds, viewport, config.mobile_padding, config);
        return DensityOutcome {
            camera,
            fit_zoom: camera.zoom,
            occupancy_pct: occupancy_pct(bounds, camera.zoom, viewport),
            ratio: 1.0,
            adjustment: DensityAdjustment::MobileFit,
        };
    }

    let fitted = fit_to_bounds(bounds, viewport, config.fit_padding, config);
    let occupancy = occupancy_pct(bounds, fitted.zoom, viewport);
    let ratio = density_ratio(occupancy, config);
    let adjustment = if ratio > 1.0 {
        DensityAdjustment::ZoomedIn
    } else if ratio < 1.0 {
        DensityAdjustment::ZoomedOut
    } else {
        DensityAdjustment::Unchanged
    };
    let zoom = (fitted.zoom * ratio).clamp(config.min_zoom, config.max_zoom);

    DensityOutcome {
        camera: Camera::centered_on(bounds.center(), zoom),
        fit_zoom: fitted.zoom,
        occupancy_pct: occupancy,
        ratio,
        adjustment,
    }
}

pub fn idle_outcome() -> DensityOutcome {
    DensityOutcome {
        camera: Camera::default(),
        fit_zoom: 1.0,
        occupancy_pct: 0.0,
        ratio: 1.0,
        adjustment: DensityAdjustment::Unchanged,
    }
}
