//! Command bodies for lights, grouped lights and scenes.
//!
//! Dimming and color changes on a group are sent to its member lights
//! (the ones that are on, or all of them when none is), because the bridge
//! does not apply those to grouped lights. Switching a group goes through
//! its `grouped_light` service.

use serde::Serialize;
use serde_json::Value;

use crate::api::{Category, LightUpdate, RType, ResourceLink, SceneUpdate, XY};
use crate::colors::{Rgb, rgb_to_xy};
use crate::error::{HueError, HueResult};
use crate::state::ItemState;
use crate::store::StateStore;

/// A fully formed PUT request for one resource
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    pub target: ResourceLink,
    pub body: Value,
}

impl Command {
    pub fn new(target: ResourceLink, body: &impl Serialize) -> HueResult<Self> {
        Ok(Self {
            target,
            body: serde_json::to_value(body)?,
        })
    }
}

fn category(store: &StateStore, id: &str) -> HueResult<Category> {
    store
        .category_of(id)
        .ok_or_else(|| HueError::NotFound(id.to_string()))
}

fn light_state<'a>(store: &'a StateStore, id: &str) -> HueResult<&'a ItemState> {
    match category(store, id)? {
        Category::Light => store.get_or_err(Category::Light, id),
        found => Err(HueError::WrongType {
            id: id.to_string(),
            expected: Category::Light,
            found,
        }),
    }
}

/// Send `upd` to a light, or to the relevant member lights of a group.
fn fan_out(store: &StateStore, id: &str, upd: &LightUpdate) -> HueResult<Vec<Command>> {
    match category(store, id)? {
        Category::Light => Ok(vec![Command::new(RType::Light.link_to(id), upd)?]),
        Category::Group => {
            let group = store.get_or_err(Category::Group, id)?;
            let any_on = store.any_light_on(group);

            group
                .services_of(RType::Light)
                .filter(|rid| !any_on || store.light(rid).is_some_and(|light| light.on))
                .map(|rid| Command::new(RType::Light.link_to(rid), upd))
                .collect()
        }
        Category::Scene => Err(HueError::Unsupported(id.to_string())),
    }
}

pub fn switch(store: &StateStore, id: &str, on: bool) -> HueResult<Vec<Command>> {
    let upd = LightUpdate::new().with_on(on);

    match category(store, id)? {
        Category::Light => Ok(vec![Command::new(RType::Light.link_to(id), &upd)?]),
        Category::Group => {
            let group = store.get_or_err(Category::Group, id)?;
            let rid = group
                .grouped_light_rid
                .as_deref()
                .ok_or_else(|| HueError::NoGroupedLight(id.to_string()))?;
            Ok(vec![Command::new(RType::GroupedLight.link_to(rid), &upd)?])
        }
        Category::Scene => Err(HueError::Unsupported(id.to_string())),
    }
}

pub fn dim(store: &StateStore, id: &str, brightness: f64) -> HueResult<Vec<Command>> {
    let upd = LightUpdate::new()
        .with_on(true)
        .with_brightness(brightness.clamp(0.0, 100.0));
    fan_out(store, id, &upd)
}

pub fn color(store: &StateStore, id: &str, color: Rgb) -> HueResult<Vec<Command>> {
    let upd = LightUpdate::new()
        .with_on(true)
        .with_color_xy(rgb_to_xy(color));
    fan_out(store, id, &upd)
}

pub fn mirek(store: &StateStore, id: &str, mirek: u16) -> HueResult<Vec<Command>> {
    let upd = LightUpdate::new().with_on(true).with_mirek(mirek);
    fan_out(store, id, &upd)
}

/// Change one point of a gradient light.
///
/// The bridge only accepts complete point sets, so the other points are
/// resent with their current colors. When the stored set is incomplete,
/// every point gets the new color.
pub fn gradient_point(store: &StateStore, id: &str, point: u32, color: Rgb) -> HueResult<Command> {
    let light = light_state(store, id)?;

    if !light.has_gradient || light.gradient_points_capable == 0 {
        return Err(HueError::NoGradient(id.to_string()));
    }

    let capable = light.gradient_points_capable;
    if point >= capable {
        return Err(HueError::GradientPointOutOfRange {
            id: id.to_string(),
            point,
            capable,
        });
    }

    let xy = rgb_to_xy(color);
    let complete = light.gradient_points.len() == capable as usize;

    let points: Vec<XY> = (0..capable)
        .map(|idx| {
            if idx == point || !complete {
                xy
            } else {
                rgb_to_xy(light.gradient_points[idx as usize])
            }
        })
        .collect();

    let upd = LightUpdate::new().with_on(true).with_gradient(points);
    Command::new(RType::Light.link_to(id), &upd)
}

pub fn recall_scene(store: &StateStore, id: &str) -> HueResult<Command> {
    match category(store, id)? {
        Category::Scene => Command::new(RType::Scene.link_to(id), &SceneUpdate::activate()),
        found => Err(HueError::WrongType {
            id: id.to_string(),
            expected: Category::Scene,
            found,
        }),
    }
}
