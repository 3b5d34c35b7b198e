use std::collections::BTreeMap;

use serde::Serialize;

use crate::api::{Category, RType, Record, link_map};
use crate::colors::{Rgb, mirek_to_rgb, xy_bri_to_rgb};

/// Reference brightness used when deriving display colors from xy.
const COLOR_REFERENCE_BRIGHTNESS: u8 = 255;

/// Normalized state of one light, group or scene at one point in time.
///
/// A `has_*` flag is only set once the corresponding block has been seen,
/// and the values guarded by it mean nothing until then.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ItemState {
    pub id: String,
    pub rtype: RType,
    pub name: String,
    pub archetype: String,

    pub has_on: bool,
    pub on: bool,

    pub has_dimming: bool,
    pub brightness: f64,

    pub has_color: bool,
    pub color: Rgb,

    pub has_mirek: bool,
    pub mirek_temperature: f64,
    pub mirek_min: f64,
    pub mirek_max: f64,
    pub mirek_color: Rgb,

    pub has_gradient: bool,
    pub gradient_points_capable: u32,
    pub gradient_points: Vec<Rgb>,

    pub services: BTreeMap<String, RType>,
    pub children: BTreeMap<String, RType>,
    pub grouped_light_rid: Option<String>,
    pub group_id: Option<String>,
    pub group_type: Option<RType>,

    pub dummy: bool,
}

impl ItemState {
    /// Build a fresh state from a snapshot record.
    ///
    /// Returns `None` when the record lacks `id` or `type`.
    #[must_use]
    pub fn from_record(category: Category, record: &Record) -> Option<Self> {
        let (id, rtype) = record.identity()?;

        let mut state = Self {
            id: id.to_string(),
            rtype,
            ..Self::default()
        };

        if let Some(meta) = &record.metadata {
            state.name = meta.name.clone().unwrap_or_default();
            /* scenes carry an image reference instead of an archetype */
            if category != Category::Scene {
                state.archetype = meta.archetype.clone().unwrap_or_default();
            }
        }

        state.update(record);
        Some(state)
    }

    #[must_use]
    pub fn light(record: &Record) -> Option<Self> {
        Self::from_record(Category::Light, record)
    }

    #[must_use]
    pub fn group(record: &Record) -> Option<Self> {
        Self::from_record(Category::Group, record)
    }

    #[must_use]
    pub fn scene(record: &Record) -> Option<Self> {
        Self::from_record(Category::Scene, record)
    }

    /// Placeholder for header rows without a backing resource
    #[must_use]
    pub fn dummy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dummy: true,
            ..Self::default()
        }
    }

    /// Merge every block present in `record` into this state.
    ///
    /// Blocks missing from the record leave the existing values alone, so
    /// applying a partial event update only touches what changed. Applying
    /// the same record twice has the same effect as applying it once.
    pub fn update(&mut self, record: &Record) {
        if let Some(on) = record.on {
            self.has_on = true;
            self.on = on.on;
        }

        if let Some(dimming) = record.dimming {
            self.has_dimming = true;
            self.brightness = dimming.brightness;
        }

        if let Some(color) = record.color {
            self.has_color = true;
            self.color = xy_bri_to_rgb(color.xy, COLOR_REFERENCE_BRIGHTNESS);
        }

        if let Some(ct) = record.color_temperature {
            self.has_mirek = true;
            self.mirek_temperature = ct.mirek.unwrap_or_default();
            if let Some(schema) = ct.mirek_schema {
                self.mirek_min = schema.mirek_minimum;
                self.mirek_max = schema.mirek_maximum;
            }
            self.mirek_color = mirek_to_rgb(self.mirek_temperature);
        }

        if let Some(gradient) = &record.gradient {
            self.has_gradient = true;
            if let Some(capable) = gradient.points_capable {
                self.gradient_points_capable = capable;
            }

            /* a partial point set is never shown, only complete ones */
            self.gradient_points.clear();
            if gradient.points.len() == self.gradient_points_capable as usize {
                self.gradient_points.extend(
                    gradient
                        .points
                        .iter()
                        .map(|pt| xy_bri_to_rgb(pt.color.xy, COLOR_REFERENCE_BRIGHTNESS)),
                );
            }
        }

        if let Some(services) = &record.services {
            self.services = link_map(services);
            self.grouped_light_rid = services
                .iter()
                .find(|link| link.rtype == RType::GroupedLight)
                .map(|link| link.rid.clone());
        }

        if let Some(children) = &record.children {
            self.children = link_map(children);
        }

        if let Some(group) = &record.group {
            self.group_id = Some(group.rid.clone());
            self.group_type = Some(group.rtype);
        }
    }

    /// Ids of member services of the given type, in id order
    pub fn services_of(&self, rtype: RType) -> impl Iterator<Item = &str> {
        self.services
            .iter()
            .filter(move |(_, rt)| **rt == rtype)
            .map(|(rid, _)| rid.as_str())
    }

    #[must_use]
    pub fn category(&self) -> Option<Category> {
        self.rtype.category()
    }
}

#[cfg(test)]
mod tests {
    use maplit::btreemap;
    use serde_json::{Value, json};

    use crate::api::{RType, Record};
    use crate::colors::{Rgb, mirek_to_rgb};
    use crate::state::ItemState;

    fn record(value: &Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn sample_light() -> ItemState {
        ItemState::light(&record(&json!({
            "id": "l1",
            "type": "light",
            "metadata": {"name": "Desk", "archetype": "sultan_bulb"},
            "on": {"on": true},
            "dimming": {"brightness": 50.0},
            "color": {"xy": {"x": 0.3, "y": 0.3}},
            "color_temperature": {
                "mirek": 366,
                "mirek_schema": {"mirek_minimum": 153, "mirek_maximum": 500}
            },
        })))
        .unwrap()
    }

    #[test]
    fn light_from_snapshot() {
        let light = sample_light();

        assert_eq!(light.id, "l1");
        assert_eq!(light.rtype, RType::Light);
        assert_eq!(light.name, "Desk");
        assert_eq!(light.archetype, "sultan_bulb");
        assert!(light.has_on && light.on);
        assert!(light.has_dimming);
        assert_eq!(light.brightness, 50.0);
        assert!(light.has_color);
        assert_eq!(light.color, Rgb::new(233, 231, 255));
        assert!(light.has_mirek);
        assert_eq!(light.mirek_temperature, 366.0);
        assert_eq!(light.mirek_min, 153.0);
        assert_eq!(light.mirek_max, 500.0);
        assert_eq!(light.mirek_color, Rgb::new(255, 199, 153));
        assert!(!light.has_gradient);
        assert!(!light.dummy);
    }

    #[test]
    fn scene_ignores_archetype() {
        let scene = ItemState::scene(&record(&json!({
            "id": "s1",
            "type": "scene",
            "metadata": {"name": "Relax", "archetype": "ignored"},
            "group": {"rid": "r1", "rtype": "room"},
        })))
        .unwrap();

        assert_eq!(scene.name, "Relax");
        assert_eq!(scene.archetype, "");
        assert_eq!(scene.group_id.as_deref(), Some("r1"));
        assert_eq!(scene.group_type, Some(RType::Room));
    }

    #[test]
    fn group_services() {
        let room = ItemState::group(&record(&json!({
            "id": "r1",
            "type": "room",
            "metadata": {"name": "Kitchen", "archetype": "kitchen"},
            "children": [{"rid": "d1", "rtype": "device"}],
            "services": [
                {"rid": "l1", "rtype": "light"},
                {"rid": "l2", "rtype": "light"},
                {"rid": "l1", "rtype": "light"},
                {"rid": "g1", "rtype": "grouped_light"},
            ],
        })))
        .unwrap();

        assert_eq!(
            room.services,
            btreemap! {
                String::from("g1") => RType::GroupedLight,
                String::from("l1") => RType::Light,
                String::from("l2") => RType::Light,
            }
        );
        assert_eq!(room.grouped_light_rid.as_deref(), Some("g1"));
        assert_eq!(room.services_of(RType::Light).collect::<Vec<_>>(), ["l1", "l2"]);
        assert_eq!(room.children.get("d1"), Some(&RType::Device));
        assert!(!room.has_on);
    }

    #[test]
    fn missing_identity_is_skipped() {
        assert!(ItemState::light(&record(&json!({"type": "light"}))).is_none());
        assert!(ItemState::light(&record(&json!({"id": "l1"}))).is_none());
    }

    #[test]
    fn update_merges_partial_blocks() {
        let mut light = sample_light();
        let before = light.clone();

        light.update(&record(&json!({"id": "l1", "type": "light", "on": {"on": false}})));

        assert!(!light.on);
        assert_eq!(light.brightness, before.brightness);
        assert_eq!(light.color, before.color);
        assert_eq!(light.name, before.name);
    }

    #[test]
    fn update_keeps_mirek_schema_without_schema() {
        let mut light = sample_light();

        light.update(&record(&json!({
            "id": "l1",
            "type": "light",
            "color_temperature": {"mirek": 153, "mirek_valid": true},
        })));

        assert_eq!(light.mirek_temperature, 153.0);
        assert_eq!(light.mirek_min, 153.0);
        assert_eq!(light.mirek_max, 500.0);
        assert_eq!(light.mirek_color, mirek_to_rgb(153.0));
    }

    #[test]
    fn update_is_idempotent() {
        let upd = record(&json!({
            "id": "l1",
            "type": "light",
            "dimming": {"brightness": 12.5},
            "color": {"xy": {"x": 0.5, "y": 0.4}},
            "gradient": {
                "points_capable": 2,
                "points": [
                    {"color": {"xy": {"x": 0.2, "y": 0.1}}},
                    {"color": {"xy": {"x": 0.5, "y": 0.4}}},
                ],
            },
        }));

        let mut once = sample_light();
        once.update(&upd);

        let mut twice = once.clone();
        twice.update(&upd);

        assert_eq!(once, twice);
    }

    #[test]
    fn gradient_requires_complete_point_set() {
        let mut light = sample_light();

        light.update(&record(&json!({
            "id": "l1",
            "type": "light",
            "gradient": {
                "points_capable": 3,
                "points": [
                    {"color": {"xy": {"x": 0.2, "y": 0.1}}},
                    {"color": {"xy": {"x": 0.5, "y": 0.4}}},
                ],
            },
        })));

        assert!(light.has_gradient);
        assert_eq!(light.gradient_points_capable, 3);
        assert!(light.gradient_points.is_empty());

        light.update(&record(&json!({
            "id": "l1",
            "type": "light",
            "gradient": {
                "points": [
                    {"color": {"xy": {"x": 0.2, "y": 0.1}}},
                    {"color": {"xy": {"x": 0.5, "y": 0.4}}},
                    {"color": {"xy": {"x": 0.3, "y": 0.3}}},
                ],
            },
        })));

        assert_eq!(
            light.gradient_points,
            [
                Rgb::new(107, 105, 255),
                Rgb::new(255, 181, 97),
                Rgb::new(233, 231, 255),
            ]
        );
    }

    #[test]
    fn malformed_block_sets_no_flag() {
        let light = ItemState::light(&record(&json!({
            "id": "l1",
            "type": "light",
            "on": {"state": true},
            "color": {"xy": {"y": 0.3}},
        })))
        .unwrap();

        assert!(!light.has_on);
        assert!(!light.has_color);
    }

    #[test]
    fn dummy_state() {
        let header = ItemState::dummy("All lights");
        assert!(header.dummy);
        assert_eq!(header.name, "All lights");
        assert!(!header.has_on);
    }
}
