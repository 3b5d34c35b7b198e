use std::collections::BTreeMap;

use serde_json::Value;

use crate::api::{Category, RType, Record};
use crate::combine::combine_all;
use crate::error::{HueError, HueResult};
use crate::state::ItemState;

/// Number of entities per collection after a snapshot load
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub groups: usize,
    pub lights: usize,
    pub scenes: usize,
}

/// Entity states of one bridge, keyed by id within each category.
#[derive(Clone, Debug, Default)]
pub struct StateStore {
    groups: BTreeMap<String, ItemState>,
    lights: BTreeMap<String, ItemState>,
    scenes: BTreeMap<String, ItemState>,
    bridge_home_id: Option<String>,
}

impl StateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_snapshot(snapshot: &Value) -> Self {
        let mut store = Self::new();
        store.load_snapshot(snapshot);
        store
    }

    /// Replace all content with the resources of a `{"data": [...]}` snapshot.
    ///
    /// Records without `id` or `type`, and records of unhandled types, are
    /// skipped.
    pub fn load_snapshot(&mut self, snapshot: &Value) -> StoreSummary {
        self.clear();

        let Some(data) = snapshot.get("data").and_then(Value::as_array) else {
            log::trace!("Snapshot without data array, store left empty");
            return self.summary();
        };

        for value in data {
            let Some(record) = Record::from_value(value) else {
                continue;
            };
            if self.insert(&record).is_none() {
                log::trace!("Skipping snapshot record {:?}/{:?}", record.rtype, record.id);
            }
        }

        self.summary()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.lights.clear();
        self.scenes.clear();
        self.bridge_home_id = None;
    }

    #[must_use]
    pub fn summary(&self) -> StoreSummary {
        StoreSummary {
            groups: self.groups.len(),
            lights: self.lights.len(),
            scenes: self.scenes.len(),
        }
    }

    /// Build a fresh state from `record`, replacing any previous entry.
    pub fn insert(&mut self, record: &Record) -> Option<&ItemState> {
        let (id, rtype) = record.identity()?;
        let category = rtype.category()?;
        let state = ItemState::from_record(category, record)?;

        if rtype == RType::BridgeHome {
            self.bridge_home_id = Some(id.to_string());
        }

        let coll = self.collection_mut(category);
        coll.insert(id.to_string(), state);
        coll.get(id)
    }

    /// Merge a partial (event) record into the stored state for its id.
    ///
    /// An id not seen before starts out from the partial record. Returns
    /// the id that was patched.
    pub fn apply_update(&mut self, record: &Record) -> Option<String> {
        let (id, rtype) = record.identity()?;
        let category = rtype.category()?;

        match self.collection_mut(category).get_mut(id) {
            Some(state) => state.update(record),
            None => {
                log::trace!("Update for unknown {rtype} {id}, adding it");
                self.insert(record)?;
            }
        }

        Some(id.to_string())
    }

    const fn collection(&self, category: Category) -> &BTreeMap<String, ItemState> {
        match category {
            Category::Group => &self.groups,
            Category::Light => &self.lights,
            Category::Scene => &self.scenes,
        }
    }

    const fn collection_mut(&mut self, category: Category) -> &mut BTreeMap<String, ItemState> {
        match category {
            Category::Group => &mut self.groups,
            Category::Light => &mut self.lights,
            Category::Scene => &mut self.scenes,
        }
    }

    #[must_use]
    pub fn get(&self, category: Category, id: &str) -> Option<&ItemState> {
        self.collection(category).get(id)
    }

    pub fn get_or_err(&self, category: Category, id: &str) -> HueResult<&ItemState> {
        self.get(category, id)
            .ok_or_else(|| HueError::NotFound(id.to_string()))
    }

    #[must_use]
    pub fn group(&self, id: &str) -> Option<&ItemState> {
        self.groups.get(id)
    }

    #[must_use]
    pub fn light(&self, id: &str) -> Option<&ItemState> {
        self.lights.get(id)
    }

    #[must_use]
    pub fn scene(&self, id: &str) -> Option<&ItemState> {
        self.scenes.get(id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &ItemState> {
        self.groups.values()
    }

    pub fn lights(&self) -> impl Iterator<Item = &ItemState> {
        self.lights.values()
    }

    pub fn scenes(&self) -> impl Iterator<Item = &ItemState> {
        self.scenes.values()
    }

    /// Rooms and zones, i.e. every group except the bridge home
    pub fn rooms_and_zones(&self) -> impl Iterator<Item = &ItemState> {
        self.groups()
            .filter(|grp| Some(grp.id.as_str()) != self.bridge_home_id.as_deref())
    }

    #[must_use]
    pub fn bridge_home_id(&self) -> Option<&str> {
        self.bridge_home_id.as_deref()
    }

    #[must_use]
    pub fn bridge_home(&self) -> Option<&ItemState> {
        self.groups.get(self.bridge_home_id.as_deref()?)
    }

    #[must_use]
    pub fn category_of(&self, id: &str) -> Option<Category> {
        [Category::Group, Category::Light, Category::Scene]
            .into_iter()
            .find(|cat| self.collection(*cat).contains_key(id))
    }

    /// Stored states of the member lights of `group`.
    ///
    /// Members that are not (yet) known to the store are left out.
    pub fn member_lights<'a>(&'a self, group: &'a ItemState) -> impl Iterator<Item = &'a ItemState> {
        group
            .services_of(RType::Light)
            .filter_map(|id| self.lights.get(id))
    }

    /// Lights of the group with the given id, empty for unknown groups
    #[must_use]
    pub fn lights_in_group(&self, group_id: &str) -> Vec<&ItemState> {
        self.group(group_id)
            .map(|grp| self.member_lights(grp).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn scenes_for_group(&self, group_id: &str) -> Vec<&ItemState> {
        self.scenes()
            .filter(|scn| scn.group_id.as_deref() == Some(group_id))
            .collect()
    }

    /// True if any member light reports being on
    #[must_use]
    pub fn any_light_on(&self, group: &ItemState) -> bool {
        self.member_lights(group).any(|light| light.has_on && light.on)
    }

    /// True unless some member light reports being off
    #[must_use]
    pub fn all_lights_on(&self, group: &ItemState) -> bool {
        !self.member_lights(group).any(|light| light.has_on && !light.on)
    }

    /// Aggregate state of a group, folded over its member lights.
    #[must_use]
    pub fn combined_group_state(&self, id: &str) -> Option<ItemState> {
        let group = self.group(id)?;
        Some(combine_all(group, self.member_lights(group)))
    }

    /// The state a control bound to `id` displays: groups show their
    /// combined state, everything else its own.
    #[must_use]
    pub fn display_state(&self, category: Category, id: &str) -> Option<ItemState> {
        match category {
            Category::Group => self.combined_group_state(id),
            Category::Light | Category::Scene => self.get(category, id).cloned(),
        }
    }
}
