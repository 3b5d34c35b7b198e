use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::api::{ColorTemperature, ColorXy, Dimming, Gradient, Metadata, On, RType, ResourceLink};

/// Deserialize a field, turning any shape mismatch into `None`.
///
/// A block missing one of its required members is treated exactly as if the
/// block was not present at all.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Link lists (`services`, `children`) keep every well-formed entry and drop the rest.
fn lenient_links<'de, D>(deserializer: D) -> Result<Option<Vec<ResourceLink>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };

    Ok(Some(
        items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
    ))
}

/// One resource record, either from a full snapshot or from an event update.
///
/// Event updates are structurally partial records: they carry `id`, `type`
/// and only the blocks that changed.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub rtype: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Option<Metadata>,
    #[serde(default, deserialize_with = "lenient")]
    pub on: Option<On>,
    #[serde(default, deserialize_with = "lenient")]
    pub dimming: Option<Dimming>,
    #[serde(default, deserialize_with = "lenient")]
    pub color: Option<ColorXy>,
    #[serde(default, deserialize_with = "lenient")]
    pub color_temperature: Option<ColorTemperature>,
    #[serde(default, deserialize_with = "lenient")]
    pub gradient: Option<Gradient>,
    #[serde(default, deserialize_with = "lenient_links")]
    pub services: Option<Vec<ResourceLink>>,
    #[serde(default, deserialize_with = "lenient_links")]
    pub children: Option<Vec<ResourceLink>>,
    #[serde(default, deserialize_with = "lenient")]
    pub group: Option<ResourceLink>,
}

impl Record {
    /// Parse a record, or `None` if the value is not a JSON object.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        Self::deserialize(value).ok()
    }

    #[must_use]
    pub fn resource_type(&self) -> Option<RType> {
        self.rtype.as_deref().map(RType::from_name)
    }

    /// Id and type, if both are present.
    #[must_use]
    pub fn identity(&self) -> Option<(&str, RType)> {
        Some((self.id.as_deref()?, self.resource_type()?))
    }
}

/// Collapse a link list into the `rid -> rtype` map kept on entity states.
#[must_use]
pub fn link_map(links: &[ResourceLink]) -> BTreeMap<String, RType> {
    links
        .iter()
        .map(|link| (link.rid.clone(), link.rtype))
        .collect()
}
