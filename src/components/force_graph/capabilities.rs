//! Static descriptor of the data roles and format options the visual exposes.

use std::sync::OnceLock;

use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::error::{Error, Result};
use super::settings::FormatSettings;

const BUNDLED_JSON: &str = include_str!("../../../assets/capabilities.json");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum RoleKind {
	Grouping,
	Measure,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRole {
	pub name: String,
	pub kind: RoleKind,
	pub display_name: String,
	#[serde(default)]
	pub display_name_key: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
	pub display_name: String,
	#[serde(default)]
	pub display_name_key: Option<String>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(rename = "type")]
	pub kind: JsonValue,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescriptor {
	pub display_name: String,
	#[serde(default)]
	pub display_name_key: Option<String>,
	#[serde(default)]
	pub properties: IndexMap<String, PropertyDescriptor>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
	pub data_roles: Vec<DataRole>,
	#[serde(default)]
	pub objects: IndexMap<String, ObjectDescriptor>,
}

fn has_key(key: &Option<String>) -> bool {
	key.as_deref().is_some_and(|k| !k.trim().is_empty())
}

impl Capabilities {
	pub fn from_json(json: &str) -> Result<Self> {
		serde_json::from_str(json).map_err(Error::CapabilitiesJson)
	}

	/// The descriptor shipped with the crate, parsed and validated on first use.
	pub fn bundled() -> Result<&'static Capabilities> {
		static BUNDLED: OnceLock<Capabilities> = OnceLock::new();
		if let Some(caps) = BUNDLED.get() {
			return Ok(caps);
		}
		let caps = Self::from_json(BUNDLED_JSON)?;
		caps.validate()?;
		debug!(
			"capabilities loaded: {} roles, {} objects",
			caps.data_roles.len(),
			caps.objects.len()
		);
		Ok(BUNDLED.get_or_init(|| caps))
	}

	pub fn role(&self, name: &str) -> Option<&DataRole> {
		self.data_roles.iter().find(|r| r.name == name)
	}

	/// Looks up a `section.property` settings key.
	pub fn property(&self, key: &str) -> Option<&PropertyDescriptor> {
		let (object, property) = key.split_once('.')?;
		self.objects.get(object)?.properties.get(property)
	}

	pub fn validate(&self) -> Result<()> {
		for role in &self.data_roles {
			if role.display_name.is_empty() || !has_key(&role.display_name_key) {
				return Err(Error::MissingDisplayNameKey {
					entry: role.name.clone(),
				});
			}
		}
		for (name, object) in &self.objects {
			if object.display_name.is_empty() || !has_key(&object.display_name_key) {
				return Err(Error::MissingDisplayNameKey {
					entry: name.clone(),
				});
			}
			for (prop, descriptor) in &object.properties {
				if descriptor.display_name.is_empty() || !has_key(&descriptor.display_name_key) {
					return Err(Error::MissingDisplayNameKey {
						entry: format!("{name}.{prop}"),
					});
				}
			}
		}
		if let Some(key) = FormatSettings::KEYS
			.iter()
			.find(|key| self.property(key).is_none())
		{
			return Err(Error::UndeclaredSetting {
				key: (*key).to_string(),
			});
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::metadata::{
		ROLE_LINK_TYPE, ROLE_SOURCE, ROLE_SOURCE_TYPE, ROLE_TARGET, ROLE_TARGET_TYPE,
		ROLE_TOOLTIPS, ROLE_WEIGHT,
	};

	#[test]
	fn bundled_descriptor_is_valid() {
		let caps = Capabilities::bundled().unwrap();
		for role in [
			ROLE_SOURCE,
			ROLE_TARGET,
			ROLE_WEIGHT,
			ROLE_LINK_TYPE,
			ROLE_SOURCE_TYPE,
			ROLE_TARGET_TYPE,
			ROLE_TOOLTIPS,
		] {
			assert!(caps.role(role).is_some(), "{role}");
		}
		assert_eq!(caps.role(ROLE_WEIGHT).unwrap().kind, RoleKind::Measure);
		assert!(FormatSettings::KEYS.iter().all(|k| caps.property(k).is_some()));
		// second call hands back the same instance
		assert!(std::ptr::eq(caps, Capabilities::bundled().unwrap()));
	}

	#[test]
	fn missing_display_name_key_is_rejected() {
		let caps = Capabilities::from_json(
			r#"{"dataRoles": [{"name": "Source", "kind": "Grouping", "displayName": "Source"}]}"#,
		)
		.unwrap();
		assert!(matches!(
			caps.validate(),
			Err(Error::MissingDisplayNameKey { entry }) if entry == "Source"
		));
	}

	#[test]
	fn undeclared_setting_is_rejected() {
		let caps = Capabilities::from_json(
			r#"{
				"dataRoles": [],
				"objects": {
					"labels": {
						"displayName": "Labels",
						"displayNameKey": "Visual_Labels",
						"properties": {
							"show": {"displayName": "Show", "displayNameKey": "Visual_Show", "type": {"bool": true}}
						}
					}
				}
			}"#,
		)
		.unwrap();
		assert!(matches!(
			caps.validate(),
			Err(Error::UndeclaredSetting { key }) if key == "labels.color"
		));
	}

	#[test]
	fn malformed_json_is_an_error() {
		assert!(matches!(
			Capabilities::from_json("{"),
			Err(Error::CapabilitiesJson(_))
		));
	}
}
