//! Review targets: coffee products and roasters.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// The kind of thing a review is about.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityType {
  Coffee,
  Roaster,
}

impl EntityType {
  /// Path prefix of the entity's detail page on the site.
  pub fn page_prefix(self) -> &'static str {
    match self {
      Self::Coffee => "/coffees",
      Self::Roaster => "/roasters",
    }
  }
}

/// A fully-identified review target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
  pub entity_type: EntityType,
  pub entity_id:   Uuid,
}

impl EntityRef {
  pub fn new(entity_type: EntityType, entity_id: Uuid) -> Self {
    Self { entity_type, entity_id }
  }

  /// The detail-page path whose cached render goes stale when this entity's
  /// reviews change. Falls back to the id when no usable slug is given.
  pub fn page_path(&self, slug: Option<&str>) -> String {
    match slug.map(str::trim).filter(|s| is_slug(s)) {
      Some(slug) => format!("{}/{slug}", self.entity_type.page_prefix()),
      None => format!("{}/{}", self.entity_type.page_prefix(), self.entity_id),
    }
  }
}

/// `[a-z0-9-]+`: anything else could address a page other than the entity's.
fn is_slug(s: &str) -> bool {
  !s.is_empty()
    && s
      .bytes()
      .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use super::*;

  #[test]
  fn entity_type_string_forms_agree() {
    for ty in [EntityType::Coffee, EntityType::Roaster] {
      let json = serde_json::to_value(ty).unwrap();
      assert_eq!(json.as_str(), Some(ty.as_ref()));
      assert_eq!(EntityType::from_str(ty.as_ref()).unwrap(), ty);
    }
  }

  #[test]
  fn page_path_prefers_slug() {
    let id = Uuid::new_v4();
    let entity = EntityRef::new(EntityType::Roaster, id);
    assert_eq!(entity.page_path(Some("blue-tokai")), "/roasters/blue-tokai");
    assert_eq!(entity.page_path(Some("  ")), format!("/roasters/{id}"));
    assert_eq!(entity.page_path(None), format!("/roasters/{id}"));
  }

  #[test]
  fn page_path_ignores_unsafe_slugs() {
    let id = Uuid::new_v4();
    let entity = EntityRef::new(EntityType::Coffee, id);
    for slug in ["../../admin", "a/b", "Blue-Tokai", "x?y=1", "caf\u{e9}"] {
      assert_eq!(entity.page_path(Some(slug)), format!("/coffees/{id}"), "{slug}");
    }
    assert_eq!(entity.page_path(Some(" attikan-estate-2 ")), "/coffees/attikan-estate-2");
  }
}
