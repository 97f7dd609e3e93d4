//! Card records as served by the upstream API.

use serde::{Deserialize, Serialize};

/// One card from the public card database.
///
/// Only the flat scalar fields are modeled; nested payload sections
/// (`card_sets`, `card_images`, `card_prices`, `pend_desc`, `monster_desc`,
/// `linkmarkers`, `banlist_info`) are dropped at deserialization and never
/// reach the table, as are any extra fields the API grows later. Records are
/// immutable once fetched; a new fetch replaces the whole set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub card_type: String,
    #[serde(rename = "humanReadableCardType", default)]
    pub human_readable_card_type: Option<String>,
    #[serde(rename = "frameType", default)]
    pub frame_type: Option<String>,
    pub desc: String,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub archetype: Option<String>,
    #[serde(default)]
    pub ygoprodeck_url: Option<String>,
    /// Monster typeline as the API sends it (a list); stored as one text value.
    #[serde(default)]
    pub typeline: Option<Vec<String>>,
    #[serde(default)]
    pub atk: Option<i64>,
    #[serde(default)]
    pub def: Option<i64>,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default)]
    pub scale: Option<i64>,
    #[serde(default)]
    pub linkval: Option<i64>,
    #[serde(default)]
    pub attribute: Option<String>,
}

impl Card {
    /// Typeline coerced to a single text value for materialization.
    #[must_use]
    pub fn typeline_text(&self) -> Option<String> {
        self.typeline.as_ref().map(|parts| parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_monster_payload_and_ignores_nested_sections() {
        let raw = serde_json::json!({
            "id": 46986414,
            "name": "Dark Magician",
            "type": "Normal Monster",
            "humanReadableCardType": "Normal Monster",
            "frameType": "normal",
            "desc": "The ultimate wizard in terms of attack and defense.",
            "race": "Spellcaster",
            "archetype": "Dark Magician",
            "ygoprodeck_url": "https://ygoprodeck.com/card/dark-magician-4003",
            "typeline": ["Spellcaster", "Normal"],
            "atk": 2500,
            "def": 2100,
            "level": 7,
            "attribute": "DARK",
            "card_sets": [{"set_name": "Legend of Blue Eyes"}],
            "card_images": [{"id": 46986414}],
            "card_prices": [{"cardmarket_price": "0.20"}],
            "banlist_info": {"ban_tcg": "Unlimited"}
        });

        let card: Card = serde_json::from_value(raw).unwrap();
        assert_eq!(card.name, "Dark Magician");
        assert_eq!(card.card_type, "Normal Monster");
        assert_eq!(card.atk, Some(2500));
        assert_eq!(card.typeline_text().as_deref(), Some("Spellcaster, Normal"));
    }

    #[test]
    fn deserializes_spell_payload_without_battle_stats() {
        let raw = serde_json::json!({
            "id": 53129443,
            "name": "Dark Hole",
            "type": "Spell Card",
            "desc": "Destroy all monsters on the field.",
            "race": "Normal",
            "frameType": "spell"
        });

        let card: Card = serde_json::from_value(raw).unwrap();
        assert_eq!(card.atk, None);
        assert_eq!(card.level, None);
        assert_eq!(card.typeline_text(), None);
        assert_eq!(card.attribute, None);
    }

    #[test]
    fn snapshot_round_trip_preserves_renamed_fields() {
        let card = Card {
            id: 1,
            name: "Test".into(),
            card_type: "Effect Monster".into(),
            human_readable_card_type: Some("Effect Monster".into()),
            frame_type: Some("effect".into()),
            desc: "Does things.".into(),
            race: Some("Dragon".into()),
            archetype: None,
            ygoprodeck_url: None,
            typeline: Some(vec!["Dragon".into(), "Effect".into()]),
            atk: Some(1000),
            def: Some(500),
            level: Some(4),
            scale: None,
            linkval: None,
            attribute: Some("LIGHT".into()),
        };

        let json = serde_json::to_string(&card).unwrap();
        assert!(json.contains("\"type\":\"Effect Monster\""));
        let parsed: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(card, parsed);
    }
}
