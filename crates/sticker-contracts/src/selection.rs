use std::fmt;

use serde::{Deserialize, Serialize};

/// A closed set of options the user picks one value from.
///
/// Every option control in the session (shape, material, orientation) is
/// driven through this trait, so parsing, listing and labelling stay generic.
pub trait Choice: Copy + Eq + fmt::Debug + 'static {
    /// Name of the control, used in messages.
    const KIND: &'static str;
    /// All values, in display order.
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    fn label(self) -> &'static str;

    fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|value| value.as_str() == needle)
    }

    fn expected() -> String {
        Self::ALL
            .iter()
            .map(|value| value.as_str())
            .collect::<Vec<&str>>()
            .join("|")
    }
}

/// Parses a choice, producing the message shown for invalid input.
pub fn parse_choice<T: Choice>(raw: &str) -> Result<T, String> {
    T::parse(raw).ok_or_else(|| {
        format!(
            "invalid {} '{}' (expected {})",
            T::KIND,
            raw.trim(),
            T::expected()
        )
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickerShape {
    #[default]
    Round,
    Square,
    Rectangle,
}

impl Choice for StickerShape {
    const KIND: &'static str = "shape";
    const ALL: &'static [Self] = &[Self::Round, Self::Square, Self::Rectangle];

    fn as_str(self) -> &'static str {
        match self {
            Self::Round => "round",
            Self::Square => "square",
            Self::Rectangle => "rectangle",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Round => "Round",
            Self::Square => "Square",
            Self::Rectangle => "Rectangle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickerMaterial {
    #[default]
    Vinyl,
    Domed,
}

impl Choice for StickerMaterial {
    const KIND: &'static str = "material";
    const ALL: &'static [Self] = &[Self::Vinyl, Self::Domed];

    fn as_str(self) -> &'static str {
        match self {
            Self::Vinyl => "vinyl",
            Self::Domed => "domed",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Vinyl => "Vinyl",
            Self::Domed => "Domed (raised resin)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RectangleOrientation {
    Portrait,
    #[default]
    Landscape,
}

impl Choice for RectangleOrientation {
    const KIND: &'static str = "orientation";
    const ALL: &'static [Self] = &[Self::Landscape, Self::Portrait];

    fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Portrait => "Standing (portrait)",
            Self::Landscape => "Lying (landscape)",
        }
    }
}

/// The full form selection. Orientation is retained for every shape but
/// only matters when the shape is a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub shape: StickerShape,
    pub material: StickerMaterial,
    pub orientation: RectangleOrientation,
}

impl Selection {
    pub fn new(
        shape: StickerShape,
        material: StickerMaterial,
        orientation: RectangleOrientation,
    ) -> Self {
        Self {
            shape,
            material,
            orientation,
        }
    }

    pub fn uses_orientation(&self) -> bool {
        self.shape == StickerShape::Rectangle
    }

    /// Every distinct selection, orientation included.
    pub fn all() -> Vec<Selection> {
        let mut out = Vec::new();
        for shape in StickerShape::ALL {
            for material in StickerMaterial::ALL {
                for orientation in RectangleOrientation::ALL {
                    out.push(Selection::new(*shape, *material, *orientation));
                }
            }
        }
        out
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.uses_orientation() {
            write!(
                f,
                "{} / {} / {}",
                self.shape.label(),
                self.orientation.label(),
                self.material.label()
            )
        } else {
            write!(f, "{} / {}", self.shape.label(), self.material.label())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_match_initial_form_state() {
        let selection = Selection::default();
        assert_eq!(selection.shape, StickerShape::Round);
        assert_eq!(selection.material, StickerMaterial::Vinyl);
        assert_eq!(selection.orientation, RectangleOrientation::Landscape);
        assert!(!selection.uses_orientation());
    }

    #[test]
    fn parse_is_case_and_whitespace_insensitive() {
        assert_eq!(StickerShape::parse("  Rectangle "), Some(StickerShape::Rectangle));
        assert_eq!(StickerMaterial::parse("DOMED"), Some(StickerMaterial::Domed));
        assert_eq!(
            RectangleOrientation::parse("portrait"),
            Some(RectangleOrientation::Portrait)
        );
        assert_eq!(StickerShape::parse("hexagon"), None);
    }

    #[test]
    fn parse_choice_reports_expected_values() {
        let err = parse_choice::<StickerMaterial>("paper").unwrap_err();
        assert_eq!(err, "invalid material 'paper' (expected vinyl|domed)");
    }

    #[test]
    fn as_str_round_trips_through_parse_for_every_value() {
        for shape in StickerShape::ALL {
            assert_eq!(StickerShape::parse(shape.as_str()), Some(*shape));
        }
        for material in StickerMaterial::ALL {
            assert_eq!(StickerMaterial::parse(material.as_str()), Some(*material));
        }
        for orientation in RectangleOrientation::ALL {
            assert_eq!(
                RectangleOrientation::parse(orientation.as_str()),
                Some(*orientation)
            );
        }
    }

    #[test]
    fn selection_serializes_with_lowercase_names() -> anyhow::Result<()> {
        let selection = Selection::new(
            StickerShape::Rectangle,
            StickerMaterial::Domed,
            RectangleOrientation::Portrait,
        );
        let value = serde_json::to_value(selection)?;
        assert_eq!(
            value,
            json!({"shape": "rectangle", "material": "domed", "orientation": "portrait"})
        );
        Ok(())
    }

    #[test]
    fn display_mentions_orientation_only_for_rectangles() {
        let round = Selection::default();
        assert_eq!(round.to_string(), "Round / Vinyl");

        let rect = Selection::new(
            StickerShape::Rectangle,
            StickerMaterial::Vinyl,
            RectangleOrientation::Portrait,
        );
        assert_eq!(rect.to_string(), "Rectangle / Standing (portrait) / Vinyl");
    }

    #[test]
    fn all_covers_every_combination() {
        assert_eq!(Selection::all().len(), 3 * 2 * 2);
    }
}
