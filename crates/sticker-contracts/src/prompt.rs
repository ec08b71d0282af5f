use crate::selection::{RectangleOrientation, Selection, StickerMaterial, StickerShape};

/// Copy repeated across the preview background.
pub const WATERMARK_TEXT: &str = "GID Adesivos - 2025 © / Todos os Direitos Reservados";

pub fn shape_description(selection: &Selection) -> String {
    match selection.shape {
        StickerShape::Round => "perfect round shape".to_string(),
        StickerShape::Square => "perfect square shape".to_string(),
        StickerShape::Rectangle => {
            format!("rectangular shape {}", orientation_description(selection.orientation))
        }
    }
}

fn orientation_description(orientation: RectangleOrientation) -> &'static str {
    match orientation {
        RectangleOrientation::Portrait => "in portrait orientation (3:4)",
        RectangleOrientation::Landscape => "in landscape orientation (4:3)",
    }
}

pub fn material_description(material: StickerMaterial) -> &'static str {
    match material {
        StickerMaterial::Vinyl => "printed vinyl sticker with a matte or semi-gloss finish",
        StickerMaterial::Domed => {
            "domed resin sticker (raised relief) with a clear, glossy polyurethane dome"
        }
    }
}

/// Builds the instruction sent to the image service for a selection.
pub fn build_prompt(selection: &Selection) -> String {
    let shape = shape_description(selection);
    let material = material_description(selection.material);
    [
        format!("Generate a realistic preview of a sticker with a {shape}."),
        format!("The sticker must be a {material}."),
        String::new(),
        format!("Background: a repeating diagonal pattern of the text '{WATERMARK_TEXT}'."),
        "The sticker itself must NOT carry any watermark on top of it; the watermark belongs to the background only.".to_string(),
        String::new(),
        "Treat the supplied image: remove its background and center it on the sticker."
            .to_string(),
    ]
    .join("\n")
}
