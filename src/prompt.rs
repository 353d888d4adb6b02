//! Prompt construction for the generative image API.
//!
//! Pure data transformation: a [`GenerationRequest`] becomes a natural-language
//! prompt plus the ordered content parts sent alongside it. Every profile field
//! already carries a default, so building never fails.

use crate::models::{Angle, AnglePrompts, GenerationRequest, Part, PromptResult, ReferenceImage};

const STUDIO_STYLE: &str = "Clean seamless light-grey studio background, soft even lighting, \
sharp focus, true-to-life colors, high-end e-commerce catalog quality. No text, no watermark.";

const FIDELITY_RULE: &str = "reproduce this piece exactly as shown, pixel-faithful in color, \
pattern, texture, logos, stitching and proportions. Do not redesign, recolor or substitute it.";

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Base prompt, no angle-specific framing.
    pub fn build(&self, request: &GenerationRequest) -> PromptResult {
        self.compose(request, None)
    }

    /// Front, back and face prompts sharing the same image parts.
    pub fn build_angles(&self, request: &GenerationRequest) -> AnglePrompts {
        AnglePrompts {
            front: self.compose(request, Some(Angle::Front)),
            back: self.compose(request, Some(Angle::Back)),
            face: self.compose(request, Some(Angle::Face)),
        }
    }

    fn compose(&self, request: &GenerationRequest, angle: Option<Angle>) -> PromptResult {
        let mut sections = Vec::new();
        let subject = request.profile.describe();

        match request.reference_images.split_first() {
            None => {
                let outfit = request
                    .product_description
                    .as_deref()
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or("a contemporary everyday outfit");
                sections.push(format!(
                    "Professional fashion photograph of {} wearing {}.",
                    subject, outfit
                ));
            }
            Some((hero, auxiliary)) => {
                sections.push(format!(
                    "Professional fashion photograph of {} wearing the {} shown in IMAGE 1.",
                    subject,
                    piece_label(hero)
                ));
                if let Some(description) = request
                    .product_description
                    .as_deref()
                    .filter(|d| !d.trim().is_empty())
                {
                    sections.push(format!("Product details: {}.", description.trim()));
                }
                sections.push(format!("IMAGE 1 is the hero product: {}", FIDELITY_RULE));
                if !auxiliary.is_empty() {
                    for (index, piece) in auxiliary.iter().enumerate() {
                        sections.push(format!(
                            "IMAGE {} ({}): {}",
                            index + 2,
                            piece_label(piece),
                            FIDELITY_RULE
                        ));
                    }
                    sections.push(
                        "Combine every referenced piece into one cohesive outfit worn by the same model."
                            .to_string(),
                    );
                }
            }
        }

        if let Some(angle) = angle {
            sections.push(angle_framing(angle).to_string());
        }
        sections.push(format!(
            "{} composition.",
            capitalize(request.orientation.phrase())
        ));
        sections.push(STUDIO_STYLE.to_string());

        let text = sections.join(" ");
        let mut parts = Vec::with_capacity(request.reference_images.len() + 1);
        parts.push(Part::text(text.clone()));
        parts.extend(
            request
                .reference_images
                .iter()
                .map(|image| Part::image(&image.bytes, image.mime_type.clone())),
        );

        PromptResult { text, parts }
    }
}

fn angle_framing(angle: Angle) -> &'static str {
    match angle {
        Angle::Front => "Full-body front view, model standing naturally and facing the camera.",
        Angle::Back => {
            "Full-body back view, model turned away from the camera so the back of the outfit is visible. \
             Same person, hairstyle and body as the identity reference."
        }
        Angle::Face => {
            "Close-up portrait framed from the shoulders up, model facing the camera. \
             Same face, skin tone and hairstyle as the identity reference."
        }
    }
}

fn piece_label(image: &ReferenceImage) -> String {
    if !image.name.trim().is_empty() {
        format!("{} piece \"{}\"", image.slot, image.name.trim())
    } else {
        format!("{} piece", image.slot)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Orientation, SubjectProfile};
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    fn image(slot: &str, name: &str, byte: u8) -> ReferenceImage {
        ReferenceImage::new(slot, name, vec![0x89, b'P', b'N', b'G', byte])
    }

    #[test]
    fn test_profile_vocabulary_in_text() {
        let request = GenerationRequest {
            profile: SubjectProfile {
                gender: Gender::from("man"),
                ..Default::default()
            },
            ..Default::default()
        };
        let prompt = PromptBuilder::new().build(&request);
        assert!(prompt.text.contains("a male model"));
        assert!(prompt.text.contains("a contemporary everyday outfit"));
        assert!(prompt.text.contains("Vertical 3:4 portrait composition"));
        assert_eq!(prompt.parts.len(), 1);
        assert!(!prompt.text.contains("undefined"));
    }

    #[test]
    fn test_unknown_codes_never_leak() {
        let profile: SubjectProfile = serde_json::from_str(
            r#"{"gender":"???","ethnicity":"unknown","bodyType":"blob","ageRange":"old"}"#,
        )
        .unwrap();
        let request = GenerationRequest {
            profile,
            ..Default::default()
        };
        let text = PromptBuilder::new().build(&request).text;
        assert!(text.contains("a female model of ethnically ambiguous appearance, average build"));
        assert!(!text.contains("???"));
        assert!(!text.contains("blob"));
    }

    #[test]
    fn test_composer_mode_numbers_auxiliary_from_two() {
        let request = GenerationRequest {
            reference_images: vec![
                image("hero", "jacket", 1),
                image("bottom", "jeans", 2),
                image("shoes", "", 3),
            ],
            ..Default::default()
        };
        let prompt = PromptBuilder::new().build(&request);

        assert_eq!(prompt.image_count(), 3);
        let images: Vec<_> = prompt
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Image(img) => Some(img.data.clone()),
                Part::Text(_) => None,
            })
            .collect();
        assert_eq!(images[0], STANDARD.encode(&request.reference_images[0].bytes));
        assert_eq!(images[1], STANDARD.encode(&request.reference_images[1].bytes));
        assert_eq!(images[2], STANDARD.encode(&request.reference_images[2].bytes));

        let first_aux = prompt.text.find("IMAGE 2 (bottom piece \"jeans\")").unwrap();
        let second_aux = prompt.text.find("IMAGE 3 (shoes piece)").unwrap();
        assert!(first_aux < second_aux);
        assert!(!prompt.text.contains("IMAGE 4"));
        assert!(prompt.text.contains("pixel-faithful"));
    }

    #[test]
    fn test_single_reference_is_not_composer_mode() {
        let request = GenerationRequest {
            orientation: Orientation::Horizontal,
            reference_images: vec![image("hero", "dress", 1)],
            ..Default::default()
        };
        let prompt = PromptBuilder::new().build(&request);
        assert_eq!(prompt.image_count(), 1);
        assert!(!prompt.text.contains("IMAGE 2"));
        assert!(prompt.text.contains("Horizontal 4:3 landscape"));
    }

    #[test]
    fn test_angle_prompts_share_parts() {
        let request = GenerationRequest {
            reference_images: vec![image("hero", "coat", 9)],
            ..Default::default()
        };
        let prompts = PromptBuilder::new().build_angles(&request);
        assert!(prompts.front.text.contains("front view"));
        assert!(prompts.back.text.contains("back view"));
        assert!(prompts.face.text.contains("shoulders up"));
        assert_eq!(prompts.front.parts[1..], prompts.back.parts[1..]);
        assert_eq!(prompts.front.parts[1..], prompts.face.parts[1..]);
        // deterministic
        assert_eq!(prompts, PromptBuilder::new().build_angles(&request));
    }
}
