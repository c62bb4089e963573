use docmerge_model::{ImageAnchor, PositionedImage, TextTarget};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::decode::decode_image;
use crate::error::{ComposeError, ComposeResult};
use crate::fit::{fit_within, validate_bounds, Dimensions, DEFAULT_IMAGE_BOUNDS};
use crate::placeholder::locate_placeholder;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReplacementRule {
    Text(TextRule),
    Image(ImageRule),
}

impl ReplacementRule {
    pub fn text(search_pattern: impl Into<String>, text: impl Into<String>) -> Self {
        ReplacementRule::Text(TextRule {
            search_pattern: search_pattern.into(),
            text: text.into(),
        })
    }
}

/// Replaces every occurrence of the pattern; an empty `text` erases it.
///
/// `search_pattern` is matched literally, so pass a discovered marker such as
/// `{v8 name}` as is rather than an escaped regex like `\{v8 name\}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRule {
    pub search_pattern: String,
    #[serde(default)]
    pub text: String,
}

/// Anchors an image at the first occurrence of the pattern. The pattern is
/// literal text, as for [`TextRule`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRule {
    pub search_pattern: String,
    /// Base64-encoded image bytes.
    pub image: String,
    #[serde(default)]
    pub image_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaceSummary {
    pub text_occurrences: usize,
    pub images_inserted: usize,
}

impl ReplaceSummary {
    pub fn absorb(&mut self, other: ReplaceSummary) {
        self.text_occurrences += other.text_occurrences;
        self.images_inserted += other.images_inserted;
    }
}

/// Applies replacement rules to one target, in order.
///
/// Each rule sees the target as left by the rules before it. A failing rule
/// returns before mutating the target.
#[derive(Clone, Debug)]
pub struct Replacer {
    default_bounds: Dimensions,
}

impl Default for Replacer {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_BOUNDS)
    }
}

impl Replacer {
    pub fn new(default_bounds: Dimensions) -> Self {
        Self { default_bounds }
    }

    pub fn apply<T: TextTarget>(
        &self,
        target: &mut T,
        rules: &[ReplacementRule],
    ) -> ComposeResult<ReplaceSummary> {
        let mut summary = ReplaceSummary::default();

        for rule in rules {
            match rule {
                ReplacementRule::Text(rule) => {
                    summary.text_occurrences += self.apply_text(target, rule)?;
                }
                ReplacementRule::Image(rule) => {
                    self.apply_image(target, rule)?;
                    summary.images_inserted += 1;
                }
            }
        }

        Ok(summary)
    }

    fn apply_text<T: TextTarget>(&self, target: &mut T, rule: &TextRule) -> ComposeResult<usize> {
        if rule.search_pattern.is_empty() {
            return Err(ComposeError::EmptySearchPattern);
        }
        let replaced = target.replace_text(&rule.search_pattern, &rule.text);
        debug!(
            "replaced {replaced} occurrence(s) of '{}'",
            rule.search_pattern
        );
        Ok(replaced)
    }

    fn apply_image<T: TextTarget>(&self, target: &mut T, rule: &ImageRule) -> ComposeResult<()> {
        let bounds = Dimensions::new(
            rule.height.unwrap_or(self.default_bounds.height),
            rule.width.unwrap_or(self.default_bounds.width),
        );
        validate_bounds(bounds)?;

        let position = locate_placeholder(target, &rule.search_pattern)?;
        let decoded = decode_image(&rule.image, &rule.image_type)?;
        let fitted = fit_within(decoded.natural, bounds)?;

        let anchor =
            target
                .parent_of(&position)
                .ok_or_else(|| ComposeError::PlaceholderNotFound {
                    pattern: rule.search_pattern.clone(),
                })?;
        anchor.add_positioned_image(PositionedImage {
            mime_type: decoded.mime_type,
            data: decoded.data,
            height: fitted.height,
            width: fitted.width,
        });
        debug!(
            "anchored {}x{} image at '{}' (natural {}x{})",
            fitted.width,
            fitted.height,
            rule.search_pattern,
            decoded.natural.width,
            decoded.natural.height
        );

        target.replace_text(&rule.search_pattern, "");
        Ok(())
    }
}
