use crate::fonts::FontSet;
use crate::model::FontSpec;

/// Text measurement capability. Both the layout pass and the emitters go
/// through the same instance, so estimated heights and rendered break
/// points can never diverge.
///
/// Implementations must be pure: the same text, width and style always
/// yield the same result.
pub trait TextMeasurer {
    /// Advance width of `text` set in `spec`, in points.
    fn width(&self, text: &str, spec: &FontSpec) -> f32;

    /// Greedy word wrap of `text` into lines no wider than `max_width`.
    /// The first word of a line is always placed, even when it alone
    /// exceeds the budget; wrapping never splits inside a word.
    fn wrap(&self, text: &str, max_width: f32, spec: &FontSpec) -> Vec<String> {
        let space_w = self.width(" ", spec);
        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_w = 0.0f32;

        for word in text.split_whitespace() {
            let word_w = self.width(word, spec);
            if current.is_empty() {
                current.push_str(word);
                current_w = word_w;
            } else if current_w + space_w + word_w > max_width {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_w = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_w += space_w + word_w;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        if lines.is_empty() {
            lines.push(String::new());
        }
        lines
    }
}

/// Measurer over a [`FontSet`]: real face metrics when the set was
/// discovered from the system, the approximate Helvetica table otherwise.
pub struct FontMeasurer<'a> {
    fonts: &'a FontSet,
}

impl<'a> FontMeasurer<'a> {
    pub fn new(fonts: &'a FontSet) -> Self {
        Self { fonts }
    }
}

impl TextMeasurer for FontMeasurer<'_> {
    fn width(&self, text: &str, spec: &FontSpec) -> f32 {
        let face = self.fonts.face(spec.bold);
        text.chars()
            .map(|ch| face.char_width_1000(ch) * spec.size / 1000.0)
            .sum()
    }
}
