use crate::measure::TextMeasurer;
use crate::model::{FontSpec, ImageInfo, PageGeometry, StyleKind, StyleSheet};
use crate::sections::Block;

/// A block with its resolved vertical offset (from the top margin) and
/// computed height, both in points.
#[derive(Clone, Debug)]
pub struct PlacedBlock {
    pub block: Block,
    pub y: f32,
    pub height: f32,
}

#[derive(Clone, Debug)]
pub struct Page {
    pub index: usize,
    pub placed: Vec<PlacedBlock>,
}

/// The single layout result both emitters consume. Block order across pages
/// matches the section renderer's output exactly, except that an
/// overflowing text block may be split into per-page line chunks.
#[derive(Clone, Debug)]
pub struct Layout {
    pub pages: Vec<Page>,
}

impl Layout {
    pub fn placed(&self) -> impl Iterator<Item = &PlacedBlock> {
        self.pages.iter().flat_map(|p| p.placed.iter())
    }
}

/// Scale an image to the page: height capped at `max_height`, width capped
/// at `content_width`, intrinsic aspect ratio preserved exactly. Shared by
/// the layout pass and both emitters so the three never disagree.
pub fn scaled_image_size(info: &ImageInfo, content_width: f32, max_height: f32) -> (f32, f32) {
    let ratio = info.pixel_width as f32 / info.pixel_height as f32;
    let mut height = max_height;
    let mut width = height * ratio;
    if width > content_width {
        width = content_width;
        height = width / ratio;
    }
    (width, height)
}

/// Lay the block sequence out into pages. Deterministic: identical blocks,
/// geometry, styles and measurer produce an identical layout.
pub fn paginate(
    blocks: Vec<Block>,
    geom: &PageGeometry,
    styles: &StyleSheet,
    measurer: &dyn TextMeasurer,
) -> Layout {
    let mut p = Paginator {
        geom,
        styles,
        measurer,
        pages: Vec::new(),
        current: Vec::new(),
        y: 0.0,
    };

    let count = blocks.len();
    let mut iter = blocks.into_iter().peekable();
    let mut idx = 0usize;
    while let Some(block) = iter.next() {
        let is_last = idx + 1 == count;
        match block {
            Block::Heading { .. } => p.place_heading(block, iter.peek(), is_last),
            Block::Paragraph { .. } | Block::ListItem { .. } | Block::Link { .. } => {
                p.place_text(block)
            }
            Block::Image { .. } => p.place_image(block),
        }
        idx += 1;
    }

    p.finish()
}

struct Paginator<'a> {
    geom: &'a PageGeometry,
    styles: &'a StyleSheet,
    measurer: &'a dyn TextMeasurer,
    pages: Vec<Page>,
    current: Vec<PlacedBlock>,
    y: f32,
}

impl Paginator<'_> {
    fn usable(&self) -> f32 {
        self.geom.usable_height()
    }

    fn flush_page(&mut self) {
        let index = self.pages.len();
        self.pages.push(Page {
            index,
            placed: std::mem::take(&mut self.current),
        });
        self.y = 0.0;
    }

    fn finish(mut self) -> Layout {
        // The title block always exists, so even an otherwise empty guide
        // yields one non-empty page.
        self.flush_page();
        Layout { pages: self.pages }
    }

    fn place(&mut self, block: Block, height: f32) {
        self.current.push(PlacedBlock {
            block,
            y: self.y,
            height,
        });
        self.y += height;
    }

    /// Wrap width, style and trailing spacing for a text-bearing block.
    fn text_params(&self, block: &Block) -> (f32, FontSpec, f32) {
        let content = self.geom.content_width();
        match block {
            Block::ListItem { .. } => (
                content - self.styles.list_indent,
                self.styles.body,
                self.styles.list_spacing,
            ),
            Block::Link { .. } => (content, self.styles.caption, self.styles.link_spacing),
            _ => (content, self.styles.body, 0.0),
        }
    }

    /// Height of the smallest piece of `block` that must share a page with
    /// a preceding heading: one wrapped line for text, the full scaled
    /// height for an atomic image.
    fn first_unit_height(&self, block: &Block) -> f32 {
        match block {
            Block::Image { info, .. } => {
                scaled_image_size(info, self.geom.content_width(), self.styles.image_max_height).1
            }
            Block::Link { .. } => self.styles.caption.line_height,
            Block::Heading { style, .. } => self.styles.spec(*style).line_height,
            _ => self.styles.body.line_height,
        }
    }

    fn place_heading(&mut self, block: Block, next: Option<&Block>, is_last: bool) {
        let Block::Heading { text, style, .. } = &block else {
            unreachable!()
        };
        let style = *style;
        let spec = *self.styles.spec(style);
        let lines = self
            .measurer
            .wrap(text, self.geom.content_width(), &spec);
        let height = lines.len() as f32 * spec.line_height;

        if style == StyleKind::Title {
            // The title opens the document; it is centered and exempt from
            // the orphan rule.
            self.place(block, height);
            self.y += self.styles.title_space_after;
            return;
        }

        let next_unit = if is_last {
            0.0
        } else {
            next.map(|b| self.first_unit_height(b)).unwrap_or(0.0)
        };
        if self.y + height + next_unit > self.usable() {
            self.flush_page();
        } else {
            self.y += self.styles.heading_space_before;
        }

        self.place(block, height);
        self.y += self.styles.heading_space_after;
    }

    /// A heading must not end a page. When the block after it moves to a
    /// fresh page wholesale, carry the heading along.
    fn carry_trailing_heading(&mut self) -> Option<PlacedBlock> {
        match self.current.last() {
            Some(PlacedBlock {
                block: Block::Heading { style, .. },
                ..
            }) if *style != StyleKind::Title => self.current.pop(),
            _ => None,
        }
    }

    fn break_page_keeping_heading(&mut self) {
        if let Some(heading) = self.carry_trailing_heading() {
            self.flush_page();
            self.place(heading.block, heading.height);
            self.y += self.styles.heading_space_after;
        } else {
            self.flush_page();
        }
    }

    fn place_text(&mut self, block: Block) {
        let (wrap_width, spec, spacing_after) = self.text_params(&block);
        let text = match &block {
            Block::Paragraph { text }
            | Block::ListItem { text, .. }
            | Block::Link { text, .. } => text.clone(),
            _ => unreachable!(),
        };
        let lines = self.measurer.wrap(&text, wrap_width, &spec);
        let height = lines.len() as f32 * spec.line_height;

        if self.y + height <= self.usable() {
            self.place(block, height);
        } else if height <= self.usable() {
            // Fits whole on an empty page: never split a block that only
            // lacks room on the current page.
            self.break_page_keeping_heading();
            self.place(block, height);
        } else {
            self.place_overflowing(block, &lines, &spec);
        }
        self.y += spacing_after;
    }

    /// Overflow policy: the block is taller than a whole empty page, so it
    /// is split at wrapped-line boundaries across consecutive pages. No
    /// line is ever cut and no content dropped.
    fn place_overflowing(&mut self, block: Block, lines: &[String], spec: &FontSpec) {
        let line_h = spec.line_height;
        let mut idx = 0usize;
        while idx < lines.len() {
            let remaining = self.usable() - self.y;
            let mut fit = (remaining / line_h).floor() as usize;
            if fit == 0 {
                if self.y > 0.0 {
                    self.break_page_keeping_heading();
                    continue;
                }
                // Single line taller than the page: place it anyway
                fit = 1;
            }
            let fit = fit.min(lines.len() - idx);
            let chunk_text = lines[idx..idx + fit].join(" ");
            let chunk = if idx == 0 {
                match &block {
                    // The joined chunk is whitespace-normalized, so the
                    // lead-in boundary is re-derived on it.
                    Block::ListItem { split, .. } => {
                        let split = split.and(chunk_text.find(':').map(|i| i + 1));
                        Block::ListItem {
                            text: chunk_text,
                            split,
                            continuation: false,
                        }
                    }
                    Block::Link { uri, .. } => Block::Link {
                        text: chunk_text,
                        uri: uri.clone(),
                    },
                    _ => Block::Paragraph { text: chunk_text },
                }
            } else {
                match &block {
                    Block::ListItem { .. } => Block::ListItem {
                        text: chunk_text,
                        split: None,
                        continuation: true,
                    },
                    Block::Link { uri, .. } => Block::Link {
                        text: chunk_text,
                        uri: uri.clone(),
                    },
                    _ => Block::Paragraph { text: chunk_text },
                }
            };
            self.place(chunk, fit as f32 * line_h);
            idx += fit;
        }
    }

    fn place_image(&mut self, block: Block) {
        let Block::Image { info, .. } = &block else {
            unreachable!()
        };
        let (_, height) =
            scaled_image_size(info, self.geom.content_width(), self.styles.image_max_height);
        if self.y + height > self.usable() && self.y > 0.0 {
            self.break_page_keeping_heading();
        }
        self.place(block, height);
    }
}
