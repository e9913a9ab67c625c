//! Cover designs as immutable lists of draw commands.
//!
//! A design says what goes on the canvas; [`crate::canvas`] decides how.
//! Line breaks are computed against a [`TextMetrics`], normally the canvas
//! that will draw the text, so wrapped lines fit the font actually used.

use cover_core::error::{CoverError, Result};

/// Average advance of one character, as a fraction of the font size.
const CHAR_ADVANCE: f32 = 0.55;

/// Placeholder canvas size.
pub const PLACEHOLDER_WIDTH: u32 = 400;
pub const PLACEHOLDER_HEIGHT: u32 = 600;

const PLACEHOLDER_FROM: Rgb = Rgb(0x2c, 0x3e, 0x50);
const PLACEHOLDER_TO: Rgb = Rgb(0x34, 0x98, 0xdb);
const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);
/// 90% white over the gradient, kept opaque.
const TITLE_COLOR: Rgb = Rgb(0xe6, 0xeb, 0xf0);
const FOOTER_COLOR: Rgb = Rgb(0xcb, 0xd5, 0xe0);

const TITLE_SIZE: f32 = 24.0;
const TITLE_TOP: f32 = 200.0;
const TITLE_LINE_HEIGHT: f32 = 40.0;
const TITLE_MAX_WIDTH: f32 = 350.0;
pub const TITLE_MAX_LINES: usize = 5;

/// Pixel width of a single line of text.
pub trait TextMetrics {
    fn text_width(&self, text: &str, size: f32) -> f32;
}

/// Every character advances the same fraction of an em.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedAdvance;

impl TextMetrics for FixedAdvance {
    fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * CHAR_ADVANCE
    }
}

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoverError::InvalidColor(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| CoverError::InvalidColor(s.to_string()))
        };
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Two-stop gradient along the canvas diagonal, top-left to bottom-right.
    LinearGradient { from: Rgb, to: Rgb },
    /// Circle outline centred at (`cx`, `cy`).
    Ring {
        cx: f32,
        cy: f32,
        radius: f32,
        stroke: f32,
        color: Rgb,
        opacity: f32,
    },
    /// Filled rectangle with an opaque outline.
    Panel {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Rgb,
        fill_opacity: f32,
        stroke: f32,
        stroke_color: Rgb,
    },
    /// One line of text centred on `cx`, with its baseline at `baseline`.
    Text {
        text: String,
        cx: f32,
        baseline: f32,
        size: f32,
        color: Rgb,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoverDesign {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<DrawCommand>,
}

impl CoverDesign {
    pub fn builder(width: u32, height: u32) -> DesignBuilder {
        DesignBuilder {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// The stand-in cover drawn when a PDF page cannot be rendered.
    pub fn placeholder(title: &str, branding: &str, metrics: &dyn TextMetrics) -> CoverDesign {
        let w = PLACEHOLDER_WIDTH as f32;
        let h = PLACEHOLDER_HEIGHT as f32;
        let cx = w / 2.0;
        let title_lines = wrap_text(title, TITLE_SIZE, TITLE_MAX_WIDTH, TITLE_MAX_LINES, metrics);

        CoverDesign::builder(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT)
            .gradient(PLACEHOLDER_FROM, PLACEHOLDER_TO)
            .rings(cx, h / 2.0, 6, 60.0, 30.0, 2.0)
            .text("eBook", cx, 130.0, 32.0, WHITE)
            .lines(&title_lines, cx, TITLE_TOP, TITLE_LINE_HEIGHT, TITLE_SIZE, TITLE_COLOR)
            .panel(150.0, 400.0, 100.0, 120.0)
            .text("PDF", cx, 475.0, 40.0, WHITE)
            .text(branding, cx, 570.0, 18.0, FOOTER_COLOR)
            .build()
    }

    /// Lines of text in drawing order.
    pub fn text_lines(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Accumulates draw commands for a [`CoverDesign`].
pub struct DesignBuilder {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl DesignBuilder {
    pub fn gradient(mut self, from: Rgb, to: Rgb) -> Self {
        self.commands.push(DrawCommand::LinearGradient { from, to });
        self
    }

    /// `count` concentric white rings at 10% opacity, radius `first + step * i`.
    pub fn rings(
        mut self,
        cx: f32,
        cy: f32,
        count: usize,
        first: f32,
        step: f32,
        stroke: f32,
    ) -> Self {
        for i in 0..count {
            self.commands.push(DrawCommand::Ring {
                cx,
                cy,
                radius: first + step * i as f32,
                stroke,
                color: WHITE,
                opacity: 0.1,
            });
        }
        self
    }

    /// White badge at 20% fill with a 3px outline.
    pub fn panel(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.commands.push(DrawCommand::Panel {
            x,
            y,
            width,
            height,
            fill: WHITE,
            fill_opacity: 0.2,
            stroke: 3.0,
            stroke_color: WHITE,
        });
        self
    }

    pub fn text(mut self, text: &str, cx: f32, baseline: f32, size: f32, color: Rgb) -> Self {
        if !text.trim().is_empty() {
            self.commands.push(DrawCommand::Text {
                text: text.trim().to_string(),
                cx,
                baseline,
                size,
                color,
            });
        }
        self
    }

    /// One text command per line, `line_height` apart.
    pub fn lines(
        mut self,
        lines: &[String],
        cx: f32,
        first_baseline: f32,
        line_height: f32,
        size: f32,
        color: Rgb,
    ) -> Self {
        for (i, line) in lines.iter().enumerate() {
            self = self.text(line, cx, first_baseline + line_height * i as f32, size, color);
        }
        self
    }

    pub fn build(self) -> CoverDesign {
        CoverDesign {
            width: self.width,
            height: self.height,
            commands: self.commands,
        }
    }
}

/// Greedy word wrap. Words wider than a line are split; output is capped
/// at `max_lines`, the last kept line ending in `...` when text was cut.
pub fn wrap_text(
    text: &str,
    size: f32,
    max_width: f32,
    max_lines: usize,
    metrics: &dyn TextMetrics,
) -> Vec<String> {
    let fits = |s: &str| metrics.text_width(s, size) <= max_width;
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };
        if fits(&candidate) {
            line = candidate;
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        let mut rest = word;
        while !fits(rest) {
            let end = fitting_prefix(rest, &fits);
            lines.push(rest[..end].to_string());
            rest = &rest[end..];
        }
        line = rest.to_string();
    }
    if !line.is_empty() {
        lines.push(line);
    }

    if max_lines > 0 && lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            *last = ellipsize(last, &fits);
        }
    }
    lines
}

/// Byte length of the longest prefix of `word` that fits, never less than
/// one character.
fn fitting_prefix(word: &str, fits: &dyn Fn(&str) -> bool) -> usize {
    let mut chars = word.char_indices();
    let mut best = match chars.next() {
        Some((_, c)) => c.len_utf8(),
        None => return 0,
    };
    for (i, c) in chars {
        let end = i + c.len_utf8();
        if !fits(&word[..end]) {
            break;
        }
        best = end;
    }
    best
}

/// Shorten `line` until it fits with a trailing `...`.
fn ellipsize(line: &str, fits: &dyn Fn(&str) -> bool) -> String {
    let mut cut = line.trim_end().to_string();
    loop {
        let candidate = format!("{}...", cut.trim_end());
        if cut.is_empty() || fits(&candidate) {
            return candidate;
        }
        cut.pop();
    }
}
