//! Fixed registry of glyph ramps, ordered darkest to brightest.

use std::sync::LazyLock;

use unicode_segmentation::UnicodeSegmentation as _;

/// Identifier of a built-in glyph ramp.
///
/// The discriminant is the ordinal written into `.ascache` headers, so variants must never
/// be reordered.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(from = "String", into = "String")]
#[repr(u8)]
pub enum Charset {
    /// Ten glyph ramp `" .:-=+*#%@"`.
    #[default]
    Standard = 0,
    /// Seventy glyph ramp for fine tonal detail.
    Detailed = 1,
    /// Unicode shade blocks.
    Blocks = 2,
    /// Five glyph ramp for very coarse output.
    Minimal = 3,
}

impl Charset {
    /// Every charset in ordinal order.
    pub const ALL: [Charset; 4] = [
        Charset::Standard,
        Charset::Detailed,
        Charset::Blocks,
        Charset::Minimal,
    ];

    /// Stable lowercase key, as used in settings files and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            Charset::Standard => "standard",
            Charset::Detailed => "detailed",
            Charset::Blocks => "blocks",
            Charset::Minimal => "minimal",
        }
    }

    /// Look a charset up by key; unknown keys resolve to the default charset.
    pub fn from_key(key: &str) -> Self {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(key))
            .unwrap_or_default()
    }

    /// Ordinal position in [`Charset::ALL`].
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Charset for a persisted ordinal, or `None` if the ordinal is unknown.
    pub fn from_index_checked(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Charset for a persisted ordinal; unknown ordinals resolve to the default charset.
    pub fn from_index(index: u8) -> Self {
        Self::from_index_checked(index).unwrap_or_default()
    }

    /// Shorthand for [`resolve`].
    pub fn glyphs(self) -> &'static GlyphSet {
        resolve(self)
    }

    fn ramp(self) -> &'static str {
        match self {
            Charset::Standard => " .:-=+*#%@",
            Charset::Detailed => {
                " .'`^\",:;Il!i><~+_-?][}{1)(|\\/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$"
            }
            Charset::Blocks => " ░▒▓█",
            Charset::Minimal => " .oO@",
        }
    }
}

impl From<String> for Charset {
    fn from(key: String) -> Self {
        Self::from_key(&key)
    }
}

impl From<Charset> for String {
    fn from(charset: Charset) -> Self {
        charset.key().to_string()
    }
}

impl std::fmt::Display for Charset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Ordered glyph ramp; index 0 is the darkest glyph.
///
/// Each glyph is one grapheme cluster, so multi-byte symbols count as a single step.
#[derive(Debug, PartialEq, Eq)]
pub struct GlyphSet {
    glyphs: Vec<&'static str>,
}

impl GlyphSet {
    fn from_ramp(ramp: &'static str) -> Self {
        Self {
            glyphs: ramp.graphemes(true).collect(),
        }
    }

    /// Number of glyphs; always at least 1.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always `false`; present for API symmetry with [`GlyphSet::len`].
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Glyph at `index`, clamped to the brightest glyph.
    pub fn glyph(&self, index: usize) -> &'static str {
        self.glyphs[index.min(self.glyphs.len() - 1)]
    }

    /// All glyphs, darkest first.
    pub fn as_slice(&self) -> &[&'static str] {
        &self.glyphs
    }
}

static GLYPH_SETS: LazyLock<[GlyphSet; 4]> =
    LazyLock::new(|| Charset::ALL.map(|c| GlyphSet::from_ramp(c.ramp())));

/// Resolve a charset to its process-wide glyph set.
pub fn resolve(charset: Charset) -> &'static GlyphSet {
    &GLYPH_SETS[usize::from(charset.index())]
}

#[cfg(test)]
#[path = "../../tests/unit/glyph/charset.rs"]
mod tests;
