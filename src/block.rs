/// A run of text sharing the same emphasis
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineSpan {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    /// Set by the classifier for recognized domain terms (planet and point names)
    pub is_label: bool,
}

impl InlineSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            ..Self::default()
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            italic: true,
            ..Self::default()
        }
    }

    pub fn label(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            is_label: true,
            ..Self::default()
        }
    }
}

/// Discriminant of a [`Block`], used to look up per-renderer styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Heading1,
    Heading2,
    SubHeading,
    BlockNumberHeading,
    Paragraph,
    Emphasis,
    ListItem,
}

impl BlockKind {
    pub const ALL: [BlockKind; 7] = [
        BlockKind::Heading1,
        BlockKind::Heading2,
        BlockKind::BlockNumberHeading,
        BlockKind::SubHeading,
        BlockKind::Paragraph,
        BlockKind::ListItem,
        BlockKind::Emphasis,
    ];

    /// Build a block of this kind, dropping it when the spans carry no visible text.
    pub fn build(self, content: Vec<InlineSpan>) -> Option<Block> {
        let content: Vec<InlineSpan> = content.into_iter().filter(|s| !s.text.is_empty()).collect();
        if content.iter().all(|s| s.text.trim().is_empty()) {
            return None;
        }
        Some(match self {
            BlockKind::Heading1 => Block::Heading1(content),
            BlockKind::Heading2 => Block::Heading2(content),
            BlockKind::SubHeading => Block::SubHeading(content),
            BlockKind::BlockNumberHeading => Block::BlockNumberHeading(content),
            BlockKind::Paragraph => Block::Paragraph(content),
            BlockKind::Emphasis => Block::Emphasis(content),
            BlockKind::ListItem => Block::ListItem(content),
        })
    }
}

/// Block-level elements classified from report markup.
///
/// Blocks are only constructed through [`BlockKind::build`], which guarantees
/// a non-empty span sequence with at least one non-whitespace character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading1(Vec<InlineSpan>),
    Heading2(Vec<InlineSpan>),
    SubHeading(Vec<InlineSpan>),
    BlockNumberHeading(Vec<InlineSpan>),
    Paragraph(Vec<InlineSpan>),
    Emphasis(Vec<InlineSpan>),
    ListItem(Vec<InlineSpan>),
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Heading1(_) => BlockKind::Heading1,
            Block::Heading2(_) => BlockKind::Heading2,
            Block::SubHeading(_) => BlockKind::SubHeading,
            Block::BlockNumberHeading(_) => BlockKind::BlockNumberHeading,
            Block::Paragraph(_) => BlockKind::Paragraph,
            Block::Emphasis(_) => BlockKind::Emphasis,
            Block::ListItem(_) => BlockKind::ListItem,
        }
    }

    pub fn content(&self) -> &[InlineSpan] {
        match self {
            Block::Heading1(content)
            | Block::Heading2(content)
            | Block::SubHeading(content)
            | Block::BlockNumberHeading(content)
            | Block::Paragraph(content)
            | Block::Emphasis(content)
            | Block::ListItem(content) => content,
        }
    }

    /// Concatenated text of all spans, ignoring emphasis.
    pub fn text(&self) -> String {
        self.content().iter().map(|s| s.text.as_str()).collect()
    }
}

/// Ordered, read-only sequence of blocks built from one markup payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Normalize and classify report markup.
    pub fn parse(markup: &str) -> Self {
        let blocks = crate::normalize::normalize(markup)
            .iter()
            .filter_map(|line| crate::classify::classify(line))
            .collect();
        Self::new(blocks)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
