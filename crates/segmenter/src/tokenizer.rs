use crate::error::{Result, SegmentError};

/// One markup token with its exact byte range in the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token's first byte
    pub start: usize,
    /// Byte offset one past the token's last byte
    pub end: usize,
}

/// Token classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// An opening tag, e.g. `<p class="intro">`
    StartTag {
        /// Lowercased element name
        name: String,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    /// A closing tag, e.g. `</p>`
    EndTag { name: String },
    /// Character data between tags
    Text,
    /// Content of a raw-text element (script/style), kept opaque
    RawText,
    /// `<!-- ... -->`
    Comment,
    /// `<!...>` or `<?...>` declarations and processing instructions
    Declaration,
}

/// A single tag attribute; the name is lowercased, the value is verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

impl Token {
    /// Attribute value by (lowercase) name, for start tags
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        match &self.kind {
            TokenKind::StartTag { attrs, .. } => attrs
                .iter()
                .find(|a| a.name == name)
                .and_then(|a| a.value.as_deref()),
            _ => None,
        }
    }

    /// Whether the start tag carries the given class token
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|v| v.split_ascii_whitespace().any(|c| c.eq_ignore_ascii_case(class)))
            .unwrap_or(false)
    }
}

/// Elements whose content is raw text until the matching close tag
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

/// Tokenize markup into a flat token stream with exact byte offsets.
///
/// The tokenizer is lenient about things browsers accept (stray `<` in
/// text, unquoted attribute values) but reports structural damage it
/// cannot recover byte positions from.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Tokenizer::new(input).run()
}

struct Tokenizer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>> {
        let mut text_start = self.pos;
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] != b'<' || !self.at_markup_start() {
                self.pos += 1;
                continue;
            }

            self.flush_text(text_start, self.pos);
            let tag_start = self.pos;
            let token = self.read_markup(tag_start)?;
            let raw_name = match &token.kind {
                TokenKind::StartTag {
                    name,
                    self_closing: false,
                    ..
                } if RAW_TEXT_ELEMENTS.contains(&name.as_str()) => Some(name.clone()),
                _ => None,
            };
            self.tokens.push(token);

            if let Some(name) = raw_name {
                self.read_raw_text(&name, tag_start)?;
            }
            text_start = self.pos;
        }
        self.flush_text(text_start, self.pos);
        Ok(self.tokens)
    }

    /// Whether the `<` at the current position begins actual markup
    fn at_markup_start(&self) -> bool {
        match self.bytes.get(self.pos + 1) {
            Some(b) => b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'),
            None => false,
        }
    }

    fn flush_text(&mut self, start: usize, end: usize) {
        if end > start {
            self.tokens.push(Token {
                kind: TokenKind::Text,
                start,
                end,
            });
        }
    }

    fn read_markup(&mut self, start: usize) -> Result<Token> {
        // self.pos is at '<'
        match self.bytes.get(start + 1) {
            Some(b'!') => {
                if self.input[start..].starts_with("<!--") {
                    self.read_comment(start)
                } else {
                    self.read_declaration(start)
                }
            }
            Some(b'?') => self.read_declaration(start),
            Some(b'/') => self.read_end_tag(start),
            _ => self.read_start_tag(start),
        }
    }

    fn read_comment(&mut self, start: usize) -> Result<Token> {
        match self.input[start + 4..].find("-->") {
            Some(rel) => {
                let end = start + 4 + rel + 3;
                self.pos = end;
                Ok(Token {
                    kind: TokenKind::Comment,
                    start,
                    end,
                })
            }
            None => Err(SegmentError::UnterminatedComment { start }),
        }
    }

    fn read_declaration(&mut self, start: usize) -> Result<Token> {
        match self.input[start..].find('>') {
            Some(rel) => {
                let end = start + rel + 1;
                self.pos = end;
                Ok(Token {
                    kind: TokenKind::Declaration,
                    start,
                    end,
                })
            }
            None => Err(SegmentError::UnterminatedTag { start }),
        }
    }

    fn read_end_tag(&mut self, start: usize) -> Result<Token> {
        let mut i = start + 2;
        let name_start = i;
        while i < self.bytes.len() && is_name_byte(self.bytes[i]) {
            i += 1;
        }
        let name = self.input[name_start..i].to_ascii_lowercase();
        while i < self.bytes.len() && self.bytes[i] != b'>' {
            i += 1;
        }
        if i >= self.bytes.len() {
            return Err(SegmentError::UnterminatedTag { start });
        }
        let end = i + 1;
        self.pos = end;
        Ok(Token {
            kind: TokenKind::EndTag { name },
            start,
            end,
        })
    }

    fn read_start_tag(&mut self, start: usize) -> Result<Token> {
        let mut i = start + 1;
        let name_start = i;
        while i < self.bytes.len() && is_name_byte(self.bytes[i]) {
            i += 1;
        }
        let name = self.input[name_start..i].to_ascii_lowercase();

        let mut attrs = Vec::new();
        let mut self_closing = false;
        loop {
            while i < self.bytes.len() && self.bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            match self.bytes.get(i) {
                None => return Err(SegmentError::UnterminatedTag { start }),
                Some(b'>') => {
                    i += 1;
                    break;
                }
                Some(b'/') => {
                    if self.bytes.get(i + 1) == Some(&b'>') {
                        self_closing = true;
                        i += 2;
                        break;
                    }
                    i += 1;
                }
                Some(_) => {
                    let (attr, next) = self.read_attribute(i, start)?;
                    attrs.push(attr);
                    i = next;
                }
            }
        }

        let end = i;
        self.pos = end;
        Ok(Token {
            kind: TokenKind::StartTag {
                name,
                attrs,
                self_closing,
            },
            start,
            end,
        })
    }

    fn read_attribute(&self, mut i: usize, tag_start: usize) -> Result<(Attribute, usize)> {
        let name_start = i;
        while i < self.bytes.len() && !self.bytes[i].is_ascii_whitespace()
            && !matches!(self.bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let name = self.input[name_start..i].to_ascii_lowercase();

        while i < self.bytes.len() && self.bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if self.bytes.get(i) != Some(&b'=') {
            // Boolean attribute
            return Ok((Attribute { name, value: None }, i));
        }
        i += 1;
        while i < self.bytes.len() && self.bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        match self.bytes.get(i) {
            Some(&quote @ (b'"' | b'\'')) => {
                let value_start = i + 1;
                let mut j = value_start;
                while j < self.bytes.len() && self.bytes[j] != quote {
                    j += 1;
                }
                if j >= self.bytes.len() {
                    return Err(SegmentError::UnterminatedAttribute { start: tag_start });
                }
                let value = self.input[value_start..j].to_string();
                Ok((
                    Attribute {
                        name,
                        value: Some(value),
                    },
                    j + 1,
                ))
            }
            Some(_) => {
                let value_start = i;
                while i < self.bytes.len()
                    && !self.bytes[i].is_ascii_whitespace()
                    && self.bytes[i] != b'>'
                {
                    i += 1;
                }
                let value = self.input[value_start..i].to_string();
                Ok((
                    Attribute {
                        name,
                        value: Some(value),
                    },
                    i,
                ))
            }
            None => Err(SegmentError::UnterminatedTag { start: tag_start }),
        }
    }

    /// Consume raw-text content after a `<script>`/`<style>` start tag
    fn read_raw_text(&mut self, name: &str, tag_start: usize) -> Result<()> {
        let content_start = self.pos;
        let close = format!("</{name}");
        let haystack = &self.input[content_start..];
        let rel = haystack
            .char_indices()
            .find(|(i, _)| {
                haystack[*i..]
                    .get(..close.len())
                    .map(|s| s.eq_ignore_ascii_case(&close))
                    .unwrap_or(false)
            })
            .map(|(i, _)| i);

        let Some(rel) = rel else {
            return Err(SegmentError::UnterminatedRawText {
                name: name.to_string(),
                start: tag_start,
            });
        };

        if rel > 0 {
            self.tokens.push(Token {
                kind: TokenKind::RawText,
                start: content_start,
                end: content_start + rel,
            });
        }
        self.pos = content_start + rel;
        let end_tag = self.read_end_tag(self.pos)?;
        self.tokens.push(end_tag);
        Ok(())
    }
}

const fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b':')
}
