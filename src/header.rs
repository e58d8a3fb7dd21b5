//! Plate solution header store
//!
//! Reads the `.wcs` files written by plate solvers. astrometry.net writes a
//! raw FITS header (2880 byte blocks of 80 column cards, no line breaks),
//! ASTAP writes the same cards one per line. Both layouts end up in the same
//! [Header].

use std::collections::HashMap;
use std::path::Path;

use log::debug;
use thiserror::Error;

/// FITS card width
const CARD_LEN: usize = 80;

/// A single header value
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl HeaderValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Float(f) => Some(*f),
            HeaderValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Int(i) => Some(*i),
            HeaderValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Key/value store of one solved image's header
///
/// Keys are upper case. `COMMENT` cards are kept in order as a separate list
/// since the keyword repeats.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    values: HashMap<String, HeaderValue>,
    comments: Vec<String>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path(path: &Path) -> Result<Self, HeaderError> {
        let bytes = std::fs::read(path)?;
        let header = Self::parse(&String::from_utf8_lossy(&bytes))?;
        debug!(
            "Read {} keys and {} comments from {}",
            header.values.len(),
            header.comments.len(),
            path.display()
        );
        Ok(header)
    }

    pub fn parse(text: &str) -> Result<Self, HeaderError> {
        let mut header = Self::new();
        for (idx, card) in cards(text).enumerate() {
            let card = card.trim_end();
            let keyword = card.get(..8).unwrap_or(card).trim();

            if keyword == "END" {
                break;
            } else if keyword == "COMMENT" {
                header.push_comment(card[7..].trim());
            } else if keyword.is_empty() || keyword == "HISTORY" || keyword == "HIERARCH" {
                continue;
            } else if let Some(eq) = card.find('=') {
                let key = card[..eq].trim();
                if key.is_empty() || key.contains(char::is_whitespace) {
                    return Err(HeaderError::MalformedCard {
                        index: idx,
                        card: card.to_string(),
                    });
                }
                header.insert(key, parse_value(&card[eq + 1..]));
            }
        }
        Ok(header)
    }

    pub fn insert(&mut self, key: &str, value: HeaderValue) {
        self.values.insert(key.to_uppercase(), value);
    }

    pub fn push_comment(&mut self, comment: &str) {
        self.comments.push(comment.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.values.get(&key.to_uppercase())
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(HeaderValue::as_f64)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(HeaderValue::as_i64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(HeaderValue::as_str)
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }
}

/// Split into cards: one per line if there are line breaks, else every 80 bytes
fn cards(text: &str) -> Box<dyn Iterator<Item = &str> + '_> {
    if text.contains('\n') {
        Box::new(text.lines())
    } else {
        Box::new(
            text.as_bytes()
                .chunks(CARD_LEN)
                .filter_map(|chunk| std::str::from_utf8(chunk).ok()),
        )
    }
}

/// Parse the part of a card after `=`
/// e.g. ` -6.526249307470E-003 / X pixel size (deg)`
fn parse_value(s: &str) -> HeaderValue {
    let s = s.trim_start();

    if let Some(rest) = s.strip_prefix('\'') {
        // '' is an escaped quote inside a string
        let mut out = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                } else {
                    break;
                }
            }
            out.push(c);
        }
        return HeaderValue::Str(out.trim_end().to_string());
    }

    let value = match s.find('/') {
        Some(idx) => s[..idx].trim(),
        None => s.trim(),
    };

    match value {
        "T" => HeaderValue::Bool(true),
        "F" => HeaderValue::Bool(false),
        _ => {
            if let Ok(i) = value.parse::<i64>() {
                HeaderValue::Int(i)
            } else if let Ok(f) = value.replace(['D', 'd'], "E").parse::<f64>() {
                HeaderValue::Float(f)
            } else {
                HeaderValue::Str(value.to_string())
            }
        }
    }
}

/// Errors from reading a header
#[derive(Error, Debug)]
pub enum HeaderError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Malformed header card {index}: {card:?}")]
    MalformedCard { index: usize, card: String },
}
