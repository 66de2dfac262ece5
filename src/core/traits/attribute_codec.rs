//! Attribute codecs for cells and darts.
//!
//! Every vertex, edge, face, volume, and dart carries a raw attribute string
//! (the text between `{` and `}` in the mesh file formats) plus a decoded
//! value. An [`AttributeCodec`] converts between the two. The mesh calls
//! [`AttributeCodec::decode`] after loading and [`AttributeCodec::encode`]
//! before writing; it never interprets the payload itself.
//!
//! # Payload grammar
//!
//! A payload is a whitespace-separated list of tokens. Each token is either a
//! bare flag (`sharp`) or a keyed value list (`normal=(0 0 1)`). Codecs only
//! touch their own keys, so several codecs can share one string.
//!
//! ```rust
//! use dartmesh::core::traits::attribute_codec::{AttributeCodec, Normal};
//! use dartmesh::geometry::point::Point;
//!
//! let mut normal = Normal::default();
//! normal.decode("uv=(0.5 0.5) normal=(0 0 1)").unwrap();
//! assert_eq!(normal.normal, Some(Point::new([0.0, 0.0, 1.0])));
//!
//! normal.normal = Some(Point::new([1.0, 0.0, 0.0]));
//! assert_eq!(normal.encode("uv=(0.5 0.5) normal=(0 0 1)"), "uv=(0.5 0.5) normal=(1 0 0)");
//! ```

use crate::geometry::point::Point;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised while decoding an attribute payload.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum AttributeError {
    /// A keyed value list was opened with `(` but never closed.
    #[error("Unterminated value list for attribute '{key}'")]
    Unterminated {
        /// The attribute key.
        key: String,
    },
    /// A value list has the wrong number of entries.
    #[error("Attribute '{key}' expects {expected} values, found {found}")]
    WrongArity {
        /// The attribute key.
        key: String,
        /// Number of values the codec expects.
        expected: usize,
        /// Number of values present.
        found: usize,
    },
    /// A value could not be parsed as a number.
    #[error("Attribute '{key}' has a non-numeric value '{value}'")]
    InvalidNumber {
        /// The attribute key.
        key: String,
        /// The offending text.
        value: String,
    },
}

// =============================================================================
// TOKENIZER
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    key: &'a str,
    value: Option<&'a str>,
    raw: &'a str,
    closed: bool,
}

fn tokenize(payload: &str) -> Vec<Token<'_>> {
    let bytes = payload.as_bytes();
    let len = bytes.len();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < len {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i == len {
            break;
        }
        let start = i;
        while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            i += 1;
        }
        let key = &payload[start..i];
        let mut value = None;
        let mut closed = true;
        if i < len && bytes[i] == b'=' {
            i += 1;
            if i < len && bytes[i] == b'(' {
                let value_start = i + 1;
                match payload[value_start..].find(')') {
                    Some(offset) => {
                        value = Some(&payload[value_start..value_start + offset]);
                        i = value_start + offset + 1;
                    }
                    None => {
                        value = Some(&payload[value_start..]);
                        closed = false;
                        i = len;
                    }
                }
            } else {
                let value_start = i;
                while i < len && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                value = Some(&payload[value_start..i]);
            }
        }
        tokens.push(Token {
            key,
            value,
            raw: &payload[start..i],
            closed,
        });
    }
    tokens
}

/// Reads the numeric value list stored under `key`.
///
/// Returns `Ok(None)` when the key is absent.
///
/// # Errors
///
/// Returns an [`AttributeError`] if the list is unterminated, has a length
/// other than `K`, or contains a non-numeric entry.
pub fn read_values<const K: usize>(
    payload: &str,
    key: &str,
) -> Result<Option<[f64; K]>, AttributeError> {
    let Some(token) = tokenize(payload).into_iter().find(|t| t.key == key) else {
        return Ok(None);
    };
    if !token.closed {
        return Err(AttributeError::Unterminated {
            key: key.to_string(),
        });
    }
    let entries: Vec<&str> = token.value.unwrap_or("").split_whitespace().collect();
    if entries.len() != K {
        return Err(AttributeError::WrongArity {
            key: key.to_string(),
            expected: K,
            found: entries.len(),
        });
    }
    let mut values = [0.0; K];
    for (slot, text) in values.iter_mut().zip(entries) {
        *slot = text
            .parse::<f64>()
            .map_err(|_| AttributeError::InvalidNumber {
                key: key.to_string(),
                value: text.to_string(),
            })?;
    }
    Ok(Some(values))
}

/// Rewrites the token for `key` in `existing`, preserving every other token.
///
/// The token keeps its position when present and is appended otherwise.
/// `None` removes the token.
#[must_use]
pub fn write_values(existing: &str, key: &str, values: Option<&[f64]>) -> String {
    let rendered = values.map(|vals| {
        let joined: Vec<String> = vals.iter().map(f64::to_string).collect();
        format!("{key}=({})", joined.join(" "))
    });
    let mut parts: Vec<String> = Vec::new();
    let mut replaced = false;
    for token in tokenize(existing) {
        if token.key == key {
            if !replaced && let Some(r) = &rendered {
                parts.push(r.clone());
            }
            replaced = true;
        } else {
            parts.push(token.raw.to_string());
        }
    }
    if !replaced && let Some(r) = rendered {
        parts.push(r);
    }
    parts.join(" ")
}

/// Returns `true` if `payload` contains the bare flag or key `key`.
#[must_use]
pub fn has_key(payload: &str, key: &str) -> bool {
    tokenize(payload).iter().any(|t| t.key == key)
}

// =============================================================================
// CODEC TRAITS
// =============================================================================

/// Converts a cell's decoded attributes to and from its raw attribute string.
pub trait AttributeCodec: Clone + Debug + Default + PartialEq + 'static {
    /// Renders this value into `existing`, replacing this codec's own tokens
    /// and preserving foreign ones.
    fn encode(&self, existing: &str) -> String;

    /// Replaces this value with the one described by `payload`.
    ///
    /// # Errors
    ///
    /// Returns an [`AttributeError`] if `payload` carries a malformed token
    /// for this codec.
    fn decode(&mut self, payload: &str) -> Result<(), AttributeError>;
}

impl AttributeCodec for () {
    fn encode(&self, existing: &str) -> String {
        existing.to_string()
    }

    fn decode(&mut self, _payload: &str) -> Result<(), AttributeError> {
        Ok(())
    }
}

// Both halves share the payload; `B` sees the output of `A`.
impl<A, B> AttributeCodec for (A, B)
where
    A: AttributeCodec,
    B: AttributeCodec,
{
    fn encode(&self, existing: &str) -> String {
        self.1.encode(&self.0.encode(existing))
    }

    fn decode(&mut self, payload: &str) -> Result<(), AttributeError> {
        self.0.decode(payload)?;
        self.1.decode(payload)
    }
}

/// Selects one attribute codec per cell kind for a mesh type.
///
/// # Examples
///
/// ```rust
/// use dartmesh::core::surface_mesh::SurfaceMesh;
/// use dartmesh::core::traits::attribute_codec::{MeshTraits, Normal, Uv};
///
/// #[derive(Clone, Debug, Default)]
/// struct Textured;
///
/// impl MeshTraits for Textured {
///     type Vertex = Uv;
///     type Edge = ();
///     type Face = Normal;
///     type Volume = ();
///     type Dart = ();
/// }
///
/// let mesh: SurfaceMesh<Textured> = SurfaceMesh::new();
/// assert_eq!(mesh.number_of_vertices(), 0);
/// ```
pub trait MeshTraits: Clone + Debug + Default + 'static {
    /// Vertex attributes.
    type Vertex: AttributeCodec;
    /// Edge attributes.
    type Edge: AttributeCodec;
    /// Face attributes.
    type Face: AttributeCodec;
    /// Volume attributes (tetrahedral meshes only).
    type Volume: AttributeCodec;
    /// Dart (corner) attributes.
    type Dart: AttributeCodec;
}

/// Mesh traits with no decoded attributes. Raw strings are still kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoAttributes;

impl MeshTraits for NoAttributes {
    type Vertex = ();
    type Edge = ();
    type Face = ();
    type Volume = ();
    type Dart = ();
}

// =============================================================================
// BUILT-IN CODECS
// =============================================================================

/// Unit normal stored as `normal=(x y z)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Normal {
    /// The decoded normal, if present.
    pub normal: Option<Point<f64, 3>>,
}

impl AttributeCodec for Normal {
    fn encode(&self, existing: &str) -> String {
        write_values(
            existing,
            "normal",
            self.normal.as_ref().map(|n| n.coords().as_slice()),
        )
    }

    fn decode(&mut self, payload: &str) -> Result<(), AttributeError> {
        self.normal = read_values::<3>(payload, "normal")?.map(Point::new);
        Ok(())
    }
}

/// Texture coordinate stored as `uv=(u v)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Uv {
    /// The decoded texture coordinate, if present.
    pub uv: Option<[f64; 2]>,
}

impl AttributeCodec for Uv {
    fn encode(&self, existing: &str) -> String {
        write_values(existing, "uv", self.uv.as_ref().map(<[f64; 2]>::as_slice))
    }

    fn decode(&mut self, payload: &str) -> Result<(), AttributeError> {
        self.uv = read_values::<2>(payload, "uv")?;
        Ok(())
    }
}

/// Dual (Voronoi) point of a face stored as `dual=(x y z)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DualPoint {
    /// The decoded dual point, if present.
    pub dual: Option<Point<f64, 3>>,
}

impl AttributeCodec for DualPoint {
    fn encode(&self, existing: &str) -> String {
        write_values(
            existing,
            "dual",
            self.dual.as_ref().map(|p| p.coords().as_slice()),
        )
    }

    fn decode(&mut self, payload: &str) -> Result<(), AttributeError> {
        self.dual = read_values::<3>(payload, "dual")?.map(Point::new);
        Ok(())
    }
}

// =============================================================================
// CAPABILITY TRAITS
// =============================================================================

/// Face attributes that carry a normal vector.
pub trait HasNormal: AttributeCodec {
    /// Returns the stored normal.
    fn normal(&self) -> Option<Point<f64, 3>>;
    /// Replaces the stored normal.
    fn set_normal(&mut self, normal: Option<Point<f64, 3>>);
}

impl HasNormal for Normal {
    fn normal(&self) -> Option<Point<f64, 3>> {
        self.normal
    }

    fn set_normal(&mut self, normal: Option<Point<f64, 3>>) {
        self.normal = normal;
    }
}

impl<B: AttributeCodec> HasNormal for (Normal, B) {
    fn normal(&self) -> Option<Point<f64, 3>> {
        self.0.normal
    }

    fn set_normal(&mut self, normal: Option<Point<f64, 3>>) {
        self.0.normal = normal;
    }
}

/// Face attributes that carry a dual point.
pub trait HasDualPoint: AttributeCodec {
    /// Returns the stored dual point.
    fn dual_point(&self) -> Option<Point<f64, 3>>;
    /// Replaces the stored dual point.
    fn set_dual_point(&mut self, dual: Option<Point<f64, 3>>);
}

impl HasDualPoint for DualPoint {
    fn dual_point(&self) -> Option<Point<f64, 3>> {
        self.dual
    }

    fn set_dual_point(&mut self, dual: Option<Point<f64, 3>>) {
        self.dual = dual;
    }
}

impl<A: AttributeCodec> HasDualPoint for (A, DualPoint) {
    fn dual_point(&self) -> Option<Point<f64, 3>> {
        self.1.dual
    }

    fn set_dual_point(&mut self, dual: Option<Point<f64, 3>>) {
        self.1.dual = dual;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // TOKENIZER
    // =========================================================================

    #[test]
    fn tokenizer_handles_flags_and_lists() {
        let tokens = tokenize("  sharp normal=(0 0 1)  id=7 ");
        let keys: Vec<&str> = tokens.iter().map(|t| t.key).collect();
        assert_eq!(keys, ["sharp", "normal", "id"]);
        assert_eq!(tokens[1].value, Some("0 0 1"));
        assert_eq!(tokens[2].value, Some("7"));
        assert!(tokens[0].value.is_none());
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn read_values_reports_malformed_payloads() {
        assert_eq!(read_values::<2>("uv=(1 2)", "uv"), Ok(Some([1.0, 2.0])));
        assert_eq!(read_values::<2>("other=(1 2)", "uv"), Ok(None));
        assert!(matches!(
            read_values::<2>("uv=(1 2", "uv"),
            Err(AttributeError::Unterminated { .. })
        ));
        assert!(matches!(
            read_values::<2>("uv=(1 2 3)", "uv"),
            Err(AttributeError::WrongArity {
                expected: 2,
                found: 3,
                ..
            })
        ));
        assert!(matches!(
            read_values::<2>("uv=(1 x)", "uv"),
            Err(AttributeError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn write_values_preserves_foreign_tokens() {
        assert_eq!(write_values("", "uv", Some(&[0.5, 1.0])), "uv=(0.5 1)");
        assert_eq!(
            write_values("sharp uv=(0 0) father=3", "uv", Some(&[1.0, 2.0])),
            "sharp uv=(1 2) father=3"
        );
        assert_eq!(write_values("sharp uv=(0 0)", "uv", None), "sharp");
        assert!(has_key("sharp uv=(0 0)", "sharp"));
        assert!(!has_key("sharp uv=(0 0)", "normal"));
    }

    // =========================================================================
    // CODECS
    // =========================================================================

    #[test]
    fn unit_codec_is_transparent() {
        assert_eq!(().encode("anything goes"), "anything goes");
        assert!(AttributeCodec::decode(&mut (), "normal=(broken").is_ok());
    }

    #[test]
    fn built_in_codecs_decode_and_encode() {
        let mut uv = Uv::default();
        uv.decode("uv=(0.25 0.75)").unwrap();
        assert_eq!(uv.uv, Some([0.25, 0.75]));
        assert_eq!(uv.encode(""), "uv=(0.25 0.75)");

        let mut dual = DualPoint::default();
        dual.decode("").unwrap();
        assert!(dual.dual.is_none());
        dual.set_dual_point(Some(Point::new([1.0, -2.0, 0.0])));
        assert_eq!(dual.encode("k"), "k dual=(1 -2 0)");
    }

    #[test]
    fn paired_codecs_share_one_payload() {
        let mut pair: (Normal, DualPoint) = Default::default();
        pair.decode("normal=(0 0 1) dual=(0.5 0.5 0)").unwrap();
        assert_eq!(pair.normal(), Some(Point::new([0.0, 0.0, 1.0])));
        assert_eq!(pair.dual_point(), Some(Point::new([0.5, 0.5, 0.0])));

        pair.set_normal(Some(Point::new([0.0, 1.0, 0.0])));
        assert_eq!(
            pair.encode("normal=(0 0 1) dual=(0.5 0.5 0)"),
            "normal=(0 1 0) dual=(0.5 0.5 0)"
        );
        assert!(pair.decode("normal=(0 0)").is_err());
    }
}
