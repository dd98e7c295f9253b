//! RDF terms and their on-disk wire encoding.
//!
//! Encoding is a single tag byte followed by a payload, matching the
//! dictionary format the crate is grounded on: `U<iri>`, `B<label>`,
//! `P<lex>`, `D<datatype-iri>|<lex>`, `L<lang>|<lex>`, `G<id>`, `V<name>`.

use crate::error::{CorruptionError, StorageError};
use oxilangtag::LanguageTag;
use oxiri::Iri;

const TAG_IRI: u8 = b'U';
const TAG_BLANK_NODE: u8 = b'B';
const TAG_PLAIN_LITERAL: u8 = b'P';
const TAG_TYPED_LITERAL: u8 = b'D';
const TAG_LANG_LITERAL: u8 = b'L';
const TAG_GRAPH_REF: u8 = b'G';
const TAG_VARIABLE: u8 = b'V';
const DATATYPE_LEX_SEPARATOR: u8 = b'|';

/// An RDF term: an IRI, blank node, one of the three literal shapes, a named
/// graph reference, or a SPARQL-style variable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Iri(String),
    BlankNode(String),
    PlainLiteral(String),
    TypedLiteral { datatype: String, lexical: String },
    LangLiteral { language: String, lexical: String },
    GraphRef(String),
    Variable(String),
}

impl Term {
    /// Builds a validated IRI term.
    pub fn iri(iri: impl Into<String>) -> Result<Self, StorageError> {
        let iri = iri.into();
        Iri::parse(iri.as_str())
            .map_err(|e| CorruptionError::new(e))
            .map_err(StorageError::Corruption)?;
        Ok(Self::Iri(iri))
    }

    /// Builds an IRI term without validating it. The caller is responsible
    /// for `iri` being a syntactically valid IRI.
    pub fn iri_unchecked(iri: impl Into<String>) -> Self {
        Self::Iri(iri.into())
    }

    pub fn blank_node(label: impl Into<String>) -> Self {
        Self::BlankNode(label.into())
    }

    pub fn plain_literal(lexical: impl Into<String>) -> Self {
        Self::PlainLiteral(lexical.into())
    }

    pub fn typed_literal(datatype: impl Into<String>, lexical: impl Into<String>) -> Self {
        Self::TypedLiteral {
            datatype: datatype.into(),
            lexical: lexical.into(),
        }
    }

    /// Builds a language-tagged literal, validating the BCP47 tag.
    pub fn lang_literal(
        language: impl Into<String>,
        lexical: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let language = language.into();
        LanguageTag::parse(language.as_str())
            .map_err(|e| CorruptionError::new(e))
            .map_err(StorageError::Corruption)?;
        Ok(Self::LangLiteral {
            language,
            lexical: lexical.into(),
        })
    }

    pub fn graph_ref(id: impl Into<String>) -> Self {
        Self::GraphRef(id.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Serializes this term to its tagged wire form.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::Iri(iri) => {
                buf.push(TAG_IRI);
                buf.extend_from_slice(iri.as_bytes());
            }
            Self::BlankNode(label) => {
                buf.push(TAG_BLANK_NODE);
                buf.extend_from_slice(label.as_bytes());
            }
            Self::PlainLiteral(lex) => {
                buf.push(TAG_PLAIN_LITERAL);
                buf.extend_from_slice(lex.as_bytes());
            }
            Self::TypedLiteral { datatype, lexical } => {
                buf.push(TAG_TYPED_LITERAL);
                buf.extend_from_slice(datatype.as_bytes());
                buf.push(DATATYPE_LEX_SEPARATOR);
                buf.extend_from_slice(lexical.as_bytes());
            }
            Self::LangLiteral { language, lexical } => {
                buf.push(TAG_LANG_LITERAL);
                buf.extend_from_slice(language.as_bytes());
                buf.push(DATATYPE_LEX_SEPARATOR);
                buf.extend_from_slice(lexical.as_bytes());
            }
            Self::GraphRef(id) => {
                buf.push(TAG_GRAPH_REF);
                buf.extend_from_slice(id.as_bytes());
            }
            Self::Variable(name) => {
                buf.push(TAG_VARIABLE);
                buf.extend_from_slice(name.as_bytes());
            }
        }
        buf
    }

    /// Parses a term previously produced by [`Term::encode`].
    ///
    /// `decode` does not re-validate IRIs or language tags: it trusts that
    /// only terms previously accepted by the constructors above were ever
    /// written to the dictionary.
    pub fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        let (&tag, payload) = bytes
            .split_first()
            .ok_or_else(|| CorruptionError::MalformedTerm("empty term".to_owned()))?;
        let payload = std::str::from_utf8(payload)
            .map_err(|e| CorruptionError::new(e))
            .map_err(StorageError::Corruption)?;
        match tag {
            TAG_IRI => Ok(Self::Iri(payload.to_owned())),
            TAG_BLANK_NODE => Ok(Self::BlankNode(payload.to_owned())),
            TAG_PLAIN_LITERAL => Ok(Self::PlainLiteral(payload.to_owned())),
            TAG_TYPED_LITERAL => {
                let (datatype, lexical) = split_on_first_pipe(payload)?;
                Ok(Self::TypedLiteral {
                    datatype: datatype.to_owned(),
                    lexical: lexical.to_owned(),
                })
            }
            TAG_LANG_LITERAL => {
                let (language, lexical) = split_on_first_pipe(payload)?;
                Ok(Self::LangLiteral {
                    language: language.to_owned(),
                    lexical: lexical.to_owned(),
                })
            }
            TAG_GRAPH_REF => Ok(Self::GraphRef(payload.to_owned())),
            TAG_VARIABLE => Ok(Self::Variable(payload.to_owned())),
            other => Err(StorageError::Corruption(CorruptionError::MalformedTerm(
                format!("unknown term tag {other:#04x}"),
            ))),
        }
    }
}

/// Splits on the FIRST `|` only — the lexical form of a typed/lang literal
/// may itself contain `|`.
fn split_on_first_pipe(payload: &str) -> Result<(&str, &str), StorageError> {
    payload
        .split_once('|')
        .ok_or_else(|| {
            StorageError::Corruption(CorruptionError::MalformedTerm(
                "typed/lang literal missing '|' separator".to_owned(),
            ))
        })
}
