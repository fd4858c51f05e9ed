//! Détection de l'encodage (BOM puis prologue XML)

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use memchr::memmem;

use crate::KmlError;

/// Taille maximale examinée pour trouver le prologue
const PROLOG_WINDOW: usize = 512;

/// Document décodé en texte
#[derive(Debug)]
pub struct Decoded<'a> {
    pub text: Cow<'a, str>,
    pub encoding: &'static Encoding,
    /// Erreur non fatale (octets remplacés)
    pub error: Option<KmlError>,
}

/// Détermine l'encodage du document: BOM, puis `encoding="..."`, puis UTF-8
pub fn detect_encoding(data: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(data) {
        return encoding;
    }

    let window = &data[..data.len().min(PROLOG_WINDOW)];
    let Some(start) = memmem::find(window, b"<?xml") else {
        return UTF_8;
    };
    let end = memmem::find(&window[start..], b"?>")
        .map(|p| start + p)
        .unwrap_or(window.len());
    let prolog = &window[start..end];

    let Some(pos) = memmem::find(prolog, b"encoding") else {
        return UTF_8;
    };
    let rest = &prolog[pos + "encoding".len()..];

    // encoding = "LABEL" ou encoding='LABEL'
    let Some(quote_pos) = rest.iter().position(|&b| b == b'"' || b == b'\'') else {
        return UTF_8;
    };
    let quote = rest[quote_pos];
    let value = &rest[quote_pos + 1..];
    let Some(close) = value.iter().position(|&b| b == quote) else {
        return UTF_8;
    };

    Encoding::for_label(&value[..close]).unwrap_or(UTF_8)
}

/// Décode le document selon l'encodage détecté
pub fn decode(data: &[u8]) -> Decoded<'_> {
    let encoding = detect_encoding(data);

    if encoding == UTF_8 {
        let body = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        return match simdutf8::basic::from_utf8(body) {
            Ok(text) => Decoded {
                text: Cow::Borrowed(text),
                encoding,
                error: None,
            },
            Err(_) => {
                let reason = simdutf8::compat::from_utf8(body)
                    .err()
                    .map(|e| format!("invalid byte sequence at {}", e.valid_up_to()))
                    .unwrap_or_else(|| "invalid byte sequence".to_string());
                Decoded {
                    text: Cow::Owned(String::from_utf8_lossy(body).into_owned()),
                    encoding,
                    error: Some(KmlError::InvalidEncoding {
                        encoding: encoding.name().to_string(),
                        reason,
                    }),
                }
            }
        };
    }

    let (text, actual, had_errors) = encoding.decode(data);
    let error = had_errors.then(|| KmlError::InvalidEncoding {
        encoding: actual.name().to_string(),
        reason: "malformed sequences replaced".to_string(),
    });

    Decoded {
        text,
        encoding: actual,
        error,
    }
}
