//-
// Copyright (c) 2026, Jason Lingle
//
// This file is part of Lemoncrypt.
//
// Lemoncrypt is free software: you can redistribute it and/or modify it under
// the  terms of  the GNU  General Public  License as  published by  the Free
// Software Foundation, either version 3 of the License, or (at  your option)
// any later version.
//
// Lemoncrypt is distributed in the hope  that it will be useful, but WITHOUT
// ANY  WARRANTY; without  even the  implied warranty  of MERCHANTABILITY  or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public  License for
// more details.
//
// You should have received a copy of the GNU General Public License along
// with Lemoncrypt. If not, see <http://www.gnu.org/licenses/>.

//! Assembly of the OpenPGP/MIME envelope.
//!
//! The envelope layout follows RFC 3156: a `multipart/encrypted` container
//! with a `application/pgp-encrypted` version part and an
//! `application/octet-stream` part holding the ASCII-armored message. On
//! top of the standard framing, every envelope carries an `X-Lemoncrypt`
//! header identifying it as ours, a rewritten `Message-Id` and a
//! configurable set of headers copied in cleartext from the source message.
//!
//! `format` is a pure function of its inputs; randomness only enters via
//! `generate_boundary`. Headers are written with bare `\n` line endings to
//! match the messages already produced in existing archives.

use std::fmt::Write as _;

use rand::{rngs::OsRng, Rng};

use super::headers::HeaderMap;

/// Header marking an envelope as produced by us, and the sole discriminator
/// the decryptor uses to recognise its own output.
pub const CUSTOM_HEADER: &str = "X-Lemoncrypt";
pub const CUSTOM_HEADER_VALUE: &str = "v0.1";

/// Prefix spliced into the original Message-Id.
pub const MSGID_PREFIX: &str = "lemoncrypt.";

/// Create a random boundary string suitable for MIME part separation.
pub fn generate_boundary() -> String {
    let mut raw = [0u8; 30];
    OsRng.fill(&mut raw[..]);

    let mut boundary = String::with_capacity(2 * raw.len());
    for byte in &raw {
        let _ = write!(boundary, "{:02x}", byte);
    }
    boundary
}

/// Derive the envelope's Message-Id from the original one.
///
/// The prefix goes directly after the `<` when the id is properly bracketed
/// and after the whole id otherwise; a message without a Message-Id gets an
/// empty one.
pub fn rewrite_message_id(orig: Option<&str>) -> String {
    match orig {
        None | Some("") => String::new(),
        Some(id) if id.starts_with('<') => {
            format!("<{}{}", MSGID_PREFIX, &id[1..])
        },
        Some(id) => format!("{}{}", id, MSGID_PREFIX),
    }
}

/// Assemble the full envelope from the source headers, the keep-list, the
/// armored OpenPGP message and the part boundary.
///
/// Top-level headers are emitted in a fixed order: the rewritten
/// Message-Id, the `X-Lemoncrypt` marker, the kept headers in keep-list
/// order (headers with no value in the source are skipped), then the MIME
/// framing.
pub fn format(
    headers: &HeaderMap,
    keep_headers: &[String],
    armored: &[u8],
    boundary: &str,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(armored.len() + 512);

    let msgid = rewrite_message_id(headers.get("Message-Id"));
    out.extend_from_slice(format!("Message-Id: {}\n", msgid).as_bytes());
    out.extend_from_slice(
        format!("{}: {}\n", CUSTOM_HEADER, CUSTOM_HEADER_VALUE).as_bytes(),
    );

    for name in keep_headers {
        let value = match headers.get(name) {
            Some(v) if !v.is_empty() => v,
            // don't attempt to copy empty headers
            _ => continue,
        };
        out.extend_from_slice(format!("{}: {}\n", name, value).as_bytes());
    }

    out.extend_from_slice(
        format!(
            "MIME-Version: 1.0\n\
             Content-Type: multipart/encrypted;\n\
             \x20protocol=\"application/pgp-encrypted\";\n\
             \x20boundary=\"{boundary}\"\n\
             \n\
             OpenPGP/MIME\n\
             --{boundary}\n\
             Content-Type: application/pgp-encrypted\n\
             \n\
             Version: 1\n\
             \n\
             --{boundary}\n\
             Content-Type: application/octet-stream; \
             name=\"encrypted.asc\"\n\
             Content-Disposition: inline; filename=\"encrypted.asc\"\n\
             \n",
            boundary = boundary
        )
        .as_bytes(),
    );
    out.extend_from_slice(armored);
    out.extend_from_slice(format!("\n--{}--", boundary).as_bytes());
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn boundary_is_60_lowercase_hex_digits() {
        let boundary = generate_boundary();
        assert_eq!(60, boundary.len());
        assert!(boundary
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        assert_ne!(boundary, generate_boundary());
    }

    #[test]
    fn message_id_rewriting() {
        assert_eq!("", rewrite_message_id(None));
        assert_eq!("", rewrite_message_id(Some("")));
        assert_eq!(
            "<lemoncrypt.123@example.org>",
            rewrite_message_id(Some("<123@example.org>"))
        );
        assert_eq!(
            "123@example.orglemoncrypt.",
            rewrite_message_id(Some("123@example.org"))
        );
    }

    #[test]
    fn envelope_layout_is_exact() {
        let headers = HeaderMap::parse(
            b"Message-Id: <1@x>\nSubject: Hi\nFrom: a@x\nDate: today\n\n",
        );
        let keep = vec!["From".to_owned(), "Subject".to_owned()];
        let boundary = "ab".repeat(30);
        let out = format(&headers, &keep, b"ARMORED", &boundary);

        let expected = format!(
            "Message-Id: <lemoncrypt.1@x>\n\
             X-Lemoncrypt: v0.1\n\
             From: a@x\n\
             Subject: Hi\n\
             MIME-Version: 1.0\n\
             Content-Type: multipart/encrypted;\n\
             \x20protocol=\"application/pgp-encrypted\";\n\
             \x20boundary=\"{b}\"\n\
             \n\
             OpenPGP/MIME\n\
             --{b}\n\
             Content-Type: application/pgp-encrypted\n\
             \n\
             Version: 1\n\
             \n\
             --{b}\n\
             Content-Type: application/octet-stream; \
             name=\"encrypted.asc\"\n\
             Content-Disposition: inline; filename=\"encrypted.asc\"\n\
             \n\
             ARMORED\n\
             --{b}--",
            b = boundary
        );
        assert_eq!(expected.into_bytes(), out);
    }

    #[test]
    fn empty_kept_headers_are_skipped() {
        let headers = HeaderMap::parse(b"Subject: Hi\nCc:\n\n");
        let keep = vec!["Cc".to_owned(), "Subject".to_owned()];
        let out = format(&headers, &keep, b"", "00");
        let text = String::from_utf8(out).unwrap();

        assert!(!text.contains("Cc:"));
        assert!(text.contains("Subject: Hi\n"));
    }

    #[test]
    fn absent_message_id_yields_empty_header_line() {
        let headers = HeaderMap::parse(b"Subject: Hi\n\n");
        let out = format(&headers, &[], b"", "00");
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Message-Id: \nX-Lemoncrypt: v0.1\n"));
    }
}
