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

//! A tolerant header map for normalised header blocks.
//!
//! This operates on the output of `HeaderWindow`, i.e. a block with single
//! `\n` line endings. Values are kept as-is apart from unfolding; in
//! particular, RFC 2047 encoded words are *not* decoded, so a value read
//! from here can be copied onto another message verbatim.

/// An ordered multi-map of header names to unfolded values.
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    /// Parse a normalised header block.
    ///
    /// Lines without a colon that are not folded continuations are skipped
    /// rather than treated as an error. Folded continuations are unfolded
    /// with a single space, as `textproto` readers conventionally do.
    pub fn parse(block: &[u8]) -> HeaderMap {
        let mut entries: Vec<(String, String)> = Vec::new();

        for line in block.split(|&b| b'\n' == b) {
            if line.is_empty() {
                continue;
            }

            if b' ' == line[0] || b'\t' == line[0] {
                if let Some(last) = entries.last_mut() {
                    let cont = String::from_utf8_lossy(line);
                    last.1.push(' ');
                    last.1.push_str(cont.trim());
                }
                continue;
            }

            if let Some(colon) = line.iter().position(|&b| b':' == b) {
                let name = String::from_utf8_lossy(&line[..colon])
                    .trim()
                    .to_owned();
                let value = String::from_utf8_lossy(&line[colon + 1..])
                    .trim()
                    .to_owned();
                entries.push((name, value));
            }
        }

        HeaderMap { entries }
    }

    /// Return the value of the first header named `name`, compared
    /// case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn simple_headers_are_parsed() {
        let headers = HeaderMap::parse(b"Foo: Bar\nBaz:  quux  \n\n");
        assert_eq!(Some("Bar"), headers.get("Foo"));
        assert_eq!(Some("quux"), headers.get("Baz"));
        assert_eq!(None, headers.get("Nope"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let headers = HeaderMap::parse(b"Content-Type: text/plain\n\n");
        assert_eq!(Some("text/plain"), headers.get("content-type"));
        assert_eq!(Some("text/plain"), headers.get("CONTENT-TYPE"));
    }

    #[test]
    fn first_match_wins() {
        let headers = HeaderMap::parse(b"Received: one\nReceived: two\n\n");
        assert_eq!(Some("one"), headers.get("Received"));
    }

    #[test]
    fn folded_values_are_unfolded() {
        let headers = HeaderMap::parse(b"Subject: one,\n\ttwo,\n   three\n\n");
        assert_eq!(Some("one, two, three"), headers.get("Subject"));
    }

    #[test]
    fn encoded_words_stay_verbatim() {
        let headers =
            HeaderMap::parse(b"Subject: =?utf-8?q?hello_world?=\n\n");
        assert_eq!(Some("=?utf-8?q?hello_world?="), headers.get("Subject"));
    }

    #[test]
    fn colonless_noise_is_skipped() {
        let headers = HeaderMap::parse(b"garbage line\nFoo: Bar\n\n");
        assert_eq!(Some("Bar"), headers.get("Foo"));
    }
}
