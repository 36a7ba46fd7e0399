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

//! Isolation of the RFC 5322 header block from a streaming message.
//!
//! `HeaderWindow` is a write sink which records incoming bytes for as long
//! as they are part of the header block; everything after the blank line is
//! silently discarded. Reading it back yields the block with line endings
//! normalised to a single `\n` and all non-header lines removed. Non-header
//! lines are lines which contain no colon and are not folded continuations,
//! such as free-text "Received" lines or mbox `From ` separators, which
//! would otherwise trip up downstream header parsing.

use std::io::{self, Read, Write};

use crate::support::error::Error;

pub struct HeaderWindow {
    accumulator: Vec<u8>,
    headers_complete: bool,
    emitted: Vec<u8>,
    read_pos: usize,
}

impl HeaderWindow {
    pub fn new() -> Self {
        HeaderWindow {
            accumulator: Vec::new(),
            headers_complete: false,
            emitted: Vec::new(),
            read_pos: 0,
        }
    }

    /// Whether the terminating blank line has been seen.
    pub fn headers_complete(&self) -> bool {
        self.headers_complete
    }

    /// Return the normalised header block, including the final `\n\n`.
    pub fn block(&self) -> Result<&[u8], Error> {
        if !self.headers_complete {
            return Err(Error::HeaderIncomplete);
        }
        Ok(&self.emitted)
    }

    /// Scan the accumulator for the `\n\n` terminator, treating `\r` as
    /// invisible so that CRLF and mixed line endings still terminate. On
    /// detection, truncate the accumulator just past the terminator and
    /// mark the block complete.
    fn check_for_complete_header(&mut self) {
        let mut prev = 0u8;
        for (idx, &byte) in self.accumulator.iter().enumerate() {
            if b'\n' == prev && b'\n' == byte {
                self.accumulator.truncate(idx + 1);
                self.headers_complete = true;
                return;
            }
            if b'\r' != byte {
                prev = byte;
            }
        }
    }

    /// Rewrite the completed accumulator into the emitted buffer, dropping
    /// non-header lines and normalising line endings.
    ///
    /// A folded line (leading SP or HTAB) survives only if the line it
    /// continues survived, unless it carries a colon of its own.
    fn store_header_block(&mut self) {
        let mut prev_kept = false;
        let mut rest: &[u8] = &self.accumulator;
        while let Some(nl) = rest.iter().position(|&b| b'\n' == b) {
            let mut line = &rest[..nl];
            rest = &rest[nl + 1..];
            if line.ends_with(b"\r") {
                line = &line[..line.len() - 1];
            }

            let folded = line
                .first()
                .map_or(false, |&b| b' ' == b || b'\t' == b);
            let keep = line.is_empty()
                || line.contains(&b':')
                || (folded && prev_kept);
            if !line.is_empty() {
                prev_kept = keep;
            }
            if !keep {
                continue;
            }

            self.emitted.extend_from_slice(line);
            self.emitted.push(b'\n');
        }
    }
}

impl Write for HeaderWindow {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.headers_complete {
            // Quick return once no more header data is awaited.
            return Ok(data.len());
        }

        self.accumulator.extend_from_slice(data);
        self.check_for_complete_header();
        if self.headers_complete {
            self.store_header_block();
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for HeaderWindow {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.headers_complete {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                Error::HeaderIncomplete,
            ));
        }

        let remaining = &self.emitted[self.read_pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.read_pos += n;
        Ok(n)
    }
}
