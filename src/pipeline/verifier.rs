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

//! Streaming byte-equality verification.
//!
//! `Verifier` is a write sink which matches everything written to it
//! against a reference reader, segment by segment, without ever holding
//! more than one write's worth of data. It is used to confirm that a
//! decrypted envelope reproduces the original message exactly before the
//! envelope is allowed anywhere near the target mailbox.

use std::io::{self, Read, Write};

use log::debug;

use crate::support::error::Error;

pub struct Verifier<R> {
    reference: R,
    expected_length: u64,
    consumed: u64,
    mismatch: bool,
}

impl<R: Read> Verifier<R> {
    /// `reference` is the reader all written data is matched against;
    /// `expected_length` the total number of bytes it must yield.
    pub fn new(reference: R, expected_length: u64) -> Verifier<R> {
        Verifier {
            reference,
            expected_length,
            consumed: 0,
            mismatch: false,
        }
    }

    /// Match `data` against the next bytes of the reference, reading as
    /// often as short reads require. Fails on the first differing byte with
    /// the number of bytes that matched before it.
    pub fn check(&mut self, mut data: &[u8]) -> Result<usize, Error> {
        let total = data.len();
        let mut rbuf = vec![0u8; data.len()];

        while !data.is_empty() {
            let n = self.reference.read(&mut rbuf[..data.len()])?;
            if 0 == n {
                self.mismatch = true;
                return Err(Error::LengthMismatch);
            }
            if data[..n] != rbuf[..n] {
                let matched = data[..n]
                    .iter()
                    .zip(&rbuf[..n])
                    .take_while(|(a, b)| a == b)
                    .count();
                self.mismatch = true;
                return Err(Error::ByteMismatch(
                    self.consumed + matched as u64,
                ));
            }
            self.consumed += n as u64;
            data = &data[n..];
        }

        Ok(total)
    }

    /// Whether the written data matched the reference completely, i.e. no
    /// byte differed, the reference is exhausted and exactly the expected
    /// number of bytes was seen. Only meaningful once all writes are done.
    pub fn equal(&mut self) -> bool {
        if self.mismatch {
            return false;
        }

        let mut probe = [0u8; 1];
        match self.reference.read(&mut probe) {
            Ok(0) => self.consumed == self.expected_length,
            Ok(_) => {
                debug!("verifier: read one byte, but expected EOF");
                false
            },
            Err(e) => {
                debug!("verifier: expected EOF, but got {}", e);
                false
            },
        }
    }
}

impl<R: Read> Write for Verifier<R> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.check(data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
