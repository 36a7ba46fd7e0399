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

//! Streaming encryption of one message into an OpenPGP/MIME envelope.
//!
//! `MessageEncryptor` is a write sink. Every chunk written to it fans out
//! synchronously to two downstream sinks: the `HeaderWindow`, which captures
//! the plaintext header block, and the OpenPGP stack (literal data writer,
//! optional signer, encryptor, ASCII armorer) whose output accumulates in
//! an in-memory buffer. No intermediate buffer beyond the chunk itself is
//! involved.
//!
//! An instance encrypts exactly one message. There is deliberately no way
//! to reuse it for a second one; cryptographic stream state is too easy to
//! get wrong on reuse, and a fresh instance is cheap.

use std::io::{self, Write};
use std::mem;
use std::sync::{Arc, Mutex};

use sequoia_openpgp as openpgp;

use openpgp::armor;
use openpgp::crypto::KeyPair;
use openpgp::policy::StandardPolicy;
use openpgp::serialize::stream::{
    Armorer, Encryptor2, LiteralWriter, Message, Signer,
};
use openpgp::types::{DataFormat, HashAlgorithm, SymmetricAlgorithm};

use super::keys::UnlockedKey;
use crate::mime::envelope;
use crate::mime::header_window::HeaderWindow;
use crate::mime::headers::HeaderMap;
use crate::support::error::Error;

static POLICY: StandardPolicy = StandardPolicy::new();

/// An in-memory sink shared between the armorer and the envelope assembly.
///
/// The OpenPGP message stack insists on owning its sink, so the buffer is
/// shared through a handle the encryptor keeps for itself.
#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    fn take(&self) -> Vec<u8> {
        mem::take(&mut *self.0.lock().unwrap())
    }
}

impl Write for SharedSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct MessageEncryptor<'a> {
    header_window: HeaderWindow,
    writer: Option<Message<'a>>,
    sink: SharedSink,
    keep_headers: Vec<String>,
}

impl<'a> MessageEncryptor<'a> {
    /// Set up the OpenPGP stream for one message, encrypting to
    /// `encryption_key` and signing with `signing_keypair` if given.
    pub fn new(
        encryption_key: &'a UnlockedKey,
        signing_keypair: Option<KeyPair>,
        keep_headers: Vec<String>,
    ) -> Result<MessageEncryptor<'a>, Error> {
        let recipients: Vec<_> = encryption_key
            .cert
            .keys()
            .with_policy(&POLICY, None)
            .supported()
            .alive()
            .revoked(false)
            .for_transport_encryption()
            .for_storage_encryption()
            .collect();
        if recipients.is_empty() {
            return Err(Error::NoEncryptionKey);
        }

        let sink = SharedSink::default();
        let message = Message::new(sink.clone());
        let message = Armorer::new(message)
            .kind(armor::Kind::Message)
            .build()
            .map_err(Error::Pgp)?;
        let message = Encryptor2::for_recipients(message, recipients)
            .symmetric_algo(SymmetricAlgorithm::AES256)
            .build()
            .map_err(Error::Pgp)?;
        let message = match signing_keypair {
            Some(keypair) => Signer::new(message, keypair)
                .hash_algo(HashAlgorithm::SHA256)
                .map_err(Error::Pgp)?
                .build()
                .map_err(Error::Pgp)?,
            None => message,
        };
        let message = LiteralWriter::new(message)
            .format(DataFormat::Binary)
            .build()
            .map_err(Error::Pgp)?;

        Ok(MessageEncryptor {
            header_window: HeaderWindow::new(),
            writer: Some(message),
            sink,
            keep_headers,
        })
    }

    /// Close the OpenPGP encryption stream and the armorer beneath it.
    pub fn finalize(&mut self) -> Result<(), Error> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().map_err(Error::PgpFinalize)?;
        }
        Ok(())
    }

    /// Finalize the stream and assemble the envelope.
    pub fn envelope(mut self) -> Result<Vec<u8>, Error> {
        self.finalize()?;

        let headers = HeaderMap::parse(self.header_window.block()?);
        let already = headers
            .get("Content-Type")
            .map_or(false, |ct| ct.starts_with("multipart/encrypted"));
        if already {
            return Err(Error::AlreadyEncrypted);
        }

        let armored = self.sink.take();
        let boundary = envelope::generate_boundary();
        Ok(envelope::format(
            &headers,
            &self.keep_headers,
            &armored,
            &boundary,
        ))
    }
}

impl Write for MessageEncryptor<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.header_window.write_all(data)?;
        match self.writer {
            Some(ref mut writer) => {
                writer.write_all(data)?;
                Ok(data.len())
            },
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write to finalized encryptor",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer {
            Some(ref mut writer) => writer.flush(),
            None => Ok(()),
        }
    }
}
