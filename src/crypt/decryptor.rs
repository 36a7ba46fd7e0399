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

//! Decryption of a single mail message.
//!
//! The decryptor buffers one whole message, decides whether it is one of
//! our own envelopes (the `X-Lemoncrypt` header is the sole discriminator),
//! and either hands the buffer back unmodified or peels the OpenPGP/MIME
//! framing and decrypts the payload. The reader returned by `open` yields
//! *unverified* plaintext; `verify` must be consulted once the reader has
//! been drained and before the output is acted upon.

use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use mailparse::{MailHeaderMap, ParsedMail};
use sequoia_openpgp as openpgp;

use openpgp::armor;
use openpgp::cert::prelude::*;
use openpgp::crypto::{Password, SessionKey};
use openpgp::packet::{PKESK, SKESK};
use openpgp::parse::stream::{
    DecryptionHelper, DecryptorBuilder, MessageLayer, MessageStructure,
    VerificationHelper,
};
use openpgp::parse::Parse;
use openpgp::policy::StandardPolicy;
use openpgp::types::SymmetricAlgorithm;

use crate::mime::envelope::CUSTOM_HEADER;
use crate::support::error::Error;

static POLICY: StandardPolicy = StandardPolicy::new();

#[derive(Default)]
#[derive(Debug)]
struct DecryptState {
    drained: bool,
    passthrough: bool,
    good_signature: bool,
}

pub struct MessageDecryptor {
    buf: Vec<u8>,
    signing_cert: Cert,
    decryption_cert: Cert,
    passphrase: Password,
    shared: Arc<Mutex<DecryptState>>,
}

impl MessageDecryptor {
    pub fn new(
        signing_cert: Cert,
        decryption_cert: Cert,
        passphrase: Password,
    ) -> MessageDecryptor {
        MessageDecryptor {
            buf: Vec::new(),
            signing_cert,
            decryption_cert,
            passphrase,
            shared: Arc::new(Mutex::new(DecryptState::default())),
        }
    }

    /// Parse the buffered message and return a reader over its plaintext.
    ///
    /// Messages which are not our own envelopes pass through unmodified.
    /// The returned reader yields unverified data; call `verify()` after
    /// draining it.
    pub fn open(&mut self) -> Result<PlainReader<'_>, Error> {
        let mail = mailparse::parse_mail(&self.buf)?;

        if !self.is_own_envelope(&mail) {
            debug!("returning non-lemoncrypt message without modification");
            self.shared.lock().unwrap().passthrough = true;
            return Ok(PlainReader {
                shared: Arc::clone(&self.shared),
                inner: Inner::Passthrough(Cursor::new(&self.buf)),
            });
        }

        if !mail.ctype.params.contains_key("boundary") {
            return Err(Error::BoundaryMissing);
        }
        let payload = Self::encrypted_part(&mail)?;

        let mut ciphertext = Vec::new();
        armor::Reader::from_bytes(
            &payload,
            armor::ReaderMode::Tolerant(Some(armor::Kind::Message)),
        )
        .read_to_end(&mut ciphertext)
        .map_err(|e| Error::ArmorDecode(e.into()))?;

        let helper = DecryptHelper {
            signing_cert: self.signing_cert.clone(),
            decryption_cert: self.decryption_cert.clone(),
            passphrase: self.passphrase.clone(),
            shared: Arc::clone(&self.shared),
        };
        let decryptor = DecryptorBuilder::from_reader(Cursor::new(ciphertext))
            .map_err(Error::PgpReadMessage)?
            .with_policy(&POLICY, None, helper)
            .map_err(Error::PgpReadMessage)?;

        Ok(PlainReader {
            shared: Arc::clone(&self.shared),
            inner: Inner::Encrypted(Box::new(decryptor)),
        })
    }

    /// Report whether the drained plaintext was covered by a valid
    /// signature. Passthrough messages verify trivially.
    pub fn verify(&self) -> Result<(), Error> {
        let state = self.shared.lock().unwrap();
        if !state.drained {
            return Err(Error::VerifyTooEarly);
        }
        if state.passthrough || state.good_signature {
            Ok(())
        } else {
            Err(Error::SignatureInvalid)
        }
    }

    /// Whether the buffered message looks like one of our own envelopes.
    fn is_own_envelope(&self, mail: &ParsedMail<'_>) -> bool {
        let marked = mail
            .headers
            .get_first_value(CUSTOM_HEADER)
            .map_or(false, |v| !v.is_empty());
        if !marked {
            return false;
        }
        if "multipart/encrypted" != mail.ctype.mimetype {
            warn!("message has lemoncrypt header but is not encrypted?");
            return false;
        }
        true
    }

    /// Check the part structure and extract the armored payload body.
    fn encrypted_part(mail: &ParsedMail<'_>) -> Result<Vec<u8>, Error> {
        match mail.subparts.as_slice() {
            [version, payload] => {
                if "application/pgp-encrypted" != version.ctype.mimetype {
                    return Err(Error::PartStructureInvalid(format!(
                        "unexpected Content-Type={}, \
                         expected application/pgp-encrypted",
                        version.ctype.mimetype
                    )));
                }
                if "application/octet-stream" != payload.ctype.mimetype {
                    return Err(Error::PartStructureInvalid(format!(
                        "unexpected Content-Type={}, \
                         expected application/octet-stream",
                        payload.ctype.mimetype
                    )));
                }
                Ok(payload.get_body_raw()?)
            },
            parts => Err(Error::PartStructureInvalid(format!(
                "expected 2 MIME parts, found {}",
                parts.len()
            ))),
        }
    }
}

impl Write for MessageDecryptor {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

enum Inner<'a> {
    Passthrough(Cursor<&'a [u8]>),
    Encrypted(
        Box<openpgp::parse::stream::Decryptor<'static, DecryptHelper>>,
    ),
}

impl std::fmt::Debug for Inner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Inner::Passthrough(_) => f.write_str("Inner::Passthrough(..)"),
            Inner::Encrypted(_) => f.write_str("Inner::Encrypted(..)"),
        }
    }
}

/// Reader over the plaintext of an opened message.
///
/// End-of-stream is tracked so that `MessageDecryptor::verify` can refuse
/// to give a verdict on a partially read message.
#[derive(Debug)]
pub struct PlainReader<'a> {
    shared: Arc<Mutex<DecryptState>>,
    inner: Inner<'a>,
}

impl Read for PlainReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = match self.inner {
            Inner::Passthrough(ref mut cursor) => cursor.read(buf)?,
            Inner::Encrypted(ref mut decryptor) => decryptor.read(buf)?,
        };
        if 0 == n && !buf.is_empty() {
            self.shared.lock().unwrap().drained = true;
        }
        Ok(n)
    }
}

struct DecryptHelper {
    signing_cert: Cert,
    decryption_cert: Cert,
    passphrase: Password,
    shared: Arc<Mutex<DecryptState>>,
}

impl VerificationHelper for DecryptHelper {
    fn get_certs(
        &mut self,
        _ids: &[openpgp::KeyHandle],
    ) -> openpgp::Result<Vec<Cert>> {
        Ok(vec![self.signing_cert.clone(), self.decryption_cert.clone()])
    }

    fn check(
        &mut self,
        structure: MessageStructure,
    ) -> openpgp::Result<()> {
        for layer in structure {
            if let MessageLayer::SignatureGroup { results } = layer {
                if results.iter().any(|r| r.is_ok()) {
                    self.shared.lock().unwrap().good_signature = true;
                } else {
                    for result in results {
                        if let Err(e) = result {
                            warn!("signature verification failed: {}", e);
                        }
                    }
                }
            }
        }
        // Never fail here; reads must still yield the unverified plaintext
        // and the verdict is delivered through verify().
        Ok(())
    }
}

impl DecryptionHelper for DecryptHelper {
    fn decrypt<D>(
        &mut self,
        pkesks: &[PKESK],
        _skesks: &[SKESK],
        sym_algo: Option<SymmetricAlgorithm>,
        mut decrypt: D,
    ) -> openpgp::Result<Option<openpgp::Fingerprint>>
    where
        D: FnMut(SymmetricAlgorithm, &SessionKey) -> bool,
    {
        // The message reader duplicates key material without the unlock
        // state, so it only ever sees the encrypted secret key; the
        // passphrase therefore has to be re-supplied for every message.
        for key in self
            .decryption_cert
            .keys()
            .secret()
            .with_policy(&POLICY, None)
            .supported()
            .for_transport_encryption()
            .for_storage_encryption()
        {
            let mut key = key.key().clone();
            if !key.has_unencrypted_secret() {
                key = key.decrypt_secret(&self.passphrase)?;
            }
            let mut keypair = key.into_keypair()?;

            for pkesk in pkesks {
                if let Some((algo, session_key)) =
                    pkesk.decrypt(&mut keypair, sym_algo)
                {
                    if decrypt(algo, &session_key) {
                        return Ok(Some(
                            self.decryption_cert.fingerprint(),
                        ));
                    }
                }
            }
        }

        Err(anyhow::anyhow!("no matching decryption key for any PKESK"))
    }
}
