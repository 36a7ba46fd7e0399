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

//! Conversion of arbitrary plain messages to OpenPGP/MIME envelopes in a
//! way which allows for bit-perfect reversal of the operation.
//!
//! The transformer owns the key material for a run and hands out one-shot
//! `MessageEncryptor`/`MessageDecryptor` instances per message.

use std::path::Path;

use log::debug;

use super::decryptor::MessageDecryptor;
use super::encryptor::MessageEncryptor;
use super::keys::{self, UnlockedKey};
use crate::support::config::PgpConfig;
use crate::support::error::Error;

pub struct PgpTransformer {
    encryption_key: UnlockedKey,
    signing_key: Option<UnlockedKey>,
    keep_headers: Vec<String>,
}

impl PgpTransformer {
    pub fn new(
        encryption_key: UnlockedKey,
        signing_key: Option<UnlockedKey>,
        keep_headers: Vec<String>,
    ) -> PgpTransformer {
        PgpTransformer {
            encryption_key,
            signing_key,
            keep_headers,
        }
    }

    /// Load and unlock the keys named by the configuration.
    pub fn from_config(config: &PgpConfig) -> Result<PgpTransformer, Error> {
        if config.encryption_key_path.is_empty() {
            return Err(Error::NoEncryptionKey);
        }

        debug!(
            "loading encryption key from {}",
            config.encryption_key_path
        );
        let encryption_key = Self::load_key(
            &config.encryption_key_path,
            &config.encryption_key_id,
            &config.encryption_key_passphrase,
        )?;

        let signing_key = if config.signing_key_path.is_empty() {
            None
        } else {
            debug!("loading signing key from {}", config.signing_key_path);
            Some(Self::load_key(
                &config.signing_key_path,
                &config.signing_key_id,
                &config.signing_key_passphrase,
            )?)
        };

        Ok(PgpTransformer::new(
            encryption_key,
            signing_key,
            config.plain_headers.clone(),
        ))
    }

    fn load_key(
        path: &str,
        want_id: &str,
        passphrase: &str,
    ) -> Result<UnlockedKey, Error> {
        let certs = keys::load_keyring(Path::new(path))?;
        let cert = keys::select_by_suffix(certs, want_id)?;
        UnlockedKey::unlock(cert, passphrase)
    }

    /// Prepare the encryption of one message.
    pub fn new_encryptor(&self) -> Result<MessageEncryptor<'_>, Error> {
        let signing_keypair = match self.signing_key {
            Some(ref key) => Some(key.signing_keypair()?),
            None => None,
        };
        MessageEncryptor::new(
            &self.encryption_key,
            signing_keypair,
            self.keep_headers.clone(),
        )
    }

    /// Prepare the decryption of one message.
    pub fn new_decryptor(&self) -> MessageDecryptor {
        let signing_cert = match self.signing_key {
            Some(ref key) => key.cert.clone(),
            None => self.encryption_key.cert.clone(),
        };
        MessageDecryptor::new(
            signing_cert,
            self.encryption_key.cert.clone(),
            self.encryption_key.passphrase().clone(),
        )
    }
}

#[cfg(test)]
mod test {
    use std::io::{Read, Write};

    use super::*;
    use crate::crypt::test_keys::{protected_key, test_key};

    fn transformer_with(cert_passphrase: Option<&str>) -> PgpTransformer {
        let (cert, passphrase) = match cert_passphrase {
            Some(p) => (protected_key(), p),
            None => (test_key(), ""),
        };
        let encryption_key =
            UnlockedKey::unlock(cert.clone(), passphrase).unwrap();
        let signing_key = UnlockedKey::unlock(cert, passphrase).unwrap();
        PgpTransformer::new(
            encryption_key,
            Some(signing_key),
            vec!["Subject".to_owned(), "From".to_owned()],
        )
    }

    fn transformer() -> PgpTransformer {
        transformer_with(None)
    }

    fn encrypt(transformer: &PgpTransformer, message: &[u8]) -> Vec<u8> {
        let mut encryptor = transformer.new_encryptor().unwrap();
        encryptor.write_all(message).unwrap();
        encryptor.envelope().unwrap()
    }

    fn decrypt_and_verify(
        transformer: &PgpTransformer,
        envelope: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let mut decryptor = transformer.new_decryptor();
        decryptor.write_all(envelope)?;
        let mut plaintext = Vec::new();
        decryptor.open()?.read_to_end(&mut plaintext)?;
        decryptor.verify()?;
        Ok(plaintext)
    }

    const MESSAGE: &[u8] = b"Subject: Hi\nFrom: a@x\n\nhello\n";

    #[test]
    fn round_trip_restores_original_bytes() {
        let transformer = transformer();
        let envelope = encrypt(&transformer, MESSAGE);

        let plaintext =
            decrypt_and_verify(&transformer, &envelope).unwrap();
        assert_eq!(MESSAGE.to_vec(), plaintext);
    }

    #[test]
    fn round_trip_with_protected_key() {
        let transformer = transformer_with(Some("hunter2"));
        let envelope = encrypt(&transformer, MESSAGE);

        let plaintext =
            decrypt_and_verify(&transformer, &envelope).unwrap();
        assert_eq!(MESSAGE.to_vec(), plaintext);
    }

    #[test]
    fn envelope_identifies_itself() {
        let envelope = encrypt(&transformer(), MESSAGE);
        let text = String::from_utf8_lossy(&envelope);

        assert!(text.contains("Message-Id: \n"));
        assert!(text.contains("X-Lemoncrypt: v0.1\n"));
        assert!(text.contains("Subject: Hi\n"));
        assert!(text.contains("From: a@x\n"));
        assert!(text.contains("MIME-Version: 1.0\n"));
        assert!(text.contains("Content-Type: multipart/encrypted;\n"));

        let boundary = text
            .split("boundary=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        assert_eq!(60, boundary.len());
        assert!(boundary
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    #[test]
    fn kept_headers_precede_mime_framing() {
        let envelope = encrypt(&transformer(), MESSAGE);
        let text = String::from_utf8_lossy(&envelope);

        let subject = text.find("Subject: Hi\n").unwrap();
        let from = text.find("From: a@x\n").unwrap();
        let mime = text.find("MIME-Version: 1.0\n").unwrap();
        // keep-list order, not source order
        assert!(subject < from);
        assert!(from < mime);
    }

    #[test]
    fn foreign_messages_pass_through_unmodified() {
        let transformer = transformer();
        let foreign = b"Subject: plain\n\nnothing to see here\n";

        let plaintext =
            decrypt_and_verify(&transformer, foreign).unwrap();
        assert_eq!(foreign.to_vec(), plaintext);
    }

    #[test]
    fn own_envelope_is_rejected_for_reencryption() {
        let transformer = transformer();
        let envelope = encrypt(&transformer, MESSAGE);

        let mut encryptor = transformer.new_encryptor().unwrap();
        encryptor.write_all(&envelope).unwrap();
        assert_matches!(Err(Error::AlreadyEncrypted), encryptor.envelope());
    }

    #[test]
    fn verify_before_drain_is_too_early() {
        let transformer = transformer();
        let envelope = encrypt(&transformer, MESSAGE);

        let mut decryptor = transformer.new_decryptor();
        decryptor.write_all(&envelope).unwrap();
        {
            let mut reader = decryptor.open().unwrap();
            let mut one = [0u8; 1];
            reader.read(&mut one).unwrap();
        }
        assert_matches!(Err(Error::VerifyTooEarly), decryptor.verify());
    }

    #[test]
    fn tampered_payload_fails_round_trip() {
        let transformer = transformer();
        let mut envelope = encrypt(&transformer, MESSAGE);

        // Flip one character inside the armored payload.
        let marker = b"-----BEGIN PGP MESSAGE-----";
        let start = envelope
            .windows(marker.len())
            .position(|w| marker == w)
            .unwrap();
        let target = start + marker.len() + 40;
        envelope[target] =
            if b'A' == envelope[target] { b'B' } else { b'A' };

        assert!(decrypt_and_verify(&transformer, &envelope).is_err());
    }

    #[test]
    fn unsigned_envelope_fails_verification() {
        let key = UnlockedKey::unlock(test_key(), "").unwrap();
        let unsigned =
            PgpTransformer::new(key, None, vec!["Subject".to_owned()]);
        let envelope = encrypt(&unsigned, MESSAGE);

        let verifier = transformer();
        assert_matches!(
            Err(Error::SignatureInvalid),
            decrypt_and_verify(&verifier, &envelope)
        );
    }

    #[test]
    fn missing_boundary_is_detected() {
        let transformer = transformer();
        let broken = b"X-Lemoncrypt: v0.1\n\
                       Content-Type: multipart/encrypted\n\
                       \n\
                       body\n";

        let mut decryptor = transformer.new_decryptor();
        decryptor.write_all(broken).unwrap();
        assert_matches!(Err(Error::BoundaryMissing), decryptor.open());
    }

    #[test]
    fn wrong_part_structure_is_detected() {
        let transformer = transformer();
        let broken = b"X-Lemoncrypt: v0.1\n\
                       Content-Type: multipart/encrypted; boundary=\"bb\"\n\
                       \n\
                       --bb\n\
                       Content-Type: text/plain\n\
                       \n\
                       oops\n\
                       --bb--\n";

        let mut decryptor = transformer.new_decryptor();
        decryptor.write_all(broken).unwrap();
        assert_matches!(
            Err(Error::PartStructureInvalid(..)),
            decryptor.open()
        );
    }
}
