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

//! Loading and selection of OpenPGP key material.
//!
//! Keys are loaded once at startup and shared read-only for the whole run.
//! Selection within a keyring is by suffix match against the primary key's
//! fingerprint, so a user can give the conventional short key id, the full
//! 64-bit id or the complete fingerprint interchangeably. The match is
//! case-insensitive.

use std::fs::File;
use std::path::Path;

use log::debug;
use sequoia_openpgp as openpgp;

use openpgp::cert::prelude::*;
use openpgp::crypto::{KeyPair, Password};
use openpgp::parse::Parse;
use openpgp::policy::StandardPolicy;

use crate::support::error::Error;

static POLICY: StandardPolicy = StandardPolicy::new();

/// Load all certs from the keyring at `path`.
pub fn load_keyring(path: &Path) -> Result<Vec<Cert>, Error> {
    debug!("loading keyring from {}", path.display());
    let file = File::open(path).map_err(Error::KeyringIo)?;
    let parser =
        CertParser::from_reader(file).map_err(Error::KeyringFormat)?;

    let mut certs = Vec::new();
    for cert in parser {
        certs.push(cert.map_err(Error::KeyringFormat)?);
    }
    debug!("keyring contains {} key(s)", certs.len());
    Ok(certs)
}

/// Select the first cert whose primary key fingerprint ends with `want_id`.
///
/// The empty id matches the first cert in the keyring.
pub fn select_by_suffix(
    certs: Vec<Cert>,
    want_id: &str,
) -> Result<Cert, Error> {
    let want = want_id.to_ascii_uppercase();
    for cert in certs {
        // to_hex() is upper-case
        if cert.fingerprint().to_hex().ends_with(&want) {
            return Ok(cert);
        }
    }
    Err(Error::KeyNotFound(want_id.to_owned()))
}

/// A cert whose secret material has been validated against a passphrase.
///
/// The passphrase is retained because the streaming OpenPGP reader
/// re-encounters the *encrypted* secret key on every message it decrypts,
/// so decryption must be able to re-supply it on demand.
#[derive(Debug)]
pub struct UnlockedKey {
    pub cert: Cert,
    passphrase: Password,
}

impl UnlockedKey {
    /// Validate that `cert` carries secret material and that `passphrase`
    /// decrypts it, then wrap the pair for shared use.
    pub fn unlock(cert: Cert, passphrase: &str) -> Result<UnlockedKey, Error> {
        if !cert.is_tsk() {
            return Err(Error::PrivateKeyMissing);
        }

        let passphrase = Password::from(passphrase);
        for key in cert.keys().secret() {
            if key.has_unencrypted_secret() {
                continue;
            }
            key.key()
                .clone()
                .decrypt_secret(&passphrase)
                .map_err(Error::PassphraseRejected)?;
        }

        Ok(UnlockedKey { cert, passphrase })
    }

    pub fn passphrase(&self) -> &Password {
        &self.passphrase
    }

    /// Build a signing keypair from the first usable signing-capable secret
    /// key.
    pub fn signing_keypair(&self) -> Result<KeyPair, Error> {
        let key = self
            .cert
            .keys()
            .secret()
            .with_policy(&POLICY, None)
            .supported()
            .alive()
            .revoked(false)
            .for_signing()
            .next()
            .ok_or(Error::PrivateKeyMissing)?;

        let mut key = key.key().clone();
        if !key.has_unencrypted_secret() {
            key = key
                .decrypt_secret(&self.passphrase)
                .map_err(Error::PassphraseRejected)?;
        }
        key.into_keypair().map_err(Error::Pgp)
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use sequoia_openpgp::serialize::Serialize;

    use super::*;
    use crate::crypt::test_keys::{protected_key, test_key};

    fn keyring_file(certs: &[&Cert]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for cert in certs {
            cert.as_tsk().serialize(&mut file).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn keyring_round_trips_through_disk() {
        let key = test_key();
        let file = keyring_file(&[&key]);

        let certs = load_keyring(file.path()).unwrap();
        assert_eq!(1, certs.len());
        assert_eq!(key.fingerprint(), certs[0].fingerprint());
    }

    #[test]
    fn missing_keyring_is_io_error() {
        assert_matches!(
            Err(Error::KeyringIo(..)),
            load_keyring(Path::new("/nonexistent/keyring"))
        );
    }

    #[test]
    fn garbage_keyring_is_format_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not a keyring").unwrap();
        file.flush().unwrap();
        assert_matches!(
            Err(Error::KeyringFormat(..)),
            load_keyring(file.path())
        );
    }

    #[test]
    fn suffix_selection_is_case_insensitive() {
        let key = test_key();
        let fpr = key.fingerprint().to_hex();
        let short = fpr[fpr.len() - 16..].to_ascii_lowercase();

        let selected =
            select_by_suffix(vec![key.clone()], &short).unwrap();
        assert_eq!(key.fingerprint(), selected.fingerprint());
    }

    #[test]
    fn empty_id_selects_first_key() {
        let key = test_key();
        let other = protected_key();

        let selected =
            select_by_suffix(vec![key.clone(), other], "").unwrap();
        assert_eq!(key.fingerprint(), selected.fingerprint());
    }

    #[test]
    fn unmatched_id_is_not_found() {
        assert_matches!(
            Err(Error::KeyNotFound(..)),
            select_by_suffix(vec![test_key()], "ZZZZZZZZ")
        );
    }

    #[test]
    fn unlock_requires_secret_material() {
        let public_only = test_key().strip_secret_key_material();
        assert_matches!(
            Err(Error::PrivateKeyMissing),
            UnlockedKey::unlock(public_only, "")
        );
    }

    #[test]
    fn unlock_rejects_bad_passphrase() {
        assert_matches!(
            Err(Error::PassphraseRejected(..)),
            UnlockedKey::unlock(protected_key(), "hunter3")
        );
    }

    #[test]
    fn unlock_accepts_good_passphrase() {
        let key = UnlockedKey::unlock(protected_key(), "hunter2").unwrap();
        key.signing_keypair().unwrap();
    }

    #[test]
    fn unprotected_key_unlocks_with_any_passphrase() {
        let key = UnlockedKey::unlock(test_key(), "ignored").unwrap();
        key.signing_keypair().unwrap();
    }
}
