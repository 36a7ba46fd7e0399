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

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unterminated or empty header block")]
    HeaderIncomplete,
    #[error("Failed to read keyring: {0}")]
    KeyringIo(#[source] io::Error),
    #[error("Failed to parse keyring: {0}")]
    KeyringFormat(anyhow::Error),
    #[error("No key in keyring matches id '{0}'")]
    KeyNotFound(String),
    #[error("Key lacks private key material")]
    PrivateKeyMissing,
    #[error("Failed to decrypt private key: {0}")]
    PassphraseRejected(anyhow::Error),
    #[error("Missing encryption key")]
    NoEncryptionKey,
    #[error("Message is already encrypted")]
    AlreadyEncrypted,
    #[error("Failed to finalise encryption stream: {0}")]
    PgpFinalize(anyhow::Error),
    #[error("Missing MIME boundary")]
    BoundaryMissing,
    #[error("Unexpected MIME structure: {0}")]
    PartStructureInvalid(String),
    #[error("Failed to de-armor payload: {0}")]
    ArmorDecode(anyhow::Error),
    #[error("Failed to read OpenPGP message: {0}")]
    PgpReadMessage(anyhow::Error),
    #[error("Signature verification failed")]
    SignatureInvalid,
    #[error("Verify called before the plaintext was drained")]
    VerifyTooEarly,
    #[error("Byte mismatch after {0} matching bytes")]
    ByteMismatch(u64),
    #[error("More or fewer bytes than the reference stream")]
    LengthMismatch,
    #[error("Round-trip verification failed")]
    RoundTripMismatch,
    #[error("Failed to append to target mailbox: {0}")]
    TargetAppendFailed(#[source] imap::error::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Metrics output file already exists")]
    MetricsFileExists,
    #[error("OpenPGP operation failed: {0}")]
    Pgp(anyhow::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Mime(#[from] mailparse::MailParseError),
    #[error(transparent)]
    Tls(#[from] native_tls::Error),
    #[error(transparent)]
    Imap(#[from] imap::error::Error),
}
