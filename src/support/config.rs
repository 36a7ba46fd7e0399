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

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::support::error::Error;
use crate::support::paths::expand_tilde;

/// The run configuration for Lemoncrypt.
///
/// This is stored in a TOML file, `lemoncrypt.toml` by default.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// The IMAP server hosting both the source and target folders.
    pub server: ServerConfig,

    /// Which folders to process.
    pub mailbox: MailboxConfig,

    /// Key material and header policy.
    pub pgp: PgpConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    /// The host to connect to.
    pub host: String,
    /// The port to connect to.
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MailboxConfig {
    /// Maps each source folder to the target folder that receives its
    /// envelopes. An empty target name means "same as the source".
    pub folders: BTreeMap<String, String>,

    /// Only messages older than this many days are touched.
    #[serde(default = "default_min_age_days")]
    pub min_age_days: i64,

    /// If true, mark the plaintext originals `\Deleted` and expunge them
    /// once their envelope has been appended to the target.
    #[serde(default)]
    pub delete_plain_copies: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PgpConfig {
    /// Path of the keyring holding the encryption target key.
    pub encryption_key_path: String,
    /// Hex id suffix selecting the encryption key within its keyring. The
    /// empty string selects the first key.
    #[serde(default)]
    pub encryption_key_id: String,
    #[serde(default)]
    pub encryption_key_passphrase: String,

    /// Path of the keyring holding the signing key. Empty disables signing.
    /// This may be the same file as `encryption_key_path`.
    #[serde(default)]
    pub signing_key_path: String,
    #[serde(default)]
    pub signing_key_id: String,
    #[serde(default)]
    pub signing_key_passphrase: String,

    /// Ordered list of header names copied in cleartext onto the envelope.
    #[serde(default)]
    pub plain_headers: Vec<String>,
}

fn default_port() -> u16 {
    993
}

fn default_min_age_days() -> i64 {
    30
}

impl Config {
    /// Read and parse the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Config, Error> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Perform basic upfront sanity checks, fill in defaults which serde
    /// cannot express, and expand tildes in the key paths.
    pub fn validate(&mut self) -> Result<(), Error> {
        if self.mailbox.folders.is_empty() {
            return Err(Error::Config(
                "no folders configured (mailbox.folders)".to_owned(),
            ));
        }
        if self.pgp.encryption_key_path.is_empty() {
            return Err(Error::Config(
                "missing encryption key path (pgp.encryption_key_path)"
                    .to_owned(),
            ));
        }
        if self.pgp.plain_headers.is_empty() {
            self.pgp.plain_headers = ["From", "To", "Cc", "Bcc", "Date", "Subject"]
                .iter()
                .map(|&h| h.to_owned())
                .collect();
        }

        self.pgp.encryption_key_path =
            expand_tilde(&self.pgp.encryption_key_path);
        self.pgp.signing_key_path = expand_tilde(&self.pgp.signing_key_path);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn minimal_config() -> Config {
        toml::from_str(
            r#"
[server]
host = "imap.example.org"
username = "luser"
password = "hunter2"

[mailbox]
folders = { "INBOX" = "INBOX.crypt" }

[pgp]
encryption_key_path = "/keys/enc.asc"
"#,
        )
        .unwrap()
    }

    #[test]
    fn defaults_are_filled_in() {
        let mut config = minimal_config();
        config.validate().unwrap();

        assert_eq!(993, config.server.port);
        assert_eq!(30, config.mailbox.min_age_days);
        assert!(!config.mailbox.delete_plain_copies);
        assert_eq!(
            vec!["From", "To", "Cc", "Bcc", "Date", "Subject"],
            config.pgp.plain_headers
        );
    }

    #[test]
    fn explicit_plain_headers_are_preserved() {
        let mut config = minimal_config();
        config.pgp.plain_headers = vec!["Subject".to_owned()];
        config.validate().unwrap();
        assert_eq!(vec!["Subject"], config.pgp.plain_headers);
    }

    #[test]
    fn missing_folders_is_fatal() {
        let mut config = minimal_config();
        config.mailbox.folders.clear();
        assert_matches!(Err(Error::Config(..)), config.validate());
    }

    #[test]
    fn missing_encryption_key_path_is_fatal() {
        let mut config = minimal_config();
        config.pgp.encryption_key_path.clear();
        assert_matches!(Err(Error::Config(..)), config.validate());
    }
}
