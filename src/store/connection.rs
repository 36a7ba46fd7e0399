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

//! Shared IMAP connection handling.

use std::net::TcpStream;

use log::{debug, error, warn};
use native_tls::TlsStream;

use crate::support::config::ServerConfig;
use crate::support::error::Error;

pub type Session = imap::Session<TlsStream<TcpStream>>;

/// An authenticated IMAPS connection.
///
/// Source and target each own one; the two are never shared.
pub struct ImapConnection {
    pub(super) session: Session,
}

impl ImapConnection {
    /// Connect to the configured server and log in.
    pub fn connect(server: &ServerConfig) -> Result<ImapConnection, Error> {
        debug!("connecting to {}:{}", server.host, server.port);
        let tls = native_tls::TlsConnector::builder().build()?;
        let client = imap::connect(
            (server.host.as_str(), server.port),
            server.host.as_str(),
            &tls,
        )
        .map_err(|e| {
            error!("failed to connect: {}", e);
            e
        })?;

        debug!("attempting to login as {}", server.username);
        let session = client
            .login(&server.username, &server.password)
            .map_err(|(e, _client)| {
                error!("login failed: {}", e);
                e
            })?;
        debug!("logged in");

        Ok(ImapConnection { session })
    }

    /// End the server connection gracefully.
    pub fn logout(&mut self) {
        debug!("logging out");
        if let Err(e) = self.session.logout() {
            warn!("logout failed: {}", e);
        }
    }
}

/// Map a flag token to the `imap` crate's representation.
pub(super) fn to_imap_flag(flag: &str) -> imap::types::Flag<'static> {
    use imap::types::Flag;

    match flag {
        "\\Seen" => Flag::Seen,
        "\\Answered" => Flag::Answered,
        "\\Flagged" => Flag::Flagged,
        "\\Deleted" => Flag::Deleted,
        "\\Draft" => Flag::Draft,
        "\\Recent" => Flag::Recent,
        other => Flag::Custom(other.to_owned().into()),
    }
}

/// Map a fetched flag back to its wire token.
pub(super) fn flag_to_string(flag: &imap::types::Flag<'_>) -> String {
    use imap::types::Flag;

    match flag {
        Flag::Seen => "\\Seen".to_owned(),
        Flag::Answered => "\\Answered".to_owned(),
        Flag::Flagged => "\\Flagged".to_owned(),
        Flag::Deleted => "\\Deleted".to_owned(),
        Flag::Draft => "\\Draft".to_owned(),
        Flag::Recent => "\\Recent".to_owned(),
        Flag::MayCreate => "\\*".to_owned(),
        Flag::Custom(name) => name.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flag_tokens_round_trip() {
        for token in
            &["\\Seen", "\\Answered", "\\Flagged", "\\Deleted", "\\Draft"]
        {
            assert_eq!(*token, flag_to_string(&to_imap_flag(token)));
        }
        assert_eq!("$Label1", flag_to_string(&to_imap_flag("$Label1")));
    }
}
