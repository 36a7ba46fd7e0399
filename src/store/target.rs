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

//! Delivery of envelopes to the target mailbox.

use chrono::{DateTime, FixedOffset};
use log::{debug, error};

use super::connection::{to_imap_flag, ImapConnection};
use crate::pipeline::transform::TargetStore;
use crate::support::config::ServerConfig;
use crate::support::error::Error;

pub struct ImapTarget {
    conn: ImapConnection,
    cur_mailbox: String,
}

impl ImapTarget {
    pub fn connect(server: &ServerConfig) -> Result<ImapTarget, Error> {
        Ok(ImapTarget {
            conn: ImapConnection::connect(server)?,
            cur_mailbox: String::new(),
        })
    }

    /// Set up the connection to use the given mailbox, creating it first if
    /// necessary.
    pub fn select_mailbox(&mut self, mailbox: &str) -> Result<(), Error> {
        debug!("blindly creating mailbox '{}'", mailbox);
        if let Err(e) = self.conn.session.create(mailbox) {
            debug!("mailbox creation ended with err={}", e);
        }

        debug!("selecting mailbox '{}'", mailbox);
        self.conn.session.select(mailbox).map_err(|e| {
            error!("unable to select mailbox '{}': {}", mailbox, e);
            e
        })?;
        self.cur_mailbox = mailbox.to_owned();
        Ok(())
    }

    pub fn logout(&mut self) {
        self.conn.logout();
    }
}

impl TargetStore for ImapTarget {
    fn append(
        &mut self,
        flags: &[String],
        internal_date: &DateTime<FixedOffset>,
        message: &[u8],
    ) -> Result<(), Error> {
        debug!("appending mail to mailbox '{}'", self.cur_mailbox);
        let flags: Vec<imap::types::Flag<'static>> =
            flags.iter().map(|f| to_imap_flag(f)).collect();
        self.conn
            .session
            .append_with_flags_and_date(
                &self.cur_mailbox,
                message,
                &flags,
                Some(*internal_date),
            )
            .map_err(|e| {
                error!("failed to store message: {}", e);
                Error::TargetAppendFailed(e)
            })
    }
}
