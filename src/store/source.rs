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

//! Traversal of the source mailbox.
//!
//! Only messages which are old enough, already read, unflagged and not
//! produced by us (no `X-Lemoncrypt` header) are selected. Messages whose
//! transformation succeeds can optionally be marked `\Deleted` and expunged
//! once the whole folder has been walked, so the plaintext copy is only
//! ever removed after its envelope was accepted by the target.

use chrono::{Duration, Utc};
use log::{debug, error, warn};

use super::connection::{flag_to_string, ImapConnection};
use crate::mime::envelope::CUSTOM_HEADER;
use crate::pipeline::transform::SourceMessage;
use crate::support::config::{MailboxConfig, ServerConfig};
use crate::support::error::Error;

/// IMAP date format (RFC 3501 `date-text`).
const IMAP_DATE_FORMAT: &str = "%d-%b-%Y";

pub struct ImapSource {
    conn: ImapConnection,
    delete_plain_copies: bool,
    min_age: Duration,
}

impl ImapSource {
    pub fn connect(
        server: &ServerConfig,
        mailbox: &MailboxConfig,
    ) -> Result<ImapSource, Error> {
        Ok(ImapSource {
            conn: ImapConnection::connect(server)?,
            delete_plain_copies: mailbox.delete_plain_copies,
            min_age: Duration::days(mailbox.min_age_days),
        })
    }

    /// Walk `mailbox`, invoking `callback` for every matching message.
    ///
    /// Callback failures are logged and skip only the affected message;
    /// protocol failures abort the folder.
    pub fn iterate<F>(
        &mut self,
        mailbox: &str,
        mut callback: F,
    ) -> Result<(), Error>
    where
        F: FnMut(SourceMessage<'_>) -> Result<(), Error>,
    {
        debug!("selecting mailbox '{}'", mailbox);
        self.conn.session.select(mailbox).map_err(|e| {
            error!("failed to select mailbox: {}", e);
            e
        })?;

        let date = Utc::now() - self.min_age;
        let date = date.format(IMAP_DATE_FORMAT);
        let filter = format!(
            "UNDELETED SEEN UNFLAGGED (NOT HEADER {} \"\") \
             (OR SENTBEFORE {} BEFORE {})",
            CUSTOM_HEADER, date, date
        );
        debug!("searching for: {}", filter);
        let ids = self.conn.session.search(&filter).map_err(|e| {
            error!("search failed: {}", e);
            e
        })?;
        debug!("search returned {} results", ids.len());
        if ids.is_empty() {
            return Ok(());
        }

        let mut ids: Vec<u32> = ids.into_iter().collect();
        ids.sort_unstable();
        let set = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let fetches = self
            .conn
            .session
            .fetch(&set, "(RFC822 UID FLAGS INTERNALDATE)")
            .map_err(|e| {
                error!("FETCH failed: {}", e);
                e
            })?;

        let mut deletion_set: Vec<String> = Vec::new();
        for fetch in fetches.iter() {
            debug!("handling mail uid={:?}", fetch.uid);
            let body = match fetch.body() {
                Some(body) => body,
                None => {
                    warn!("fetch response lacks RFC822 body, skipping");
                    continue;
                },
            };
            let internal_date = match fetch.internal_date() {
                Some(date) => date,
                None => {
                    warn!("fetch response lacks INTERNALDATE, skipping");
                    continue;
                },
            };
            let flags: Vec<String> =
                fetch.flags().iter().map(flag_to_string).collect();

            debug!("invoking message transformer");
            let result = callback(SourceMessage {
                flags,
                internal_date,
                body,
            });
            match result {
                Ok(()) => {
                    debug!("message transformation successful");
                    if let Some(uid) = fetch.uid {
                        deletion_set.push(uid.to_string());
                    }
                },
                Err(e) => warn!("message transformation failed: {}", e),
            }
        }

        if self.delete_plain_copies && !deletion_set.is_empty() {
            debug!(
                "marking {} transformed messages for deletion",
                deletion_set.len()
            );
            self.conn
                .session
                .uid_store(deletion_set.join(","), "+FLAGS.SILENT (\\Deleted)")
                .map_err(|e| {
                    error!("failed to mark messages for deletion: {}", e);
                    e
                })?;
            debug!("removing mail marked for deletion");
            self.conn.session.expunge().map_err(|e| {
                error!("failed to remove mail marked for deletion: {}", e);
                e
            })?;
        }
        Ok(())
    }

    pub fn logout(&mut self) {
        self.conn.logout();
    }
}
