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

//! The per-message transformation pipeline.
//!
//! For every message drawn from the source, the pipeline encrypts it,
//! decrypts its own output again and streams the result against a second
//! reader over the original bytes. Only when that round trip reproduces the
//! message exactly, and the signature on the decrypted payload checks out,
//! is the envelope appended to the target store. A failure at any stage
//! abandons the message with its source copy untouched; the metric record
//! is committed either way.

use std::io::{self, Cursor, Write};

use chrono::{DateTime, FixedOffset};
use log::{debug, warn};

use super::metrics::{MetricCollector, MetricRecord};
use super::verifier::Verifier;
use crate::crypt::transformer::PgpTransformer;
use crate::support::error::Error;

/// One message drawn from the source store.
///
/// The body is a plain byte slice so that the pipeline can open it twice:
/// once to feed the encryptor and once as the verifier's reference.
pub struct SourceMessage<'a> {
    pub flags: Vec<String>,
    pub internal_date: DateTime<FixedOffset>,
    pub body: &'a [u8],
}

/// The single operation the pipeline needs from the target store.
pub trait TargetStore {
    fn append(
        &mut self,
        flags: &[String],
        internal_date: &DateTime<FixedOffset>,
        message: &[u8],
    ) -> Result<(), Error>;
}

pub struct MessagePipeline<'a> {
    pgp: &'a PgpTransformer,
    metrics: MetricCollector,
}

impl<'a> MessagePipeline<'a> {
    pub fn new(
        pgp: &'a PgpTransformer,
        metrics: MetricCollector,
    ) -> MessagePipeline<'a> {
        MessagePipeline { pgp, metrics }
    }

    /// Transform one message and deliver it to `target`, committing a
    /// metric record regardless of the outcome.
    pub fn process(
        &mut self,
        message: SourceMessage<'_>,
        target: &mut dyn TargetStore,
    ) -> Result<(), Error> {
        let mut record = self.metrics.new_record(message.body.len() as u64);
        let result = self.transform(&message, target, &mut record);
        record.success = result.is_ok();
        if let Err(e) = self.metrics.commit(record) {
            warn!("failed to write metric record: {}", e);
        }
        result
    }

    fn transform(
        &self,
        message: &SourceMessage<'_>,
        target: &mut dyn TargetStore,
        record: &mut MetricRecord,
    ) -> Result<(), Error> {
        let mut encryptor = self.pgp.new_encryptor()?;
        io::copy(&mut Cursor::new(message.body), &mut encryptor)?;
        let envelope = encryptor.envelope()?;
        record.result_size = envelope.len() as u64;

        let mut decryptor = self.pgp.new_decryptor();
        decryptor.write_all(&envelope)?;

        let mut verifier = Verifier::new(
            Cursor::new(message.body),
            message.body.len() as u64,
        );
        {
            let mut plaintext = decryptor.open()?;
            io::copy(&mut plaintext, &mut verifier).map_err(|e| {
                warn!("round-trip decryption failed: {}", e);
                Error::RoundTripMismatch
            })?;
        }
        if !verifier.equal() {
            return Err(Error::RoundTripMismatch);
        }
        decryptor.verify()?;
        debug!("round-trip verification succeeded");

        // \Recent is owned by the server; many refuse it on APPEND.
        let flags: Vec<String> = message
            .flags
            .iter()
            .filter(|f| "\\Recent" != f.as_str())
            .cloned()
            .collect();
        target.append(&flags, &message.internal_date, &envelope)
    }
}
