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

//! The encrypt run.
//!
//! Initialisation failures (configuration, keys, connections, folder
//! selection) terminate the process with the matching sysexits code;
//! per-message failures are logged, recorded in the metrics and skipped.

use log::info;

use super::main::Command;
use crate::crypt::transformer::PgpTransformer;
use crate::pipeline::metrics::MetricCollector;
use crate::pipeline::transform::MessagePipeline;
use crate::store::source::ImapSource;
use crate::store::target::ImapTarget;
use crate::support::config::Config;
use crate::support::sysexits::*;

pub(super) fn run(cmd: Command) {
    let mut config = match Config::load(&cmd.config) {
        Ok(config) => config,
        Err(e) => die!(
            EX_CONFIG,
            "failed to load config file {}: {}",
            cmd.config.display(),
            e
        ),
    };
    if let Err(e) = config.validate() {
        die!(EX_CONFIG, "config validation failed: {}", e);
    }

    let pgp = match PgpTransformer::from_config(&config.pgp) {
        Ok(pgp) => pgp,
        Err(e) => die!(EX_DATAERR, "failed to set up PGP keys: {}", e),
    };

    let metrics = match cmd.write_metrics {
        Some(ref path) => match MetricCollector::create(path) {
            Ok(metrics) => metrics,
            Err(e) => die!(
                EX_CANTCREAT,
                "failed to initialize metrics collector: {}",
                e
            ),
        },
        None => MetricCollector::disabled(),
    };

    let mut source =
        match ImapSource::connect(&config.server, &config.mailbox) {
            Ok(source) => source,
            Err(e) => die!(
                EX_UNAVAILABLE,
                "failed to connect to source server: {}",
                e
            ),
        };
    let mut target = match ImapTarget::connect(&config.server) {
        Ok(target) => target,
        Err(e) => die!(
            EX_UNAVAILABLE,
            "failed to connect to target server: {}",
            e
        ),
    };

    let mut pipeline = MessagePipeline::new(&pgp, metrics);
    for (source_folder, target_folder) in &config.mailbox.folders {
        let target_folder = if target_folder.is_empty() {
            source_folder
        } else {
            target_folder
        };
        info!(
            "working on folder={} (target={})",
            source_folder, target_folder
        );

        if let Err(e) = target.select_mailbox(target_folder) {
            die!(
                EX_UNAVAILABLE,
                "failed to select mailbox {}: {}",
                target_folder,
                e
            );
        }
        if let Err(e) = source
            .iterate(source_folder, |msg| pipeline.process(msg, &mut target))
        {
            die!(EX_UNAVAILABLE, "folder iteration failed: {}", e);
        }
    }

    source.logout();
    target.logout();
}
