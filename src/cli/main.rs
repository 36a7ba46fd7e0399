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

use std::path::PathBuf;

use structopt::StructOpt;

use crate::support::sysexits::*;

/// Archive and encrypt the messages in your mailbox.
///
/// Lemoncrypt walks the configured folders of a remote IMAP mailbox,
/// transforms every plain message into an OpenPGP/MIME envelope which keeps
/// a configurable set of headers readable, verifies that the envelope
/// decrypts back to the exact original bytes, and appends the result to the
/// target folder. The plaintext original is only ever touched after its
/// envelope has been accepted by the server.
#[derive(StructOpt)]
#[structopt(name = "lemoncrypt", max_term_width = 80)]
pub(super) struct Command {
    /// Path to your config file.
    #[structopt(
        long,
        short,
        parse(from_os_str),
        env = "LEMONCRYPT_CONFIG",
        default_value = "lemoncrypt.toml"
    )]
    pub(super) config: PathBuf,

    /// Write per-message metrics to this CSV file. The file must not exist
    /// yet.
    #[structopt(long, parse(from_os_str))]
    pub(super) write_metrics: Option<PathBuf>,
}

pub fn main() {
    // Clap exits with status 1 instead of EX_USAGE if we use the more
    // concise API
    let cmd = Command::from_clap(&match Command::clap().get_matches_safe() {
        Ok(matches) => matches,
        Err(
            e @ structopt::clap::Error {
                kind: structopt::clap::ErrorKind::HelpDisplayed,
                ..
            },
        )
        | Err(
            e @ structopt::clap::Error {
                kind: structopt::clap::ErrorKind::VersionDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            return;
        },
        Err(e) => {
            eprintln!("{}", e.message);
            EX_USAGE.exit()
        },
    });

    super::encrypt::run(cmd);
}
