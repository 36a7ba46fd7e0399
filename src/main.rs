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

#[cfg(test)]
macro_rules! assert_matches {
    ($expected:pat, $actual:expr) => {
        match $actual {
            $expected => (),
            unexpected => panic!(
                "Expected {} matches {}, got {:?}",
                stringify!($expected),
                stringify!($actual),
                unexpected
            ),
        }
    };
}

mod cli;
mod crypt;
mod mime;
mod pipeline;
mod store;
mod support;

fn main() {
    init_simple_log();
    cli::main::main();
}

fn init_simple_log() {
    let level = std::env::var("LEMONCRYPT_LOG")
        .ok()
        .and_then(|v| v.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Debug);

    let stderr = log4rs::append::console::ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(log4rs::encode::pattern::PatternEncoder::new(
            "{d(%H:%M:%S%.3f)} [{l}][{t}] {m}{n}",
        )))
        .build();
    let log_config = log4rs::config::Config::builder()
        .appender(
            log4rs::config::Appender::builder()
                .build("stderr", Box::new(stderr)),
        )
        .build(
            log4rs::config::Root::builder().appender("stderr").build(level),
        )
        .unwrap();
    log4rs::init_config(log_config).unwrap();
}
