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

//! Shared key material for tests.
//!
//! Key generation is not fast, so the keys are generated once and cloned
//! into each test that needs them.

use lazy_static::lazy_static;
use sequoia_openpgp::cert::prelude::*;

lazy_static! {
    static ref TEST_KEY: Cert = generate(None);
    static ref PROTECTED_KEY: Cert = generate(Some("hunter2"));
}

/// A general-purpose key with unprotected secret material.
pub fn test_key() -> Cert {
    TEST_KEY.clone()
}

/// A key whose secret material is encrypted with the passphrase "hunter2".
pub fn protected_key() -> Cert {
    PROTECTED_KEY.clone()
}

fn generate(password: Option<&str>) -> Cert {
    let mut builder = CertBuilder::new()
        .add_userid("Lemoncrypt Test <test@lemoncrypt.example>")
        .add_signing_subkey()
        .add_transport_encryption_subkey();
    if let Some(password) = password {
        builder = builder.set_password(Some(password.into()));
    }

    let (cert, _revocation) = builder.generate().unwrap();
    cert
}
