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

use log::warn;

/// Expand a leading `~/` in `path` to the current user's home directory.
///
/// Paths without the prefix are returned unchanged, as is the input when no
/// home directory can be determined.
pub fn expand_tilde(path: &str) -> String {
    if !path.starts_with("~/") {
        return path.to_owned();
    }

    match std::env::var("HOME") {
        Ok(home) => format!("{}{}", home, &path[1..]),
        Err(_) => {
            warn!("failed to expand tilde in path, using as-is: {}", path);
            path.to_owned()
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn plain_paths_pass_through() {
        assert_eq!("/etc/passwd", expand_tilde("/etc/passwd"));
        assert_eq!("relative/path", expand_tilde("relative/path"));
    }

    #[test]
    fn tilde_prefix_is_expanded() {
        std::env::set_var("HOME", "/home/luser");
        assert_eq!("/home/luser/keys/enc.asc", expand_tilde("~/keys/enc.asc"));
    }
}
