// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend-agnostic writes.

pub mod associations;

pub use associations::write_associations_sqlite;

#[cfg(feature = "mysql")]
pub use associations::write_associations_mysql;
