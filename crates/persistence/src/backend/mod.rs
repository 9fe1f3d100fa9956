// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Database backend-specific code.
//!
//! Backend-specific code is limited to connection initialization,
//! migration execution and backend configuration (PRAGMA, engine checks).
//! Every association query and mutation lives in `queries/` and
//! `mutations/` and works across all supported backends.
//!
//! - `sqlite`: always compiled; used for development and tests
//! - `mysql`: behind the `mysql` feature; validated via opt-in tests

#[cfg(feature = "mysql")]
pub mod mysql;
pub mod sqlite;

#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::{Connection, SqliteConnection};

use crate::error::PersistenceError;

/// Backend checks shared by every supported connection type.
pub trait PersistenceBackend: Connection {
    /// Verifies that foreign keys are enforced.
    ///
    /// # Errors
    ///
    /// Returns an error if enforcement is off or cannot be queried.
    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError>;
}

impl PersistenceBackend for SqliteConnection {
    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        sqlite::verify_foreign_key_enforcement(self)
    }
}

#[cfg(feature = "mysql")]
impl PersistenceBackend for MysqlConnection {
    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        mysql::verify_foreign_key_enforcement(self)
    }
}
